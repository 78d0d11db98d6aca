//! Concurrent upload of entries, one task per group of entries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{UploadOptions, Uploader};
use crate::error::UploadError;
use crate::worklog::{group_by_task, Entries, Entry};

pub type UploadResult = Result<(), UploadError>;

/// Handle of an upload in progress.
#[derive(Debug)]
pub struct Tracker {
	pub label: String,
	started: Instant,
}

impl Tracker {
	pub fn new(entry: &Entry) -> Self {
		Self {
			label: entry.to_string(),
			started: Instant::now(),
		}
	}

	pub fn elapsed(&self) -> Duration {
		self.started.elapsed()
	}
}

/// Receives a start and a stop notification for every attempted upload.
pub trait Progress: Send + Sync {
	fn start_tracking(&self, entry: &Entry) -> Tracker;
	fn stop_tracking(&self, tracker: Tracker, error: Option<&UploadError>);
}

/// Reports progress through the logger.
pub struct LogProgress;

impl Progress for LogProgress {
	fn start_tracking(&self, entry: &Entry) -> Tracker {
		let tracker = Tracker::new(entry);
		log::info!("Uploading {}", tracker.label);
		tracker
	}

	fn stop_tracking(&self, tracker: Tracker, error: Option<&UploadError>) {
		match error {
			None => log::info!("Uploaded {} in {:.1?}", tracker.label, tracker.elapsed()),
			Some(e) => log::error!("Failed to upload {}: {}", tracker.label, e),
		}
	}
}

pub struct NoProgress;

impl Progress for NoProgress {
	fn start_tracking(&self, entry: &Entry) -> Tracker {
		Tracker::new(entry)
	}

	fn stop_tracking(&self, _tracker: Tracker, _error: Option<&UploadError>) {}
}

/// Upload entries concurrently, one task per task group.
///
/// Entries of the same group are uploaded one after the other, in order.
/// Every entry yields exactly one result on the returned channel, so the
/// caller should receive `entries.len()` results. Results of different
/// groups arrive in no particular order.
///
/// Once `cancel` is triggered, groups stop starting new uploads and report
/// [`UploadError::Cancelled`] for their remaining entries. Requests already
/// in flight are not interrupted.
///
/// Must be called from within a tokio runtime.
pub fn upload_entries(
	uploader: Arc<dyn Uploader>,
	entries: Entries,
	opts: Arc<UploadOptions>,
	progress: Arc<dyn Progress>,
	cancel: CancellationToken,
) -> mpsc::Receiver<UploadResult> {
	// Room for every result, so senders never wait on the receiver.
	let (sender, receiver) = mpsc::channel(entries.len().max(1));

	for (task, group) in group_by_task(entries) {
		log::debug!("Uploading {} entries for task {}", group.len(), task.as_deref().unwrap_or("<none>"));
		tokio::spawn(upload_group(
			group,
			uploader.clone(),
			opts.clone(),
			progress.clone(),
			cancel.clone(),
			sender.clone(),
		));
	}

	receiver
}

async fn upload_group(
	group: Entries,
	uploader: Arc<dyn Uploader>,
	opts: Arc<UploadOptions>,
	progress: Arc<dyn Progress>,
	cancel: CancellationToken,
	sender: mpsc::Sender<UploadResult>,
) {
	for entry in group {
		let result = if cancel.is_cancelled() {
			Err(UploadError::Cancelled)
		} else {
			let tracker = progress.start_tracking(&entry);
			let result = uploader.upload_entry(&entry, &opts).await;
			progress.stop_tracking(tracker, result.as_ref().err());
			result
		};

		// A dropped receiver means nobody is interested in the results any more.
		let _ = sender.send(result).await;
	}
}

/// Outcome of a whole upload run.
#[derive(Debug, Default)]
pub struct UploadSummary {
	pub uploaded: usize,
	pub errors: Vec<UploadError>,
}

impl UploadSummary {
	pub fn total(&self) -> usize {
		self.uploaded + self.errors.len()
	}

	pub fn is_success(&self) -> bool {
		self.errors.is_empty()
	}
}

/// Receive `expected` results from [`upload_entries`].
///
/// If every sender is gone before that, for example because a group task
/// panicked, the missing results are counted as [`UploadError::Lost`].
pub async fn collect_results(receiver: &mut mpsc::Receiver<UploadResult>, expected: usize) -> UploadSummary {
	let mut summary = UploadSummary::default();
	while summary.total() < expected {
		match receiver.recv().await {
			Some(Ok(())) => summary.uploaded += 1,
			Some(Err(e)) => summary.errors.push(e),
			None => {
				let missing = expected - summary.total();
				log::error!("Upload results ended after {} of {} entries", summary.total(), expected);
				summary.errors.extend((0..missing).map(|_| UploadError::Lost));
			},
		}
	}
	summary
}
