//! Tempo Timesheets on a self-hosted Jira server.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use super::http::{Auth, HttpClient};
use super::{apply_tasks, FetchOptions, Fetcher, UploadOptions, Uploader};
use crate::duration::transmitted_seconds;
use crate::error::{FetchError, HttpError, UploadError};
use crate::worklog::{Entries, Entry, IdNameField};

pub const PATH_WORKLOG_SEARCH: &str = "/rest/tempo-timesheets/4/worklogs/search";
pub const PATH_WORKLOG_CREATE: &str = "/rest/tempo-timesheets/4/worklogs";

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
	pub id: u64,
	pub key: String,
	pub account_key: String,
	pub project_id: u64,
	pub project_key: String,
	pub summary: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchEntry {
	pub tempo_worklog_id: u64,
	/// Like "2021-10-02 09:00:00.000".
	pub started: String,
	pub billable_seconds: u64,
	pub time_spent_seconds: u64,
	#[serde(default)]
	pub comment: String,
	pub worker: String,
	pub issue: Issue,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchParams {
	pub from: String,
	pub to: String,
	pub worker: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEntry {
	pub comment: String,
	pub include_non_working_days: bool,
	pub origin_task_id: String,
	pub started: String,
	pub billable_seconds: u64,
	pub time_spent_seconds: u64,
	pub worker: String,
}

pub struct TempoClient {
	http: HttpClient,
}

impl TempoClient {
	pub fn new(api_root: &str, username: &str, password: &str, timeout: Duration) -> Result<Self, HttpError> {
		let auth = Auth::Basic {
			username: username.into(),
			password: password.into(),
		};
		Ok(Self {
			http: HttpClient::new(api_root, auth, timeout)?,
		})
	}
}

#[async_trait::async_trait]
impl Fetcher for TempoClient {
	async fn fetch_entries(&self, opts: &FetchOptions) -> Result<Entries, FetchError> {
		let params = SearchParams {
			from: opts.start.format("%Y-%m-%d").to_string(),
			to: opts.end.format("%Y-%m-%d").to_string(),
			worker: opts.user.clone(),
		};

		let url = self.http.url(PATH_WORKLOG_SEARCH, &[])?;
		let records: Vec<FetchEntry> = self.http.post(url, &params).await?;
		log::debug!("Fetched {} worklogs from Tempo", records.len());

		let mut entries = Entries::new();
		for record in &records {
			let entry = parse_entry(record)?;
			entries.extend(apply_tasks(entry, &[], &opts.task_extraction));
		}
		Ok(entries)
	}
}

#[async_trait::async_trait]
impl Uploader for TempoClient {
	async fn upload_entry(&self, entry: &Entry, opts: &UploadOptions) -> Result<(), UploadError> {
		if entry.task.id.is_empty() {
			return Err(UploadError::MissingTask);
		}

		let seconds = transmitted_seconds(
			entry.billable_duration,
			entry.unbillable_duration,
			opts.treat_duration_as_billed,
			opts.round_to_closest_minute,
		);

		let upload = UploadEntry {
			comment: entry.notes.clone(),
			include_non_working_days: true,
			origin_task_id: entry.task.id.clone(),
			started: entry.start.format("%Y-%m-%d").to_string(),
			billable_seconds: seconds.billable,
			time_spent_seconds: seconds.time_spent,
			worker: opts.user.clone(),
		};

		let url = self.http.url(PATH_WORKLOG_CREATE, &[])?;
		self.http.post_ignore_response(url, &upload).await?;
		Ok(())
	}
}

fn parse_entry(record: &FetchEntry) -> Result<Entry, FetchError> {
	let start = parse_started(&record.started)
		.ok_or_else(|| FetchError::Parse(format!("worklog {} has invalid start: {}", record.tempo_worklog_id, record.started)))?;

	let billable = record.billable_seconds.min(record.time_spent_seconds);
	let issue = &record.issue;

	Ok(Entry {
		client: IdNameField::new(issue.account_key.as_str(), issue.account_key.as_str()),
		project: IdNameField::new(issue.project_id.to_string(), issue.project_key.as_str()),
		task: IdNameField::new(issue.id.to_string(), issue.key.as_str()),
		summary: issue.summary.clone(),
		notes: record.comment.clone(),
		start,
		billable_duration: Duration::from_secs(billable),
		unbillable_duration: Duration::from_secs(record.time_spent_seconds - billable),
	})
}

fn parse_started(value: &str) -> Option<NaiveDateTime> {
	NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
		.ok()
		.or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(|date| date.and_time(chrono::NaiveTime::MIN)))
}
