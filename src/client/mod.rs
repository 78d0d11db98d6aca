//! Provider abstraction and the pipeline pieces shared by every provider.

use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{ConfigError, FetchError, UploadError};
use crate::worklog::{Entries, Entry, IdNameField};

pub mod harvest;
pub mod http;
pub mod paginate;
pub mod registry;
pub mod tempo;
pub mod tempocloud;
pub mod upload;

/// How to handle an entry that references more than one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MultipleTaskMode {
	/// Split the entry into one entry per task, dividing the time between them.
	Split,
	/// Only keep the first task, preferring the summary, then tags, then the project.
	///
	/// The order between multiple matching tags depends on the provider.
	#[default]
	FirstOnly,
}

impl FromStr for MultipleTaskMode {
	type Err = ConfigError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"split" => Ok(Self::Split),
			"first-only" => Ok(Self::FirstOnly),
			other => Err(ConfigError::UnknownTaskMode(other.to_string())),
		}
	}
}

/// Patterns used to derive tasks from free-form entry fields.
#[derive(Debug, Clone, Default)]
pub struct TaskExtractionOptions {
	pub summary: Option<Regex>,
	pub tags: Option<Regex>,
	pub project: Option<Regex>,
	pub multiple_task_mode: MultipleTaskMode,
}

impl TaskExtractionOptions {
	pub fn is_enabled(&self) -> bool {
		self.summary.is_some() || self.tags.is_some() || self.project.is_some()
	}
}

/// Options of a single fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
	pub user: String,
	/// First day of the window, inclusive.
	pub start: NaiveDate,
	/// Last day of the window, inclusive.
	pub end: NaiveDate,
	pub task_extraction: TaskExtractionOptions,
}

/// Options shared by all uploads of a single run.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
	pub user: String,
	pub treat_duration_as_billed: bool,
	pub round_to_closest_minute: bool,
}

/// A source of worklog entries.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
	/// Fetch all entries in the window, or an error and no entries at all.
	async fn fetch_entries(&self, opts: &FetchOptions) -> Result<Entries, FetchError>;
}

/// A target for worklog entries.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
	/// Upload a single entry.
	async fn upload_entry(&self, entry: &Entry, opts: &UploadOptions) -> Result<(), UploadError>;
}

/// Derive the tasks of an entry from its summary, tags and project.
pub fn extract_tasks(entry: &Entry, tags: &[IdNameField], opts: &TaskExtractionOptions) -> Vec<IdNameField> {
	let split = opts.multiple_task_mode == MultipleTaskMode::Split;
	let mut tasks = Vec::new();

	if let Some(pattern) = &opts.summary {
		tasks.extend(entry.tasks_from_summary(pattern));
	}

	if let Some(pattern) = &opts.tags {
		if split || tasks.is_empty() {
			tasks.extend(entry.tasks_from_tags(tags, pattern));
		}
	}

	if let Some(pattern) = &opts.project {
		if split || tasks.is_empty() {
			tasks.extend(entry.tasks_from_project(pattern));
		}
	}

	if opts.multiple_task_mode == MultipleTaskMode::FirstOnly {
		tasks.truncate(1);
	}

	tasks
}

/// Assign extracted tasks to an entry.
///
/// Without extracted tasks the entry is kept as-is. Otherwise the entry is
/// split into one entry per task, sharing the durations evenly.
pub fn apply_tasks(entry: Entry, tags: &[IdNameField], opts: &TaskExtractionOptions) -> Entries {
	let tasks = extract_tasks(&entry, tags, opts);
	if tasks.is_empty() {
		return vec![entry];
	}

	entry
		.split_duration(tasks.len() as u32)
		.into_iter()
		.zip(tasks)
		.map(|(piece, task)| Entry { task, ..piece })
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::worklog::tests::entry;
	use std::time::Duration;

	fn pattern() -> Option<Regex> {
		Some(Regex::new(r"CPT-\d+").unwrap())
	}

	fn all_patterns(mode: MultipleTaskMode) -> TaskExtractionOptions {
		TaskExtractionOptions {
			summary: pattern(),
			tags: pattern(),
			project: pattern(),
			multiple_task_mode: mode,
		}
	}

	fn sample() -> (Entry, Vec<IdNameField>) {
		let mut entry = entry("", "CPT-1 and CPT-2");
		entry.project = IdNameField::new("456", "CPT-4 project");
		let tags = vec![IdNameField::new("t3", "CPT-3")];
		(entry, tags)
	}

	fn names(tasks: &[IdNameField]) -> Vec<&str> {
		tasks.iter().map(|x| x.name.as_str()).collect()
	}

	#[test]
	fn parses_multiple_task_mode() {
		assert_eq!("split".parse::<MultipleTaskMode>().unwrap(), MultipleTaskMode::Split);
		assert_eq!("first-only".parse::<MultipleTaskMode>().unwrap(), MultipleTaskMode::FirstOnly);
		assert!(matches!("first".parse::<MultipleTaskMode>(), Err(ConfigError::UnknownTaskMode(_))));
	}

	#[test]
	fn no_patterns_no_tasks() {
		let (entry, tags) = sample();
		let opts = TaskExtractionOptions::default();
		assert!(!opts.is_enabled());
		assert!(extract_tasks(&entry, &tags, &opts).is_empty());
	}

	#[test]
	fn first_only_prefers_summary() {
		let (entry, tags) = sample();
		let tasks = extract_tasks(&entry, &tags, &all_patterns(MultipleTaskMode::FirstOnly));
		assert_eq!(names(&tasks), ["CPT-1"]);
	}

	#[test]
	fn first_only_falls_back_to_tags_then_project() {
		let (mut entry, tags) = sample();
		entry.summary = "meeting".into();
		let opts = all_patterns(MultipleTaskMode::FirstOnly);
		assert_eq!(extract_tasks(&entry, &tags, &opts), vec![IdNameField::new("t3", "CPT-3")]);
		assert_eq!(extract_tasks(&entry, &[], &opts), vec![IdNameField::new("456", "CPT-4")]);
	}

	#[test]
	fn split_concatenates_in_priority_order() {
		let (entry, tags) = sample();
		let tasks = extract_tasks(&entry, &tags, &all_patterns(MultipleTaskMode::Split));
		assert_eq!(names(&tasks), ["CPT-1", "CPT-2", "CPT-3", "CPT-4"]);
	}

	#[test]
	fn only_configured_fields_are_used() {
		let (entry, tags) = sample();
		let opts = TaskExtractionOptions {
			project: pattern(),
			multiple_task_mode: MultipleTaskMode::Split,
			..Default::default()
		};
		assert_eq!(names(&extract_tasks(&entry, &tags, &opts)), ["CPT-4"]);
	}

	#[test]
	fn apply_without_tasks_keeps_entry() {
		let (mut entry, _) = sample();
		entry.task = IdNameField::new("789", "CPT-2014");
		let result = apply_tasks(entry.clone(), &[], &TaskExtractionOptions::default());
		assert_eq!(result, vec![entry]);
	}

	#[test]
	fn apply_split_divides_time() {
		let (mut entry, tags) = sample();
		entry.billable_duration = Duration::from_secs(4 * 900);
		let result = apply_tasks(entry, &tags, &all_patterns(MultipleTaskMode::Split));
		assert_eq!(result.len(), 4);
		for (piece, name) in result.iter().zip(["CPT-1", "CPT-2", "CPT-3", "CPT-4"]) {
			assert_eq!(piece.task.name, name);
			assert_eq!(piece.billable_duration, Duration::from_secs(900));
		}
	}

	#[test]
	fn apply_first_only_keeps_time() {
		let (entry, tags) = sample();
		let result = apply_tasks(entry.clone(), &tags, &all_patterns(MultipleTaskMode::FirstOnly));
		assert_eq!(result.len(), 1);
		assert_eq!(result[0].task.name, "CPT-1");
		assert_eq!(result[0].total_duration(), entry.total_duration());
	}
}
