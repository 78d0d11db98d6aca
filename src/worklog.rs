//! Canonical worklog model shared by every provider.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::NaiveDateTime;
use regex::Regex;

/// A provider key together with its human readable label.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdNameField {
	pub id: String,
	pub name: String,
}

impl IdNameField {
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
		}
	}
}

/// One unit of tracked time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
	pub client: IdNameField,
	pub project: IdNameField,
	pub task: IdNameField,
	pub summary: String,
	pub notes: String,
	/// Local wall clock time. Providers without a time of day use midnight.
	pub start: NaiveDateTime,
	pub billable_duration: Duration,
	pub unbillable_duration: Duration,
}

/// Entries in fetch order.
pub type Entries = Vec<Entry>;

impl Entry {
	pub fn total_duration(&self) -> Duration {
		self.billable_duration + self.unbillable_duration
	}

	/// The key used to group entries for upload.
	///
	/// The task name is preferred, the task ID is used when the name is empty.
	/// Entries without any task information yield `None`.
	pub fn task_key(&self) -> Option<String> {
		if !self.task.name.is_empty() {
			Some(self.task.name.clone())
		} else if !self.task.id.is_empty() {
			Some(self.task.id.clone())
		} else {
			None
		}
	}

	/// All task references found in the summary.
	pub fn tasks_from_summary(&self, pattern: &Regex) -> Vec<IdNameField> {
		pattern
			.find_iter(&self.summary)
			.map(|task| IdNameField::new(task.as_str(), task.as_str()))
			.collect()
	}

	/// Task references from the tags whose name matches the pattern.
	pub fn tasks_from_tags(&self, tags: &[IdNameField], pattern: &Regex) -> Vec<IdNameField> {
		tags
			.iter()
			.filter_map(|tag| {
				pattern
					.find(&tag.name)
					.map(|task| IdNameField::new(tag.id.as_str(), task.as_str()))
			})
			.collect()
	}

	/// The task reference embedded in the project name, if any.
	pub fn tasks_from_project(&self, pattern: &Regex) -> Vec<IdNameField> {
		pattern
			.find(&self.project.name)
			.map(|task| IdNameField::new(self.project.id.as_str(), task.as_str()))
			.into_iter()
			.collect()
	}

	/// Split the entry into `parts` entries dividing both durations evenly.
	///
	/// The remainder of the division is added to the first piece, so the
	/// total duration is conserved.
	pub fn split_duration(&self, parts: u32) -> Entries {
		if parts <= 1 {
			return vec![self.clone()];
		}

		let billable = self.billable_duration / parts;
		let unbillable = self.unbillable_duration / parts;

		let mut pieces: Entries = (0..parts)
			.map(|_| Entry {
				billable_duration: billable,
				unbillable_duration: unbillable,
				..self.clone()
			})
			.collect();

		pieces[0].billable_duration += self.billable_duration - billable * parts;
		pieces[0].unbillable_duration += self.unbillable_duration - unbillable * parts;
		pieces
	}
}

impl fmt::Display for Entry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let minutes = self.total_duration().as_secs() / 60;
		write!(
			f,
			"{} [{}] {}:{:02} {}",
			self.start.format("%Y-%m-%d %H:%M"),
			self.task_key().as_deref().unwrap_or("-"),
			minutes / 60,
			minutes % 60,
			self.summary,
		)
	}
}

/// Partition entries by task, keeping the relative order inside each group.
///
/// Entries without a task end up in the `None` group.
pub fn group_by_task(entries: impl IntoIterator<Item = Entry>) -> BTreeMap<Option<String>, Entries> {
	index_by(entries, |entry| entry.task_key())
}

pub fn index_by<I, F, T, K>(input: I, mut key: F) -> BTreeMap<K, Vec<T>>
where
	I: IntoIterator<Item = T>,
	F: FnMut(&T) -> K,
	K: std::cmp::Ord,
{
	use std::collections::btree_map::Entry;
	let mut result = BTreeMap::new();
	for item in input {
		match result.entry(key(&item)) {
			Entry::Vacant(entry) => {
				entry.insert(vec![item]);
			},
			Entry::Occupied(mut entry) => {
				entry.get_mut().push(item);
			},
		}
	}

	result
}
