//! Harvest time entries, fetched page by page.

use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};

use super::http::{Auth, HttpClient};
use super::paginate::{fetch_all_pages, PaginatedFetchResponse, Pagination};
use super::{apply_tasks, FetchOptions, Fetcher};
use crate::error::{FetchError, HttpError};
use crate::worklog::{Entries, Entry, IdNameField};

pub const PATH_TIME_ENTRIES: &str = "/v2/time_entries";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Reference {
	pub id: u64,
	pub name: String,
}

impl From<&Reference> for IdNameField {
	fn from(value: &Reference) -> Self {
		IdNameField::new(value.id.to_string(), value.name.as_str())
	}
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FetchEntry {
	pub id: u64,
	pub spent_date: NaiveDate,
	/// Only present when the account tracks timestamps, like "8:00am".
	#[serde(default)]
	pub started_time: Option<String>,
	pub hours: f64,
	#[serde(default)]
	pub notes: Option<String>,
	pub billable: bool,
	pub client: Reference,
	pub project: Reference,
	pub task: Reference,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FetchResponse {
	pub time_entries: Vec<FetchEntry>,
	pub per_page: usize,
	pub total_entries: usize,
}

pub struct HarvestClient {
	http: HttpClient,
}

impl HarvestClient {
	pub fn new(api_root: &str, account_id: &str, token: &str, timeout: Duration) -> Result<Self, HttpError> {
		let http = HttpClient::new(api_root, Auth::bearer(token), timeout)?
			.with_header("Harvest-Account-Id", account_id);
		Ok(Self { http })
	}
}

#[async_trait::async_trait]
impl Fetcher for HarvestClient {
	async fn fetch_entries(&self, opts: &FetchOptions) -> Result<Entries, FetchError> {
		let from = opts.start.format("%Y-%m-%d").to_string();
		let to = opts.end.format("%Y-%m-%d").to_string();
		let mut query = vec![("from", from.as_str()), ("to", to.as_str())];
		if !opts.user.is_empty() {
			query.push(("user_id", opts.user.as_str()));
		}

		let pagination = Pagination::new(self.http.url(PATH_TIME_ENTRIES, &query)?);
		fetch_all_pages(&pagination, opts, |url| self.fetch_page(url), parse_page).await
	}
}

impl HarvestClient {
	async fn fetch_page(&self, url: url::Url) -> Result<(FetchResponse, PaginatedFetchResponse), FetchError> {
		let page: FetchResponse = self.http.get(url).await?;
		let response = PaginatedFetchResponse {
			entries_per_page: page.time_entries.len(),
			total_entries: page.total_entries,
		};
		Ok((page, response))
	}
}

fn parse_page(page: FetchResponse, opts: &FetchOptions) -> Result<Entries, FetchError> {
	let mut entries = Entries::new();
	for record in page.time_entries {
		let entry = parse_entry(&record)?;
		entries.extend(apply_tasks(entry, &[], &opts.task_extraction));
	}
	Ok(entries)
}

fn parse_entry(record: &FetchEntry) -> Result<Entry, FetchError> {
	if !record.hours.is_finite() || record.hours < 0.0 {
		return Err(FetchError::Parse(format!("time entry {} has invalid hours: {}", record.id, record.hours)));
	}

	let start_time = match &record.started_time {
		Some(time) => parse_started_time(time)
			.ok_or_else(|| FetchError::Parse(format!("time entry {} has invalid start time: {}", record.id, time)))?,
		None => NaiveTime::MIN,
	};

	let duration = Duration::try_from_secs_f64(record.hours * 3600.0)
		.map_err(|e| FetchError::Parse(format!("time entry {} has invalid hours: {}: {}", record.id, record.hours, e)))?;
	let (billable_duration, unbillable_duration) = if record.billable {
		(duration, Duration::ZERO)
	} else {
		(Duration::ZERO, duration)
	};

	let notes = record.notes.clone().unwrap_or_default();
	Ok(Entry {
		client: (&record.client).into(),
		project: (&record.project).into(),
		task: (&record.task).into(),
		summary: notes.clone(),
		notes,
		start: record.spent_date.and_time(start_time),
		billable_duration,
		unbillable_duration,
	})
}

fn parse_started_time(time: &str) -> Option<NaiveTime> {
	let time = time.trim().to_ascii_uppercase();
	NaiveTime::parse_from_str(&time, "%I:%M%p")
		.or_else(|_| NaiveTime::parse_from_str(&time, "%H:%M"))
		.ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::client::{MultipleTaskMode, TaskExtractionOptions};
	use regex::Regex;
	use serde_json::json;
	use wiremock::matchers::{header, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn record(id: u64, notes: &str, hours: f64, billable: bool) -> serde_json::Value {
		json!({
			"id": id,
			"spent_date": "2021-10-02",
			"started_time": "9:30am",
			"hours": hours,
			"notes": notes,
			"billable": billable,
			"client": { "id": 1, "name": "My Awesome Company" },
			"project": { "id": 456, "name": "MARVEL" },
			"task": { "id": 789, "name": "Meetings" },
		})
	}

	fn fetch_opts(task_extraction: TaskExtractionOptions) -> FetchOptions {
		FetchOptions {
			user: "1234".into(),
			start: NaiveDate::from_ymd_opt(2021, 10, 1).unwrap(),
			end: NaiveDate::from_ymd_opt(2021, 10, 2).unwrap(),
			task_extraction,
		}
	}

	#[test]
	fn parses_started_time() {
		assert_eq!(parse_started_time("9:30am"), NaiveTime::from_hms_opt(9, 30, 0));
		assert_eq!(parse_started_time("1:05pm"), NaiveTime::from_hms_opt(13, 5, 0));
		assert_eq!(parse_started_time("14:00"), NaiveTime::from_hms_opt(14, 0, 0));
		assert_eq!(parse_started_time("later"), None);
	}

	#[test]
	fn unbillable_entries_keep_time_unbillable() {
		let record: FetchEntry = serde_json::from_value(record(1, "standup", 0.5, false)).unwrap();
		let entry = parse_entry(&record).unwrap();
		assert_eq!(entry.billable_duration, Duration::ZERO);
		assert_eq!(entry.unbillable_duration, Duration::from_secs(1800));
		assert_eq!(entry.task, IdNameField::new("789", "Meetings"));
		assert_eq!(entry.start.format("%Y-%m-%d %H:%M").to_string(), "2021-10-02 09:30");
	}

	#[test]
	fn rejects_negative_hours() {
		let record: FetchEntry = serde_json::from_value(record(1, "standup", -1.0, false)).unwrap();
		assert!(parse_entry(&record).is_err());
	}

	#[test]
	fn rejects_out_of_range_hours() {
		let record: FetchEntry = serde_json::from_value(record(1, "standup", 1e16, false)).unwrap();
		assert!(matches!(parse_entry(&record), Err(FetchError::Parse(message)) if message.contains("invalid hours")));
	}

	#[tokio::test]
	async fn fetches_every_page() {
		let server = MockServer::start().await;
		for (page, records) in [(1, vec![record(1, "CPT-2014 meet", 1.0, true), record(2, "CPT-2015 plan", 0.5, true)]), (2, vec![record(3, "misc", 0.25, false)])] {
			Mock::given(method("GET"))
				.and(path(PATH_TIME_ENTRIES))
				.and(query_param("page", page.to_string()))
				.and(query_param("per_page", "50"))
				.and(query_param("from", "2021-10-01"))
				.and(query_param("to", "2021-10-02"))
				.and(query_param("user_id", "1234"))
				.and(header("Authorization", "Bearer token"))
				.and(header("Harvest-Account-Id", "42"))
				.respond_with(ResponseTemplate::new(200).set_body_json(json!({
					"time_entries": records,
					"per_page": 2,
					"total_entries": 3,
				})))
				.expect(1)
				.mount(&server)
				.await;
		}

		let client = HarvestClient::new(&server.uri(), "42", "token", Duration::from_secs(5)).unwrap();
		let opts = fetch_opts(TaskExtractionOptions {
			summary: Some(Regex::new(r"CPT-\d+").unwrap()),
			multiple_task_mode: MultipleTaskMode::FirstOnly,
			..Default::default()
		});
		let entries = client.fetch_entries(&opts).await.unwrap();

		assert_eq!(entries.len(), 3);
		assert_eq!(entries[0].task, IdNameField::new("CPT-2014", "CPT-2014"));
		assert_eq!(entries[1].task, IdNameField::new("CPT-2015", "CPT-2015"));
		assert_eq!(entries[2].task, IdNameField::new("789", "Meetings"));
		assert_eq!(entries[2].unbillable_duration, Duration::from_secs(900));
	}

	#[tokio::test]
	async fn failing_page_returns_no_entries() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(query_param("page", "1"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"time_entries": [record(1, "a", 1.0, true)],
				"per_page": 1,
				"total_entries": 3,
			})))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(query_param("page", "2"))
			.respond_with(ResponseTemplate::new(500))
			.mount(&server)
			.await;

		let client = HarvestClient::new(&server.uri(), "42", "token", Duration::from_secs(5)).unwrap();
		let result = client.fetch_entries(&fetch_opts(TaskExtractionOptions::default())).await;
		assert!(matches!(result, Err(FetchError::Http(HttpError::Status { .. }))));
	}
}
