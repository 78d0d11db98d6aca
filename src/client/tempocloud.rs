//! Tempo Cloud, with issue IDs resolved through Jira Cloud.

use std::time::Duration;

use super::http::{Auth, HttpClient};
use super::{UploadOptions, Uploader};
use crate::duration::transmitted_seconds;
use crate::error::{HttpError, UploadError};
use crate::worklog::Entry;

pub const TEMPO_PATH_WORKLOG_CREATE: &str = "/4/worklogs";
/// Followed by the issue key.
pub const JIRA_PATH_ISSUE: &str = "/rest/api/3/issue/";

/// The part of a Jira issue needed to log time against it.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct JiraIssue {
	#[serde(deserialize_with = "deserialize_id")]
	pub id: u64,
	pub key: String,
}

/// Jira reports issue IDs as strings.
fn deserialize_id<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
	let id: String = serde::Deserialize::deserialize(deserializer)?;
	id.parse().map_err(serde::de::Error::custom)
}

/// Payload to create a worklog.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEntry {
	#[serde(skip_serializing_if = "String::is_empty")]
	pub description: String,
	pub issue_id: u64,
	/// YYYY-MM-DD
	pub start_date: String,
	/// HH:MM:SS
	pub start_time: String,
	pub billable_seconds: u64,
	pub time_spent_seconds: u64,
	pub author_account_id: String,
}

pub struct TempoCloudClient {
	tempo: HttpClient,
	jira: HttpClient,
}

pub struct TempoCloudOptions<'a> {
	pub tempo_url: &'a str,
	pub tempo_token: &'a str,
	pub jira_url: &'a str,
	pub jira_username: &'a str,
	pub jira_api_key: &'a str,
	pub timeout: Duration,
}

impl TempoCloudClient {
	pub fn new(opts: &TempoCloudOptions) -> Result<Self, HttpError> {
		let tempo = HttpClient::new(opts.tempo_url, Auth::bearer(opts.tempo_token), opts.timeout)?;
		let jira_auth = Auth::Basic {
			username: opts.jira_username.into(),
			password: opts.jira_api_key.into(),
		};
		let jira = HttpClient::new(opts.jira_url, jira_auth, opts.timeout)?;
		Ok(Self { tempo, jira })
	}

	async fn resolve_issue(&self, key: &str) -> Result<JiraIssue, UploadError> {
		let lookup_error = |source| UploadError::IssueLookup { key: key.to_string(), source };
		let url = self.jira
			.url(&format!("{}{}", JIRA_PATH_ISSUE, urlencoding::encode(key)), &[])
			.map_err(lookup_error)?;
		self.jira.get(url).await.map_err(lookup_error)
	}
}

#[async_trait::async_trait]
impl Uploader for TempoCloudClient {
	async fn upload_entry(&self, entry: &Entry, opts: &UploadOptions) -> Result<(), UploadError> {
		if entry.task.name.is_empty() {
			return Err(UploadError::MissingTask);
		}
		let issue = self.resolve_issue(&entry.task.name).await?;

		let seconds = transmitted_seconds(
			entry.billable_duration,
			entry.unbillable_duration,
			opts.treat_duration_as_billed,
			opts.round_to_closest_minute,
		);

		let upload = UploadEntry {
			description: entry.summary.clone(),
			issue_id: issue.id,
			start_date: entry.start.format("%Y-%m-%d").to_string(),
			start_time: entry.start.format("%H:%M:%S").to_string(),
			billable_seconds: seconds.billable,
			time_spent_seconds: seconds.time_spent,
			author_account_id: opts.user.clone(),
		};

		let url = self.tempo.url(TEMPO_PATH_WORKLOG_CREATE, &[])?;
		self.tempo.post_ignore_response(url, &upload).await?;
		Ok(())
	}
}
