use std::path::Path;
use std::time::Duration;

use regex::Regex;

use crate::client::http::DEFAULT_REQUEST_TIMEOUT;
use crate::client::{TaskExtractionOptions, UploadOptions};
use crate::error::ConfigError;

#[derive(Debug, serde::Deserialize)]
pub struct Config {
	pub general: GeneralConfig,
	#[serde(default)]
	pub task_extraction: TaskExtractionConfig,
	pub harvest: Option<HarvestConfig>,
	pub tempo: Option<TempoConfig>,
	pub tempo_cloud: Option<TempoCloudConfig>,
}

#[derive(Debug, serde::Deserialize)]
pub struct GeneralConfig {
	pub source: String,
	pub target: String,
	#[serde(default)]
	pub source_user: String,
	#[serde(default)]
	pub target_user: String,
	#[serde(default)]
	pub treat_duration_as_billed: bool,
	#[serde(default)]
	pub round_to_closest_minute: bool,
	pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct TaskExtractionConfig {
	pub summary_pattern: Option<String>,
	pub tags_pattern: Option<String>,
	pub project_pattern: Option<String>,
	pub multiple_task_mode: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct HarvestConfig {
	#[serde(default = "default_harvest_url")]
	pub url: String,
	pub account_id: String,
	pub token: String,
}

#[derive(serde::Deserialize)]
pub struct TempoConfig {
	pub url: String,
	pub username: String,
	pub password: String,
}

#[derive(serde::Deserialize)]
pub struct TempoCloudConfig {
	#[serde(default = "default_tempo_cloud_url")]
	pub url: String,
	pub token: String,
	pub jira_url: String,
	pub jira_username: String,
	pub jira_api_key: String,
}

fn default_harvest_url() -> String {
	"https://api.harvestapp.com".into()
}

fn default_tempo_cloud_url() -> String {
	"https://api.tempo.io".into()
}

macro_rules! redacted_debug {
	($name:ident { $($field:ident),* }) => {
		impl std::fmt::Debug for $name {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				f.debug_struct(stringify!($name))
					$(.field(stringify!($field), &self.$field))*
					.finish_non_exhaustive()
			}
		}
	};
}

redacted_debug!(HarvestConfig { url, account_id });
redacted_debug!(TempoConfig { url, username });
redacted_debug!(TempoCloudConfig { url, jira_url, jira_username });

impl Config {
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let data = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
		Self::parse(&data, path)
	}

	pub fn parse(data: &str, path: &Path) -> Result<Self, ConfigError> {
		toml::from_str(data)
			.map_err(|source| ConfigError::Parse { path: path.to_owned(), source })
	}

	/// Compile the task extraction patterns. Empty patterns count as unset.
	pub fn task_extraction(&self) -> Result<TaskExtractionOptions, ConfigError> {
		let config = &self.task_extraction;
		let multiple_task_mode = match config.multiple_task_mode.as_deref() {
			None | Some("") => Default::default(),
			Some(mode) => mode.parse()?,
		};

		Ok(TaskExtractionOptions {
			summary: compile_pattern("summary", config.summary_pattern.as_deref())?,
			tags: compile_pattern("tags", config.tags_pattern.as_deref())?,
			project: compile_pattern("project", config.project_pattern.as_deref())?,
			multiple_task_mode,
		})
	}

	pub fn upload_options(&self) -> UploadOptions {
		UploadOptions {
			user: self.general.target_user.clone(),
			treat_duration_as_billed: self.general.treat_duration_as_billed,
			round_to_closest_minute: self.general.round_to_closest_minute,
		}
	}

	pub fn request_timeout(&self) -> Duration {
		self.general
			.request_timeout_secs
			.map(Duration::from_secs)
			.unwrap_or(DEFAULT_REQUEST_TIMEOUT)
	}
}

fn compile_pattern(field: &'static str, pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
	match pattern {
		None | Some("") => Ok(None),
		Some(pattern) => Regex::new(pattern)
			.map(Some)
			.map_err(|source| ConfigError::InvalidPattern { field, source }),
	}
}
