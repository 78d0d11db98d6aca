use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single HTTP call.
#[derive(Debug, Error)]
pub enum HttpError {
	#[error("invalid URL {url}: {source}")]
	InvalidUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},
	#[error("failed to build HTTP client: {0}")]
	ClientBuild(#[source] reqwest::Error),
	#[error("{method} {url}: error sending request: {source}")]
	Send {
		method: reqwest::Method,
		url: String,
		#[source]
		source: reqwest::Error,
	},
	#[error("{method} {url}: server responded with status code {status}: {body}")]
	Status {
		method: reqwest::Method,
		url: String,
		status: reqwest::StatusCode,
		body: String,
	},
	#[error("{method} {url}: error parsing response: {source}")]
	Decode {
		method: reqwest::Method,
		url: String,
		#[source]
		source: reqwest::Error,
	},
}

/// Failure of a whole fetch. No entries are returned alongside it.
#[derive(Debug, Error)]
pub enum FetchError {
	#[error("failed to fetch entries: {0}")]
	Http(#[from] HttpError),
	#[error("failed to fetch entries: {0}")]
	Parse(String),
}

/// Failure to upload a single entry.
#[derive(Debug, Error)]
pub enum UploadError {
	#[error("failed to upload entry: {0}")]
	Http(#[from] HttpError),
	#[error("failed to upload entry: cannot resolve issue {key}: {source}")]
	IssueLookup {
		key: String,
		#[source]
		source: HttpError,
	},
	#[error("failed to upload entry: entry has no task")]
	MissingTask,
	#[error("upload cancelled")]
	Cancelled,
	/// The upload task stopped before reporting a result for the entry.
	#[error("failed to upload entry: upload task stopped without reporting a result")]
	Lost,
}

/// Invalid configuration, detected before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read configuration file {}: {source}", .path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse configuration file {}: {source}", .path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
	#[error("invalid {field} pattern: {source}")]
	InvalidPattern {
		field: &'static str,
		#[source]
		source: regex::Error,
	},
	#[error("unknown multiple task mode {0:?}, expected one of: split, first-only")]
	UnknownTaskMode(String),
	#[error("no source implementation found for {0:?}")]
	UnknownSource(String),
	#[error("no target implementation found for {0:?}")]
	UnknownTarget(String),
	#[error("source {0:?} provides no tags, tags_pattern must be empty")]
	TagsUnsupported(String),
	#[error("missing [{0}] section in configuration")]
	MissingSection(&'static str),
	#[error("{0}")]
	Http(#[from] HttpError),
}
