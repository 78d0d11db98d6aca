//! Provider selection by name.

use std::sync::Arc;

use super::harvest::HarvestClient;
use super::tempo::TempoClient;
use super::tempocloud::{TempoCloudClient, TempoCloudOptions};
use super::{Fetcher, Uploader};
use crate::config::Config;
use crate::error::ConfigError;

pub const SOURCES: &[&str] = &["harvest", "tempo"];
pub const TARGETS: &[&str] = &["tempo", "tempo-cloud"];

pub fn new_fetcher(name: &str, config: &Config) -> Result<Arc<dyn Fetcher>, ConfigError> {
	let timeout = config.request_timeout();
	match name {
		"harvest" => {
			reject_tags_pattern(name, config)?;
			let harvest = config.harvest.as_ref().ok_or(ConfigError::MissingSection("harvest"))?;
			Ok(Arc::new(HarvestClient::new(&harvest.url, &harvest.account_id, &harvest.token, timeout)?))
		},
		"tempo" => {
			reject_tags_pattern(name, config)?;
			let tempo = config.tempo.as_ref().ok_or(ConfigError::MissingSection("tempo"))?;
			Ok(Arc::new(TempoClient::new(&tempo.url, &tempo.username, &tempo.password, timeout)?))
		},
		other => Err(ConfigError::UnknownSource(other.to_string())),
	}
}

/// None of the sources attach tags to their entries, so a tags pattern would never match.
fn reject_tags_pattern(source: &str, config: &Config) -> Result<(), ConfigError> {
	match config.task_extraction.tags_pattern.as_deref() {
		Some(pattern) if !pattern.is_empty() => Err(ConfigError::TagsUnsupported(source.to_string())),
		_ => Ok(()),
	}
}

pub fn new_uploader(name: &str, config: &Config) -> Result<Arc<dyn Uploader>, ConfigError> {
	let timeout = config.request_timeout();
	match name {
		"tempo" => {
			let tempo = config.tempo.as_ref().ok_or(ConfigError::MissingSection("tempo"))?;
			Ok(Arc::new(TempoClient::new(&tempo.url, &tempo.username, &tempo.password, timeout)?))
		},
		"tempo-cloud" => {
			let cloud = config.tempo_cloud.as_ref().ok_or(ConfigError::MissingSection("tempo_cloud"))?;
			Ok(Arc::new(TempoCloudClient::new(&TempoCloudOptions {
				tempo_url: &cloud.url,
				tempo_token: &cloud.token,
				jira_url: &cloud.jira_url,
				jira_username: &cloud.jira_username,
				jira_api_key: &cloud.jira_api_key,
				timeout,
			})?))
		},
		other => Err(ConfigError::UnknownTarget(other.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::tests::{parse, SAMPLE};

	#[test]
	fn builds_configured_providers() {
		let config = parse(SAMPLE).unwrap();
		assert!(new_fetcher("harvest", &config).is_ok());
		assert!(new_uploader("tempo-cloud", &config).is_ok());
	}

	#[test]
	fn rejects_unknown_providers() {
		let config = parse(SAMPLE).unwrap();
		assert!(matches!(new_fetcher("toggl", &config), Err(ConfigError::UnknownSource(name)) if name == "toggl"));
		assert!(matches!(new_uploader("paymo", &config), Err(ConfigError::UnknownTarget(name)) if name == "paymo"));
	}

	#[test]
	fn rejects_unsupported_roles() {
		let config = parse(SAMPLE).unwrap();
		assert!(matches!(new_fetcher("tempo-cloud", &config), Err(ConfigError::UnknownSource(_))));
		assert!(matches!(new_uploader("harvest", &config), Err(ConfigError::UnknownTarget(_))));
	}

	#[test]
	fn requires_provider_section() {
		let config = parse(SAMPLE).unwrap();
		assert!(matches!(new_fetcher("tempo", &config), Err(ConfigError::MissingSection("tempo"))));
		assert!(matches!(new_uploader("tempo", &config), Err(ConfigError::MissingSection("tempo"))));
	}

	#[test]
	fn rejects_tags_pattern_for_sources_without_tags() {
		let data = SAMPLE.replace(r#"tags_pattern = """#, r#"tags_pattern = 'task:\w+'"#);
		let config = parse(&data).unwrap();
		assert!(config.task_extraction().unwrap().tags.is_some());
		assert!(matches!(new_fetcher("harvest", &config), Err(ConfigError::TagsUnsupported(name)) if name == "harvest"));
		assert!(matches!(new_fetcher("tempo", &config), Err(ConfigError::TagsUnsupported(name)) if name == "tempo"));
		assert!(new_uploader("tempo-cloud", &config).is_ok());
	}

	#[test]
	fn rejects_invalid_urls() {
		let data = SAMPLE.replace("https://example.atlassian.net", "example.atlassian.net");
		let config = parse(&data).unwrap();
		assert!(matches!(new_uploader("tempo-cloud", &config), Err(ConfigError::Http(_))));
	}
}
