use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use worklog_sync::client::registry::{self, SOURCES, TARGETS};
use worklog_sync::client::upload::LogProgress;
use worklog_sync::config::Config;
use worklog_sync::{collect_results, upload_entries, FetchOptions};

/// Copy worklog entries from one time tracking provider to another.
#[derive(Parser)]
#[command(version)]
struct Options {
	#[arg(short, long)]
	#[arg(value_name = "FILE")]
	#[arg(default_value = "worklog-sync.toml")]
	config: PathBuf,

	/// First day to synchronize, defaults to today.
	#[arg(long)]
	#[arg(value_name = "YYYY-MM-DD")]
	start: Option<NaiveDate>,

	/// Last day to synchronize, inclusive, defaults to today.
	#[arg(long)]
	#[arg(value_name = "YYYY-MM-DD")]
	end: Option<NaiveDate>,

	/// Override the source provider of the configuration file.
	#[arg(long)]
	source: Option<String>,

	/// Override the target provider of the configuration file.
	#[arg(long)]
	target: Option<String>,

	/// Fetch and print the entries without uploading them.
	#[arg(long)]
	dry_run: bool,

	#[arg(short, long)]
	verbose: bool,
}

#[tokio::main]
async fn main() {
	let options = Options::parse();

	let level = if options.verbose { "debug" } else { "info" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

	if do_main(options).await.is_err() {
		std::process::exit(1);
	}
}

async fn do_main(options: Options) -> Result<(), ()> {
	let config = Config::from_file(&options.config)
		.map_err(|e| log::error!("{}", e))?;

	let source = options.source.as_deref().unwrap_or(&config.general.source);
	let target = options.target.as_deref().unwrap_or(&config.general.target);

	let today = chrono::Local::now().date_naive();
	let start = options.start.unwrap_or(today);
	let end = options.end.unwrap_or(today);
	if start > end {
		log::error!("Start date {} is after end date {}", start, end);
		return Err(());
	}

	let fetch_opts = FetchOptions {
		user: config.general.source_user.clone(),
		start,
		end,
		task_extraction: config.task_extraction().map_err(|e| log::error!("{}", e))?,
	};

	let fetcher = registry::new_fetcher(source, &config)
		.map_err(|e| log::error!("{} (available sources: {})", e, SOURCES.join(", ")))?;
	let uploader = if options.dry_run {
		None
	} else {
		let uploader = registry::new_uploader(target, &config)
			.map_err(|e| log::error!("{} (available targets: {})", e, TARGETS.join(", ")))?;
		Some(uploader)
	};

	let entries = fetcher.fetch_entries(&fetch_opts)
		.await
		.map_err(|e| log::error!("{}", e))?;
	log::info!("Fetched {} entries from {} between {} and {}", entries.len(), source, start, end);

	let uploader = match uploader {
		Some(uploader) => uploader,
		None => {
			for entry in &entries {
				println!("{}", entry);
			}
			return Ok(());
		},
	};

	let cancel = CancellationToken::new();
	tokio::spawn({
		let cancel = cancel.clone();
		async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				log::warn!("Interrupted, waiting for uploads in flight");
				cancel.cancel();
			}
		}
	});

	let expected = entries.len();
	let mut results = upload_entries(uploader, entries, Arc::new(config.upload_options()), Arc::new(LogProgress), cancel);
	let summary = collect_results(&mut results, expected).await;

	log::info!("Uploaded {} of {} entries to {}", summary.uploaded, expected, target);
	if summary.is_success() {
		Ok(())
	} else {
		log::error!("{} entries failed to upload", summary.errors.len());
		Err(())
	}
}
