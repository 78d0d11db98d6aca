//! Synchronize worklog entries between time tracking providers.
//!
//! Entries are fetched from a source provider, optionally assigned to tasks
//! extracted from their summary, tags or project, and uploaded to a target
//! provider concurrently, one task per group of entries.

pub mod client;
pub mod config;
pub mod duration;
pub mod error;
pub mod worklog;

pub use client::upload::{collect_results, upload_entries, UploadSummary};
pub use client::{extract_tasks, FetchOptions, Fetcher, MultipleTaskMode, TaskExtractionOptions, UploadOptions, Uploader};
pub use worklog::{group_by_task, Entries, Entry, IdNameField};
