//! Generic page walking for paginated sources.

use std::future::Future;

use url::Url;

use super::FetchOptions;
use crate::error::FetchError;
use crate::worklog::Entries;

/// Page size used when a provider has no preference.
///
/// Minimum page sizes differ per provider, but 50 items per page is
/// supported nearly everywhere.
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_PAGE_SIZE_PARAM: &str = "per_page";
pub const DEFAULT_PAGE_PARAM: &str = "page";

/// Pagination details reported by a provider for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatedFetchResponse {
	/// Number of records in the page that was just fetched.
	pub entries_per_page: usize,
	/// Number of records available in total.
	pub total_entries: usize,
}

#[derive(Debug, Clone)]
pub struct Pagination {
	pub url: Url,
	pub page_size: usize,
	pub page_size_param: String,
	pub page_param: String,
}

impl Pagination {
	pub fn new(url: Url) -> Self {
		Self {
			url,
			page_size: DEFAULT_PAGE_SIZE,
			page_size_param: DEFAULT_PAGE_SIZE_PARAM.into(),
			page_param: DEFAULT_PAGE_PARAM.into(),
		}
	}

	/// URL of the given page, counting from 1.
	pub fn page_url(&self, page: usize) -> Url {
		let mut url = self.url.clone();
		url.query_pairs_mut()
			.append_pair(&self.page_param, &page.to_string())
			.append_pair(&self.page_size_param, &self.page_size.to_string());
		url
	}
}

/// Fetch and parse pages until every record was seen or a page came back empty.
///
/// The first error aborts the walk. Entries parsed from earlier pages are
/// dropped, so callers never observe a partial result.
pub async fn fetch_all_pages<P, F, Fut, Parse>(
	pagination: &Pagination,
	opts: &FetchOptions,
	fetch_page: F,
	parse_page: Parse,
) -> Result<Entries, FetchError>
where
	F: Fn(Url) -> Fut,
	Fut: Future<Output = Result<(P, PaginatedFetchResponse), FetchError>>,
	Parse: Fn(P, &FetchOptions) -> Result<Entries, FetchError>,
{
	let mut entries = Entries::new();
	let mut fetched = 0;
	let mut page = 1;

	loop {
		let (raw, response) = fetch_page(pagination.page_url(page)).await?;
		entries.extend(parse_page(raw, opts)?);
		fetched += response.entries_per_page;

		log::debug!(
			"fetched page {} with {} records ({} of {})",
			page,
			response.entries_per_page,
			fetched,
			response.total_entries,
		);

		if response.entries_per_page == 0 || fetched >= response.total_entries {
			break;
		}
		page += 1;
	}

	Ok(entries)
}
