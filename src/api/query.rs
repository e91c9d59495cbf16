//! List-call query encoding: pipe-delimited filters and sort keys, `page` pagination.

// self
use crate::_prelude::*;

/// Sort and filter parameters for badge list calls.
///
/// Filters encode as a single `filter` query parameter of pipe-joined `key::value` pairs; sort
/// keys encode as a pipe-joined `sort` parameter (prefix a key with `-` for descending order).
/// Filters live in a [`BTreeMap`], so encoding order is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
	filters: BTreeMap<String, String>,
	sort: Vec<String>,
	page: Option<u32>,
}
impl ListQuery {
	/// Creates an empty query.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds (or replaces) a filter pair.
	pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.filters.insert(key.into(), value.into());

		self
	}

	/// Appends a sort key.
	pub fn sort_by(mut self, key: impl Into<String>) -> Self {
		self.sort.push(key.into());

		self
	}

	/// Requests a specific result page (1-based).
	pub fn page(mut self, page: u32) -> Self {
		self.page = Some(page);

		self
	}

	/// Overwrites a filter regardless of what the caller supplied.
	pub(crate) fn force_filter(&mut self, key: &str, value: impl Into<String>) {
		self.filters.insert(key.to_owned(), value.into());
	}

	/// Renders the `filter` parameter value, if any filters are present.
	pub fn filter_expression(&self) -> Option<String> {
		if self.filters.is_empty() {
			return None;
		}

		let joined = self
			.filters
			.iter()
			.map(|(key, value)| format!("{key}::{value}"))
			.collect::<Vec<_>>()
			.join("|");

		Some(joined)
	}

	/// Renders the `sort` parameter value, if any sort keys are present.
	pub fn sort_expression(&self) -> Option<String> {
		if self.sort.is_empty() { None } else { Some(self.sort.join("|")) }
	}

	/// Appends the encoded parameters to a query-pair list.
	pub(crate) fn append_to(&self, params: &mut Vec<(String, String)>) {
		if let Some(sort) = self.sort_expression() {
			params.push(("sort".into(), sort));
		}
		if let Some(filter) = self.filter_expression() {
			params.push(("filter".into(), filter));
		}
		if let Some(page) = self.page {
			params.push(("page".into(), page.to_string()));
		}
	}
}
