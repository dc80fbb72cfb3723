//! Pagination metadata carried in GitLab response headers.

use reqwest::header::HeaderMap;

pub const TOTAL_HEADER: &str = "x-total";
pub const TOTAL_PAGES_HEADER: &str = "x-total-pages";
pub const PAGE_HEADER: &str = "x-page";
pub const PER_PAGE_HEADER: &str = "x-per-page";

/// Header values as sent by the server; any of them may be missing.
///
/// GitLab drops `X-Total` and `X-Total-Pages` for listings over 10,000
/// rows, so callers must cope with partial metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub total: Option<u64>,
    pub total_pages: Option<u32>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            total: header_number(headers, TOTAL_HEADER),
            total_pages: header_number(headers, TOTAL_PAGES_HEADER),
            page: header_number(headers, PAGE_HEADER),
            per_page: header_number(headers, PER_PAGE_HEADER),
        }
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<T>().ok())
}
