//! Issue list fetching.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::remote::{GitLabApi, IssueQuery, IssueSummary, PageMeta};
use crate::types::PaginationInfo;

use super::epoch::Epoch;
use super::filter::FilterState;

/// One fetched page, tagged with the epoch it was requested under.
#[derive(Debug, Clone)]
pub struct IssuePage {
    pub epoch: Epoch,
    pub items: Vec<IssueSummary>,
    pub pagination: PaginationInfo,
}

/// Turns a [`FilterState`] into a list request and normalizes the reply.
///
/// The engine does no staleness filtering; it hands back the epoch it was
/// given so the caller can decide whether the page still matters.
pub struct IssueQueryEngine<A> {
    api: Arc<A>,
    per_page: u32,
}

impl<A: GitLabApi> IssueQueryEngine<A> {
    pub fn new(api: Arc<A>, per_page: u32) -> Self {
        Self {
            api,
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn build_query(&self, filter: &FilterState) -> IssueQuery {
        IssueQuery {
            project_id: filter.project_id,
            assignee_id: filter.assignee_id,
            author_id: filter.author_id,
            page: filter.page.max(1),
            per_page: self.per_page,
        }
    }

    pub async fn list_issues(&self, filter: &FilterState, epoch: Epoch) -> Result<IssuePage> {
        let query = self.build_query(filter);
        debug!(epoch = %epoch, path = %query.path(), page = query.page, "listing issues");

        let paged = self.api.list_issues(&query).await?;
        let pagination = normalize_pagination(&paged.meta, paged.items.len(), &query);

        Ok(IssuePage {
            epoch,
            items: paged.items,
            pagination,
        })
    }
}

/// Fill in [`PaginationInfo`] from whatever headers the server sent.
///
/// Missing page or page size fall back to what was requested. Without a
/// page count it is derived from the total, and without a total the list
/// is treated as a single page of `returned` items. The current page is
/// reported as-is even when it lies past the last page.
pub fn normalize_pagination(meta: &PageMeta, returned: usize, query: &IssueQuery) -> PaginationInfo {
    let per_page = meta.per_page.filter(|n| *n > 0).unwrap_or(query.per_page).max(1);
    let current_page = meta.page.filter(|n| *n > 0).unwrap_or(query.page).max(1);

    let (total_items, total_pages) = match (meta.total, meta.total_pages) {
        (Some(total), Some(pages)) => (total, pages),
        (Some(total), None) => {
            let pages = total.div_ceil(u64::from(per_page));
            (total, u32::try_from(pages).unwrap_or(u32::MAX))
        }
        (None, Some(pages)) => (returned as u64, pages),
        (None, None) => (returned as u64, 1),
    };

    PaginationInfo {
        current_page,
        total_pages: total_pages.max(1),
        total_items,
        per_page,
    }
}
