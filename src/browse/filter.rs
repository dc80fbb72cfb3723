//! Active issue filter and its page-reset rules.

use serde::Serialize;

use crate::types::{ProjectId, UserId};

use super::epoch::Epoch;

/// What the issue list is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub project_id: Option<ProjectId>,
    pub assignee_id: Option<UserId>,
    pub author_id: Option<UserId>,
    /// 1-based
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            project_id: None,
            assignee_id: None,
            author_id: None,
            page: 1,
        }
    }
}

/// Partial update to a [`FilterState`].
///
/// The outer `Option` says whether a field is being changed; the inner one
/// is the new value, so `Some(None)` clears a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub project_id: Option<Option<ProjectId>>,
    pub assignee_id: Option<Option<UserId>>,
    pub author_id: Option<Option<UserId>>,
    pub page: Option<u32>,
}

impl FilterPatch {
    pub fn project(project_id: Option<ProjectId>) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    pub fn assignee(assignee_id: Option<UserId>) -> Self {
        Self {
            assignee_id: Some(assignee_id),
            ..Self::default()
        }
    }

    pub fn author(author_id: Option<UserId>) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// True if the patch touches project, assignee or author.
    pub fn changes_scope(&self) -> bool {
        self.project_id.is_some() || self.assignee_id.is_some() || self.author_id.is_some()
    }
}

/// Owner of the filter tuple and the query epoch.
///
/// Pure state: applying a patch performs no I/O. The caller pairs the
/// returned state with [`FilterCoordinator::epoch`] when it dispatches the
/// matching request.
#[derive(Debug, Clone, Default)]
pub struct FilterCoordinator {
    state: FilterState,
    epoch: Epoch,
}

impl FilterCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing filter, e.g. one given on the command line.
    pub fn with_state(state: FilterState) -> Self {
        Self {
            state: FilterState {
                page: state.page.max(1),
                ..state
            },
            epoch: Epoch::ZERO,
        }
    }

    /// Apply `patch` and mint a new epoch.
    ///
    /// Any project/assignee/author change puts the list back on page 1, even
    /// if the patch also names a page. A page-only patch keeps the other
    /// fields. Page 0 is treated as page 1.
    pub fn set_filter(&mut self, patch: FilterPatch) -> FilterState {
        if let Some(project_id) = patch.project_id {
            self.state.project_id = project_id;
        }
        if let Some(assignee_id) = patch.assignee_id {
            self.state.assignee_id = assignee_id;
        }
        if let Some(author_id) = patch.author_id {
            self.state.author_id = author_id;
        }

        if patch.changes_scope() {
            self.state.page = 1;
        } else if let Some(page) = patch.page {
            self.state.page = page.max(1);
        }

        self.epoch = self.epoch.next();
        self.state
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.epoch == epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_page(page: u32) -> FilterCoordinator {
        let mut coordinator = FilterCoordinator::new();
        coordinator.set_filter(FilterPatch::page(page));
        coordinator
    }

    #[test]
    fn test_default_state_is_page_one() {
        let coordinator = FilterCoordinator::new();
        assert_eq!(coordinator.state(), FilterState::default());
        assert_eq!(coordinator.epoch(), Epoch::ZERO);
    }

    #[test]
    fn test_scope_changes_reset_page() {
        let patches = [
            FilterPatch::project(Some(ProjectId(7))),
            FilterPatch::project(None),
            FilterPatch::assignee(Some(UserId(3))),
            FilterPatch::author(Some(UserId(4))),
            FilterPatch::author(None),
        ];

        for patch in patches {
            for prior_page in [1, 2, 9, 400] {
                let mut coordinator = on_page(prior_page);
                let state = coordinator.set_filter(patch);
                assert_eq!(state.page, 1, "patch {patch:?} from page {prior_page}");
            }
        }
    }

    #[test]
    fn test_scope_change_wins_over_page_in_same_patch() {
        let mut coordinator = on_page(5);
        let state = coordinator.set_filter(FilterPatch {
            project_id: Some(Some(ProjectId(7))),
            page: Some(3),
            ..FilterPatch::default()
        });
        assert_eq!(state.page, 1);
        assert_eq!(state.project_id, Some(ProjectId(7)));
    }

    #[test]
    fn test_page_change_keeps_filters() {
        let mut coordinator = FilterCoordinator::new();
        coordinator.set_filter(FilterPatch::project(Some(ProjectId(7))));
        coordinator.set_filter(FilterPatch::assignee(Some(UserId(3))));
        let state = coordinator.set_filter(FilterPatch::page(4));

        assert_eq!(state.page, 4);
        assert_eq!(state.project_id, Some(ProjectId(7)));
        assert_eq!(state.assignee_id, Some(UserId(3)));
    }

    #[test]
    fn test_every_patch_mints_an_epoch() {
        let mut coordinator = FilterCoordinator::new();
        let mut seen = vec![coordinator.epoch()];

        coordinator.set_filter(FilterPatch::project(Some(ProjectId(7))));
        seen.push(coordinator.epoch());
        coordinator.set_filter(FilterPatch::page(2));
        seen.push(coordinator.epoch());
        coordinator.set_filter(FilterPatch::page(2));
        seen.push(coordinator.epoch());

        assert!(seen.windows(2).all(|w| w[1] > w[0]));
        assert!(coordinator.is_current(seen[3]));
        assert!(!coordinator.is_current(seen[2]));
    }

    #[test]
    fn test_page_zero_becomes_one() {
        let mut coordinator = on_page(3);
        assert_eq!(coordinator.set_filter(FilterPatch::page(0)).page, 1);

        let seeded = FilterCoordinator::with_state(FilterState {
            page: 0,
            ..FilterState::default()
        });
        assert_eq!(seeded.state().page, 1);
    }
}
