use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IssueLensError;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IssueLensError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map($name).map_err(|_| {
                    IssueLensError::InvalidArgument(format!(
                        "invalid {} '{}': expected a positive integer",
                        stringify!($name),
                        s
                    ))
                })
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value)
            }
        }
    };
}

numeric_id!(
    /// Numeric project id (not the namespaced path)
    ProjectId
);
numeric_id!(
    /// Numeric user id
    UserId
);
numeric_id!(
    /// Project-scoped issue number, the `#12` in the UI
    IssueIid
);

/// Issue lifecycle state as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueState {
    Opened,
    Closed,
    Other(String),
}

impl From<String> for IssueState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "opened" => IssueState::Opened,
            "closed" => IssueState::Closed,
            _ => IssueState::Other(value),
        }
    }
}

impl From<IssueState> for String {
    fn from(value: IssueState) -> Self {
        value.to_string()
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Opened => write!(f, "opened"),
            IssueState::Closed => write!(f, "closed"),
            IssueState::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Position of a returned page within the full result set.
///
/// All values are at least 1 except `total_items`, which may be 0 for an
/// empty listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub per_page: u32,
}

impl Default for PaginationInfo {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_items: 0,
            per_page: 20,
        }
    }
}

impl PaginationInfo {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Whether `page` is a page the server said exists.
    pub fn contains_page(&self, page: u32) -> bool {
        (1..=self.total_pages).contains(&page)
    }

    /// Sliding window of at most `window` page numbers centred on the
    /// current page, shifted so it never runs past either end.
    pub fn visible_pages(&self, window: u32) -> RangeInclusive<u32> {
        let window = window.max(1);
        let total = self.total_pages.max(1);
        let current = self.current_page.clamp(1, total);

        let mut start = current.saturating_sub(window / 2).max(1);
        let end = (start + window - 1).min(total);
        if end - start + 1 < window {
            start = end.saturating_sub(window - 1).max(1);
        }
        start..=end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination(current_page: u32, total_pages: u32) -> PaginationInfo {
        PaginationInfo {
            current_page,
            total_pages,
            total_items: u64::from(total_pages) * 20,
            per_page: 20,
        }
    }

    #[test]
    fn test_id_parse_and_display() {
        let id: ProjectId = "42".parse().unwrap();
        assert_eq!(id, ProjectId(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<UserId>().is_err());
        assert!("-1".parse::<IssueIid>().is_err());
    }

    #[test]
    fn test_id_serde_transparent() {
        let id: IssueIid = serde_json::from_str("12").unwrap();
        assert_eq!(id, IssueIid(12));
        assert_eq!(serde_json::to_string(&ProjectId(7)).unwrap(), "7");
    }

    #[test]
    fn test_issue_state_from_wire() {
        let state: IssueState = serde_json::from_str("\"opened\"").unwrap();
        assert_eq!(state, IssueState::Opened);
        let state: IssueState = serde_json::from_str("\"locked\"").unwrap();
        assert_eq!(state, IssueState::Other("locked".to_string()));
        assert_eq!(serde_json::to_string(&IssueState::Closed).unwrap(), "\"closed\"");
    }

    #[test]
    fn test_has_previous_and_next() {
        let first = pagination(1, 3);
        assert!(!first.has_previous());
        assert!(first.has_next());

        let last = pagination(3, 3);
        assert!(last.has_previous());
        assert!(!last.has_next());
    }

    #[test]
    fn test_contains_page() {
        let p = pagination(1, 3);
        assert!(p.contains_page(3));
        assert!(!p.contains_page(4));
        assert!(!p.contains_page(0));
    }

    #[test]
    fn test_visible_pages_centered() {
        assert_eq!(pagination(5, 10).visible_pages(5), 3..=7);
    }

    #[test]
    fn test_visible_pages_at_edges() {
        assert_eq!(pagination(1, 10).visible_pages(5), 1..=5);
        assert_eq!(pagination(10, 10).visible_pages(5), 6..=10);
        assert_eq!(pagination(2, 3).visible_pages(5), 1..=3);
    }

    #[test]
    fn test_visible_pages_single_page() {
        assert_eq!(PaginationInfo::default().visible_pages(5), 1..=1);
    }
}
