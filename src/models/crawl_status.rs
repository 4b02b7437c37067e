use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-symbol crawl state within one batch run
///
/// `Pending -> InProgress -> Success`, or `InProgress -> Failed`
/// (retriable on the next run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    Pending,
    InProgress,
    Success,
    Failed,
}

impl CrawlState {
    /// States that a resumed batch must re-drive
    pub fn needs_retry(&self) -> bool {
        matches!(self, CrawlState::Pending | CrawlState::InProgress | CrawlState::Failed)
    }
}

/// One symbol's entry in the crawl status file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub state: CrawlState,

    /// When the state was last updated
    pub timestamp: DateTime<Utc>,

    /// Last error message, present only for failed entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl CrawlRecord {
    pub fn new(state: CrawlState, error: Option<String>) -> Self {
        Self {
            state,
            timestamp: Utc::now(),
            last_error: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_retry() {
        assert!(CrawlState::Pending.needs_retry());
        assert!(CrawlState::InProgress.needs_retry());
        assert!(CrawlState::Failed.needs_retry());
        assert!(!CrawlState::Success.needs_retry());
    }

    #[test]
    fn test_record_round_trip() {
        let record = CrawlRecord::new(CrawlState::Failed, Some("Empty data".to_string()));
        let json = serde_json::to_string(&record).unwrap();
        let back: CrawlRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.state, CrawlState::Failed);
        assert_eq!(back.last_error.as_deref(), Some("Empty data"));
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&CrawlState::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
