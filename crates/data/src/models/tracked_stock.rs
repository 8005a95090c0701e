//! Tracked stock model.
//!
//! One row per symbol under active tracking. Rows are never hard-deleted;
//! untracking flips the `active` flag so pull history survives as an audit
//! trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Outcome of the most recent pull attempt for a symbol.
///
/// Stored as lowercase text in the `last_pull_status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullStatus {
    /// Tracking accepted, no pull attempted yet
    Pending,
    /// Last pull retrieved and staged a document
    Success,
    /// Last pull failed after exhausting retries
    Failed,
}

impl PullStatus {
    /// Returns the database/text representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PullStatus::Pending => "pending",
            PullStatus::Success => "success",
            PullStatus::Failed => "failed",
        }
    }
}

impl FromStr for PullStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PullStatus::Pending),
            "success" => Ok(PullStatus::Success),
            "failed" => Ok(PullStatus::Failed),
            other => anyhow::bail!("unknown pull status: {other}"),
        }
    }
}

/// A symbol on the retrieval worklist.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackedStock {
    /// Ticker symbol, unique
    pub symbol: String,
    /// Only active symbols are pulled by the scheduler
    pub active: bool,
    /// When the last pull attempt finished
    pub last_pull_at: Option<DateTime<Utc>>,
    /// Outcome of the last pull attempt, lowercase text
    pub last_pull_status: String,
    /// Error text from the last failed pull
    pub error_message: Option<String>,
    /// When tracking was first requested
    pub created_at: DateTime<Utc>,
}

impl TrackedStock {
    /// Typed view of the stored pull status.
    ///
    /// # Errors
    /// Returns an error if the stored text is not a known status.
    pub fn status(&self) -> anyhow::Result<PullStatus> {
        self.last_pull_status.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_pull_status_as_str() {
        assert_eq!(PullStatus::Pending.as_str(), "pending");
        assert_eq!(PullStatus::Success.as_str(), "success");
        assert_eq!(PullStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_pull_status_roundtrips_through_text() {
        for status in [PullStatus::Pending, PullStatus::Success, PullStatus::Failed] {
            let parsed: PullStatus = status.as_str().parse().expect("parse failed");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("exploded".parse::<PullStatus>().is_err());
    }

    #[test]
    fn test_typed_status_accessor() {
        let stock = TrackedStock {
            symbol: "AAPL".to_string(),
            active: true,
            last_pull_at: Some(sample_timestamp()),
            last_pull_status: "success".to_string(),
            error_message: None,
            created_at: sample_timestamp(),
        };

        assert_eq!(stock.status().expect("status parse"), PullStatus::Success);
    }

    #[test]
    fn test_tracked_stock_serialization_roundtrip() {
        let stock = TrackedStock {
            symbol: "MSFT".to_string(),
            active: false,
            last_pull_at: None,
            last_pull_status: "pending".to_string(),
            error_message: Some("connect timeout".to_string()),
            created_at: sample_timestamp(),
        };

        let json = serde_json::to_string(&stock).expect("serialization failed");
        let back: TrackedStock = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(back.symbol, stock.symbol);
        assert_eq!(back.error_message, stock.error_message);
        assert!(!back.active);
    }
}
