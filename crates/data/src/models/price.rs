//! Daily price record model.
//!
//! One row per (symbol, trading day), as extracted from a historical-data
//! page. The (symbol, date) pair is the natural key for upserts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single day of OHLC prices and volume for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PriceRecord {
    /// Ticker symbol (e.g., "AAPL")
    pub symbol: String,
    /// Trading day, day resolution
    pub date: NaiveDate,
    /// Opening price
    pub open: Decimal,
    /// Intraday high
    pub high: Decimal,
    /// Intraday low
    pub low: Decimal,
    /// Closing price
    pub close: Decimal,
    /// Close adjusted for dividends and splits
    pub adj_close: Decimal,
    /// Shares traded; never negative
    pub volume: i64,
}

impl PriceRecord {
    /// Checks the intra-row price relationships.
    ///
    /// A record is valid when the low is at or below every other price,
    /// the high is at or above every other price, and volume is
    /// non-negative. Rows failing this are dropped at parse time and
    /// must never reach storage.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.volume >= 0
            && self.low <= self.high
            && self.low <= self.open
            && self.low <= self.close
            && self.high >= self.open
            && self.high >= self.close
    }

    /// Natural key for deduplication and upserts.
    #[must_use]
    pub fn key(&self) -> (&str, NaiveDate) {
        (&self.symbol, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> PriceRecord {
        PriceRecord {
            symbol: "AAPL".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            open,
            high,
            low,
            close,
            adj_close: close,
            volume: 1_000_000,
        }
    }

    #[test]
    fn test_valid_record_accepted() {
        let r = record(dec!(100.0), dec!(105.0), dec!(99.0), dec!(103.0));
        assert!(r.is_valid());
    }

    #[test]
    fn test_flat_day_is_valid() {
        // All four prices equal is a legal (if dull) trading day.
        let r = record(dec!(100.0), dec!(100.0), dec!(100.0), dec!(100.0));
        assert!(r.is_valid());
    }

    #[test]
    fn test_high_below_low_rejected() {
        let r = record(dec!(100.0), dec!(95.0), dec!(99.0), dec!(97.0));
        assert!(!r.is_valid());
    }

    #[test]
    fn test_open_above_high_rejected() {
        let r = record(dec!(110.0), dec!(105.0), dec!(99.0), dec!(103.0));
        assert!(!r.is_valid());
    }

    #[test]
    fn test_close_below_low_rejected() {
        let r = record(dec!(100.0), dec!(105.0), dec!(99.0), dec!(98.0));
        assert!(!r.is_valid());
    }

    #[test]
    fn test_negative_volume_rejected() {
        let mut r = record(dec!(100.0), dec!(105.0), dec!(99.0), dec!(103.0));
        r.volume = -1;
        assert!(!r.is_valid());
    }

    #[test]
    fn test_zero_volume_accepted() {
        let mut r = record(dec!(100.0), dec!(105.0), dec!(99.0), dec!(103.0));
        r.volume = 0;
        assert!(r.is_valid());
    }

    #[test]
    fn test_key_is_symbol_and_date() {
        let r = record(dec!(100.0), dec!(105.0), dec!(99.0), dec!(103.0));
        let (symbol, date) = r.key();
        assert_eq!(symbol, "AAPL");
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let r = record(dec!(100.25), dec!(105.5), dec!(99.75), dec!(103.0));
        let json = serde_json::to_string(&r).expect("serialization failed");
        let back: PriceRecord = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(back, r);
    }
}
