//! Historical-data page parsing for the stock tracking pipeline.
//!
//! Turns raw staged documents into validated price records. Structural
//! tolerance is the design constraint here: the source reformats its
//! markup freely, so everything keys off tags, attributes and cell
//! content rather than positions.

pub mod error;
pub mod history;
pub mod numeric;

pub use error::ParseError;
pub use history::{sort_by_date, HistoryParser, ParseOutcome};
