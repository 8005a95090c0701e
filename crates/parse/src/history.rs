//! History-page parser.
//!
//! Locates the price table structurally (attribute or header text, never
//! column position), skips corporate-action rows by content inspection,
//! and normalizes the remainder into validated [`PriceRecord`]s. Rows are
//! returned in source order; callers needing date order sort explicitly.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use stock_track_data::PriceRecord;

use crate::error::ParseError;
use crate::numeric::{clean_price, clean_volume};

/// Date format used by history pages, e.g. "Aug 01, 2025".
const DATE_FORMAT: &str = "%b %d, %Y";

/// Cell texts marking a non-price corporate-action row.
const ACTION_MARKERS: [&str; 2] = ["dividend", "split"];

/// Result of parsing one document.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// Valid records in the order encountered in the source.
    pub records: Vec<PriceRecord>,
    /// Rows present in the table that failed normalization or the OHLC
    /// invariants.
    pub dropped_rows: usize,
    /// Corporate-action rows (dividends, splits) skipped by content.
    pub skipped_actions: usize,
}

/// Parser for historical-data pages.
pub struct HistoryParser;

impl HistoryParser {
    /// Parses a history page body into price records for `symbol`.
    ///
    /// Individual bad rows are dropped and counted; the call only fails
    /// structurally, when no price table exists or no row survives.
    ///
    /// # Errors
    /// Returns [`ParseError::TableNotFound`] when no table matches, and
    /// [`ParseError::NoValidRows`] when a table matched but yielded
    /// nothing.
    pub fn parse(body: &str, symbol: &str) -> Result<ParseOutcome, ParseError> {
        let document = Html::parse_document(body);
        let table = find_price_table(&document).ok_or(ParseError::TableNotFound)?;

        let row_selector = Selector::parse("tbody tr").expect("static selector");
        let cell_selector = Selector::parse("td").expect("static selector");

        let mut outcome = ParseOutcome {
            records: Vec::new(),
            dropped_rows: 0,
            skipped_actions: 0,
        };

        for row in table.select(&row_selector) {
            let cells: Vec<String> = row
                .select(&cell_selector)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect();

            if cells.is_empty() {
                continue; // header or spacer row
            }

            if is_corporate_action(&cells) {
                outcome.skipped_actions += 1;
                continue;
            }

            match parse_row(&cells, symbol) {
                Some(record) if record.is_valid() => outcome.records.push(record),
                _ => outcome.dropped_rows += 1,
            }
        }

        if outcome.records.is_empty() {
            return Err(ParseError::NoValidRows {
                dropped: outcome.dropped_rows,
            });
        }

        debug!(
            symbol,
            rows = outcome.records.len(),
            dropped = outcome.dropped_rows,
            skipped = outcome.skipped_actions,
            "parsed history page"
        );
        Ok(outcome)
    }
}

/// Locates the price table: by its `data-test` attribute first, then by a
/// header row naming the OHLC columns. Both survive superficial markup
/// changes; neither depends on document position.
fn find_price_table(document: &Html) -> Option<ElementRef<'_>> {
    let tagged = Selector::parse(r#"table[data-test="historical-prices"]"#).expect("static selector");
    if let Some(table) = document.select(&tagged).next() {
        return Some(table);
    }

    let any_table = Selector::parse("table").expect("static selector");
    let header_cell = Selector::parse("th").expect("static selector");

    document.select(&any_table).find(|table| {
        let headers: String = table
            .select(&header_cell)
            .flat_map(|th| th.text())
            .collect::<String>()
            .to_lowercase();
        ["date", "open", "high", "low", "close"]
            .iter()
            .all(|column| headers.contains(column))
    })
}

/// A row is a corporate action when any cell names one, regardless of
/// where the source puts it.
fn is_corporate_action(cells: &[String]) -> bool {
    cells.iter().any(|cell| {
        let lower = cell.to_lowercase();
        ACTION_MARKERS.iter().any(|marker| lower.contains(marker))
    })
}

/// Normalizes one table row into a record. `None` means the row is
/// malformed: wrong cell count, bad date, unparseable numbers.
fn parse_row(cells: &[String], symbol: &str) -> Option<PriceRecord> {
    if cells.len() < 7 {
        return None;
    }

    let date = NaiveDate::parse_from_str(&cells[0], DATE_FORMAT).ok()?;

    Some(PriceRecord {
        symbol: symbol.to_uppercase(),
        date,
        open: clean_price(&cells[1])?,
        high: clean_price(&cells[2])?,
        low: clean_price(&cells[3])?,
        close: clean_price(&cells[4])?,
        adj_close: clean_price(&cells[5])?,
        volume: clean_volume(&cells[6])?,
    })
}

/// Sorts records ascending by date.
///
/// Source ordering is not guaranteed; every date-ordered consumer must
/// sort first.
pub fn sort_by_date(records: &mut [PriceRecord]) {
    records.sort_by_key(|r| r.date);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn price_row(date: &str, open: &str, high: &str, low: &str, close: &str, volume: &str) -> String {
        format!(
            "<tr><td>{date}</td><td>{open}</td><td>{high}</td><td>{low}</td>\
             <td>{close}</td><td>{close}</td><td>{volume}</td></tr>"
        )
    }

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table data-test="historical-prices">
              <thead><tr><th>Date</th><th>Open</th><th>High</th><th>Low</th>
                <th>Close</th><th>Adj Close</th><th>Volume</th></tr></thead>
              <tbody>{rows}</tbody>
            </table>
            </body></html>"#
        )
    }

    // ==================== Happy Path Tests ====================

    #[test]
    fn test_parses_valid_rows_in_source_order() {
        let rows = [
            price_row("Aug 01, 2025", "210.00", "214.50", "208.25", "213.75", "48,210,000"),
            price_row("Jul 31, 2025", "205.10", "211.00", "204.80", "209.90", "51,002,300"),
        ]
        .concat();

        let outcome = HistoryParser::parse(&page(&rows), "aapl").expect("parses");
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.dropped_rows, 0);

        // Source order preserved (descending dates here).
        assert_eq!(
            outcome.records[0].date,
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
        );
        assert_eq!(outcome.records[0].symbol, "AAPL");
        assert_eq!(outcome.records[0].open, dec!(210.00));
        assert_eq!(outcome.records[0].volume, 48_210_000);
    }

    #[test]
    fn test_sort_by_date_normalizes_order() {
        let rows = [
            price_row("Aug 01, 2025", "210.00", "214.50", "208.25", "213.75", "1000"),
            price_row("Jul 30, 2025", "200.00", "204.00", "199.00", "203.00", "1000"),
            price_row("Jul 31, 2025", "205.10", "211.00", "204.80", "209.90", "1000"),
        ]
        .concat();

        let mut outcome = HistoryParser::parse(&page(&rows), "AAPL").expect("parses");
        sort_by_date(&mut outcome.records);

        let dates: Vec<NaiveDate> = outcome.records.iter().map(|r| r.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    // ==================== Structural Selection Tests ====================

    #[test]
    fn test_finds_table_by_header_text_without_attribute() {
        let body = format!(
            r#"<html><body>
            <table><tr><td>nav junk</td></tr></table>
            <table>
              <thead><tr><th>Date</th><th>Open</th><th>High</th><th>Low</th>
                <th>Close</th><th>Adj Close</th><th>Volume</th></tr></thead>
              <tbody>{}</tbody>
            </table>
            </body></html>"#,
            price_row("Aug 01, 2025", "210.00", "214.50", "208.25", "213.75", "100")
        );

        let outcome = HistoryParser::parse(&body, "AAPL").expect("parses");
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn test_no_table_is_structural_error() {
        let err = HistoryParser::parse("<html><body><p>maintenance</p></body></html>", "AAPL")
            .unwrap_err();
        assert!(matches!(err, ParseError::TableNotFound));
    }

    // ==================== Row Filtering Tests ====================

    #[test]
    fn test_corporate_action_rows_skipped_by_content() {
        let rows = format!(
            "{}<tr><td>Jul 30, 2025</td><td colspan=\"6\">0.25 Dividend</td></tr>\
             <tr><td>Jul 29, 2025</td><td colspan=\"6\">4:1 Stock Split</td></tr>{}",
            price_row("Aug 01, 2025", "210.00", "214.50", "208.25", "213.75", "100"),
            price_row("Jul 28, 2025", "205.10", "211.00", "204.80", "209.90", "100"),
        );

        let outcome = HistoryParser::parse(&page(&rows), "AAPL").expect("parses");
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.skipped_actions, 2);
        assert_eq!(outcome.dropped_rows, 0);
    }

    #[test]
    fn test_partial_row_tolerance() {
        // 10 valid rows and 2 invalid ones: exactly 10 records, 2 dropped.
        let mut rows = String::new();
        for day in 1..=10 {
            rows.push_str(&price_row(
                &format!("Jul {day:02}, 2025"),
                "100.00",
                "105.00",
                "99.00",
                "103.00",
                "1,000",
            ));
        }
        // high < low
        rows.push_str(&price_row("Jul 11, 2025", "100.00", "95.00", "99.00", "97.00", "1,000"));
        // unparseable volume
        rows.push_str(&price_row("Jul 12, 2025", "100.00", "105.00", "99.00", "103.00", "-"));

        let outcome = HistoryParser::parse(&page(&rows), "AAPL").expect("not structural");
        assert_eq!(outcome.records.len(), 10);
        assert_eq!(outcome.dropped_rows, 2);
    }

    #[test]
    fn test_all_rows_invalid_is_structural_error() {
        // Spec scenario: every row has high < low.
        let rows = [
            price_row("Aug 01, 2025", "100.00", "95.00", "99.00", "97.00", "1000"),
            price_row("Jul 31, 2025", "100.00", "94.00", "98.00", "96.00", "1000"),
        ]
        .concat();

        let err = HistoryParser::parse(&page(&rows), "AAPL").unwrap_err();
        match err {
            ParseError::NoValidRows { dropped } => assert_eq!(dropped, 2),
            other => panic!("expected NoValidRows, got {other}"),
        }
    }

    #[test]
    fn test_empty_table_is_structural_error() {
        let err = HistoryParser::parse(&page(""), "AAPL").unwrap_err();
        assert!(matches!(err, ParseError::NoValidRows { dropped: 0 }));
    }

    #[test]
    fn test_malformed_date_drops_row() {
        let rows = [
            price_row("sometime", "100.00", "105.00", "99.00", "103.00", "1000"),
            price_row("Aug 01, 2025", "100.00", "105.00", "99.00", "103.00", "1000"),
        ]
        .concat();

        let outcome = HistoryParser::parse(&page(&rows), "AAPL").expect("parses");
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.dropped_rows, 1);
    }

    #[test]
    fn test_short_row_drops_row() {
        let rows = format!(
            "<tr><td>Aug 01, 2025</td><td>100.00</td></tr>{}",
            price_row("Jul 31, 2025", "100.00", "105.00", "99.00", "103.00", "1000")
        );

        let outcome = HistoryParser::parse(&page(&rows), "AAPL").expect("parses");
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.dropped_rows, 1);
    }
}
