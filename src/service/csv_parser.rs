use csv::{ReaderBuilder, StringRecord, Trim};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::models::NewBudgetRow;

/// Columns every budget CSV must carry, matched case-insensitively.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Ward", "Year", "Category", "Amount"];

/// Rows recovered from one CSV upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCsv {
    pub rows: Vec<NewBudgetRow>,
    /// Data lines dropped because they could not be coerced.
    pub rejected: usize,
}

/// Positions of the required columns in the header.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    ward: usize,
    year: usize,
    category: usize,
    amount: usize,
    width: usize,
}

impl ColumnMap {
    fn from_header(header: &StringRecord) -> Result<Self> {
        let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let position = |col: &str| names.iter().position(|n| *n == col.to_lowercase());

        let missing: Vec<String> = REQUIRED_COLUMNS
            .into_iter()
            .filter(|&col| position(col).is_none())
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Schema { missing });
        }

        // Every required column was found above.
        let idx = |col: &str| position(col).unwrap_or_default();
        Ok(Self {
            ward: idx("Ward"),
            year: idx("Year"),
            category: idx("Category"),
            amount: idx("Amount"),
            width: names.len(),
        })
    }

    fn coerce(&self, record: &StringRecord) -> Option<NewBudgetRow> {
        if record.len() != self.width {
            return None;
        }
        let ward = record.get(self.ward)?.trim().parse::<i32>().ok()?;
        let year = record.get(self.year)?.trim().parse::<i32>().ok()?;
        let category = record.get(self.category)?.trim();
        if category.is_empty() {
            return None;
        }
        let amount = parse_amount(record.get(self.amount)?)?;
        Some(NewBudgetRow {
            category: category.to_string(),
            amount,
            ward: Some(ward),
            year,
        })
    }
}

/// Parses a money cell, dropping `$` and thousands separators. Only finite
/// values are accepted.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    let value = cleaned.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Parser for uploaded budget CSVs.
///
/// The header must name `Ward`, `Year`, `Category` and `Amount` in any order
/// and case; extra columns are ignored. A data line is kept only when it has as
/// many fields as the header and every required cell coerces. Other lines are
/// counted in [`ParsedCsv::rejected`] and otherwise dropped.
pub struct CsvParser;

impl CsvParser {
    pub fn parse(text: &str) -> Result<ParsedCsv> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.trim_start_matches('\u{feff}').trim().as_bytes());

        let header = match reader.headers() {
            Ok(h) => h.clone(),
            Err(e) => {
                tracing::warn!("Unreadable CSV header: {}", e);
                StringRecord::new()
            }
        };
        tracing::debug!("CSV headers: {:?}", header);
        let columns = ColumnMap::from_header(&header)?;

        let records: Vec<Option<StringRecord>> =
            reader.records().map(|r| r.ok()).collect();
        let total = records.len();

        let rows: Vec<NewBudgetRow> = records
            .par_iter()
            .filter_map(|r| r.as_ref().and_then(|rec| columns.coerce(rec)))
            .collect();
        let rejected = total - rows.len();

        tracing::info!("Parsed {} valid budget records, rejected {}", rows.len(), rejected);

        if rows.is_empty() {
            return Err(Error::EmptyImport);
        }
        Ok(ParsedCsv { rows, rejected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_reference_file() {
        let csv = "Ward,Year,Category,Amount\n1,2023,Infrastructure,500000\n1,2023,Education,750000\n";
        let parsed = CsvParser::parse(csv).unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rejected, 0);
        assert_eq!(parsed.rows[0].category, "Infrastructure");
        assert_eq!(parsed.rows[0].amount, 500000.0);
        assert_eq!(parsed.rows[0].ward, Some(1));
        assert_eq!(parsed.rows[0].year, 2023);
        assert_eq!(parsed.rows[1].amount, 750000.0);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let err = CsvParser::parse("Ward,Year,Category\n1,2023,Parks\n").unwrap_err();
        match err {
            Error::Schema { missing } => assert_eq!(missing, vec!["Amount".to_string()]),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn empty_input_misses_every_column() {
        let err = CsvParser::parse("").unwrap_err();
        match err {
            Error::Schema { missing } => assert_eq!(missing.len(), 4),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn header_is_case_insensitive_and_order_free() {
        let csv = "notes, AMOUNT ,category,year,WARD\nfirst,$1200,Parks,2024,3\n";
        let parsed = CsvParser::parse(csv).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        let row = &parsed.rows[0];
        assert_eq!(row.amount, 1200.0);
        assert_eq!(row.category, "Parks");
        assert_eq!(row.year, 2024);
        assert_eq!(row.ward, Some(3));
    }

    #[test]
    fn currency_symbols_and_separators_are_stripped() {
        assert_eq!(parse_amount("$1,234.50"), Some(1234.5));
        assert_eq!(parse_amount(" 42 "), Some(42.0));
        assert_eq!(parse_amount("-10"), Some(-10.0));
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("-Infinity"), None);
        assert_eq!(parse_amount("1e400"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);

        let csv = "Ward,Year,Category,Amount\n2,2024,Transit,\"$1,500,000\"\n";
        let parsed = CsvParser::parse(csv).unwrap();
        assert_eq!(parsed.rows[0].amount, 1500000.0);
    }

    #[test]
    fn malformed_lines_are_dropped_and_counted() {
        let csv = "Ward,Year,Category,Amount\n\
                   1,2023,Roads,100\n\
                   x,2023,Roads,100\n\
                   1,twenty,Roads,100\n\
                   1,2023,,100\n\
                   1,2023,Roads,lots\n\
                   1,2023,Roads,1,000\n\
                   1,2023\n\
                   2,2023,Water,250\n";
        let parsed = CsvParser::parse(csv).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rejected, 6);
        assert_eq!(parsed.rows[1].category, "Water");
    }

    #[test]
    fn overflowing_amounts_are_rejected() {
        let csv = "Ward,Year,Category,Amount\n\
                   1,2023,Roads,inf\n\
                   1,2023,Parks,Infinity\n\
                   1,2023,Water,1e400\n\
                   1,2023,Transit,1e6\n";
        let parsed = CsvParser::parse(csv).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rejected, 3);
        assert_eq!(parsed.rows[0].amount, 1_000_000.0);
    }

    #[test]
    fn negative_amounts_survive_parsing() {
        let parsed = CsvParser::parse("Ward,Year,Category,Amount\n1,2023,Refund,-50\n").unwrap();
        assert_eq!(parsed.rows[0].amount, -50.0);
    }

    #[test]
    fn header_only_is_an_empty_import() {
        let err = CsvParser::parse("Ward,Year,Category,Amount\n").unwrap_err();
        assert!(matches!(err, Error::EmptyImport));

        let err = CsvParser::parse("Ward,Year,Category,Amount\nfoo,bar,,baz\n").unwrap_err();
        assert!(matches!(err, Error::EmptyImport));
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let csv = "\u{feff}Ward,Year,Category,Amount\n4,2022,Libraries,300\n";
        assert_eq!(CsvParser::parse(csv).unwrap().rows.len(), 1);
    }

    #[test]
    fn windows_line_endings_are_accepted() {
        let csv = "Ward,Year,Category,Amount\r\n4,2022,Libraries,300\r\n";
        let parsed = CsvParser::parse(csv).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].amount, 300.0);
    }
}
