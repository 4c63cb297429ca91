//! Split tables: CSV parsing and page-range validation
//!
//! A split table has the columns `split,name,from,to` in any order, plus
//! any number of ignored extra columns. Only rows flagged `y` are validated
//! and extracted.

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::PdfSplitError;
use crate::model::RangeRecord;

const SPLIT_COLUMN: &str = "split";
const NAME_COLUMN: &str = "name";
const FROM_COLUMN: &str = "from";
const TO_COLUMN: &str = "to";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Decode CSV bytes as UTF-8, silently dropping undecodable sequences
pub fn decode_csv_bytes(raw: &[u8]) -> String {
    raw.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Parse a split table into records, in row order.
///
/// Empty and header-only input yield no records. A `from`/`to` cell that is
/// not an integer (including an empty cell or a missing column) is rejected.
pub fn parse_range_csv(raw: &[u8]) -> Result<Vec<RangeRecord>, PdfSplitError> {
    let text = decode_csv_bytes(raw);

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(invalid_csv)?;
    let columns = Columns::locate(headers, text.starts_with(BYTE_ORDER_MARK));

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.map_err(invalid_csv)?;
        if row.len() <= 1 && row.iter().all(str::is_empty) {
            continue;
        }
        records.push(columns.read(&row, idx + 1)?);
    }

    debug!(rows = records.len(), "Parsed split table");
    Ok(records)
}

/// Check every included record against `1 <= start <= end <= total_pages`.
///
/// Fails on the first violation, before any extraction happens.
pub fn validate_ranges(records: &[RangeRecord], total_pages: u32) -> Result<(), PdfSplitError> {
    for record in records.iter().filter(|r| r.included) {
        if record.start_page < 1 {
            return Err(PdfSplitError::Validation(format!(
                "Start page {} is below 1",
                record.start_page
            )));
        }
        if record.end_page < record.start_page {
            return Err(PdfSplitError::Validation(format!(
                "End page {} is before start page {}",
                record.end_page, record.start_page
            )));
        }
        if record.end_page > i64::from(total_pages) {
            return Err(PdfSplitError::Validation(format!(
                "End page {} exceeds total page count ({})",
                record.end_page, total_pages
            )));
        }
    }
    Ok(())
}

fn invalid_csv(e: csv::Error) -> PdfSplitError {
    PdfSplitError::Validation(format!("Invalid CSV format: {}", e))
}

/// Positions of the recognised columns in the header row
struct Columns {
    split: Option<usize>,
    name: Option<usize>,
    from: Option<usize>,
    to: Option<usize>,
}

impl Columns {
    /// Header names match exactly; with duplicates the last one wins.
    ///
    /// A leading byte-order mark stays part of the first header name, so
    /// that column is never recognised.
    fn locate(headers: &StringRecord, has_bom: bool) -> Self {
        let mut names: Vec<String> = headers.iter().map(str::to_owned).collect();
        if has_bom {
            if let Some(first) = names.first_mut() {
                if !first.starts_with(BYTE_ORDER_MARK) {
                    first.insert(0, BYTE_ORDER_MARK);
                }
            }
        }

        let position = |column: &str| names.iter().rposition(|name| name == column);
        Self {
            split: position(SPLIT_COLUMN),
            name: position(NAME_COLUMN),
            from: position(FROM_COLUMN),
            to: position(TO_COLUMN),
        }
    }

    fn read(&self, row: &StringRecord, row_number: usize) -> Result<RangeRecord, PdfSplitError> {
        let cell = |column: Option<usize>| column.and_then(|idx| row.get(idx)).unwrap_or("");

        let page = |column: Option<usize>| {
            cell(column).trim().parse::<i64>().map_err(|_| {
                PdfSplitError::Validation(format!(
                    "Non-integer page range in row {}: {}",
                    row_number,
                    row.iter().collect::<Vec<_>>().join(",")
                ))
            })
        };

        Ok(RangeRecord {
            included: cell(self.split).trim().eq_ignore_ascii_case("y"),
            name: cell(self.name).trim().to_string(),
            start_page: page(self.from)?,
            end_page: page(self.to)?,
        })
    }
}
