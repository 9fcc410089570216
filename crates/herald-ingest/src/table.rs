use std::io::Cursor;

use calamine::{Data, Reader, Xls, Xlsx};
use tracing::info;

use crate::error::ParseError;

/// Header cell the recipient column must carry (case-insensitive, trimmed).
/// This is a fixed contract with the upload template, not configurable.
pub const RECIPIENT_COLUMN: &str = "nomeUser";

/// Upload format, derived from the file name suffix by the caller.
///
/// Parser selection is purely by this tag — the bytes are never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Legacy binary Excel (.xls).
    Xls,
    /// Office Open XML spreadsheet (.xlsx).
    Xlsx,
    /// Comma-separated text (.csv).
    Csv,
}

impl UploadKind {
    /// Map a file name to its upload kind by suffix, case-insensitively.
    ///
    /// Returns `None` for any other suffix; callers reject those uploads
    /// before the bytes ever reach the parser.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        match lower.rsplit('.').next() {
            Some("xls") => Some(UploadKind::Xls),
            Some("xlsx") => Some(UploadKind::Xlsx),
            Some("csv") => Some(UploadKind::Csv),
            _ => None,
        }
    }
}

/// Extract the ordered recipient references from an uploaded table.
///
/// The first row is the header and must contain [`RECIPIENT_COLUMN`]. Cell
/// values are trimmed; empty cells are skipped. Row order in the result
/// equals row order in the source, and parsing the same bytes twice yields
/// the same result.
pub fn extract_recipients(bytes: &[u8], kind: UploadKind) -> Result<Vec<String>, ParseError> {
    let recipients = match kind {
        UploadKind::Xlsx => {
            let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(malformed)?;
            from_workbook(workbook)?
        }
        UploadKind::Xls => {
            let workbook: Xls<_> = Xls::new(Cursor::new(bytes)).map_err(malformed)?;
            from_workbook(workbook)?
        }
        UploadKind::Csv => from_csv(bytes)?,
    };

    info!(count = recipients.len(), "extracted recipients from upload");
    Ok(recipients)
}

fn malformed(e: impl std::fmt::Display) -> ParseError {
    ParseError::Malformed(e.to_string())
}

/// Run the column contract over the first worksheet of a workbook.
fn from_workbook<RS, R>(mut workbook: R) -> Result<Vec<String>, ParseError>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::EmptySource)?
        .map_err(malformed)?;

    collect(
        range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<String>>()),
    )
}

/// Cell to plain text. Empty cells become the empty string so the shared row
/// scan can skip them.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Run the column contract over a CSV buffer.
///
/// The reader is configured without header handling so the header row flows
/// through the same scan as the spreadsheet path. `flexible` tolerates ragged
/// rows; a short row simply has no cell under the recipient column.
fn from_csv(bytes: &[u8]) -> Result<Vec<String>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<String>>());
    }
    collect(rows.into_iter())
}

/// The column contract, shared by every format.
///
/// Error precedence: a table with no rows at all is `EmptySource` (there is
/// no header to check); otherwise a missing recipient column is reported
/// before row counts are considered.
fn collect<I>(mut rows: I) -> Result<Vec<String>, ParseError>
where
    I: Iterator<Item = Vec<String>>,
{
    let header = rows.next().ok_or(ParseError::EmptySource)?;
    let column = header
        .iter()
        .position(|cell| cell.trim().eq_ignore_ascii_case(RECIPIENT_COLUMN))
        .ok_or(ParseError::MissingColumn)?;

    let mut recipients = Vec::new();
    let mut data_rows = 0usize;
    for row in rows {
        data_rows += 1;
        let value = row.get(column).map(|cell| cell.trim()).unwrap_or("");
        if !value.is_empty() {
            recipients.push(value.to_string());
        }
    }

    if data_rows == 0 {
        return Err(ParseError::EmptySource);
    }
    if recipients.is_empty() {
        return Err(ParseError::NoRecipients);
    }
    Ok(recipients)
}
