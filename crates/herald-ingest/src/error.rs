use thiserror::Error;

/// Tabular input that does not satisfy the recipient-column contract.
///
/// Any of these aborts the whole bulk pipeline — without recipients there is
/// nothing to attempt.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No header cell matches the required recipient column.
    #[error("column 'nomeUser' not found in the header row")]
    MissingColumn,

    /// The table has no data rows below the header.
    #[error("the uploaded file has no data rows")]
    EmptySource,

    /// Every cell under the recipient column was empty.
    #[error("no recipients found in the 'nomeUser' column")]
    NoRecipients,

    /// The byte buffer could not be decoded as the declared format.
    #[error("could not read the uploaded file: {0}")]
    Malformed(String),
}
