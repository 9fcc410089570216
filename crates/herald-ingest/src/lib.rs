pub mod error;
pub mod table;

pub use error::ParseError;
pub use table::{extract_recipients, UploadKind, RECIPIENT_COLUMN};
