pub mod config;
pub mod error;
pub mod gate;
pub mod types;

pub use config::HeraldConfig;
pub use error::DispatchError;
pub use gate::{ConnectionState, ReadinessGate};
pub use types::{BulkFailure, BulkReport, RecipientRef, SendRequest, SendResult};
