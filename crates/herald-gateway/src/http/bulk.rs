//! Bulk endpoint — POST /send-bulk
//!
//! Multipart form with a `file` part (.xlsx, .xls or .csv; suffix checked
//! before the bytes reach the parser) and a `message` part. Responds with the
//! aggregate report `{"total", "success", "failed", "errors"}`; only parse
//! failures reject the whole request.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{info, warn};

use herald_core::types::BulkReport;
use herald_ingest::{ParseError, UploadKind};

use crate::app::AppState;
use crate::http::{bad_request, ApiError};

/// POST /send-bulk — one message to every recipient in an uploaded table.
pub async fn send_bulk_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<BulkReport>, (StatusCode, Json<ApiError>)> {
    let mut upload: Option<(UploadKind, Vec<u8>)> = None;
    let mut message: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let Some(kind) = UploadKind::from_file_name(&file_name) else {
                    return Err(bad_request(
                        "unsupported file format; use .xlsx, .xls or .csv",
                    ));
                };
                let bytes = field.bytes().await.map_err(|e| bad_request(&e.to_string()))?;
                info!(file = %file_name, size = bytes.len(), "bulk upload received");
                upload = Some((kind, bytes.to_vec()));
            }
            Some("message") => {
                message = Some(field.text().await.map_err(|e| bad_request(&e.to_string()))?);
            }
            _ => {}
        }
    }

    let Some((kind, bytes)) = upload else {
        return Err(bad_request("file is required"));
    };
    let text = match message.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => return Err(bad_request("message is required")),
    };

    match herald_discord::bulk::ingest(&state.dispatcher, &bytes, kind, &text, None).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            warn!(error = %e, "POST /send-bulk rejected the upload");
            Err((
                StatusCode::BAD_REQUEST,
                Json(ApiError {
                    error: e.to_string(),
                    code: parse_code(&e),
                }),
            ))
        }
    }
}

fn parse_code(error: &ParseError) -> &'static str {
    match error {
        ParseError::MissingColumn => "MISSING_COLUMN",
        ParseError::EmptySource => "EMPTY_SOURCE",
        ParseError::NoRecipients => "NO_RECIPIENTS",
        ParseError::Malformed(_) => "MALFORMED_UPLOAD",
    }
}
