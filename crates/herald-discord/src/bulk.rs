//! Bulk pipeline — tabular upload to per-recipient dispatch with an
//! aggregate report.

use herald_core::types::{BulkReport, RecipientRef, SendRequest};
use herald_ingest::{ParseError, UploadKind};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::dispatch::Dispatcher;
use crate::transport::Transport;

/// Parse an uploaded table and dispatch the shared text to every recipient.
///
/// Only parse failures abort the pipeline; per-recipient failures are
/// recorded into the report and the loop continues. Returns after every row
/// has been attempted.
pub async fn ingest<T: Transport>(
    dispatcher: &Dispatcher<T>,
    bytes: &[u8],
    kind: UploadKind,
    text: &str,
    shutdown: Option<watch::Receiver<bool>>,
) -> Result<BulkReport, ParseError> {
    let recipients = herald_ingest::extract_recipients(bytes, kind)?;
    Ok(run(dispatcher, recipients, text, shutdown).await)
}

/// Sequential dispatch over an ordered recipient list.
///
/// Rows are processed strictly in source order, one at a time: concurrent
/// bursts are what get bots throttled, and sequential processing keeps
/// failure attribution unambiguous. When the shutdown signal flips, no
/// further dispatches are issued; `total` still reflects every parsed row
/// while the counts reflect only attempted rows.
pub async fn run<T: Transport>(
    dispatcher: &Dispatcher<T>,
    recipients: Vec<String>,
    text: &str,
    shutdown: Option<watch::Receiver<bool>>,
) -> BulkReport {
    let mut report = BulkReport::new(recipients.len());

    for reference in recipients {
        if let Some(rx) = &shutdown {
            if *rx.borrow() {
                info!(
                    attempted = report.attempted(),
                    total = report.total,
                    "bulk send interrupted"
                );
                break;
            }
        }

        // The parser only emits trimmed, non-empty cells.
        let Some(recipient) = RecipientRef::classify(&reference) else {
            continue;
        };
        let request = SendRequest::for_recipient(&recipient, text);

        match dispatcher.dispatch(&request).await {
            Ok(_) => report.record_success(),
            Err(e) => {
                warn!(reference = %reference, error = %e, "bulk recipient failed");
                report.record_failure(reference, e.to_string());
            }
        }
    }

    info!(
        total = report.total,
        succeeded = report.succeeded,
        failed = report.failed,
        "bulk send complete"
    );
    report
}
