use serde::{Deserialize, Serialize};

/// A caller-supplied recipient reference, classified.
///
/// Discord snowflakes are 17–19 decimal digits; anything else is treated as a
/// username to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientRef {
    /// Numeric Discord identifier (user or channel snowflake).
    Id(String),
    /// Human-chosen username, matched case-insensitively.
    Name(String),
}

impl RecipientRef {
    /// Classify a raw reference string.
    ///
    /// The input is trimmed first; returns `None` when nothing remains.
    pub fn classify(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if is_snowflake(trimmed) {
            Some(RecipientRef::Id(trimmed.to_string()))
        } else {
            Some(RecipientRef::Name(trimmed.to_string()))
        }
    }

    /// The trimmed reference text, whichever form it took.
    pub fn as_str(&self) -> &str {
        match self {
            RecipientRef::Id(s) | RecipientRef::Name(s) => s,
        }
    }
}

/// True for strings of 17–19 ASCII digits (the Discord snowflake range).
fn is_snowflake(s: &str) -> bool {
    (17..=19).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// One delivery request. Each variant carries exactly one recipient form;
/// `text` must be non-empty (enforced at the HTTP boundary).
#[derive(Debug, Clone)]
pub enum SendRequest {
    /// Deliver to the user found by case-insensitive username search.
    ToUsername { username: String, text: String },
    /// Deliver to the user addressed by numeric ID.
    ToUserId { user_id: String, text: String },
    /// Deliver straight into a text channel.
    ToChannel { channel_id: String, text: String },
}

impl SendRequest {
    /// Build the request matching an already-classified recipient reference.
    pub fn for_recipient(recipient: &RecipientRef, text: &str) -> Self {
        match recipient {
            RecipientRef::Id(id) => SendRequest::ToUserId {
                user_id: id.clone(),
                text: text.to_string(),
            },
            RecipientRef::Name(name) => SendRequest::ToUsername {
                username: name.clone(),
                text: text.to_string(),
            },
        }
    }

    pub fn text(&self) -> &str {
        match self {
            SendRequest::ToUsername { text, .. }
            | SendRequest::ToUserId { text, .. }
            | SendRequest::ToChannel { text, .. } => text,
        }
    }
}

/// Successful delivery summary.
///
/// Carries both the resolved username and user ID when known — the caller may
/// have supplied only one of the two and needs both for display and history.
#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip)]
    pub text: String,
}

/// Aggregate outcome of a bulk send.
///
/// Built row by row while the pipeline runs; callers only ever see the
/// completed report. Serializes to the wire shape
/// `{"total": n, "success": n, "failed": n, "errors": [{"user", "error"}]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReport {
    /// Number of references extracted from the upload.
    pub total: usize,
    #[serde(rename = "success")]
    pub succeeded: usize,
    pub failed: usize,
    /// Per-row failures, in source row order.
    #[serde(rename = "errors")]
    pub failures: Vec<BulkFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
    /// The reference exactly as it appeared in the upload.
    #[serde(rename = "user")]
    pub reference: String,
    /// Classified error detail for this row.
    #[serde(rename = "error")]
    pub detail: String,
}

impl BulkReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, reference: impl Into<String>, detail: impl Into<String>) {
        self.failed += 1;
        self.failures.push(BulkFailure {
            reference: reference.into(),
            detail: detail.into(),
        });
    }

    /// Rows the pipeline actually attempted (differs from `total` only when a
    /// shutdown signal stopped the loop early).
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflakes_classify_as_id() {
        for raw in [
            "12345678901234567",     // 17 digits
            "123456789012345678",    // 18
            "1234567890123456789",   // 19
            " 123456789012345678 ",  // trimmed first
        ] {
            assert!(
                matches!(RecipientRef::classify(raw), Some(RecipientRef::Id(_))),
                "expected Id for {raw:?}"
            );
        }
    }

    #[test]
    fn everything_else_classifies_as_name() {
        for raw in [
            "Alice",
            "1234567890123456",      // 16 digits: too short
            "12345678901234567890",  // 20 digits: too long
            "12345678901234567a",    // digit rule is strict
            "123 456789012345678",   // inner whitespace
        ] {
            assert!(
                matches!(RecipientRef::classify(raw), Some(RecipientRef::Name(_))),
                "expected Name for {raw:?}"
            );
        }
    }

    #[test]
    fn blank_references_classify_as_none() {
        assert_eq!(RecipientRef::classify(""), None);
        assert_eq!(RecipientRef::classify("   "), None);
    }

    #[test]
    fn bulk_report_wire_shape() {
        let mut report = BulkReport::new(3);
        report.record_success();
        report.record_success();
        report.record_failure("ghost", "no user or channel matches 'ghost'");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total"], 3);
        assert_eq!(json["success"], 2);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["errors"][0]["user"], "ghost");
        assert_eq!(
            json["errors"][0]["error"],
            "no user or channel matches 'ghost'"
        );
    }

    #[test]
    fn send_request_follows_classification() {
        let id = RecipientRef::classify("123456789012345678").unwrap();
        assert!(matches!(
            SendRequest::for_recipient(&id, "hi"),
            SendRequest::ToUserId { .. }
        ));

        let name = RecipientRef::classify("alice").unwrap();
        assert!(matches!(
            SendRequest::for_recipient(&name, "hi"),
            SendRequest::ToUsername { .. }
        ));
    }
}
