use thiserror::Error;

/// Closed failure taxonomy for message delivery.
///
/// Classification happens at the lowest layer that can tell the cases apart:
/// the resolver classifies lookup failures, the dispatcher classifies delivery
/// failures. Layers above only add context, never re-classify.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The Discord connection never became ready, or faulted.
    #[error("Discord connection is not available: {0}")]
    ConnectionFault(String),

    /// The reference did not resolve to any known user or channel.
    #[error("no user or channel matches '{0}'")]
    NotFound(String),

    /// Username search cannot run without the privileged member-listing grant.
    #[error(
        "username lookup requires the Server Members intent; enable it in the \
         Discord developer portal, or address the recipient by numeric ID"
    )]
    MemberSearchUnavailable,

    /// The user exists but cannot currently receive a direct message.
    #[error(
        "user '{0}' does not accept direct messages from the bot; share a \
         server with them, or have them message the bot first"
    )]
    Unreachable(String),

    /// Discord is throttling the bot. Callers may retry later; herald never
    /// retries internally.
    #[error("Discord is rate limiting the bot; retry later")]
    RateLimited,

    /// A channel reference resolved to a channel that cannot carry text.
    #[error("channel '{0}' is not a text channel")]
    InvalidTarget(String),

    /// Unclassified Discord API failure, original detail preserved.
    #[error("Discord API error: {0}")]
    Transport(String),
}

impl DispatchError {
    /// Short error code string included in HTTP error responses.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::ConnectionFault(_) => "CONNECTION_FAULT",
            DispatchError::NotFound(_) => "NOT_FOUND",
            DispatchError::MemberSearchUnavailable => "MEMBER_SEARCH_UNAVAILABLE",
            DispatchError::Unreachable(_) => "UNREACHABLE",
            DispatchError::RateLimited => "RATE_LIMITED",
            DispatchError::InvalidTarget(_) => "INVALID_TARGET",
            DispatchError::Transport(_) => "TRANSPORT_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
