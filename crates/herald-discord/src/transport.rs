use async_trait::async_trait;
use thiserror::Error;

/// A Discord user as seen through the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    pub id: u64,
    pub username: String,
}

/// A Discord channel as seen through the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteChannel {
    pub id: u64,
    /// Whether text messages can be posted into this channel.
    pub text_capable: bool,
}

/// A server (guild) the bot participates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityRef {
    pub id: u64,
    pub name: String,
}

/// Low-level failure reported by the transport.
///
/// Produced where the Discord error codes are visible. The resolver and
/// dispatcher turn these into the caller-facing [`DispatchError`] taxonomy —
/// never the other way around.
///
/// [`DispatchError`]: herald_core::error::DispatchError
#[derive(Debug, Error)]
pub enum TransportFailure {
    /// The referenced user or channel does not exist.
    #[error("not found")]
    NotFound,

    /// Discord refused to open or use the DM channel (no shared server, no
    /// prior contact, or the bot is blocked).
    #[error("cannot send messages to this user")]
    CannotDm,

    /// The request was throttled.
    #[error("rate limited")]
    RateLimited,

    /// The bot lacks the permission or intent the call requires.
    #[error("missing access: {0}")]
    MissingAccess(String),

    /// Anything else, original detail preserved.
    #[error("{0}")]
    Other(String),
}

/// The Discord capabilities the dispatch core consumes.
///
/// One implementation instance serves every in-flight dispatch, so
/// implementations must be `Send + Sync` and take `&self`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Look up a user by numeric ID.
    async fn fetch_user(&self, user_id: u64) -> Result<RemoteUser, TransportFailure>;

    /// Look up a channel by numeric ID.
    async fn fetch_channel(&self, channel_id: u64) -> Result<RemoteChannel, TransportFailure>;

    /// Open (or reuse) the private-message channel with a user, returning the
    /// channel ID.
    async fn open_private_channel(&self, user_id: u64) -> Result<u64, TransportFailure>;

    /// Post text into a channel.
    async fn send_text(&self, channel_id: u64, text: &str) -> Result<(), TransportFailure>;

    /// Every server the bot participates in.
    async fn list_communities(&self) -> Result<Vec<CommunityRef>, TransportFailure>;

    /// Member list of one server.
    ///
    /// Fails with [`TransportFailure::MissingAccess`] when the privileged
    /// server-members intent is not granted to the bot.
    async fn list_members(&self, community_id: u64) -> Result<Vec<RemoteUser>, TransportFailure>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn fetch_user(&self, user_id: u64) -> Result<RemoteUser, TransportFailure> {
        (**self).fetch_user(user_id).await
    }

    async fn fetch_channel(&self, channel_id: u64) -> Result<RemoteChannel, TransportFailure> {
        (**self).fetch_channel(channel_id).await
    }

    async fn open_private_channel(&self, user_id: u64) -> Result<u64, TransportFailure> {
        (**self).open_private_channel(user_id).await
    }

    async fn send_text(&self, channel_id: u64, text: &str) -> Result<(), TransportFailure> {
        (**self).send_text(channel_id, text).await
    }

    async fn list_communities(&self) -> Result<Vec<CommunityRef>, TransportFailure> {
        (**self).list_communities().await
    }

    async fn list_members(&self, community_id: u64) -> Result<Vec<RemoteUser>, TransportFailure> {
        (**self).list_members(community_id).await
    }
}
