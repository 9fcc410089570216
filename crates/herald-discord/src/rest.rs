use std::sync::Arc;

use serenity::http::{GuildPagination, Http, HttpError};
use serenity::model::channel::{Channel, ChannelType};
use serenity::model::id::{ChannelId, GuildId, UserId};
use tracing::debug;

use crate::send::split_message;
use crate::transport::{CommunityRef, RemoteChannel, RemoteUser, Transport, TransportFailure};

/// Discord's REST page maxima for guild and member listing.
const GUILD_PAGE: u64 = 200;
const MEMBER_PAGE: u64 = 1000;

/// REST-backed transport over the shared serenity `Http` client.
///
/// `Arc<Http>` is independent of the gateway WebSocket, so one instance built
/// from the client serves every dispatch task for the life of the process.
pub struct RestTransport {
    http: Arc<Http>,
}

impl RestTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl Transport for RestTransport {
    async fn fetch_user(&self, user_id: u64) -> Result<RemoteUser, TransportFailure> {
        let user = self
            .http
            .get_user(UserId::new(user_id))
            .await
            .map_err(classify)?;
        Ok(RemoteUser {
            id: user.id.get(),
            username: user.name,
        })
    }

    async fn fetch_channel(&self, channel_id: u64) -> Result<RemoteChannel, TransportFailure> {
        let channel = self
            .http
            .get_channel(ChannelId::new(channel_id))
            .await
            .map_err(classify)?;
        Ok(RemoteChannel {
            id: channel_id,
            text_capable: is_text_capable(&channel),
        })
    }

    async fn open_private_channel(&self, user_id: u64) -> Result<u64, TransportFailure> {
        let channel = UserId::new(user_id)
            .create_dm_channel(self.http.as_ref())
            .await
            .map_err(classify)?;
        debug!(user_id, dm_channel = channel.id.get(), "DM channel open");
        Ok(channel.id.get())
    }

    async fn send_text(&self, channel_id: u64, text: &str) -> Result<(), TransportFailure> {
        let channel = ChannelId::new(channel_id);
        for chunk in split_message(text) {
            channel
                .say(self.http.as_ref(), chunk)
                .await
                .map_err(classify)?;
        }
        Ok(())
    }

    async fn list_communities(&self) -> Result<Vec<CommunityRef>, TransportFailure> {
        let mut communities = Vec::new();
        let mut after: Option<GuildId> = None;
        loop {
            let page = self
                .http
                .get_guilds(after.map(GuildPagination::After), Some(GUILD_PAGE))
                .await
                .map_err(classify)?;
            let page_len = page.len() as u64;
            for info in page {
                after = Some(info.id);
                communities.push(CommunityRef {
                    id: info.id.get(),
                    name: info.name,
                });
            }
            if page_len < GUILD_PAGE {
                break;
            }
        }
        Ok(communities)
    }

    async fn list_members(&self, community_id: u64) -> Result<Vec<RemoteUser>, TransportFailure> {
        let guild = GuildId::new(community_id);
        let mut members = Vec::new();
        let mut after: Option<u64> = None;
        loop {
            let page = self
                .http
                .get_guild_members(guild, Some(MEMBER_PAGE), after)
                .await
                .map_err(classify)?;
            let page_len = page.len() as u64;
            for member in page {
                after = Some(member.user.id.get());
                members.push(RemoteUser {
                    id: member.user.id.get(),
                    username: member.user.name,
                });
            }
            if page_len < MEMBER_PAGE {
                break;
            }
        }
        Ok(members)
    }
}

/// True when the channel can carry a plain text message.
fn is_text_capable(channel: &Channel) -> bool {
    match channel {
        Channel::Private(_) => true,
        Channel::Guild(guild_channel) => matches!(
            guild_channel.kind,
            ChannelType::Text
                | ChannelType::News
                | ChannelType::PublicThread
                | ChannelType::PrivateThread
                | ChannelType::NewsThread
        ),
        _ => false,
    }
}

/// Map a serenity error to a transport failure.
///
/// Discord JSON error codes are the reliable signal here: 10013/10003 are
/// unknown user/channel, 50007 is the closed-DM case, 50001 is missing
/// access. HTTP 403 on member listing also means the privileged intent is
/// absent, and 429 is throttling.
fn classify(err: serenity::Error) -> TransportFailure {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err {
        return match response.error.code {
            10003 | 10013 => TransportFailure::NotFound,
            50007 => TransportFailure::CannotDm,
            50001 => TransportFailure::MissingAccess(response.error.message.clone()),
            _ => match response.status_code.as_u16() {
                403 => TransportFailure::MissingAccess(response.error.message.clone()),
                404 => TransportFailure::NotFound,
                429 => TransportFailure::RateLimited,
                _ => TransportFailure::Other(err.to_string()),
            },
        };
    }
    TransportFailure::Other(err.to_string())
}
