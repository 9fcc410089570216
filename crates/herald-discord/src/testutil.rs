//! Scripted in-memory transport for dispatcher, resolver, and bulk tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use herald_core::gate::ReadinessGate;

use crate::transport::{CommunityRef, RemoteChannel, RemoteUser, Transport, TransportFailure};

/// Offset mapping a user ID to its mock DM channel ID.
pub const DM_CHANNEL_BASE: u64 = 1_000_000_000;

/// In-memory transport scripted per test; records every delivered text.
#[derive(Default)]
pub struct MockTransport {
    pub users: HashMap<u64, RemoteUser>,
    pub channels: HashMap<u64, RemoteChannel>,
    pub communities: Vec<CommunityRef>,
    /// community id → member list; a listed community with no entry here
    /// denies the listing (missing privileged intent).
    pub members: HashMap<u64, Vec<RemoteUser>>,
    /// Users whose DMs are closed.
    pub dm_blocked: Vec<u64>,
    /// Channels that throttle on send.
    pub throttled_channels: Vec<u64>,
    sent: Mutex<Vec<(u64, String)>>,
    community_calls: AtomicUsize,
}

impl MockTransport {
    pub fn add_user(&mut self, id: u64, username: &str) {
        self.users.insert(
            id,
            RemoteUser {
                id,
                username: username.to_string(),
            },
        );
    }

    pub fn add_channel(&mut self, id: u64, text_capable: bool) {
        self.channels.insert(id, RemoteChannel { id, text_capable });
    }

    /// Every (channel_id, text) pair delivered so far, in order.
    pub fn sent_log(&self) -> Vec<(u64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn community_list_calls(&self) -> usize {
        self.community_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_user(&self, user_id: u64) -> Result<RemoteUser, TransportFailure> {
        self.users
            .get(&user_id)
            .cloned()
            .ok_or(TransportFailure::NotFound)
    }

    async fn fetch_channel(&self, channel_id: u64) -> Result<RemoteChannel, TransportFailure> {
        self.channels
            .get(&channel_id)
            .cloned()
            .ok_or(TransportFailure::NotFound)
    }

    async fn open_private_channel(&self, user_id: u64) -> Result<u64, TransportFailure> {
        if self.dm_blocked.contains(&user_id) {
            return Err(TransportFailure::CannotDm);
        }
        if !self.users.contains_key(&user_id) {
            return Err(TransportFailure::NotFound);
        }
        Ok(DM_CHANNEL_BASE + user_id)
    }

    async fn send_text(&self, channel_id: u64, text: &str) -> Result<(), TransportFailure> {
        if self.throttled_channels.contains(&channel_id) {
            return Err(TransportFailure::RateLimited);
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id, text.to_string()));
        Ok(())
    }

    async fn list_communities(&self) -> Result<Vec<CommunityRef>, TransportFailure> {
        self.community_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.communities.clone())
    }

    async fn list_members(&self, community_id: u64) -> Result<Vec<RemoteUser>, TransportFailure> {
        self.members.get(&community_id).cloned().ok_or_else(|| {
            TransportFailure::MissingAccess("missing server members intent".to_string())
        })
    }
}

/// A gate already in the `Ready` state.
pub fn ready_gate() -> Arc<ReadinessGate> {
    let gate = Arc::new(ReadinessGate::new());
    gate.connecting();
    gate.ready();
    gate
}
