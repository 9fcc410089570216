use std::sync::Arc;

use herald_core::error::DispatchError;
use herald_core::gate::ReadinessGate;
use herald_core::types::{RecipientRef, SendRequest, SendResult};
use tracing::info;

use crate::resolver;
use crate::transport::{RemoteUser, Transport, TransportFailure};

/// Delivers single messages over the shared transport.
///
/// Every dispatch waits on the readiness gate first, then resolves its
/// recipient and sends. Dispatch is not idempotent — calling twice sends
/// twice; deduplication is a caller concern.
pub struct Dispatcher<T: Transport> {
    gate: Arc<ReadinessGate>,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(gate: Arc<ReadinessGate>, transport: T) -> Self {
        Self { gate, transport }
    }

    /// Deliver one message, returning the resolved identity on success.
    pub async fn dispatch(&self, request: &SendRequest) -> Result<SendResult, DispatchError> {
        self.gate.await_ready().await?;

        match request {
            SendRequest::ToChannel { channel_id, text } => {
                self.send_to_channel(channel_id, text).await
            }
            SendRequest::ToUserId { user_id, text } => {
                let reference = RecipientRef::Id(user_id.clone());
                let user = resolver::resolve(&self.transport, &reference).await?;
                self.send_to_user(user, text).await
            }
            SendRequest::ToUsername { username, text } => {
                let reference = RecipientRef::Name(username.clone());
                let user = resolver::resolve(&self.transport, &reference).await?;
                self.send_to_user(user, text).await
            }
        }
    }

    async fn send_to_channel(&self, raw_id: &str, text: &str) -> Result<SendResult, DispatchError> {
        let id: u64 = raw_id
            .parse()
            .map_err(|_| DispatchError::NotFound(raw_id.to_string()))?;

        let channel = match self.transport.fetch_channel(id).await {
            Ok(channel) => channel,
            Err(TransportFailure::NotFound) => {
                return Err(DispatchError::NotFound(raw_id.to_string()));
            }
            Err(other) => return Err(delivery_error(raw_id, other)),
        };

        // Rejected before any send side effect.
        if !channel.text_capable {
            return Err(DispatchError::InvalidTarget(raw_id.to_string()));
        }

        self.transport
            .send_text(channel.id, text)
            .await
            .map_err(|e| delivery_error(raw_id, e))?;

        info!(channel_id = id, "message sent to channel");
        Ok(SendResult {
            username: None,
            user_id: None,
            text: text.to_string(),
        })
    }

    async fn send_to_user(&self, user: RemoteUser, text: &str) -> Result<SendResult, DispatchError> {
        let dm_channel = self
            .transport
            .open_private_channel(user.id)
            .await
            .map_err(|e| delivery_error(&user.username, e))?;

        self.transport
            .send_text(dm_channel, text)
            .await
            .map_err(|e| delivery_error(&user.username, e))?;

        info!(user_id = user.id, username = %user.username, "direct message sent");
        Ok(SendResult {
            user_id: Some(user.id.to_string()),
            username: Some(user.username),
            text: text.to_string(),
        })
    }
}

/// Classify a transport failure reported while delivering.
fn delivery_error(reference: &str, failure: TransportFailure) -> DispatchError {
    match failure {
        TransportFailure::NotFound => DispatchError::NotFound(reference.to_string()),
        TransportFailure::CannotDm => DispatchError::Unreachable(reference.to_string()),
        TransportFailure::RateLimited => DispatchError::RateLimited,
        // Missing access on a delivery call is not the member-search case.
        TransportFailure::MissingAccess(detail) => DispatchError::Transport(detail),
        TransportFailure::Other(detail) => DispatchError::Transport(detail),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testutil::{ready_gate, MockTransport, DM_CHANNEL_BASE};
    use crate::transport::{CommunityRef, RemoteUser};
    use herald_core::gate::ReadinessGate;

    const ALICE_ID: u64 = 123456789012345678;

    fn to_user_id(id: u64, text: &str) -> SendRequest {
        SendRequest::ToUserId {
            user_id: id.to_string(),
            text: text.to_string(),
        }
    }

    /// Dispatcher over a shared mock, so tests can inspect the mock after
    /// dispatching through it.
    fn dispatcher_over(
        transport: MockTransport,
    ) -> (Dispatcher<Arc<MockTransport>>, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        (
            Dispatcher::new(ready_gate(), Arc::clone(&transport)),
            transport,
        )
    }

    #[tokio::test]
    async fn user_id_dispatch_returns_both_identity_halves() {
        let mut transport = MockTransport::default();
        transport.add_user(ALICE_ID, "alice");
        let (dispatcher, _) = dispatcher_over(transport);

        let result = dispatcher
            .dispatch(&to_user_id(ALICE_ID, "hi"))
            .await
            .unwrap();
        assert_eq!(result.username.as_deref(), Some("alice"));
        assert_eq!(result.user_id, Some(ALICE_ID.to_string()));
    }

    #[tokio::test]
    async fn user_dispatch_delivers_into_the_dm_channel() {
        let mut transport = MockTransport::default();
        transport.add_user(ALICE_ID, "alice");
        let (dispatcher, mock) = dispatcher_over(transport);

        dispatcher
            .dispatch(&to_user_id(ALICE_ID, "hello"))
            .await
            .unwrap();

        assert_eq!(
            mock.sent_log(),
            vec![(DM_CHANNEL_BASE + ALICE_ID, "hello".to_string())]
        );
    }

    #[tokio::test]
    async fn username_dispatch_resolves_through_communities() {
        let mut transport = MockTransport::default();
        transport.add_user(ALICE_ID, "Alice");
        transport.communities.push(CommunityRef {
            id: 1,
            name: "guild".into(),
        });
        transport.members.insert(
            1,
            vec![RemoteUser {
                id: ALICE_ID,
                username: "Alice".into(),
            }],
        );
        let (dispatcher, _) = dispatcher_over(transport);

        let request = SendRequest::ToUsername {
            username: "alice".into(),
            text: "hi".into(),
        };
        let result = dispatcher.dispatch(&request).await.unwrap();
        assert_eq!(result.username.as_deref(), Some("Alice"));
        assert_eq!(result.user_id, Some(ALICE_ID.to_string()));
    }

    #[tokio::test]
    async fn unknown_user_id_is_not_found() {
        let (dispatcher, _) = dispatcher_over(MockTransport::default());
        let err = dispatcher
            .dispatch(&to_user_id(ALICE_ID, "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
    }

    #[tokio::test]
    async fn closed_dms_classify_as_unreachable() {
        let mut transport = MockTransport::default();
        transport.add_user(ALICE_ID, "alice");
        transport.dm_blocked.push(ALICE_ID);
        let (dispatcher, mock) = dispatcher_over(transport);

        let err = dispatcher
            .dispatch(&to_user_id(ALICE_ID, "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Unreachable(ref name) if name == "alice"));
        // Remediation text reaches the caller verbatim.
        assert!(err.to_string().contains("share a server"));
        assert!(mock.sent_log().is_empty());
    }

    #[tokio::test]
    async fn throttled_delivery_classifies_as_rate_limited() {
        let mut transport = MockTransport::default();
        transport.add_user(ALICE_ID, "alice");
        transport.throttled_channels.push(DM_CHANNEL_BASE + ALICE_ID);
        let (dispatcher, _) = dispatcher_over(transport);

        let err = dispatcher
            .dispatch(&to_user_id(ALICE_ID, "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::RateLimited));
    }

    #[tokio::test]
    async fn channel_dispatch_posts_into_the_channel() {
        let mut transport = MockTransport::default();
        transport.add_channel(555, true);
        let (dispatcher, mock) = dispatcher_over(transport);

        let request = SendRequest::ToChannel {
            channel_id: "555".into(),
            text: "announcement".into(),
        };
        let result = dispatcher.dispatch(&request).await.unwrap();
        assert!(result.username.is_none());
        assert!(result.user_id.is_none());
        assert_eq!(mock.sent_log(), vec![(555, "announcement".to_string())]);
    }

    #[tokio::test]
    async fn non_text_channel_is_invalid_target_with_no_send() {
        let mut transport = MockTransport::default();
        transport.add_channel(555, false);
        let (dispatcher, mock) = dispatcher_over(transport);

        let request = SendRequest::ToChannel {
            channel_id: "555".into(),
            text: "announcement".into(),
        };
        let err = dispatcher.dispatch(&request).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTarget(_)));
        assert!(mock.sent_log().is_empty());
    }

    #[tokio::test]
    async fn faulted_gate_fails_before_any_transport_call() {
        let gate = Arc::new(ReadinessGate::new());
        gate.fault("login rejected");
        let transport = Arc::new(MockTransport::default());
        let dispatcher = Dispatcher::new(gate, Arc::clone(&transport));

        let err = dispatcher
            .dispatch(&to_user_id(ALICE_ID, "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::ConnectionFault(_)));
        assert!(transport.sent_log().is_empty());
    }
}
