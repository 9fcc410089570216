use tokio::sync::watch;

use crate::error::DispatchError;

/// Connection lifecycle of the shared Discord session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No login attempt has been made yet.
    Disconnected,
    /// Login is in flight.
    Connecting,
    /// Handshake complete; the transport is safe to use.
    Ready,
    /// Login or the gateway failed. Terminal for the process.
    Faulted(String),
}

impl ConnectionState {
    /// Short lowercase label for logs and the health endpoint.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Ready => "ready",
            ConnectionState::Faulted(_) => "faulted",
        }
    }
}

/// Tracks whether the Discord connection is usable, and lets dispatch
/// operations suspend until it is.
///
/// Backed by a watch channel: every caller parked in [`await_ready`] is
/// released on the edge to `Ready` (or `Faulted`) without interval polling.
/// Transitions are the only mutation path — everything else holds an
/// `Arc<ReadinessGate>` and reads.
///
/// [`await_ready`]: ReadinessGate::await_ready
pub struct ReadinessGate {
    tx: watch::Sender<ConnectionState>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Disconnected);
        Self { tx }
    }

    /// Current state snapshot.
    pub fn state(&self) -> ConnectionState {
        self.tx.borrow().clone()
    }

    /// Mark a login attempt as started.
    pub fn connecting(&self) {
        self.transition(ConnectionState::Connecting);
    }

    /// Mark the handshake as complete. Releases all parked waiters.
    pub fn ready(&self) {
        self.transition(ConnectionState::Ready);
    }

    /// Record a fatal connection error.
    ///
    /// Once faulted the gate stays faulted, so waiters fail fast instead of
    /// hanging on a connection that will never come back.
    pub fn fault(&self, reason: impl Into<String>) {
        self.transition(ConnectionState::Faulted(reason.into()));
    }

    /// Clean shutdown: back to `Disconnected` unless already faulted.
    pub fn shutdown(&self) {
        self.transition(ConnectionState::Disconnected);
    }

    fn transition(&self, next: ConnectionState) {
        self.tx.send_if_modified(|state| {
            // Faulted is terminal.
            if matches!(state, ConnectionState::Faulted(_)) {
                return false;
            }
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Suspend until the connection is `Ready`.
    ///
    /// Returns immediately when already ready, and fails immediately with
    /// [`DispatchError::ConnectionFault`] when the gate is (or becomes)
    /// faulted.
    pub async fn await_ready(&self) -> Result<(), DispatchError> {
        let mut rx = self.tx.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                match &*state {
                    ConnectionState::Ready => return Ok(()),
                    ConnectionState::Faulted(reason) => {
                        return Err(DispatchError::ConnectionFault(reason.clone()));
                    }
                    _ => {}
                }
            }
            if rx.changed().await.is_err() {
                return Err(DispatchError::ConnectionFault(
                    "readiness gate dropped".to_string(),
                ));
            }
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
