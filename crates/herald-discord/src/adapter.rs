use std::sync::Arc;

use serenity::async_trait;
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::prelude::{Context, EventHandler};
use serenity::Client;
use tracing::{error, info};

use herald_core::gate::ReadinessGate;

/// Gateway intents the dispatcher needs.
///
/// `GUILD_MEMBERS` is the privileged one: without it enabled in the developer
/// portal, username search fails with `MemberSearchUnavailable` while
/// ID-addressed sends keep working.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS | GatewayIntents::DIRECT_MESSAGES
}

/// Serenity event handler that flips the readiness gate on handshake.
pub struct ReadyHandler {
    pub gate: Arc<ReadinessGate>,
}

#[async_trait]
impl EventHandler for ReadyHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(name = %ready.user.name, "Discord bot connected");
        self.gate.ready();
    }
}

/// Build the serenity client wired to the gate.
pub async fn build_client(
    token: &str,
    gate: Arc<ReadinessGate>,
) -> Result<Client, serenity::Error> {
    Client::builder(token, intents())
        .event_handler(ReadyHandler { gate })
        .await
}

/// Drive the gateway connection until it ends.
///
/// Marks the gate `Connecting` before login and `Faulted` if the gateway
/// returns an error. A faulted gate is terminal, so dispatch callers fail
/// fast instead of waiting on a connection that will not come back.
pub async fn run(mut client: Client, gate: Arc<ReadinessGate>) {
    gate.connecting();
    info!("Discord: gateway connecting");

    match client.start().await {
        Ok(()) => {
            info!("Discord: gateway stopped cleanly");
            gate.shutdown();
        }
        Err(e) => {
            error!(error = %e, "Discord: gateway failed");
            gate.fault(e.to_string());
        }
    }
}
