use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

mod app;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit HERALD_CONFIG env > ~/.herald/herald.toml
    let config_path = std::env::var("HERALD_CONFIG").ok();
    let config =
        herald_core::config::HeraldConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            herald_core::config::HeraldConfig::default()
        });

    let token = config.discord.resolve_token().ok_or_else(|| {
        anyhow::anyhow!(
            "no Discord bot token: set discord.bot_token in herald.toml \
             or the DISCORD_BOT_TOKEN env var"
        )
    })?;

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    // One gate and one REST client shared by the gateway connection and
    // every dispatch. Arc<Http> stays valid independently of the WebSocket.
    let gate = Arc::new(herald_core::gate::ReadinessGate::new());
    let client = herald_discord::adapter::build_client(&token, Arc::clone(&gate)).await?;
    let transport = herald_discord::RestTransport::new(Arc::clone(&client.http));
    let dispatcher = herald_discord::Dispatcher::new(Arc::clone(&gate), transport);

    // Drive the Discord connection in the background; the gate tracks it.
    tokio::spawn(herald_discord::adapter::run(client, Arc::clone(&gate)));

    let state = Arc::new(app::AppState {
        config,
        gate,
        dispatcher,
    });
    let router = app::build_router(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("herald gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
