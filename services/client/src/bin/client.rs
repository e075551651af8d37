//! services/client/src/bin/client.rs

use std::sync::Arc;

use client_lib::{
    adapters::{FilePersister, HttpAuthGateway},
    config::Config,
    error::ClientError,
    shell::Shell,
};
use session_core::{
    Navigator, RedirectMemory, RouteTable, SessionGate, SessionStore, SystemClock,
};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(api = %config.api_base_url, "Configuration loaded. Starting client...");

    // --- 2. Initialize Adapters ---
    let gateway = Arc::new(HttpAuthGateway::new(
        config.api_base_url.clone(),
        config.request_timeout,
    )?);
    let persister = Arc::new(FilePersister::new(config.state_path.clone()));
    info!(path = %persister.path().display(), "Using session storage");

    // --- 3. Build the Session Controller ---
    let store = Arc::new(SessionStore::new(
        gateway,
        persister,
        Arc::new(SystemClock),
        config.store_settings(),
    ));
    let gate = SessionGate::new(RouteTable::default(), Arc::new(RedirectMemory::new()));
    let navigator = Arc::new(Navigator::new(gate, "/"));
    let follower = tokio::spawn(navigator.clone().follow(store.subscribe()));

    // --- 4. Restore the Persisted Session ---
    store.hydrate().await;

    // --- 5. Run the Shell ---
    let shell = Shell::new(store.clone(), navigator);
    let stdin = BufReader::new(tokio::io::stdin());
    shell.run(stdin, tokio::io::stdout()).await?;

    follower.abort();
    info!("Client stopped");
    Ok(())
}
