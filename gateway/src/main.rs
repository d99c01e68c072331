use std::sync::Arc;

use tokio::net::TcpListener;

use jobmatch_gateway::gateway::watch;
use jobmatch_gateway::{app, logging, AppState, ConfigStore, HttpTransport, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize tracing
    logging::init_tracing(&settings.logging.level);

    tracing::info!("Starting JobMatch Service Gateway");

    let store = Arc::new(ConfigStore::open(&settings.services_file));
    tracing::info!(
        "Serving configuration sequence {} from {}",
        store.current().sequence(),
        store.source().display()
    );

    match settings.reload_interval() {
        Some(interval) => {
            tokio::spawn(watch(Arc::clone(&store), interval));
            tracing::info!("Watching services document every {:?}", interval);
        }
        None => tracing::info!("Services document polling disabled"),
    }

    let addr = settings.bind_addr();
    let state = Arc::new(AppState::new(
        settings,
        store,
        Arc::new(HttpTransport::new()),
    ));

    // Start server
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
