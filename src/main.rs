use std::panic;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commondocs_sync::config::Config;
use commondocs_sync::db::dbdocs::DbDocs;
use commondocs_sync::storage::{memory::MemoryStore, DocumentStore};
use commondocs_sync::{build_app, AppState};

#[tokio::main]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "commondocs_sync=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    // Initialize the document store: Postgres when configured, otherwise an
    // in-memory store that loses everything on restart.
    let store: Arc<dyn DocumentStore> = match &config.db_url {
        Some(db_url) => match DbDocs::connect(db_url).await {
            Ok(db) => {
                info!("Database initialized successfully");
                Arc::new(db)
            }
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                warn!("Falling back to in-memory document store");
                Arc::new(MemoryStore::new())
            }
        },
        None => {
            warn!("No database URL configured - using in-memory document store");
            Arc::new(MemoryStore::new())
        }
    };

    let app_state = AppState::new(config.clone(), store);
    let app = build_app(app_state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 Server running on http://{}", config.server_address());
    info!("📡 Collaboration socket at ws://{}/ws", config.server_address());
    info!("📚 Swagger UI available at http://{}/swagger", config.server_address());

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
