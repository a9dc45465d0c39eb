// Idea Board Server

use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use idea_board::{
    app_state::AppState, config::Config, data_seeder::initialize_store,
    idea_interface::create_idea_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state, then seed an empty board
    let app_state = AppState::new(config.clone()).await?;
    info!("Connected to database '{}'", app_state.store().database_name());
    initialize_store(app_state.store().as_ref()).await?;

    let app = create_idea_router(app_state);

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!("🚀 Idea Board API listening on http://{}", address);
    info!("  GET  /api/ideas?period=week|month&sort=votes|comments");
    info!("  GET  /api/ideas/{{id}}");
    info!("  POST /api/ideas | /api/comments | /api/votes");
    info!("  GET  /test");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
