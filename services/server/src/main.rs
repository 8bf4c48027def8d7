use server::AppState;
use server::config::ServerConfig;
use server::db::{OpenMode, Storage};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    if let Err(e) = run(config).await {
        error!(error = %e, "server exiting");
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(storage = %config.storage.describe(), "connecting to database...");
    let storage = Storage::open(&config.storage, &config.pool, OpenMode::Existing).await?;
    if config.auto_migrate {
        storage.migrate().await?;
        info!(backend = storage.backend_name(), "migrations applied");
    }

    let state = AppState::new(storage.into_log_store());
    let router = server::build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
