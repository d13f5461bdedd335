use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use task_api::config::Config;
use task_api::routes::tasks::{InMemoryTaskStore, PgTaskStore, TaskStore};
use task_api::{app, telemetry, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = Config::from_env()?;

    let store: Arc<dyn TaskStore> = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            tracing::info!("database migrations applied");
            Arc::new(PgTaskStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, tasks will be kept in memory");
            Arc::new(InMemoryTaskStore::new())
        }
    };

    let app = app(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    tracing::info!("server listening on http://{}", config.addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
