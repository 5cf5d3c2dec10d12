use municipal_budget_rust::db::run_migrations;
use municipal_budget_rust::service::{
    HttpInsightGenerator, InsightGenerator, UnconfiguredInsightGenerator,
};
use municipal_budget_rust::{
    app_router, create_pool, AppConfig, AppState, BudgetStore, MemoryBudgetStore, PgBudgetStore,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging: local timestamps, RUST_LOG filter, info by default
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let store: Arc<dyn BudgetStore> = match config.database.url.as_deref() {
        Some(url) => {
            let pool = create_pool(url, config.database.max_connections).await?;
            run_migrations(&pool).await?;
            info!("Database pool created, migrations applied");
            Arc::new(PgBudgetStore::new(pool))
        }
        None => {
            warn!("No database configured, budget rows are kept in memory only");
            Arc::new(MemoryBudgetStore::new())
        }
    };

    let generator: Arc<dyn InsightGenerator> = match config.insights.endpoint.as_deref() {
        Some(endpoint) => Arc::new(HttpInsightGenerator::new(endpoint, &config.insights)?),
        None => {
            warn!("No insight provider configured, /api/insights will fail");
            Arc::new(UnconfiguredInsightGenerator)
        }
    };

    let app = app_router(AppState::new(store, generator), &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/budget       - budget rows + summary");
    info!("  POST /api/import       - CSV upload");
    info!("  GET  /api/departments  - department list");
    info!("  POST /api/insights     - AI insights");
    info!("  POST /api/reports      - citizen report");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
