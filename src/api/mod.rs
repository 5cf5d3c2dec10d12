pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::db::BudgetStore;
use crate::service::{
    BudgetQueryService, ImportService, InsightGenerator, InsightService, ReportService,
};

pub use handlers::*;

/// Shared state: one service per contract
#[derive(Clone)]
pub struct AppState {
    pub query: Arc<BudgetQueryService>,
    pub import: Arc<ImportService>,
    pub insights: Arc<InsightService>,
    pub reports: Arc<ReportService>,
}

impl AppState {
    pub fn new(store: Arc<dyn BudgetStore>, generator: Arc<dyn InsightGenerator>) -> Self {
        let query = Arc::new(BudgetQueryService::new(store.clone()));
        Self {
            import: Arc::new(ImportService::new(store.clone())),
            reports: Arc::new(ReportService::new(store)),
            insights: Arc::new(InsightService::new(generator, query.clone())),
            query,
        }
    }
}

pub fn app_router(state: AppState, config: &AppConfig) -> Router {
    let query_routes = Router::new()
        .route("/api/budget", post(handlers::query_budget))
        .route("/api/departments", get(handlers::list_departments))
        .with_state(state.query);

    let import_routes = Router::new()
        .route("/api/import", post(handlers::import_csv))
        .layer(DefaultBodyLimit::max(config.import.max_upload_bytes))
        .with_state(state.import);

    let insight_routes = Router::new()
        .route("/api/insights", post(handlers::generate_insights))
        .with_state(state.insights);

    let report_routes = Router::new()
        .route("/api/reports", post(handlers::submit_report))
        .with_state(state.reports);

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(query_routes)
        .merge(import_routes)
        .merge(insight_routes)
        .merge(report_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
