pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use api::{app_router, AppState};
pub use config::AppConfig;
pub use db::{create_pool, BudgetStore, MemoryBudgetStore, PgBudgetStore};
pub use error::{Error, Result};
pub use service::{BudgetQueryService, ImportService, InsightService, ReportService};
