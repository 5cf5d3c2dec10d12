pub mod memory;
pub mod pool;
pub mod queries;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BudgetFilter, BudgetRow, CitizenReport, NewBudgetRow, NewCitizenReport};

pub use memory::MemoryBudgetStore;
pub use pool::{create_pool, run_migrations};
pub use queries::PgBudgetStore;

/// Row-oriented storage behind the query and import services.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Rows matching `filter` by equality, largest amount first.
    async fn query(&self, filter: &BudgetFilter) -> Result<Vec<BudgetRow>>;

    /// Persists `rows` as one batch and returns how many were written.
    async fn insert(&self, rows: &[NewBudgetRow]) -> Result<usize>;

    /// Distinct departments present in storage, sorted.
    async fn departments(&self) -> Result<Vec<String>>;

    /// Stores one validated citizen report and returns it with its id and timestamp.
    async fn insert_report(&self, report: &NewCitizenReport) -> Result<CitizenReport>;
}
