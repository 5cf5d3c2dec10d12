use std::sync::Arc;

use crate::db::BudgetStore;
use crate::error::Result;
use crate::models::ImportReport;
use crate::service::csv_parser::CsvParser;

/// Turns one uploaded CSV into persisted budget rows.
pub struct ImportService {
    store: Arc<dyn BudgetStore>,
}

impl ImportService {
    pub fn new(store: Arc<dyn BudgetStore>) -> Self {
        Self { store }
    }

    /// Parse errors surface unchanged and nothing is written. The imported
    /// count is whatever the store reports as persisted.
    pub async fn import_csv(&self, content: &str) -> Result<ImportReport> {
        let parsed = CsvParser::parse(content)?;

        let persisted = self.store.insert(&parsed.rows).await?;
        if persisted != parsed.rows.len() {
            tracing::warn!(
                "Store persisted {} of {} parsed rows",
                persisted,
                parsed.rows.len()
            );
        }
        tracing::info!(
            "Imported {} budget records ({} rejected)",
            persisted,
            parsed.rejected
        );

        Ok(ImportReport {
            records_imported: persisted,
            records_rejected: parsed.rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBudgetStore;
    use crate::error::Error;
    use crate::models::{BudgetFilter, BudgetRow, CitizenReport, NewBudgetRow, NewCitizenReport};
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl BudgetStore for BrokenStore {
        async fn query(&self, _: &BudgetFilter) -> Result<Vec<BudgetRow>> {
            Err(Error::Storage("relation does not exist".into()))
        }
        async fn insert(&self, _: &[NewBudgetRow]) -> Result<usize> {
            Err(Error::Storage("connection reset".into()))
        }
        async fn departments(&self) -> Result<Vec<String>> {
            Err(Error::Storage("connection reset".into()))
        }
        async fn insert_report(&self, _: &NewCitizenReport) -> Result<CitizenReport> {
            Err(Error::Storage("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn imports_every_valid_row() {
        let store = Arc::new(MemoryBudgetStore::new());
        let service = ImportService::new(store.clone());
        let report = service
            .import_csv("Ward,Year,Category,Amount\n1,2023,Infrastructure,500000\n1,2023,Education,750000\n1,2023,Broken,n/a\n")
            .await
            .unwrap();

        assert_eq!(report.records_imported, 2);
        assert_eq!(report.records_rejected, 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn schema_errors_persist_nothing() {
        let store = Arc::new(MemoryBudgetStore::new());
        let service = ImportService::new(store.clone());
        let err = service
            .import_csv("Ward,Year,Category\n1,2023,Parks\n")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Schema { .. }));
        assert!(err.is_client_error());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_a_server_fault() {
        let service = ImportService::new(Arc::new(BrokenStore));
        let err = service
            .import_csv("Ward,Year,Category,Amount\n1,2023,Parks,10\n")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(!err.is_client_error());
    }
}
