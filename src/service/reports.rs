use std::sync::Arc;

use crate::db::BudgetStore;
use crate::error::{Error, Result};
use crate::models::{CitizenReport, NewCitizenReport};

/// Accepts anonymous citizen reports.
pub struct ReportService {
    store: Arc<dyn BudgetStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn BudgetStore>) -> Self {
        Self { store }
    }

    /// Trims the text fields and drops blank image URLs before storing.
    pub async fn submit(&self, report: NewCitizenReport) -> Result<CitizenReport> {
        let description = report.description.trim();
        let category = report.category.trim();
        if description.is_empty() {
            return Err(Error::validation("Description is required"));
        }
        if category.is_empty() {
            return Err(Error::validation("Category is required"));
        }

        let cleaned = NewCitizenReport {
            description: description.to_string(),
            category: category.to_string(),
            image_urls: report
                .image_urls
                .iter()
                .map(|url| url.trim())
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect(),
        };

        let stored = self.store.insert_report(&cleaned).await?;
        tracing::info!(
            "Citizen report {} filed under {} with {} image(s)",
            stored.id,
            stored.category,
            stored.image_urls.len()
        );
        Ok(stored)
    }
}
