use std::sync::Arc;

use crate::db::BudgetStore;
use crate::error::{Error, Result};
use crate::models::{BudgetFilter, BudgetReport, WardFilter};
use crate::service::aggregator;

/// Scope of one budget query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetQuery {
    pub department: String,
    pub ward: WardFilter,
    /// When absent every fiscal year is returned.
    pub year: Option<i32>,
}

impl BudgetQuery {
    pub fn department(department: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            ward: WardFilter::All,
            year: None,
        }
    }

    pub fn ward(mut self, ward: WardFilter) -> Self {
        self.ward = ward;
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

/// Read path shared by every budget view.
pub struct BudgetQueryService {
    store: Arc<dyn BudgetStore>,
}

impl BudgetQueryService {
    pub fn new(store: Arc<dyn BudgetStore>) -> Self {
        Self { store }
    }

    pub async fn query(&self, query: &BudgetQuery) -> Result<BudgetReport> {
        let department = query.department.trim();
        if department.is_empty() {
            return Err(Error::validation("Department is required"));
        }
        tracing::info!(
            "Fetching budget data for department: {}, ward: {:?}, year: {:?}",
            department,
            query.ward,
            query.year
        );

        let scope = BudgetFilter::department(department).with_ward(query.ward);
        let (rows, summary) = match query.year {
            Some(year) => {
                let current_scope = scope.clone().with_year(Some(year));
                let previous_scope = scope.with_year(Some(year.saturating_sub(1)));
                let (current, previous) = futures::try_join!(
                    self.store.query(&current_scope),
                    self.store.query(&previous_scope)
                )?;
                let summary = aggregator::summarize(&current, &previous);
                (current, summary)
            }
            None => {
                let rows = self.store.query(&scope).await?;
                let summary = aggregator::summarize_across_years(&rows);
                (rows, summary)
            }
        };

        let budget_data = aggregator::filter_and_sort(&rows);
        tracing::info!(
            "Department {}: {} rows ({} dropped), total {}",
            department,
            budget_data.len(),
            rows.len() - budget_data.len(),
            summary.total_budget
        );

        Ok(BudgetReport {
            chart_data: aggregator::top_n_with_others(&budget_data),
            table_rows: aggregator::table_rows(&budget_data),
            budget_data,
            summary,
        })
    }

    pub async fn departments(&self) -> Result<Vec<String>> {
        self.store.departments().await
    }
}
