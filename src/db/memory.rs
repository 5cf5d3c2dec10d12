use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;
use uuid::Uuid;

use super::BudgetStore;
use crate::error::Result;
use crate::models::{BudgetFilter, BudgetRow, CitizenReport, NewBudgetRow, NewCitizenReport};

/// Process-local store used when no database is configured, and by tests.
#[derive(Debug, Default)]
pub struct MemoryBudgetStore {
    rows: DashMap<Uuid, BudgetRow>,
    reports: DashMap<Uuid, CitizenReport>,
}

impl MemoryBudgetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn report_count(&self) -> usize {
        self.reports.len()
    }
}

#[async_trait]
impl BudgetStore for MemoryBudgetStore {
    async fn query(&self, filter: &BudgetFilter) -> Result<Vec<BudgetRow>> {
        let mut rows: Vec<BudgetRow> = self
            .rows
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        Ok(rows)
    }

    async fn insert(&self, rows: &[NewBudgetRow]) -> Result<usize> {
        for row in rows {
            let id = Uuid::new_v4();
            self.rows.insert(id, row.clone().into_row(id));
        }
        Ok(rows.len())
    }

    async fn departments(&self) -> Result<Vec<String>> {
        let departments: BTreeSet<String> = self
            .rows
            .iter()
            .map(|entry| entry.value().category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        Ok(departments.into_iter().collect())
    }

    async fn insert_report(&self, report: &NewCitizenReport) -> Result<CitizenReport> {
        let id = Uuid::new_v4();
        let stored = report.clone().into_report(id, chrono::Utc::now());
        self.reports.insert(id, stored.clone());
        Ok(stored)
    }
}
