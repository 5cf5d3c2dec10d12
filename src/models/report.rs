use serde::{Deserialize, Serialize};

use super::BudgetRow;

/// Derived statistics over one filtered row set. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub total_budget: f64,
    pub largest_category: Option<BudgetRow>,
    pub year_over_year_change: f64,
}

impl BudgetSummary {
    pub fn empty() -> Self {
        Self {
            total_budget: 0.0,
            largest_category: None,
            year_over_year_change: 0.0,
        }
    }
}

/// One slice of a proportion chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSlice {
    pub category: String,
    pub amount: f64,
}

/// A row as shown in the budget table, with its share of the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(flatten)]
    pub row: BudgetRow,
    pub percent_of_total: String,
}

/// Response of the budget query contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetReport {
    pub budget_data: Vec<BudgetRow>,
    pub summary: BudgetSummary,
    pub chart_data: Vec<ChartSlice>,
    pub table_rows: Vec<TableRow>,
}

/// Outcome of one CSV upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub records_imported: usize,
    pub records_rejected: usize,
}
