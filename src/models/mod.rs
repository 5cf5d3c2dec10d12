pub mod budget;
pub mod citizen_report;
pub mod insight;
pub mod report;

pub use budget::{current_fiscal_year, BudgetFilter, BudgetRow, NewBudgetRow, WardFilter};
pub use citizen_report::{CitizenReport, NewCitizenReport};
pub use insight::{InsightHighlights, InsightReport};
pub use report::{BudgetReport, BudgetSummary, ChartSlice, ImportReport, TableRow};
