pub mod aggregator;
pub mod csv_parser;
pub mod import;
pub mod insight_client;
pub mod insights;
pub mod query;
pub mod reports;

pub use csv_parser::{CsvParser, ParsedCsv};
pub use import::ImportService;
pub use insight_client::HttpInsightGenerator;
pub use insights::{InsightGenerator, InsightService, UnconfiguredInsightGenerator};
pub use query::{BudgetQuery, BudgetQueryService};
pub use reports::ReportService;
