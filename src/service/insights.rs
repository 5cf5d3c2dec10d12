use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{BudgetRow, InsightHighlights, InsightReport};
use crate::service::aggregator;
use crate::service::query::{BudgetQuery, BudgetQueryService};

const SUMMARY_LINES: usize = 3;
const ANOMALY_MARKERS: [&str; 3] = ["anomal", "unusual", "overspend"];
const SUGGESTION_MARKERS: [&str; 3] = ["suggest", "recommend", "optim"];

/// Opaque text generator: budget rows plus a label in, free text out.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn summarize(&self, rows: &[BudgetRow], label: &str) -> Result<String>;
}

/// Stand-in used when no insight provider is configured.
pub struct UnconfiguredInsightGenerator;

#[async_trait]
impl InsightGenerator for UnconfiguredInsightGenerator {
    async fn summarize(&self, _rows: &[BudgetRow], _label: &str) -> Result<String> {
        Err(Error::Upstream("no insight provider configured".to_string()))
    }
}

/// Splits generated text into the lines worth surfacing on their own.
pub fn extract_highlights(text: &str) -> InsightHighlights {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let mentioning = |markers: &[&str]| -> Vec<String> {
        lines
            .iter()
            .filter(|l| {
                let lower = l.to_lowercase();
                markers.iter().any(|m| lower.contains(m))
            })
            .map(|l| l.to_string())
            .collect()
    };

    InsightHighlights {
        summary: lines.iter().take(SUMMARY_LINES).map(|l| l.to_string()).collect(),
        anomalies: mentioning(&ANOMALY_MARKERS),
        suggestions: mentioning(&SUGGESTION_MARKERS),
    }
}

pub struct InsightService {
    generator: Arc<dyn InsightGenerator>,
    query: Arc<BudgetQueryService>,
}

impl InsightService {
    pub fn new(generator: Arc<dyn InsightGenerator>, query: Arc<BudgetQueryService>) -> Self {
        Self { generator, query }
    }

    /// Runs the generator over `rows`, or over the department's stored rows when
    /// the caller sends none.
    pub async fn generate(
        &self,
        department: &str,
        rows: Option<Vec<BudgetRow>>,
    ) -> Result<InsightReport> {
        let department = department.trim();
        if department.is_empty() {
            return Err(Error::validation("Department is required"));
        }

        let rows = match rows {
            Some(rows) => aggregator::filter_and_sort(&rows),
            None => {
                self.query
                    .query(&BudgetQuery::department(department))
                    .await?
                    .budget_data
            }
        };
        if rows.is_empty() {
            return Err(Error::validation(
                "No budget data to analyze. Please fetch budget data first.",
            ));
        }

        tracing::info!("Requesting insights for {} ({} rows)", department, rows.len());
        let insights = self.generator.summarize(&rows, department).await?;
        Ok(InsightReport {
            highlights: extract_highlights(&insights),
            insights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{BudgetStore, MemoryBudgetStore};
    use crate::models::NewBudgetRow;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingGenerator {
        seen: Mutex<Vec<(usize, String)>>,
    }

    #[async_trait]
    impl InsightGenerator for RecordingGenerator {
        async fn summarize(&self, rows: &[BudgetRow], label: &str) -> Result<String> {
            self.seen.lock().unwrap().push((rows.len(), label.to_string()));
            Ok("Spending is concentrated.\nUnusual spike in overtime.\n\nWe recommend a review.".to_string())
        }
    }

    fn query_service(store: Arc<MemoryBudgetStore>) -> Arc<BudgetQueryService> {
        Arc::new(BudgetQueryService::new(store))
    }

    #[test]
    fn highlights_pick_marked_lines() {
        let text = "Line one\n\n  Line two  \nAn ANOMALY in fleet costs\nConsider optimizing routes\nUnusual overspend; we suggest caps\n";
        let h = extract_highlights(text);
        assert_eq!(h.summary, vec!["Line one", "Line two", "An ANOMALY in fleet costs"]);
        assert_eq!(
            h.anomalies,
            vec!["An ANOMALY in fleet costs", "Unusual overspend; we suggest caps"]
        );
        assert_eq!(
            h.suggestions,
            vec!["Consider optimizing routes", "Unusual overspend; we suggest caps"]
        );
        assert_eq!(extract_highlights(""), InsightHighlights::default());
    }

    #[tokio::test]
    async fn supplied_rows_are_filtered_before_generation() {
        let generator = Arc::new(RecordingGenerator::default());
        let service = InsightService::new(
            generator.clone(),
            query_service(Arc::new(MemoryBudgetStore::new())),
        );
        let rows = vec![
            NewBudgetRow::new("Parks", 10.0).into_row(Uuid::new_v4()),
            NewBudgetRow::new("Parks", -1.0).into_row(Uuid::new_v4()),
        ];

        let report = service.generate("Parks", Some(rows)).await.unwrap();
        assert_eq!(report.highlights.anomalies, vec!["Unusual spike in overtime."]);
        assert_eq!(report.highlights.suggestions, vec!["We recommend a review."]);
        assert_eq!(generator.seen.lock().unwrap()[0], (1, "Parks".to_string()));
    }

    #[tokio::test]
    async fn missing_rows_are_fetched_for_the_department() {
        let store = Arc::new(MemoryBudgetStore::new());
        store
            .insert(&[NewBudgetRow::new("Fire", 5.0), NewBudgetRow::new("Fire", 6.0)])
            .await
            .unwrap();
        let generator = Arc::new(RecordingGenerator::default());
        let service = InsightService::new(generator.clone(), query_service(store));

        service.generate("Fire", None).await.unwrap();
        assert_eq!(generator.seen.lock().unwrap()[0].0, 2);
    }

    #[tokio::test]
    async fn nothing_to_analyze_is_a_client_error() {
        let service = InsightService::new(
            Arc::new(RecordingGenerator::default()),
            query_service(Arc::new(MemoryBudgetStore::new())),
        );
        let err = service.generate("Fire", Some(vec![])).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = service.generate("", None).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_upstream() {
        let service = InsightService::new(
            Arc::new(UnconfiguredInsightGenerator),
            query_service(Arc::new(MemoryBudgetStore::new())),
        );
        let rows = vec![NewBudgetRow::new("Parks", 10.0).into_row(Uuid::new_v4())];
        let err = service.generate("Parks", Some(rows)).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
