use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::time::Duration;

use crate::config::InsightsConfig;
use crate::error::{Error, Result};
use crate::models::BudgetRow;
use crate::service::aggregator;
use crate::service::insights::InsightGenerator;

const SYSTEM_PROMPT: &str = "You are a municipal budget analyst. Summarize spending patterns, \
point out anomalies or unusual spending, and suggest optimizations. Answer in plain text, one point per line.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Calls an OpenAI-compatible chat-completions endpoint.
pub struct HttpInsightGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpInsightGenerator {
    pub fn new(endpoint: impl Into<String>, config: &InsightsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

/// Plain-text digest of the rows handed to the model.
pub fn build_prompt(rows: &[BudgetRow], label: &str) -> String {
    let mut prompt = String::new();
    let total = aggregator::total_budget(rows);
    let _ = writeln!(prompt, "Department: {}", label);
    let _ = writeln!(prompt, "Total budget: {:.2}", total);
    let _ = writeln!(prompt, "Line items:");
    for row in rows {
        let ward = row
            .ward
            .map_or_else(|| "all wards".to_string(), |w| format!("ward {}", w));
        let _ = writeln!(
            prompt,
            "- {} ({}, {}): {:.2} ({})",
            row.category,
            ward,
            row.year,
            row.amount,
            aggregator::format_percent(row.amount, total)
        );
    }
    prompt
}

#[async_trait]
impl InsightGenerator for HttpInsightGenerator {
    async fn summarize(&self, rows: &[BudgetRow], label: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(rows, label),
                },
            ],
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!("insight provider returned {}", status)));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::Upstream("insight provider returned no text".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewBudgetRow;
    use uuid::Uuid;

    #[test]
    fn prompt_lists_each_row_with_its_share() {
        let rows = vec![
            NewBudgetRow::new("Snow removal", 750.0)
                .in_ward(4)
                .in_year(2024)
                .into_row(Uuid::nil()),
            NewBudgetRow::new("Salt", 250.0).in_year(2024).into_row(Uuid::nil()),
        ];
        let prompt = build_prompt(&rows, "Public Works");
        assert!(prompt.starts_with("Department: Public Works\n"));
        assert!(prompt.contains("Total budget: 1000.00"));
        assert!(prompt.contains("- Snow removal (ward 4, 2024): 750.00 (75.0%)"));
        assert!(prompt.contains("- Salt (all wards, 2024): 250.00 (25.0%)"));
    }

    #[test]
    fn provider_payload_shape() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"  Looks fine.\n"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.trim(), "Looks fine.");
    }
}
