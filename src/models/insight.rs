use serde::{Deserialize, Serialize};

/// Lines pulled out of a free-text insight for quick display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightHighlights {
    pub summary: Vec<String>,
    pub anomalies: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub insights: String,
    pub highlights: InsightHighlights,
}
