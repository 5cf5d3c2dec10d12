use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A resident's report about a local issue (table `citizen_reports`).
///
/// Submissions are anonymous. `image_urls` point at an external object store
/// and are kept as given.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenReport {
    pub id: Uuid,
    pub description: String,
    pub category: String,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Report body as submitted, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCitizenReport {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl NewCitizenReport {
    pub fn new(description: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category: category.into(),
            image_urls: Vec::new(),
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_urls.push(url.into());
        self
    }

    pub fn into_report(self, id: Uuid, created_at: DateTime<Utc>) -> CitizenReport {
        CitizenReport {
            id,
            description: self.description,
            category: self.category,
            image_urls: self.image_urls,
            created_at,
        }
    }
}
