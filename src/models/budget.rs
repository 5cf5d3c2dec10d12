use chrono::Datelike;
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fiscal year assumed when a dataset does not track one.
pub fn current_fiscal_year() -> i32 {
    chrono::Local::now().year()
}

/// One persisted line item of municipal spending (table `municipal_budget`).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRow {
    #[serde(default)]
    pub id: Uuid,
    pub category: String,
    pub amount: f64,
    /// `None` means the line applies to all wards.
    #[serde(default)]
    pub ward: Option<i32>,
    #[serde(default = "current_fiscal_year")]
    pub year: i32,
}

/// A parsed row that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudgetRow {
    pub category: String,
    pub amount: f64,
    pub ward: Option<i32>,
    pub year: i32,
}

impl NewBudgetRow {
    /// City-wide row for the current fiscal year.
    pub fn new(category: impl Into<String>, amount: f64) -> Self {
        Self {
            category: category.into(),
            amount,
            ward: None,
            year: current_fiscal_year(),
        }
    }

    pub fn in_ward(mut self, ward: i32) -> Self {
        self.ward = Some(ward);
        self
    }

    pub fn in_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn into_row(self, id: Uuid) -> BudgetRow {
        BudgetRow {
            id,
            category: self.category,
            amount: self.amount,
            ward: self.ward,
            year: self.year,
        }
    }
}

/// Ward selector on the query contract: a ward number or the `"all"` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WardFilter {
    #[default]
    All,
    Ward(i32),
}

impl WardFilter {
    pub fn as_option(self) -> Option<i32> {
        match self {
            WardFilter::All => None,
            WardFilter::Ward(w) => Some(w),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawWard {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for WardFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawWard::deserialize(deserializer)?;
        let number = match raw {
            RawWard::Number(n) => n,
            RawWard::Text(s) => {
                let s = s.trim();
                if s.is_empty() || s.eq_ignore_ascii_case("all") {
                    return Ok(WardFilter::All);
                }
                s.parse::<i64>()
                    .map_err(|_| de::Error::custom(format!("invalid ward '{}'", s)))?
            }
        };
        i32::try_from(number)
            .map(WardFilter::Ward)
            .map_err(|_| de::Error::custom(format!("ward {} out of range", number)))
    }
}

/// Equality filter handed to the store. `department` matches the row category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetFilter {
    pub department: String,
    pub ward: Option<i32>,
    pub year: Option<i32>,
}

impl BudgetFilter {
    pub fn department(department: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            ward: None,
            year: None,
        }
    }

    pub fn with_ward(mut self, ward: WardFilter) -> Self {
        self.ward = ward.as_option();
        self
    }

    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    pub fn matches(&self, row: &BudgetRow) -> bool {
        row.category == self.department
            && self.ward.map_or(true, |w| row.ward == Some(w))
            && self.year.map_or(true, |y| row.year == y)
    }
}
