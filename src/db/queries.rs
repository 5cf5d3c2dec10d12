use async_trait::async_trait;
use sqlx::PgPool;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::BudgetStore;
use crate::error::{Error, Result};
use crate::models::{BudgetFilter, BudgetRow, CitizenReport, NewBudgetRow, NewCitizenReport};

const INSERT_CHUNK: usize = 1000;
const INSERT_TIMEOUT: Duration = Duration::from_secs(30);

/// `BudgetStore` over the `municipal_budget` Postgres table.
#[derive(Clone)]
pub struct PgBudgetStore {
    pool: PgPool,
}

impl PgBudgetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_all(&self, rows: &[NewBudgetRow]) -> std::result::Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0u64;

        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut query_builder = sqlx::QueryBuilder::new(
                "INSERT INTO municipal_budget (id, category, amount, ward, year) ",
            );
            query_builder.push_values(chunk, |mut b, row| {
                b.push_bind(Uuid::new_v4())
                    .push_bind(&row.category)
                    .push_bind(row.amount)
                    .push_bind(row.ward)
                    .push_bind(row.year);
            });
            affected += query_builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(affected)
    }
}

#[async_trait]
impl BudgetStore for PgBudgetStore {
    async fn query(&self, filter: &BudgetFilter) -> Result<Vec<BudgetRow>> {
        let mut query_builder = sqlx::QueryBuilder::new(
            "SELECT id, category, amount, ward, year FROM municipal_budget WHERE category = ",
        );
        query_builder.push_bind(&filter.department);
        if let Some(ward) = filter.ward {
            query_builder.push(" AND ward = ").push_bind(ward);
        }
        if let Some(year) = filter.year {
            query_builder.push(" AND year = ").push_bind(year);
        }
        query_builder.push(" ORDER BY amount DESC");

        let rows = query_builder
            .build_query_as::<BudgetRow>()
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!("Fetched {} rows for {:?}", rows.len(), filter);
        Ok(rows)
    }

    async fn insert(&self, rows: &[NewBudgetRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        tracing::debug!("Inserting {} budget rows", rows.len());
        let start = Instant::now();

        match tokio::time::timeout(INSERT_TIMEOUT, self.insert_all(rows)).await {
            Ok(Ok(affected)) => {
                tracing::info!("INSERT committed, {} rows, took {:?}", affected, start.elapsed());
                Ok(affected as usize)
            }
            Ok(Err(e)) => {
                tracing::error!("INSERT failed after {:?}: {:?}", start.elapsed(), e);
                Err(e.into())
            }
            Err(_) => {
                tracing::error!("INSERT timed out (>{:?})", INSERT_TIMEOUT);
                Err(Error::Storage("insert timed out".to_string()))
            }
        }
    }

    async fn departments(&self) -> Result<Vec<String>> {
        let departments = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT category
            FROM municipal_budget
            WHERE category <> ''
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    async fn insert_report(&self, report: &NewCitizenReport) -> Result<CitizenReport> {
        let stored = sqlx::query_as::<_, CitizenReport>(
            r#"
            INSERT INTO citizen_reports (id, description, category, image_urls)
            VALUES ($1, $2, $3, $4)
            RETURNING id, description, category, image_urls, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&report.description)
        .bind(&report.category)
        .bind(&report.image_urls)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!("Stored citizen report {}", stored.id);
        Ok(stored)
    }
}
