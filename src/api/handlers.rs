use crate::error::Error;
use crate::models::{BudgetRow, NewCitizenReport, WardFilter};
use crate::service::{
    BudgetQuery, BudgetQueryService, ImportService, InsightService, ReportService,
};
use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body: budget query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetQueryRequest {
    pub department: Option<String>,
    pub ward: Option<WardFilter>,
    pub year: Option<i32>,
}

/// Response body: CSV import
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub message: String,
    pub records_imported: usize,
    pub records_rejected: usize,
}

#[derive(Debug, Serialize)]
pub struct DepartmentsResponse {
    pub departments: Vec<String>,
}

/// Request body: AI insights
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub department: Option<String>,
    pub budget_data: Option<Vec<BudgetRow>>,
}

fn bad_json(rejection: JsonRejection) -> Response {
    Error::validation(format!("Invalid request body: {}", rejection.body_text())).into_response()
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// Budget rows and summary for one department
pub async fn query_budget(
    State(service): State<Arc<BudgetQueryService>>,
    payload: Result<Json<BudgetQueryRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_json(rejection),
    };

    let query = BudgetQuery {
        department: req.department.unwrap_or_default(),
        ward: req.ward.unwrap_or_default(),
        year: req.year,
    };
    match service.query(&query).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Distinct departments for the selector
pub async fn list_departments(State(service): State<Arc<BudgetQueryService>>) -> Response {
    match service.departments().await {
        Ok(departments) => {
            (StatusCode::OK, Json(DepartmentsResponse { departments })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// CSV upload (multipart field `file`)
pub async fn import_csv(
    State(service): State<Arc<ImportService>>,
    payload: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match payload {
        Ok(multipart) => multipart,
        Err(rejection) => {
            return Error::validation(format!("Invalid upload: {}", rejection.body_text()))
                .into_response()
        }
    };
    let mut file_content: Option<Vec<u8>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Error::validation(format!("Failed to read multipart field: {}", e))
                    .into_response()
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        match field.bytes().await {
            Ok(bytes) => file_content = Some(bytes.to_vec()),
            Err(e) => {
                return Error::validation(format!("Failed to read file content: {}", e))
                    .into_response()
            }
        }
    }

    let Some(bytes) = file_content else {
        return Error::validation("No CSV file provided").into_response();
    };
    let content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return Error::validation("CSV file must be UTF-8 text").into_response(),
    };

    match service.import_csv(&content).await {
        Ok(report) => {
            let response = ImportResponse {
                message: format!(
                    "Successfully imported {} budget records",
                    report.records_imported
                ),
                records_imported: report.records_imported,
                records_rejected: report.records_rejected,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Free-text analysis of a department's rows
pub async fn generate_insights(
    State(service): State<Arc<InsightService>>,
    payload: Result<Json<InsightRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_json(rejection),
    };

    let department = req.department.unwrap_or_default();
    match service.generate(&department, req.budget_data).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Anonymous citizen report
pub async fn submit_report(
    State(service): State<Arc<ReportService>>,
    payload: Result<Json<NewCitizenReport>, JsonRejection>,
) -> Response {
    let Json(report) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_json(rejection),
    };

    match service.submit(report).await {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(e) => e.into_response(),
    }
}
