//! Report download and preview handlers.
//!
//! Every handler resolves whose report is requested, loads and renders the
//! HTML document, and then either returns it as-is (preview) or converts it
//! to PDF while holding one of the render slots.

use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use std::time::Instant;
use tracing::{info, warn};
use ts_rs::TS;

use crate::report::input::{CompetencyScoreInput, ResultInput, require_positive};
use crate::report::{self, ReportDocument};
use crate::state::AppState;
use crate::utils::fmt_duration;
use crate::web::auth::Caller;
use crate::web::error::ApiError;
use crate::web::extract::JsonBody;
use crate::web::routes::cache;

/// Previews carry inline styles and SVG, and may be framed by the app itself.
static PREVIEW_CSP: HeaderValue = HeaderValue::from_static(
    "default-src 'none'; style-src 'unsafe-inline'; img-src data:; frame-ancestors 'self'",
);

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompetencyReportRequest {
    pub competency_id: i32,
    #[serde(default)]
    pub student_id: Option<i32>,
    /// Pre-aggregated results that replace the stored ones.
    #[serde(default)]
    pub results: Option<Vec<ResultInput>>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProgressReportRequest {
    #[serde(default)]
    pub student_id: Option<i32>,
    #[serde(default)]
    pub course_id: Option<i32>,
    #[serde(default)]
    pub results: Option<Vec<ResultInput>>,
    /// Per-competency scores (0-100) that replace the estimated ones.
    #[serde(default)]
    pub competency_scores: Option<Vec<CompetencyScoreInput>>,
}

fn requested_student(caller: &Caller, student_id: Option<i32>) -> Result<i32, ApiError> {
    let requested = student_id
        .map(|id| require_positive("studentId", id))
        .transpose()?;
    caller.resolve_student(requested)
}

async fn competency_document(
    state: &AppState,
    caller: &Caller,
    body: CompetencyReportRequest,
) -> Result<ReportDocument, ApiError> {
    let competency_id = require_positive("competencyId", body.competency_id)?;
    let student_id = requested_student(caller, body.student_id)?;
    let document = report::competency_document(
        &state.db_pool,
        &state.report_clock(),
        student_id,
        competency_id,
        body.results,
    )
    .await?;
    Ok(document)
}

async fn progress_document(
    state: &AppState,
    caller: &Caller,
    body: ProgressReportRequest,
) -> Result<ReportDocument, ApiError> {
    let course_id = body
        .course_id
        .map(|id| require_positive("courseId", id))
        .transpose()?;
    let student_id = requested_student(caller, body.student_id)?;
    let document = report::progress_document(
        &state.db_pool,
        &state.report_clock(),
        student_id,
        course_id,
        body.results,
        body.competency_scores,
    )
    .await?;
    Ok(document)
}

/// `POST /api/reports/competency`
pub(super) async fn competency_pdf(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<CompetencyReportRequest>,
) -> Result<Response, ApiError> {
    let document = competency_document(&state, &caller, body).await?;
    pdf_response(&state, &caller, document).await
}

/// `POST /api/reports/competency/preview`
pub(super) async fn competency_preview(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<CompetencyReportRequest>,
) -> Result<Response, ApiError> {
    let document = competency_document(&state, &caller, body).await?;
    Ok(preview_response(document))
}

/// `POST /api/reports/progress`
pub(super) async fn progress_pdf(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<ProgressReportRequest>,
) -> Result<Response, ApiError> {
    let document = progress_document(&state, &caller, body).await?;
    pdf_response(&state, &caller, document).await
}

/// `POST /api/reports/progress/preview`
pub(super) async fn progress_preview(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<ProgressReportRequest>,
) -> Result<Response, ApiError> {
    let document = progress_document(&state, &caller, body).await?;
    Ok(preview_response(document))
}

fn preview_response(document: ReportDocument) -> Response {
    let mut response = Html(document.html).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache::NO_STORE));
    headers.insert(header::CONTENT_SECURITY_POLICY, PREVIEW_CSP.clone());
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    response
}

async fn pdf_response(
    state: &AppState,
    caller: &Caller,
    document: ReportDocument,
) -> Result<Response, ApiError> {
    let queued = Instant::now();
    let _slot = state.render_slots.acquire().await.map_err(|_| {
        warn!("Render slots closed");
        ApiError::internal_error("Report renderer is shutting down")
    })?;
    let waited = queued.elapsed();

    let start = Instant::now();
    let pdf = state.renderer.render(&document.html).await?;

    info!(
        student_id = document.student_id,
        requested_by = caller.user_id,
        kind = document.kind.slug(),
        bytes = pdf.len(),
        queued = fmt_duration(waited),
        duration = fmt_duration(start.elapsed()),
        "Report PDF rendered"
    );

    let file_name = document.file_name("pdf");
    let mut response = pdf.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache::NO_STORE));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// `attachment` disposition with both the plain and the RFC 5987 encoded name.
pub fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::auth::Role;
    use crate::web::error::ApiErrorCode;

    #[test]
    fn disposition_has_both_forms() {
        assert_eq!(
            content_disposition("reporte-progreso-ana-2026-10-16.pdf"),
            "attachment; filename=\"reporte-progreso-ana-2026-10-16.pdf\"; \
             filename*=UTF-8''reporte-progreso-ana-2026-10-16.pdf"
        );
        let value = content_disposition("año \"final\".pdf");
        assert!(value.contains("filename=\"a_o _final_.pdf\""), "{value}");
        assert!(value.contains("filename*=UTF-8''a%C3%B1o%20%22final%22.pdf"), "{value}");
    }

    #[test]
    fn student_id_must_be_positive() {
        let admin = Caller {
            user_id: 1,
            role: Role::Admin,
        };
        let err = requested_student(&admin, Some(0)).unwrap_err();
        assert_eq!(err.code, ApiErrorCode::BadRequest);
        assert_eq!(requested_student(&admin, Some(9)), Ok(9));
    }

    #[test]
    fn request_bodies_use_camel_case() {
        let body: ProgressReportRequest = serde_json::from_str(
            r#"{"studentId": 4, "courseId": 2, "competencyScores": [{"competencyId": 1, "score": 70.5}]}"#,
        )
        .unwrap();
        assert_eq!(body.student_id, Some(4));
        assert_eq!(body.course_id, Some(2));
        assert_eq!(body.competency_scores.unwrap()[0].score, 70.5);
        assert!(body.results.is_none());

        let body: CompetencyReportRequest =
            serde_json::from_str(r#"{"competencyId": 3}"#).unwrap();
        assert_eq!(body.competency_id, 3);
        assert!(body.student_id.is_none());
    }

    #[test]
    fn preview_headers() {
        let response = preview_response(ReportDocument {
            kind: report::ReportKind::Progress,
            student_id: 1,
            student_name: "Ana".into(),
            generated_on: chrono::NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            html: "<!DOCTYPE html><html></html>".into(),
        });
        let headers = response.headers();
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert_eq!(headers[header::CACHE_CONTROL], cache::NO_STORE);
        assert_eq!(headers[header::X_FRAME_OPTIONS], "SAMEORIGIN");
    }
}
