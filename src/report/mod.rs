//! Progress-report generation: scoring, narrative, charts, HTML and PDF.

pub mod charts;
pub mod icfes;
pub mod input;
pub mod model;
pub mod narrative;
pub mod pdf;
pub mod percentile;
pub mod pipeline;
pub mod stats;
pub mod template;

use chrono::NaiveDate;
use sqlx::PgPool;
use std::time::Instant;
use tracing::debug;

use crate::report::input::{CompetencyScoreInput, ResultInput};
use crate::report::model::ReportClock;
use crate::report::pipeline::LoadError;
use crate::utils::{fmt_duration, slugify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Competency,
    Progress,
}

impl ReportKind {
    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::Competency => "competencia",
            ReportKind::Progress => "progreso",
        }
    }
}

/// `reporte-<kind>-<student-slug>-<yyyy-mm-dd>.<extension>`, always ASCII.
pub fn file_name(kind: ReportKind, student_name: &str, date: NaiveDate, extension: &str) -> String {
    let student = match slugify(student_name) {
        s if s.is_empty() => "estudiante".to_string(),
        s => s,
    };
    format!(
        "reporte-{}-{student}-{}.{extension}",
        kind.slug(),
        date.format("%Y-%m-%d")
    )
}

/// A report rendered to HTML, ready to be previewed or converted to PDF.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub kind: ReportKind,
    pub student_id: i32,
    pub student_name: String,
    pub generated_on: NaiveDate,
    pub html: String,
}

impl ReportDocument {
    pub fn file_name(&self, extension: &str) -> String {
        file_name(self.kind, &self.student_name, self.generated_on, extension)
    }
}

/// Load, build and render the single-competency report.
pub async fn competency_document(
    pool: &PgPool,
    clock: &ReportClock,
    student_id: i32,
    competency_id: i32,
    results: Option<Vec<ResultInput>>,
) -> Result<ReportDocument, LoadError> {
    let inputs = pipeline::load_competency_inputs(pool, student_id, competency_id, results).await?;
    let start = Instant::now();
    let report = pipeline::build_competency_report(inputs, clock);
    let html = template::render_competency_report(&report);
    debug!(
        student_id,
        competency_id,
        attempts = report.attempts.len(),
        html_bytes = html.len(),
        duration = fmt_duration(start.elapsed()),
        "Competency report rendered to HTML"
    );
    Ok(ReportDocument {
        kind: ReportKind::Competency,
        student_id,
        student_name: report.student.full_name,
        generated_on: report.generated_on,
        html,
    })
}

/// Load, build and render the overall progress report.
pub async fn progress_document(
    pool: &PgPool,
    clock: &ReportClock,
    student_id: i32,
    course_id: Option<i32>,
    results: Option<Vec<ResultInput>>,
    competency_scores: Option<Vec<CompetencyScoreInput>>,
) -> Result<ReportDocument, LoadError> {
    let inputs =
        pipeline::load_progress_inputs(pool, student_id, course_id, results, competency_scores)
            .await?;
    let start = Instant::now();
    let report = pipeline::build_progress_report(inputs, clock);
    let html = template::render_progress_report(&report);
    debug!(
        student_id,
        course_id,
        global = report.icfes.global,
        competencies = report.competencies.len(),
        html_bytes = html.len(),
        duration = fmt_duration(start.elapsed()),
        "Progress report rendered to HTML"
    );
    Ok(ReportDocument {
        kind: ReportKind::Progress,
        student_id,
        student_name: report.student.full_name,
        generated_on: report.generated_on,
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_ascii_slugs() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(
            file_name(ReportKind::Progress, "María José Peña", date, "pdf"),
            "reporte-progreso-maria-jose-pena-2026-10-16.pdf"
        );
        assert_eq!(
            file_name(ReportKind::Competency, "¿?", date, "html"),
            "reporte-competencia-estudiante-2026-10-16.html"
        );
    }
}
