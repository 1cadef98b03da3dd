//! Exam result queries and benchmark aggregates.
//!
//! Percentages are computed in SQL as `score * 100 / total_questions`, with
//! zero-question results counting as 0 so they never divide by zero.

use crate::data::models::{CompetencyBenchmark, ExamBenchmark, ExamResultRow, StudentAverage};
use anyhow::{Context, Result};
use sqlx::PgPool;

const PERCENTAGE_SQL: &str =
    "CASE WHEN r.total_questions > 0 THEN r.score::float8 * 100 / r.total_questions ELSE 0 END";

/// All results for a student, oldest first, optionally narrowed to a competency or course.
pub async fn results_for_student(
    pool: &PgPool,
    student_id: i32,
    competency_id: Option<i32>,
    course_id: Option<i32>,
) -> Result<Vec<ExamResultRow>> {
    sqlx::query_as::<_, ExamResultRow>(
        r#"
        SELECT
            e.id AS exam_id,
            e.title AS exam_title,
            c.id AS competency_id,
            c.name AS competency_name,
            c.slug AS competency_slug,
            c.is_icfes,
            e.difficulty,
            e.is_simulacro,
            r.score,
            r.total_questions,
            r.time_spent_seconds,
            e.time_limit_minutes,
            r.passed,
            r.completed_at
        FROM exam_results r
        JOIN exams e ON e.id = r.exam_id
        JOIN competencies c ON c.id = e.competency_id
        WHERE r.student_id = $1
          AND ($2::int IS NULL OR e.competency_id = $2)
          AND ($3::int IS NULL OR e.course_id = $3)
        ORDER BY r.completed_at ASC, r.id ASC
        "#,
    )
    .bind(student_id)
    .bind(competency_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch exam results for student")
}

/// Per-exam averages for the given exams, platform-wide and within one school.
pub async fn exam_benchmarks(
    pool: &PgPool,
    exam_ids: &[i32],
    school_id: Option<i32>,
) -> Result<Vec<ExamBenchmark>> {
    if exam_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, ExamBenchmark>(&format!(
        r#"
        SELECT
            r.exam_id,
            AVG({PERCENTAGE_SQL}) FILTER (WHERE $2::int IS NOT NULL AND s.school_id = $2) AS school_avg,
            AVG({PERCENTAGE_SQL}) AS platform_avg
        FROM exam_results r
        JOIN students s ON s.id = r.student_id
        WHERE r.exam_id = ANY($1)
        GROUP BY r.exam_id
        "#
    ))
    .bind(exam_ids)
    .bind(school_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch exam benchmarks")
}

/// Per-competency averages, platform-wide and within one school, optionally
/// limited to one course's exams.
pub async fn competency_benchmarks(
    pool: &PgPool,
    school_id: Option<i32>,
    course_id: Option<i32>,
) -> Result<Vec<CompetencyBenchmark>> {
    sqlx::query_as::<_, CompetencyBenchmark>(&format!(
        r#"
        SELECT
            e.competency_id,
            AVG({PERCENTAGE_SQL}) FILTER (WHERE $1::int IS NOT NULL AND s.school_id = $1) AS school_avg,
            AVG({PERCENTAGE_SQL}) AS platform_avg
        FROM exam_results r
        JOIN exams e ON e.id = r.exam_id
        JOIN students s ON s.id = r.student_id
        WHERE $2::int IS NULL OR e.course_id = $2
        GROUP BY e.competency_id
        "#
    ))
    .bind(school_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch competency benchmarks")
}

/// Average percentage of every student with at least one result, optionally
/// narrowed to the exams of one competency or one course.
pub async fn student_averages(
    pool: &PgPool,
    competency_id: Option<i32>,
    course_id: Option<i32>,
) -> Result<Vec<StudentAverage>> {
    sqlx::query_as::<_, StudentAverage>(&format!(
        r#"
        SELECT
            r.student_id,
            s.school_id,
            AVG({PERCENTAGE_SQL}) AS average
        FROM exam_results r
        JOIN exams e ON e.id = r.exam_id
        JOIN students s ON s.id = r.student_id
        WHERE ($1::int IS NULL OR e.competency_id = $1)
          AND ($2::int IS NULL OR e.course_id = $2)
        GROUP BY r.student_id, s.school_id
        "#
    ))
    .bind(competency_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch student averages")
}
