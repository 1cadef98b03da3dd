//! Student lookups.

use crate::data::models::StudentProfile;
use anyhow::{Context, Result};
use sqlx::PgPool;

/// Fetch a student and their school name, or `None` if the id is unknown.
pub async fn get_student(pool: &PgPool, student_id: i32) -> Result<Option<StudentProfile>> {
    sqlx::query_as::<_, StudentProfile>(
        r#"
        SELECT s.id, s.full_name, s.document_id, s.grade, s.school_id, sc.name AS school_name
        FROM students s
        LEFT JOIN schools sc ON sc.id = s.school_id
        WHERE s.id = $1
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch student")
}
