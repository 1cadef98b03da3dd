//! Course catalog queries.

use crate::data::models::Course;
use anyhow::{Context, Result};
use sqlx::PgPool;

pub async fn get_course(pool: &PgPool, course_id: i32) -> Result<Option<Course>> {
    sqlx::query_as::<_, Course>("SELECT id, title, competency_id FROM courses WHERE id = $1")
        .bind(course_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch course")
}

/// Published courses, for report filter dropdowns.
pub async fn list_courses(pool: &PgPool) -> Result<Vec<Course>> {
    sqlx::query_as::<_, Course>(
        "SELECT id, title, competency_id FROM courses WHERE is_published ORDER BY title",
    )
    .fetch_all(pool)
    .await
    .context("failed to list courses")
}

/// Courses the student is enrolled in, published or not.
pub async fn enrolled_courses(pool: &PgPool, student_id: i32) -> Result<Vec<Course>> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT c.id, c.title, c.competency_id
        FROM enrollments e
        JOIN courses c ON c.id = e.course_id
        WHERE e.student_id = $1
        ORDER BY c.title
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .context("failed to list enrolled courses")
}
