//! Course completion state per enrolled course.

use crate::data::models::CourseProgressRow;
use anyhow::{Context, Result};
use sqlx::PgPool;

/// Lesson and module completion for each course the student is enrolled in.
///
/// A module counts as completed when every one of its lessons is completed;
/// modules without lessons never count as completed.
pub async fn course_progress(
    pool: &PgPool,
    student_id: i32,
    course_id: Option<i32>,
) -> Result<Vec<CourseProgressRow>> {
    sqlx::query_as::<_, CourseProgressRow>(
        r#"
        WITH lesson_state AS (
            SELECT
                m.course_id,
                m.id AS module_id,
                l.id AS lesson_id,
                COALESCE(lp.completed, FALSE) AS completed
            FROM enrollments e
            JOIN modules m ON m.course_id = e.course_id
            JOIN lessons l ON l.module_id = m.id
            LEFT JOIN lesson_progress lp ON lp.lesson_id = l.id AND lp.student_id = e.student_id
            WHERE e.student_id = $1
        ),
        module_state AS (
            SELECT course_id, module_id, BOOL_AND(completed) AS done
            FROM lesson_state
            GROUP BY course_id, module_id
        )
        SELECT
            c.id AS course_id,
            c.title,
            COUNT(ls.lesson_id) AS total_lessons,
            COUNT(ls.lesson_id) FILTER (WHERE ls.completed) AS completed_lessons,
            (SELECT COUNT(*) FROM modules m2 WHERE m2.course_id = c.id) AS total_modules,
            (SELECT COUNT(*) FROM module_state ms WHERE ms.course_id = c.id AND ms.done) AS completed_modules
        FROM enrollments e
        JOIN courses c ON c.id = e.course_id
        LEFT JOIN lesson_state ls ON ls.course_id = c.id
        WHERE e.student_id = $1
          AND ($2::int IS NULL OR c.id = $2)
        GROUP BY c.id, c.title
        ORDER BY c.title
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch course progress")
}
