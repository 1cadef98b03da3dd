//! Unlocked achievements for a student.

use crate::data::models::UnlockedAchievement;
use anyhow::{Context, Result};
use sqlx::PgPool;

/// Achievements the student has unlocked, most recent first.
pub async fn unlocked_for_student(
    pool: &PgPool,
    student_id: i32,
) -> Result<Vec<UnlockedAchievement>> {
    sqlx::query_as::<_, UnlockedAchievement>(
        r#"
        SELECT a.name, a.description, a.icon, a.points, ua.unlocked_at
        FROM user_achievements ua
        JOIN achievements a ON a.id = ua.achievement_id
        WHERE ua.student_id = $1
        ORDER BY ua.unlocked_at DESC, a.name
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch unlocked achievements")
}
