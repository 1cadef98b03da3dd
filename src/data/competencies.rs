//! Competency catalog queries.

use crate::data::models::Competency;
use anyhow::{Context, Result};
use sqlx::PgPool;

pub async fn get_competency(pool: &PgPool, competency_id: i32) -> Result<Option<Competency>> {
    sqlx::query_as::<_, Competency>(
        "SELECT id, name, slug, is_icfes FROM competencies WHERE id = $1",
    )
    .bind(competency_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch competency")
}

/// All competencies, ICFES ones first, then by name.
pub async fn list_competencies(pool: &PgPool) -> Result<Vec<Competency>> {
    sqlx::query_as::<_, Competency>(
        "SELECT id, name, slug, is_icfes FROM competencies ORDER BY is_icfes DESC, name",
    )
    .fetch_all(pool)
    .await
    .context("failed to list competencies")
}
