//! Competency and course options for the report request form.

use axum::extract::State;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::data;
use crate::data::models::{Competency, Course};
use crate::state::AppState;
use crate::web::auth::{Caller, Role};
use crate::web::error::{ApiError, db_error};
use crate::web::filter_cache::FilterScope;
use crate::web::routes::{cache, with_cache_control};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompetencyOption {
    pub id: i32,
    pub name: String,
    pub is_icfes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CourseOption {
    pub id: i32,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FiltersResponse {
    pub competencies: Vec<CompetencyOption>,
    pub courses: Vec<CourseOption>,
}

impl From<Competency> for CompetencyOption {
    fn from(c: Competency) -> Self {
        Self {
            id: c.id,
            name: c.name,
            is_icfes: c.is_icfes,
        }
    }
}

impl From<Course> for CourseOption {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            title: c.title,
        }
    }
}

/// `GET /api/reports/filters`
///
/// Staff get the published catalog; students get only their own courses.
pub(super) async fn get_filters(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Response, ApiError> {
    let scope = match caller.role {
        Role::Student => FilterScope::Student(caller.user_id),
        Role::Teacher | Role::Admin => FilterScope::Catalog,
    };

    let pool = &state.db_pool;
    let filters = state
        .filter_cache
        .get_or_build(scope, || async move {
            let (competencies, courses) = match scope {
                FilterScope::Catalog => tokio::try_join!(
                    data::competencies::list_competencies(pool),
                    data::courses::list_courses(pool),
                )?,
                FilterScope::Student(id) => tokio::try_join!(
                    data::competencies::list_competencies(pool),
                    data::courses::enrolled_courses(pool, id),
                )?,
            };
            debug!(
                ?scope,
                competencies = competencies.len(),
                courses = courses.len(),
                "Built report filters"
            );
            Ok(FiltersResponse {
                competencies: competencies.into_iter().map(Into::into).collect(),
                courses: courses.into_iter().map(Into::into).collect(),
            })
        })
        .await
        .map_err(|e| db_error("Report filters", e))?;

    Ok(with_cache_control((*filters).clone(), cache::FILTERS))
}
