//! Row types for the reporting read model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

/// A student together with the name of the school they belong to.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StudentProfile {
    pub id: i32,
    pub full_name: String,
    pub document_id: Option<String>,
    pub grade: Option<String>,
    pub school_id: Option<i32>,
    pub school_name: Option<String>,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Competency {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub is_icfes: bool,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Course {
    pub id: i32,
    pub title: String,
    pub competency_id: Option<i32>,
}

/// One exam result joined with its exam and competency.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ExamResultRow {
    pub exam_id: i32,
    pub exam_title: String,
    pub competency_id: i32,
    pub competency_name: String,
    pub competency_slug: String,
    pub is_icfes: bool,
    pub difficulty: String,
    pub is_simulacro: bool,
    pub score: i32,
    pub total_questions: i32,
    pub time_spent_seconds: Option<i32>,
    pub time_limit_minutes: Option<i32>,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

/// Average percentage on one exam across the student's school and the whole platform.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ExamBenchmark {
    pub exam_id: i32,
    pub school_avg: Option<f64>,
    pub platform_avg: Option<f64>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct CompetencyBenchmark {
    pub competency_id: i32,
    pub school_avg: Option<f64>,
    pub platform_avg: Option<f64>,
}

/// Per-student average percentage, the population for percentile ranks.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct StudentAverage {
    pub student_id: i32,
    pub school_id: Option<i32>,
    pub average: f64,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UnlockedAchievement {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub points: i32,
    pub unlocked_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct CourseProgressRow {
    pub course_id: i32,
    pub title: String,
    pub total_lessons: i64,
    pub completed_lessons: i64,
    pub total_modules: i64,
    pub completed_modules: i64,
}
