//! Pre-aggregated data a caller may send instead of letting the service load it.

use crate::data::models::Competency;
use crate::report::model::{Difficulty, ExamAttempt};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use ts_rs::TS;

/// Percentage at or above which a result without an explicit `passed` flag passes.
pub const PASSING_PERCENTAGE: f64 = 60.0;

/// Upper bound on caller-supplied rows per request.
pub const MAX_INPUT_ROWS: usize = 2000;

/// One exam result supplied in a request body.
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ResultInput {
    #[serde(default)]
    pub exam_id: Option<i32>,
    #[serde(default = "default_exam_title")]
    pub exam_title: String,
    /// Required on progress reports; defaults to the report's competency otherwise.
    #[serde(default)]
    pub competency_id: Option<i32>,
    pub score: i32,
    pub total_questions: i32,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub is_simulacro: bool,
    #[serde(default)]
    pub time_spent_seconds: Option<i32>,
    #[serde(default)]
    pub time_limit_minutes: Option<i32>,
    #[serde(default)]
    pub passed: Option<bool>,
    pub completed_at: DateTime<Utc>,
}

fn default_exam_title() -> String {
    "Examen".to_string()
}

/// A pre-computed competency score (0–100) that replaces the estimated one.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompetencyScoreInput {
    pub competency_id: i32,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("too many {field} entries (max {MAX_INPUT_ROWS})")]
    TooMany { field: &'static str },
    #[error("{field} must be a positive identifier")]
    InvalidId { field: String },
    #[error("results[{index}].totalQuestions must not be negative")]
    NegativeTotal { index: usize },
    #[error("results[{index}].score must be between 0 and totalQuestions")]
    ScoreOutOfRange { index: usize },
    #[error("results[{index}].{field} must not be negative")]
    NegativeDuration { index: usize, field: &'static str },
    #[error("results[{index}] belongs to competency {found}, not {expected}")]
    CompetencyMismatch {
        index: usize,
        expected: i32,
        found: i32,
    },
    #[error("results[{index}].competencyId is required")]
    MissingCompetency { index: usize },
    #[error("results[{index}] references unknown competency {competency_id}")]
    UnknownCompetency { index: usize, competency_id: i32 },
    #[error("competencyScores[{index}].score must be between 0 and 100")]
    CompetencyScoreOutOfRange { index: usize },
    #[error("competencyScores lists competency {competency_id} more than once")]
    DuplicateCompetencyScore { competency_id: i32 },
}

/// Reject an identifier that isn't strictly positive.
pub fn require_positive(field: &str, id: i32) -> Result<i32, InputError> {
    if id > 0 {
        Ok(id)
    } else {
        Err(InputError::InvalidId {
            field: field.to_string(),
        })
    }
}

pub fn validate_results(results: &[ResultInput]) -> Result<(), InputError> {
    if results.len() > MAX_INPUT_ROWS {
        return Err(InputError::TooMany { field: "results" });
    }
    for (index, r) in results.iter().enumerate() {
        if let Some(id) = r.exam_id {
            require_positive(&format!("results[{index}].examId"), id)?;
        }
        if let Some(id) = r.competency_id {
            require_positive(&format!("results[{index}].competencyId"), id)?;
        }
        if r.total_questions < 0 {
            return Err(InputError::NegativeTotal { index });
        }
        if r.score < 0 || r.score > r.total_questions {
            return Err(InputError::ScoreOutOfRange { index });
        }
        if r.time_spent_seconds.is_some_and(|s| s < 0) {
            return Err(InputError::NegativeDuration {
                index,
                field: "timeSpentSeconds",
            });
        }
        if r.time_limit_minutes.is_some_and(|m| m < 0) {
            return Err(InputError::NegativeDuration {
                index,
                field: "timeLimitMinutes",
            });
        }
    }
    Ok(())
}

pub fn validate_competency_scores(scores: &[CompetencyScoreInput]) -> Result<(), InputError> {
    if scores.len() > MAX_INPUT_ROWS {
        return Err(InputError::TooMany {
            field: "competencyScores",
        });
    }
    let mut seen = HashSet::with_capacity(scores.len());
    for (index, s) in scores.iter().enumerate() {
        require_positive(&format!("competencyScores[{index}].competencyId"), s.competency_id)?;
        if !s.score.is_finite() || !(0.0..=100.0).contains(&s.score) {
            return Err(InputError::CompetencyScoreOutOfRange { index });
        }
        if !seen.insert(s.competency_id) {
            return Err(InputError::DuplicateCompetencyScore {
                competency_id: s.competency_id,
            });
        }
    }
    Ok(())
}

impl ResultInput {
    /// Attach competency metadata; the caller has already validated the row.
    pub fn into_attempt(self, competency: &Competency) -> ExamAttempt {
        let passed = self.passed.unwrap_or_else(|| {
            self.total_questions > 0
                && f64::from(self.score) * 100.0 / f64::from(self.total_questions)
                    >= PASSING_PERCENTAGE
        });
        ExamAttempt {
            exam_id: self.exam_id.unwrap_or(0),
            exam_title: self.exam_title,
            competency_id: competency.id,
            competency_name: competency.name.clone(),
            competency_slug: competency.slug.clone(),
            is_icfes: competency.is_icfes,
            difficulty: self.difficulty.unwrap_or_default(),
            is_simulacro: self.is_simulacro,
            score: self.score,
            total_questions: self.total_questions,
            time_spent_seconds: self.time_spent_seconds,
            time_limit_minutes: self.time_limit_minutes,
            passed,
            completed_at: self.completed_at,
        }
    }
}

/// Convert rows for a single-competency report; rows naming another competency are rejected.
pub fn attempts_for_competency(
    results: Vec<ResultInput>,
    competency: &Competency,
) -> Result<Vec<ExamAttempt>, InputError> {
    results
        .into_iter()
        .enumerate()
        .map(|(index, r)| match r.competency_id {
            Some(found) if found != competency.id => Err(InputError::CompetencyMismatch {
                index,
                expected: competency.id,
                found,
            }),
            _ => Ok(r.into_attempt(competency)),
        })
        .collect()
}

/// Convert rows spanning several competencies, resolving each against `catalog`.
pub fn attempts_from_catalog(
    results: Vec<ResultInput>,
    catalog: &[Competency],
) -> Result<Vec<ExamAttempt>, InputError> {
    results
        .into_iter()
        .enumerate()
        .map(|(index, r)| {
            let competency_id = r
                .competency_id
                .ok_or(InputError::MissingCompetency { index })?;
            let competency = catalog
                .iter()
                .find(|c| c.id == competency_id)
                .ok_or(InputError::UnknownCompetency {
                    index,
                    competency_id,
                })?;
            Ok(r.into_attempt(competency))
        })
        .collect()
}
