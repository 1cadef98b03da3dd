//! Domain inputs shared by the aggregation, narrative and chart stages.

use crate::data::models::{CourseProgressRow, ExamResultRow};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

/// Exam difficulty as stored on the `exams` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Difficulty {
    Basic,
    #[default]
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" | "basico" | "easy" => Some(Difficulty::Basic),
            "intermediate" | "intermedio" | "medium" => Some(Difficulty::Intermediate),
            "advanced" | "avanzado" | "hard" => Some(Difficulty::Advanced),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Basic => "basic",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// Display label used in the report tables.
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Basic => "Básico",
            Difficulty::Intermediate => "Intermedio",
            Difficulty::Advanced => "Avanzado",
        }
    }
}

/// A single completed exam, the unit every statistic is computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamAttempt {
    pub exam_id: i32,
    pub exam_title: String,
    pub competency_id: i32,
    pub competency_name: String,
    pub competency_slug: String,
    pub is_icfes: bool,
    pub difficulty: Difficulty,
    pub is_simulacro: bool,
    /// Correct answers.
    pub score: i32,
    pub total_questions: i32,
    pub time_spent_seconds: Option<i32>,
    pub time_limit_minutes: Option<i32>,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

impl ExamAttempt {
    /// Percentage of correct answers; zero-question exams score 0.
    pub fn percentage(&self) -> f64 {
        if self.total_questions <= 0 {
            return 0.0;
        }
        (self.score as f64 * 100.0 / self.total_questions as f64).clamp(0.0, 100.0)
    }
}

impl From<ExamResultRow> for ExamAttempt {
    fn from(row: ExamResultRow) -> Self {
        let difficulty = Difficulty::parse(&row.difficulty).unwrap_or_else(|| {
            warn!(
                exam_id = row.exam_id,
                difficulty = %row.difficulty,
                "Unknown exam difficulty, treating as intermediate"
            );
            Difficulty::Intermediate
        });
        ExamAttempt {
            exam_id: row.exam_id,
            exam_title: row.exam_title,
            competency_id: row.competency_id,
            competency_name: row.competency_name,
            competency_slug: row.competency_slug,
            is_icfes: row.is_icfes,
            difficulty,
            is_simulacro: row.is_simulacro,
            score: row.score,
            total_questions: row.total_questions,
            time_spent_seconds: row.time_spent_seconds,
            time_limit_minutes: row.time_limit_minutes,
            passed: row.passed,
            completed_at: row.completed_at,
        }
    }
}

/// Completion state of one enrolled course.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseProgress {
    pub course_id: i32,
    pub title: String,
    pub completed_lessons: i64,
    pub total_lessons: i64,
    pub completed_modules: i64,
    pub total_modules: i64,
}

impl CourseProgress {
    /// Lesson completion as a percentage; courses without lessons are 0%.
    pub fn percent(&self) -> f64 {
        if self.total_lessons <= 0 {
            return 0.0;
        }
        (self.completed_lessons as f64 * 100.0 / self.total_lessons as f64).clamp(0.0, 100.0)
    }
}

impl From<CourseProgressRow> for CourseProgress {
    fn from(row: CourseProgressRow) -> Self {
        CourseProgress {
            course_id: row.course_id,
            title: row.title,
            completed_lessons: row.completed_lessons,
            total_lessons: row.total_lessons,
            completed_modules: row.completed_modules,
            total_modules: row.total_modules,
        }
    }
}

/// The instant a report is generated, and the timezone its dates are shown in.
#[derive(Debug, Clone, Copy)]
pub struct ReportClock {
    pub now: DateTime<Utc>,
    pub tz: Tz,
}

impl ReportClock {
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        Self { now, tz }
    }

    pub fn system(tz: Tz) -> Self {
        Self::new(Utc::now(), tz)
    }

    pub fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.tz).date_naive()
    }

    /// Whole local calendar days between `ts` and now; future timestamps count as today.
    pub fn days_since(&self, ts: DateTime<Utc>) -> i64 {
        let then = ts.with_timezone(&self.tz).date_naive();
        (self.today() - then).num_days().max(0)
    }

    /// `dd/mm/yyyy` in the report timezone.
    pub fn format_date(&self, ts: DateTime<Utc>) -> String {
        ts.with_timezone(&self.tz).format("%d/%m/%Y").to_string()
    }

    pub fn format_now(&self) -> String {
        self.now
            .with_timezone(&self.tz)
            .format("%d/%m/%Y %H:%M")
            .to_string()
    }
}
