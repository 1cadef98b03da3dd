//! Report assembly.
//!
//! Loaders gather everything a report needs from the database (or from
//! caller-supplied rows); builders are pure functions from those inputs and a
//! [`ReportClock`] to the view models the templates render.

use std::collections::HashMap;
use std::time::Instant;

use chrono::NaiveDate;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};

use crate::data::models::{
    Competency, CompetencyBenchmark, Course, ExamBenchmark, StudentAverage, StudentProfile,
    UnlockedAchievement,
};
use crate::data::{achievements, competencies, courses, exam_results, progress, students};
use crate::report::charts::{
    self, ControlPoint, PLATFORM_COLOR, RadarSeries, ReferenceLines, SCHOOL_COLOR, STUDENT_COLOR,
};
use crate::report::icfes::{
    self, CompetencyEstimate, CompetencyLevel, IcfesEstimate, competency_weight,
};
use crate::report::input::{
    self, CompetencyScoreInput, InputError, ResultInput, attempts_for_competency,
    attempts_from_catalog,
};
use crate::report::model::{CourseProgress, Difficulty, ExamAttempt, ReportClock};
use crate::report::narrative::{self, Narrative, NarrativeInput};
use crate::report::percentile::{self, PercentileRanks};
use crate::report::stats::{self, ExamSummary};
use crate::utils::log_if_slow;

/// Rows shown in the progress report's "recent exams" table.
const RECENT_ATTEMPTS: usize = 10;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i32 },
    #[error(transparent)]
    Invalid(#[from] InputError),
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// One row of an attempts table.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRow {
    pub title: String,
    pub competency: String,
    pub date: String,
    pub difficulty: Difficulty,
    pub is_simulacro: bool,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub passed: bool,
    pub time_spent: Option<String>,
    pub school_average: Option<f64>,
    pub platform_average: Option<f64>,
}

/// A competency line in the progress report, with its reference averages.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetencyRow {
    pub estimate: CompetencyEstimate,
    pub school_average: Option<f64>,
    pub platform_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AchievementRow {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub points: i32,
    pub unlocked_on: String,
}

#[derive(Debug, Clone)]
pub struct CompetencyReport {
    pub student: StudentProfile,
    pub competency: Competency,
    pub generated_at: String,
    pub generated_on: NaiveDate,
    pub summary: ExamSummary,
    pub estimate: Option<CompetencyEstimate>,
    pub percentiles: PercentileRanks,
    pub school_average: Option<f64>,
    pub platform_average: Option<f64>,
    pub attempts: Vec<AttemptRow>,
    pub control_chart: String,
    pub narrative: Narrative,
}

#[derive(Debug, Clone)]
pub struct ProgressReport {
    pub student: StudentProfile,
    pub course: Option<Course>,
    pub generated_at: String,
    pub generated_on: NaiveDate,
    pub summary: ExamSummary,
    pub icfes: IcfesEstimate,
    pub competencies: Vec<CompetencyRow>,
    pub percentiles: PercentileRanks,
    pub school_average: Option<f64>,
    pub platform_average: Option<f64>,
    pub radar_chart: String,
    pub control_chart: String,
    pub recent_attempts: Vec<AttemptRow>,
    pub achievements: Vec<AchievementRow>,
    pub total_points: i64,
    pub courses: Vec<CourseProgress>,
    pub narrative: Narrative,
}

/// Everything the competency report is built from.
#[derive(Debug, Clone)]
pub struct CompetencyInputs {
    pub student: StudentProfile,
    pub competency: Competency,
    /// Any order; sorted oldest first by the builder.
    pub attempts: Vec<ExamAttempt>,
    pub exam_benchmarks: Vec<ExamBenchmark>,
    pub benchmark: Option<CompetencyBenchmark>,
    pub population: Vec<StudentAverage>,
}

#[derive(Debug, Clone)]
pub struct ProgressInputs {
    pub student: StudentProfile,
    pub course: Option<Course>,
    pub attempts: Vec<ExamAttempt>,
    pub catalog: Vec<Competency>,
    pub score_overrides: Vec<CompetencyScoreInput>,
    pub benchmarks: Vec<CompetencyBenchmark>,
    pub population: Vec<StudentAverage>,
    pub achievements: Vec<UnlockedAchievement>,
    pub courses: Vec<CourseProgress>,
}

/// "1 h 05 min", "12 min", "45 s".
pub fn format_time_spent(seconds: i32) -> String {
    let seconds = seconds.max(0);
    match seconds {
        s if s < 60 => format!("{s} s"),
        s if s < 3600 => format!("{} min", s / 60),
        s => format!("{} h {:02} min", s / 3600, (s % 3600) / 60),
    }
}

/// Stable, so same-instant attempts keep the query's result-id order.
fn sort_oldest_first(attempts: &mut [ExamAttempt]) {
    attempts.sort_by_key(|a| a.completed_at);
}

fn attempt_row(
    attempt: &ExamAttempt,
    clock: &ReportClock,
    exam_benchmarks: &HashMap<i32, &ExamBenchmark>,
) -> AttemptRow {
    let benchmark = exam_benchmarks.get(&attempt.exam_id);
    AttemptRow {
        title: attempt.exam_title.clone(),
        competency: attempt.competency_name.clone(),
        date: clock.format_date(attempt.completed_at),
        difficulty: attempt.difficulty,
        is_simulacro: attempt.is_simulacro,
        score: attempt.score,
        total_questions: attempt.total_questions,
        percentage: attempt.percentage(),
        passed: attempt.passed,
        time_spent: attempt.time_spent_seconds.map(format_time_spent),
        school_average: benchmark.and_then(|b| b.school_avg),
        platform_average: benchmark.and_then(|b| b.platform_avg),
    }
}

fn control_chart(
    attempts: &[ExamAttempt],
    summary: &ExamSummary,
    school_average: Option<f64>,
    platform_average: Option<f64>,
) -> String {
    let points: Vec<ControlPoint> = attempts
        .iter()
        .map(|a| ControlPoint {
            label: a.exam_title.clone(),
            value: a.percentage(),
            passed: a.passed,
        })
        .collect();
    charts::control_chart(
        &points,
        &ReferenceLines {
            student_average: summary.average,
            school_average,
            platform_average,
            limits: summary.control_limits(),
        },
    )
}

fn ranks(
    summary: &ExamSummary,
    student: &StudentProfile,
    population: &[StudentAverage],
) -> PercentileRanks {
    if !summary.has_data() {
        return PercentileRanks::default();
    }
    percentile::rank_student(summary.average, student.id, student.school_id, population)
}

/// Mean of stored averages across the platform and within the student's school.
fn population_means(
    student: &StudentProfile,
    population: &[StudentAverage],
) -> (Option<f64>, Option<f64>) {
    let platform: Vec<f64> = population.iter().map(|row| row.average).collect();
    let school: Vec<f64> = student
        .school_id
        .map(|school| {
            population
                .iter()
                .filter(|row| row.school_id == Some(school))
                .map(|row| row.average)
                .collect()
        })
        .unwrap_or_default();
    let mean_or_none = |values: &[f64]| (!values.is_empty()).then(|| stats::mean(values));
    (mean_or_none(&school), mean_or_none(&platform))
}

pub fn build_competency_report(inputs: CompetencyInputs, clock: &ReportClock) -> CompetencyReport {
    let CompetencyInputs {
        student,
        competency,
        mut attempts,
        exam_benchmarks,
        benchmark,
        population,
    } = inputs;
    sort_oldest_first(&mut attempts);

    let summary = stats::summarize(&attempts);
    let estimate = icfes::estimate(&attempts, clock)
        .competencies
        .into_iter()
        .find(|c| c.competency_id == competency.id);
    let percentiles = ranks(&summary, &student, &population);
    let school_average = benchmark.as_ref().and_then(|b| b.school_avg);
    let platform_average = benchmark.as_ref().and_then(|b| b.platform_avg);

    let by_exam: HashMap<i32, &ExamBenchmark> =
        exam_benchmarks.iter().map(|b| (b.exam_id, b)).collect();
    let rows = attempts
        .iter()
        .map(|a| attempt_row(a, clock, &by_exam))
        .collect();

    let chart = control_chart(&attempts, &summary, school_average, platform_average);
    let narrative = narrative::generate(&NarrativeInput {
        summary: &summary,
        percentile: percentiles.platform,
        school_average,
        platform_average,
        competencies: estimate.as_slice(),
        courses: &[],
    });

    CompetencyReport {
        student,
        competency,
        generated_at: clock.format_now(),
        generated_on: clock.today(),
        summary,
        estimate,
        percentiles,
        school_average,
        platform_average,
        attempts: rows,
        control_chart: chart,
        narrative,
    }
}

/// Replace estimated competency scores with caller-supplied ones and recompute the global score.
///
/// Overrides for competencies without attempts add a row with zero attempts.
pub fn apply_score_overrides(
    estimate: IcfesEstimate,
    overrides: &[CompetencyScoreInput],
    catalog: &[Competency],
) -> IcfesEstimate {
    if overrides.is_empty() {
        return estimate;
    }
    let mut competencies = estimate.competencies;
    for o in overrides {
        if let Some(existing) = competencies
            .iter_mut()
            .find(|c| c.competency_id == o.competency_id)
        {
            existing.score = o.score;
            existing.level = CompetencyLevel::from_score(o.score);
        } else if let Some(c) = catalog.iter().find(|c| c.id == o.competency_id) {
            competencies.push(CompetencyEstimate {
                competency_id: c.id,
                name: c.name.clone(),
                score: o.score,
                weight: competency_weight(&c.slug),
                attempts: 0,
                is_icfes: c.is_icfes,
                level: CompetencyLevel::from_score(o.score),
            });
        }
    }
    let global = icfes::global_score(&competencies);
    IcfesEstimate {
        global,
        band: icfes::GlobalBand::from_score(global),
        competencies,
    }
}

fn radar_chart(rows: &[CompetencyRow]) -> String {
    let axes: Vec<String> = rows.iter().map(|r| r.estimate.name.clone()).collect();
    let mut series = vec![RadarSeries {
        name: "Estudiante".to_string(),
        color: STUDENT_COLOR,
        values: rows.iter().map(|r| Some(r.estimate.score)).collect(),
    }];
    if rows.iter().any(|r| r.school_average.is_some()) {
        series.push(RadarSeries {
            name: "Colegio".to_string(),
            color: SCHOOL_COLOR,
            values: rows.iter().map(|r| r.school_average).collect(),
        });
    }
    if rows.iter().any(|r| r.platform_average.is_some()) {
        series.push(RadarSeries {
            name: "Plataforma".to_string(),
            color: PLATFORM_COLOR,
            values: rows.iter().map(|r| r.platform_average).collect(),
        });
    }
    charts::radar_chart(&axes, &series)
}

pub fn build_progress_report(inputs: ProgressInputs, clock: &ReportClock) -> ProgressReport {
    let ProgressInputs {
        student,
        course,
        mut attempts,
        catalog,
        score_overrides,
        benchmarks,
        population,
        achievements,
        courses,
    } = inputs;
    sort_oldest_first(&mut attempts);

    let summary = stats::summarize(&attempts);
    let icfes = apply_score_overrides(
        icfes::estimate(&attempts, clock),
        &score_overrides,
        &catalog,
    );

    let by_competency: HashMap<i32, &CompetencyBenchmark> =
        benchmarks.iter().map(|b| (b.competency_id, b)).collect();
    let competency_rows: Vec<CompetencyRow> = icfes
        .competencies
        .iter()
        .map(|estimate| {
            let benchmark = by_competency.get(&estimate.competency_id);
            CompetencyRow {
                estimate: estimate.clone(),
                school_average: benchmark.and_then(|b| b.school_avg),
                platform_average: benchmark.and_then(|b| b.platform_avg),
            }
        })
        .collect();

    let percentiles = ranks(&summary, &student, &population);
    let (school_average, platform_average) = population_means(&student, &population);

    let no_exam_benchmarks = HashMap::new();
    let recent_attempts = attempts
        .iter()
        .rev()
        .take(RECENT_ATTEMPTS)
        .map(|a| attempt_row(a, clock, &no_exam_benchmarks))
        .collect();

    let total_points = achievements.iter().map(|a| i64::from(a.points)).sum();
    let achievement_rows = achievements
        .into_iter()
        .map(|a| AchievementRow {
            unlocked_on: clock.format_date(a.unlocked_at),
            name: a.name,
            description: a.description,
            icon: a.icon,
            points: a.points,
        })
        .collect();

    let narrative = narrative::generate(&NarrativeInput {
        summary: &summary,
        percentile: percentiles.platform,
        school_average,
        platform_average,
        competencies: &icfes.competencies,
        courses: &courses,
    });

    ProgressReport {
        radar_chart: radar_chart(&competency_rows),
        control_chart: control_chart(&attempts, &summary, school_average, platform_average),
        student,
        course,
        generated_at: clock.format_now(),
        generated_on: clock.today(),
        summary,
        icfes,
        competencies: competency_rows,
        percentiles,
        school_average,
        platform_average,
        recent_attempts,
        achievements: achievement_rows,
        total_points,
        courses,
        narrative,
    }
}

async fn load_student(pool: &PgPool, student_id: i32) -> Result<StudentProfile, LoadError> {
    students::get_student(pool, student_id)
        .await?
        .ok_or(LoadError::NotFound {
            kind: "Student",
            id: student_id,
        })
}

async fn load_competency(pool: &PgPool, competency_id: i32) -> Result<Competency, LoadError> {
    competencies::get_competency(pool, competency_id)
        .await?
        .ok_or(LoadError::NotFound {
            kind: "Competency",
            id: competency_id,
        })
}

/// Gather the competency report inputs; `results` replaces the student's stored results.
pub async fn load_competency_inputs(
    pool: &PgPool,
    student_id: i32,
    competency_id: i32,
    results: Option<Vec<ResultInput>>,
) -> Result<CompetencyInputs, LoadError> {
    let start = Instant::now();
    let (student, competency) = tokio::try_join!(
        load_student(pool, student_id),
        load_competency(pool, competency_id)
    )?;

    let supplied = results.is_some();
    let attempts = match results {
        Some(results) => {
            input::validate_results(&results)?;
            attempts_for_competency(results, &competency)?
        }
        None => exam_results::results_for_student(pool, student.id, Some(competency.id), None)
            .await?
            .into_iter()
            .map(ExamAttempt::from)
            .collect(),
    };

    let mut exam_ids: Vec<i32> = attempts
        .iter()
        .map(|a| a.exam_id)
        .filter(|id| *id > 0)
        .collect();
    exam_ids.sort_unstable();
    exam_ids.dedup();

    let (exam_benchmarks, benchmarks, population) = tokio::try_join!(
        exam_results::exam_benchmarks(pool, &exam_ids, student.school_id),
        exam_results::competency_benchmarks(pool, student.school_id, None),
        exam_results::student_averages(pool, Some(competency.id), None),
    )?;
    let benchmark = benchmarks
        .into_iter()
        .find(|b| b.competency_id == competency.id);

    debug!(
        student_id,
        competency_id,
        attempts = attempts.len(),
        supplied,
        population = population.len(),
        "Loaded competency report inputs"
    );
    log_if_slow(
        start,
        std::time::Duration::from_millis(500),
        "competency report load",
    );

    Ok(CompetencyInputs {
        student,
        competency,
        attempts,
        exam_benchmarks,
        benchmark,
        population,
    })
}

/// Gather the progress report inputs.
///
/// `results` replaces the stored results and `competency_scores` replaces the
/// estimated per-competency scores; either may be given without the other.
pub async fn load_progress_inputs(
    pool: &PgPool,
    student_id: i32,
    course_id: Option<i32>,
    results: Option<Vec<ResultInput>>,
    competency_scores: Option<Vec<CompetencyScoreInput>>,
) -> Result<ProgressInputs, LoadError> {
    let start = Instant::now();
    let student = load_student(pool, student_id).await?;
    let course = match course_id {
        Some(id) => Some(courses::get_course(pool, id).await?.ok_or(LoadError::NotFound {
            kind: "Course",
            id,
        })?),
        None => None,
    };
    let catalog = competencies::list_competencies(pool).await?;

    let score_overrides = competency_scores.unwrap_or_default();
    input::validate_competency_scores(&score_overrides)?;
    if let Some(unknown) = score_overrides
        .iter()
        .find(|o| !catalog.iter().any(|c| c.id == o.competency_id))
    {
        return Err(LoadError::NotFound {
            kind: "Competency",
            id: unknown.competency_id,
        });
    }

    let supplied = results.is_some();
    let attempts = match results {
        Some(results) => {
            input::validate_results(&results)?;
            attempts_from_catalog(results, &catalog)?
        }
        None => exam_results::results_for_student(pool, student.id, None, course_id)
            .await?
            .into_iter()
            .map(ExamAttempt::from)
            .collect(),
    };

    let (benchmarks, population, unlocked, course_rows) = tokio::try_join!(
        exam_results::competency_benchmarks(pool, student.school_id, course_id),
        exam_results::student_averages(pool, None, course_id),
        achievements::unlocked_for_student(pool, student.id),
        progress::course_progress(pool, student.id, course_id),
    )?;

    info!(
        student_id,
        course_id,
        attempts = attempts.len(),
        supplied,
        overrides = score_overrides.len(),
        achievements = unlocked.len(),
        courses = course_rows.len(),
        "Loaded progress report inputs"
    );
    log_if_slow(
        start,
        std::time::Duration::from_millis(500),
        "progress report load",
    );

    Ok(ProgressInputs {
        student,
        course,
        attempts,
        catalog,
        score_overrides,
        benchmarks,
        population,
        achievements: unlocked,
        courses: course_rows.into_iter().map(CourseProgress::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::fixtures::*;
    use chrono::Duration;

    fn student() -> StudentProfile {
        StudentProfile {
            id: 42,
            full_name: "María José Peña".into(),
            document_id: Some("1002003004".into()),
            grade: Some("11".into()),
            school_id: Some(7),
            school_name: Some("Colegio San José".into()),
        }
    }

    fn competency((id, name, slug): (i32, &str, &str)) -> Competency {
        Competency {
            id,
            name: name.into(),
            slug: slug.into(),
            is_icfes: true,
        }
    }

    fn population() -> Vec<StudentAverage> {
        vec![
            StudentAverage { student_id: 1, school_id: Some(7), average: 40.0 },
            StudentAverage { student_id: 2, school_id: Some(7), average: 60.0 },
            StudentAverage { student_id: 3, school_id: Some(8), average: 80.0 },
        ]
    }

    #[test]
    fn time_spent_formatting() {
        assert_eq!(format_time_spent(45), "45 s");
        assert_eq!(format_time_spent(720), "12 min");
        assert_eq!(format_time_spent(3900), "1 h 05 min");
        assert_eq!(format_time_spent(-5), "0 s");
    }

    #[test]
    fn same_instant_attempts_keep_their_order() {
        let first = attempt(MATEMATICAS, 3, 10, 2);
        let mut second = attempt(MATEMATICAS, 9, 10, 2);
        second.completed_at = first.completed_at;
        let older = attempt(MATEMATICAS, 5, 10, 9);

        let mut attempts = vec![first, second, older];
        sort_oldest_first(&mut attempts);
        let scores: Vec<i32> = attempts.iter().map(|a| a.score).collect();
        assert_eq!(scores, vec![5, 3, 9]);
    }

    #[test]
    fn competency_report_sorts_and_ranks() {
        let newest = attempt(MATEMATICAS, 8, 10, 1);
        let oldest = attempt(MATEMATICAS, 4, 10, 40);
        let report = build_competency_report(
            CompetencyInputs {
                student: student(),
                competency: competency(MATEMATICAS),
                attempts: vec![newest.clone(), oldest.clone()],
                exam_benchmarks: vec![ExamBenchmark {
                    exam_id: newest.exam_id,
                    school_avg: Some(55.0),
                    platform_avg: Some(50.0),
                }],
                benchmark: Some(CompetencyBenchmark {
                    competency_id: 2,
                    school_avg: Some(58.0),
                    platform_avg: Some(52.0),
                }),
                population: population(),
            },
            &clock(),
        );

        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.attempts[0].title, oldest.exam_title);
        assert_eq!(report.attempts[1].school_average, Some(55.0));
        assert_eq!(report.attempts[0].school_average, None);
        assert!((report.summary.average - 60.0).abs() < 1e-9);
        // platform: [40, 60, 80, 60] → 1 below + 0.5·2 → 50
        assert_eq!(report.percentiles.platform, Some(50.0));
        assert_eq!(report.school_average, Some(58.0));
        assert!(report.estimate.is_some());
        assert!(report.control_chart.contains("<polyline"));
        assert_eq!(report.generated_on, clock().today());
    }

    #[test]
    fn empty_competency_report_uses_placeholders() {
        let report = build_competency_report(
            CompetencyInputs {
                student: student(),
                competency: competency(LECTURA),
                attempts: vec![],
                exam_benchmarks: vec![],
                benchmark: None,
                population: population(),
            },
            &clock(),
        );
        assert!(report.estimate.is_none());
        assert_eq!(report.percentiles, PercentileRanks::default());
        assert_eq!(
            report.control_chart,
            charts::control_chart(&[], &ReferenceLines::default())
        );
        assert!(report.narrative.strengths.is_empty());
    }

    #[test]
    fn overrides_replace_scores_and_add_missing_competencies() {
        let attempts = vec![attempt(LECTURA, 5, 10, 1)];
        let catalog = vec![competency(LECTURA), competency(MATEMATICAS)];
        let estimate = icfes::estimate(&attempts, &clock());
        let overridden = apply_score_overrides(
            estimate,
            &[
                CompetencyScoreInput { competency_id: 1, score: 90.0 },
                CompetencyScoreInput { competency_id: 2, score: 70.0 },
            ],
            &catalog,
        );
        assert_eq!(overridden.competencies.len(), 2);
        assert_eq!(overridden.competencies[0].score, 90.0);
        assert_eq!(overridden.competencies[0].attempts, 1);
        assert_eq!(overridden.competencies[1].attempts, 0);
        // (90·3 + 70·3) / 6 = 80 → 400
        assert_eq!(overridden.global, 400);
    }

    #[test]
    fn progress_report_collects_everything() {
        let clock = clock();
        let attempts = vec![
            attempt(LECTURA, 7, 10, 3),
            attempt(MATEMATICAS, 5, 10, 2),
            attempt(SOCIALES, 6, 10, 1),
            attempt(INGLES, 9, 10, 12),
        ];
        let report = build_progress_report(
            ProgressInputs {
                student: student(),
                course: None,
                attempts,
                catalog: vec![],
                score_overrides: vec![],
                benchmarks: vec![CompetencyBenchmark {
                    competency_id: 1,
                    school_avg: Some(60.0),
                    platform_avg: Some(55.0),
                }],
                population: population(),
                achievements: vec![
                    UnlockedAchievement {
                        name: "Primer simulacro".into(),
                        description: "Completó su primer simulacro".into(),
                        icon: None,
                        points: 50,
                        unlocked_at: clock.now - Duration::days(5),
                    },
                    UnlockedAchievement {
                        name: "Racha".into(),
                        description: "Cinco días seguidos".into(),
                        icon: Some("🔥".into()),
                        points: 1500,
                        unlocked_at: clock.now,
                    },
                ],
                courses: vec![CourseProgress {
                    course_id: 1,
                    title: "Álgebra".into(),
                    completed_lessons: 2,
                    total_lessons: 10,
                    completed_modules: 0,
                    total_modules: 2,
                }],
            },
            &clock,
        );

        assert_eq!(report.competencies.len(), 4);
        let row = |id: i32| {
            report
                .competencies
                .iter()
                .find(|r| r.estimate.competency_id == id)
                .unwrap()
        };
        assert_eq!(row(1).school_average, Some(60.0));
        assert_eq!(row(2).school_average, None);
        assert_eq!(report.total_points, 1550);
        assert_eq!(report.achievements[0].name, "Primer simulacro");
        // newest first
        assert_eq!(report.recent_attempts[0].competency, "Sociales y Ciudadanas");
        assert_eq!(report.school_average, Some(50.0));
        assert_eq!(report.platform_average, Some(60.0));
        assert!(report.radar_chart.contains("<polygon"));
        assert!(report.icfes.global > 0);
        assert!(report.narrative.improvements.iter().any(|s| s.contains("Álgebra")));
    }
}
