//! ICFES-equivalent score estimation on the official 0–500 scale.
//!
//! Pipeline per attempt: percentage × time-spent multiplier, weighted by
//! recency bucket × exam difficulty. Per-competency weighted means (0–100) are
//! then combined with the official ICFES subject weights and scaled by 5.

use crate::report::model::{Difficulty, ExamAttempt, ReportClock};
use crate::utils::slugify;
use indexmap::IndexMap;
use serde::Serialize;

pub const ICFES_SCALE_MAX: u32 = 500;

/// Seconds allotted per question when an exam has no time limit.
const DEFAULT_SECONDS_PER_QUESTION: f64 = 90.0;

/// Recency weight for an attempt completed `days` days ago.
pub fn recency_weight(days: i64) -> f64 {
    match days {
        i64::MIN..=7 => 1.0,
        8..=30 => 0.85,
        31..=90 => 0.65,
        91..=180 => 0.45,
        _ => 0.30,
    }
}

pub fn difficulty_weight(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Basic => 0.85,
        Difficulty::Intermediate => 1.0,
        Difficulty::Advanced => 1.2,
    }
}

/// Multiplier applied to an attempt's percentage based on time spent vs. expected.
///
/// Very fast attempts are discounted as likely guessing; overtime attempts are
/// discounted slightly. Unknown time is neutral.
pub fn time_multiplier(attempt: &ExamAttempt) -> f64 {
    let Some(spent) = attempt.time_spent_seconds.filter(|s| *s > 0) else {
        return 1.0;
    };
    let expected = match attempt.time_limit_minutes.filter(|m| *m > 0) {
        Some(minutes) => minutes as f64 * 60.0,
        None if attempt.total_questions > 0 => {
            attempt.total_questions as f64 * DEFAULT_SECONDS_PER_QUESTION
        }
        None => return 1.0,
    };

    let ratio = spent as f64 / expected;
    if ratio < 0.2 {
        0.85
    } else if ratio <= 1.0 {
        1.0
    } else if ratio <= 1.5 {
        0.95
    } else {
        0.90
    }
}

/// Official ICFES Saber 11 subject weight for a competency.
///
/// Matches on the slugified slug or name so accents and spacing do not matter.
pub fn competency_weight(slug_or_name: &str) -> f64 {
    match slugify(slug_or_name).as_str() {
        "lectura-critica" => 3.0,
        "matematicas" => 3.0,
        "sociales-y-ciudadanas" | "sociales-ciudadanas" | "ciencias-sociales" => 3.0,
        "ciencias-naturales" => 3.0,
        "ingles" => 1.0,
        _ => 1.0,
    }
}

/// Saber 11 per-test performance level on the 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum CompetencyLevel {
    Level1,
    Level2,
    Level3,
    Level4,
}

impl CompetencyLevel {
    pub fn from_score(score: f64) -> Self {
        if score <= 35.0 {
            CompetencyLevel::Level1
        } else if score <= 50.0 {
            CompetencyLevel::Level2
        } else if score <= 70.0 {
            CompetencyLevel::Level3
        } else {
            CompetencyLevel::Level4
        }
    }

    pub fn number(self) -> u8 {
        match self {
            CompetencyLevel::Level1 => 1,
            CompetencyLevel::Level2 => 2,
            CompetencyLevel::Level3 => 3,
            CompetencyLevel::Level4 => 4,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CompetencyLevel::Level1 => "Insuficiente",
            CompetencyLevel::Level2 => "Mínimo",
            CompetencyLevel::Level3 => "Satisfactorio",
            CompetencyLevel::Level4 => "Avanzado",
        }
    }
}

/// Band for the global 0–500 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GlobalBand {
    Low,
    Basic,
    Satisfactory,
    Advanced,
}

impl GlobalBand {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=220 => GlobalBand::Low,
            221..=300 => GlobalBand::Basic,
            301..=370 => GlobalBand::Satisfactory,
            _ => GlobalBand::Advanced,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GlobalBand::Low => "Bajo",
            GlobalBand::Basic => "Básico",
            GlobalBand::Satisfactory => "Satisfactorio",
            GlobalBand::Advanced => "Avanzado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencyEstimate {
    pub competency_id: i32,
    pub name: String,
    /// Weighted score on the 0–100 scale.
    pub score: f64,
    pub weight: f64,
    pub attempts: usize,
    pub is_icfes: bool,
    pub level: CompetencyLevel,
}

impl CompetencyEstimate {
    /// This competency's score on the 0–500 scale.
    pub fn scaled(&self) -> u32 {
        scale_to_icfes(self.score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IcfesEstimate {
    pub global: u32,
    pub band: GlobalBand,
    /// In first-seen order of the input attempts.
    pub competencies: Vec<CompetencyEstimate>,
}

impl IcfesEstimate {
    pub fn empty() -> Self {
        IcfesEstimate {
            global: 0,
            band: GlobalBand::from_score(0),
            competencies: Vec::new(),
        }
    }
}

/// Convert a 0–100 score to the 0–500 scale.
pub fn scale_to_icfes(score: f64) -> u32 {
    (score.clamp(0.0, 100.0) * 5.0).round() as u32
}

/// Recency- and difficulty-weighted mean of time-adjusted percentages (0–100).
pub fn competency_score(attempts: &[&ExamAttempt], clock: &ReportClock) -> f64 {
    let (weighted_sum, weight_total) =
        attempts
            .iter()
            .fold((0.0, 0.0), |(sum, total), attempt| {
                let weight = recency_weight(clock.days_since(attempt.completed_at))
                    * difficulty_weight(attempt.difficulty);
                let adjusted = (attempt.percentage() * time_multiplier(attempt)).min(100.0);
                (sum + adjusted * weight, total + weight)
            });

    if weight_total == 0.0 {
        0.0
    } else {
        (weighted_sum / weight_total).clamp(0.0, 100.0)
    }
}

/// Estimate per-competency scores and the global ICFES-equivalent score.
pub fn estimate(attempts: &[ExamAttempt], clock: &ReportClock) -> IcfesEstimate {
    if attempts.is_empty() {
        return IcfesEstimate::empty();
    }

    let mut grouped: IndexMap<i32, Vec<&ExamAttempt>> = IndexMap::new();
    for attempt in attempts {
        grouped.entry(attempt.competency_id).or_default().push(attempt);
    }

    let competencies: Vec<CompetencyEstimate> = grouped
        .values()
        .map(|group| {
            let first = group[0];
            let score = competency_score(group, clock);
            let weight_key = if first.competency_slug.is_empty() {
                first.competency_name.as_str()
            } else {
                first.competency_slug.as_str()
            };
            CompetencyEstimate {
                competency_id: first.competency_id,
                name: first.competency_name.clone(),
                score,
                weight: competency_weight(weight_key),
                attempts: group.len(),
                is_icfes: first.is_icfes,
                level: CompetencyLevel::from_score(score),
            }
        })
        .collect();

    let global = global_score(&competencies);
    IcfesEstimate {
        global,
        band: GlobalBand::from_score(global),
        competencies,
    }
}

/// Weighted combination of competency scores on the 0–500 scale.
///
/// Only ICFES competencies count when any are present; otherwise every
/// competency counts with weight 1.
pub fn global_score(competencies: &[CompetencyEstimate]) -> u32 {
    let any_icfes = competencies.iter().any(|c| c.is_icfes);
    let (sum, total) = competencies
        .iter()
        .filter(|c| !any_icfes || c.is_icfes)
        .map(|c| {
            let weight = if any_icfes { c.weight } else { 1.0 };
            (c.score * weight, weight)
        })
        .fold((0.0, 0.0), |(s, t), (v, w)| (s + v, t + w));

    if total == 0.0 {
        0
    } else {
        scale_to_icfes(sum / total).min(ICFES_SCALE_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::fixtures::*;

    #[test]
    fn recency_buckets() {
        assert_eq!(recency_weight(0), 1.0);
        assert_eq!(recency_weight(7), 1.0);
        assert_eq!(recency_weight(8), 0.85);
        assert_eq!(recency_weight(30), 0.85);
        assert_eq!(recency_weight(90), 0.65);
        assert_eq!(recency_weight(180), 0.45);
        assert_eq!(recency_weight(181), 0.30);
    }

    #[test]
    fn weights_ignore_accents_and_case() {
        assert_eq!(competency_weight("Lectura Crítica"), 3.0);
        assert_eq!(competency_weight("matematicas"), 3.0);
        assert_eq!(competency_weight("Inglés"), 1.0);
        assert_eq!(competency_weight("Programación"), 1.0);
    }

    #[test]
    fn time_multiplier_discounts_rushed_and_overtime() {
        let mut a = attempt(MATEMATICAS, 8, 10, 0);
        assert_eq!(time_multiplier(&a), 1.0);
        // 10 questions → 900s expected.
        a.time_spent_seconds = Some(60);
        assert_eq!(time_multiplier(&a), 0.85);
        a.time_spent_seconds = Some(800);
        assert_eq!(time_multiplier(&a), 1.0);
        a.time_spent_seconds = Some(1200);
        assert_eq!(time_multiplier(&a), 0.95);
        a.time_limit_minutes = Some(5);
        assert_eq!(time_multiplier(&a), 0.90);
    }

    #[test]
    fn no_attempts_gives_zero() {
        let estimate = estimate(&[], &clock());
        assert_eq!(estimate.global, 0);
        assert_eq!(estimate.band, GlobalBand::Low);
        assert!(estimate.competencies.is_empty());
    }

    #[test]
    fn recent_attempts_dominate() {
        let clock = clock();
        let old = attempt(LECTURA, 2, 10, 400);
        let recent = attempt(LECTURA, 8, 10, 1);
        let score = competency_score(&[&old, &recent], &clock);
        // (20 * 0.3 + 80 * 1.0) / 1.3
        assert!((score - 86.0 / 1.3).abs() < 1e-6);
    }

    #[test]
    fn perfect_scores_reach_500() {
        let attempts = vec![
            attempt(LECTURA, 10, 10, 1),
            attempt(MATEMATICAS, 10, 10, 1),
            attempt(SOCIALES, 10, 10, 1),
            attempt(NATURALES, 10, 10, 1),
            attempt(INGLES, 10, 10, 1),
        ];
        let estimate = estimate(&attempts, &clock());
        assert_eq!(estimate.global, 500);
        assert_eq!(estimate.band, GlobalBand::Advanced);
        assert_eq!(estimate.competencies.len(), 5);
        assert!(estimate.competencies.iter().all(|c| c.level == CompetencyLevel::Level4));
    }

    #[test]
    fn english_weighs_less_than_core_subjects() {
        let attempts = vec![attempt(LECTURA, 10, 10, 1), attempt(INGLES, 0, 10, 1)];
        let estimate = estimate(&attempts, &clock());
        // (100 * 3 + 0 * 1) / 4 * 5
        assert_eq!(estimate.global, 375);
    }

    #[test]
    fn non_icfes_competencies_are_ignored_when_icfes_ones_exist() {
        let mut general = attempt((9, "Programación", "programacion"), 0, 10, 1);
        general.is_icfes = false;
        let attempts = vec![attempt(MATEMATICAS, 6, 10, 1), general];
        assert_eq!(estimate(&attempts, &clock()).global, 300);
    }

    #[test]
    fn only_general_competencies_count_equally() {
        let mut a = attempt((9, "Programación", "programacion"), 4, 10, 1);
        a.is_icfes = false;
        let mut b = attempt((10, "Filosofía", "filosofia"), 8, 10, 1);
        b.is_icfes = false;
        assert_eq!(estimate(&[a, b], &clock()).global, 300);
    }

    #[test]
    fn harder_exams_weigh_more() {
        let clock = clock();
        let mut easy = attempt(MATEMATICAS, 10, 10, 1);
        easy.difficulty = Difficulty::Basic;
        let mut hard = attempt(MATEMATICAS, 5, 10, 1);
        hard.difficulty = Difficulty::Advanced;
        let score = competency_score(&[&easy, &hard], &clock);
        assert!(score < 75.0, "advanced attempt should pull the mean toward 50, got {score}");
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(CompetencyLevel::from_score(35.0), CompetencyLevel::Level1);
        assert_eq!(CompetencyLevel::from_score(35.1), CompetencyLevel::Level2);
        assert_eq!(CompetencyLevel::from_score(70.0), CompetencyLevel::Level3);
        assert_eq!(CompetencyLevel::from_score(71.0), CompetencyLevel::Level4);
        assert_eq!(GlobalBand::from_score(300), GlobalBand::Basic);
        assert_eq!(GlobalBand::from_score(371), GlobalBand::Advanced);
    }
}
