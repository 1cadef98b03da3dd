//! Descriptive statistics over exam attempts.

use crate::report::model::ExamAttempt;
use serde::Serialize;

/// Standard deviation (in percentage points) below which results count as highly consistent.
const HIGH_CONSISTENCY_MAX_STD_DEV: f64 = 8.0;
const MEDIUM_CONSISTENCY_MAX_STD_DEV: f64 = 15.0;

/// Least-squares slope (points per attempt) beyond which a trend is reported.
const TREND_SLOPE_THRESHOLD: f64 = 1.5;
const MIN_ATTEMPTS_FOR_TREND: usize = 3;

/// Control limits sit this many standard deviations from the mean.
const CONTROL_LIMIT_SIGMAS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Consistency {
    High,
    Medium,
    Low,
    InsufficientData,
}

impl Consistency {
    pub fn from_std_dev(std_dev: f64, attempts: usize) -> Self {
        if attempts < 2 {
            Consistency::InsufficientData
        } else if std_dev < HIGH_CONSISTENCY_MAX_STD_DEV {
            Consistency::High
        } else if std_dev < MEDIUM_CONSISTENCY_MAX_STD_DEV {
            Consistency::Medium
        } else {
            Consistency::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Consistency::High => "Alta",
            Consistency::Medium => "Media",
            Consistency::Low => "Baja",
            Consistency::InsufficientData => "Sin datos suficientes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    InsufficientData,
}

impl Trend {
    pub fn from_slope(slope: f64, attempts: usize) -> Self {
        if attempts < MIN_ATTEMPTS_FOR_TREND {
            Trend::InsufficientData
        } else if slope > TREND_SLOPE_THRESHOLD {
            Trend::Improving
        } else if slope < -TREND_SLOPE_THRESHOLD {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Trend::Improving => "En mejora",
            Trend::Stable => "Estable",
            Trend::Declining => "En descenso",
            Trend::InsufficientData => "Sin datos suficientes",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Improving => "▲",
            Trend::Stable => "►",
            Trend::Declining => "▼",
            Trend::InsufficientData => "–",
        }
    }
}

/// Upper/lower control limits around the mean, clamped to the 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlLimits {
    pub center: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Aggregate view of a set of attempts. All percentages are on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    pub attempts: usize,
    pub average: f64,
    pub best: f64,
    pub worst: f64,
    pub pass_rate: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub slope: f64,
    pub consistency: Consistency,
    pub trend: Trend,
    pub total_time_seconds: i64,
}

impl ExamSummary {
    pub fn empty() -> Self {
        ExamSummary {
            attempts: 0,
            average: 0.0,
            best: 0.0,
            worst: 0.0,
            pass_rate: 0.0,
            variance: 0.0,
            std_dev: 0.0,
            slope: 0.0,
            consistency: Consistency::InsufficientData,
            trend: Trend::InsufficientData,
            total_time_seconds: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.attempts > 0
    }

    /// `None` when there is nothing to chart.
    pub fn control_limits(&self) -> Option<ControlLimits> {
        if self.attempts == 0 {
            return None;
        }
        let spread = CONTROL_LIMIT_SIGMAS * self.std_dev;
        Some(ControlLimits {
            center: self.average,
            upper: (self.average + spread).min(100.0),
            lower: (self.average - spread).max(0.0),
        })
    }
}

/// Summarize attempts in the order given (callers pass them oldest first).
pub fn summarize(attempts: &[ExamAttempt]) -> ExamSummary {
    if attempts.is_empty() {
        return ExamSummary::empty();
    }

    let values: Vec<f64> = attempts.iter().map(ExamAttempt::percentage).collect();
    let passed = attempts.iter().filter(|a| a.passed).count();
    let total_time_seconds = attempts
        .iter()
        .filter_map(|a| a.time_spent_seconds)
        .map(|s| s.max(0) as i64)
        .sum();

    let average = mean(&values);
    let variance = population_variance(&values);
    let std_dev = variance.sqrt();
    let slope = least_squares_slope(&values);
    let best = values.iter().copied().fold(f64::MIN, f64::max);
    let worst = values.iter().copied().fold(f64::MAX, f64::min);

    ExamSummary {
        attempts: values.len(),
        average,
        best,
        worst,
        pass_rate: passed as f64 * 100.0 / values.len() as f64,
        variance,
        std_dev,
        slope,
        consistency: Consistency::from_std_dev(std_dev, values.len()),
        trend: Trend::from_slope(slope, values.len()),
        total_time_seconds,
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Slope of the least-squares line through `(index, value)`; 0 for fewer than two points.
pub fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);
    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    if den == 0.0 { 0.0 } else { num / den }
}
