//! Percentile ranks against the platform and school populations.

use crate::data::models::StudentAverage;
use serde::Serialize;

/// Percentile rank of `value` in `population`: (below + ½·equal) / n × 100.
///
/// `None` for an empty population.
pub fn percentile_rank(value: f64, population: &[f64]) -> Option<f64> {
    if population.is_empty() {
        return None;
    }
    let (below, equal) = population.iter().fold((0usize, 0usize), |(b, e), v| {
        if (*v - value).abs() < 1e-9 {
            (b, e + 1)
        } else if *v < value {
            (b + 1, e)
        } else {
            (b, e)
        }
    });
    Some((below as f64 + 0.5 * equal as f64) * 100.0 / population.len() as f64)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileRanks {
    pub platform: Option<f64>,
    pub school: Option<f64>,
}

/// Rank a student's `average` against everyone else's stored averages.
///
/// The student's own stored row is replaced by `average`, so ranks stay
/// correct when the caller supplied results that differ from the database.
pub fn rank_student(
    average: f64,
    student_id: i32,
    school_id: Option<i32>,
    population: &[StudentAverage],
) -> PercentileRanks {
    let others = population.iter().filter(|row| row.student_id != student_id);

    let mut platform: Vec<f64> = others.clone().map(|row| row.average).collect();
    platform.push(average);

    let school = school_id.map(|school| {
        let mut values: Vec<f64> = others
            .filter(|row| row.school_id == Some(school))
            .map(|row| row.average)
            .collect();
        values.push(average);
        values
    });

    // A population of one (just this student) says nothing about rank.
    PercentileRanks {
        platform: (platform.len() > 1)
            .then(|| percentile_rank(average, &platform))
            .flatten(),
        school: school
            .filter(|values| values.len() > 1)
            .and_then(|values| percentile_rank(average, &values)),
    }
}

/// "P73" style label, or a dash when unknown.
pub fn format_percentile(value: Option<f64>) -> String {
    match value {
        Some(p) => format!("P{}", p.round() as i64),
        None => "–".to_string(),
    }
}
