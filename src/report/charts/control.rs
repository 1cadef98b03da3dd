//! Control chart: exam percentages over time against reference averages.

use std::fmt::Write;

use super::{
    LIMIT_COLOR, PLATFORM_COLOR, SCHOOL_COLOR, STUDENT_COLOR, escape, fmt_coord, open_svg,
    placeholder, truncate_label,
};
use crate::report::stats::ControlLimits;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 300;

const PLOT_LEFT: f64 = 44.0;
const PLOT_RIGHT: f64 = 620.0;
const PLOT_TOP: f64 = 16.0;
const PLOT_BOTTOM: f64 = 232.0;
/// Horizontal inset so the first and last markers don't sit on the axis.
const X_INSET: f64 = 16.0;

const MAX_LABEL_CHARS: usize = 14;
/// Beyond this many points only every n-th x label is drawn.
const MAX_X_LABELS: usize = 10;

pub const EMPTY_MESSAGE: &str = "Sin exámenes registrados";

/// One exam attempt plotted on the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPoint {
    pub label: String,
    /// Percentage score, 0–100.
    pub value: f64,
    pub passed: bool,
}

/// Horizontal lines drawn across the whole plot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceLines {
    pub student_average: f64,
    pub school_average: Option<f64>,
    pub platform_average: Option<f64>,
    pub limits: Option<ControlLimits>,
}

fn y_for(value: f64) -> f64 {
    let clamped = value.clamp(0.0, 100.0);
    PLOT_TOP + (100.0 - clamped) / 100.0 * (PLOT_BOTTOM - PLOT_TOP)
}

fn x_for(index: usize, count: usize) -> f64 {
    let left = PLOT_LEFT + X_INSET;
    let right = PLOT_RIGHT - X_INSET;
    if count <= 1 {
        return (left + right) / 2.0;
    }
    left + index as f64 * (right - left) / (count - 1) as f64
}

fn hline(out: &mut String, value: f64, color: &str, dashed: bool, width: f64) {
    let y = fmt_coord(y_for(value));
    let dash = if dashed { r#" stroke-dasharray="6 4""# } else { "" };
    let _ = write!(
        out,
        r#"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="{color}" stroke-width="{width}"{dash}/>"#,
        fmt_coord(PLOT_LEFT),
        fmt_coord(PLOT_RIGHT),
    );
}

fn legend_entry(out: &mut String, x: f64, color: &str, dashed: bool, label: &str) -> f64 {
    let y = f64::from(HEIGHT) - 14.0;
    let dash = if dashed { r#" stroke-dasharray="6 4""# } else { "" };
    let _ = write!(
        out,
        r##"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{color}" stroke-width="2"{dash}/><text x="{}" y="{}" font-size="11" fill="#334155">{}</text>"##,
        fmt_coord(x),
        fmt_coord(y),
        fmt_coord(x + 18.0),
        fmt_coord(y),
        fmt_coord(x + 22.0),
        fmt_coord(y + 4.0),
        escape(label)
    );
    // Rough advance: label width at ~6px per character plus swatch and gap.
    x + 22.0 + label.chars().count() as f64 * 6.0 + 18.0
}

/// Render the control chart as a standalone `<svg>` string.
///
/// Returns a placeholder when `points` is empty.
pub fn control_chart(points: &[ControlPoint], lines: &ReferenceLines) -> String {
    if points.is_empty() {
        return placeholder(WIDTH, HEIGHT, EMPTY_MESSAGE);
    }

    let mut out = String::with_capacity(4096);
    open_svg(&mut out, WIDTH, HEIGHT, "Gráfico de control de resultados");

    // Gridlines and y-axis labels.
    for tick in (0..=100).step_by(20) {
        let y = fmt_coord(y_for(f64::from(tick)));
        let _ = write!(
            out,
            r##"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="#e2e8f0" stroke-width="1"/><text x="{}" y="{}" text-anchor="end" font-size="10" fill="#64748b">{tick}</text>"##,
            fmt_coord(PLOT_LEFT),
            fmt_coord(PLOT_RIGHT),
            fmt_coord(PLOT_LEFT - 6.0),
            fmt_coord(y_for(f64::from(tick)) + 3.5),
        );
    }
    let _ = write!(
        out,
        r##"<line x1="{left}" y1="{top}" x2="{left}" y2="{bottom}" stroke="#94a3b8" stroke-width="1"/>"##,
        left = fmt_coord(PLOT_LEFT),
        top = fmt_coord(PLOT_TOP),
        bottom = fmt_coord(PLOT_BOTTOM),
    );

    if let Some(limits) = lines.limits {
        hline(&mut out, limits.upper, LIMIT_COLOR, true, 1.0);
        hline(&mut out, limits.lower, LIMIT_COLOR, true, 1.0);
    }
    if let Some(platform) = lines.platform_average {
        hline(&mut out, platform, PLATFORM_COLOR, false, 1.5);
    }
    if let Some(school) = lines.school_average {
        hline(&mut out, school, SCHOOL_COLOR, false, 1.5);
    }
    hline(&mut out, lines.student_average, STUDENT_COLOR, true, 1.5);

    let count = points.len();
    let polyline = points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{},{}", fmt_coord(x_for(i, count)), fmt_coord(y_for(p.value))))
        .collect::<Vec<_>>()
        .join(" ");
    let _ = write!(
        out,
        r#"<polyline points="{polyline}" fill="none" stroke="{STUDENT_COLOR}" stroke-width="2" stroke-linejoin="round"/>"#
    );

    let label_step = count.div_ceil(MAX_X_LABELS).max(1);
    for (i, point) in points.iter().enumerate() {
        let x = fmt_coord(x_for(i, count));
        let fill = if point.passed { STUDENT_COLOR } else { "#ffffff" };
        let _ = write!(
            out,
            r#"<circle cx="{x}" cy="{}" r="4" fill="{fill}" stroke="{STUDENT_COLOR}" stroke-width="2"><title>{}: {}%</title></circle>"#,
            fmt_coord(y_for(point.value)),
            escape(&point.label),
            fmt_coord(point.value),
        );
        if i % label_step == 0 || i == count - 1 {
            let _ = write!(
                out,
                r##"<text x="{x}" y="{}" text-anchor="middle" font-size="10" fill="#475569">{}</text>"##,
                fmt_coord(PLOT_BOTTOM + 16.0),
                escape(&truncate_label(&point.label, MAX_LABEL_CHARS)),
            );
        }
    }

    let mut x = PLOT_LEFT;
    x = legend_entry(&mut out, x, STUDENT_COLOR, false, "Estudiante");
    x = legend_entry(&mut out, x, STUDENT_COLOR, true, "Promedio");
    if lines.school_average.is_some() {
        x = legend_entry(&mut out, x, SCHOOL_COLOR, false, "Colegio");
    }
    if lines.platform_average.is_some() {
        x = legend_entry(&mut out, x, PLATFORM_COLOR, false, "Plataforma");
    }
    if lines.limits.is_some() {
        legend_entry(&mut out, x, LIMIT_COLOR, true, "Límites ±2σ");
    }

    out.push_str("</svg>");
    out
}
