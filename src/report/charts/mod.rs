//! Inline SVG chart builders.
//!
//! Charts are plain strings embedded directly into the report HTML, so the
//! headless browser needs no scripts or network access to draw them.

mod control;
mod radar;

pub use control::{ControlPoint, ReferenceLines, control_chart};
pub use radar::{RadarSeries, radar_chart};

use std::fmt::Write;

/// Series colors shared by both charts: student, school, platform.
pub const STUDENT_COLOR: &str = "#1d4ed8";
pub const SCHOOL_COLOR: &str = "#f59e0b";
pub const PLATFORM_COLOR: &str = "#10b981";
pub const LIMIT_COLOR: &str = "#dc2626";

const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";

/// Coordinates are written with one decimal to keep the markup small.
fn fmt_coord(v: f64) -> String {
    let rounded = (v * 10.0).round() / 10.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded:.1}")
    }
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Truncate a label to `max` characters, appending an ellipsis.
fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        return label.to_string();
    }
    let mut out: String = label.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn open_svg(out: &mut String, width: u32, height: u32, label: &str) {
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" role="img" aria-label="{}" font-family="{FONT_FAMILY}">"#,
        html_escape::encode_double_quoted_attribute(label)
    );
}

/// An SVG of the given size containing only a centered message.
fn placeholder(width: u32, height: u32, message: &str) -> String {
    let mut out = String::new();
    open_svg(&mut out, width, height, message);
    let _ = write!(
        out,
        r##"<rect x="0.5" y="0.5" width="{}" height="{}" fill="#f8fafc" stroke="#cbd5e1" stroke-dasharray="4 4"/><text x="{}" y="{}" text-anchor="middle" font-size="14" fill="#64748b">{}</text></svg>"##,
        width - 1,
        height - 1,
        width / 2,
        height / 2,
        escape(message)
    );
    out
}
