//! Radar chart comparing competency scores across series.

use std::f64::consts::PI;
use std::fmt::Write;

use super::{escape, fmt_coord, open_svg, placeholder, truncate_label};

const WIDTH: u32 = 460;
const HEIGHT: u32 = 400;
const CENTER_X: f64 = 230.0;
const CENTER_Y: f64 = 185.0;
const RADIUS: f64 = 130.0;
const RINGS: [f64; 5] = [20.0, 40.0, 60.0, 80.0, 100.0];
const MAX_LABEL_CHARS: usize = 22;

pub const MIN_AXES: usize = 3;
pub const PLACEHOLDER_MESSAGE: &str = "Se necesitan al menos 3 competencias evaluadas";

/// One polygon on the chart. `values` is indexed like the axis labels;
/// `None` entries are drawn at the center.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarSeries {
    pub name: String,
    pub color: &'static str,
    pub values: Vec<Option<f64>>,
}

fn angle(index: usize, count: usize) -> f64 {
    -PI / 2.0 + 2.0 * PI * index as f64 / count as f64
}

fn point(index: usize, count: usize, value: f64) -> (f64, f64) {
    let r = value.clamp(0.0, 100.0) / 100.0 * RADIUS;
    let a = angle(index, count);
    (CENTER_X + r * a.cos(), CENTER_Y + r * a.sin())
}

fn polygon_points(count: usize, value_at: impl Fn(usize) -> f64) -> String {
    (0..count)
        .map(|i| {
            let (x, y) = point(i, count, value_at(i));
            format!("{},{}", fmt_coord(x), fmt_coord(y))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the radar chart as a standalone `<svg>` string.
///
/// Falls back to a placeholder with fewer than [`MIN_AXES`] axes.
pub fn radar_chart(axes: &[String], series: &[RadarSeries]) -> String {
    let count = axes.len();
    if count < MIN_AXES {
        return placeholder(WIDTH, HEIGHT, PLACEHOLDER_MESSAGE);
    }

    let mut out = String::with_capacity(4096);
    open_svg(&mut out, WIDTH, HEIGHT, "Radar de competencias");

    for ring in RINGS {
        let _ = write!(
            out,
            r##"<polygon points="{}" fill="none" stroke="#e2e8f0" stroke-width="1"/>"##,
            polygon_points(count, |_| ring)
        );
    }
    for ring in RINGS {
        let (x, y) = point(0, count, ring);
        let _ = write!(
            out,
            r##"<text x="{}" y="{}" font-size="9" fill="#94a3b8">{}</text>"##,
            fmt_coord(x + 3.0),
            fmt_coord(y + 3.0),
            ring as u32
        );
    }

    for (i, label) in axes.iter().enumerate() {
        let (x, y) = point(i, count, 100.0);
        let _ = write!(
            out,
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="#cbd5e1" stroke-width="1"/>"##,
            fmt_coord(CENTER_X),
            fmt_coord(CENTER_Y),
            fmt_coord(x),
            fmt_coord(y),
        );

        let a = angle(i, count);
        let (lx, ly) = (
            CENTER_X + (RADIUS + 14.0) * a.cos(),
            CENTER_Y + (RADIUS + 14.0) * a.sin(),
        );
        let anchor = if a.cos().abs() < 0.2 {
            "middle"
        } else if a.cos() > 0.0 {
            "start"
        } else {
            "end"
        };
        let _ = write!(
            out,
            r##"<text x="{}" y="{}" text-anchor="{anchor}" font-size="11" fill="#334155">{}</text>"##,
            fmt_coord(lx),
            fmt_coord(ly + 4.0),
            escape(&truncate_label(label, MAX_LABEL_CHARS)),
        );
    }

    for s in series {
        let points = polygon_points(count, |i| s.values.get(i).copied().flatten().unwrap_or(0.0));
        let _ = write!(
            out,
            r#"<polygon points="{points}" fill="{color}" fill-opacity="0.15" stroke="{color}" stroke-width="2"><title>{}</title></polygon>"#,
            escape(&s.name),
            color = s.color,
        );
    }

    let legend_y = f64::from(HEIGHT) - 18.0;
    let mut x = 24.0;
    for s in series {
        let _ = write!(
            out,
            r##"<rect x="{}" y="{}" width="12" height="12" fill="{color}" fill-opacity="0.6"/><text x="{}" y="{}" font-size="11" fill="#334155">{}</text>"##,
            fmt_coord(x),
            fmt_coord(legend_y - 10.0),
            fmt_coord(x + 16.0),
            fmt_coord(legend_y),
            escape(&s.name),
            color = s.color,
        );
        x += 16.0 + s.name.chars().count() as f64 * 6.5 + 20.0;
    }

    out.push_str("</svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::charts::{PLATFORM_COLOR, STUDENT_COLOR};

    fn axes(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Competencia {i}")).collect()
    }

    #[test]
    fn too_few_axes_render_placeholder() {
        let svg = radar_chart(&axes(2), &[]);
        assert!(svg.contains("al menos 3"));
        assert!(!svg.contains("<polygon"));
    }

    #[test]
    fn first_axis_points_straight_up() {
        let (x, y) = point(0, 4, 100.0);
        assert!((x - CENTER_X).abs() < 1e-9);
        assert!((y - (CENTER_Y - RADIUS)).abs() < 1e-9);

        let (x, y) = point(1, 4, 50.0);
        assert!((x - (CENTER_X + RADIUS / 2.0)).abs() < 1e-9);
        assert!((y - CENTER_Y).abs() < 1e-9);
    }

    #[test]
    fn rings_and_series_are_drawn() {
        let series = vec![
            RadarSeries {
                name: "Estudiante".into(),
                color: STUDENT_COLOR,
                values: vec![Some(80.0), Some(60.0), Some(40.0), Some(90.0), Some(55.0)],
            },
            RadarSeries {
                name: "Plataforma".into(),
                color: PLATFORM_COLOR,
                values: vec![Some(50.0), None, Some(50.0), Some(50.0), Some(50.0)],
            },
        ];
        let svg = radar_chart(&axes(5), &series);
        // five rings plus two series
        assert_eq!(svg.matches("<polygon").count(), RINGS.len() + 2);
        assert_eq!(svg.matches("<line").count(), 5);
        assert!(svg.contains("Estudiante"));
        assert!(svg.contains("Plataforma"));
    }

    #[test]
    fn missing_values_collapse_to_center() {
        let series = vec![RadarSeries {
            name: "Colegio".into(),
            color: STUDENT_COLOR,
            values: vec![None, None, None],
        }];
        let svg = radar_chart(&axes(3), &series);
        let center = format!("{},{}", fmt_coord(CENTER_X), fmt_coord(CENTER_Y));
        assert_eq!(svg.matches(&center).count(), 3);
    }

    #[test]
    fn axis_labels_are_escaped() {
        let labels = vec!["A&B".to_string(), "<C>".to_string(), "D".to_string()];
        let svg = radar_chart(&labels, &[]);
        assert!(svg.contains("A&amp;B"));
        assert!(svg.contains("&lt;C&gt;"));
    }
}
