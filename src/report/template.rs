//! Print-ready HTML documents for both report kinds.
//!
//! Output is a single self-contained page: inline CSS, inline SVG charts and
//! no external resources, so the headless browser can render it offline.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use num_format::{Locale, ToFormattedString};

use crate::data::models::StudentProfile;
use crate::report::icfes::ICFES_SCALE_MAX;
use crate::report::narrative::{NO_IMPROVEMENTS_PLACEHOLDER, NO_STRENGTHS_PLACEHOLDER, Narrative};
use crate::report::percentile::format_percentile;
use crate::report::pipeline::{AttemptRow, CompetencyReport, ProgressReport};
use crate::report::stats::ExamSummary;

const STYLES: &str = r#"
@page { size: A4; margin: 14mm 12mm; }
* { box-sizing: border-box; }
body { font-family: Helvetica, Arial, sans-serif; color: #0f172a; font-size: 11px; margin: 0; }
header.report-header { border-bottom: 3px solid #1d4ed8; padding-bottom: 8px; margin-bottom: 12px; }
header.report-header h1 { font-size: 20px; margin: 0 0 4px; color: #1d4ed8; }
header.report-header .meta { display: flex; flex-wrap: wrap; gap: 4px 18px; color: #334155; }
section { margin-bottom: 14px; page-break-inside: avoid; }
h2 { font-size: 14px; margin: 0 0 6px; color: #1e293b; border-left: 4px solid #1d4ed8; padding-left: 6px; }
.kpis { display: grid; grid-template-columns: repeat(4, 1fr); gap: 8px; }
.kpi { border: 1px solid #e2e8f0; border-radius: 6px; padding: 8px; background: #f8fafc; }
.kpi .label { color: #64748b; font-size: 10px; text-transform: uppercase; letter-spacing: .04em; }
.kpi .value { font-size: 18px; font-weight: bold; margin-top: 2px; }
.kpi .hint { color: #475569; font-size: 10px; margin-top: 2px; }
.chart { text-align: center; }
table { width: 100%; border-collapse: collapse; }
th, td { padding: 4px 6px; border-bottom: 1px solid #e2e8f0; text-align: left; }
th { background: #f1f5f9; font-size: 10px; text-transform: uppercase; color: #475569; }
td.num, th.num { text-align: right; }
.badge { display: inline-block; padding: 1px 6px; border-radius: 8px; font-size: 9px; font-weight: bold; }
.badge.pass { background: #dcfce7; color: #166534; }
.badge.fail { background: #fee2e2; color: #991b1b; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 12px; }
ul.narrative { margin: 0; padding-left: 16px; }
ul.narrative li { margin-bottom: 3px; }
p.placeholder { color: #64748b; font-style: italic; margin: 0; }
.bar { background: #e2e8f0; border-radius: 4px; height: 8px; overflow: hidden; }
.bar > span { display: block; height: 100%; background: #1d4ed8; }
footer { color: #94a3b8; font-size: 9px; text-align: center; margin-top: 16px; }
"#;

fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

fn opt_pct(value: Option<f64>) -> String {
    value.map(pct).unwrap_or_else(|| "–".to_string())
}

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="es" {
            head {
                meta charset="utf-8";
                title { (title) }
                style { (PreEscaped(STYLES)) }
            }
            body {
                (body)
                footer {
                    "Reporte generado automáticamente. Los puntajes ICFES son estimaciones "
                    "basadas en los resultados de la plataforma y no reemplazan la prueba oficial."
                }
            }
        }
    }
}

fn report_header(
    title: &str,
    subtitle: Option<&str>,
    student: &StudentProfile,
    generated_at: &str,
) -> Markup {
    html! {
        header.report-header {
            h1 { (title) }
            @if let Some(subtitle) = subtitle {
                div.subtitle { (subtitle) }
            }
            div.meta {
                span { strong { "Estudiante: " } span.student-name { (student.full_name) } }
                @if let Some(document) = &student.document_id {
                    span { strong { "Documento: " } (document) }
                }
                @if let Some(grade) = &student.grade {
                    span { strong { "Grado: " } (grade) }
                }
                span { strong { "Institución: " } (student.school_name.as_deref().unwrap_or("Sin institución")) }
                span { strong { "Fecha: " } span.generated-at { (generated_at) } }
            }
        }
    }
}

fn kpi(label: &str, value: &str, hint: Option<String>) -> Markup {
    html! {
        div.kpi {
            div.label { (label) }
            div.value { (value) }
            @if let Some(hint) = hint {
                div.hint { (hint) }
            }
        }
    }
}

fn chart(title: &str, svg: &str) -> Markup {
    html! {
        section {
            h2 { (title) }
            // Chart builders escape every piece of text they embed.
            div.chart { (PreEscaped(svg)) }
        }
    }
}

fn summary_kpis(summary: &ExamSummary) -> Markup {
    let consistency = summary.consistency.label();
    let trend = format!("{} {}", summary.trend.arrow(), summary.trend.label());
    html! {
        (kpi("Exámenes", &summary.attempts.to_string(), None))
        (kpi("Promedio", &pct(summary.average), Some(format!("Mejor {} · Peor {}", pct(summary.best), pct(summary.worst)))))
        (kpi("Aprobación", &pct(summary.pass_rate), None))
        (kpi("Consistencia", consistency, Some(format!("σ = {:.1}", summary.std_dev))))
        (kpi("Tendencia", &trend, None))
    }
}

fn attempts_table(rows: &[AttemptRow], show_competency: bool, show_benchmarks: bool) -> Markup {
    html! {
        @if rows.is_empty() {
            p.placeholder { "El estudiante aún no ha presentado exámenes." }
        } @else {
            table.attempts {
                thead {
                    tr {
                        th { "Fecha" }
                        th { "Examen" }
                        @if show_competency { th { "Competencia" } }
                        th { "Dificultad" }
                        th.num { "Aciertos" }
                        th.num { "Porcentaje" }
                        @if show_benchmarks {
                            th.num { "Colegio" }
                            th.num { "Plataforma" }
                        }
                        th.num { "Tiempo" }
                        th { "Estado" }
                    }
                }
                tbody {
                    @for row in rows {
                        tr {
                            td { (row.date) }
                            td {
                                (row.title)
                                @if row.is_simulacro { " " span.badge { "Simulacro" } }
                            }
                            @if show_competency { td { (row.competency) } }
                            td { (row.difficulty.label()) }
                            td.num { (row.score) " / " (row.total_questions) }
                            td.num { (pct(row.percentage)) }
                            @if show_benchmarks {
                                td.num { (opt_pct(row.school_average)) }
                                td.num { (opt_pct(row.platform_average)) }
                            }
                            td.num { (row.time_spent.as_deref().unwrap_or("–")) }
                            td {
                                @if row.passed {
                                    span.badge.pass { "Aprobado" }
                                } @else {
                                    span.badge.fail { "No aprobado" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn item_list(class: &str, items: &[String], placeholder: &str) -> Markup {
    html! {
        @if items.is_empty() {
            p.placeholder { (placeholder) }
        } @else {
            ul class=(format!("narrative {class}")) {
                @for item in items { li { (item) } }
            }
        }
    }
}

fn narrative_section(narrative: &Narrative) -> Markup {
    html! {
        section.narrative {
            div.columns {
                div {
                    h2 { "Fortalezas" }
                    (item_list("strengths", &narrative.strengths, NO_STRENGTHS_PLACEHOLDER))
                }
                div {
                    h2 { "Aspectos por mejorar" }
                    (item_list("improvements", &narrative.improvements, NO_IMPROVEMENTS_PLACEHOLDER))
                }
            }
        }
        section {
            h2 { "Recomendaciones" }
            (item_list("recommendations", &narrative.recommendations, ""))
        }
    }
}

pub fn render_competency_report(report: &CompetencyReport) -> String {
    let title = format!("Reporte de competencia: {}", report.competency.name);
    let icfes_value = report
        .estimate
        .as_ref()
        .map(|e| format!("{} / {ICFES_SCALE_MAX}", e.scaled()))
        .unwrap_or_else(|| "–".to_string());
    let level_hint = report
        .estimate
        .as_ref()
        .map(|e| format!("Nivel {}: {}", e.level.number(), e.level.description()));

    let body = html! {
        (report_header(&title, None, &report.student, &report.generated_at))
        section {
            h2 { "Resumen" }
            div.kpis {
                (kpi("Puntaje ICFES estimado", &icfes_value, level_hint))
                (summary_kpis(&report.summary))
                (kpi("Percentil plataforma", &format_percentile(report.percentiles.platform), None))
                (kpi("Percentil colegio", &format_percentile(report.percentiles.school), None))
                (kpi("Promedio colegio", &opt_pct(report.school_average), Some(format!("Plataforma {}", opt_pct(report.platform_average)))))
            }
        }
        (chart("Gráfico de control", &report.control_chart))
        section {
            h2 { "Historial de exámenes" }
            (attempts_table(&report.attempts, false, true))
        }
        (narrative_section(&report.narrative))
    };
    layout(&title, body).into_string()
}

pub fn render_progress_report(report: &ProgressReport) -> String {
    let title = "Reporte de progreso";
    let subtitle = report.course.as_ref().map(|c| format!("Curso: {}", c.title));

    let body = html! {
        (report_header(title, subtitle.as_deref(), &report.student, &report.generated_at))
        section {
            h2 { "Resumen" }
            div.kpis {
                (kpi(
                    "Puntaje ICFES global",
                    &format!("{} / {ICFES_SCALE_MAX}", report.icfes.global),
                    Some(format!("Desempeño {}", report.icfes.band.label())),
                ))
                (summary_kpis(&report.summary))
                (kpi("Percentil plataforma", &format_percentile(report.percentiles.platform), None))
                (kpi("Percentil colegio", &format_percentile(report.percentiles.school), None))
                (kpi("Puntos de logros", &report.total_points.to_formatted_string(&Locale::es), None))
            }
        }
        section {
            h2 { "Competencias" }
            @if report.competencies.is_empty() {
                p.placeholder { "Sin resultados por competencia." }
            } @else {
                table.competencies {
                    thead {
                        tr {
                            th { "Competencia" }
                            th.num { "Puntaje (0–100)" }
                            th.num { "Escala ICFES" }
                            th { "Nivel" }
                            th.num { "Exámenes" }
                            th.num { "Colegio" }
                            th.num { "Plataforma" }
                        }
                    }
                    tbody {
                        @for row in &report.competencies {
                            tr {
                                td { (row.estimate.name) }
                                td.num { (format!("{:.1}", row.estimate.score)) }
                                td.num { (row.estimate.scaled()) }
                                td { "Nivel " (row.estimate.level.number()) }
                                td.num { (row.estimate.attempts) }
                                td.num { (opt_pct(row.school_average)) }
                                td.num { (opt_pct(row.platform_average)) }
                            }
                        }
                    }
                }
            }
        }
        (chart("Radar de competencias", &report.radar_chart))
        (chart("Gráfico de control", &report.control_chart))
        section {
            h2 { "Exámenes recientes" }
            (attempts_table(&report.recent_attempts, true, false))
        }
        section {
            h2 { "Avance en cursos" }
            @if report.courses.is_empty() {
                p.placeholder { "No está inscrito en cursos." }
            } @else {
                table.courses {
                    thead {
                        tr {
                            th { "Curso" }
                            th.num { "Lecciones" }
                            th.num { "Módulos" }
                            th { "Avance" }
                        }
                    }
                    tbody {
                        @for course in &report.courses {
                            tr {
                                td { (course.title) }
                                td.num { (course.completed_lessons) " / " (course.total_lessons) }
                                td.num { (course.completed_modules) " / " (course.total_modules) }
                                td {
                                    div.bar { span style=(format!("width: {:.0}%", course.percent())) {} }
                                    (format!("{:.0}%", course.percent()))
                                }
                            }
                        }
                    }
                }
            }
        }
        section {
            h2 { "Logros" }
            @if report.achievements.is_empty() {
                p.placeholder { "Aún no ha desbloqueado logros." }
            } @else {
                table.achievements {
                    tbody {
                        @for a in &report.achievements {
                            tr {
                                td { (a.icon.as_deref().unwrap_or("🏅")) }
                                td { strong { (a.name) } br; (a.description) }
                                td.num { (a.points.to_formatted_string(&Locale::es)) " pts" }
                                td { (a.unlocked_on) }
                            }
                        }
                    }
                }
            }
        }
        (narrative_section(&report.narrative))
    };
    layout(title, body).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::{Competency, CompetencyBenchmark};
    use crate::report::model::fixtures::*;
    use crate::report::pipeline::{
        CompetencyInputs, ProgressInputs, build_competency_report, build_progress_report,
    };
    use html_scraper::{Html, Selector};

    fn student(name: &str) -> StudentProfile {
        StudentProfile {
            id: 9,
            full_name: name.into(),
            document_id: None,
            grade: Some("11".into()),
            school_id: None,
            school_name: None,
        }
    }

    fn select<'a>(doc: &'a Html, css: &str) -> Vec<String> {
        let selector = Selector::parse(css).unwrap();
        doc.select(&selector)
            .map(|el| el.text().collect::<String>())
            .collect()
    }

    fn competency_html(name: &str, attempts: Vec<crate::report::model::ExamAttempt>) -> Html {
        let report = build_competency_report(
            CompetencyInputs {
                student: student(name),
                competency: Competency {
                    id: 1,
                    name: "Lectura Crítica".into(),
                    slug: "lectura-critica".into(),
                    is_icfes: true,
                },
                attempts,
                exam_benchmarks: vec![],
                benchmark: Some(CompetencyBenchmark {
                    competency_id: 1,
                    school_avg: None,
                    platform_avg: Some(61.0),
                }),
                population: vec![],
            },
            &clock(),
        );
        Html::parse_document(&render_competency_report(&report))
    }

    #[test]
    fn competency_report_has_header_and_rows() {
        let doc = competency_html(
            "Ana Gómez",
            vec![attempt(LECTURA, 6, 10, 5), attempt(LECTURA, 8, 10, 1)],
        );
        assert_eq!(select(&doc, "h1"), vec!["Reporte de competencia: Lectura Crítica"]);
        assert_eq!(select(&doc, ".student-name"), vec!["Ana Gómez"]);
        assert_eq!(select(&doc, "table.attempts tbody tr").len(), 2);
        assert_eq!(select(&doc, ".chart svg").len(), 1);
        assert!(select(&doc, ".kpi .value").iter().any(|v| v == "70.0%"));
    }

    #[test]
    fn user_data_is_escaped() {
        let doc = competency_html("<script>alert(1)</script>", vec![]);
        assert!(select(&doc, "script").is_empty());
        assert_eq!(select(&doc, ".student-name"), vec!["<script>alert(1)</script>"]);
    }

    #[test]
    fn empty_report_shows_placeholders() {
        let doc = competency_html("Ana", vec![]);
        let placeholders = select(&doc, "p.placeholder");
        assert!(placeholders.iter().any(|p| p.contains("no ha presentado")));
        assert!(placeholders.contains(&NO_STRENGTHS_PLACEHOLDER.to_string()));
        assert!(placeholders.contains(&NO_IMPROVEMENTS_PLACEHOLDER.to_string()));
        assert_eq!(select(&doc, "ul.recommendations li").len(), 1);
    }

    #[test]
    fn progress_report_lists_competencies_and_points() {
        let report = build_progress_report(
            ProgressInputs {
                student: student("Luis"),
                course: None,
                attempts: vec![
                    attempt(LECTURA, 7, 10, 3),
                    attempt(MATEMATICAS, 5, 10, 2),
                    attempt(NATURALES, 6, 10, 1),
                ],
                catalog: vec![],
                score_overrides: vec![],
                benchmarks: vec![],
                population: vec![],
                achievements: vec![crate::data::models::UnlockedAchievement {
                    name: "Constancia".into(),
                    description: "Diez exámenes".into(),
                    icon: None,
                    points: 1200,
                    unlocked_at: clock().now,
                }],
                courses: vec![],
            },
            &clock(),
        );
        let doc = Html::parse_document(&render_progress_report(&report));
        assert_eq!(select(&doc, "table.competencies tbody tr").len(), 3);
        assert_eq!(select(&doc, ".chart svg").len(), 2);
        let points = 1200.to_formatted_string(&Locale::es);
        assert!(select(&doc, ".kpi .value").contains(&points));
        assert!(select(&doc, "p.placeholder").iter().any(|p| p.contains("cursos")));
    }
}
