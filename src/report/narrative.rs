//! Rule-based report copy: strengths, areas for improvement, recommendations.
//!
//! Every rule is a threshold check over the computed metrics; the output is
//! deterministic for a given input.

use crate::report::icfes::CompetencyEstimate;
use crate::report::model::CourseProgress;
use crate::report::stats::{Consistency, ExamSummary, Trend};
use serde::Serialize;

const MAX_ITEMS: usize = 5;

/// Points above/below a reference average that count as a meaningful gap.
const COMPARISON_MARGIN: f64 = 5.0;

/// Metrics the narrative rules look at.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeInput<'a> {
    pub summary: &'a ExamSummary,
    pub percentile: Option<f64>,
    pub school_average: Option<f64>,
    pub platform_average: Option<f64>,
    pub competencies: &'a [CompetencyEstimate],
    pub courses: &'a [CourseProgress],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub recommendations: Vec<String>,
}

pub const NO_STRENGTHS_PLACEHOLDER: &str =
    "Aún no hay suficientes resultados para identificar fortalezas.";
pub const NO_IMPROVEMENTS_PLACEHOLDER: &str =
    "No se identificaron aspectos críticos por mejorar con los datos disponibles.";

pub fn generate(input: &NarrativeInput<'_>) -> Narrative {
    let mut narrative = Narrative {
        strengths: strengths(input),
        improvements: improvements(input),
        recommendations: recommendations(input),
    };
    narrative.strengths.truncate(MAX_ITEMS);
    narrative.improvements.truncate(MAX_ITEMS);
    narrative.recommendations.truncate(MAX_ITEMS);
    narrative
}

/// Competencies sorted by score, strongest first.
fn ranked(competencies: &[CompetencyEstimate]) -> Vec<&CompetencyEstimate> {
    let mut sorted: Vec<&CompetencyEstimate> = competencies.iter().collect();
    sorted.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted
}

fn strengths(input: &NarrativeInput<'_>) -> Vec<String> {
    let s = input.summary;
    let mut out = Vec::new();
    if !s.has_data() {
        return out;
    }

    if s.average >= 80.0 {
        out.push(format!(
            "Promedio sobresaliente de {:.1}% en los exámenes presentados.",
            s.average
        ));
    } else if s.average >= 65.0 {
        out.push(format!(
            "Buen desempeño general con un promedio de {:.1}%.",
            s.average
        ));
    }

    if s.pass_rate >= 80.0 {
        out.push(format!(
            "Aprobó el {:.0}% de los exámenes presentados.",
            s.pass_rate
        ));
    }

    if s.consistency == Consistency::High {
        out.push("Resultados consistentes de un examen a otro.".to_string());
    }

    if s.trend == Trend::Improving {
        out.push("Tendencia de mejora sostenida en los intentos más recientes.".to_string());
    }

    if let Some(p) = input.percentile.filter(|p| *p >= 75.0) {
        out.push(format!(
            "Se ubica por encima del {:.0}% de los estudiantes de la plataforma.",
            p
        ));
    }

    if let Some(school) = input.school_average
        && s.average - school > COMPARISON_MARGIN
    {
        out.push(format!(
            "Supera el promedio de su institución por {:.1} puntos.",
            s.average - school
        ));
    } else if let Some(platform) = input.platform_average
        && s.average - platform > COMPARISON_MARGIN
    {
        out.push(format!(
            "Supera el promedio de la plataforma por {:.1} puntos.",
            s.average - platform
        ));
    }

    for c in ranked(input.competencies)
        .into_iter()
        .filter(|c| c.score > 70.0)
        .take(2)
    {
        out.push(format!(
            "Dominio destacado en {} ({:.0}/100).",
            c.name, c.score
        ));
    }

    for course in input.courses.iter().filter(|c| c.percent() >= 90.0) {
        out.push(format!(
            "Completó prácticamente todo el curso {}.",
            course.title
        ));
    }

    out
}

fn improvements(input: &NarrativeInput<'_>) -> Vec<String> {
    let s = input.summary;
    let mut out = Vec::new();

    let mut weakest = ranked(input.competencies);
    weakest.reverse();
    for c in weakest.into_iter().filter(|c| c.score < 50.0).take(2) {
        out.push(format!("{} requiere refuerzo ({:.0}/100).", c.name, c.score));
    }

    if s.has_data() {
        if s.average < 50.0 {
            out.push(format!(
                "El promedio actual ({:.1}%) está por debajo del nivel esperado.",
                s.average
            ));
        }

        if s.pass_rate < 50.0 {
            out.push(format!(
                "Solo aprobó el {:.0}% de los exámenes presentados.",
                s.pass_rate
            ));
        }

        if s.consistency == Consistency::Low {
            out.push(format!(
                "Alta variabilidad entre resultados (desviación de {:.1} puntos).",
                s.std_dev
            ));
        }

        if s.trend == Trend::Declining {
            out.push("Los resultados más recientes muestran una tendencia a la baja.".to_string());
        }

        if let Some(p) = input.percentile.filter(|p| *p < 25.0) {
            out.push(format!(
                "Se ubica en el cuartil inferior de la plataforma (percentil {:.0}).",
                p
            ));
        }

        if let Some(school) = input.school_average
            && school - s.average > COMPARISON_MARGIN
        {
            out.push(format!(
                "Está {:.1} puntos por debajo del promedio de su institución.",
                school - s.average
            ));
        }
    }

    for course in input.courses.iter().filter(|c| c.percent() < 30.0) {
        out.push(format!(
            "Avance bajo en el curso {} ({:.0}%).",
            course.title,
            course.percent()
        ));
    }

    out
}

fn recommendations(input: &NarrativeInput<'_>) -> Vec<String> {
    let s = input.summary;
    let mut out = Vec::new();

    if !s.has_data() {
        out.push(
            "Presentar al menos un simulacro para obtener un diagnóstico inicial.".to_string(),
        );
    } else if s.attempts < 3 {
        out.push(
            "Presentar más exámenes para obtener un diagnóstico más confiable.".to_string(),
        );
    }

    if let Some(weakest) = ranked(input.competencies).last()
        && weakest.score < 70.0
    {
        out.push(format!(
            "Priorizar la práctica de {} con preguntas tipo ICFES.",
            weakest.name
        ));
    }

    if s.consistency == Consistency::Low {
        out.push(
            "Establecer una rutina de estudio regular para estabilizar los resultados.".to_string(),
        );
    }

    if s.trend == Trend::Declining {
        out.push(
            "Revisar los temas de los últimos exámenes y repasar los errores frecuentes."
                .to_string(),
        );
    }

    if s.has_data() && s.average >= 80.0 {
        out.push("Aumentar el reto con simulacros completos de nivel avanzado.".to_string());
    }

    if let Some(course) = input
        .courses
        .iter()
        .filter(|c| c.percent() < 50.0)
        .min_by(|a, b| {
            a.percent()
                .partial_cmp(&b.percent())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    {
        out.push(format!(
            "Retomar las lecciones pendientes del curso {}.",
            course.title
        ));
    }

    if out.is_empty() {
        out.push(
            "Mantener el ritmo de estudio actual y presentar simulacros periódicamente."
                .to_string(),
        );
    }

    out
}
