//! Shared fixtures for router-level tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use preicfes::config::Config;
use preicfes::report::pdf::{PdfRenderer, RenderError};
use preicfes::state::AppState;
use preicfes::web::auth::{USER_ID_HEADER, USER_ROLE_HEADER};
use preicfes::web::create_router;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n%fake\n";

/// Records every document it is asked to render and returns a fixed PDF.
#[derive(Default)]
pub struct FakeRenderer {
    pub documents: Mutex<Vec<String>>,
    pub fail: bool,
}

impl FakeRenderer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn last_document(&self) -> Option<String> {
        self.documents.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PdfRenderer for FakeRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        self.documents.lock().unwrap().push(html.to_owned());
        if self.fail {
            return Err(RenderError::Timeout(Duration::from_secs(30)));
        }
        Ok(FAKE_PDF.to_vec())
    }
}

/// Never finishes, so only the request deadline ends the call.
pub struct StalledRenderer;

#[async_trait]
impl PdfRenderer for StalledRenderer {
    async fn render(&self, _html: &str) -> Result<Vec<u8>, RenderError> {
        std::future::pending().await
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/preicfes_test".to_owned(),
        port: 0,
        log_level: "debug".to_owned(),
        shutdown_timeout: Duration::from_secs(1),
        chromium_path: "chromium".to_owned(),
        pdf_render_timeout: Duration::from_secs(5),
        max_concurrent_renders: 1,
        filter_cache_ttl: Duration::from_secs(60),
        report_timezone: chrono_tz::America::Bogota,
        report_rate_limit: 60,
    }
}

/// A pool that never connects, for requests rejected before any query.
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://localhost/preicfes_unused")
        .unwrap()
}

pub fn test_app(pool: PgPool, renderer: Arc<FakeRenderer>) -> Router {
    test_app_with(pool, renderer, &test_config())
}

pub fn test_app_with(pool: PgPool, renderer: Arc<dyn PdfRenderer>, config: &Config) -> Router {
    let state = AppState::with_renderer(pool, config, renderer);
    create_router(state)
}

/// Build a request; `caller` is `(user_id, role)`.
pub fn request(
    method: &str,
    uri: &str,
    caller: Option<(i32, &str)>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = caller {
        builder = builder
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_ROLE_HEADER, role);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub mod ids {
    pub const MARIA: i32 = 1;
    pub const ANDRES: i32 = 2;
    pub const LAURA: i32 = 3;
    pub const LECTURA: i32 = 1;
    pub const MATEMATICAS: i32 = 2;
    pub const INGLES: i32 = 3;
    pub const BLANDAS: i32 = 4;
    pub const COURSE_MATH: i32 = 1;
    pub const COURSE_DRAFT: i32 = 2;
}

/// One school, three students, four competencies and a small exam history.
///
/// María (1) is enrolled in the math course and has results in three
/// competencies; Andrés (2) attends the same school; Laura (3) has no school
/// and no results.
pub async fn seed(pool: &PgPool) {
    let statements = [
        "INSERT INTO schools (id, name, city) VALUES (1, 'Colegio San José', 'Bogotá')",
        "INSERT INTO students (id, school_id, full_name, document_id, grade) VALUES
            (1, 1, 'María José Peña', '1002003004', '11'),
            (2, 1, 'Andrés Gómez', NULL, '11'),
            (3, NULL, 'Laura Ruiz', NULL, '10')",
        "INSERT INTO competencies (id, name, slug, is_icfes) VALUES
            (1, 'Lectura Crítica', 'lectura-critica', TRUE),
            (2, 'Matemáticas', 'matematicas', TRUE),
            (3, 'Inglés', 'ingles', TRUE),
            (4, 'Habilidades Blandas', 'habilidades-blandas', FALSE)",
        "INSERT INTO courses (id, competency_id, title, is_published) VALUES
            (1, 2, 'Matemáticas Intensivo', TRUE),
            (2, NULL, 'Curso Borrador', FALSE)",
        "INSERT INTO modules (id, course_id, title, position) VALUES (1, 1, 'Álgebra', 1)",
        "INSERT INTO lessons (id, module_id, title, position) VALUES
            (1, 1, 'Ecuaciones', 1),
            (2, 1, 'Funciones', 2)",
        "INSERT INTO enrollments (student_id, course_id) VALUES (1, 1)",
        "INSERT INTO lesson_progress (student_id, lesson_id, completed, completed_at)
            VALUES (1, 1, TRUE, now() - interval '2 days')",
        "INSERT INTO exams (id, competency_id, course_id, title, difficulty, question_count, time_limit_minutes, is_simulacro) VALUES
            (1, 1, NULL, 'Simulacro Lectura 1', 'intermediate', 20, 30, TRUE),
            (2, 2, 1, 'Álgebra básica', 'basic', 10, NULL, FALSE),
            (3, 2, 1, 'Geometría', 'advanced', 10, 20, FALSE),
            (4, 3, NULL, 'Reading test', 'intermediate', 15, NULL, FALSE)",
        "INSERT INTO exam_results (exam_id, student_id, score, total_questions, time_spent_seconds, passed, completed_at) VALUES
            (1, 1, 14, 20, 1500, TRUE, now() - interval '20 days'),
            (2, 1, 8, 10, 600, TRUE, now() - interval '10 days'),
            (3, 1, 6, 10, 900, TRUE, now() - interval '3 days'),
            (4, 1, 12, 15, NULL, TRUE, now() - interval '1 day'),
            (1, 2, 10, 20, 1200, FALSE, now() - interval '15 days'),
            (2, 2, 5, 10, 400, FALSE, now() - interval '5 days')",
        "INSERT INTO achievements (id, name, description, icon, points) VALUES
            (1, 'Primer simulacro', 'Completaste tu primer simulacro', '🏅', 50),
            (2, 'Racha de estudio', 'Siete días seguidos', NULL, 30)",
        "INSERT INTO user_achievements (student_id, achievement_id, unlocked_at)
            VALUES (1, 1, now() - interval '20 days')",
    ];

    for sql in statements {
        sqlx::query(sql).execute(pool).await.unwrap();
    }
}
