//! Read-only queries against the platform's reporting tables.

pub mod achievements;
pub mod competencies;
pub mod courses;
pub mod exam_results;
pub mod models;
pub mod progress;
pub mod students;
