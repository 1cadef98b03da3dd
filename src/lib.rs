//! ICFES progress-report service: scoring, charting and PDF rendering of
//! student exam history, served over HTTP.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod report;
pub mod state;
pub mod utils;
pub mod web;
