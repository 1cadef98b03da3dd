use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ICFES progress-report service.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = TracingFormat::default())]
    pub tracing: TracingFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    Pretty,
    Json,
}

impl Default for TracingFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            TracingFormat::Pretty
        } else {
            TracingFormat::Json
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Render a report offline and write it to a file
    Render {
        #[command(subcommand)]
        report: RenderTarget,
        /// Output path; defaults to the attachment filename in the working directory
        #[arg(long, global = true)]
        out: Option<PathBuf>,
        /// Write the HTML document instead of converting it to PDF
        #[arg(long, global = true)]
        html: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum RenderTarget {
    /// Single-competency report with control chart
    Competency {
        #[arg(long)]
        student: i32,
        #[arg(long)]
        competency: i32,
    },
    /// Overall progress report with radar chart and achievements
    Progress {
        #[arg(long)]
        student: i32,
        #[arg(long)]
        course: Option<i32>,
    },
}
