//! HTML to PDF conversion through a headless Chromium process.
//!
//! Every render launches its own browser with a throwaway profile directory,
//! so concurrent renders share nothing but the binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::utils::fmt_duration;

const PDF_SIGNATURE: &[u8] = b"%PDF-";
const STDERR_TAIL_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to prepare render workspace: {0}")]
    Workspace(#[source] std::io::Error),
    #[error("failed to launch {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("render timed out after {0:?}")]
    Timeout(Duration),
    #[error("browser exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("browser produced no valid PDF: {0}")]
    InvalidOutput(String),
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Convert a complete HTML document into PDF bytes.
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    binary: PathBuf,
    timeout: Duration,
}

impl ChromiumRenderer {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    fn command(&self, workspace: &Path, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg("--no-pdf-header-footer")
            .arg("--run-all-compositor-stages-before-draw")
            .arg(format!(
                "--user-data-dir={}",
                workspace.join("profile").display()
            ))
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", input.display()))
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text.to_string();
    }
    text.chars().skip(count - STDERR_TAIL_CHARS).collect()
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let start = Instant::now();
        // Removed on drop, including on every error path below.
        let workspace = tempfile::Builder::new()
            .prefix("report-render-")
            .tempdir()
            .map_err(RenderError::Workspace)?;
        let input = workspace.path().join("report.html");
        let output = workspace.path().join("report.pdf");
        tokio::fs::write(&input, html)
            .await
            .map_err(RenderError::Workspace)?;

        let child = self
            .command(workspace.path(), &input, &output)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                binary: self.binary.display().to_string(),
                source,
            })?;

        // Dropping the future on timeout kills the browser (kill_on_drop).
        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(timeout = fmt_duration(self.timeout), "PDF render timed out");
                RenderError::Timeout(self.timeout)
            })?
            .map_err(|source| RenderError::Spawn {
                binary: self.binary.display().to_string(),
                source,
            })?;

        if !result.status.success() {
            return Err(RenderError::Exit {
                status: result.status.to_string(),
                stderr: stderr_tail(&result.stderr),
            });
        }

        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|e| RenderError::InvalidOutput(e.to_string()))?;
        if !bytes.starts_with(PDF_SIGNATURE) {
            return Err(RenderError::InvalidOutput(format!(
                "missing PDF signature ({} bytes)",
                bytes.len()
            )));
        }

        debug!(
            bytes = bytes.len(),
            duration = fmt_duration(start.elapsed()),
            "Chromium render finished"
        );
        Ok(bytes)
    }
}
