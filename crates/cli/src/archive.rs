//! Append-only JSON-lines log of completed reports.

use std::path::{Path, PathBuf};

use pipeline::{AnalysisResult, PipelineState, RunId, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to write archive {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode archive record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One archived report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub run_id: RunId,
    pub started_at: Timestamp,
    pub recorded_at: Timestamp,
    pub company: String,
    pub industry: String,
    pub competitor: String,
    pub report: String,
}

impl ArchiveRecord {
    pub fn new(state: &PipelineState, result: &AnalysisResult) -> Self {
        let inputs = state.inputs();
        Self {
            run_id: state.run_id(),
            started_at: state.started_at(),
            recorded_at: Timestamp::now(),
            company: inputs.company.to_string(),
            industry: inputs.industry.to_string(),
            competitor: inputs.competitor.to_string(),
            report: result.report.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportArchive {
    path: PathBuf,
}

impl ReportArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `record` as a single line, creating the file if needed.
    pub async fn append(&self, record: &ArchiveRecord) -> Result<(), ArchiveError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let io = |source| ArchiveError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io)?;
        file.write_all(&line).await.map_err(io)?;
        file.flush().await.map_err(io)?;
        Ok(())
    }
}
