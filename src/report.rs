//! Optional JSON report written next to the GIF

use serde::{Deserialize, Serialize};

use crate::collector::{ShiftReport, ShiftSource};
use crate::Result;

/// `{ url, cls, entries }` record describing what shifted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub url: String,
    pub cls: f64,
    pub entries: Vec<ShiftSource>,
}

impl ReportArtifact {
    pub fn new(url: &str, report: &ShiftReport) -> Self {
        Self {
            url: url.to_string(),
            cls: report.cumulative_score,
            entries: report.sources.clone(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
