use crate::convert::ConvertOutcome;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub target_dir: String,
    pub found: usize,
    pub succeeded: usize,
    pub started: String,
    pub finished: String,
    pub files: Vec<FileReport>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.found - self.succeeded
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub source: String,
    pub dest: String,
    #[serde(flatten)]
    pub outcome: ConvertOutcome,
}
