use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl ScanEntry {
    pub fn new(source: PathBuf) -> Self {
        let dest = text_path_for(&source);
        Self { source, dest }
    }

    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// Same name, `.txt` extension.
pub fn text_path_for(source: &Path) -> PathBuf {
    source.with_extension("txt")
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Immediate (non-recursive) regular files in `dir` with a `pdf` extension,
/// any case. Each directory entry is visited once, so a file never shows up
/// twice regardless of filesystem case sensitivity.
pub fn find_pdfs(dir: &Path, sort: bool) -> Result<Vec<ScanEntry>> {
    let rd = std::fs::read_dir(dir).with_context(|| format!("read_dir {}", dir.display()))?;

    let mut out = Vec::new();
    for entry in rd {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!("skipping unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        if !is_pdf(&path) {
            continue;
        }
        // Follows symlinks, so a link to a PDF counts as a file.
        if !path.is_file() {
            debug!("skipping non-file {}", path.display());
            continue;
        }
        out.push(ScanEntry::new(path));
    }

    if sort {
        out.sort_by(|a, b| a.source.file_name().cmp(&b.source.file_name()));
    }
    Ok(out)
}
