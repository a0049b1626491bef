pub mod pdf_lopdf;
pub mod types;

use crate::config::Config;
use anyhow::{anyhow, Result};

pub use pdf_lopdf::LopdfEngine;
pub use types::PageText;

/// PDF-parsing collaborator: turns raw PDF bytes into per-page text.
pub trait Engine {
    fn name(&self) -> &'static str;

    /// Pages in document order, numbered from 1. A page without extractable
    /// text yields an empty string, not an error.
    fn extract_pages(&self, pdf: &[u8]) -> Result<Vec<PageText>>;
}

pub fn from_config(cfg: &Config) -> Result<LopdfEngine> {
    match cfg.engine.backend.as_str() {
        "lopdf" => Ok(LopdfEngine::new()),
        other => Err(anyhow!("unsupported engine.backend: {other}")),
    }
}
