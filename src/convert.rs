use crate::{
    config::Config,
    engine::{Engine, PageText},
    util::sha256_hex,
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub fn page_marker(number: u32) -> String {
    format!("--- Page {number} ---")
}

/// Assembles the converted document: one marker line per page followed by
/// its text, page blocks separated by a blank line.
pub fn render_document(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|p| format!("{}\n{}\n", page_marker(p.number), p.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConvertOutcome {
    Converted {
        pages: u32,
        bytes: u64,
        sha256: String,
    },
    Failed {
        message: String,
    },
}

impl ConvertOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ConvertOutcome::Converted { .. })
    }
}

pub struct Converter<E: Engine> {
    cfg: Config,
    engine: E,
}

impl<E: Engine> Converter<E> {
    pub fn new(cfg: &Config, engine: E) -> Self {
        Self {
            cfg: cfg.clone(),
            engine,
        }
    }

    /// Converts one PDF. Every failure comes back as
    /// `ConvertOutcome::Failed` and leaves `dest` as it was.
    pub fn convert(&self, source: &Path, dest: &Path) -> ConvertOutcome {
        self.convert_observed(source, dest, |_| {})
    }

    /// Like [`Converter::convert`], calling `on_pages` with the page count
    /// once the document has been parsed and before anything is written.
    pub fn convert_observed<F: FnMut(usize)>(
        &self,
        source: &Path,
        dest: &Path,
        on_pages: F,
    ) -> ConvertOutcome {
        let started = Instant::now();
        match self.try_convert(source, dest, on_pages) {
            Ok(outcome) => {
                debug!(
                    "converted {} -> {} in {:?}",
                    source.display(),
                    dest.display(),
                    started.elapsed()
                );
                outcome
            }
            Err(err) => {
                warn!("conversion failed for {}: {:#}", source.display(), err);
                ConvertOutcome::Failed {
                    message: format!("{err:#}"),
                }
            }
        }
    }

    fn try_convert<F: FnMut(usize)>(
        &self,
        source: &Path,
        dest: &Path,
        mut on_pages: F,
    ) -> Result<ConvertOutcome> {
        let bytes = read_source(&self.cfg, source)?;

        let pages = self
            .engine
            .extract_pages(&bytes)
            .with_context(|| format!("{}: {}", self.engine.name(), source.display()))?;
        if pages.is_empty() {
            bail!("document has zero pages");
        }
        debug!("extracted {} pages from {}", pages.len(), source.display());
        on_pages(pages.len());

        let text = render_document(&pages);
        write_text(dest, &text)?;

        Ok(ConvertOutcome::Converted {
            pages: pages.len() as u32,
            bytes: text.len() as u64,
            sha256: sha256_hex(text.as_bytes()),
        })
    }
}

fn read_source(cfg: &Config, source: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(source).with_context(|| format!("open {}", source.display()))?;
    let size = f.metadata().with_context(|| "metadata")?.len();
    if size > cfg.limits.max_input_file_bytes {
        bail!(
            "input exceeds max_input_file_bytes ({} > {})",
            size,
            cfg.limits.max_input_file_bytes
        );
    }
    let mut buf = Vec::with_capacity(size as usize);
    f.read_to_end(&mut buf)
        .with_context(|| format!("read {}", source.display()))?;
    Ok(buf)
}

/// Writes into a temporary sibling and renames it over `dest`, so a failed
/// write never leaves a partial file or disturbs an existing one.
fn write_text(dest: &Path, text: &str) -> Result<()> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("write {}: create temp file", dest.display()))?;
    tmp.write_all(text.as_bytes())
        .with_context(|| format!("write {}", dest.display()))?;
    set_text_permissions(&tmp)?;
    tmp.persist(dest)
        .map_err(|e| e.error)
        .with_context(|| format!("write {}", dest.display()))?;
    Ok(())
}

// Temp files are created 0600; outputs should look like a plain `fs::write`.
#[cfg(unix)]
fn set_text_permissions(tmp: &NamedTempFile) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tmp.as_file()
        .set_permissions(std::fs::Permissions::from_mode(0o644))
        .with_context(|| "set output permissions")
}

#[cfg(not(unix))]
fn set_text_permissions(_tmp: &NamedTempFile) -> Result<()> {
    Ok(())
}
