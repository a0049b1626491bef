use crate::{
    config::Config,
    convert::{ConvertOutcome, Converter},
    engine::Engine,
    report::{FileReport, RunSummary},
    scan::{self, ScanEntry},
    util::{absolute_display, timestamp},
};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone)]
pub enum BatchOutcome {
    DirectoryMissing { dir: PathBuf },
    NoFilesFound { dir: PathBuf },
    Completed(RunSummary),
}

/// Converts every PDF in `dir`, writing progress and the summary to
/// `console`. Per-file failures are reported and counted, never returned;
/// the `Err` path is reserved for console or directory-listing I/O errors.
pub fn run_batch<E: Engine, W: Write>(
    cfg: &Config,
    converter: &Converter<E>,
    dir: &Path,
    console: &mut W,
) -> Result<BatchOutcome> {
    if !dir.is_dir() {
        writeln!(console, "Error: Folder '{}' not found!", dir.display())?;
        return Ok(BatchOutcome::DirectoryMissing {
            dir: dir.to_path_buf(),
        });
    }

    let entries = scan::find_pdfs(dir, cfg.scan.sort)?;
    if entries.is_empty() {
        writeln!(console, "No PDF files found in '{}'", dir.display())?;
        return Ok(BatchOutcome::NoFilesFound {
            dir: dir.to_path_buf(),
        });
    }

    info!("batch dir={} files={}", dir.display(), entries.len());
    writeln!(console, "Found {} PDF file(s) to convert\n", entries.len())?;

    let started = timestamp();
    let mut succeeded = 0usize;
    let mut files = Vec::with_capacity(entries.len());
    // `a.pdf` and `a.PDF` both map to `a.txt` on case-sensitive filesystems.
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();

    for entry in &entries {
        writeln!(console, "Converting: {}", entry.file_name())?;

        let mut parsed_pages = None;
        let outcome = match claimed.get(&entry.dest) {
            Some(owner) => ConvertOutcome::Failed {
                message: format!(
                    "output {} already written for {}",
                    entry.dest.display(),
                    owner.display()
                ),
            },
            None => converter.convert_observed(&entry.source, &entry.dest, |n| {
                parsed_pages = Some(n)
            }),
        };

        if let Some(n) = parsed_pages {
            writeln!(console, "  Processing {n} pages...")?;
        }

        match &outcome {
            ConvertOutcome::Converted { pages, .. } => {
                succeeded += 1;
                claimed.insert(entry.dest.clone(), entry.source.clone());
                writeln!(console, "  [OK] Successfully converted ({pages} pages)")?;
            }
            ConvertOutcome::Failed { message } => {
                writeln!(console, "  [ERROR] Error converting file: {message}")?;
            }
        }
        writeln!(console)?;

        files.push(file_report(entry, outcome));
    }

    let summary = RunSummary {
        target_dir: absolute_display(dir),
        found: entries.len(),
        succeeded,
        started,
        finished: timestamp(),
        files,
    };
    info!(
        "batch done found={} succeeded={} failed={}",
        summary.found,
        summary.succeeded,
        summary.failed()
    );

    print_summary(cfg, &summary, console)?;

    if cfg.output.write_report_json {
        let path = dir.join(&cfg.output.report_filename);
        if let Err(err) = write_report(&path, &summary) {
            warn!("failed to write run report {}: {:#}", path.display(), err);
        }
    }

    Ok(BatchOutcome::Completed(summary))
}

fn file_report(entry: &ScanEntry, outcome: ConvertOutcome) -> FileReport {
    FileReport {
        source: entry.source.display().to_string(),
        dest: entry.dest.display().to_string(),
        outcome,
    }
}

pub fn print_summary<W: Write>(cfg: &Config, summary: &RunSummary, console: &mut W) -> Result<()> {
    if cfg.output.summary_json {
        writeln!(
            console,
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "target_dir": summary.target_dir,
                "found": summary.found,
                "succeeded": summary.succeeded,
                "failed": summary.failed(),
            }))?
        )?;
        return Ok(());
    }

    writeln!(console, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(console, "Conversion complete!")?;
    writeln!(
        console,
        "Successfully converted: {}/{} files",
        summary.succeeded, summary.found
    )?;
    writeln!(console, "Text files saved in: {}", summary.target_dir)?;
    Ok(())
}

fn write_report(path: &Path, summary: &RunSummary) -> Result<()> {
    let raw = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, raw).with_context(|| format!("write {}", path.display()))
}
