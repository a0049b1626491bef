use crate::config::Logging;
use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

const FALLBACK_LOG_FILE: &str = "pdf-text-batch.log";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Keeps the file writer's background thread alive; drop it last.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Installs the global subscriber. Console output stays on stdout for the
/// conversion progress, so every log line goes to stderr (and to the log
/// file when enabled).
pub fn init(cfg: &Logging, level_override: Option<&str>) -> Result<LogGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_override.unwrap_or(cfg.level.as_str())));

    let (file, guard) = match log_file_path(cfg) {
        Some(path) => {
            let (layer, guard) = file_layer(&path)?;
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer(cfg.json))
        .with(file)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(LogGuard { _file: guard })
}

pub fn log_file_path(cfg: &Logging) -> Option<PathBuf> {
    if !cfg.write_to_file {
        return None;
    }
    match cfg.file_path.trim() {
        "" => Some(PathBuf::from(FALLBACK_LOG_FILE)),
        p => Some(PathBuf::from(p)),
    }
}

fn stderr_layer<S>(json: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let base = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if json {
        base.json().with_target(true).boxed()
    } else {
        base.with_target(false).boxed()
    }
}

// Appends, so one log file accumulates across runs over the same folder.
fn file_layer<S>(path: &Path) -> Result<(BoxedLayer<S>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .boxed();
    Ok((layer, guard))
}
