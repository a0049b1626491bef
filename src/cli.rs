use crate::{
    batch::{self, BatchOutcome},
    config::Config,
    convert::{ConvertOutcome, Converter},
    engine::{self, Engine},
    logging, scan,
};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_CONFIG_FILE: &str = "pdf-text-batch.toml";

#[derive(Parser, Debug)]
#[command(name = "pdf-text-batch")]
#[command(about = "Convert every PDF in a folder to a page-delimited .txt file")]
pub struct Args {
    /// Defaults to `run` on the configured target directory.
    #[command(subcommand)]
    pub cmd: Option<Command>,

    /// Path to config TOML. If omitted, uses ./pdf-text-batch.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert every PDF in the target directory.
    Run {
        /// Target directory (default: paths.target_dir, "PDF Converter").
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Keep filesystem enumeration order instead of sorting by name.
        #[arg(long)]
        no_sort: bool,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Convert a single PDF.
    Convert {
        #[arg(long)]
        input: PathBuf,
        /// Defaults to the input path with a .txt extension.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the PDFs a run would convert, without converting.
    List {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref())? {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let _guard = logging::init(&cfg.logging, args.log_level.as_deref())?;

    let stdout = std::io::stdout();
    let mut console = stdout.lock();
    match &args.cmd {
        None => run(&cfg, None, false, false, &mut console),
        Some(Command::Run { dir, no_sort, json }) => {
            run(&cfg, dir.as_deref(), *no_sort, *json, &mut console)
        }
        Some(Command::Convert { input, output }) => {
            let engine = engine::from_config(&cfg)?;
            convert(&cfg, engine, input, output.as_deref(), &mut console)
        }
        Some(Command::List { dir }) => list(&cfg, dir.as_deref(), &mut console),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(p) = user {
        if !p.exists() {
            return Err(anyhow!("config file not found: {}", p.display()));
        }
        return Ok(Some(p.to_path_buf()));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    if default.exists() {
        Ok(Some(default))
    } else {
        Ok(None)
    }
}

fn target_dir(cfg: &Config, user: Option<&Path>) -> PathBuf {
    user.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.target_dir))
}

fn run<W: Write>(
    cfg: &Config,
    dir: Option<&Path>,
    no_sort: bool,
    json: bool,
    console: &mut W,
) -> Result<()> {
    let mut cfg = cfg.clone();
    if no_sort {
        cfg.scan.sort = false;
    }
    if json {
        cfg.output.summary_json = true;
    }

    let dir = target_dir(&cfg, dir);
    let engine = engine::from_config(&cfg)?;
    let converter = Converter::new(&cfg, engine);

    match batch::run_batch(&cfg, &converter, &dir, console)? {
        BatchOutcome::DirectoryMissing { dir } => {
            warn!("target directory missing: {}", dir.display())
        }
        BatchOutcome::NoFilesFound { dir } => info!("no PDFs in {}", dir.display()),
        BatchOutcome::Completed(summary) => {
            info!("{}/{} converted", summary.succeeded, summary.found)
        }
    }
    Ok(())
}

/// Single-file conversion. A failed conversion is an `Err`, which `main`
/// turns into exit status 1.
fn convert<E: Engine, W: Write>(
    cfg: &Config,
    engine: E,
    input: &Path,
    output: Option<&Path>,
    console: &mut W,
) -> Result<()> {
    validate_input(input)?;

    let dest = output
        .map(PathBuf::from)
        .unwrap_or_else(|| scan::text_path_for(input));
    let converter = Converter::new(cfg, engine);

    match converter.convert(input, &dest) {
        ConvertOutcome::Converted { pages, .. } => {
            writeln!(
                console,
                "[OK] {} -> {} ({pages} pages)",
                input.display(),
                dest.display()
            )?;
            Ok(())
        }
        ConvertOutcome::Failed { message } => {
            Err(anyhow!("converting {}: {message}", input.display()))
        }
    }
}

fn list<W: Write>(cfg: &Config, dir: Option<&Path>, console: &mut W) -> Result<()> {
    let dir = target_dir(cfg, dir);
    if !dir.is_dir() {
        return Err(anyhow!("target directory not found: {}", dir.display()));
    }
    let entries = scan::find_pdfs(&dir, cfg.scan.sort)?;
    writeln!(
        console,
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "dir": dir,
            "files": entries,
        }))?
    )?;
    Ok(())
}

fn validate_input(input: &Path) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }

    if input.extension().is_some() {
        if !scan::is_pdf(input) {
            return Err(anyhow!("input is not a PDF: {}", input.display()));
        }
    } else {
        warn!("input has no extension; assuming PDF: {}", input.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PageText;

    /// Treats any file starting with `%PDF` as a one-page document.
    struct OnePage;

    impl Engine for OnePage {
        fn name(&self) -> &'static str {
            "one-page"
        }

        fn extract_pages(&self, pdf: &[u8]) -> Result<Vec<PageText>> {
            if !pdf.starts_with(b"%PDF") {
                return Err(anyhow!("invalid pdf"));
            }
            Ok(vec![PageText {
                number: 1,
                text: "body".into(),
            }])
        }
    }

    fn console_text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn no_subcommand_means_run() {
        let args = Args::try_parse_from(["pdf-text-batch"]).unwrap();
        assert!(args.cmd.is_none());

        let args =
            Args::try_parse_from(["pdf-text-batch", "run", "--dir", "in", "--no-sort"]).unwrap();
        assert!(matches!(
            args.cmd,
            Some(Command::Run { dir: Some(_), no_sort: true, json: false })
        ));
    }

    #[test]
    fn convert_defaults_output_to_txt_sibling() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("Report.PDF");
        std::fs::write(&input, b"%PDF-1.5").unwrap();
        let mut out = Vec::new();

        convert(&Config::default(), OnePage, &input, None, &mut out).unwrap();

        let dest = tmp.path().join("Report.txt");
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "--- Page 1 ---\nbody\n");
        assert!(console_text(out).starts_with("[OK] "));
    }

    #[test]
    fn convert_honours_explicit_output() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("a.pdf");
        let dest = tmp.path().join("elsewhere.txt");
        std::fs::write(&input, b"%PDF-1.5").unwrap();

        convert(&Config::default(), OnePage, &input, Some(&dest), &mut Vec::new()).unwrap();

        assert!(dest.is_file());
        assert!(!tmp.path().join("a.txt").exists());
    }

    #[test]
    fn failed_convert_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("bad.pdf");
        std::fs::write(&input, b"garbage").unwrap();

        let err = convert(&Config::default(), OnePage, &input, None, &mut Vec::new()).unwrap_err();

        assert!(format!("{err:#}").contains("invalid pdf"));
        assert!(!tmp.path().join("bad.txt").exists());
    }

    #[test]
    fn convert_rejects_non_pdf_and_missing_input() {
        let tmp = tempfile::tempdir().unwrap();
        let notes = tmp.path().join("notes.txt");
        std::fs::write(&notes, b"%PDF-1.5").unwrap();

        let err = convert(&Config::default(), OnePage, &notes, None, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("not a PDF"));
        assert_eq!(std::fs::read(&notes).unwrap(), b"%PDF-1.5");

        let missing = tmp.path().join("gone.pdf");
        assert!(convert(&Config::default(), OnePage, &missing, None, &mut Vec::new()).is_err());
    }

    #[test]
    fn input_without_extension_is_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("scan");
        std::fs::write(&input, b"%PDF-1.5").unwrap();

        convert(&Config::default(), OnePage, &input, None, &mut Vec::new()).unwrap();

        assert!(tmp.path().join("scan.txt").is_file());
    }

    #[test]
    fn list_prints_sources_and_destinations() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("b.PDF"), b"x").unwrap();
        std::fs::write(tmp.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(tmp.path().join("c.txt"), b"x").unwrap();
        let mut out = Vec::new();

        list(&Config::default(), Some(tmp.path()), &mut out).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let files = json["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        let dest_a = tmp.path().join("a.txt").display().to_string();
        let dest_b = tmp.path().join("b.txt").display().to_string();
        assert!(files[0]["source"].as_str().unwrap().ends_with("a.pdf"));
        assert_eq!(files[0]["dest"].as_str().unwrap(), dest_a);
        assert!(files[1]["source"].as_str().unwrap().ends_with("b.PDF"));
        assert_eq!(files[1]["dest"].as_str().unwrap(), dest_b);
        assert!(!tmp.path().join("a.txt").exists());
    }

    #[test]
    fn list_fails_on_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let mut out = Vec::new();

        let err = list(&Config::default(), Some(&tmp.path().join("nope")), &mut out).unwrap_err();

        assert!(err.to_string().contains("not found"));
        assert!(out.is_empty());
    }

    #[test]
    fn run_on_missing_directory_still_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let mut out = Vec::new();

        run(&Config::default(), Some(&tmp.path().join("nope")), false, false, &mut out).unwrap();

        assert!(console_text(out).contains("not found"));
    }
}
