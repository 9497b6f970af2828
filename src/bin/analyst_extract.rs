use std::{
    fs,
    io::Write,
    path::PathBuf,
};

use analyst_ai::{
    config::Config,
    extraction::Extractor,
    logging,
    processing::{chunking::chunk_text, combine_documents, normalize::TextFilter},
};
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "analyst-extract",
    about = "Extract, clean, and chunk document text without running the server"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the combined text for the given files and directories.
    Extract {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the chunks the combined text would be loaded as.
    Chunks {
        #[command(flatten)]
        input: InputArgs,
        /// Characters per chunk (defaults to CHUNK_SIZE or 500).
        #[arg(long)]
        chunk_size: Option<usize>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Files or directories; directories are walked recursively.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Skip OCR of PDF pages.
    #[arg(long)]
    no_ocr: bool,
    /// Keep all printable Unicode instead of printable ASCII only.
    #[arg(long)]
    unicode: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_stderr_tracing();
    let cli = Cli::parse();
    let mut config = Config::from_env().context("invalid configuration")?;

    match cli.command {
        Command::Extract { input } => {
            let combined = combined_text(&mut config, &input)?;
            std::io::stdout().write_all(combined.as_bytes())?;
        }
        Command::Chunks { input, chunk_size } => {
            let combined = combined_text(&mut config, &input)?;
            let size = chunk_size.unwrap_or(config.chunk_size);
            let chunks = chunk_text(&combined, size)?;
            let mut stdout = std::io::stdout().lock();
            for (index, chunk) in chunks.iter().enumerate() {
                writeln!(
                    stdout,
                    "--- chunk {} of {} ({} chars) ---",
                    index + 1,
                    chunks.len(),
                    chunk.chars().count()
                )?;
                writeln!(stdout, "{chunk:?}")?;
            }
        }
    }

    Ok(())
}

fn combined_text(config: &mut Config, input: &InputArgs) -> Result<String> {
    if input.no_ocr {
        config.ocr_enabled = false;
    }
    if input.unicode {
        config.text_filter = TextFilter::Unicode;
    }
    let extractor = Extractor::from_config(config);

    let mut documents = Vec::new();
    for path in collect_files(&input.paths)? {
        let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        documents.push(extractor.extract_document(&file_name, &bytes));
    }

    let failed = documents.iter().filter(|doc| doc.is_failed()).count();
    if failed > 0 {
        tracing::warn!(failed, total = documents.len(), "Some files could not be extracted");
    }

    let combined = combine_documents(&documents);
    if combined.trim().is_empty() {
        bail!("No valid text to process");
    }
    Ok(combined)
}

fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("{} is not a file or directory", path.display());
        }
    }
    Ok(files)
}
