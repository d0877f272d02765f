//! Count words in every PDF of a corpus, resumably.
//!
//! Usage:
//!   cargo run --release --bin pdf_wordcount -- --root /data/Mayoral_Pledges
//!   cargo run --release --bin pdf_wordcount -- --hint Mayoral_Pledges \
//!       --search-root /content/drive/MyDrive --search-root /content/drive/Shareddrives
//!   cargo run --release --bin pdf_wordcount -- --root ./corpus --ocr --ocr-languages por+eng
//!
//! Re-running the same command continues where the previous run stopped.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pdf_wordcount::ledger::tail_results;
use pdf_wordcount::{run_located, CorpusLocation, RunConfig, RunSummary};

#[derive(Parser)]
#[command(name = "pdf_wordcount")]
#[command(about = "Resumable word counts for a PDF corpus", long_about = None)]
#[command(version)]
struct Cli {
    /// Corpus root directory. Overrides --hint.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Find the corpus root by a fragment of its directory name.
    #[arg(long, default_value = "Mayoral_Pledges")]
    hint: String,

    /// Directory to search for the hinted corpus root (repeatable).
    #[arg(long = "search-root")]
    search_roots: Vec<PathBuf>,

    /// JSON run configuration; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable the OCR fallback (needs pdftoppm and tesseract).
    #[arg(long)]
    ocr: bool,

    /// Tesseract languages, e.g. por+eng.
    #[arg(long)]
    ocr_languages: Option<String>,

    /// Stop escalating once a strategy reaches this many words.
    #[arg(long)]
    threshold: Option<usize>,

    /// Flush results every N documents.
    #[arg(long)]
    flush_every: Option<usize>,

    /// Flush errors every N failures (default: flush_every / 5).
    #[arg(long)]
    errors_flush_every: Option<usize>,

    /// Also write the run summary as JSON.
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

impl Cli {
    fn run_config(&self) -> pdf_wordcount::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::new(),
        };
        if self.ocr {
            config = config.with_ocr(true);
        }
        if let Some(languages) = &self.ocr_languages {
            config = config.with_ocr_languages(languages.clone());
        }
        if let Some(threshold) = self.threshold {
            config = config.with_ocr_threshold(threshold);
        }
        if let Some(every) = self.flush_every {
            config = config.with_batch_flush_size(every);
        }
        if let Some(every) = self.errors_flush_every {
            config = config.with_error_flush_size(every);
        }
        Ok(config)
    }

    fn location(&self) -> CorpusLocation {
        match &self.root {
            Some(root) => CorpusLocation::Explicit(root.clone()),
            None => CorpusLocation::Hint {
                hint: self.hint.clone(),
                search_roots: if self.search_roots.is_empty() {
                    vec![PathBuf::from(".")]
                } else {
                    self.search_roots.clone()
                },
            },
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match cli.run_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        },
    };

    let summary = match run_located(&cli.location(), &config) {
        Ok(summary) => summary,
        Err(e) if e.is_configuration() => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        },
        Err(e) => {
            eprintln!("Run aborted: {}", e);
            eprintln!("Recorded progress is kept; run again to resume.");
            return ExitCode::FAILURE;
        },
    };

    print_summary(&summary);

    if let Some(path) = &cli.summary_json {
        let written = serde_json::to_string_pretty(&summary)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("Summary saved to: {}", path.display()),
            Err(e) => {
                eprintln!("Failed to write summary {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            },
        }
    }

    ExitCode::SUCCESS
}

fn print_summary(summary: &RunSummary) {
    println!("\n{}", "=".repeat(70));
    println!("Done.");
    println!("{}", "=".repeat(70));
    println!("Root:            {}", summary.corpus_root.display());
    println!("Manifest:        {} documents", summary.manifest_total);
    println!("Already done:    {}", summary.already_done);
    println!("Processed:       {}", summary.processed);
    println!("  succeeded:     {}", summary.succeeded);
    println!("  failed:        {}", summary.failed);
    println!("Remaining:       {}", summary.remaining);
    println!("Results:         {}", summary.results_path.display());
    match &summary.errors_path {
        Some(path) => println!("Errors:          {}", path.display()),
        None => println!("Errors:          none"),
    }
    println!("{}", "=".repeat(70));

    match tail_results(&summary.results_path, 5) {
        Ok(rows) if !rows.is_empty() => {
            println!("{:>8}  {:>10}  file_name", "file_id", "word_count");
            for row in rows {
                println!("{:>8}  {:>10}  {}", row.file_id, row.word_count, row.file_path);
            }
        },
        Ok(_) => {},
        Err(e) => log::debug!("Could not preview results: {}", e),
    }
}
