use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use bias_scan_core::{
    report::{render_history, render_report, OutputFormat},
    BiasScanner, BuiltinPatterns, FilePatternRepository, HistoryStore, Notice,
    PatternRepository,
};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod settings;

use settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "bias-scan",
    author,
    version,
    about = "Flag biased phrasing in text and score it from 0 to 10"
)]
struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Pattern table to use instead of the built-in one
    #[arg(long, value_name = "FILE", global = true)]
    patterns: Option<PathBuf>,

    /// Where analysis history is stored
    #[arg(long = "history-file", value_name = "FILE", global = true)]
    history_file: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan files, or stdin when none are given
    Scan {
        files: Vec<PathBuf>,
        /// Emit the analysis as JSON
        #[arg(long)]
        json: bool,
        /// Do not record the analysis in history
        #[arg(long = "no-history")]
        no_history: bool,
    },
    /// Show recent analyses
    History {
        #[arg(long)]
        json: bool,
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// List the active pattern table
    ListPatterns {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// Remove all stored analyses
    Clear,
    /// Show one stored analysis in full
    Show {
        /// Position in the history listing, starting at 1
        index: usize,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(path) = cli.patterns.clone() {
        settings.patterns_file = Some(path);
    }
    if let Some(path) = cli.history_file.clone() {
        settings.history_file = path;
    }
    if cli.no_color {
        settings.color = false;
    }
    if !settings.color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Scan {
            files,
            json,
            no_history,
        } => scan(&settings, &files, format(json), no_history),
        Commands::History { json, action } => match action {
            Some(HistoryAction::Clear) => clear_history(&settings),
            Some(HistoryAction::Show { index, json: show_json }) => {
                show_entry(&settings, index, format(json || show_json))
            }
            None => show_history(&settings, format(json)),
        },
        Commands::ListPatterns { json } => list_patterns(&settings, json),
    }
}

fn format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    }
}

fn load_patterns(settings: &Settings) -> Result<Vec<bias_scan_core::Pattern>> {
    match &settings.patterns_file {
        Some(path) => FilePatternRepository::new(path)
            .load_patterns()
            .with_context(|| format!("failed to load patterns from {}", path.display())),
        None => BuiltinPatterns.load_patterns(),
    }
}

fn history_store(settings: &Settings) -> HistoryStore {
    HistoryStore::with_capacity(&settings.history_file, settings.history_capacity)
}

fn read_inputs(files: &[PathBuf]) -> Result<Vec<(String, String)>> {
    if files.is_empty() {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        return Ok(vec![("<stdin>".to_string(), input)]);
    }
    files
        .iter()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))
                .map(|text| (path.display().to_string(), text))
        })
        .collect()
}

fn scan(settings: &Settings, files: &[PathBuf], format: OutputFormat, no_history: bool) -> Result<()> {
    let inputs = read_inputs(files)?;
    if inputs.iter().any(|(_, text)| text.trim().is_empty()) {
        bail!("{}", Notice::empty_input());
    }
    let scanner = BiasScanner::with_patterns(load_patterns(settings)?)?;
    let store = history_store(settings);

    // Several inputs in JSON mode print one array instead of one document each.
    let json_array = format == OutputFormat::Json && inputs.len() > 1;
    let mut results = Vec::with_capacity(inputs.len());
    for (source, text) in inputs {
        let result = scanner.scan(&text);
        info!(%source, score = result.bias_score, phrases = result.flagged_phrases.len(), "analysis complete");
        if !json_array {
            print!("{}", render_report(&text, &result, format, settings.color)?);
            if format == OutputFormat::Json {
                println!();
            }
        }
        eprintln!("{}", Notice::analysis_complete(&result));
        results.push(result);
    }
    if json_array {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    if !no_history {
        for result in results {
            store.append(result)?;
        }
    }
    Ok(())
}

fn show_entry(settings: &Settings, index: usize, format: OutputFormat) -> Result<()> {
    let history = history_store(settings).load();
    let entry = index
        .checked_sub(1)
        .and_then(|idx| history.get(idx))
        .with_context(|| {
            format!(
                "no analysis #{index} in history ({} stored at {})",
                history.len(),
                settings.history_file.display()
            )
        })?;
    // The analysed text is not stored, so only the result is rendered.
    print!("{}", render_report("", entry, format, settings.color)?);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn show_history(settings: &Settings, format: OutputFormat) -> Result<()> {
    let history = history_store(settings).load();
    print!("{}", render_history(&history, format)?);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn clear_history(settings: &Settings) -> Result<()> {
    history_store(settings).clear()?;
    eprintln!("{}", Notice::history_cleared());
    Ok(())
}

fn list_patterns(settings: &Settings, json: bool) -> Result<()> {
    let patterns = load_patterns(settings)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&patterns)?);
        return Ok(());
    }

    println!(
        "{} pattern(s) loaded from {}",
        patterns.len(),
        source_label(settings.patterns_file.as_deref())
    );
    for pattern in patterns {
        println!(
            "- [{severity:6}] {keywords}",
            severity = pattern.severity.to_string(),
            keywords = pattern.keywords.join(", ")
        );
        println!("    {}", pattern.explanation);
    }
    Ok(())
}

fn source_label(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in table".to_string())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}
