use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use optforge_codegen::config::GeneratorConfig;
use optforge_codegen::render::{DiagnosticFormat, format_diagnostics, summary_line};
use optforge_codegen::validate::describe;
use optforge_codegen::{CancellationToken, Pipeline, PipelineOutput};
use optforge_core::{DeclarationSet, Diagnostic, DiagnosticCode, Severity};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit code used when any Error diagnostic was reported.
const EXIT_DIAGNOSTIC_ERRORS: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "optforge", version = PACKAGE_VERSION)]
#[command(about = "Generate clap option parsers from annotated declarations")]
struct Cli {
    /// Log pipeline activity to stderr (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one Rust source file per declaration file.
    Generate(GenerateArgs),
    /// Report diagnostics without writing any output.
    Check(CheckArgs),
    /// List every diagnostic code with its default severity.
    Rules(RulesArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Declaration files (`.json`, `.yaml` or `.yml`).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Generator configuration YAML (severity overrides, emit options).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of parallel jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Diagnostic output format.
    #[arg(long, value_enum, default_value_t = DiagnosticFormat::Human)]
    format: DiagnosticFormat,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Directory receiving `<stem>.rs` for every input.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[command(flatten)]
    input: InputArgs,
}

#[derive(Debug, Args)]
struct RulesArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = DiagnosticFormat::Human)]
    format: DiagnosticFormat,
}

/// Diagnostics of one input file, as printed in JSON and YAML output.
#[derive(Debug, Serialize)]
struct FileReport<'a> {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    diagnostics: &'a [Diagnostic],
}

#[derive(Debug, Serialize)]
struct RuleEntry {
    code: DiagnosticCode,
    default_severity: Severity,
    title: &'static str,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Check(args) => run_check(args),
        Command::Rules(args) => run_rules(args).map(|()| false),
    };

    match result {
        Ok(false) => {}
        Ok(true) => std::process::exit(EXIT_DIAGNOSTIC_ERRORS),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns `true` when any Error diagnostic was reported.
fn run_generate(args: GenerateArgs) -> Result<bool, String> {
    let stems = output_stems(&args.input.inputs)?;
    let outcomes = run_pipeline(&args.input)?;

    fs::create_dir_all(&args.out_dir).map_err(|err| {
        format!(
            "Failed to create output directory '{}': {err}",
            args.out_dir.display()
        )
    })?;

    let mut written = Vec::with_capacity(outcomes.len());
    for ((input, output), stem) in outcomes.iter().zip(&stems) {
        let path = args.out_dir.join(format!("{stem}.rs"));
        fs::write(&path, output.source.as_bytes())
            .map_err(|err| format!("Failed to write '{}': {err}", path.display()))?;
        debug!(input = %input.display(), output = %path.display(), "wrote generated source");
        written.push(path);
    }

    let reports: Vec<FileReport<'_>> = outcomes
        .iter()
        .zip(&written)
        .map(|((input, output), path)| FileReport {
            input: input.display().to_string(),
            output: Some(path.display().to_string()),
            diagnostics: output.diagnostics(),
        })
        .collect();
    print_reports(&reports, args.input.format)?;

    if matches!(args.input.format, DiagnosticFormat::Human) {
        println!(
            "Generated {} file(s) into '{}'.",
            written.len(),
            args.out_dir.display()
        );
    }

    Ok(outcomes.iter().any(|(_, output)| output.has_errors()))
}

/// Returns `true` when any Error diagnostic was reported.
fn run_check(args: CheckArgs) -> Result<bool, String> {
    let outcomes = run_pipeline(&args.input)?;

    let reports: Vec<FileReport<'_>> = outcomes
        .iter()
        .map(|(input, output)| FileReport {
            input: input.display().to_string(),
            output: None,
            diagnostics: output.diagnostics(),
        })
        .collect();
    print_reports(&reports, args.input.format)?;

    if matches!(args.input.format, DiagnosticFormat::Human) {
        let all: Vec<Diagnostic> = outcomes
            .iter()
            .flat_map(|(_, output)| output.diagnostics().iter().cloned())
            .collect();
        println!("Checked {} file(s): {}.", outcomes.len(), summary_line(&all));
    }

    Ok(outcomes.iter().any(|(_, output)| output.has_errors()))
}

fn run_rules(args: RulesArgs) -> Result<(), String> {
    let entries: Vec<RuleEntry> = DiagnosticCode::ALL
        .into_iter()
        .map(|code| {
            let (title, default_severity) = describe(code);
            RuleEntry {
                code,
                default_severity,
                title,
            }
        })
        .collect();

    let text = match args.format {
        DiagnosticFormat::Human => entries
            .iter()
            .map(|entry| {
                format!(
                    "{}  {:<8} {}\n",
                    entry.code,
                    entry.default_severity.to_string(),
                    entry.title
                )
            })
            .collect(),
        DiagnosticFormat::Json => serde_json::to_string_pretty(&entries)
            .map_err(|e| format!("JSON serialization failed: {e}"))?,
        DiagnosticFormat::Yaml => {
            serde_yaml::to_string(&entries).map_err(|e| format!("YAML serialization failed: {e}"))?
        }
    };
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Runs every input through one shared pipeline, in parallel.
///
/// Results keep the order of `args.inputs`.
fn run_pipeline(args: &InputArgs) -> Result<Vec<(PathBuf, PipelineOutput)>, String> {
    let config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    let pipeline = Pipeline::new(config);
    let cancel = CancellationToken::new();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;

    let results: Vec<Result<(PathBuf, PipelineOutput), String>> = pool.install(|| {
        args.inputs
            .par_iter()
            .map(|input| {
                let set = load_declarations(input)?;
                let output = pipeline
                    .run(&set, &cancel)
                    .map_err(|err| format!("{}: {err}", input.display()))?;
                Ok((input.clone(), output))
            })
            .collect()
    });

    let stats = pipeline.stats();
    info!(
        inputs = args.inputs.len(),
        extraction_hits = stats.extraction.hits,
        fragment_hits = stats.fragments.hits,
        "all inputs processed"
    );

    results.into_iter().collect()
}

fn load_declarations(path: &Path) -> Result<DeclarationSet, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        serde_yaml::from_str(&raw)
            .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))
    } else {
        serde_json::from_str(&raw)
            .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))
    }
}

fn print_reports(reports: &[FileReport<'_>], format: DiagnosticFormat) -> Result<(), String> {
    match format {
        DiagnosticFormat::Human => {
            for report in reports.iter().filter(|r| !r.diagnostics.is_empty()) {
                println!("{}:", report.input);
                let text = format_diagnostics(report.diagnostics, format)?;
                for line in text.lines() {
                    println!("  {line}");
                }
            }
        }
        DiagnosticFormat::Json => {
            let json = serde_json::to_string_pretty(reports)
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
            println!("{json}");
        }
        DiagnosticFormat::Yaml => {
            let yaml = serde_yaml::to_string(reports)
                .map_err(|e| format!("YAML serialization failed: {e}"))?;
            print!("{yaml}");
        }
    }
    Ok(())
}

/// Output file stems, one per input; two inputs may not share a stem.
fn output_stems(inputs: &[PathBuf]) -> Result<Vec<String>, String> {
    let mut seen = BTreeSet::new();
    let mut stems = Vec::with_capacity(inputs.len());
    for input in inputs {
        let raw = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let stem = sanitize_filename_segment(raw);
        if !seen.insert(stem.clone()) {
            return Err(format!(
                "Two inputs would both generate '{stem}.rs'; rename one of them"
            ));
        }
        stems.push(stem);
    }
    Ok(stems)
}

fn sanitize_filename_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_underscore = false;
    for ch in raw.chars() {
        let mapped = if ch.is_ascii_alphanumeric() {
            ch.to_ascii_lowercase()
        } else {
            '_'
        };
        if mapped == '_' {
            if last_underscore {
                continue;
            }
            last_underscore = true;
        } else {
            last_underscore = false;
        }
        out.push(mapped);
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "generated".to_string()
    } else {
        trimmed.to_string()
    }
}
