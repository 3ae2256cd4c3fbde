use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use medcode_eval::config::Config;
use medcode_eval::logging::init_logging;
use medcode_eval::pipeline::Pipeline;
use medcode_eval::prompt::prompt_for_transcript;
use medcode_eval::reference::ReferenceSet;
use medcode_eval::report::{write_timing_csv, write_timing_table};
use medcode_eval::tee::Tee;
use medcode_eval::transcript::SegmentStrategy;
use medcode_eval::EvalError;

/// Score LLM medical-record extraction transcripts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (JSON); defaults to ~/.medcode-eval/config.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Also write console output to a numbered log file in this directory
    #[arg(long, global = true)]
    tee_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that every block holds exactly one schema object and nothing else
    Check(CheckArgs),

    /// Score extracted documents against the reference notes
    Score(ScoreArgs),

    /// Tabulate per-model generation times
    Times(TimesArgs),

    /// Run check, score and times on one transcript
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Transcript log file
    transcript: PathBuf,

    /// How blocks are delimited
    #[arg(long, value_enum, default_value = "completion-marker")]
    strategy: StrategyArg,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Transcript log file; prompts for a name inside the results directory when omitted
    transcript: Option<PathBuf>,

    /// Directory of reference notes
    #[arg(short, long)]
    references: Option<PathBuf>,

    /// CSV output path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TimesArgs {
    /// Transcript log file
    transcript: PathBuf,

    /// CSV output path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Transcript log file
    transcript: PathBuf,

    /// Directory of reference notes
    #[arg(short, long)]
    references: Option<PathBuf>,

    /// Score CSV output path
    #[arg(long)]
    score_output: Option<PathBuf>,

    /// Timing CSV output path
    #[arg(long)]
    timing_output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    CompletionMarker,
    ModelHeader,
}

impl From<StrategyArg> for SegmentStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::CompletionMarker => SegmentStrategy::CompletionMarker,
            StrategyArg::ModelHeader => SegmentStrategy::ModelHeader,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // The log file has to exist before logging starts so events land in it
    let config = load_config(cli.config.as_deref())?;
    let mut out = Tee::stdout();
    if let Some(dir) = &cli.tee_dir {
        out = out
            .with_log_file(dir, &config.tee_base_name)
            .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
    }

    // Initialize logging
    init_logging(cli.verbose, out.log_file().cloned());
    if let Some(path) = out.log_path() {
        info!("Output also logging to: {}", path.display());
    }

    let result = run(cli.command, &config, &mut out);
    out.flush()?;

    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    };
    if let Some(path) = out.log_path() {
        info!("Log saved to: {}", path.display());
    }
    Ok(code)
}

fn run(command: Command, config: &Config, out: &mut Tee) -> Result<()> {
    let pipeline = Pipeline::new(config).context("Failed to compile transcript markers")?;
    match command {
        Command::Check(args) => run_check(&pipeline, &args, out),
        Command::Score(args) => run_score(config, &pipeline, args, out),
        Command::Times(args) => run_times(config, &pipeline, &args, out),
        Command::Analyze(args) => run_analyze(config, &pipeline, &args, out),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => match Config::default_config_path() {
            Ok(path) => Config::load(&path),
            Err(_) => Ok(Config::default()),
        },
    }
}

fn read_transcript(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(EvalError::InputNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;
    info!("Transcript: {} ({} bytes)", path.display(), text.len());
    Ok(text)
}

fn load_references(config: &Config, dir: Option<&Path>) -> Result<ReferenceSet> {
    let dir = dir.unwrap_or(&config.references_dir);
    Ok(ReferenceSet::load_dir(dir, &config.reference_extensions)?)
}

fn run_check(pipeline: &Pipeline, args: &CheckArgs, out: &mut Tee) -> Result<()> {
    let text = read_transcript(&args.transcript)?;
    let report = pipeline.check_compliance(&text, args.strategy.into());
    report.write_text(out)?;
    Ok(())
}

fn run_score(config: &Config, pipeline: &Pipeline, args: ScoreArgs, out: &mut Tee) -> Result<()> {
    let transcript = match args.transcript {
        Some(path) => path,
        None => prompt_for_transcript(config, &mut io::stdin().lock(), out)?,
    };
    let text = read_transcript(&transcript)?;
    let references = load_references(config, args.references.as_deref())?;

    let report = pipeline.score_transcript(&text, &references);
    report.write_table(out)?;
    writeln!(out)?;
    report.write_summary(out)?;

    let output = args.output.as_deref().unwrap_or(&config.score_output);
    report.write_csv(output)?;
    writeln!(out, "\nScores saved to: {}", output.display())?;
    Ok(())
}

fn run_times(config: &Config, pipeline: &Pipeline, args: &TimesArgs, out: &mut Tee) -> Result<()> {
    let text = read_transcript(&args.transcript)?;
    let times = pipeline.extract_timings(&text);
    write_timing_table(&times, out)?;

    let output = args.output.as_deref().unwrap_or(&config.timing_output);
    write_timing_csv(&times, output)?;
    writeln!(out, "\nTimes saved to: {}", output.display())?;
    Ok(())
}

fn run_analyze(config: &Config, pipeline: &Pipeline, args: &AnalyzeArgs, out: &mut Tee) -> Result<()> {
    let text = read_transcript(&args.transcript)?;
    let references = load_references(config, args.references.as_deref())?;

    writeln!(out, "Transcript: {}", args.transcript.display())?;
    writeln!(
        out,
        "Generated: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out, "References: {}\n", references.len())?;

    writeln!(out, "{}", "=".repeat(80))?;
    writeln!(out, "SCHEMA COMPLIANCE")?;
    writeln!(out, "{}", "=".repeat(80))?;
    pipeline
        .check_compliance(&text, SegmentStrategy::CompletionMarker)
        .write_text(out)?;

    writeln!(out, "\n{}", "=".repeat(80))?;
    writeln!(out, "ORIGINAL DOCUMENT FIDELITY")?;
    writeln!(out, "{}", "=".repeat(80))?;
    let report = pipeline.score_transcript(&text, &references);
    report.write_table(out)?;
    writeln!(out)?;
    report.write_summary(out)?;
    let score_output = args.score_output.as_deref().unwrap_or(&config.score_output);
    report.write_csv(score_output)?;

    writeln!(out, "\n{}", "=".repeat(80))?;
    writeln!(out, "GENERATION TIMES")?;
    writeln!(out, "{}", "=".repeat(80))?;
    let times = pipeline.extract_timings(&text);
    write_timing_table(&times, out)?;
    let timing_output = args.timing_output.as_deref().unwrap_or(&config.timing_output);
    write_timing_csv(&times, timing_output)?;

    writeln!(
        out,
        "\nScores saved to: {}\nTimes saved to: {}",
        score_output.display(),
        timing_output.display()
    )?;
    Ok(())
}
