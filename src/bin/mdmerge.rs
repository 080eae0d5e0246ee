use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use md_table_merge::{
    AuxiliaryMatchRule, DEFAULT_OUTPUT_FILE, MergeOptions, MergeReport, accumulate_files,
    join_files,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "mdmerge",
    version,
    about = "Merge Markdown tables from several documents into one"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Left-join auxiliary result files into the table of an input file.
    Join(JoinArgs),
    /// Concatenate the same-schema tables of every numbered file.
    Accumulate(AccumulateArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Directory scanned for Markdown files.
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Mark each carried-over section with an HTML comment naming its file.
    #[arg(long)]
    annotate_sources: bool,

    /// Print the merge report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct JoinArgs {
    /// Markdown file holding the base table.
    input: PathBuf,

    /// Output Markdown path.
    #[arg(default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Which files count as auxiliaries: substring, numeric or either.
    #[arg(long = "match", default_value = "either")]
    match_rule: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct AccumulateArgs {
    /// Output Markdown path.
    #[arg(default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn parse_options(common: &CommonArgs, match_rule: Option<&str>) -> Result<MergeOptions> {
    let auxiliary_match_rule = match_rule
        .map(AuxiliaryMatchRule::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid match rule: {error}"))
        .context("failed to parse --match")?
        .unwrap_or(AuxiliaryMatchRule::Either);

    if !common.dir.is_dir() {
        anyhow::bail!("'{}' is not a directory", common.dir.display());
    }

    Ok(MergeOptions {
        directory: common.dir.clone(),
        include_source_annotations: common.annotate_sources,
        auxiliary_match_rule,
    })
}

fn log_report(report: &MergeReport, common: &CommonArgs) -> Result<()> {
    if common.json {
        let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
        println!("{json}");
    }

    if report.warnings.is_empty() {
        return Ok(());
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if common.verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} source={:?} table_index={:?}: {}",
                warning.code, warning.source, warning.table_index, warning.message
            );
        }
    }
    Ok(())
}

fn run_join(args: &JoinArgs) -> Result<MergeReport> {
    let options = parse_options(&args.common, Some(args.match_rule.as_str()))?;
    join_files(&args.input, &args.output, &options)
        .with_context(|| format!("failed to merge tables into '{}'", args.input.display()))
}

fn run_accumulate(args: &AccumulateArgs) -> Result<MergeReport> {
    let options = parse_options(&args.common, None)?;
    accumulate_files(&args.output, &options).with_context(|| {
        format!(
            "failed to accumulate tables in '{}'",
            args.common.dir.display()
        )
    })
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("md_table_merge=info,mdmerge=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    let (result, output, common) = match &cli.command {
        Commands::Join(args) => (run_join(args), &args.output, &args.common),
        Commands::Accumulate(args) => (run_accumulate(args), &args.output, &args.common),
    };

    match result.and_then(|report| log_report(&report, common)) {
        Ok(()) => {
            if !common.json {
                println!("Successfully merged markdown tables into {}", output.display());
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
