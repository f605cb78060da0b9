//! CLI entry point for the Ames housing cleaning and EDA pipeline.

use ames_eda::reporting::format_target_summary;
use ames_eda::{
    ColumnDropper, DataProfiler, EdaPipeline, MissingColumnPolicy, PipelineConfig,
    PipelineConfigBuilder, PipelineResult, ReportGenerator, RunStages, TableSet, load_csv,
    missing_report,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};

/// CLI-compatible stage selection enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliStage {
    /// Clean the raw tables only
    Clean,
    /// Run the EDA stage on an existing Cleaned_train.csv
    Eda,
    /// Clean, then run the EDA stage
    All,
}

impl From<CliStage> for RunStages {
    fn from(cli: CliStage) -> Self {
        match cli {
            CliStage::Clean => RunStages::Clean,
            CliStage::Eda => RunStages::Eda,
            CliStage::All => RunStages::All,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Cleaning and exploratory analysis of the Ames housing data",
    long_about = "Cleans the Ames, Iowa housing data (column drops, mode imputation, log \
                  transform of SalePrice) and renders the exploratory figures.\n\n\
                  EXAMPLES:\n  \
                  # Full run on data/train.csv and data/test.csv\n  \
                  ames-eda --data-dir data -o output\n\n  \
                  # Preview what will be dropped and imputed\n  \
                  ames-eda --data-dir data --dry-run\n\n  \
                  # Only the EDA stage, no figures, JSON to stdout\n  \
                  ames-eda --stage eda --no-figures --json"
)]
struct Args {
    /// Directory holding train.csv and test.csv
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Output directory for cleaned tables and reports
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output directory for figures
    #[arg(short, long)]
    figures: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stages to run
    #[arg(long, value_enum, default_value = "all")]
    stage: CliStage,

    /// Do not render figures
    #[arg(long)]
    no_figures: bool,

    /// Skip configured columns that are absent instead of failing
    #[arg(long)]
    skip_missing_columns: bool,

    /// Preview what the pipeline will do without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write the JSON report to <output>/eda_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;

    if args.dry_run {
        return run_dry_run(&config, args.stage.into());
    }

    let pipeline = build_pipeline(&args, config)?;
    run_pipeline(pipeline, &args)
}

/// Defaults, then the config file, then command-line flags.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            PipelineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    let mut builder = PipelineConfigBuilder::from_config(base);
    if let Some(dir) = &args.data_dir {
        builder = builder.data_dir(dir);
    }
    if let Some(dir) = &args.output {
        builder = builder.output_dir(dir);
    }
    if let Some(dir) = &args.figures {
        builder = builder.figures_dir(dir);
    }
    if args.no_figures {
        builder = builder.render_figures(false);
    }
    if args.skip_missing_columns {
        builder = builder.missing_columns(MissingColumnPolicy::Skip);
    }

    Ok(builder.build()?)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<EdaPipeline> {
    let mut builder = EdaPipeline::builder()
        .config(config)
        .stages(args.stage.into());

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Run pipeline and print results
fn run_pipeline(pipeline: EdaPipeline, args: &Args) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting Ames housing pipeline...");
    info!("{}", "=".repeat(80));

    match pipeline.run() {
        Ok(result) => handle_pipeline_output(&result, pipeline.config(), args),
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "error": e }))?);
            }
            error!("Pipeline failed: {}", e);
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
/// - `--emit-report`: Write JSON report to file
fn handle_pipeline_output(result: &PipelineResult, config: &PipelineConfig, args: &Args) -> Result<()> {
    let report = ReportGenerator::build_report(config, result);

    if args.emit_report {
        let generator = ReportGenerator::new(&config.output_dir);
        let report_path = generator.write_report_to_file(&report)?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", ReportGenerator::render_summary(&report));
    Ok(())
}

/// Run dry-run mode - show what would happen without processing
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn run_dry_run(config: &PipelineConfig, stages: RunStages) -> Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of cleaning and EDA actions");
    println!("{}\n", "=".repeat(80));

    if stages.includes_cleaning() {
        preview_cleaning(config)?;
    } else {
        preview_eda(config)?;
    }

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    if stages.includes_cleaning() {
        println!("  - {}", config.cleaned_train_path().display());
        println!("  - {}", config.cleaned_test_path().display());
    }
    if stages.includes_eda() {
        println!("  - {}", config.eda_train_path().display());
    }
    if config.render_figures {
        println!("  - {}/*.png", config.figures_dir.display());
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To execute, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

fn preview_cleaning(config: &PipelineConfig) -> Result<()> {
    let train = load_csv(&config.train_path(), config)?;
    let test = load_csv(&config.test_path(), config)?;

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  Train: {} ({} rows x {} columns)", config.train_path().display(), train.height(), train.width());
    println!("  Test:  {} ({} rows x {} columns)", config.test_path().display(), test.height(), test.width());
    let target = DataProfiler::summarize(&train, &config.target_column)?;
    println!("  {}", format_target_summary(&target));
    println!();

    let tables = TableSet::new(train, test, &config.target_column)?;
    let report = missing_report(&tables.combined);

    println!("MISSING VALUES (combined table)");
    println!("{}", "-".repeat(40));
    if report.is_empty() {
        println!("  No missing values");
    } else {
        println!("  {:<20} {:>8} {:>10}", "Column", "Total", "Percent");
        for row in &report.rows {
            println!("  {:<20} {:>8} {:>9.2}%", truncate_str(&row.variable, 19), row.total, row.percent);
        }
    }
    println!();

    println!("PLANNED COLUMN DROPS");
    println!("{}", "-".repeat(40));
    for group in &config.drop_groups {
        println!("  [{}] {}", group.name, group.columns.join(", "));
        let absent = ColumnDropper::absent(&tables.combined, &group.columns);
        if !absent.is_empty() {
            println!("    ! absent: {}", absent.join(", "));
        }
    }
    println!();

    println!("PLANNED MODE IMPUTATION (per table)");
    println!("{}", "-".repeat(40));
    for column in &config.impute_columns {
        let missing = report.get(column).map_or(0, |row| row.total);
        println!("  {:<20} {} missing in combined table", truncate_str(column, 19), missing);
    }
    println!();
    Ok(())
}

fn preview_eda(config: &PipelineConfig) -> Result<()> {
    let path = config.cleaned_train_path();
    let train = load_csv(&path, config)?;

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  Cleaned train: {} ({} rows x {} columns)", path.display(), train.height(), train.width());
    let target = DataProfiler::summarize(&train, &config.target_column)?;
    println!("  {}", format_target_summary(&target));
    println!();

    println!("TOP CORRELATIONS");
    println!("{}", "-".repeat(40));
    for entry in DataProfiler::top_correlations(&train, &config.target_column, config.correlation_top_k)? {
        println!("  {:<20} {:>7.3}", truncate_str(&entry.column, 19), entry.coefficient);
    }
    println!();

    println!("OUTLIER RULE");
    println!("{}", "-".repeat(40));
    println!("  Remove rows where {} ({:?} units)", config.outlier_rule, config.threshold_scale);
    println!();
    Ok(())
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
