//! CLI entry point for the rental listing analysis.

use anyhow::{Result, anyhow};
use clap::Parser;
use rent_insights::listing::columns;
use rent_insights::{
    AnalysisReport, Pipeline, PipelineConfig, PipelineResult, ReportGenerator, ThresholdFilter,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Outlier filtering and correlation analysis for rental listings",
    long_about = "Loads a CSV of rental listings, removes outliers with configurable cutoffs, \
                  and computes the pairwise correlation table of its numeric columns.\n\n\
                  EXAMPLES:\n  \
                  # Default cutoffs (total <= 32000, area <= 2000, area <= 1100)\n  \
                  rent-insights -i houses_to_rent_v2.csv\n\n  \
                  # Custom cutoffs and exported files\n  \
                  rent-insights -i houses.csv --max-total 55000 --max-area 1100 --export\n\n  \
                  # Machine-readable report\n  \
                  rent-insights -i houses.csv --json | jq .target_ranking"
)]
struct Args {
    /// Path to the CSV file to analyse
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for exported files
    #[arg(short, long, default_value = "./outputs")]
    output: PathBuf,

    /// Custom base name for exported files
    ///
    /// If not specified, uses the input file name
    #[arg(long)]
    output_name: Option<String>,

    /// JSON configuration file; command-line flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Drop rows whose total rent exceeds this value
    ///
    /// Together with --max-area, replaces the configured cutoffs
    #[arg(long)]
    max_total: Option<f64>,

    /// Drop rows whose area exceeds this value (repeatable, applied in order)
    #[arg(long)]
    max_area: Vec<f64>,

    /// Skip outlier filtering entirely
    #[arg(long, conflicts_with_all = ["max_total", "max_area"])]
    no_cutoffs: bool,

    /// Comma-separated columns to correlate (default: all numeric columns)
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Column to rank the other variables against
    #[arg(short, long)]
    target: Option<String>,

    /// Number of ranked variables to print
    #[arg(long, default_value = "10")]
    top: usize,

    /// Write cleaned CSV, correlations CSV and JSON report to the output directory
    #[arg(long)]
    export: bool,

    /// Write only the JSON report to the output directory
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and final result)
    #[arg(short, long)]
    quiet: bool,
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
    let pipeline = Pipeline::builder().config(config).build()?;

    let result = match pipeline.process_file(&args.input) {
        Ok(result) => result,
        Err(e) => {
            error!("Analysis failed: {}", e);
            return Err(anyhow!("Analysis failed: {}", e));
        }
    };

    let input_file = args.input.to_string_lossy().to_string();
    let report = AnalysisReport::from_result(&result, pipeline.config(), Some(&input_file));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.emit_report && !args.export {
        let generator = ReportGenerator::new(args.output.clone(), args.output_name.clone());
        let stem = generator.file_stem(Some(&input_file));
        let report_path = generator.write_report_to_file(&report, &stem)?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(&result, &input_file, args.top);
    Ok(())
}

/// Start from the config file (or defaults) and apply command-line overrides.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            PipelineConfig::from_json_file(path)?
        }
        None => PipelineConfig::default(),
    };

    if args.no_cutoffs {
        config.outlier_cutoffs.clear();
    } else if args.max_total.is_some() || !args.max_area.is_empty() {
        let mut cutoffs = Vec::new();
        if let Some(limit) = args.max_total {
            cutoffs.push(ThresholdFilter::at_most(columns::TOTAL, limit));
        }
        cutoffs.extend(
            args.max_area
                .iter()
                .map(|&limit| ThresholdFilter::at_most(columns::AREA, limit)),
        );
        config.outlier_cutoffs = cutoffs;
    }

    if let Some(cols) = &args.columns {
        config.correlation_columns = Some(cols.iter().map(|c| c.trim().to_string()).collect());
    }
    if let Some(target) = &args.target {
        config.target_column = target.clone();
    }

    config.output_dir = args.output.clone();
    if let Some(name) = &args.output_name {
        config.output_name = Some(name.clone());
    }
    config.save_to_disk = args.export;

    config.validate()?;
    Ok(config)
}

/// Print a human-readable summary of the analysis.
///
/// Uses `println!` on purpose: this is the command's output, not a log.
fn print_human_readable_summary(result: &PipelineResult, input_file: &str, top: usize) {
    let summary = &result.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Input: {}", input_file);
    println!(
        "Rows: {} -> {} ({} removed, {:.1}%)",
        summary.rows_before,
        summary.rows_after,
        summary.rows_removed,
        summary.rows_removed_percentage()
    );
    println!("Duration: {}ms", summary.duration_ms);
    println!();

    if !result.steps.is_empty() {
        println!("Outlier Cutoffs:");
        for step in &result.steps {
            println!(
                "  - {} {}: {} -> {} rows",
                step.column, step.bound, step.rows_before, step.rows_after
            );
        }
        println!();
    }

    if !result.listings_per_city.is_empty() {
        println!("Listings per City:");
        for city in &result.listings_per_city {
            println!("  {:<20} {:>6}", city.value, city.count);
        }
        println!();
    }

    if !result.mean_target_by_city.is_empty() {
        println!("Mean Target by City:");
        for city in &result.mean_target_by_city {
            println!("  {:<20} {:>12.2}", city.value, city.mean);
        }
        println!();
    }

    if let Some(extent) = &result.target_extent {
        println!(
            "{} range: {:.2} to {:.2}",
            extent.column, extent.min, extent.max
        );
        println!();
    }

    if !result.target_ranking.is_empty() {
        let target = &result.target_ranking[0].variable_b;
        println!("Strongest Correlations with {}:", target);
        for entry in result.target_ranking.iter().take(top) {
            println!("  {:<24} {:>6}", entry.variable_a, entry.label);
        }
        println!();
    }

    if let Some(check) = &result.consistency {
        println!(
            "Total Consistency: {} of {} rows off by more than {} (max deviation {:.2})",
            check.rows_inconsistent, check.rows_checked, check.tolerance, check.max_deviation
        );
        println!();
    }

    if let Some(files) = &result.exported {
        println!("Exported:");
        println!("  {}", files.cleaned_csv.display());
        println!("  {}", files.correlations_csv.display());
        println!("  {}", files.report_json.display());
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --export to save cleaned data and correlations");
    println!("{}", "=".repeat(80));
}
