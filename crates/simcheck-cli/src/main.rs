//! simcheck - validation of simulation experiment results
//!
//! ## Commands
//!
//! - `run`: evaluate all autotests and write the reports
//! - `locate`: show the result file resolved for an execution/experiment pair
//! - `parse-trend`: expand a trend spec into its conditions

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use simcheck_core::{
    format_percent, init_tracing, parse_trend_spec, EngineConfig, LogFormat, TestKind,
    ValidationReport,
};
use simcheck_engine::{ResultSetLocator, ValidationPipeline};
use simcheck_store::{discover_result_files, FsAutotestSource, FsDatasetStore, FsReportSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "simcheck")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate simulation experiment results against a baseline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Engine configuration file (TOML)
    #[arg(short, long, global = true, env = "SIMCHECK_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

/// Per-field overrides applied on top of the configuration file.
#[derive(Args, Debug, Default)]
struct ConfigOverrides {
    /// Execution id of the qualitative tests
    #[arg(long, global = true, env = "SIMCHECK_QUALITY_EXECUTION")]
    quality_execution: Option<String>,

    /// Execution id of the quantitative tests
    #[arg(long, global = true, env = "SIMCHECK_QUANTITY_EXECUTION")]
    quantity_execution: Option<String>,

    /// Directory holding `results_<execution>_<experiment>.csv` files
    #[arg(long, global = true)]
    experiments_dir: Option<PathBuf>,

    /// Directory holding `qualitative.csv` and `quantitative.csv`
    #[arg(long, global = true)]
    resources_dir: Option<PathBuf>,

    /// Directory the reports are written to
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Permissible difference (%) for flat trends
    #[arg(long, global = true)]
    trend_permissible_error: Option<f64>,

    /// Permissible mean relative error (%) for quantitative tests
    #[arg(long, global = true)]
    relative_error: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every autotest and write the reports
    Run {
        /// Exit non-zero when any test case failed
        #[arg(long)]
        fail_on_failure: bool,

        /// Print the full report as JSON instead of the summary
        #[arg(long)]
        print_report: bool,
    },

    /// Show the result file resolved for an execution and experiment
    Locate {
        /// Execution id
        execution_id: String,

        /// Experiment id (`0` is the base dataset)
        experiment_id: String,
    },

    /// Expand a trend spec such as `(2025-2026:0);(2030:1)`
    ParseTrend {
        /// Trend spec
        spec: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(LogFormat::from_json_flag(cli.json), level);

    match cli.command {
        Commands::Run {
            fail_on_failure,
            print_report,
        } => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            cmd_run(config, fail_on_failure, print_report).await
        }
        Commands::Locate {
            execution_id,
            experiment_id,
        } => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            cmd_locate(&config, &execution_id, &experiment_id)
        }
        Commands::ParseTrend { spec } => cmd_parse_trend(&spec),
    }
}

/// Load the configuration file (or defaults) and apply command-line overrides.
fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(id) = &overrides.quality_execution {
        config = config.with_execution(TestKind::Quality, id.clone());
    }
    if let Some(id) = &overrides.quantity_execution {
        config = config.with_execution(TestKind::Quantity, id.clone());
    }
    if let Some(dir) = &overrides.experiments_dir {
        config.paths.experiments_dir = dir.clone();
    }
    if let Some(dir) = &overrides.resources_dir {
        config.paths.resources_dir = dir.clone();
    }
    if let Some(dir) = &overrides.output_dir {
        config.paths.output_dir = dir.clone();
    }
    if let Some(value) = overrides.trend_permissible_error {
        config.trend_permissible_error = value;
    }
    if let Some(value) = overrides.relative_error {
        config.relative_error = value;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Run both test families and write the reports
async fn cmd_run(config: EngineConfig, fail_on_failure: bool, print_report: bool) -> Result<()> {
    let paths = config.paths.clone();
    let universe = discover_result_files(&paths.experiments_dir)
        .context("Failed to discover result files")?;
    info!(files = universe.len(), dir = ?paths.experiments_dir, "Result files discovered");

    let source = FsAutotestSource::new(&paths.resources_dir);
    let sink = FsReportSink::new(&paths.output_dir);

    let report = ValidationPipeline::run_and_report(
        &source,
        Arc::new(FsDatasetStore::new()),
        &sink,
        Arc::new(universe),
        Arc::new(config),
    )
    .await
    .context("Validation run failed")?;

    if print_report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
        println!();
        println!("Reports written to {}", paths.output_dir.display());
    }

    if fail_on_failure && !report.all_passed() {
        anyhow::bail!(
            "{} of {} test cases failed",
            report.failed_count(),
            report.total_cases()
        );
    }
    Ok(())
}

fn mark(passed: bool) -> &'static str {
    if passed {
        "✓"
    } else {
        "✗"
    }
}

fn print_summary(report: &ValidationReport) {
    println!("Run ID: {}", report.run_id);
    println!(
        "Status: {}",
        if report.all_passed() {
            "✓ PASSED"
        } else {
            "✗ FAILED"
        }
    );
    println!("Suite digest: {}", report.suite_digest);
    println!("Duration: {}ms", report.duration_ms());
    println!();

    for verdict in &report.qualitative {
        println!(
            "  {} quality {}/{}",
            mark(verdict.passed),
            verdict.execution_id,
            verdict.experiment_id
        );
    }
    for verdict in &report.quantitative {
        let mean = verdict
            .mean_relative_error
            .map(|m| format!(" (mean error {:.2}%)", m))
            .unwrap_or_default();
        println!(
            "  {} quantity {}/{}{}",
            mark(verdict.passed),
            verdict.execution_id,
            verdict.experiment_id,
            mean
        );
    }

    let stats = &report.statistics;
    println!();
    println!("Trend checks passed:   {}", format_percent(stats.trend_pass_rate));
    println!("Linkage checks passed: {}", format_percent(stats.linkage_pass_rate));
    println!("Trend checks failed:   {}", format_percent(stats.trend_fail_rate));
    println!("Linkage checks failed: {}", format_percent(stats.linkage_fail_rate));
    println!("Mean relative error:   {:.2}", stats.mean_relative_error);
    println!();
    println!(
        "Summary: {}/{} test cases passed",
        report.passed_count(),
        report.total_cases()
    );
}

/// Print the result file for an execution/experiment pair
fn cmd_locate(config: &EngineConfig, execution_id: &str, experiment_id: &str) -> Result<()> {
    let universe = discover_result_files(&config.paths.experiments_dir)
        .context("Failed to discover result files")?;

    let handle = ResultSetLocator::new(&universe)
        .find(execution_id, experiment_id)
        .with_context(|| {
            format!("No result file for execution {execution_id}, experiment {experiment_id}")
        })?;

    println!("{}", handle.location.display());
    Ok(())
}

/// Print the conditions of a trend spec, one per line
fn cmd_parse_trend(spec: &str) -> Result<()> {
    let conditions = parse_trend_spec(spec).context("Invalid trend spec")?;
    for condition in &conditions {
        println!("{}\t{}", condition.year, condition.expected);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixture(root: &Path) {
        let experiments = root.join("experiments");
        let resources = root.join("resources");
        fs::create_dir_all(&experiments).unwrap();
        fs::create_dir_all(&resources).unwrap();

        fs::write(
            experiments.join("results_EXEC1_0.csv"),
            "dt,sum\n2025-01-01,100\n2026-01-01,90\n",
        )
        .unwrap();
        fs::write(
            experiments.join("results_EXEC1_1.csv"),
            "dt,sum\n2025-01-01,100\n2026-01-01,80\n",
        )
        .unwrap();
        fs::write(
            resources.join("qualitative.csv"),
            "test_id,linkage,trend\n1,,(2025:0)\n1,,(2026:0)\n",
        )
        .unwrap();
        fs::write(resources.join("quantitative.csv"), "test_id,effect_2025\n1,0\n").unwrap();
    }

    fn fixture_config(root: &Path) -> EngineConfig {
        let overrides = ConfigOverrides {
            quality_execution: Some("EXEC1".to_string()),
            quantity_execution: Some("EXEC1".to_string()),
            experiments_dir: Some(root.join("experiments")),
            resources_dir: Some(root.join("resources")),
            output_dir: Some(root.join("out")),
            ..Default::default()
        };
        let mut config = load_config(None, &overrides).unwrap();
        config.years_of_interest = vec![2025];
        config
    }

    #[test]
    fn test_overrides_apply_on_top_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simcheck.toml");
        fs::write(
            &path,
            "trend_permissible_error = 3.0\n\n[executions]\nquality = \"A\"\nquantity = \"B\"\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            quantity_execution: Some("C".to_string()),
            relative_error: Some(15.0),
            ..Default::default()
        };
        let config = load_config(Some(&path), &overrides).unwrap();

        assert_eq!(config.trend_permissible_error, 3.0);
        assert_eq!(config.relative_error, 15.0);
        assert_eq!(config.execution_for(TestKind::Quality).unwrap(), "A");
        assert_eq!(config.execution_for(TestKind::Quantity).unwrap(), "C");
    }

    #[test]
    fn test_invalid_override_rejected() {
        let overrides = ConfigOverrides {
            relative_error: Some(-1.0),
            ..Default::default()
        };
        assert!(load_config(None, &overrides).is_err());
    }

    #[tokio::test]
    async fn test_run_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        cmd_run(fixture_config(dir.path()), false, false)
            .await
            .expect("run should succeed");

        let out = dir.path().join("out");
        assert!(out.join("results.json").is_file());
        assert!(out.join("summary.md").is_file());
        assert!(out.join("qualitative_results.csv").is_file());
        assert!(out.join("quantitative_results.csv").is_file());
    }

    #[tokio::test]
    async fn test_run_fail_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let err = cmd_run(fixture_config(dir.path()), true, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1 of 3 test cases failed"));
    }

    #[test]
    fn test_locate() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let config = fixture_config(dir.path());

        assert!(cmd_locate(&config, "EXEC1", "1").is_ok());
        assert!(cmd_locate(&config, "EXEC1", "5").is_err());
    }

    #[test]
    fn test_parse_trend() {
        assert!(cmd_parse_trend("(2025-2026:0);(2030:1)").is_ok());
        assert!(cmd_parse_trend("(2025:7)").is_err());
    }
}
