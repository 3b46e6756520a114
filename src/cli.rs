//! CLI definition and dispatch.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_export::export_analysis;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::typst_report::TypstReportAdapter;
use crate::domain::analysis::{
    load_prices, run_analysis, Analysis, AnalysisConfig, DEFAULT_BENCHMARK,
};
use crate::domain::config_validation::{
    parse_optional_date, validate_analysis_config, validate_data_config, ANALYSIS_SECTION,
    DATA_SECTION,
};
use crate::domain::error::AnalysisError;
use crate::domain::frequency::Frequency;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const REPORT_SECTION: &str = "report";
const DEFAULT_START: (i32, u32, u32) = (2020, 1, 1);
const DEFAULT_END: (i32, u32, u32) = (2024, 10, 25);

#[derive(Parser, Debug)]
#[command(
    name = "dcacompare",
    about = "Compare lump-sum and dollar-cost-averaging investment strategies"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full analysis and write a report
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        /// Override [analysis] primary
        #[arg(long)]
        primary: Option<String>,
        /// Override [analysis] secondary; pass "" to drop it
        #[arg(long)]
        secondary: Option<String>,
        /// Override [analysis] frequency
        #[arg(long)]
        frequency: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write per-asset CSV series into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print a symbol's loaded price series as CSV
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        /// Defaults to [analysis] primary
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            primary,
            secondary,
            frequency,
            output,
            export_dir,
        } => {
            let overrides = CliOverrides::new()
                .with(ANALYSIS_SECTION, "primary", primary)
                .with(ANALYSIS_SECTION, "secondary", secondary)
                .with(ANALYSIS_SECTION, "frequency", frequency)
                .with(
                    REPORT_SECTION,
                    "output",
                    output.map(|p| p.display().to_string()),
                );
            run_analyze(&config, overrides, export_dir.as_ref())
        }
        Command::Validate { config } => run_validate(&config),
        Command::Fetch { config, symbol } => run_fetch(&config, symbol.as_deref()),
    }
}

fn fail(err: AnalysisError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, AnalysisError> {
    FileConfigAdapter::from_file(path).map_err(|e| AnalysisError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Command-line values layered over a config file.
pub struct CliOverrides<'a> {
    base: Option<&'a dyn ConfigPort>,
    values: HashMap<(String, String), String>,
}

impl<'a> CliOverrides<'a> {
    pub fn new() -> Self {
        Self {
            base: None,
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, section: &str, key: &str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.values
                .insert((section.to_string(), key.to_string()), value);
        }
        self
    }

    pub fn over<'b>(self, base: &'b dyn ConfigPort) -> CliOverrides<'b> {
        CliOverrides {
            base: Some(base),
            values: self.values,
        }
    }
}

impl Default for CliOverrides<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPort for CliOverrides<'_> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.values
            .get(&(section.to_string(), key.to_string()))
            .cloned()
            .or_else(|| self.base.and_then(|b| b.get_string(section, key)))
    }
}

fn default_date((y, m, d): (i32, u32, u32)) -> Result<NaiveDate, AnalysisError> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| AnalysisError::ConfigInvalid {
        section: ANALYSIS_SECTION.into(),
        key: "start_date".into(),
        reason: "invalid default date".into(),
    })
}

/// Builds the analysis parameters, applying defaults for absent keys.
/// Percent inputs are converted to fractions except the fee, which is kept
/// as entered.
pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, AnalysisError> {
    let primary = config
        .get_non_empty(ANALYSIS_SECTION, "primary")
        .ok_or_else(|| AnalysisError::ConfigMissing {
            section: ANALYSIS_SECTION.into(),
            key: "primary".into(),
        })?;
    let secondary = config.get_non_empty(ANALYSIS_SECTION, "secondary");

    // Absent means the default index; an empty value or "none" disables it.
    let benchmark = match config.get_string(ANALYSIS_SECTION, "benchmark") {
        None => Some(DEFAULT_BENCHMARK.to_string()),
        Some(s) if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("none") => None,
        Some(s) => Some(s.trim().to_string()),
    };

    let start_date = match parse_optional_date(config, "start_date")? {
        Some(d) => d,
        None => default_date(DEFAULT_START)?,
    };
    let end_date = match parse_optional_date(config, "end_date")? {
        Some(d) => d,
        None => default_date(DEFAULT_END)?,
    };
    if start_date >= end_date {
        return Err(AnalysisError::ConfigInvalid {
            section: ANALYSIS_SECTION.into(),
            key: "start_date".into(),
            reason: format!("start_date {start_date} must be before end_date {end_date}"),
        });
    }

    let frequency = match config.get_non_empty(ANALYSIS_SECTION, "frequency") {
        Some(tag) => tag.parse::<Frequency>()?,
        None => Frequency::Monthly,
    };

    let number = |key: &str, default: f64| -> Result<f64, AnalysisError> {
        Ok(config.get_double(ANALYSIS_SECTION, key)?.unwrap_or(default))
    };

    Ok(AnalysisConfig {
        primary,
        secondary,
        benchmark,
        start_date,
        end_date,
        risk_free_rate: number("risk_free_rate_pct", 2.0)? / 100.0,
        initial_amount: number("initial_amount", 10_000.0)?,
        base_contribution: number("contribution", 500.0)?,
        frequency,
        management_fee_pct: number("management_fee_pct", 0.5)?,
    })
}

/// Picks the price loader named by `[data] source`.
pub fn build_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, AnalysisError> {
    let source = config
        .get_non_empty(DATA_SECTION, "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_non_empty(DATA_SECTION, "csv_dir")
                .unwrap_or_else(|| "data".to_string());
            info!(dir = %dir, "using CSV price files");
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "yahoo")]
        "yahoo" => {
            use crate::adapters::yahoo_adapter::YahooAdapter;
            info!("using Yahoo Finance");
            Ok(Box::new(YahooAdapter::new()?))
        }
        other => Err(AnalysisError::ConfigInvalid {
            section: DATA_SECTION.into(),
            key: "source".into(),
            reason: format!("data source '{other}' is not available in this build"),
        }),
    }
}

fn load_and_validate(config_path: &PathBuf) -> Result<FileConfigAdapter, AnalysisError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_data_config(&adapter)?;
    Ok(adapter)
}

fn run_analyze(
    config_path: &PathBuf,
    overrides: CliOverrides<'_>,
    export_dir: Option<&PathBuf>,
) -> ExitCode {
    match analyze(config_path, overrides, export_dir) {
        Ok(report_path) => {
            println!("{report_path}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn analyze(
    config_path: &PathBuf,
    overrides: CliOverrides<'_>,
    export_dir: Option<&PathBuf>,
) -> Result<String, AnalysisError> {
    // Stage 1: Load and validate config
    let file = load_and_validate(config_path)?;
    let config = overrides.over(&file);
    validate_analysis_config(&config)?;
    let analysis_config = build_analysis_config(&config)?;

    // Stage 2: Fetch and analyze
    let data_port = build_data_port(&config)?;
    eprintln!(
        "Analyzing {} from {} to {} ({} contributions)",
        analysis_config.symbols().join(", "),
        analysis_config.start_date,
        analysis_config.end_date,
        analysis_config.frequency,
    );
    let analysis = run_analysis(data_port.as_ref(), &analysis_config)?;

    // Stage 3: Console summary
    print_summary(&analysis);

    // Stage 4: Optional series export
    if let Some(dir) = export_dir {
        let paths = export_analysis(&analysis, dir)?;
        eprintln!("\nExported {} files to {}", paths.len(), dir.display());
    }

    // Stage 5: Report
    let output = config
        .get_non_empty(REPORT_SECTION, "output")
        .unwrap_or_else(|| "report.typ".to_string());
    let template_path = config
        .get_non_empty(REPORT_SECTION, "template_path")
        .map(PathBuf::from);
    TypstReportAdapter::new(template_path).write(&analysis, &output)?;
    eprintln!("\nReport written to: {output}");

    Ok(output)
}

fn fmt_sharpe(sharpe: Option<f64>) -> String {
    sharpe
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "n/a (zero volatility)".to_string())
}

pub fn print_summary(analysis: &Analysis) {
    for warning in &analysis.warnings {
        eprintln!("warning: {warning}");
    }

    for asset in &analysis.assets {
        let m = &asset.metrics;
        eprintln!("\n=== {} ===", asset.symbol);
        eprintln!("Total Return:     {:.2}%", m.total_return_pct);
        eprintln!("CAGR:             {:.2}%", m.cagr_pct);
        eprintln!("Annualized:       {:.2}%", m.annualized_return * 100.0);
        eprintln!("Volatility:       {:.2}%", m.annualized_volatility * 100.0);
        eprintln!("Sharpe Ratio:     {}", fmt_sharpe(m.sharpe_ratio));
        for s in [&asset.lump_sum_summary, &asset.dca_summary] {
            let sign = if s.gain_or_loss >= 0.0 { "+" } else { "-" };
            let cagr = s
                .cagr_pct
                .map(|c| format!("{c:.2}%"))
                .unwrap_or_else(|| "n/a".to_string());
            eprintln!(
                "  {:<9} final ${:.2}  ({}${:.2}, CAGR {})",
                s.kind.to_string(),
                s.final_value,
                sign,
                s.gain_or_loss.abs(),
                cagr
            );
        }
        if let Some(p) = asset.trend.forecast.last() {
            eprintln!(
                "  Trend forecast   {:.2} on {} (±{:.2} at 1σ)",
                p.predicted, p.date, asset.trend.residual_stddev
            );
        }
    }

    if let Some(benchmark) = &analysis.benchmark {
        let m = &benchmark.metrics;
        eprintln!("\n=== Benchmark {} ===", benchmark.symbol);
        eprintln!("Total Return:     {:.2}%", m.total_return_pct);
        eprintln!("Volatility:       {:.2}%", m.annualized_volatility * 100.0);
        eprintln!("Sharpe Ratio:     {}", fmt_sharpe(m.sharpe_ratio));
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let result = load_and_validate(config_path).and_then(|adapter| {
        validate_analysis_config(&adapter)?;
        build_analysis_config(&adapter)
    });
    let config = match result {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("\nPrimary:          {}", config.primary);
    eprintln!(
        "Secondary:        {}",
        config.secondary.as_deref().unwrap_or("-")
    );
    eprintln!(
        "Benchmark:        {}",
        config.benchmark.as_deref().unwrap_or("-")
    );
    eprintln!("Period:           {} to {}", config.start_date, config.end_date);
    eprintln!(
        "Contribution:     ${:.2} {} (${:.2} per period)",
        config.base_contribution,
        config.frequency,
        config.per_period_contribution()
    );
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_fetch(config_path: &PathBuf, symbol: Option<&str>) -> ExitCode {
    match fetch(config_path, symbol) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn fetch(config_path: &PathBuf, symbol: Option<&str>) -> Result<(), AnalysisError> {
    let adapter = load_and_validate(config_path)?;
    let overrides = CliOverrides::new()
        .with(ANALYSIS_SECTION, "primary", symbol.map(str::to_string))
        .over(&adapter);
    let config = build_analysis_config(&overrides)?;
    let data_port = build_data_port(&adapter)?;

    let prices = load_prices(
        data_port.as_ref(),
        &config.primary,
        config.start_date,
        config.end_date,
    )?;

    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    let write_err = |e: csv::Error| AnalysisError::DataSource {
        reason: format!("CSV write error: {e}"),
    };
    wtr.write_record(["date", "price"]).map_err(write_err)?;
    for p in prices.points() {
        wtr.write_record([p.date.to_string(), p.price.to_string()])
            .map_err(write_err)?;
    }
    wtr.flush()?;

    eprintln!(
        "{}: {} points, {} to {}",
        config.primary,
        prices.len(),
        prices.first().map(|p| p.date.to_string()).unwrap_or_default(),
        prices.last().map(|p| p.date.to_string()).unwrap_or_default(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn build_config_applies_defaults() {
        let cfg = build_analysis_config(&file("[analysis]\nprimary = AAPL\n")).unwrap();
        assert_eq!(cfg.primary, "AAPL");
        assert_eq!(cfg.secondary, None);
        assert_eq!(cfg.benchmark.as_deref(), Some("ACWI"));
        assert_eq!(cfg.start_date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(cfg.end_date, NaiveDate::from_ymd_opt(2024, 10, 25).unwrap());
        assert!((cfg.risk_free_rate - 0.02).abs() < 1e-12);
        assert_eq!(cfg.initial_amount, 10_000.0);
        assert_eq!(cfg.base_contribution, 500.0);
        assert_eq!(cfg.frequency, Frequency::Monthly);
        assert_eq!(cfg.management_fee_pct, 0.5);
    }

    #[test]
    fn build_config_reads_values() {
        let cfg = build_analysis_config(&file(
            "[analysis]\nprimary = SPY\nsecondary = QQQ\nbenchmark = none\n\
             start_date = 2021-03-01\nend_date = 2022-03-01\nrisk_free_rate_pct = 4.5\n\
             contribution = 250\nfrequency = annual\n",
        ))
        .unwrap();
        assert_eq!(cfg.secondary.as_deref(), Some("QQQ"));
        assert_eq!(cfg.benchmark, None);
        assert!((cfg.risk_free_rate - 0.045).abs() < 1e-12);
        assert_eq!(cfg.frequency, Frequency::Annual);
        assert_eq!(cfg.per_period_contribution(), 3000.0);
    }

    #[test]
    fn build_config_rejects_start_after_default_end() {
        let err = build_analysis_config(&file(
            "[analysis]\nprimary = SPY\nstart_date = 2025-01-01\n",
        ))
        .unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn overrides_take_precedence() {
        let base = file("[analysis]\nprimary = AAPL\nsecondary = MSFT\nfrequency = monthly\n");
        let layered = CliOverrides::new()
            .with(ANALYSIS_SECTION, "primary", Some("NVDA".into()))
            .with(ANALYSIS_SECTION, "secondary", Some(String::new()))
            .with(ANALYSIS_SECTION, "frequency", None)
            .over(&base);
        let cfg = build_analysis_config(&layered).unwrap();
        assert_eq!(cfg.primary, "NVDA");
        assert_eq!(cfg.secondary, None);
        assert_eq!(cfg.frequency, Frequency::Monthly);
    }

    #[test]
    fn build_config_rejects_unparsable_numbers() {
        let err = build_analysis_config(&file(
            "[analysis]\nprimary = SPY\ninitial_amount = 25k\n",
        ))
        .unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigInvalid { key, .. } if key == "initial_amount"));

        let err = build_analysis_config(&file(
            "[analysis]\nprimary = SPY\nrisk_free_rate_pct = 4,5\n",
        ))
        .unwrap_err();
        assert!(
            matches!(err, AnalysisError::ConfigInvalid { key, .. } if key == "risk_free_rate_pct")
        );
    }

    #[test]
    fn override_amount_is_parsed_like_file_values() {
        let base = file("[analysis]\nprimary = AAPL\n");
        let layered = CliOverrides::new()
            .with(ANALYSIS_SECTION, "initial_amount", Some("2,500".into()))
            .over(&base);
        assert_eq!(build_analysis_config(&layered).unwrap().initial_amount, 2_500.0);

        let layered = CliOverrides::new()
            .with(ANALYSIS_SECTION, "contribution", Some("lots".into()))
            .over(&base);
        assert!(validate_analysis_config(&layered).is_err());
    }

    #[test]
    fn override_frequency_is_validated() {
        let base = file("[analysis]\nprimary = AAPL\n");
        let layered = CliOverrides::new()
            .with(ANALYSIS_SECTION, "frequency", Some("weekly".into()))
            .over(&base);
        let err = validate_analysis_config(&layered).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownFrequency { .. }));
    }

    #[test]
    fn csv_is_default_data_source() {
        assert!(build_data_port(&file("[analysis]\nprimary = A\n")).is_ok());
    }

    #[test]
    fn unknown_data_source() {
        let err = build_data_port(&file("[data]\nsource = bloomberg\n"))
            .err()
            .unwrap();
        assert!(matches!(err, AnalysisError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[test]
    fn cli_parses_analyze_flags() {
        let cli = Cli::parse_from([
            "dcacompare",
            "analyze",
            "--config",
            "a.ini",
            "--primary",
            "SPY",
            "--frequency",
            "quarterly",
            "--export-dir",
            "out",
        ]);
        match cli.command {
            Command::Analyze {
                primary,
                frequency,
                export_dir,
                secondary,
                ..
            } => {
                assert_eq!(primary.as_deref(), Some("SPY"));
                assert_eq!(frequency.as_deref(), Some("quarterly"));
                assert_eq!(export_dir, Some(PathBuf::from("out")));
                assert_eq!(secondary, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
