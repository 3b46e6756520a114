//! Typst-based PDF report generation.
//!
//! Reads a Typst template (the built-in default or a custom file), resolves
//! all `{{PLACEHOLDER}}` markers with helpers from `chart_svg` and `tables`,
//! and writes the final `.typ` file. Compile it with `typst compile`.

pub mod chart_svg;
pub mod default_template;
pub mod tables;

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::domain::analysis::Analysis;
use crate::domain::error::AnalysisError;
use crate::ports::report_port::ReportPort;

/// Wraps an SVG document in `#image.decode`, or returns `fallback` markup
/// when the chart is empty.
fn embed_svg(svg: &str, fallback: &str) -> String {
    if svg.is_empty() {
        return fallback.to_string();
    }
    format!(
        "#image.decode(\n\"{}\",\n  width: 100%,\n)",
        svg.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

fn report_title(analysis: &Analysis) -> String {
    let symbols: Vec<&str> = analysis.assets.iter().map(|a| a.symbol.as_str()).collect();
    format!("Investment Comparison: {}", symbols.join(" vs "))
}

/// Resolve all `{{PLACEHOLDER}}`s in the given template string and return
/// the final Typst markup.
pub fn resolve(template: &str, analysis: &Analysis) -> String {
    let config = &analysis.config;
    let mut output = template.to_string();

    output = output.replace("{{TITLE}}", &report_title(analysis));
    output = output.replace(
        "{{PERIOD}}",
        &format!("{} to {}", config.start_date, config.end_date),
    );
    output = output.replace("{{WARNINGS}}", &tables::render_warnings(&analysis.warnings));
    output = output.replace(
        "{{PARAMETERS_TABLE}}",
        &tables::render_parameters_table(config),
    );
    output = output.replace("{{METRICS_TABLE}}", &tables::render_metrics_table(analysis));

    let cumulative = chart_svg::cumulative_return_svg(analysis);
    output = output.replace(
        "{{CUMULATIVE_RETURN_CHART}}",
        &embed_svg(&cumulative, "_No return data._"),
    );

    output = output.replace(
        "{{DISTRIBUTION_TABLE}}",
        &tables::render_distribution_table(analysis),
    );
    output = output.replace("{{STRATEGY_TABLE}}", &tables::render_strategy_table(analysis));

    let strategy_charts: Vec<String> = analysis
        .assets
        .iter()
        .map(|asset| embed_svg(&chart_svg::strategy_svg(asset), "_No portfolio data._"))
        .collect();
    output = output.replace("{{STRATEGY_CHARTS}}", &strategy_charts.join("\n\n"));

    output = output.replace("{{TREND_TABLE}}", &tables::render_trend_table(analysis));
    let trend_charts: Vec<String> = analysis
        .assets
        .iter()
        .map(|asset| embed_svg(&chart_svg::trend_svg(asset), "_No trend data._"))
        .collect();
    output = output.replace("{{TREND_CHARTS}}", &trend_charts.join("\n\n"));

    output
}

/// Writes a Typst report, optionally from a user-supplied template.
pub struct TypstReportAdapter {
    template_path: Option<PathBuf>,
}

impl TypstReportAdapter {
    pub fn new(template_path: Option<PathBuf>) -> Self {
        Self { template_path }
    }

    fn load_template(&self) -> Result<String, AnalysisError> {
        match &self.template_path {
            Some(path) => Ok(fs::read_to_string(path)?),
            None => Ok(default_template::template().to_string()),
        }
    }
}

impl ReportPort for TypstReportAdapter {
    fn write(&self, analysis: &Analysis, output_path: &str) -> Result<(), AnalysisError> {
        let template = self.load_template()?;
        let content = resolve(&template, analysis);
        fs::write(output_path, content)?;
        info!(path = output_path, "report written");
        Ok(())
    }
}
