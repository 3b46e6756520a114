//! Table formatting for reports.
//!
//! Provides functions to generate Typst markup for:
//! - Analysis parameters
//! - Return and risk metrics per asset and benchmark
//! - Periodic and monthly return distributions
//! - Lump Sum vs DCA strategy summaries

use crate::domain::analysis::{Analysis, AnalysisConfig};
use crate::domain::returns::{ReturnDistribution, ReturnMetrics};
use crate::domain::simulation::StrategySummary;

fn fmt_currency(value: f64) -> String {
    if value >= 0.0 {
        format!("${:.2}", value)
    } else {
        format!("-${:.2}", value.abs())
    }
}

fn fmt_pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Typst content-block escaping for user-supplied text.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']' | '#' | '*' | '_' | '$' | '@' | '<' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn signed_cell(value: f64, text: String) -> String {
    let color = if value >= 0.0 { "green" } else { "red" };
    format!("text(fill: {}, [{}])", color, escape(&text))
}

pub fn render_parameters_table(config: &AnalysisConfig) -> String {
    let mut out = String::from("#table(\n  columns: 2,\n  align: (left, right),\n");
    out.push_str("  [*Parameter*], [*Value*],\n");

    let mut row = |name: &str, value: String| {
        out.push_str(&format!("  [{}], [{}],\n", name, escape(&value)));
    };
    row("Primary asset", config.primary.clone());
    row(
        "Secondary asset",
        config.secondary.clone().unwrap_or_else(|| "-".into()),
    );
    row(
        "Benchmark",
        config.benchmark.clone().unwrap_or_else(|| "-".into()),
    );
    row(
        "Period",
        format!("{} to {}", config.start_date, config.end_date),
    );
    row("Risk-free rate", fmt_pct(config.risk_free_rate));
    row("Initial amount", fmt_currency(config.initial_amount));
    row(
        "Contribution",
        format!(
            "{} {} ({} per period)",
            fmt_currency(config.base_contribution),
            config.frequency,
            fmt_currency(config.per_period_contribution())
        ),
    );
    row(
        "Management fee",
        format!("{:.2}% (not applied)", config.management_fee_pct),
    );

    out.push_str(")\n");
    out
}

fn metrics_row(out: &mut String, label: &str, m: &ReturnMetrics) {
    let sharpe = m
        .sharpe_ratio
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "n/a".into());
    out.push_str(&format!(
        "  [{}], {}, [{}], [{}], [{}], {},\n",
        escape(label),
        signed_cell(m.total_return_pct, format!("{:.2}%", m.total_return_pct)),
        fmt_pct(m.annualized_return),
        fmt_pct(m.annualized_volatility),
        sharpe,
        signed_cell(m.cagr_pct, format!("{:.2}%", m.cagr_pct)),
    ));
}

pub fn render_metrics_table(analysis: &Analysis) -> String {
    let mut out = String::from(
        "#table(\n  columns: 6,\n  align: (left, right, right, right, right, right),\n",
    );
    out.push_str(
        "  [*Asset*], [*Total Return*], [*Ann. Return*], [*Volatility*], [*Sharpe*], [*CAGR*],\n",
    );
    for asset in &analysis.assets {
        metrics_row(&mut out, &asset.symbol, &asset.metrics);
    }
    if let Some(benchmark) = &analysis.benchmark {
        metrics_row(
            &mut out,
            &format!("{} (benchmark)", benchmark.symbol),
            &benchmark.metrics,
        );
    }
    out.push_str(")\n");
    out
}

fn distribution_row(out: &mut String, label: &str, dist: Option<&ReturnDistribution>) {
    match dist {
        Some(d) => out.push_str(&format!(
            "  [{}], [{}], [{}], [{}], [{}], [{}], [{}], [{}],\n",
            escape(label),
            d.count,
            fmt_pct(d.min),
            fmt_pct(d.q1),
            fmt_pct(d.median),
            fmt_pct(d.q3),
            fmt_pct(d.max),
            fmt_pct(d.mean),
        )),
        None => out.push_str(&format!(
            "  [{}], [0], [-], [-], [-], [-], [-], [-],\n",
            escape(label)
        )),
    }
}

pub fn render_distribution_table(analysis: &Analysis) -> String {
    let mut out = String::from("#table(\n  columns: 8,\n  align: (left, right, right, right, right, right, right, right),\n");
    out.push_str(
        "  [*Series*], [*N*], [*Min*], [*Q1*], [*Median*], [*Q3*], [*Max*], [*Mean*],\n",
    );
    let frequency = analysis.config.frequency;
    for asset in &analysis.assets {
        distribution_row(
            &mut out,
            &format!("{} {}", asset.symbol, frequency),
            asset.periodic_distribution.as_ref(),
        );
        if frequency != crate::domain::frequency::Frequency::Monthly {
            distribution_row(
                &mut out,
                &format!("{} Monthly", asset.symbol),
                asset.monthly_distribution.as_ref(),
            );
        }
    }
    out.push_str(")\n");
    out
}

fn strategy_row(out: &mut String, symbol: &str, s: &StrategySummary) {
    out.push_str(&format!(
        "  [{}], [{}], [{}], [{}], {}, {},\n",
        escape(symbol),
        s.kind,
        escape(&fmt_currency(s.initial_amount)),
        escape(&fmt_currency(s.final_value)),
        signed_cell(s.gain_or_loss, fmt_currency(s.gain_or_loss)),
        match s.cagr_pct {
            Some(cagr) => signed_cell(cagr, format!("{cagr:.2}%")),
            None => "[n/a]".to_string(),
        },
    ));
}

pub fn render_strategy_table(analysis: &Analysis) -> String {
    let mut out = String::from(
        "#table(\n  columns: 6,\n  align: (left, left, right, right, right, right),\n",
    );
    out.push_str(
        "  [*Asset*], [*Strategy*], [*Initial*], [*Final Value*], [*Gain/Loss*], [*CAGR*],\n",
    );
    for asset in &analysis.assets {
        strategy_row(&mut out, &asset.symbol, &asset.lump_sum_summary);
        strategy_row(&mut out, &asset.symbol, &asset.dca_summary);
    }
    out.push_str(")\n");
    out
}

/// Trend coefficients and the last forecast point per asset.
pub fn render_trend_table(analysis: &Analysis) -> String {
    let mut out = String::from(
        "#table(\n  columns: 5,\n  align: (left, right, right, right, right),\n",
    );
    out.push_str(
        "  [*Asset*], [*Slope / day*], [*Residual σ*], [*Forecast end*], [*Forecast value*],\n",
    );
    for asset in &analysis.assets {
        let trend = &asset.trend;
        let (end, value) = match trend.forecast.last() {
            Some(p) => (p.date.to_string(), format!("{:.2}", p.predicted)),
            None => ("-".into(), "-".into()),
        };
        out.push_str(&format!(
            "  [{}], [{:.4}], [{:.2}], [{}], [{}],\n",
            escape(&asset.symbol),
            trend.slope,
            trend.residual_stddev,
            end,
            value
        ));
    }
    out.push_str(")\n");
    out
}

pub fn render_warnings(warnings: &[String]) -> String {
    if warnings.is_empty() {
        return String::new();
    }
    let mut out = String::from("== Warnings\n\n");
    for w in warnings {
        out.push_str(&format!("- {}\n", escape(w)));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frequency::Frequency;
    use chrono::NaiveDate;

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            primary: "AAPL".into(),
            secondary: None,
            benchmark: Some("ACWI".into()),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 10, 25).unwrap(),
            risk_free_rate: 0.02,
            initial_amount: 10_000.0,
            base_contribution: 500.0,
            frequency: Frequency::Quarterly,
            management_fee_pct: 0.5,
        }
    }

    #[test]
    fn parameters_table_shows_fee_not_applied() {
        let out = render_parameters_table(&config());
        assert!(out.starts_with("#table("));
        assert!(out.contains("[AAPL]"));
        assert!(out.contains("0.50% (not applied)"));
        assert!(out.contains("$1500.00 per period"));
        assert!(out.contains("2.00%"));
        assert!(out.contains("2020-01-01 to 2024-10-25"));
    }

    #[test]
    fn escape_typst_markup() {
        assert_eq!(escape("BRK_B #1 $5"), "BRK\\_B \\#1 \\$5");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn signed_cell_colors() {
        assert!(signed_cell(1.0, "1".into()).contains("green"));
        assert!(signed_cell(-1.0, "-1".into()).contains("red"));
    }

    #[test]
    fn strategy_row_without_cagr() {
        let summary = StrategySummary {
            kind: crate::domain::simulation::StrategyKind::Dca,
            initial_amount: 0.0,
            final_value: 1050.0,
            gain_or_loss: 1050.0,
            cagr_pct: None,
        };
        let mut out = String::new();
        strategy_row(&mut out, "AAPL", &summary);
        assert!(out.contains("[DCA]"));
        assert!(out.contains("\\$1050.00"));
        assert!(out.trim_end().ends_with("[n/a],"));
    }

    #[test]
    fn missing_distribution_row() {
        let mut out = String::new();
        distribution_row(&mut out, "X", None);
        assert_eq!(out, "  [X], [0], [-], [-], [-], [-], [-], [-],\n");
    }

    #[test]
    fn warnings_section() {
        assert!(render_warnings(&[]).is_empty());
        let out = render_warnings(&["benchmark ACWI skipped: symbol not found".into()]);
        assert!(out.contains("== Warnings"));
        assert!(out.contains("- benchmark ACWI skipped"));
    }
}
