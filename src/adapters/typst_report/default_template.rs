//! Built-in Typst report template.
//!
//! Placeholders:
//! `{{TITLE}}`, `{{PERIOD}}`, `{{PARAMETERS_TABLE}}`, `{{METRICS_TABLE}}`,
//! `{{CUMULATIVE_RETURN_CHART}}`, `{{DISTRIBUTION_TABLE}}`,
//! `{{STRATEGY_TABLE}}`, `{{STRATEGY_CHARTS}}`, `{{TREND_TABLE}}`,
//! `{{TREND_CHARTS}}`, `{{WARNINGS}}`.

const TEMPLATE: &str = r#"#set page(paper: "a4", margin: (x: 1.8cm, y: 2cm), numbering: "1")
#set text(size: 10pt)
#set table(stroke: 0.5pt + luma(180), inset: 5pt)

= {{TITLE}}

_{{PERIOD}}_

{{WARNINGS}}

== Parameters

{{PARAMETERS_TABLE}}

== Return and Risk

{{METRICS_TABLE}}

{{CUMULATIVE_RETURN_CHART}}

== Return Distribution

{{DISTRIBUTION_TABLE}}

== Lump Sum vs DCA

{{STRATEGY_TABLE}}

{{STRATEGY_CHARTS}}

== Trend and 180-Day Forecast

{{TREND_TABLE}}

{{TREND_CHARTS}}
"#;

pub fn template() -> &'static str {
    TEMPLATE
}
