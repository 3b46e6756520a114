//! SVG chart rendering for reports.
//!
//! All charts share one date-scaled line renderer: x is days since the
//! earliest point across every series, y is linear between the global
//! min and max. Bands are drawn as closed polygons under the lines.

use chrono::NaiveDate;

use crate::domain::analysis::{Analysis, AssetView};
use crate::domain::returns::ReturnMetrics;

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

const PALETTE: [&str; 3] = ["#2563eb", "#dc2626", "#6b7280"];

pub struct LineSeries {
    pub label: String,
    pub color: &'static str,
    pub dashed: bool,
    pub points: Vec<(NaiveDate, f64)>,
}

pub struct BandArea {
    pub color: &'static str,
    pub opacity: f64,
    /// (date, lower, upper)
    pub points: Vec<(NaiveDate, f64, f64)>,
}

struct Bounds {
    first_date: NaiveDate,
    last_date: NaiveDate,
    min: f64,
    max: f64,
}

impl Bounds {
    fn of(series: &[LineSeries], bands: &[BandArea]) -> Option<Self> {
        let line_points = series.iter().flat_map(|s| s.points.iter().copied());
        let band_points = bands
            .iter()
            .flat_map(|b| b.points.iter().flat_map(|&(d, lo, hi)| [(d, lo), (d, hi)]));

        let mut bounds: Option<Bounds> = None;
        for (date, value) in line_points.chain(band_points) {
            if !value.is_finite() {
                continue;
            }
            bounds = Some(match bounds {
                None => Bounds {
                    first_date: date,
                    last_date: date,
                    min: value,
                    max: value,
                },
                Some(b) => Bounds {
                    first_date: b.first_date.min(date),
                    last_date: b.last_date.max(date),
                    min: b.min.min(value),
                    max: b.max.max(value),
                },
            });
        }
        bounds
    }

    fn x(&self, date: NaiveDate) -> f64 {
        let span = (self.last_date - self.first_date).num_days().max(1) as f64;
        let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        MARGIN_LEFT + ((date - self.first_date).num_days() as f64 / span) * plot_width
    }

    fn y(&self, value: f64) -> f64 {
        let range = (self.max - self.min).max(1e-9);
        let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        MARGIN_TOP + plot_height - ((value - self.min) / range) * plot_height
    }
}

/// Renders a line chart. Returns an empty string when there is nothing to
/// draw.
pub fn line_chart_svg(
    y_label: &str,
    series: &[LineSeries],
    bands: &[BandArea],
    format_value: fn(f64) -> String,
) -> String {
    let Some(bounds) = Bounds::of(series, bands) else {
        return String::new();
    };
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"15\" text-anchor=\"end\" font-size=\"12\" fill=\"#666\">{}</text>\n",
        CHART_WIDTH,
        escape_xml(y_label)
    ));

    // Axes
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));

    for (value, y) in [
        (bounds.max, MARGIN_TOP + 5.0),
        ((bounds.max + bounds.min) / 2.0, MARGIN_TOP + plot_height / 2.0),
        (bounds.min, CHART_HEIGHT - MARGIN_BOTTOM - 5.0),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            y,
            escape_xml(&format_value(value))
        ));
    }

    let mid_date = bounds.first_date + (bounds.last_date - bounds.first_date) / 2;
    for (date, x) in [
        (bounds.first_date, MARGIN_LEFT),
        (mid_date, MARGIN_LEFT + plot_width / 2.0),
        (bounds.last_date, CHART_WIDTH - MARGIN_RIGHT),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            x, CHART_HEIGHT, date
        ));
    }

    for band in bands {
        if band.points.is_empty() {
            continue;
        }
        let upper = band
            .points
            .iter()
            .map(|&(d, _, hi)| format!("{:.1},{:.1}", bounds.x(d), bounds.y(hi)));
        let lower = band
            .points
            .iter()
            .rev()
            .map(|&(d, lo, _)| format!("{:.1},{:.1}", bounds.x(d), bounds.y(lo)));
        let polygon: Vec<String> = upper.chain(lower).collect();
        svg.push_str(&format!(
            "  <polygon points=\"{}\" fill=\"{}\" fill-opacity=\"{:.2}\" stroke=\"none\"/>\n",
            polygon.join(" "),
            band.color,
            band.opacity
        ));
    }

    for s in series {
        let path = path_data(&bounds, &s.points);
        if path.is_empty() {
            continue;
        }
        let dash = if s.dashed {
            " stroke-dasharray=\"6 4\""
        } else {
            ""
        };
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"{}/>\n",
            path, s.color, dash
        ));
    }

    // Legend
    for (i, s) in series.iter().enumerate() {
        let x = MARGIN_LEFT + 10.0 + i as f64 * 160.0;
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"8\" width=\"12\" height=\"4\" fill=\"{}\"/>\n",
            x, s.color
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"14\" font-size=\"10\" fill=\"#333\">{}</text>\n",
            x + 16.0,
            escape_xml(&s.label)
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn path_data(bounds: &Bounds, points: &[(NaiveDate, f64)]) -> String {
    let mut path = String::new();
    for &(date, value) in points.iter().filter(|(_, v)| v.is_finite()) {
        let cmd = if path.is_empty() { "M" } else { " L" };
        path.push_str(&format!(
            "{} {:.1} {:.1}",
            cmd,
            bounds.x(date),
            bounds.y(value)
        ));
    }
    path
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn fmt_pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn fmt_money(value: f64) -> String {
    if value >= 0.0 {
        format!("${:.0}", value)
    } else {
        format!("-${:.0}", value.abs())
    }
}

/// Growth multiples as gains, so 1.21 plots as 21%.
fn gain_points(metrics: &ReturnMetrics) -> Vec<(NaiveDate, f64)> {
    metrics
        .dates
        .iter()
        .copied()
        .zip(metrics.cumulative_returns.iter().map(|c| c - 1.0))
        .collect()
}

/// Cumulative return of every asset and the benchmark.
pub fn cumulative_return_svg(analysis: &Analysis) -> String {
    let mut series: Vec<LineSeries> = analysis
        .assets
        .iter()
        .zip(PALETTE)
        .map(|(asset, color)| LineSeries {
            label: asset.symbol.clone(),
            color,
            dashed: false,
            points: gain_points(&asset.metrics),
        })
        .collect();

    if let Some(benchmark) = &analysis.benchmark {
        series.push(LineSeries {
            label: benchmark.symbol.clone(),
            color: PALETTE[2],
            dashed: true,
            points: gain_points(&benchmark.metrics),
        });
    }

    line_chart_svg("Cumulative return", &series, &[], fmt_pct)
}

/// Lump Sum against DCA portfolio value for one asset.
pub fn strategy_svg(asset: &AssetView) -> String {
    let series: Vec<LineSeries> = [&asset.lump_sum, &asset.dca]
        .into_iter()
        .zip(PALETTE)
        .map(|(trajectory, color)| LineSeries {
            label: format!("{} {}", asset.symbol, trajectory.kind),
            color,
            dashed: false,
            points: trajectory.points.iter().map(|p| (p.date, p.value)).collect(),
        })
        .collect();

    line_chart_svg("Portfolio value", &series, &[], fmt_money)
}

/// Price, fitted trend, ±1/2/3σ bands and the forecast for one asset.
pub fn trend_svg(asset: &AssetView) -> String {
    let trend = &asset.trend;

    // Widest band first so narrower ones stay visible on top.
    let bands: Vec<BandArea> = (0..3)
        .rev()
        .map(|i| BandArea {
            color: PALETTE[0],
            opacity: 0.08 + 0.06 * (2 - i) as f64,
            points: trend
                .all_points()
                .map(|p| (p.date, p.bands[i].lower, p.bands[i].upper))
                .collect(),
        })
        .collect();

    let series = vec![
        LineSeries {
            label: format!("{} price", asset.symbol),
            color: PALETTE[2],
            dashed: false,
            points: trend
                .fitted
                .iter()
                .filter_map(|p| p.actual.map(|a| (p.date, a)))
                .collect(),
        },
        LineSeries {
            label: "Trend".to_string(),
            color: PALETTE[0],
            dashed: false,
            points: trend.fitted.iter().map(|p| (p.date, p.predicted)).collect(),
        },
        LineSeries {
            label: "Forecast".to_string(),
            color: PALETTE[1],
            dashed: true,
            points: trend.forecast.iter().map(|p| (p.date, p.predicted)).collect(),
        },
    ];

    line_chart_svg("Price", &series, &bands, |v| format!("{:.2}", v))
}
