use crate::loader::describe_source;
use crate::models::{ChartData, Dashboard};
use std::fmt::Write;

pub fn render_index(dashboard: &Dashboard) -> String {
    let metrics = &dashboard.metrics;
    let notice = describe_source(&dashboard.source)
        .map(|text| format!(r#"<div class="notice">{}</div>"#, escape(&text)))
        .unwrap_or_default();

    INDEX_HTML
        .replace("{{TOTAL_SALES}}", &format_thousands(metrics.total_sales))
        .replace("{{AVERAGE_RATING}}", &format!("{:.1}", metrics.average_rating))
        .replace("{{STARS}}", &star_rating(metrics.average_rating))
        .replace("{{AVERAGE_SALE}}", &format!("{:.2}", metrics.average_sale))
        .replace("{{TRANSACTIONS}}", &metrics.transactions.to_string())
        .replace(
            "{{CITY_OPTIONS}}",
            &render_options(&dashboard.options.cities, &dashboard.selection.cities),
        )
        .replace(
            "{{CUSTOMER_TYPE_OPTIONS}}",
            &render_options(
                &dashboard.options.customer_types,
                &dashboard.selection.customer_types,
            ),
        )
        .replace(
            "{{GENDER_OPTIONS}}",
            &render_options(&dashboard.options.genders, &dashboard.selection.genders),
        )
        .replace("{{HOUR_CHART}}", &render_column_chart(&dashboard.sales_by_hour))
        .replace(
            "{{PRODUCT_CHART}}",
            &render_bar_chart(&dashboard.sales_by_product_line),
        )
        .replace("{{NOTICE}}", &notice)
}

/// `1234567` -> `1,234,567`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn star_rating(average: f64) -> String {
    let stars = average.round_ties_even().max(0.0) as usize;
    "★".repeat(stars)
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(ch),
        }
    }
    out
}

fn render_options(all: &[String], selected: &[String]) -> String {
    let mut html = String::new();
    for value in all {
        let attr = if selected.contains(value) { " selected" } else { "" };
        let value = escape(value);
        let _ = write!(html, r#"<option value="{value}"{attr}>{value}</option>"#);
    }
    html
}

const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 320.0;

fn render_placeholder(chart: &ChartData) -> Option<String> {
    if !chart.points.is_empty() {
        return None;
    }
    let message = chart.placeholder.as_deref().unwrap_or("No data");
    Some(format!(
        r#"<svg class="chart" viewBox="0 0 {CHART_WIDTH} {CHART_HEIGHT}" role="img" aria-label="{title}"><text class="chart-empty" x="50%" y="50%" text-anchor="middle">{message}</text></svg>"#,
        title = escape(&chart.title),
        message = escape(message),
    ))
}

fn max_value(chart: &ChartData) -> f64 {
    chart
        .points
        .iter()
        .map(|point| point.value)
        .fold(0.0_f64, f64::max)
        .max(1.0)
}

/// Vertical bars, one per point, left to right.
fn render_column_chart(chart: &ChartData) -> String {
    if let Some(empty) = render_placeholder(chart) {
        return empty;
    }

    let (left, right, top, bottom) = (48.0, 16.0, 16.0, 36.0);
    let plot_width = CHART_WIDTH - left - right;
    let plot_height = CHART_HEIGHT - top - bottom;
    let slot = plot_width / chart.points.len() as f64;
    let bar_width = slot * 0.7;
    let max = max_value(chart);

    let mut svg = String::new();
    for (i, point) in chart.points.iter().enumerate() {
        let height = point.value / max * plot_height;
        let x = left + slot * i as f64 + (slot - bar_width) / 2.0;
        let y = top + plot_height - height;
        let label = escape(&point.label);
        let _ = write!(
            svg,
            r#"<rect class="bar" x="{x:.1}" y="{y:.1}" width="{bar_width:.1}" height="{height:.1}"><title>{label}: {value:.2}</title></rect><text class="chart-label" x="{cx:.1}" y="{ly:.1}" text-anchor="middle">{label}</text>"#,
            value = point.value,
            cx = x + bar_width / 2.0,
            ly = CHART_HEIGHT - bottom + 18.0,
        );
    }
    let _ = write!(
        svg,
        r#"<line class="chart-axis" x1="{left}" y1="{base}" x2="{end}" y2="{base}" /><text class="chart-label" x="{lx}" y="{ty}" text-anchor="end">{max:.0}</text>"#,
        base = top + plot_height,
        end = CHART_WIDTH - right,
        lx = left - 6.0,
        ty = top + 4.0,
    );

    wrap_svg(&chart.title, &svg)
}

/// Horizontal bars with the first point at the bottom, so ascending input
/// reads smallest-to-largest from bottom to top.
fn render_bar_chart(chart: &ChartData) -> String {
    if let Some(empty) = render_placeholder(chart) {
        return empty;
    }

    let (left, right, top, bottom) = (170.0, 70.0, 12.0, 12.0);
    let plot_width = CHART_WIDTH - left - right;
    let plot_height = CHART_HEIGHT - top - bottom;
    let slot = plot_height / chart.points.len() as f64;
    let bar_height = slot * 0.7;
    let max = max_value(chart);

    let mut svg = String::new();
    for (row, point) in chart.points.iter().rev().enumerate() {
        let width = point.value / max * plot_width;
        let y = top + slot * row as f64 + (slot - bar_height) / 2.0;
        let label = escape(&point.label);
        let _ = write!(
            svg,
            r#"<text class="chart-label" x="{lx:.1}" y="{ty:.1}" text-anchor="end">{label}</text><rect class="bar" x="{left}" y="{y:.1}" width="{width:.1}" height="{bar_height:.1}"><title>{label}: {value:.2}</title></rect><text class="chart-value" x="{vx:.1}" y="{ty:.1}">{value:.2}</text>"#,
            value = point.value,
            lx = left - 8.0,
            vx = left + width + 6.0,
            ty = y + bar_height / 2.0 + 4.0,
        );
    }

    wrap_svg(&chart.title, &svg)
}

fn wrap_svg(title: &str, body: &str) -> String {
    format!(
        r#"<svg class="chart" viewBox="0 0 {CHART_WIDTH} {CHART_HEIGHT}" role="img" aria-label="{title}">{body}</svg>"#,
        title = escape(title),
    )
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Sales Dashboard</title>
  <style>
    :root {
      --bg: #f4f6fb;
      --ink: #1f2933;
      --muted: #6b7480;
      --accent: #1f77b4;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(31, 41, 51, 0.08);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Helvetica Neue", sans-serif;
      display: grid;
      grid-template-columns: 260px 1fr;
    }

    aside {
      background: var(--card);
      box-shadow: var(--shadow);
      padding: 28px 22px;
      display: grid;
      align-content: start;
      gap: 18px;
    }

    aside h2 {
      margin: 0;
      font-size: 1.1rem;
    }

    label {
      display: grid;
      gap: 6px;
      font-size: 0.9rem;
      color: var(--muted);
    }

    select {
      width: 100%;
      min-height: 88px;
      border: 1px solid rgba(31, 41, 51, 0.15);
      border-radius: 10px;
      padding: 6px;
      font-size: 0.95rem;
    }

    .actions {
      display: flex;
      gap: 10px;
      align-items: center;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 18px;
      background: var(--accent);
      color: white;
      font-weight: 600;
      cursor: pointer;
    }

    .hint {
      margin: 0;
      font-size: 0.8rem;
      color: var(--muted);
    }

    main {
      padding: 32px 36px 48px;
      display: grid;
      align-content: start;
      gap: 24px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.8rem, 3vw, 2.4rem);
    }

    .notice {
      background: #fff4d6;
      border: 1px solid #f0c36d;
      border-radius: 12px;
      padding: 12px 16px;
      color: #7a5200;
    }

    .metrics {
      display: grid;
      grid-template-columns: repeat(3, minmax(0, 1fr));
      gap: 16px;
    }

    .metric {
      background: var(--card);
      border-radius: 16px;
      box-shadow: var(--shadow);
      padding: 18px 20px;
      display: grid;
      gap: 8px;
    }

    .metric .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .metric .value {
      font-size: 1.6rem;
      font-weight: 600;
    }

    .stars {
      color: #f5a623;
      letter-spacing: 0.05em;
    }

    hr {
      border: none;
      border-top: 1px solid rgba(31, 41, 51, 0.12);
      margin: 0;
    }

    .charts {
      display: grid;
      grid-template-columns: repeat(2, minmax(0, 1fr));
      gap: 16px;
    }

    .chart-card {
      background: var(--card);
      border-radius: 16px;
      box-shadow: var(--shadow);
      padding: 16px;
    }

    .chart-card h3 {
      margin: 0 0 8px;
      font-size: 1.05rem;
    }

    .chart {
      width: 100%;
      height: auto;
      display: block;
    }

    .bar {
      fill: var(--accent);
    }

    .chart-axis {
      stroke: rgba(31, 41, 51, 0.25);
    }

    .chart-label,
    .chart-value {
      fill: var(--muted);
      font-size: 12px;
    }

    .chart-empty {
      fill: var(--muted);
      font-size: 16px;
    }

    @media (max-width: 900px) {
      body {
        grid-template-columns: 1fr;
      }
      .metrics,
      .charts {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <aside>
    <h2>Filter the data</h2>
    <form method="get" action="/">
      <label>City
        <select name="city" multiple onchange="this.form.submit()">{{CITY_OPTIONS}}</select>
      </label>
      <label>Customer type
        <select name="customer_type" multiple onchange="this.form.submit()">{{CUSTOMER_TYPE_OPTIONS}}</select>
      </label>
      <label>Gender
        <select name="gender" multiple onchange="this.form.submit()">{{GENDER_OPTIONS}}</select>
      </label>
      <div class="actions">
        <button type="submit">Apply</button>
        <a href="/">Reset</a>
      </div>
    </form>
    <p class="hint">Clearing every value in a filter shows all of its values again.</p>
  </aside>

  <main>
    <h1>Sales Dashboard</h1>
    {{NOTICE}}

    <section class="metrics">
      <div class="metric">
        <span class="label">Total sales</span>
        <span class="value" id="total-sales">RMB ¥ {{TOTAL_SALES}}</span>
      </div>
      <div class="metric">
        <span class="label">Average rating</span>
        <span class="value" id="average-rating">{{AVERAGE_RATING}} <span class="stars">{{STARS}}</span></span>
      </div>
      <div class="metric">
        <span class="label">Average sale per transaction</span>
        <span class="value" id="average-sale">RMB ¥ {{AVERAGE_SALE}}</span>
      </div>
    </section>
    <p class="hint">{{TRANSACTIONS}} transactions match the current filters.</p>

    <hr />

    <section class="charts">
      <div class="chart-card">
        <h3>Sales by hour</h3>
        {{HOUR_CHART}}
      </div>
      <div class="chart-card">
        <h3>Sales by product line</h3>
        {{PRODUCT_CHART}}
      </div>
    </section>
  </main>
</body>
</html>
"#;
