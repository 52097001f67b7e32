use crate::filter::filter_records;
use crate::models::{
    ChartData, ChartPoint, Dashboard, Dataset, FilterOptions, FilterSelection, Metrics, Record,
};
use std::collections::BTreeMap;

/// Inclusive range of hours kept by the hourly chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourWindow {
    start: u8,
    end: u8,
}

impl HourWindow {
    pub fn new(start: u8, end: u8) -> Option<Self> {
        (start <= end && end <= 23).then_some(Self { start, end })
    }

    pub fn contains(&self, hour: u8) -> bool {
        (self.start..=self.end).contains(&hour)
    }
}

impl Default for HourWindow {
    fn default() -> Self {
        Self { start: 10, end: 20 }
    }
}

/// Runs the whole pipeline for one interaction: filter the dataset by
/// `selection`, then aggregate the filtered view.
pub fn build_dashboard(
    dataset: &Dataset,
    selection: &FilterSelection,
    window: Option<HourWindow>,
) -> Dashboard {
    let options = FilterOptions::from_records(&dataset.records);
    let view = filter_records(&dataset.records, selection);

    Dashboard {
        source: dataset.source.clone(),
        selection: selection.resolve(&options),
        options,
        metrics: compute_metrics(&view),
        sales_by_hour: revenue_by_hour(&view, window),
        sales_by_product_line: revenue_by_product_line(&view),
    }
}

pub fn compute_metrics(view: &[&Record]) -> Metrics {
    if view.is_empty() {
        return Metrics::default();
    }

    let count = view.len() as f64;
    let total_revenue: f64 = view.iter().map(|r| r.total).sum();
    let rating_sum: f64 = view.iter().map(|r| r.rating).sum();

    Metrics {
        transactions: view.len(),
        total_revenue,
        total_sales: total_revenue.trunc() as i64,
        average_rating: round_to(rating_sum / count, 1),
        average_sale: round_to(total_revenue / count, 2),
    }
}

/// Revenue per product line, smallest first.
pub fn revenue_by_product_line(view: &[&Record]) -> ChartData {
    let title = "Sales by product line".to_string();
    if view.is_empty() {
        return ChartData {
            title,
            points: Vec::new(),
            placeholder: Some("No product sales data".to_string()),
        };
    }

    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for record in view {
        *sums.entry(record.product_line.as_str()).or_default() += record.total;
    }

    let mut points: Vec<ChartPoint> = sums
        .into_iter()
        .map(|(label, value)| ChartPoint {
            label: label.to_string(),
            value,
        })
        .collect();
    points.sort_by(|a, b| a.value.total_cmp(&b.value));

    ChartData {
        title,
        points,
        placeholder: None,
    }
}

/// Revenue per hour of day in ascending hour order, restricted to `window`
/// when one is given.
pub fn revenue_by_hour(view: &[&Record], window: Option<HourWindow>) -> ChartData {
    let title = "Sales by hour".to_string();
    if view.is_empty() {
        return ChartData {
            title,
            points: Vec::new(),
            placeholder: Some("No hourly sales data".to_string()),
        };
    }

    let mut sums: BTreeMap<u8, f64> = BTreeMap::new();
    for record in view {
        if window.is_some_and(|w| !w.contains(record.hour)) {
            continue;
        }
        *sums.entry(record.hour).or_default() += record.total;
    }

    let placeholder = match window {
        Some(w) if sums.is_empty() => Some(format!(
            "No sales between {:02}:00 and {:02}:00",
            w.start, w.end
        )),
        _ => None,
    };

    ChartData {
        title,
        points: sums
            .into_iter()
            .map(|(hour, value)| ChartPoint {
                label: hour.to_string(),
                value,
            })
            .collect(),
        placeholder,
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    let rounded = (value * factor).round_ties_even() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::fixture_records;
    use crate::models::DataSource;

    fn record(id: &str, product_line: &str, total: f64, hour: u8) -> Record {
        Record {
            order_id: id.to_string(),
            city: "A".to_string(),
            customer_type: "Member".to_string(),
            gender: "Female".to_string(),
            product_line: product_line.to_string(),
            total,
            time: format!("{hour:02}:00:00"),
            rating: 5.0,
            hour,
        }
    }

    fn fixture_dataset() -> Dataset {
        Dataset {
            records: fixture_records(),
            source: DataSource::Fixture {
                reason: "test".to_string(),
            },
        }
    }

    #[test]
    fn metrics_on_empty_view_are_zero() {
        let metrics = compute_metrics(&[]);
        assert_eq!(metrics, Metrics::default());
        assert_eq!(metrics.average_rating, 0.0);
        assert_eq!(metrics.average_sale, 0.0);
    }

    #[test]
    fn metrics_match_true_means() {
        let records = vec![record("1", "X", 10.0, 11), record("2", "Y", 25.5, 12)];
        let view: Vec<&Record> = records.iter().collect();
        let metrics = compute_metrics(&view);

        assert_eq!(metrics.transactions, 2);
        assert!((metrics.total_revenue - 35.5).abs() < 1e-9);
        assert_eq!(metrics.total_sales, 35);
        assert_eq!(metrics.average_rating, 5.0);
        assert_eq!(metrics.average_sale, 17.75);
    }

    #[test]
    fn product_lines_partition_the_total_and_sort_ascending() {
        let records = fixture_records();
        let view: Vec<&Record> = records.iter().collect();
        let chart = revenue_by_product_line(&view);
        let metrics = compute_metrics(&view);

        let sum: f64 = chart.points.iter().map(|p| p.value).sum();
        assert!((sum - metrics.total_revenue).abs() < 1e-6);
        assert!(chart.points.windows(2).all(|w| w[0].value <= w[1].value));
        assert_eq!(chart.points.len(), 6);
        assert!(chart.placeholder.is_none());
    }

    #[test]
    fn hours_are_grouped_and_windowed() {
        let records = vec![
            record("1", "X", 5.0, 9),
            record("2", "X", 7.0, 14),
            record("3", "X", 3.0, 14),
            record("4", "X", 1.0, 10),
            record("5", "X", 2.0, 20),
            record("6", "X", 4.0, 21),
        ];
        let view: Vec<&Record> = records.iter().collect();

        let windowed = revenue_by_hour(&view, Some(HourWindow::default()));
        let labels: Vec<&str> = windowed.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["10", "14", "20"]);
        assert_eq!(windowed.points[1].value, 10.0);

        let all = revenue_by_hour(&view, None);
        assert_eq!(all.points.len(), 5);
        assert_eq!(all.points[0].label, "9");
    }

    #[test]
    fn hours_outside_window_give_empty_chart() {
        let records = vec![record("1", "X", 5.0, 8), record("2", "X", 6.0, 22)];
        let view: Vec<&Record> = records.iter().collect();

        let chart = revenue_by_hour(&view, Some(HourWindow::default()));
        assert!(chart.points.is_empty());
        assert_eq!(
            chart.placeholder.as_deref(),
            Some("No sales between 10:00 and 20:00")
        );
    }

    #[test]
    fn empty_view_charts_have_placeholders() {
        assert!(revenue_by_hour(&[], None).placeholder.is_some());
        assert!(revenue_by_product_line(&[]).placeholder.is_some());
    }

    #[test]
    fn dashboard_for_single_city() {
        let dataset = fixture_dataset();
        let selection = FilterSelection {
            cities: vec!["Taiyuan".to_string()],
            ..FilterSelection::default()
        };
        let dashboard = build_dashboard(&dataset, &selection, Some(HourWindow::default()));

        let expected: f64 = dataset
            .records
            .iter()
            .filter(|r| r.city == "Taiyuan")
            .map(|r| r.total)
            .sum();
        assert_eq!(dashboard.metrics.transactions, 4);
        assert!((dashboard.metrics.total_revenue - expected).abs() < 1e-9);
        assert_eq!(dashboard.selection.cities, vec!["Taiyuan"]);
        assert_eq!(dashboard.selection.genders, vec!["Male", "Female"]);
        assert_eq!(dashboard.metrics.average_rating, 6.8);
    }

    #[test]
    fn average_rating_rounds_half_to_even() {
        let dashboard = build_dashboard(
            &fixture_dataset(),
            &FilterSelection::default(),
            Some(HourWindow::default()),
        );
        assert_eq!(dashboard.metrics.average_rating, 7.0);
        assert_eq!(dashboard.metrics.average_sale, 230.53);
    }

    #[test]
    fn window_bounds_are_checked() {
        assert!(HourWindow::new(10, 20).is_some());
        assert!(HourWindow::new(0, 23).is_some());
        assert!(HourWindow::new(21, 20).is_none());
        assert!(HourWindow::new(5, 24).is_none());
        let window = HourWindow::default();
        assert!(window.contains(10) && window.contains(20));
        assert!(!window.contains(9) && !window.contains(21));
    }

    #[test]
    fn rounding_helper() {
        assert_eq!(round_to(7.04, 1), 7.0);
        assert_eq!(round_to(230.525_1, 2), 230.53);
        assert_eq!(round_to(-0.001, 2), 0.0);
        assert_eq!(round_to(6.85, 1), 6.8);
        assert_eq!(round_to(0.25, 1), 0.2);
    }
}
