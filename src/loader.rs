use crate::config::Config;
use crate::errors::LoadError;
use crate::models::{DataSource, Dataset, Record};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{NaiveDateTime, NaiveTime, Timelike};
use std::{collections::HashSet, path::Path};
use tokio::fs;
use tracing::{debug, error, info, warn};

/// A sheet row before the hour is derived and the row is validated.
#[derive(Debug, Clone, Default)]
pub struct SalesRow {
    pub order_id: String,
    pub city: String,
    pub customer_type: String,
    pub gender: String,
    pub product_line: String,
    pub total: Option<f64>,
    pub rating: Option<f64>,
    pub time: String,
    /// Set when the sheet stored a real time value rather than text.
    pub clock: Option<NaiveTime>,
}

/// Loads the workbook named by `config`, substituting the built-in sample
/// rows when it cannot be read. Never fails.
pub async fn load_dataset(config: &Config) -> Dataset {
    match read_workbook(config).await {
        Ok(records) => {
            info!(
                "loaded {} sales records from {}",
                records.len(),
                config.data_path.display()
            );
            Dataset {
                records,
                source: DataSource::Workbook {
                    path: config.data_path.clone(),
                },
            }
        }
        Err(err) => {
            match &err {
                LoadError::NotFound(_) => warn!("{err}; using built-in sample data"),
                _ => error!("{err}; using built-in sample data"),
            }
            Dataset {
                records: fixture_records(),
                source: DataSource::Fixture {
                    reason: err.to_string(),
                },
            }
        }
    }
}

async fn read_workbook(config: &Config) -> Result<Vec<Record>, LoadError> {
    match fs::metadata(&config.data_path).await {
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::NotFound(config.data_path.clone()));
        }
        Err(err) => return Err(LoadError::Workbook(err.to_string())),
    }

    let path = config.data_path.clone();
    let sheet = config.sheet_name.clone();
    let skip_rows = config.skip_rows;
    let rows = tokio::task::spawn_blocking(move || read_sheet(&path, &sheet, skip_rows))
        .await
        .map_err(|err| LoadError::Workbook(err.to_string()))??;

    Ok(prepare(rows))
}

fn read_sheet(path: &Path, sheet: &str, skip_rows: usize) -> Result<Vec<SalesRow>, LoadError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| LoadError::Workbook(err.to_string()))?;

    let range = if workbook.sheet_names().iter().any(|name| name == sheet) {
        workbook
            .worksheet_range(sheet)
            .map_err(|err| LoadError::Workbook(err.to_string()))?
    } else {
        warn!("sheet '{sheet}' not found in {}, reading the first sheet", path.display());
        workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LoadError::Workbook("workbook has no sheets".to_string()))?
            .map_err(|err| LoadError::Workbook(err.to_string()))?
    };

    rows_from_cells(sheet, range.rows().skip(skip_rows))
}

/// Reads the header row from `rows`, then maps every following non-blank row
/// onto the sales columns.
pub fn rows_from_cells<'a>(
    sheet: &str,
    mut rows: impl Iterator<Item = &'a [Data]>,
) -> Result<Vec<SalesRow>, LoadError> {
    let header = rows
        .next()
        .ok_or_else(|| LoadError::EmptySheet(sheet.to_string()))?;
    let columns = ColumnMap::from_header(header)?;

    Ok(rows
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|row| columns.read(row))
        .collect())
}

static EMPTY_CELL: Data = Data::Empty;

struct ColumnMap {
    order_id: usize,
    city: usize,
    customer_type: usize,
    gender: usize,
    product_line: usize,
    total: usize,
    time: usize,
    rating: usize,
}

impl ColumnMap {
    fn from_header(header: &[Data]) -> Result<Self, LoadError> {
        let names: Vec<String> = header.iter().map(|cell| normalize(&cell_text(cell))).collect();

        Ok(Self {
            order_id: find_column(&names, "order id", &["订单号", "invoice id", "order id"])?,
            city: find_column(&names, "city", &["城市", "city"])?,
            customer_type: find_column(&names, "customer type", &["顾客类型", "customer type"])?,
            gender: find_column(&names, "gender", &["性别", "gender"])?,
            product_line: find_column(
                &names,
                "product line",
                &["产品类型", "product line", "product category"],
            )?,
            total: find_column(&names, "total", &["总价", "total", "total price"])?,
            time: find_column(&names, "time", &["时间", "time"])?,
            rating: find_column(&names, "rating", &["评分", "rating"])?,
        })
    }

    fn read(&self, row: &[Data]) -> SalesRow {
        let cell = |index: usize| row.get(index).unwrap_or(&EMPTY_CELL);
        let time = cell(self.time);

        SalesRow {
            order_id: cell_text(cell(self.order_id)),
            city: cell_text(cell(self.city)),
            customer_type: cell_text(cell(self.customer_type)),
            gender: cell_text(cell(self.gender)),
            product_line: cell_text(cell(self.product_line)),
            total: cell_number(cell(self.total)),
            rating: cell_number(cell(self.rating)),
            time: cell_text(time),
            clock: cell_clock(time),
        }
    }
}

fn find_column(
    names: &[String],
    column: &'static str,
    aliases: &[&str],
) -> Result<usize, LoadError> {
    names
        .iter()
        .position(|name| aliases.contains(&name.as_str()))
        .ok_or(LoadError::MissingColumn(column))
}

fn normalize(header: &str) -> String {
    header.trim().to_lowercase().replace('_', " ")
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(value) => value.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(value) => Some(*value),
        Data::Int(value) => Some(*value as f64),
        Data::String(value) => value.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|value| value.is_finite())
}

fn cell_clock(cell: &Data) -> Option<NaiveTime> {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => cell.as_time(),
        Data::Float(fraction) if (0.0..1.0).contains(fraction) => {
            let seconds = (fraction * 86_400.0).round() as u32 % 86_400;
            NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
        }
        _ => None,
    }
}

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Hour of day for a time-of-day string. `HH:MM:SS` is tried first, then a
/// few looser layouts; anything else yields `None`.
pub fn parse_hour(text: &str) -> Option<u8> {
    parse_clock(text).map(|time| time.hour() as u8)
}

fn parse_clock(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(time) = NaiveTime::parse_from_str(text, "%H:%M:%S") {
        return Some(time);
    }

    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.time())
        })
}

/// Derives the hour for every row and keeps only rows that can take part in
/// the dashboard: a unique non-empty id, numeric total and rating, and a
/// parseable time.
pub fn prepare(rows: Vec<SalesRow>) -> Vec<Record> {
    let mut seen = HashSet::new();
    let mut bad_time = 0usize;
    let mut bad_number = 0usize;
    let mut bad_id = 0usize;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(hour) = row
            .clock
            .map(|time| time.hour() as u8)
            .or_else(|| parse_hour(&row.time))
        else {
            debug!("dropping order {:?}: unparseable time {:?}", row.order_id, row.time);
            bad_time += 1;
            continue;
        };
        let (Some(total), Some(rating)) = (row.total, row.rating) else {
            debug!("dropping order {:?}: non-numeric total or rating", row.order_id);
            bad_number += 1;
            continue;
        };
        if row.order_id.is_empty() || !seen.insert(row.order_id.clone()) {
            debug!("dropping row with missing or repeated order id {:?}", row.order_id);
            bad_id += 1;
            continue;
        }

        let time = match row.clock {
            Some(clock) => clock.format("%H:%M:%S").to_string(),
            None => row.time,
        };

        records.push(Record {
            order_id: row.order_id,
            city: row.city,
            customer_type: row.customer_type,
            gender: row.gender,
            product_line: row.product_line,
            total,
            time,
            rating,
            hour,
        });
    }

    if bad_time + bad_number + bad_id > 0 {
        info!(
            "dropped {} rows ({bad_time} unparseable time, {bad_number} non-numeric, {bad_id} bad order id)",
            bad_time + bad_number + bad_id
        );
    }
    records
}

/// Ten sample transactions across three cities, served when no workbook is
/// available.
pub fn fixture_records() -> Vec<Record> {
    const CITIES: [&str; 3] = ["Taiyuan", "Linfen", "Datong"];
    const CUSTOMER_TYPES: [&str; 2] = ["Member", "Normal"];
    const GENDERS: [&str; 2] = ["Male", "Female"];
    const PRODUCT_LINES: [&str; 6] = [
        "Food and beverages",
        "Sports and travel",
        "Electronic accessories",
        "Fashion accessories",
        "Home and lifestyle",
        "Health and beauty",
    ];
    const TOTALS: [f64; 10] = [
        150.5, 280.8, 320.2, 180.9, 250.3, 190.7, 160.2, 290.5, 310.8, 170.4,
    ];
    const TIMES: [&str; 10] = [
        "10:30:00", "11:15:00", "12:45:00", "13:20:00", "14:50:00", "15:10:00", "16:30:00",
        "17:40:00", "18:20:00", "19:10:00",
    ];
    const RATINGS: [f64; 10] = [7.2, 6.8, 7.5, 6.9, 7.1, 7.3, 6.7, 7.0, 7.4, 6.6];

    let rows = (0..10)
        .map(|i| SalesRow {
            order_id: (i + 1).to_string(),
            city: CITIES[i % CITIES.len()].to_string(),
            customer_type: CUSTOMER_TYPES[i % CUSTOMER_TYPES.len()].to_string(),
            gender: GENDERS[i % GENDERS.len()].to_string(),
            product_line: PRODUCT_LINES[i % PRODUCT_LINES.len()].to_string(),
            total: Some(TOTALS[i]),
            rating: Some(RATINGS[i]),
            time: TIMES[i].to_string(),
            clock: None,
        })
        .collect();
    prepare(rows)
}

pub fn describe_source(source: &DataSource) -> Option<String> {
    match source {
        DataSource::Workbook { .. } => None,
        DataSource::Fixture { reason } => Some(format!("Showing sample data: {reason}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    fn row(id: &str, time: &str) -> SalesRow {
        SalesRow {
            order_id: id.to_string(),
            city: "A".to_string(),
            customer_type: "Member".to_string(),
            gender: "Male".to_string(),
            product_line: "X".to_string(),
            total: Some(10.0),
            rating: Some(7.0),
            time: time.to_string(),
            clock: None,
        }
    }

    #[test]
    fn hour_from_standard_time() {
        assert_eq!(parse_hour("14:50:00"), Some(14));
        assert_eq!(parse_hour("00:00:00"), Some(0));
        assert_eq!(parse_hour("23:59:59"), Some(23));
    }

    #[test]
    fn hour_from_looser_layouts() {
        assert_eq!(parse_hour("9:05"), Some(9));
        assert_eq!(parse_hour("1:30:00 PM"), Some(13));
        assert_eq!(parse_hour("2019-01-05 13:08:00"), Some(13));
        assert_eq!(parse_hour(" 10:30:00.5 "), Some(10));
    }

    #[test]
    fn unparseable_time_has_no_hour() {
        assert_eq!(parse_hour(""), None);
        assert_eq!(parse_hour("lunchtime"), None);
        assert_eq!(parse_hour("25:00:00"), None);
    }

    #[test]
    fn prepare_drops_rows_without_hour() {
        let records = prepare(vec![row("1", "14:50:00"), row("2", ""), row("3", "nope")]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].order_id, "1");
        assert_eq!(records[0].hour, 14);
    }

    #[test]
    fn prepare_keeps_first_of_repeated_ids() {
        let mut second = row("1", "11:00:00");
        second.city = "B".to_string();
        let records = prepare(vec![row("1", "10:00:00"), second, row("", "12:00:00")]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].city, "A");
    }

    #[test]
    fn prepare_drops_non_numeric_rows() {
        let mut bad = row("2", "10:00:00");
        bad.total = None;
        let records = prepare(vec![row("1", "10:00:00"), bad]);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn fixture_has_ten_rows_over_three_cities() {
        let records = fixture_records();
        assert_eq!(records.len(), 10);
        assert!(records.iter().all(|r| r.hour <= 23));
        assert_eq!(records[4].hour, 14);
        let cities: HashSet<&str> = records.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities.len(), 3);
    }

    #[test]
    fn cells_map_through_chinese_headers() {
        let rows = vec![
            vec![
                text("订单号"),
                text("城市"),
                text("顾客类型"),
                text("性别"),
                text("产品类型"),
                text("总价"),
                text("时间"),
                text("评分"),
            ],
            vec![
                Data::Float(101.0),
                text("Taiyuan"),
                text("Member"),
                text("Female"),
                text("Home and lifestyle"),
                text("1,234.5"),
                text("13:20:00"),
                Data::Float(8.1),
            ],
            vec![Data::Empty; 8],
            vec![
                Data::Int(102),
                text("Datong"),
                text("Normal"),
                text("Male"),
                text("Sports and travel"),
                Data::Float(99.0),
                Data::Float(0.4375),
                Data::Int(6),
            ],
        ];

        let parsed = rows_from_cells("sales", rows.iter().map(|r| r.as_slice())).unwrap();
        assert_eq!(parsed.len(), 2);

        let records = prepare(parsed);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].order_id, "101");
        assert_eq!(records[0].total, 1234.5);
        assert_eq!(records[0].hour, 13);
        assert_eq!(records[1].order_id, "102");
        assert_eq!(records[1].hour, 10);
        assert_eq!(records[1].rating, 6.0);
    }

    #[test]
    fn cells_map_through_english_headers() {
        let rows = vec![
            vec![
                text("Invoice ID"),
                text("Branch"),
                text("City"),
                text("Customer_type"),
                text("Gender"),
                text("Product line"),
                text("Total"),
                text("Time"),
                text("Rating"),
            ],
            vec![
                text("750-67-8428"),
                text("A"),
                text("Yangon"),
                text("Member"),
                text("Female"),
                text("Health and beauty"),
                Data::Float(548.9715),
                text("13:08"),
                Data::Float(9.1),
            ],
        ];

        let records = prepare(rows_from_cells("Sheet1", rows.iter().map(|r| r.as_slice())).unwrap());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].city, "Yangon");
        assert_eq!(records[0].hour, 13);
    }

    #[test]
    fn missing_column_is_reported() {
        let rows = vec![vec![text("City"), text("Gender")]];
        let err = rows_from_cells("Sheet1", rows.iter().map(|r| r.as_slice())).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("order id")));
    }

    #[test]
    fn empty_sheet_is_reported() {
        let rows: Vec<Vec<Data>> = Vec::new();
        let err = rows_from_cells("Sheet1", rows.iter().map(|r| r.as_slice())).unwrap_err();
        assert!(matches!(err, LoadError::EmptySheet(_)));
    }

    #[tokio::test]
    async fn missing_workbook_falls_back_to_fixture() {
        let config = Config {
            data_path: std::env::temp_dir().join("sales_dashboard_missing_workbook.xlsx"),
            ..Config::default()
        };
        let dataset = load_dataset(&config).await;
        assert_eq!(dataset.records.len(), 10);
        assert!(matches!(dataset.source, DataSource::Fixture { .. }));
        assert!(describe_source(&dataset.source).is_some());
    }
}
