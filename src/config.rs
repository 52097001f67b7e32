use std::{env, path::PathBuf};
use tracing::warn;

use crate::stats::HourWindow;

const DEFAULT_DATA_PATH: &str = "supermarket_sales.xlsx";
const DEFAULT_SHEET: &str = "销售数据";
const DEFAULT_SKIP_ROWS: usize = 1;
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub sheet_name: String,
    pub skip_rows: usize,
    pub hour_window: Option<HourWindow>,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            sheet_name: DEFAULT_SHEET.to_string(),
            skip_rows: DEFAULT_SKIP_ROWS,
            hour_window: Some(HourWindow::default()),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let data_path = env::var("SALES_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);
        let sheet_name = env::var("SALES_SHEET").unwrap_or(defaults.sheet_name);

        let skip_rows = match env::var("SALES_SKIP_ROWS") {
            Ok(value) => value.trim().parse::<usize>().unwrap_or_else(|_| {
                warn!("ignoring invalid SALES_SKIP_ROWS={value:?}");
                defaults.skip_rows
            }),
            Err(_) => defaults.skip_rows,
        };

        let hour_window = match env::var("SALES_HOUR_WINDOW") {
            Ok(value) => parse_hour_window(&value).unwrap_or_else(|| {
                warn!("ignoring invalid SALES_HOUR_WINDOW={value:?}");
                defaults.hour_window
            }),
            Err(_) => defaults.hour_window,
        };

        let port = match env::var("PORT") {
            Ok(value) => parse_port(&value).unwrap_or_else(|| {
                warn!("ignoring invalid PORT={value:?}");
                defaults.port
            }),
            Err(_) => defaults.port,
        };

        Self {
            data_path,
            sheet_name,
            skip_rows,
            hour_window,
            port,
        }
    }
}

pub fn parse_port(value: &str) -> Option<u16> {
    value.trim().parse::<u16>().ok()
}

/// Accepts `all` (no window) or an inclusive `start-end` hour range.
pub fn parse_hour_window(value: &str) -> Option<Option<HourWindow>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("all") {
        return Some(None);
    }

    let (start, end) = value.split_once('-')?;
    let start = start.trim().parse::<u8>().ok()?;
    let end = end.trim().parse::<u8>().ok()?;
    HourWindow::new(start, end).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_window_parses_range_and_all() {
        assert_eq!(parse_hour_window("10-20"), Some(HourWindow::new(10, 20)));
        assert_eq!(parse_hour_window(" 8 - 12 "), Some(HourWindow::new(8, 12)));
        assert_eq!(parse_hour_window("ALL"), Some(None));
    }

    #[test]
    fn port_parses_or_is_rejected() {
        assert_eq!(parse_port("8080"), Some(8080));
        assert_eq!(parse_port(" 3000\n"), Some(3000));
        assert_eq!(parse_port("http"), None);
        assert_eq!(parse_port("70000"), None);
        assert_eq!(parse_port(""), None);
    }

    #[test]
    fn hour_window_rejects_garbage() {
        assert_eq!(parse_hour_window("20-10"), None);
        assert_eq!(parse_hour_window("9-24"), None);
        assert_eq!(parse_hour_window("noon"), None);
        assert_eq!(parse_hour_window(""), None);
    }
}
