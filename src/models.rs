use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One sales transaction, with the hour already derived from `time`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub order_id: String,
    pub city: String,
    pub customer_type: String,
    pub gender: String,
    pub product_line: String,
    pub total: f64,
    pub time: String,
    pub rating: f64,
    pub hour: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Workbook { path: PathBuf },
    Fixture { reason: String },
}

/// Records loaded once at startup. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub source: DataSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub customer_types: Vec<String>,
    #[serde(default)]
    pub genders: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub cities: Vec<String>,
    pub customer_types: Vec<String>,
    pub genders: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub transactions: usize,
    pub total_revenue: f64,
    pub total_sales: i64,
    pub average_rating: f64,
    pub average_sale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub title: String,
    pub points: Vec<ChartPoint>,
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub source: DataSource,
    pub options: FilterOptions,
    pub selection: FilterSelection,
    pub metrics: Metrics,
    pub sales_by_hour: ChartData,
    pub sales_by_product_line: ChartData,
}
