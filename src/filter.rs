use crate::models::{FilterOptions, FilterSelection, Record};

impl FilterOptions {
    /// Distinct values of each filter dimension, in first-seen order.
    pub fn from_records(records: &[Record]) -> Self {
        let mut options = Self::default();
        for record in records {
            push_distinct(&mut options.cities, &record.city);
            push_distinct(&mut options.customer_types, &record.customer_type);
            push_distinct(&mut options.genders, &record.gender);
        }
        options
    }
}

impl FilterSelection {
    /// Builds a selection from repeated query keys such as
    /// `?city=A&city=B&gender=Female`.
    pub fn from_query_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut selection = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            let target = match key.as_ref() {
                "city" => &mut selection.cities,
                "customer_type" => &mut selection.customer_types,
                "gender" => &mut selection.genders,
                _ => continue,
            };
            push_distinct(target, value);
        }
        selection
    }

    /// Replaces every empty dimension with all observed values.
    pub fn resolve(&self, options: &FilterOptions) -> Self {
        Self {
            cities: or_all(&self.cities, &options.cities),
            customer_types: or_all(&self.customer_types, &options.customer_types),
            genders: or_all(&self.genders, &options.genders),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        contains(&self.cities, &record.city)
            && contains(&self.customer_types, &record.customer_type)
            && contains(&self.genders, &record.gender)
    }
}

/// Stable filter of `records` by `selection`. An empty dimension in the
/// selection admits every value seen in `records`.
pub fn filter_records<'a>(records: &'a [Record], selection: &FilterSelection) -> Vec<&'a Record> {
    let effective = selection.resolve(&FilterOptions::from_records(records));
    records
        .iter()
        .filter(|record| effective.matches(record))
        .collect()
}

fn or_all(selected: &[String], all: &[String]) -> Vec<String> {
    if selected.is_empty() {
        all.to_vec()
    } else {
        selected.to_vec()
    }
}

fn contains(values: &[String], value: &str) -> bool {
    values.iter().any(|candidate| candidate == value)
}

fn push_distinct(values: &mut Vec<String>, value: &str) {
    if !contains(values, value) {
        values.push(value.to_string());
    }
}
