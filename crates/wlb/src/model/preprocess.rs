//! Feature encoding applied before a model sees a record.
//!
//! Numeric columns are median-imputed then standardized. Categorical columns
//! are imputed with their most frequent value, then ordinal-encoded against
//! the sorted categories seen during fitting; unseen categories encode as -1.

use crate::table::{Record, Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UNKNOWN_CATEGORY: f64 = -1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Encoding {
    Numeric {
        median: f64,
        mean: f64,
        scale: f64,
    },
    Categorical {
        most_frequent: String,
        categories: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransform {
    pub name: String,
    pub encoding: Encoding,
}

impl ColumnTransform {
    fn encode(&self, value: Option<&Value>) -> f64 {
        match &self.encoding {
            Encoding::Numeric {
                median,
                mean,
                scale,
            } => {
                let raw = value.and_then(Value::as_f64).unwrap_or(*median);
                (raw - mean) / scale
            }
            Encoding::Categorical {
                most_frequent,
                categories,
            } => {
                let text = category_text(value).unwrap_or_else(|| most_frequent.clone());
                categories
                    .binary_search(&text)
                    .map(|index| index as f64)
                    .unwrap_or(UNKNOWN_CATEGORY)
            }
        }
    }
}

/// Ordered column transforms. Numeric columns precede categorical ones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preprocessor {
    pub columns: Vec<ColumnTransform>,
}

impl Preprocessor {
    /// Learns imputation and encoding statistics from `table`.
    ///
    /// A column is numeric when every present value coerces to a number.
    pub fn fit(table: &Table) -> Self {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for column in table.columns() {
            let values = table.column_values(column);
            let present: Vec<&Value> = values.iter().filter(|value| !value.is_missing()).collect();
            let numbers: Vec<f64> = present.iter().filter_map(|value| value.as_f64()).collect();

            if numbers.len() == present.len() {
                numeric.push(fit_numeric(column, &values, numbers));
            } else {
                categorical.push(fit_categorical(column, &present));
            }
        }

        numeric.extend(categorical);
        Self { columns: numeric }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn transform(&self, record: &Record) -> Vec<f64> {
        self.columns
            .iter()
            .map(|column| column.encode(record.get(&column.name)))
            .collect()
    }
}

fn fit_numeric(column: &str, values: &[Value], mut numbers: Vec<f64>) -> ColumnTransform {
    let median = median(&mut numbers).unwrap_or(0.0);
    let imputed: Vec<f64> = values
        .iter()
        .map(|value| value.as_f64().unwrap_or(median))
        .collect();

    let count = imputed.len().max(1) as f64;
    let mean = imputed.iter().sum::<f64>() / count;
    let variance = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let std_dev = variance.sqrt();
    let scale = if std_dev > 0.0 { std_dev } else { 1.0 };

    ColumnTransform {
        name: column.to_string(),
        encoding: Encoding::Numeric {
            median,
            mean,
            scale,
        },
    }
}

fn fit_categorical(column: &str, present: &[&Value]) -> ColumnTransform {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in present {
        if let Some(text) = category_text(Some(*value)) {
            *counts.entry(text).or_default() += 1;
        }
    }

    // BTreeMap iterates in sorted order, so ties resolve to the smallest category.
    let most_frequent = counts
        .iter()
        .fold(None, |best: Option<(&String, usize)>, (name, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((name, *count)),
        })
        .map(|(name, _)| name.clone())
        .unwrap_or_default();

    ColumnTransform {
        name: column.to_string(),
        encoding: Encoding::Categorical {
            most_frequent,
            categories: counts.into_keys().collect(),
        },
    }
}

fn category_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Missing => None,
        other => Some(other.to_string().trim().to_string()),
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}
