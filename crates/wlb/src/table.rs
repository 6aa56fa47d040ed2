//! In-memory tabular data read from and written to CSV.
//!
//! Cells are typed loosely: a survey export mixes numeric answers, free text,
//! and blanks in the same file, so every cell is a [`Value`] and numeric
//! interpretation happens on demand through [`Value::as_f64`].
//!
//! Reading then writing a table reproduces every parsed cell byte for byte:
//! a field only becomes [`Value::Number`] when the number prints back as the
//! same text, so zero-padded codes and long identifiers stay [`Value::Text`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Number(f64),
    Text(String),
}

impl Value {
    /// Interprets a raw CSV field. Blank fields are missing.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::Missing;
        }
        match raw.parse::<f64>() {
            Ok(number) if number.is_finite() && number.to_string() == raw => Self::Number(number),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Numeric coercion; anything that does not read as a finite number is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Missing => None,
            Self::Number(number) if number.is_finite() => Some(*number),
            Self::Number(_) => None,
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Builds a value from a JSON scalar, as received by the serving layer.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Missing,
            serde_json::Value::Bool(flag) => Self::Number(if *flag { 1.0 } else { 0.0 }),
            serde_json::Value::Number(number) => {
                number.as_f64().map(Self::Number).unwrap_or(Self::Missing)
            }
            serde_json::Value::String(text) => Self::parse(text),
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        value.map(Self::Number).unwrap_or(Self::Missing)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Number(number) => write!(f, "{}", number),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// One row: column names mapped to values, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Sets a field, overwriting in place when the column already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(name, _)| name == column)?;
        Some(self.fields.remove(index).1)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// An ordered column list plus its records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Builds a table from records, taking columns in first-seen order.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for column in record.columns() {
                if !columns.iter().any(|existing| existing == column) {
                    columns.push(column.to_string());
                }
            }
        }
        Self { columns, records }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let columns = dedupe_headers(
            csv_reader
                .headers()?
                .iter()
                .map(|header| header.trim_start_matches('\u{feff}').to_string()),
        );

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            let record = columns
                .iter()
                .enumerate()
                .map(|(index, column)| {
                    let value = row.get(index).map(Value::parse).unwrap_or(Value::Missing);
                    (column.clone(), value)
                })
                .collect();
            records.push(record);
        }

        Ok(Self { columns, records })
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let file = std::fs::File::create(path)?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for record in &self.records {
            let row: Vec<String> = self
                .columns
                .iter()
                .map(|column| record.get(column).map(Value::to_string).unwrap_or_default())
                .collect();
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|existing| existing == column)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: Record) {
        for column in record.columns() {
            if !self.has_column(column) {
                self.columns.push(column.to_string());
            }
        }
        self.records.push(record);
    }

    /// Cells of one column; rows lacking the field yield `Missing`.
    pub fn column_values(&self, column: &str) -> Vec<Value> {
        self.records
            .iter()
            .map(|record| record.get(column).cloned().unwrap_or(Value::Missing))
            .collect()
    }

    /// Numeric coercion of one column, or `None` when the column is absent.
    pub fn numeric_column(&self, column: &str) -> Option<Vec<Option<f64>>> {
        if !self.has_column(column) {
            return None;
        }
        Some(
            self.records
                .iter()
                .map(|record| record.get(column).and_then(Value::as_f64))
                .collect(),
        )
    }

    /// Drops a column from the header and every record. Returns whether it existed.
    pub fn drop_column(&mut self, column: &str) -> bool {
        let Some(index) = self.columns.iter().position(|existing| existing == column) else {
            return false;
        };
        self.columns.remove(index);
        for record in &mut self.records {
            record.remove(column);
        }
        true
    }

    /// Sets one value per record for `column`, appending the column if new.
    pub fn set_column<I>(&mut self, column: &str, values: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
        for (record, value) in self.records.iter_mut().zip(values) {
            record.insert(column, value);
        }
    }

    /// Keeps the records at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            records: indices
                .iter()
                .filter_map(|&index| self.records.get(index).cloned())
                .collect(),
        }
    }

    pub fn map_records<F>(&self, columns: Vec<String>, mut f: F) -> Self
    where
        F: FnMut(&Record) -> Record,
    {
        Self {
            columns,
            records: self.records.iter().map(|record| f(record)).collect(),
        }
    }
}

/// Renames repeated headers to `name.1`, `name.2`, ... so no column shadows another.
fn dedupe_headers<I>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut columns: Vec<String> = Vec::new();
    for header in headers {
        let mut name = header.clone();
        let mut suffix = 0;
        while columns.contains(&name) {
            suffix += 1;
            name = format!("{header}.{suffix}");
        }
        columns.push(name);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_classifies_blank_numeric_and_text_fields() {
        assert_eq!(Value::parse("  "), Value::Missing);
        assert_eq!(Value::parse("4.5"), Value::Number(4.5));
        assert_eq!(Value::parse("Female"), Value::Text("Female".to_string()));
        assert_eq!(Value::parse("NaN"), Value::Text("NaN".to_string()));
        assert_eq!(Value::parse("02139"), Value::Text("02139".to_string()));
        assert_eq!(Value::parse("02139").as_f64(), Some(2139.0));
    }

    #[test]
    fn round_trip_preserves_codes_and_long_identifiers() {
        let source = "employee_id,zip,big,ratio,x,x\n00123,02139,9007199254740993,1.50,1,2\n";
        let table = Table::from_reader(Cursor::new(source)).expect("parse");
        assert_eq!(table.columns(), ["employee_id", "zip", "big", "ratio", "x", "x.1"]);
        assert_eq!(table.numeric_column("ratio"), Some(vec![Some(1.5)]));

        let mut buffer = Vec::new();
        table.to_writer(&mut buffer).expect("write");
        assert_eq!(
            String::from_utf8(buffer).expect("utf8"),
            "employee_id,zip,big,ratio,x,x.1\n00123,02139,9007199254740993,1.50,1,2\n"
        );
    }

    #[test]
    fn as_f64_coerces_numeric_text_and_rejects_the_rest() {
        assert_eq!(Value::Text(" 12 ".to_string()).as_f64(), Some(12.0));
        assert_eq!(Value::Text("high".to_string()).as_f64(), None);
        assert_eq!(Value::Missing.as_f64(), None);
    }

    #[test]
    fn reader_keeps_header_order_and_marks_blanks_missing() {
        let table = Table::from_reader(Cursor::new(
            "\u{feff}age,department,stress_score\n34,Sales,\n41,,7\n",
        ))
        .expect("parse");

        assert_eq!(table.columns(), ["age", "department", "stress_score"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].get("stress_score"), Some(&Value::Missing));
        assert_eq!(table.records()[1].get("department"), Some(&Value::Missing));
        assert_eq!(
            table.numeric_column("stress_score"),
            Some(vec![None, Some(7.0)])
        );
        assert_eq!(table.numeric_column("absent"), None);
    }

    #[test]
    fn writer_emits_columns_in_table_order() {
        let mut table = Table::from_reader(Cursor::new("a,b\n1,x\n")).expect("parse");
        table.set_column("score", [Value::Number(80.5)]);
        table.drop_column("b");

        let mut buffer = Vec::new();
        table.to_writer(&mut buffer).expect("write");
        assert_eq!(String::from_utf8(buffer).expect("utf8"), "a,score\n1,80.5\n");
    }

    #[test]
    fn insert_overwrites_existing_field_in_place() {
        let mut record: Record = [("a", 1.0), ("b", 2.0)].into_iter().collect();
        record.insert("a", 9.0);
        assert_eq!(record.columns().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::Number(9.0)));
    }
}
