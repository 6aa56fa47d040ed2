use crate::table::{Record, Table, Value};

/// Reshapes `raw` to exactly the `expected` columns, in that order.
///
/// Absent columns are materialized as [`Value::Missing`] and extra columns are
/// dropped. Missing columns are never an error here; the predictor's own
/// imputation decides what to do with them. Without an expected schema the
/// record passes through unchanged.
pub fn align(raw: &Record, expected: Option<&[String]>) -> Record {
    let Some(expected) = expected else {
        return raw.clone();
    };

    expected
        .iter()
        .map(|column| {
            let value = raw.get(column).cloned().unwrap_or(Value::Missing);
            (column.clone(), value)
        })
        .collect()
}

/// [`align`] applied to every record of a table.
pub fn align_table(raw: &Table, expected: Option<&[String]>) -> Table {
    match expected {
        Some(columns) => raw.map_records(columns.to_vec(), |record| align(record, expected)),
        None => raw.clone(),
    }
}
