use super::TrainingError;
use crate::model::ClassCode;
use crate::table::{Table, Value};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Splits `table` into feature columns and the `target` labels.
pub fn prepare_data(table: &Table, target: &str) -> Result<(Table, Vec<ClassCode>), TrainingError> {
    if !table.has_column(target) {
        return Err(TrainingError::MissingTarget(target.to_string()));
    }

    let labels = table
        .column_values(target)
        .into_iter()
        .enumerate()
        .map(|(row, value)| class_from_value(value).ok_or(TrainingError::MissingLabel { row }))
        .collect::<Result<Vec<_>, _>>()?;

    let mut features = table.clone();
    features.drop_column(target);
    Ok((features, labels))
}

fn class_from_value(value: Value) -> Option<ClassCode> {
    match value {
        Value::Missing => None,
        Value::Number(number) if number.fract() == 0.0 => Some(ClassCode::Int(number as i64)),
        Value::Number(number) => Some(ClassCode::Text(number.to_string())),
        Value::Text(text) => match ClassCode::Text(text.trim().to_string()).coerced() {
            ClassCode::Text(text) => match text.parse::<f64>() {
                Ok(number) if number.is_finite() && number.fract() == 0.0 => {
                    Some(ClassCode::Int(number as i64))
                }
                _ => Some(ClassCode::Text(text)),
            },
            code => Some(code),
        },
    }
}

/// Row indices for a train/test split, stratified by label and seeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Holds out `test_size` of every class, so both sides keep the label mix.
///
/// A class keeps at least one training row whenever it has any rows at all.
pub fn train_test_split(
    labels: &[ClassCode],
    test_size: f64,
    seed: u64,
) -> Result<Split, TrainingError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TrainingError::InvalidTestSize(test_size));
    }

    let mut by_class: BTreeMap<&ClassCode, Vec<usize>> = BTreeMap::new();
    for (index, label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(index);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::new(),
        test: Vec::new(),
    };

    for (_, mut indices) in by_class {
        indices.shuffle(&mut rng);
        let held_out = ((indices.len() as f64) * test_size).round() as usize;
        let held_out = held_out.min(indices.len().saturating_sub(1));
        split.test.extend_from_slice(&indices[..held_out]);
        split.train.extend_from_slice(&indices[held_out..]);
    }

    split.train.sort_unstable();
    split.test.sort_unstable();
    Ok(split)
}
