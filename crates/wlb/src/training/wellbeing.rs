//! Survey-score target for the three-way wellbeing model.

use super::TrainingError;
use crate::scoring::WellbeingClass;
use crate::table::{Table, Value};

pub const SURVEY_SCORE_COLUMN: &str = "WORK_LIFE_BALANCE_SCORE";
pub const WELLBEING_TARGET: &str = "TARGET";

/// Replaces the survey score with a `TARGET` class column.
///
/// Blank scores become blank targets, which `prepare_data` later rejects.
pub fn with_wellbeing_target(table: &Table) -> Result<Table, TrainingError> {
    let scores = table
        .numeric_column(SURVEY_SCORE_COLUMN)
        .ok_or_else(|| TrainingError::MissingTarget(SURVEY_SCORE_COLUMN.to_string()))?;

    let targets = table
        .column_values(SURVEY_SCORE_COLUMN)
        .into_iter()
        .zip(scores)
        .enumerate()
        .map(|(row, (raw, score))| match (raw, score) {
            (Value::Missing, _) => Ok(Value::Missing),
            (_, Some(score)) => Ok(Value::from(WellbeingClass::from_survey_score(score).code() as f64)),
            (_, None) => Err(TrainingError::InvalidScore { row }),
        })
        .collect::<Result<Vec<Value>, TrainingError>>()?;

    let mut labeled = table.clone();
    labeled.set_column(WELLBEING_TARGET, targets);
    labeled.drop_column(SURVEY_SCORE_COLUMN);
    Ok(labeled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn scores_become_classes_and_the_score_column_goes() {
        let table = Table::from_reader(Cursor::new(
            "DAILY_STRESS,WORK_LIFE_BALANCE_SCORE\n2,550.5\n3,650\n1,712.4\n",
        ))
        .expect("parse");

        let labeled = with_wellbeing_target(&table).expect("target");
        assert_eq!(labeled.columns(), ["DAILY_STRESS", "TARGET"]);
        assert_eq!(
            labeled.numeric_column("TARGET"),
            Some(vec![Some(0.0), Some(1.0), Some(2.0)])
        );
    }

    #[test]
    fn non_numeric_score_names_the_row() {
        let table = Table::from_reader(Cursor::new("WORK_LIFE_BALANCE_SCORE\n600\nhigh\n"))
            .expect("parse");
        let error = with_wellbeing_target(&table).expect_err("bad score");
        assert!(matches!(error, TrainingError::InvalidScore { row: 1 }));
    }

    #[test]
    fn absent_score_column_is_a_missing_target() {
        let table = Table::from_reader(Cursor::new("a\n1\n")).expect("parse");
        assert!(matches!(
            with_wellbeing_target(&table),
            Err(TrainingError::MissingTarget(_))
        ));
    }
}
