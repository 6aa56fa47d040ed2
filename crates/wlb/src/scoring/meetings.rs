use crate::table::Table;

pub const MEETINGS_PER_HOUR_COLUMN: &str = "meetings_per_hour";
pub const NUM_MEETINGS_COLUMN: &str = "num_meetings";
pub const JOB_HOURS_COLUMN: &str = "job_hours_per_week";

/// Meetings per working hour for every record.
///
/// A direct `meetings_per_hour` column wins. Otherwise the ratio of
/// `num_meetings` to `job_hours_per_week` is used, where zero hours gives an
/// undefined (missing) ratio. With neither source available every record gets
/// `0.0`, not missing.
pub fn meetings_per_hour(table: &Table) -> Vec<Option<f64>> {
    if let Some(direct) = table.numeric_column(MEETINGS_PER_HOUR_COLUMN) {
        return direct;
    }

    match (
        table.numeric_column(NUM_MEETINGS_COLUMN),
        table.numeric_column(JOB_HOURS_COLUMN),
    ) {
        (Some(meetings), Some(hours)) => meetings
            .into_iter()
            .zip(hours)
            .map(|(meetings, hours)| ratio(meetings, hours))
            .collect(),
        _ => vec![Some(0.0); table.len()],
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let denominator = denominator.filter(|hours| *hours != 0.0)?;
    let value = numerator? / denominator;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Record;

    fn table(rows: Vec<Vec<(&str, f64)>>) -> Table {
        Table::from_records(
            rows.into_iter()
                .map(|fields| fields.into_iter().collect::<Record>())
                .collect(),
        )
    }

    #[test]
    fn direct_column_takes_priority() {
        let table = table(vec![vec![
            (MEETINGS_PER_HOUR_COLUMN, 0.3),
            (NUM_MEETINGS_COLUMN, 10.0),
            (JOB_HOURS_COLUMN, 40.0),
        ]]);
        assert_eq!(meetings_per_hour(&table), vec![Some(0.3)]);
    }

    #[test]
    fn ratio_is_computed_from_raw_fields() {
        let table = table(vec![vec![(NUM_MEETINGS_COLUMN, 10.0), (JOB_HOURS_COLUMN, 40.0)]]);
        assert_eq!(meetings_per_hour(&table), vec![Some(0.25)]);
    }

    #[test]
    fn zero_hours_yields_missing_not_infinity() {
        let table = table(vec![vec![(NUM_MEETINGS_COLUMN, 10.0), (JOB_HOURS_COLUMN, 0.0)]]);
        assert_eq!(meetings_per_hour(&table), vec![None]);
    }

    #[test]
    fn missing_operand_yields_missing() {
        let mut table = table(vec![vec![(NUM_MEETINGS_COLUMN, 4.0), (JOB_HOURS_COLUMN, 8.0)]]);
        table.push(
            [(NUM_MEETINGS_COLUMN, "many"), (JOB_HOURS_COLUMN, "40")]
                .into_iter()
                .collect(),
        );
        assert_eq!(meetings_per_hour(&table), vec![Some(0.5), None]);
    }

    #[test]
    fn no_source_columns_defaults_to_zero() {
        let table = table(vec![vec![("age", 30.0)], vec![("age", 41.0)]]);
        assert_eq!(meetings_per_hour(&table), vec![Some(0.0), Some(0.0)]);
    }
}
