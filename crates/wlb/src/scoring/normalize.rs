/// Min-max scales a signal into `[0, 1]`.
///
/// Degenerate inputs (every value missing, or a range too small to divide by)
/// map to all zeros. Otherwise a missing value stays missing.
pub fn min_max(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present = values.iter().flatten().copied().filter(|v| v.is_finite());

    let bounds = present.fold(None, |acc: Option<(f64, f64)>, value| match acc {
        None => Some((value, value)),
        Some((min, max)) => Some((min.min(value), max.max(value))),
    });

    let Some((min, max)) = bounds else {
        return vec![Some(0.0); values.len()];
    };
    if is_close(max, min) {
        return vec![Some(0.0); values.len()];
    }

    let span = max - min;
    values
        .iter()
        .map(|value| {
            value
                .filter(|v| v.is_finite())
                .map(|v| (v - min) / span)
        })
        .collect()
}

/// `1 - min_max(values)`, for signals where a higher raw value is worse.
pub fn inverted_min_max(values: &[Option<f64>]) -> Vec<Option<f64>> {
    min_max(values)
        .into_iter()
        .map(|value| value.map(|v| 1.0 - v))
        .collect()
}

// Same tolerance as numpy.isclose with default rtol/atol.
fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scales_between_observed_bounds() {
        let scaled = min_max(&[Some(2.0), Some(4.0), Some(6.0)]);
        assert_eq!(scaled, vec![Some(0.0), Some(0.5), Some(1.0)]);
    }

    #[test]
    fn all_missing_is_all_zero() {
        assert_eq!(min_max(&[None, None]), vec![Some(0.0), Some(0.0)]);
    }

    #[test]
    fn constant_signal_is_all_zero_including_missing_slots() {
        assert_eq!(
            min_max(&[Some(3.0), None, Some(3.0)]),
            vec![Some(0.0), Some(0.0), Some(0.0)]
        );
    }

    #[test]
    fn missing_values_propagate_when_range_is_valid() {
        assert_eq!(
            min_max(&[Some(0.0), None, Some(10.0)]),
            vec![Some(0.0), None, Some(1.0)]
        );
    }

    #[test]
    fn inverted_flips_orientation() {
        assert_eq!(
            inverted_min_max(&[Some(0.0), Some(10.0), None]),
            vec![Some(1.0), Some(0.0), None]
        );
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(min_max(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn output_stays_within_unit_interval(
            values in prop::collection::vec(prop::option::of(-1.0e6f64..1.0e6), 0..40)
        ) {
            for value in min_max(&values).into_iter().flatten() {
                prop_assert!((0.0..=1.0).contains(&value));
            }
        }

        #[test]
        fn uniform_shift_does_not_change_result(
            values in prop::collection::vec(prop::option::of(-1.0e3f64..1.0e3), 2..30),
            shift in -1.0e3f64..1.0e3,
        ) {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            let spread = present.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
                - present.iter().cloned().fold(f64::INFINITY, f64::min);
            prop_assume!(present.len() >= 2 && spread > 0.1);

            let shifted: Vec<Option<f64>> = values.iter().map(|v| v.map(|x| x + shift)).collect();
            for (a, b) in min_max(&values).iter().zip(min_max(&shifted).iter()) {
                match (a, b) {
                    (Some(a), Some(b)) => prop_assert!((a - b).abs() < 1e-9),
                    (None, None) => {}
                    _ => prop_assert!(false, "missingness changed under shift"),
                }
            }
        }
    }
}
