//! Basic Statistics
//!
//! Empty input is not a valid sample: `mean` and `std` return NaN for it
//! instead of panicking, and callers decide whether NaN is acceptable.

/// Arithmetic mean. Returns NaN for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population standard deviation (divides by `n`, not `n - 1`).
///
/// Returns NaN for an empty slice. For any non-empty slice of finite values
/// the result is `>= 0`.
pub fn std(xs: &[f64]) -> f64 {
    let m = mean(xs);
    let squared: Vec<f64> = xs.iter().map(|x| (x - m).powi(2)).collect();
    mean(&squared).sqrt()
}

/// Round to two decimal places, ties away from zero.
///
/// The tie-break happens on the product `x * 100` as computed in `f64`:
/// `2.005 * 100` evaluates to exactly `200.5` and rounds up to `2.01`, while
/// `1.005 * 100` evaluates to `100.49999999999999` and rounds down to `1.0`.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < f64::EPSILON);
        assert!((mean(&[42.0]) - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_is_nan() {
        assert!(mean(&[]).is_nan());
        assert!(std(&[]).is_nan());
    }

    #[test]
    fn test_population_std() {
        // Classic example: population std of this set is exactly 2
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std(&xs) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_std_single_value_is_zero() {
        assert_eq!(std(&[3.5]), 0.0);
    }

    #[test]
    fn test_std_non_negative() {
        let sets: [&[f64]; 5] = [
            &[1.0],
            &[-5.0, 5.0],
            &[0.1, 0.1, 0.1],
            &[1e9, -1e9, 3.0],
            &[0.30000000000000004, 0.1, 0.2],
        ];
        for xs in sets {
            assert!(std(xs) >= 0.0, "std({xs:?}) was negative");
        }
    }

    #[test]
    fn test_round2_tie_break() {
        // 2.005 * 100 == 200.5 exactly after the multiply
        assert_eq!(round2(2.005), 2.01);
        // 1.005 * 100 == 100.49999999999999
        assert_eq!(round2(1.005), 1.0);
        // exact binary tie rounds away from zero
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(2.675), 2.68);
    }

    #[test]
    fn test_round2_nan() {
        assert!(round2(f64::NAN).is_nan());
    }
}
