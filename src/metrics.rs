//! Pure rate derivation from raw engagement counters.

/// Percentage rate of `numerator` over `denominator`, rounded to 2 decimals.
///
/// Absent counters coerce to 0 and a zero denominator yields 0.0, so the
/// result is always a finite value in [0, 100] for well-formed counters.
/// Negative inputs (a malformed upstream payload) are clamped to 0 rather
/// than producing a nonsense rate. Rounding is half away from zero.
pub fn rate(numerator: Option<i64>, denominator: Option<i64>) -> f64 {
    let num = numerator.unwrap_or(0).max(0) as f64;
    let denom = denominator.unwrap_or(0).max(0) as f64;
    if denom == 0.0 {
        return 0.0;
    }
    round2(num / denom * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominator_is_zero_not_a_panic() {
        assert_eq!(rate(Some(0), Some(0)), 0.0);
        assert_eq!(rate(Some(50), Some(0)), 0.0);
        assert_eq!(rate(None, None), 0.0);
    }

    #[test]
    fn rounds_half_away_from_zero_to_two_decimals() {
        assert_eq!(rate(Some(50), Some(200)), 25.0);
        assert_eq!(rate(Some(1), Some(3)), 33.33);
        assert_eq!(rate(Some(2), Some(3)), 66.67);
        // 0.125% exactly; the half rounds up, not to even
        assert_eq!(rate(Some(1), Some(800)), 0.13);
    }

    #[test]
    fn absent_counters_coerce_to_zero() {
        assert_eq!(rate(None, Some(100)), 0.0);
        assert_eq!(rate(Some(10), None), 0.0);
    }

    #[test]
    fn negative_inputs_are_clamped() {
        assert_eq!(rate(Some(-5), Some(100)), 0.0);
        assert_eq!(rate(Some(5), Some(-100)), 0.0);
    }

    #[test]
    fn rate_is_bounded_for_sane_counters() {
        assert_eq!(rate(Some(100), Some(100)), 100.0);
        assert_eq!(rate(Some(1), Some(1_000_000)), 0.0);
    }
}
