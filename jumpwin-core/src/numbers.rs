//! Numeric conversion helpers centralizing lossy casts.

use num_traits::cast::cast;

/// Convert a count to f64, allowing precision loss above 2^53 in one place.
#[must_use]
pub fn count_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(f64::MAX)
}

/// Convert a usize count to f64.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

/// `numerator / denominator`, or `None` when the denominator is zero.
#[must_use]
pub fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator != 0).then(|| count_to_f64(numerator) / count_to_f64(denominator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio(3, 0), None);
        assert_eq!(ratio(30, 1175), Some(30.0 / 1175.0));
    }

    #[test]
    fn counts_convert_exactly_in_range() {
        assert_eq!(count_to_f64(1 << 40), 1_099_511_627_776.0);
        assert_eq!(usize_to_f64(7), 7.0);
    }
}
