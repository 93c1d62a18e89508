//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a counter to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(f64::MAX)
}

/// Narrow a counter to u32, saturating at `u32::MAX`.
#[must_use]
pub fn u64_to_u32_saturating(value: u64) -> u32 {
    cast::<u64, u32>(value).unwrap_or(u32::MAX)
}

/// Narrow a collection length or index to u32, saturating at `u32::MAX`.
#[must_use]
pub fn usize_to_u32_saturating(value: usize) -> u32 {
    cast::<usize, u32>(value).unwrap_or(u32::MAX)
}

/// Widen a u32 index for slice access.
#[must_use]
pub fn u32_to_usize(value: u32) -> usize {
    cast::<u32, usize>(value).unwrap_or(usize::MAX)
}

/// Round up to a whole tick count; negatives and NaN become zero.
#[must_use]
pub fn f64_to_u64_ceil_saturating(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(value.ceil().min(max)).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_saturates() {
        assert_eq!(u64_to_u32_saturating(u64::MAX), u32::MAX);
        assert_eq!(u64_to_u32_saturating(7), 7);
        assert_eq!(usize_to_u32_saturating(12), 12);
    }

    #[test]
    fn widening_is_lossless_for_small_values() {
        assert!((u64_to_f64(1_500) - 1_500.0).abs() < f64::EPSILON);
        assert_eq!(u32_to_usize(5), 5);
    }

    #[test]
    fn tick_counts_round_up() {
        assert_eq!(f64_to_u64_ceil_saturating(1_499.2), 1_500);
        assert_eq!(f64_to_u64_ceil_saturating(-3.0), 0);
        assert_eq!(f64_to_u64_ceil_saturating(f64::NAN), 0);
        assert_eq!(f64_to_u64_ceil_saturating(f64::INFINITY), u64::MAX);
    }
}
