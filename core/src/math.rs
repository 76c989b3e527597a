//! Fixed-point helpers
//!
//! Every division in the engines goes through here so the rounding rule is
//! the same everywhere: floor, with `u128` intermediates.

use crate::{Amount, BPS_SCALE};

/// `value * numerator / denominator`, rounded down. Returns 0 for a zero
/// denominator and saturates at `u64::MAX`.
pub fn mul_div(value: u64, numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    let product = value as u128 * numerator as u128 / denominator as u128;
    u64::try_from(product).unwrap_or(u64::MAX)
}

/// Portion of `amount` given in basis points, rounded down. Rates above
/// 100% are clamped, so the result never exceeds `amount`.
pub fn apply_bps(amount: Amount, bps: u32) -> Amount {
    mul_div(amount, bps.min(BPS_SCALE) as u64, BPS_SCALE as u64)
}

/// Voting power committed by a percentage allocation.
pub fn percent_of(power: Amount, percent: u32) -> Amount {
    mul_div(power, percent as u64, 100)
}

/// `numerator / denominator >= bps / 10_000`, compared without dividing.
///
/// A zero denominator never meets a positive threshold.
pub fn ratio_at_least(numerator: u64, denominator: u64, bps: u32) -> bool {
    if denominator == 0 {
        return bps == 0;
    }
    numerator as u128 * BPS_SCALE as u128 >= denominator as u128 * bps as u128
}

/// Split `scale` across `values` proportionally using the largest-remainder
/// method.
///
/// The result sums to exactly `scale` when the values sum to anything
/// positive, and is all zeros otherwise. Remainder units go to the largest
/// fractional parts; ties go to the earlier index.
pub fn apportion(values: &[u64], scale: u64) -> Vec<u64> {
    let total: u128 = values.iter().map(|v| *v as u128).sum();
    if total == 0 {
        return vec![0; values.len()];
    }

    let mut shares = Vec::with_capacity(values.len());
    let mut remainders = Vec::with_capacity(values.len());
    let mut assigned: u128 = 0;

    for (index, value) in values.iter().enumerate() {
        let exact = *value as u128 * scale as u128;
        let share = exact / total;
        assigned += share;
        shares.push(share as u64);
        remainders.push((exact % total, index));
    }

    // Largest remainder first, stable on index for ties
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let leftover = (scale as u128 - assigned) as usize;
    for (_, index) in remainders.into_iter().take(leftover) {
        shares[index] += 1;
    }

    shares
}

/// Exponential moving average with a 0.9/0.1 split.
pub fn ema_tenth(average: u64, sample: u64) -> u64 {
    let next = (average as u128 * 9 + sample as u128) / 10;
    u64::try_from(next).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WEIGHT_SCALE;

    #[test]
    fn test_mul_div_rounds_down() {
        assert_eq!(mul_div(100, 40, 100), 40);
        assert_eq!(mul_div(10, 1, 3), 3);
        assert_eq!(mul_div(10, 1, 0), 0);
        assert_eq!(mul_div(u64::MAX, u64::MAX, 1), u64::MAX);
    }

    #[test]
    fn test_apply_bps() {
        assert_eq!(apply_bps(1000, 5_000), 500);
        assert_eq!(apply_bps(999, 5_000), 499);
        assert_eq!(apply_bps(1000, 0), 0);
        assert_eq!(apply_bps(1000, 20_000), 1000);
    }

    #[test]
    fn test_ratio_at_least() {
        // 150 / 1000 = 15% >= 10%
        assert!(ratio_at_least(150, 1000, 1_000));
        // exactly on the threshold counts
        assert!(ratio_at_least(100, 1000, 1_000));
        assert!(!ratio_at_least(99, 1000, 1_000));
        assert!(!ratio_at_least(0, 0, 100));
    }

    #[test]
    fn test_apportion_sums_exactly() {
        let shares = apportion(&[1, 1, 1], WEIGHT_SCALE);
        assert_eq!(shares.iter().sum::<u64>(), WEIGHT_SCALE);
        // the single leftover unit lands on the first gauge
        assert_eq!(shares, vec![333_333_334, 333_333_333, 333_333_333]);

        let shares = apportion(&[40, 60], WEIGHT_SCALE);
        assert_eq!(shares, vec![400_000_000, 600_000_000]);
    }

    #[test]
    fn test_apportion_all_zero() {
        assert_eq!(apportion(&[0, 0], WEIGHT_SCALE), vec![0, 0]);
        assert!(apportion(&[], WEIGHT_SCALE).is_empty());
    }

    #[test]
    fn test_ema_tenth() {
        assert_eq!(ema_tenth(0, 1000), 100);
        assert_eq!(ema_tenth(100, 1000), 190);
    }
}
