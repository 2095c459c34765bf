// Copyright (c) 2024 Botho Foundation

//! Sliding-window usage meter.
//!
//! Usage is recorded as if spread evenly across a window of slots and decays
//! linearly toward zero as slots pass, reaching zero once a full window has
//! elapsed. All arithmetic is integer: incoming values are converted to
//! window-averaged form with a ceiling division, the decay step rounds
//! half-to-even, and the conversion back floors. The asymmetry slightly
//! overstates incoming charge and understates the residual.
//!
//! Every validator must compute identical residuals, so the rounding rules
//! here are consensus-fixed.

use std::cmp::Ordering;

use crate::params::ChainParams;

/// Ceiling division.
fn divide_ceil(numerator: u128, denominator: u128) -> u128 {
    numerator / denominator + u128::from(numerator % denominator > 0)
}

/// `numerator / denominator` rounded half-to-even.
fn divide_half_even(numerator: u128, denominator: u128) -> u128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    match (remainder * 2).cmp(&denominator) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        // Exactly half: round to the even quotient.
        Ordering::Equal => quotient + (quotient & 1),
    }
}

/// Fixed-window usage meter.
#[derive(Debug, Clone, Copy)]
pub struct WindowMeter {
    precision: u64,
    window_slots: u64,
}

impl WindowMeter {
    pub fn new(params: &ChainParams) -> Self {
        let window_slots = params.window_slots();
        assert!(window_slots > 0, "usage window must span at least one slot");
        assert!(params.precision > 0, "zero meter precision");
        Self {
            precision: params.precision,
            window_slots,
        }
    }

    /// Window width in slots.
    pub fn window_slots(&self) -> u64 {
        self.window_slots
    }

    /// Decay `last_usage` from `last_time` to `now`, then add `add_usage`.
    ///
    /// `now` earlier than `last_time` is a caller bug, not a user error;
    /// the buckets this meter reads only ever record monotone slots.
    pub fn increase(&self, last_usage: u64, add_usage: u64, last_time: u64, now: u64) -> u64 {
        let precision = u128::from(self.precision);
        let window = u128::from(self.window_slots);

        let mut average_last = divide_ceil(u128::from(last_usage) * precision, window);
        let average_add = divide_ceil(u128::from(add_usage) * precision, window);

        if last_time != now {
            debug_assert!(
                now > last_time,
                "meter time went backwards: {last_time} -> {now}"
            );
            let delta = now.saturating_sub(last_time);
            if delta < self.window_slots {
                let remaining = u128::from(self.window_slots - delta);
                average_last = divide_half_even(average_last * remaining, window);
            } else {
                average_last = 0;
            }
        }

        let new_usage = (average_last + average_add) * window / precision;
        u64::try_from(new_usage).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mainnet_meter() -> WindowMeter {
        WindowMeter::new(&ChainParams::mainnet())
    }

    const WINDOW: u64 = 28_800;

    #[test]
    fn test_divide_ceil() {
        assert_eq!(divide_ceil(10, 5), 2);
        assert_eq!(divide_ceil(11, 5), 3);
        assert_eq!(divide_ceil(0, 5), 0);
        assert_eq!(divide_ceil(1, 5), 1);
    }

    #[test]
    fn test_divide_half_even() {
        // Below half rounds down, above half rounds up.
        assert_eq!(divide_half_even(1, 3), 0);
        assert_eq!(divide_half_even(2, 3), 1);
        // Exactly half rounds to the even quotient.
        assert_eq!(divide_half_even(5, 2), 2); // 2.5 -> 2
        assert_eq!(divide_half_even(7, 2), 4); // 3.5 -> 4
        assert_eq!(divide_half_even(3, 2), 2); // 1.5 -> 2
        assert_eq!(divide_half_even(1, 2), 0); // 0.5 -> 0
    }

    #[test]
    fn test_identity_when_stationary() {
        let meter = mainnet_meter();
        // With precision larger than the window, the ceil/floor round-trip
        // is exact.
        for usage in [0u64, 1, 99, 5_000, 1_000_000, 43_200_000_000] {
            assert_eq!(meter.increase(usage, 0, 1_000, 1_000), usage);
        }
    }

    #[test]
    fn test_add_at_same_slot_is_exact() {
        let meter = mainnet_meter();
        assert_eq!(meter.increase(0, 100, 1_000, 1_000), 100);
        assert_eq!(meter.increase(250, 100, 1_000, 1_000), 350);
    }

    #[test]
    fn test_full_decay_at_window_boundary() {
        let meter = mainnet_meter();
        assert_eq!(meter.increase(10_000, 0, 0, WINDOW), 0);
        assert_eq!(meter.increase(10_000, 0, 0, WINDOW + 1), 0);
        assert_eq!(meter.increase(u64::MAX, 0, 5, 5 + WINDOW), 0);
    }

    #[test]
    fn test_full_decay_still_records_new_charge() {
        let meter = mainnet_meter();
        assert_eq!(meter.increase(10_000, 500, 0, WINDOW + 1), 500);
    }

    #[test]
    fn test_half_window_decays_half() {
        let meter = mainnet_meter();
        let decayed = meter.increase(10_000, 0, 0, WINDOW / 2);
        // Linear decay: half the window leaves half the usage, up to
        // rounding in average form.
        assert!((4_999..=5_001).contains(&decayed), "decayed = {decayed}");
    }

    #[test]
    fn test_residual_shrinks_as_slots_pass() {
        let meter = mainnet_meter();
        let mut previous = meter.increase(10_000, 0, 0, 1);
        for now in [10u64, 100, 1_000, 10_000, 20_000, WINDOW - 1] {
            let residual = meter.increase(10_000, 0, 0, now);
            assert!(residual <= previous, "residual grew at slot {now}");
            previous = residual;
        }
    }

    #[test]
    fn test_superposition_exact_for_aligned_values() {
        // Multiples of 18 convert to average form without rounding at
        // mainnet parameters, so superposition holds exactly.
        let meter = mainnet_meter();
        let (u, a, b) = (1_800u64, 360u64, 540u64);
        let lhs = meter.increase(u, a + b, 0, 0);
        let rhs = meter.increase(u, a, 0, 0) + meter.increase(u, b, 0, 0) - meter.increase(u, 0, 0, 0);
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_charge_then_decay_then_charge() {
        let meter = mainnet_meter();
        // Charge 1000 at slot 0, observe at slot WINDOW/4, charge 600 more.
        let first = meter.increase(0, 1_000, 0, 0);
        assert_eq!(first, 1_000);
        let second = meter.increase(first, 600, 0, WINDOW / 4);
        // Residual of 1000 after a quarter window is ~750.
        assert!((1_349..=1_351).contains(&second), "second = {second}");
    }

    proptest! {
        #[test]
        fn prop_identity_when_stationary(usage in 0u64..1_000_000_000_000, t in 0u64..1_000_000) {
            let meter = mainnet_meter();
            prop_assert_eq!(meter.increase(usage, 0, t, t), usage);
        }

        #[test]
        fn prop_full_decay(usage in 0u64..1_000_000_000_000, t in 0u64..1_000_000, extra in 0u64..1_000_000) {
            let meter = mainnet_meter();
            prop_assert_eq!(meter.increase(usage, 0, t, t + WINDOW + extra), 0);
        }

        #[test]
        fn prop_monotone_in_add_usage(
            usage in 0u64..1_000_000_000,
            add in 0u64..1_000_000_000,
            delta_add in 0u64..1_000_000,
            last in 0u64..100_000,
            elapsed in 0u64..60_000,
        ) {
            let meter = mainnet_meter();
            let now = last + elapsed;
            let smaller = meter.increase(usage, add, last, now);
            let larger = meter.increase(usage, add + delta_add, last, now);
            prop_assert!(larger >= smaller);
        }

        #[test]
        fn prop_superposition_drift_bounded(
            usage in 0u64..1_000_000_000,
            a in 0u64..1_000_000_000,
            b in 0u64..1_000_000_000,
            t in 0u64..1_000_000,
        ) {
            let meter = mainnet_meter();
            let lhs = i128::from(meter.increase(usage, a + b, t, t));
            let rhs = i128::from(meter.increase(usage, a, t, t))
                + i128::from(meter.increase(usage, b, t, t))
                - i128::from(meter.increase(usage, 0, t, t));
            // Each term carries its own ceil/floor round-trip; the combined
            // drift stays within two bytes.
            prop_assert!((lhs - rhs).abs() <= 2, "lhs = {lhs}, rhs = {rhs}");
        }

        #[test]
        fn prop_residual_never_exceeds_recorded(
            usage in 0u64..1_000_000_000_000,
            last in 0u64..100_000,
            elapsed in 1u64..100_000,
        ) {
            let meter = mainnet_meter();
            let residual = meter.increase(usage, 0, last, last + elapsed);
            prop_assert!(residual <= usage);
        }
    }
}
