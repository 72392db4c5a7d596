use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;

/// Intervals shorter than this (in days) are never fuzzed
const FUZZ_THRESHOLD: f64 = 2.5;

/// (start, end, factor): each band of the interval widens the fuzz window by `factor` per day
const FUZZ_RANGES: [(f64, f64, f64); 3] = [
    (2.5, 7.0, 0.15),
    (7.0, 20.0, 0.1),
    (20.0, f64::INFINITY, 0.05),
];

/// Half-width of the fuzz window around `interval` days
fn fuzz_delta(interval: f64) -> f64 {
    FUZZ_RANGES
        .iter()
        .fold(1.0, |delta, &(start, end, factor)| {
            delta + factor * (interval.min(end) - start).max(0.0)
        })
}

/// The inclusive range of whole days a fuzzed interval may land on
pub fn fuzz_range(interval: f64, maximum: u32) -> (u32, u32) {
    let delta = fuzz_delta(interval);
    let max_ivl = ((interval + delta).round() as u32).min(maximum);
    let min_ivl = ((interval - delta).round().max(2.0) as u32).min(max_ivl);
    (min_ivl, max_ivl)
}

/// Spread an interval over nearby days so cards reviewed together don't stay together.
///
/// The draw is seeded, so the same seed always picks the same day.
pub fn fuzz_interval(interval: f64, maximum: u32, seed: u64) -> f64 {
    if !interval.is_finite() || interval < FUZZ_THRESHOLD {
        return interval;
    }

    let (min_ivl, max_ivl) = fuzz_range(interval, maximum);
    let mut rng = StdRng::seed_from_u64(seed);
    let days = (min_ivl..=max_ivl).choose(&mut rng).unwrap_or(max_ivl);
    days.min(maximum) as f64
}

/// Derive a fuzz seed from the review instant and the card's counters and memory
pub fn seed(now: DateTime<Utc>, repetitions: u32, lapses: u32, memory: f64) -> u64 {
    let counters = ((repetitions as u64) << 32) | lapses as u64;
    (now.timestamp_millis() as u64)
        ^ counters.rotate_left(17)
        ^ memory.to_bits().wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
