//! SM-2 core formulas
//!
//! Pure arithmetic with no notion of time or identity. The scheduler wraps
//! these into item state transitions.

/// Ease factor floor
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor assigned to newly authored items
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Interval after the first successful review (and after any failure)
pub const FIRST_INTERVAL_DAYS: u32 = 1;

/// Interval after the second consecutive successful review
pub const SECOND_INTERVAL_DAYS: u32 = 6;

/// Lowest quality that counts as a successful recall
pub const PASS_THRESHOLD: u8 = 3;

/// Ease adjustment for a review of the given quality.
///
/// `0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)`. Applied on every review, so a
/// quality of 3 lowers the ease even though it counts as a pass.
#[inline]
pub fn ease_delta(quality: u8) -> f64 {
    let miss = 5.0 - f64::from(quality);
    0.1 - miss * (0.08 + miss * 0.02)
}

/// Next ease factor from the prior one, floored at [`MIN_EASE_FACTOR`]
#[inline]
pub fn next_ease_factor(ease_factor: f64, quality: u8) -> f64 {
    (ease_factor + ease_delta(quality)).max(MIN_EASE_FACTOR)
}

/// Next interval in days.
///
/// Failures reset to one day. Passes step 1 -> 6 -> `round(interval * ease)`
/// using the prior ease factor; `f64::round` rounds half away from zero.
pub fn next_interval(quality: u8, repetitions: u32, interval_days: u32, ease_factor: f64) -> u32 {
    if quality < PASS_THRESHOLD {
        return FIRST_INTERVAL_DAYS;
    }
    match repetitions {
        0 => FIRST_INTERVAL_DAYS,
        1 => SECOND_INTERVAL_DAYS,
        _ => {
            let grown = (f64::from(interval_days) * ease_factor).round();
            // Saturate rather than wrap on absurdly long histories
            if grown >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                grown as u32
            }
        }
    }
}

/// Next consecutive-success count
#[inline]
pub fn next_repetitions(quality: u8, repetitions: u32) -> u32 {
    if quality < PASS_THRESHOLD {
        0
    } else {
        repetitions.saturating_add(1)
    }
}
