//! Exponential backoff with jitter for the registration retry loop (spec
//! §4.5: base 1s, factor 2, cap 30s, jitter ±20%), split from
//! [`crate::client::RegistryClient`] so the progression is unit-testable
//! without sleeping.

use std::time::Duration;

use rand::Rng;

/// Starting retry delay.
pub const BASE_DELAY: Duration = Duration::from_secs(1);
/// Multiplier applied after each failed attempt.
pub const FACTOR: u32 = 2;
/// Upper bound on the (pre-jitter) retry delay.
pub const CAP: Duration = Duration::from_secs(30);
/// Jitter applied as a fraction of the computed delay, in both directions.
pub const JITTER_FRACTION: f64 = 0.2;

/// Doubles `current`, capped at [`CAP`]. Call with [`BASE_DELAY`] for the
/// first retry.
#[must_use]
pub fn next_delay(current: Duration) -> Duration {
    (current * FACTOR).min(CAP)
}

/// Applies ±[`JITTER_FRACTION`] jitter to `delay`, uniformly at random.
#[must_use]
pub fn jittered(delay: Duration, rng: &mut impl Rng) -> Duration {
    let factor = rng.gen_range((1.0 - JITTER_FRACTION)..=(1.0 + JITTER_FRACTION));
    delay.mul_f64(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_capped() {
        let mut delay = BASE_DELAY;
        for _ in 0..4 {
            delay = next_delay(delay);
        }
        assert_eq!(delay, Duration::from_secs(16));
        let capped = next_delay(delay);
        assert_eq!(capped, Duration::from_secs(30));
        assert_eq!(next_delay(capped), CAP);
    }

    #[test]
    fn jitter_stays_within_twenty_percent() {
        let mut rng = rand::thread_rng();
        let delay = Duration::from_secs(10);
        for _ in 0..100 {
            let jittered = jittered(delay, &mut rng);
            assert!(jittered >= Duration::from_secs(8));
            assert!(jittered <= Duration::from_secs(12));
        }
    }
}
