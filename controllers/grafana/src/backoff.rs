//! # Fibonacci Backoff
//!
//! Requeue delays for failed datasource passes. Delays follow the Fibonacci
//! sequence in whole minutes (1m, 1m, 2m, 3m, 5m, 8m, ...) capped at a
//! configured maximum, and drop back to the minimum after a successful pass.

use std::time::Duration;

/// Fibonacci backoff calculator, one per owning resource.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
    max_minutes: u64,
}

impl FibonacciBackoff {
    /// Creates a backoff starting at `min_minutes` and capped at `max_minutes`.
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        let max_minutes = max_minutes.max(min_minutes);
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes,
        }
    }

    /// Returns the current delay and advances the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_secs(self.current_minutes * 60);
        let next = self.prev_minutes + self.current_minutes;
        self.prev_minutes = self.current_minutes;
        self.current_minutes = next.min(self.max_minutes);
        delay
    }

    /// Restarts the sequence after a successful pass.
    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(backoff: &mut FibonacciBackoff, n: usize) -> Vec<u64> {
        (0..n).map(|_| backoff.next_delay().as_secs() / 60).collect()
    }

    #[test]
    fn test_sequence_is_capped() {
        let mut backoff = FibonacciBackoff::new(1, 10);
        assert_eq!(minutes(&mut backoff, 9), vec![1, 1, 2, 3, 5, 8, 10, 10, 10]);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut backoff = FibonacciBackoff::new(1, 10);
        minutes(&mut backoff, 4);
        backoff.reset();
        assert_eq!(minutes(&mut backoff, 3), vec![1, 1, 2]);
    }

    #[test]
    fn test_max_below_min_is_clamped() {
        let mut backoff = FibonacciBackoff::new(2, 1);
        assert_eq!(minutes(&mut backoff, 3), vec![2, 2, 2]);
    }
}
