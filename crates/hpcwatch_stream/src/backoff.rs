use std::time::Duration;

/// Floor for every delay so a misconfigured zero never turns the retry loop
/// into a busy loop.
const MIN_DELAY: Duration = Duration::from_millis(1);

/// Capped exponential reconnect delay.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.max(MIN_DELAY);
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Returns the delay to wait now and doubles the next one, up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// Called after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
