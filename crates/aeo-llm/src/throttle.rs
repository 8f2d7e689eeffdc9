use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between consecutive calls.
///
/// Shared across tasks; callers queue on the internal lock so calls are
/// spaced at least `min_interval` apart even when issued concurrently.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until `min_interval` has passed since the previous call.
    pub async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                tracing::debug!(
                    wait_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                    "throttling LLM call"
                );
                tokio::time::sleep(remaining).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_call_does_not_wait() {
        let throttle = Throttle::new(Duration::from_secs(5));
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn consecutive_calls_are_spaced() {
        let throttle = Throttle::new(Duration::from_millis(50));
        let start = Instant::now();
        throttle.wait().await;
        throttle.wait().await;
        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn no_wait_once_interval_has_passed() {
        let throttle = Throttle::new(Duration::from_millis(20));
        throttle.wait().await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        let before = Instant::now();
        throttle.wait().await;
        assert!(before.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn default_interval_is_one_second() {
        assert_eq!(Throttle::default().min_interval(), Duration::from_secs(1));
    }
}
