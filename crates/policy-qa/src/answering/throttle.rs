//! Process-wide pacing of hosted model calls

use parking_lot::Mutex;
use std::time::Duration;

use crate::config::LlmConfig;

/// Sleeps for a cooldown on every `max_calls`-th call
#[derive(Debug)]
pub struct RequestThrottle {
    calls: Mutex<u64>,
    max_calls: u64,
    cooldown: Duration,
}

impl RequestThrottle {
    pub fn new(max_calls: u32, cooldown: Duration) -> Self {
        Self {
            calls: Mutex::new(0),
            max_calls: u64::from(max_calls),
            cooldown,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            config.max_calls_per_window,
            Duration::from_secs(config.window_cooldown_secs),
        )
    }

    /// Count one call, waiting out the window when the limit is reached.
    /// A limit of zero disables throttling.
    pub async fn acquire(&self) {
        if self.max_calls == 0 {
            return;
        }

        let reached = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls % self.max_calls == 0
        };

        if reached {
            tracing::info!(
                "Rate limit window reached, waiting {}s",
                self.cooldown.as_secs()
            );
            tokio::time::sleep(self.cooldown).await;
        }
    }

    /// Calls counted so far
    pub fn calls(&self) -> u64 {
        *self.calls.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_every_nth_call_waits() {
        let throttle = RequestThrottle::new(3, Duration::from_secs(60));
        let start = tokio::time::Instant::now();

        throttle.acquire().await;
        throttle.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));

        throttle.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert_eq!(throttle.calls(), 3);
    }

    #[tokio::test]
    async fn test_zero_limit_disables() {
        let throttle = RequestThrottle::new(0, Duration::from_secs(3600));
        for _ in 0..5 {
            throttle.acquire().await;
        }
        assert_eq!(throttle.calls(), 0);
    }
}
