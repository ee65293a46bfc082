//! Sliding-window request rate limiter

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Limits outbound judge calls to a requests-per-minute budget using a
/// sliding one-minute window. Verdicts are short, so no token budget is
/// tracked; the window is the only constraint.
pub struct RateLimiter {
    requests_per_minute: u32,
    recent: Arc<Mutex<VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            recent: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Wait until a request slot is free, then claim it
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut recent = self.recent.lock().await;
                let now = Instant::now();
                Self::evict_old(&mut recent, now);

                if (recent.len() as u32) < self.requests_per_minute {
                    recent.push_back(now);
                    None
                } else {
                    // Oldest entry ages out of the window first
                    recent.front().map(|&oldest| {
                        Duration::from_secs(60)
                            .saturating_sub(now.duration_since(oldest))
                            + Duration::from_millis(10)
                    })
                }
            };

            match wait {
                None => return,
                Some(wait) => tokio::time::sleep(wait).await,
            }
        }
    }

    /// Requests issued within the current window
    pub async fn current_usage(&self) -> u32 {
        let mut recent = self.recent.lock().await;
        Self::evict_old(&mut recent, Instant::now());
        recent.len() as u32
    }

    fn evict_old(recent: &mut VecDeque<Instant>, now: Instant) {
        let window = Duration::from_secs(60);
        while let Some(&front) = recent.front() {
            if now.duration_since(front) > window {
                recent.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_within_budget() {
        let limiter = RateLimiter::new(5);

        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.current_usage().await, 5);
    }

    #[tokio::test]
    async fn test_usage_starts_empty() {
        let limiter = RateLimiter::new(60);
        assert_eq!(limiter.current_usage().await, 0);
    }
}
