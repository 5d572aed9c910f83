//! Per-client rate limiting for the public endpoints.
//!
//! Artifact serving and subscription carry different abuse profiles, so each
//! category has its own cap over a shared sliding window. The in-memory
//! implementation keeps a timestamp log per `client:category` key; a shared
//! store can replace it behind [`RateLimiter`] without touching handlers.
//! Limits apply per instance.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::HeaderMap;
use metrics::counter;
use rand::Rng;

use crate::config::RateLimitConfig;

/// Which public surface a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateCategory {
    /// Widget script/snippet delivery.
    Artifact,
    /// Subscription submissions.
    Subscribe,
}

impl RateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Artifact => "artifact",
            Self::Subscribe => "subscribe",
        }
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after_seconds: u64 },
}

impl RateDecision {
    pub fn is_limited(&self) -> bool {
        matches!(self, Self::Limited { .. })
    }
}

/// Rate limiter seam. `check` records the request when it is allowed.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, client_key: &str, category: RateCategory) -> RateDecision;
}

/// Derive the limiter key for a request. Behind the load balancer the
/// client address lives in the first `x-forwarded-for` entry; absent that,
/// all requests share one sentinel bucket rather than bypassing the limit.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// In-memory sliding-window limiter.
///
/// Expired entries for a key are pruned on that key's next check; whole-map
/// sweeps run probabilistically (about 1% of checks) so one-off visitors do
/// not accumulate forever.
pub struct SlidingWindowLimiter {
    window: Duration,
    artifact_cap: usize,
    subscribe_cap: usize,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            window: Duration::from_secs(config.window_seconds),
            artifact_cap: config.artifact_per_window as usize,
            subscribe_cap: config.subscribe_per_window as usize,
            hits: Mutex::new(HashMap::new()),
        }
    }

    fn cap(&self, category: RateCategory) -> usize {
        match category {
            RateCategory::Artifact => self.artifact_cap,
            RateCategory::Subscribe => self.subscribe_cap,
        }
    }

    fn sweep(&self, map: &mut HashMap<String, Vec<Instant>>, now: Instant) {
        map.retain(|_, stamps| {
            stamps.retain(|stamp| now.duration_since(*stamp) < self.window);
            !stamps.is_empty()
        });
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn check(&self, client_key: &str, category: RateCategory) -> RateDecision {
        let now = Instant::now();
        let key = format!("{}:{}", client_key, category.as_str());

        let mut map = match self.hits.lock() {
            Ok(guard) => guard,
            // A poisoned lock means another check panicked mid-update;
            // the timestamp log is still structurally sound.
            Err(poisoned) => poisoned.into_inner(),
        };

        if rand::thread_rng().gen_range(0..100) == 0 {
            self.sweep(&mut map, now);
        }

        let stamps = map.entry(key).or_default();
        stamps.retain(|stamp| now.duration_since(*stamp) < self.window);

        if stamps.len() >= self.cap(category) {
            // The oldest surviving stamp decides when a slot frees up
            let retry_after_seconds = stamps
                .first()
                .map(|oldest| {
                    let elapsed = now.duration_since(*oldest);
                    self.window.saturating_sub(elapsed).as_secs().max(1)
                })
                .unwrap_or(1);

            counter!(
                "rate_limit_rejections_total",
                "category" => category.as_str()
            )
            .increment(1);

            return RateDecision::Limited {
                retry_after_seconds,
            };
        }

        stamps.push(now);
        RateDecision::Allowed
    }
}

/// Construct the limiter named by configuration.
///
/// `AppConfig::validate` already rejects unknown backends; this stays total
/// anyway so a future backend only changes one match.
pub fn build_limiter(config: &RateLimitConfig) -> std::sync::Arc<dyn RateLimiter> {
    std::sync::Arc::new(SlidingWindowLimiter::from_config(config))
}
