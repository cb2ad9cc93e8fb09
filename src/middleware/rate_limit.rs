// middleware/rate_limit.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::HttpError;

#[derive(Debug)]
struct Buckets {
    hits: HashMap<String, Vec<Instant>>,
    last_sweep: Option<Instant>,
}

/// Sliding-window limiter keyed by client. State is per process.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests: Arc<Mutex<Buckets>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Buckets {
                hits: HashMap::new(),
                last_sweep: None,
            })),
            max_requests,
            window,
        }
    }

    pub fn is_allowed(&self, key: &str) -> bool {
        self.is_allowed_at(key, Instant::now())
    }

    fn is_allowed_at(&self, key: &str, now: Instant) -> bool {
        // Keep serving if another request panicked while holding the lock.
        let mut buckets = self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        // At most one full sweep per window; idle clients drop out of the map.
        let sweep_due = buckets
            .last_sweep
            .map_or(true, |last| now.saturating_duration_since(last) >= self.window);
        if sweep_due {
            let window = self.window;
            buckets.hits.retain(|_, timestamps| {
                timestamps.retain(|&t| now.saturating_duration_since(t) < window);
                !timestamps.is_empty()
            });
            buckets.last_sweep = Some(now);
        }

        let entry = buckets.hits.entry(key.to_string()).or_default();
        entry.retain(|&timestamp| now.saturating_duration_since(timestamp) < self.window);

        if entry.len() < self.max_requests {
            entry.push(now);
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .hits
            .len()
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let client_id = get_client_id(&request);

    if !limiter.is_allowed(&client_id) {
        tracing::warn!("Rate limit exceeded for {} on {}", client_id, request.uri().path());
        return Err(HttpError::too_many_requests("Too many requests, please try again later"));
    }

    Ok(next.run(request).await)
}

fn get_client_id(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 10 requests per minute on the auth endpoints.
pub fn auth_rate_limiter() -> RateLimiter {
    RateLimiter::new(10, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_limit_within_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.is_allowed_at("1.2.3.4", now));
        assert!(limiter.is_allowed_at("1.2.3.4", now));
        assert!(!limiter.is_allowed_at("1.2.3.4", now));
        assert!(limiter.is_allowed_at("5.6.7.8", now));
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.is_allowed_at("ip", start));
        assert!(!limiter.is_allowed_at("ip", start + Duration::from_secs(30)));
        assert!(limiter.is_allowed_at("ip", start + Duration::from_secs(61)));
    }

    #[test]
    fn idle_clients_are_evicted() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60));
        let start = Instant::now();

        for i in 0..10_000 {
            assert!(limiter.is_allowed_at(&format!("10.0.{}.{}", i / 256, i % 256), start));
        }
        assert_eq!(limiter.tracked_clients(), 10_000);

        assert!(limiter.is_allowed_at("192.168.1.1", start + Duration::from_secs(3600)));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn client_id_uses_first_forwarded_address() {
        let request = Request::builder()
            .header("x-forwarded-for", "10.0.0.1, 172.16.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(get_client_id(&request), "10.0.0.1");

        let request = Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(get_client_id(&request), "unknown");
    }
}
