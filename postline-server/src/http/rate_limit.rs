//! Sliding-window rate limiting for public read endpoints

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, MatchedPath, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use super::error::ApiError;
use super::server::AppState;

/// Request timestamps per `client:route` bucket
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
        }
    }

    /// Record a request.
    ///
    /// Returns the requests left in the window, or how long until the oldest
    /// hit in the bucket expires when the limit is reached.
    pub fn allow(&self, client: &str, route: &str) -> Result<u32, Duration> {
        self.allow_at(client, route, Instant::now())
    }

    fn allow_at(&self, client: &str, route: &str, now: Instant) -> Result<u32, Duration> {
        let window = self.window;
        let mut entry = self.buckets.entry(format!("{client}:{route}")).or_default();
        entry.retain(|instant| now.duration_since(*instant) < window);

        let remaining = self.max_requests.saturating_sub(entry.len() as u32);
        if remaining == 0 {
            let oldest = entry.iter().min().copied().unwrap_or(now);
            return Err(window.saturating_sub(now.duration_since(oldest)));
        }

        entry.push(now);
        Ok(remaining - 1)
    }

    /// Drop buckets with no requests inside the window.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let window = self.window;
        let before = self.buckets.len();
        self.buckets
            .retain(|_, hits| hits.iter().any(|t| now.duration_since(*t) < window));
        before - self.buckets.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }
}

/// Middleware: reject with 429 once a client exceeds the limit for a route.
pub async fn limit_requests(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let client = client_key(&request);

    let remaining = match state.limiter.allow(&client, &route) {
        Ok(remaining) => remaining,
        Err(wait) => {
            tracing::warn!(
                target: "postline::ratelimit",
                client = %client,
                route = %route,
                "rate limit exceeded"
            );
            return ApiError::RateLimited {
                retry_after_secs: retry_after_secs(wait),
            }
            .into_response();
        }
    };

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", state.limiter.limit().into());
    headers.insert("x-ratelimit-remaining", remaining.into());
    response
}

/// Whole seconds, rounded up, never zero.
fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

/// First X-Forwarded-For hop, else the socket peer.
fn client_key(request: &Request<Body>) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(addr) = forwarded {
        return addr.to_owned();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);

        assert_eq!(limiter.allow("1.2.3.4", "/api/posts/{id}"), Ok(2));
        assert_eq!(limiter.allow("1.2.3.4", "/api/posts/{id}"), Ok(1));
        assert_eq!(limiter.allow("1.2.3.4", "/api/posts/{id}"), Ok(0));
        assert!(limiter.allow("1.2.3.4", "/api/posts/{id}").is_err());
    }

    #[test]
    fn buckets_are_per_client_and_route() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);

        assert!(limiter.allow("a", "/read").is_ok());
        assert!(limiter.allow("a", "/read").is_err());
        assert!(limiter.allow("b", "/read").is_ok());
        assert!(limiter.allow("a", "/find").is_ok());
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 1);
        let start = Instant::now();

        assert!(limiter.allow_at("a", "/r", start).is_ok());
        assert!(limiter.allow_at("a", "/r", start + Duration::from_secs(9)).is_err());
        assert!(limiter.allow_at("a", "/r", start + Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn sweep_drops_idle_buckets() {
        let limiter = RateLimiter::new(Duration::from_millis(1), 5);
        let _ = limiter.allow("a", "/r");
        std::thread::sleep(Duration::from_millis(5));
        let _ = limiter.allow("b", "/r");

        assert_eq!(limiter.sweep(), 1);
    }

    #[test]
    fn wait_is_until_oldest_hit_expires() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        let start = Instant::now();

        assert!(limiter.allow_at("a", "/r", start).is_ok());
        assert!(limiter.allow_at("a", "/r", start + Duration::from_secs(20)).is_ok());
        assert_eq!(
            limiter.allow_at("a", "/r", start + Duration::from_secs(45)),
            Err(Duration::from_secs(15))
        );
    }

    #[test]
    fn retry_after_rounds_up_and_is_at_least_one_second() {
        assert_eq!(retry_after_secs(Duration::from_millis(14_200)), 15);
        assert_eq!(retry_after_secs(Duration::from_secs(15)), 15);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "203.0.113.9");

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&request), "unknown");
    }
}
