//! Per-IP rate limiting for login and registration

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::core::ServerState;
use crate::security_log;
use crate::{AppError, ErrorCode};

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(
        &self,
        route: &'static str,
        ip: &str,
        max_requests: u32,
        window_secs: u64,
    ) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start).as_secs() >= window_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Remove entries older than 5 minutes
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let cutoff = std::time::Duration::from_secs(300);
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < cutoff);
        }

        map.retain(|_, route_map| !route_map.is_empty());
    }
}

/// Client IP: the peer address, or the first `X-Forwarded-For` entry when
/// the server sits behind a trusted proxy.
fn extract_ip(request: &Request, trust_forwarded: bool) -> String {
    if trust_forwarded
        && let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn limit(
    state: &ServerState,
    route: &'static str,
    max_requests: u32,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request, state.config.trust_proxy_headers);
    if !state.rate_limiter.check(route, &ip, max_requests, 60).await {
        security_log!("WARN", "rate_limited", route = route, ip = ip.clone());
        return Err(AppError::with_message(
            ErrorCode::TooManyRequests,
            "Too many requests, try again later",
        ));
    }
    Ok(next.run(request).await)
}

/// Login: 5 requests/minute per IP
pub async fn login_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limit(&state, "login", 5, request, next).await
}

/// Registration: 3 requests/minute per IP
pub async fn register_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limit(&state, "register", 3, request, next).await
}
