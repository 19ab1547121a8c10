//! Fixed-window request limiter for `/api/*`, counted per client IP in Redis.
//!
//! Each window is one key (`rate_limit:{ip}`). `INCR` and `TTL` go out in one
//! `MULTI` block; a key without a TTL gets one, so a failed `EXPIRE` is repaired
//! on the next hit. Redis being unavailable never blocks traffic.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::state::AppState;

const KEY_PREFIX: &str = "rate_limit";
const LIMITED_PREFIX: &str = "/api/";
const UNKNOWN_CLIENT: &str = "unknown";

/// Peer address, or the first `X-Forwarded-For` hop when running behind a
/// trusted proxy.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let forwarded = trust_proxy
        .then(|| headers.get("x-forwarded-for"))
        .flatten()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string);

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub fn is_limited_path(path: &str) -> bool {
    path.starts_with(LIMITED_PREFIX)
}

pub fn window_key(ip: &str) -> String {
    format!("{KEY_PREFIX}:{ip}")
}

pub fn is_over_limit(count: u64, max_requests: u64) -> bool {
    count > max_requests
}

/// `TTL` answers -1 for a key that exists without an expiry.
pub fn needs_expiry(ttl: i64) -> bool {
    ttl < 0
}

async fn hit(state: &AppState, key: &str) -> Result<u64, redis::RedisError> {
    let mut conn = state.redis.get_multiplexed_async_connection().await?;
    let (count, ttl): (u64, i64) = redis::pipe()
        .atomic()
        .incr(key, 1)
        .ttl(key)
        .query_async(&mut conn)
        .await?;

    if needs_expiry(ttl) {
        let window = i64::try_from(state.config.rate_limit.window_secs).unwrap_or(i64::MAX);
        let _: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(window)
            .query_async(&mut conn)
            .await?;
    }
    Ok(count)
}

/// Middleware for `axum::middleware::from_fn_with_state`. Layered over the
/// whole router so unmatched `/api/*` paths are counted too.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if !is_limited_path(req.uri().path()) {
        return next.run(req).await;
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(req.headers(), peer, state.config.rate_limit.trust_proxy);
    let key = window_key(&ip);

    match hit(&state, &key).await {
        Ok(count) if is_over_limit(count, state.config.rate_limit.max_requests) => {
            debug!("Rate limit exceeded for {ip} ({count} requests)");
            return AppError::RateLimited(
                "Too many requests from this IP, please try again later.".to_string(),
            )
            .into_response();
        }
        Ok(_) => {}
        Err(e) => warn!("Rate limiter unavailable, allowing request: {e}"),
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_forwarded_header_ignored_without_trusted_proxy() {
        let peer: SocketAddr = "198.51.100.5:40000".parse().unwrap();

        let keys: Vec<String> = ["10.9.9.0", "10.9.9.1", "10.9.9.2"]
            .into_iter()
            .map(|hop| window_key(&client_ip(&forwarded(hop), Some(peer), false)))
            .collect();

        assert!(keys.iter().all(|key| key == "rate_limit:198.51.100.5"));
    }

    #[test]
    fn test_forwarded_for_first_hop_wins_behind_proxy() {
        let headers = forwarded("203.0.113.7, 10.0.0.1");
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();

        assert_eq!(client_ip(&headers, Some(peer), true), "203.0.113.7");
    }

    #[test]
    fn test_peer_address_without_forwarding() {
        let peer: SocketAddr = "192.0.2.10:443".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer), true), "192.0.2.10");
        assert_eq!(client_ip(&HeaderMap::new(), None, false), "unknown");
    }

    #[test]
    fn test_blank_forwarded_header_is_ignored() {
        let peer: SocketAddr = "192.0.2.10:443".parse().unwrap();
        assert_eq!(client_ip(&forwarded(" "), Some(peer), true), "192.0.2.10");
    }

    #[test]
    fn test_key_without_ttl_gets_expiry() {
        assert!(needs_expiry(-1));
        assert!(!needs_expiry(0));
        assert!(!needs_expiry(899));
    }

    #[test]
    fn test_only_api_paths_are_limited() {
        assert!(is_limited_path("/api/auth/signin"));
        assert!(is_limited_path("/api/does-not-exist"));
        assert!(!is_limited_path("/health"));
        assert!(!is_limited_path("/apix"));
    }

    #[test]
    fn test_limit_is_inclusive() {
        assert_eq!(window_key("192.0.2.10"), "rate_limit:192.0.2.10");
        assert!(!is_over_limit(100, 100));
        assert!(is_over_limit(101, 100));
    }
}
