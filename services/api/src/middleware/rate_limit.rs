use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::state::AppState;
use crate::usecase::rate_limit::{CheckRateLimitUseCase, RateLimitBucket};

/// Peer address, else `unknown`. With `trust_forwarded_for` the first
/// `x-forwarded-for` hop wins over the peer.
pub fn client_key(req: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_owned();
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn enforce(
    state: &AppState,
    bucket: RateLimitBucket,
    req: Request,
    next: Next,
) -> Response {
    let limits = state.rate_limits;
    let limit = match bucket {
        RateLimitBucket::Default => limits.default_per_minute,
        RateLimitBucket::Sensitive => limits.sensitive_per_minute,
    };
    let usecase = CheckRateLimitUseCase {
        store: state.rate_limit_store(),
        limit,
    };
    let client = client_key(&req, limits.trust_forwarded_for);
    match usecase.execute(bucket, &client, Utc::now()).await {
        Ok(()) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}

pub async fn default_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    enforce(&state, RateLimitBucket::Default, req, next).await
}

pub async fn sensitive_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    enforce(&state, RateLimitBucket::Sensitive, req, next).await
}
