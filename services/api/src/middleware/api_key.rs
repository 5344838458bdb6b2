use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use crate::error::CrmError;
use crate::state::AppState;
use crate::usecase::channel_auth::{AuthenticateChannelUseCase, ChannelCredentials};

pub const X_API_KEY: &str = "x-api-key";
pub const X_API_SECRET: &str = "x-api-secret";
pub const X_TIMESTAMP: &str = "x-timestamp";
pub const X_NONCE: &str = "x-nonce";

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

pub fn credentials_from_headers(headers: &HeaderMap) -> ChannelCredentials {
    ChannelCredentials {
        api_key: header(headers, X_API_KEY),
        api_secret: header(headers, X_API_SECRET),
        timestamp: header(headers, X_TIMESTAMP),
        nonce: header(headers, X_NONCE),
    }
}

/// Authenticate the calling channel and attach its
/// [`ChannelIdentity`](crate::domain::types::ChannelIdentity) to the request.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, CrmError> {
    let credentials = credentials_from_headers(req.headers());
    let usecase = AuthenticateChannelUseCase {
        keys: state.api_key_repo(),
        nonces: state.nonce_store(),
    };
    let channel = usecase
        .execute(&credentials, Utc::now())
        .await
        .inspect_err(|e| tracing::debug!(kind = e.kind(), "api key guard rejected request"))?;
    req.extensions_mut().insert(channel);
    Ok(next.run(req).await)
}
