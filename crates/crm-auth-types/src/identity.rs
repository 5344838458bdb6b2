//! Bearer-token identity extractor.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use http::request::Parts;
use uuid::Uuid;

use crm_core::error::AppError;
use crm_domain::role::UserRole;

use crate::token::validate_access_token;

/// HMAC secret used to verify access tokens. Provide it from the router state
/// with `FromRef` so [`Identity`] can extract itself.
#[derive(Clone)]
pub struct JwtSecret(pub Arc<str>);

impl JwtSecret {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }
}

/// Authenticated staff member, taken from `Authorization: Bearer <jwt>`.
///
/// Returns 401 if the header is absent or the token fails validation.
/// Role enforcement (403) is done by handlers after extraction.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Role allow-list check.
    pub fn has_any_role(&self, allowed: &[UserRole]) -> bool {
        allowed.contains(&self.role)
    }

    /// 403 unless the caller holds one of `allowed`.
    pub fn require_role(&self, allowed: &[UserRole]) -> Result<(), AppError> {
        if self.has_any_role(allowed) {
            Ok(())
        } else {
            tracing::debug!(user_id = %self.user_id, role = %self.role, "role not allowed");
            Err(AppError::Forbidden)
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    JwtSecret: FromRef<S>,
{
    type Rejection = AppError;

    // Extract synchronously and return a 'static future: axum-core 0.5 declares this
    // as `fn -> impl Future + Send`, and an `async fn` would capture `parts`.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let secret = JwtSecret::from_ref(state);
        let result = match parts.headers.typed_get::<Authorization<Bearer>>() {
            Some(auth) => validate_access_token(auth.token(), &secret.0).map_err(|e| {
                tracing::debug!(error = %e, "rejected bearer token");
                AppError::Unauthorized
            }),
            None => Err(AppError::Unauthorized),
        };

        async move {
            let info = result?;
            Ok(Self {
                user_id: info.user_id,
                username: info.username,
                role: info.role,
            })
        }
    }
}
