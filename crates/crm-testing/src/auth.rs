//! Mock auth helpers for integration tests.
//!
//! Staff routes authenticate with `Authorization: Bearer <jwt>`. `MockAuth` signs
//! a token with a known secret so tests can call those routes without a login.

use http::{HeaderName, HeaderValue, header::AUTHORIZATION};
use uuid::Uuid;

use crm_auth_types::identity::Identity;
use crm_auth_types::token::issue_access_token;
use crm_domain::role::UserRole;

/// Secret shared by `MockAuth` and the test router state.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl MockAuth {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self {
            user_id,
            username: format!("{}-{}", role.as_str(), &user_id.simple().to_string()[..8]),
            role,
        }
    }

    pub fn admin() -> Self {
        Self::new(Uuid::now_v7(), UserRole::Admin)
    }

    pub fn agent() -> Self {
        Self::new(Uuid::now_v7(), UserRole::Agent)
    }

    /// The identity a handler would see after extraction.
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            username: self.username.clone(),
            role: self.role,
        }
    }

    /// A signed bearer token for this identity, valid for one hour.
    pub fn token(&self) -> String {
        let (token, _) = issue_access_token(
            self.user_id,
            &self.username,
            self.role,
            TEST_JWT_SECRET,
            3600,
        )
        .unwrap();
        token
    }

    /// `Authorization` header pair carrying [`MockAuth::token`].
    pub fn header(&self) -> (HeaderName, HeaderValue) {
        let value = HeaderValue::from_str(&format!("Bearer {}", self.token())).unwrap();
        (AUTHORIZATION, value)
    }
}
