use anyhow::Context as _;
use uuid::Uuid;

use crm_auth_types::token::issue_access_token;

use crate::domain::repository::UserRepository;
use crate::domain::types::{User, UserPatch, validate_password};
use crate::error::CrmError;
use crate::usecase::password::{hash_password, verify_password, verify_unknown_user};

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub access_token: String,
    pub expires_in: u64,
    pub user: User,
}

pub struct LoginUseCase<U: UserRepository> {
    pub users: U,
    pub jwt_secret: String,
    pub jwt_ttl_secs: u64,
}

impl<U: UserRepository> LoginUseCase<U> {
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, CrmError> {
        let Some(user) = self.users.find_by_username(input.username.trim()).await? else {
            verify_unknown_user(&input.password).await?;
            return Err(CrmError::InvalidCredentials);
        };

        if !verify_password(&input.password, &user.password_hash).await? {
            return Err(CrmError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(CrmError::AccountDisabled);
        }

        let (access_token, _exp) = issue_access_token(
            user.id,
            &user.username,
            user.role,
            &self.jwt_secret,
            self.jwt_ttl_secs,
        )
        .context("sign access token")?;

        tracing::info!(user_id = %user.id, role = %user.role, "user logged in");
        Ok(LoginOutput {
            access_token,
            expires_in: self.jwt_ttl_secs,
            user,
        })
    }
}

// ── GetProfile ───────────────────────────────────────────────────────────────

pub struct GetProfileUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetProfileUseCase<U> {
    pub async fn execute(&self, user_id: Uuid) -> Result<User, CrmError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(CrmError::UserNotFound)
    }
}

// ── ChangePassword ───────────────────────────────────────────────────────────

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ChangePasswordUseCase<U> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        input: ChangePasswordInput,
    ) -> Result<(), CrmError> {
        validate_password(&input.new_password)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(CrmError::UserNotFound)?;
        if !verify_password(&input.current_password, &user.password_hash).await? {
            return Err(CrmError::InvalidCredentials);
        }
        let patch = UserPatch {
            password_hash: Some(hash_password(&input.new_password).await?),
            ..Default::default()
        };
        self.users.update(user_id, &patch).await
    }
}
