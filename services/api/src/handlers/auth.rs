use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crm_auth_types::identity::Identity;
use crm_domain::role::UserRole;

use crate::error::CrmError;
use crate::handlers::users::UserResponse;
use crate::state::AppState;
use crate::usecase::auth::{
    ChangePasswordInput, ChangePasswordUseCase, GetProfileUseCase, LoginInput, LoginUseCase,
};

// ── POST /api/auth/login ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: LoginUserResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, CrmError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        jwt_secret: state.jwt_secret.0.to_string(),
        jwt_ttl_secs: state.jwt_ttl_secs,
    };
    let output = usecase
        .execute(LoginInput {
            username: body.username,
            password: body.password,
        })
        .await?;
    Ok(Json(LoginResponse {
        access_token: output.access_token,
        token_type: "Bearer",
        expires_in: output.expires_in,
        user: LoginUserResponse {
            id: output.user.id,
            username: output.user.username,
            full_name: output.user.full_name,
            role: output.user.role,
        },
    }))
}

// ── GET /api/auth/profile ────────────────────────────────────────────────────

pub async fn get_profile(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, CrmError> {
    let usecase = GetProfileUseCase {
        users: state.user_repo(),
    };
    Ok(Json(usecase.execute(identity.user_id).await?.into()))
}

// ── PATCH /api/auth/password ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, CrmError> {
    let usecase = ChangePasswordUseCase {
        users: state.user_repo(),
    };
    usecase
        .execute(
            identity.user_id,
            ChangePasswordInput {
                current_password: body.current_password,
                new_password: body.new_password,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
