use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crm_auth_types::identity::Identity;
use crm_domain::pagination::{Page, PageRequest};
use crm_domain::role::UserRole;

use crate::domain::types::{User, UserFilter};
use crate::error::CrmError;
use crate::handlers::{parse_query, patch_text};
use crate::state::AppState;
use crate::usecase::users::{
    BatchDeleteUsersUseCase, BatchUpdateUsersInput, BatchUpdateUsersUseCase, CreateUserInput,
    CreateUserUseCase, DeleteUserUseCase, GetUserUseCase, ListAgentsUseCase, ListUsersUseCase,
    ResetPasswordUseCase, UpdateUserInput, UpdateUserUseCase,
};

const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

// ── Response types ───────────────────────────────────────────────────────────

/// Staff account as returned to clients. Never carries the password hash.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(serialize_with = "crm_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "crm_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            phone: user.phone,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
}

#[derive(Serialize)]
pub struct UpdatedResponse {
    pub updated: u64,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

// ── GET /api/users ───────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub keyword: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<String>,
}

pub async fn list_users(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Page<UserResponse>>, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let filter = UserFilter {
        keyword: query.keyword.filter(|k| !k.trim().is_empty()),
        role: parse_query("role", query.role.as_deref())?,
        is_active: parse_query("isActive", query.is_active.as_deref())?,
    };
    let usecase = ListUsersUseCase {
        users: state.user_repo(),
    };
    let page = usecase
        .execute(filter, PageRequest::from_query(query.page, query.page_size))
        .await?;
    Ok(Json(page.map(UserResponse::from)))
}

// ── GET /api/users/agents ────────────────────────────────────────────────────

pub async fn list_agents(
    _identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<AgentResponse>>, CrmError> {
    let usecase = ListAgentsUseCase {
        users: state.user_repo(),
    };
    let agents = usecase.execute().await?;
    Ok(Json(
        agents
            .into_iter()
            .map(|u| AgentResponse {
                id: u.id,
                username: u.username,
                full_name: u.full_name,
            })
            .collect(),
    ))
}

// ── GET /api/users/{id} ──────────────────────────────────────────────────────

pub async fn get_user(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = GetUserUseCase {
        users: state.user_repo(),
    };
    Ok(Json(usecase.execute(id).await?.into()))
}

// ── POST /api/users ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

pub async fn create_user(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = CreateUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase
        .execute(CreateUserInput {
            username: body.username,
            password: body.password,
            full_name: body.full_name,
            phone: body.phone,
            role: body.role.unwrap_or(UserRole::Agent),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

// ── PATCH /api/users/{id} ────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

pub async fn update_user(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = UpdateUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase
        .execute(
            identity.user_id,
            id,
            UpdateUserInput {
                username: body.username,
                full_name: body.full_name,
                phone: patch_text(body.phone),
                role: body.role,
                is_active: body.is_active,
                password: body.password,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

// ── PATCH /api/users/{id}/password ───────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

pub async fn reset_password(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<StatusCode, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = ResetPasswordUseCase {
        users: state.user_repo(),
    };
    usecase.execute(id, &body.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /api/users/{id} ───────────────────────────────────────────────────

pub async fn delete_user(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = DeleteUserUseCase {
        users: state.user_repo(),
    };
    usecase.execute(identity.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /api/users/batch-update ─────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateUsersRequest {
    pub ids: Vec<Uuid>,
    pub is_active: Option<bool>,
    pub role: Option<UserRole>,
}

pub async fn batch_update_users(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<BatchUpdateUsersRequest>,
) -> Result<Json<UpdatedResponse>, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = BatchUpdateUsersUseCase {
        users: state.user_repo(),
    };
    let updated = usecase
        .execute(
            identity.user_id,
            BatchUpdateUsersInput {
                ids: body.ids,
                is_active: body.is_active,
                role: body.role,
            },
        )
        .await?;
    Ok(Json(UpdatedResponse { updated }))
}

// ── POST /api/users/batch-delete ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BatchDeleteUsersRequest {
    pub ids: Vec<Uuid>,
}

pub async fn batch_delete_users(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<BatchDeleteUsersRequest>,
) -> Result<Json<DeletedResponse>, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = BatchDeleteUsersUseCase {
        users: state.user_repo(),
    };
    let deleted = usecase.execute(identity.user_id, &body.ids).await?;
    Ok(Json(DeletedResponse { deleted }))
}
