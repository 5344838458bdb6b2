use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crm_auth_types::identity::Identity;
use crm_domain::role::UserRole;

use crate::domain::types::{ApiKey, ApiKeyPatch};
use crate::error::CrmError;
use crate::state::AppState;
use crate::usecase::api_keys::{
    CreateApiKeyUseCase, DeleteApiKeyUseCase, GetApiKeyUseCase, IssuedApiKey,
    ListApiKeysUseCase, RegenerateApiKeyUseCase, UpdateApiKeyUseCase,
};

const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

// ── Response types ───────────────────────────────────────────────────────────

/// Channel credential without its secret.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub id: Uuid,
    pub channel_name: String,
    pub api_key: String,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    #[serde(serialize_with = "crm_core::serde::to_rfc3339_ms_opt")]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "crm_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "crm_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(k: ApiKey) -> Self {
        Self {
            id: k.id,
            channel_name: k.channel_name,
            api_key: k.api_key,
            is_active: k.is_active,
            created_by: k.created_by,
            last_used_at: k.last_used_at,
            created_at: k.created_at,
            updated_at: k.updated_at,
        }
    }
}

/// Returned on create and regenerate only; the plain secret is never stored.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedApiKeyResponse {
    #[serde(flatten)]
    pub key: ApiKeyResponse,
    pub api_secret: String,
}

impl From<IssuedApiKey> for IssuedApiKeyResponse {
    fn from(issued: IssuedApiKey) -> Self {
        Self {
            key: issued.key.into(),
            api_secret: issued.api_secret,
        }
    }
}

// ── GET /api/api-keys ────────────────────────────────────────────────────────

pub async fn list_api_keys(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<ApiKeyResponse>>, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = ListApiKeysUseCase {
        keys: state.api_key_repo(),
    };
    let keys = usecase.execute().await?;
    Ok(Json(keys.into_iter().map(Into::into).collect()))
}

// ── GET /api/api-keys/{id} ───────────────────────────────────────────────────

pub async fn get_api_key(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiKeyResponse>, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = GetApiKeyUseCase {
        keys: state.api_key_repo(),
    };
    Ok(Json(usecase.execute(id).await?.into()))
}

// ── POST /api/api-keys ───────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest {
    pub channel_name: String,
}

pub async fn create_api_key(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<IssuedApiKeyResponse>), CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = CreateApiKeyUseCase {
        keys: state.api_key_repo(),
    };
    let issued = usecase
        .execute(identity.user_id, &body.channel_name)
        .await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

// ── PATCH /api/api-keys/{id} ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiKeyRequest {
    pub channel_name: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn update_api_key(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateApiKeyRequest>,
) -> Result<Json<ApiKeyResponse>, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = UpdateApiKeyUseCase {
        keys: state.api_key_repo(),
    };
    let key = usecase
        .execute(
            id,
            ApiKeyPatch {
                channel_name: body.channel_name,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(Json(key.into()))
}

// ── POST /api/api-keys/{id}/regenerate ───────────────────────────────────────

pub async fn regenerate_api_key(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IssuedApiKeyResponse>, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = RegenerateApiKeyUseCase {
        keys: state.api_key_repo(),
    };
    Ok(Json(usecase.execute(id).await?.into()))
}

// ── DELETE /api/api-keys/{id} ────────────────────────────────────────────────

pub async fn delete_api_key(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, CrmError> {
    identity.require_role(ADMIN_ONLY)?;
    let usecase = DeleteApiKeyUseCase {
        keys: state.api_key_repo(),
    };
    usecase.execute(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
