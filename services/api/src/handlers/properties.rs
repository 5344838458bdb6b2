use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crm_auth_types::identity::Identity;
use crm_domain::role::UserRole;

use crate::domain::types::Property;
use crate::error::CrmError;
use crate::state::AppState;
use crate::usecase::properties::{
    CreatePropertyInput, CreatePropertyUseCase, ListPropertiesUseCase,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    #[serde(serialize_with = "crm_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<Property> for PropertyResponse {
    fn from(p: Property) -> Self {
        Self {
            id: p.id,
            name: p.name,
            address: p.address,
            created_at: p.created_at,
        }
    }
}

// ── GET /api/properties ──────────────────────────────────────────────────────

pub async fn list_properties(
    _identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<PropertyResponse>>, CrmError> {
    let usecase = ListPropertiesUseCase {
        properties: state.property_repo(),
    };
    let properties = usecase.execute().await?;
    Ok(Json(properties.into_iter().map(Into::into).collect()))
}

// ── POST /api/properties ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreatePropertyRequest {
    pub name: String,
    pub address: String,
}

pub async fn create_property(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<PropertyResponse>), CrmError> {
    identity.require_role(&[UserRole::Admin])?;
    let usecase = CreatePropertyUseCase {
        properties: state.property_repo(),
    };
    let property = usecase
        .execute(CreatePropertyInput {
            name: body.name,
            address: body.address,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(property.into())))
}
