use axum::{Json, extract::State};
use serde::Serialize;

use crm_auth_types::identity::Identity;

use crate::error::CrmError;
use crate::state::AppState;
use crate::usecase::roles::ListRolesUseCase;

#[derive(Serialize)]
pub struct RoleResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

// ── GET /api/roles ───────────────────────────────────────────────────────────

pub async fn list_roles(
    _identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleResponse>>, CrmError> {
    let usecase = ListRolesUseCase {
        roles: state.role_repo(),
    };
    let roles = usecase.execute().await?;
    Ok(Json(
        roles
            .into_iter()
            .map(|r| RoleResponse {
                id: r.id,
                name: r.name,
                description: r.description,
            })
            .collect(),
    ))
}
