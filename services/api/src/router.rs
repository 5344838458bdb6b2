use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crm_core::health::{healthz, readiness};
use crm_core::middleware::{cors_layer, propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    api_keys::{
        create_api_key, delete_api_key, get_api_key, list_api_keys, regenerate_api_key,
        update_api_key,
    },
    auth::{change_password, get_profile, login},
    export::export_viewing_records,
    properties::{create_property, list_properties},
    public,
    roles::list_roles,
    users::{
        batch_delete_users, batch_update_users, create_user, delete_user, get_user, list_agents,
        list_users, reset_password, update_user,
    },
    viewing_records::{
        batch_update_status, create_record, delete_record, get_record, list_records,
        record_statistics, update_record, update_record_status,
    },
};
use crate::middleware::api_key::require_api_key;
use crate::middleware::rate_limit::{default_rate_limit, sensitive_rate_limit};
use crate::state::AppState;

async fn readyz(State(state): State<AppState>) -> StatusCode {
    readiness(state.db.ping().await)
}

pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let health = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz));

    let login_routes = Router::new()
        .route("/api/auth/login", post(login))
        .route_layer(from_fn_with_state(state.clone(), sensitive_rate_limit));

    let staff = Router::new()
        // Auth
        .route("/api/auth/profile", get(get_profile))
        .route("/api/auth/password", patch(change_password))
        // Roles
        .route("/api/roles", get(list_roles))
        // Users
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/agents", get(list_agents))
        .route("/api/users/batch-update", post(batch_update_users))
        .route("/api/users/batch-delete", post(batch_delete_users))
        .route(
            "/api/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/api/users/{id}/password", patch(reset_password))
        // Properties
        .route("/api/properties", get(list_properties).post(create_property))
        // Viewing records
        .route("/api/viewing-records", get(list_records).post(create_record))
        .route("/api/viewing-records/statistics", get(record_statistics))
        .route("/api/viewing-records/batch-status", post(batch_update_status))
        .route(
            "/api/viewing-records/{id}",
            get(get_record).patch(update_record).delete(delete_record),
        )
        .route("/api/viewing-records/{id}/status", patch(update_record_status))
        // API keys
        .route("/api/api-keys", get(list_api_keys).post(create_api_key))
        .route(
            "/api/api-keys/{id}",
            get(get_api_key).patch(update_api_key).delete(delete_api_key),
        )
        .route("/api/api-keys/{id}/regenerate", post(regenerate_api_key))
        // Export
        .route("/api/export/viewing-records", get(export_viewing_records))
        .route_layer(from_fn_with_state(state.clone(), default_rate_limit));

    // The limiter wraps the key check so rejected credentials still count.
    let channel = Router::new()
        .route(
            "/api/public/viewing-records",
            get(public::list_records).post(public::create_record),
        )
        .route(
            "/api/public/viewing-records/{id}",
            get(public::get_record).patch(public::update_record),
        )
        .route_layer(from_fn_with_state(state.clone(), require_api_key))
        .route_layer(from_fn_with_state(state.clone(), sensitive_rate_limit));

    Router::new()
        .merge(health)
        .merge(login_routes)
        .merge(staff)
        .merge(channel)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer())
                .layer(cors_layer(cors_origin)),
        )
}
