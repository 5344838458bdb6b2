use std::net::SocketAddr;

use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use crm_api::config::ApiConfig;
use crm_api::router::build_router;
use crm_api::state::{AppState, RateLimits};
use crm_api::usecase::users::EnsureBootstrapAdminUseCase;
use crm_api_migration::{Migrator, MigratorTrait};
use crm_auth_types::identity::JwtSecret;
use crm_core::tracing::{LogFormat, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;
    init_tracing(LogFormat::for_environment(&config.environment));

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    if config.run_migrations {
        Migrator::up(&db, None)
            .await
            .context("failed to apply migrations")?;
        info!("migrations applied");
    }

    let redis = deadpool_redis::Config::from_url(&config.redis_url)
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .context("failed to create Redis pool")?;

    let state = AppState {
        db,
        redis,
        jwt_secret: JwtSecret::new(config.jwt_secret.as_str()),
        jwt_ttl_secs: config.jwt_ttl_secs,
        rate_limits: RateLimits {
            default_per_minute: config.rate_limit_default,
            sensitive_per_minute: config.rate_limit_sensitive,
            trust_forwarded_for: config.trust_proxy,
        },
    };

    if let Some(admin) = &config.bootstrap_admin {
        let usecase = EnsureBootstrapAdminUseCase {
            users: state.user_repo(),
        };
        if usecase
            .execute(&admin.username, &admin.password)
            .await
            .context("failed to create bootstrap admin")?
        {
            info!(username = %admin.username, "bootstrap admin created");
        }
    }

    let router = build_router(state, &config.cors_origin);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("crm api listening on {addr}");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;
    Ok(())
}
