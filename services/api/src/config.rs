use anyhow::{Context as _, anyhow};

use crm_core::config::{optional, parse_or, required};

/// CRM API configuration loaded from environment variables.
#[derive(Debug)]
pub struct ApiConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// Redis URL for the nonce store and rate-limit counters. Env var: `REDIS_URL`.
    pub redis_url: String,
    /// HS256 signing secret. Env var: `JWT_SECRET`.
    pub jwt_secret: String,
    /// Access-token lifetime in seconds. Env var: `JWT_EXPIRES_IN` (default `24h`).
    pub jwt_ttl_secs: u64,
    /// TCP port for the HTTP server (default 3000). Env var: `PORT`.
    pub port: u16,
    /// `*` or a comma-separated origin list. Env var: `CORS_ORIGIN`.
    pub cors_origin: String,
    /// Deployment environment name. Env var: `NODE_ENV`.
    pub environment: String,
    pub rate_limit_default: u64,
    pub rate_limit_sensitive: u64,
    /// Key rate limits on `x-forwarded-for` instead of the peer address.
    /// Only safe behind a proxy that overwrites the header. Env var: `TRUST_PROXY`.
    pub trust_proxy: bool,
    pub run_migrations: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials for the admin account created on first start.
#[derive(Debug)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_ttl_secs = match optional("JWT_EXPIRES_IN") {
            Some(raw) => parse_duration_secs(&raw)
                .with_context(|| format!("invalid value for env var JWT_EXPIRES_IN: {raw:?}"))?,
            None => 24 * 60 * 60,
        };

        let bootstrap_admin = match (
            optional("BOOTSTRAP_ADMIN_USERNAME"),
            optional("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "BOOTSTRAP_ADMIN_USERNAME and BOOTSTRAP_ADMIN_PASSWORD must be set together"
                ));
            }
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: optional("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".into()),
            jwt_secret: required("JWT_SECRET")?,
            jwt_ttl_secs,
            port: parse_or("PORT", 3000)?,
            cors_origin: optional("CORS_ORIGIN").unwrap_or_else(|| "*".into()),
            environment: optional("NODE_ENV").unwrap_or_else(|| "development".into()),
            rate_limit_default: parse_or("RATE_LIMIT_DEFAULT", 100)?,
            rate_limit_sensitive: parse_or("RATE_LIMIT_SENSITIVE", 20)?,
            trust_proxy: parse_or("TRUST_PROXY", false)?,
            run_migrations: parse_or("RUN_MIGRATIONS", true)?,
            bootstrap_admin,
        })
    }
}

/// Parse a token lifetime: bare seconds (`3600`) or a number with an
/// `s`, `m`, `h` or `d` suffix (`15m`, `24h`, `7d`).
pub fn parse_duration_secs(raw: &str) -> anyhow::Result<u64> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&raw[..i], c.to_ascii_lowercase()),
        _ => (raw, 's'),
    };
    let value: u64 = digits.trim().parse().context("expected a positive integer")?;
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        other => return Err(anyhow!("unknown duration unit {other:?}")),
    };
    if value == 0 {
        return Err(anyhow!("duration must be greater than zero"));
    }
    value
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow!("duration overflows"))
}
