//! bcrypt hashing, run off the async executor.

use anyhow::Context as _;
use rand::RngExt;
use tokio::sync::OnceCell;

use crate::domain::types::BCRYPT_COST;
use crate::error::CrmError;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub async fn hash_password(plain: &str) -> Result<String, CrmError> {
    let plain = plain.to_owned();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(plain, BCRYPT_COST))
        .await
        .context("join bcrypt hash task")?
        .context("hash password")?;
    Ok(hash)
}

/// Compare `plain` against a stored bcrypt hash.
pub async fn verify_password(plain: &str, hash: &str) -> Result<bool, CrmError> {
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    let matched = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .context("join bcrypt verify task")?
        .context("verify password hash")?;
    Ok(matched)
}

/// Burn one bcrypt verification for a login whose username is unknown, so
/// its latency matches a wrong-password attempt. Always `false`.
pub async fn verify_unknown_user(plain: &str) -> Result<bool, CrmError> {
    static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();
    let hash = DUMMY_HASH
        .get_or_try_init(|| async { hash_password(&random_alphanumeric(32)).await })
        .await?;
    verify_password(plain, hash).await?;
    Ok(false)
}

/// Random `[A-Za-z0-9]` string of `len` characters.
pub fn random_alphanumeric(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())] as char)
        .collect()
}
