use chrono::{Duration, Utc};

use uuid::Uuid;

use crm_api::domain::repository::ApiKeyRepository;
use crm_api::domain::types::ApiKeyPatch;
use crm_api::error::CrmError;
use crm_api::usecase::api_keys::{CreateApiKeyUseCase, IssuedApiKey, UpdateApiKeyUseCase};
use crm_api::usecase::channel_auth::{AuthenticateChannelUseCase, ChannelCredentials};

use crate::helpers::{MockApiKeyRepo, MockDb, MockNonceStore};

async fn issue(db: &MockDb, channel: &str) -> IssuedApiKey {
    CreateApiKeyUseCase {
        keys: db.api_keys(),
    }
    .execute(Uuid::now_v7(), channel)
    .await
    .unwrap()
}

fn guard(
    db: &MockDb,
    nonces: &MockNonceStore,
) -> AuthenticateChannelUseCase<MockApiKeyRepo, MockNonceStore> {
    AuthenticateChannelUseCase {
        keys: db.api_keys(),
        nonces: nonces.clone(),
    }
}

fn creds(issued: &IssuedApiKey, timestamp: i64, nonce: &str) -> ChannelCredentials {
    ChannelCredentials {
        api_key: Some(issued.key.api_key.clone()),
        api_secret: Some(issued.api_secret.clone()),
        timestamp: Some(timestamp.to_string()),
        nonce: Some(nonce.to_owned()),
    }
}

#[tokio::test]
async fn should_authenticate_fresh_request_and_touch_last_used() {
    let db = MockDb::new();
    let nonces = MockNonceStore::default();
    let issued = issue(&db, "Partner").await;
    let now = Utc::now();

    let channel = guard(&db, &nonces)
        .execute(&creds(&issued, now.timestamp_millis(), "n-1"), now)
        .await
        .unwrap();

    assert_eq!(channel.id, issued.key.id);
    assert_eq!(channel.channel_name, "Partner");
    let stored = db.api_keys().find_by_id(issued.key.id).await.unwrap().unwrap();
    assert_eq!(stored.last_used_at, Some(now));
}

#[tokio::test]
async fn should_reject_replay_but_accept_same_nonce_with_new_timestamp() {
    let db = MockDb::new();
    let nonces = MockNonceStore::default();
    let issued = issue(&db, "Partner").await;
    let now = Utc::now();
    let ts = now.timestamp_millis();

    guard(&db, &nonces)
        .execute(&creds(&issued, ts, "n-1"), now)
        .await
        .unwrap();
    let replay = guard(&db, &nonces)
        .execute(&creds(&issued, ts, "n-1"), now)
        .await
        .unwrap_err();
    assert!(matches!(replay, CrmError::DuplicateRequest));

    guard(&db, &nonces)
        .execute(&creds(&issued, ts + 1, "n-1"), now)
        .await
        .unwrap();
}

#[tokio::test]
async fn should_reject_replay_with_respelled_timestamp() {
    let db = MockDb::new();
    let nonces = MockNonceStore::default();
    let issued = issue(&db, "Partner").await;
    let now = Utc::now();
    let ts = now.timestamp_millis();

    guard(&db, &nonces)
        .execute(&creds(&issued, ts, "n-1"), now)
        .await
        .unwrap();

    for spelling in [format!("+{ts}"), format!("0{ts}"), format!(" {ts} ")] {
        let mut replay = creds(&issued, ts, "n-1");
        replay.timestamp = Some(spelling);
        let err = guard(&db, &nonces).execute(&replay, now).await.unwrap_err();
        assert!(matches!(err, CrmError::DuplicateRequest));
    }
}

#[tokio::test]
async fn should_report_missing_credentials_before_anything_else() {
    let db = MockDb::new();
    let nonces = MockNonceStore::default();
    let issued = issue(&db, "Partner").await;
    let now = Utc::now();

    let mut partial = creds(&issued, 0, "n-1");
    partial.nonce = Some("   ".into());
    let err = guard(&db, &nonces).execute(&partial, now).await.unwrap_err();
    assert!(matches!(err, CrmError::MissingApiCredentials));

    let err = guard(&db, &nonces)
        .execute(&ChannelCredentials::default(), now)
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::MissingApiCredentials));
}

#[tokio::test]
async fn should_expire_stale_or_unparsable_timestamp_before_nonce_check() {
    let db = MockDb::new();
    let nonces = MockNonceStore::default();
    let now = Utc::now();
    let bogus = ChannelCredentials {
        api_key: Some("ak_unknown".into()),
        api_secret: Some("wrong".into()),
        timestamp: Some((now - Duration::minutes(6)).timestamp_millis().to_string()),
        nonce: Some("n-1".into()),
    };

    let err = guard(&db, &nonces).execute(&bogus, now).await.unwrap_err();
    assert!(matches!(err, CrmError::RequestExpired));
    assert!(nonces.seen.lock().unwrap().is_empty());

    let future = ChannelCredentials {
        timestamp: Some((now + Duration::minutes(6)).timestamp_millis().to_string()),
        ..bogus.clone()
    };
    let err = guard(&db, &nonces).execute(&future, now).await.unwrap_err();
    assert!(matches!(err, CrmError::RequestExpired));

    let garbage = ChannelCredentials {
        timestamp: Some("yesterday".into()),
        ..bogus
    };
    let err = guard(&db, &nonces).execute(&garbage, now).await.unwrap_err();
    assert!(matches!(err, CrmError::RequestExpired));
}

#[tokio::test]
async fn should_accept_timestamp_at_window_edge() {
    let db = MockDb::new();
    let nonces = MockNonceStore::default();
    let issued = issue(&db, "Partner").await;
    let now = Utc::now();
    let edge = (now - Duration::minutes(5)).timestamp_millis();

    guard(&db, &nonces)
        .execute(&creds(&issued, edge, "n-edge"), now)
        .await
        .unwrap();
}

#[tokio::test]
async fn should_check_duplicate_before_key_validity() {
    let db = MockDb::new();
    let nonces = MockNonceStore::default();
    let now = Utc::now();
    let unknown = ChannelCredentials {
        api_key: Some("ak_unknown".into()),
        api_secret: Some("whatever".into()),
        timestamp: Some(now.timestamp_millis().to_string()),
        nonce: Some("n-1".into()),
    };

    let first = guard(&db, &nonces).execute(&unknown, now).await.unwrap_err();
    assert!(matches!(first, CrmError::InvalidApiKey));
    let second = guard(&db, &nonces).execute(&unknown, now).await.unwrap_err();
    assert!(matches!(second, CrmError::DuplicateRequest));
}

#[tokio::test]
async fn should_treat_inactive_key_as_invalid() {
    let db = MockDb::new();
    let nonces = MockNonceStore::default();
    let issued = issue(&db, "Partner").await;
    UpdateApiKeyUseCase {
        keys: db.api_keys(),
    }
    .execute(
        issued.key.id,
        ApiKeyPatch {
            channel_name: None,
            is_active: Some(false),
        },
    )
    .await
    .unwrap();
    let now = Utc::now();

    let err = guard(&db, &nonces)
        .execute(&creds(&issued, now.timestamp_millis(), "n-1"), now)
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::InvalidApiKey));
}

#[tokio::test]
async fn should_reject_wrong_secret_last() {
    let db = MockDb::new();
    let nonces = MockNonceStore::default();
    let issued = issue(&db, "Partner").await;
    let now = Utc::now();
    let mut wrong = creds(&issued, now.timestamp_millis(), "n-1");
    wrong.api_secret = Some("not-the-secret".into());

    let err = guard(&db, &nonces).execute(&wrong, now).await.unwrap_err();
    assert!(matches!(err, CrmError::InvalidApiSecret));
    let stored = db.api_keys().find_by_id(issued.key.id).await.unwrap().unwrap();
    assert!(stored.last_used_at.is_none());
}
