use chrono::{Duration, Utc};

use crm_api::error::CrmError;
use crm_api::usecase::rate_limit::{CheckRateLimitUseCase, RateLimitBucket};

use crate::helpers::{FailingRateLimitStore, MockRateLimitStore};

#[tokio::test]
async fn should_reject_the_hit_after_the_limit() {
    let usecase = CheckRateLimitUseCase {
        store: MockRateLimitStore::default(),
        limit: 20,
    };
    let now = Utc::now();

    for _ in 0..20 {
        usecase
            .execute(RateLimitBucket::Sensitive, "203.0.113.7", now)
            .await
            .unwrap();
    }
    let err = usecase
        .execute(RateLimitBucket::Sensitive, "203.0.113.7", now)
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::TooManyRequests));

    // Other clients and buckets keep their own counters.
    usecase
        .execute(RateLimitBucket::Sensitive, "203.0.113.8", now)
        .await
        .unwrap();
    usecase
        .execute(RateLimitBucket::Default, "203.0.113.7", now)
        .await
        .unwrap();
}

#[tokio::test]
async fn should_reset_in_the_next_window() {
    let usecase = CheckRateLimitUseCase {
        store: MockRateLimitStore::default(),
        limit: 1,
    };
    let now = Utc::now();

    usecase
        .execute(RateLimitBucket::Default, "client", now)
        .await
        .unwrap();
    assert!(
        usecase
            .execute(RateLimitBucket::Default, "client", now)
            .await
            .is_err()
    );
    usecase
        .execute(RateLimitBucket::Default, "client", now + Duration::seconds(60))
        .await
        .unwrap();
}

#[tokio::test]
async fn should_let_requests_through_when_store_is_down() {
    let usecase = CheckRateLimitUseCase {
        store: FailingRateLimitStore,
        limit: 1,
    };
    let now = Utc::now();

    for _ in 0..3 {
        usecase
            .execute(RateLimitBucket::Sensitive, "client", now)
            .await
            .unwrap();
    }
}
