use crm_api::error::CrmError;
use crm_api::usecase::auth::{
    ChangePasswordInput, ChangePasswordUseCase, LoginInput, LoginUseCase,
};
use crm_api::usecase::password::verify_password;
use crm_auth_types::token::validate_access_token;
use crm_domain::role::UserRole;

use crate::helpers::{MockDb, TEST_PASSWORD, test_user};

const SECRET: &str = "login-test-secret";

fn login_usecase(db: &MockDb) -> LoginUseCase<crate::helpers::MockUserRepo> {
    LoginUseCase {
        users: db.users(),
        jwt_secret: SECRET.to_owned(),
        jwt_ttl_secs: 3600,
    }
}

fn credentials(username: &str, password: &str) -> LoginInput {
    LoginInput {
        username: username.to_owned(),
        password: password.to_owned(),
    }
}

// ── LoginUseCase ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_token_carrying_stored_role() {
    let db = MockDb::new();
    let agent = db.insert_user(test_user("agent_li", UserRole::Agent).await);

    let output = login_usecase(&db)
        .execute(credentials("agent_li", TEST_PASSWORD))
        .await
        .unwrap();

    assert_eq!(output.expires_in, 3600);
    assert_eq!(output.user.id, agent.id);
    let info = validate_access_token(&output.access_token, SECRET).unwrap();
    assert_eq!(info.user_id, agent.id);
    assert_eq!(info.username, "agent_li");
    assert_eq!(info.role, UserRole::Agent);
}

#[tokio::test]
async fn should_reject_unknown_user_and_wrong_password_alike() {
    let db = MockDb::new();
    db.insert_user(test_user("admin", UserRole::Admin).await);

    let unknown = login_usecase(&db)
        .execute(credentials("nobody", TEST_PASSWORD))
        .await
        .unwrap_err();
    let wrong = login_usecase(&db)
        .execute(credentials("admin", "not-the-password"))
        .await
        .unwrap_err();

    assert!(matches!(unknown, CrmError::InvalidCredentials));
    assert!(matches!(wrong, CrmError::InvalidCredentials));
}

#[tokio::test]
async fn should_refuse_disabled_account() {
    let db = MockDb::new();
    let mut user = test_user("former", UserRole::Agent).await;
    user.is_active = false;
    db.insert_user(user);

    let err = login_usecase(&db)
        .execute(credentials("former", TEST_PASSWORD))
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::AccountDisabled));
}

// ── ChangePasswordUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_change_password_when_current_matches() {
    let db = MockDb::new();
    let user = db.insert_user(test_user("wang", UserRole::Agent).await);

    ChangePasswordUseCase { users: db.users() }
        .execute(
            user.id,
            ChangePasswordInput {
                current_password: TEST_PASSWORD.into(),
                new_password: "brand-new-pass".into(),
            },
        )
        .await
        .unwrap();

    let stored = db.user(user.id).unwrap();
    assert!(verify_password("brand-new-pass", &stored.password_hash).await.unwrap());
}

#[tokio::test]
async fn should_reject_wrong_current_password() {
    let db = MockDb::new();
    let user = db.insert_user(test_user("zhao", UserRole::Agent).await);

    let err = ChangePasswordUseCase { users: db.users() }
        .execute(
            user.id,
            ChangePasswordInput {
                current_password: "guess".into(),
                new_password: "brand-new-pass".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::InvalidCredentials));
}

#[tokio::test]
async fn should_reject_short_new_password() {
    let db = MockDb::new();
    let user = db.insert_user(test_user("sun", UserRole::Agent).await);

    let err = ChangePasswordUseCase { users: db.users() }
        .execute(
            user.id,
            ChangePasswordInput {
                current_password: TEST_PASSWORD.into(),
                new_password: "12345".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));
}
