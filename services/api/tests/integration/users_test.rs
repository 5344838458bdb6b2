use uuid::Uuid;

use crm_api::domain::types::UserFilter;
use crm_api::error::CrmError;
use crm_api::usecase::password::verify_password;
use crm_api::usecase::users::{
    BatchDeleteUsersUseCase, BatchUpdateUsersInput, BatchUpdateUsersUseCase, CreateUserInput,
    CreateUserUseCase, DeleteUserUseCase, EnsureBootstrapAdminUseCase, GetUserUseCase,
    ListAgentsUseCase, ListUsersUseCase, ResetPasswordUseCase, UpdateUserInput,
    UpdateUserUseCase,
};
use crm_domain::pagination::PageRequest;
use crm_domain::role::UserRole;

use crate::helpers::{MockDb, plain_user, test_record};

fn new_agent(username: &str, phone: Option<&str>) -> CreateUserInput {
    CreateUserInput {
        username: username.to_owned(),
        password: "secret123".into(),
        full_name: "Agent Smith".into(),
        phone: phone.map(str::to_owned),
        role: UserRole::Agent,
    }
}

// ── Create / update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_user_with_hashed_password() {
    let db = MockDb::new();
    let user = CreateUserUseCase { users: db.users() }
        .execute(new_agent("smith", Some("+8613800000000")))
        .await
        .unwrap();
    assert_eq!(user.role, UserRole::Agent);
    assert!(user.is_active);
    assert_ne!(user.password_hash, "secret123");
}

#[tokio::test]
async fn should_reject_taken_username_and_phone() {
    let db = MockDb::new();
    let mut existing = plain_user("smith", UserRole::Agent);
    existing.phone = Some("13800000000".into());
    db.insert_user(existing);
    let usecase = CreateUserUseCase { users: db.users() };

    let err = usecase.execute(new_agent("smith", None)).await.unwrap_err();
    assert!(matches!(err, CrmError::UsernameTaken));

    let err = usecase
        .execute(new_agent("jones", Some("13800000000")))
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::PhoneTaken));
}

#[tokio::test]
async fn should_validate_username_shape() {
    let db = MockDb::new();
    let err = CreateUserUseCase { users: db.users() }
        .execute(new_agent("no spaces!", None))
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));
}

#[tokio::test]
async fn should_forbid_admin_deactivating_self() {
    let db = MockDb::new();
    let admin = db.insert_user(plain_user("root", UserRole::Admin));

    let err = UpdateUserUseCase { users: db.users() }
        .execute(
            admin.id,
            admin.id,
            UpdateUserInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::CannotModifySelf));
}

#[tokio::test]
async fn should_clear_phone_and_rename() {
    let db = MockDb::new();
    let admin = db.insert_user(plain_user("root", UserRole::Admin));
    let mut agent = plain_user("old_name", UserRole::Agent);
    agent.phone = Some("13800000000".into());
    let agent = db.insert_user(agent);

    let updated = UpdateUserUseCase { users: db.users() }
        .execute(
            admin.id,
            agent.id,
            UpdateUserInput {
                username: Some("new_name".into()),
                phone: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.username, "new_name");
    assert!(updated.phone.is_none());
}

#[tokio::test]
async fn should_filter_user_list_by_role_and_keyword() {
    let db = MockDb::new();
    db.insert_user(plain_user("root", UserRole::Admin));
    db.insert_user(plain_user("agent_wang", UserRole::Agent));
    db.insert_user(plain_user("agent_li", UserRole::Agent));

    let page = ListUsersUseCase { users: db.users() }
        .execute(
            UserFilter {
                keyword: Some("WANG".into()),
                role: Some(UserRole::Agent),
                is_active: None,
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].username, "agent_wang");
}

// ── Read ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_get_user_or_report_missing() {
    let db = MockDb::new();
    let agent = db.insert_user(plain_user("agent", UserRole::Agent));
    let usecase = GetUserUseCase { users: db.users() };

    assert_eq!(usecase.execute(agent.id).await.unwrap().username, "agent");
    let err = usecase.execute(Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, CrmError::UserNotFound));
}

#[tokio::test]
async fn should_list_only_active_agents() {
    let db = MockDb::new();
    db.insert_user(plain_user("root", UserRole::Admin));
    let active = db.insert_user(plain_user("active", UserRole::Agent));
    let mut gone = plain_user("gone", UserRole::Agent);
    gone.is_active = false;
    db.insert_user(gone);

    let agents = ListAgentsUseCase { users: db.users() }.execute().await.unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].id, active.id);
}

// ── Reset password ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reset_password_to_new_hash() {
    let db = MockDb::new();
    let agent = db.insert_user(plain_user("agent", UserRole::Agent));
    let usecase = ResetPasswordUseCase { users: db.users() };

    let err = usecase.execute(agent.id, "short").await.unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));

    usecase.execute(agent.id, "fresh-pass").await.unwrap();
    let stored = db.user(agent.id).unwrap();
    assert!(verify_password("fresh-pass", &stored.password_hash).await.unwrap());

    let err = usecase.execute(Uuid::now_v7(), "fresh-pass").await.unwrap_err();
    assert!(matches!(err, CrmError::UserNotFound));
}

// ── Delete ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_refuse_deleting_self_or_owner_of_records() {
    let db = MockDb::new();
    let admin = db.insert_user(plain_user("root", UserRole::Admin));
    let agent = db.insert_user(plain_user("busy", UserRole::Agent));
    db.insert_record(test_record("Lead", Some(agent.id)));
    let usecase = DeleteUserUseCase { users: db.users() };

    let err = usecase.execute(admin.id, admin.id).await.unwrap_err();
    assert!(matches!(err, CrmError::CannotDeleteSelf));

    let err = usecase.execute(admin.id, agent.id).await.unwrap_err();
    assert!(matches!(err, CrmError::UserHasRecords));

    let err = usecase.execute(admin.id, Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, CrmError::UserNotFound));
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_apply_nothing_when_batch_contains_unknown_id() {
    let db = MockDb::new();
    let admin = db.insert_user(plain_user("root", UserRole::Admin));
    let agent = db.insert_user(plain_user("agent", UserRole::Agent));

    let err = BatchUpdateUsersUseCase { users: db.users() }
        .execute(
            admin.id,
            BatchUpdateUsersInput {
                ids: vec![agent.id, Uuid::now_v7()],
                is_active: Some(false),
                role: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::UserNotFound));
    assert!(db.user(agent.id).unwrap().is_active);
}

#[tokio::test]
async fn should_batch_deactivate_agents() {
    let db = MockDb::new();
    let admin = db.insert_user(plain_user("root", UserRole::Admin));
    let a = db.insert_user(plain_user("agent_a", UserRole::Agent));
    let b = db.insert_user(plain_user("agent_b", UserRole::Agent));

    let updated = BatchUpdateUsersUseCase { users: db.users() }
        .execute(
            admin.id,
            BatchUpdateUsersInput {
                ids: vec![a.id, b.id],
                is_active: Some(false),
                role: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated, 2);
    assert!(!db.user(a.id).unwrap().is_active);
    assert!(!db.user(b.id).unwrap().is_active);
}

#[tokio::test]
async fn should_forbid_demoting_self_in_batch() {
    let db = MockDb::new();
    let admin = db.insert_user(plain_user("root", UserRole::Admin));
    let agent = db.insert_user(plain_user("agent", UserRole::Agent));

    let err = BatchUpdateUsersUseCase { users: db.users() }
        .execute(
            admin.id,
            BatchUpdateUsersInput {
                ids: vec![agent.id, admin.id],
                is_active: None,
                role: Some(UserRole::Agent),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::CannotModifySelf));
    assert_eq!(db.user(admin.id).unwrap().role, UserRole::Admin);
}

#[tokio::test]
async fn should_guard_batch_delete() {
    let db = MockDb::new();
    let admin = db.insert_user(plain_user("root", UserRole::Admin));
    let idle = db.insert_user(plain_user("idle", UserRole::Agent));
    let busy = db.insert_user(plain_user("busy", UserRole::Agent));
    db.insert_record(test_record("Lead", Some(busy.id)));
    let usecase = BatchDeleteUsersUseCase { users: db.users() };

    let err = usecase.execute(admin.id, &[]).await.unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));

    let err = usecase.execute(admin.id, &[idle.id, admin.id]).await.unwrap_err();
    assert!(matches!(err, CrmError::CannotDeleteSelf));

    let err = usecase.execute(admin.id, &[idle.id, busy.id]).await.unwrap_err();
    assert!(matches!(err, CrmError::UserHasRecords));
    assert!(db.user(idle.id).is_some());

    let deleted = usecase.execute(admin.id, &[idle.id]).await.unwrap();
    assert_eq!(deleted, 1);
    assert!(db.user(idle.id).is_none());
}

// ── Bootstrap ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_bootstrap_admin_once() {
    let db = MockDb::new();
    let usecase = EnsureBootstrapAdminUseCase { users: db.users() };

    assert!(usecase.execute("admin", "admin123").await.unwrap());
    assert!(!usecase.execute("admin", "admin123").await.unwrap());
    let tables = db.tables.lock().unwrap();
    assert_eq!(tables.users.len(), 1);
    assert_eq!(tables.users[0].role, UserRole::Admin);
}
