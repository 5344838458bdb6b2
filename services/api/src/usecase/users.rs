use chrono::Utc;
use uuid::Uuid;

use crm_domain::pagination::{Page, PageRequest};
use crm_domain::role::UserRole;

use crate::domain::repository::UserRepository;
use crate::domain::types::{
    User, UserFilter, UserPatch, blank_to_none, distinct_ids, validate_full_name,
    validate_password, validate_phone, validate_username,
};
use crate::error::CrmError;
use crate::usecase::password::hash_password;

async fn ensure_username_free<U: UserRepository>(
    users: &U,
    username: &str,
    except: Option<Uuid>,
) -> Result<(), CrmError> {
    match users.find_by_username(username).await? {
        Some(existing) if Some(existing.id) != except => Err(CrmError::UsernameTaken),
        _ => Ok(()),
    }
}

async fn ensure_phone_free<U: UserRepository>(
    users: &U,
    phone: &str,
    except: Option<Uuid>,
) -> Result<(), CrmError> {
    match users.find_by_phone(phone).await? {
        Some(existing) if Some(existing.id) != except => Err(CrmError::PhoneTaken),
        _ => Ok(()),
    }
}

/// An admin may not lock themself out through a status or role change.
fn ensure_not_self_lockout(
    actor: Uuid,
    target: Uuid,
    is_active: Option<bool>,
    role: Option<UserRole>,
) -> Result<(), CrmError> {
    let deactivates = is_active == Some(false);
    let demotes = role.is_some_and(|r| !r.is_admin());
    if actor == target && (deactivates || demotes) {
        return Err(CrmError::CannotModifySelf);
    }
    Ok(())
}

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListUsersUseCase<U> {
    pub async fn execute(
        &self,
        filter: UserFilter,
        page: PageRequest,
    ) -> Result<Page<User>, CrmError> {
        let page = page.clamped();
        let filter = UserFilter {
            keyword: blank_to_none(filter.keyword),
            ..filter
        };
        let (items, total) = self.users.list(&filter, page).await?;
        Ok(Page::new(items, total, page))
    }
}

// ── ListAgents ───────────────────────────────────────────────────────────────

pub struct ListAgentsUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListAgentsUseCase<U> {
    pub async fn execute(&self) -> Result<Vec<User>, CrmError> {
        self.users.list_active_by_role(UserRole::Agent).await
    }
}

// ── GetUser ──────────────────────────────────────────────────────────────────

pub struct GetUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetUserUseCase<U> {
    pub async fn execute(&self, id: Uuid) -> Result<User, CrmError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(CrmError::UserNotFound)
    }
}

// ── CreateUser ───────────────────────────────────────────────────────────────

pub struct CreateUserInput {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

pub struct CreateUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> CreateUserUseCase<U> {
    pub async fn execute(&self, input: CreateUserInput) -> Result<User, CrmError> {
        create_user(&self.users, input).await
    }
}

async fn create_user<U: UserRepository>(
    users: &U,
    input: CreateUserInput,
) -> Result<User, CrmError> {
    let username = input.username.trim().to_owned();
    validate_username(&username)?;
    validate_password(&input.password)?;
    let full_name = validate_full_name(&input.full_name)?;
    let phone = blank_to_none(input.phone);
    if let Some(ref phone) = phone {
        validate_phone(phone)?;
    }

    ensure_username_free(users, &username, None).await?;
    if let Some(ref phone) = phone {
        ensure_phone_free(users, phone, None).await?;
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::now_v7(),
        username,
        password_hash: hash_password(&input.password).await?,
        full_name,
        phone,
        role: input.role,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    users.create(&user).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    Ok(user)
}

// ── UpdateUser ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub full_name: Option<String>,
    /// `Some(None)` clears the phone number.
    pub phone: Option<Option<String>>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

pub struct UpdateUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UpdateUserUseCase<U> {
    pub async fn execute(
        &self,
        actor: Uuid,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<User, CrmError> {
        let existing = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(CrmError::UserNotFound)?;
        ensure_not_self_lockout(actor, id, input.is_active, input.role)?;

        let mut patch = UserPatch {
            role: input.role,
            is_active: input.is_active,
            ..Default::default()
        };

        if let Some(username) = input.username {
            let username = username.trim().to_owned();
            if username != existing.username {
                validate_username(&username)?;
                ensure_username_free(&self.users, &username, Some(id)).await?;
                patch.username = Some(username);
            }
        }
        if let Some(ref full_name) = input.full_name {
            patch.full_name = Some(validate_full_name(full_name)?);
        }
        if let Some(phone) = input.phone {
            let phone = blank_to_none(phone);
            if let Some(ref phone) = phone {
                validate_phone(phone)?;
                ensure_phone_free(&self.users, phone, Some(id)).await?;
            }
            patch.phone = Some(phone);
        }
        if let Some(ref password) = input.password {
            validate_password(password)?;
            patch.password_hash = Some(hash_password(password).await?);
        }

        if !patch.is_empty() {
            self.users.update(id, &patch).await?;
        }
        self.users
            .find_by_id(id)
            .await?
            .ok_or(CrmError::UserNotFound)
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ResetPasswordUseCase<U> {
    pub async fn execute(&self, id: Uuid, new_password: &str) -> Result<(), CrmError> {
        validate_password(new_password)?;
        self.users
            .find_by_id(id)
            .await?
            .ok_or(CrmError::UserNotFound)?;
        let patch = UserPatch {
            password_hash: Some(hash_password(new_password).await?),
            ..Default::default()
        };
        self.users.update(id, &patch).await
    }
}

// ── DeleteUser ───────────────────────────────────────────────────────────────

pub struct DeleteUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> DeleteUserUseCase<U> {
    pub async fn execute(&self, actor: Uuid, id: Uuid) -> Result<(), CrmError> {
        if actor == id {
            return Err(CrmError::CannotDeleteSelf);
        }
        self.users
            .find_by_id(id)
            .await?
            .ok_or(CrmError::UserNotFound)?;
        if self.users.count_owned_records(&[id]).await? > 0 {
            return Err(CrmError::UserHasRecords);
        }
        if !self.users.delete(id).await? {
            return Err(CrmError::UserNotFound);
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}

// ── BatchUpdateUsers ─────────────────────────────────────────────────────────

pub struct BatchUpdateUsersInput {
    pub ids: Vec<Uuid>,
    pub is_active: Option<bool>,
    pub role: Option<UserRole>,
}

pub struct BatchUpdateUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> BatchUpdateUsersUseCase<U> {
    pub async fn execute(
        &self,
        actor: Uuid,
        input: BatchUpdateUsersInput,
    ) -> Result<u64, CrmError> {
        let ids = distinct_ids(&input.ids)?;
        if input.is_active.is_none() && input.role.is_none() {
            return Err(CrmError::validation("isActive or role is required"));
        }
        if ids.contains(&actor) {
            ensure_not_self_lockout(actor, actor, input.is_active, input.role)?;
        }
        let updated = self
            .users
            .batch_update(&ids, input.is_active, input.role)
            .await?;
        tracing::info!(count = updated, "users batch updated");
        Ok(updated)
    }
}

// ── BatchDeleteUsers ─────────────────────────────────────────────────────────

pub struct BatchDeleteUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> BatchDeleteUsersUseCase<U> {
    pub async fn execute(&self, actor: Uuid, ids: &[Uuid]) -> Result<u64, CrmError> {
        let ids = distinct_ids(ids)?;
        if ids.contains(&actor) {
            return Err(CrmError::CannotDeleteSelf);
        }
        let deleted = self.users.batch_delete(&ids).await?;
        tracing::info!(count = deleted, "users batch deleted");
        Ok(deleted)
    }
}

// ── EnsureBootstrapAdmin ─────────────────────────────────────────────────────

pub struct EnsureBootstrapAdminUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> EnsureBootstrapAdminUseCase<U> {
    /// Create the admin account unless an admin already exists.
    /// Returns `true` when an account was created.
    pub async fn execute(&self, username: &str, password: &str) -> Result<bool, CrmError> {
        if self.users.exists_with_role(UserRole::Admin).await? {
            return Ok(false);
        }
        create_user(
            &self.users,
            CreateUserInput {
                username: username.to_owned(),
                password: password.to_owned(),
                full_name: "Administrator".into(),
                phone: None,
                role: UserRole::Admin,
            },
        )
        .await?;
        Ok(true)
    }
}
