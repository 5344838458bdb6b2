use std::collections::HashMap;

use anyhow::{Context as _, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
    TransactionError, TransactionTrait,
};
use uuid::Uuid;

use crm_api_schema::{api_keys, properties, roles, users, viewing_records};
use crm_domain::pagination::PageRequest;
use crm_domain::role::UserRole;
use crm_domain::viewing::ViewingStatus;

use crate::domain::repository::{
    ApiKeyRepository, PropertyRepository, RoleRepository, UserRepository, ViewingRecordRepository,
};
use crate::domain::types::{
    ApiKey, ApiKeyPatch, Property, Role, StatusCounts, User, UserFilter, UserPatch, ViewingRecord,
    ViewingRecordFilter, ViewingRecordPatch,
};
use crate::error::CrmError;

/// `%keyword%` with LIKE metacharacters escaped.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn ilike(col: impl sea_orm::sea_query::IntoColumnRef, pattern: &str) -> SimpleExpr {
    Expr::col(col).ilike(pattern)
}

fn flatten_tx(e: TransactionError<CrmError>, what: &'static str) -> CrmError {
    match e {
        TransactionError::Connection(db) => {
            CrmError::Internal(anyhow::Error::new(db).context(what))
        }
        TransactionError::Transaction(e) => e,
    }
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

fn user_select() -> Select<users::Entity> {
    users::Entity::find().join(JoinType::InnerJoin, users::Relation::Role.def())
}

fn user_from_parts((model, role): (users::Model, Option<roles::Model>)) -> Result<User, CrmError> {
    let role = role
        .ok_or_else(|| anyhow!("user {} has no role row", model.id))?
        .name
        .parse::<UserRole>()
        .with_context(|| format!("role of user {}", model.id))?;
    Ok(User {
        id: model.id,
        username: model.username,
        password_hash: model.password,
        full_name: model.full_name,
        phone: model.phone,
        role,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

impl DbUserRepository {
    async fn one(&self, select: Select<users::Entity>) -> Result<Option<User>, CrmError> {
        let row = select
            .select_also(roles::Entity)
            .one(&self.db)
            .await
            .context("find user")?;
        row.map(user_from_parts).transpose()
    }

    async fn role_id(&self, role: UserRole) -> Result<i32, CrmError> {
        roles::Entity::find()
            .filter(roles::Column::Name.eq(role.as_str()))
            .one(&self.db)
            .await
            .context("find role by name")?
            .map(|r| r.id)
            .ok_or(CrmError::RoleNotFound)
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, CrmError> {
        self.one(user_select().filter(users::Column::Id.eq(id))).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, CrmError> {
        self.one(user_select().filter(users::Column::Username.eq(username)))
            .await
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, CrmError> {
        self.one(user_select().filter(users::Column::Phone.eq(phone)))
            .await
    }

    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), CrmError> {
        let mut query = user_select();
        if let Some(ref keyword) = filter.keyword {
            let pattern = like_pattern(keyword);
            query = query.filter(
                Condition::any()
                    .add(ilike((users::Entity, users::Column::Username), &pattern))
                    .add(ilike((users::Entity, users::Column::FullName), &pattern))
                    .add(ilike((users::Entity, users::Column::Phone), &pattern)),
            );
        }
        if let Some(role) = filter.role {
            query = query.filter(roles::Column::Name.eq(role.as_str()));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(users::Column::IsActive.eq(is_active));
        }

        let total = query.clone().count(&self.db).await.context("count users")?;
        let rows = query
            .order_by_desc(users::Column::CreatedAt)
            .select_also(roles::Entity)
            .offset(page.offset())
            .limit(page.page_size)
            .all(&self.db)
            .await
            .context("list users")?;
        let users = rows
            .into_iter()
            .map(user_from_parts)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, total))
    }

    async fn list_active_by_role(&self, role: UserRole) -> Result<Vec<User>, CrmError> {
        let rows = user_select()
            .filter(roles::Column::Name.eq(role.as_str()))
            .filter(users::Column::IsActive.eq(true))
            .order_by_asc(users::Column::FullName)
            .select_also(roles::Entity)
            .all(&self.db)
            .await
            .context("list active users by role")?;
        rows.into_iter().map(user_from_parts).collect()
    }

    async fn exists_with_role(&self, role: UserRole) -> Result<bool, CrmError> {
        let count = user_select()
            .filter(roles::Column::Name.eq(role.as_str()))
            .count(&self.db)
            .await
            .context("count users by role")?;
        Ok(count > 0)
    }

    async fn create(&self, user: &User) -> Result<(), CrmError> {
        let role_id = self.role_id(user.role).await?;
        users::ActiveModel {
            id: Set(user.id),
            username: Set(user.username.clone()),
            password: Set(user.password_hash.clone()),
            full_name: Set(user.full_name.clone()),
            phone: Set(user.phone.clone()),
            role_id: Set(role_id),
            is_active: Set(user.is_active),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create user")?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<(), CrmError> {
        let mut am = users::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(ref username) = patch.username {
            am.username = Set(username.clone());
        }
        if let Some(ref full_name) = patch.full_name {
            am.full_name = Set(full_name.clone());
        }
        if let Some(ref phone) = patch.phone {
            am.phone = Set(phone.clone());
        }
        if let Some(role) = patch.role {
            am.role_id = Set(self.role_id(role).await?);
        }
        if let Some(is_active) = patch.is_active {
            am.is_active = Set(is_active);
        }
        if let Some(ref hash) = patch.password_hash {
            am.password = Set(hash.clone());
        }
        am.updated_at = Set(Utc::now());
        am.update(&self.db).await.context("update user")?;
        Ok(())
    }

    async fn count_owned_records(&self, ids: &[Uuid]) -> Result<u64, CrmError> {
        let count = viewing_records::Entity::find()
            .filter(viewing_records::Column::AgentId.is_in(ids.to_vec()))
            .count(&self.db)
            .await
            .context("count records owned by users")?;
        Ok(count)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CrmError> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected > 0)
    }

    async fn batch_update(
        &self,
        ids: &[Uuid],
        is_active: Option<bool>,
        role: Option<UserRole>,
    ) -> Result<u64, CrmError> {
        let role_id = match role {
            Some(role) => Some(self.role_id(role).await?),
            None => None,
        };
        let ids = ids.to_vec();
        self.db
            .transaction::<_, u64, CrmError>(move |txn| {
                Box::pin(async move {
                    let found = users::Entity::find()
                        .filter(users::Column::Id.is_in(ids.clone()))
                        .count(txn)
                        .await
                        .context("count users in batch")?;
                    if found != ids.len() as u64 {
                        return Err(CrmError::UserNotFound);
                    }

                    let mut update = users::Entity::update_many()
                        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()));
                    if let Some(is_active) = is_active {
                        update = update.col_expr(users::Column::IsActive, Expr::value(is_active));
                    }
                    if let Some(role_id) = role_id {
                        update = update.col_expr(users::Column::RoleId, Expr::value(role_id));
                    }
                    let result = update
                        .filter(users::Column::Id.is_in(ids))
                        .exec(txn)
                        .await
                        .context("batch update users")?;
                    Ok(result.rows_affected)
                })
            })
            .await
            .map_err(|e| flatten_tx(e, "batch update users transaction"))
    }

    async fn batch_delete(&self, ids: &[Uuid]) -> Result<u64, CrmError> {
        let ids = ids.to_vec();
        self.db
            .transaction::<_, u64, CrmError>(move |txn| {
                Box::pin(async move {
                    let found = users::Entity::find()
                        .filter(users::Column::Id.is_in(ids.clone()))
                        .count(txn)
                        .await
                        .context("count users in batch")?;
                    if found != ids.len() as u64 {
                        return Err(CrmError::UserNotFound);
                    }

                    let owned = viewing_records::Entity::find()
                        .filter(viewing_records::Column::AgentId.is_in(ids.clone()))
                        .count(txn)
                        .await
                        .context("count records owned by batch")?;
                    if owned > 0 {
                        return Err(CrmError::UserHasRecords);
                    }

                    let result = users::Entity::delete_many()
                        .filter(users::Column::Id.is_in(ids))
                        .exec(txn)
                        .await
                        .context("batch delete users")?;
                    Ok(result.rows_affected)
                })
            })
            .await
            .map_err(|e| flatten_tx(e, "batch delete users transaction"))
    }
}

// ── Role repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRoleRepository {
    pub db: DatabaseConnection,
}

impl RoleRepository for DbRoleRepository {
    async fn list(&self) -> Result<Vec<Role>, CrmError> {
        let models = roles::Entity::find()
            .order_by_asc(roles::Column::Id)
            .all(&self.db)
            .await
            .context("list roles")?;
        Ok(models
            .into_iter()
            .map(|m| Role {
                id: m.id,
                name: m.name,
                description: m.description,
            })
            .collect())
    }
}

// ── ApiKey repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbApiKeyRepository {
    pub db: DatabaseConnection,
}

fn api_key_from_model(model: api_keys::Model) -> ApiKey {
    ApiKey {
        id: model.id,
        channel_name: model.channel_name,
        api_key: model.api_key,
        api_secret_hash: model.api_secret_hash,
        is_active: model.is_active,
        created_by: model.created_by,
        last_used_at: model.last_used_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

impl ApiKeyRepository for DbApiKeyRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApiKey>, CrmError> {
        let model = api_keys::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find api key by id")?;
        Ok(model.map(api_key_from_model))
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<ApiKey>, CrmError> {
        let model = api_keys::Entity::find()
            .filter(api_keys::Column::ApiKey.eq(api_key))
            .one(&self.db)
            .await
            .context("find api key by key")?;
        Ok(model.map(api_key_from_model))
    }

    async fn find_by_channel_name(
        &self,
        channel_name: &str,
    ) -> Result<Option<ApiKey>, CrmError> {
        let model = api_keys::Entity::find()
            .filter(api_keys::Column::ChannelName.eq(channel_name))
            .one(&self.db)
            .await
            .context("find api key by channel name")?;
        Ok(model.map(api_key_from_model))
    }

    async fn list(&self) -> Result<Vec<ApiKey>, CrmError> {
        let models = api_keys::Entity::find()
            .order_by_desc(api_keys::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list api keys")?;
        Ok(models.into_iter().map(api_key_from_model).collect())
    }

    async fn create(&self, key: &ApiKey) -> Result<(), CrmError> {
        api_keys::ActiveModel {
            id: Set(key.id),
            channel_name: Set(key.channel_name.clone()),
            api_key: Set(key.api_key.clone()),
            api_secret_hash: Set(key.api_secret_hash.clone()),
            is_active: Set(key.is_active),
            created_by: Set(key.created_by),
            last_used_at: Set(key.last_used_at),
            created_at: Set(key.created_at),
            updated_at: Set(key.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create api key")?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &ApiKeyPatch) -> Result<(), CrmError> {
        let mut am = api_keys::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(ref channel_name) = patch.channel_name {
            am.channel_name = Set(channel_name.clone());
        }
        if let Some(is_active) = patch.is_active {
            am.is_active = Set(is_active);
        }
        am.updated_at = Set(Utc::now());
        am.update(&self.db).await.context("update api key")?;
        Ok(())
    }

    async fn rotate(&self, id: Uuid, api_key: &str, secret_hash: &str) -> Result<(), CrmError> {
        api_keys::ActiveModel {
            id: Set(id),
            api_key: Set(api_key.to_owned()),
            api_secret_hash: Set(secret_hash.to_owned()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("rotate api key")?;
        Ok(())
    }

    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), CrmError> {
        api_keys::Entity::update_many()
            .col_expr(api_keys::Column::LastUsedAt, Expr::value(at))
            .filter(api_keys::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("touch api key last_used_at")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CrmError> {
        let result = api_keys::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete api key")?;
        Ok(result.rows_affected > 0)
    }
}

// ── Property repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPropertyRepository {
    pub db: DatabaseConnection,
}

fn property_from_model(model: properties::Model) -> Property {
    Property {
        id: model.id,
        name: model.name,
        address: model.address,
        created_at: model.created_at,
    }
}

impl PropertyRepository for DbPropertyRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, CrmError> {
        let model = properties::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find property by id")?;
        Ok(model.map(property_from_model))
    }

    async fn list(&self) -> Result<Vec<Property>, CrmError> {
        let models = properties::Entity::find()
            .order_by_asc(properties::Column::Name)
            .all(&self.db)
            .await
            .context("list properties")?;
        Ok(models.into_iter().map(property_from_model).collect())
    }

    async fn create(&self, property: &Property) -> Result<(), CrmError> {
        properties::ActiveModel {
            id: Set(property.id),
            name: Set(property.name.clone()),
            address: Set(property.address.clone()),
            created_at: Set(property.created_at),
        }
        .insert(&self.db)
        .await
        .context("create property")?;
        Ok(())
    }
}

// ── ViewingRecord repository ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbViewingRecordRepository {
    pub db: DatabaseConnection,
}

fn record_select(filter: &ViewingRecordFilter) -> Select<viewing_records::Entity> {
    use viewing_records::Column;

    let mut query = viewing_records::Entity::find();
    if let Some(status) = filter.viewing_status {
        query = query.filter(Column::ViewingStatus.eq(status.as_str()));
    }
    if let Some(source) = filter.source {
        query = query.filter(Column::Source.eq(source.as_str()));
    }
    if let Some(business_type) = filter.business_type {
        query = query.filter(Column::BusinessType.eq(business_type.as_str()));
    }
    if let Some(agent_id) = filter.agent_id {
        query = query.filter(Column::AgentId.eq(agent_id));
    }
    if let Some(api_key_id) = filter.api_key_id {
        query = query.filter(Column::ApiKeyId.eq(api_key_id));
    }
    if let Some(ref keyword) = filter.keyword {
        let pattern = like_pattern(keyword);
        query = query.filter(
            Condition::any()
                .add(ilike(Column::TenantName, &pattern))
                .add(ilike(Column::PrimaryPhone, &pattern))
                .add(ilike(Column::BackupPhone, &pattern))
                .add(ilike(Column::Wechat, &pattern)),
        );
    }
    if let Some(from) = filter.date_from {
        query = query.filter(Column::CreatedAt.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(Column::CreatedAt.lte(to));
    }
    query
}

fn record_from_model(model: viewing_records::Model) -> Result<ViewingRecord, CrmError> {
    let id = model.id;
    Ok(ViewingRecord {
        id,
        tenant_name: model.tenant_name,
        primary_phone: model.primary_phone,
        backup_phone: model.backup_phone,
        wechat: model.wechat,
        viewing_date: model.viewing_date,
        property_id: model.property_id,
        room_address: model.room_address,
        preferred_location: model.preferred_location,
        budget_range: model.budget_range,
        requirements: model.requirements,
        viewing_status: model
            .viewing_status
            .parse()
            .with_context(|| format!("viewing_status of record {id}"))?,
        business_type: model
            .business_type
            .parse()
            .with_context(|| format!("business_type of record {id}"))?,
        source: model
            .source
            .parse()
            .with_context(|| format!("source of record {id}"))?,
        api_key_id: model.api_key_id,
        agent_id: model.agent_id,
        remarks: model.remarks,
        viewing_feedback: model.viewing_feedback,
        created_at: model.created_at,
        updated_at: model.updated_at,
        agent_name: None,
        channel_name: None,
        property_name: None,
    })
}

fn distinct<T: Copy + Eq + std::hash::Hash>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

impl DbViewingRecordRepository {
    /// Convert rows and resolve agent, channel and property display names.
    async fn hydrate(
        &self,
        models: Vec<viewing_records::Model>,
    ) -> Result<Vec<ViewingRecord>, CrmError> {
        let mut records = models
            .into_iter()
            .map(record_from_model)
            .collect::<Result<Vec<_>, _>>()?;
        if records.is_empty() {
            return Ok(records);
        }

        let agent_ids = distinct(records.iter().filter_map(|r| r.agent_id));
        let key_ids = distinct(records.iter().filter_map(|r| r.api_key_id));
        let property_ids = distinct(records.iter().filter_map(|r| r.property_id));

        let agents: HashMap<Uuid, String> = if agent_ids.is_empty() {
            HashMap::new()
        } else {
            users::Entity::find()
                .filter(users::Column::Id.is_in(agent_ids))
                .all(&self.db)
                .await
                .context("resolve record agents")?
                .into_iter()
                .map(|u| (u.id, u.full_name))
                .collect()
        };
        let channels: HashMap<Uuid, String> = if key_ids.is_empty() {
            HashMap::new()
        } else {
            api_keys::Entity::find()
                .filter(api_keys::Column::Id.is_in(key_ids))
                .all(&self.db)
                .await
                .context("resolve record channels")?
                .into_iter()
                .map(|k| (k.id, k.channel_name))
                .collect()
        };
        let property_names: HashMap<Uuid, String> = if property_ids.is_empty() {
            HashMap::new()
        } else {
            properties::Entity::find()
                .filter(properties::Column::Id.is_in(property_ids))
                .all(&self.db)
                .await
                .context("resolve record properties")?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect()
        };

        for record in &mut records {
            record.agent_name = record.agent_id.and_then(|id| agents.get(&id).cloned());
            record.channel_name = record.api_key_id.and_then(|id| channels.get(&id).cloned());
            record.property_name = record
                .property_id
                .and_then(|id| property_names.get(&id).cloned());
        }
        Ok(records)
    }
}

impl ViewingRecordRepository for DbViewingRecordRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ViewingRecord>, CrmError> {
        let model = viewing_records::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find viewing record by id")?;
        match model {
            Some(model) => Ok(self.hydrate(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        filter: &ViewingRecordFilter,
        page: PageRequest,
    ) -> Result<(Vec<ViewingRecord>, u64), CrmError> {
        let query = record_select(filter);
        let total = query
            .clone()
            .count(&self.db)
            .await
            .context("count viewing records")?;
        let models = query
            .order_by_desc(viewing_records::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.page_size)
            .all(&self.db)
            .await
            .context("list viewing records")?;
        Ok((self.hydrate(models).await?, total))
    }

    async fn list_all(
        &self,
        filter: &ViewingRecordFilter,
        limit: u64,
    ) -> Result<Vec<ViewingRecord>, CrmError> {
        let models = record_select(filter)
            .order_by_desc(viewing_records::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("list viewing records for export")?;
        self.hydrate(models).await
    }

    async fn count_by_status(
        &self,
        filter: &ViewingRecordFilter,
    ) -> Result<StatusCounts, CrmError> {
        let rows: Vec<(String, i64)> = record_select(filter)
            .select_only()
            .column(viewing_records::Column::ViewingStatus)
            .column_as(Expr::col(viewing_records::Column::Id).count(), "count")
            .group_by(viewing_records::Column::ViewingStatus)
            .into_tuple()
            .all(&self.db)
            .await
            .context("count viewing records by status")?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let status: ViewingStatus = status.parse().context("grouped viewing_status")?;
            counts.add(status, count.max(0) as u64);
        }
        Ok(counts)
    }

    async fn create(&self, record: &ViewingRecord) -> Result<(), CrmError> {
        viewing_records::ActiveModel {
            id: Set(record.id),
            tenant_name: Set(record.tenant_name.clone()),
            primary_phone: Set(record.primary_phone.clone()),
            backup_phone: Set(record.backup_phone.clone()),
            wechat: Set(record.wechat.clone()),
            viewing_date: Set(record.viewing_date),
            property_id: Set(record.property_id),
            room_address: Set(record.room_address.clone()),
            preferred_location: Set(record.preferred_location.clone()),
            budget_range: Set(record.budget_range.clone()),
            requirements: Set(record.requirements.clone()),
            viewing_status: Set(record.viewing_status.as_str().to_owned()),
            business_type: Set(record.business_type.as_str().to_owned()),
            source: Set(record.source.as_str().to_owned()),
            api_key_id: Set(record.api_key_id),
            agent_id: Set(record.agent_id),
            remarks: Set(record.remarks.clone()),
            viewing_feedback: Set(record.viewing_feedback.clone()),
            created_at: Set(record.created_at),
            updated_at: Set(record.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create viewing record")?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &ViewingRecordPatch) -> Result<(), CrmError> {
        let mut am = viewing_records::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(ref v) = patch.tenant_name {
            am.tenant_name = Set(v.clone());
        }
        if let Some(ref v) = patch.primary_phone {
            am.primary_phone = Set(v.clone());
        }
        if let Some(ref v) = patch.backup_phone {
            am.backup_phone = Set(v.clone());
        }
        if let Some(ref v) = patch.wechat {
            am.wechat = Set(v.clone());
        }
        if let Some(v) = patch.viewing_date {
            am.viewing_date = Set(v);
        }
        if let Some(v) = patch.property_id {
            am.property_id = Set(v);
        }
        if let Some(ref v) = patch.room_address {
            am.room_address = Set(v.clone());
        }
        if let Some(ref v) = patch.preferred_location {
            am.preferred_location = Set(v.clone());
        }
        if let Some(ref v) = patch.budget_range {
            am.budget_range = Set(v.clone());
        }
        if let Some(ref v) = patch.requirements {
            am.requirements = Set(v.clone());
        }
        if let Some(v) = patch.viewing_status {
            am.viewing_status = Set(v.as_str().to_owned());
        }
        if let Some(v) = patch.business_type {
            am.business_type = Set(v.as_str().to_owned());
        }
        if let Some(v) = patch.agent_id {
            am.agent_id = Set(v);
        }
        if let Some(ref v) = patch.remarks {
            am.remarks = Set(v.clone());
        }
        if let Some(ref v) = patch.viewing_feedback {
            am.viewing_feedback = Set(v.clone());
        }
        am.updated_at = Set(Utc::now());
        am.update(&self.db)
            .await
            .context("update viewing record")?;
        Ok(())
    }

    async fn batch_update_status(
        &self,
        ids: &[Uuid],
        agent_id: Option<Uuid>,
        status: ViewingStatus,
    ) -> Result<Option<u64>, CrmError> {
        let ids = ids.to_vec();
        let updated = self
            .db
            .transaction::<_, Option<u64>, sea_orm::DbErr>(move |txn| {
                Box::pin(async move {
                    let mut accessible = viewing_records::Entity::find()
                        .filter(viewing_records::Column::Id.is_in(ids.clone()));
                    if let Some(agent_id) = agent_id {
                        accessible =
                            accessible.filter(viewing_records::Column::AgentId.eq(agent_id));
                    }
                    if accessible.count(txn).await? != ids.len() as u64 {
                        return Ok(None);
                    }

                    let result = viewing_records::Entity::update_many()
                        .col_expr(
                            viewing_records::Column::ViewingStatus,
                            Expr::value(status.as_str()),
                        )
                        .col_expr(viewing_records::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(viewing_records::Column::Id.is_in(ids))
                        .exec(txn)
                        .await?;
                    Ok(Some(result.rows_affected))
                })
            })
            .await
            .context("batch update viewing record status")?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CrmError> {
        let result = viewing_records::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete viewing record")?;
        Ok(result.rows_affected > 0)
    }
}
