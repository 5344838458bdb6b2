use chrono::Utc;
use uuid::Uuid;

use crate::domain::repository::PropertyRepository;
use crate::domain::types::{Property, validate_text};
use crate::error::CrmError;

// ── ListProperties ───────────────────────────────────────────────────────────

pub struct ListPropertiesUseCase<P: PropertyRepository> {
    pub properties: P,
}

impl<P: PropertyRepository> ListPropertiesUseCase<P> {
    pub async fn execute(&self) -> Result<Vec<Property>, CrmError> {
        self.properties.list().await
    }
}

// ── CreateProperty ───────────────────────────────────────────────────────────

pub struct CreatePropertyInput {
    pub name: String,
    pub address: String,
}

pub struct CreatePropertyUseCase<P: PropertyRepository> {
    pub properties: P,
}

impl<P: PropertyRepository> CreatePropertyUseCase<P> {
    pub async fn execute(&self, input: CreatePropertyInput) -> Result<Property, CrmError> {
        let property = Property {
            id: Uuid::now_v7(),
            name: validate_text("name", &input.name, 100)?,
            address: validate_text("address", &input.address, 255)?,
            created_at: Utc::now(),
        };
        self.properties.create(&property).await?;
        Ok(property)
    }
}

/// 404 unless `id` is absent or names an existing property.
pub async fn ensure_property_exists<P: PropertyRepository>(
    properties: &P,
    id: Option<Uuid>,
) -> Result<(), CrmError> {
    if let Some(id) = id {
        properties
            .find_by_id(id)
            .await?
            .ok_or(CrmError::PropertyNotFound)?;
    }
    Ok(())
}
