use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{instrument, warn};
use validator::Validate;

use crate::db::DbPool;
use crate::entities::supplier;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub contact_person: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl SupplierPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.contact_person.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
    }
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl SupplierService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<supplier::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let now = Utc::now();
        let created = supplier::ActiveModel {
            name: Set(request.name),
            contact_person: Set(request.contact_person),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        if let Err(e) = self
            .event_sender
            .send(Event::SupplierCreated(created.id))
            .await
        {
            warn!(error = %e, "failed to publish SupplierCreated event");
        }
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i32) -> Result<Option<supplier::Model>, ServiceError> {
        Ok(supplier::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<supplier::Model, ServiceError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let mut query = supplier::Entity::find().order_by_asc(supplier::Column::Name);
        if let Some(term) = search.filter(|t| !t.is_empty()) {
            query = query.filter(supplier::Column::Name.contains(&term));
        }

        let paginator = query.paginate(self.db.as_ref(), per_page.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: i32,
        patch: SupplierPatch,
    ) -> Result<supplier::Model, ServiceError> {
        if patch.is_empty() {
            return Err(ServiceError::ValidationError(
                "No fields provided to update".into(),
            ));
        }

        let existing = self.get(id).await?;
        let mut active: supplier::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            if name.is_empty() {
                return Err(ServiceError::ValidationError("Name is required".into()));
            }
            active.name = Set(name);
        }
        if let Some(contact_person) = patch.contact_person {
            active.contact_person = Set(Some(contact_person));
        }
        if let Some(email) = patch.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = patch.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = patch.address {
            active.address = Set(Some(address));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(self.db.as_ref()).await?;
        if let Err(e) = self
            .event_sender
            .send(Event::SupplierUpdated(updated.id))
            .await
        {
            warn!(error = %e, "failed to publish SupplierUpdated event");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        supplier::Entity::delete_by_id(existing.id)
            .exec(self.db.as_ref())
            .await?;
        if let Err(e) = self.event_sender.send(Event::SupplierDeleted(id)).await {
            warn!(error = %e, "failed to publish SupplierDeleted event");
        }
        Ok(())
    }
}
