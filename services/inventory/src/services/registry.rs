//! Asset registry: the item catalogue

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::error::ErrorKind;
use crate::clock::Clock;
use crate::models::{Item, ItemCandidate, ItemFields, ItemId, UserId};
use crate::repositories::{
    ITEMS_BILL_NUMBER_KEY, ITEMS_SERIAL_NUMBER_KEY, ItemRepository, RepositoryError,
};
use crate::validation::{
    DateError, MAX_ITEM_CODE_LENGTH, MAX_ITEM_NAME_LENGTH, MAX_WARRANTY_LENGTH, TooLong,
    parse_past_date, present, within,
};

/// Failures of registry operations; `Display` is the user-facing message
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Name, serial number and bill number are required")]
    MissingFields,

    #[error("Invalid date format")]
    InvalidPurchaseDate,

    #[error("Date of purchase cannot be in the future")]
    FuturePurchaseDate,

    #[error(transparent)]
    TooLong(#[from] TooLong),

    #[error("Serial number already exists")]
    SerialTaken,

    #[error("Bill number already exists")]
    BillTaken,

    #[error("Item not found")]
    NotFound(ItemId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::MissingFields
            | RegistryError::InvalidPurchaseDate
            | RegistryError::FuturePurchaseDate
            | RegistryError::TooLong(_) => ErrorKind::Validation,
            RegistryError::SerialTaken | RegistryError::BillTaken => ErrorKind::Conflict,
            RegistryError::NotFound(_) => ErrorKind::NotFound,
            RegistryError::Repository(_) => ErrorKind::Internal,
        }
    }

    fn from_write(e: RepositoryError) -> Self {
        match e.unique_constraint() {
            Some(ITEMS_SERIAL_NUMBER_KEY) => RegistryError::SerialTaken,
            Some(ITEMS_BILL_NUMBER_KEY) => RegistryError::BillTaken,
            _ => RegistryError::Repository(e),
        }
    }
}

impl From<DateError> for RegistryError {
    fn from(e: DateError) -> Self {
        match e {
            DateError::Malformed => RegistryError::InvalidPurchaseDate,
            DateError::InFuture => RegistryError::FuturePurchaseDate,
        }
    }
}

/// Item catalogue service
#[derive(Clone)]
pub struct AssetRegistry {
    items: Arc<dyn ItemRepository>,
    clock: Arc<dyn Clock>,
}

impl AssetRegistry {
    pub fn new(items: Arc<dyn ItemRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { items, clock }
    }

    /// Catalogue a new, unassigned item.
    ///
    /// Order: required fields, purchase date (parse, then not in the future),
    /// serial number uniqueness, bill number uniqueness.
    pub async fn add(&self, candidate: ItemCandidate) -> Result<ItemId, RegistryError> {
        let fields = self.validate(candidate)?;

        if self
            .items
            .find_by_serial_number(&fields.serial_number)
            .await?
            .is_some()
        {
            warn!("Add item failed: serial number {} exists", fields.serial_number);
            return Err(RegistryError::SerialTaken);
        }

        if self
            .items
            .find_by_bill_number(&fields.bill_number)
            .await?
            .is_some()
        {
            warn!("Add item failed: bill number {} exists", fields.bill_number);
            return Err(RegistryError::BillTaken);
        }

        let item = self
            .items
            .insert(fields)
            .await
            .map_err(RegistryError::from_write)?;

        info!("Item added successfully: {} ({})", item.name, item.id);
        Ok(item.id)
    }

    /// Overwrite an item's editable fields.
    ///
    /// The new values go through the same checks as [`AssetRegistry::add`];
    /// the serial and bill numbers only conflict with *other* items.
    pub async fn update(&self, id: ItemId, candidate: ItemCandidate) -> Result<(), RegistryError> {
        if self.items.find_by_id(id).await?.is_none() {
            warn!("Update item failed: item {} not found", id);
            return Err(RegistryError::NotFound(id));
        }

        let fields = self.validate(candidate)?;

        if let Some(other) = self.items.find_by_serial_number(&fields.serial_number).await? {
            if other.id != id {
                warn!("Update item failed: serial number {} belongs to item {}", fields.serial_number, other.id);
                return Err(RegistryError::SerialTaken);
            }
        }

        if let Some(other) = self.items.find_by_bill_number(&fields.bill_number).await? {
            if other.id != id {
                warn!("Update item failed: bill number {} belongs to item {}", fields.bill_number, other.id);
                return Err(RegistryError::BillTaken);
            }
        }

        let name = fields.name.clone();
        if !self
            .items
            .update(id, fields)
            .await
            .map_err(RegistryError::from_write)?
        {
            return Err(RegistryError::NotFound(id));
        }

        info!("Item updated successfully: {} ({})", name, id);
        Ok(())
    }

    pub async fn delete(&self, id: ItemId) -> Result<(), RegistryError> {
        if self.items.delete(id).await? {
            info!("Item deleted successfully: {}", id);
            Ok(())
        } else {
            warn!("Delete item failed: item {} not found", id);
            Err(RegistryError::NotFound(id))
        }
    }

    pub async fn find(&self, id: ItemId) -> Result<Item, RegistryError> {
        self.items
            .find_by_id(id)
            .await?
            .ok_or(RegistryError::NotFound(id))
    }

    pub async fn list_all(&self) -> Result<Vec<Item>, RegistryError> {
        Ok(self.items.list().await?)
    }

    pub async fn list_assigned_to(&self, user: UserId) -> Result<Vec<Item>, RegistryError> {
        Ok(self.items.list_assigned_to(user).await?)
    }

    fn validate(&self, candidate: ItemCandidate) -> Result<ItemFields, RegistryError> {
        let (Some(name), Some(serial_number), Some(bill_number)) = (
            present(&candidate.name),
            present(&candidate.serial_number),
            present(&candidate.bill_number),
        ) else {
            warn!("Item rejected: missing fields");
            return Err(RegistryError::MissingFields);
        };

        let date_of_purchase = parse_past_date(
            candidate.date_of_purchase.as_deref().unwrap_or_default(),
            self.clock.today(),
        )
        .inspect_err(|e| warn!("Item rejected: date of purchase {}", e))?;

        let warranty = present(&candidate.warranty);
        within("Name", name, MAX_ITEM_NAME_LENGTH)
            .and_then(|()| within("Serial number", serial_number, MAX_ITEM_CODE_LENGTH))
            .and_then(|()| within("Bill number", bill_number, MAX_ITEM_CODE_LENGTH))
            .and_then(|()| within("Warranty", warranty.unwrap_or_default(), MAX_WARRANTY_LENGTH))
            .inspect_err(|e| warn!("Item rejected: {}", e))?;

        Ok(ItemFields {
            name: name.to_string(),
            serial_number: serial_number.to_string(),
            bill_number: bill_number.to_string(),
            date_of_purchase,
            warranty: warranty.map(str::to_string),
        })
    }
}
