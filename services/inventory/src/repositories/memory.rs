//! In-process storage with the same constraints as the SQL schema

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    ITEMS_BILL_NUMBER_KEY, ITEMS_SERIAL_NUMBER_KEY, ItemRepository, RepoResult, RepositoryError,
    USERS_EMAIL_KEY, USERS_PHONE_NO_KEY, UserRepository,
};
use crate::models::{Item, ItemFields, ItemId, NewUser, User, UserId};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    items: BTreeMap<ItemId, Item>,
    next_user_id: i64,
    next_item_id: i64,
}

impl Tables {
    fn check_item_keys(&self, fields: &ItemFields, except: Option<ItemId>) -> RepoResult<()> {
        let others = self.items.values().filter(|item| Some(item.id) != except);
        for item in others {
            if item.serial_number == fields.serial_number {
                return Err(unique(ITEMS_SERIAL_NUMBER_KEY));
            }
            if item.bill_number == fields.bill_number {
                return Err(unique(ITEMS_BILL_NUMBER_KEY));
            }
        }
        Ok(())
    }
}

fn unique(constraint: &str) -> RepositoryError {
    RepositoryError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

/// Shared in-memory store implementing both repositories.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.write().await;

        for existing in tables.users.values() {
            if existing.email == user.email {
                return Err(unique(USERS_EMAIL_KEY));
            }
            if existing.phone_no == user.phone_no {
                return Err(unique(USERS_PHONE_NO_KEY));
            }
        }

        tables.next_user_id += 1;
        let id = UserId(tables.next_user_id);
        let user = User {
            id,
            first_name: user.first_name,
            last_name: user.last_name,
            dob: user.dob,
            phone_no: user.phone_no,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        tables.users.insert(id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_phone(&self, phone_no: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.phone_no == phone_no).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn delete(&self, id: UserId) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        for item in tables.items.values_mut() {
            if item.assigned_to == Some(id) {
                item.assigned_to = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ItemRepository for MemoryStore {
    async fn insert(&self, fields: ItemFields) -> RepoResult<Item> {
        let mut tables = self.tables.write().await;
        tables.check_item_keys(&fields, None)?;

        tables.next_item_id += 1;
        let id = ItemId(tables.next_item_id);
        let item = Item {
            id,
            name: fields.name,
            serial_number: fields.serial_number,
            bill_number: fields.bill_number,
            date_of_purchase: fields.date_of_purchase,
            warranty: fields.warranty,
            assigned_to: None,
        };
        tables.items.insert(id, item.clone());

        Ok(item)
    }

    async fn find_by_id(&self, id: ItemId) -> RepoResult<Option<Item>> {
        Ok(self.tables.read().await.items.get(&id).cloned())
    }

    async fn find_by_serial_number(&self, serial_number: &str) -> RepoResult<Option<Item>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .find(|i| i.serial_number == serial_number)
            .cloned())
    }

    async fn find_by_bill_number(&self, bill_number: &str) -> RepoResult<Option<Item>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .find(|i| i.bill_number == bill_number)
            .cloned())
    }

    async fn find_assigned_by_name(&self, user: UserId, name: &str) -> RepoResult<Option<Item>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .find(|i| i.assigned_to == Some(user) && i.name == name)
            .cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Item>> {
        Ok(self.tables.read().await.items.values().cloned().collect())
    }

    async fn list_assigned_to(&self, user: UserId) -> RepoResult<Vec<Item>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .filter(|i| i.assigned_to == Some(user))
            .cloned()
            .collect())
    }

    async fn update(&self, id: ItemId, fields: ItemFields) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.items.contains_key(&id) {
            return Ok(false);
        }
        tables.check_item_keys(&fields, Some(id))?;

        if let Some(item) = tables.items.get_mut(&id) {
            item.name = fields.name;
            item.serial_number = fields.serial_number;
            item.bill_number = fields.bill_number;
            item.date_of_purchase = fields.date_of_purchase;
            item.warranty = fields.warranty;
        }
        Ok(true)
    }

    async fn set_assignee(&self, id: ItemId, user: Option<UserId>) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if let Some(user) = user {
            if !tables.users.contains_key(&user) {
                return Err(RepositoryError::ForeignKeyViolation);
            }
        }
        match tables.items.get_mut(&id) {
            Some(item) => {
                item.assigned_to = user;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ItemId) -> RepoResult<bool> {
        Ok(self.tables.write().await.items.remove(&id).is_some())
    }
}
