//! Assignment engine: linking items to the users who hold them

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::error::ErrorKind;
use crate::models::{ItemId, UserId};
use crate::repositories::{ItemRepository, RepositoryError, UserRepository};

#[derive(Debug, Error)]
pub enum AssignError {
    #[error("Item not found")]
    ItemNotFound(ItemId),

    /// The item already has a holder; nothing was changed.
    #[error("Item is already assigned")]
    AlreadyAssignedNoOp { holder: UserId },

    #[error("User not found")]
    UserNotFound(UserId),

    #[error("User already has an item named {name}")]
    DuplicateNamedItemForUser { name: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AssignError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssignError::ItemNotFound(_) | AssignError::UserNotFound(_) => ErrorKind::NotFound,
            AssignError::AlreadyAssignedNoOp { .. } | AssignError::DuplicateNamedItemForUser { .. } => {
                ErrorKind::Conflict
            }
            AssignError::Repository(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Clone)]
pub struct AssignmentEngine {
    items: Arc<dyn ItemRepository>,
    users: Arc<dyn UserRepository>,
}

impl AssignmentEngine {
    pub fn new(items: Arc<dyn ItemRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { items, users }
    }

    /// Give an unassigned item to a user.
    ///
    /// An item that already has a holder is left with that holder; it has to
    /// be unassigned first.
    pub async fn assign(&self, item_id: ItemId, user_id: UserId) -> Result<(), AssignError> {
        let Some(item) = self.items.find_by_id(item_id).await? else {
            warn!("Assign failed: item {} not found", item_id);
            return Err(AssignError::ItemNotFound(item_id));
        };

        if let Some(holder) = item.assigned_to {
            warn!("Assign skipped: item {} already assigned to user {}", item_id, holder);
            return Err(AssignError::AlreadyAssignedNoOp { holder });
        }

        if self.users.find_by_id(user_id).await?.is_none() {
            warn!("Assign failed: user {} not found", user_id);
            return Err(AssignError::UserNotFound(user_id));
        }

        if self
            .items
            .find_assigned_by_name(user_id, &item.name)
            .await?
            .is_some()
        {
            warn!("Assign failed: user {} already has an item named {}", user_id, item.name);
            return Err(AssignError::DuplicateNamedItemForUser { name: item.name });
        }

        match self.items.set_assignee(item_id, Some(user_id)).await {
            Ok(true) => {
                info!("Item {} assigned to user {}", item_id, user_id);
                Ok(())
            }
            Ok(false) => Err(AssignError::ItemNotFound(item_id)),
            // the user was deleted between the lookup and the write
            Err(RepositoryError::ForeignKeyViolation) => Err(AssignError::UserNotFound(user_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Clear an item's holder. Unassigning an unassigned item succeeds.
    pub async fn unassign(&self, item_id: ItemId) -> Result<(), AssignError> {
        if self.items.set_assignee(item_id, None).await? {
            info!("Item {} unassigned", item_id);
            Ok(())
        } else {
            warn!("Unassign failed: item {} not found", item_id);
            Err(AssignError::ItemNotFound(item_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::PasswordHash;
    use crate::models::{ItemFields, NewUser, Role};
    use crate::repositories::MemoryStore;
    use chrono::NaiveDate;

    struct Fixture {
        engine: AssignmentEngine,
        store: MemoryStore,
    }

    impl Fixture {
        fn new() -> Self {
            let store = MemoryStore::new();
            let engine = AssignmentEngine::new(Arc::new(store.clone()), Arc::new(store.clone()));
            Self { engine, store }
        }

        async fn user(&self, email: &str, phone: &str) -> UserId {
            UserRepository::insert(
                &self.store,
                NewUser {
                    first_name: "Test".to_string(),
                    last_name: "User".to_string(),
                    dob: None,
                    phone_no: phone.to_string(),
                    email: email.to_string(),
                    password_hash: PasswordHash::from_stored("$argon2id$stub"),
                    role: Role::User,
                },
            )
            .await
            .unwrap()
            .id
        }

        async fn item(&self, name: &str, serial: &str) -> ItemId {
            ItemRepository::insert(
                &self.store,
                ItemFields {
                    name: name.to_string(),
                    serial_number: serial.to_string(),
                    bill_number: format!("B-{serial}"),
                    date_of_purchase: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                    warranty: None,
                },
            )
            .await
            .unwrap()
            .id
        }

        async fn holder(&self, item: ItemId) -> Option<UserId> {
            ItemRepository::find_by_id(&self.store, item)
                .await
                .unwrap()
                .unwrap()
                .assigned_to
        }
    }

    #[tokio::test]
    async fn test_assign_then_unassign() {
        let f = Fixture::new();
        let user = f.user("a@corp.com", "1111111111").await;
        let item = f.item("Laptop", "SN1").await;

        f.engine.assign(item, user).await.unwrap();
        let held = f.store.list_assigned_to(user).await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].id, item);

        f.engine.unassign(item).await.unwrap();
        assert!(f.store.list_assigned_to(user).await.unwrap().is_empty());
        assert_eq!(f.holder(item).await, None);
    }

    #[tokio::test]
    async fn test_reassign_keeps_current_holder() {
        let f = Fixture::new();
        let alice = f.user("a@corp.com", "1111111111").await;
        let bob = f.user("b@corp.com", "2222222222").await;
        let item = f.item("Laptop", "SN1").await;

        f.engine.assign(item, alice).await.unwrap();
        let err = f.engine.assign(item, bob).await.unwrap_err();

        assert!(matches!(err, AssignError::AlreadyAssignedNoOp { holder } if holder == alice));
        assert_eq!(f.holder(item).await, Some(alice));
    }

    #[tokio::test]
    async fn test_duplicate_name_for_same_user() {
        let f = Fixture::new();
        let user = f.user("a@corp.com", "1111111111").await;
        let first = f.item("Laptop", "SN1").await;
        let second = f.item("Laptop", "SN2").await;

        f.engine.assign(first, user).await.unwrap();
        let err = f.engine.assign(second, user).await.unwrap_err();

        assert_eq!(err.to_string(), "User already has an item named Laptop");
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(f.holder(second).await, None);
    }

    #[tokio::test]
    async fn test_same_name_for_different_users() {
        let f = Fixture::new();
        let alice = f.user("a@corp.com", "1111111111").await;
        let bob = f.user("b@corp.com", "2222222222").await;
        let first = f.item("Laptop", "SN1").await;
        let second = f.item("Laptop", "SN2").await;

        f.engine.assign(first, alice).await.unwrap();
        f.engine.assign(second, bob).await.unwrap();
        assert_eq!(f.holder(second).await, Some(bob));
    }

    #[tokio::test]
    async fn test_missing_item_and_user() {
        let f = Fixture::new();
        let user = f.user("a@corp.com", "1111111111").await;
        let item = f.item("Laptop", "SN1").await;

        assert!(matches!(
            f.engine.assign(ItemId(99), user).await,
            Err(AssignError::ItemNotFound(ItemId(99)))
        ));
        assert!(matches!(
            f.engine.assign(item, UserId(99)).await,
            Err(AssignError::UserNotFound(UserId(99)))
        ));
        assert!(matches!(
            f.engine.unassign(ItemId(99)).await,
            Err(AssignError::ItemNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unassign_is_idempotent() {
        let f = Fixture::new();
        let item = f.item("Laptop", "SN1").await;

        f.engine.unassign(item).await.unwrap();
        f.engine.unassign(item).await.unwrap();
        assert_eq!(f.holder(item).await, None);
    }

    #[tokio::test]
    async fn test_deleted_user_releases_items() {
        let f = Fixture::new();
        let user = f.user("a@corp.com", "1111111111").await;
        let item = f.item("Laptop", "SN1").await;
        f.engine.assign(item, user).await.unwrap();

        UserRepository::delete(&f.store, user).await.unwrap();

        assert_eq!(f.holder(item).await, None);
        let other = f.user("b@corp.com", "2222222222").await;
        f.engine.assign(item, other).await.unwrap();
    }
}
