//! Repositories for database operations
//!
//! Services talk to storage through the [`UserRepository`] and
//! [`ItemRepository`] traits. Two adapters exist: PostgreSQL via sqlx and an
//! in-process store. Both enforce the unique columns themselves, so a
//! duplicate that slips past a service-level check still surfaces as
//! [`RepositoryError::UniqueViolation`].

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Item, ItemFields, ItemId, NewUser, User, UserId};

pub mod item;
pub mod memory;
pub mod user;

pub use item::PgItemRepository;
pub use memory::MemoryStore;
pub use user::PgUserRepository;

/// Name of the unique constraint on `users.email`
pub const USERS_EMAIL_KEY: &str = "users_email_key";
/// Name of the unique constraint on `users.phone_no`
pub const USERS_PHONE_NO_KEY: &str = "users_phone_no_key";
/// Name of the unique constraint on `items.serial_number`
pub const ITEMS_SERIAL_NUMBER_KEY: &str = "items_serial_number_key";
/// Name of the unique constraint on `items.bill_number`
pub const ITEMS_BILL_NUMBER_KEY: &str = "items_bill_number_key";

/// Storage failure
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique constraint rejected the write
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A foreign key pointed at a missing row
    #[error("foreign key constraint violated")]
    ForeignKeyViolation,

    /// A stored row could not be decoded
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Any other database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    /// Name of the violated unique constraint, if that is what happened
    pub fn unique_constraint(&self) -> Option<&str> {
        match self {
            RepositoryError::UniqueViolation { constraint } => Some(constraint),
            _ => None,
        }
    }
}

/// Type alias for repository results
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Persistence port for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: NewUser) -> RepoResult<User>;

    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn find_by_phone(&self, phone_no: &str) -> RepoResult<Option<User>>;

    /// All users ordered by id
    async fn list(&self) -> RepoResult<Vec<User>>;

    /// Delete a user and release any item assigned to it.
    ///
    /// Returns `false` when no such user exists.
    async fn delete(&self, id: UserId) -> RepoResult<bool>;
}

/// Persistence port for items
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn insert(&self, fields: ItemFields) -> RepoResult<Item>;

    async fn find_by_id(&self, id: ItemId) -> RepoResult<Option<Item>>;

    async fn find_by_serial_number(&self, serial_number: &str) -> RepoResult<Option<Item>>;

    async fn find_by_bill_number(&self, bill_number: &str) -> RepoResult<Option<Item>>;

    /// An item named `name` currently assigned to `user`, if any
    async fn find_assigned_by_name(&self, user: UserId, name: &str) -> RepoResult<Option<Item>>;

    /// All items ordered by id
    async fn list(&self) -> RepoResult<Vec<Item>>;

    async fn list_assigned_to(&self, user: UserId) -> RepoResult<Vec<Item>>;

    /// Overwrite the editable columns. Returns `false` when the item is missing.
    async fn update(&self, id: ItemId, fields: ItemFields) -> RepoResult<bool>;

    /// Set or clear the assignee. Returns `false` when the item is missing.
    async fn set_assignee(&self, id: ItemId, user: Option<UserId>) -> RepoResult<bool>;

    async fn delete(&self, id: ItemId) -> RepoResult<bool>;
}

/// Convert an SQLx error, recognising constraint violations
pub(crate) fn map_db_error(e: sqlx::Error) -> RepositoryError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return RepositoryError::UniqueViolation {
                constraint: db_err.constraint().unwrap_or_default().to_string(),
            };
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::ForeignKeyViolation;
        }
    }
    RepositoryError::Database(e)
}
