//! Inventory service models

pub mod item;
pub mod session;
pub mod user;

// Re-export for convenience
pub use item::{Item, ItemCandidate, ItemFields, ItemId};
pub use session::Session;
pub use user::{NewUser, Role, UnknownRole, User, UserCandidate, UserId};
