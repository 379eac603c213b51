pub mod assignment;
pub mod directory;
pub mod error;
pub mod registry;

pub use assignment::{AssignError, AssignmentEngine};
pub use directory::{DirectoryError, UserDirectory};
pub use error::ErrorKind;
pub use registry::{AssetRegistry, RegistryError};
