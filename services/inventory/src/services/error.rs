//! Error classification shared by the services

/// How a service failure should be reported to the requester
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input
    Validation,
    /// A uniqueness rule was violated
    Conflict,
    /// Bad credentials
    Authentication,
    /// The referenced user or item does not exist
    NotFound,
    /// Storage or hashing failure; not the requester's fault
    Internal,
}
