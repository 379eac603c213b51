//! Access decisions derived from the session

use crate::models::{Role, Session, UserId};

/// What the requester behind a session is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Anonymous,
    Employee { user_id: UserId },
    Administrator { user_id: UserId },
}

impl AccessLevel {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            AccessLevel::Anonymous => None,
            AccessLevel::Employee { user_id } | AccessLevel::Administrator { user_id } => {
                Some(*user_id)
            }
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, AccessLevel::Administrator { .. })
    }
}

/// Classify a session. The stored role decides administrator access.
pub fn access_level(session: &Session) -> AccessLevel {
    match (session.loggedin, session.id) {
        (true, Some(user_id)) => match session.role {
            Some(Role::Admin) => AccessLevel::Administrator { user_id },
            _ => AccessLevel::Employee { user_id },
        },
        _ => AccessLevel::Anonymous,
    }
}
