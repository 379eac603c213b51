//! Session model

use serde::{Deserialize, Serialize};

use super::user::{Role, User, UserId};

/// Per-client authentication state carried in the session cookie
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub loggedin: bool,
    pub id: Option<UserId>,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl Session {
    /// State recorded after a successful login
    pub fn for_user(user: &User) -> Self {
        Self {
            loggedin: true,
            id: Some(user.id),
            first_name: Some(user.first_name.clone()),
            email: Some(user.email.clone()),
            role: Some(user.role),
        }
    }
}
