//! Item model and related functionality

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::user::UserId;

/// System-assigned item identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Item entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub serial_number: String,
    pub bill_number: String,
    pub date_of_purchase: NaiveDate,
    pub warranty: Option<String>,
    pub assigned_to: Option<UserId>,
}

/// Validated, user-editable item columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields {
    pub name: String,
    pub serial_number: String,
    pub bill_number: String,
    pub date_of_purchase: NaiveDate,
    pub warranty: Option<String>,
}

/// Raw item input as submitted by a form
#[derive(Debug, Clone, Default)]
pub struct ItemCandidate {
    pub name: Option<String>,
    pub serial_number: Option<String>,
    pub bill_number: Option<String>,
    pub date_of_purchase: Option<String>,
    pub warranty: Option<String>,
}
