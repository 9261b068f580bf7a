use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Address, Collection, Entity, Id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Child,
    Assistant,
    Boss,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Child => "child",
            Role::Assistant => "assistant",
            Role::Boss => "boss",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root identity for children, assistants and bosses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: Id,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Address,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Person {
    const COLLECTION: Collection = Collection::People;
}

/// Input model for creating a person; the store assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Address,
    pub role: Role,
}
