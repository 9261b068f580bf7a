use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Collection, Entity, Id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Morning,
    Afternoon,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Morning => f.write_str("morning"),
            Period::Afternoon => f.write_str("afternoon"),
        }
    }
}

/// A class of children in one canton, held in the morning or the afternoon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    #[serde(rename = "_id")]
    pub id: Id,
    pub canton_id: Id,
    #[serde(rename = "periode")]
    pub period: Period,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Class {
    const COLLECTION: Collection = Collection::Classes;
}

/// References are optional here so a missing one reports as "not found"
/// together with any other unresolved reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canton_id: Option<Id>,
    #[serde(rename = "periode")]
    pub period: Period,
}
