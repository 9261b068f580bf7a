use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Address, Collection, Entity, Id};

/// Administrative grouping owning classes and assistants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canton {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub budget: f64,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Canton {
    const COLLECTION: Collection = Collection::Cantons;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCanton {
    pub name: String,
    #[serde(default)]
    pub budget: f64,
    pub address: Address,
}
