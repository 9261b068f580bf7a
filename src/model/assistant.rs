use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Collection, Entity, Id};

pub const DEFAULT_SALARY: f64 = 20.0;

fn default_salary() -> f64 {
    DEFAULT_SALARY
}

/// Extension of a person with role `assistant`; shares the person's id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assistant {
    #[serde(rename = "_id")]
    pub id: Id,
    pub canton_id: Id,
    #[serde(default = "default_salary")]
    pub salary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Assistant {
    const COLLECTION: Collection = Collection::Assistants;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssistant {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canton_id: Option<Id>,
    #[serde(default = "default_salary")]
    pub salary: f64,
}
