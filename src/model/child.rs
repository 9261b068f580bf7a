use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Collection, Entity, Id};

fn default_allergy() -> String {
    "None".to_string()
}

/// Extension of a person with role `child`; shares the person's id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    #[serde(rename = "_id")]
    pub id: Id,
    pub class_id: Id,
    #[serde(default)]
    pub parental_statement: bool,
    #[serde(default = "default_allergy")]
    pub allergy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Child {
    const COLLECTION: Collection = Collection::Children;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChild {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<Id>,
    #[serde(default)]
    pub parental_statement: bool,
    #[serde(default = "default_allergy")]
    pub allergy: String,
}
