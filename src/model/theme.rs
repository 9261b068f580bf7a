use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Collection, Entity, Id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Theme {
    const COLLECTION: Collection = Collection::Themes;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTheme {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
