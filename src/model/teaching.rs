use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Collection, Entity, Id};

/// Join record: this assistant teaches this course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teaching {
    #[serde(rename = "_id")]
    pub id: Id,
    pub assistant_id: Id,
    pub course_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Teaching {
    const COLLECTION: Collection = Collection::Teachings;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeaching {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<Id>,
}
