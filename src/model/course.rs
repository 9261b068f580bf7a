use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{deserialize_date, Collection, Entity, Id};

/// One session of a theme given to a class on a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: Id,
    pub theme_id: Id,
    pub class_id: Id,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub cost: f64,
    /// Children absent from this course
    #[serde(default)]
    pub absence: Vec<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Course {
    const COLLECTION: Collection = Collection::Courses;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<Id>,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub absence: Vec<Id>,
}
