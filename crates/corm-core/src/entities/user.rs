use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::identity::RecordId;

/// Canonical fields of a user record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UserFields {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[schemars(length(min = 1))]
    pub user_login: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub user_registered: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_status: i64,
}
