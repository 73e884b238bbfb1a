use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::RecordId;

/// Publication status of a post-like record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Pending,
    Private,
    Future,
    Publish,
}

impl PostStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Private => "private",
            Self::Future => "future",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical fields of a post record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PostFields {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[schemars(length(min = 1))]
    pub post_title: String,
    #[serde(default)]
    pub post_content: String,
    #[serde(default)]
    pub post_excerpt: String,
    pub post_status: PostStatus,
    /// URL slug.
    #[serde(default)]
    pub post_name: String,
    pub post_type: String,
    #[serde(default)]
    pub post_author: u64,
    #[serde(default)]
    pub post_date: Option<DateTime<Utc>>,
}
