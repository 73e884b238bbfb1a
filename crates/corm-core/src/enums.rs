//! Lifecycle events, event timing, and record status for corm.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Whether an event fires before or after the storage operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    /// May veto the pending operation.
    Before,
    /// Observational only; the operation is already committed.
    After,
}

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// A named event fired relative to a model instance.
///
/// Events come in strict before/after pairs:
///
/// ```text
/// creating → created
/// updating → updated
/// deleting → deleted
/// trashing → trashed     (soft-deletable types)
/// restoring → restored   (soft-deletable types)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Creating,
    Created,
    Updating,
    Updated,
    Deleting,
    Deleted,
    Trashing,
    Trashed,
    Restoring,
    Restored,
}

impl LifecycleEvent {
    /// Every event, in pair order.
    pub const ALL: [Self; 10] = [
        Self::Creating,
        Self::Created,
        Self::Updating,
        Self::Updated,
        Self::Deleting,
        Self::Deleted,
        Self::Trashing,
        Self::Trashed,
        Self::Restoring,
        Self::Restored,
    ];

    #[must_use]
    pub const fn timing(self) -> Timing {
        match self {
            Self::Creating | Self::Updating | Self::Deleting | Self::Trashing | Self::Restoring => {
                Timing::Before
            }
            Self::Created | Self::Updated | Self::Deleted | Self::Trashed | Self::Restored => {
                Timing::After
            }
        }
    }

    /// Before-events may veto the operation.
    #[must_use]
    pub const fn is_before(self) -> bool {
        matches!(self.timing(), Timing::Before)
    }

    /// The other half of this event's before/after pair.
    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::Creating => Self::Created,
            Self::Created => Self::Creating,
            Self::Updating => Self::Updated,
            Self::Updated => Self::Updating,
            Self::Deleting => Self::Deleted,
            Self::Deleted => Self::Deleting,
            Self::Trashing => Self::Trashed,
            Self::Trashed => Self::Trashing,
            Self::Restoring => Self::Restored,
            Self::Restored => Self::Restoring,
        }
    }

    /// Only meaningful for types that support reversible deletion.
    #[must_use]
    pub const fn requires_soft_delete(self) -> bool {
        matches!(
            self,
            Self::Trashing | Self::Trashed | Self::Restoring | Self::Restored
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Created => "created",
            Self::Updating => "updating",
            Self::Updated => "updated",
            Self::Deleting => "deleting",
            Self::Deleted => "deleted",
            Self::Trashing => "trashing",
            Self::Trashed => "trashed",
            Self::Restoring => "restoring",
            Self::Restored => "restored",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RecordStatus
// ---------------------------------------------------------------------------

/// Where a model instance stands relative to its stored record.
///
/// ```text
/// new → persisted → trashed → persisted (restored)
///                 → deleted
///     persisted → deleted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// In memory only, no identity yet.
    New,
    /// Stored and live.
    Persisted,
    /// Soft-deleted; still retrievable with trashed queries.
    Trashed,
    /// Permanently removed (tombstone).
    Deleted,
}

impl RecordStatus {
    /// Whether the instance refers to a record the adapter still holds.
    #[must_use]
    pub const fn exists(self) -> bool {
        matches!(self, Self::Persisted | Self::Trashed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Persisted => "persisted",
            Self::Trashed => "trashed",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
