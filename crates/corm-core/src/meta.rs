//! Meta Buffer: pending meta mutations of one model instance.
//!
//! Meta entries are auxiliary key/value data stored apart from the record's
//! primary fields. Until the owning record has an identity (or while writes are
//! batched) every mutation is queued here and applied in registration order by
//! [`MetaBuffer::flush`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One queued meta mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MetaOp {
    Set { key: String, value: Value },
    Delete { key: String },
}

impl MetaOp {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// What the buffer knows about a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffered<'a> {
    /// The latest queued op sets this value.
    Set(&'a Value),
    /// The latest queued op deletes the key.
    Deleted,
    /// Nothing queued for the key.
    Untouched,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaBuffer {
    ops: Vec<MetaOp>,
}

impl MetaBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a set. A later set for the same key supersedes earlier ones on read,
    /// but both are kept so flush order matches registration order.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.ops.push(MetaOp::Set {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Cancel pending sets for `key` and queue a delete of the stored value.
    pub fn delete(&mut self, key: &str) {
        self.discard(key);
        self.ops.push(MetaOp::Delete {
            key: key.to_string(),
        });
    }

    /// Cancel every pending op for `key`. Returns whether anything was dropped.
    pub fn discard(&mut self, key: &str) -> bool {
        let before = self.ops.len();
        self.ops.retain(|op| op.key() != key);
        before != self.ops.len()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Buffered<'_> {
        match self.ops.iter().rev().find(|op| op.key() == key) {
            Some(MetaOp::Set { value, .. }) => Buffered::Set(value),
            Some(MetaOp::Delete { .. }) => Buffered::Deleted,
            None => Buffered::Untouched,
        }
    }

    #[must_use]
    pub fn pending(&self) -> &[MetaOp] {
        &self.ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Apply queued ops in order through `apply`.
    ///
    /// Returns the number of ops applied. On the first failure, the failing op
    /// and everything after it stay queued for a later retry.
    ///
    /// # Errors
    ///
    /// Returns whatever `apply` returned for the failing op.
    pub fn flush<E>(&mut self, mut apply: impl FnMut(&MetaOp) -> Result<(), E>) -> Result<usize, E> {
        let mut applied = 0;
        let mut failure = None;
        for op in &self.ops {
            if let Err(e) = apply(op) {
                failure = Some(e);
                break;
            }
            applied += 1;
        }
        self.ops.drain(..applied);
        match failure {
            Some(e) => Err(e),
            None => Ok(applied),
        }
    }
}
