//! Identity and pending-action state shared by every synced record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Identifier assigned by the local store on first insert
///
/// This is the only identifier other local tables may reference. It never
/// changes for the life of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalId(i64);

impl LocalId {
    /// Wraps a raw row id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw row id
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutation queued against a local record that the remote service has not
/// acknowledged yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingAction {
    /// In sync with the remote service; participates in reconciliation
    #[default]
    Nothing,
    /// Added locally, waiting to be pushed
    Upload,
    /// Removed locally, waiting to be pushed
    Delete,
}

impl PendingAction {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Upload => "upload",
            Self::Delete => "delete",
        }
    }

    /// True when the record is queued for upload or deletion
    pub fn is_pending(&self) -> bool {
        !matches!(self, Self::Nothing)
    }
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PendingAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nothing" => Ok(Self::Nothing),
            "upload" => Ok(Self::Upload),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown pending action '{}'", other)),
        }
    }
}

/// A local record that takes part in sync
///
/// Records are values: the `with_*` methods return an updated copy rather
/// than mutating in place.
pub trait SyncedEntity: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Identifier used to match against the remote collection
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Local id, `None` for a draft that has not been inserted yet
    fn local_id(&self) -> Option<LocalId>;

    /// Remote key, `None` while the remote service has not assigned one
    fn remote_key(&self) -> Option<Self::Key>;

    fn pending_action(&self) -> PendingAction;

    fn with_local_id(self, id: Option<LocalId>) -> Self;

    fn with_remote_key(self, key: Option<Self::Key>) -> Self;

    fn with_pending_action(self, action: PendingAction) -> Self;
}
