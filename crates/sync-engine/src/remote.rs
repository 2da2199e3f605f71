// crates/sync-engine/src/remote.rs
//! Remote data source seam

use async_trait::async_trait;
use showsync_core::{LocalId, Result, SyncedEntity};
use std::fmt;

/// Remote key handed out for a record during an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedKey<K> {
    pub local_id: LocalId,
    pub remote_key: K,
}

/// Network side of one sync group
///
/// Implementations own their request timeout and retry policy; the
/// orchestrator calls each method once per sync and treats any error as
/// final for that run.
#[async_trait]
pub trait RemoteDataSource: Send + Sync {
    /// Identifier of the remote collection, such as a list id
    type Endpoint: Clone + fmt::Debug + Send + Sync + 'static;
    /// One element of the remote snapshot
    type Item: Send + Sync + 'static;
    /// Local record type of the group
    type Entity: SyncedEntity;

    /// Looks up the remote collection, creating it if absent
    async fn resolve_endpoint(&self) -> Result<Self::Endpoint>;

    /// Full current contents of the collection
    async fn fetch_snapshot(&self, endpoint: &Self::Endpoint) -> Result<Vec<Self::Item>>;

    /// Adds records, returning keys the service assigned to any of them
    async fn push_additions(
        &self,
        endpoint: &Self::Endpoint,
        entities: &[Self::Entity],
    ) -> Result<Vec<AssignedKey<<Self::Entity as SyncedEntity>::Key>>>;

    /// Removes records; every entity passed carries a remote key
    async fn push_removals(&self, endpoint: &Self::Endpoint, entities: &[Self::Entity])
        -> Result<()>;
}
