// FILE: crates/cli/src/remote.rs
//! A JSON file standing in for the tracking service
//!
//! ```json
//! {
//!   "signed_in": true,
//!   "followed_list_id": 7,
//!   "followed": [{ "show_id": 1390, "title": "Show A", "listed_at": 1700000000000 }],
//!   "watches": { "1390": [{ "remote_id": 1, "episode_id": 101, "watched_at": 1700000000000 }] }
//! }
//! ```
//!
//! A missing file or `"signed_in": false` behaves like a signed-out account,
//! so syncs run offline. Every request goes through the configured timeout
//! and retry policy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use showsync_config::RemoteConfig;
use showsync_core::{AppError, EpisodeWatchEntry, FollowedShowEntry, Result};
use showsync_resilience::{with_retry, ResilienceError, RetryPolicy, Timeout};
use showsync_sync_engine::{AssignedKey, EpisodeWatchItem, FollowedShowItem, RemoteDataSource};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Contents of the remote file
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteDocument {
    pub signed_in: bool,
    pub followed_list_id: Option<i64>,
    pub followed: Vec<FollowedShowItem>,
    /// Watch history keyed by show id
    pub watches: BTreeMap<i64, Vec<EpisodeWatchItem>>,
}

impl RemoteDocument {
    fn ensure_signed_in(&self) -> Result<()> {
        if self.signed_in {
            Ok(())
        } else {
            Err(AppError::auth_unavailable("signed out of the tracking service"))
        }
    }

    fn next_watch_id(&self) -> i64 {
        self.watches
            .values()
            .flatten()
            .map(|w| w.remote_id)
            .max()
            .unwrap_or(0)
            + 1
    }
}

fn timeout_error(err: ResilienceError) -> AppError {
    match err {
        ResilienceError::Timeout { operation, after } => AppError::NetworkTimeout {
            operation,
            seconds: after.as_secs(),
        },
    }
}

/// Handle on the remote file, shared by every sync group
#[derive(Debug, Clone)]
pub struct FileRemote {
    path: Option<PathBuf>,
    policy: RetryPolicy,
    timeout: Timeout,
    /// Serializes read-modify-write cycles on the file
    write_lock: Arc<Mutex<()>>,
}

impl FileRemote {
    pub fn new(path: Option<PathBuf>, config: &RemoteConfig) -> Self {
        let policy = RetryPolicy::new(config.max_attempts as usize)
            .with_initial_delay(config.initial_backoff());

        Self {
            path,
            policy,
            timeout: Timeout::new(config.request_timeout()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn followed_shows(&self) -> FollowedShowsRemote {
        FollowedShowsRemote { file: self.clone() }
    }

    pub fn episode_watches(&self, show_id: i64) -> EpisodeWatchesRemote {
        EpisodeWatchesRemote {
            file: self.clone(),
            show_id,
        }
    }

    /// Runs one request under the timeout, retrying transient failures
    async fn request<T, F, Fut>(&self, operation: &str, attempt: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempt = &attempt;
        with_retry(&self.policy, AppError::is_retryable, move || async move {
            self.timeout
                .execute(operation, attempt())
                .await
                .map_err(timeout_error)?
        })
        .await
    }

    pub async fn read_document(&self) -> Result<RemoteDocument> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| AppError::auth_unavailable("no remote service configured"))?;

        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::auth_unavailable(format!(
                    "{} does not exist",
                    path.display()
                )))
            }
            Err(e) => return Err(AppError::network("Failed to read remote document", e)),
        };

        serde_json::from_str(&contents).map_err(|e| AppError::RemoteRejected {
            operation: "read".to_string(),
            reason: e.to_string(),
        })
    }

    pub async fn write_document(&self, document: &RemoteDocument) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| AppError::auth_unavailable("no remote service configured"))?;

        let contents = serde_json::to_string_pretty(document).map_err(|e| AppError::InternalError {
            message: format!("Failed to encode remote document: {}", e),
        })?;

        tokio::fs::write(path, contents)
            .await
            .map_err(|e| AppError::network("Failed to write remote document", e))
    }

    /// Reads the document, applies `change` and writes it back
    async fn modify<T, F>(&self, operation: &str, change: F) -> Result<T>
    where
        F: Fn(&mut RemoteDocument) -> Result<T>,
    {
        let _guard = self.write_lock.lock().await;
        let change = &change;

        self.request(operation, move || async move {
            let mut document = self.read_document().await?;
            document.ensure_signed_in()?;
            let value = change(&mut document)?;
            self.write_document(&document).await?;
            Ok(value)
        })
        .await
    }
}

/// Id given to the followed list when the account has none yet
const FIRST_LIST_ID: i64 = 1;

/// The followed shows list of the signed-in account
#[derive(Debug, Clone)]
pub struct FollowedShowsRemote {
    file: FileRemote,
}

#[async_trait]
impl RemoteDataSource for FollowedShowsRemote {
    /// Followed list id
    type Endpoint = i64;
    type Item = FollowedShowItem;
    type Entity = FollowedShowEntry;

    async fn resolve_endpoint(&self) -> Result<i64> {
        let file = &self.file;
        let document = file
            .request("resolve followed list", move || file.read_document())
            .await?;
        document.ensure_signed_in()?;

        if let Some(list_id) = document.followed_list_id {
            return Ok(list_id);
        }

        file.modify("create followed list", |document| {
            Ok(*document.followed_list_id.get_or_insert(FIRST_LIST_ID))
        })
        .await
    }

    async fn fetch_snapshot(&self, list_id: &i64) -> Result<Vec<FollowedShowItem>> {
        let file = &self.file;
        let document = file
            .request("fetch followed shows", move || file.read_document())
            .await?;

        if document.followed_list_id != Some(*list_id) {
            return Err(AppError::RemoteRejected {
                operation: "fetch followed shows".to_string(),
                reason: format!("list {} no longer exists", list_id),
            });
        }
        Ok(document.followed)
    }

    async fn push_additions(
        &self,
        _list_id: &i64,
        entities: &[FollowedShowEntry],
    ) -> Result<Vec<AssignedKey<i64>>> {
        self.file
            .modify("add followed shows", |document| {
                for entry in entities {
                    if document.followed.iter().any(|i| i.show_id == entry.show_id) {
                        continue;
                    }
                    document.followed.push(FollowedShowItem {
                        show_id: entry.show_id,
                        title: entry.title.clone(),
                        listed_at: entry.followed_at,
                    });
                }
                Ok(())
            })
            .await?;

        // Shows are keyed by their own id, nothing to assign
        Ok(Vec::new())
    }

    async fn push_removals(&self, _list_id: &i64, entities: &[FollowedShowEntry]) -> Result<()> {
        let removed: HashSet<i64> = entities.iter().map(|e| e.show_id).collect();

        self.file
            .modify("remove followed shows", |document| {
                document.followed.retain(|i| !removed.contains(&i.show_id));
                Ok(())
            })
            .await
    }
}

/// One show's watch history
#[derive(Debug, Clone)]
pub struct EpisodeWatchesRemote {
    file: FileRemote,
    show_id: i64,
}

#[async_trait]
impl RemoteDataSource for EpisodeWatchesRemote {
    /// Show id
    type Endpoint = i64;
    type Item = EpisodeWatchItem;
    type Entity = EpisodeWatchEntry;

    async fn resolve_endpoint(&self) -> Result<i64> {
        let file = &self.file;
        let document = file
            .request("resolve watch history", move || file.read_document())
            .await?;
        document.ensure_signed_in()?;
        Ok(self.show_id)
    }

    async fn fetch_snapshot(&self, show_id: &i64) -> Result<Vec<EpisodeWatchItem>> {
        let file = &self.file;
        let document = file
            .request("fetch watch history", move || file.read_document())
            .await?;

        Ok(document.watches.get(show_id).cloned().unwrap_or_default())
    }

    async fn push_additions(
        &self,
        show_id: &i64,
        entities: &[EpisodeWatchEntry],
    ) -> Result<Vec<AssignedKey<i64>>> {
        self.file
            .modify("add watches", |document| {
                let mut next_id = document.next_watch_id();
                let mut assigned = Vec::new();
                let history = document.watches.entry(*show_id).or_default();

                for watch in entities {
                    history.push(EpisodeWatchItem {
                        remote_id: next_id,
                        episode_id: watch.episode_id,
                        watched_at: watch.watched_at,
                    });
                    if let Some(local_id) = watch.local_id {
                        assigned.push(AssignedKey {
                            local_id,
                            remote_key: next_id,
                        });
                    }
                    next_id += 1;
                }
                Ok(assigned)
            })
            .await
    }

    async fn push_removals(&self, show_id: &i64, entities: &[EpisodeWatchEntry]) -> Result<()> {
        let removed: HashSet<i64> = entities.iter().filter_map(|e| e.remote_id).collect();

        self.file
            .modify("remove watches", |document| {
                if let Some(history) = document.watches.get_mut(show_id) {
                    history.retain(|w| !removed.contains(&w.remote_id));
                }
                Ok(())
            })
            .await
    }
}
