//! Independently synced collections

use serde::Serialize;
use std::fmt;

/// A named stream of entities that is synced as one unit
///
/// `entity_id` scopes the stream: followed shows are a single group
/// (`entity_id = 0`), episode watches are one group per show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SyncGroup {
    pub name: &'static str,
    pub entity_id: i64,
}

impl SyncGroup {
    pub const FOLLOWED_SHOWS: &'static str = "followed-shows";
    pub const EPISODE_WATCHES: &'static str = "episode-watches";

    pub const fn new(name: &'static str, entity_id: i64) -> Self {
        Self { name, entity_id }
    }

    /// The user's followed shows
    pub const fn followed_shows() -> Self {
        Self::new(Self::FOLLOWED_SHOWS, 0)
    }

    /// Watch history for one show
    pub const fn episode_watches(show_id: i64) -> Self {
        Self::new(Self::EPISODE_WATCHES, show_id)
    }
}

impl fmt::Display for SyncGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entity_id == 0 {
            f.write_str(self.name)
        } else {
            write!(f, "{}/{}", self.name, self.entity_id)
        }
    }
}
