// FILE: crates/cli/src/commands.rs

use crate::remote::{EpisodeWatchesRemote, FileRemote, FollowedShowsRemote};
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use showsync_config::{Config, ConfigManager};
use showsync_core::{EpisodeWatchEntry, FollowedShowEntry, LocalId, PendingAction, Timestamp};
use showsync_database::{
    connect, queries::episode_watches::shows_with_watches, run_migrations, DatabaseConfig, DbPool,
};
use showsync_sync_engine::{
    EpisodeWatchesRepository, FollowedShowsRepository, LocalStore, RemoteDataSource,
    SyncOrchestrator,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Everything a command needs: configuration, the local store and the remote
pub struct Session {
    pub manager: ConfigManager,
    pub config: Config,
    pub database_path: PathBuf,
    pub pool: DbPool,
    pub remote: FileRemote,
}

impl Session {
    /// Opens (and migrates) the database and points at the remote file
    ///
    /// Explicit paths win over the configured ones; relative configured paths
    /// resolve against the config directory.
    pub async fn open(
        manager: ConfigManager,
        config: Config,
        database: Option<PathBuf>,
        remote: Option<PathBuf>,
    ) -> Result<Self> {
        let database_path = database.unwrap_or_else(|| manager.database_path(&config));
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory {}", parent.display())
                })?;
            }
        }

        let pool = connect(DatabaseConfig::new(database_path.to_string_lossy()))
            .await
            .context("Failed to connect to database")?;
        run_migrations(&pool)
            .await
            .context("Failed to apply database migrations")?;

        let remote_path = remote.or_else(|| {
            config.sync.remote_path.as_ref().map(|path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    manager.config_dir().join(path)
                }
            })
        });
        let remote = FileRemote::new(remote_path, &config.remote);

        Ok(Self {
            manager,
            config,
            database_path,
            pool,
            remote,
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    pub fn followed_shows(&self) -> FollowedShowsRepository<FollowedShowsRemote> {
        FollowedShowsRepository::new(self.pool.clone(), self.remote.followed_shows())
    }

    pub fn episode_watches(&self, show_id: i64) -> EpisodeWatchesRepository<EpisodeWatchesRemote> {
        EpisodeWatchesRepository::new(
            self.pool.clone(),
            show_id,
            self.remote.episode_watches(show_id),
        )
    }

    /// Shows with a watch history group: followed ones and any with local watches
    pub async fn known_shows(&self) -> Result<Vec<i64>> {
        let shows = self.followed_shows();
        let mut ids: BTreeSet<i64> = shows
            .current_items()
            .await?
            .into_iter()
            .chain(shows.pending_items().await?)
            .map(|entry| entry.show_id)
            .collect();

        ids.extend(
            shows_with_watches(&self.pool)
                .await
                .context("Failed to list watched shows")?,
        );
        Ok(ids.into_iter().collect())
    }
}

/// Writes the default config file if needed
pub async fn init(session: &Session) -> Result<()> {
    let created = session
        .manager
        .initialize()
        .context("Failed to write default configuration")?;

    if created {
        println!(
            "{} Config written to {}",
            style("✓").green().bold(),
            session.manager.config_path().display()
        );
    } else {
        println!("Config already present at {}", session.manager.config_path().display());
    }
    println!(
        "{} Database ready at {} (schema version {})",
        style("✓").green().bold(),
        session.database_path.display(),
        showsync_database::current_version()
    );

    Ok(())
}

pub async fn follow(session: &Session, matches: &ArgMatches) -> Result<()> {
    let show_id = required_id(matches, "show-id")?;
    let title = matches
        .get_one::<String>("title")
        .cloned()
        .unwrap_or_else(|| format!("Show {}", show_id));

    session
        .followed_shows()
        .mark_added(show_id, &title)
        .await
        .context("Failed to follow show")?;

    println!(
        "{} Following {} ({})",
        style("✓").green().bold(),
        style(&title).bold(),
        show_id
    );
    Ok(())
}

pub async fn unfollow(session: &Session, matches: &ArgMatches) -> Result<()> {
    let show_id = required_id(matches, "show-id")?;
    let shows = session.followed_shows();

    if !shows.is_followed(show_id).await? {
        println!("Show {} is not followed", show_id);
        return Ok(());
    }

    shows
        .mark_removed(show_id)
        .await
        .context("Failed to unfollow show")?;
    println!("{} Unfollowed show {}", style("✓").green().bold(), show_id);
    Ok(())
}

pub async fn list_shows(session: &Session) -> Result<()> {
    let shows = session.followed_shows();
    let mut entries = shows.current_items().await?;
    entries.extend(shows.pending_items().await?);

    if entries.is_empty() {
        println!("No followed shows. Use 'follow' to add one.");
        return Ok(());
    }

    println!("\n{} Followed Shows", style(entries.len()).bold().cyan());
    println!("{}", "=".repeat(60));
    for entry in &entries {
        print_show(entry);
    }

    Ok(())
}

pub async fn watch(session: &Session, matches: &ArgMatches) -> Result<()> {
    let show_id = required_id(matches, "show-id")?;
    let episode_id = required_id(matches, "episode-id")?;

    let watch = session
        .episode_watches(show_id)
        .mark_added(episode_id, Timestamp::now())
        .await
        .context("Failed to record watch")?;

    let watch_id = watch
        .local_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "?".to_string());
    println!(
        "{} Watched episode {} of show {} (watch {})",
        style("✓").green().bold(),
        episode_id,
        show_id,
        watch_id
    );
    Ok(())
}

pub async fn unwatch(session: &Session, matches: &ArgMatches) -> Result<()> {
    let show_id = required_id(matches, "show-id")?;
    let watch_id = required_id(matches, "watch-id")?;

    session
        .episode_watches(show_id)
        .mark_removed(LocalId::new(watch_id))
        .await
        .context("Failed to remove watch")?;

    println!("{} Removed watch {}", style("✓").green().bold(), watch_id);
    Ok(())
}

pub async fn list_watches(session: &Session, matches: &ArgMatches) -> Result<()> {
    let show_id = required_id(matches, "show-id")?;
    let watches = session.episode_watches(show_id);
    let mut entries = watches.current_items().await?;
    entries.extend(watches.pending_items().await?);

    if entries.is_empty() {
        println!("No watches recorded for show {}", show_id);
        return Ok(());
    }

    println!(
        "\n{} Watches of show {}",
        style(entries.len()).bold().cyan(),
        show_id
    );
    println!("{}", "=".repeat(60));
    for entry in &entries {
        print_watch(entry);
    }

    Ok(())
}

/// Syncs every group, or one show's watches with `--show`
///
/// Groups synced more recently than their expiry are skipped unless
/// `--force` is given. A failing group does not stop the others.
pub async fn sync(session: &Session, matches: &ArgMatches) -> Result<()> {
    let force = matches.get_flag("force");
    let watches_expiry = session.config.sync.episode_watches_expiry();
    let mut failed = 0;

    match matches.get_one::<i64>("show").copied() {
        Some(show_id) => {
            let watches = session.episode_watches(show_id);
            if !sync_group(watches.orchestrator(), watches_expiry, force).await? {
                failed += 1;
            }
        }
        None => {
            let shows = session.followed_shows();
            let shows_expiry = session.config.sync.followed_shows_expiry();
            if !sync_group(shows.orchestrator(), shows_expiry, force).await? {
                failed += 1;
            }

            for show_id in session.known_shows().await? {
                let watches = session.episode_watches(show_id);
                if !sync_group(watches.orchestrator(), watches_expiry, force).await? {
                    failed += 1;
                }
            }
        }
    }

    if failed > 0 {
        bail!("{} sync group(s) failed", failed);
    }
    Ok(())
}

/// Returns false if the group was due but its sync failed
async fn sync_group<S, R>(
    orchestrator: &SyncOrchestrator<S, R>,
    expiry: Duration,
    force: bool,
) -> Result<bool>
where
    S: LocalStore,
    R: RemoteDataSource<Entity = S::Entity>,
{
    let group = orchestrator.group();
    if !force && !orchestrator.needs_sync(expiry).await? {
        println!("{} {} is up to date", style("-").dim(), group);
        return Ok(true);
    }

    match orchestrator.sync().await {
        Ok(result) => {
            println!("{} {}: {}", style("✓").green().bold(), group, result);
            Ok(true)
        }
        Err(e) => {
            log::error!("Sync of {} failed: {}", group, e);
            println!("{} {}: {}", style("✗").red().bold(), group, e.user_message());
            Ok(false)
        }
    }
}

pub async fn status(session: &Session) -> Result<()> {
    println!("\n{}", style("Sync Status").bold().cyan());
    println!("{}", "=".repeat(60));
    println!("Database: {}", session.database_path.display());
    match session.remote.path() {
        Some(path) => println!("Remote:   {}", path.display()),
        None => println!("Remote:   {}", style("not configured (offline)").yellow()),
    }
    println!();

    let shows = session.followed_shows();
    print_group_status(
        shows.orchestrator(),
        session.config.sync.followed_shows_expiry(),
    )
    .await?;

    for show_id in session.known_shows().await? {
        let watches = session.episode_watches(show_id);
        print_group_status(
            watches.orchestrator(),
            session.config.sync.episode_watches_expiry(),
        )
        .await?;
    }

    Ok(())
}

async fn print_group_status<S, R>(
    orchestrator: &SyncOrchestrator<S, R>,
    expiry: Duration,
) -> Result<()>
where
    S: LocalStore,
    R: RemoteDataSource<Entity = S::Entity>,
{
    let last_synced = orchestrator.last_synced().await?;
    let stale = orchestrator.needs_sync(expiry).await?;
    let active = orchestrator.current_items().await?.len();
    let pending = orchestrator.pending_items().await?.len();

    let state = if stale {
        style("stale").yellow()
    } else {
        style("fresh").green()
    };
    println!(
        "{:<24} {:<6} synced {:<10} {} active, {} pending",
        orchestrator.group().to_string(),
        state,
        format_age(last_synced, Timestamp::now()),
        active,
        pending
    );
    Ok(())
}

fn required_id(matches: &ArgMatches, name: &str) -> Result<i64> {
    matches
        .get_one::<i64>(name)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("{} is required", name))
}

fn print_show(entry: &FollowedShowEntry) {
    println!(
        "{:>8}  {}{}",
        entry.show_id,
        style(&entry.title).bold(),
        pending_marker(entry.pending_action)
    );
}

fn print_watch(entry: &EpisodeWatchEntry) {
    let watch_id = entry
        .local_id
        .map(|id| id.to_string())
        .unwrap_or_default();
    println!(
        "{:>6}  episode {:<8} at {}{}",
        watch_id,
        entry.episode_id,
        entry.watched_at.as_seconds(),
        pending_marker(entry.pending_action)
    );
}

fn pending_marker(action: PendingAction) -> &'static str {
    match action {
        PendingAction::Nothing => "",
        PendingAction::Upload => " (pending upload)",
        PendingAction::Delete => " (pending removal)",
    }
}

/// Coarse "time ago" for a last-sync timestamp
fn format_age(last: Option<Timestamp>, now: Timestamp) -> String {
    let Some(last) = last else {
        return "never".to_string();
    };

    match now.duration_since(last).map(|d| d.as_secs()) {
        None => "just now".to_string(),
        Some(secs) if secs < 60 => "just now".to_string(),
        Some(secs) if secs < 3600 => format!("{}m ago", secs / 60),
        Some(secs) if secs < 86_400 => format!("{}h ago", secs / 3600),
        Some(secs) => format!("{}d ago", secs / 86_400),
    }
}

#[cfg(test)]
mod tests;
