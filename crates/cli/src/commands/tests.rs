use super::*;
use crate::remote::RemoteDocument;
use showsync_sync_engine::{EpisodeWatchItem, FollowedShowItem};
use tempfile::TempDir;

async fn setup_session(document: Option<RemoteDocument>) -> (Session, TempDir) {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(dir.path().join("config")).unwrap();

    let mut config = Config::default();
    config.remote.max_attempts = 1;

    let remote_path = dir.path().join("remote.json");
    if let Some(document) = document {
        std::fs::write(&remote_path, serde_json::to_string(&document).unwrap()).unwrap();
    }

    let session = Session::open(
        manager,
        config,
        Some(dir.path().join("data").join("showsync.db")),
        Some(remote_path),
    )
    .await
    .unwrap();

    (session, dir)
}

fn signed_in() -> RemoteDocument {
    RemoteDocument {
        signed_in: true,
        followed_list_id: Some(1),
        ..Default::default()
    }
}

fn arg_matches(args: &[&str]) -> ArgMatches {
    let (_, sub_matches) = crate::build_cli()
        .try_get_matches_from(std::iter::once("showsync").chain(args.iter().copied()))
        .unwrap()
        .remove_subcommand()
        .unwrap();
    sub_matches
}

#[tokio::test]
async fn test_open_creates_database_directory() {
    let (session, dir) = setup_session(None).await;

    assert!(dir.path().join("data").join("showsync.db").exists());
    session.close().await;
}

#[tokio::test]
async fn test_configured_remote_path_is_relative_to_config_dir() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();
    let mut config = Config::default();
    config.sync.remote_path = Some(PathBuf::from("remote.json"));

    let session = Session::open(manager, config, None, None).await.unwrap();

    assert_eq!(session.remote.path(), Some(&dir.path().join("remote.json")));
    assert_eq!(session.database_path, dir.path().join("showsync.db"));
    session.close().await;
}

#[tokio::test]
async fn test_follow_then_sync_uploads() {
    let (session, _dir) = setup_session(Some(signed_in())).await;

    follow(&session, &arg_matches(&["follow", "1390", "--title", "Show A"]))
        .await
        .unwrap();
    sync(&session, &arg_matches(&["sync"])).await.unwrap();

    let document = session.remote.read_document().await.unwrap();
    assert_eq!(document.followed.len(), 1);
    assert_eq!(document.followed[0].title, "Show A");

    let current = session.followed_shows().current_items().await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].pending_action, PendingAction::Nothing);
}

#[tokio::test]
async fn test_sync_creates_missing_followed_list() {
    let document = RemoteDocument {
        signed_in: true,
        ..Default::default()
    };
    let (session, _dir) = setup_session(Some(document)).await;

    follow(&session, &arg_matches(&["follow", "12", "--title", "Listless"]))
        .await
        .unwrap();
    sync(&session, &arg_matches(&["sync"])).await.unwrap();

    let document = session.remote.read_document().await.unwrap();
    assert!(document.followed_list_id.is_some());
    assert_eq!(document.followed.len(), 1);
    assert_eq!(document.followed[0].show_id, 12);
}

#[tokio::test]
async fn test_sync_without_remote_runs_offline() {
    let (session, _dir) = setup_session(None).await;

    follow(&session, &arg_matches(&["follow", "7"])).await.unwrap();
    sync(&session, &arg_matches(&["sync"])).await.unwrap();

    let current = session.followed_shows().current_items().await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].title, "Show 7");
}

#[tokio::test]
async fn test_fresh_groups_are_skipped_unless_forced() {
    let (session, _dir) = setup_session(Some(signed_in())).await;
    sync(&session, &arg_matches(&["sync"])).await.unwrap();

    let mut document = signed_in();
    document.followed.push(FollowedShowItem {
        show_id: 5,
        title: "Remote Show".to_string(),
        listed_at: Timestamp::from_millis(1),
    });
    session.remote.write_document(&document).await.unwrap();

    sync(&session, &arg_matches(&["sync"])).await.unwrap();
    assert!(session
        .followed_shows()
        .current_items()
        .await
        .unwrap()
        .is_empty());

    sync(&session, &arg_matches(&["sync", "--force"])).await.unwrap();
    assert_eq!(
        session.followed_shows().current_items().await.unwrap()[0].title,
        "Remote Show"
    );
}

#[tokio::test]
async fn test_sync_single_show_watches() {
    let mut document = signed_in();
    document.watches.insert(
        3,
        vec![EpisodeWatchItem {
            remote_id: 9,
            episode_id: 301,
            watched_at: Timestamp::from_millis(1),
        }],
    );
    let (session, _dir) = setup_session(Some(document)).await;

    sync(&session, &arg_matches(&["sync", "--show", "3"]))
        .await
        .unwrap();

    let watches = session.episode_watches(3);
    assert!(watches.has_been_watched(301).await.unwrap());
    assert!(session
        .followed_shows()
        .needs_sync(Duration::from_secs(60))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_unreadable_remote_degrades_to_offline() {
    let (session, dir) = setup_session(Some(signed_in())).await;
    follow(&session, &arg_matches(&["follow", "1"])).await.unwrap();
    std::fs::write(dir.path().join("remote.json"), "{ broken").unwrap();

    sync(&session, &arg_matches(&["sync", "--force"])).await.unwrap();

    let shows = session.followed_shows();
    assert!(shows.pending_items().await.unwrap().is_empty());
    assert_eq!(shows.current_items().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_watch_and_unwatch() {
    let (session, _dir) = setup_session(None).await;

    watch(&session, &arg_matches(&["watch", "4", "401"]))
        .await
        .unwrap();
    let recorded = session.episode_watches(4).pending_items().await.unwrap();
    assert_eq!(recorded.len(), 1);

    let watch_id = recorded[0].local_id.unwrap().to_string();
    unwatch(&session, &arg_matches(&["unwatch", "4", &watch_id]))
        .await
        .unwrap();

    assert!(!session
        .episode_watches(4)
        .has_been_watched(401)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_known_shows_include_followed_and_watched() {
    let (session, _dir) = setup_session(None).await;

    follow(&session, &arg_matches(&["follow", "2"])).await.unwrap();
    watch(&session, &arg_matches(&["watch", "8", "801"]))
        .await
        .unwrap();
    watch(&session, &arg_matches(&["watch", "2", "201"]))
        .await
        .unwrap();

    assert_eq!(session.known_shows().await.unwrap(), vec![2, 8]);
}

#[tokio::test]
async fn test_listing_and_status_commands() {
    let (session, _dir) = setup_session(None).await;
    follow(&session, &arg_matches(&["follow", "2"])).await.unwrap();

    list_shows(&session).await.unwrap();
    list_watches(&session, &arg_matches(&["watches", "2"]))
        .await
        .unwrap();
    status(&session).await.unwrap();
    unfollow(&session, &arg_matches(&["unfollow", "2"]))
        .await
        .unwrap();
    unfollow(&session, &arg_matches(&["unfollow", "2"]))
        .await
        .unwrap();
}

#[test]
fn test_format_age() {
    let now = Timestamp::from_millis(10_000_000_000);
    let ago = |secs: u64| Some(now.saturating_sub(Duration::from_secs(secs)));

    assert_eq!(format_age(None, now), "never");
    assert_eq!(format_age(ago(30), now), "just now");
    assert_eq!(format_age(ago(5 * 60), now), "5m ago");
    assert_eq!(format_age(ago(3 * 3600), now), "3h ago");
    assert_eq!(format_age(ago(2 * 86_400), now), "2d ago");
    assert_eq!(
        format_age(Some(Timestamp::from_millis(10_000_060_000)), now),
        "just now"
    );
}

#[test]
fn test_pending_marker() {
    assert_eq!(pending_marker(PendingAction::Nothing), "");
    assert_eq!(pending_marker(PendingAction::Upload), " (pending upload)");
    assert_eq!(pending_marker(PendingAction::Delete), " (pending removal)");
}
