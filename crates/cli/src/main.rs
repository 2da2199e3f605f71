// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use showsync_config::ConfigManager;
use std::path::PathBuf;

mod commands;
mod remote;

use commands::Session;

fn id_arg(name: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .value_name(value_name)
        .help(help)
        .value_parser(value_parser!(i64))
}

/// A global option, wherever on the command line it was given
fn global_path(matches: &ArgMatches, name: &str) -> Option<PathBuf> {
    matches
        .subcommand()
        .and_then(|(_, sub_matches)| sub_matches.get_one::<PathBuf>(name))
        .or_else(|| matches.get_one::<PathBuf>(name))
        .cloned()
}

fn build_cli() -> Command {
    Command::new("showsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Offline-first tracker for followed shows and watched episodes")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("DIR")
                .help("Configuration directory")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("PATH")
                .help("Path to the database file")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("remote")
                .short('r')
                .long("remote")
                .value_name("FILE")
                .help("JSON file standing in for the tracking service")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(Command::new("init").about("Write the default config and create the database"))
        .subcommand(
            Command::new("follow")
                .about("Follow a show")
                .arg(id_arg("show-id", "SHOW_ID", "Show to follow"))
                .arg(
                    Arg::new("title")
                        .short('t')
                        .long("title")
                        .value_name("TITLE")
                        .help("Show title (optional)"),
                ),
        )
        .subcommand(
            Command::new("unfollow")
                .about("Stop following a show")
                .arg(id_arg("show-id", "SHOW_ID", "Show to unfollow")),
        )
        .subcommand(Command::new("shows").about("List followed shows"))
        .subcommand(
            Command::new("watch")
                .about("Record watching an episode")
                .arg(id_arg("show-id", "SHOW_ID", "Show the episode belongs to"))
                .arg(id_arg("episode-id", "EPISODE_ID", "Episode watched")),
        )
        .subcommand(
            Command::new("unwatch")
                .about("Remove a recorded watch")
                .arg(id_arg("show-id", "SHOW_ID", "Show the watch belongs to"))
                .arg(id_arg("watch-id", "WATCH_ID", "Watch to remove, as listed by 'watches'")),
        )
        .subcommand(
            Command::new("watches")
                .about("List a show's watch history")
                .arg(id_arg("show-id", "SHOW_ID", "Show to list")),
        )
        .subcommand(
            Command::new("sync")
                .about("Sync local changes with the tracking service")
                .arg(
                    Arg::new("show")
                        .short('s')
                        .long("show")
                        .value_name("SHOW_ID")
                        .help("Only sync this show's watch history")
                        .value_parser(value_parser!(i64)),
                )
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .help("Sync groups that are not stale yet")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("status").about("Show when each group last synced"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let manager = match global_path(&matches, "config") {
        Some(dir) => ConfigManager::with_directory(dir),
        None => ConfigManager::new(),
    }
    .context("Failed to locate configuration directory")?;
    let config = manager
        .load_with_env_overrides()
        .context("Failed to load configuration")?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.to_string()),
    )
    .init();

    let session = Session::open(
        manager,
        config,
        global_path(&matches, "database"),
        global_path(&matches, "remote"),
    )
    .await
    .context("Failed to initialize local store")?;

    let result = match matches.subcommand() {
        Some(("init", _)) => commands::init(&session).await,
        Some(("follow", sub_matches)) => commands::follow(&session, sub_matches).await,
        Some(("unfollow", sub_matches)) => commands::unfollow(&session, sub_matches).await,
        Some(("shows", _)) => commands::list_shows(&session).await,
        Some(("watch", sub_matches)) => commands::watch(&session, sub_matches).await,
        Some(("unwatch", sub_matches)) => commands::unwatch(&session, sub_matches).await,
        Some(("watches", sub_matches)) => commands::list_watches(&session, sub_matches).await,
        Some(("sync", sub_matches)) => commands::sync(&session, sub_matches).await,
        Some(("status", _)) => commands::status(&session).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    };

    session.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_parse_sync_options() {
        let matches = build_cli()
            .try_get_matches_from(["showsync", "--remote", "r.json", "sync", "--show", "12", "-f"])
            .unwrap();

        assert_eq!(global_path(&matches, "remote"), Some(PathBuf::from("r.json")));
        let (name, sync) = matches.subcommand().unwrap();
        assert_eq!(name, "sync");
        assert_eq!(sync.get_one::<i64>("show"), Some(&12));
        assert!(sync.get_flag("force"));
    }

    #[test]
    fn test_global_option_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["showsync", "shows", "--database", "shows.db"])
            .unwrap();

        assert_eq!(global_path(&matches, "database"), Some(PathBuf::from("shows.db")));
        assert_eq!(global_path(&matches, "config"), None);
    }

    #[test]
    fn test_ids_must_be_numbers() {
        let result = build_cli().try_get_matches_from(["showsync", "follow", "abc"]);
        assert!(result.is_err());
    }
}
