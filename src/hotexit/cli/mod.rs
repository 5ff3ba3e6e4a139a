//! Command handlers for the `hotexit` binary. The only place that prints.

mod print;

use crate::args::{Cli, Commands};
use hotexit::api::HotExitApi;
use hotexit::config::{HotExitConfig, SharedSettings};
use hotexit::error::{HotExitError, Result};
use hotexit::model::Resource;
use hotexit::paths::BackupPaths;
use print::{print_backups, print_paths, print_statuses, print_success};
use std::path::PathBuf;

pub async fn run(cli: Cli) -> Result<()> {
    let mut api = init_api(cli.home)?;

    match cli.command {
        Some(Commands::List) | None => handle_list(&api),
        Some(Commands::Backups { workspace }) => handle_backups(&api, &workspace),
        Some(Commands::Untitled { workspace }) => handle_untitled(&api, &workspace),
        Some(Commands::Show {
            workspace,
            resource,
        }) => handle_show(&api, &workspace, &resource).await,
        Some(Commands::Location {
            workspace,
            resource,
        }) => handle_location(&api, &workspace, &resource),
        Some(Commands::Track { workspaces }) => handle_track(&mut api, &workspaces),
        Some(Commands::Untrack { workspace }) => handle_untrack(&mut api, &workspace),
        Some(Commands::Discard { workspace }) => handle_discard(&mut api, &workspace).await,
        Some(Commands::Config { key, value }) => handle_config(&api, key, value),
    }
}

/// `--home` wins; otherwise a `backup_home` in settings moves the backups.
fn init_api(home: Option<PathBuf>) -> Result<HotExitApi> {
    let explicit_home = home.is_some();
    let paths = BackupPaths::resolve(home)?;
    let config = HotExitConfig::load(&paths.config_dir)?;

    let paths = match (&config.backup_home, explicit_home) {
        (Some(configured), false) => paths.with_backup_home(configured),
        _ => paths,
    };
    Ok(HotExitApi::new(paths, SharedSettings::new(config)))
}

fn handle_list(api: &HotExitApi) -> Result<()> {
    print_statuses(&api.workspace_statuses());
    Ok(())
}

fn handle_backups(api: &HotExitApi, workspace: &str) -> Result<()> {
    print_backups(&api.workspace_backups(workspace));
    Ok(())
}

fn handle_untitled(api: &HotExitApi, workspace: &str) -> Result<()> {
    print_paths(&api.untitled_backups(workspace));
    Ok(())
}

async fn handle_show(api: &HotExitApi, workspace: &str, resource: &str) -> Result<()> {
    let resource: Resource = resource.parse()?;
    match api.read_backup(workspace, &resource).await? {
        Some(content) => {
            print!("{}", content);
            Ok(())
        }
        None => Err(HotExitError::Api(format!("No backup for {}", resource))),
    }
}

fn handle_location(api: &HotExitApi, workspace: &str, resource: &str) -> Result<()> {
    let resource: Resource = resource.parse()?;
    let location = api
        .backup_location(Some(workspace), &resource)
        .ok_or_else(|| HotExitError::Api(format!("{} cannot be backed up", resource)))?;
    println!("{}", location.display());
    Ok(())
}

fn handle_track(api: &mut HotExitApi, workspaces: &[String]) -> Result<()> {
    api.track_workspaces(workspaces);
    for workspace in workspaces.iter().filter(|w| !w.is_empty()) {
        print_success(&format!("Tracking {}", workspace));
    }
    Ok(())
}

fn handle_untrack(api: &mut HotExitApi, workspace: &str) -> Result<()> {
    api.untrack_workspace(workspace);
    print_success(&format!("No longer tracking {}", workspace));
    Ok(())
}

async fn handle_discard(api: &mut HotExitApi, workspace: &str) -> Result<()> {
    let count = api.workspace_backups(workspace).len();
    api.discard_workspace(workspace).await?;
    print_success(&format!("Discarded {} backup(s) of {}", count, workspace));
    Ok(())
}

fn handle_config(api: &HotExitApi, key: Option<String>, value: Option<String>) -> Result<()> {
    match (key.as_deref(), value.as_deref()) {
        (None, _) => {
            let config = api.settings().snapshot();
            println!("hot-exit={}", if config.hot_exit { "on" } else { "off" });
            println!("backup-home={}", api.paths().backup_home.display());
            Ok(())
        }
        (Some("hot-exit"), None) => {
            let enabled = api.settings().snapshot().hot_exit;
            println!("{}", if enabled { "on" } else { "off" });
            Ok(())
        }
        (Some("hot-exit"), Some(value)) => {
            let enabled = parse_switch(value)?;
            api.set_hot_exit(enabled)?;
            print_success(&format!("hot-exit set to {}", value));
            Ok(())
        }
        (Some(other), _) => Err(HotExitError::Api(format!("Unknown setting '{}'", other))),
    }
}

fn parse_switch(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(HotExitError::Api(format!(
            "Expected on or off, got '{}'",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_switch() {
        assert!(parse_switch("on").unwrap());
        assert!(parse_switch("TRUE").unwrap());
        assert!(!parse_switch("off").unwrap());
        assert!(!parse_switch("0").unwrap());
        assert!(parse_switch("maybe").is_err());
    }
}
