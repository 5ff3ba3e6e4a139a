use chrono::{DateTime, Utc};
use colored::Colorize;
use hotexit::api::WorkspaceStatus;
use hotexit::model::BackupEntry;
use std::path::PathBuf;
use timeago::Formatter;

const HASH_WIDTH: usize = 12;

pub(super) fn print_success(message: &str) {
    println!("{}", message.green());
}

pub(super) fn print_statuses(statuses: &[WorkspaceStatus]) {
    if statuses.is_empty() {
        println!("{}", "No tracked workspaces.".dimmed());
        return;
    }

    for status in statuses {
        let marker = if status.has_backup {
            format!("{} backup(s)", status.backup_count).yellow()
        } else {
            "clean".dimmed()
        };
        println!("{}  {}", status.path.bold(), marker);
    }
}

pub(super) fn print_backups(backups: &[BackupEntry]) {
    if backups.is_empty() {
        println!("{}", "No backups.".dimmed());
        return;
    }

    for backup in backups {
        println!(
            "{:<9} {:<width$} {:>8}  {}",
            backup.scheme.to_string().cyan(),
            shorten(&backup.name),
            format!("{}B", backup.size),
            format_time_ago(backup.modified).dimmed(),
            width = HASH_WIDTH + 1,
        );
    }
}

pub(super) fn print_paths(paths: &[PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}

/// Hash names are 40 chars; the prefix is enough to tell them apart.
fn shorten(name: &str) -> String {
    let is_hash = name.len() == 40 && name.chars().all(|c| c.is_ascii_hexdigit());
    if is_hash {
        format!("{}…", &name[..HASH_WIDTH])
    } else {
        name.to_string()
    }
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    Formatter::new().convert(duration.to_std().unwrap_or_default())
}
