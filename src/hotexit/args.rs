use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hotexit", version)]
#[command(about = "Inspect and manage hot exit backups of unsaved documents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backup home directory (default: $HOTEXIT_HOME or the platform data dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tracked workspaces and whether they have backups
    #[command(alias = "ls")]
    List,

    /// List every backup file of a workspace
    Backups {
        /// Workspace root path
        workspace: String,
    },

    /// List the untitled document backups of a workspace
    Untitled {
        /// Workspace root path
        workspace: String,
    },

    /// Print the backed up content of a document
    Show {
        /// Workspace root path
        workspace: String,

        /// Document, e.g. file:/proj/a.ts or untitled:Untitled-1
        resource: String,
    },

    /// Print where a document's backup lives
    Location {
        /// Workspace root path
        workspace: String,

        /// Document, e.g. file:/proj/a.ts or untitled:Untitled-1
        resource: String,
    },

    /// Track workspaces for backup restoration
    Track {
        /// Workspace root paths
        #[arg(required = true, num_args = 1..)]
        workspaces: Vec<String>,
    },

    /// Stop tracking a workspace (its backups stay on disk)
    Untrack {
        /// Workspace root path
        workspace: String,
    },

    /// Delete all backups of a workspace and stop tracking it
    Discard {
        /// Workspace root path
        workspace: String,
    },

    /// Show or change settings
    Config {
        /// Setting to change (hot-exit)
        key: Option<String>,

        /// New value (on/off)
        value: Option<String>,
    },
}
