//! # Hot Exit
//!
//! Hot exit keeps unsaved work alive across an application exit or crash.
//! While a document is dirty, its current content is mirrored into a backup
//! file. On the next launch, workspaces that still have backups are offered
//! for restoration.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Inspects and manages backups from a terminal             │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Workspace open / close / restore                         │
//! │  - Returns structured Result types                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────┐  ┌───────────────────────────┐
//! │  Orchestrator                │  │  Registry (registry.rs)   │
//! │  (orchestrator.rs)           │  │  - workspaces.json        │
//! │  - Document events → backup  │  │  - Synchronous, main      │
//! │    actions                   │  │    process only           │
//! └──────────────────────────────┘  └───────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - BackupStore trait, per-path ordered I/O                  │
//! │  - FsBackupStore (production), InMemoryBackupStore (tests)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! From `api.rs` inward nothing prints and nothing exits. Diagnostics go
//! through `tracing`; the binary decides where they end up.
//!
//! ## Module Overview
//!
//! - [`api`]: Facade for workspace lifecycle and backup queries
//! - [`orchestrator`]: Turns document events into writes and discards
//! - [`events`]: Document event types and subscriptions
//! - [`store`]: Backup locations, the store trait and its implementations
//! - [`registry`]: The tracked workspace list
//! - [`paths`]: On-disk layout of the backup home
//! - [`config`]: The hot exit setting
//! - [`model`]: Resources, the registry format and backup listings
//! - [`hash`]: Path hashing for backup names
//! - [`error`]: Error types
//! - `cli`: Argument parsing and printing for the binary (not part of the lib API)

pub mod api;
mod atomic;
pub mod config;
pub mod error;
pub mod events;
pub mod hash;
pub mod model;
pub mod orchestrator;
pub mod paths;
pub mod registry;
pub mod store;
