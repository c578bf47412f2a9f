//! Git operations for gistsync.

pub mod client;

pub use client::GitClient;
