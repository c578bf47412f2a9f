//! Gist retrieval over the GitHub REST API.

pub mod client;

pub use client::GistClient;
