//! photovault: deduplicating photo ingestion and storage.
//!
//! The library ingests raw uploads (display name, bytes, declared MIME,
//! original filename), rejects anything that is not a valid, previously
//! unseen image, stores the original plus a fixed-width thumbnail on disk,
//! and keeps one record per stored photo behind the [`ArtifactRepository`]
//! trait. A routing or view layer sits on top of [`Vault`]; nothing in here
//! knows about HTTP or templates.

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;

pub use config::Config;
pub use db::{Artifact, ArtifactRepository, NewArtifact, RepoError, SqliteRepository};
pub use error::VaultError;
pub use ingest::Vault;
