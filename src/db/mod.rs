pub mod schema;
pub mod sqlite;

use thiserror::Error;

pub use schema::SCHEMA;
pub use sqlite::SqliteRepository;

/// One stored photo: the metadata record backing an original file and its
/// thumbnail, both keyed by `stored_name`.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub id: i64,
    /// System-generated on-disk filename, unique across all artifacts.
    pub stored_name: String,
    /// User-supplied label, 1-100 characters.
    pub display_name: String,
    /// `"Make, Model"` from EXIF, or empty when unavailable.
    pub camera_model: String,
    pub size_bytes: i64,
    /// EXIF original capture timestamp, verbatim; empty when unavailable.
    pub taken_at: String,
    /// Wall-clock ingestion time, `%Y:%m:%d %H:%M:%S`.
    pub uploaded_at: String,
    /// Lowercase hex digest over the full file bytes.
    pub content_hash: String,
    pub deleted: bool,
}

/// Field set for a record about to be inserted; the id is assigned by the
/// repository.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub stored_name: String,
    pub display_name: String,
    pub camera_model: String,
    pub size_bytes: i64,
    pub taken_at: String,
    pub uploaded_at: String,
    pub content_hash: String,
}

#[derive(Debug, Error)]
pub enum RepoError {
    /// A live record with the same (size, hash) pair already exists.
    #[error("a live artifact with identical size and content hash exists")]
    Duplicate,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepoError {
    fn from(e: rusqlite::Error) -> Self {
        RepoError::Backend(e.into())
    }
}

/// Abstract store of artifact records.
///
/// Lookups and `list` are scoped to non-deleted records; re-uploading content
/// whose only prior copy was deleted is allowed. `insert` must enforce
/// uniqueness of (size_bytes, content_hash) among live records and report a
/// violation as [`RepoError::Duplicate`], which closes the race between a
/// duplicate check and a concurrent insert.
pub trait ArtifactRepository: Send + Sync {
    fn find_by_hash_and_size(
        &self,
        content_hash: &str,
        size_bytes: i64,
    ) -> Result<Option<Artifact>, RepoError>;

    fn find_by_id(&self, id: i64) -> Result<Option<Artifact>, RepoError>;

    fn insert(&self, new: NewArtifact) -> Result<Artifact, RepoError>;

    /// Soft-mark a live record deleted. Returns false when no live record
    /// with that id exists, so a concurrent second delete observes not-found
    /// rather than an error.
    fn mark_deleted(&self, id: i64) -> Result<bool, RepoError>;

    fn list(&self) -> Result<Vec<Artifact>, RepoError>;
}
