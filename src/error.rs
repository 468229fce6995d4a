//! Typed error taxonomy for the ingestion and deletion flows.
//!
//! Decode failures (`UnsupportedImage`) and filesystem failures (`Storage`)
//! are deliberately separate variants; the pipeline never folds one into the
//! other.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    /// The upload failed a pre-write check (extension, MIME, size, name).
    #[error("invalid upload: {reason}")]
    InvalidUpload { reason: String },

    /// A live artifact with the same byte size and content hash already exists.
    #[error("photo already stored (content hash {content_hash})")]
    DuplicateArtifact { content_hash: String },

    /// The bytes passed validation but could not be decoded as an image.
    #[error("file could not be decoded as an image")]
    UnsupportedImage(#[source] image::ImageError),

    /// The record store failed for a reason other than an expected duplicate.
    #[error("record store failure")]
    Persistence(#[source] anyhow::Error),

    /// Filesystem failure while writing or removing artifact files.
    #[error("storage I/O failure")]
    Storage(#[from] std::io::Error),

    /// No live artifact with the given id or stored name.
    #[error("artifact not found: {0}")]
    NotFound(String),
}

impl VaultError {
    /// User-displayable message category for the routing/view layer.
    pub fn user_message(&self) -> &'static str {
        match self {
            VaultError::InvalidUpload { .. } => "The file was rejected; check its type and size.",
            VaultError::DuplicateArtifact { .. } => {
                "This photo has already been uploaded to the server."
            }
            VaultError::UnsupportedImage(_) => "The file does not contain a recognizable image.",
            VaultError::Persistence(_) | VaultError::Storage(_) => {
                "The server could not store the photo; try again later."
            }
            VaultError::NotFound(_) => "The requested photo does not exist.",
        }
    }

    /// True for rejections the user can recover from by changing their input,
    /// false for system faults.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            VaultError::InvalidUpload { .. }
                | VaultError::DuplicateArtifact { .. }
                | VaultError::UnsupportedImage(_)
                | VaultError::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_are_not_user_errors() {
        let err = VaultError::Persistence(anyhow::anyhow!("db gone"));
        assert!(!err.is_user_error());
        let err = VaultError::Storage(std::io::Error::other("disk full"));
        assert!(!err.is_user_error());
    }

    #[test]
    fn rejections_are_user_errors() {
        let err = VaultError::InvalidUpload {
            reason: "extension".into(),
        };
        assert!(err.is_user_error());
        assert!(VaultError::NotFound("7".to_string()).is_user_error());
    }
}
