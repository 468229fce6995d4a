//! The ingestion pipeline and artifact lifecycle.
//!
//! `Vault` drives one upload through validate → hash → duplicate check →
//! write → decode → thumbnail → metadata → persist, and owns both artifact
//! files until the record is committed. Every rejection or failure path
//! removes whatever this attempt wrote; the storage directories are left
//! exactly as they were before the call.

pub mod hashing;
pub mod metadata;
pub mod naming;
pub mod thumbnail;
pub mod validate;

use chrono::Local;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::{Artifact, ArtifactRepository, NewArtifact, RepoError, SqliteRepository};
use crate::error::VaultError;

pub use metadata::CaptureMetadata;
pub use thumbnail::ThumbnailGenerator;
pub use validate::Validator;

/// Record timestamp format, kept stable because it is stored verbatim.
const UPLOAD_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

pub struct Vault {
    originals_dir: PathBuf,
    validator: Validator,
    thumbnails: ThumbnailGenerator,
    repo: Arc<dyn ArtifactRepository>,
}

impl Vault {
    /// Build a vault over an explicit repository. The configuration value is
    /// read once here; no component consults global state afterwards.
    pub fn new(config: &Config, repo: Arc<dyn ArtifactRepository>) -> Self {
        Self {
            originals_dir: config.storage.originals_dir.clone(),
            validator: Validator::new(&config.upload),
            thumbnails: ThumbnailGenerator::new(&config.storage.thumbnails_dir, &config.thumbnails),
            repo,
        }
    }

    /// Open a vault backed by the SQLite repository at the configured path.
    pub fn open(config: &Config) -> Result<Self, VaultError> {
        let repo = SqliteRepository::open(&config.storage.db_path).map_err(persistence)?;
        Ok(Self::new(config, Arc::new(repo)))
    }

    /// Ingest one upload end to end. On success the original and thumbnail
    /// files exist and the returned record is persisted; on any error the
    /// storage directories are unchanged.
    pub fn ingest(
        &self,
        display_name: &str,
        bytes: &[u8],
        declared_mime: &str,
        original_filename: &str,
    ) -> Result<Artifact, VaultError> {
        let extension =
            self.validator
                .check(original_filename, declared_mime, bytes.len() as u64, display_name)?;

        // Hash the in-memory bytes before any disk write, so a duplicate is
        // rejected without ever creating a file to clean up.
        let content_hash = hashing::content_hash(bytes)?;
        let size_bytes = bytes.len() as i64;
        debug!(%content_hash, size_bytes, "upload hashed");

        if let Some(existing) = self
            .repo
            .find_by_hash_and_size(&content_hash, size_bytes)
            .map_err(persistence)?
        {
            info!(
                %content_hash,
                existing_id = existing.id,
                "rejecting duplicate upload"
            );
            return Err(VaultError::DuplicateArtifact { content_hash });
        }

        let stored_name = naming::allocate_stored_name(&extension);
        let original_path = self.originals_dir.join(&stored_name);
        if !self.originals_dir.exists() {
            fs::create_dir_all(&self.originals_dir)?;
        }
        if let Err(e) = fs::write(&original_path, bytes) {
            let _ = fs::remove_file(&original_path);
            return Err(VaultError::Storage(e));
        }

        // Decode the written file; bytes that merely claimed to be an image
        // are rejected here and the just-written original is removed.
        let img = match image::open(&original_path) {
            Ok(img) => img,
            Err(image::ImageError::IoError(io)) => {
                let _ = fs::remove_file(&original_path);
                return Err(VaultError::Storage(io));
            }
            Err(e) => {
                let _ = fs::remove_file(&original_path);
                info!(original_filename, "rejecting undecodable upload");
                return Err(VaultError::UnsupportedImage(e));
            }
        };

        let thumbnail_path = match self.thumbnails.generate(&img, &stored_name) {
            Ok(path) => path,
            Err(e) => {
                let _ = fs::remove_file(&original_path);
                return Err(e);
            }
        };

        // Never fails; absent or corrupt tags come back as empty strings.
        let capture = metadata::extract_capture_metadata(bytes);

        let record = NewArtifact {
            stored_name: stored_name.clone(),
            display_name: display_name.trim().to_string(),
            camera_model: capture.camera_model,
            size_bytes,
            taken_at: capture.taken_at,
            uploaded_at: Local::now().format(UPLOAD_TIME_FORMAT).to_string(),
            content_hash: content_hash.clone(),
        };

        match self.repo.insert(record) {
            Ok(artifact) => {
                info!(id = artifact.id, %stored_name, %content_hash, "photo ingested");
                Ok(artifact)
            }
            Err(e) => {
                // Both files belong to this attempt; restore the no-orphan
                // invariant before surfacing the error.
                let _ = fs::remove_file(&original_path);
                let _ = fs::remove_file(&thumbnail_path);
                match e {
                    RepoError::Duplicate => {
                        info!(%content_hash, "concurrent duplicate detected at insert");
                        Err(VaultError::DuplicateArtifact { content_hash })
                    }
                    RepoError::Backend(err) => Err(VaultError::Persistence(err)),
                }
            }
        }
    }

    /// Delete an artifact: best-effort removal of both files, then soft-mark
    /// the record. A file that is already gone logs a warning and does not
    /// block the record removal; a file whose removal genuinely fails does.
    pub fn delete(&self, id: i64) -> Result<(), VaultError> {
        let artifact = self
            .repo
            .find_by_id(id)
            .map_err(persistence)?
            .ok_or_else(|| VaultError::NotFound(id.to_string()))?;

        remove_artifact_file(&self.originals_dir.join(&artifact.stored_name), "original")?;
        remove_artifact_file(
            &self.thumbnails.dir().join(&artifact.stored_name),
            "thumbnail",
        )?;

        // Record removal last; a concurrent delete of the same id loses the
        // race here and observes not-found.
        if !self.repo.mark_deleted(id).map_err(persistence)? {
            return Err(VaultError::NotFound(id.to_string()));
        }
        info!(id, stored_name = %artifact.stored_name, "photo deleted");
        Ok(())
    }

    /// Non-deleted artifacts, stable within one call.
    pub fn list(&self) -> Result<Vec<Artifact>, VaultError> {
        self.repo.list().map_err(persistence)
    }

    pub fn open_original(&self, stored_name: &str) -> Result<File, VaultError> {
        open_stored(&self.originals_dir, stored_name)
    }

    pub fn open_thumbnail(&self, stored_name: &str) -> Result<File, VaultError> {
        open_stored(self.thumbnails.dir(), stored_name)
    }
}

fn persistence(e: RepoError) -> VaultError {
    VaultError::Persistence(anyhow::Error::new(e))
}

fn remove_artifact_file(path: &Path, role: &str) -> Result<(), VaultError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "{role} file already missing during delete");
            Ok(())
        }
        Err(e) => Err(VaultError::Storage(e)),
    }
}

fn open_stored(dir: &Path, stored_name: &str) -> Result<File, VaultError> {
    // Stored names are flat; anything path-like never reaches the filesystem.
    if stored_name.is_empty()
        || stored_name.contains(['/', '\\'])
        || stored_name.contains("..")
    {
        return Err(VaultError::NotFound(stored_name.to_string()));
    }
    match File::open(dir.join(stored_name)) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(VaultError::NotFound(stored_name.to_string()))
        }
        Err(e) => Err(VaultError::Storage(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StorageConfig, ThumbnailConfig, UploadConfig};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        Config {
            log_dir: dir.path().join("logs"),
            storage: StorageConfig {
                originals_dir: dir.path().join("photos"),
                thumbnails_dir: dir.path().join("photos_thumbnails"),
                db_path: dir.path().join("vault.db"),
            },
            upload: UploadConfig::default(),
            thumbnails: ThumbnailConfig::default(),
        }
    }

    fn test_vault() -> (TempDir, Vault) {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let vault = Vault::open(&config).unwrap();
        (dir, vault)
    }

    fn png_bytes(width: u32, height: u32, seed: u8) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([seed, (x % 256) as u8, (y % 256) as u8])
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn file_count(dir: &Path) -> usize {
        match fs::read_dir(dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[test]
    fn ingest_persists_record_and_both_files() {
        let (dir, vault) = test_vault();
        let bytes = png_bytes(120, 240, 1);

        let artifact = vault
            .ingest("Holiday", &bytes, "image/png", "photo.png")
            .unwrap();

        assert_eq!(artifact.display_name, "Holiday");
        assert_eq!(artifact.size_bytes, bytes.len() as i64);
        assert_eq!(artifact.camera_model, "");
        assert_eq!(artifact.taken_at, "");
        assert!(artifact.stored_name.ends_with(".png"));

        let original = dir.path().join("photos").join(&artifact.stored_name);
        let thumb = dir
            .path()
            .join("photos_thumbnails")
            .join(&artifact.stored_name);
        assert!(original.exists());
        assert!(thumb.exists());

        let thumb_img = image::open(&thumb).unwrap();
        assert_eq!(thumb_img.width(), 80);
        assert_eq!(thumb_img.height(), 160);
    }

    #[test]
    fn identical_bytes_are_rejected_as_duplicate() {
        let (dir, vault) = test_vault();
        let bytes = png_bytes(64, 64, 2);

        vault
            .ingest("First", &bytes, "image/png", "a.png")
            .unwrap();
        let err = vault
            .ingest("Second", &bytes, "image/png", "b.png")
            .unwrap_err();

        assert!(matches!(err, VaultError::DuplicateArtifact { .. }));
        assert_eq!(vault.list().unwrap().len(), 1);
        assert_eq!(file_count(&dir.path().join("photos")), 1);
        assert_eq!(file_count(&dir.path().join("photos_thumbnails")), 1);
    }

    #[test]
    fn invalid_upload_is_rejected_before_any_write() {
        let (dir, vault) = test_vault();

        let err = vault
            .ingest("Note", b"plain text", "text/plain", "note.jpg")
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidUpload { .. }));

        let err = vault
            .ingest("Note", b"plain text", "image/png", "note.txt")
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidUpload { .. }));

        assert_eq!(file_count(&dir.path().join("photos")), 0);
        assert_eq!(file_count(&dir.path().join("photos_thumbnails")), 0);
    }

    #[test]
    fn undecodable_bytes_leave_no_orphan_file() {
        let (dir, vault) = test_vault();

        let err = vault
            .ingest("Broken", b"\xff\xd8 not really a jpeg", "image/jpeg", "x.jpg")
            .unwrap_err();
        assert!(matches!(err, VaultError::UnsupportedImage(_)));

        assert_eq!(file_count(&dir.path().join("photos")), 0);
        assert_eq!(file_count(&dir.path().join("photos_thumbnails")), 0);
        assert!(vault.list().unwrap().is_empty());
    }

    #[test]
    fn oversize_upload_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.upload.max_upload_bytes = 16;
        let vault = Vault::open(&config).unwrap();

        let err = vault
            .ingest("Big", &png_bytes(32, 32, 3), "image/png", "big.png")
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidUpload { .. }));
    }

    #[test]
    fn persistence_failure_cleans_up_both_files() {
        struct OfflineRepo;
        impl ArtifactRepository for OfflineRepo {
            fn find_by_hash_and_size(
                &self,
                _: &str,
                _: i64,
            ) -> Result<Option<Artifact>, RepoError> {
                Ok(None)
            }
            fn find_by_id(&self, _: i64) -> Result<Option<Artifact>, RepoError> {
                Ok(None)
            }
            fn insert(&self, _: NewArtifact) -> Result<Artifact, RepoError> {
                Err(RepoError::Backend(anyhow::anyhow!("record store offline")))
            }
            fn mark_deleted(&self, _: i64) -> Result<bool, RepoError> {
                Ok(false)
            }
            fn list(&self) -> Result<Vec<Artifact>, RepoError> {
                Ok(Vec::new())
            }
        }

        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let vault = Vault::new(&config, Arc::new(OfflineRepo));

        let err = vault
            .ingest("Doomed", &png_bytes(40, 40, 4), "image/png", "d.png")
            .unwrap_err();
        assert!(matches!(err, VaultError::Persistence(_)));

        assert_eq!(file_count(&dir.path().join("photos")), 0);
        assert_eq!(file_count(&dir.path().join("photos_thumbnails")), 0);
    }

    #[test]
    fn delete_removes_files_and_hides_record() {
        let (dir, vault) = test_vault();
        let artifact = vault
            .ingest("Gone soon", &png_bytes(50, 50, 5), "image/png", "g.png")
            .unwrap();

        vault.delete(artifact.id).unwrap();

        assert!(vault.list().unwrap().is_empty());
        assert_eq!(file_count(&dir.path().join("photos")), 0);
        assert_eq!(file_count(&dir.path().join("photos_thumbnails")), 0);

        // Second delete of the same id observes not-found
        let err = vault.delete(artifact.id).unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[test]
    fn delete_of_unknown_id_is_not_found_and_changes_nothing() {
        let (dir, vault) = test_vault();
        vault
            .ingest("Keeper", &png_bytes(30, 30, 6), "image/png", "k.png")
            .unwrap();

        let err = vault.delete(9999).unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
        assert_eq!(vault.list().unwrap().len(), 1);
        assert_eq!(file_count(&dir.path().join("photos")), 1);
    }

    #[test]
    fn delete_succeeds_when_thumbnail_was_removed_out_of_band() {
        let (dir, vault) = test_vault();
        let artifact = vault
            .ingest("Halfway", &png_bytes(60, 60, 7), "image/png", "h.png")
            .unwrap();

        fs::remove_file(
            dir.path()
                .join("photos_thumbnails")
                .join(&artifact.stored_name),
        )
        .unwrap();

        vault.delete(artifact.id).unwrap();
        assert!(vault.list().unwrap().is_empty());
    }

    #[test]
    fn reupload_after_delete_is_allowed() {
        let (_dir, vault) = test_vault();
        let bytes = png_bytes(48, 48, 8);

        let first = vault
            .ingest("Original", &bytes, "image/png", "o.png")
            .unwrap();
        vault.delete(first.id).unwrap();

        let second = vault
            .ingest("Again", &bytes, "image/png", "o.png")
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_ne!(first.stored_name, second.stored_name);
    }

    #[test]
    fn open_original_and_thumbnail_by_stored_name() {
        let (_dir, vault) = test_vault();
        let artifact = vault
            .ingest("Served", &png_bytes(20, 20, 9), "image/png", "s.png")
            .unwrap();

        assert!(vault.open_original(&artifact.stored_name).is_ok());
        assert!(vault.open_thumbnail(&artifact.stored_name).is_ok());

        let err = vault.open_original("no_such_file.png").unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[test]
    fn open_rejects_path_like_stored_names() {
        let (_dir, vault) = test_vault();
        for name in ["../secret.png", "a/b.png", "..", ""] {
            let err = vault.open_original(name).unwrap_err();
            assert!(matches!(err, VaultError::NotFound(_)), "name {name:?}");
        }
    }
}
