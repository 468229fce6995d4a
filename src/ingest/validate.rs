use std::path::Path;

use crate::config::UploadConfig;
use crate::error::VaultError;

/// Pre-write upload checks. Purely computational; the first violated check
/// wins and nothing touches the filesystem or the record store.
pub struct Validator {
    allowed_extensions: Vec<String>,
    max_upload_bytes: u64,
}

impl Validator {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Check extension allow-list, declared MIME prefix, size ceiling and
    /// display-name bounds, in that order. Returns the lowercased extension
    /// for the name allocator on success.
    pub fn check(
        &self,
        original_filename: &str,
        declared_mime: &str,
        byte_len: u64,
        display_name: &str,
    ) -> Result<String, VaultError> {
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if extension.is_empty() || !self.allowed_extensions.contains(&extension) {
            return Err(invalid(format!(
                "unsupported file extension; allowed: {}",
                self.allowed_extensions.join(", ")
            )));
        }

        if !declared_mime.starts_with("image") {
            return Err(invalid(format!(
                "declared MIME type {declared_mime:?} is not an image type"
            )));
        }

        if byte_len > self.max_upload_bytes {
            return Err(invalid(format!(
                "file is {byte_len} bytes, exceeding the {} byte limit",
                self.max_upload_bytes
            )));
        }

        let name_chars = display_name.chars().count();
        if name_chars == 0 || name_chars > 100 {
            return Err(invalid(
                "display name must be between 1 and 100 characters".to_string(),
            ));
        }

        Ok(extension)
    }
}

fn invalid(reason: String) -> VaultError {
    VaultError::InvalidUpload { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::new(&UploadConfig::default())
    }

    #[test]
    fn accepts_allow_listed_extension_case_insensitively() {
        let v = validator();
        assert_eq!(v.check("photo.PNG", "image/png", 10, "A").unwrap(), "png");
        assert_eq!(v.check("p.JpEg", "image/jpeg", 10, "A").unwrap(), "jpeg");
    }

    #[test]
    fn rejects_unknown_or_missing_extension() {
        let v = validator();
        assert!(v.check("notes.txt", "image/png", 10, "A").is_err());
        assert!(v.check("no_extension", "image/png", 10, "A").is_err());
    }

    #[test]
    fn rejects_non_image_mime() {
        let v = validator();
        let err = v.check("note.jpg", "text/plain", 10, "A").unwrap_err();
        assert!(matches!(err, VaultError::InvalidUpload { .. }));
    }

    #[test]
    fn rejects_oversize_payload() {
        let v = Validator::new(&UploadConfig {
            max_upload_bytes: 100,
            ..UploadConfig::default()
        });
        assert!(v.check("a.png", "image/png", 100, "A").is_ok());
        assert!(v.check("a.png", "image/png", 101, "A").is_err());
    }

    #[test]
    fn rejects_out_of_bounds_display_name() {
        let v = validator();
        assert!(v.check("a.png", "image/png", 10, "").is_err());
        assert!(v.check("a.png", "image/png", 10, &"x".repeat(101)).is_err());
        assert!(v.check("a.png", "image/png", 10, &"x".repeat(100)).is_ok());
    }

    #[test]
    fn extension_check_runs_before_mime_check() {
        let v = validator();
        let err = v.check("note.txt", "text/plain", 10, "A").unwrap_err();
        let VaultError::InvalidUpload { reason } = err else {
            panic!("expected InvalidUpload");
        };
        assert!(reason.contains("extension"));
    }
}
