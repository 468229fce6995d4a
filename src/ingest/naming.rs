use chrono::Local;
use uuid::Uuid;

/// Produce a stored filename for an upload: a local time component for rough
/// chronological ordering on disk, a UUIDv4 hex token wide enough to treat as
/// globally unique, and the validated extension.
///
/// The caller passes only an extension that already passed the allow-list, so
/// no user-controlled path fragment can reach the storage directories.
pub fn allocate_stored_name(extension: &str) -> String {
    let stamp = Local::now().format("%d_%H%M%S");
    let token = Uuid::new_v4().simple();
    format!("{stamp}_{token}.{extension}")
}
