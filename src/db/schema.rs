pub const SCHEMA: &str = r#"
-- Artifacts table: one row per stored photo
CREATE TABLE IF NOT EXISTS artifacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    stored_name TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    camera_model TEXT NOT NULL DEFAULT '',
    size_bytes INTEGER NOT NULL,
    taken_at TEXT NOT NULL DEFAULT '',
    uploaded_at TEXT NOT NULL,
    content_hash TEXT NOT NULL,

    -- Soft-delete flag; deleted rows stay for bookkeeping but are invisible
    -- to lookups and do not participate in duplicate detection
    deleted INTEGER NOT NULL DEFAULT 0
);

-- Duplicate detection: identical bytes may be stored at most once among live
-- rows. The partial index also backstops concurrent check-then-insert.
CREATE UNIQUE INDEX IF NOT EXISTS idx_artifacts_live_content
    ON artifacts(size_bytes, content_hash) WHERE deleted = 0;

CREATE INDEX IF NOT EXISTS idx_artifacts_deleted ON artifacts(deleted);
"#;
