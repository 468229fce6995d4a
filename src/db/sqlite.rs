//! SQLite-backed artifact repository.

use anyhow::anyhow;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::schema::SCHEMA;
use super::{Artifact, ArtifactRepository, NewArtifact, RepoError};

pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn open(path: &Path) -> Result<Self, RepoError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RepoError::Backend(e.into()))?;
        }
        let conn = Connection::open(path)?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<(), RepoError> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RepoError> {
        self.conn
            .lock()
            .map_err(|_| RepoError::Backend(anyhow!("connection mutex poisoned")))
    }
}

fn row_to_artifact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Artifact> {
    Ok(Artifact {
        id: row.get(0)?,
        stored_name: row.get(1)?,
        display_name: row.get(2)?,
        camera_model: row.get(3)?,
        size_bytes: row.get(4)?,
        taken_at: row.get(5)?,
        uploaded_at: row.get(6)?,
        content_hash: row.get(7)?,
        deleted: row.get::<_, i64>(8)? != 0,
    })
}

const ARTIFACT_COLUMNS: &str = "id, stored_name, display_name, camera_model, size_bytes, \
     taken_at, uploaded_at, content_hash, deleted";

impl ArtifactRepository for SqliteRepository {
    fn find_by_hash_and_size(
        &self,
        content_hash: &str,
        size_bytes: i64,
    ) -> Result<Option<Artifact>, RepoError> {
        let conn = self.conn()?;
        let result = conn.query_row(
            &format!(
                "SELECT {ARTIFACT_COLUMNS} FROM artifacts \
                 WHERE content_hash = ? AND size_bytes = ? AND deleted = 0"
            ),
            rusqlite::params![content_hash, size_bytes],
            row_to_artifact,
        );
        match result {
            Ok(artifact) => Ok(Some(artifact)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Artifact>, RepoError> {
        let conn = self.conn()?;
        let result = conn.query_row(
            &format!("SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE id = ? AND deleted = 0"),
            [id],
            row_to_artifact,
        );
        match result {
            Ok(artifact) => Ok(Some(artifact)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert(&self, new: NewArtifact) -> Result<Artifact, RepoError> {
        let conn = self.conn()?;
        let result = conn.execute(
            r#"
            INSERT INTO artifacts (
                stored_name, display_name, camera_model, size_bytes,
                taken_at, uploaded_at, content_hash
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                new.stored_name,
                new.display_name,
                new.camera_model,
                new.size_bytes,
                new.taken_at,
                new.uploaded_at,
                new.content_hash,
            ],
        );
        match result {
            Ok(_) => {}
            // Stored names are collision-free in practice, so a uniqueness
            // violation here means the live (size, hash) index fired: a
            // concurrent upload of identical bytes won the race.
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(RepoError::Duplicate);
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        Ok(Artifact {
            id,
            stored_name: new.stored_name,
            display_name: new.display_name,
            camera_model: new.camera_model,
            size_bytes: new.size_bytes,
            taken_at: new.taken_at,
            uploaded_at: new.uploaded_at,
            content_hash: new.content_hash,
            deleted: false,
        })
    }

    fn mark_deleted(&self, id: i64) -> Result<bool, RepoError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE artifacts SET deleted = 1 WHERE id = ? AND deleted = 0",
            [id],
        )?;
        Ok(changed > 0)
    }

    fn list(&self) -> Result<Vec<Artifact>, RepoError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE deleted = 0 ORDER BY id"
        ))?;
        let artifacts = stmt
            .query_map([], row_to_artifact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(artifacts)
    }
}
