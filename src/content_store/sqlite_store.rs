use super::schema::CONTENT_VERSIONED_SCHEMAS;
use super::trait_def::{
    normalize_path, validate_name, ContentSession, ContentStore, Entry, Properties, ROOT_PATH,
};
use crate::sqlite_persistence::migrate_to_latest;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Content store persisted in a single SQLite file.
///
/// Each session owns its own connection. A transaction is started lazily on
/// the first write and ended by `commit`, or rolled back when the session is
/// dropped.
pub struct SqliteContentStore {
    db_path: PathBuf,
}

impl SqliteContentStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        if !path.exists() {
            info!("Creating new content database at {:?}", path);
        }

        let mut conn = Connection::open(path)
            .with_context(|| format!("Failed to open content database {:?}", path))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrate_to_latest(&mut conn, CONTENT_VERSIONED_SCHEMAS)
            .context("Content database schema check failed")?;
        conn.execute(
            "INSERT OR IGNORE INTO entries (path, parent_path, name, properties) VALUES (?1, NULL, '', '{}')",
            params![ROOT_PATH],
        )?;

        Ok(Self {
            db_path: path.to_path_buf(),
        })
    }
}

impl ContentStore for SqliteContentStore {
    fn open_session(&self, identity: &str) -> Result<Box<dyn ContentSession>> {
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open content database {:?}", self.db_path))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Box::new(SqliteContentSession {
            conn,
            identity: identity.to_string(),
        }))
    }
}

struct SqliteContentSession {
    conn: Connection,
    identity: String,
}

impl SqliteContentSession {
    fn begin_if_needed(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
        }
        Ok(())
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<(String, String, String)> {
        Ok((row.get("path")?, row.get("name")?, row.get("properties")?))
    }

    fn to_entry((path, name, properties): (String, String, String)) -> Result<Entry> {
        let properties: Properties = serde_json::from_str(&properties)
            .with_context(|| format!("Corrupted properties for entry {}", path))?;
        Ok(Entry::new(path, name, properties))
    }
}

impl ContentSession for SqliteContentSession {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn resolve(&self, path: &str) -> Result<Option<Entry>> {
        let path = normalize_path(path)?;
        let row = self
            .conn
            .query_row(
                "SELECT path, name, properties FROM entries WHERE path = ?1",
                params![path],
                Self::row_to_entry,
            )
            .optional()?;
        row.map(Self::to_entry).transpose()
    }

    fn list_children(&self, parent: &Entry) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT path, name, properties FROM entries WHERE parent_path = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![parent.path()], Self::row_to_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(Self::to_entry).collect()
    }

    fn create(&mut self, parent: &Entry, name: &str, properties: Properties) -> Result<Entry> {
        validate_name(name)?;
        self.begin_if_needed()?;

        if self.resolve(parent.path())?.is_none() {
            bail!("Parent entry {} does not exist", parent.path());
        }
        let path = parent.child_path(name);
        if self.resolve(&path)?.is_some() {
            bail!("Entry {} already exists", path);
        }

        self.conn
            .execute(
                "INSERT INTO entries (path, parent_path, name, properties, modified_by) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    path,
                    parent.path(),
                    name,
                    serde_json::to_string(&properties)?,
                    self.identity
                ],
            )
            .with_context(|| format!("Failed to create entry {}", path))?;

        Ok(Entry::new(path, name, properties))
    }

    fn update_properties(&mut self, entry: &Entry, properties: Properties) -> Result<Entry> {
        self.begin_if_needed()?;

        let current = match self.resolve(entry.path())? {
            Some(current) => current,
            None => bail!("Entry {} does not exist", entry.path()),
        };
        let mut merged = current.properties().clone();
        merged.extend(properties);

        self.conn
            .execute(
                "UPDATE entries SET properties = ?1, modified_by = ?2, modified = (cast(strftime('%s','now') as int)) WHERE path = ?3",
                params![serde_json::to_string(&merged)?, self.identity, current.path()],
            )
            .with_context(|| format!("Failed to update entry {}", current.path()))?;

        Ok(Entry::new(current.path(), current.name(), merged))
    }

    fn commit(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn
                .execute_batch("COMMIT")
                .context("Failed to commit content session")?;
        }
        Ok(())
    }
}

impl Drop for SqliteContentSession {
    fn drop(&mut self) {
        if !self.conn.is_autocommit() {
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                warn!("Failed to roll back content session: {}", err);
            }
        }
    }
}
