//! Hierarchical content store: entries addressed by absolute path, each
//! carrying a JSON property map, written through explicitly committed
//! sessions.

mod memory_store;
mod schema;
mod sqlite_store;
mod trait_def;

pub use memory_store::MemoryContentStore;
pub use sqlite_store::SqliteContentStore;
pub use trait_def::*;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

/// Make sure every collection along `path` exists, creating the missing ones,
/// and return the entry at `path`.
pub fn bootstrap_collection(store: &dyn ContentStore, identity: &str, path: &str) -> Result<Entry> {
    let mut session = store.open_session(identity)?;
    let mut current = session
        .resolve(ROOT_PATH)?
        .context("Content store has no root entry")?;

    for segment in path_segments(path)? {
        current = match session.get_child(&current, segment)? {
            Some(child) => child,
            None => {
                let properties = json!({ "type": "collection" })
                    .as_object()
                    .cloned()
                    .unwrap_or_default();
                let created = session.create(&current, segment, properties)?;
                info!("Created collection {}", created.path());
                created
            }
        };
    }

    session.commit()?;
    Ok(current)
}
