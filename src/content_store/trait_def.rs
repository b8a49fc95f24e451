use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;

/// Property map attached to every entry.
pub type Properties = serde_json::Map<String, Value>;

/// A node of the content tree, as read inside a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entry {
    path: String,
    name: String,
    properties: Properties,
}

impl Entry {
    pub fn new(path: impl Into<String>, name: impl Into<String>, properties: Properties) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            properties,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    pub fn child_path(&self, name: &str) -> String {
        join_path(&self.path, name)
    }
}

/// One scoped unit of work against a [`ContentStore`].
///
/// Writes become visible to other sessions only after [`commit`]. Dropping a
/// session releases it and discards anything not yet committed.
///
/// [`commit`]: ContentSession::commit
pub trait ContentSession: Send {
    /// Service identity the session was opened with.
    fn identity(&self) -> &str;

    fn resolve(&self, path: &str) -> Result<Option<Entry>>;

    fn get_child(&self, parent: &Entry, name: &str) -> Result<Option<Entry>> {
        self.resolve(&parent.child_path(name))
    }

    /// Direct children of `parent`, in creation order.
    fn list_children(&self, parent: &Entry) -> Result<Vec<Entry>>;

    /// Create a new child. Fails if the parent is gone or the name is taken.
    fn create(&mut self, parent: &Entry, name: &str, properties: Properties) -> Result<Entry>;

    /// Merge `properties` into the entry: given keys are overwritten, the
    /// others are kept.
    fn update_properties(&mut self, entry: &Entry, properties: Properties) -> Result<Entry>;

    fn commit(&mut self) -> Result<()>;
}

pub trait ContentStore: Send + Sync {
    fn open_session(&self, identity: &str) -> Result<Box<dyn ContentSession>>;
}

pub const ROOT_PATH: &str = "/";

pub fn join_path(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        bail!("Invalid entry name '{}'", name);
    }
    Ok(())
}

/// Split an absolute path into its segments. `"/"` has none.
pub fn path_segments(path: &str) -> Result<Vec<&str>> {
    if !path.starts_with('/') {
        bail!("Path '{}' is not absolute", path);
    }
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for segment in &segments {
        validate_name(segment)?;
    }
    Ok(segments)
}

/// Canonical form of an absolute path: no trailing or doubled slashes.
pub fn normalize_path(path: &str) -> Result<String> {
    let segments = path_segments(path)?;
    if segments.is_empty() {
        return Ok(ROOT_PATH.to_string());
    }
    Ok(segments.iter().fold(String::new(), |mut acc, s| {
        acc.push('/');
        acc.push_str(s);
        acc
    }))
}
