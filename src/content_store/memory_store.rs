use super::trait_def::{
    join_path, normalize_path, validate_name, ContentSession, ContentStore, Entry, Properties,
    ROOT_PATH,
};
use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct Node {
    name: String,
    parent: Option<String>,
    properties: Properties,
    seq: u64,
}

#[derive(Clone)]
struct Tree {
    nodes: HashMap<String, Node>,
    next_seq: u64,
}

impl Tree {
    fn with_root() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_PATH.to_string(),
            Node {
                name: String::new(),
                parent: None,
                properties: Properties::new(),
                seq: 0,
            },
        );
        Self { nodes, next_seq: 1 }
    }

    fn entry(&self, path: &str) -> Option<Entry> {
        self.nodes
            .get(path)
            .map(|node| Entry::new(path, node.name.clone(), node.properties.clone()))
    }

    fn apply(&mut self, change: &Change) -> Result<Entry> {
        match change {
            Change::Create {
                parent,
                name,
                properties,
            } => {
                if !self.nodes.contains_key(parent) {
                    bail!("Parent entry {} does not exist", parent);
                }
                let path = join_path(parent, name);
                if self.nodes.contains_key(&path) {
                    bail!("Entry {} already exists", path);
                }
                let seq = self.next_seq;
                self.next_seq += 1;
                self.nodes.insert(
                    path.clone(),
                    Node {
                        name: name.clone(),
                        parent: Some(parent.clone()),
                        properties: properties.clone(),
                        seq,
                    },
                );
                Ok(Entry::new(path, name.clone(), properties.clone()))
            }
            Change::Update { path, properties } => {
                let node = self
                    .nodes
                    .get_mut(path)
                    .ok_or_else(|| anyhow!("Entry {} does not exist", path))?;
                node.properties
                    .extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
                Ok(Entry::new(path.clone(), node.name.clone(), node.properties.clone()))
            }
        }
    }
}

/// A write made inside a session, replayed onto the committed tree on commit.
enum Change {
    Create {
        parent: String,
        name: String,
        properties: Properties,
    },
    Update {
        path: String,
        properties: Properties,
    },
}

/// Volatile content store. Each session reads a snapshot of the last
/// committed tree; on commit its own writes are replayed onto the current
/// committed tree, so concurrent sessions never erase each other's work.
#[derive(Clone)]
pub struct MemoryContentStore {
    committed: Arc<Mutex<Tree>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self {
            committed: Arc::new(Mutex::new(Tree::with_root())),
        }
    }

    /// Number of entries in the committed tree, root included.
    pub fn len(&self) -> usize {
        self.committed.lock().map(|t| t.nodes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for MemoryContentStore {
    fn open_session(&self, identity: &str) -> Result<Box<dyn ContentSession>> {
        let snapshot = self
            .committed
            .lock()
            .map_err(|_| anyhow!("Content store lock poisoned"))?
            .clone();
        Ok(Box::new(MemoryContentSession {
            committed: self.committed.clone(),
            working: snapshot,
            pending: Vec::new(),
            identity: identity.to_string(),
        }))
    }
}

struct MemoryContentSession {
    committed: Arc<Mutex<Tree>>,
    working: Tree,
    pending: Vec<Change>,
    identity: String,
}

impl MemoryContentSession {
    fn record(&mut self, change: Change) -> Result<Entry> {
        let entry = self.working.apply(&change)?;
        self.pending.push(change);
        Ok(entry)
    }
}

impl ContentSession for MemoryContentSession {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn resolve(&self, path: &str) -> Result<Option<Entry>> {
        let path = normalize_path(path)?;
        Ok(self.working.entry(&path))
    }

    fn list_children(&self, parent: &Entry) -> Result<Vec<Entry>> {
        let mut children: Vec<(&String, &Node)> = self
            .working
            .nodes
            .iter()
            .filter(|(_, node)| node.parent.as_deref() == Some(parent.path()))
            .collect();
        children.sort_by_key(|(_, node)| node.seq);
        Ok(children
            .into_iter()
            .map(|(path, node)| Entry::new(path.clone(), node.name.clone(), node.properties.clone()))
            .collect())
    }

    fn create(&mut self, parent: &Entry, name: &str, properties: Properties) -> Result<Entry> {
        validate_name(name)?;
        self.record(Change::Create {
            parent: parent.path().to_string(),
            name: name.to_string(),
            properties,
        })
    }

    fn update_properties(&mut self, entry: &Entry, properties: Properties) -> Result<Entry> {
        self.record(Change::Update {
            path: entry.path().to_string(),
            properties,
        })
    }

    fn commit(&mut self) -> Result<()> {
        let mut committed = self
            .committed
            .lock()
            .map_err(|_| anyhow!("Content store lock poisoned"))?;
        let mut next = committed.clone();
        for change in &self.pending {
            next.apply(change)?;
        }
        *committed = next;
        self.working = committed.clone();
        self.pending.clear();
        Ok(())
    }
}
