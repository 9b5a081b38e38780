use std::collections::HashSet;
use std::path::{Path, PathBuf};

use derive_more::Display;

/// Identifier of a node, unique within one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId(value.to_string())
    }
}

/// Hands out node identifiers for one load or parse run.
///
/// Identifiers already present in a document are reserved first, so freshly
/// generated ones never collide with them.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: u64,
    taken: HashSet<NodeId>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as used. Returns `false` if it was already taken.
    pub fn reserve(&mut self, id: NodeId) -> bool {
        self.taken.insert(id)
    }

    pub fn next_id(&mut self) -> NodeId {
        loop {
            let candidate = NodeId(format!("IDT_{}", self.next));
            self.next += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// What a node stands for on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    PreexistingDirectory {
        original_path: PathBuf,
    },
    PreexistingFile {
        original_path: PathBuf,
        body: Option<String>,
    },
    /// A grouping introduced in the outline; it has no place on disk yet.
    UserCreated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    label: String,
    kind: NodeKind,
    children: Vec<Node>,
}

impl Node {
    pub fn directory(id: NodeId, label: impl Into<String>, original_path: PathBuf) -> Self {
        Self::new(id, label, NodeKind::PreexistingDirectory { original_path })
    }

    pub fn file(
        id: NodeId,
        label: impl Into<String>,
        original_path: PathBuf,
        body: Option<String>,
    ) -> Self {
        Self::new(
            id,
            label,
            NodeKind::PreexistingFile {
                original_path,
                body,
            },
        )
    }

    pub fn user_created(id: NodeId, label: impl Into<String>) -> Self {
        Self::new(id, label, NodeKind::UserCreated)
    }

    fn new(id: NodeId, label: impl Into<String>, kind: NodeKind) -> Self {
        Node {
            id,
            label: label.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Directories and user-created groups hold structure; files do not.
    pub fn is_directory_like(&self) -> bool {
        !matches!(self.kind, NodeKind::PreexistingFile { .. })
    }

    pub fn original_path(&self) -> Option<&Path> {
        match &self.kind {
            NodeKind::PreexistingDirectory { original_path }
            | NodeKind::PreexistingFile { original_path, .. } => Some(original_path),
            NodeKind::UserCreated => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::PreexistingFile { body, .. } => body.as_deref(),
            _ => None,
        }
    }

    /// Depth-first, pre-order walk over this node and its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Node> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_skip_reserved_ones() {
        let mut ids = IdGenerator::new();
        assert!(ids.reserve(NodeId::from("IDT_0")));
        assert!(ids.reserve(NodeId::from("IDT_2")));

        assert_eq!(ids.next_id().as_str(), "IDT_1");
        assert_eq!(ids.next_id().as_str(), "IDT_3");
    }

    #[test]
    fn reserving_twice_reports_a_duplicate() {
        let mut ids = IdGenerator::new();
        assert!(ids.reserve(NodeId::from("custom")));
        assert!(!ids.reserve(NodeId::from("custom")));
    }

    #[test]
    fn queries_follow_the_kind() {
        let mut ids = IdGenerator::new();
        let dir = Node::directory(ids.next_id(), "d", PathBuf::from("/r/d"));
        let file = Node::file(
            ids.next_id(),
            "f",
            PathBuf::from("/r/f"),
            Some("text".into()),
        );
        let group = Node::user_created(ids.next_id(), "g");

        assert!(dir.is_directory_like());
        assert!(group.is_directory_like());
        assert!(!file.is_directory_like());

        assert_eq!(dir.original_path(), Some(Path::new("/r/d")));
        assert_eq!(group.original_path(), None);
        assert_eq!(file.body(), Some("text"));
        assert_eq!(dir.body(), None);
    }

    #[test]
    fn walk_is_pre_order_in_document_order() {
        let mut ids = IdGenerator::new();
        let tree = Node::user_created(ids.next_id(), "a").with_children(vec![
            Node::user_created(ids.next_id(), "b")
                .with_children(vec![Node::user_created(ids.next_id(), "c")]),
            Node::user_created(ids.next_id(), "d"),
        ]);

        let labels: Vec<_> = tree.walk().map(Node::label).collect();
        assert_eq!(labels, vec!["a", "b", "c", "d"]);
    }
}
