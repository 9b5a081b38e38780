use std::path::{Path, PathBuf};

use snafu::{Snafu, ensure};

use crate::document::{Node, NodeKind};

/// An outline of a directory tree rooted at `root_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root_dir: PathBuf,
    include_text: bool,
    nodes: Vec<Node>,
}

impl Document {
    /// Builds a document after checking every structural invariant of the tree.
    pub fn new(
        root_dir: PathBuf,
        include_text: bool,
        nodes: Vec<Node>,
    ) -> Result<Self, DocumentError> {
        ensure!(
            root_dir.is_absolute(),
            RelativeRootSnafu {
                root_dir: root_dir.clone()
            }
        );
        for node in nodes.iter().flat_map(Node::walk) {
            validate_node(node, include_text)?;
        }

        Ok(Document {
            root_dir,
            include_text,
            nodes,
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn include_text(&self) -> bool {
        self.include_text
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn walk(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().flat_map(Node::walk)
    }
}

fn validate_node(node: &Node, include_text: bool) -> Result<(), DocumentError> {
    let label = node.label();
    ensure!(
        is_single_component(label),
        InvalidLabelSnafu {
            id: node.id().to_string(),
            label,
        }
    );

    if let Some(path) = node.original_path() {
        ensure!(
            path.is_absolute(),
            RelativePathSnafu {
                id: node.id().to_string(),
                path,
            }
        );
    }

    if let NodeKind::PreexistingFile {
        original_path,
        body,
    } = node.kind()
    {
        match (include_text, body.is_some()) {
            (true, false) => MissingBodySnafu {
                path: original_path,
            }
            .fail()?,
            (false, true) => UnexpectedBodySnafu {
                path: original_path,
            }
            .fail()?,
            _ => {}
        }
    }

    Ok(())
}

fn is_single_component(label: &str) -> bool {
    !label.is_empty() && label != "." && label != ".." && !label.contains(std::path::is_separator)
}

/// Structural violations of a document. These are never recoverable: the
/// document was corrupted or edited by hand in a way the tool cannot follow.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DocumentError {
    #[snafu(display("Root directory {} is not absolute", root_dir.display()))]
    RelativeRoot { root_dir: PathBuf },
    #[snafu(display("Node {id} has label '{label}', which is not a single path component"))]
    InvalidLabel { id: String, label: String },
    #[snafu(display("Node {id} records the relative path {}", path.display()))]
    RelativePath { id: String, path: PathBuf },
    #[snafu(display("File {} has no note although text was included", path.display()))]
    MissingBody { path: PathBuf },
    #[snafu(display("File {} carries a note although text was not included", path.display()))]
    UnexpectedBody { path: PathBuf },
}
