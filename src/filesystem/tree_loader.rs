use std::path::{Path, PathBuf};

use compio::fs;
use snafu::{ResultExt, Snafu, ensure};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::document::{Document, DocumentError, IdGenerator, Node};
use crate::ext::PathExt;

/// Builds a [`Document`] from a directory on disk.
#[derive(Debug, Clone, Default)]
pub struct TreeLoader {
    include_text: bool,
    skip: Option<PathBuf>,
}

/// A directory whose entries are still being walked.
struct OpenDirectory {
    node: Node,
    children: Vec<Node>,
}

impl TreeLoader {
    pub fn new(include_text: bool) -> Self {
        TreeLoader {
            include_text,
            skip: None,
        }
    }

    /// Leaves `path` out of the tree, e.g. the outline file being written.
    pub fn skipping(mut self, path: PathBuf) -> Self {
        self.skip = Some(path);
        self
    }

    /// Walks `input_dir`; its entries become the top-level nodes.
    ///
    /// Any unreadable entry fails the whole load.
    pub async fn load(&self, input_dir: &Path) -> Result<Document, LoadError> {
        let root_dir = input_dir.canonicalize().context(ReadDirSnafu {
            path: input_dir.best_effort_path_display(),
        })?;
        ensure!(
            root_dir.is_dir(),
            NotADirectorySnafu {
                path: root_dir.display().to_string()
            }
        );
        info!("Loading directory tree from {}", root_dir.display());

        let mut ids = IdGenerator::new();
        let mut top_level = Vec::new();
        // Directories from the top level down to the parent of the current entry.
        let mut open: Vec<OpenDirectory> = Vec::new();

        // Symlinks are recorded as files and never followed.
        let walker = WalkDir::new(&root_dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.skip.as_deref() != Some(entry.path()));

        for entry in walker {
            let entry = entry.map_err(|source| LoadError::WalkError {
                path: source
                    .path()
                    .unwrap_or(root_dir.as_path())
                    .display()
                    .to_string(),
                source,
            })?;
            while open.len() >= entry.depth() {
                close_directory(&mut open, &mut top_level);
            }

            let label = entry
                .file_name()
                .to_str()
                .map(str::to_string)
                .ok_or_else(|| LoadError::NonUtf8Name {
                    path: entry.path().to_path_buf(),
                })?;
            let id = ids.next_id();
            let is_dir = entry.file_type().is_dir();
            let path = entry.into_path();

            if is_dir {
                open.push(OpenDirectory {
                    node: Node::directory(id, label, path),
                    children: Vec::new(),
                });
            } else {
                let body = if self.include_text {
                    Some(read_text(&path).await?)
                } else {
                    None
                };
                let node = Node::file(id, label, path, body);
                match open.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => top_level.push(node),
                }
            }
        }
        while !open.is_empty() {
            close_directory(&mut open, &mut top_level);
        }

        debug!("Loaded {} top-level entries", top_level.len());
        Document::new(root_dir, self.include_text, top_level).context(InvalidTreeSnafu)
    }
}

/// Finishes the innermost open directory and hands it to its parent.
fn close_directory(open: &mut Vec<OpenDirectory>, top_level: &mut Vec<Node>) {
    let Some(OpenDirectory { node, children }) = open.pop() else {
        return;
    };
    let node = node.with_children(children);
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top_level.push(node),
    }
}

async fn read_text(path: &Path) -> Result<String, LoadError> {
    let bytes = fs::read(path).await.context(ReadFileSnafu {
        path: path.display().to_string(),
    })?;
    String::from_utf8(bytes).context(NotTextSnafu {
        path: path.display().to_string(),
    })
}

#[derive(Debug, Snafu)]
pub enum LoadError {
    #[snafu(display("Failed to read directory: {}", path))]
    ReadDirError {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to walk directory tree at: {}", path))]
    WalkError {
        path: String,
        source: walkdir::Error,
    },
    #[snafu(display("Failed to read file: {}", path))]
    ReadFileError {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("{} is not a directory", path))]
    NotADirectory { path: String },
    #[snafu(display("File {} does not contain UTF-8 text", path))]
    NotTextError {
        path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("The name of {} is not valid UTF-8", path.display()))]
    NonUtf8Name { path: PathBuf },
    #[snafu(display("The loaded tree is not a valid outline"))]
    InvalidTree { source: DocumentError },
}
