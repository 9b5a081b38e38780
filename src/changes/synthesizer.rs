//! Works out which filesystem operations turn the original directory layout
//! into the one described by an edited outline.
//!
//! Every node is visited once, pre-order. A node's calculated path is its
//! parent's calculated path joined with its label. Pre-existing nodes whose
//! calculated path differs from their original path are moved; user-created
//! nodes become new directories. File nodes with children ask for those
//! children to be appended to them.
//!
//! Descendants of a moved directory still record their pre-move original
//! paths. Each moved directory therefore contributes a [`Substitution`] to
//! its subtree, and every change is rewritten with the substitutions in
//! effect before moot moves are dropped.

use std::path::{Path, PathBuf};

use snafu::{Snafu, ensure};
use tracing::debug;

use crate::changes::{Change, Concatenation, Substitution};
use crate::document::{Document, Node, NodeKind};

/// Synthesizes the changes for a whole document.
pub fn synthesize_document(document: &Document) -> Result<Vec<Change>, SynthesisError> {
    synthesize(document.nodes(), document.root_dir())
}

/// Synthesizes the changes for top-level `nodes` placed under `root_dir`.
///
/// Either every change is returned or none is.
pub fn synthesize(nodes: &[Node], root_dir: &Path) -> Result<Vec<Change>, SynthesisError> {
    ensure!(
        root_dir.is_absolute(),
        ContractViolationSnafu {
            path: root_dir,
            reason: "the root directory must be absolute",
        }
    );

    let mut changes = Vec::new();
    for node in nodes {
        node_changes(node, root_dir, &[], &mut changes)?;
    }
    debug!("Synthesized {} change(s)", changes.len());
    Ok(changes)
}

fn node_changes(
    node: &Node,
    parent_path: &Path,
    substitutions: &[Substitution],
    changes: &mut Vec<Change>,
) -> Result<(), SynthesisError> {
    let calculated_path = parent_path.join(node.label());

    match node.kind() {
        NodeKind::UserCreated => {
            push_change(
                changes,
                Change::MakeDirectory(calculated_path.clone()),
                substitutions,
            );
            for child in node.children() {
                node_changes(child, &calculated_path, substitutions, changes)?;
            }
        }
        NodeKind::PreexistingDirectory { original_path } => {
            require_absolute(original_path)?;
            if *original_path == calculated_path {
                for child in node.children() {
                    node_changes(child, &calculated_path, substitutions, changes)?;
                }
            } else {
                push_change(
                    changes,
                    Change::Move {
                        from: original_path.clone(),
                        to: calculated_path.clone(),
                    },
                    substitutions,
                );

                let child_substitutions: Vec<Substitution> = substitutions
                    .iter()
                    .cloned()
                    .chain([Substitution::new(original_path, &calculated_path)])
                    .collect();
                for child in node.children() {
                    node_changes(child, &calculated_path, &child_substitutions, changes)?;
                }
            }
        }
        NodeKind::PreexistingFile { original_path, .. } => {
            require_absolute(original_path)?;
            if *original_path != calculated_path {
                push_change(
                    changes,
                    Change::Move {
                        from: original_path.clone(),
                        to: calculated_path.clone(),
                    },
                    substitutions,
                );
            }
            if let Some(concatenation) = concatenation(node, original_path, calculated_path)? {
                push_change(changes, Change::Concatenate(concatenation), substitutions);
            }
        }
    }

    Ok(())
}

fn push_change(changes: &mut Vec<Change>, change: Change, substitutions: &[Substitution]) {
    let change = change.substituted(substitutions);
    if change.is_moot() {
        debug!("Dropping moot change: {change}");
        return;
    }
    changes.push(change);
}

/// Collects the descendants of a file node as sources to append to it.
///
/// The destination is where the file sits once its own move has happened.
fn concatenation(
    file: &Node,
    original_path: &Path,
    destination: PathBuf,
) -> Result<Option<Concatenation>, SynthesisError> {
    let mut sources = Vec::new();
    for child in file.children() {
        collect_sources(child, original_path, &mut sources)?;
    }
    if sources.is_empty() {
        debug!("File {} has nothing to append", original_path.display());
    }
    Ok(Concatenation::new(destination, sources))
}

fn collect_sources(
    node: &Node,
    into_file: &Path,
    sources: &mut Vec<PathBuf>,
) -> Result<(), SynthesisError> {
    match node.kind() {
        NodeKind::PreexistingFile { original_path, .. } => {
            require_absolute(original_path)?;
            sources.push(original_path.clone());
            for child in node.children() {
                collect_sources(child, into_file, sources)?;
            }
            Ok(())
        }
        NodeKind::PreexistingDirectory { original_path } => IllegalConcatenationSnafu {
            directory: original_path,
            file: into_file,
        }
        .fail(),
        NodeKind::UserCreated => GroupInsideFileSnafu {
            label: node.label(),
            file: into_file,
        }
        .fail(),
    }
}

fn require_absolute(path: &Path) -> Result<(), SynthesisError> {
    ensure!(
        path.is_absolute(),
        ContractViolationSnafu {
            path,
            reason: "original paths must be absolute",
        }
    );
    Ok(())
}

#[derive(Debug, Snafu)]
pub enum SynthesisError {
    #[snafu(display(
        "Tried to concatenate directory {} into file {}",
        directory.display(),
        file.display()
    ))]
    IllegalConcatenation { directory: PathBuf, file: PathBuf },
    #[snafu(display(
        "Tried to concatenate the new group '{}' into file {}",
        label,
        file.display()
    ))]
    GroupInsideFile { label: String, file: PathBuf },
    #[snafu(display("Corrupted outline at {}: {}", path.display(), reason))]
    ContractViolation { path: PathBuf, reason: String },
}

impl SynthesisError {
    /// Whether the user can fix this by editing the outline, as opposed to
    /// the outline itself being corrupted.
    pub fn is_domain(&self) -> bool {
        !matches!(self, SynthesisError::ContractViolation { .. })
    }
}
