use std::path::{Path, PathBuf};

use compio::fs;
use futures::future::{FutureExt, LocalBoxFuture};
use snafu::{OptionExt, ResultExt, Snafu, ensure};
use tracing::{debug, info};

use crate::document::{Document, Node, NodeKind};

/// Writes `document` out as a directory tree under `output_dir`.
///
/// Every target path is composed from `output_dir` and the node labels; the
/// working directory is never changed. The document is checked before
/// anything is written.
pub async fn materialize(document: &Document, output_dir: &Path) -> Result<(), MaterializeError> {
    ensure!(document.include_text(), TextNotIncludedSnafu);
    if let Some(node) = document
        .walk()
        .find(|node| !node.is_directory_like() && !node.children().is_empty())
    {
        return MergeRequestedSnafu {
            label: node.label(),
        }
        .fail();
    }

    info!("Materializing outline into {}", output_dir.display());
    fs::create_dir_all(output_dir)
        .await
        .context(CreateDirSnafu { path: output_dir })?;
    write_nodes(document.nodes(), output_dir).await
}

fn write_nodes<'a>(
    nodes: &'a [Node],
    dir: &'a Path,
) -> LocalBoxFuture<'a, Result<(), MaterializeError>> {
    async move {
        for node in nodes {
            let path = dir.join(node.label());
            match node.kind() {
                NodeKind::PreexistingFile { body, .. } => {
                    let body = body.as_deref().context(MissingBodySnafu { path: &path })?;
                    debug!("Writing {} ({} bytes)", path.display(), body.len());
                    fs::write(&path, body.as_bytes().to_vec())
                        .await
                        .0
                        .context(WriteFileSnafu { path: &path })?;
                }
                NodeKind::PreexistingDirectory { .. } | NodeKind::UserCreated => {
                    debug!("Creating {}", path.display());
                    fs::create_dir_all(&path)
                        .await
                        .context(CreateDirSnafu { path: &path })?;
                    write_nodes(node.children(), &path).await?;
                }
            }
        }
        Ok(())
    }
    .boxed_local()
}

#[derive(Debug, Snafu)]
pub enum MaterializeError {
    #[snafu(display("The outline was made without file text, so there is nothing to write"))]
    TextNotIncluded,
    #[snafu(display("File '{}' has children; merge them with apply instead", label))]
    MergeRequested { label: String },
    #[snafu(display("File {} has no note", path.display()))]
    MissingBody { path: PathBuf },
    #[snafu(display("Failed to create directory: {}", path.display()))]
    CreateDirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write file: {}", path.display()))]
    WriteFileError {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use std::fs as std_fs;

    use tempfile::TempDir;

    use super::*;
    use crate::document::IdGenerator;
    use crate::filesystem::TreeLoader;

    #[compio::test]
    async fn writes_directories_groups_and_bodies() {
        let out = TempDir::new().expect("Failed to create temp directory");
        let mut ids = IdGenerator::new();
        let nodes = vec![
            Node::user_created(ids.next_id(), "group").with_children(vec![Node::file(
                ids.next_id(),
                "a.txt",
                "/old/a.txt".into(),
                Some("alpha".into()),
            )]),
            Node::directory(ids.next_id(), "empty", "/old/empty".into()),
        ];
        let document = Document::new("/old".into(), true, nodes).expect("valid document");

        materialize(&document, out.path()).await.expect("materialize");

        assert_eq!(
            std_fs::read_to_string(out.path().join("group/a.txt")).expect("read back"),
            "alpha"
        );
        assert!(out.path().join("empty").is_dir());
    }

    #[compio::test]
    async fn loaded_tree_is_reproduced() {
        let source = TempDir::new().expect("Failed to create temp directory");
        std_fs::create_dir_all(source.path().join("d")).expect("create dir");
        std_fs::write(source.path().join("d/f.txt"), "content\n").expect("write file");
        let out = TempDir::new().expect("Failed to create temp directory");

        let document = TreeLoader::new(true)
            .load(source.path())
            .await
            .expect("load tree");
        materialize(&document, &out.path().join("copy"))
            .await
            .expect("materialize");

        assert_eq!(
            std_fs::read_to_string(out.path().join("copy/d/f.txt")).expect("read back"),
            "content\n"
        );
    }

    #[compio::test]
    async fn refuses_documents_without_text() {
        let out = TempDir::new().expect("Failed to create temp directory");
        let document = Document::new("/old".into(), false, Vec::new()).expect("valid document");

        let result = materialize(&document, &out.path().join("never")).await;

        assert!(matches!(result, Err(MaterializeError::TextNotIncluded)));
        assert!(!out.path().join("never").exists());
    }

    #[compio::test]
    async fn refuses_merge_requests_before_writing() {
        let out = TempDir::new().expect("Failed to create temp directory");
        let mut ids = IdGenerator::new();
        let nodes = vec![
            Node::file(
                ids.next_id(),
                "a.txt",
                "/old/a.txt".into(),
                Some("a".into()),
            )
            .with_children(vec![Node::file(
                ids.next_id(),
                "b.txt",
                "/old/b.txt".into(),
                Some("b".into()),
            )]),
        ];
        let document = Document::new("/old".into(), true, nodes).expect("valid document");

        let result = materialize(&document, &out.path().join("never")).await;

        assert!(matches!(result, Err(MaterializeError::MergeRequested { .. })));
        assert!(!out.path().join("never").exists());
    }
}
