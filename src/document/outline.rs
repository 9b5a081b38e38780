//! YAML representation of a [`Document`].
//!
//! The outline is what the user edits. Each node is a mapping with a `label`
//! and optional `id`, `kind`, `path`, `note` and `children` keys. Nodes
//! without a `kind` are groups the user introduced.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml, YamlEmitter};
use snafu::prelude::*;
use tracing::debug;

use crate::{
    document::{Document, DocumentError, IdGenerator, Node, NodeId, NodeKind},
    ext::PathExt,
};

const ROOT_DIR_KEY: &str = "root_dir";
const INCLUDE_TEXT_KEY: &str = "include_text";
const NODES_KEY: &str = "nodes";
const ID_KEY: &str = "id";
const LABEL_KEY: &str = "label";
const KIND_KEY: &str = "kind";
const PATH_KEY: &str = "path";
const NOTE_KEY: &str = "note";
const CHILDREN_KEY: &str = "children";

const DIRECTORY_KIND: &str = "directory";
const FILE_KIND: &str = "file";

type Mapping<'y> = LinkedHashMap<Yaml<'y>, Yaml<'y>>;

impl Document {
    /// Reads and validates an outline file.
    pub async fn read(path: &Path) -> Result<Self, OutlineError> {
        debug!("Reading outline {}", path.best_effort_path_display());
        let bytes = fs::read(path).await.context(ReadSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        debug!("Read {} bytes of outline", bytes.len());

        let contents = String::from_utf8(bytes).context(NotUtf8Snafu {
            file_path: path.best_effort_path_display(),
        })?;
        contents.as_str().try_into()
    }

    /// Renders the document and writes it to `path`, replacing any previous file.
    pub async fn write(&self, path: &Path) -> Result<(), OutlineError> {
        let contents = self.to_outline()?;
        debug!(
            "Writing {} bytes of outline to {}",
            contents.len(),
            path.best_effort_path_display()
        );
        fs::write(path, contents.into_bytes())
            .await
            .0
            .context(WriteSnafu {
                file_path: path.best_effort_path_display(),
            })
    }

    pub fn to_outline(&self) -> Result<String, OutlineError> {
        let mut top_level = Mapping::new();
        top_level.insert(key(ROOT_DIR_KEY), path_value(self.root_dir())?);
        top_level.insert(
            key(INCLUDE_TEXT_KEY),
            Yaml::Value(Scalar::Boolean(self.include_text())),
        );
        top_level.insert(
            key(NODES_KEY),
            Yaml::Sequence(
                self.nodes()
                    .iter()
                    .map(node_to_yaml)
                    .collect::<Result<_, _>>()?,
            ),
        );

        // `|` blocks only for documents where every string reads back unchanged.
        let literal_blocks = self.literal_blocks_round_trip();
        if !literal_blocks {
            debug!("Some text does not survive a literal block; quoting every string");
        }
        let mut out = String::new();
        let mut emitter = YamlEmitter::new(&mut out);
        emitter.multiline_strings(literal_blocks);
        emitter
            .dump(&Yaml::Mapping(top_level))
            .context(EmitSnafu)?;
        out.push('\n');
        Ok(out)
    }
}

impl Document {
    fn literal_blocks_round_trip(&self) -> bool {
        let path_fits =
            |path: Option<&Path>| path.and_then(Path::to_str).is_none_or(fits_literal_block);
        path_fits(Some(self.root_dir()))
            && self.walk().all(|node| {
                fits_literal_block(node.id().as_str())
                    && fits_literal_block(node.label())
                    && path_fits(node.original_path())
                    && node.body().is_none_or(fits_literal_block)
            })
    }
}

/// A `|` block with default chomping keeps exactly one final line break and
/// takes its indentation from the first line.
fn fits_literal_block(text: &str) -> bool {
    if !text.contains('\n') {
        return true;
    }
    !text.starts_with(char::is_whitespace)
        && text.ends_with('\n')
        && !text.ends_with("\n\n")
        && !text.chars().any(|c| {
            (c.is_control() && c != '\n' && c != '\t') || matches!(c, '\u{2028}' | '\u{2029}')
        })
}

impl TryFrom<&str> for Document {
    type Error = OutlineError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let top_level = documents
            .first()
            .ok_or(OutlineError::MalformedOutline)?
            .as_mapping()
            .ok_or(OutlineError::TopLevelNotMap)?;

        let root_dir = text_field(top_level, ROOT_DIR_KEY)?
            .map(PathBuf::from)
            .context(MissingRootDirSnafu)?;
        let include_text = match field(top_level, INCLUDE_TEXT_KEY) {
            None => false,
            Some(Yaml::Value(Scalar::Boolean(flag))) => *flag,
            Some(_) => return IncludeTextNotBoolSnafu.fail(),
        };
        let raw_nodes = match field(top_level, NODES_KEY) {
            None => &[][..],
            Some(Yaml::Value(Scalar::Null)) => &[][..],
            Some(value) => value
                .as_sequence()
                .ok_or(OutlineError::NodesNotSequence)?
                .as_slice(),
        };

        let mut ids = IdGenerator::new();
        for raw in raw_nodes {
            reserve_ids(raw, &mut ids)?;
        }
        let nodes = raw_nodes
            .iter()
            .map(|raw| node_from_yaml(raw, &mut ids))
            .collect::<Result<Vec<_>, _>>()?;

        Document::new(root_dir, include_text, nodes).context(InvalidDocumentSnafu)
    }
}

fn key(name: &'static str) -> Yaml<'static> {
    Yaml::Value(Scalar::String(Cow::Borrowed(name)))
}

fn text(value: impl Into<String>) -> Yaml<'static> {
    Yaml::Value(Scalar::String(Cow::Owned(value.into())))
}

fn path_value(path: &Path) -> Result<Yaml<'static>, OutlineError> {
    let text_path = path.to_str().context(NonUtf8PathSnafu { path })?;
    Ok(text(text_path))
}

fn field<'a, 'y>(map: &'a Mapping<'y>, name: &'static str) -> Option<&'a Yaml<'y>> {
    map.get(&key(name))
}

/// Reads `name` as text. Plain scalars that YAML resolves to numbers or
/// booleans are refused, since `007` or `1.10` would not come back as typed.
fn text_field(map: &Mapping, name: &'static str) -> Result<Option<String>, OutlineError> {
    match field(map, name) {
        Some(Yaml::Value(Scalar::String(text))) => Ok(Some(text.to_string())),
        Some(Yaml::Value(Scalar::Integer(number))) => UnquotedScalarSnafu {
            key: name,
            value: number.to_string(),
        }
        .fail(),
        Some(Yaml::Value(Scalar::FloatingPoint(number))) => UnquotedScalarSnafu {
            key: name,
            value: number.to_string(),
        }
        .fail(),
        Some(Yaml::Value(Scalar::Boolean(flag))) => UnquotedScalarSnafu {
            key: name,
            value: flag.to_string(),
        }
        .fail(),
        _ => Ok(None),
    }
}

fn children_of<'a, 'y>(map: &'a Mapping<'y>, label: &str) -> Result<&'a [Yaml<'y>], OutlineError> {
    match field(map, CHILDREN_KEY) {
        None => Ok(&[]),
        Some(Yaml::Value(Scalar::Null)) => Ok(&[]),
        Some(value) => value
            .as_sequence()
            .map(Vec::as_slice)
            .context(ChildrenNotSequenceSnafu { label }),
    }
}

fn reserve_ids(raw: &Yaml, ids: &mut IdGenerator) -> Result<(), OutlineError> {
    let map = raw.as_mapping().ok_or(OutlineError::NodeNotMap)?;
    if let Some(id) = text_field(map, ID_KEY)? {
        ensure!(ids.reserve(NodeId::from(id.as_str())), DuplicateIdSnafu { id });
    }
    let label = text_field(map, LABEL_KEY)?.unwrap_or_default();
    for child in children_of(map, &label)? {
        reserve_ids(child, ids)?;
    }
    Ok(())
}

fn node_from_yaml(raw: &Yaml, ids: &mut IdGenerator) -> Result<Node, OutlineError> {
    let map = raw.as_mapping().ok_or(OutlineError::NodeNotMap)?;
    let label = text_field(map, LABEL_KEY)?.context(MissingLabelSnafu)?;
    let id = match text_field(map, ID_KEY)? {
        Some(id) => NodeId::from(id.as_str()),
        None => ids.next_id(),
    };

    for entry_key in map.keys() {
        let known = matches!(
            entry_key.as_str(),
            Some(ID_KEY | LABEL_KEY | KIND_KEY | PATH_KEY | NOTE_KEY | CHILDREN_KEY)
        );
        if !known {
            debug!("Ignoring unknown key {:?} on node '{}'", entry_key, label);
        }
    }

    let kind = text_field(map, KIND_KEY)?;
    let path = text_field(map, PATH_KEY)?.map(PathBuf::from);
    let note = match field(map, NOTE_KEY) {
        None => None,
        Some(_) => Some(text_field(map, NOTE_KEY)?.context(NoteNotTextSnafu {
            label: label.clone(),
        })?),
    };

    let node = match (kind.as_deref(), path) {
        (None, None) => {
            ensure!(note.is_none(), NoteOnNonFileSnafu { label });
            Node::user_created(id, label.clone())
        }
        (Some(DIRECTORY_KIND), Some(original_path)) => {
            ensure!(note.is_none(), NoteOnNonFileSnafu { label });
            Node::directory(id, label.clone(), original_path)
        }
        (Some(FILE_KIND), Some(original_path)) => {
            Node::file(id, label.clone(), original_path, note)
        }
        (Some(DIRECTORY_KIND | FILE_KIND), None) => {
            return KindWithoutPathSnafu { label }.fail();
        }
        (None, Some(_)) => return PathWithoutKindSnafu { label }.fail(),
        (Some(other), _) => {
            return UnknownKindSnafu {
                label,
                kind: other,
            }
            .fail();
        }
    };

    let children = children_of(map, &label)?
        .iter()
        .map(|child| node_from_yaml(child, ids))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(node.with_children(children))
}

fn node_to_yaml(node: &Node) -> Result<Yaml<'static>, OutlineError> {
    let mut map = Mapping::new();
    map.insert(key(ID_KEY), text(node.id().as_str()));
    map.insert(key(LABEL_KEY), text(node.label()));

    match node.kind() {
        NodeKind::PreexistingDirectory { original_path } => {
            map.insert(key(KIND_KEY), text(DIRECTORY_KIND));
            map.insert(key(PATH_KEY), path_value(original_path)?);
        }
        NodeKind::PreexistingFile {
            original_path,
            body,
        } => {
            map.insert(key(KIND_KEY), text(FILE_KIND));
            map.insert(key(PATH_KEY), path_value(original_path)?);
            if let Some(body) = body {
                map.insert(key(NOTE_KEY), text(body.as_str()));
            }
        }
        NodeKind::UserCreated => {}
    }

    if !node.children().is_empty() {
        map.insert(
            key(CHILDREN_KEY),
            Yaml::Sequence(
                node.children()
                    .iter()
                    .map(node_to_yaml)
                    .collect::<Result<_, _>>()?,
            ),
        );
    }

    Ok(Yaml::Mapping(map))
}

#[derive(Debug, Snafu)]
pub enum OutlineError {
    #[snafu(display("Failed to read the outline file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write the outline file: {}", file_path))]
    WriteError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("The outline file {} is not valid UTF-8", file_path))]
    NotUtf8Error {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the outline file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Failed to render the outline"))]
    EmitError { source: saphyr::EmitError },
    #[snafu(display("Improperly formatted outline file"))]
    MalformedOutline,
    #[snafu(display("Top level of the outline should be a map"))]
    TopLevelNotMap,
    #[snafu(display("The outline has no 'root_dir' entry"))]
    MissingRootDir,
    #[snafu(display("'include_text' should be true or false"))]
    IncludeTextNotBool,
    #[snafu(display("'nodes' should be a list"))]
    NodesNotSequence,
    #[snafu(display("Every outline node should be a map"))]
    NodeNotMap,
    #[snafu(display("An outline node has no label"))]
    MissingLabel,
    #[snafu(display("Children of '{label}' should be a list"))]
    ChildrenNotSequence { label: String },
    #[snafu(display("Node id '{id}' is used more than once"))]
    DuplicateId { id: String },
    #[snafu(display("Node '{label}' has unknown kind '{kind}'"))]
    UnknownKind { label: String, kind: String },
    #[snafu(display("Node '{label}' has a kind but no path"))]
    KindWithoutPath { label: String },
    #[snafu(display("Node '{label}' has a path but no kind"))]
    PathWithoutKind { label: String },
    #[snafu(display("Only file nodes may carry a note, but '{label}' does"))]
    NoteOnNonFile { label: String },
    #[snafu(display("The note of '{label}' should be text"))]
    NoteNotText { label: String },
    #[snafu(display("'{key}: {value}' is read as a number or boolean; quote it to keep it as text"))]
    UnquotedScalar { key: String, value: String },
    #[snafu(display("Path {} is not valid UTF-8", path.display()))]
    NonUtf8Path { path: PathBuf },
    #[snafu(display("The outline describes an invalid tree"))]
    InvalidDocument { source: DocumentError },
}
