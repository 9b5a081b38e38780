use std::path::{Path, PathBuf};

use derive_more::{Display, IsVariant};

/// A filesystem operation needed to bring the disk in line with the outline.
#[derive(Debug, Clone, PartialEq, Eq, Display, IsVariant)]
pub enum Change {
    #[display("make directory {}", _0.display())]
    MakeDirectory(PathBuf),
    #[display("move {} to {}", from.display(), to.display())]
    Move { from: PathBuf, to: PathBuf },
    #[display("{_0}")]
    Concatenate(Concatenation),
}

/// Files appended, in order, to `destination` and then removed.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("append {} file(s) to {}", sources.len(), destination.display())]
pub struct Concatenation {
    destination: PathBuf,
    sources: Vec<PathBuf>,
}

impl Concatenation {
    /// Returns `None` when there is nothing to append.
    pub fn new(destination: PathBuf, sources: Vec<PathBuf>) -> Option<Self> {
        (!sources.is_empty()).then_some(Concatenation {
            destination,
            sources,
        })
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

/// Rewrites paths under `from` so they read as if already moved to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    from: PathBuf,
    to: PathBuf,
}

impl Substitution {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Substitution {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn apply(&self, path: &Path) -> Option<PathBuf> {
        let rest = path.strip_prefix(&self.from).ok()?;
        if rest.as_os_str().is_empty() {
            Some(self.to.clone())
        } else {
            Some(self.to.join(rest))
        }
    }
}

/// Rewrites `path` with the closest enclosing substitution.
///
/// `substitutions` is ordered from the outermost moved ancestor to the
/// innermost one, so it is searched from the back.
pub fn substitute_path(path: &Path, substitutions: &[Substitution]) -> PathBuf {
    substitutions
        .iter()
        .rev()
        .find_map(|substitution| substitution.apply(path))
        .unwrap_or_else(|| path.to_path_buf())
}

impl Change {
    pub fn substituted(self, substitutions: &[Substitution]) -> Self {
        if substitutions.is_empty() {
            return self;
        }
        let rewrite = |path: PathBuf| substitute_path(&path, substitutions);

        match self {
            Change::MakeDirectory(path) => Change::MakeDirectory(rewrite(path)),
            Change::Move { from, to } => Change::Move {
                from: rewrite(from),
                to: rewrite(to),
            },
            Change::Concatenate(Concatenation {
                destination,
                sources,
            }) => Change::Concatenate(Concatenation {
                destination: rewrite(destination),
                sources: sources.into_iter().map(rewrite).collect(),
            }),
        }
    }

    /// A move whose source and destination coincide does nothing.
    pub fn is_moot(&self) -> bool {
        matches!(self, Change::Move { from, to } if from == to)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/r/d", Some("/r/e/d"))]
    #[case("/r/d/f.txt", Some("/r/e/d/f.txt"))]
    #[case("/r/d/sub/f.txt", Some("/r/e/d/sub/f.txt"))]
    #[case("/r/dd/f.txt", None)]
    #[case("/r/f.txt", None)]
    fn substitution_matches_whole_components(#[case] path: &str, #[case] expected: Option<&str>) {
        let substitution = Substitution::new("/r/d", "/r/e/d");
        assert_eq!(
            substitution.apply(Path::new(path)),
            expected.map(PathBuf::from)
        );
    }

    #[test]
    fn closest_enclosing_substitution_wins() {
        let substitutions = vec![
            Substitution::new("/r/a", "/r/a2"),
            Substitution::new("/r/a/b", "/r/x/b"),
        ];

        assert_eq!(
            substitute_path(Path::new("/r/a/b/f"), &substitutions),
            PathBuf::from("/r/x/b/f")
        );
        assert_eq!(
            substitute_path(Path::new("/r/a/c"), &substitutions),
            PathBuf::from("/r/a2/c")
        );
        assert_eq!(
            substitute_path(Path::new("/elsewhere"), &substitutions),
            PathBuf::from("/elsewhere")
        );
    }

    #[test]
    fn substitution_rewrites_every_path_of_a_change() {
        let substitutions = vec![Substitution::new("/r/d", "/r/e")];
        let concatenation = Concatenation::new(
            "/r/d/a".into(),
            vec!["/r/d/b".into(), "/r/other".into()],
        )
        .expect("has sources");

        let rewritten = Change::Concatenate(concatenation).substituted(&substitutions);

        let Change::Concatenate(rewritten) = rewritten else {
            panic!("Expected a concatenation");
        };
        assert_eq!(rewritten.destination(), Path::new("/r/e/a"));
        assert_eq!(
            rewritten.sources(),
            &[PathBuf::from("/r/e/b"), PathBuf::from("/r/other")]
        );
    }

    #[test]
    fn only_self_moves_are_moot() {
        let same = Change::Move {
            from: "/r/a".into(),
            to: "/r/a".into(),
        };
        let different = Change::Move {
            from: "/r/a".into(),
            to: "/r/b".into(),
        };

        assert!(same.is_moot());
        assert!(!different.is_moot());
        assert!(!Change::MakeDirectory("/r/a".into()).is_moot());
    }

    #[test]
    fn concatenation_needs_a_source() {
        assert!(Concatenation::new("/r/a".into(), Vec::new()).is_none());
    }
}
