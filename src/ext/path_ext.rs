use std::path::{Component, Path, PathBuf};

/// Resolves `path` against the working directory and drops `.`/`..`
/// components, without requiring the path to exist.
pub fn absolutize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(current_dir) => current_dir.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    normalize_path(&absolute_path)
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !components.is_empty()
                    && !matches!(components.last(), Some(Component::RootDir))
                {
                    components.pop();
                }
            }
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

pub trait PathExt {
    /// Absolute, normalized rendering for messages and logs.
    fn best_effort_path_display(&self) -> String;
}

impl PathExt for Path {
    fn best_effort_path_display(&self) -> String {
        absolutize(self).display().to_string()
    }
}

impl PathExt for PathBuf {
    fn best_effort_path_display(&self) -> String {
        self.as_path().best_effort_path_display()
    }
}
