use std::path::PathBuf;

use crate::cli::{Cli, Command};
use crate::ext::absolutize;

/// What one invocation should do, with every path made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub map_file: PathBuf,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    MakeMap {
        input_dir: PathBuf,
        include_text: bool,
    },
    Apply,
    Materialize {
        output_dir: PathBuf,
    },
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        match cli.command {
            Command::Makemap {
                map_file,
                input_dir,
                include_text,
            } => Self {
                map_file: absolutize(&map_file),
                action: Action::MakeMap {
                    input_dir: absolutize(&input_dir),
                    include_text,
                },
            },
            Command::Apply { map_file } => Self {
                map_file: absolutize(&map_file),
                action: Action::Apply,
            },
            Command::Materialize {
                map_file,
                output_dir,
            } => Self {
                map_file: absolutize(&map_file),
                action: Action::Materialize {
                    output_dir: absolutize(&output_dir),
                },
            },
        }
    }
}
