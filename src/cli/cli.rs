use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::data::LogLevel;

/// Turn a directory tree into an editable outline, and an edited outline
/// into the shell commands that reorganize the tree to match.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    #[clap(long, short, default_value = "warn", value_enum, global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write an outline of a directory tree
    Makemap {
        /// Where to write the outline
        map_file: PathBuf,
        /// The directory to describe
        input_dir: PathBuf,
        /// Attach every file's text to its node
        #[clap(long)]
        include_text: bool,
    },
    /// Print the commands that make the tree match an edited outline
    Apply {
        /// The edited outline
        map_file: PathBuf,
    },
    /// Write an outline made with --include-text out as a new directory tree
    Materialize {
        /// The outline to write out
        map_file: PathBuf,
        /// Where to create the tree
        output_dir: PathBuf,
    },
}
