use std::io::{self, Write};
use std::path::Path;

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::application::{Action, RuntimeConfig};
use crate::changes::{CommandEmitter, SynthesisError, synthesize_document};
use crate::document::{Document, OutlineError};
use crate::filesystem::{LoadError, MaterializeError, TreeLoader, materialize};

pub struct Application;

impl Application {
    pub async fn run(config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let config: RuntimeConfig = config.into();
        debug!("Runtime config: {:?}", config);

        match &config.action {
            Action::MakeMap {
                input_dir,
                include_text,
            } => Self::make_map(&config.map_file, input_dir, *include_text).await,
            Action::Apply => {
                let mut stdout = io::stdout().lock();
                Self::apply(&config.map_file, CommandEmitter::for_stdout(), &mut stdout).await
            }
            Action::Materialize { output_dir } => {
                Self::materialize(&config.map_file, output_dir).await
            }
        }
    }

    async fn make_map(
        map_file: &Path,
        input_dir: &Path,
        include_text: bool,
    ) -> Result<(), ApplicationError> {
        info!(
            "Converting {} to outline {}",
            input_dir.display(),
            map_file.display()
        );
        let document = TreeLoader::new(include_text)
            .skipping(map_file.to_path_buf())
            .load(input_dir)
            .await
            .context(LoadSnafu)?;
        document.write(map_file).await.context(OutlineSnafu)?;
        info!(
            "Wrote {} node(s) to {}",
            document.walk().count(),
            map_file.display()
        );
        Ok(())
    }

    /// Prints the commands for an edited outline, then the removal of the
    /// outline itself. Nothing is printed unless synthesis succeeds.
    async fn apply(
        map_file: &Path,
        emitter: CommandEmitter,
        out: &mut impl Write,
    ) -> Result<(), ApplicationError> {
        let document = Document::read(map_file).await.context(OutlineSnafu)?;
        let changes = synthesize_document(&document).map_err(|source| {
            if source.is_domain() {
                warn!("The outline asks for something that cannot be done; edit it and retry");
                ApplicationError::InvalidEditError { source }
            } else {
                ApplicationError::CorruptedOutlineError { source }
            }
        })?;
        info!(
            "{} change(s) to apply: {} new director(ies), {} move(s), {} merge(s)",
            changes.len(),
            changes.iter().filter(|change| change.is_make_directory()).count(),
            changes.iter().filter(|change| change.is_move()).count(),
            changes.iter().filter(|change| change.is_concatenate()).count(),
        );

        let mut lines = emitter.render_all(&changes);
        lines.push(emitter.render_removal(map_file));
        emitter.write_lines(&lines, out).context(OutputSnafu)
    }

    async fn materialize(map_file: &Path, output_dir: &Path) -> Result<(), ApplicationError> {
        let document = Document::read(map_file).await.context(OutlineSnafu)?;
        materialize(&document, output_dir)
            .await
            .context(MaterializeSnafu)?;
        info!("Materialized outline into {}", output_dir.display());
        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while reading the directory tree"))]
    LoadError { source: LoadError },
    #[snafu(display("Critical failure encountered while handling the outline file"))]
    OutlineError { source: OutlineError },
    #[snafu(display("The edited outline cannot be applied"))]
    InvalidEditError { source: SynthesisError },
    #[snafu(display("The outline is corrupted"))]
    CorruptedOutlineError { source: SynthesisError },
    #[snafu(display("Critical failure encountered while writing the directory tree"))]
    MaterializeError { source: MaterializeError },
    #[snafu(display("Failed to write commands to stdout"))]
    OutputError { source: io::Error },
}
