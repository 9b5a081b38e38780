//! Change synthesis: from an edited outline to reviewable shell commands.

mod change;
mod emitter;
mod synthesizer;

pub use change::{Change, Concatenation, Substitution};
pub use emitter::CommandEmitter;
pub use synthesizer::{SynthesisError, synthesize_document};
