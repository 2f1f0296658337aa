//! Error Taxonomy - Fail-Fast, All-or-Nothing
//!
//! Every error is fatal: the pipeline aborts and no artifact is written
//! (the one exception is packaging, which runs after the artifact exists
//! and preserves it for diagnosis).

use std::path::PathBuf;
use thiserror::Error;

use crate::parse::BlockKind;

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    /// No `Root{` or no `Layout{` marker was found in the document.
    #[error("missing {marker} block in layout source")]
    MissingStructure { marker: &'static str },

    /// Two or more blocks declared the same identifier.
    /// The message lists every duplicated value.
    #[error("duplicate id declarations: {}", .ids.join(", "))]
    DuplicateId { ids: Vec<String> },

    /// A Root or Layout block carries no `id:` declaration, so its
    /// descriptor would not be addressable at runtime.
    #[error("{kind} block has no id declaration")]
    MissingId { kind: BlockKind },

    /// A color name or keyword outside the known tables, rejected under
    /// the strict policy.
    #[error("unrecognized {attribute} value {value:?}")]
    UnknownValue { attribute: String, value: String },

    #[error("cannot read source {path}: {source}")]
    SourceNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Artifact write failure. The temporary file is discarded; nothing
    /// truncated is ever left at the destination path.
    #[error("artifact write failed: {source}")]
    Serialization { source: std::io::Error },

    /// The downstream object-packaging tool failed. The binary artifact
    /// itself is preserved.
    #[error("packaging tool {tool} failed: {reason}")]
    Packaging { tool: String, reason: String },

    /// An artifact handed to the decoder does not follow the wire layout.
    #[error("malformed artifact: {0}")]
    MalformedArtifact(String),
}
