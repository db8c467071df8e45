use thiserror::Error;

/// Errors raised anywhere in the pipeline, from construction through batch
/// assembly. Each variant carries a short human string naming the failing
/// file or the offending dimensions/type — no error codes.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid parameter detected at construction (e.g. a 256-element table
    /// of the wrong length, an empty file list, `batch_size == 0`).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The codec facade returned no data for a path (missing file, unreadable
    /// format).
    #[error("failed to decode `{path}`: {source}")]
    Io { path: String, source: String },

    /// A size or type mismatch was observed after augmentation (mismatched
    /// planes, dims differing from the first-pair reference).
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// `ColorMapper` saw an RGB triple absent from its lookup table.
    #[error("unmapped color {rgb:?} in `{path}`")]
    UnknownColor { path: String, rgb: (u8, u8, u8) },

    /// The underlying container has nothing to iterate.
    #[error("iterator exhausted: {0}")]
    Exhaustion(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
