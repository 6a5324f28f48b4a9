//! Crate-wide error type.
//!
//! Every failure is raised at the point of detection and surfaced to the
//! caller unchanged; nothing in the library retries or degrades silently.
//! The binary maps each kind to a process exit code via [`Error::exit_code`].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wrong type or shape for a name, unit, data buffer, error buffer or selector.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A reference (parameter, measurement, axis or data index) does not resolve.
    #[error("index {index} out of range for {what} of length {len}")]
    IndexOutOfRange {
        what: &'static str,
        index: isize,
        len: usize,
    },

    /// Two sequences that must be aligned (or broadcastable) are not.
    #[error("length mismatch: {0}")]
    LengthMismatch(String),

    /// The fit name is not present in the function registry.
    #[error("`{0}` is not a fit function")]
    UnknownFit(String),

    /// A third distinct Y scale was requested on one figure.
    #[error("only two Y scales supported per figure (requested `{requested}`)")]
    AxisConflict { requested: String },

    /// `locate` found neither an exact match nor an element at or above the value.
    #[error("value {0} not found")]
    NotFound(f64),

    /// The least-squares solver did not produce a result.
    #[error("fit failed: {0}")]
    SolverFailure(String),

    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("render failed: {0}")]
    Render(String),
}

impl Error {
    /// Process exit code for this error kind.
    ///
    /// - `2`: bad input (arguments, files, shapes)
    /// - `3`: lookups that do not resolve
    /// - `4`: fitting or rendering failures
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InvalidInput(_) | Error::LengthMismatch(_) | Error::Io { .. } => 2,
            Error::IndexOutOfRange { .. } | Error::UnknownFit(_) | Error::NotFound(_) => 3,
            Error::AxisConflict { .. } | Error::SolverFailure(_) | Error::Render(_) => 4,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Error::LengthMismatch(message.into())
    }

    pub(crate) fn solver(message: impl Into<String>) -> Self {
        Error::SolverFailure(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
