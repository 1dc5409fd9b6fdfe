use refscope_core::ExitCode;
use refscope_science::ScienceError;
use thiserror::Error;

use crate::task::TaskAborted;

/// Why an import by identifier did not produce a new entry. The display text
/// is what the user sees in the failure dialog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Could not find any bibliographic information.")]
    NotFound,

    #[error("Entry already exists")]
    DuplicateExists,

    #[error("Fetcher error: {0}")]
    Fetcher(String),

    #[error(transparent)]
    Aborted(#[from] TaskAborted),
}

impl ImportError {
    /// Process exit code for a front end that stops after one import.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::NotFound => ExitCode::NotFound,
            Self::DuplicateExists => ExitCode::Conflict,
            Self::Fetcher(_) | Self::Aborted(_) => ExitCode::GeneralError,
        }
    }
}

impl From<ScienceError> for ImportError {
    fn from(err: ScienceError) -> Self {
        Self::Fetcher(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
