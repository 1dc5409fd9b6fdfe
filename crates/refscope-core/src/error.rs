use thiserror::Error;

/// All errors that can occur in refscope-core.
#[derive(Debug, Error)]
pub enum RefscopeError {
    #[error("Unknown entry type: {0}")]
    UnknownEntryType(String),

    #[error("Entry type '{entry_type}' is not available in {mode} mode")]
    EntryTypeNotAllowed { entry_type: String, mode: String },

    #[error("Unknown database mode: {0}")]
    UnknownMode(String),

    #[error("Library file is not valid: {0}")]
    InvalidLibrary(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Exit codes used by the `refscope` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    Conflict = 7,
}

pub type Result<T> = std::result::Result<T, RefscopeError>;
