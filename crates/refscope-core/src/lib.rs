pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, CoreConfig, ImportConfig};
pub use error::{ExitCode, RefscopeError, Result};
pub use models::*;

pub use storage::json_library::{load_library, load_or_create, save_library};
