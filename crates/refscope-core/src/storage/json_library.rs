use std::fs;
use std::path::Path;

use crate::error::{RefscopeError, Result};
use crate::models::{DatabaseMode, Library};

/// Save a library as pretty-printed JSON, creating parent directories.
pub fn save_library(path: &Path, library: &Library) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(library)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load a library from a JSON file.
pub fn load_library(path: &Path) -> Result<Library> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| RefscopeError::InvalidLibrary(format!("{}: {e}", path.display())))
}

/// Load the library at `path`, or start an empty one in `mode` if the file is missing.
pub fn load_or_create(path: &Path, mode: DatabaseMode) -> Result<Library> {
    if !path.exists() {
        return Ok(Library::new(mode));
    }
    load_library(path)
}
