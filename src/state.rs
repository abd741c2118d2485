//! Atomic JSON state persistence.
//!
//! Whole-file snapshot semantics: `load_state` reads the complete value,
//! `save_state` writes to a temp file in the same directory and renames it
//! into place so readers never observe a partial write. A missing file is
//! the empty/default state; a corrupt file is an error the caller decides
//! how to surface.

use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load state from `path`, or the default value when the file doesn't exist.
pub fn load_state<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => {
            return Err(e).wrap_err_with(|| format!("failed to read {}", path.display()));
        }
    };
    serde_json::from_str(&content)
        .wrap_err_with(|| format!("failed to parse {}", path.display()))
}

/// Atomically persist `value` as pretty-printed JSON at `path`.
pub fn save_state<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value).wrap_err("failed to serialize state")?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .wrap_err_with(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .wrap_err_with(|| format!("failed to move {} into place", tmp.display()))?;

    Ok(())
}
