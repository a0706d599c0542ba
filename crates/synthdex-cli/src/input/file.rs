use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON document (definition, price map or series) into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let resolved = resolve_path(path)?;
    let contents = fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", resolved.display(), e).into())
}

fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let resolved = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !resolved.is_file() {
        return Err(format!("Not a readable file: {}", resolved.display()).into());
    }
    Ok(resolved)
}
