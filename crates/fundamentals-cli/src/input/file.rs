use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .with_context(|| format!("Failed to read '{}'", canonical.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse '{}'", canonical.display()))
}

/// Resolve relative paths against the working directory and make sure the
/// target is a regular file.
fn resolve_path(path: &Path) -> anyhow::Result<PathBuf> {
    let canonical = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    if !canonical.exists() {
        bail!("File not found: {}", canonical.display());
    }
    if !canonical.is_file() {
        bail!("Not a file: {}", canonical.display());
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_reads_json_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("dcf.json");
        fs::write(&file, r#"{"base_fcf": "120"}"#).unwrap();
        let value: Value = read_json(&file).unwrap();
        assert_eq!(value["base_fcf"], "120");
    }

    #[test]
    fn test_directory_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_json::<Value>(tmp.path()).unwrap_err();
        assert!(err.to_string().starts_with("Not a file"));
    }
}
