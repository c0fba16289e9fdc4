// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "DATA_DIR";

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn env_data_dir() -> Option<String> {
    std::env::var(DATA_DIR_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve a data file. Absolute paths pass through; relative ones are placed under
/// the configured data directory (explicit, then `DATA_DIR`), with a leading `data/`
/// component folded into it, or resolved against the working directory otherwise.
pub fn resolve_data_path(raw_path: &str, explicit_data_dir: Option<&str>) -> PathBuf {
    let as_path = PathBuf::from(raw_path);
    if as_path.is_absolute() {
        return as_path;
    }
    let data_dir = explicit_data_dir
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .or_else(env_data_dir);
    match data_dir {
        Some(dir) => {
            let rel = as_path
                .strip_prefix("data")
                .map(Path::to_path_buf)
                .unwrap_or(as_path);
            absolute(PathBuf::from(dir).join(rel))
        }
        None => absolute(as_path),
    }
}

/// Like [`resolve_data_path`] but only returns paths that exist.
pub fn existing_data_path(raw_path: &str, explicit_data_dir: Option<&str>) -> Option<PathBuf> {
    let resolved = resolve_data_path(raw_path, explicit_data_dir);
    resolved.exists().then_some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_pass_through() {
        let p = resolve_data_path("/etc/tokenlist.json", Some("/srv/data"));
        assert_eq!(p, PathBuf::from("/etc/tokenlist.json"));
    }

    #[test]
    fn data_prefix_folds_into_explicit_dir() {
        let p = resolve_data_path("data/tokenlist.json", Some("/srv/migrate"));
        assert_eq!(p, PathBuf::from("/srv/migrate/tokenlist.json"));
    }

    #[test]
    fn missing_files_are_filtered() {
        assert!(existing_data_path("definitely-missing.json", Some("/nonexistent-dir")).is_none());
    }
}
