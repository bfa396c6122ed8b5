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

fn normalize_data_relative(path: &Path) -> PathBuf {
    path.strip_prefix("data")
        .map(PathBuf::from)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn env_data_dir() -> Option<String> {
    std::env::var(DATA_DIR_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the active data directory using precedence:
/// 1) explicit setting
/// 2) `DATA_DIR`
/// 3) cwd-relative `./data`
pub fn resolve_data_dir(explicit_data_dir: Option<&str>) -> PathBuf {
    if let Some(dir) = explicit_data_dir
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .or_else(env_data_dir)
    {
        return absolute(PathBuf::from(dir));
    }
    absolute(PathBuf::from("data"))
}

/// Resolve a path that may be absolute or relative. Relative paths (with or
/// without a leading `data/`) land inside the data directory.
pub fn resolve_data_path(raw_path: &str, explicit_data_dir: Option<&str>) -> PathBuf {
    let as_path = PathBuf::from(raw_path);
    if as_path.is_absolute() {
        return as_path;
    }
    resolve_data_dir(explicit_data_dir).join(normalize_data_relative(&as_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_pass_through() {
        let p = resolve_data_path("/var/lib/refiner/vault.json", Some("/tmp/ignored"));
        assert_eq!(p, PathBuf::from("/var/lib/refiner/vault.json"));
    }

    #[test]
    fn data_prefix_is_not_doubled() {
        let p = resolve_data_path("data/vault.json", Some("/srv/refiner"));
        assert_eq!(p, PathBuf::from("/srv/refiner/vault.json"));
    }
}
