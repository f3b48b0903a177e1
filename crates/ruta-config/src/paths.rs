//! Search paths for platform route tables.
//!
//! - **User tables**: `~/.config/ruta/platforms/` (Linux), `~/Library/Application Support/ruta/platforms/` (macOS), `%APPDATA%\ruta\platforms\` (Windows)
//! - **System tables**: `/etc/ruta/platforms/` (Linux), `/Library/Application Support/ruta/platforms/` (macOS)

use std::path::{Path, PathBuf};

use crate::ConfigError;

const APP_NAME: &str = "ruta";

const PLATFORMS_SUBDIR: &str = "platforms";

/// Returns the user-specific platform tables directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_platforms_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(PLATFORMS_SUBDIR)
}

/// Returns the system-wide platform tables directory.
pub fn system_platforms_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/etc").join(APP_NAME).join(PLATFORMS_SUBDIR)
    }
    #[cfg(target_os = "macos")]
    {
        PathBuf::from("/Library/Application Support")
            .join(APP_NAME)
            .join(PLATFORMS_SUBDIR)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
            .join(PLATFORMS_SUBDIR)
    }
}

/// Find a platform table by path or name.
///
/// Searches in order: the path itself, the current directory, the user
/// directory, the system directory. A `.toml` extension is added to bare
/// names.
pub fn find_platform(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };

    [
        PathBuf::from("."),
        user_platforms_dir(),
        system_platforms_dir(),
    ]
    .into_iter()
    .map(|dir| dir.join(&filename))
    .find(|candidate| candidate.is_file())
}

/// Ensure the user platform tables directory exists.
pub fn ensure_user_platforms_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_platforms_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// List table files in the user then system directories.
pub fn list_platforms() -> Vec<PathBuf> {
    let mut tables = list_tables_in_dir(&user_platforms_dir());
    tables.extend(list_tables_in_dir(&system_platforms_dir()));
    tables
}

fn list_tables_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut tables: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    tables.sort();
    tables
}

/// Platform name from a table path (the file stem).
pub fn platform_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn dirs_are_named_after_the_app() {
        assert!(user_platforms_dir().to_string_lossy().contains("ruta"));
        assert!(system_platforms_dir().ends_with("ruta/platforms"));
    }

    #[test]
    fn find_platform_by_path() {
        let temp_dir = TempDir::new().unwrap();
        let table = temp_dir.path().join("board.toml");
        fs::write(&table, "name = \"board\"").unwrap();
        assert_eq!(find_platform(table.to_str().unwrap()), Some(table));
    }

    #[test]
    fn find_platform_not_found() {
        assert!(find_platform("nonexistent_platform_12345").is_none());
    }

    #[test]
    fn list_only_toml_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.toml"), "").unwrap();
        fs::write(temp_dir.path().join("a.toml"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();

        let tables = list_tables_in_dir(temp_dir.path());
        let names: Vec<_> = tables
            .iter()
            .filter_map(|p| platform_name_from_path(p))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn list_missing_dir_is_empty() {
        assert!(list_tables_in_dir(Path::new("/nonexistent/path/12345")).is_empty());
    }
}
