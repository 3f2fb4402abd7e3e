//! Data directory resolution
//!
//! Sandboxed installs take precedence: a Snap exposes `$SNAP_USER_COMMON`, a
//! Flatpak sets `$XDG_DATA_HOME` to a per-app directory. Everywhere else the
//! platform data directory is used.

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::APPLICATION_SHORT;

/// Flatpak application id, already part of `$XDG_DATA_HOME` inside the sandbox
pub const APPLICATION_ID: &str = "io.sotto.App";

/// Root directory for models, settings and scratch files
pub fn data_dir() -> PathBuf {
    resolve_data_dir(
        std::env::var("SNAP_USER_COMMON").ok(),
        std::env::var("XDG_DATA_HOME").ok(),
    )
}

/// Scratch directory under the data root.
///
/// Kept inside the data directory so it stays writable in sandboxes.
pub fn tmp_dir() -> PathBuf {
    data_dir().join("tmp")
}

/// Location of the JSON settings file
pub fn settings_file() -> PathBuf {
    data_dir().join("settings.json")
}

fn resolve_data_dir(snap_user_common: Option<String>, xdg_data_home: Option<String>) -> PathBuf {
    if let Some(snap) = snap_user_common.filter(|s| !s.is_empty()) {
        return PathBuf::from(snap);
    }

    if let Some(xdg) = xdg_data_home.filter(|s| !s.is_empty()) {
        return if xdg.contains(APPLICATION_ID) {
            PathBuf::from(xdg)
        } else {
            PathBuf::from(xdg).join(APPLICATION_SHORT)
        };
    }

    ProjectDirs::from("io", "sotto", APPLICATION_SHORT)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".").join(APPLICATION_SHORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_takes_precedence() {
        let dir = resolve_data_dir(Some("/snap/common".into()), Some("/xdg".into()));
        assert_eq!(dir, PathBuf::from("/snap/common"));
    }

    #[test]
    fn test_xdg_appends_short_name() {
        let dir = resolve_data_dir(None, Some("/home/u/.local/share".into()));
        assert_eq!(dir, PathBuf::from("/home/u/.local/share/sotto"));
    }

    #[test]
    fn test_flatpak_xdg_used_as_is() {
        let xdg = format!("/home/u/.var/app/{}/data", APPLICATION_ID);
        assert_eq!(resolve_data_dir(None, Some(xdg.clone())), PathBuf::from(xdg));
    }

    #[test]
    fn test_empty_values_ignored() {
        let dir = resolve_data_dir(Some(String::new()), Some(String::new()));
        assert!(dir.ends_with(APPLICATION_SHORT) || dir.to_string_lossy().contains(APPLICATION_SHORT));
    }
}
