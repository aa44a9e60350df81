use crate::model::PersistedState;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

const APP_DIR: &str = "spinlist";
const STATE_FILE: &str = "state.json";
const LOG_FILE: &str = "spinlist.log";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("SPINLIST_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = if cfg!(windows) {
        env::var("USERPROFILE").context("USERPROFILE is not set")?
    } else {
        env::var("HOME").context("HOME is not set")?
    };
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn state_path() -> Result<PathBuf> {
    Ok(config_root()?.join(STATE_FILE))
}

pub fn log_path() -> Result<PathBuf> {
    Ok(config_root()?.join(LOG_FILE))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

pub fn load_state() -> Result<PersistedState> {
    let path = state_path()?;
    if !path.exists() {
        return Ok(PersistedState::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read state file {}", path.display()))?;
    let state: PersistedState = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse state file {}", path.display()))?;
    Ok(state)
}

pub fn save_state(state: &PersistedState) -> Result<()> {
    ensure_config_dir()?;
    let path = state_path()?;
    let json = serde_json::to_string_pretty(state)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "state saved");
    Ok(())
}

/// Joins `path` onto the working directory and folds `.` and `..` without
/// touching the filesystem, so missing files still get an absolute form.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .context("failed to resolve current directory")?
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    normalized.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                ) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(strip_windows_verbatim_prefix(&normalized))
}

pub fn strip_windows_verbatim_prefix(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();

    if let Some(trimmed) = raw.strip_prefix(r"\\?\UNC\") {
        return PathBuf::from(format!(r"\\{trimmed}"));
    }

    if let Some(trimmed) = raw.strip_prefix(r"\\?\") {
        return PathBuf::from(trimmed);
    }

    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlaylistSource;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().expect("tempdir");
        unsafe {
            env::set_var("SPINLIST_CONFIG_DIR", dir.path().to_string_lossy().as_ref());
        }

        let state = PersistedState {
            last_source: Some(PlaylistSource::Csv(PathBuf::from("/data/mix.csv"))),
            saved_volume: 0.4,
        };
        save_state(&state).expect("save");
        let loaded = load_state().expect("load");
        assert_eq!(loaded.last_source, state.last_source);
        assert_eq!(loaded.saved_volume, 0.4);
    }

    #[test]
    fn strips_windows_verbatim_prefix() {
        let cleaned = strip_windows_verbatim_prefix(Path::new(r"\\?\E:\LOCALMUSIC\a.mp3"));
        assert_eq!(cleaned, PathBuf::from(r"E:\LOCALMUSIC\a.mp3"));
    }

    #[cfg(unix)]
    #[test]
    fn absolute_path_folds_dot_segments() {
        assert_eq!(
            absolute_path(Path::new("/music/./albums/../singles/a.mp3")).expect("absolute"),
            PathBuf::from("/music/singles/a.mp3")
        );
        assert_eq!(
            absolute_path(Path::new("/../a.mp3")).expect("absolute"),
            PathBuf::from("/a.mp3")
        );
    }

    #[test]
    fn relative_paths_are_anchored_at_working_directory() {
        let cwd = env::current_dir().expect("cwd");
        assert_eq!(
            absolute_path(Path::new("song.mp3")).expect("absolute"),
            cwd.join("song.mp3")
        );
    }
}
