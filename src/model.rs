use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistSource {
    Paths(Vec<PathBuf>),
    Csv(PathBuf),
    Directory(PathBuf),
}

impl PlaylistSource {
    pub fn from_path(path: &Path) -> Self {
        let is_csv = path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::Csv(path.to_path_buf())
        } else {
            Self::Directory(path.to_path_buf())
        }
    }

    pub fn from_args(mut paths: Vec<PathBuf>) -> Option<Self> {
        match paths.len() {
            0 => None,
            1 => paths.pop().map(|path| Self::from_path(&path)),
            _ => Some(Self::Paths(paths)),
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Paths(_) => "list",
            Self::Csv(_) => "CSV",
            Self::Directory(_) => "folder",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub last_source: Option<PlaylistSource>,
    #[serde(default = "default_saved_volume")]
    pub saved_volume: f32,
}

fn default_saved_volume() -> f32 {
    1.0
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            last_source: None,
            saved_volume: default_saved_volume(),
        }
    }
}
