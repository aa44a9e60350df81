use crate::config;
use crate::cursor::{Exhausted, PlaylistCursor};
use crate::library;
use crate::model::{PersistedState, PlaylistSource};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Owns the single live playlist cursor and the state the screen shows
/// around it. Loading a new source swaps the cursor out wholesale.
#[derive(Debug)]
pub struct PlayerCore {
    cursor: Option<PlaylistCursor>,
    pub source: Option<PlaylistSource>,
    pub current_track: Option<PathBuf>,
    pub saved_volume: f32,
    pub dirty: bool,
    pub status: String,
}

impl PlayerCore {
    pub fn from_persisted(state: PersistedState) -> Self {
        Self {
            cursor: None,
            source: state.last_source,
            current_track: None,
            saved_volume: state.saved_volume,
            dirty: true,
            status: String::from("Ready"),
        }
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            last_source: self.source.clone(),
            saved_volume: self.saved_volume,
        }
    }

    pub fn save(&mut self) -> Result<()> {
        config::save_state(&self.persisted_state())?;
        self.set_status("State saved");
        Ok(())
    }

    pub fn cursor(&self) -> Option<&PlaylistCursor> {
        self.cursor.as_ref()
    }

    /// Replaces the playlist with one built from `source` and selects its
    /// first playable track. On failure the previous playlist stays loaded.
    pub fn load(&mut self, source: PlaylistSource) -> Result<Option<PathBuf>> {
        let cursor = match PlaylistCursor::from_source(&source) {
            Ok(cursor) => cursor,
            Err(err) => {
                tracing::warn!(?source, "failed to load playlist: {err:#}");
                self.set_status(&format!("load error: {err:#}"));
                return Err(err);
            }
        };

        let count = PlaylistCursor::count(&cursor);
        let kind = source.kind_label();
        tracing::info!(?source, tracks = count, "playlist loaded");

        self.cursor = Some(cursor);
        self.source = Some(source);
        self.current_track = None;

        if count == 0 {
            self.set_status(&format!("No MP3 files in {kind}"));
            return Ok(None);
        }

        let first = self.next_track();
        let found = format!("Found {count} track(s) in {kind}");
        match first {
            Some(_) => self.set_status(&found),
            None => self.set_status(&format!("{found}, no playable track")),
        }
        Ok(first)
    }

    /// Reloads the remembered source, if any.
    pub fn reload(&mut self) -> Result<Option<PathBuf>> {
        let Some(source) = self.source.clone() else {
            self.set_status("Nothing to reload");
            return Ok(None);
        };
        self.load(source)
    }

    pub fn next_track(&mut self) -> Option<PathBuf> {
        self.step(PlaylistCursor::advance)
    }

    pub fn prev_track(&mut self) -> Option<PathBuf> {
        self.step(PlaylistCursor::rewind)
    }

    fn step<F>(&mut self, mut move_cursor: F) -> Option<PathBuf>
    where
        F: for<'a> FnMut(&'a mut PlaylistCursor) -> Result<&'a Path, Exhausted>,
    {
        let Some(cursor) = self.cursor.as_mut() else {
            self.set_status("No playlist loaded");
            return None;
        };

        let found = match move_cursor(cursor) {
            Ok(path) => Some(path.to_path_buf()),
            Err(Exhausted) => {
                tracing::debug!("playlist exhausted, wrapping to start");
                cursor.reset();
                move_cursor(cursor).ok().map(Path::to_path_buf)
            }
        };

        match found {
            Some(path) => {
                self.set_status(&format!("Track: {}", library::display_name(&path)));
                self.current_track = Some(path.clone());
                Some(path)
            }
            None => {
                tracing::info!("no playable track in playlist");
                self.current_track = None;
                self.set_status("No playable track");
                None
            }
        }
    }

    pub fn controls_enabled(&self) -> bool {
        self.cursor.as_ref().is_some_and(|cursor| !cursor.is_empty())
    }

    pub fn play_enabled(&self) -> bool {
        self.controls_enabled() && self.current_track.is_some()
    }

    pub fn track_name(&self) -> String {
        self.current_track
            .as_deref()
            .map(library::display_name)
            .unwrap_or_else(|| String::from("--"))
    }

    pub fn progress_label(&self) -> String {
        let (index, count) = self
            .cursor
            .as_ref()
            .map(|cursor| (cursor.current_index(), cursor.count()))
            .unwrap_or((0, 0));
        format!("Tracks: {index}/{count}")
    }

    pub fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}
