use crate::library;
use crate::model::PlaylistSource;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// No playable entry remains between the cursor position and the end of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("playlist exhausted")]
pub struct Exhausted;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Unstarted,
    Positioned,
}

/// Ordered list of track paths plus the index of the next candidate.
///
/// `position` always stays in `0..=entries.len()`. Entries that are not
/// playable are skipped by the forward scan rather than removed.
#[derive(Debug, Clone)]
pub struct PlaylistCursor {
    entries: Vec<PathBuf>,
    position: usize,
    state: CursorState,
}

impl PlaylistCursor {
    pub fn from_paths<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let entries = paths
            .into_iter()
            .map(|path| crate::config::absolute_path(path.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_entries(entries))
    }

    pub fn from_csv(path: &Path) -> Result<Self> {
        Ok(Self::with_entries(library::read_csv(path)?))
    }

    pub fn from_directory(path: &Path) -> Result<Self> {
        Ok(Self::with_entries(library::scan_directory(path)?))
    }

    pub fn from_source(source: &PlaylistSource) -> Result<Self> {
        match source {
            PlaylistSource::Paths(paths) => Self::from_paths(paths),
            PlaylistSource::Csv(path) => Self::from_csv(path),
            PlaylistSource::Directory(path) => Self::from_directory(path),
        }
    }

    fn with_entries(entries: Vec<PathBuf>) -> Self {
        Self {
            entries,
            position: 0,
            state: CursorState::Unstarted,
        }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.position
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn reset(&mut self) {
        self.position = 0;
        self.state = CursorState::Unstarted;
    }

    /// Returns the next playable entry at or after the current position.
    pub fn advance(&mut self) -> Result<&Path, Exhausted> {
        let index = self.scan_forward()?;
        Ok(self.entries[index].as_path())
    }

    /// Steps back over the entry most recently returned and one more, then
    /// scans forward. Before the first successful step it yields the last
    /// playable entry instead.
    pub fn rewind(&mut self) -> Result<&Path, Exhausted> {
        if self.entries.is_empty() {
            return Err(Exhausted);
        }

        self.position = match self.state {
            CursorState::Unstarted => self
                .entries
                .iter()
                .rposition(|entry| library::is_playable(entry))
                .ok_or(Exhausted)?,
            CursorState::Positioned => self
                .position
                .checked_sub(2)
                .unwrap_or(self.entries.len() - 1),
        };

        let index = self.scan_forward()?;
        Ok(self.entries[index].as_path())
    }

    fn scan_forward(&mut self) -> Result<usize, Exhausted> {
        while self.position < self.entries.len() {
            let index = self.position;
            self.position += 1;
            if library::is_playable(&self.entries[index]) {
                self.state = CursorState::Positioned;
                return Ok(index);
            }
        }
        Err(Exhausted)
    }
}

impl Iterator for PlaylistCursor {
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().ok().map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert;

    fn cursor(paths: &[&str]) -> PlaylistCursor {
        PlaylistCursor::with_entries(paths.iter().map(PathBuf::from).collect())
    }

    #[test]
    fn advance_walks_entries_in_order_then_exhausts() {
        let mut cursor = cursor(&["/m/a.mp3", "/m/b.mp3", "/m/c.mp3"]);

        assert_eq!(cursor.advance(), Ok(Path::new("/m/a.mp3")));
        assert_eq!(cursor.advance(), Ok(Path::new("/m/b.mp3")));
        assert_eq!(cursor.advance(), Ok(Path::new("/m/c.mp3")));
        assert_eq!(cursor.advance(), Err(Exhausted));
        assert_eq!(cursor.current_index(), 3);
    }

    #[test]
    fn advance_skips_non_mp3_entries() {
        let mut cursor = cursor(&["/m/cover.jpg", "/m/a.MP3", "/m/notes.txt", "/m/b.Mp3"]);

        assert_eq!(cursor.advance(), Ok(Path::new("/m/a.MP3")));
        assert_eq!(cursor.current_index(), 2);
        assert_eq!(cursor.advance(), Ok(Path::new("/m/b.Mp3")));
        assert_eq!(cursor.advance(), Err(Exhausted));
    }

    #[test]
    fn empty_cursor_is_exhausted_both_ways() {
        let mut cursor = cursor(&[]);
        assert_eq!(PlaylistCursor::count(&cursor), 0);
        assert_eq!(cursor.advance(), Err(Exhausted));
        assert_eq!(cursor.rewind(), Err(Exhausted));
        assert_eq!(cursor.current_index(), 0);
    }

    #[test]
    fn rewind_returns_entry_before_the_last_one_returned() {
        let mut cursor = cursor(&["/m/a.mp3", "/m/b.mp3", "/m/c.mp3"]);
        cursor.advance().expect("a");
        cursor.advance().expect("b");
        cursor.advance().expect("c");

        assert_eq!(cursor.rewind(), Ok(Path::new("/m/b.mp3")));
        assert_eq!(cursor.rewind(), Ok(Path::new("/m/a.mp3")));
    }

    #[test]
    fn rewind_from_first_entry_wraps_to_last() {
        let mut cursor = cursor(&["/m/a.mp3", "/m/b.mp3", "/m/c.mp3"]);
        cursor.advance().expect("a");

        assert_eq!(cursor.rewind(), Ok(Path::new("/m/c.mp3")));
        assert_eq!(cursor.current_index(), 3);
    }

    #[test]
    fn single_entry_rewind_returns_the_same_entry() {
        let mut cursor = cursor(&["/m/only.mp3"]);

        assert_eq!(cursor.advance(), Ok(Path::new("/m/only.mp3")));
        assert_eq!(cursor.rewind(), Ok(Path::new("/m/only.mp3")));
        assert_eq!(cursor.current_index(), 1);
    }

    #[test]
    fn trailing_separator_entry_is_not_playable() {
        let mut cursor = cursor(&["/m/album.mp3/", "/m/.MP3"]);

        assert_eq!(cursor.advance(), Ok(Path::new("/m/.MP3")));
        assert_eq!(cursor.current_index(), 2);
        assert_eq!(cursor.advance(), Err(Exhausted));
    }

    #[test]
    fn rewind_before_first_advance_returns_last_playable() {
        let mut cursor = cursor(&["/m/a.mp3", "/m/b.mp3", "/m/readme.txt"]);

        assert_eq!(cursor.state(), CursorState::Unstarted);
        assert_eq!(cursor.rewind(), Ok(Path::new("/m/b.mp3")));
        assert_eq!(cursor.state(), CursorState::Positioned);
    }

    #[test]
    fn rewind_before_first_advance_without_audio_is_exhausted() {
        let mut cursor = cursor(&["/m/readme.txt", "/m/cover.png"]);
        assert_eq!(cursor.rewind(), Err(Exhausted));
    }

    #[test]
    fn reset_allows_wrapping_around() {
        let mut cursor = cursor(&["/m/a.mp3", "/m/b.mp3"]);
        cursor.advance().expect("a");
        cursor.advance().expect("b");
        assert_eq!(cursor.advance(), Err(Exhausted));

        cursor.reset();
        assert_eq!(cursor.state(), CursorState::Unstarted);
        assert_eq!(cursor.advance(), Ok(Path::new("/m/a.mp3")));
    }

    #[test]
    fn iterator_yields_playable_entries_once() {
        let cursor = cursor(&["/m/a.mp3", "/m/skip.wav", "/m/b.mp3"]);
        let played: Vec<PathBuf> = cursor.collect();
        assert_eq!(
            played,
            vec![PathBuf::from("/m/a.mp3"), PathBuf::from("/m/b.mp3")]
        );
    }

    #[test]
    fn from_paths_makes_entries_absolute() {
        let cursor = PlaylistCursor::from_paths(["music/../tracks/./a.mp3"]).expect("cursor");
        let entry = &cursor.entries()[0];
        assert!(entry.is_absolute());
        assert!(entry.ends_with("tracks/a.mp3"));
    }

    proptest::proptest! {
        #[test]
        fn advance_returns_each_audio_path_once(len in 1usize..40) {
            let paths: Vec<PathBuf> = (0..len)
                .map(|n| PathBuf::from(format!("/music/track_{n}.mp3")))
                .collect();
            let mut cursor = PlaylistCursor::with_entries(paths.clone());

            for expected in &paths {
                prop_assert!(cursor.advance() == Ok(expected.as_path()));
            }
            prop_assert!(cursor.advance() == Err(Exhausted));
        }

        #[test]
        fn position_stays_in_bounds(
            kinds in proptest::collection::vec(0u8..3, 0..16),
            ops in proptest::collection::vec(0u8..3, 1..200),
        ) {
            let entries: Vec<PathBuf> = kinds
                .iter()
                .enumerate()
                .map(|(n, kind)| match kind {
                    0 => PathBuf::from(format!("/m/{n}.mp3")),
                    1 => PathBuf::from(format!("/m/{n}.MP3")),
                    _ => PathBuf::from(format!("/m/{n}.flac")),
                })
                .collect();
            let mut cursor = PlaylistCursor::with_entries(entries);

            for op in ops {
                let returned = match op {
                    0 => cursor.advance().ok().map(Path::to_path_buf),
                    1 => cursor.rewind().ok().map(Path::to_path_buf),
                    _ => {
                        cursor.reset();
                        None
                    }
                };

                prop_assert!(cursor.current_index() <= PlaylistCursor::count(&cursor));
                if let Some(path) = returned {
                    prop_assert!(library::is_playable(&path));
                    prop_assert!(cursor.current_index() >= 1);
                }
            }
        }
    }
}
