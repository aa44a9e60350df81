use anyhow::{Context, Result};
use csv::StringRecord;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::get_probe;
use walkdir::WalkDir;

const PLAYABLE_SUFFIX: &[u8] = b".mp3";

const PRIMARY_PATH_COLUMN: &str = "absolutepath";
const FALLBACK_PATH_COLUMN: &str = "abs_path";

struct CsvPathColumns {
    primary: Option<usize>,
    fallback: Option<usize>,
}

impl CsvPathColumns {
    fn from_headers(headers: &StringRecord) -> Self {
        let position = |name: &str| headers.iter().position(|header| header == name);
        Self {
            primary: position(PRIMARY_PATH_COLUMN),
            fallback: position(FALLBACK_PATH_COLUMN),
        }
    }

    fn track_path(&self, record: &StringRecord) -> Option<PathBuf> {
        let field = |column: Option<usize>| column.and_then(|idx| record.get(idx));
        let value = field(self.primary)
            .filter(|value| !value.is_empty())
            .or_else(|| field(self.fallback))?;
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

/// True when the raw path text ends in `.mp3`, ignoring ASCII case. A bare
/// `.mp3` file name counts; a trailing separator does not.
pub fn is_playable(path: &Path) -> bool {
    let bytes = path.as_os_str().as_encoded_bytes();
    bytes
        .len()
        .checked_sub(PLAYABLE_SUFFIX.len())
        .is_some_and(|start| bytes[start..].eq_ignore_ascii_case(PLAYABLE_SUFFIX))
}

/// Reads track paths from a CSV file with an `absolutepath` or `abs_path`
/// column, keeping row order. Rows without a usable value are dropped.
pub fn read_csv(path: &Path) -> Result<Vec<PathBuf>> {
    let file =
        File::open(path).with_context(|| format!("failed to open CSV {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read CSV header of {}", path.display()))?;
    let columns = CsvPathColumns::from_headers(headers);
    if columns.primary.is_none() && columns.fallback.is_none() {
        tracing::warn!(path = %path.display(), "CSV has no {PRIMARY_PATH_COLUMN} or {FALLBACK_PATH_COLUMN} column");
    }

    let mut tracks = Vec::new();
    for (row, record) in reader.records().enumerate() {
        match record {
            Ok(record) => tracks.extend(columns.track_path(&record)),
            Err(err) => tracing::debug!(row = row + 1, "skipping CSV row: {err}"),
        }
    }

    tracing::info!(path = %path.display(), tracks = tracks.len(), "loaded CSV playlist");
    Ok(tracks)
}

/// Lists the `.mp3` files directly inside `root`. Order follows the
/// filesystem enumeration and is not stable across platforms.
pub fn scan_directory(root: &Path) -> Result<Vec<PathBuf>> {
    let root = crate::config::absolute_path(root)?;
    let metadata =
        fs::metadata(&root).with_context(|| format!("failed to read {}", root.display()))?;
    if !metadata.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let mut tracks = Vec::new();
    for entry in WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(err).with_context(|| format!("failed to list {}", root.display()));
            }
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {err}");
                continue;
            }
        };

        if entry.file_type().is_file() && is_playable(entry.path()) {
            tracks.push(root.join(entry.file_name()));
        }
    }

    tracing::info!(path = %root.display(), tracks = tracks.len(), "scanned folder");
    Ok(tracks)
}

pub fn probe_duration(path: &Path) -> Option<Duration> {
    let stripped = crate::config::strip_windows_verbatim_prefix(path);

    let Ok(file) = File::open(&stripped) else {
        return None;
    };
    let source = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(extension) = stripped.extension().and_then(OsStr::to_str) {
        hint.with_extension(extension);
    }

    let Ok(probed) = get_probe().format(
        &hint,
        source,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    ) else {
        return None;
    };

    let codec_params = &probed.format.default_track()?.codec_params;
    let (time_base, frames) = codec_params.time_base.zip(codec_params.n_frames)?;
    let time = time_base.calc_time(frames);
    let duration = Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac);
    (!duration.is_zero()).then_some(duration)
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
