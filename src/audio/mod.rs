use anyhow::{Context, Result};
use rodio::Source;
use rodio::cpal::Device;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const MAX_VOLUME: f32 = 2.5;

pub trait AudioEngine {
    fn play(&mut self, path: &Path) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn is_paused(&self) -> bool;
    fn current_track(&self) -> Option<&Path>;
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn output_name(&self) -> &str;
    fn is_finished(&self) -> bool;
}

pub struct RodioAudioEngine {
    stream: OutputStream,
    sink: Sink,
    output: String,
    current: Option<PathBuf>,
    track_duration: Option<Duration>,
    volume: f32,
}

impl RodioAudioEngine {
    pub fn new() -> Result<Self> {
        let (mut stream, output) = open_output()?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        tracing::info!(%output, "audio output opened");

        Ok(Self {
            stream,
            sink,
            output,
            current: None,
            track_duration: None,
            volume: 1.0,
        })
    }
}

/// Opens the default output, then every other output device the host
/// lists, and keeps the first one that starts.
fn open_output() -> Result<(OutputStream, String)> {
    let default_err = match start_stream(None) {
        Ok(stream) => return Ok((stream, String::from("system default"))),
        Err(err) => err,
    };
    tracing::warn!("default output unavailable: {default_err:#}");

    let devices = rodio::cpal::default_host()
        .output_devices()
        .context("failed to list output devices")?;
    for device in devices {
        let name = device
            .name()
            .unwrap_or_else(|_| String::from("unnamed device"));
        match start_stream(Some(device)) {
            Ok(stream) => return Ok((stream, name)),
            Err(err) => tracing::debug!(device = %name, "output rejected: {err:#}"),
        }
    }

    anyhow::bail!("no audio output could be started: {default_err:#}")
}

fn start_stream(device: Option<Device>) -> Result<OutputStream> {
    let builder = match device {
        Some(device) => OutputStreamBuilder::from_device(device),
        None => OutputStreamBuilder::from_default_device(),
    }
    .context("failed to configure output device")?;

    builder
        .with_error_callback(|err| tracing::debug!("output stream error: {err}"))
        .open_stream_or_fallback()
        .context("failed to start output stream")
}

impl AudioEngine for RodioAudioEngine {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());

        let file =
            File::open(path).with_context(|| format!("failed to open track {}", path.display()))?;
        let source = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        self.track_duration = source
            .total_duration()
            .filter(|duration| !duration.is_zero())
            .or_else(|| crate::library::probe_duration(path));
        self.sink.append(source);
        self.sink.set_volume(self.volume);
        self.sink.play();
        self.current = Some(path.to_path_buf());
        tracing::info!(track = %path.display(), "playing");
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.current = None;
        self.track_duration = None;
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn current_track(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, MAX_VOLUME);
        self.sink.set_volume(self.volume);
    }

    fn output_name(&self) -> &str {
        &self.output
    }

    fn is_finished(&self) -> bool {
        self.current.is_some() && !self.sink.is_paused() && self.sink.empty()
    }
}

/// Keeps time for the loaded track without producing sound. The track length
/// comes from the file header, so auto-advance still works; tracks whose
/// length cannot be read never finish on their own.
#[derive(Debug)]
pub struct NullAudioEngine {
    track: Option<PathBuf>,
    length: Option<Duration>,
    banked: Duration,
    running_since: Option<Instant>,
    volume: f32,
}

impl NullAudioEngine {
    pub fn new() -> Self {
        Self {
            track: None,
            length: None,
            banked: Duration::ZERO,
            running_since: None,
            volume: 1.0,
        }
    }

    fn elapsed(&self) -> Duration {
        let running = self
            .running_since
            .map_or(Duration::ZERO, |since| since.elapsed());
        let total = self.banked.saturating_add(running);
        self.length.map_or(total, |length| total.min(length))
    }
}

impl Default for NullAudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for NullAudioEngine {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.track = Some(path.to_path_buf());
        self.length = crate::library::probe_duration(path);
        self.banked = Duration::ZERO;
        self.running_since = Some(Instant::now());
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.banked = self.banked.saturating_add(since.elapsed());
        }
    }

    fn resume(&mut self) {
        if self.track.is_some() && self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        *self = Self {
            volume: self.volume,
            ..Self::new()
        };
    }

    fn is_paused(&self) -> bool {
        self.track.is_some() && self.running_since.is_none()
    }

    fn current_track(&self) -> Option<&Path> {
        self.track.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.track.as_ref().map(|_| self.elapsed())
    }

    fn duration(&self) -> Option<Duration> {
        self.length
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, MAX_VOLUME);
    }

    fn output_name(&self) -> &str {
        "silent"
    }

    fn is_finished(&self) -> bool {
        self.running_since.is_some()
            && self
                .length
                .is_some_and(|length| self.elapsed() >= length)
    }
}

#[cfg(test)]
mod tests {
    use super::{AudioEngine, NullAudioEngine};
    use std::fs;
    use std::path::Path;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Mono 16-bit PCM at 8 kHz, all zeroes.
    fn silent_wav(millis: u32) -> Vec<u8> {
        const RATE: u32 = 8_000;
        let data_len = RATE * millis / 1_000 * 2;

        let mut fmt = Vec::with_capacity(16);
        fmt.extend(1_u16.to_le_bytes());
        fmt.extend(1_u16.to_le_bytes());
        fmt.extend(RATE.to_le_bytes());
        fmt.extend((RATE * 2).to_le_bytes());
        fmt.extend(2_u16.to_le_bytes());
        fmt.extend(16_u16.to_le_bytes());

        let mut wav = b"RIFF".to_vec();
        wav.extend((4 + 8 + fmt.len() as u32 + 8 + data_len).to_le_bytes());
        wav.extend(b"WAVE");
        for (id, body) in [(b"fmt ", fmt), (b"data", vec![0; data_len as usize])] {
            wav.extend(id);
            wav.extend((body.len() as u32).to_le_bytes());
            wav.extend(body);
        }
        wav
    }

    #[test]
    fn silent_clock_stands_still_while_paused() {
        let mut engine = NullAudioEngine::new();
        engine.play(Path::new("nowhere.mp3")).expect("play");
        thread::sleep(Duration::from_millis(20));

        engine.pause();
        assert!(engine.is_paused());
        let frozen = engine.position().expect("position");
        thread::sleep(Duration::from_millis(20));
        assert_eq!(engine.position(), Some(frozen));

        engine.resume();
        assert!(!engine.is_paused());
        thread::sleep(Duration::from_millis(20));
        assert!(engine.position().expect("position") > frozen);
    }

    #[test]
    fn silent_clock_finishes_after_header_length() {
        let dir = tempdir().expect("tempdir");
        let track = dir.path().join("short.wav");
        fs::write(&track, silent_wav(80)).expect("write wav");

        let mut engine = NullAudioEngine::new();
        engine.play(&track).expect("play");
        let length = engine.duration().expect("length from header");
        assert!(length >= Duration::from_millis(70), "{length:?}");
        assert!(!engine.is_finished());

        thread::sleep(Duration::from_millis(120));
        assert!(engine.is_finished());
        assert_eq!(engine.position(), Some(length));
    }

    #[test]
    fn unreadable_track_never_finishes() {
        let mut engine = NullAudioEngine::new();
        engine.play(Path::new("nowhere.mp3")).expect("play");
        assert_eq!(engine.duration(), None);

        thread::sleep(Duration::from_millis(30));
        assert!(!engine.is_finished());
    }

    #[test]
    fn stop_forgets_track_but_keeps_volume() {
        let mut engine = NullAudioEngine::new();
        engine.set_volume(9.0);
        assert_eq!(engine.volume(), 2.5);

        engine.play(Path::new("a.mp3")).expect("play");
        engine.stop();
        assert_eq!(engine.current_track(), None);
        assert_eq!(engine.position(), None);
        assert!(!engine.is_paused());
        assert_eq!(engine.volume(), 2.5);

        engine.set_volume(-1.0);
        assert_eq!(engine.volume(), 0.0);
        assert_eq!(engine.output_name(), "silent");
    }
}
