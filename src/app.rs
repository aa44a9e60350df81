use crate::audio::{AudioEngine, NullAudioEngine, RodioAudioEngine};
use crate::config;
use crate::core::PlayerCore;
use crate::model::PlaylistSource;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const VOLUME_STEP: f32 = 0.05;

#[derive(Debug, Default)]
pub struct AppStartupOptions {
    pub source: Option<PlaylistSource>,
    pub null_audio: bool,
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let state = config::load_state()?;
    let mut core = PlayerCore::from_persisted(state);

    let mut audio: Box<dyn AudioEngine> = if options.null_audio {
        Box::new(NullAudioEngine::new())
    } else {
        match RodioAudioEngine::new() {
            Ok(engine) => Box::new(engine),
            Err(err) => {
                tracing::warn!("falling back to silent playback: {err:#}");
                core.set_status("No audio output, playing silently");
                Box::new(NullAudioEngine::new())
            }
        }
    };
    audio.set_volume(core.saved_volume);

    let initial = options.source.or_else(|| core.source.clone());
    if let Some(source) = initial {
        // Errors are already in the status line; start with an empty player.
        if let Ok(Some(path)) = core.load(source) {
            play_path(&mut core, &mut *audio, &path);
        }
    }

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut command_mode = false;
    let mut command_buffer = String::new();
    let mut last_tick = Instant::now();

    let result: Result<()> = loop {
        maybe_auto_advance_track(&mut core, &mut *audio);

        if core.dirty || last_tick.elapsed() > Duration::from_millis(250) {
            terminal.draw(|frame| {
                crate::ui::draw(frame, &core, &*audio, &command_buffer, command_mode)
            })?;
            core.dirty = false;
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };

        if key.kind != KeyEventKind::Press {
            continue;
        }

        if command_mode {
            match key.code {
                KeyCode::Esc => {
                    command_mode = false;
                    command_buffer.clear();
                    core.dirty = true;
                }
                KeyCode::Enter => {
                    run_command(&mut core, &mut *audio, &command_buffer);
                    command_mode = false;
                    command_buffer.clear();
                }
                KeyCode::Backspace => {
                    command_buffer.pop();
                    core.dirty = true;
                }
                KeyCode::Char(ch) => {
                    command_buffer.push(ch);
                    core.dirty = true;
                }
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break Ok(()),
            KeyCode::Char('q') => break Ok(()),
            KeyCode::Char(' ') => toggle_playback(&mut core, &mut *audio),
            KeyCode::Char('n') | KeyCode::Right => next_track(&mut core, &mut *audio),
            KeyCode::Char('p') | KeyCode::Left => prev_track(&mut core, &mut *audio),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                change_volume(&mut core, &mut *audio, VOLUME_STEP)
            }
            KeyCode::Char('-') => change_volume(&mut core, &mut *audio, -VOLUME_STEP),
            KeyCode::Char(':') => {
                command_mode = true;
                core.dirty = true;
            }
            _ => {}
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    audio.stop();
    let save_result = core.save();
    result?;
    save_result?;
    Ok(())
}

fn play_path(core: &mut PlayerCore, audio: &mut dyn AudioEngine, path: &Path) {
    if let Err(err) = audio.play(path) {
        tracing::warn!(track = %path.display(), "playback failed: {err:#}");
        core.set_status(&format!("playback error: {err:#}"));
    }
}

fn next_track(core: &mut PlayerCore, audio: &mut dyn AudioEngine) {
    if !core.controls_enabled() {
        core.set_status("Load a CSV or folder first");
        return;
    }
    match core.next_track() {
        Some(path) => play_path(core, audio, &path),
        None => audio.stop(),
    }
}

fn prev_track(core: &mut PlayerCore, audio: &mut dyn AudioEngine) {
    if !core.controls_enabled() {
        core.set_status("Load a CSV or folder first");
        return;
    }
    match core.prev_track() {
        Some(path) => play_path(core, audio, &path),
        None => audio.stop(),
    }
}

fn toggle_playback(core: &mut PlayerCore, audio: &mut dyn AudioEngine) {
    if !core.play_enabled() {
        core.set_status("Nothing to play");
        return;
    }

    if audio.current_track().is_none() {
        if let Some(path) = core.current_track.clone() {
            play_path(core, audio, &path);
        }
    } else if audio.is_paused() {
        audio.resume();
        core.set_status("Resumed");
    } else {
        audio.pause();
        core.set_status("Paused");
    }
}

fn change_volume(core: &mut PlayerCore, audio: &mut dyn AudioEngine, delta: f32) {
    audio.set_volume(audio.volume() + delta);
    core.saved_volume = audio.volume();
    core.set_status(&format!(
        "Volume: {}%",
        (audio.volume() * 100.0).round() as u16
    ));
}

fn maybe_auto_advance_track(core: &mut PlayerCore, audio: &mut dyn AudioEngine) {
    if audio.current_track().is_none() || audio.is_paused() || !audio.is_finished() {
        return;
    }

    match core.next_track() {
        Some(path) => play_path(core, audio, &path),
        None => {
            audio.stop();
            core.set_status("No playable track");
        }
    }
}

fn load_and_play(core: &mut PlayerCore, audio: &mut dyn AudioEngine, source: PlaylistSource) {
    match core.load(source) {
        Ok(Some(path)) => play_path(core, audio, &path),
        Ok(None) => audio.stop(),
        // The previous playlist stays, so playback continues as is.
        Err(_) => {}
    }
}

fn run_command(core: &mut PlayerCore, audio: &mut dyn AudioEngine, raw: &str) {
    let input = raw.trim();
    if input.is_empty() {
        core.set_status("No command");
        return;
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => core.set_status(
            "Commands: csv <file> | dir <folder> | load <path> | reload | save   Keys: space n p + - q",
        ),
        "csv" | "dir" | "load" => {
            if rest.is_empty() {
                core.set_status(&format!("Usage: {command} <path>"));
                return;
            }
            let path = PathBuf::from(rest);
            let source = match command {
                "csv" => PlaylistSource::Csv(path),
                "dir" => PlaylistSource::Directory(path),
                _ => PlaylistSource::from_path(&path),
            };
            load_and_play(core, audio, source);
        }
        "reload" => match core.reload() {
            Ok(Some(path)) => play_path(core, audio, &path),
            Ok(None) | Err(_) => {}
        },
        "save" => {
            if let Err(err) = core.save() {
                core.set_status(&format!("save error: {err:#}"));
            }
        }
        _ => core.set_status("Unknown command. Use :help"),
    }
}
