use crate::audio::AudioEngine;
use crate::core::PlayerCore;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use std::time::Duration;

const APP_TITLE: &str = "spinlist  ";
const TIMELINE_BAR_WIDTH: usize = 30;
const VOLUME_BAR_WIDTH: usize = 10;

const BG: Color = Color::Rgb(10, 15, 24);
const PANEL_BG: Color = Color::Rgb(18, 24, 38);
const BORDER: Color = Color::Rgb(60, 72, 100);
const TEXT: Color = Color::Rgb(220, 226, 240);
const MUTED: Color = Color::Rgb(120, 130, 150);
const ACCENT: Color = Color::Rgb(139, 69, 19);
const DISABLED: Color = Color::Rgb(70, 76, 90);

pub fn draw(
    frame: &mut Frame,
    core: &PlayerCore,
    audio: &dyn AudioEngine,
    command_buffer: &str,
    command_mode: bool,
) {
    frame.render_widget(
        Block::default().style(Style::default().bg(BG)),
        frame.area(),
    );

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let source_label = core
        .source
        .as_ref()
        .map(|source| format!("Source: {}", source.kind_label()))
        .unwrap_or_else(|| String::from("No playlist loaded"));
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(source_label, Style::default().fg(TEXT)),
        Span::styled("  |  ", Style::default().fg(MUTED)),
        Span::styled(core.progress_label(), Style::default().fg(TEXT)),
        Span::styled("  |  ", Style::default().fg(MUTED)),
        Span::styled(
            format!("Output: {}", audio.output_name()),
            Style::default().fg(MUTED),
        ),
    ]))
    .block(panel_block("Status"));
    frame.render_widget(header, vertical[0]);

    let duration = audio
        .duration()
        .map(format_duration)
        .unwrap_or_else(|| String::from("--"));
    let state = match (audio.current_track(), audio.is_paused()) {
        (None, _) => "Stopped",
        (Some(_), true) => "Paused",
        (Some(_), false) => "Playing",
    };
    let now_playing = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Track: {}", core.track_name()),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(
            format!("Duration: {duration}"),
            Style::default().fg(TEXT),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(state, Style::default().fg(MUTED))).alignment(Alignment::Center),
        Line::from(""),
        Line::from(controls_line(core, audio)).alignment(Alignment::Center),
    ])
    .block(panel_block("Now Playing"));
    frame.render_widget(now_playing, vertical[1]);

    frame.render_widget(
        Paragraph::new(timeline_line(audio, TIMELINE_BAR_WIDTH, VOLUME_BAR_WIDTH))
            .style(Style::default().fg(TEXT))
            .block(panel_block("Timeline")),
        vertical[2],
    );

    let footer = if command_mode {
        Line::from(vec![
            Span::styled(":", Style::default().fg(ACCENT)),
            Span::styled(command_buffer, Style::default().fg(TEXT)),
        ])
    } else {
        Line::from(Span::styled(core.status.as_str(), Style::default().fg(TEXT)))
    };
    frame.render_widget(Paragraph::new(footer).block(panel_block("Command")), vertical[3]);
}

fn controls_line(core: &PlayerCore, audio: &dyn AudioEngine) -> Vec<Span<'static>> {
    let style = |enabled: bool| {
        if enabled {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DISABLED)
        }
    };
    let play_label = if audio.current_track().is_some() && !audio.is_paused() {
        "[space] Pause"
    } else {
        "[space] Play"
    };

    vec![
        Span::styled("[p] Prev", style(core.controls_enabled())),
        Span::raw("   "),
        Span::styled(play_label, style(core.play_enabled())),
        Span::raw("   "),
        Span::styled("[n] Next", style(core.controls_enabled())),
        Span::raw("   "),
        Span::styled(":help  q quit", Style::default().fg(MUTED)),
    ]
}

fn panel_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(BORDER))
        .style(Style::default().bg(PANEL_BG))
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes}:{seconds:02}")
}

fn progress_bar(ratio: Option<f64>, width: usize) -> String {
    let clamped = ratio.unwrap_or(0.0).clamp(0.0, 1.0);
    let filled = (clamped * width as f64).round() as usize;
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(width.saturating_sub(filled)));
    bar.push(']');
    bar
}

fn timeline_line(
    audio: &dyn AudioEngine,
    timeline_bar_width: usize,
    volume_bar_width: usize,
) -> String {
    let elapsed = audio.position().unwrap_or(Duration::from_secs(0));
    let total = audio.duration();
    let ratio = total.and_then(|duration| {
        let total_secs = duration.as_secs_f64();
        (total_secs > 0.0).then_some((elapsed.as_secs_f64() / total_secs).clamp(0.0, 1.0))
    });

    let volume_percent = (audio.volume() * 100.0).round() as u16;
    let volume_ratio = audio.volume().clamp(0.0, 1.0) as f64;

    format!(
        "{} / {} {}  |  Vol {} {:>3}%  +/- adjust",
        format_duration(elapsed),
        total
            .map(format_duration)
            .unwrap_or_else(|| String::from("--:--")),
        progress_bar(ratio, timeline_bar_width),
        progress_bar(Some(volume_ratio), volume_bar_width),
        volume_percent
    )
}
