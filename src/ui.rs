//! Terminal rendering for the player view.
//!
//! The controller hands over a [`PlayerView`] snapshot once per non-resize
//! tick; nothing here reaches back into playback state.

use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Gauge, Paragraph},
};

/// Number of bars the visualizer asks the active track for.
pub const VISUALIZER_BARS: usize = 24;

const PLAIN_GLYPHS: [char; 8] = ['.', ':', ':', '|', '|', '#', '#', '#'];
const BLOCK_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Everything the player screen shows, captured by the controller.
pub struct PlayerView {
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    /// 1-based position in the queue and the queue length.
    pub position: (usize, usize),
    pub queue_total: Duration,
    pub elapsed: Duration,
    /// Live duration of the pause currently in progress.
    pub pause_span: Duration,
    pub paused: bool,
    pub repeat: bool,
    pub volume: f32,
    pub covers: bool,
    pub visualizer: bool,
    pub blocks: bool,
    pub info: bool,
    /// Transient feedback (e.g. the path a playlist export wrote to); takes
    /// the status row over the default line while present.
    pub status: Option<String>,
    pub levels: Vec<f32>,
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn key_help() -> String {
    [
        "[space] play/pause",
        "[←/→] prev/next",
        "[↑/↓] volume",
        "[s] shuffle",
        "[r] repeat",
        "[a] add to playlist",
        "[p] export",
        "[c] cover",
        "[e] visualizer",
        "[b] blocks",
        "[q] quit",
    ]
    .join(" | ")
}

fn bar_line(levels: &[f32], width: usize, blocks: bool) -> String {
    let glyphs = if blocks { BLOCK_GLYPHS } else { PLAIN_GLYPHS };
    let mut line = String::new();
    for i in 0..width {
        let level = if levels.is_empty() {
            0.0
        } else {
            levels[i * levels.len() / width.max(1)]
        };
        let idx = ((level * (glyphs.len() - 1) as f32).round() as usize).min(glyphs.len() - 1);
        line.push(glyphs[idx]);
    }
    line
}

/// Splash shown while the first track decodes.
pub fn draw_loading(f: &mut Frame, label: &str) {
    let area = f.area();
    let text = format!("loading {label} …");
    let block = Block::default().borders(Borders::ALL).title(" segue ");
    let para = Paragraph::new(text).block(block).alignment(Alignment::Center);
    f.render_widget(para, area);
}

/// Render the full player screen.
pub fn draw(f: &mut Frame, view: &PlayerView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_header(f, rows[0], view);
    draw_body(f, rows[1], view);
    draw_progress(f, rows[2], view);
    draw_status(f, rows[3], view);
}

fn draw_header(f: &mut Frame, area: Rect, view: &PlayerView) {
    let (pos, total) = view.position;
    let text = format!(
        "track {pos}/{total} · queue {}",
        format_mmss(view.queue_total)
    );
    let para = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(" segue "))
        .alignment(Alignment::Center);
    f.render_widget(para, area);
}

fn draw_body(f: &mut Frame, area: Rect, view: &PlayerView) {
    let columns = if view.covers {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(area)
    };

    if view.covers {
        // Album-art rasterization is out of scope; the panel names the album.
        let album = view.album.as_deref().unwrap_or("—");
        let cover = Paragraph::new(album.to_string())
            .block(Block::default().borders(Borders::ALL).title(" album "))
            .alignment(Alignment::Center);
        f.render_widget(cover, columns[0]);
    }

    let detail_area = *columns.last().unwrap_or(&area);
    let mut lines: Vec<String> = Vec::new();
    lines.push(view.title.clone());
    if let Some(artist) = view.artist.as_deref() {
        lines.push(format!("by {artist}"));
    }
    if let Some(album) = view.album.as_deref() {
        lines.push(format!("on {album}"));
    }
    if view.paused {
        lines.push(format!("paused for {}", format_mmss(view.pause_span)));
    }
    if view.visualizer {
        lines.push(String::new());
        lines.push(bar_line(
            &view.levels,
            detail_area.width.saturating_sub(2) as usize,
            view.blocks,
        ));
    }

    let para = Paragraph::new(lines.join("\n"))
        .block(Block::default().borders(Borders::ALL).title(" now playing "))
        .style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(para, detail_area);
}

fn draw_progress(f: &mut Frame, area: Rect, view: &PlayerView) {
    let ratio = match view.duration {
        Some(total) if !total.is_zero() => {
            (view.elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
        }
        _ => 0.0,
    };
    let label = match view.duration {
        Some(total) => format!("{} / {}", format_mmss(view.elapsed), format_mmss(total)),
        None => format_mmss(view.elapsed),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .ratio(ratio)
        .label(label);
    f.render_widget(gauge, area);
}

fn draw_status(f: &mut Frame, area: Rect, view: &PlayerView) {
    let text = if let Some(status) = &view.status {
        status.clone()
    } else if view.info {
        key_help()
    } else {
        format!(
            "{}  vol {:>3.0}%  repeat {}  [F1] help",
            if view.paused { "⏸ paused" } else { "▶ playing" },
            view.volume * 100.0,
            if view.repeat { "on" } else { "off" },
        )
    };
    let para = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .dim();
    f.render_widget(para, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_mmss_pads_minutes_and_seconds() {
        assert_eq!(format_mmss(Duration::from_secs(0)), "00:00");
        assert_eq!(format_mmss(Duration::from_secs(65)), "01:05");
        assert_eq!(format_mmss(Duration::from_secs(600)), "10:00");
    }

    #[test]
    fn bar_line_scales_levels_to_width() {
        let line = bar_line(&[0.0, 1.0], 4, false);
        assert_eq!(line.chars().count(), 4);
        assert!(line.ends_with("##"));
    }

    #[test]
    fn bar_line_handles_empty_levels() {
        let line = bar_line(&[], 3, true);
        assert_eq!(line.chars().count(), 3);
    }
}
