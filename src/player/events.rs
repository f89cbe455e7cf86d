use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};

/// The closed command vocabulary the control loop dispatches on. Unknown
/// keys map to `Noop`; resize notifications ride the same channel as
/// keyboard input so the loop has one uniform event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Shuffle,
    ToggleCovers,
    ToggleVisualizer,
    ToggleBlocks,
    AddToPlaylist,
    DeleteFromPlaylist,
    ToggleRepeat,
    ExportPlaylist,
    VolumeUp,
    VolumeDown,
    Next,
    Prev,
    PlayPause,
    ToggleInfo,
    Resize,
    Noop,
}

pub fn map_key(key: KeyEvent) -> Command {
    match key.code {
        KeyCode::Char('q') => Command::Quit,
        KeyCode::Char('s') => Command::Shuffle,
        KeyCode::Char('c') => Command::ToggleCovers,
        KeyCode::Char('e') => Command::ToggleVisualizer,
        KeyCode::Char('b') => Command::ToggleBlocks,
        KeyCode::Char('a') => Command::AddToPlaylist,
        KeyCode::Char('d') => Command::DeleteFromPlaylist,
        KeyCode::Char('r') => Command::ToggleRepeat,
        KeyCode::Char('p') => Command::ExportPlaylist,
        KeyCode::Up => Command::VolumeUp,
        KeyCode::Down => Command::VolumeDown,
        KeyCode::Right => Command::Next,
        KeyCode::Left => Command::Prev,
        KeyCode::Char(' ') => Command::PlayPause,
        KeyCode::F(1) => Command::ToggleInfo,
        _ => Command::Noop,
    }
}

/// Non-blocking keyboard/resize source with a cool-down gate.
///
/// A poll drains everything currently buffered and keeps only the last key
/// press, so holding an arrow key coalesces into one command. A new key
/// within the cool-down window of the previous accepted command is dropped,
/// not queued.
pub struct EventSource {
    cooldown: Duration,
    last_accepted: Option<Instant>,
}

impl EventSource {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_accepted: None,
        }
    }

    /// Poll once. Never blocks; returns `None` when no input is pending or
    /// the cool-down gate rejects it.
    pub fn poll(&mut self) -> io::Result<Option<Command>> {
        if !event::poll(Duration::ZERO)? {
            return Ok(None);
        }

        let mut last_key: Option<KeyEvent> = None;
        let mut resized = false;
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => last_key = Some(key),
                Event::Resize(_, _) => resized = true,
                _ => {}
            }
        }

        // Resize is not a keypress; it bypasses the cool-down gate.
        if resized {
            return Ok(Some(Command::Resize));
        }

        let Some(key) = last_key else {
            return Ok(None);
        };
        if !self.gate(Instant::now()) {
            return Ok(None);
        }
        Ok(Some(map_key(key)))
    }

    /// Discard everything currently buffered (used once before the loop
    /// starts, so input accumulated during startup is not replayed).
    pub fn drain(&mut self) -> io::Result<()> {
        while event::poll(Duration::ZERO)? {
            let _ = event::read()?;
        }
        Ok(())
    }

    /// Wait (bounded) for a resize burst to settle: returns once no further
    /// resize notification arrives within 100 ms, or after one second. Keys
    /// arriving during the burst are dropped; the repaint wins.
    pub fn settle_resize(&mut self) -> io::Result<()> {
        let deadline = Instant::now() + Duration::from_secs(1);
        while Instant::now() < deadline {
            if !event::poll(Duration::from_millis(100))? {
                break;
            }
            let _ = event::read()?;
        }
        Ok(())
    }

    /// Cool-down gate: accepts and stamps `now` when outside the window.
    fn gate(&mut self, now: Instant) -> bool {
        let ok = match self.last_accepted {
            None => true,
            Some(last) => now.duration_since(last) >= self.cooldown,
        };
        if ok {
            self.last_accepted = Some(now);
        }
        ok
    }

    #[cfg(test)]
    pub(super) fn gate_at(&mut self, now: Instant) -> bool {
        self.gate(now)
    }
}
