use std::env;
use std::io::Stdout;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::rngs::ThreadRng;
use ratatui::{Terminal, backend::Backend, backend::CrosstermBackend};
use rodio::Source;

use crate::audio::{AudioOut, Device};
use crate::config::{Settings, UiSettings};
use crate::library::{self, Playlist};
use crate::ui;

use super::clock::TrackClock;
use super::events::{Command, EventSource};
use super::prefetch::{LoadPhase, Prefetch, Slot};

/// Bounded-poll interval used at the three defined suspension points:
/// first load, exhaustion hand-over and the synchronous reverse-skip load.
const LOAD_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Starting,
    Playing,
    Paused,
    Quitting,
    Stopped,
}

/// Where the look-ahead for the track after the cursor currently stands.
/// `end_of_list` marks a completed load of "no next track".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookahead {
    Idle,
    InFlight,
    Loaded { end_of_list: bool },
}

/// What a finished session leaves behind for the caller to persist/report.
pub struct Outcome {
    pub list_exhausted: bool,
    pub load_failure: Option<String>,
    pub ui: UiSettings,
    pub volume: f32,
    pub main_dirty: bool,
}

/// Run a playback session over `queue` until quit, list exhaustion or a
/// fatal load failure. The caller owns terminal setup and restore.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    settings: &Settings,
    queue: &mut Playlist,
    main: &mut Playlist,
    from_main: bool,
) -> Result<Outcome> {
    let device = Device::open().context("audio device unavailable")?;
    let mut controller = Controller::new(
        terminal,
        settings,
        queue,
        main,
        from_main,
        device,
        Prefetch::new(),
    );
    controller.start()?;
    // Anything typed before launch or while the first track decoded counts
    // as arriving during startup and is discarded.
    controller.events.drain()?;

    let tick = Duration::from_millis(settings.controls.tick_ms.max(1));
    while matches!(controller.state, State::Playing | State::Paused) {
        controller.tick()?;
        if matches!(controller.state, State::Playing | State::Paused) {
            thread::sleep(tick);
        }
    }

    controller.shutdown();
    Ok(controller.into_outcome())
}

struct Controller<'a, B: Backend, D: AudioOut> {
    terminal: &'a mut Terminal<B>,
    queue: &'a mut Playlist,
    main: &'a mut Playlist,
    from_main: bool,

    device: D,
    prefetch: Prefetch,
    events: EventSource,
    clock: TrackClock,
    rng: ThreadRng,

    state: State,
    cursor: usize,
    active: Slot,
    lookahead: Lookahead,
    /// True once the pending slot's source sits in the device behind the
    /// active one.
    next_queued: bool,
    skipping: bool,
    repeat: bool,
    volume: f32,
    ui: UiSettings,
    /// Transient status-line message, replaced by the default line once the
    /// next command is accepted.
    status: Option<String>,

    list_exhausted: bool,
    load_failure: Option<String>,
    main_dirty: bool,
    volume_step: f32,
}

impl<'a, B: Backend, D: AudioOut> Controller<'a, B, D>
where
    B::Error: Send + Sync + 'static,
{
    fn new(
        terminal: &'a mut Terminal<B>,
        settings: &Settings,
        queue: &'a mut Playlist,
        main: &'a mut Playlist,
        from_main: bool,
        device: D,
        prefetch: Prefetch,
    ) -> Self {
        let now = Instant::now();

        Self {
            terminal,
            queue,
            main,
            from_main,
            device,
            prefetch,
            events: EventSource::new(Duration::from_millis(settings.controls.cooldown_ms)),
            clock: TrackClock::new(now),
            rng: rand::rng(),
            state: State::Starting,
            cursor: 0,
            active: Slot::A,
            lookahead: Lookahead::Idle,
            next_queued: false,
            skipping: false,
            repeat: settings.playback.repeat,
            volume: settings.playback.volume.clamp(0.0, 2.0),
            ui: settings.ui.clone(),
            status: None,
            list_exhausted: false,
            load_failure: None,
            main_dirty: false,
            volume_step: settings.controls.volume_step,
        }
    }

    /// STARTING: synchronously load the first track into slot A and hand it
    /// to the device.
    fn start(&mut self) -> Result<()> {
        let first = self
            .queue
            .get(self.cursor)
            .context("play queue is empty")?;
        let loading_label = first.display.clone();
        self.prefetch
            .request_load(Some(first.path.clone()), Slot::A);

        loop {
            self.terminal
                .draw(|f| ui::draw_loading(f, &loading_label))?;
            match self.prefetch.phase() {
                LoadPhase::Ready(_) => break,
                LoadPhase::Failed => {
                    self.load_failure = Some(
                        self.prefetch
                            .take_error()
                            .unwrap_or_else(|| "first track failed to load".to_string()),
                    );
                    self.state = State::Quitting;
                    return Ok(());
                }
                _ => thread::sleep(LOAD_POLL),
            }
        }
        self.prefetch.acknowledge();

        let source = self
            .prefetch
            .with_slot(Slot::A, |t| t.map(|p| p.to_source()))
            .context("first track produced no audio")?;
        self.device.play_now(source, false);
        self.device.set_volume(self.volume);
        self.clock.reset(Instant::now());
        self.state = State::Playing;
        Ok(())
    }

    /// One control-loop iteration: sample the clock, service one command,
    /// repaint, drive the look-ahead, and hand over on exhaustion.
    fn tick(&mut self) -> Result<()> {
        self.clock.tick(Instant::now());

        if let Some(cmd) = self.events.poll()? {
            self.dispatch(cmd)?;
        }
        if self.state == State::Quitting {
            return Ok(());
        }

        self.render()?;

        self.poll_lookahead();
        if self.load_failure.is_some() {
            self.state = State::Quitting;
            return Ok(());
        }

        // Exhaustion while paused only happens through a forced skip.
        if self.device.is_exhausted() {
            self.wait_for_lookahead();
            if self.load_failure.is_some() {
                self.state = State::Quitting;
                return Ok(());
            }
            self.advance();
        }
        Ok(())
    }

    fn dispatch(&mut self, cmd: Command) -> Result<()> {
        if !matches!(cmd, Command::Noop | Command::Resize) {
            self.status = None;
        }
        match cmd {
            Command::Quit => self.state = State::Quitting,
            Command::PlayPause => self.toggle_pause(),
            Command::Next => self.skip_to_next(),
            Command::Prev => self.skip_to_prev(),
            Command::ToggleRepeat => self.toggle_repeat(),
            Command::Shuffle => self.shuffle(),
            Command::VolumeUp => self.volume = self.device.adjust_volume(self.volume_step),
            Command::VolumeDown => self.volume = self.device.adjust_volume(-self.volume_step),
            Command::AddToPlaylist => self.add_current_to_main(),
            Command::DeleteFromPlaylist => {
                // FIXME: implement main-playlist deletion
            }
            Command::ExportPlaylist => self.export_queue(),
            Command::ToggleCovers => self.ui.covers = !self.ui.covers,
            Command::ToggleVisualizer => self.ui.visualizer = !self.ui.visualizer,
            Command::ToggleBlocks => self.ui.blocks = !self.ui.blocks,
            Command::ToggleInfo => self.ui.info = !self.ui.info,
            Command::Resize => self.handle_resize()?,
            Command::Noop => {}
        }
        Ok(())
    }

    fn toggle_pause(&mut self) {
        let now = Instant::now();
        match self.state {
            State::Playing => {
                self.device.set_paused(true);
                self.clock.pause(now);
                self.state = State::Paused;
            }
            State::Paused => {
                self.device.set_paused(false);
                self.clock.resume(now);
                self.state = State::Playing;
            }
            _ => {}
        }
    }

    fn toggle_repeat(&mut self) {
        self.repeat = !self.repeat;
        if self.repeat && self.next_queued {
            // The look-ahead source already sits in the device; repeat must
            // replay the active slot instead, so rebuild at the current
            // offset. The pending slot itself stays loaded.
            self.requeue_active_at(self.clock.elapsed());
            self.next_queued = false;
        }
    }

    fn shuffle(&mut self) {
        if matches!(self.lookahead, Lookahead::InFlight) {
            return;
        }
        self.cursor = self.queue.shuffle_from(self.cursor, &mut self.rng);
        self.prefetch.clear_slot(self.active.other());
        if self.next_queued {
            // The queued source points at the pre-shuffle next track.
            self.requeue_active_at(self.clock.elapsed());
            self.next_queued = false;
        }
        self.lookahead = Lookahead::Idle;
    }

    fn add_current_to_main(&mut self) {
        if self.from_main {
            return;
        }
        let Some(track) = self.queue.get(self.cursor) else {
            return;
        };
        if self.main.contains_path(&track.path) {
            return;
        }
        let track = track.clone();
        self.main.push(track);
        self.main_dirty = true;
    }

    /// Export the queue as `segue.m3u` in the working directory (`p` key);
    /// the written path or the failure shows up in the status line.
    fn export_queue(&mut self) {
        let result = env::current_dir().and_then(|dir| library::export_queue(self.queue, &dir));
        self.status = Some(match result {
            Ok(path) => format!("queue exported to {}", path.display()),
            Err(e) => format!("export failed: {e}"),
        });
    }

    fn handle_resize(&mut self) -> Result<()> {
        self.events.settle_resize()?;
        self.terminal.clear()?;
        Ok(())
    }

    /// Forward skip: only actionable when the look-ahead is loaded, there
    /// is a next track, and no skip is in progress. Forces exhaustion and
    /// lets the normal advance path do the swap.
    fn skip_to_next(&mut self) {
        if self.skipping {
            return;
        }
        if !matches!(self.lookahead, Lookahead::Loaded { end_of_list: false }) {
            return;
        }
        if self.queue.next_index(self.cursor).is_none() {
            return;
        }
        self.skipping = true;
        self.device.skip_active();
    }

    /// Reverse skip: the loader only looks ahead, never behind, so the
    /// previous track has to be reloaded synchronously into the freed slot.
    /// The control loop blocks (bounded polls) until that load lands; the
    /// queued forward prefetch is cancelled by the sink rebuild.
    fn skip_to_prev(&mut self) {
        if self.skipping {
            return;
        }
        if !matches!(self.lookahead, Lookahead::Loaded { .. }) {
            return;
        }
        let Some(prev) = self.queue.prev_index(self.cursor) else {
            return;
        };
        self.skipping = true;
        self.cursor = prev;

        let target = self.active.other();
        self.prefetch.clear_slot(target);
        let path = self.queue.get(prev).map(|t| t.path.clone());
        self.prefetch.request_load(path, target);

        loop {
            match self.prefetch.phase() {
                LoadPhase::Ready(slot) => {
                    self.prefetch.acknowledge();
                    if let Some(source) = self.prefetch.with_slot(slot, |t| t.map(|p| p.to_source()))
                    {
                        self.device.play_now(source, self.state == State::Paused);
                    }
                    self.prefetch.clear_slot(self.active);
                    self.active = slot;
                    break;
                }
                LoadPhase::Failed => {
                    self.load_failure = Some(
                        self.prefetch
                            .take_error()
                            .unwrap_or_else(|| "previous track failed to load".to_string()),
                    );
                    self.state = State::Quitting;
                    return;
                }
                _ => thread::sleep(LOAD_POLL),
            }
        }

        self.lookahead = Lookahead::Idle;
        self.next_queued = false;
        self.reset_clock_for_new_track();
        self.skipping = false;
    }

    /// Drive the look-ahead state forward by one observation: issue the
    /// next request when idle, pick up completion, and stage the loaded
    /// source on the device (unless repeat will replay the active slot).
    fn poll_lookahead(&mut self) {
        match self.lookahead {
            Lookahead::Idle => {
                let path = self
                    .queue
                    .next_index(self.cursor)
                    .and_then(|i| self.queue.get(i))
                    .map(|t| t.path.clone());
                self.prefetch.request_load(path, self.active.other());
                self.lookahead = Lookahead::InFlight;
            }
            Lookahead::InFlight => match self.prefetch.phase() {
                LoadPhase::Ready(slot) => {
                    self.prefetch.acknowledge();
                    let end_of_list = self.prefetch.slot_is_empty(slot);
                    self.lookahead = Lookahead::Loaded { end_of_list };
                }
                LoadPhase::Failed => {
                    self.load_failure = Some(
                        self.prefetch
                            .take_error()
                            .unwrap_or_else(|| "track failed to load".to_string()),
                    );
                }
                _ => {}
            },
            Lookahead::Loaded { end_of_list } => {
                if !end_of_list && !self.next_queued && !self.repeat {
                    if let Some(source) = self
                        .prefetch
                        .with_slot(self.active.other(), |t| t.map(|p| p.to_source()))
                    {
                        self.device.queue_next(source);
                        self.next_queued = true;
                    }
                }
            }
        }
    }

    /// Bounded wait for the look-ahead to finish, servicing the handshake
    /// only. Used when the device runs dry before the load completes.
    fn wait_for_lookahead(&mut self) {
        while !matches!(self.lookahead, Lookahead::Loaded { .. }) && self.load_failure.is_none() {
            self.poll_lookahead();
            if matches!(self.lookahead, Lookahead::Loaded { .. }) {
                break;
            }
            thread::sleep(LOAD_POLL);
        }
    }

    /// ADVANCING: the active source is exhausted and the look-ahead is
    /// settled. With repeat on, replay the active slot and keep the pending
    /// slot; otherwise move the cursor, swap slots and free the old one.
    fn advance(&mut self) {
        if self.repeat {
            if let Some(source) = self
                .prefetch
                .with_slot(self.active, |t| t.map(|p| p.to_source()))
            {
                self.device.play_now(source, self.state == State::Paused);
            }
            self.next_queued = false;
            self.reset_clock_for_new_track();
            self.skipping = false;
            return;
        }

        match self.lookahead {
            Lookahead::Loaded { end_of_list: false } => {
                if let Some(next) = self.queue.next_index(self.cursor) {
                    self.cursor = next;
                    self.prefetch.clear_slot(self.active);
                    self.active = self.active.other();
                    self.device.accept_pending();
                    self.lookahead = Lookahead::Idle;
                    self.next_queued = false;
                    self.reset_clock_for_new_track();
                } else {
                    self.list_exhausted = true;
                    self.state = State::Quitting;
                }
            }
            Lookahead::Loaded { end_of_list: true } => {
                self.list_exhausted = true;
                self.state = State::Quitting;
            }
            // Unreachable in practice: advance() runs after wait_for_lookahead.
            Lookahead::Idle | Lookahead::InFlight => {}
        }
        self.skipping = false;
    }

    fn reset_clock_for_new_track(&mut self) {
        let now = Instant::now();
        self.clock.reset(now);
        if self.state == State::Paused {
            self.clock.pause(now);
        }
    }

    /// Rebuild the device queue from the active slot, seeking to `at`.
    fn requeue_active_at(&mut self, at: Duration) {
        if let Some(source) = self
            .prefetch
            .with_slot(self.active, |t| t.map(|p| p.to_source()))
        {
            self.device
                .play_now(source.skip_duration(at), self.state == State::Paused);
        }
    }

    fn render(&mut self) -> Result<()> {
        let view = self.build_view();
        self.terminal.draw(|f| ui::draw(f, &view))?;
        Ok(())
    }

    fn build_view(&self) -> ui::PlayerView {
        let fallback = self.queue.get(self.cursor);
        let (title, artist, album, duration) = self.prefetch.with_slot(self.active, |t| match t {
            Some(p) => (p.title.clone(), p.artist.clone(), p.album.clone(), p.duration),
            None => match fallback {
                Some(t) => (t.title.clone(), t.artist.clone(), t.album.clone(), t.duration),
                None => (String::new(), None, None, None),
            },
        });

        let levels = if self.ui.visualizer && self.state == State::Playing {
            self.prefetch.with_slot(self.active, |t| {
                t.map(|p| p.levels(self.clock.elapsed(), ui::VISUALIZER_BARS))
                    .unwrap_or_default()
            })
        } else {
            Vec::new()
        };

        ui::PlayerView {
            title,
            artist,
            album,
            duration,
            position: (self.cursor + 1, self.queue.len()),
            queue_total: self.queue.total_duration(),
            elapsed: self.clock.elapsed(),
            pause_span: self.clock.pause_span(),
            paused: self.state == State::Paused,
            repeat: self.repeat,
            volume: self.volume,
            covers: self.ui.covers,
            visualizer: self.ui.visualizer,
            blocks: self.ui.blocks,
            info: self.ui.info,
            status: self.status.clone(),
            levels,
        }
    }

    /// QUITTING: one teardown path for every fatal condition. The device is
    /// closed and both slots freed; terminal restore is the caller's job.
    fn shutdown(&mut self) {
        self.device.close();
        self.prefetch.clear_all();
        self.state = State::Stopped;
    }

    fn into_outcome(self) -> Outcome {
        Outcome {
            list_exhausted: self.list_exhausted,
            load_failure: self.load_failure,
            ui: self.ui,
            volume: self.volume,
            main_dirty: self.main_dirty,
        }
    }
}
