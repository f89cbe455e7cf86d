use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to open audio output device: {0}")]
    Open(#[from] rodio::StreamError),
}

/// What the playback controller needs from an audio output. [`Device`] is
/// the production implementation; tests drive the controller with an
/// in-memory stand-in.
pub trait AudioOut {
    /// Replace everything in the output with `source`. `paused` is the
    /// playback state the caller wants afterwards; the implementation must
    /// not infer it from its own state.
    fn play_now<S>(&mut self, source: S, paused: bool)
    where
        S: Source<Item = f32> + Send + 'static;

    /// Stage the look-ahead source behind the active one.
    fn queue_next<S>(&mut self, source: S)
    where
        S: Source<Item = f32> + Send + 'static;

    /// True once the active source has been fully consumed, whether or not
    /// a pending source has already taken over.
    fn is_exhausted(&self) -> bool;

    /// Acknowledge that the pending source is now the active one.
    fn accept_pending(&mut self);

    /// Force the active source to its end; the pending source (if any)
    /// starts immediately and `is_exhausted` reports true.
    fn skip_active(&self);

    fn set_paused(&self, paused: bool);

    fn set_volume(&self, volume: f32);

    /// Nudge the volume by `delta` and return the clamped result.
    fn adjust_volume(&self, delta: f32) -> f32;

    fn close(&self);
}

/// The audio-device collaborator. One `rodio` sink carries the active
/// source plus at most one pending source; when the active source runs
/// out the sink starts the pending one without a device restart, which is
/// what makes transitions gapless.
pub struct Device {
    _stream: OutputStream,
    sink: Sink,
    pending: usize,
}

impl Device {
    pub fn open() -> Result<Self, DeviceError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // Dropping an OutputStream makes rodio print to stderr, which would
        // land in the middle of the TUI.
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        Ok(Self {
            _stream: stream,
            sink,
            pending: 0,
        })
    }
}

impl AudioOut for Device {
    fn play_now<S>(&mut self, source: S, paused: bool)
    where
        S: Source<Item = f32> + Send + 'static,
    {
        // Sink::clear pauses the sink, so the caller's pause state is
        // re-applied unconditionally afterwards.
        self.sink.clear();
        self.sink.append(source);
        self.pending = 0;
        if paused {
            self.sink.pause();
        } else {
            self.sink.play();
        }
    }

    fn queue_next<S>(&mut self, source: S)
    where
        S: Source<Item = f32> + Send + 'static,
    {
        self.sink.append(source);
        self.pending += 1;
    }

    fn is_exhausted(&self) -> bool {
        self.sink.len() <= self.pending
    }

    fn accept_pending(&mut self) {
        self.pending = 0;
    }

    fn skip_active(&self) {
        self.sink.skip_one();
    }

    fn set_paused(&self, paused: bool) {
        if paused {
            self.sink.pause();
        } else {
            self.sink.play();
        }
    }

    fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume.clamp(0.0, 2.0));
    }

    fn adjust_volume(&self, delta: f32) -> f32 {
        let volume = (self.sink.volume() + delta).clamp(0.0, 2.0);
        self.sink.set_volume(volume);
        volume
    }

    fn close(&self) {
        self.sink.stop();
    }
}
