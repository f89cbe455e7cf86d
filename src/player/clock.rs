use std::time::{Duration, Instant};

/// Elapsed/pause accounting for the currently playing track.
///
/// Elapsed time is `(now - start) - total_pause`. While paused only the
/// current pause span grows, so the UI can show a live paused duration; the
/// span is folded into `total_pause` on resume. All instants are monotonic.
#[derive(Debug)]
pub struct TrackClock {
    started_at: Instant,
    paused_at: Option<Instant>,
    elapsed: Duration,
    pause_span: Duration,
    total_pause: Duration,
}

impl TrackClock {
    pub fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            paused_at: None,
            elapsed: Duration::ZERO,
            pause_span: Duration::ZERO,
            total_pause: Duration::ZERO,
        }
    }

    /// Reset everything for a new track. The pause state itself is the
    /// caller's concern; a controller that is still paused re-pauses after
    /// the reset.
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    /// Sample the accumulators. Called once per control-loop iteration.
    pub fn tick(&mut self, now: Instant) {
        match self.paused_at {
            None => {
                self.elapsed = now
                    .duration_since(self.started_at)
                    .saturating_sub(self.total_pause);
            }
            Some(paused_at) => {
                self.pause_span = now.duration_since(paused_at);
            }
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
            self.pause_span = Duration::ZERO;
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.total_pause += now.duration_since(paused_at);
            self.pause_span = Duration::ZERO;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Duration of the pause currently in progress (zero while playing).
    pub fn pause_span(&self) -> Duration {
        self.pause_span
    }

    #[cfg(test)]
    pub fn total_pause(&self) -> Duration {
        self.total_pause
    }
}
