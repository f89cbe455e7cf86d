use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    pub display: String,
}

/// An ordered play queue. Neighbor lookups go through indices so the
/// controller can hold a plain cursor; `None` from `next_index` marks the
/// end of the list.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    tracks: Vec<Track>,
    total_duration: Duration,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut pl = Self {
            tracks,
            total_duration: Duration::ZERO,
        };
        pl.recompute_total();
        pl
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    pub fn next_index(&self, index: usize) -> Option<usize> {
        (index + 1 < self.tracks.len()).then_some(index + 1)
    }

    pub fn prev_index(&self, index: usize) -> Option<usize> {
        index.checked_sub(1)
    }

    pub fn push(&mut self, track: Track) {
        self.total_duration += track.duration.unwrap_or(Duration::ZERO);
        self.tracks.push(track);
    }

    pub fn contains_path(&self, path: &std::path::Path) -> bool {
        self.tracks.iter().any(|t| t.path == path)
    }

    /// Shuffle the whole list.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.tracks.shuffle(rng);
    }

    /// Shuffle everything after the currently playing track, moving that
    /// track to the front. Returns the new cursor position for it.
    pub fn shuffle_from<R: Rng>(&mut self, current: usize, rng: &mut R) -> usize {
        if self.tracks.is_empty() {
            return 0;
        }
        let current = current.min(self.tracks.len() - 1);
        self.tracks.swap(0, current);
        self.tracks[1..].shuffle(rng);
        0
    }

    fn recompute_total(&mut self) {
        self.total_duration = self
            .tracks
            .iter()
            .filter_map(|t| t.duration)
            .sum();
    }
}
