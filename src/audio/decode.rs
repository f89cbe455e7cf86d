use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::ItemKey;
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, Source};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: rodio::decoder::DecoderError,
    },
    #[error("no audio samples in {}", path.display())]
    Empty { path: PathBuf },
}

/// A fully decoded track: interleaved PCM plus the metadata the UI shows.
/// Lives in one of the two prefetch slots; `to_source` hands a playable
/// copy to the device.
#[derive(Debug, Clone)]
pub struct PreparedTrack {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    channels: u16,
    sample_rate: u32,
    samples: Arc<[f32]>,
}

impl PreparedTrack {
    pub(crate) fn from_pcm(
        path: PathBuf,
        title: String,
        artist: Option<String>,
        album: Option<String>,
        duration: Option<Duration>,
        channels: u16,
        sample_rate: u32,
        samples: Vec<f32>,
    ) -> Self {
        Self {
            path,
            title,
            artist,
            album,
            duration,
            channels,
            sample_rate,
            samples: samples.into(),
        }
    }

    pub fn to_source(&self) -> SamplesBuffer {
        SamplesBuffer::new(self.channels, self.sample_rate, self.samples.to_vec())
    }

    /// Peak levels for `bars` consecutive chunks of the window starting at
    /// `at`, used by the visualizer. Values are in `0.0..=1.0`.
    pub fn levels(&self, at: Duration, bars: usize) -> Vec<f32> {
        const WINDOW_FRAMES: usize = 2048;

        if bars == 0 || self.samples.is_empty() {
            return vec![0.0; bars];
        }

        let frame_width = self.channels.max(1) as usize;
        let start_frame = (at.as_secs_f64() * self.sample_rate as f64) as usize;
        let start = (start_frame * frame_width).min(self.samples.len());
        let end = (start + WINDOW_FRAMES * frame_width).min(self.samples.len());
        let window = &self.samples[start..end];
        if window.is_empty() {
            return vec![0.0; bars];
        }

        let chunk = (window.len() / bars).max(1);
        (0..bars)
            .map(|i| {
                window
                    .iter()
                    .skip(i * chunk)
                    .take(chunk)
                    .fold(0.0f32, |peak, s| peak.max(s.abs()))
                    .min(1.0)
            })
            .collect()
    }
}

/// Decode `path` into PCM and read its tags. Called exactly once per load
/// request, always on the loader thread, never on the control loop.
pub fn decode(path: &Path) -> Result<PreparedTrack, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|source| DecodeError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let mut duration = decoder.total_duration();
    let samples: Vec<f32> = decoder.collect();
    if samples.is_empty() {
        return Err(DecodeError::Empty {
            path: path.to_path_buf(),
        });
    }

    let default_title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut title = default_title;
    let mut artist: Option<String> = None;
    let mut album: Option<String> = None;

    if let Ok(tagged) = lofty::read_from_path(path) {
        if duration.is_none() {
            duration = Some(tagged.properties().duration());
        }
        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            if let Some(v) = tag.get_string(&ItemKey::TrackTitle) {
                if !v.trim().is_empty() {
                    title = v.to_string();
                }
            }
            if let Some(v) = tag.get_string(&ItemKey::TrackArtist) {
                let v = v.trim();
                if !v.is_empty() {
                    artist = Some(v.to_string());
                }
            }
            if let Some(v) = tag.get_string(&ItemKey::AlbumTitle) {
                let v = v.trim();
                if !v.is_empty() {
                    album = Some(v.to_string());
                }
            }
        }
    }

    if duration.is_none() {
        let frames = samples.len() as f64 / channels.max(1) as f64;
        duration = Some(Duration::from_secs_f64(frames / sample_rate.max(1) as f64));
    }

    Ok(PreparedTrack {
        path: path.to_path_buf(),
        title,
        artist,
        album,
        duration,
        channels,
        sample_rate,
        samples: samples.into(),
    })
}
