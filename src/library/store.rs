//! Persistence for the main playlist and queue export.
//!
//! The main playlist is an M3U file in the segue config directory. Lines
//! starting with `#` are comments/metadata; every other non-empty line is a
//! track path. Saving writes `#EXTINF` entries so the file is usable by
//! other players too.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config;

use super::model::{Playlist, Track};
use super::scan::track_from_path;

const MAIN_PLAYLIST_FILE: &str = "main.m3u";

pub fn main_playlist_path() -> Option<PathBuf> {
    config::config_dir().map(|d| d.join(MAIN_PLAYLIST_FILE))
}

/// Load the persisted main playlist. A missing file is an empty list, not
/// an error. Entries whose files no longer exist are skipped.
pub fn load_main_playlist() -> Playlist {
    let Some(path) = main_playlist_path() else {
        return Playlist::default();
    };
    read_m3u(&path)
}

pub fn save_main_playlist(playlist: &Playlist) -> io::Result<PathBuf> {
    let path = main_playlist_path()
        .ok_or_else(|| io::Error::other("no config directory available (HOME unset)"))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_m3u(&path, playlist)?;
    Ok(path)
}

/// Export the active queue as `segue.m3u` in `dir` (the `p` key).
pub fn export_queue(playlist: &Playlist, dir: &Path) -> io::Result<PathBuf> {
    let path = dir.join("segue.m3u");
    write_m3u(&path, playlist)?;
    Ok(path)
}

fn read_m3u(path: &Path) -> Playlist {
    let Ok(body) = fs::read_to_string(path) else {
        return Playlist::default();
    };

    let mut tracks: Vec<Track> = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let entry = Path::new(line);
        if entry.is_file() {
            tracks.push(track_from_path(entry));
        }
    }
    Playlist::new(tracks)
}

fn write_m3u(path: &Path, playlist: &Playlist) -> io::Result<()> {
    let mut out = fs::File::create(path)?;
    writeln!(out, "#EXTM3U")?;
    for track in playlist.tracks() {
        let secs = track
            .duration
            .map(|d| d.as_secs() as i64)
            .unwrap_or(-1);
        writeln!(out, "#EXTINF:{},{}", secs, track.display)?;
        writeln!(out, "{}", track.path.display())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn track(path: PathBuf, title: &str, secs: u64) -> Track {
        Track {
            path,
            title: title.to_string(),
            artist: None,
            album: None,
            duration: Some(Duration::from_secs(secs)),
            display: title.to_string(),
        }
    }

    #[test]
    fn m3u_round_trip_keeps_existing_tracks_in_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mp3");
        let b = dir.path().join("b.mp3");
        fs::write(&a, b"not real").unwrap();
        fs::write(&b, b"not real").unwrap();

        let playlist = Playlist::new(vec![
            track(b.clone(), "second", 120),
            track(a.clone(), "first", 95),
        ]);
        let file = dir.path().join("list.m3u");
        write_m3u(&file, &playlist).unwrap();

        let loaded = read_m3u(&file);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(0).unwrap().path, b);
        assert_eq!(loaded.get(1).unwrap().path, a);
    }

    #[test]
    fn read_m3u_skips_missing_files_and_comments() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real.mp3");
        fs::write(&real, b"not real").unwrap();

        let file = dir.path().join("list.m3u");
        let body = format!(
            "#EXTM3U\n#EXTINF:10,gone\n{}\n{}\n",
            dir.path().join("gone.mp3").display(),
            real.display()
        );
        fs::write(&file, body).unwrap();

        let loaded = read_m3u(&file);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(0).unwrap().path, real);
    }

    #[test]
    fn read_m3u_missing_file_is_empty_playlist() {
        let loaded = read_m3u(Path::new("/nonexistent/none.m3u"));
        assert!(loaded.is_empty());
    }

    #[test]
    fn export_queue_writes_into_target_dir() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mp3");
        fs::write(&a, b"not real").unwrap();

        let playlist = Playlist::new(vec![track(a, "only", 30)]);
        let written = export_queue(&playlist, dir.path()).unwrap();
        assert_eq!(written, dir.path().join("segue.m3u"));
        let body = fs::read_to_string(written).unwrap();
        assert!(body.starts_with("#EXTM3U"));
        assert!(body.contains("#EXTINF:30,only"));
    }
}
