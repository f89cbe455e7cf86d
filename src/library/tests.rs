use std::path::PathBuf;
use std::time::Duration;

use super::model::{Playlist, Track};

fn track(name: &str, secs: u64) -> Track {
    Track {
        path: PathBuf::from(format!("/music/{name}.mp3")),
        title: name.to_string(),
        artist: None,
        album: None,
        duration: Some(Duration::from_secs(secs)),
        display: name.to_string(),
    }
}

fn playlist(names: &[&str]) -> Playlist {
    Playlist::new(names.iter().map(|n| track(n, 60)).collect())
}

#[test]
fn neighbor_lookups_stop_at_both_ends() {
    let pl = playlist(&["a", "b", "c"]);
    assert_eq!(pl.next_index(0), Some(1));
    assert_eq!(pl.next_index(1), Some(2));
    assert_eq!(pl.next_index(2), None);
    assert_eq!(pl.prev_index(0), None);
    assert_eq!(pl.prev_index(2), Some(1));
}

#[test]
fn total_duration_tracks_pushes() {
    let mut pl = playlist(&["a", "b"]);
    assert_eq!(pl.total_duration(), Duration::from_secs(120));
    pl.push(track("c", 30));
    assert_eq!(pl.total_duration(), Duration::from_secs(150));
}

#[test]
fn shuffle_from_moves_current_to_front_and_keeps_membership() {
    let mut pl = playlist(&["a", "b", "c", "d", "e"]);
    let cursor = pl.shuffle_from(3, &mut rand::rng());
    assert_eq!(cursor, 0);
    assert_eq!(pl.get(0).unwrap().title, "d");
    assert_eq!(pl.len(), 5);

    let mut titles: Vec<&str> = pl.tracks().iter().map(|t| t.title.as_str()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn shuffle_from_on_single_track_list_is_safe() {
    let mut pl = playlist(&["a"]);
    assert_eq!(pl.shuffle_from(0, &mut rand::rng()), 0);
    assert_eq!(pl.len(), 1);
}

#[test]
fn contains_path_matches_exact_paths() {
    let pl = playlist(&["a", "b"]);
    assert!(pl.contains_path(std::path::Path::new("/music/a.mp3")));
    assert!(!pl.contains_path(std::path::Path::new("/music/z.mp3")));
}

#[test]
fn deep_copy_is_independent_of_the_original() {
    let original = playlist(&["a", "b", "c"]);
    let mut copy = original.clone();
    copy.shuffle(&mut rand::rng());
    copy.push(track("d", 10));

    assert_eq!(original.len(), 3);
    assert_eq!(original.get(0).unwrap().title, "a");
    assert_eq!(copy.len(), 4);
}
