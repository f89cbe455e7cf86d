use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::audio::{DecodeError, PreparedTrack};

use super::clock::TrackClock;
use super::events::{Command, EventSource, map_key};
use super::prefetch::{LoadPhase, Prefetch, Slot};

// --- clock ---

#[test]
fn clock_tracks_elapsed_while_playing() {
    let t0 = Instant::now();
    let mut clock = TrackClock::new(t0);
    clock.tick(t0 + Duration::from_secs(3));
    assert_eq!(clock.elapsed(), Duration::from_secs(3));
    assert_eq!(clock.pause_span(), Duration::ZERO);
}

#[test]
fn clock_freezes_elapsed_and_grows_pause_span_while_paused() {
    let t0 = Instant::now();
    let mut clock = TrackClock::new(t0);
    clock.tick(t0 + Duration::from_secs(2));
    clock.pause(t0 + Duration::from_secs(2));

    clock.tick(t0 + Duration::from_secs(5));
    assert_eq!(clock.elapsed(), Duration::from_secs(2));
    assert_eq!(clock.pause_span(), Duration::from_secs(3));
}

#[test]
fn pause_resume_is_elapsed_neutral() {
    // Pausing then resuming adds exactly the paused interval to the total
    // pause time; net elapsed is as if the toggle never happened.
    let t0 = Instant::now();
    let mut clock = TrackClock::new(t0);

    clock.pause(t0 + Duration::from_secs(10));
    clock.tick(t0 + Duration::from_secs(14));
    clock.resume(t0 + Duration::from_secs(14));

    assert_eq!(clock.total_pause(), Duration::from_secs(4));
    assert_eq!(clock.pause_span(), Duration::ZERO);

    clock.tick(t0 + Duration::from_secs(20));
    assert_eq!(clock.elapsed(), Duration::from_secs(16));
}

#[test]
fn double_pause_and_double_resume_are_no_ops() {
    let t0 = Instant::now();
    let mut clock = TrackClock::new(t0);

    clock.pause(t0 + Duration::from_secs(1));
    clock.pause(t0 + Duration::from_secs(2));
    clock.resume(t0 + Duration::from_secs(3));
    clock.resume(t0 + Duration::from_secs(9));

    assert_eq!(clock.total_pause(), Duration::from_secs(2));
}

#[test]
fn reset_zeroes_all_accumulators() {
    let t0 = Instant::now();
    let mut clock = TrackClock::new(t0);
    clock.pause(t0 + Duration::from_secs(1));
    clock.tick(t0 + Duration::from_secs(2));
    clock.resume(t0 + Duration::from_secs(3));

    let t1 = t0 + Duration::from_secs(10);
    clock.reset(t1);
    assert!(!clock.is_paused());
    assert_eq!(clock.elapsed(), Duration::ZERO);
    assert_eq!(clock.pause_span(), Duration::ZERO);
    assert_eq!(clock.total_pause(), Duration::ZERO);
    clock.tick(t1 + Duration::from_secs(1));
    assert_eq!(clock.elapsed(), Duration::from_secs(1));
}

// --- events ---

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[test]
fn map_key_covers_the_command_vocabulary() {
    assert_eq!(map_key(key(KeyCode::Char('q'))), Command::Quit);
    assert_eq!(map_key(key(KeyCode::Char('s'))), Command::Shuffle);
    assert_eq!(map_key(key(KeyCode::Char('c'))), Command::ToggleCovers);
    assert_eq!(map_key(key(KeyCode::Char('e'))), Command::ToggleVisualizer);
    assert_eq!(map_key(key(KeyCode::Char('b'))), Command::ToggleBlocks);
    assert_eq!(map_key(key(KeyCode::Char('a'))), Command::AddToPlaylist);
    assert_eq!(map_key(key(KeyCode::Char('d'))), Command::DeleteFromPlaylist);
    assert_eq!(map_key(key(KeyCode::Char('r'))), Command::ToggleRepeat);
    assert_eq!(map_key(key(KeyCode::Char('p'))), Command::ExportPlaylist);
    assert_eq!(map_key(key(KeyCode::Up)), Command::VolumeUp);
    assert_eq!(map_key(key(KeyCode::Down)), Command::VolumeDown);
    assert_eq!(map_key(key(KeyCode::Right)), Command::Next);
    assert_eq!(map_key(key(KeyCode::Left)), Command::Prev);
    assert_eq!(map_key(key(KeyCode::Char(' '))), Command::PlayPause);
    assert_eq!(map_key(key(KeyCode::F(1))), Command::ToggleInfo);
}

#[test]
fn map_key_unknown_is_noop() {
    assert_eq!(map_key(key(KeyCode::Char('z'))), Command::Noop);
    assert_eq!(map_key(key(KeyCode::Esc)), Command::Noop);
    assert_eq!(map_key(key(KeyCode::Enter)), Command::Noop);
}

#[test]
fn cooldown_gate_drops_keys_inside_the_window() {
    let mut source = EventSource::new(Duration::from_millis(200));
    let t0 = Instant::now();

    assert!(source.gate_at(t0));
    assert!(!source.gate_at(t0 + Duration::from_millis(100)));
    // A rejected key must not restart the window.
    assert!(source.gate_at(t0 + Duration::from_millis(220)));
}

// --- prefetch ---

fn stub_decode(path: &Path) -> Result<PreparedTrack, DecodeError> {
    Ok(PreparedTrack::from_pcm(
        path.to_path_buf(),
        "stub".to_string(),
        None,
        None,
        Some(Duration::from_secs(1)),
        1,
        8_000,
        vec![0.0; 800],
    ))
}

fn slow_decode(path: &Path) -> Result<PreparedTrack, DecodeError> {
    thread::sleep(Duration::from_millis(100));
    stub_decode(path)
}

fn failing_decode(path: &Path) -> Result<PreparedTrack, DecodeError> {
    Err(DecodeError::Empty {
        path: path.to_path_buf(),
    })
}

fn wait_settled(prefetch: &Prefetch) -> LoadPhase {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match prefetch.phase() {
            LoadPhase::Loading(_) => {
                assert!(Instant::now() < deadline, "load never settled");
                thread::sleep(Duration::from_millis(5));
            }
            settled => return settled,
        }
    }
}

#[test]
fn slot_other_alternates() {
    assert_eq!(Slot::A.other(), Slot::B);
    assert_eq!(Slot::B.other(), Slot::A);
    assert_eq!(Slot::A.other().other(), Slot::A);
}

#[test]
fn load_publishes_ready_for_the_requested_slot() {
    let prefetch = Prefetch::with_decoder(stub_decode);
    prefetch.request_load(Some(PathBuf::from("/music/a.mp3")), Slot::B);

    assert_eq!(wait_settled(&prefetch), LoadPhase::Ready(Slot::B));
    assert!(!prefetch.slot_is_empty(Slot::B));
    assert!(prefetch.slot_is_empty(Slot::A));
    prefetch.with_slot(Slot::B, |t| {
        assert_eq!(t.unwrap().path, PathBuf::from("/music/a.mp3"));
    });
}

#[test]
fn empty_path_signals_end_of_list_with_an_empty_slot() {
    let prefetch = Prefetch::with_decoder(stub_decode);
    prefetch.request_load(None, Slot::A);

    assert_eq!(wait_settled(&prefetch), LoadPhase::Ready(Slot::A));
    assert!(prefetch.slot_is_empty(Slot::A));
}

#[test]
fn decode_failure_publishes_failed_and_records_the_error() {
    let prefetch = Prefetch::with_decoder(failing_decode);
    prefetch.request_load(Some(PathBuf::from("/music/broken.mp3")), Slot::A);

    assert_eq!(wait_settled(&prefetch), LoadPhase::Failed);
    assert!(prefetch.slot_is_empty(Slot::A));
    let err = prefetch.take_error().expect("error recorded");
    assert!(err.contains("broken.mp3"));
}

#[test]
fn slot_reads_do_not_wait_on_an_in_flight_decode() {
    let prefetch = Prefetch::with_decoder(slow_decode);
    prefetch.request_load(Some(PathBuf::from("/music/slow.mp3")), Slot::A);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(prefetch.phase(), LoadPhase::Loading(Slot::A));

    // The render path reads slots every tick; it must only ever see the
    // brief store critical section, never the decode itself.
    let t0 = Instant::now();
    assert!(prefetch.slot_is_empty(Slot::A));
    assert!(t0.elapsed() < Duration::from_millis(50));

    assert_eq!(wait_settled(&prefetch), LoadPhase::Ready(Slot::A));
}

#[test]
fn a_second_request_while_loading_is_dropped() {
    let prefetch = Prefetch::with_decoder(slow_decode);
    prefetch.request_load(Some(PathBuf::from("/music/first.mp3")), Slot::A);
    assert_eq!(prefetch.phase(), LoadPhase::Loading(Slot::A));

    // This one violates the one-in-flight contract and must not take over.
    prefetch.request_load(Some(PathBuf::from("/music/second.mp3")), Slot::B);
    assert_eq!(prefetch.phase(), LoadPhase::Loading(Slot::A));

    assert_eq!(wait_settled(&prefetch), LoadPhase::Ready(Slot::A));
    prefetch.with_slot(Slot::A, |t| {
        assert_eq!(t.unwrap().path, PathBuf::from("/music/first.mp3"));
    });
    assert!(prefetch.slot_is_empty(Slot::B));
}

#[test]
fn acknowledge_returns_to_idle_but_keeps_the_slot() {
    let prefetch = Prefetch::with_decoder(stub_decode);
    prefetch.request_load(Some(PathBuf::from("/music/a.mp3")), Slot::A);
    assert_eq!(wait_settled(&prefetch), LoadPhase::Ready(Slot::A));

    prefetch.acknowledge();
    assert_eq!(prefetch.phase(), LoadPhase::Idle);
    assert!(!prefetch.slot_is_empty(Slot::A));
}

#[test]
fn sequential_loads_alternate_slots_without_clobbering() {
    let prefetch = Prefetch::with_decoder(stub_decode);

    prefetch.request_load(Some(PathBuf::from("/music/one.mp3")), Slot::A);
    assert_eq!(wait_settled(&prefetch), LoadPhase::Ready(Slot::A));
    prefetch.acknowledge();

    prefetch.request_load(Some(PathBuf::from("/music/two.mp3")), Slot::B);
    assert_eq!(wait_settled(&prefetch), LoadPhase::Ready(Slot::B));
    prefetch.acknowledge();

    prefetch.with_slot(Slot::A, |t| {
        assert_eq!(t.unwrap().path, PathBuf::from("/music/one.mp3"));
    });
    prefetch.with_slot(Slot::B, |t| {
        assert_eq!(t.unwrap().path, PathBuf::from("/music/two.mp3"));
    });
}

#[test]
fn clear_all_empties_both_slots() {
    let prefetch = Prefetch::with_decoder(stub_decode);
    prefetch.request_load(Some(PathBuf::from("/music/a.mp3")), Slot::A);
    assert_eq!(wait_settled(&prefetch), LoadPhase::Ready(Slot::A));
    prefetch.acknowledge();

    prefetch.clear_all();
    assert!(prefetch.slot_is_empty(Slot::A));
    assert!(prefetch.slot_is_empty(Slot::B));
}
