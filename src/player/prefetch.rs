use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::audio::{DecodeError, PreparedTrack, decode};

/// One of the two track-buffer positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

/// The load handshake, published as a single atomic tag instead of a pair
/// of booleans so the control loop can never observe a torn combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading(Slot),
    Ready(Slot),
    Failed,
}

const PHASE_IDLE: u8 = 0;
const PHASE_LOADING_A: u8 = 1;
const PHASE_LOADING_B: u8 = 2;
const PHASE_READY_A: u8 = 3;
const PHASE_READY_B: u8 = 4;
const PHASE_FAILED: u8 = 5;

fn encode(phase: LoadPhase) -> u8 {
    match phase {
        LoadPhase::Idle => PHASE_IDLE,
        LoadPhase::Loading(Slot::A) => PHASE_LOADING_A,
        LoadPhase::Loading(Slot::B) => PHASE_LOADING_B,
        LoadPhase::Ready(Slot::A) => PHASE_READY_A,
        LoadPhase::Ready(Slot::B) => PHASE_READY_B,
        LoadPhase::Failed => PHASE_FAILED,
    }
}

fn decode_phase(raw: u8) -> LoadPhase {
    match raw {
        PHASE_LOADING_A => LoadPhase::Loading(Slot::A),
        PHASE_LOADING_B => LoadPhase::Loading(Slot::B),
        PHASE_READY_A => LoadPhase::Ready(Slot::A),
        PHASE_READY_B => LoadPhase::Ready(Slot::B),
        PHASE_FAILED => LoadPhase::Failed,
        _ => LoadPhase::Idle,
    }
}

type DecodeFn = fn(&Path) -> Result<PreparedTrack, DecodeError>;

/// The double-buffered look-ahead loader.
///
/// Two `PreparedTrack` slots sit behind one mutex. A detached loader thread
/// decodes entirely outside the lock, takes it only long enough to store the
/// result, and then flips the phase tag to `Ready` (release ordering), so
/// the control loop never trusts slot contents it has not seen a `Ready`
/// for — and never stalls on the mutex while a decode is in flight. At most
/// one load is in flight: a request while `Loading` is a contract violation
/// and is rejected.
pub struct Prefetch {
    slots: Arc<Mutex<[Option<PreparedTrack>; 2]>>,
    phase: Arc<AtomicU8>,
    error: Arc<Mutex<Option<String>>>,
    decode: DecodeFn,
}

impl Prefetch {
    pub fn new() -> Self {
        Self::with_decoder(decode)
    }

    /// Injectable decoder, used by tests to avoid real audio files.
    pub fn with_decoder(decode: DecodeFn) -> Self {
        Self {
            slots: Arc::new(Mutex::new([None, None])),
            phase: Arc::new(AtomicU8::new(PHASE_IDLE)),
            error: Arc::new(Mutex::new(None)),
            decode,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        decode_phase(self.phase.load(Ordering::Acquire))
    }

    /// Start a background load of `path` into `target`. `None` means "no
    /// next track": the slot is left empty and the phase still goes to
    /// `Ready`, which downstream reads as end-of-list. The loader thread is
    /// detached; completion is observed through the phase tag alone.
    pub fn request_load(&self, path: Option<PathBuf>, target: Slot) {
        // Contract: the controller only issues a request after observing a
        // settled phase. A request racing an in-flight load is dropped.
        if matches!(self.phase(), LoadPhase::Loading(_)) {
            return;
        }
        self.phase
            .store(encode(LoadPhase::Loading(target)), Ordering::Release);

        let slots = Arc::clone(&self.slots);
        let phase = Arc::clone(&self.phase);
        let error = Arc::clone(&self.error);
        let decode = self.decode;

        thread::spawn(move || {
            // Decoding happens before the lock is taken; slot readers on the
            // control loop must never wait out a decode.
            let loaded = match path {
                None => Ok(None),
                Some(p) => decode(&p).map(Some),
            };

            match loaded {
                Ok(prepared) => {
                    let Ok(mut guard) = slots.lock() else {
                        phase.store(PHASE_FAILED, Ordering::Release);
                        return;
                    };
                    // Dropping the previous occupant frees the old buffer.
                    guard[target.index()] = prepared;
                    drop(guard);
                    phase.store(encode(LoadPhase::Ready(target)), Ordering::Release);
                }
                Err(e) => {
                    if let Ok(mut guard) = slots.lock() {
                        guard[target.index()] = None;
                    }
                    if let Ok(mut err) = error.lock() {
                        *err = Some(e.to_string());
                    }
                    phase.store(PHASE_FAILED, Ordering::Release);
                }
            }
        });
    }

    /// Consume a `Ready` observation; the phase returns to `Idle`.
    pub fn acknowledge(&self) {
        self.phase.store(PHASE_IDLE, Ordering::Release);
    }

    /// Run `f` against the slot contents under the lock. Callers keep the
    /// critical section brief (metadata reads, source construction).
    pub fn with_slot<R>(&self, slot: Slot, f: impl FnOnce(Option<&PreparedTrack>) -> R) -> R {
        match self.slots.lock() {
            Ok(guard) => f(guard[slot.index()].as_ref()),
            Err(_) => f(None),
        }
    }

    pub fn slot_is_empty(&self, slot: Slot) -> bool {
        self.with_slot(slot, |t| t.is_none())
    }

    pub fn clear_slot(&self, slot: Slot) {
        if let Ok(mut guard) = self.slots.lock() {
            guard[slot.index()] = None;
        }
    }

    pub fn clear_all(&self) {
        if let Ok(mut guard) = self.slots.lock() {
            guard[0] = None;
            guard[1] = None;
        }
    }

    pub fn take_error(&self) -> Option<String> {
        self.error.lock().ok().and_then(|mut e| e.take())
    }
}
