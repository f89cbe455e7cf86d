//! The playback core: a single-threaded control loop that keeps the audio
//! device fed while a detached loader thread decodes the next track ahead
//! of time. Submodules: debounced input ([`events`]), monotonic elapsed
//! accounting ([`clock`]), the two-slot look-ahead loader ([`prefetch`])
//! and the state machine driving them all ([`controller`]).

mod clock;
mod controller;
mod events;
mod prefetch;

pub use controller::{Outcome, run};

#[cfg(test)]
mod tests;
