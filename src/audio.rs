//! Audio collaborators for the playback core: the decoder that turns a
//! file path into a fully decoded [`PreparedTrack`], and the output
//! [`Device`] that wraps a `rodio` sink with a one-deep pending-source
//! queue for gapless hand-over.

mod decode;
mod device;

pub use decode::{DecodeError, PreparedTrack, decode};
pub use device::{AudioOut, Device, DeviceError};
