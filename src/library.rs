//! Track and playlist types plus the scanning and persistence helpers
//! that build play queues from the filesystem, CLI arguments or the
//! saved main playlist.

mod model;
mod scan;
mod store;

pub use model::{Playlist, Track};
pub use scan::{playlist_from_args, scan};
pub use store::{export_queue, load_main_playlist, save_main_playlist};

#[cfg(test)]
mod tests;
