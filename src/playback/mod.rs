//! Playback module - Timed replay of a recorded match onto a board.
//!
//! - `scheduler`: epoch-scoped delayed tasks on a virtual clock
//! - `animator`: per-tick transition plans (moves, strikes, crashes, health)
//! - `preview`: resolved strike tints shown while paused
//! - `controller`: tick pointer, play/pause and navigation commands

mod animator;
mod controller;
mod preview;
mod scheduler;

pub use animator::*;
pub use controller::*;
pub use preview::*;
pub use scheduler::*;
