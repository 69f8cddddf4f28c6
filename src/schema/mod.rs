//! Schema module - Replay flow and playback configuration types.

mod config;
mod flow;

pub use config::*;
pub use flow::*;
