//! Tank Replay - Animated playback of recorded tank duels.
//!
//! A finished match is stored as a flow: one snapshot per tick holding every
//! tank's position, health, heading, whether it moved and what it fired at.
//! This crate turns that flow into timed visual changes on a grid board, with
//! play, pause and tick-by-tick navigation.
//!
//! # Architecture
//!
//! - `schema`: Replay file format and playback configuration
//! - `board`: The [`board::BoardView`] surface playback draws on, plus an in-memory board
//! - `playback`: Scheduler, tick animator, strike preview and the controller
//!
//! # Example
//!
//! ```rust,no_run
//! use tank_replay::{
//!     board::MemoryBoard,
//!     playback::PlaybackController,
//!     schema::{PlaybackConfig, ReplaySetup},
//! };
//!
//! let setup = ReplaySetup::from_path("match.json").unwrap();
//! let board = MemoryBoard::new(10, 10, setup.flow.player_count());
//! let mut player = PlaybackController::new(setup.flow, PlaybackConfig::default(), board).unwrap();
//!
//! // Host loop: report elapsed time, redraw from the board.
//! while !player.session().is_finished() {
//!     player.advance(16);
//! }
//! println!("{}", player.board().render_ascii());
//! ```

pub mod board;
pub mod playback;
pub mod schema;

// WebAssembly bindings (only for wasm32 target)
#[cfg(target_arch = "wasm32")]
pub mod wasm;

// Re-export commonly used types
pub use board::{BoardView, MemoryBoard};
pub use playback::{PlaybackController, PlaybackState};
pub use schema::{Flow, PlaybackConfig, ReplaySetup};
