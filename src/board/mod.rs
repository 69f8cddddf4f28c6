//! Board module - The view surface playback draws on.
//!
//! Playback never owns pixels. It drives a [`BoardView`], which a host
//! implements on top of whatever it renders with (DOM nodes, a terminal,
//! a test double). [`MemoryBoard`] is the in-memory implementation used by
//! the CLI, the wasm binding and the tests.

mod memory;

pub use memory::*;

use serde::{Deserialize, Serialize};

use crate::schema::Cell;

/// Background tone of a struck cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tint {
    /// Player-colored tone shown while a strike is incoming.
    PreHit(usize),
    /// Player-colored tone shown when a strike lands.
    Hit(usize),
    /// Pre-hit tone for a cell targeted by more than one player.
    OverlapPreHit,
    /// Hit tone for a cell targeted by more than one player.
    OverlapHit,
}

impl Tint {
    pub fn is_hit(self) -> bool {
        matches!(self, Tint::Hit(_) | Tint::OverlapHit)
    }
}

/// Transient screen-space offset of a token, in cell units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub dx: i32,
    pub dy: i32,
}

impl Translation {
    pub const NONE: Translation = Translation { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// Primitives a renderer exposes to playback.
///
/// Tokens are addressed by player index. Every cell passed in is in bounds
/// of [`dimensions`](Self::dimensions).
pub trait BoardView {
    /// Board size in cells, `(width, height)`.
    fn dimensions(&self) -> (usize, usize);

    /// Replace the board with an empty one: no tokens, tints, crash highlights,
    /// struck markers, emphasis, health or tick texts.
    fn rebuild(&mut self);

    /// Put a player's token on `cell` with an absolute rotation in degrees.
    fn place_token(&mut self, player: usize, cell: Cell, rotation: i32);

    /// Current rotation of a token, as a running (unwrapped) total.
    fn token_rotation(&self, player: usize) -> Option<i32>;

    fn set_token_rotation(&mut self, player: usize, rotation: i32);

    /// Shift a token visually without changing its cell.
    fn set_token_offset(&mut self, player: usize, offset: Translation);

    /// Move a token into `cell` and reset its offset, as one step.
    fn commit_token_move(&mut self, player: usize, cell: Cell);

    fn tint(&self, cell: Cell) -> Option<Tint>;

    fn set_tint(&mut self, cell: Cell, tint: Option<Tint>);

    /// Toggle the crash highlight of a cell.
    fn set_crash(&mut self, cell: Cell, on: bool);

    /// Whether a strike already resolved on this cell since the last rebuild.
    fn is_struck(&self, cell: Cell) -> bool;

    fn mark_struck(&mut self, cell: Cell);

    /// Health value currently displayed for a player.
    fn health_text(&self, player: usize) -> Option<i32>;

    fn set_health_text(&mut self, player: usize, health: Option<i32>);

    /// Toggle the scale-up emphasis of a player's health text.
    fn set_health_emphasis(&mut self, player: usize, on: bool);

    fn set_tick_text(&mut self, tick: Option<usize>);
}
