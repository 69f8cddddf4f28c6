//! In-memory board used by the CLI, the wasm binding and tests.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{BoardView, Tint, Translation};
use crate::schema::Cell;

/// Visual state of one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CellView {
    pub tint: Option<Tint>,
    pub crash: bool,
    #[serde(skip)]
    pub struck: bool,
}

/// Visual state of one player's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenView {
    pub cell: Cell,
    pub rotation: i32,
    pub offset: Translation,
}

/// A [`BoardView`] that keeps its state in plain vectors.
///
/// Cells are stored column-major (`x * height + y`). Every mutating call bumps
/// a counter so callers can detect writes after a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryBoard {
    width: usize,
    height: usize,
    cells: Vec<CellView>,
    tokens: Vec<Option<TokenView>>,
    health: Vec<Option<i32>>,
    emphasized: Vec<bool>,
    tick: Option<usize>,
    #[serde(skip)]
    mutations: u64,
}

impl MemoryBoard {
    pub fn new(width: usize, height: usize, players: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![CellView::default(); width * height],
            tokens: vec![None; players],
            health: vec![None; players],
            emphasized: vec![false; players],
            tick: None,
            mutations: 0,
        }
    }

    #[inline]
    fn index(&self, cell: Cell) -> usize {
        cell.x * self.height + cell.y
    }

    fn ensure_player(&mut self, player: usize) {
        if player >= self.tokens.len() {
            self.tokens.resize(player + 1, None);
            self.health.resize(player + 1, None);
            self.emphasized.resize(player + 1, false);
        }
    }

    /// Number of mutating calls received so far.
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    pub fn cell(&self, cell: Cell) -> &CellView {
        &self.cells[self.index(cell)]
    }

    pub fn token(&self, player: usize) -> Option<&TokenView> {
        self.tokens.get(player).and_then(Option::as_ref)
    }

    pub fn tokens(&self) -> &[Option<TokenView>] {
        &self.tokens
    }

    pub fn health_texts(&self) -> &[Option<i32>] {
        &self.health
    }

    pub fn is_emphasized(&self, player: usize) -> bool {
        self.emphasized.get(player).copied().unwrap_or(false)
    }

    pub fn tick_text(&self) -> Option<usize> {
        self.tick
    }

    /// Every tinted cell with its tone.
    pub fn tints(&self) -> BTreeMap<Cell, Tint> {
        self.all_cells()
            .filter_map(|cell| self.cell(cell).tint.map(|tint| (cell, tint)))
            .collect()
    }

    /// Cells currently highlighted as crash sites.
    pub fn crashes(&self) -> Vec<Cell> {
        self.all_cells().filter(|&c| self.cell(c).crash).collect()
    }

    fn all_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Cell::new(x, y)))
    }

    /// Text picture of the board, one row per line.
    ///
    /// Tokens print as their 1-based player number followed by a facing arrow;
    /// tones print as `-` (pre-hit), `*` (hit), `~` (overlap pre-hit), `#` (overlap hit),
    /// crash sites as `!`.
    pub fn render_ascii(&self) -> String {
        let mut out = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = Cell::new(x, y);
                let token = self
                    .tokens
                    .iter()
                    .enumerate()
                    .find(|(_, t)| t.is_some_and(|t| t.cell == cell));
                let view = self.cell(cell);
                let mark = match view.tint {
                    _ if view.crash => '!',
                    Some(Tint::PreHit(_)) => '-',
                    Some(Tint::Hit(_)) => '*',
                    Some(Tint::OverlapPreHit) => '~',
                    Some(Tint::OverlapHit) => '#',
                    None => '.',
                };
                match token {
                    Some((player, Some(t))) => {
                        out.push_str(&format!("{}{}{}", mark, player + 1, arrow(t.rotation)));
                    }
                    _ => {
                        out.push_str(&format!("{mark}  "));
                    }
                }
            }
            out.push('\n');
        }
        for (player, health) in self.health.iter().enumerate() {
            let health = health.map_or_else(String::new, |h| h.to_string());
            out.push_str(&format!("P{}: {:>4}  ", player + 1, health));
        }
        out.push('\n');
        out
    }
}

fn arrow(rotation: i32) -> char {
    match rotation.rem_euclid(360) {
        0 => '^',
        90 => '>',
        180 => 'v',
        270 => '<',
        _ => '?',
    }
}

impl BoardView for MemoryBoard {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn rebuild(&mut self) {
        let players = self.tokens.len();
        let mutations = self.mutations + 1;
        *self = MemoryBoard::new(self.width, self.height, players);
        self.mutations = mutations;
    }

    fn place_token(&mut self, player: usize, cell: Cell, rotation: i32) {
        self.ensure_player(player);
        self.tokens[player] = Some(TokenView {
            cell,
            rotation,
            offset: Translation::NONE,
        });
        self.mutations += 1;
    }

    fn token_rotation(&self, player: usize) -> Option<i32> {
        self.token(player).map(|t| t.rotation)
    }

    fn set_token_rotation(&mut self, player: usize, rotation: i32) {
        if let Some(Some(token)) = self.tokens.get_mut(player) {
            token.rotation = rotation;
            self.mutations += 1;
        }
    }

    fn set_token_offset(&mut self, player: usize, offset: Translation) {
        if let Some(Some(token)) = self.tokens.get_mut(player) {
            token.offset = offset;
            self.mutations += 1;
        }
    }

    fn commit_token_move(&mut self, player: usize, cell: Cell) {
        if let Some(Some(token)) = self.tokens.get_mut(player) {
            token.cell = cell;
            token.offset = Translation::NONE;
            self.mutations += 1;
        }
    }

    fn tint(&self, cell: Cell) -> Option<Tint> {
        self.cell(cell).tint
    }

    fn set_tint(&mut self, cell: Cell, tint: Option<Tint>) {
        let i = self.index(cell);
        self.cells[i].tint = tint;
        self.mutations += 1;
    }

    fn set_crash(&mut self, cell: Cell, on: bool) {
        let i = self.index(cell);
        self.cells[i].crash = on;
        self.mutations += 1;
    }

    fn is_struck(&self, cell: Cell) -> bool {
        self.cell(cell).struck
    }

    fn mark_struck(&mut self, cell: Cell) {
        let i = self.index(cell);
        self.cells[i].struck = true;
        self.mutations += 1;
    }

    fn health_text(&self, player: usize) -> Option<i32> {
        self.health.get(player).copied().flatten()
    }

    fn set_health_text(&mut self, player: usize, health: Option<i32>) {
        self.ensure_player(player);
        self.health[player] = health;
        self.mutations += 1;
    }

    fn set_health_emphasis(&mut self, player: usize, on: bool) {
        self.ensure_player(player);
        self.emphasized[player] = on;
        self.mutations += 1;
    }

    fn set_tick_text(&mut self, tick: Option<usize>) {
        self.tick = tick;
        self.mutations += 1;
    }
}
