//! Static preview of the strikes about to land.
//!
//! While paused, the board shows the tick it is parked on plus the final tint
//! of every strike resolving in the next tick, with no pre-hit/hit progression
//! and no scheduler involvement.

use std::collections::BTreeMap;

use crate::board::{BoardView, Tint};
use crate::schema::{BoardConfig, Cell, Flow, StrikeCell, TickState};

/// Which players' strikes touched a cell during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellStrikes {
    /// Touching players in player order; never empty once built.
    pub players: Vec<usize>,
    /// Players whose strike resolves on this cell.
    pub impact_by: Vec<usize>,
}

impl CellStrikes {
    /// Touched by more than one player.
    pub fn overlaps(&self) -> bool {
        self.players.len() > 1
    }

    pub fn is_impact(&self) -> bool {
        !self.impact_by.is_empty()
    }

    /// Player whose task owns clearing this cell.
    pub fn owner(&self) -> usize {
        self.players[0]
    }

    /// Tone the cell ends up with once every strike on it resolved.
    pub fn resolved_tint(&self) -> Tint {
        match (self.is_impact(), self.overlaps()) {
            (true, true) => Tint::OverlapHit,
            (true, false) => Tint::Hit(self.owner()),
            (false, true) => Tint::OverlapPreHit,
            (false, false) => Tint::PreHit(self.owner()),
        }
    }
}

/// Group every strike in `snapshot` by the cells it touches.
pub fn strike_cells(snapshot: &[TickState], board: &BoardConfig) -> BTreeMap<Cell, CellStrikes> {
    let mut cells: BTreeMap<Cell, CellStrikes> = BTreeMap::new();
    for (player, state) in snapshot.iter().enumerate() {
        let Some(strike) = state.targeted else {
            continue;
        };
        for StrikeCell { cell, impact } in
            strike.footprint(board.width, board.height, board.strike_radius)
        {
            let entry = cells.entry(cell).or_default();
            entry.players.push(player);
            if impact {
                entry.impact_by.push(player);
            }
        }
    }
    cells
}

/// Final tint of every cell struck in `snapshot`.
pub fn resolve_strikes(snapshot: &[TickState], board: &BoardConfig) -> BTreeMap<Cell, Tint> {
    strike_cells(snapshot, board)
        .iter()
        .map(|(cell, strikes)| (*cell, strikes.resolved_tint()))
        .collect()
}

/// Renders the resolved strikes of the upcoming tick in one synchronous pass.
#[derive(Debug, Clone)]
pub struct PreviewRenderer {
    board: BoardConfig,
}

impl PreviewRenderer {
    pub fn new(board: BoardConfig) -> Self {
        Self { board }
    }

    /// Tint the strikes that land when leaving `tick`.
    ///
    /// Expects a board without leftover tints from earlier strikes. Overlaps are
    /// detected from the board itself: an existing tint means another player
    /// already touched the cell, a struck marker means a strike resolved there.
    pub fn preview<B: BoardView + ?Sized>(&self, flow: &Flow, tick: usize, view: &mut B) {
        let Some(next) = flow.get(tick + 1) else {
            return;
        };
        for (player, state) in next.iter().enumerate() {
            let Some(strike) = state.targeted else {
                continue;
            };
            for StrikeCell { cell, impact } in
                strike.footprint(self.board.width, self.board.height, self.board.strike_radius)
            {
                let tinted = view.tint(cell).is_some();
                let tint = if impact {
                    if tinted {
                        Tint::OverlapHit
                    } else {
                        Tint::Hit(player)
                    }
                } else if view.is_struck(cell) {
                    Tint::OverlapHit
                } else if tinted {
                    Tint::OverlapPreHit
                } else {
                    Tint::PreHit(player)
                };
                view.set_tint(cell, Some(tint));
                if impact {
                    view.mark_struck(cell);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::MemoryBoard;
    use crate::schema::{Heading, Strike};
    use proptest::prelude::*;

    fn tank(x: usize, y: usize) -> TickState {
        TickState::new(Cell::new(x, y), 100, Heading::Up)
    }

    fn flow_with_strikes(strikes: &[Option<Strike>]) -> Flow {
        let initial: Vec<TickState> = (0..strikes.len()).map(|i| tank(i, 9)).collect();
        let next = initial
            .iter()
            .zip(strikes)
            .map(|(state, strike)| TickState {
                targeted: *strike,
                ..*state
            })
            .collect();
        Flow::new(vec![initial.clone(), next, initial]).unwrap()
    }

    fn previewed(flow: &Flow) -> MemoryBoard {
        let mut board = MemoryBoard::new(10, 10, flow.player_count());
        PreviewRenderer::new(BoardConfig::default()).preview(flow, 0, &mut board);
        board
    }

    #[test]
    fn test_direct_strike_previews_hit() {
        let flow = flow_with_strikes(&[None, Some(Strike::Direct(Cell::new(5, 4)))]);
        let board = previewed(&flow);
        let tints = board.tints();
        assert_eq!(tints.len(), 1);
        assert_eq!(tints[&Cell::new(5, 4)], Tint::Hit(1));
        assert!(board.is_struck(Cell::new(5, 4)));
    }

    #[test]
    fn test_area_strike_previews_prehit_and_impact() {
        let flow = flow_with_strikes(&[Some(Strike::Area {
            center: Cell::new(0, 0),
            impact: Cell::new(1, 0),
        })]);
        let tints = previewed(&flow).tints();
        assert_eq!(tints.len(), 4);
        assert_eq!(tints[&Cell::new(1, 0)], Tint::Hit(0));
        assert_eq!(tints[&Cell::new(0, 0)], Tint::PreHit(0));
        assert_eq!(tints[&Cell::new(0, 1)], Tint::PreHit(0));
        assert_eq!(tints[&Cell::new(1, 1)], Tint::PreHit(0));
    }

    #[test]
    fn test_overlap_tones() {
        // Areas share column x = 5; player 0 resolves on (5, 5).
        let flow = flow_with_strikes(&[
            Some(Strike::Area {
                center: Cell::new(4, 4),
                impact: Cell::new(5, 5),
            }),
            Some(Strike::Area {
                center: Cell::new(6, 5),
                impact: Cell::new(7, 6),
            }),
        ]);
        let tints = previewed(&flow).tints();
        assert_eq!(tints.len(), 16);
        assert_eq!(tints[&Cell::new(5, 5)], Tint::OverlapHit);
        assert_eq!(tints[&Cell::new(5, 4)], Tint::OverlapPreHit);
        assert_eq!(tints[&Cell::new(7, 6)], Tint::Hit(1));
        assert_eq!(tints[&Cell::new(3, 3)], Tint::PreHit(0));
        assert_eq!(tints[&Cell::new(5, 3)], Tint::PreHit(0));
        assert_eq!(tints[&Cell::new(5, 6)], Tint::PreHit(1));
        assert_eq!(tints, resolve_strikes(flow.snapshot(1), &BoardConfig::default()));
    }

    #[test]
    fn test_same_direct_target() {
        let target = Some(Strike::Direct(Cell::new(2, 2)));
        let flow = flow_with_strikes(&[target, target]);
        let tints = previewed(&flow).tints();
        assert_eq!(tints.len(), 1);
        assert_eq!(tints[&Cell::new(2, 2)], Tint::OverlapHit);
    }

    #[test]
    fn test_preview_past_last_snapshot_is_noop() {
        let flow = flow_with_strikes(&[Some(Strike::Direct(Cell::new(2, 2)))]);
        let mut board = MemoryBoard::new(10, 10, 1);
        PreviewRenderer::new(BoardConfig::default()).preview(&flow, 2, &mut board);
        assert_eq!(board.mutations(), 0);
    }

    fn cell() -> impl Strategy<Value = Cell> {
        (0usize..10, 0usize..10).prop_map(|(x, y)| Cell::new(x, y))
    }

    fn strike() -> impl Strategy<Value = Option<Strike>> {
        prop_oneof![
            Just(None),
            cell().prop_map(|c| Some(Strike::Direct(c))),
            (cell(), -1i64..=1, -1i64..=1).prop_map(|(center, dx, dy)| {
                let impact = center.offset(dx, dy, 10, 10).unwrap_or(center);
                Some(Strike::Area { center, impact })
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_preview_matches_resolved_strikes(
            strikes in prop::collection::vec(strike(), 1..4),
        ) {
            let flow = flow_with_strikes(&strikes);
            let expected = resolve_strikes(flow.snapshot(1), &BoardConfig::default());
            prop_assert_eq!(previewed(&flow).tints(), expected);
        }
    }
}
