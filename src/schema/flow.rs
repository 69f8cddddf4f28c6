//! Replay flow types: the per-tick player snapshots a finished duel was recorded as.
//!
//! On the wire a flow is an array of ticks, each an array indexed by player,
//! each entry a fixed-width record:
//!
//! ```text
//! [x, y, health, heading, moved, targeted]
//!
//! heading:  "U" | "R" | "D" | "L"
//! targeted: null                 no strike
//!           [[x, y], null]       direct strike on (x, y)
//!           [[x, y], [x, y]]     area strike: origin cell, resolved impact cell
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A board cell in 0-based grid coordinates (`x` = column, `y` = row, row 0 on top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Offset this cell, returning `None` when the result leaves a `width` x `height` board.
    pub fn offset(self, dx: i64, dy: i64, width: usize, height: usize) -> Option<Cell> {
        let x = self.x as i64 + dx;
        let y = self.y as i64 + dy;
        if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
            return None;
        }
        Some(Cell::new(x as usize, y as usize))
    }

    #[inline]
    pub fn in_bounds(self, width: usize, height: usize) -> bool {
        self.x < width && self.y < height
    }
}

impl From<(usize, usize)> for Cell {
    fn from((x, y): (usize, usize)) -> Self {
        Cell::new(x, y)
    }
}

impl From<Cell> for (usize, usize) {
    fn from(cell: Cell) -> Self {
        (cell.x, cell.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal direction a tank faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    #[serde(rename = "U")]
    Up,
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "D")]
    Down,
    #[serde(rename = "L")]
    Left,
}

/// Signed degrees turning from the row heading to the column heading.
///
/// Rows/columns are ordered U, R, D, L.
const TURN_TABLE: [[i32; 4]; 4] = [
    [0, 90, 180, -90],
    [-90, 0, 90, 180],
    [-180, -90, 0, 90],
    [90, -180, -90, 0],
];

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::Up, Heading::Right, Heading::Down, Heading::Left];

    fn index(self) -> usize {
        match self {
            Heading::Up => 0,
            Heading::Right => 1,
            Heading::Down => 2,
            Heading::Left => 3,
        }
    }

    /// Absolute token rotation used when a board is rendered from scratch.
    pub fn rotation(self) -> i32 {
        match self {
            Heading::Up => 0,
            Heading::Right => 90,
            Heading::Down => 180,
            Heading::Left => -90,
        }
    }

    /// Signed rotation delta turning a token that faces `self` to face `to`.
    ///
    /// Zero when unchanged, ±90 for a quarter turn, ±180 for a reversal.
    pub fn turn_to(self, to: Heading) -> i32 {
        TURN_TABLE[self.index()][to.index()]
    }

    /// Screen-space unit step in this direction (y grows downward).
    pub fn step(self) -> (i32, i32) {
        match self {
            Heading::Up => (0, -1),
            Heading::Right => (1, 0),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
        }
    }
}

/// Offensive action a player took during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Cell, Option<Cell>)", into = "(Cell, Option<Cell>)")]
pub enum Strike {
    /// Single-cell strike.
    Direct(Cell),
    /// Area strike around `center`, resolved at `impact`.
    Area { center: Cell, impact: Cell },
}

impl From<(Cell, Option<Cell>)> for Strike {
    fn from((target, resolved): (Cell, Option<Cell>)) -> Self {
        match resolved {
            None => Strike::Direct(target),
            Some(impact) => Strike::Area {
                center: target,
                impact,
            },
        }
    }
}

impl From<Strike> for (Cell, Option<Cell>) {
    fn from(strike: Strike) -> Self {
        match strike {
            Strike::Direct(cell) => (cell, None),
            Strike::Area { center, impact } => (center, Some(impact)),
        }
    }
}

/// One cell touched by a strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeCell {
    pub cell: Cell,
    /// Whether the strike resolves on this cell.
    pub impact: bool,
}

impl Strike {
    /// In-bounds cells touched by this strike, column-major.
    ///
    /// Area strikes cover the `(2 * radius + 1)²` square around their origin,
    /// clipped to the board.
    pub fn footprint(&self, width: usize, height: usize, radius: usize) -> Vec<StrikeCell> {
        match *self {
            Strike::Direct(cell) => {
                if cell.in_bounds(width, height) {
                    vec![StrikeCell { cell, impact: true }]
                } else {
                    Vec::new()
                }
            }
            Strike::Area { center, impact } => {
                let r = radius as i64;
                let mut cells = Vec::with_capacity((2 * radius + 1).pow(2));
                for dx in -r..=r {
                    for dy in -r..=r {
                        if let Some(cell) = center.offset(dx, dy, width, height) {
                            cells.push(StrikeCell {
                                cell,
                                impact: cell == impact,
                            });
                        }
                    }
                }
                cells
            }
        }
    }
}

/// Wire shape of a [`TickState`].
type TickRecord = (usize, usize, i32, Heading, bool, Option<Strike>);

/// One player's state at a tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TickRecord", into = "TickRecord")]
pub struct TickState {
    pub position: Cell,
    /// May go non-positive once the tank is destroyed.
    pub health: i32,
    pub heading: Heading,
    /// True iff the position changed versus the previous tick.
    pub moved: bool,
    /// Strike decided during the tick leading to this state.
    pub targeted: Option<Strike>,
}

impl TickState {
    pub fn new(position: Cell, health: i32, heading: Heading) -> Self {
        Self {
            position,
            health,
            heading,
            moved: false,
            targeted: None,
        }
    }

    /// Mark this state as reached by moving.
    pub fn moved(mut self) -> Self {
        self.moved = true;
        self
    }

    pub fn with_strike(mut self, strike: Strike) -> Self {
        self.targeted = Some(strike);
        self
    }
}

impl From<TickRecord> for TickState {
    fn from((x, y, health, heading, moved, targeted): TickRecord) -> Self {
        Self {
            position: Cell::new(x, y),
            health,
            heading,
            moved,
            targeted,
        }
    }
}

impl From<TickState> for TickRecord {
    fn from(state: TickState) -> Self {
        (
            state.position.x,
            state.position.y,
            state.health,
            state.heading,
            state.moved,
            state.targeted,
        )
    }
}

/// All players' states at one tick boundary, in fixed player order.
pub type Snapshot = Vec<TickState>;

/// Immutable recording of a duel: `T + 1` snapshots for `T` ticks.
///
/// Index 0 is the initial configuration; index `i + 1` is the consequence of
/// the decisions taken during tick `i`. The last index is terminal and only
/// contributes final health values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Snapshot>", into = "Vec<Snapshot>")]
pub struct Flow {
    snapshots: Vec<Snapshot>,
}

impl Flow {
    /// Wrap recorded snapshots. At least two are needed for one playable tick.
    pub fn new(snapshots: Vec<Snapshot>) -> Result<Self, FlowError> {
        if snapshots.len() < 2 {
            return Err(FlowError::TooShort(snapshots.len()));
        }
        Ok(Self { snapshots })
    }

    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of snapshots (`T + 1`).
    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Number of ticks `T`.
    #[inline]
    pub fn tick_count(&self) -> usize {
        self.snapshots.len() - 1
    }

    /// Highest valid playback pointer (`T - 1`).
    #[inline]
    pub fn last_pointer(&self) -> usize {
        self.tick_count() - 1
    }

    pub fn player_count(&self) -> usize {
        self.snapshots[0].len()
    }

    /// Snapshot at `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn snapshot(&self, index: usize) -> &[TickState] {
        &self.snapshots[index]
    }

    pub fn get(&self, index: usize) -> Option<&[TickState]> {
        self.snapshots.get(index).map(Vec::as_slice)
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }
}

impl TryFrom<Vec<Snapshot>> for Flow {
    type Error = FlowError;

    fn try_from(snapshots: Vec<Snapshot>) -> Result<Self, Self::Error> {
        Flow::new(snapshots)
    }
}

impl From<Flow> for Vec<Snapshot> {
    fn from(flow: Flow) -> Self {
        flow.snapshots
    }
}

/// Per-player or overall match outcome marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
    #[serde(rename = "D")]
    Draw,
}

/// Result marker stored next to a flow. Not used by playback itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchResult {
    /// e.g. `"D"` for a draw.
    Overall(Outcome),
    /// e.g. `["W", "L"]`.
    PerPlayer(Vec<Outcome>),
}

impl MatchResult {
    /// Index of the single winning player, if there is one.
    pub fn winner(&self) -> Option<usize> {
        match self {
            MatchResult::Overall(_) => None,
            MatchResult::PerPlayer(outcomes) => {
                let mut winners = outcomes
                    .iter()
                    .enumerate()
                    .filter(|(_, o)| **o == Outcome::Win)
                    .map(|(i, _)| i);
                match (winners.next(), winners.next()) {
                    (Some(i), None) => Some(i),
                    _ => None,
                }
            }
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.winner() {
            Some(i) => write!(f, "player {} won", i + 1),
            None => write!(f, "draw"),
        }
    }
}

/// Explanation marker for a draw caused by the tick limit.
pub const EXPLANATION_TICK_LIMIT: &str = "X";

/// Everything a page hands over to start a replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySetup {
    /// Game settings; opaque to playback.
    #[serde(default)]
    pub settings: serde_json::Value,
    pub result: MatchResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub flow: Flow,
}

impl ReplaySetup {
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FlowError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Human-readable explanation of the result, if one is known.
    pub fn explanation_text(&self) -> Option<&'static str> {
        match self.explanation.as_deref() {
            Some(EXPLANATION_TICK_LIMIT) => Some("Tick limit was exceeded."),
            _ => None,
        }
    }
}

/// Errors raised while loading a replay.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Flow needs at least 2 snapshots, got {0}")]
    TooShort(usize),
    #[error("Invalid replay JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to read replay: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"[
        [[1, 1, 100, "U", false, null], [5, 5, 100, "L", false, null]],
        [[1, 0, 100, "U", true, null], [5, 5, 100, "L", false, [[5, 4], null]]],
        [[1, 0, 80, "U", false, null], [5, 5, 100, "L", false, [[2, 2], [3, 1]]]]
    ]"#;

    #[test]
    fn test_flow_parses_records() {
        let flow = Flow::from_json(SAMPLE).unwrap();
        assert_eq!(flow.len(), 3);
        assert_eq!(flow.tick_count(), 2);
        assert_eq!(flow.last_pointer(), 1);
        assert_eq!(flow.player_count(), 2);

        let a = flow.snapshot(1)[0];
        assert_eq!(a.position, Cell::new(1, 0));
        assert_eq!(a.heading, Heading::Up);
        assert!(a.moved);
        assert_eq!(a.targeted, None);

        assert_eq!(
            flow.snapshot(1)[1].targeted,
            Some(Strike::Direct(Cell::new(5, 4)))
        );
        assert_eq!(
            flow.snapshot(2)[1].targeted,
            Some(Strike::Area {
                center: Cell::new(2, 2),
                impact: Cell::new(3, 1),
            })
        );
        assert_eq!(flow.snapshot(2)[0].health, 80);
    }

    #[test]
    fn test_flow_serializes_back_to_records() {
        let flow = Flow::from_json(SAMPLE).unwrap();
        let value = serde_json::to_value(&flow).unwrap();
        assert_eq!(
            value[1][1],
            serde_json::json!([5, 5, 100, "L", false, [[5, 4], null]])
        );
    }

    #[test]
    fn test_flow_too_short() {
        let err = Flow::from_json(r#"[[[0, 0, 100, "R", false, null]]]"#).unwrap_err();
        assert!(err.to_string().contains("at least 2 snapshots"));

        assert!(matches!(Flow::new(vec![]), Err(FlowError::TooShort(0))));
    }

    #[test]
    fn test_turn_table() {
        assert_eq!(Heading::Up.turn_to(Heading::Up), 0);
        assert_eq!(Heading::Up.turn_to(Heading::Right), 90);
        assert_eq!(Heading::Right.turn_to(Heading::Up), -90);
        assert_eq!(Heading::Left.turn_to(Heading::Right), -180);
        assert_eq!(Heading::Down.turn_to(Heading::Left), 90);

        // Applying a delta to the absolute rotation lands on the target modulo a full turn.
        for from in Heading::ALL {
            for to in Heading::ALL {
                let landed = from.rotation() + from.turn_to(to);
                assert_eq!((landed - to.rotation()).rem_euclid(360), 0);
            }
        }
    }

    #[test]
    fn test_area_footprint_center() {
        let strike = Strike::Area {
            center: Cell::new(5, 5),
            impact: Cell::new(6, 4),
        };
        let cells = strike.footprint(10, 10, 1);
        assert_eq!(cells.len(), 9);
        for c in &cells {
            assert!((4..=6).contains(&c.cell.x));
            assert!((4..=6).contains(&c.cell.y));
        }
        let impacts: Vec<_> = cells.iter().filter(|c| c.impact).collect();
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].cell, Cell::new(6, 4));
    }

    #[test]
    fn test_area_footprint_corner() {
        let strike = Strike::Area {
            center: Cell::new(0, 0),
            impact: Cell::new(1, 1),
        };
        let cells: Vec<Cell> = strike.footprint(10, 10, 1).iter().map(|c| c.cell).collect();
        assert_eq!(
            cells,
            vec![
                Cell::new(0, 0),
                Cell::new(0, 1),
                Cell::new(1, 0),
                Cell::new(1, 1)
            ]
        );
    }

    #[test]
    fn test_direct_footprint() {
        let cells = Strike::Direct(Cell::new(5, 4)).footprint(10, 10, 1);
        assert_eq!(
            cells,
            vec![StrikeCell {
                cell: Cell::new(5, 4),
                impact: true
            }]
        );
        assert!(Strike::Direct(Cell::new(10, 4)).footprint(10, 10, 1).is_empty());
    }

    #[test]
    fn test_match_result_markers() {
        let setup = ReplaySetup::from_json(&format!(
            r#"{{"settings": {{}}, "result": ["L", "W"], "explanation": "", "flow": {SAMPLE}}}"#
        ))
        .unwrap();
        assert_eq!(setup.result.winner(), Some(1));
        assert_eq!(setup.result.to_string(), "player 2 won");
        assert_eq!(setup.explanation_text(), None);

        let draw: MatchResult = serde_json::from_str(r#""D""#).unwrap();
        assert_eq!(draw, MatchResult::Overall(Outcome::Draw));
        assert_eq!(draw.to_string(), "draw");
    }

    #[test]
    fn test_replay_setup_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fight.json");
        fs::write(
            &path,
            format!(r#"{{"result": "D", "explanation": "X", "flow": {SAMPLE}}}"#),
        )
        .unwrap();

        let setup = ReplaySetup::from_path(&path).unwrap();
        assert_eq!(setup.flow.tick_count(), 2);
        assert!(setup.settings.is_null());
        assert_eq!(setup.explanation_text(), Some("Tick limit was exceeded."));

        let missing = ReplaySetup::from_path(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(FlowError::Io(_))));
    }

    fn heading() -> impl Strategy<Value = Heading> {
        prop::sample::select(Heading::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_closed_turn_sequence_is_full_turns(
            start in heading(),
            path in prop::collection::vec(heading(), 0..32),
        ) {
            let mut current = start;
            let mut total = 0;
            for next in path.into_iter().chain(std::iter::once(start)) {
                total += current.turn_to(next);
                current = next;
            }
            prop_assert_eq!(total.rem_euclid(360), 0);
        }

        #[test]
        fn prop_area_footprint_is_clipped_square(
            x in 0usize..10,
            y in 0usize..10,
            radius in 0usize..3,
        ) {
            let center = Cell::new(x, y);
            let cells = Strike::Area { center, impact: center }.footprint(10, 10, radius);
            let span = |c: usize| {
                let lo = c.saturating_sub(radius);
                let hi = (c + radius).min(9);
                hi - lo + 1
            };
            prop_assert_eq!(cells.len(), span(x) * span(y));
            prop_assert_eq!(cells.iter().filter(|c| c.impact).count(), 1);
        }
    }
}
