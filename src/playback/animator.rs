//! Tick transition animator.
//!
//! Turns the step from snapshot `n` to snapshot `n + 1` into a [`TickPlan`]:
//! every visual change of the tick, follow-ups included, with its offset from
//! the tick start. The plan is submitted to the scheduler in one go, so task
//! ordering is a property of the plan and nothing schedules from inside a task.
//!
//! ```text
//! offset (default timing)
//!    0  translate (heading unchanged)
//!  100  rotate (heading changed)
//!  200  strike cells tinted pre-hit
//!  300  translate (after a turn)
//! 1100  impact cells switch to hit, other struck cells clear
//! 1300  move commit (after a turn), hit cells clear, crash on, health update
//! 1550  health emphasis relaxes
//! 2200  crash off
//! ```

use std::collections::BTreeMap;

use super::preview::strike_cells;
use super::scheduler::{AnimationScheduler, EpochId, SchedulerError};
use crate::board::{BoardView, Tint, Translation};
use crate::schema::{BoardConfig, Cell, Flow, PlaybackConfig, TimingConfig};

/// One visual change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Set or clear a cell tone.
    Tint { cell: Cell, tint: Option<Tint> },
    /// Toggle a crash highlight.
    Crash { cell: Cell, on: bool },
    /// Set a token's running rotation total.
    Rotate { player: usize, rotation: i32 },
    /// Shift a token toward its destination cell.
    Translate { player: usize, offset: Translation },
    /// Land a token in its destination cell.
    CommitMove { player: usize, cell: Cell },
    /// Show a new health value, emphasized.
    Health { player: usize, health: i32 },
    /// Drop the health emphasis.
    RelaxHealth { player: usize },
}

impl Effect {
    pub fn apply<B: BoardView + ?Sized>(self, board: &mut B) {
        match self {
            Effect::Tint { cell, tint } => board.set_tint(cell, tint),
            Effect::Crash { cell, on } => board.set_crash(cell, on),
            Effect::Rotate { player, rotation } => board.set_token_rotation(player, rotation),
            Effect::Translate { player, offset } => board.set_token_offset(player, offset),
            Effect::CommitMove { player, cell } => board.commit_token_move(player, cell),
            Effect::Health { player, health } => {
                board.set_health_text(player, Some(health));
                board.set_health_emphasis(player, true);
            }
            Effect::RelaxHealth { player } => board.set_health_emphasis(player, false),
        }
    }
}

/// Work items run by the playback scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackTask {
    /// Make `tick` the current tick and animate its transition.
    EnterTick(usize),
    Effect(Effect),
}

/// An effect with its offset from the tick start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedEffect {
    pub at: u64,
    pub effect: Effect,
}

/// Every effect of one tick transition, ordered by offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickPlan {
    pub tick: usize,
    pub effects: Vec<PlannedEffect>,
}

impl TickPlan {
    /// Offset of the last effect; the tick is over once it ran.
    pub fn duration(&self) -> u64 {
        self.effects.iter().map(|e| e.at).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    fn push(&mut self, at: u64, effect: Effect) {
        self.effects.push(PlannedEffect { at, effect });
    }
}

/// Completion signal of an animated tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickJoin {
    pub epoch: EpochId,
    pub tick: usize,
}

impl TickJoin {
    /// True once every task of the tick ran (or the epoch was canceled).
    pub fn is_resolved<T>(&self, scheduler: &AnimationScheduler<T>) -> bool {
        scheduler.pending(self.epoch) == 0
    }
}

/// Plans and submits tick transitions.
#[derive(Debug, Clone)]
pub struct TickAnimator {
    board: BoardConfig,
    timing: TimingConfig,
}

impl TickAnimator {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            board: config.board,
            timing: config.timing,
        }
    }

    /// Plan the transition out of `tick`, reading displayed rotation and health from `board`.
    ///
    /// # Panics
    /// Panics if `tick + 1` is not a valid flow index.
    pub fn plan<B: BoardView + ?Sized>(&self, flow: &Flow, tick: usize, board: &B) -> TickPlan {
        let mut plan = TickPlan {
            tick,
            effects: Vec::new(),
        };
        let current = flow.snapshot(tick);
        let next = flow.snapshot(tick + 1);

        self.plan_crashes(next.iter().map(|s| s.position), &mut plan);
        self.plan_strikes(flow, tick, &mut plan);

        // Health shown while parked on a tick comes from the snapshot after it.
        if let Some(after) = flow.get(tick + 2) {
            let window = self.timing.movement_window();
            for (player, state) in after.iter().enumerate() {
                if board.health_text(player) != Some(state.health) {
                    plan.push(
                        window,
                        Effect::Health {
                            player,
                            health: state.health,
                        },
                    );
                    plan.push(
                        window + self.timing.health_zoom_duration,
                        Effect::RelaxHealth { player },
                    );
                }
            }
        }

        for (player, (from, to)) in current.iter().zip(next).enumerate() {
            if !to.moved {
                continue;
            }
            let delta = from.heading.turn_to(to.heading);
            let start = if delta != 0 {
                let rotation = board
                    .token_rotation(player)
                    .unwrap_or_else(|| from.heading.rotation());
                plan.push(
                    self.timing.turn_delay,
                    Effect::Rotate {
                        player,
                        rotation: rotation + delta,
                    },
                );
                self.timing.translation_after_turn()
            } else {
                0
            };
            let (dx, dy) = to.heading.step();
            plan.push(
                start,
                Effect::Translate {
                    player,
                    offset: Translation::new(dx, dy),
                },
            );
            plan.push(
                start + self.timing.move_duration,
                Effect::CommitMove {
                    player,
                    cell: to.position,
                },
            );
        }

        plan.effects.sort_by_key(|e| e.at);
        plan
    }

    /// One crash per cell shared by two or more tanks, after movement settles.
    fn plan_crashes(&self, positions: impl Iterator<Item = Cell>, plan: &mut TickPlan) {
        let mut occupancy: BTreeMap<Cell, usize> = BTreeMap::new();
        for cell in positions {
            *occupancy.entry(cell).or_default() += 1;
        }
        let start = self.timing.movement_window();
        let end = start + self.timing.indication_duration();
        for (cell, _) in occupancy.into_iter().filter(|(_, n)| *n > 1) {
            plan.push(start, Effect::Crash { cell, on: true });
            plan.push(end, Effect::Crash { cell, on: false });
        }
    }

    /// Two-phase strike tones. Each struck cell is cleared exactly once, by the
    /// first player that touched it.
    fn plan_strikes(&self, flow: &Flow, tick: usize, plan: &mut TickPlan) {
        let show = self.timing.missile_show_delay;
        let resolve = show + self.timing.indication_duration();
        let clear_hit = resolve + self.timing.hit_color_duration;

        for (cell, strikes) in strike_cells(flow.snapshot(tick + 1), &self.board) {
            for (k, &player) in strikes.players.iter().enumerate() {
                let tint = if k == 0 {
                    Tint::PreHit(player)
                } else {
                    Tint::OverlapPreHit
                };
                plan.push(
                    show,
                    Effect::Tint {
                        cell,
                        tint: Some(tint),
                    },
                );
            }
            if strikes.is_impact() {
                plan.push(
                    resolve,
                    Effect::Tint {
                        cell,
                        tint: Some(strikes.resolved_tint()),
                    },
                );
                plan.push(clear_hit, Effect::Tint { cell, tint: None });
            } else {
                plan.push(resolve, Effect::Tint { cell, tint: None });
            }
        }
    }

    /// Plan the transition out of `tick` and queue it under `epoch`.
    pub fn animate<B: BoardView + ?Sized>(
        &self,
        flow: &Flow,
        tick: usize,
        board: &B,
        scheduler: &mut AnimationScheduler<PlaybackTask>,
        epoch: EpochId,
    ) -> Result<TickJoin, SchedulerError> {
        let plan = self.plan(flow, tick, board);
        log::debug!(
            "tick {} planned: {} effect(s) over {}ms",
            tick,
            plan.effects.len(),
            plan.duration()
        );
        for PlannedEffect { at, effect } in plan.effects {
            scheduler.schedule(epoch, at, PlaybackTask::Effect(effect))?;
        }
        Ok(TickJoin { epoch, tick })
    }
}
