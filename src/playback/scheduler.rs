//! Epoch-scoped delayed task scheduler on a virtual millisecond clock.
//!
//! Every task is tagged with the epoch it was scheduled under. Only the live
//! epoch may schedule, and canceling it removes every task it still has queued,
//! so nothing scheduled under a canceled epoch can ever be handed out again.
//! Time only moves when the host calls [`AnimationScheduler::pop_due`] with a
//! later deadline; there are no threads and no real timers.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

/// Identity of one cancelable cohort of tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochId(u64);

impl EpochId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch#{}", self.0)
    }
}

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub epoch: EpochId,
    /// Submission order; also breaks ties between tasks due at the same time.
    pub seq: u64,
    /// Absolute virtual time the task fires at.
    pub fire_at: u64,
}

/// A task handed back by [`AnimationScheduler::pop_due`].
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub handle: TaskHandle,
    pub task: T,
}

/// Scheduling errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("{epoch} is not the live epoch ({live})")]
    StaleEpoch { epoch: EpochId, live: EpochId },
}

struct Pending<T> {
    handle: TaskHandle,
    task: T,
}

impl<T> PartialEq for Pending<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle.seq == other.handle.seq
    }
}

impl<T> Eq for Pending<T> {}

impl<T> PartialOrd for Pending<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed: BinaryHeap is a max-heap and the earliest (fire_at, seq) must surface first.
impl<T> Ord for Pending<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.handle.fire_at, other.handle.seq).cmp(&(self.handle.fire_at, self.handle.seq))
    }
}

/// Delayed task queue grouped into epochs.
///
/// Usage:
/// ```
/// use tank_replay::playback::AnimationScheduler;
///
/// let mut scheduler = AnimationScheduler::new();
/// let epoch = scheduler.begin_epoch();
/// scheduler.schedule(epoch, 100, "late").unwrap();
/// scheduler.schedule(epoch, 10, "early").unwrap();
///
/// assert_eq!(scheduler.pop_due(50).unwrap().task, "early");
/// assert!(scheduler.pop_due(50).is_none());
///
/// scheduler.cancel_epoch(epoch);
/// assert!(scheduler.pop_due(1_000).is_none());
/// ```
pub struct AnimationScheduler<T> {
    now: u64,
    live: EpochId,
    /// Whether `live` is accepting tasks (false after it was canceled).
    open: bool,
    next_seq: u64,
    queue: BinaryHeap<Pending<T>>,
}

impl<T> Default for AnimationScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AnimationScheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            live: EpochId(0),
            open: false,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current virtual time in milliseconds.
    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    /// The live epoch, if one is accepting tasks.
    pub fn live_epoch(&self) -> Option<EpochId> {
        self.open.then_some(self.live)
    }

    /// Open a fresh epoch, canceling the previous one first.
    pub fn begin_epoch(&mut self) -> EpochId {
        if self.open {
            self.cancel_epoch(self.live);
        }
        self.live = EpochId(self.live.0 + 1);
        self.open = true;
        log::debug!("{} opened at {}ms", self.live, self.now);
        self.live
    }

    /// Queue `task` to fire `delay_ms` after the current virtual time.
    pub fn schedule(
        &mut self,
        epoch: EpochId,
        delay_ms: u64,
        task: T,
    ) -> Result<TaskHandle, SchedulerError> {
        if !self.open || epoch != self.live {
            log::warn!("rejected task for {} (live: {})", epoch, self.live);
            return Err(SchedulerError::StaleEpoch {
                epoch,
                live: self.live,
            });
        }
        let handle = TaskHandle {
            epoch,
            seq: self.next_seq,
            fire_at: self.now.saturating_add(delay_ms),
        };
        self.next_seq += 1;
        self.queue.push(Pending { handle, task });
        Ok(handle)
    }

    /// Void every task of `epoch`. Returns how many queued tasks were released.
    ///
    /// Canceling an epoch that is not live is a no-op: its tasks are already gone.
    pub fn cancel_epoch(&mut self, epoch: EpochId) -> usize {
        if !self.open || epoch != self.live {
            return 0;
        }
        self.open = false;
        let before = self.queue.len();
        self.queue.retain(|p| p.handle.epoch != epoch);
        let released = before - self.queue.len();
        log::debug!("{} canceled at {}ms, released {} task(s)", epoch, self.now, released);
        released
    }

    /// Pop the next task due at or before `deadline`, advancing the clock to its fire time.
    ///
    /// Returns `None` once nothing else is due, leaving the clock at `deadline`.
    /// Tasks scheduled while handling a popped task are eligible in the same sweep.
    pub fn pop_due(&mut self, deadline: u64) -> Option<Fired<T>> {
        match self.queue.peek() {
            Some(next) if next.handle.fire_at <= deadline => {
                let Pending { handle, task } = self.queue.pop()?;
                self.now = self.now.max(handle.fire_at);
                log::trace!("{} task #{} fired at {}ms", handle.epoch, handle.seq, self.now);
                Some(Fired { handle, task })
            }
            _ => {
                self.now = self.now.max(deadline);
                None
            }
        }
    }

    /// Tasks still queued for `epoch`.
    pub fn pending(&self, epoch: EpochId) -> usize {
        self.queue.iter().filter(|p| p.handle.epoch == epoch).count()
    }

    /// Tasks queued across all epochs.
    pub fn pending_total(&self) -> usize {
        self.queue.len()
    }

    /// Fire time of the earliest queued task.
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.peek().map(|p| p.handle.fire_at)
    }
}
