//! Single-slot deadline scheduler for the session's delayed actions.
//!
//! Nothing runs on its own: the controller asks [`Scheduler::take_due`] on
//! every tick, so a cancelled task can never fire.

use std::time::{Duration, Instant};

/// Delayed actions the session can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledKind {
    /// Fetch again after seeding an empty store.
    Refetch,
    /// Leave the result screen and load the next car.
    AutoAdvance,
}

impl ScheduledKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Refetch => "refetch",
            Self::AutoAdvance => "auto_advance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub kind: ScheduledKind,
    pub deadline: Instant,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    slot: Option<ScheduledTask>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire `delay` after `now`, replacing any outstanding task.
    pub fn schedule(&mut self, kind: ScheduledKind, now: Instant, delay: Duration) {
        if let Some(previous) = self.slot {
            tracing::warn!(
                replaced = previous.kind.as_str(),
                scheduled = kind.as_str(),
                "Replacing outstanding scheduled task"
            );
        }
        self.slot = Some(ScheduledTask {
            kind,
            deadline: now + delay,
        });
        tracing::debug!(
            kind = kind.as_str(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Scheduled task"
        );
    }

    /// Drop the outstanding task, returning it if there was one.
    pub fn cancel(&mut self) -> Option<ScheduledTask> {
        let cancelled = self.slot.take();
        if let Some(task) = cancelled {
            tracing::debug!(kind = task.kind.as_str(), "Cancelled scheduled task");
        }
        cancelled
    }

    /// Return the outstanding task's kind once its deadline has passed.
    ///
    /// The slot is emptied, so each task fires at most once.
    pub fn take_due(&mut self, now: Instant) -> Option<ScheduledKind> {
        match self.slot {
            Some(task) if now >= task.deadline => {
                self.slot = None;
                Some(task.kind)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn pending(&self) -> Option<ScheduledTask> {
        self.slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(3000);

    #[test]
    fn not_due_before_deadline() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ScheduledKind::AutoAdvance, start, DELAY);

        assert_eq!(scheduler.take_due(start), None);
        assert_eq!(scheduler.take_due(start + DELAY - Duration::from_millis(1)), None);
        assert!(scheduler.pending().is_some());
    }

    #[test]
    fn fires_exactly_once() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ScheduledKind::AutoAdvance, start, DELAY);

        assert_eq!(
            scheduler.take_due(start + DELAY),
            Some(ScheduledKind::AutoAdvance)
        );
        assert_eq!(scheduler.take_due(start + DELAY * 2), None);
        assert_eq!(scheduler.pending(), None);
    }

    #[test]
    fn cancelled_task_never_fires() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ScheduledKind::Refetch, start, Duration::from_millis(500));

        let cancelled = scheduler.cancel().expect("task was pending");
        assert_eq!(cancelled.kind, ScheduledKind::Refetch);
        assert_eq!(scheduler.take_due(start + DELAY), None);
        assert_eq!(scheduler.cancel(), None);
    }

    #[test]
    fn scheduling_replaces_outstanding_task() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ScheduledKind::Refetch, start, Duration::from_millis(500));
        scheduler.schedule(ScheduledKind::AutoAdvance, start, DELAY);

        let pending = scheduler.pending().expect("pending");
        assert_eq!(pending.kind, ScheduledKind::AutoAdvance);
        assert_eq!(pending.deadline, start + DELAY);
        assert_eq!(scheduler.take_due(start + Duration::from_millis(500)), None);
    }
}
