//! Cooperative periodic tasks for the UI loop.
//!
//! Each task has its own fixed period and deadline. [`Scheduler::due`] is
//! polled from the single UI loop; tasks that are due run one after another,
//! so a slow task delays the others. Missed periods are not replayed: a late
//! task fires once and its next deadline is one period after `now`.

use heapless::Vec;

use crate::config::{CLOCK_REFRESH_MS, MEDIA_REFRESH_MS, PRICE_REFRESH_MS};

pub const MAX_TASKS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    PriceRefresh,
    ClockRefresh,
    MediaRefresh,
}

impl TaskKind {
    pub const fn default_period_ms(self) -> u64 {
        match self {
            TaskKind::PriceRefresh => PRICE_REFRESH_MS,
            TaskKind::ClockRefresh => CLOCK_REFRESH_MS,
            TaskKind::MediaRefresh => MEDIA_REFRESH_MS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PeriodicTask {
    kind: TaskKind,
    period_ms: u64,
    next_due_ms: u64,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<PeriodicTask, MAX_TASKS>,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Register `kind` so that it first fires one period after `now_ms`.
    ///
    /// Re-registering a task replaces its period.
    pub fn register(&mut self, kind: TaskKind, period_ms: u64, now_ms: u64) -> bool {
        let task = PeriodicTask {
            kind,
            period_ms: period_ms.max(1),
            next_due_ms: now_ms.saturating_add(period_ms),
        };
        if let Some(existing) = self.tasks.iter_mut().find(|t| t.kind == kind) {
            *existing = task;
            return true;
        }
        self.tasks.push(task).is_ok()
    }

    /// Make `kind` due on the next poll.
    pub fn trigger_now(&mut self, kind: TaskKind, now_ms: u64) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.kind == kind) {
            task.next_due_ms = now_ms;
        }
    }

    /// Tasks due at `now_ms`, in registration order. Their deadlines advance.
    pub fn due(&mut self, now_ms: u64) -> Vec<TaskKind, MAX_TASKS> {
        let mut due = Vec::new();
        for task in self.tasks.iter_mut() {
            if now_ms >= task.next_due_ms {
                task.next_due_ms = now_ms.saturating_add(task.period_ms);
                // Capacity equals the task table, so this cannot fail
                let _ = due.push(task.kind);
            }
        }
        due
    }

    /// Earliest deadline across all tasks.
    pub fn next_deadline(&self) -> Option<u64> {
        self.tasks.iter().map(|t| t.next_due_ms).min()
    }

    pub fn period_of(&self, kind: TaskKind) -> Option<u64> {
        self.tasks
            .iter()
            .find(|t| t.kind == kind)
            .map(|t| t.period_ms)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Scheduler {
        let mut s = Scheduler::new();
        for kind in [
            TaskKind::PriceRefresh,
            TaskKind::ClockRefresh,
            TaskKind::MediaRefresh,
        ] {
            assert!(s.register(kind, kind.default_period_ms(), 0));
        }
        s
    }

    #[test]
    fn test_periods_are_independent() {
        let mut s = standard();
        assert_eq!(s.period_of(TaskKind::PriceRefresh), Some(300_000));
        assert_eq!(s.period_of(TaskKind::ClockRefresh), Some(1_000));
        assert_eq!(s.period_of(TaskKind::MediaRefresh), Some(5_000));

        let mut clock = 0;
        let mut media = 0;
        let mut price = 0;
        let mut now = 0;
        while now <= 600_000 {
            for kind in s.due(now) {
                match kind {
                    TaskKind::ClockRefresh => clock += 1,
                    TaskKind::MediaRefresh => media += 1,
                    TaskKind::PriceRefresh => price += 1,
                }
            }
            now += 100;
        }
        assert_eq!(clock, 600);
        assert_eq!(media, 120);
        assert_eq!(price, 2);
    }

    #[test]
    fn test_nothing_due_before_first_period() {
        let mut s = standard();
        assert!(s.due(0).is_empty());
        assert!(s.due(999).is_empty());
        assert_eq!(s.due(1_000).as_slice(), [TaskKind::ClockRefresh]);
    }

    #[test]
    fn test_late_poll_fires_once_without_catch_up() {
        let mut s = standard();
        // A fetch that blocked the loop for 7.5 s
        let due = s.due(7_500);
        assert_eq!(due.as_slice(), [TaskKind::ClockRefresh, TaskKind::MediaRefresh]);
        assert!(s.due(7_600).is_empty());
        assert_eq!(s.due(8_500).as_slice(), [TaskKind::ClockRefresh]);
    }

    #[test]
    fn test_trigger_now() {
        let mut s = standard();
        s.trigger_now(TaskKind::PriceRefresh, 10);
        assert_eq!(s.next_deadline(), Some(10));
        assert_eq!(s.due(10).as_slice(), [TaskKind::PriceRefresh]);
        assert_eq!(s.next_deadline(), Some(1_000));
    }

    #[test]
    fn test_reregister_replaces() {
        let mut s = standard();
        assert!(s.register(TaskKind::ClockRefresh, 250, 0));
        assert_eq!(s.len(), 3);
        assert_eq!(s.due(250).as_slice(), [TaskKind::ClockRefresh]);
    }
}
