//! Work deferred until a later frame

use core::time::Duration;

/// A queue of tasks, each waiting for its time to come
///
/// Tasks come out in order of their due time, and tasks due at the same time come out in the
/// order they were scheduled.
#[derive(Debug)]
pub struct Scheduler<T> {
    /// Sorted by due time, then by sequence number
    tasks: Vec<(Duration, u64, T)>,
    next_seq: u64,
}

impl<T> Scheduler<T> {
    pub const fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_seq: 0,
        }
    }

    /// Schedule `task` to run at `due`
    pub fn schedule(&mut self, due: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let idx = self
            .tasks
            .partition_point(|&(other_due, other_seq, _)| (other_due, other_seq) <= (due, seq));
        self.tasks.insert(idx, (due, seq, task));
    }

    /// Take the earliest task if it's due by `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, T)> {
        match self.tasks.first() {
            Some(&(due, _, _)) if due <= now => {
                let (due, _, task) = self.tasks.remove(0);
                Some((due, task))
            }
            _ => None,
        }
    }

    /// When the earliest task is due
    pub fn next_due(&self) -> Option<Duration> {
        self.tasks.first().map(|&(due, _, _)| due)
    }

    /// Whether an equal task is waiting
    pub fn contains(&self, task: &T) -> bool
    where
        T: PartialEq,
    {
        self.tasks.iter().any(|(_, _, other)| other == task)
    }

    /// Drop every task for which `keep` returns false
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.tasks.retain(|(_, _, task)| keep(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
