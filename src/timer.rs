use std::collections::{BTreeMap, HashMap};

pub type TimerId = u64;

/// Logical clock queue for deferred game callbacks.
///
/// Times are milliseconds of play time supplied by the owner. Timers due at
/// the same instant fire in the order they were scheduled.
#[derive(Debug)]
pub struct Scheduler<E> {
    queue: BTreeMap<(u64, TimerId), E>,
    due_by_id: HashMap<TimerId, u64>,
    next_id: TimerId,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            due_by_id: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn schedule(&mut self, now: u64, delay_ms: u64, event: E) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let due = now.saturating_add(delay_ms);
        self.queue.insert((due, id), event);
        self.due_by_id.insert(id, due);
        id
    }

    /// Returns false when the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_by_id.remove(&id) {
            Some(due) => self.queue.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_by_id.contains_key(&id)
    }

    #[cfg(test)]
    pub fn due_at(&self, id: TimerId) -> Option<u64> {
        self.due_by_id.get(&id).copied()
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<(TimerId, E)> {
        let (&(due, id), _) = self.queue.iter().next()?;
        if due > now {
            return None;
        }
        self.due_by_id.remove(&id);
        self.queue.remove(&(due, id)).map(|event| (id, event))
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TimerId, &E)> {
        self.queue.iter().map(|(&(_, id), event)| (id, event))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.due_by_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order_then_schedule_order() {
        let mut sched = Scheduler::new();
        sched.schedule(0, 300, "late");
        sched.schedule(0, 100, "first");
        sched.schedule(50, 50, "second");

        assert_eq!(sched.pop_due(99), None);
        assert_eq!(sched.pop_due(100).map(|(_, e)| e), Some("first"));
        assert_eq!(sched.pop_due(100).map(|(_, e)| e), Some("second"));
        assert_eq!(sched.pop_due(100), None);
        assert_eq!(sched.next_due(), Some(300));
        assert_eq!(sched.pop_due(1_000).map(|(_, e)| e), Some("late"));
        assert!(sched.is_empty());
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut sched = Scheduler::new();
        let id = sched.schedule(0, 10, 1);
        assert!(sched.is_pending(id));
        assert_eq!(sched.due_at(id), Some(10));
        assert!(sched.cancel(id));
        assert!(!sched.cancel(id));
        assert!(!sched.is_pending(id));
        assert_eq!(sched.pop_due(100), None);
    }

    #[test]
    fn cancel_after_fire_is_a_no_op() {
        let mut sched = Scheduler::new();
        let id = sched.schedule(0, 10, ());
        assert!(sched.pop_due(10).is_some());
        assert!(!sched.cancel(id));
    }
}
