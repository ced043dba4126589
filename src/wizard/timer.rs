//! Cancellable timers over a virtual clock.
//!
//! The host advances the clock (a shell pumping real elapsed time, or a test
//! stepping deterministically). Due timers are handed out one at a time in
//! deadline order, ties broken by start order, so a handler that cancels other
//! timers prevents them from firing within the same advance.

use std::time::Duration;

/// Smallest repeat interval; a zero interval would never let the clock move.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer<K> {
    pub id: TimerId,
    pub kind: K,
    pub at: Duration,
}

#[derive(Debug, Clone)]
struct Entry<K> {
    id: TimerId,
    kind: K,
    deadline: Duration,
    interval: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry<K>>,
}

impl<K: Clone> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone> TimerQueue<K> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn start_once(&mut self, kind: K, delay: Duration) -> TimerId {
        self.push(kind, delay, None)
    }

    pub fn start_repeating(&mut self, kind: K, interval: Duration) -> TimerId {
        let interval = interval.max(MIN_INTERVAL);
        self.push(kind, interval, Some(interval))
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|entry| entry.deadline).min()
    }

    /// Pops the earliest timer due at or before `until`, moving the clock to
    /// its deadline. Repeating timers are rescheduled instead of removed.
    pub fn pop_due(&mut self, until: Duration) -> Option<FiredTimer<K>> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.deadline <= until)
            .min_by_key(|(_, entry)| (entry.deadline, entry.id))
            .map(|(index, _)| index)?;

        let entry = &mut self.entries[index];
        let fired = FiredTimer {
            id: entry.id,
            kind: entry.kind.clone(),
            at: entry.deadline,
        };
        self.now = self.now.max(entry.deadline);
        let interval = entry.interval;
        match interval {
            Some(interval) => entry.deadline += interval,
            None => {
                self.entries.remove(index);
            }
        }
        Some(fired)
    }

    /// Moves the clock forward after all due timers were handled.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    fn push(&mut self, kind: K, delay: Duration, interval: Option<Duration>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            kind,
            deadline: self.now + delay,
            interval,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn drain(queue: &mut TimerQueue<&'static str>, until: Duration) -> Vec<(&'static str, u128)> {
        let mut fired = Vec::new();
        while let Some(timer) = queue.pop_due(until) {
            fired.push((timer.kind, timer.at.as_millis()));
        }
        queue.settle(until);
        fired
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.start_once("late", ms(50));
        queue.start_repeating("tick", ms(20));
        let fired = drain(&mut queue, ms(60));
        assert_eq!(
            fired,
            vec![("tick", 20), ("tick", 40), ("late", 50), ("tick", 60)]
        );
        assert_eq!(queue.now(), ms(60));
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn ties_fire_in_start_order() {
        let mut queue = TimerQueue::new();
        queue.start_once("first", ms(10));
        queue.start_once("second", ms(10));
        assert_eq!(drain(&mut queue, ms(10)), vec![("first", 10), ("second", 10)]);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut queue = TimerQueue::new();
        let tick = queue.start_repeating("tick", ms(10));
        let done = queue.start_once("done", ms(25));
        assert!(queue.cancel(tick));
        assert!(!queue.cancel(tick));
        assert!(queue.is_active(done));
        assert_eq!(drain(&mut queue, ms(100)), vec![("done", 25)]);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut queue = TimerQueue::new();
        queue.start_repeating("tick", ms(10));
        queue.start_once("done", ms(10));
        assert_eq!(queue.cancel_all(), 2);
        assert!(drain(&mut queue, ms(100)).is_empty());
        assert_eq!(queue.next_deadline(), None);
    }

    #[test]
    fn new_timers_start_from_current_time() {
        let mut queue = TimerQueue::new();
        drain(&mut queue, ms(100));
        queue.start_once("later", ms(5));
        assert_eq!(queue.next_deadline(), Some(ms(105)));
    }
}
