//! Keyed one-shot timers for an immediate-mode UI loop.
//!
//! The panel never blocks on a timer. Deadlines are scheduled against an
//! `Instant` and the frame loop calls [`DelayQueue::poll`] to collect the keys
//! whose deadline has passed. Scheduling a key that is already pending moves
//! its deadline (last schedule wins).

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub struct DelayQueue<K: Ord + Clone> {
    pending: BTreeMap<K, Instant>,
}

impl<K: Ord + Clone> Default for DelayQueue<K> {
    fn default() -> Self {
        Self { pending: BTreeMap::new() }
    }
}

impl<K: Ord + Clone> DelayQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, key: K, delay: Duration, now: Instant) {
        self.pending.insert(key, now + delay);
    }

    /// Returns true if something was pending for `key`.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Remove and return every key whose deadline is at or before `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<K> {
        let due: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &due {
            self.pending.remove(key);
        }
        due
    }

    /// Time until the earliest deadline, for scheduling the next repaint.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.pending
            .values()
            .min()
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_deadline() {
        let start = Instant::now();
        let mut queue = DelayQueue::new();
        queue.schedule(1u64, Duration::from_millis(500), start);

        assert!(queue.poll(start + Duration::from_millis(499)).is_empty());
        assert_eq!(queue.poll(start + Duration::from_millis(500)), vec![1]);
        assert!(queue.poll(start + Duration::from_secs(10)).is_empty(), "Fired twice");
        assert!(!queue.is_pending(&1));
    }

    #[test]
    fn test_reschedule_moves_deadline() {
        let start = Instant::now();
        let mut queue = DelayQueue::new();
        queue.schedule(7u64, Duration::from_millis(500), start);
        queue.schedule(7u64, Duration::from_millis(1000), start + Duration::from_millis(200));

        assert!(queue.poll(start + Duration::from_millis(600)).is_empty());
        assert_eq!(queue.poll(start + Duration::from_millis(1200)), vec![7]);
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut queue = DelayQueue::new();
        queue.schedule(3u64, Duration::from_millis(100), start);

        assert!(queue.cancel(&3));
        assert!(!queue.cancel(&3));
        assert!(queue.poll(start + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_keys_are_independent() {
        let start = Instant::now();
        let mut queue = DelayQueue::new();
        queue.schedule(1u64, Duration::from_millis(500), start);
        queue.schedule(2u64, Duration::from_millis(1000), start);

        assert_eq!(queue.next_deadline(start), Some(Duration::from_millis(500)));
        assert_eq!(queue.poll(start + Duration::from_millis(700)), vec![1]);
        assert!(queue.is_pending(&2));
        assert_eq!(
            queue.next_deadline(start + Duration::from_millis(700)),
            Some(Duration::from_millis(300))
        );
    }
}
