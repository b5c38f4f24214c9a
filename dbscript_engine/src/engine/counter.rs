use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of fired script sequences that have not reached a terminal state yet.
///
/// Shared through an `Arc` so shutdown logic on other threads can poll
/// [`ScheduledScriptCounter::is_script_scheduled`].
#[derive(Debug, Default)]
pub struct ScheduledScriptCounter {
    count: AtomicUsize,
}

impl ScheduledScriptCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly fired sequence; returns the new count.
    pub fn increase(&self) -> usize {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Record one finished sequence; returns the new count. Never drops below zero.
    pub fn decrease(&self) -> usize {
        self.decrease_by(1)
    }

    /// Record `n` finished sequences at once, saturating at zero.
    pub fn decrease_by(&self, n: usize) -> usize {
        let previous = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some(c.saturating_sub(n)))
            .unwrap_or_else(|c| c);
        previous.saturating_sub(n)
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_script_scheduled(&self) -> bool {
        self.get() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn never_goes_negative() {
        let counter = ScheduledScriptCounter::new();
        assert_eq!(counter.decrease(), 0);
        assert_eq!(counter.increase(), 1);
        assert_eq!(counter.decrease_by(5), 0);
        assert!(!counter.is_script_scheduled());
    }

    #[test]
    fn balanced_updates_from_many_threads_return_to_zero() {
        let counter = Arc::new(ScheduledScriptCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        counter.increase();
                        counter.decrease();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.get(), 0);
    }
}
