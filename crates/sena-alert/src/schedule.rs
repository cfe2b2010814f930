//! Deferred-alert queue. Entries carry a due time and are revalidated by the
//! owning channel when they fire; disabling the channel clears the whole
//! group so no stale alert fires late.

use std::time::Instant;

#[derive(Debug)]
pub struct DeferredQueue<T> {
    entries: Vec<(Instant, T)>,
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn schedule(&mut self, due: Instant, item: T) {
        self.entries.push((due, item));
    }

    /// Remove and return the earliest entry whose due time has passed.
    pub fn pop_due(&mut self, now: Instant) -> Option<T> {
        let mut earliest: Option<usize> = None;
        for (i, (due, _)) in self.entries.iter().enumerate() {
            if *due > now {
                continue;
            }
            match earliest {
                Some(e) if self.entries[e].0 <= *due => {}
                _ => earliest = Some(i),
            }
        }
        earliest.map(|i| self.entries.remove(i).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.entries.iter().map(|(due, _)| *due).min()
    }
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
