//! Coalescing of transcript changes into display refreshes.
//!
//! Any number of changes inside one frame interval produce a single refresh:
//! a change sets the dirty flag and, if no refresh is pending, schedules one
//! for the end of the interval.

use crate::transcript::Message;
use serde::Serialize;
use std::time::Duration;

/// One refresh handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayUpdate {
    /// Increments with every emitted update.
    pub revision: u64,
    pub messages: Vec<Message>,
}

/// Dirty flag plus at most one pending refresh.
#[derive(Debug, Clone)]
pub struct DisplayCoalescer {
    frame_interval: Duration,
    dirty: bool,
    pending_at: Option<Duration>,
    revision: u64,
}

impl DisplayCoalescer {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            dirty: false,
            pending_at: None,
            revision: 0,
        }
    }

    /// Records a change observed at `now`.
    pub fn mark_dirty(&mut self, now: Duration) {
        self.dirty = true;
        if self.pending_at.is_none() {
            self.pending_at = Some(now + self.frame_interval);
        }
    }

    /// Drops the pending refresh and the dirty flag.
    pub fn cancel(&mut self) {
        self.dirty = false;
        self.pending_at = None;
    }

    pub fn next_refresh(&self) -> Option<Duration> {
        self.pending_at
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Consumes a due refresh, returning the revision to emit.
    pub fn take_due(&mut self, now: Duration) -> Option<u64> {
        match self.pending_at {
            Some(at) if at <= now => {
                self.pending_at = None;
                if std::mem::take(&mut self.dirty) {
                    self.revision += 1;
                    Some(self.revision)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Consumes the pending refresh now, whether or not it is due.
    pub fn flush(&mut self) -> Option<u64> {
        self.pending_at = None;
        if std::mem::take(&mut self.dirty) {
            self.revision += 1;
            Some(self.revision)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn changes_within_a_frame_collapse() {
        let mut display = DisplayCoalescer::new(ms(16));
        display.mark_dirty(ms(100));
        display.mark_dirty(ms(105));
        display.mark_dirty(ms(115));

        assert_eq!(display.next_refresh(), Some(ms(116)));
        assert_eq!(display.take_due(ms(115)), None);
        assert_eq!(display.take_due(ms(116)), Some(1));
        assert_eq!(display.take_due(ms(200)), None);
        assert_eq!(display.next_refresh(), None);
    }

    #[test]
    fn next_change_starts_a_new_window() {
        let mut display = DisplayCoalescer::new(ms(16));
        display.mark_dirty(ms(0));
        assert_eq!(display.take_due(ms(16)), Some(1));

        display.mark_dirty(ms(40));
        assert_eq!(display.next_refresh(), Some(ms(56)));
        assert_eq!(display.take_due(ms(56)), Some(2));
    }

    #[test]
    fn cancel_discards_pending_refresh() {
        let mut display = DisplayCoalescer::new(ms(16));
        display.mark_dirty(ms(0));
        display.cancel();

        assert!(!display.is_dirty());
        assert_eq!(display.next_refresh(), None);
        assert_eq!(display.take_due(ms(1000)), None);
        assert_eq!(display.revision(), 0);
    }

    #[test]
    fn flush_emits_before_deadline() {
        let mut display = DisplayCoalescer::new(ms(16));
        assert_eq!(display.flush(), None);
        display.mark_dirty(ms(0));
        assert_eq!(display.flush(), Some(1));
        assert_eq!(display.next_refresh(), None);
        assert_eq!(display.take_due(ms(16)), None);
    }
}
