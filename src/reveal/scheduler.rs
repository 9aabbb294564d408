//! Reveal deadline scheduling.
//!
//! Instead of one timer per character, every pending reveal sits in a single
//! min-heap keyed by deadline. The driver sleeps until [`RevealScheduler::next_deadline`]
//! and then drains everything that is due. Cancelling a turn is a heap rebuild,
//! cancelling everything is a clear.

use crate::reveal::state::{SpeechTurn, TurnId};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

/// A scheduled cursor advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RevealEvent {
    pub turn_id: TurnId,
    /// Cursor value after this reveal (number of visible characters).
    pub char_index: usize,
    pub deadline: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Scheduled {
    deadline: Duration,
    seq: u64,
    event: RevealEvent,
}

/// Outcome of stamping one alignment block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSchedule {
    /// Audio offset of the turn at the moment the block arrived.
    pub stamped_offset_ms: f64,
    /// Characters appended to the aligned text.
    pub appended: usize,
    /// Reveal events queued.
    pub scheduled: usize,
    /// Events whose deadline had already passed and were clamped to now.
    pub clamped: usize,
}

/// Min-heap of reveal deadlines.
#[derive(Debug)]
pub struct RevealScheduler {
    queue: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
    render_delay: Duration,
}

impl RevealScheduler {
    pub fn new(render_delay: Duration) -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
            render_delay,
        }
    }

    pub fn render_delay(&self) -> Duration {
        self.render_delay
    }

    /// Appends an alignment block to `turn` and schedules one reveal per character.
    ///
    /// The turn's accumulated audio offset is read once, here, and baked into
    /// every deadline of the block:
    /// `started_at + stamped_offset + start_offsets[i] + render_delay`.
    /// Characters beyond the end of `start_offsets_ms` reuse the previous offset.
    pub fn schedule_block(
        &mut self,
        turn: &mut SpeechTurn,
        chars: &[char],
        start_offsets_ms: &[i64],
        now: Duration,
    ) -> BlockSchedule {
        let stamped_offset_ms = turn.cumulative_audio_ms();
        let base_ms = duration_ms(turn.started_at())
            + stamped_offset_ms
            + duration_ms(self.render_delay);

        let mut outcome = BlockSchedule {
            stamped_offset_ms,
            appended: 0,
            scheduled: 0,
            clamped: 0,
        };
        let mut offset_ms = 0i64;

        for (i, &c) in chars.iter().enumerate() {
            if let Some(&offset) = start_offsets_ms.get(i) {
                offset_ms = offset;
            }
            let char_index = turn.push_aligned(c);
            outcome.appended += 1;

            let deadline = ms_to_duration(base_ms + offset_ms as f64);
            if deadline < now {
                outcome.clamped += 1;
            }
            self.schedule(RevealEvent {
                turn_id: turn.id(),
                char_index,
                deadline: deadline.max(now),
            });
            outcome.scheduled += 1;
        }

        tracing::trace!(
            turn_id = turn.id(),
            stamped_offset_ms,
            appended = outcome.appended,
            clamped = outcome.clamped,
            "alignment block scheduled"
        );
        outcome
    }

    /// Queues a single event.
    pub fn schedule(&mut self, event: RevealEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled {
            deadline: event.deadline,
            seq,
            event,
        }));
    }

    /// Removes and returns the earliest event due at or before `now`.
    ///
    /// Events with equal deadlines come out in scheduling order.
    pub fn pop_due(&mut self, now: Duration) -> Option<RevealEvent> {
        match self.queue.peek() {
            Some(Reverse(next)) if next.deadline <= now => {
                self.queue.pop().map(|Reverse(s)| s.event)
            }
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(s)| s.deadline)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops every pending event of `turn_id`. Returns how many were dropped.
    pub fn cancel_turn(&mut self, turn_id: TurnId) -> usize {
        let before = self.queue.len();
        self.queue.retain(|Reverse(s)| s.event.turn_id != turn_id);
        before - self.queue.len()
    }

    /// Drops every pending event. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Converts fractional milliseconds to a duration at microsecond precision,
/// clamping negatives to zero.
fn ms_to_duration(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_micros((ms * 1000.0).round() as u64)
    } else {
        Duration::ZERO
    }
}
