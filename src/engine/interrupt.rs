//! Cutting a turn off mid-playback.

use super::RevealEngine;
use crate::clock::Clock;

impl<C: Clock> RevealEngine<C> {
    /// Freezes the active turn at its visible text and marks it interrupted.
    ///
    /// Pending reveals of the turn are cancelled before the turn is destroyed, so
    /// nothing queued for it can land in a later turn. Agent signals still in
    /// flight for the destroyed turn are dropped until the next turn boundary.
    /// An interrupt while idle changes nothing.
    pub fn on_interrupt(&mut self) {
        let Some(turn_id) = self.state.active_id() else {
            tracing::debug!("interrupt while idle");
            return;
        };
        self.awaiting_boundary = true;
        let now = self.clock.now();

        let cancelled = self.scheduler.cancel_turn(turn_id);
        self.display.cancel();

        let partial = self.state.current_display_text();
        if self.transcript.has_open() {
            self.transcript.update_open(&partial);
        } else if !partial.is_empty() {
            self.transcript.open_agent(partial.as_str());
        }
        self.transcript.mark_open_interrupted();
        self.transcript.freeze_open();
        self.state.take_turn();

        tracing::info!(
            turn_id,
            cancelled,
            partial_chars = partial.chars().count(),
            "turn interrupted"
        );
        self.display.mark_dirty(now);
    }
}
