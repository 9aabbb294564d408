//! Turn lifecycle: finalize on boundary, full reset, mid-session cleanup.
//!
//! ```text
//! Idle ──(audio | alignment)──▶ TurnOpen
//! TurnOpen ──(listening | interrupt | disconnect/error | reset)──▶ Idle
//! ```

use super::RevealEngine;
use crate::clock::Clock;

impl<C: Clock> RevealEngine<C> {
    /// Writes the turn's final text into the transcript and closes the turn.
    ///
    /// The final text is not limited by the cursor. Calling this while idle does
    /// nothing, so repeated boundaries are harmless.
    pub fn finalize(&mut self) {
        let Some(turn) = self.state.active() else {
            return;
        };
        let turn_id = turn.id();
        let final_text = self.reconciler.final_text(turn);
        let now = self.clock.now();

        let cancelled = self.scheduler.cancel_turn(turn_id);
        if self.transcript.has_open() {
            self.transcript.update_open(&final_text);
            self.transcript.freeze_open();
        } else if !final_text.is_empty() {
            self.transcript.open_agent(final_text.as_str());
            self.transcript.freeze_open();
        }
        self.state.take_turn();

        tracing::info!(
            turn_id,
            cancelled,
            chars = final_text.chars().count(),
            "turn finalized"
        );
        self.display.mark_dirty(now);
    }

    /// Wipes the session: transcript, active turn, and all pending work.
    ///
    /// Used when a brand-new session starts. The renderer receives one refresh
    /// with the empty transcript.
    pub fn reset(&mut self) {
        let cancelled = self.scheduler.clear();
        self.display.cancel();
        self.state.take_turn();
        self.transcript.clear();
        self.awaiting_boundary = false;

        tracing::info!(cancelled, "session reset");
        self.display.mark_dirty(self.clock.now());
    }

    /// Drops the active turn and pending work but keeps the transcript.
    ///
    /// Used on disconnect or error so earlier turns stay visible. An open agent
    /// message is frozen as shown.
    pub fn cleanup(&mut self, reason: &str) {
        let cancelled = self.scheduler.clear();
        self.display.cancel();
        let turn_id = self.state.take_turn().map(|turn| turn.id());
        self.transcript.freeze_open();
        self.awaiting_boundary = false;

        tracing::info!(reason, ?turn_id, cancelled, "session cleaned up");
        self.display.mark_dirty(self.clock.now());
    }
}
