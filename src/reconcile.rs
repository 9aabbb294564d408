//! Merging of ground-truth text with the incrementally aligned text.
//!
//! Ground truth is authoritative: when it arrives the cursor jumps to its end
//! and the per-character reveals still queued become redundant. The cursor
//! itself never moves back, so a late or short ground truth cannot shrink the
//! visible text while the turn is open.

use crate::reveal::{RevealScheduler, RevealState, SpeechTurn};
use serde::{Deserialize, Serialize};

/// What finalize writes when ground truth is shorter than what was revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortGroundTruthPolicy {
    /// The ground truth replaces the longer revealed text.
    #[default]
    PreferGroundTruth,
    /// The longer revealed text stays on screen.
    KeepRevealed,
}

impl ShortGroundTruthPolicy {
    /// Parses the snake_case config name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "prefer_ground_truth" => Some(Self::PreferGroundTruth),
            "keep_revealed" => Some(Self::KeepRevealed),
            _ => None,
        }
    }
}

/// Result of observing a ground-truth message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTruthOutcome {
    /// Cursor jumped to the end of the ground truth.
    FastForwarded { cancelled: usize },
    /// Ground truth stored, cursor already at or past its length.
    Stored,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MessageReconciler {
    policy: ShortGroundTruthPolicy,
}

impl MessageReconciler {
    pub fn new(policy: ShortGroundTruthPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ShortGroundTruthPolicy {
        self.policy
    }

    /// Stores `text` as the active turn's ground truth and fast-forwards if it is
    /// longer than what is revealed. Returns `None` when no turn is active.
    pub fn observe_ground_truth(
        &self,
        state: &mut RevealState,
        scheduler: &mut RevealScheduler,
        text: String,
    ) -> Option<GroundTruthOutcome> {
        let turn = state.active_mut()?;
        let turn_id = turn.id();
        turn.set_ground_truth(text);
        let len = turn.ground_truth_len();

        if len > turn.revealed_index() {
            state.advance_to(turn_id, len);
            let cancelled = scheduler.cancel_turn(turn_id);
            tracing::debug!(turn_id, len, cancelled, "ground truth fast-forward");
            Some(GroundTruthOutcome::FastForwarded { cancelled })
        } else {
            tracing::debug!(turn_id, len, "ground truth stored behind cursor");
            Some(GroundTruthOutcome::Stored)
        }
    }

    /// Text a turn leaves in the transcript once it is finalized.
    ///
    /// Ground truth, else the full aligned text, else whatever is displayed.
    /// Under [`ShortGroundTruthPolicy::KeepRevealed`] a ground truth shorter than
    /// the displayed text loses to the displayed text.
    pub fn final_text(&self, turn: &SpeechTurn) -> String {
        let displayed = turn.display_text();
        match turn.ground_truth() {
            Some(gt) if !gt.is_empty() => {
                if self.policy == ShortGroundTruthPolicy::KeepRevealed
                    && turn.ground_truth_len() < displayed.chars().count()
                {
                    displayed
                } else {
                    gt.to_string()
                }
            }
            _ if !turn.aligned_text().is_empty() => turn.aligned_text().to_string(),
            _ => displayed,
        }
    }

    /// Text of an already finalized agent message once its ground truth
    /// arrives late. Follows the same short-ground-truth policy as
    /// [`final_text`](Self::final_text); empty ground truth changes nothing.
    pub fn late_text(&self, shown: &str, ground_truth: String) -> String {
        let shorter = ground_truth.chars().count() < shown.chars().count();
        if ground_truth.is_empty()
            || (self.policy == ShortGroundTruthPolicy::KeepRevealed && shorter)
        {
            shown.to_string()
        } else {
            ground_truth
        }
    }
}
