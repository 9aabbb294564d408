//! Speech turn accumulators and the monotonic reveal cursor.

use std::time::Duration;

/// Identifier of a speech turn. Strictly increasing over the engine's life.
pub type TurnId = u64;

/// One agent utterance being revealed.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechTurn {
    id: TurnId,
    started_at: Duration,
    cumulative_audio_ms: f64,
    aligned_text: String,
    aligned_len: usize,
    ground_truth: Option<String>,
    ground_truth_len: usize,
    revealed_index: usize,
}

impl SpeechTurn {
    fn new(id: TurnId, started_at: Duration) -> Self {
        Self {
            id,
            started_at,
            cumulative_audio_ms: 0.0,
            aligned_text: String::new(),
            aligned_len: 0,
            ground_truth: None,
            ground_truth_len: 0,
            revealed_index: 0,
        }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    /// Clock time of the first signal of this turn.
    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    /// Audio accounted so far, in milliseconds.
    pub fn cumulative_audio_ms(&self) -> f64 {
        self.cumulative_audio_ms
    }

    pub fn aligned_text(&self) -> &str {
        &self.aligned_text
    }

    /// Length of the aligned text in characters.
    pub fn aligned_len(&self) -> usize {
        self.aligned_len
    }

    pub fn ground_truth(&self) -> Option<&str> {
        self.ground_truth.as_deref()
    }

    /// Length of the ground truth in characters, 0 when absent.
    pub fn ground_truth_len(&self) -> usize {
        self.ground_truth_len
    }

    pub fn revealed_index(&self) -> usize {
        self.revealed_index
    }

    /// Upper bound of the cursor.
    ///
    /// Once ground truth covers the cursor it is the only source, so aligned
    /// characters arriving later cannot push the cursor past its end.
    pub fn max_index(&self) -> usize {
        if self.ground_truth_covers_cursor() {
            self.ground_truth_len
        } else {
            self.aligned_len.max(self.ground_truth_len)
        }
    }

    fn ground_truth_covers_cursor(&self) -> bool {
        self.ground_truth.is_some() && self.ground_truth_len >= self.revealed_index
    }

    /// Adds accounted audio. Non-finite or negative amounts are ignored.
    pub fn add_audio_ms(&mut self, ms: f64) {
        if ms.is_finite() && ms > 0.0 {
            self.cumulative_audio_ms += ms;
        }
    }

    /// Appends one aligned character and returns the new aligned length.
    pub fn push_aligned(&mut self, c: char) -> usize {
        self.aligned_text.push(c);
        self.aligned_len += 1;
        self.aligned_len
    }

    /// Stores the authoritative text; the latest value wins.
    pub fn set_ground_truth(&mut self, text: String) {
        self.ground_truth_len = text.chars().count();
        self.ground_truth = Some(text);
    }

    /// The text the cursor indexes into.
    ///
    /// Ground truth when present and long enough to cover the cursor, else the
    /// aligned text, so the visible prefix never shrinks while the turn is open.
    pub fn source_text(&self) -> &str {
        match self.ground_truth.as_deref() {
            Some(gt) if self.ground_truth_covers_cursor() => gt,
            _ => &self.aligned_text,
        }
    }

    /// First `revealed_index` characters of the source text.
    pub fn display_text(&self) -> String {
        self.source_text().chars().take(self.revealed_index).collect()
    }

    fn advance(&mut self, index: usize) -> bool {
        let target = index.min(self.max_index());
        if target > self.revealed_index {
            self.revealed_index = target;
            true
        } else {
            false
        }
    }
}

/// Holds the active turn and the sole mutation path of its cursor.
#[derive(Debug, Default)]
pub struct RevealState {
    turn: Option<SpeechTurn>,
    next_turn_id: TurnId,
}

impl RevealState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&SpeechTurn> {
        self.turn.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut SpeechTurn> {
        self.turn.as_mut()
    }

    pub fn active_id(&self) -> Option<TurnId> {
        self.turn.as_ref().map(SpeechTurn::id)
    }

    /// Returns the active turn, creating one that starts at `now` if needed.
    pub fn open_turn(&mut self, now: Duration) -> &mut SpeechTurn {
        let next_turn_id = &mut self.next_turn_id;
        self.turn.get_or_insert_with(|| {
            *next_turn_id += 1;
            tracing::debug!(turn_id = *next_turn_id, started_at = ?now, "speech turn opened");
            SpeechTurn::new(*next_turn_id, now)
        })
    }

    /// Moves the cursor of `turn_id` to at least `index`.
    ///
    /// Calls for any other turn are dropped. The cursor is a running maximum
    /// clamped to the longest known text. Returns whether it moved.
    pub fn advance_to(&mut self, turn_id: TurnId, index: usize) -> bool {
        match self.turn.as_mut() {
            Some(turn) if turn.id == turn_id => turn.advance(index),
            _ => {
                tracing::debug!(turn_id, index, "dropping reveal for inactive turn");
                false
            }
        }
    }

    pub fn revealed_index(&self) -> usize {
        self.turn.as_ref().map_or(0, SpeechTurn::revealed_index)
    }

    /// Visible text of the active turn, empty when idle.
    pub fn current_display_text(&self) -> String {
        self.turn
            .as_ref()
            .map(SpeechTurn::display_text)
            .unwrap_or_default()
    }

    /// Destroys the active turn and hands it back.
    pub fn take_turn(&mut self) -> Option<SpeechTurn> {
        self.turn.take()
    }
}
