//! Speech-synchronized transcript reveal engine.
//!
//! Ties the components together behind one owned value. Every operation runs to
//! completion on the caller's thread; time only passes between calls. A driver
//! (see [`crate::runtime`] or [`crate::replay`]) feeds signals through
//! [`RevealEngine::handle`] and calls [`RevealEngine::poll`] whenever
//! [`RevealEngine::next_wakeup`] is reached.
//!
//! ```text
//! audio ──▶ DurationAccountant ──▶ turn.cumulative_audio_ms
//! alignment ──▶ RevealScheduler (stamps offset) ──▶ deadline heap
//! poll ──▶ due events ──▶ RevealState.advance_to ──▶ TranscriptLog ──▶ DisplayCoalescer
//! message(agent) ──▶ MessageReconciler ──▶ fast-forward
//! mode_change(listening) ──▶ finalize       interrupt ──▶ freeze partial
//! ```

mod interrupt;
mod lifecycle;

use crate::audio::DurationAccountant;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::display::{DisplayCoalescer, DisplayUpdate};
use crate::reconcile::MessageReconciler;
use crate::reveal::{RevealScheduler, RevealState, SpeechTurn};
use crate::signal::{AlignmentBlock, Mode, Signal};
use crate::transcript::{Message, Role, TranscriptLog};
use std::time::Duration;

/// Whether an agent turn is being revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    TurnOpen,
}

/// Owns one session's reveal state.
pub struct RevealEngine<C: Clock = SystemClock> {
    clock: C,
    accountant: DurationAccountant,
    scheduler: RevealScheduler,
    state: RevealState,
    reconciler: MessageReconciler,
    transcript: TranscriptLog,
    display: DisplayCoalescer,
    /// Set by an interrupt; agent signals are dropped until the next boundary.
    awaiting_boundary: bool,
}

impl RevealEngine<SystemClock> {
    /// Engine on real monotonic time.
    pub fn new(config: &Config) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> RevealEngine<C> {
    pub fn with_clock(config: &Config, clock: C) -> Self {
        Self {
            clock,
            accountant: DurationAccountant::from_config(&config.audio),
            scheduler: RevealScheduler::new(config.reveal.render_delay()),
            state: RevealState::new(),
            reconciler: MessageReconciler::new(config.reveal.short_ground_truth),
            transcript: TranscriptLog::new(),
            display: DisplayCoalescer::new(config.display.frame_interval()),
            awaiting_boundary: false,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Dispatches one inbound signal.
    pub fn handle(&mut self, signal: Signal) {
        tracing::trace!(kind = signal.kind(), "signal");
        match signal {
            Signal::Audio { audio_base64 } => self.account_audio(&audio_base64),
            Signal::Alignment(block) => self.schedule_alignment(&block),
            Signal::Message {
                role: Role::User,
                text,
            } => self.push_user_message(text),
            Signal::Message {
                role: Role::Agent,
                text,
            } => self.observe_ground_truth(text),
            Signal::ModeChange { mode } => self.on_mode_change(mode),
            Signal::Interrupt => self.on_interrupt(),
            Signal::Disconnect { reason } | Signal::Error { reason } => self.cleanup(&reason),
            Signal::Reset => self.reset(),
        }
    }

    /// Adds the duration of an audio chunk to the active turn, opening one if idle.
    pub fn account_audio(&mut self, payload: &str) {
        if self.dropping_agent_signal("audio") {
            return;
        }
        let ms = self.accountant.duration_ms(payload);
        let now = self.clock.now();
        let turn = self.state.open_turn(now);
        turn.add_audio_ms(ms);
        tracing::trace!(
            turn_id = turn.id(),
            chunk_ms = ms,
            cumulative_ms = turn.cumulative_audio_ms(),
            "audio accounted"
        );
    }

    /// Appends an alignment block and schedules its reveals.
    pub fn schedule_alignment(&mut self, block: &AlignmentBlock) {
        if self.dropping_agent_signal("alignment") {
            return;
        }
        let now = self.clock.now();
        let turn = self.state.open_turn(now);
        self.scheduler
            .schedule_block(turn, &block.chars, &block.char_start_times_ms, now);
    }

    /// Takes the authoritative text of the agent utterance.
    ///
    /// Never opens a turn. While idle the text is applied to the last finalized
    /// agent message, unless that message was interrupted or something was
    /// appended after it; otherwise it is dropped.
    pub fn observe_ground_truth(&mut self, text: impl Into<String>) {
        if self.dropping_agent_signal("ground truth") {
            return;
        }
        let now = self.clock.now();
        let text = text.into();
        if self.state.active().is_none() {
            self.apply_late_ground_truth(text, now);
            return;
        }
        // A stored ground truth can still switch the source under the cursor.
        if self
            .reconciler
            .observe_ground_truth(&mut self.state, &mut self.scheduler, text)
            .is_some()
        {
            self.sync_open_message(now);
        }
    }

    fn apply_late_ground_truth(&mut self, text: String, now: Duration) {
        let Some(message) = self.transcript.last_completed_agent_mut() else {
            tracing::debug!(
                chars = text.chars().count(),
                "dropping ground truth with no agent turn"
            );
            return;
        };
        let text = self.reconciler.late_text(&message.text, text);
        if message.text != text {
            tracing::debug!(chars = text.chars().count(), "late ground truth applied");
            message.text = text;
            self.display.mark_dirty(now);
        }
    }

    /// Appends a user utterance verbatim.
    pub fn push_user_message(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!(chars = text.chars().count(), "user message");
        self.transcript.push_user(text);
        self.display.mark_dirty(self.clock.now());
    }

    /// Handles a turn boundary. Either mode ends post-interrupt suppression;
    /// `listening` also finalizes the open turn.
    pub fn on_mode_change(&mut self, mode: Mode) {
        if std::mem::take(&mut self.awaiting_boundary) {
            tracing::debug!(?mode, "boundary reached, accepting agent signals again");
        }
        match mode {
            Mode::Listening => self.finalize(),
            Mode::Speaking => {}
        }
    }

    /// Fires every reveal that is due and returns a display update if a refresh is due.
    pub fn poll(&mut self) -> Option<DisplayUpdate> {
        let now = self.clock.now();
        let mut advanced = false;
        while let Some(event) = self.scheduler.pop_due(now) {
            if self.state.advance_to(event.turn_id, event.char_index) {
                tracing::trace!(
                    turn_id = event.turn_id,
                    index = event.char_index,
                    "revealed"
                );
                advanced = true;
            }
        }
        if advanced {
            self.sync_open_message(now);
        }

        self.display.take_due(now).map(|revision| DisplayUpdate {
            revision,
            messages: self.transcript.snapshot(),
        })
    }

    /// Like [`poll`](Self::poll), but emits a pending refresh without waiting
    /// for its frame to end. Used when the driver shuts down.
    pub fn flush(&mut self) -> Option<DisplayUpdate> {
        let update = self.poll();
        if update.is_some() {
            return update;
        }
        self.display.flush().map(|revision| DisplayUpdate {
            revision,
            messages: self.transcript.snapshot(),
        })
    }

    /// Earliest time at which [`poll`](Self::poll) has work to do.
    pub fn next_wakeup(&self) -> Option<Duration> {
        match (self.scheduler.next_deadline(), self.display.next_refresh()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn transcript(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn phase(&self) -> TurnPhase {
        if self.state.active().is_some() {
            TurnPhase::TurnOpen
        } else {
            TurnPhase::Idle
        }
    }

    pub fn active_turn(&self) -> Option<&SpeechTurn> {
        self.state.active()
    }

    pub fn revealed_index(&self) -> usize {
        self.state.revealed_index()
    }

    /// Visible text of the active turn.
    pub fn display_text(&self) -> String {
        self.state.current_display_text()
    }

    /// Reveal events still queued.
    pub fn pending_reveals(&self) -> usize {
        self.scheduler.pending()
    }

    /// Whether agent signals are being dropped after an interrupt.
    pub fn is_awaiting_boundary(&self) -> bool {
        self.awaiting_boundary
    }

    /// Makes the transcript's open agent message equal the visible prefix.
    fn sync_open_message(&mut self, now: Duration) {
        let text = self.state.current_display_text();
        let changed = if self.transcript.has_open() {
            self.transcript.update_open(&text)
        } else if !text.is_empty() {
            self.transcript.open_agent(text);
            true
        } else {
            false
        };
        if changed {
            self.display.mark_dirty(now);
        }
    }

    fn dropping_agent_signal(&self, kind: &'static str) -> bool {
        if self.awaiting_boundary {
            tracing::debug!(kind, "dropping agent signal of interrupted turn");
        }
        self.awaiting_boundary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn engine() -> (RevealEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (
            RevealEngine::with_clock(&Config::default(), clock.clone()),
            clock,
        )
    }

    #[test]
    fn starts_idle_and_empty() {
        let (engine, _) = engine();
        assert_eq!(engine.phase(), TurnPhase::Idle);
        assert!(engine.transcript().is_empty());
        assert_eq!(engine.next_wakeup(), None);
    }

    #[test]
    fn audio_opens_turn_and_accumulates() {
        let (mut engine, clock) = engine();
        clock.set_ms(40);
        // 3200 bytes = 100 ms
        let payload = "A".repeat(4268) + "==";
        engine.account_audio(&payload);

        let turn = engine.active_turn().expect("turn opened");
        assert_eq!(turn.started_at(), Duration::from_millis(40));
        assert_eq!(engine.phase(), TurnPhase::TurnOpen);
        let expected = (((4270 * 3 / 4) - 2) as f64) / 2.0 / 16000.0 * 1000.0;
        assert!((turn.cumulative_audio_ms() - expected).abs() < 1e-9);
    }

    #[test]
    fn alignment_text_is_available_before_reveal() {
        let (mut engine, _) = engine();
        engine.schedule_alignment(&AlignmentBlock::from_text("Hi", vec![0, 200]));

        assert_eq!(engine.active_turn().map(|t| t.aligned_text()), Some("Hi"));
        assert_eq!(engine.display_text(), "");
        assert_eq!(engine.pending_reveals(), 2);
        assert!(engine.transcript().is_empty());
    }

    #[test]
    fn reveals_are_coalesced_into_one_update() {
        let (mut engine, clock) = engine();
        engine.schedule_alignment(&AlignmentBlock::from_text("abc", vec![0, 2, 4]));

        clock.set_ms(510);
        assert_eq!(engine.poll(), None);
        assert_eq!(engine.display_text(), "abc");
        assert_eq!(engine.next_wakeup(), Some(Duration::from_millis(526)));

        clock.set_ms(526);
        let update = engine.poll().expect("refresh due");
        assert_eq!(update.revision, 1);
        assert_eq!(update.messages, vec![Message::agent("abc")]);
        assert_eq!(engine.poll(), None);
    }

    #[test]
    fn flush_delivers_pending_refresh_early() {
        let (mut engine, _) = engine();
        engine.push_user_message("hi");
        assert_eq!(engine.poll(), None);

        let update = engine.flush().expect("pending refresh");
        assert_eq!(update.messages, vec![Message::user("hi")]);
        assert_eq!(engine.flush(), None);
        assert_eq!(engine.next_wakeup(), None);
    }

    #[test]
    fn user_message_is_appended_verbatim() {
        let (mut engine, _) = engine();
        engine.handle(Signal::Message {
            role: Role::User,
            text: "  hello?  ".to_string(),
        });
        assert_eq!(engine.transcript(), [Message::user("  hello?  ")]);
        assert_eq!(engine.phase(), TurnPhase::Idle);
    }

    #[test]
    fn ground_truth_without_agent_turn_is_dropped() {
        let (mut engine, _) = engine();
        engine.push_user_message("hello?");
        engine.observe_ground_truth("Hi there");

        assert_eq!(engine.phase(), TurnPhase::Idle);
        assert_eq!(engine.transcript(), [Message::user("hello?")]);
    }

    #[test]
    fn late_ground_truth_amends_finalized_message() {
        let (mut engine, clock) = engine();
        engine.schedule_alignment(&AlignmentBlock::from_text("Hi", vec![0, 0]));
        clock.set_ms(600);
        engine.poll();
        engine.on_mode_change(Mode::Listening);

        engine.observe_ground_truth("Hi");
        assert_eq!(engine.phase(), TurnPhase::Idle);
        assert_eq!(engine.transcript(), [Message::agent("Hi")]);

        engine.observe_ground_truth("Hi there");
        assert_eq!(engine.phase(), TurnPhase::Idle);
        assert_eq!(engine.transcript(), [Message::agent("Hi there")]);
    }

    #[test]
    fn equal_length_ground_truth_replaces_revealed_text() {
        let (mut engine, clock) = engine();
        engine.schedule_alignment(&AlignmentBlock::from_text("Helo", vec![0, 0, 100, 100]));
        clock.set_ms(600);
        engine.poll();
        assert_eq!(engine.display_text(), "Helo");

        engine.observe_ground_truth("Hell");
        assert_eq!(engine.display_text(), "Hell");
        assert_eq!(engine.transcript(), [Message::agent("Hell")]);
    }

    #[test]
    fn speaking_boundary_changes_nothing_else() {
        let (mut engine, _) = engine();
        engine.schedule_alignment(&AlignmentBlock::from_text("Hi", vec![0, 0]));
        engine.on_mode_change(Mode::Speaking);
        assert_eq!(engine.phase(), TurnPhase::TurnOpen);
        assert_eq!(engine.pending_reveals(), 2);
    }
}
