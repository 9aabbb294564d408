//! Recorded signal scripts.
//!
//! A script is JSON Lines: one `{"at_ms": <u64>, "signal": {...}}` object per
//! line, where `at_ms` is the offset from the start of the session. Blank lines
//! and lines starting with `#` are skipped. Entries are ordered by `at_ms`;
//! entries with equal times keep their file order.
//!
//! [`replay_simulated`] runs a script on a [`ManualClock`], visiting every
//! engine wakeup, so the result is exact and instant. [`replay_realtime`] feeds
//! the same script through the async runtime on real time.

use crate::clock::{Clock, ManualClock, SystemClock};
use crate::config::Config;
use crate::defaults;
use crate::display::DisplayUpdate;
use crate::engine::RevealEngine;
use crate::error::{AvatextError, Result};
use crate::runtime::spawn_engine;
use crate::signal::Signal;
use crate::sink::TranscriptSink;
use crate::transcript::Message;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// One scripted signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSignal {
    pub at_ms: u64,
    pub signal: Signal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayScript {
    signals: Vec<TimedSignal>,
}

impl ReplayScript {
    pub fn new(mut signals: Vec<TimedSignal>) -> Self {
        signals.sort_by_key(|s| s.at_ms);
        Self { signals }
    }

    /// Parses a JSON Lines script. Errors carry the 1-based line number.
    pub fn parse(text: &str) -> Result<Self> {
        let mut signals = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let timed: TimedSignal =
                serde_json::from_str(line).map_err(|e| AvatextError::ReplayLine {
                    line: i + 1,
                    message: e.to_string(),
                })?;
            signals.push(timed);
        }
        Ok(Self::new(signals))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn signals(&self) -> &[TimedSignal] {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Time of the last scripted signal.
    pub fn end_ms(&self) -> u64 {
        self.signals.last().map_or(0, |s| s.at_ms)
    }

    /// Serializes back to JSON Lines.
    pub fn to_jsonl(&self) -> Result<String> {
        let mut out = String::new();
        for timed in &self.signals {
            out.push_str(&serde_json::to_string(timed)?);
            out.push('\n');
        }
        Ok(out)
    }
}

/// A display update and the session time it was emitted at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayFrame {
    pub at_ms: u64,
    #[serde(flatten)]
    pub update: DisplayUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub frames: Vec<ReplayFrame>,
    pub transcript: Vec<Message>,
}

/// Runs `script` on simulated time and collects every display update.
pub fn replay_simulated(script: &ReplayScript, config: &Config) -> ReplayOutcome {
    let clock = ManualClock::new();
    let mut engine = RevealEngine::with_clock(config, clock.clone());
    let mut frames = Vec::new();

    for timed in script.signals() {
        let at = Duration::from_millis(timed.at_ms);
        run_until(&mut engine, &clock, Some(at), &mut frames);
        clock.set(at);
        engine.handle(timed.signal.clone());
    }
    run_until(&mut engine, &clock, None, &mut frames);

    tracing::debug!(
        signals = script.len(),
        frames = frames.len(),
        "simulated replay finished"
    );
    ReplayOutcome {
        frames,
        transcript: engine.transcript().to_vec(),
    }
}

/// Visits every wakeup up to `limit` (or all of them when `None`).
fn run_until(
    engine: &mut RevealEngine<ManualClock>,
    clock: &ManualClock,
    limit: Option<Duration>,
    frames: &mut Vec<ReplayFrame>,
) {
    while let Some(wake) = engine.next_wakeup() {
        if limit.is_some_and(|limit| wake > limit) {
            break;
        }
        clock.set(wake);
        if let Some(update) = engine.poll() {
            frames.push(ReplayFrame {
                at_ms: u64::try_from(clock.now().as_millis()).unwrap_or(u64::MAX),
                update,
            });
        }
    }
}

/// Plays `script` through the async runtime on real time, delivering updates
/// to `sink`. Returns once the last reveal has been shown.
pub async fn replay_realtime<S: TranscriptSink>(
    script: &ReplayScript,
    config: &Config,
    sink: S,
) -> Result<Vec<Message>> {
    let clock = SystemClock::new();
    let engine = RevealEngine::with_clock(config, clock);
    let handle = spawn_engine(engine, sink, defaults::CHANNEL_BUFFER);

    for timed in script.signals() {
        tokio::time::sleep_until(clock.instant_at(Duration::from_millis(timed.at_ms))).await;
        handle.send(timed.signal.clone()).await?;
    }
    handle.settled().await?;
    handle.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{AlignmentBlock, Mode};
    use crate::sink::CollectorSink;

    const SCRIPT: &str = r#"
# greeting
{"at_ms": 0, "signal": {"type": "alignment", "chars": ["H", "i"], "char_start_times_ms": [0, 200]}}

{"at_ms": 600, "signal": {"type": "message", "role": "agent", "text": "Hi there"}}
{"at_ms": 900, "signal": {"type": "mode_change", "mode": "listening"}}
"#;

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let script = ReplayScript::parse(SCRIPT).unwrap();
        assert_eq!(script.len(), 3);
        assert_eq!(script.end_ms(), 900);
        assert_eq!(
            script.signals()[2].signal,
            Signal::ModeChange {
                mode: Mode::Listening
            }
        );
    }

    #[test]
    fn parse_reports_line_number() {
        let err = ReplayScript::parse("\n{\"at_ms\": 1, \"signal\": {\"type\": \"bogus\"}}").unwrap_err();
        match err {
            AvatextError::ReplayLine { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn entries_with_equal_times_keep_file_order() {
        let script = ReplayScript::new(vec![
            TimedSignal {
                at_ms: 10,
                signal: Signal::Interrupt,
            },
            TimedSignal {
                at_ms: 5,
                signal: Signal::Reset,
            },
            TimedSignal {
                at_ms: 10,
                signal: Signal::ModeChange {
                    mode: Mode::Speaking,
                },
            },
        ]);
        let kinds: Vec<_> = script.signals().iter().map(|s| s.signal.kind()).collect();
        assert_eq!(kinds, ["reset", "interrupt", "mode_change"]);
    }

    #[test]
    fn jsonl_output_parses_back() {
        let script = ReplayScript::parse(SCRIPT).unwrap();
        let again = ReplayScript::parse(&script.to_jsonl().unwrap()).unwrap();
        assert_eq!(script, again);
    }

    #[test]
    fn simulated_replay_reveals_then_fast_forwards() {
        let script = ReplayScript::parse(SCRIPT).unwrap();
        let outcome = replay_simulated(&script, &Config::default());

        let shown: Vec<_> = outcome
            .frames
            .iter()
            .map(|f| (f.at_ms, f.update.messages[0].text.as_str()))
            .collect();
        assert_eq!(shown, [(516, "H"), (616, "Hi there"), (916, "Hi there")]);
        assert_eq!(outcome.transcript, vec![Message::agent("Hi there")]);
    }

    #[test]
    fn simulated_replay_of_empty_script() {
        let outcome = replay_simulated(&ReplayScript::default(), &Config::default());
        assert!(outcome.frames.is_empty());
        assert!(outcome.transcript.is_empty());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let script = ReplayScript::new(vec![TimedSignal {
            at_ms: 0,
            signal: Signal::Alignment(AlignmentBlock::from_text("ok", vec![0, 0])),
        }]);
        std::fs::write(&path, script.to_jsonl().unwrap()).unwrap();

        assert_eq!(ReplayScript::load(&path).unwrap(), script);
    }

    #[tokio::test(start_paused = true)]
    async fn realtime_replay_matches_simulated_transcript() {
        let script = ReplayScript::parse(SCRIPT).unwrap();
        let sink = CollectorSink::new();
        let transcript = replay_realtime(&script, &Config::default(), sink.clone())
            .await
            .unwrap();

        assert_eq!(
            transcript,
            replay_simulated(&script, &Config::default()).transcript
        );
        assert!(!sink.updates().is_empty());
    }
}
