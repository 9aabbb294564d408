use avatext::replay::{ReplayScript, TimedSignal, replay_realtime, replay_simulated};
use avatext::{
    AlignmentBlock, CollectorSink, Config, Message, Mode, RevealEngine, Role, Signal, spawn_engine,
};
use std::time::Duration;

fn hello_there() -> Signal {
    Signal::Alignment(AlignmentBlock::from_text(
        "Hello there",
        (0..11).map(|i| i * 100).collect(),
    ))
}

#[tokio::test(start_paused = true)]
async fn interrupt_through_the_actor() {
    let sink = CollectorSink::new();
    let handle = spawn_engine(RevealEngine::new(&Config::default()), sink.clone(), 16);

    handle.send(hello_there()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(750)).await;
    handle.send(Signal::Interrupt).await.unwrap();

    let transcript = handle.settled().await.unwrap();
    assert_eq!(
        transcript,
        vec![Message {
            role: Role::Agent,
            text: "Hel".to_string(),
            interrupted: true,
        }]
    );

    let last = sink.latest().expect("at least one update");
    assert!(last.messages[0].interrupted);
    let revisions: Vec<u64> = sink.updates().iter().map(|u| u.revision).collect();
    assert!(revisions.windows(2).all(|w| w[0] < w[1]), "{revisions:?}");

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn updates_are_coalesced_per_frame() {
    let sink = CollectorSink::new();
    let handle = spawn_engine(RevealEngine::new(&Config::default()), sink.clone(), 16);

    // Ten characters inside one 16 ms frame.
    handle
        .send(Signal::Alignment(AlignmentBlock::from_text(
            "abcdefghij",
            (0..10).collect(),
        )))
        .await
        .unwrap();
    handle.settled().await.unwrap();

    let updates = sink.updates();
    assert_eq!(updates.len(), 1, "{updates:?}");
    assert_eq!(updates[0].messages, vec![Message::agent("abcdefghij")]);
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stopped_engine_rejects_signals() {
    let handle = spawn_engine(
        RevealEngine::new(&Config::default()),
        CollectorSink::new(),
        4,
    );
    let sender = handle.sender();
    assert!(handle.shutdown().await.unwrap().is_empty());
    assert!(
        sender
            .send(avatext::EngineCommand::Signal(Signal::Reset))
            .await
            .is_err()
    );
}

#[test]
fn replay_file_round_trip_through_simulation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.jsonl");
    std::fs::write(
        &path,
        concat!(
            "{\"at_ms\":0,\"signal\":{\"type\":\"message\",\"role\":\"user\",\"text\":\"hey\"}}\n",
            "{\"at_ms\":100,\"signal\":{\"type\":\"mode_change\",\"mode\":\"speaking\"}}\n",
            "{\"at_ms\":100,\"signal\":{\"type\":\"alignment\",\"chars\":[\"Y\",\"o\"],\"char_start_times_ms\":[0,100],\"char_durations_ms\":[100,100]}}\n",
            "{\"at_ms\":2000,\"signal\":{\"type\":\"mode_change\",\"mode\":\"listening\"}}\n",
        ),
    )
    .unwrap();

    let script = ReplayScript::load(&path).unwrap();
    let outcome = replay_simulated(&script, &Config::default());

    assert_eq!(
        outcome.transcript,
        vec![Message::user("hey"), Message::agent("Yo")]
    );
    let times: Vec<u64> = outcome.frames.iter().map(|f| f.at_ms).collect();
    assert_eq!(times, [16, 616, 716, 2016]);
}

#[test]
fn render_delay_shifts_every_frame() {
    let script = ReplayScript::new(vec![TimedSignal {
        at_ms: 0,
        signal: Signal::Alignment(AlignmentBlock::from_text("x", vec![0])),
    }]);
    let mut config = Config::default();
    config.reveal.render_delay_ms = 0;

    let outcome = replay_simulated(&script, &config);
    assert_eq!(outcome.frames.len(), 1);
    assert_eq!(outcome.frames[0].at_ms, 16);
}

#[tokio::test(start_paused = true)]
async fn realtime_replay_handles_interrupt_and_next_turn() {
    let script = ReplayScript::new(vec![
        TimedSignal {
            at_ms: 0,
            signal: hello_there(),
        },
        TimedSignal {
            at_ms: 750,
            signal: Signal::Interrupt,
        },
        TimedSignal {
            at_ms: 900,
            signal: Signal::ModeChange {
                mode: Mode::Speaking,
            },
        },
        TimedSignal {
            at_ms: 940,
            signal: Signal::Alignment(AlignmentBlock::from_text("Anyway", vec![0; 6])),
        },
        TimedSignal {
            at_ms: 950,
            signal: Signal::Message {
                role: Role::Agent,
                text: "Anyway.".to_string(),
            },
        },
        TimedSignal {
            at_ms: 1_200,
            signal: Signal::ModeChange {
                mode: Mode::Listening,
            },
        },
    ]);

    let transcript = replay_realtime(&script, &Config::default(), CollectorSink::new())
        .await
        .unwrap();
    assert_eq!(transcript.len(), 2);
    assert!(transcript[0].interrupted);
    assert_eq!(transcript[0].text, "Hel");
    assert_eq!(transcript[1], Message::agent("Anyway."));
}
