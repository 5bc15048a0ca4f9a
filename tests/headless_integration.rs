use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use kombo::combos::{Combo, ComboLibrary, NamedSequence};
use kombo::runtime::{Input, ScriptedEventSource};
use kombo::session::{self, Session};
use kombo::ui::RecordingDisplay;
use kombo::{GameError, Mode, SessionConfig, SessionEnd};
use rand::{rngs::StdRng, SeedableRng};

// Headless integration using the scripted event source instead of a TTY.
// Each test queues keystrokes up front and lets the session consume them.

fn combos(codes: &[&str]) -> Vec<NamedSequence> {
    ComboLibrary::from_combos(
        codes
            .iter()
            .map(|c| Combo {
                name: c.to_string(),
                sequence: c.to_string(),
            })
            .collect(),
    )
    .entries()
    .to_vec()
}

#[test]
fn untimed_library_session_scores_every_symbol() {
    let (script, source) = ScriptedEventSource::new();
    for codes in ["UD", "LR", "UUDD"] {
        script.combo(codes);
    }
    let input = Input::new(source);
    let mut display = RecordingDisplay::new();

    let report = Session::new(Mode::Library, &SessionConfig::default())
        .run(&combos(&["UD", "LR", "UUDD"]), &input, &mut display)
        .unwrap();

    assert_eq!(report.total_score, 20 * 2 + 20 * 2 + 20 * 4);
    assert_eq!(report.end, SessionEnd::Finished);
    assert_eq!(display.titles(), vec!["UD", "LR", "UUDD"]);
}

#[test]
fn shuffled_library_session_plays_whatever_order_was_drawn() {
    let library = ComboLibrary::from_combos(
        ["UD", "LR", "UUDD"]
            .iter()
            .map(|c| Combo {
                name: c.to_string(),
                sequence: c.to_string(),
            })
            .collect(),
    );
    let config = SessionConfig {
        rounds: 10,
        ..Default::default()
    };

    // plan with the same seed twice: once to script the keys, once to play
    let planned =
        session::plan_rounds(Mode::Library, &config, &library, &mut StdRng::seed_from_u64(5))
            .unwrap();
    let (script, source) = ScriptedEventSource::new();
    for round in &planned {
        script.combo(&round.sequence.to_codes());
    }
    let input = Input::new(source);

    let report = session::play(
        Mode::Library,
        &config,
        &library,
        &mut StdRng::seed_from_u64(5),
        &input,
        &mut RecordingDisplay::new(),
    )
    .unwrap();

    assert_eq!(report.rounds_completed, 3);
    assert_eq!(report.total_score, 160);
}

#[test]
fn timed_single_combo_gets_fast_bonus() {
    let (script, source) = ScriptedEventSource::new();
    script.combo("UD");
    let input = Input::new(source);

    let started = Instant::now();
    let report = Session::new(Mode::Timed, &SessionConfig::default())
        .run(&combos(&["UD"]), &input, &mut RecordingDisplay::new())
        .unwrap();

    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(report.total_score, 40 + 100);
}

#[test]
fn timed_session_stops_once_time_is_up() {
    let (script, source) = ScriptedEventSource::new();
    script.combo("UD");
    // a wrong key into the second combo, then silence
    script.key(KeyCode::Right);
    let input = Input::new(source);
    let config = SessionConfig {
        time_limit: Duration::from_millis(400),
        tick: Duration::from_millis(25),
        ..Default::default()
    };
    let mut display = RecordingDisplay::new();

    let report = Session::new(Mode::Timed, &config)
        .run(&combos(&["UD", "LR", "UUDD"]), &input, &mut display)
        .unwrap();

    assert_eq!(report.end, SessionEnd::TimeUp);
    assert_eq!(report.rounds_completed, 1);
    // bonus for round one, partial penalty for round two, nothing else
    assert_eq!(report.total_score, 140 - 5);
    assert_eq!(display.titles(), vec!["UD", "LR"]);
    assert!(display.tick_frames() > 0);
}

#[test]
fn quitting_mid_combo_reports_partial_score() {
    let (script, source) = ScriptedEventSource::new();
    script.keys(&[KeyCode::Up, KeyCode::Up, KeyCode::Char('q')]);
    let input = Input::new(source);

    let report = Session::new(Mode::Library, &SessionConfig::default())
        .run(&combos(&["UDLR"]), &input, &mut RecordingDisplay::new())
        .unwrap();

    assert_eq!(report.end, SessionEnd::Quit);
    assert_eq!(report.total_score, 20 - 5);
}

#[test]
fn broken_input_aborts_the_session() {
    let (script, source) = ScriptedEventSource::new();
    script.combo("LR");
    script.key(KeyCode::Up);
    script.fail("terminal went away");
    let input = Input::new(source);

    let err = Session::new(Mode::Timed, &SessionConfig::default())
        .run(&combos(&["LR", "UD"]), &input, &mut RecordingDisplay::new())
        .unwrap_err();

    assert!(matches!(err, GameError::Aborted { .. }));
    // bonus round plus the Up that made it into the second combo
    assert_eq!(err.banked_score(), 160);
}
