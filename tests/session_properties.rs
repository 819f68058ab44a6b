use proptest::prelude::*;
use std::time::{Duration, Instant};
use typedash::keystroke::{process_key, KeyInput};
use typedash::metrics;
use typedash::session::{SessionState, Verdict};

// --- STRATEGIES ---

fn arb_key() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        6 => prop::sample::select(vec!['a', 'b', 'c', ' ', 'x']).prop_map(KeyInput::Char),
        2 => Just(KeyInput::Backspace),
        1 => Just(KeyInput::Control),
        1 => Just(KeyInput::Composed),
    ]
}

prop_compose! {
    fn arb_session()(
        text in "[abc ]{0,24}",
        keys in proptest::collection::vec(arb_key(), 0..60),
        step_ms in 1u64..400
    ) -> (String, Vec<KeyInput>, u64) {
        (text, keys, step_ms)
    }
}

fn assert_consistent(state: &SessionState) {
    let correct = state.cells.iter().filter(|c| c.verdict == Verdict::Correct).count();
    let incorrect = state.cells.iter().filter(|c| c.verdict == Verdict::Incorrect).count();

    assert_eq!(state.correct_count, correct);
    assert_eq!(state.incorrect_count, incorrect);
    assert_eq!(state.cursor, state.correct_count + state.incorrect_count);
    assert!(state.correct_count + state.incorrect_count <= state.len());
    assert!(state.cells[state.cursor..]
        .iter()
        .all(|c| c.verdict == Verdict::Untested));
    assert!(state.cells[..state.cursor]
        .iter()
        .all(|c| c.verdict != Verdict::Untested));
}

proptest! {
    #[test]
    fn counters_track_verdicts((text, keys, step_ms) in arb_session()) {
        let start = Instant::now();
        let mut state = SessionState::new(&text, 60);
        for (i, key) in keys.iter().enumerate() {
            let now = start + Duration::from_millis(step_ms * i as u64);
            process_key(&mut state, key, now);
            assert_consistent(&state);
        }
    }

    #[test]
    fn keys_pressed_matches_judged_cells((text, keys, step_ms) in arb_session()) {
        let start = Instant::now();
        let mut state = SessionState::new(&text, 60);
        for (i, key) in keys.iter().enumerate() {
            process_key(&mut state, key, start + Duration::from_millis(step_ms * i as u64));
            prop_assert_eq!(state.keys_pressed, state.correct_count + state.incorrect_count);
        }
    }

    #[test]
    fn accuracy_stays_in_bounds((text, keys, step_ms) in arb_session()) {
        let start = Instant::now();
        let mut state = SessionState::new(&text, 60);
        let now = |i: usize| start + Duration::from_millis(step_ms * i as u64);
        prop_assert_eq!(metrics::live(&state, start).accuracy, 100);

        for (i, key) in keys.iter().enumerate() {
            process_key(&mut state, key, now(i));
            let live = metrics::live(&state, now(i));
            prop_assert!(live.accuracy <= 100);
            if state.keys_pressed == 0 {
                prop_assert_eq!(live.accuracy, 100);
            }
        }
    }

    #[test]
    fn judgment_then_backspace_round_trips(
        (text, keys, step_ms) in arb_session(),
        typed in prop::char::any()
    ) {
        let start = Instant::now();
        // padding keeps the cursor well away from the end of the text
        let mut state = SessionState::new(&format!("{text}{}", "z".repeat(64)), 60);
        for (i, key) in keys.iter().enumerate() {
            process_key(&mut state, key, start + Duration::from_millis(step_ms * i as u64));
        }
        prop_assume!(!state.finished && state.cursor + 1 < state.len());

        let before = (state.cursor, state.correct_count, state.incorrect_count, state.keys_pressed);
        let later = start + Duration::from_secs(600);
        process_key(&mut state, &KeyInput::Char(typed), later);
        process_key(&mut state, &KeyInput::Backspace, later);
        let after = (state.cursor, state.correct_count, state.incorrect_count, state.keys_pressed);

        prop_assert_eq!(before, after);
    }

    #[test]
    fn samples_strictly_increase(ticks in proptest::collection::vec(1u64..2_500, 1..80)) {
        let start = Instant::now();
        let mut state = SessionState::new("abc", 30);
        state.started_at = Some(start);
        let mut now = start;
        for dt in ticks {
            now += Duration::from_millis(dt);
            metrics::record_sample(&mut state, now);
        }
        for pair in state.samples.windows(2) {
            prop_assert!(pair[0].elapsed_second < pair[1].elapsed_second);
        }
        prop_assert!(state.samples.iter().all(|s| s.elapsed_second >= 1 && s.elapsed_second <= 30));
    }
}
