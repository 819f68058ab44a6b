use crate::effects::Effect;
use crate::metrics;
use crate::session::{SessionState, Verdict};
use std::time::Instant;

const CONTROL_KEY_NAMES: &[&str] = &[
    "Shift", "Control", "Alt", "AltGraph", "Meta", "OS", "Super", "Hyper", "Fn", "CapsLock",
    "NumLock", "ScrollLock", "Enter", "Escape", "Tab", "Delete", "Insert", "Home", "End",
    "PageUp", "PageDown", "ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight", "ContextMenu",
    "PrintScreen", "Pause",
];

/// A key press as the session core sees it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyInput {
    /// A single code point to judge against the target text
    Char(char),
    Backspace,
    /// Modifiers, navigation, function keys and the like
    Control,
    /// Multi code point input such as a composed sequence
    Composed,
}

impl KeyInput {
    /// Classify a DOM style key name ("a", " ", "Backspace", "ArrowLeft", ...)
    pub fn from_name(name: &str) -> Self {
        if name == "Backspace" {
            return KeyInput::Backspace;
        }

        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => KeyInput::Char(c),
            (Some(_), None) => KeyInput::Control,
            _ if is_control_name(name) => KeyInput::Control,
            _ => KeyInput::Composed,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, KeyInput::Control | KeyInput::Composed)
    }
}

fn is_control_name(name: &str) -> bool {
    if CONTROL_KEY_NAMES.contains(&name) {
        return true;
    }
    // F1 .. F24
    name.strip_prefix('F')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Apply one key press to the session. Ignored keys and anything arriving
/// after the session finished produce no change and no effects.
pub fn process_key(state: &mut SessionState, key: &KeyInput, now: Instant) -> Vec<Effect> {
    if state.finished {
        return Vec::new();
    }

    match key {
        KeyInput::Char(c) => judge(state, *c, now),
        KeyInput::Backspace => retract(state, now),
        KeyInput::Control | KeyInput::Composed => Vec::new(),
    }
}

fn judge(state: &mut SessionState, c: char, now: Instant) -> Vec<Effect> {
    let mut effects = Vec::new();

    if state.cursor >= state.len() {
        effects.extend(state.finish(now));
        return effects;
    }

    if state.started_at.is_none() {
        state.started_at = Some(now);
        tracing::info!(
            chars = state.len(),
            duration_secs = state.duration_secs,
            "session started"
        );
    }

    state.keys_pressed += 1;

    let idx = state.cursor;
    let cell = &mut state.cells[idx];
    cell.verdict = if c == cell.expected {
        state.correct_count += 1;
        Verdict::Correct
    } else {
        state.incorrect_count += 1;
        Verdict::Incorrect
    };
    let verdict = cell.verdict;
    state.cursor += 1;

    let live = metrics::live(state, now);
    effects.push(Effect::CellVerdictChanged {
        index: idx,
        verdict,
    });
    effects.push(Effect::CursorMoved(state.cursor));
    effects.push(Effect::LiveMetricsUpdated(live));

    let velocity = metrics::is_velocity(live.wpm);
    if velocity != state.velocity_active {
        state.velocity_active = velocity;
        effects.push(Effect::VelocityChanged(velocity));
    }

    if state.cursor == state.len() {
        effects.extend(state.finish(now));
    }

    effects
}

fn retract(state: &mut SessionState, now: Instant) -> Vec<Effect> {
    if state.cursor == 0 {
        return Vec::new();
    }

    state.cursor -= 1;
    let idx = state.cursor;
    match state.cells[idx].verdict {
        Verdict::Correct => state.correct_count = state.correct_count.saturating_sub(1),
        Verdict::Incorrect => state.incorrect_count = state.incorrect_count.saturating_sub(1),
        Verdict::Untested => {}
    }
    state.cells[idx].verdict = Verdict::Untested;
    state.keys_pressed = state.keys_pressed.saturating_sub(1);

    vec![
        Effect::CellVerdictChanged {
            index: idx,
            verdict: Verdict::Untested,
        },
        Effect::CursorMoved(state.cursor),
        Effect::LiveMetricsUpdated(metrics::live(state, now)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::LiveMetrics;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn type_all(state: &mut SessionState, keys: &[&str], start: Instant) -> Vec<Effect> {
        keys.iter()
            .enumerate()
            .flat_map(|(i, k)| {
                let now = start + Duration::from_millis(200 * i as u64);
                process_key(state, &KeyInput::from_name(k), now)
            })
            .collect()
    }

    #[test]
    fn test_classify_names() {
        assert_eq!(KeyInput::from_name("a"), KeyInput::Char('a'));
        assert_eq!(KeyInput::from_name(" "), KeyInput::Char(' '));
        assert_eq!(KeyInput::from_name("é"), KeyInput::Char('é'));
        assert_eq!(KeyInput::from_name("Backspace"), KeyInput::Backspace);
        assert_eq!(KeyInput::from_name("Shift"), KeyInput::Control);
        assert_eq!(KeyInput::from_name("Enter"), KeyInput::Control);
        assert_eq!(KeyInput::from_name("F12"), KeyInput::Control);
        assert_eq!(KeyInput::from_name("\t"), KeyInput::Control);
        assert_eq!(KeyInput::from_name("e\u{301}"), KeyInput::Composed);
        assert_eq!(KeyInput::from_name(""), KeyInput::Composed);
    }

    #[test]
    fn test_all_correct() {
        let mut state = SessionState::new("abc", 30);
        type_all(&mut state, &["a", "b", "c"], Instant::now());

        assert_eq!(state.correct_count, 3);
        assert_eq!(state.incorrect_count, 0);
        assert!(state.finished);
        assert_eq!(state.final_metrics.unwrap().accuracy, 100);
    }

    #[test]
    fn test_one_mistake() {
        let mut state = SessionState::new("abc", 30);
        type_all(&mut state, &["a", "x", "c"], Instant::now());

        assert_eq!(state.correct_count, 2);
        assert_eq!(state.incorrect_count, 1);
        assert_eq!(state.cells[1].verdict, Verdict::Incorrect);
        assert_eq!(state.final_metrics.unwrap().accuracy, 67);
    }

    #[test]
    fn test_backspace_undoes_judgment() {
        let mut state = SessionState::new("ab", 30);
        type_all(&mut state, &["a", "Backspace"], Instant::now());

        assert_eq!(state.cursor, 0);
        assert_eq!(state.correct_count, 0);
        assert_eq!(state.keys_pressed, 0);
        assert_eq!(state.cells[0].verdict, Verdict::Untested);
        // still started; the clock keeps running
        assert!(state.has_started());
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut state = SessionState::new("ab", 30);
        let effects = process_key(&mut state, &KeyInput::Backspace, Instant::now());

        assert!(effects.is_empty());
        assert_eq!(state.cursor, 0);
        assert!(!state.has_started());
    }

    #[test]
    fn test_space_is_judged() {
        let mut state = SessionState::new("a b", 30);
        type_all(&mut state, &["a", "x"], Instant::now());
        assert_eq!(state.cells[1].verdict, Verdict::Incorrect);
    }

    #[test]
    fn test_forward_effects_in_order() {
        let mut state = SessionState::new("ab", 30);
        let effects = process_key(&mut state, &KeyInput::Char('a'), Instant::now());

        assert_eq!(effects.len(), 3);
        assert_matches!(
            effects[0],
            Effect::CellVerdictChanged {
                index: 0,
                verdict: Verdict::Correct
            }
        );
        assert_matches!(effects[1], Effect::CursorMoved(1));
        assert_matches!(
            effects[2],
            Effect::LiveMetricsUpdated(LiveMetrics { accuracy: 100, .. })
        );
    }

    #[test]
    fn test_ignored_keys_change_nothing() {
        let mut state = SessionState::new("ab", 30);
        for name in ["Shift", "Tab", "Escape", "ArrowLeft", "e\u{301}"] {
            let effects = process_key(&mut state, &KeyInput::from_name(name), Instant::now());
            assert!(effects.is_empty());
        }
        assert!(!state.has_started());
        assert_eq!(state.keys_pressed, 0);
    }

    #[test]
    fn test_keys_after_finish_discarded() {
        let mut state = SessionState::new("a", 30);
        let start = Instant::now();
        let effects = process_key(&mut state, &KeyInput::Char('a'), start);
        assert_matches!(effects.last(), Some(Effect::SessionFinished { .. }));

        let later = start + Duration::from_secs(1);
        assert!(process_key(&mut state, &KeyInput::Char('z'), later).is_empty());
        assert!(process_key(&mut state, &KeyInput::Backspace, later).is_empty());
        assert_eq!(state.keys_pressed, 1);
        assert_eq!(state.cursor, 1);
    }

    #[test]
    fn test_empty_text_finishes_on_first_key() {
        let mut state = SessionState::new("", 30);
        let effects = process_key(&mut state, &KeyInput::Char('a'), Instant::now());

        assert_matches!(effects.as_slice(), [Effect::SessionFinished { .. }]);
        assert!(state.finished);
        assert_eq!(state.keys_pressed, 0);
    }

    #[test]
    fn test_velocity_flag_toggles_on_change_only() {
        let text = "a".repeat(40);
        let mut state = SessionState::new(&text, 60);
        let start = Instant::now();

        // 20 correct chars in 2s is 120 wpm
        let mut flips = Vec::new();
        for i in 0..20u64 {
            let now = start + Duration::from_millis(100 * (i + 1));
            for effect in process_key(&mut state, &KeyInput::Char('a'), now) {
                if let Effect::VelocityChanged(active) = effect {
                    flips.push(active);
                }
            }
        }
        assert_eq!(flips, vec![true]);
        assert!(state.velocity_active);
    }

    #[test]
    fn test_velocity_not_recomputed_on_backspace() {
        let text = "a".repeat(10);
        let mut state = SessionState::new(&text, 60);
        let start = Instant::now();
        process_key(&mut state, &KeyInput::Char('a'), start);
        process_key(&mut state, &KeyInput::Char('a'), start + Duration::from_millis(100));
        assert!(state.velocity_active);

        let later = start + Duration::from_secs(30);
        let effects = process_key(&mut state, &KeyInput::Backspace, later);
        assert!(!effects.iter().any(|e| matches!(e, Effect::VelocityChanged(_))));
        assert!(state.velocity_active);
    }
}
