//! WPM, accuracy and the per-second performance sampler.
//!
//! Everything here is a pure function of counters and instants so the numbers
//! can be checked without a running session.

use crate::session::SessionState;
use crate::time_series::PerformanceSample;
use std::time::{Duration, Instant};

/// Standard word length used for WPM
pub const CHARS_PER_WORD: f64 = 5.0;

/// Net WPM at or above which velocity mode switches on
pub const VELOCITY_THRESHOLD_WPM: u32 = 80;

/// Metrics shown while a test is in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveMetrics {
    pub wpm: u32,
    pub accuracy: u32,
    pub remaining_secs: f64,
}

/// Frozen summary of a completed test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalMetrics {
    pub wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
    pub correct: usize,
    pub incorrect: usize,
    pub judged: usize,
    /// whole seconds, capped at the configured duration
    pub elapsed_secs: u32,
    /// standard deviation of the sampled wpm
    pub consistency: f64,
}

pub fn elapsed(started_at: Option<Instant>, now: Instant) -> Duration {
    started_at
        .map(|start| now.saturating_duration_since(start))
        .unwrap_or(Duration::ZERO)
}

pub fn elapsed_minutes(started_at: Option<Instant>, now: Instant) -> f64 {
    elapsed(started_at, now).as_millis() as f64 / 60_000.0
}

fn words_per_minute(chars: usize, minutes: f64) -> u32 {
    if minutes > 0.0 {
        (chars as f64 / CHARS_PER_WORD / minutes).round() as u32
    } else {
        0
    }
}

/// Net WPM: correct characters only
pub fn net_wpm(correct: usize, minutes: f64) -> u32 {
    words_per_minute(correct, minutes)
}

/// Raw WPM: every judged character, right or wrong
pub fn raw_wpm(judged: usize, minutes: f64) -> u32 {
    words_per_minute(judged, minutes)
}

/// Percentage of accepted keystrokes that were correct, 100 before any input
pub fn accuracy(correct: usize, keys_pressed: usize) -> u32 {
    if keys_pressed == 0 {
        return 100;
    }
    ((100.0 * correct as f64 / keys_pressed as f64).round() as u32).min(100)
}

pub fn is_velocity(wpm: u32) -> bool {
    wpm >= VELOCITY_THRESHOLD_WPM
}

pub fn remaining_secs(duration_secs: u32, started_at: Option<Instant>, now: Instant) -> f64 {
    (duration_secs as f64 - elapsed(started_at, now).as_secs_f64()).max(0.0)
}

pub fn live(state: &SessionState, now: Instant) -> LiveMetrics {
    let minutes = elapsed_minutes(state.started_at, now);
    LiveMetrics {
        wpm: net_wpm(state.correct_count, minutes),
        accuracy: accuracy(state.correct_count, state.keys_pressed),
        remaining_secs: remaining_secs(state.duration_secs, state.started_at, now),
    }
}

/// The sample owed at `now`, if the whole elapsed second (clamped to the
/// configured duration) has not been sampled yet.
pub fn sample_due(state: &SessionState, now: Instant) -> Option<PerformanceSample> {
    state.started_at?;

    let whole = (elapsed(state.started_at, now).as_secs() as u32).min(state.duration_secs);
    if whole == 0 {
        return None;
    }
    if let Some(last) = state.samples.last() {
        if whole <= last.elapsed_second {
            return None;
        }
    }

    let metrics = live(state, now);
    Some(PerformanceSample::new(whole, metrics.wpm, metrics.accuracy))
}

/// Append the owed sample, if any. Returns whether one was taken.
pub fn record_sample(state: &mut SessionState, now: Instant) -> bool {
    match sample_due(state, now) {
        Some(sample) => {
            state.samples.push(sample);
            true
        }
        None => false,
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        None
    } else {
        Some(data.iter().sum::<f64>() / data.len() as f64)
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;
    Some(variance.sqrt())
}

/// Final numbers for a finished session.
///
/// `wpm` and `raw_wpm` divide by the elapsed time capped at the configured
/// duration, not by the raw `now - started_at`, so a budget tick that lands
/// after the deadline does not dilute the score. Keys after the deadline are
/// never judged, so the counters and the capped time cover the same window.
pub fn finalize(state: &SessionState, now: Instant) -> FinalMetrics {
    let limit = Duration::from_secs(state.duration_secs as u64);
    let elapsed = elapsed(state.started_at, now).min(limit);
    let minutes = elapsed.as_millis() as f64 / 60_000.0;
    let judged = state.correct_count + state.incorrect_count;

    let wpms: Vec<f64> = state.samples.iter().map(|s| s.wpm as f64).collect();
    let consistency = if wpms.len() > 1 {
        std_dev(&wpms).unwrap_or(0.0)
    } else {
        0.0
    };

    FinalMetrics {
        wpm: net_wpm(state.correct_count, minutes),
        raw_wpm: raw_wpm(judged, minutes),
        accuracy: accuracy(state.correct_count, state.keys_pressed),
        correct: state.correct_count,
        incorrect: state.incorrect_count,
        judged,
        elapsed_secs: (elapsed.as_secs_f64().round() as u32).min(state.duration_secs),
        consistency,
    }
}
