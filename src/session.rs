use crate::effects::Effect;
use crate::metrics::{self, FinalMetrics};
use crate::time_series::PerformanceSample;
use std::time::Instant;

pub const MIN_DURATION_SECS: u32 = 5;
pub const MAX_DURATION_SECS: u32 = 300;
pub const DEFAULT_DURATION_SECS: u32 = 60;

pub fn is_valid_duration(secs: u32) -> bool {
    (MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&secs)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Verdict {
    Untested,
    Correct,
    Incorrect,
}

/// One position of the target text
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacterCell {
    pub expected: char,
    pub verdict: Verdict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

/// Authoritative record of one typing test
#[derive(Debug, Clone)]
pub struct SessionState {
    pub cells: Vec<CharacterCell>,
    pub cursor: usize,
    pub started_at: Option<Instant>,
    pub finished: bool,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub keys_pressed: usize,
    pub duration_secs: u32,
    pub samples: Vec<PerformanceSample>,
    pub velocity_active: bool,
    pub final_metrics: Option<FinalMetrics>,
}

impl SessionState {
    pub fn new(target_text: &str, duration_secs: u32) -> Self {
        Self {
            cells: target_text
                .chars()
                .map(|expected| CharacterCell {
                    expected,
                    verdict: Verdict::Untested,
                })
                .collect(),
            cursor: 0,
            started_at: None,
            finished: false,
            correct_count: 0,
            incorrect_count: 0,
            keys_pressed: 0,
            duration_secs,
            samples: Vec::new(),
            velocity_active: false,
            final_metrics: None,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn target_text(&self) -> String {
        self.cells.iter().map(|c| c.expected).collect()
    }

    pub fn expected_at(&self, idx: usize) -> Option<char> {
        self.cells.get(idx).map(|c| c.expected)
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn phase(&self) -> Phase {
        match (self.started_at, self.finished) {
            (_, true) => Phase::Finished,
            (Some(_), false) => Phase::Running,
            (None, false) => Phase::Idle,
        }
    }

    pub fn judged(&self) -> usize {
        self.correct_count + self.incorrect_count
    }

    /// Whether the configured time has run out at `now`
    pub fn time_is_up(&self, now: Instant) -> bool {
        self.started_at.is_some()
            && metrics::elapsed(self.started_at, now).as_secs_f64() >= self.duration_secs as f64
    }

    /// Enter the terminal state: take the last owed sample, freeze the final
    /// metrics and report them. Calling it again is a no-op.
    pub fn finish(&mut self, now: Instant) -> Option<Effect> {
        if self.finished {
            return None;
        }
        self.finished = true;

        metrics::record_sample(self, now);
        let final_metrics = metrics::finalize(self, now);
        self.final_metrics = Some(final_metrics);

        tracing::info!(
            wpm = final_metrics.wpm,
            raw_wpm = final_metrics.raw_wpm,
            accuracy = final_metrics.accuracy,
            elapsed_secs = final_metrics.elapsed_secs,
            samples = self.samples.len(),
            "session finished"
        );

        Some(Effect::SessionFinished {
            metrics: final_metrics,
            samples: self.samples.clone(),
        })
    }
}
