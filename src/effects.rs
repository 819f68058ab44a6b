use crate::metrics::{FinalMetrics, LiveMetrics};
use crate::session::Verdict;
use crate::time_series::PerformanceSample;

/// Instructions from the session core to whatever renders it.
/// Returned in order from the call that caused them.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CursorMoved(usize),
    CellVerdictChanged {
        index: usize,
        verdict: Verdict,
    },
    LiveMetricsUpdated(LiveMetrics),
    VelocityChanged(bool),
    SessionFinished {
        metrics: FinalMetrics,
        samples: Vec<PerformanceSample>,
    },
    SessionReset {
        target_text: String,
    },
}

/// Anything that consumes effects, e.g. a view model
pub trait EffectSink {
    fn apply(&mut self, effect: &Effect);

    fn apply_all(&mut self, effects: &[Effect]) {
        for effect in effects {
            self.apply(effect);
        }
    }
}

impl EffectSink for Vec<Effect> {
    fn apply(&mut self, effect: &Effect) {
        self.push(effect.clone());
    }
}
