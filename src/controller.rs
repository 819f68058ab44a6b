use crate::clock::{Clock, SystemClock};
use crate::effects::Effect;
use crate::keystroke::{self, KeyInput};
use crate::metrics::{self, LiveMetrics};
use crate::session::{self, Phase, SessionState, Verdict};
use crate::text_generator::TextGenerator;
use std::time::{Duration, Instant};

/// Nominal cadence of both periodic tasks
pub const TICK_RATE_MS: u64 = 100;

pub fn tick_interval() -> Duration {
    Duration::from_millis(TICK_RATE_MS)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum TaskKind {
    /// Keeps the displayed wpm/accuracy/timer moving between keystrokes
    LiveMetrics,
    /// Checks the time budget, takes per-second samples and ends timed tests
    TimeBudget,
}

/// A periodic task scheduled for one particular session generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickHandle {
    pub generation: u64,
    pub kind: TaskKind,
}

/// Tracks which periodic tasks are live. Every cancel bumps the generation so
/// handles issued before it can never act again.
#[derive(Debug, Default)]
pub struct Scheduler {
    generation: u64,
    active: Vec<TickHandle>,
}

impl Scheduler {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active(&self) -> &[TickHandle] {
        &self.active
    }

    pub fn is_running(&self) -> bool {
        !self.active.is_empty()
    }

    fn start(&mut self) {
        self.active = [TaskKind::LiveMetrics, TaskKind::TimeBudget]
            .into_iter()
            .map(|kind| TickHandle {
                generation: self.generation,
                kind,
            })
            .collect();
    }

    fn cancel_all(&mut self) {
        self.active.clear();
        self.generation += 1;
    }

    pub fn is_current(&self, handle: &TickHandle) -> bool {
        handle.generation == self.generation && self.active.contains(handle)
    }
}

/// Owns the session and drives it through Idle -> Running -> Finished
pub struct SessionController<C: Clock = SystemClock> {
    clock: C,
    generator: TextGenerator,
    state: SessionState,
    scheduler: Scheduler,
}

impl SessionController<SystemClock> {
    pub fn new(generator: TextGenerator, duration_secs: u32) -> Self {
        Self::with_clock(SystemClock, generator, duration_secs)
    }
}

impl<C: Clock> SessionController<C> {
    /// An out of range duration falls back to the default.
    pub fn with_clock(clock: C, mut generator: TextGenerator, duration_secs: u32) -> Self {
        let duration_secs = if session::is_valid_duration(duration_secs) {
            duration_secs
        } else {
            session::DEFAULT_DURATION_SECS
        };
        let text = generator.generate(duration_secs);

        Self {
            clock,
            generator,
            state: SessionState::new(&text, duration_secs),
            scheduler: Scheduler::default(),
        }
    }

    /// Start a session on a fixed text instead of a generated one
    pub fn with_text(clock: C, generator: TextGenerator, text: &str, duration_secs: u32) -> Self {
        let mut controller = Self::with_clock(clock, generator, duration_secs);
        controller.state = SessionState::new(text, controller.state.duration_secs);
        controller
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn duration_secs(&self) -> u32 {
        self.state.duration_secs
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn generation(&self) -> u64 {
        self.scheduler.generation()
    }

    /// Handles of the tasks that should currently receive ticks
    pub fn active_tasks(&self) -> Vec<TickHandle> {
        self.scheduler.active().to_vec()
    }

    pub fn live_metrics(&self) -> LiveMetrics {
        metrics::live(&self.state, self.clock.now())
    }

    /// Change the test length. Out of range values are ignored; a valid one
    /// restarts the session with text sized for the new duration.
    pub fn configure(&mut self, duration_secs: u32) -> Vec<Effect> {
        if !session::is_valid_duration(duration_secs) {
            tracing::debug!(
                duration_secs,
                current = self.state.duration_secs,
                "rejected duration outside {}..={}",
                session::MIN_DURATION_SECS,
                session::MAX_DURATION_SECS
            );
            return Vec::new();
        }

        tracing::info!(duration_secs, phase = %self.phase(), "duration configured");
        self.state.duration_secs = duration_secs;
        self.request_restart()
    }

    pub fn submit_key(&mut self, key: &KeyInput) -> Vec<Effect> {
        let now = self.clock.now();
        self.submit_key_at(key, now)
    }

    /// A key that lands after the time budget ran out is not judged; it ends
    /// the session the way the overdue budget tick would have.
    pub fn submit_key_at(&mut self, key: &KeyInput, at: Instant) -> Vec<Effect> {
        if self.phase() == Phase::Running && self.state.time_is_up(at) {
            tracing::debug!(generation = self.scheduler.generation(), "key after time budget");
            let effects: Vec<Effect> = self.state.finish(at).into_iter().collect();
            self.scheduler.cancel_all();
            return effects;
        }

        let was_idle = self.phase() == Phase::Idle;
        let effects = keystroke::process_key(&mut self.state, key, at);

        match self.phase() {
            Phase::Running if was_idle => self.scheduler.start(),
            Phase::Finished if self.scheduler.is_running() => self.scheduler.cancel_all(),
            _ => {}
        }

        effects
    }

    /// Throw the current session away and start over with fresh text
    pub fn request_restart(&mut self) -> Vec<Effect> {
        self.scheduler.cancel_all();

        let duration_secs = self.state.duration_secs;
        let text = self.generator.generate(duration_secs);
        self.state = SessionState::new(&text, duration_secs);

        tracing::info!(
            generation = self.scheduler.generation(),
            chars = self.state.len(),
            duration_secs,
            "session reset"
        );

        vec![
            Effect::SessionReset { target_text: text },
            Effect::CursorMoved(0),
            Effect::LiveMetricsUpdated(metrics::live(&self.state, self.clock.now())),
            Effect::VelocityChanged(false),
        ]
    }

    pub fn tick(&mut self, handle: TickHandle) -> Vec<Effect> {
        let now = self.clock.now();
        self.tick_at(handle, now)
    }

    /// Run one periodic task. Handles from a cancelled generation do nothing.
    pub fn tick_at(&mut self, handle: TickHandle, at: Instant) -> Vec<Effect> {
        if !self.scheduler.is_current(&handle) {
            tracing::trace!(
                kind = %handle.kind,
                handle_generation = handle.generation,
                generation = self.scheduler.generation(),
                "ignoring stale tick"
            );
            return Vec::new();
        }

        match handle.kind {
            TaskKind::LiveMetrics => {
                vec![Effect::LiveMetricsUpdated(metrics::live(&self.state, at))]
            }
            TaskKind::TimeBudget => {
                metrics::record_sample(&mut self.state, at);
                if !self.state.time_is_up(at) {
                    return Vec::new();
                }
                let effects: Vec<Effect> = self.state.finish(at).into_iter().collect();
                self.scheduler.cancel_all();
                effects
            }
        }
    }

    /// Effects that redraw the current session from scratch. Takes `&self`, so
    /// redrawing after a resize can never disturb the session.
    pub fn replay(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::SessionReset {
            target_text: self.state.target_text(),
        }];

        effects.extend(
            self.state
                .cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell.verdict != Verdict::Untested)
                .map(|(index, cell)| Effect::CellVerdictChanged {
                    index,
                    verdict: cell.verdict,
                }),
        );
        effects.push(Effect::CursorMoved(self.state.cursor));
        effects.push(Effect::LiveMetricsUpdated(self.live_metrics()));
        effects.push(Effect::VelocityChanged(self.state.velocity_active));

        if let Some(metrics) = self.state.final_metrics {
            effects.push(Effect::SessionFinished {
                metrics,
                samples: self.state.samples.clone(),
            });
        }

        effects
    }
}
