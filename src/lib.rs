// Library surface shared by the binary and the headless/integration tests.
pub mod clock;
pub mod config;
pub mod controller;
pub mod effects;
pub mod error;
pub mod keystroke;
pub mod metrics;
pub mod runtime;
pub mod session;
pub mod text_generator;
pub mod time_series;
pub mod ui;

pub use controller::{SessionController, TICK_RATE_MS};
pub use effects::{Effect, EffectSink};
pub use keystroke::KeyInput;
