use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::keystroke::KeyInput;

/// What the app loop reacts to
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Anything that can hand the app loop its next input event
pub trait EventSource {
    /// Wait up to `timeout` for the next event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Events arriving over an mpsc channel. The terminal reader feeds one from a
/// background thread; tests and headless drivers feed one directly.
pub struct ChannelEventSource {
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }

    /// A source plus the sender that feeds it
    pub fn pair() -> (Sender<AppEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }

    /// Read crossterm events on a background thread. Only key presses are
    /// forwarded; release and repeat reports would double count on terminals
    /// that send them.
    pub fn terminal() -> Self {
        let (tx, source) = Self::pair();

        thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    tx.send(AppEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(err) => {
                    tracing::warn!(%err, "terminal event stream closed");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        source
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Merges input events with a fixed-rate tick.
///
/// Ticks run off a deadline rather than off idle time, so a steady stream of
/// keys cannot hold them back: once the deadline has passed the next `step`
/// is a tick even if input is waiting. A runner that falls a whole interval
/// behind skips ahead instead of delivering a burst of ticks.
pub struct Runner<E: EventSource> {
    events: E,
    interval: Duration,
    next_tick: Instant,
    closed: bool,
}

impl<E: EventSource> Runner<E> {
    pub fn new(events: E, interval: Duration) -> Self {
        Self {
            events,
            interval,
            next_tick: Instant::now() + interval,
            closed: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until the next event or the tick deadline, whichever is first
    pub fn step(&mut self) -> AppEvent {
        let now = Instant::now();
        if now < self.next_tick {
            let wait = self.next_tick - now;
            if self.closed {
                thread::sleep(wait);
            } else {
                match self.events.recv_timeout(wait) {
                    Ok(event) => return event,
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        tracing::debug!("event source closed, ticking only");
                        self.closed = true;
                        thread::sleep(self.next_tick.saturating_duration_since(Instant::now()));
                    }
                }
            }
        }

        self.schedule_next(Instant::now());
        AppEvent::Tick
    }

    fn schedule_next(&mut self, now: Instant) {
        self.next_tick += self.interval;
        if self.next_tick <= now {
            self.next_tick = now + self.interval;
        }
    }
}

impl From<&KeyEvent> for KeyInput {
    fn from(key: &KeyEvent) -> Self {
        match key.code {
            KeyCode::Char(_)
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                KeyInput::Control
            }
            KeyCode::Char(c) if !c.is_control() => KeyInput::Char(c),
            KeyCode::Backspace => KeyInput::Backspace,
            _ => KeyInput::Control,
        }
    }
}
