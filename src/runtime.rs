use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum WheelEvent {
    Key(KeyEvent),
    /// Bracketed paste, used by the name editor.
    Paste(String),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, paste, resize)
pub trait WheelEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<WheelEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<WheelEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Release/repeat events would double every keystroke on Windows.
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    Some(WheelEvent::Key(key))
                }
                Ok(CtEvent::Paste(text)) => Some(WheelEvent::Paste(text)),
                Ok(CtEvent::Resize(_, _)) => Some(WheelEvent::Resize),
                Ok(_) => None,
                Err(_) => break,
            };
            if let Some(ev) = forwarded {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WheelEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<WheelEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// How long to wait for input before producing a Tick.
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self, animating: bool) -> Duration;
}

/// Same interval whether or not anything is moving
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self, _animating: bool) -> Duration {
        self.interval
    }
}

/// Smooth frames while the wheel turns, slow polling while it rests.
#[derive(Clone, Copy, Debug)]
pub struct FrameTicker {
    pub active: Duration,
    pub idle: Duration,
}

impl Default for FrameTicker {
    fn default() -> Self {
        Self {
            active: Duration::from_millis(33),
            idle: Duration::from_millis(100),
        }
    }
}

impl Ticker for FrameTicker {
    fn interval(&self, animating: bool) -> Duration {
        if animating {
            self.active
        } else {
            self.idle
        }
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<WheelEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<WheelEvent>) -> Self {
        Self { rx }
    }
}

impl WheelEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<WheelEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: WheelEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: WheelEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to one tick interval and returns the next event, or Tick on timeout
    pub fn step(&self, animating: bool) -> WheelEvent {
        match self
            .event_source
            .recv_timeout(self.ticker.interval(animating))
        {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                WheelEvent::Tick
            }
        }
    }
}
