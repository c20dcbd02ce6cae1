use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

/// Logical sound assets. The backend decides what they map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Cue {
    #[strum(serialize = "spin-loop")]
    SpinLoop,
    #[strum(serialize = "result")]
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("playback blocked: {0}")]
    Blocked(String),
    #[error("cue {0} is not available on this backend")]
    Unsupported(Cue),
    #[error("audio output failed: {0}")]
    Output(String),
}

/// Platform seam for sound output.
pub trait AudioBackend {
    /// Start `cue` looping from the beginning.
    fn start_loop(&mut self, cue: Cue, volume: f32, rate: f32) -> Result<(), AudioError>;
    fn set_rate(&mut self, cue: Cue, rate: f32) -> Result<(), AudioError>;
    /// Stop `cue` and rewind it.
    fn stop(&mut self, cue: Cue) -> Result<(), AudioError>;
    fn play_once(&mut self, cue: Cue, volume: f32) -> Result<(), AudioError>;
}

/// Produces no sound at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioBackend for SilentAudio {
    fn start_loop(&mut self, _cue: Cue, _volume: f32, _rate: f32) -> Result<(), AudioError> {
        Ok(())
    }

    fn set_rate(&mut self, _cue: Cue, _rate: f32) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&mut self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }

    fn play_once(&mut self, _cue: Cue, _volume: f32) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Rings the terminal bell for the result cue. Loops are not possible.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl AudioBackend for TerminalBell {
    fn start_loop(&mut self, cue: Cue, _volume: f32, _rate: f32) -> Result<(), AudioError> {
        Err(AudioError::Unsupported(cue))
    }

    fn set_rate(&mut self, cue: Cue, _rate: f32) -> Result<(), AudioError> {
        Err(AudioError::Unsupported(cue))
    }

    fn stop(&mut self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }

    fn play_once(&mut self, cue: Cue, _volume: f32) -> Result<(), AudioError> {
        if cue != Cue::Result {
            return Err(AudioError::Unsupported(cue));
        }
        let mut out = std::io::stdout();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|e| AudioError::Output(e.to_string()))
    }
}

/// One recorded backend call, for assertions in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    StartLoop { cue: Cue, volume: f32, rate: f32 },
    SetRate { cue: Cue, rate: f32 },
    Stop { cue: Cue },
    PlayOnce { cue: Cue, volume: f32 },
}

/// Records every call; optionally refuses loops or one-shots like a browser
/// with autoplay restrictions would.
///
/// Clones share one call log, so a test can keep a handle after giving the
/// backend away.
#[derive(Debug, Default, Clone)]
pub struct MemoryAudio {
    log: Rc<RefCell<Vec<AudioCall>>>,
    pub block_loops: bool,
    pub block_one_shots: bool,
}

impl MemoryAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocking() -> Self {
        Self {
            block_loops: true,
            block_one_shots: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.log.borrow().clone()
    }

    pub fn rates(&self) -> Vec<f32> {
        self.log
            .borrow()
            .iter()
            .filter_map(|c| match c {
                AudioCall::SetRate { rate, .. } => Some(*rate),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: AudioCall) {
        self.log.borrow_mut().push(call);
    }
}

impl AudioBackend for MemoryAudio {
    fn start_loop(&mut self, cue: Cue, volume: f32, rate: f32) -> Result<(), AudioError> {
        self.push(AudioCall::StartLoop { cue, volume, rate });
        if self.block_loops {
            return Err(AudioError::Blocked("autoplay not allowed".into()));
        }
        Ok(())
    }

    fn set_rate(&mut self, cue: Cue, rate: f32) -> Result<(), AudioError> {
        self.push(AudioCall::SetRate { cue, rate });
        Ok(())
    }

    fn stop(&mut self, cue: Cue) -> Result<(), AudioError> {
        self.push(AudioCall::Stop { cue });
        Ok(())
    }

    fn play_once(&mut self, cue: Cue, volume: f32) -> Result<(), AudioError> {
        self.push(AudioCall::PlayOnce { cue, volume });
        if self.block_one_shots {
            return Err(AudioError::Blocked("autoplay not allowed".into()));
        }
        Ok(())
    }
}

pub const LOOP_VOLUME: f32 = 0.3;
pub const RESULT_VOLUME: f32 = 0.5;
pub const RAMP_START_RATE: f32 = 0.6;
pub const RAMP_STEP: f32 = 0.02;
pub const RAMP_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq)]
struct LoopHandle {
    rate: f32,
    // None once the ramp has reached full speed or the loop never started.
    next_step: Option<Instant>,
}

/// Spin-up loop with a tempo ramp, then a one-shot on settle.
///
/// Everything is best effort: backend errors are logged and dropped so the
/// spin itself never waits on, or fails because of, sound.
pub struct AudioCoordinator {
    backend: Box<dyn AudioBackend>,
    spin_loop: Option<LoopHandle>,
}

impl AudioCoordinator {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            spin_loop: None,
        }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(SilentAudio))
    }

    pub fn current_rate(&self) -> Option<f32> {
        self.spin_loop.map(|h| h.rate)
    }

    pub fn is_ramping(&self) -> bool {
        self.spin_loop.is_some_and(|h| h.next_step.is_some())
    }

    pub fn on_spin_start(&mut self, now: Instant) {
        let handle = self.spin_loop.get_or_insert(LoopHandle {
            rate: RAMP_START_RATE,
            next_step: None,
        });
        handle.rate = RAMP_START_RATE;
        handle.next_step = None;

        match self
            .backend
            .start_loop(Cue::SpinLoop, LOOP_VOLUME, RAMP_START_RATE)
        {
            Ok(()) => handle.next_step = Some(now + RAMP_INTERVAL),
            Err(err) => warn!(cue = %Cue::SpinLoop, error = %err, "start cue failed"),
        }
    }

    /// Apply every ramp step that has come due by `now`.
    pub fn tick(&mut self, now: Instant) {
        let Some(handle) = self.spin_loop.as_mut() else {
            return;
        };
        while let Some(due) = handle.next_step {
            if due > now {
                break;
            }
            handle.rate = (handle.rate + RAMP_STEP).min(1.0);
            handle.next_step = if handle.rate >= 1.0 {
                None
            } else {
                Some(due + RAMP_INTERVAL)
            };
            if let Err(err) = self.backend.set_rate(Cue::SpinLoop, handle.rate) {
                debug!(error = %err, "rate change ignored");
            }
        }
    }

    pub fn on_settle(&mut self) {
        self.stop_loop();
        if let Err(err) = self.backend.play_once(Cue::Result, RESULT_VOLUME) {
            warn!(cue = %Cue::Result, error = %err, "result cue failed");
        }
    }

    fn stop_loop(&mut self) {
        if let Some(handle) = self.spin_loop.as_mut() {
            handle.next_step = None;
            if let Err(err) = self.backend.stop(Cue::SpinLoop) {
                debug!(error = %err, "stopping loop failed");
            }
        }
    }

    /// Stop and release the loop handle.
    pub fn teardown(&mut self) {
        self.stop_loop();
        self.spin_loop = None;
    }
}

impl std::fmt::Debug for AudioCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCoordinator")
            .field("spin_loop", &self.spin_loop)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_names() {
        assert_eq!(Cue::SpinLoop.to_string(), "spin-loop");
        assert_eq!(Cue::Result.to_string(), "result");
    }

    #[test]
    fn ramp_reaches_full_speed_in_about_two_seconds() {
        let backend = MemoryAudio::new();
        let mut audio = AudioCoordinator::new(Box::new(backend.clone()));
        let t0 = Instant::now();
        audio.on_spin_start(t0);
        assert_eq!(audio.current_rate(), Some(RAMP_START_RATE));

        audio.tick(t0 + Duration::from_millis(1_000));
        let mid = audio.current_rate().unwrap();
        assert!(mid > RAMP_START_RATE && mid < 1.0);
        assert!(audio.is_ramping());

        audio.tick(t0 + Duration::from_millis(2_100));
        assert_eq!(audio.current_rate(), Some(1.0));
        assert!(!audio.is_ramping());

        let rates = backend.rates();
        assert!(rates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(rates.last().copied(), Some(1.0));
    }

    #[test]
    fn settle_stops_loop_and_plays_result() {
        let backend = MemoryAudio::new();
        let mut audio = AudioCoordinator::new(Box::new(backend.clone()));
        audio.on_spin_start(Instant::now());
        audio.on_settle();

        assert_eq!(
            backend.calls(),
            vec![
                AudioCall::StartLoop {
                    cue: Cue::SpinLoop,
                    volume: LOOP_VOLUME,
                    rate: RAMP_START_RATE
                },
                AudioCall::Stop { cue: Cue::SpinLoop },
                AudioCall::PlayOnce {
                    cue: Cue::Result,
                    volume: RESULT_VOLUME
                },
            ]
        );
        assert!(!audio.is_ramping());
    }

    #[test]
    fn blocked_playback_is_swallowed() {
        let backend = MemoryAudio::blocking();
        let mut audio = AudioCoordinator::new(Box::new(backend.clone()));
        let t0 = Instant::now();
        audio.on_spin_start(t0);
        // No ramp without a running loop.
        audio.tick(t0 + Duration::from_secs(3));
        assert!(backend.rates().is_empty());
        audio.on_settle();
        assert_eq!(backend.calls().len(), 3);
    }

    #[test]
    fn restart_resets_rate() {
        let mut audio = AudioCoordinator::silent();
        let t0 = Instant::now();
        audio.on_spin_start(t0);
        audio.tick(t0 + Duration::from_secs(3));
        assert_eq!(audio.current_rate(), Some(1.0));
        audio.on_spin_start(t0 + Duration::from_secs(3));
        assert_eq!(audio.current_rate(), Some(RAMP_START_RATE));
    }

    #[test]
    fn teardown_releases_handle() {
        let mut audio = AudioCoordinator::silent();
        audio.on_spin_start(Instant::now());
        audio.teardown();
        assert_eq!(audio.current_rate(), None);
    }

    #[test]
    fn bell_has_no_loop() {
        let mut bell = TerminalBell;
        assert_eq!(
            bell.start_loop(Cue::SpinLoop, 0.3, 0.6),
            Err(AudioError::Unsupported(Cue::SpinLoop))
        );
    }
}
