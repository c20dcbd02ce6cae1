use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::palette::slice_color;
use crate::selector::SlotPicker;

/// Where the fixed pointer sits, in wheel degrees.
///
/// Wheel angles start at 3 o'clock and grow counter-clockwise, so the pointer
/// at 12 o'clock is 90°. Rotation is applied in the same direction.
pub const POINTER_ANGLE: f64 = 90.0;

/// Slice layout for a wheel of `len` slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub len: usize,
    pub slice_angle: f64,
}

impl Geometry {
    pub fn for_len(len: usize) -> Self {
        debug_assert!(len > 0, "a wheel needs at least one slice");
        let len = len.max(1);
        Self {
            len,
            slice_angle: 360.0 / len as f64,
        }
    }

    pub fn start_angle(&self, index: usize) -> f64 {
        index as f64 * self.slice_angle
    }

    pub fn center_angle(&self, index: usize) -> f64 {
        self.start_angle(index) + self.slice_angle / 2.0
    }

    /// Absolute rotation that parks the center of `index` under the pointer
    /// after `spins` full turns.
    pub fn target_rotation(&self, index: usize, spins: u32) -> f64 {
        spins as f64 * 360.0 + (POINTER_ANGLE - self.center_angle(index))
    }

    /// Slice under the pointer for an arbitrary rotation.
    pub fn pointer_index(&self, rotation: f64) -> usize {
        let angle = (POINTER_ANGLE - rotation).rem_euclid(360.0);
        ((angle / self.slice_angle).floor() as usize).min(self.len - 1)
    }
}

/// CSS-style cubic bezier timing function with fixed end points (0,0) and (1,1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

/// Fast start, long gentle stop: `cubic-bezier(.17,.67,.12,1)`.
pub const SPIN_EASING: CubicBezier = CubicBezier::new(0.17, 0.67, 0.12, 1.0);

impl CubicBezier {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn sample(a1: f64, a2: f64, t: f64) -> f64 {
        let u = 1.0 - t;
        3.0 * u * u * t * a1 + 3.0 * u * t * t * a2 + t * t * t
    }

    fn slope(a1: f64, a2: f64, t: f64) -> f64 {
        let u = 1.0 - t;
        3.0 * u * u * a1 + 6.0 * u * t * (a2 - a1) + 3.0 * t * t * (1.0 - a2)
    }

    /// Eased progress for linear progress `x` in `[0, 1]`.
    pub fn ease(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }

        // Newton first, bisection if the curve is too flat to converge.
        let mut t = x;
        for _ in 0..8 {
            let err = Self::sample(self.x1, self.x2, t) - x;
            if err.abs() < 1e-7 {
                return Self::sample(self.y1, self.y2, t);
            }
            let d = Self::slope(self.x1, self.x2, t);
            if d.abs() < 1e-6 {
                break;
            }
            t = (t - err / d).clamp(0.0, 1.0);
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        t = x;
        for _ in 0..64 {
            if Self::sample(self.x1, self.x2, t) < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) / 2.0;
            if hi - lo < 1e-9 {
                break;
            }
        }
        Self::sample(self.y1, self.y2, t)
    }
}

/// Timing knobs for every spin.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinSettings {
    /// Wall-clock time from start to settle, regardless of spin count.
    pub duration: Duration,
    pub spins: RangeInclusive<u32>,
}

impl Default for SpinSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(4),
            spins: 8..=12,
        }
    }
}

/// Everything decided at spin start. Immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinOutcome {
    pub token: u64,
    pub selected_index: usize,
    pub selected_name: String,
    /// Length of the snapshot the spin was computed against.
    pub list_len: usize,
    pub spin_count: u32,
    pub target_rotation: f64,
    pub duration: Duration,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinPhase {
    Idle,
    Spinning,
    Settled,
}

/// What the renderer should draw right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationFrame {
    pub rotation: f64,
    pub animating: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Visual {
    Resting { rotation: f64 },
    // One frame at 0° with transitions off before the real target is applied.
    Armed { target: f64 },
    Animating { since: Instant, target: f64 },
}

#[derive(Debug, Clone)]
struct PendingSettle {
    due: Instant,
    outcome: SpinOutcome,
}

/// Spin state machine: turns fresh tokens into outcomes and settles them in
/// the order they were scheduled.
///
/// A newer spin never cancels an older settle; the queue is only cleared by
/// [`WheelAnimator::teardown`].
#[derive(Debug)]
pub struct WheelAnimator {
    settings: SpinSettings,
    last_token: u64,
    phase: SpinPhase,
    visual: Visual,
    pending: VecDeque<PendingSettle>,
    selected: Option<SpinOutcome>,
}

impl WheelAnimator {
    pub fn new(settings: SpinSettings) -> Self {
        Self {
            settings,
            last_token: 0,
            phase: SpinPhase::Idle,
            visual: Visual::Resting { rotation: 0.0 },
            pending: VecDeque::new(),
            selected: None,
        }
    }

    pub fn settings(&self) -> &SpinSettings {
        &self.settings
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn last_token(&self) -> u64 {
        self.last_token
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Most recently settled outcome, cleared whenever a new spin starts.
    pub fn selected(&self) -> Option<&SpinOutcome> {
        self.selected.as_ref()
    }

    pub fn clear_selected(&mut self) {
        self.selected = None;
    }

    /// Start a spin for `token` against `snapshot`.
    ///
    /// Returns `None` for stale tokens (not strictly greater than the last one
    /// seen) and for empty snapshots.
    pub fn request(
        &mut self,
        token: u64,
        snapshot: &[String],
        selector: &mut dyn SlotPicker,
        now: Instant,
    ) -> Option<SpinOutcome> {
        if token <= self.last_token {
            debug!(token, last = self.last_token, "ignoring stale spin token");
            return None;
        }
        if snapshot.is_empty() {
            return None;
        }
        self.last_token = token;

        let geometry = Geometry::for_len(snapshot.len());
        let selected_index = selector.select(snapshot);
        let spin_count = selector.spin_count(self.settings.spins.clone());
        let outcome = SpinOutcome {
            token,
            selected_index,
            selected_name: snapshot[selected_index].clone(),
            list_len: snapshot.len(),
            spin_count,
            target_rotation: geometry.target_rotation(selected_index, spin_count),
            duration: self.settings.duration,
            color: slice_color(selected_index),
        };

        info!(
            token,
            index = selected_index,
            name = %outcome.selected_name,
            spins = spin_count,
            target = outcome.target_rotation,
            "spin started"
        );

        self.visual = Visual::Armed {
            target: outcome.target_rotation,
        };
        self.phase = SpinPhase::Spinning;
        self.selected = None;
        self.pending.push_back(PendingSettle {
            due: now.checked_add(self.settings.duration).unwrap_or(now),
            outcome: outcome.clone(),
        });

        Some(outcome)
    }

    /// Move time forward: release an armed target and settle everything due.
    ///
    /// Settled outcomes come back in scheduling order, each exactly once.
    pub fn advance(&mut self, now: Instant) -> Vec<SpinOutcome> {
        if let Visual::Armed { target } = self.visual {
            self.visual = Visual::Animating { since: now, target };
        }

        let mut settled = Vec::new();
        while self.pending.front().is_some_and(|p| p.due <= now) {
            if let Some(p) = self.pending.pop_front() {
                debug!(token = p.outcome.token, name = %p.outcome.selected_name, "spin settled");
                settled.push(p.outcome);
            }
        }

        if let Some(last) = settled.last() {
            self.selected = Some(last.clone());
            // An older settle firing under a newer spin leaves the wheel moving.
            if self.pending.is_empty() {
                self.visual = Visual::Resting {
                    rotation: self.visual_target(),
                };
                self.phase = SpinPhase::Settled;
            }
        }

        settled
    }

    fn visual_target(&self) -> f64 {
        match self.visual {
            Visual::Resting { rotation } => rotation,
            Visual::Armed { target } | Visual::Animating { target, .. } => target,
        }
    }

    pub fn frame(&self, now: Instant) -> RotationFrame {
        match self.visual {
            Visual::Resting { rotation } => RotationFrame {
                rotation,
                animating: false,
            },
            Visual::Armed { .. } => RotationFrame {
                rotation: 0.0,
                animating: false,
            },
            Visual::Animating { since, target } => {
                let total = self.settings.duration.as_secs_f64();
                let progress = if total > 0.0 {
                    now.saturating_duration_since(since).as_secs_f64() / total
                } else {
                    1.0
                };
                RotationFrame {
                    rotation: target * SPIN_EASING.ease(progress.clamp(0.0, 1.0)),
                    animating: true,
                }
            }
        }
    }

    /// Drop every pending settle. Returns how many were discarded.
    pub fn teardown(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.visual = Visual::Resting {
            rotation: self.visual_target(),
        };
        self.phase = SpinPhase::Idle;
        dropped
    }
}
