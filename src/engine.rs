//! The spin engine: one owner for the session lists, the animator, the
//! random source and the audio cues.
//!
//! Every method is synchronous and returns immediately. Callers feed time in
//! through [`SpinEngine::tick`] and read back snapshots plus queued
//! [`EngineEvent`]s.

use std::borrow::Cow;
use std::time::Instant;

use tracing::{info, warn};

use crate::audio::AudioCoordinator;
use crate::error::SpinError;
use crate::roster::{default_names, parse_names, EXHAUSTED_SENTINEL};
use crate::selector::{Selector, SlotPicker};
use crate::session::{Mode, RankingRow, Session};
use crate::wheel::{RotationFrame, SpinOutcome, SpinPhase, SpinSettings, WheelAnimator};

/// The name and slice color currently highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub color: &'static str,
    /// Slot the spin landed on, within a wheel of `list_len` slots.
    pub index: usize,
    pub list_len: usize,
}

impl Selection {
    /// Slot to mark on `names`, if the wheel still shows the list the spin
    /// landed on.
    pub fn slot_in(&self, names: &[String]) -> Option<usize> {
        (names.len() == self.list_len && names.get(self.index) == Some(&self.name))
            .then_some(self.index)
    }
}

/// Notifications for the presentation layer, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SpinStarted(SpinOutcome),
    /// `None` clears the highlighted winner.
    Selected(Option<Selection>),
    Winner {
        token: u64,
        name: String,
    },
    Exhausted,
}

/// Derived numbers for display.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStats {
    pub mode: Mode,
    pub remaining: usize,
    pub total: usize,
    pub progress: f64,
    pub ranking: Vec<RankingRow>,
}

pub struct SpinEngine {
    session: Session,
    animator: WheelAnimator,
    selector: Box<dyn SlotPicker>,
    audio: AudioCoordinator,
    next_token: u64,
    names_loaded: bool,
    selected: Option<Selection>,
    events: Vec<EngineEvent>,
}

impl SpinEngine {
    /// Default roster, points mode, entropy-seeded selector, no sound.
    pub fn new(settings: SpinSettings) -> Self {
        Self {
            session: Session::new(default_names(), Mode::Points),
            animator: WheelAnimator::new(settings),
            selector: Box::new(Selector::new()),
            audio: AudioCoordinator::silent(),
            next_token: 0,
            names_loaded: false,
            selected: None,
            events: Vec::new(),
        }
    }

    /// Stage a roster without marking names as loaded.
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.session.load(names);
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.session.set_mode(mode);
        self
    }

    pub fn with_selector(mut self, selector: Box<dyn SlotPicker>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_audio(mut self, audio: AudioCoordinator) -> Self {
        self.audio = audio;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mode(&self) -> Mode {
        self.session.mode()
    }

    pub fn names_loaded(&self) -> bool {
        self.names_loaded
    }

    pub fn phase(&self) -> SpinPhase {
        self.animator.phase()
    }

    pub fn is_spinning(&self) -> bool {
        self.animator.phase() == SpinPhase::Spinning
    }

    pub fn pending_settles(&self) -> usize {
        self.animator.pending_len()
    }

    pub fn last_token(&self) -> u64 {
        self.animator.last_token()
    }

    pub fn selected(&self) -> Option<&Selection> {
        self.selected.as_ref()
    }

    pub fn audio(&self) -> &AudioCoordinator {
        &self.audio
    }

    /// Parse `raw` and make it the list for both modes. Chosen-once starts over.
    pub fn load_names(&mut self, raw: &str) {
        self.session.load(parse_names(raw));
        self.names_loaded = true;
        self.set_selected(None);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.session.set_mode(mode);
        self.set_selected(None);
    }

    pub fn reset_chosen_once(&mut self) {
        self.session.reset_chosen_once();
        self.set_selected(None);
    }

    /// Kick off a spin against the list shown right now.
    ///
    /// Earlier spins still in flight keep their scheduled settle.
    pub fn start_spin(&mut self, now: Instant) -> Result<SpinOutcome, SpinError> {
        self.names_loaded = true;

        let snapshot = self.session.displayed().to_vec();
        if snapshot.is_empty() {
            info!(mode = %self.session.mode(), "spin refused, no participants remain");
            self.events.push(EngineEvent::Exhausted);
            return Err(SpinError::Exhausted);
        }

        let token = self.next_token + 1;
        let Some(outcome) = self
            .animator
            .request(token, &snapshot, self.selector.as_mut(), now)
        else {
            warn!(token, "animator refused a fresh token");
            self.events.push(EngineEvent::Exhausted);
            return Err(SpinError::Exhausted);
        };
        self.next_token = token;

        self.set_selected(None);
        self.audio.on_spin_start(now);
        self.events.push(EngineEvent::SpinStarted(outcome.clone()));
        Ok(outcome)
    }

    /// Advance timers: the one-frame reset, due settles, the audio ramp.
    pub fn tick(&mut self, now: Instant) {
        for outcome in self.animator.advance(now) {
            self.settle(outcome);
        }
        self.audio.tick(now);
    }

    fn settle(&mut self, outcome: SpinOutcome) {
        self.audio.on_settle();
        let recorded = self.session.record_winner(&outcome.selected_name);
        info!(
            token = outcome.token,
            name = %outcome.selected_name,
            mode = %self.session.mode(),
            ?recorded,
            "winner"
        );
        self.set_selected(Some(Selection {
            name: outcome.selected_name.clone(),
            color: outcome.color,
            index: outcome.selected_index,
            list_len: outcome.list_len,
        }));
        self.events.push(EngineEvent::Winner {
            token: outcome.token,
            name: outcome.selected_name,
        });
    }

    fn set_selected(&mut self, selection: Option<Selection>) {
        if selection.is_none() {
            self.animator.clear_selected();
        }
        self.selected = selection.clone();
        self.events.push(EngineEvent::Selected(selection));
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn frame(&self, now: Instant) -> RotationFrame {
        self.animator.frame(now)
    }

    /// Slots to draw. An exhausted round shows a single sentinel slot.
    pub fn wheel_names(&self) -> Cow<'_, [String]> {
        let displayed = self.session.displayed();
        if displayed.is_empty() {
            Cow::Owned(vec![EXHAUSTED_SENTINEL.to_string()])
        } else {
            Cow::Borrowed(displayed)
        }
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            mode: self.session.mode(),
            remaining: self.session.remaining(),
            total: self.session.total(),
            progress: self.session.progress(),
            ranking: self.session.ranking(),
        }
    }

    /// Drop pending settles and silence audio. Nothing fires afterwards.
    pub fn teardown(&mut self) {
        let dropped = self.animator.teardown();
        if dropped > 0 {
            info!(dropped, "pending settles discarded");
        }
        self.audio.teardown();
    }
}

impl Drop for SpinEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for SpinEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinEngine")
            .field("session", &self.session)
            .field("animator", &self.animator)
            .field("next_token", &self.next_token)
            .field("names_loaded", &self.names_loaded)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::ScriptedSelector;
    use assert_matches::assert_matches;
    use std::time::Duration;

    const SETTLE: Duration = Duration::from_secs(4);

    fn engine(names: &str, mode: Mode, picks: &[usize]) -> SpinEngine {
        let mut engine = SpinEngine::new(SpinSettings::default())
            .with_mode(mode)
            .with_selector(Box::new(ScriptedSelector::new(picks.to_vec())));
        engine.load_names(names);
        engine.drain_events();
        engine
    }

    fn spin_and_settle(engine: &mut SpinEngine, now: Instant) -> Result<String, SpinError> {
        let outcome = engine.start_spin(now)?;
        engine.tick(now + SETTLE);
        Ok(outcome.selected_name)
    }

    #[test]
    fn points_scenario_a_a_b() {
        let mut engine = engine("A,B,C", Mode::Points, &[0, 0, 1]);
        let t0 = Instant::now();
        for round in 0..3u32 {
            spin_and_settle(&mut engine, t0 + SETTLE * round * 2).unwrap();
        }

        let stats = engine.stats();
        assert_eq!(stats.ranking.len(), 2);
        assert_eq!(
            (stats.ranking[0].name.as_str(), stats.ranking[0].points, stats.ranking[0].count),
            ("A", 10, 2)
        );
        assert_eq!(
            (stats.ranking[1].name.as_str(), stats.ranking[1].points, stats.ranking[1].count),
            ("B", 5, 1)
        );
        assert_eq!(engine.session().players().len(), 3);
    }

    #[test]
    fn chosen_once_scenario_x_y_then_exhausted() {
        let mut engine = engine("X\nY", Mode::ChosenOnce, &[0, 0]);
        let t0 = Instant::now();

        assert_eq!(spin_and_settle(&mut engine, t0).unwrap(), "X");
        assert_eq!(engine.session().displayed(), &["Y".to_string()][..]);
        assert_eq!(engine.session().chosen().history(), &["X".to_string()][..]);

        assert_eq!(spin_and_settle(&mut engine, t0 + SETTLE * 2).unwrap(), "Y");
        assert_eq!(engine.stats().remaining, 0);
        assert_eq!(engine.stats().progress, 1.0);

        engine.drain_events();
        assert_matches!(engine.start_spin(t0 + SETTLE * 4), Err(SpinError::Exhausted));
        assert_eq!(engine.drain_events(), vec![EngineEvent::Exhausted]);
        assert_eq!(engine.last_token(), 2);
        assert_eq!(engine.wheel_names().to_vec(), vec![EXHAUSTED_SENTINEL.to_string()]);
    }

    #[test]
    fn winner_event_fires_once_per_token() {
        let mut engine = engine("A,B,C,D", Mode::Points, &[2]);
        let t0 = Instant::now();
        let outcome = engine.start_spin(t0).unwrap();
        engine.tick(t0 + SETTLE);
        engine.tick(t0 + SETTLE * 3);

        let winners: Vec<EngineEvent> = engine
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::Winner { .. }))
            .collect();
        assert_eq!(
            winners,
            vec![EngineEvent::Winner {
                token: outcome.token,
                name: "C".into()
            }]
        );
        assert_eq!(
            engine.selected(),
            Some(&Selection {
                name: "C".into(),
                color: outcome.color,
                index: outcome.selected_index,
                list_len: 4,
            })
        );
    }

    #[test]
    fn selection_slot_tracks_the_landed_wheel() {
        let mut engine = engine("Sam,Sam,Kim", Mode::ChosenOnce, &[0]);
        let t0 = Instant::now();
        spin_and_settle(&mut engine, t0).unwrap();

        let selection = engine.selected().cloned().unwrap();
        assert_eq!((selection.index, selection.list_len), (0, 3));
        // The landed wheel had three slots; the remaining one has two.
        assert_eq!(selection.slot_in(&engine.wheel_names()), None);
        let landed: Vec<String> = ["Sam", "Sam", "Kim"].map(String::from).to_vec();
        assert_eq!(selection.slot_in(&landed), Some(0));
    }

    #[test]
    fn event_order_for_one_spin() {
        let mut engine = engine("A,B", Mode::Points, &[1]);
        let t0 = Instant::now();
        let outcome = engine.start_spin(t0).unwrap();
        engine.tick(t0 + SETTLE);

        assert_eq!(
            engine.drain_events(),
            vec![
                EngineEvent::Selected(None),
                EngineEvent::SpinStarted(outcome.clone()),
                EngineEvent::Selected(Some(Selection {
                    name: "B".into(),
                    color: outcome.color,
                    index: 1,
                    list_len: 2,
                })),
                EngineEvent::Winner {
                    token: 1,
                    name: "B".into()
                },
            ]
        );
    }

    #[test]
    fn outcome_recorded_against_mode_at_settle() {
        let mut engine = engine("A,B", Mode::Points, &[0]);
        let t0 = Instant::now();
        engine.start_spin(t0).unwrap();
        engine.set_mode(Mode::ChosenOnce);
        engine.tick(t0 + SETTLE);

        assert!(engine.session().leaderboard().is_empty());
        assert_eq!(engine.session().chosen().history(), &["A".to_string()][..]);
    }

    #[test]
    fn overlapping_spins_both_settle_in_order() {
        let mut engine = engine("A,B,C", Mode::Points, &[0, 2]);
        let t0 = Instant::now();
        engine.start_spin(t0).unwrap();
        engine
            .start_spin(t0 + Duration::from_millis(500))
            .unwrap();
        assert_eq!(engine.pending_settles(), 2);

        engine.tick(t0 + SETTLE);
        assert!(engine.is_spinning());
        engine.tick(t0 + SETTLE + Duration::from_millis(500));
        assert!(!engine.is_spinning());

        let winners: Vec<(u64, String)> = engine
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::Winner { token, name } => Some((token, name)),
                _ => None,
            })
            .collect();
        assert_eq!(winners, vec![(1, "A".into()), (2, "C".into())]);
    }

    #[test]
    fn spin_uses_snapshot_length() {
        let mut engine = engine("A,B,C,D", Mode::Points, &[3]);
        let t0 = Instant::now();
        let outcome = engine.start_spin(t0).unwrap();
        engine.load_names("Z");
        engine.tick(t0 + SETTLE);

        assert_eq!(outcome.list_len, 4);
        assert_eq!(outcome.selected_name, "D");
        assert_eq!(engine.session().leaderboard().get("D").map(|e| e.win_count), Some(1));
    }

    #[test]
    fn reset_restores_round() {
        let mut engine = engine("A,B,C", Mode::ChosenOnce, &[0, 0]);
        let t0 = Instant::now();
        spin_and_settle(&mut engine, t0).unwrap();
        spin_and_settle(&mut engine, t0 + SETTLE * 2).unwrap();

        engine.reset_chosen_once();
        assert_eq!(engine.stats().remaining, 3);
        assert!(engine.session().chosen().history().is_empty());
        assert!(engine.selected().is_none());
    }

    #[test]
    fn mode_switch_clears_selection_only() {
        let mut engine = engine("A,B", Mode::Points, &[0]);
        let t0 = Instant::now();
        spin_and_settle(&mut engine, t0).unwrap();
        assert!(engine.selected().is_some());

        engine.set_mode(Mode::ChosenOnce);
        assert!(engine.selected().is_none());
        assert_eq!(engine.session().leaderboard().get("A").map(|e| e.points), Some(5));
        assert_eq!(engine.wheel_names().len(), 2);
    }

    #[test]
    fn first_spin_marks_names_loaded() {
        let mut engine = SpinEngine::new(SpinSettings::default());
        assert!(!engine.names_loaded());
        engine.start_spin(Instant::now()).unwrap();
        assert!(engine.names_loaded());
        assert_eq!(engine.session().players(), &default_names()[..]);
    }

    #[test]
    fn teardown_discards_pending_winners() {
        let mut engine = engine("A,B", Mode::Points, &[0]);
        let t0 = Instant::now();
        engine.start_spin(t0).unwrap();
        engine.teardown();
        engine.drain_events();
        engine.tick(t0 + SETTLE * 5);

        assert!(engine.drain_events().is_empty());
        assert!(engine.session().leaderboard().is_empty());
    }

    #[test]
    fn frame_resets_then_animates_forward() {
        let mut engine = engine("A,B,C", Mode::Points, &[1]);
        let t0 = Instant::now();
        spin_and_settle(&mut engine, t0).unwrap();
        assert!(engine.frame(t0 + SETTLE).rotation > 0.0);

        let t1 = t0 + SETTLE * 2;
        engine.start_spin(t1).unwrap();
        assert_eq!(
            engine.frame(t1),
            RotationFrame {
                rotation: 0.0,
                animating: false
            }
        );
        engine.tick(t1 + Duration::from_millis(16));
        assert!(engine.frame(t1 + Duration::from_millis(16)).animating);
    }
}
