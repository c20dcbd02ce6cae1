use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::engine::{EngineEvent, Selection, SpinEngine};
use crate::session::Mode;

/// How long the winner flash stays up after a settle.
const FLASH_DURATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Wheel,
    EditingNames,
}

/// Terminal shell around the engine: turns keys into engine calls and
/// remembers what the last events asked it to show.
#[derive(Debug)]
pub struct App {
    pub engine: SpinEngine,
    pub state: AppState,
    /// Text in the name editor.
    pub draft: String,
    // Draft as it was when the editor opened, restored on Esc.
    saved_draft: Option<String>,
    pub highlight: Option<Selection>,
    pub flash: Option<(String, Instant)>,
    pub notice: Option<String>,
    pub welcome: Option<String>,
    pub now: Instant,
    should_quit: bool,
}

impl App {
    pub fn new(engine: SpinEngine, draft: String, welcome: Option<String>, now: Instant) -> Self {
        Self {
            engine,
            state: AppState::Wheel,
            draft,
            saved_draft: None,
            highlight: None,
            flash: None,
            notice: None,
            welcome,
            now,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// True while something on screen changes without input.
    pub fn is_animating(&self) -> bool {
        self.engine.is_spinning() || self.flash.is_some()
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.now = now;
        self.engine.tick(now);
        self.absorb_events();
        if self.flash.as_ref().is_some_and(|(_, until)| *until <= now) {
            self.flash = None;
        }
    }

    pub fn on_paste(&mut self, text: &str) {
        if self.state == AppState::EditingNames {
            self.draft.push_str(&text.replace(['\r', '\n'], ", "));
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) {
        self.now = now;
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.state {
            AppState::EditingNames => self.on_editor_key(key),
            AppState::Wheel => self.on_wheel_key(key, now),
        }
        self.absorb_events();
    }

    fn on_wheel_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char('s') | KeyCode::Char(' ') => {
                if !self.engine.names_loaded() {
                    self.load_draft();
                }
                // Exhaustion comes back as an event and becomes a notice.
                let _ = self.engine.start_spin(now);
            }
            KeyCode::Char('p') => self.engine.set_mode(Mode::Points),
            KeyCode::Char('c') => self.engine.set_mode(Mode::ChosenOnce),
            KeyCode::Char('r') if self.engine.mode() == Mode::ChosenOnce => {
                self.engine.reset_chosen_once();
                self.notice = None;
            }
            KeyCode::Char('e') => {
                self.saved_draft = Some(self.draft.clone());
                self.state = AppState::EditingNames;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn on_editor_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.load_draft();
                self.saved_draft = None;
                self.state = AppState::Wheel;
            }
            KeyCode::Esc => {
                if let Some(saved) = self.saved_draft.take() {
                    self.draft = saved;
                }
                self.state = AppState::Wheel;
            }
            KeyCode::Backspace => {
                self.draft.pop();
            }
            KeyCode::Tab => self.draft.push_str(", "),
            KeyCode::Char(c) => self.draft.push(c),
            _ => {}
        }
    }

    /// Hand the draft to the engine and show it back normalized.
    fn load_draft(&mut self) {
        self.engine.load_names(&self.draft);
        self.draft = self.engine.session().players().join(", ");
        self.notice = None;
    }

    fn absorb_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::SpinStarted(_) => self.notice = None,
                EngineEvent::Selected(selection) => self.highlight = selection,
                EngineEvent::Winner { name, .. } => {
                    self.flash = Some((name, self.now + FLASH_DURATION));
                }
                EngineEvent::Exhausted => {
                    self.notice = Some("No participants remain. Press r to reset.".into());
                }
            }
        }
    }
}
