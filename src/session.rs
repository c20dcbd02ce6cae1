use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Points awarded per win in points mode.
pub const POINTS_PER_WIN: u32 = 5;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Sampling with replacement and a cumulative leaderboard.
    #[default]
    #[strum(serialize = "Points")]
    Points,
    /// Sampling without replacement until nobody is left.
    #[strum(serialize = "Chosen Once")]
    ChosenOnce,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub points: u32,
    pub win_count: u32,
}

/// Points mode scoreboard, one entry per distinct name in creation order.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn record_win(&mut self, name: &str) -> &LeaderboardEntry {
        let pos = match self.entries.iter().position(|e| e.name == name) {
            Some(pos) => {
                let entry = &mut self.entries[pos];
                entry.points += POINTS_PER_WIN;
                entry.win_count += 1;
                pos
            }
            None => {
                self.entries.push(LeaderboardEntry {
                    name: name.to_string(),
                    points: POINTS_PER_WIN,
                    win_count: 1,
                });
                self.entries.len() - 1
            }
        };
        &self.entries[pos]
    }

    pub fn get(&self, name: &str) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest points first; ties keep creation order.
    pub fn standings(&self) -> Vec<LeaderboardEntry> {
        self.entries
            .iter()
            .cloned()
            .sorted_by(|a, b| b.points.cmp(&a.points))
            .collect()
    }
}

/// Sampling-without-replacement bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ChosenOnce {
    original: Vec<String>,
    remaining: Vec<String>,
    history: Vec<String>,
}

impl ChosenOnce {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            remaining: names.clone(),
            original: names,
            history: Vec::new(),
        }
    }

    pub fn remaining(&self) -> &[String] {
        &self.remaining
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn original_len(&self) -> usize {
        self.original.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Remove the first occurrence of `name` and log it.
    ///
    /// Returns false, changing nothing, when `name` is not in the remaining list.
    pub fn record(&mut self, name: &str) -> bool {
        match self.remaining.iter().position(|n| n == name) {
            Some(pos) => {
                let chosen = self.remaining.remove(pos);
                self.history.push(chosen);
                true
            }
            None => false,
        }
    }

    pub fn progress(&self) -> f64 {
        let total = self.original.len();
        if total == 0 {
            return 0.0;
        }
        let done = total.saturating_sub(self.remaining.len());
        (done as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.remaining = self.original.clone();
        self.history.clear();
    }
}

/// The list the wheel should show for `mode`.
pub fn displayed_list<'a>(mode: Mode, points: &'a [String], chosen: &'a [String]) -> &'a [String] {
    match mode {
        Mode::Points => points,
        Mode::ChosenOnce => chosen,
    }
}

/// How a settled winner was booked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Points(LeaderboardEntry),
    Chosen { remaining: usize },
    /// Chosen-once winner that was no longer in the remaining list.
    NotRemaining,
}

/// One sidebar row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRow {
    pub rank: usize,
    pub name: String,
    pub points: u32,
    pub count: u32,
}

/// Both modes' data plus which one is active.
#[derive(Debug, Clone)]
pub struct Session {
    mode: Mode,
    players: Vec<String>,
    leaderboard: Leaderboard,
    chosen: ChosenOnce,
}

impl Session {
    pub fn new(names: Vec<String>, mode: Mode) -> Self {
        Self {
            mode,
            chosen: ChosenOnce::new(names.clone()),
            players: names,
            leaderboard: Leaderboard::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn chosen(&self) -> &ChosenOnce {
        &self.chosen
    }

    /// Replace both modes' lists and clear chosen-once history.
    pub fn load(&mut self, names: Vec<String>) {
        info!(count = names.len(), "names loaded");
        self.chosen = ChosenOnce::new(names.clone());
        self.players = names;
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "mode switched");
        }
        self.mode = mode;
    }

    pub fn displayed(&self) -> &[String] {
        displayed_list(self.mode, &self.players, self.chosen.remaining())
    }

    /// Book a winner against whatever mode is active right now.
    pub fn record_winner(&mut self, name: &str) -> Recorded {
        match self.mode {
            Mode::Points => {
                let entry = self.leaderboard.record_win(name).clone();
                debug!(name, points = entry.points, wins = entry.win_count, "points awarded");
                Recorded::Points(entry)
            }
            Mode::ChosenOnce => {
                if self.chosen.record(name) {
                    let remaining = self.chosen.remaining().len();
                    debug!(name, remaining, "chosen once");
                    Recorded::Chosen { remaining }
                } else {
                    debug!(name, "winner already chosen this round");
                    Recorded::NotRemaining
                }
            }
        }
    }

    pub fn reset_chosen_once(&mut self) {
        info!(restored = self.chosen.original_len(), "chosen once reset");
        self.chosen.reset();
    }

    pub fn total(&self) -> usize {
        self.players.len()
    }

    pub fn remaining(&self) -> usize {
        self.chosen.remaining().len()
    }

    pub fn progress(&self) -> f64 {
        self.chosen.progress()
    }

    /// Sidebar rows: standings in points mode, pick order in chosen-once.
    pub fn ranking(&self) -> Vec<RankingRow> {
        match self.mode {
            Mode::Points => self
                .leaderboard
                .standings()
                .into_iter()
                .enumerate()
                .map(|(idx, e)| RankingRow {
                    rank: idx + 1,
                    name: e.name,
                    points: e.points,
                    count: e.win_count,
                })
                .collect(),
            Mode::ChosenOnce => self
                .chosen
                .history()
                .iter()
                .enumerate()
                .map(|(idx, name)| RankingRow {
                    rank: idx + 1,
                    name: name.clone(),
                    points: 0,
                    count: (idx + 1) as u32,
                })
                .collect(),
        }
    }
}
