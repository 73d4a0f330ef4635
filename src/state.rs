use std::collections::VecDeque;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::cascade::{FetchRequest, StandingsController};
use crate::standings::{
    Points, StandingsMatrix, StandingsRecord, deserialize_grid_position, deserialize_round,
};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Overview,
    Standings,
    Points,
    Grid,
    Podiums,
}

impl Panel {
    pub const ALL: [Panel; 5] = [
        Panel::Overview,
        Panel::Standings,
        Panel::Points,
        Panel::Grid,
        Panel::Podiums,
    ];

    pub fn next(self) -> Panel {
        let idx = Panel::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Panel::ALL[(idx + 1) % Panel::ALL.len()]
    }

    pub fn prev(self) -> Panel {
        let idx = Panel::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Panel::ALL[(idx + Panel::ALL.len() - 1) % Panel::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverEntry {
    pub driver: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverStats {
    pub driver: String,
    pub total_laps: u64,
    pub total_races: u32,
    pub total_wins: u32,
    pub total_podiums: u32,
    pub total_fastest_laps: u32,
    pub total_pole_positions: u32,
    pub avg_qualifying_pos: f64,
    pub best_position: u32,
    pub most_successful_track: String,
    pub best_worst_finishes: Vec<TrackFinishes>,
    pub total_points: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackFinishes {
    pub gp_name: String,
    #[serde(rename = "Best Finish")]
    pub best_finish: u32,
    #[serde(rename = "Worst Finish")]
    pub worst_finish: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoundPoints {
    #[serde(deserialize_with = "deserialize_round")]
    pub round: u32,
    #[serde(default)]
    pub gp_name: String,
    /// Missing or non-numeric values stay `NotANumber`; the panel survives them.
    #[serde(default)]
    pub points: Points,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GridSlot {
    #[serde(default, deserialize_with = "deserialize_round")]
    pub round: u32,
    pub gp_name: String,
    /// Zero means a pit lane start.
    #[serde(deserialize_with = "deserialize_grid_position")]
    pub grid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeasonPodiums {
    pub year: i32,
    pub podiums: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    NotRequested,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchDrivers,
    FetchSeasons {
        generation: u64,
        subject: String,
    },
    FetchStandings {
        generation: u64,
        subject: String,
        season: i32,
    },
    FetchDriverStats {
        subject: String,
    },
    FetchDriverPoints {
        subject: String,
        season: i32,
    },
    FetchStartingPositions {
        subject: String,
        season: i32,
    },
    FetchPodiums {
        subject: String,
    },
}

impl From<FetchRequest> for ProviderCommand {
    fn from(req: FetchRequest) -> Self {
        match req {
            FetchRequest::Seasons {
                generation,
                subject,
            } => ProviderCommand::FetchSeasons {
                generation,
                subject,
            },
            FetchRequest::Standings {
                generation,
                subject,
                season,
            } => ProviderCommand::FetchStandings {
                generation,
                subject,
                season,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelNotice {
    Hint(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetDrivers(Result<Vec<DriverEntry>, String>),
    SeasonsLoaded {
        generation: u64,
        subject: String,
        result: Result<Vec<i32>, String>,
    },
    StandingsLoaded {
        generation: u64,
        subject: String,
        season: i32,
        result: Result<Vec<StandingsRecord>, String>,
    },
    DriverStatsLoaded {
        subject: String,
        result: Result<Option<DriverStats>, String>,
    },
    PointsLoaded {
        subject: String,
        season: i32,
        result: Result<Vec<RoundPoints>, String>,
    },
    StartingPositionsLoaded {
        subject: String,
        season: i32,
        result: Result<Vec<GridSlot>, String>,
    },
    PodiumsLoaded {
        subject: String,
        result: Result<Vec<SeasonPodiums>, String>,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub panel: Panel,
    pub drivers: Loadable<Vec<DriverEntry>>,
    pub sidebar_selected: usize,
    pub standings: StandingsController,
    pub rival: Option<String>,
    pub driver_stats: Loadable<Option<DriverStats>>,
    pub points: Loadable<Vec<RoundPoints>>,
    pub grid: Loadable<Vec<GridSlot>>,
    pub podiums: Loadable<Vec<SeasonPodiums>>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            panel: Panel::Overview,
            drivers: Loadable::NotRequested,
            sidebar_selected: 0,
            standings: StandingsController::new(),
            rival: None,
            driver_stats: Loadable::NotRequested,
            points: Loadable::NotRequested,
            grid: Loadable::NotRequested,
            podiums: Loadable::NotRequested,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.standings.subject()
    }

    pub fn active_season(&self) -> Option<i32> {
        self.standings.active_season()
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let stamp = Local::now().format("%H:%M:%S");
        self.logs.push_back(format!("{stamp} {}", msg.into()));
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn driver_list(&self) -> &[DriverEntry] {
        self.drivers.loaded().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn highlighted_driver(&self) -> Option<&DriverEntry> {
        self.driver_list().get(self.sidebar_selected)
    }

    /// Full name for a driver id, falling back to the id itself.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.driver_list()
            .iter()
            .find(|d| d.driver == id)
            .map(|d| d.full_name.as_str())
            .unwrap_or(id)
    }

    pub fn select_next(&mut self) {
        let total = self.driver_list().len();
        if total == 0 {
            self.sidebar_selected = 0;
            return;
        }
        self.sidebar_selected = (self.sidebar_selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.driver_list().len();
        if total == 0 {
            self.sidebar_selected = 0;
            return;
        }
        if self.sidebar_selected == 0 {
            self.sidebar_selected = total - 1;
        } else {
            self.sidebar_selected -= 1;
        }
    }

    pub fn request_drivers(&mut self) -> Vec<ProviderCommand> {
        if self.drivers.is_loading() {
            return Vec::new();
        }
        self.drivers = Loadable::Loading;
        vec![ProviderCommand::FetchDrivers]
    }

    /// Makes `subject` the driver under analysis. Every panel is reset before any
    /// request goes out so nothing from the previous driver stays on screen.
    pub fn select_driver(&mut self, subject: Option<String>) -> Vec<ProviderCommand> {
        let previous = self.subject().map(str::to_string);
        let Some(seasons_req) = self.standings.set_subject(subject) else {
            if self.subject().is_none() {
                self.reset_driver_panels();
                if previous.is_some() {
                    self.push_log("[INFO] Driver cleared");
                }
            }
            return Vec::new();
        };

        self.reset_driver_panels();
        let Some(subject) = self.subject().map(str::to_string) else {
            return Vec::new();
        };
        if self.rival.as_deref() == Some(subject.as_str()) {
            self.rival = None;
        }
        let msg = format!("[INFO] Driver: {}", self.display_name(&subject));
        self.push_log(msg);

        self.driver_stats = Loadable::Loading;
        self.podiums = Loadable::Loading;
        vec![
            seasons_req.into(),
            ProviderCommand::FetchDriverStats {
                subject: subject.clone(),
            },
            ProviderCommand::FetchPodiums { subject },
        ]
    }

    pub fn select_highlighted_driver(&mut self) -> Vec<ProviderCommand> {
        let Some(id) = self.highlighted_driver().map(|d| d.driver.clone()) else {
            self.push_log("[INFO] No driver highlighted");
            return Vec::new();
        };
        self.select_driver(Some(id))
    }

    pub fn select_season(&mut self, season: i32) -> Vec<ProviderCommand> {
        let Some(req) = self.standings.select_season(season) else {
            return Vec::new();
        };
        let mut cmds = vec![req.into()];
        cmds.extend(self.season_panel_requests());
        cmds
    }

    /// Moves through the season list; positive steps go towards older seasons.
    pub fn step_season(&mut self, step: isize) -> Vec<ProviderCommand> {
        let seasons = self.standings.seasons();
        if seasons.is_empty() {
            return Vec::new();
        }
        let current = self
            .active_season()
            .and_then(|s| seasons.iter().position(|y| *y == s))
            .unwrap_or(0) as isize;
        let target = (current + step).clamp(0, seasons.len() as isize - 1) as usize;
        let season = seasons[target];
        self.select_season(season)
    }

    pub fn set_rival(&mut self, rival: Option<String>) {
        let rival = rival.filter(|r| Some(r.as_str()) != self.subject());
        if rival == self.rival {
            return;
        }
        match &rival {
            Some(id) => {
                let msg = format!("[INFO] Head-to-head vs {}", self.display_name(id));
                self.push_log(msg);
            }
            None => self.push_log("[INFO] Head-to-head off"),
        }
        self.rival = rival;
    }

    /// Re-issues whatever failed last. Nothing is retried automatically.
    pub fn retry(&mut self) -> Vec<ProviderCommand> {
        let mut cmds = Vec::new();
        if self.drivers.error().is_some() {
            cmds.extend(self.request_drivers());
        }
        if let Some(req) = self.standings.retry() {
            cmds.push(req.into());
        }
        if let Some(subject) = self.subject().map(str::to_string) {
            if self.driver_stats.error().is_some() {
                self.driver_stats = Loadable::Loading;
                cmds.push(ProviderCommand::FetchDriverStats {
                    subject: subject.clone(),
                });
            }
            if self.podiums.error().is_some() {
                self.podiums = Loadable::Loading;
                cmds.push(ProviderCommand::FetchPodiums {
                    subject: subject.clone(),
                });
            }
            if let Some(season) = self.active_season() {
                if self.points.error().is_some() {
                    self.points = Loadable::Loading;
                    cmds.push(ProviderCommand::FetchDriverPoints {
                        subject: subject.clone(),
                        season,
                    });
                }
                if self.grid.error().is_some() {
                    self.grid = Loadable::Loading;
                    cmds.push(ProviderCommand::FetchStartingPositions { subject, season });
                }
            }
        }
        if cmds.is_empty() {
            self.push_log("[INFO] Nothing to retry");
        } else {
            self.push_log(format!("[INFO] Retrying {} request(s)", cmds.len()));
        }
        cmds
    }

    /// Standings matrix as the chart should show it: the full field, or only the
    /// subject and rival when a head-to-head is active.
    pub fn standings_view(&self) -> StandingsMatrix {
        let matrix = self.standings.matrix();
        match (self.subject(), self.rival.as_deref()) {
            (Some(subject), Some(rival)) => matrix.retain_competitors(&[subject, rival]),
            _ => matrix,
        }
    }

    /// Why a panel that was never requested has nothing to show.
    pub fn idle_panel_notice(&self) -> PanelNotice {
        if self.subject().is_none() {
            return PanelNotice::Hint("Please select a driver from the sidebar.".to_string());
        }
        if let Some(err) = self.standings.years_error() {
            return PanelNotice::Error(err.to_string());
        }
        match self.active_season() {
            Some(_) => PanelNotice::Hint("Nothing requested yet.".to_string()),
            None if self.standings.is_loading() => {
                PanelNotice::Hint("Loading seasons...".to_string())
            }
            None => PanelNotice::Hint("No season selected.".to_string()),
        }
    }

    fn season_panel_requests(&mut self) -> Vec<ProviderCommand> {
        let (Some(subject), Some(season)) = (
            self.subject().map(str::to_string),
            self.active_season(),
        ) else {
            self.points = Loadable::NotRequested;
            self.grid = Loadable::NotRequested;
            return Vec::new();
        };
        self.points = Loadable::Loading;
        self.grid = Loadable::Loading;
        vec![
            ProviderCommand::FetchDriverPoints {
                subject: subject.clone(),
                season,
            },
            ProviderCommand::FetchStartingPositions { subject, season },
        ]
    }

    fn reset_driver_panels(&mut self) {
        self.driver_stats = Loadable::NotRequested;
        self.points = Loadable::NotRequested;
        self.grid = Loadable::NotRequested;
        self.podiums = Loadable::NotRequested;
    }

    fn is_current(&self, subject: &str, season: Option<i32>) -> bool {
        self.subject() == Some(subject) && season.is_none_or(|s| self.active_season() == Some(s))
    }
}

/// Commits a worker result. Results for a driver or season that is no longer
/// selected are dropped. Returns the follow-up requests a result unlocks.
pub fn apply_delta(state: &mut AppState, delta: Delta) -> Vec<ProviderCommand> {
    match delta {
        Delta::SetDrivers(Ok(mut drivers)) => {
            drivers.sort_by(|a, b| a.full_name.cmp(&b.full_name));
            let count = drivers.len();
            let subject_pos = state
                .subject()
                .and_then(|s| drivers.iter().position(|d| d.driver == s));
            state.drivers = Loadable::Loaded(drivers);
            state.sidebar_selected = subject_pos.unwrap_or(0);
            state.push_log(format!("[INFO] Loaded {count} drivers"));
            Vec::new()
        }
        Delta::SetDrivers(Err(err)) => {
            state.drivers = Loadable::Failed("Failed to fetch drivers".to_string());
            state.push_log(format!("[WARN] Drivers error: {err}"));
            Vec::new()
        }
        Delta::SeasonsLoaded {
            generation,
            subject,
            result,
        } => {
            if let Err(err) = &result
                && state.subject() == Some(subject.as_str())
            {
                state.push_log(format!("[WARN] Seasons error for {subject}: {err}"));
            }
            let Some(req) = state.standings.complete_seasons(generation, result) else {
                return Vec::new();
            };
            let mut cmds = vec![req.into()];
            cmds.extend(state.season_panel_requests());
            cmds
        }
        Delta::StandingsLoaded {
            generation,
            subject,
            season,
            result,
        } => {
            let detail = result.as_ref().err().cloned();
            if !state.standings.complete_standings(generation, result) {
                state.push_log(format!(
                    "[INFO] Discarded stale standings for {subject} {season}"
                ));
            } else if let Some(err) = detail {
                state.push_log(format!("[WARN] Standings error for {subject} {season}: {err}"));
            }
            Vec::new()
        }
        Delta::DriverStatsLoaded { subject, result } => {
            if state.is_current(&subject, None) {
                state.driver_stats = commit(state, result, "driver stats", &subject);
            }
            Vec::new()
        }
        Delta::PointsLoaded {
            subject,
            season,
            result,
        } => {
            if state.is_current(&subject, Some(season)) {
                state.points = commit(state, result, "points by round", &subject);
            }
            Vec::new()
        }
        Delta::StartingPositionsLoaded {
            subject,
            season,
            result,
        } => {
            if state.is_current(&subject, Some(season)) {
                state.grid = commit(state, result, "starting positions", &subject);
            }
            Vec::new()
        }
        Delta::PodiumsLoaded { subject, result } => {
            if state.is_current(&subject, None) {
                state.podiums = commit(state, result, "podiums", &subject);
            }
            Vec::new()
        }
        Delta::Log(msg) => {
            state.push_log(msg);
            Vec::new()
        }
    }
}

fn commit<T>(
    state: &mut AppState,
    result: Result<T, String>,
    what: &str,
    subject: &str,
) -> Loadable<T> {
    match result {
        Ok(value) => Loadable::Loaded(value),
        Err(err) => {
            state.push_log(format!("[WARN] {what} error for {subject}: {err}"));
            Loadable::Failed(format!("Failed to fetch {what}"))
        }
    }
}

pub fn panel_label(panel: Panel) -> &'static str {
    match panel {
        Panel::Overview => "Overview",
        Panel::Standings => "Standings",
        Panel::Points => "Points",
        Panel::Grid => "Grid",
        Panel::Podiums => "Podiums",
    }
}
