use std::collections::BTreeMap;

use crate::standings::{SeriesStyle, StandingsMatrix, StandingsRecord, build_matrix, style_map};

pub const YEARS_ERROR: &str = "Failed to fetch available years";
pub const STANDINGS_ERROR: &str = "Failed to fetch driver standings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    LoadingYears,
    YearsLoaded,
    LoadingStandings,
    StandingsLoaded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Seasons {
        generation: u64,
        subject: String,
    },
    Standings {
        generation: u64,
        subject: String,
        season: i32,
    },
}

impl FetchRequest {
    pub fn generation(&self) -> u64 {
        match self {
            FetchRequest::Seasons { generation, .. } | FetchRequest::Standings { generation, .. } => {
                *generation
            }
        }
    }
}

/// Two-stage loader for the standings chart: available seasons for the subject,
/// then per-round standings for the active season.
///
/// Every request carries a fresh generation. A completion is committed only when
/// its generation is the one still outstanding for that stage, so responses that
/// were superseded by a later subject or season change are dropped on arrival.
#[derive(Debug, Clone)]
pub struct StandingsController {
    subject: Option<String>,
    seasons: Vec<i32>,
    active_season: Option<i32>,
    records: Vec<StandingsRecord>,
    phase: Phase,
    years_error: Option<String>,
    standings_error: Option<String>,
    generation: u64,
    pending_years: Option<u64>,
    pending_standings: Option<u64>,
}

impl Default for StandingsController {
    fn default() -> Self {
        Self::new()
    }
}

impl StandingsController {
    pub fn new() -> Self {
        Self {
            subject: None,
            seasons: Vec::new(),
            active_season: None,
            records: Vec::new(),
            phase: Phase::Idle,
            years_error: None,
            standings_error: None,
            generation: 0,
            pending_years: None,
            pending_standings: None,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn seasons(&self) -> &[i32] {
        &self.seasons
    }

    pub fn active_season(&self) -> Option<i32> {
        self.active_season
    }

    pub fn records(&self) -> &[StandingsRecord] {
        &self.records
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn years_error(&self) -> Option<&str> {
        self.years_error.as_deref()
    }

    pub fn standings_error(&self) -> Option<&str> {
        self.standings_error.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.years_error().or(self.standings_error())
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::LoadingYears | Phase::LoadingStandings)
    }

    pub fn matrix(&self) -> StandingsMatrix {
        build_matrix(&self.records)
    }

    pub fn styles(&self, matrix: &StandingsMatrix) -> BTreeMap<String, SeriesStyle> {
        style_map(matrix.competitors(), self.subject())
    }

    pub fn set_subject(&mut self, subject: Option<String>) -> Option<FetchRequest> {
        let subject = subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if subject.is_some() && subject == self.subject {
            return None;
        }

        self.subject = subject;
        self.seasons.clear();
        self.active_season = None;
        self.records.clear();
        self.years_error = None;
        self.standings_error = None;
        self.pending_years = None;
        self.pending_standings = None;

        if self.subject.is_none() {
            self.phase = Phase::Idle;
            return None;
        }
        Some(self.begin_years())
    }

    pub fn select_season(&mut self, season: i32) -> Option<FetchRequest> {
        self.subject.as_ref()?;
        // Only seasons the first stage reported are selectable.
        if self.active_season == Some(season) || !self.seasons.contains(&season) {
            return None;
        }
        self.active_season = Some(season);
        self.begin_standings()
    }

    /// Explicit retry of whichever stage last failed.
    pub fn retry(&mut self) -> Option<FetchRequest> {
        self.subject.as_ref()?;
        if self.years_error.is_some() {
            return Some(self.begin_years());
        }
        if self.standings_error.is_some() {
            return self.begin_standings();
        }
        None
    }

    pub fn complete_seasons(
        &mut self,
        generation: u64,
        result: Result<Vec<i32>, String>,
    ) -> Option<FetchRequest> {
        if self.pending_years != Some(generation) {
            return None;
        }
        self.pending_years = None;

        match result {
            Ok(years) => {
                self.years_error = None;
                self.seasons = years;
                match self.seasons.first().copied() {
                    Some(first) => {
                        self.active_season = Some(first);
                        self.begin_standings()
                    }
                    None => {
                        self.active_season = None;
                        self.phase = Phase::YearsLoaded;
                        None
                    }
                }
            }
            Err(_) => {
                self.seasons.clear();
                self.active_season = None;
                self.years_error = Some(YEARS_ERROR.to_string());
                self.phase = Phase::Error;
                None
            }
        }
    }

    /// Returns whether the completion was committed.
    pub fn complete_standings(
        &mut self,
        generation: u64,
        result: Result<Vec<StandingsRecord>, String>,
    ) -> bool {
        if self.pending_standings != Some(generation) {
            return false;
        }
        self.pending_standings = None;

        match result {
            Ok(records) => {
                self.records = records;
                self.standings_error = None;
                self.phase = Phase::StandingsLoaded;
            }
            Err(_) => {
                self.records.clear();
                self.standings_error = Some(STANDINGS_ERROR.to_string());
                self.phase = Phase::Error;
            }
        }
        true
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn begin_years(&mut self) -> FetchRequest {
        let generation = self.next_generation();
        self.pending_years = Some(generation);
        self.pending_standings = None;
        self.years_error = None;
        self.phase = Phase::LoadingYears;
        FetchRequest::Seasons {
            generation,
            subject: self.subject.clone().unwrap_or_default(),
        }
    }

    fn begin_standings(&mut self) -> Option<FetchRequest> {
        let subject = self.subject.clone()?;
        let season = self.active_season?;
        let generation = self.next_generation();
        // Clear before the request goes out so the chart never mixes seasons.
        self.records.clear();
        self.standings_error = None;
        self.pending_standings = Some(generation);
        self.phase = Phase::LoadingStandings;
        Some(FetchRequest::Standings {
            generation,
            subject,
            season,
        })
    }
}
