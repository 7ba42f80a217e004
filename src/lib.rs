//! Service history viewer
//!
//! Fetches the per-tick status checks of every team for one service and paints
//! them as a table: one row per team, one column per tick, each cell colored by
//! the outcome of the check.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod html;
pub mod page;
pub mod render;
pub mod server;

pub use config::{load_config, Config};
pub use error::{Result, ViewerError};

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display, ops::RangeInclusive};

/// Widest tick range a document may cover.
pub const MAX_TICK_SPAN: usize = 100_000;

/// The check history of one service, as returned by `service-history.json`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceHistory {
    pub service_name: String,
    pub service_slug: String,
    pub min_tick: i64,
    pub max_tick: i64,
    pub status_descriptions: StatusDescriptions,
    /// Base URL of the log search tool, if the deployment has one.
    #[serde(default)]
    pub graylog_search_url: Option<String>,
    pub teams: Vec<Team>,
}

impl ServiceHistory {
    /// Ticks covered by the document, both ends inclusive.
    pub fn ticks(&self) -> RangeInclusive<i64> {
        self.min_tick..=self.max_tick
    }

    pub fn tick_count(&self) -> usize {
        let span = self
            .max_tick
            .saturating_sub(self.min_tick)
            .saturating_add(1);
        usize::try_from(span).unwrap_or(0)
    }

    /// Checks the shape the renderer relies on: a sane tick range and one
    /// status code per tick for every team.
    pub fn validate(&self) -> Result<()> {
        if self.max_tick < self.min_tick.saturating_sub(1) {
            return Err(ViewerError::InvalidDocument(format!(
                "max-tick {} is below min-tick {}",
                self.max_tick, self.min_tick
            )));
        }

        let expected = self.tick_count();
        if expected > MAX_TICK_SPAN {
            return Err(ViewerError::InvalidDocument(format!(
                "ticks {}..={} span more than {} ticks",
                self.min_tick, self.max_tick, MAX_TICK_SPAN
            )));
        }
        if let Some(team) = self.teams.iter().find(|t| t.checks.len() != expected) {
            return Err(ViewerError::InvalidDocument(format!(
                "team {} has {} checks, expected {} for ticks {}..={}",
                team.id,
                team.checks.len(),
                expected,
                self.min_tick,
                self.max_tick
            )));
        }

        Ok(())
    }
}

/// One team's row of checks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Team {
    pub id: i64,
    pub name: String,
    /// One entry per tick, starting at the document's `min-tick`.
    pub checks: Vec<StatusCode>,
}

/// Outcome of a single check.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct StatusCode(pub i32);

impl StatusCode {
    /// No check was performed for this team and tick.
    pub const NOT_CHECKED: Self = Self(-1);

    pub fn is_checked(self) -> bool {
        self != Self::NOT_CHECKED
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Human-readable meaning of each status code.
///
/// Accepts either a JSON array indexed by code or an object keyed by the
/// decimal code, which is how `-1` gets a description.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(try_from = "RawDescriptions")]
pub struct StatusDescriptions(BTreeMap<StatusCode, String>);

impl StatusDescriptions {
    pub fn get(&self, code: StatusCode) -> Option<&str> {
        self.0.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(StatusCode, String)> for StatusDescriptions {
    fn from_iter<I: IntoIterator<Item = (StatusCode, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDescriptions {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl TryFrom<RawDescriptions> for StatusDescriptions {
    type Error = String;

    fn try_from(raw: RawDescriptions) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawDescriptions::List(list) => list
                .into_iter()
                .enumerate()
                .map(|(index, description)| {
                    i32::try_from(index)
                        .map(|code| (StatusCode(code), description))
                        .map_err(|_| format!("status code index {index} out of range"))
                })
                .collect(),
            RawDescriptions::Map(map) => map
                .into_iter()
                .map(|(key, description)| {
                    key.trim()
                        .parse()
                        .map(|code| (StatusCode(code), description))
                        .map_err(|_| format!("status code key {key:?} is not an integer"))
                })
                .collect(),
        }
    }
}
