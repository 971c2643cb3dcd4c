use crate::chore::{Chore, ChoreError, validate_chores};
use crate::fairness::FairnessConfig;
use crate::pool::PickOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Chore(#[from] ChoreError),
}

/// Weeks around "now" that generation and fairness look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryWindow {
    /// Weeks back the fairness model reads.
    pub lookback: u32,
    /// Weeks ahead schedules may be generated, and fairness reads.
    pub lookahead: u32,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self {
            lookback: 10,
            lookahead: 5,
        }
    }
}

impl HistoryWindow {
    pub fn offsets(&self) -> RangeInclusive<i64> {
        -i64::from(self.lookback)..=i64::from(self.lookahead)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub window: HistoryWindow,
    #[serde(default)]
    pub fairness: FairnessConfig,
    #[serde(default)]
    pub pick: PickOptions,
    /// People who are away and must not be picked for anything.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub unavailable: BTreeSet<String>,
    pub chores: Vec<Chore>,
}

impl SchedulerConfig {
    pub fn new(chores: Vec<Chore>) -> Result<Self, ConfigError> {
        validate_chores(&chores)?;
        Ok(Self {
            window: HistoryWindow::default(),
            fairness: FairnessConfig::default(),
            pick: PickOptions::default(),
            unavailable: BTreeSet::new(),
            chores,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = serde_json::from_str(json)?;
        validate_chores(&config.chores)?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: SchedulerConfig = serde_json::from_reader(file)?;
        validate_chores(&config.chores)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn is_available(&self, name: &str) -> bool {
        !self.unavailable.contains(name)
    }

    /// Marks `name` away or back. Returns false when nothing changed.
    pub fn set_available(&mut self, name: &str, available: bool) -> bool {
        if available {
            self.unavailable.remove(name)
        } else {
            self.unavailable.insert(name.to_string())
        }
    }

    pub fn find_chore(&self, name: &str) -> Option<&Chore> {
        self.chores
            .iter()
            .find(|chore| chore.name() == name)
            .or_else(|| self.chores.iter().find(|chore| chore.loosely_matches(name)))
    }
}
