use crate::record::{AssignmentRecord, WeekRecords};
use crate::week::{WeekError, WeekIndex};
use parking_lot::RwLock;
use serde_json::Error as SerdeJsonError;
use std::collections::BTreeMap;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<WeekError> for PersistenceError {
    fn from(value: WeekError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Assignment history keyed by `(week, chore_name)`.
///
/// Each call is atomic on its own; callers coordinate anything larger.
pub trait HistoryStore {
    /// Records of `week`, or `None` when nothing was ever written for it.
    fn read_week(&self, week: WeekIndex) -> PersistenceResult<Option<WeekRecords>>;

    /// Inserts or replaces the record for `(week, record.chore_name)`.
    fn write_record(&self, week: WeekIndex, record: &AssignmentRecord) -> PersistenceResult<()>;

    /// Removes every record in `week` and later. Returns the number of
    /// chore records removed.
    fn delete_from(&self, week: WeekIndex) -> PersistenceResult<usize>;

    /// Weeks that hold at least one record, ascending.
    fn weeks(&self) -> PersistenceResult<Vec<WeekIndex>>;
}

pub(crate) type HistoryMap = BTreeMap<WeekIndex, WeekRecords>;

pub(crate) fn insert_record(map: &mut HistoryMap, week: WeekIndex, record: &AssignmentRecord) {
    map.entry(week)
        .or_default()
        .insert(record.chore_name.clone(), record.clone());
}

pub(crate) fn split_off_from(map: &mut HistoryMap, week: WeekIndex) -> usize {
    let removed = map.split_off(&week);
    removed.values().map(|records| records.len()).sum()
}

#[derive(Debug, Default)]
pub struct MemoryHistory {
    weeks: RwLock<HistoryMap>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistory {
    fn read_week(&self, week: WeekIndex) -> PersistenceResult<Option<WeekRecords>> {
        Ok(self.weeks.read().get(&week).cloned())
    }

    fn write_record(&self, week: WeekIndex, record: &AssignmentRecord) -> PersistenceResult<()> {
        insert_record(&mut self.weeks.write(), week, record);
        Ok(())
    }

    fn delete_from(&self, week: WeekIndex) -> PersistenceResult<usize> {
        Ok(split_off_from(&mut self.weeks.write(), week))
    }

    fn weeks(&self) -> PersistenceResult<Vec<WeekIndex>> {
        Ok(self.weeks.read().keys().copied().collect())
    }
}

impl<T: HistoryStore + ?Sized> HistoryStore for &T {
    fn read_week(&self, week: WeekIndex) -> PersistenceResult<Option<WeekRecords>> {
        (**self).read_week(week)
    }

    fn write_record(&self, week: WeekIndex, record: &AssignmentRecord) -> PersistenceResult<()> {
        (**self).write_record(week, record)
    }

    fn delete_from(&self, week: WeekIndex) -> PersistenceResult<usize> {
        (**self).delete_from(week)
    }

    fn weeks(&self) -> PersistenceResult<Vec<WeekIndex>> {
        (**self).weeks()
    }
}

impl<T: HistoryStore + ?Sized> HistoryStore for Box<T> {
    fn read_week(&self, week: WeekIndex) -> PersistenceResult<Option<WeekRecords>> {
        (**self).read_week(week)
    }

    fn write_record(&self, week: WeekIndex, record: &AssignmentRecord) -> PersistenceResult<()> {
        (**self).write_record(week, record)
    }

    fn delete_from(&self, week: WeekIndex) -> PersistenceResult<usize> {
        (**self).delete_from(week)
    }

    fn weeks(&self) -> PersistenceResult<Vec<WeekIndex>> {
        (**self).weeks()
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{JsonFileHistory, load_history_from_csv, save_history_to_csv};
