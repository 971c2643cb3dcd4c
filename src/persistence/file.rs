use super::{HistoryMap, HistoryStore, PersistenceError, PersistenceResult};
use crate::record::{Assignee, AssignmentRecord, WeekRecords};
use crate::week::WeekIndex;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
struct WeekSnapshot {
    week: WeekIndex,
    records: Vec<AssignmentRecord>,
}

#[derive(Serialize, Deserialize, Default)]
struct HistorySnapshot {
    weeks: Vec<WeekSnapshot>,
}

impl HistorySnapshot {
    fn from_map(map: &HistoryMap) -> Self {
        Self {
            weeks: map
                .iter()
                .map(|(week, records)| WeekSnapshot {
                    week: *week,
                    records: records.values().cloned().collect(),
                })
                .collect(),
        }
    }

    fn into_map(self) -> HistoryMap {
        let mut map = HistoryMap::new();
        for snapshot in self.weeks {
            let records: WeekRecords = snapshot
                .records
                .into_iter()
                .map(|record| (record.chore_name.clone(), record))
                .collect();
            map.insert(snapshot.week, records);
        }
        map
    }
}

/// History kept in memory and rewritten to a pretty-printed JSON file after
/// every change.
#[derive(Debug)]
pub struct JsonFileHistory {
    path: PathBuf,
    weeks: RwLock<HistoryMap>,
}

impl JsonFileHistory {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let weeks = if path.exists() && fs::metadata(&path)?.len() > 0 {
            let file = File::open(&path)?;
            let snapshot: HistorySnapshot = serde_json::from_reader(file)?;
            snapshot.into_map()
        } else {
            HistoryMap::new()
        };
        Ok(Self {
            path,
            weeks: RwLock::new(weeks),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, map: &HistoryMap) -> PersistenceResult<()> {
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(file, &HistorySnapshot::from_map(map))?;
        Ok(())
    }
}

impl HistoryStore for JsonFileHistory {
    fn read_week(&self, week: WeekIndex) -> PersistenceResult<Option<WeekRecords>> {
        Ok(self.weeks.read().get(&week).cloned())
    }

    fn write_record(&self, week: WeekIndex, record: &AssignmentRecord) -> PersistenceResult<()> {
        let mut map = self.weeks.write();
        let mut next = map.clone();
        super::insert_record(&mut next, week, record);
        // Memory only moves once the file does.
        self.flush(&next)?;
        *map = next;
        Ok(())
    }

    fn delete_from(&self, week: WeekIndex) -> PersistenceResult<usize> {
        let mut map = self.weeks.write();
        let mut next = map.clone();
        let removed = super::split_off_from(&mut next, week);
        self.flush(&next)?;
        *map = next;
        Ok(removed)
    }

    fn weeks(&self) -> PersistenceResult<Vec<WeekIndex>> {
        Ok(self.weeks.read().keys().copied().collect())
    }
}

/// One CSV row per assignee.
#[derive(Debug, Serialize, Deserialize)]
struct AssignmentCsvRecord {
    year: i32,
    week: u32,
    chore_name: String,
    due: String,
    assignee: String,
    done: bool,
}

pub fn save_history_to_csv<S, P>(store: &S, path: P) -> PersistenceResult<usize>
where
    S: HistoryStore + ?Sized,
    P: AsRef<Path>,
{
    let mut writer = csv::Writer::from_path(path)?;
    let mut rows = 0;
    for week in store.weeks()? {
        let Some(records) = store.read_week(week)? else {
            continue;
        };
        for record in records.values() {
            for assignee in &record.assignees {
                writer.serialize(AssignmentCsvRecord {
                    year: week.year(),
                    week: week.week(),
                    chore_name: record.chore_name.clone(),
                    due: record.due.clone(),
                    assignee: assignee.name.clone(),
                    done: assignee.done,
                })?;
                rows += 1;
            }
        }
    }
    writer.flush()?;
    Ok(rows)
}

/// Loads CSV rows written by [`save_history_to_csv`] into `store`,
/// replacing records for the same `(week, chore)`. Returns the number of
/// chore records written.
pub fn load_history_from_csv<S, P>(store: &S, path: P) -> PersistenceResult<usize>
where
    S: HistoryStore + ?Sized,
    P: AsRef<Path>,
{
    let mut reader = csv::Reader::from_path(path)?;
    let mut records: Vec<(WeekIndex, AssignmentRecord)> = Vec::new();
    for row in reader.deserialize() {
        let row: AssignmentCsvRecord = row?;
        let week = WeekIndex::new(row.week, row.year)?;
        if row.assignee.trim().is_empty() {
            return Err(PersistenceError::InvalidData(format!(
                "empty assignee for '{}' in week {}",
                row.chore_name, week
            )));
        }
        let assignee = Assignee {
            name: row.assignee,
            done: row.done,
        };
        match records
            .iter_mut()
            .find(|(w, r)| *w == week && r.chore_name == row.chore_name)
        {
            Some((_, record)) => record.assignees.push(assignee),
            None => records.push((
                week,
                AssignmentRecord {
                    chore_name: row.chore_name,
                    due: row.due,
                    assignees: vec![assignee],
                },
            )),
        }
    }
    for (week, record) in &records {
        store.write_record(*week, record)?;
    }
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryHistory;
    use tempfile::{NamedTempFile, TempDir};

    fn wk(week: u32, year: i32) -> WeekIndex {
        WeekIndex::new(week, year).unwrap()
    }

    #[test]
    fn json_history_survives_reopen() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let store = JsonFileHistory::open(tmp.path()).unwrap();
            let mut record = AssignmentRecord::new("Dishes", "Any day this week", ["ann", "bob"]);
            record.set_done("bob", true);
            store.write_record(wk(4, 2025), &record).unwrap();
        }
        let reopened = JsonFileHistory::open(tmp.path()).unwrap();
        let week = reopened.read_week(wk(4, 2025)).unwrap().unwrap();
        assert!(week["Dishes"].assignee("bob").unwrap().done);
        assert_eq!(reopened.weeks().unwrap(), vec![wk(4, 2025)]);
    }

    #[test]
    fn failed_flush_leaves_history_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let store = JsonFileHistory::open(&path).unwrap();
        let record = AssignmentRecord::new("Dishes", "Any day this week", ["ann"]);
        store.write_record(wk(4, 2025), &record).unwrap();

        // Replace the file's directory so every later flush fails.
        fs::remove_dir_all(dir.path()).unwrap();
        assert!(store.write_record(wk(5, 2025), &record).is_err());
        assert!(store.read_week(wk(5, 2025)).unwrap().is_none());
        assert!(store.delete_from(wk(4, 2025)).is_err());
        assert!(store.read_week(wk(4, 2025)).unwrap().is_some());
        assert_eq!(store.weeks().unwrap(), vec![wk(4, 2025)]);
    }

    #[test]
    fn write_under_missing_directory_is_not_kept() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileHistory::open(dir.path().join("missing").join("history.json")).unwrap();
        let record = AssignmentRecord::new("Dishes", "Any day this week", ["ann"]);
        assert!(matches!(
            store.write_record(wk(4, 2025), &record),
            Err(PersistenceError::Io(_))
        ));
        assert!(store.read_week(wk(4, 2025)).unwrap().is_none());
    }

    #[test]
    fn csv_export_and_import() {
        let source = MemoryHistory::new();
        let bins = AssignmentRecord::new("Bins", "Due Friday on 26/12", ["ann", "bob"]);
        let dishes = AssignmentRecord::new("Dishes", "Any day this week", ["cat"]);
        source.write_record(wk(52, 2025), &bins).unwrap();
        source.write_record(wk(1, 2026), &dishes).unwrap();

        let tmp = NamedTempFile::new().unwrap();
        assert_eq!(save_history_to_csv(&source, tmp.path()).unwrap(), 3);

        let target = MemoryHistory::new();
        assert_eq!(load_history_from_csv(&target, tmp.path()).unwrap(), 2);
        assert_eq!(
            target.read_week(wk(52, 2025)).unwrap(),
            source.read_week(wk(52, 2025)).unwrap()
        );
        assert_eq!(target.weeks().unwrap(), vec![wk(52, 2025), wk(1, 2026)]);
    }
}
