#![cfg(feature = "sqlite")]

use chore_rota::persistence::{load_history_from_csv, save_history_to_csv};
use chore_rota::{
    AssignmentRecord, FixedClock, HistoryStore, MemoryHistory, ScheduleStore, SchedulerConfig,
    SqliteHistory, WeekIndex,
};
use tempfile::NamedTempFile;

fn wk(week: u32, year: i32) -> WeekIndex {
    WeekIndex::new(week, year).unwrap()
}

#[test]
fn sqlite_history_round_trip() {
    let file = NamedTempFile::new().unwrap();
    {
        let store = SqliteHistory::new(file.path()).unwrap();
        let mut record = AssignmentRecord::new("Dishes", "Any day this week", ["zoe", "ann"]);
        record.set_done("ann", true);
        store.write_record(wk(52, 2025), &record).unwrap();
        let bins = AssignmentRecord::new("Bins", "Due Friday on 02/01", ["bob"]);
        store.write_record(wk(1, 2026), &bins).unwrap();
    }

    let store = SqliteHistory::new(file.path()).unwrap();
    let week = store.read_week(wk(52, 2025)).unwrap().unwrap();
    // Assignee order survives storage.
    assert_eq!(week["Dishes"].names().collect::<Vec<_>>(), vec!["zoe", "ann"]);
    assert!(week["Dishes"].assignee("ann").unwrap().done);
    assert_eq!(store.weeks().unwrap(), vec![wk(52, 2025), wk(1, 2026)]);
    assert!(store.read_week(wk(2, 2026)).unwrap().is_none());
}

#[test]
fn sqlite_write_replaces_record() {
    let store = SqliteHistory::in_memory().unwrap();
    let week = wk(5, 2025);
    store
        .write_record(week, &AssignmentRecord::new("Dishes", "", ["ann", "bob"]))
        .unwrap();
    store
        .write_record(week, &AssignmentRecord::new("Dishes", "", ["cat"]))
        .unwrap();
    let records = store.read_week(week).unwrap().unwrap();
    assert_eq!(records["Dishes"].names().collect::<Vec<_>>(), vec!["cat"]);
}

#[test]
fn sqlite_delete_from_counts_records() {
    let store = SqliteHistory::in_memory().unwrap();
    let rows = [
        (wk(50, 2025), "Dishes"),
        (wk(51, 2025), "Dishes"),
        (wk(51, 2025), "Bins"),
        (wk(1, 2026), "Dishes"),
    ];
    for (week, chore) in rows {
        store
            .write_record(week, &AssignmentRecord::new(chore, "", ["ann", "bob"]))
            .unwrap();
    }
    assert_eq!(store.delete_from(wk(51, 2025)).unwrap(), 3);
    assert_eq!(store.weeks().unwrap(), vec![wk(50, 2025)]);
}

#[test]
fn schedule_store_runs_on_sqlite() {
    let config = SchedulerConfig::from_json_str(
        r#"{"chores": [{"name": "Dishes", "namelist": ["ann", "bob", "cat"], "assignee_count": 1, "rule": "Once per week."}]}"#,
    )
    .unwrap();
    let now = wk(30, 2025);
    let store = ScheduleStore::new(SqliteHistory::in_memory().unwrap(), config)
        .with_clock(FixedClock(now))
        .with_seed(4);
    let generated = store.get_week(now).unwrap();
    assert_eq!(store.get_week(now).unwrap(), generated);

    let name = generated.records().unwrap()["Dishes"].assignees[0].name.clone();
    store.mark_done(now, "Dishes", &name).unwrap();

    let csv = NamedTempFile::new().unwrap();
    assert_eq!(save_history_to_csv(store.history(), csv.path()).unwrap(), 1);
    let copy = MemoryHistory::new();
    load_history_from_csv(&copy, csv.path()).unwrap();
    let copied = copy.read_week(now).unwrap().unwrap();
    assert!(copied["Dishes"].assignee(&name).unwrap().done);
}
