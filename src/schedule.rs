use crate::chore::Chore;
use crate::config::SchedulerConfig;
use crate::fairness::FairnessModel;
use crate::persistence::{HistoryStore, PersistenceError};
use crate::pool::PoolError;
use crate::record::{AssignmentRecord, WeekRecords};
use crate::week::{WeekError, WeekIndex};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(
        "week {target} is {ahead} week(s) ahead; schedules are generated at most {limit} week(s) ahead"
    )]
    OutOfGenerationRange {
        target: WeekIndex,
        ahead: i64,
        limit: u32,
    },
    #[error("week {0} is in the past; past schedules are never generated")]
    PastWeek(WeekIndex),
    #[error("no assignment for '{chore}' in week {week}")]
    RecordNotFound { week: WeekIndex, chore: String },
    #[error("'{name}' is not assigned to '{chore}' in week {week}")]
    AssigneeNotFound {
        week: WeekIndex,
        chore: String,
        name: String,
    },
    #[error("'{name}' is already assigned to '{chore}' in week {week}")]
    DuplicateAssignee {
        week: WeekIndex,
        chore: String,
        name: String,
    },
    #[error("unknown chore '{0}'")]
    UnknownChore(String),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Week(#[from] WeekError),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Source of "the present week".
pub trait Clock: Send + Sync {
    fn current_week(&self) -> WeekIndex;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_week(&self) -> WeekIndex {
        WeekIndex::today()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub WeekIndex);

impl Clock for FixedClock {
    fn current_week(&self) -> WeekIndex {
        self.0
    }
}

/// Result of looking up a week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeekLookup {
    Available(WeekRecords),
    /// A past week nobody ever generated.
    NotGenerated,
}

impl WeekLookup {
    pub fn records(&self) -> Option<&WeekRecords> {
        match self {
            WeekLookup::Available(records) => Some(records),
            WeekLookup::NotGenerated => None,
        }
    }

    pub fn into_records(self) -> Option<WeekRecords> {
        match self {
            WeekLookup::Available(records) => Some(records),
            WeekLookup::NotGenerated => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub week: WeekIndex,
    /// Chores assigned by this call, in processing order.
    pub generated: Vec<String>,
    /// Due chores that already had a record.
    pub existing: Vec<String>,
    /// Chores that could not be assigned, with the reason.
    pub failed: Vec<(String, String)>,
    #[serde(skip)]
    pub records: WeekRecords,
}

impl GenerationSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = vec![format!("week={}", self.week)];
        parts.push(format!("generated={}", self.generated.len()));
        if !self.existing.is_empty() {
            parts.push(format!("existing={}", self.existing.len()));
        }
        if !self.failed.is_empty() {
            let failed = self
                .failed
                .iter()
                .map(|(chore, _)| chore.as_str())
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("failed={failed}"));
        }
        parts.join(", ")
    }
}

/// Lazily generated weekly assignments on top of a [`HistoryStore`].
///
/// A week is generated the first time it is requested (if it is not in the
/// past and not beyond the generation window) and served from history from
/// then on. Generation and mutation of a week are serialized by a per-week
/// lock, so concurrent callers never generate the same week twice.
pub struct ScheduleStore<H> {
    history: H,
    config: SchedulerConfig,
    fairness: FairnessModel,
    clock: Box<dyn Clock>,
    rng: Mutex<StdRng>,
    week_locks: Mutex<HashMap<WeekIndex, Arc<Mutex<()>>>>,
}

impl<H: HistoryStore> ScheduleStore<H> {
    pub fn new(history: H, config: SchedulerConfig) -> Self {
        let fairness = FairnessModel::new(config.fairness, config.window);
        Self {
            history,
            config,
            fairness,
            clock: Box::new(SystemClock),
            rng: Mutex::new(StdRng::from_entropy()),
            week_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    /// Marks `name` away (never picked by later generation) or back.
    /// Weeks generated already keep their assignments.
    pub fn set_available(&mut self, name: &str, available: bool) -> bool {
        let changed = self.config.set_available(name, available);
        if changed {
            info!(name, available, "availability changed");
        }
        changed
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn current_week(&self) -> WeekIndex {
        self.clock.current_week()
    }

    pub fn chore(&self, name: &str) -> ScheduleResult<&Chore> {
        self.config
            .find_chore(name)
            .ok_or_else(|| ScheduleError::UnknownChore(name.to_string()))
    }

    pub fn due_chores(&self, week: WeekIndex) -> Vec<&Chore> {
        self.config
            .chores
            .iter()
            .filter(|chore| chore.rule().is_due(week))
            .collect()
    }

    /// Records for `target`, generating missing due chores when `target` is
    /// the current week or inside the forward window.
    pub fn get_week(&self, target: WeekIndex) -> ScheduleResult<WeekLookup> {
        let existing = self.history.read_week(target)?;
        if let Some(records) = &existing {
            if self.missing_chores(target, records).is_empty() {
                return Ok(WeekLookup::Available(records.clone()));
            }
        }
        if target < self.current_week() {
            return Ok(existing.map_or(WeekLookup::NotGenerated, WeekLookup::Available));
        }
        let summary = self.generate_week(target)?;
        Ok(WeekLookup::Available(summary.records))
    }

    /// Assigns every due chore of `target` that has no record yet.
    ///
    /// A chore that fails to assign is logged and reported in the summary;
    /// the remaining chores are still processed.
    pub fn generate_week(&self, target: WeekIndex) -> ScheduleResult<GenerationSummary> {
        let now = self.current_week();
        if target < now {
            return Err(ScheduleError::PastWeek(target));
        }
        let ahead = target - now;
        if ahead > i64::from(self.config.window.lookahead) {
            return Err(ScheduleError::OutOfGenerationRange {
                target,
                ahead,
                limit: self.config.window.lookahead,
            });
        }

        let lock = self.week_lock(target);
        let _guard = lock.lock();

        let mut records = self.history.read_week(target)?.unwrap_or_default();
        let mut missing = self.missing_chores(target, &records);
        missing.shuffle(&mut *self.rng.lock());

        let mut summary = GenerationSummary {
            week: target,
            generated: Vec::new(),
            existing: self
                .due_chores(target)
                .iter()
                .filter(|chore| records.contains_key(chore.name()))
                .map(|chore| chore.name().to_string())
                .collect(),
            failed: Vec::new(),
            records: WeekRecords::new(),
        };

        let mut committed: HashSet<String> = records
            .values()
            .flat_map(|record| record.names().map(str::to_string))
            .collect();

        for chore in missing {
            let outcome = self
                .assign_chore(chore, target, now, &committed)
                .and_then(|record| {
                    self.history.write_record(target, &record)?;
                    Ok(record)
                });
            match outcome {
                Ok(record) => {
                    let assignees: Vec<&str> = record.names().collect();
                    info!(week = %target, chore = chore.name(), ?assignees, "assigned chore");
                    committed.extend(record.names().map(str::to_string));
                    summary.generated.push(chore.name().to_string());
                    records.insert(chore.name().to_string(), record);
                }
                Err(err) => {
                    error!(
                        week = %target,
                        chore = chore.name(),
                        error = %err,
                        "failed to assign chore"
                    );
                    summary.failed.push((chore.name().to_string(), err.to_string()));
                }
            }
        }

        summary.records = records;
        Ok(summary)
    }

    fn assign_chore(
        &self,
        chore: &Chore,
        target: WeekIndex,
        now: WeekIndex,
        committed: &HashSet<String>,
    ) -> ScheduleResult<AssignmentRecord> {
        // Away people are dropped outright, not just weighted to zero.
        let namelist = chore.namelist().without(&self.config.unavailable);
        // Weights reflect the present even when generating ahead.
        let mut pool = self.fairness.weighted_pool(&namelist, now, &self.history)?;
        pool.exclude(committed);

        let previous = match target.checked_sub_weeks(1) {
            Ok(week) => self.history.read_week(week)?,
            Err(_) => None,
        };
        if let Some(last) = previous.as_ref().and_then(|r| r.get(chore.name())) {
            pool.exclude(last.names());
        }

        let names = {
            let mut rng = self.rng.lock();
            pool.pick(chore.assignee_count() as usize, &mut *rng, &self.config.pick)?
        };
        let double_booked: Vec<&String> =
            names.iter().filter(|n| committed.contains(*n)).collect();
        if !double_booked.is_empty() {
            warn!(
                week = %target,
                chore = chore.name(),
                ?double_booked,
                "ran out of free people; double-booking"
            );
        }

        Ok(AssignmentRecord::new(
            chore.name(),
            chore.rule().due_description(target),
            names,
        ))
    }

    fn missing_chores(&self, week: WeekIndex, records: &WeekRecords) -> Vec<&Chore> {
        self.due_chores(week)
            .into_iter()
            .filter(|chore| !records.contains_key(chore.name()))
            .collect()
    }

    fn week_lock(&self, week: WeekIndex) -> Arc<Mutex<()>> {
        let mut locks = self.week_locks.lock();
        // Entries nobody else holds can be rebuilt on demand.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(week).or_default().clone()
    }

    pub fn mark_done(
        &self,
        week: WeekIndex,
        chore: &str,
        name: &str,
    ) -> ScheduleResult<AssignmentRecord> {
        self.set_done(week, chore, name, Some(true))
    }

    pub fn mark_not_done(
        &self,
        week: WeekIndex,
        chore: &str,
        name: &str,
    ) -> ScheduleResult<AssignmentRecord> {
        self.set_done(week, chore, name, Some(false))
    }

    pub fn toggle_done(
        &self,
        week: WeekIndex,
        chore: &str,
        name: &str,
    ) -> ScheduleResult<AssignmentRecord> {
        self.set_done(week, chore, name, None)
    }

    fn set_done(
        &self,
        week: WeekIndex,
        chore: &str,
        name: &str,
        done: Option<bool>,
    ) -> ScheduleResult<AssignmentRecord> {
        self.mutate(week, chore, |record| {
            let current = record.assignee(name).map(|a| a.done).ok_or_else(|| {
                ScheduleError::AssigneeNotFound {
                    week,
                    chore: record.chore_name.clone(),
                    name: name.to_string(),
                }
            })?;
            record.set_done(name, done.unwrap_or(!current));
            Ok(())
        })
    }

    /// Hands `from`'s slot to `to`, keeping its done flag.
    pub fn reassign(
        &self,
        week: WeekIndex,
        chore: &str,
        from: &str,
        to: &str,
    ) -> ScheduleResult<AssignmentRecord> {
        self.mutate(week, chore, |record| {
            if record.contains(to) {
                return Err(ScheduleError::DuplicateAssignee {
                    week,
                    chore: record.chore_name.clone(),
                    name: to.to_string(),
                });
            }
            if !record.replace(from, to) {
                return Err(ScheduleError::AssigneeNotFound {
                    week,
                    chore: record.chore_name.clone(),
                    name: from.to_string(),
                });
            }
            Ok(())
        })
    }

    fn mutate<F>(&self, week: WeekIndex, chore: &str, apply: F) -> ScheduleResult<AssignmentRecord>
    where
        F: FnOnce(&mut AssignmentRecord) -> ScheduleResult<()>,
    {
        let lock = self.week_lock(week);
        let _guard = lock.lock();

        let not_found = || ScheduleError::RecordNotFound {
            week,
            chore: chore.to_string(),
        };
        let records = self.history.read_week(week)?.ok_or_else(not_found)?;
        let mut record = self
            .record_key(&records, chore)
            .and_then(|key| records.get(key).cloned())
            .ok_or_else(not_found)?;
        apply(&mut record)?;
        self.history.write_record(week, &record)?;
        info!(week = %week, chore = record.chore_name.as_str(), "updated assignment");
        Ok(record)
    }

    fn record_key<'a>(&self, records: &'a WeekRecords, chore: &str) -> Option<&'a str> {
        if let Some((key, _)) = records.get_key_value(chore) {
            return Some(key.as_str());
        }
        // Records may outlive their chore's configuration.
        let configured = self.config.find_chore(chore).map(Chore::name);
        records
            .keys()
            .find(|key| Some(key.as_str()) == configured)
            .map(String::as_str)
    }

    /// Drops every record from `week` on, e.g. after someone moves out.
    pub fn clear_from(&self, week: WeekIndex) -> ScheduleResult<usize> {
        let now = self.current_week();
        let horizon = now.checked_add_weeks(i64::from(self.config.window.lookahead))?;
        let earliest = now
            .checked_sub_weeks(i64::from(self.config.window.lookback))
            .unwrap_or(now);
        let mut guards = Vec::new();
        let mut cursor = week.max(earliest);
        while cursor <= horizon {
            guards.push(self.week_lock(cursor));
            match cursor.checked_add_weeks(1) {
                Ok(next) => cursor = next,
                Err(_) => break,
            }
        }
        let _held: Vec<_> = guards.iter().map(|lock| lock.lock()).collect();
        let removed = self.history.delete_from(week)?;
        warn!(from = %week, removed, "cleared assignments");
        Ok(removed)
    }

    /// Week after `week`, or `None` once it would leave the generation window.
    pub fn next_week(&self, week: WeekIndex) -> Option<WeekIndex> {
        let next = week.checked_add_weeks(1).ok()?;
        let ahead = next - self.current_week();
        (ahead <= i64::from(self.config.window.lookahead)).then_some(next)
    }

    /// Week before `week` worth showing: the previous week while in the
    /// future, otherwise the latest earlier week that has records.
    pub fn previous_week(&self, week: WeekIndex) -> ScheduleResult<Option<WeekIndex>> {
        if week > self.current_week() {
            return Ok(Some(week.checked_sub_weeks(1)?));
        }
        Ok(self
            .history
            .weeks()?
            .into_iter()
            .filter(|stored| *stored < week)
            .max())
    }

    /// First week from now, within the generation window, in which `chore`
    /// is due.
    pub fn next_due(&self, chore: &str) -> ScheduleResult<Option<WeekIndex>> {
        let chore = self.chore(chore)?;
        Ok(chore
            .rule()
            .next_due_on_or_after(self.current_week(), self.config.window.lookahead))
    }

    /// Current fairness weights for a chore's namelist.
    pub fn fairness_weights(&self, chore: &str) -> ScheduleResult<BTreeMap<String, f64>> {
        let chore = self.chore(chore)?;
        Ok(self
            .fairness
            .weights(chore.namelist(), self.current_week(), &self.history)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chore::{Namelist, NamelistEntry};
    use crate::persistence::MemoryHistory;
    use crate::recurrence::RecurrenceRule;

    fn wk(week: u32, year: i32) -> WeekIndex {
        WeekIndex::new(week, year).unwrap()
    }

    fn chore(name: &str, names: &[&str], count: u32, rule: &str) -> Chore {
        Chore::new(
            name,
            Namelist::singles(names.iter().copied()),
            count,
            rule.parse().unwrap(),
        )
        .unwrap()
    }

    fn store(chores: Vec<Chore>, now: WeekIndex) -> ScheduleStore<MemoryHistory> {
        ScheduleStore::new(MemoryHistory::new(), SchedulerConfig::new(chores).unwrap())
            .with_clock(FixedClock(now))
            .with_seed(17)
    }

    #[test]
    fn generation_is_idempotent() {
        let now = wk(10, 2025);
        let store = store(
            vec![chore("Dishes", &["a", "b", "c", "d"], 2, "Once per week.")],
            now,
        );
        let first = store.get_week(now).unwrap();
        let second = store.get_week(now).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.records().unwrap()["Dishes"].assignees.len(), 2);
    }

    #[test]
    fn no_one_is_double_booked() {
        let now = wk(10, 2025);
        let people = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let store = store(
            vec![
                chore("Dishes", &people, 2, "Once per week."),
                chore("Bins", &people, 2, "Once per week."),
                chore("Floors", &people, 2, "Once per week."),
            ],
            now,
        );
        for ahead in 0..=5 {
            let records = store.get_week(now + ahead).unwrap().into_records().unwrap();
            let mut seen = HashSet::new();
            for record in records.values() {
                for name in record.names() {
                    assert!(seen.insert(name.to_string()), "{name} double-booked");
                }
            }
            assert_eq!(seen.len(), 6);
        }
    }

    #[test]
    fn same_chore_is_not_repeated_next_week() {
        let now = wk(20, 2025);
        let store = store(vec![chore("Dishes", &["a", "b", "c", "d"], 2, "Once per week.")], now);
        let mut previous: Option<Vec<String>> = None;
        for ahead in 0..=5 {
            let records = store.get_week(now + ahead).unwrap().into_records().unwrap();
            let names: Vec<String> = records["Dishes"].names().map(str::to_string).collect();
            if let Some(previous) = &previous {
                assert!(names.iter().all(|n| !previous.contains(n)));
            }
            previous = Some(names);
        }
    }

    #[test]
    fn only_due_chores_are_generated() {
        let now = wk(1, 2025);
        let store = store(
            vec![
                chore("Weekly", &["a", "b"], 1, "Once per week."),
                chore("Biweekly", &["c", "d"], 1, "Once per 2 weeks on Monday."),
            ],
            now,
        );
        let week1 = store.get_week(wk(1, 2025)).unwrap().into_records().unwrap();
        assert!(week1.contains_key("Weekly"));
        assert!(!week1.contains_key("Biweekly"));
        let week2 = store.get_week(wk(2, 2025)).unwrap().into_records().unwrap();
        assert_eq!(week2["Biweekly"].due, "Due Monday on 06/01");
    }

    #[test]
    fn past_weeks_are_never_generated() {
        let now = wk(10, 2025);
        let store = store(vec![chore("Dishes", &["a", "b"], 1, "Once per week.")], now);
        assert_eq!(store.get_week(now - 1).unwrap(), WeekLookup::NotGenerated);
        assert!(matches!(
            store.generate_week(now - 1),
            Err(ScheduleError::PastWeek(_))
        ));
        assert!(store.history().weeks().unwrap().is_empty());
    }

    #[test]
    fn weeks_beyond_window_are_rejected() {
        let now = wk(10, 2025);
        let store = store(vec![chore("Dishes", &["a", "b"], 1, "Once per week.")], now);
        assert!(store.get_week(now + 5).is_ok());
        assert!(matches!(
            store.get_week(now + 6),
            Err(ScheduleError::OutOfGenerationRange { ahead: 6, limit: 5, .. })
        ));
    }

    #[test]
    fn failing_chore_does_not_block_others() {
        let now = wk(10, 2025);
        let grouped = Chore::new(
            "Garden",
            Namelist::new(vec![
                NamelistEntry::Group(vec!["x".into(), "y".into(), "z".into()]),
                NamelistEntry::Single("w".into()),
            ]),
            1,
            RecurrenceRule::weekly(),
        )
        .unwrap();
        let mut config = SchedulerConfig::new(vec![
            grouped,
            chore("Dishes", &["a", "b"], 1, "Once per week."),
        ])
        .unwrap();
        config.pick.starvation = crate::pool::StarvationPolicy::Fail;
        config.pick.max_draws = 4;
        let store = ScheduleStore::new(MemoryHistory::new(), config)
            .with_clock(FixedClock(now))
            .with_seed(3);

        // w did Garden last week, so only the 3-group has weight.
        store
            .history()
            .write_record(now - 1, &AssignmentRecord::new("Garden", "", ["w"]))
            .unwrap();
        let summary = store.generate_week(now).unwrap();
        assert_eq!(summary.generated, vec!["Dishes".to_string()]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "Garden");
        assert!(summary.to_cli_summary().contains("failed=Garden"));
    }

    #[test]
    fn mutations_require_existing_records() {
        let now = wk(10, 2025);
        let store = store(vec![chore("Dishes", &["a", "b", "c"], 1, "Once per week.")], now);
        assert!(matches!(
            store.mark_done(now, "Dishes", "a"),
            Err(ScheduleError::RecordNotFound { .. })
        ));

        let records = store.get_week(now).unwrap().into_records().unwrap();
        let assignee = records["Dishes"].assignees[0].name.clone();
        let record = store.mark_done(now, "dishes", &assignee).unwrap();
        assert!(record.assignee(&assignee).unwrap().done);
        let record = store.toggle_done(now, "Dishes", &assignee).unwrap();
        assert!(!record.assignee(&assignee).unwrap().done);
        assert!(matches!(
            store.mark_not_done(now, "Dishes", "nobody"),
            Err(ScheduleError::AssigneeNotFound { .. })
        ));
    }

    #[test]
    fn reassign_swaps_names() {
        let now = wk(10, 2025);
        let store = store(vec![chore("Dishes", &["a", "b", "c"], 1, "Once per week.")], now);
        let records = store.get_week(now).unwrap().into_records().unwrap();
        let from = records["Dishes"].assignees[0].name.clone();
        store.mark_done(now, "Dishes", &from).unwrap();

        let record = store.reassign(now, "Dishes", &from, "zoe").unwrap();
        assert!(!record.contains(&from));
        assert!(record.assignee("zoe").unwrap().done);
        assert!(matches!(
            store.reassign(now, "Dishes", "zoe", "zoe"),
            Err(ScheduleError::DuplicateAssignee { .. })
        ));
        assert_eq!(
            store.get_week(now).unwrap().records().unwrap()["Dishes"],
            record
        );
    }

    #[test]
    fn clear_from_allows_regeneration() {
        let now = wk(10, 2025);
        let store = store(vec![chore("Dishes", &["a", "b", "c"], 1, "Once per week.")], now);
        store.get_week(now).unwrap();
        store.get_week(now + 1).unwrap();
        assert_eq!(store.clear_from(now + 1).unwrap(), 1);
        assert_eq!(store.history().weeks().unwrap(), vec![now]);
    }

    #[test]
    fn navigation_respects_window_and_history() {
        let now = wk(10, 2025);
        let store = store(vec![chore("Dishes", &["a", "b"], 1, "Once per week.")], now);
        assert_eq!(store.next_week(now), Some(now + 1));
        assert_eq!(store.next_week(now + 5), None);
        assert_eq!(store.previous_week(now + 2).unwrap(), Some(now + 1));
        assert_eq!(store.previous_week(now).unwrap(), None);

        store
            .history()
            .write_record(now - 4, &AssignmentRecord::new("Dishes", "", ["a"]))
            .unwrap();
        assert_eq!(store.previous_week(now).unwrap(), Some(now - 4));
    }

    #[test]
    fn fairness_weights_reflect_history() {
        let now = wk(10, 2025);
        let store = store(vec![chore("Dishes", &["a", "b"], 1, "Once per week.")], now);
        store
            .history()
            .write_record(now - 1, &AssignmentRecord::new("Dishes", "", ["a"]))
            .unwrap();
        let weights = store.fairness_weights("Dishes").unwrap();
        assert!(weights["a"] > weights["b"]);
        assert!(matches!(
            store.fairness_weights("Laundry"),
            Err(ScheduleError::UnknownChore(_))
        ));
    }

    #[test]
    fn unavailable_people_are_never_picked() {
        let now = wk(10, 2025);
        let mut store = store(
            vec![chore("Dishes", &["a", "b", "c", "d"], 1, "Once per week.")],
            now,
        );
        assert!(store.set_available("a", false));
        assert!(store.set_available("b", false));
        for ahead in 0..=5 {
            let records = store.get_week(now + ahead).unwrap().into_records().unwrap();
            let name = records["Dishes"].assignees[0].name.clone();
            assert!(name == "c" || name == "d", "picked {name}");
        }
        assert!(store.set_available("a", true));
        assert!(!store.set_available("a", true));
    }

    #[test]
    fn chore_fails_when_everyone_is_away() {
        let now = wk(10, 2025);
        let mut store = store(vec![chore("Dishes", &["a", "b"], 1, "Once per week.")], now);
        store.set_available("a", false);
        store.set_available("b", false);
        let summary = store.generate_week(now).unwrap();
        assert!(summary.generated.is_empty());
        assert_eq!(summary.failed[0].0, "Dishes");
        assert!(store.history().read_week(now).unwrap().is_none());
    }

    #[test]
    fn clear_from_near_the_last_year_reports_overflow() {
        let now = wk(50, 9999);
        let store = store(vec![chore("Dishes", &["a", "b"], 1, "Once per week.")], now);
        assert!(matches!(store.clear_from(now), Err(ScheduleError::Week(_))));
    }

    #[test]
    fn next_due_looks_inside_window() {
        let now = wk(1, 2025);
        let store = store(
            vec![
                chore("Bins", &["a", "b"], 1, "Once per 2 weeks on Tuesday."),
                chore("Defrost", &["a", "b"], 1, "Weeks in 2025: 30"),
            ],
            now,
        );
        assert_eq!(store.next_due("bins").unwrap(), Some(wk(2, 2025)));
        assert_eq!(store.next_due("Defrost").unwrap(), None);
        assert!(matches!(
            store.next_due("Laundry"),
            Err(ScheduleError::UnknownChore(_))
        ));
    }
}
