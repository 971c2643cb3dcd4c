use crate::chore::Namelist;
use crate::config::HistoryWindow;
use crate::persistence::{HistoryStore, PersistenceResult};
use crate::pool::{DISCARDED, WeightedPool};
use crate::week::WeekIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Weight adjustments applied per historical assignment.
///
/// The defaults were tuned by hand against a real household and are not
/// derived from any model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairnessConfig {
    pub baseline: f64,
    /// Past assignment that was done.
    pub past_done: f64,
    /// Past assignment that was skipped.
    pub past_missed: f64,
    /// Current or future assignment, done or not.
    pub upcoming: f64,
    /// `upcoming` only applies while the weight is above this.
    pub upcoming_floor: f64,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            baseline: 16.0,
            past_done: -1.8,
            past_missed: 4.5,
            upcoming: -0.9,
            upcoming_floor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FairnessModel {
    config: FairnessConfig,
    window: HistoryWindow,
}

impl FairnessModel {
    pub fn new(config: FairnessConfig, window: HistoryWindow) -> Self {
        Self { config, window }
    }

    pub fn config(&self) -> &FairnessConfig {
        &self.config
    }

    /// Pool for `namelist` weighted by the history around `at_week`.
    pub fn weighted_pool<H>(
        &self,
        namelist: &Namelist,
        at_week: WeekIndex,
        history: &H,
    ) -> PersistenceResult<WeightedPool>
    where
        H: HistoryStore + ?Sized,
    {
        let weights = self.weights(namelist, at_week, history)?;
        let mut pool = WeightedPool::from_namelist(namelist, self.config.baseline);
        for (name, weight) in &weights {
            pool.set_weight(name, *weight);
        }
        Ok(pool)
    }

    /// Per-person weights for `namelist` at `at_week`.
    pub fn weights<H>(
        &self,
        namelist: &Namelist,
        at_week: WeekIndex,
        history: &H,
    ) -> PersistenceResult<BTreeMap<String, f64>>
    where
        H: HistoryStore + ?Sized,
    {
        let mut weights: BTreeMap<String, f64> = namelist
            .names()
            .map(|name| (name.to_string(), self.config.baseline))
            .collect();

        for offset in self.window.offsets() {
            let Ok(week) = at_week.checked_add_weeks(offset) else {
                continue;
            };
            let Some(records) = history.read_week(week)? else {
                continue;
            };
            let is_past = week < at_week;
            for record in records.values() {
                for assignee in &record.assignees {
                    let Some(weight) = weights.get_mut(&assignee.name) else {
                        continue;
                    };
                    if is_past {
                        *weight += if assignee.done {
                            self.config.past_done
                        } else {
                            self.config.past_missed
                        };
                    } else if *weight > self.config.upcoming_floor {
                        *weight += self.config.upcoming;
                    }
                    *weight = weight.max(DISCARDED);
                }
            }
        }

        trace!(%at_week, ?weights, "fairness weights");
        Ok(weights)
    }
}
