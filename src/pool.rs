use crate::chore::{Namelist, is_fillable};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Weight of a candidate that can no longer be drawn by the roulette wheel.
pub const DISCARDED: f64 = 0.0;

pub const DEFAULT_MAX_DRAWS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("cannot pick {requested} name(s) from a pool of {available}")]
    InsufficientCandidates { requested: usize, available: usize },
    #[error("no combination of the remaining groups fills {remaining} of {requested} slot(s)")]
    GroupStarvation { requested: usize, remaining: usize },
}

/// What `pick` does when whole groups can no longer fill the open slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarvationPolicy {
    /// Fill the remaining slots with individuals, splitting groups.
    #[default]
    BreakGroups,
    /// Give up with [`PoolError::GroupStarvation`].
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickOptions {
    pub max_draws: usize,
    pub starvation: StarvationPolicy,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_draws: DEFAULT_MAX_DRAWS,
            starvation: StarvationPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    name: String,
    weight: f64,
    group: usize,
}

impl Candidate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn group(&self) -> usize {
        self.group
    }
}

/// Candidates for one selection episode.
///
/// Candidates live in a flat arena; each carries the id of the group it must
/// be picked with. Singles get a group of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPool {
    candidates: Vec<Candidate>,
    group_count: usize,
    baseline: f64,
}

impl WeightedPool {
    pub fn from_namelist(namelist: &Namelist, baseline: f64) -> Self {
        let mut candidates = Vec::with_capacity(namelist.len());
        for (group, entry) in namelist.entries().iter().enumerate() {
            for name in entry.names() {
                candidates.push(Candidate {
                    name: name.clone(),
                    weight: baseline,
                    group,
                });
            }
        }
        Self {
            candidates,
            group_count: namelist.entries().len(),
            baseline,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.name.as_str())
    }

    pub fn weight(&self, name: &str) -> Option<f64> {
        self.position(name).map(|idx| self.candidates[idx].weight)
    }

    /// Sets a candidate's weight, clamped at [`DISCARDED`]. Returns false for
    /// unknown names.
    pub fn set_weight(&mut self, name: &str, weight: f64) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.candidates[idx].weight = weight.max(DISCARDED);
                true
            }
            None => false,
        }
    }

    pub fn reset_weights(&mut self) {
        for candidate in &mut self.candidates {
            candidate.weight = self.baseline;
        }
    }

    pub fn group_members(&self, group: usize) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(move |c| c.group == group)
    }

    /// Discards everyone in `names`. Unknown names are ignored.
    pub fn exclude<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            if let Some(idx) = self.position(name.as_ref()) {
                self.candidates[idx].weight = DISCARDED;
            }
        }
    }

    /// Picks `k` distinct names, keeping groups together.
    ///
    /// Groups are drawn with probability proportional to their summed weight
    /// (uniformly once every remaining weight is zero). A drawn group is only
    /// committed when it fits the open slots and the slots left over can
    /// still be filled by whole groups; otherwise the draw is discarded.
    /// After `options.max_draws` draws, or when no combination of groups can
    /// fill the slots, `options.starvation` decides.
    pub fn pick<R>(
        &mut self,
        k: usize,
        rng: &mut R,
        options: &PickOptions,
    ) -> Result<Vec<String>, PoolError>
    where
        R: Rng + ?Sized,
    {
        if k > self.candidates.len() {
            return Err(PoolError::InsufficientCandidates {
                requested: k,
                available: self.candidates.len(),
            });
        }

        let mut committed = vec![false; self.group_count];
        let mut picked = vec![false; self.candidates.len()];
        let mut result = Vec::with_capacity(k);
        let mut draws = 0;

        while result.len() < k {
            let remaining = k - result.len();
            let open: Vec<usize> = (0..self.group_count).filter(|g| !committed[*g]).collect();
            let open_sizes: Vec<usize> = open.iter().map(|g| self.group_size(*g)).collect();
            if !is_fillable(&open_sizes, remaining) || draws >= options.max_draws {
                return self.starve(k, &mut picked, result, rng, options);
            }
            draws += 1;

            let Some(group) = self.draw_group(&open, rng) else {
                break;
            };
            let size = self.group_size(group);
            let leftover: Vec<usize> = open
                .iter()
                .zip(&open_sizes)
                .filter(|(g, _)| **g != group)
                .map(|(_, size)| *size)
                .collect();
            if size > remaining || !is_fillable(&leftover, remaining - size) {
                debug!(group, size, remaining, "discarding oversized group draw");
                continue;
            }

            committed[group] = true;
            for (idx, candidate) in self.candidates.iter_mut().enumerate() {
                if candidate.group == group {
                    candidate.weight = DISCARDED;
                    picked[idx] = true;
                    result.push(candidate.name.clone());
                }
            }
        }

        debug!(k, draws, picked = ?result, "pool pick complete");
        Ok(result)
    }

    fn starve<R>(
        &mut self,
        k: usize,
        picked: &mut [bool],
        mut result: Vec<String>,
        rng: &mut R,
        options: &PickOptions,
    ) -> Result<Vec<String>, PoolError>
    where
        R: Rng + ?Sized,
    {
        let remaining = k - result.len();
        match options.starvation {
            StarvationPolicy::Fail => Err(PoolError::GroupStarvation {
                requested: k,
                remaining,
            }),
            StarvationPolicy::BreakGroups => {
                warn!(
                    requested = k,
                    remaining, "group selection starved; splitting groups to fill remaining slots"
                );
                while result.len() < k {
                    let open: Vec<usize> =
                        (0..self.candidates.len()).filter(|i| !picked[*i]).collect();
                    let weights: Vec<f64> =
                        open.iter().map(|i| self.candidates[*i].weight).collect();
                    let Some(slot) = roulette(&weights, rng) else {
                        break;
                    };
                    let idx = open[slot];
                    picked[idx] = true;
                    self.candidates[idx].weight = DISCARDED;
                    result.push(self.candidates[idx].name.clone());
                }
                Ok(result)
            }
        }
    }

    fn draw_group<R>(&self, open: &[usize], rng: &mut R) -> Option<usize>
    where
        R: Rng + ?Sized,
    {
        let weights: Vec<f64> = open.iter().map(|g| self.group_weight(*g)).collect();
        roulette(&weights, rng).map(|slot| open[slot])
    }

    fn group_size(&self, group: usize) -> usize {
        self.candidates.iter().filter(|c| c.group == group).count()
    }

    fn group_weight(&self, group: usize) -> f64 {
        self.group_members(group).map(|c| c.weight).sum()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.candidates.iter().position(|c| c.name == name)
    }
}

/// Index drawn with probability proportional to `weights`, uniformly when
/// they are all zero. `None` only for an empty slice.
fn roulette<R>(weights: &[f64], rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
{
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Some(rng.gen_range(0..weights.len()));
    }
    let threshold = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (idx, weight) in weights.iter().enumerate() {
        if *weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = Some(idx);
        if threshold < cumulative {
            return Some(idx);
        }
    }
    last_positive
}
