use crate::recurrence::RecurrenceRule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoreError {
    #[error("chore name must not be empty")]
    EmptyName,
    #[error("duplicate chore name '{0}'")]
    DuplicateChore(String),
    #[error("chore '{chore}' lists '{name}' more than once")]
    DuplicateName { chore: String, name: String },
    #[error("chore '{chore}' has an empty name or group in its namelist")]
    EmptyEntry { chore: String },
    #[error("chore '{chore}' needs at least one assignee")]
    ZeroAssignees { chore: String },
    #[error(
        "chore '{chore}' needs {assignee_count} assignee(s) but no combination of its groups (sizes {group_sizes:?}) adds up to that"
    )]
    UnsatisfiableAssigneeCount {
        chore: String,
        assignee_count: u32,
        group_sizes: Vec<usize>,
    },
}

/// One namelist entry: a person, or people always assigned together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamelistEntry {
    Single(String),
    Group(Vec<String>),
}

impl NamelistEntry {
    pub fn names(&self) -> &[String] {
        match self {
            NamelistEntry::Single(name) => std::slice::from_ref(name),
            NamelistEntry::Group(names) => names,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namelist {
    entries: Vec<NamelistEntry>,
}

impl Namelist {
    pub fn new(entries: Vec<NamelistEntry>) -> Self {
        Self { entries }
    }

    /// Namelist where everyone stands alone.
    pub fn singles<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: names
                .into_iter()
                .map(|name| NamelistEntry::Single(name.into()))
                .collect(),
        }
    }

    pub fn entries(&self) -> &[NamelistEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|entry| entry.names().iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.entries.iter().map(|entry| entry.names().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|candidate| candidate == name)
    }

    /// Copy without `absent`; groups keep their remaining members and
    /// disappear once empty.
    pub fn without(&self, absent: &BTreeSet<String>) -> Namelist {
        let entries = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                NamelistEntry::Single(name) => {
                    (!absent.contains(name)).then(|| NamelistEntry::Single(name.clone()))
                }
                NamelistEntry::Group(names) => {
                    let left: Vec<String> =
                        names.iter().filter(|n| !absent.contains(*n)).cloned().collect();
                    (!left.is_empty()).then_some(NamelistEntry::Group(left))
                }
            })
            .collect();
        Namelist { entries }
    }

    pub fn group_sizes(&self) -> Vec<usize> {
        self.entries.iter().map(|entry| entry.names().len()).collect()
    }
}

/// True when some subset of `sizes` sums to exactly `target`.
pub fn is_fillable(sizes: &[usize], target: usize) -> bool {
    let mut reachable = vec![false; target + 1];
    reachable[0] = true;
    for &size in sizes {
        if size == 0 || size > target {
            continue;
        }
        for total in (size..=target).rev() {
            if reachable[total - size] {
                reachable[total] = true;
            }
        }
    }
    reachable[target]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChore")]
pub struct Chore {
    name: String,
    namelist: Namelist,
    assignee_count: u32,
    rule: RecurrenceRule,
}

#[derive(Deserialize)]
struct RawChore {
    name: String,
    namelist: Namelist,
    assignee_count: u32,
    rule: RecurrenceRule,
}

impl TryFrom<RawChore> for Chore {
    type Error = ChoreError;

    fn try_from(raw: RawChore) -> Result<Self, Self::Error> {
        Chore::new(raw.name, raw.namelist, raw.assignee_count, raw.rule)
    }
}

impl Chore {
    pub fn new(
        name: impl Into<String>,
        namelist: Namelist,
        assignee_count: u32,
        rule: RecurrenceRule,
    ) -> Result<Self, ChoreError> {
        let chore = Self {
            name: name.into(),
            namelist,
            assignee_count,
            rule,
        };
        chore.validate()?;
        Ok(chore)
    }

    fn validate(&self) -> Result<(), ChoreError> {
        if self.name.trim().is_empty() {
            return Err(ChoreError::EmptyName);
        }
        if self.assignee_count == 0 {
            return Err(ChoreError::ZeroAssignees {
                chore: self.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        for entry in self.namelist.entries() {
            if entry.names().is_empty() || entry.names().iter().any(|n| n.trim().is_empty()) {
                return Err(ChoreError::EmptyEntry {
                    chore: self.name.clone(),
                });
            }
            for name in entry.names() {
                if !seen.insert(name.as_str()) {
                    return Err(ChoreError::DuplicateName {
                        chore: self.name.clone(),
                        name: name.clone(),
                    });
                }
            }
        }

        let group_sizes = self.namelist.group_sizes();
        if !is_fillable(&group_sizes, self.assignee_count as usize) {
            return Err(ChoreError::UnsatisfiableAssigneeCount {
                chore: self.name.clone(),
                assignee_count: self.assignee_count,
                group_sizes,
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namelist(&self) -> &Namelist {
        &self.namelist
    }

    pub fn assignee_count(&self) -> u32 {
        self.assignee_count
    }

    pub fn rule(&self) -> &RecurrenceRule {
        &self.rule
    }

    /// `"Clean Kitchen"` -> `"clean-kitchen"`.
    pub fn urlized_name(&self) -> String {
        self.name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Compares names ignoring case, spaces and dashes.
    pub fn loosely_matches(&self, other: &str) -> bool {
        fn squash(s: &str) -> String {
            s.chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .flat_map(char::to_lowercase)
                .collect()
        }
        squash(&self.name) == squash(other)
    }
}

pub fn validate_chores(chores: &[Chore]) -> Result<(), ChoreError> {
    let mut seen = HashSet::with_capacity(chores.len());
    for chore in chores {
        if !seen.insert(chore.name()) {
            return Err(ChoreError::DuplicateChore(chore.name().to_string()));
        }
    }
    Ok(())
}
