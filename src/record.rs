use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records of one week keyed by chore name.
pub type WeekRecords = BTreeMap<String, AssignmentRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub name: String,
    #[serde(default)]
    pub done: bool,
}

/// Who got a chore in a given week, and whether they did it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub chore_name: String,
    /// Rendered due text, e.g. "Due Monday on 06/01" or "Any day this week".
    pub due: String,
    pub assignees: Vec<Assignee>,
}

impl AssignmentRecord {
    pub fn new<I, S>(chore_name: impl Into<String>, due: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chore_name: chore_name.into(),
            due: due.into(),
            assignees: names
                .into_iter()
                .map(|name| Assignee {
                    name: name.into(),
                    done: false,
                })
                .collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assignees.iter().map(|a| a.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    pub fn assignee(&self, name: &str) -> Option<&Assignee> {
        self.assignees.iter().find(|a| a.name == name)
    }

    /// Sets the done flag; returns false when `name` is not assigned.
    pub fn set_done(&mut self, name: &str, done: bool) -> bool {
        match self.assignees.iter_mut().find(|a| a.name == name) {
            Some(assignee) => {
                assignee.done = done;
                true
            }
            None => false,
        }
    }

    /// Replaces `from` with `to` in place; the slot keeps its position and
    /// done flag. Returns false when `from` is not assigned.
    pub fn replace(&mut self, from: &str, to: impl Into<String>) -> bool {
        match self.assignees.iter_mut().find(|a| a.name == from) {
            Some(assignee) => {
                assignee.name = to.into();
                true
            }
            None => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.assignees.iter().all(|a| a.done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_records_start_not_done() {
        let record = AssignmentRecord::new("Dishes", "Any day this week", ["ann", "bob"]);
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["ann", "bob"]);
        assert!(!record.is_complete());
    }

    #[test]
    fn set_done_and_replace() {
        let mut record = AssignmentRecord::new("Dishes", "Any day this week", ["ann", "bob"]);
        assert!(record.set_done("ann", true));
        assert!(!record.set_done("zed", true));
        assert!(record.replace("ann", "cat"));
        assert_eq!(
            record.assignee("cat"),
            Some(&Assignee {
                name: "cat".into(),
                done: true
            })
        );
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["cat", "bob"]);
        assert!(!record.replace("ann", "dan"));
    }

    #[test]
    fn json_shape_is_stable() {
        let record = AssignmentRecord::new("Bins", "Due Friday on 10/01", ["ann"]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "chore_name": "Bins",
                "due": "Due Friday on 10/01",
                "assignees": [{"name": "ann", "done": false}]
            })
        );
    }
}
