pub mod chore;
pub mod config;
pub mod fairness;
pub mod persistence;
pub mod pool;
pub mod record;
pub mod recurrence;
pub mod schedule;
pub mod week;

pub use chore::{Chore, Namelist, NamelistEntry};
pub use config::{HistoryWindow, SchedulerConfig};
pub use fairness::{FairnessConfig, FairnessModel};
pub use persistence::{HistoryStore, JsonFileHistory, MemoryHistory};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteHistory;
pub use pool::{PickOptions, StarvationPolicy, WeightedPool};
pub use record::{Assignee, AssignmentRecord, WeekRecords};
pub use recurrence::RecurrenceRule;
pub use schedule::{FixedClock, GenerationSummary, ScheduleError, ScheduleStore, WeekLookup};
pub use week::WeekIndex;
