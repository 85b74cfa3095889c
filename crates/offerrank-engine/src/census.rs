//! Starting-task census: how many tasks are still starting on each host.

use std::collections::HashMap;

use tracing::debug;

use offerrank_state::{ScheduleStatus, StateResult, StateStore, TaskRecord};

/// Read access to the scheduler's task records.
///
/// Implemented by [`StateStore`]; tests inject their own sources.
pub trait TaskSource: Send + Sync {
    /// Every task currently in `status`.
    fn tasks_in_status(&self, status: ScheduleStatus) -> StateResult<Vec<TaskRecord>>;
}

impl TaskSource for StateStore {
    fn tasks_in_status(&self, status: ScheduleStatus) -> StateResult<Vec<TaskRecord>> {
        self.list_tasks_by_status(status)
    }
}

/// Per-host count of starting tasks. Hosts without any are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartingTaskCensus {
    counts: HashMap<String, u32>,
}

impl StartingTaskCensus {
    /// Starting tasks on `host` (0 when absent).
    pub fn count(&self, host: &str) -> u32 {
        self.counts.get(host).copied().unwrap_or(0)
    }

    /// Number of hosts with at least one starting task.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(host, count)| (host.as_str(), *count))
    }
}

impl FromIterator<(String, u32)> for StartingTaskCensus {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        let mut counts = HashMap::new();
        for (host, count) in iter {
            if count > 0 {
                *counts.entry(host).or_insert(0) += count;
            }
        }
        Self { counts }
    }
}

/// Count starting tasks per assigned host.
///
/// Rebuilt from the source on every call; tasks without a host
/// assignment are skipped.
pub fn census<S: TaskSource + ?Sized>(source: &S) -> StateResult<StartingTaskCensus> {
    let starting = source.tasks_in_status(ScheduleStatus::Starting)?;
    let mut counts: HashMap<String, u32> = HashMap::new();
    for task in &starting {
        if let Some(host) = task.host() {
            *counts.entry(host.to_string()).or_insert(0) += 1;
        }
    }
    debug!(
        starting_tasks = starting.len(),
        hosts = counts.len(),
        "starting-task census built"
    );
    Ok(StartingTaskCensus { counts })
}
