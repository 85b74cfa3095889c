//! Domain types for the task store.

use serde::{Deserialize, Serialize};

/// Unique identifier for a scheduled task.
pub type TaskId = String;

/// Lifecycle status of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Waiting for an offer.
    Pending,
    /// Bound to an offer, launch not yet acknowledged.
    Assigned,
    /// Launched on the agent but not yet confirmed running.
    Starting,
    Running,
    Finished,
    Failed,
    Killed,
    Lost,
}

impl ScheduleStatus {
    /// Whether the task has stopped for good.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ScheduleStatus::Finished
                | ScheduleStatus::Failed
                | ScheduleStatus::Killed
                | ScheduleStatus::Lost
        )
    }
}

/// Host binding of a task that has been matched to an offer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignedTask {
    pub agent_id: String,
    pub host: String,
}

/// Persisted state of a single task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRecord {
    pub task_id: TaskId,
    /// `role/environment/name` of the job the task belongs to.
    pub job_key: String,
    pub status: ScheduleStatus,
    /// Set once the task has been matched to an offer.
    pub assigned: Option<AssignedTask>,
    /// Unix timestamp of the last status change.
    pub updated_at: u64,
}

impl TaskRecord {
    /// Hostname the task is bound to, if any.
    pub fn host(&self) -> Option<&str> {
        self.assigned.as_ref().map(|a| a.host.as_str())
    }
}
