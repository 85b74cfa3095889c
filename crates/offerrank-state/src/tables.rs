//! redb table definitions for the task store.

use redb::TableDefinition;

/// Task records keyed by `{task_id}`, JSON values.
pub const TASKS: TableDefinition<&str, &[u8]> = TableDefinition::new("tasks");
