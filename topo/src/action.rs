use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::model::TabletAlias;

/// spec §3 "Tablet action": a persisted unit of work executed by exactly one
/// tablet agent, serialized through the action queue (spec §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabletAction {
    pub id: u64,
    pub tablet: TabletAlias,
    pub name: String,
    pub args: Json,
    pub state: ActionState,
    /// pid of the agent process currently running this action, 0 if not running
    pub pid: u32,
    pub reply: Option<Json>,
    pub error: Option<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ActionState {
    Queued,
    Running,
    Done,
    Failed,
}

impl TabletAction {
    pub fn new(id: u64, tablet: TabletAlias, name: impl Into<String>, args: Json) -> Self {
        TabletAction {
            id,
            tablet,
            name: name.into(),
            args,
            state: ActionState::Queued,
            pid: 0,
            reply: None,
            error: None,
        }
    }

    /// monotonic transitions: queued -> running -> done | failed (spec §3, §4.6)
    pub fn can_transition_to(&self, next: ActionState) -> bool {
        matches!(
            (self.state, next),
            (ActionState::Queued, ActionState::Running)
                | (ActionState::Running, ActionState::Done)
                | (ActionState::Running, ActionState::Failed)
        )
    }
}

/// one row of the `actionlog` (spec §7): every action outcome is recorded
/// here regardless of success or failure, independent of whether it mutated
/// the tablet record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub action_id: u64,
    pub tablet: TabletAlias,
    pub name: String,
    pub state: ActionState,
    pub reply: Option<Json>,
    pub error: Option<String>,
    pub completed_at_ms: i64,
}
