//! The action queue protocol (spec §4.6 steps 1-5): an initiator enqueues a
//! node, the tablet's own agent claims it with a CAS, dispatches to a
//! handler, and writes a terminal state that unblocks `WaitForCompletion`.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use common::err::decode_error::ReError;
use common::err::CResult;
use topo::{ActionState, TabletAction, TabletAlias, TopoStore};

pub struct ActionQueue {
    store: Arc<dyn TopoStore>,
}

impl ActionQueue {
    pub fn new(store: Arc<dyn TopoStore>) -> Self {
        ActionQueue { store }
    }

    /// an initiator's entry point: enqueue `{id, name, args, state=queued,
    /// pid=0}` at a monotonically-ordered path (spec §4.6 step 1).
    #[instrument(skip(self, args))]
    pub async fn initiate(
        &self,
        tablet: TabletAlias,
        name: &str,
        args: serde_json::Value,
    ) -> CResult<u64> {
        self.store.enqueue_action(TabletAction::new(0, tablet, name, args)).await
    }

    /// step 3: "the initiator may WaitForCompletion" — polls until the
    /// action reaches a terminal state or `timeout` elapses. A real
    /// deployment would await the `watch_actions` stream directly; polling
    /// here keeps the initiator side independent of which agent (if any) is
    /// still alive to drive that stream forward.
    pub async fn wait_for_completion(
        &self,
        tablet: &TabletAlias,
        id: u64,
        timeout: Duration,
    ) -> CResult<TabletAction> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let action = self.store.get_action(tablet, id).await?;
            if matches!(action.state, ActionState::Done | ActionState::Failed) {
                return Ok(action);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ReError::Timeout(format!("action {} on {} did not complete in time", id, tablet)));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
