//! The per-tablet agent (spec §4.6): owns a cached copy of its tablet
//! record, drives the action queue with mutual exclusion, and notifies
//! registered callbacks after any action that mutates the record.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value as Json;
use tokio::sync::RwLock as AsyncRwLock;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use common::err::decode_error::ReError;
use common::err::CResult;
use topo::{update_tablet_fields, ActionLogEntry, ActionState, Tablet, TabletAlias, TabletType, TopoStore};

use crate::backup::BackupStorage;
use crate::mysqld::MysqldControl;
use crate::state_machine::{can_transition, Transition};

pub type Callback = Arc<dyn Fn(&Tablet) + Send + Sync>;

pub struct TabletAgent {
    pub alias: TabletAlias,
    pid: AtomicU32,
    store: Arc<dyn TopoStore>,
    pub(crate) mysqld: Arc<dyn MysqldControl>,
    pub(crate) backup: Arc<dyn BackupStorage>,
    tablet: AsyncRwLock<Tablet>,
    callbacks: Mutex<Vec<Callback>>,
}

impl TabletAgent {
    /// loads the tablet record already created in `store` by an operator's
    /// `CreateTablet` call (spec §3: "Tablets are created by CreateTablet").
    pub async fn attach(
        store: Arc<dyn TopoStore>,
        mysqld: Arc<dyn MysqldControl>,
        backup: Arc<dyn BackupStorage>,
        alias: TabletAlias,
        pid: u32,
    ) -> CResult<Arc<Self>> {
        let tablet = store.get_tablet(&alias).await?.value;
        Ok(Arc::new(TabletAgent {
            alias,
            pid: AtomicU32::new(pid),
            store,
            mysqld,
            backup,
            tablet: AsyncRwLock::new(tablet),
            callbacks: Mutex::new(Vec::new()),
        }))
    }

    pub fn pid(&self) -> u32 {
        self.pid.load(Ordering::SeqCst)
    }

    pub async fn current(&self) -> Tablet {
        self.tablet.read().await.clone()
    }

    pub async fn register_callback(&self, cb: Callback) {
        self.callbacks.lock().await.push(cb);
    }

    /// validates the transition against the state machine, persists it
    /// through `update_tablet_fields` (optimistic-concurrency retry loop),
    /// refreshes the local cache, and fires callbacks (spec §4.6: "a set of
    /// registered change-callbacks invoked after any action that mutates the
    /// record").
    #[instrument(skip(self))]
    pub async fn change_type(&self, to: TabletType, via: Transition) -> CResult<Tablet> {
        let from = self.current().await.ty;
        if !can_transition(from, to, via) {
            return Err(ReError::FailedPrecondition(format!(
                "illegal tablet transition {:?} -> {:?} (via {:?})",
                from, to, via
            )));
        }

        let updated = update_tablet_fields(self.store.as_ref(), &self.alias, |t| t.ty = to).await?;
        *self.tablet.write().await = updated.clone();

        for cb in self.callbacks.lock().await.iter() {
            cb(&updated);
        }
        Ok(updated)
    }

    /// spec §4.6 steps 2-5: watch the queue, claim the next queued action
    /// with a CAS, dispatch to its handler, and write the terminal state.
    /// Runs until the watch channel closes.
    #[instrument(skip(self))]
    pub async fn run(self: Arc<Self>) -> CResult<()> {
        let mut rx = self.store.watch_actions(&self.alias).await?;
        loop {
            let actions = rx.borrow().clone();
            for action in actions {
                if action.state == ActionState::Queued {
                    self.clone().try_claim_and_dispatch(action.id).await;
                }
            }
            if rx.changed().await.is_err() {
                return Ok(());
            }
        }
    }

    async fn try_claim_and_dispatch(self: Arc<Self>, id: u64) {
        match self.store.claim_action(&self.alias, id, self.pid()).await {
            Ok(()) => {}
            // someone else's agent (or a concurrent claim race) already has it
            Err(ReError::BadVersion(_)) => return,
            Err(e) => {
                warn!(error = %e, id, "failed to claim action");
                return;
            }
        }
        self.dispatch_claimed(id).await;
    }

    async fn dispatch_claimed(&self, id: u64) {
        let action = match self.store.get_action(&self.alias, id).await {
            Ok(a) => a,
            Err(e) => {
                error!(error = %e, id, "claimed action vanished before dispatch");
                return;
            }
        };

        // spec §7: "unhandled panics inside an action must be caught and
        // recorded as INTERNAL errors" — handlers are plain `&self`
        // borrows, not `!UnwindSafe` interior mutability, so the assertion
        // is sound.
        let result = AssertUnwindSafe(crate::handlers::dispatch(self, &action.name, &action.args))
            .catch_unwind()
            .await;

        let (state, reply, error_msg) = match result {
            Ok(Ok(reply)) => (ActionState::Done, Some(reply), None),
            Ok(Err(e)) => (ActionState::Failed, None, Some(e.to_string())),
            Err(panic) => {
                let msg = panic_message(&panic);
                (ActionState::Failed, None, Some(format!("INTERNAL: action panicked: {}", msg)))
            }
        };

        if let Err(e) = self.store.complete_action(&self.alias, id, state, reply.clone(), error_msg.clone()).await {
            error!(error = %e, id, "failed to write terminal action state");
        }

        // spec §7: "action-layer errors are recorded to the actionlog
        // regardless of success/failure"
        let _ = self
            .store
            .append_actionlog(ActionLogEntry {
                action_id: id,
                tablet: self.alias.clone(),
                name: action.name.clone(),
                state,
                reply,
                error: error_msg,
                completed_at_ms: chrono::Utc::now().timestamp_millis(),
            })
            .await;

        info!(id, ?state, "action completed");
    }

    /// spec §4.6 "Crash recovery": on startup, scan the queue. For each
    /// `running` node belonging to a pid this agent cannot confirm is alive,
    /// either re-dispatch (`force=true`, operator policy) or transition to
    /// `failed` with a post-mortem error.
    #[instrument(skip(self, is_pid_alive))]
    pub async fn recover(self: &Arc<Self>, force: bool, is_pid_alive: impl Fn(u32) -> bool) -> CResult<()> {
        for action in self.store.list_actions(&self.alias).await? {
            if action.state != ActionState::Running {
                continue;
            }
            if is_pid_alive(action.pid) {
                continue;
            }
            if force {
                info!(id = action.id, pid = action.pid, "re-dispatching orphaned running action");
                // `--force` adopts the action outright rather than going
                // through the normal queued -> running CAS, since it is
                // already `running` under a pid this agent cannot observe.
                self.dispatch_claimed(action.id).await;
            } else {
                warn!(id = action.id, pid = action.pid, "orphaned running action failed as post-mortem");
                self.store
                    .complete_action(
                        &self.alias,
                        action.id,
                        ActionState::Failed,
                        None,
                        Some(format!("INTERNAL: owning pid {} is dead, recovered without --force", action.pid)),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

pub type DispatchResult = CResult<Json>;
