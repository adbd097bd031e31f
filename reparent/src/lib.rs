//! Reparent coordinator (spec §4.7): planned, emergency and external
//! reparent, each a multi-tablet protocol lifted over the action queue
//! (crate `agent`) and gated by a shard lock (crate `topo`).
//!
//! The coordinator is given the candidate replica set by its caller rather
//! than discovering it itself — topology listing is `topo`'s job, not
//! reparent's.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::json;
use tracing::{info, instrument, warn};

use agent::ActionQueue;
use common::err::decode_error::ReError;
use common::err::CResult;
use healthcheck::HealthCheck;
use topo::{update_shard_fields, TabletAlias, TabletType, TopoStore};

const LOCK_OWNER: &str = "reparent";
const ACTION_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ReparentCoordinator {
    store: Arc<dyn TopoStore>,
    actions: ActionQueue,
    healthcheck: Arc<HealthCheck>,
    lock_deadline: Duration,
}

impl ReparentCoordinator {
    pub fn new(store: Arc<dyn TopoStore>, healthcheck: Arc<HealthCheck>, lock_deadline: Duration) -> Self {
        ReparentCoordinator { actions: ActionQueue::new(store.clone()), store, healthcheck, lock_deadline }
    }

    /// spec §4.7 "Planned reparent (old master alive)": steps 1-7 verbatim.
    #[instrument(skip(self, replicas))]
    pub async fn planned_reparent(
        &self,
        keyspace: &str,
        shard: &str,
        old_master: &TabletAlias,
        new_master: &TabletAlias,
        replicas: &[TabletAlias],
    ) -> CResult<()> {
        let lock = self.store.lock(&lock_path(keyspace, shard), LOCK_OWNER, "planned_reparent", self.lock_deadline).await?;

        let result = async {
            let position = self.demote_master(old_master).await?;

            let others: Vec<&TabletAlias> = replicas.iter().filter(|r| *r != new_master).collect();
            self.wait_slave_positions(&others, &position).await?;

            let new_position = self.promote_slave(new_master).await?;
            let created_at_ms = chrono::Utc::now().timestamp_millis();

            self.set_master_and_converge(&others, new_master, &new_position, created_at_ms).await?;

            update_shard_fields(self.store.as_ref(), keyspace, shard, |s| s.master_alias = Some(new_master.clone())).await?;
            Ok(())
        }
        .await;

        drop(lock);
        result
    }

    /// spec §4.7 "Emergency reparent (old master unavailable)": same protocol
    /// minus `DemoteMaster`; the most-advanced replica by queried position is
    /// promoted and transactions not yet replicated to it are lost.
    #[instrument(skip(self, replicas))]
    pub async fn emergency_reparent(&self, keyspace: &str, shard: &str, replicas: &[TabletAlias]) -> CResult<TabletAlias> {
        if replicas.is_empty() {
            return Err(ReError::FailedPrecondition("emergency reparent requires at least one candidate replica".to_string()));
        }

        let lock = self.store.lock(&lock_path(keyspace, shard), LOCK_OWNER, "emergency_reparent", self.lock_deadline).await?;

        let result = async {
            let new_master = self.most_advanced_replica(replicas).await?;
            let position = self.promote_slave(&new_master).await?;
            let created_at_ms = chrono::Utc::now().timestamp_millis();

            let others: Vec<&TabletAlias> = replicas.iter().filter(|r| **r != new_master).collect();
            self.set_master_and_converge(&others, &new_master, &position, created_at_ms).await?;

            update_shard_fields(self.store.as_ref(), keyspace, shard, |s| s.master_alias = Some(new_master.clone())).await?;
            Ok(new_master)
        }
        .await;

        drop(lock);
        result
    }

    /// spec §4.7 "External reparent": an out-of-band tool already promoted
    /// `new_master`; record the fact and bump the reparent timestamp so
    /// HealthCheck consumers converge (spec §4.2 arbitration-by-timestamp).
    #[instrument(skip(self))]
    pub async fn tablet_externally_reparented(&self, keyspace: &str, shard: &str, new_master: TabletAlias) -> CResult<()> {
        update_shard_fields(self.store.as_ref(), keyspace, shard, |s| s.master_alias = Some(new_master.clone())).await?;
        info!(%new_master, keyspace, shard, "tablet externally reparented");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn demote_master(&self, old_master: &TabletAlias) -> CResult<String> {
        let id = self.actions.initiate(old_master.clone(), "DemoteMaster", json!({})).await?;
        let action = self.actions.wait_for_completion(old_master, id, ACTION_TIMEOUT).await?;
        reply_position(&action)
    }

    #[instrument(skip(self))]
    async fn promote_slave(&self, new_master: &TabletAlias) -> CResult<String> {
        let id = self.actions.initiate(new_master.clone(), "PromoteSlave", json!({})).await?;
        let action = self.actions.wait_for_completion(new_master, id, ACTION_TIMEOUT).await?;
        reply_position(&action)
    }

    /// spec §4.7 step 3: in parallel, fail fast if any replica cannot catch
    /// up to `position`.
    #[instrument(skip(self, replicas))]
    async fn wait_slave_positions(&self, replicas: &[&TabletAlias], position: &str) -> CResult<()> {
        let futures = replicas.iter().map(|r| {
            let r = (*r).clone();
            let position = position.to_string();
            async move {
                let id = self.actions.initiate(r.clone(), "WaitSlavePosition", json!({"position": position})).await?;
                self.actions.wait_for_completion(&r, id, ACTION_TIMEOUT).await
            }
        });
        for outcome in join_all(futures).await {
            outcome?;
        }
        Ok(())
    }

    /// spec §4.7 step 5: `SetMaster(new, Q, time_created)` on every other
    /// replica, each waiting for its own reparent-journal row at `Q`.
    #[instrument(skip(self, others))]
    async fn set_master_and_converge(
        &self,
        others: &[&TabletAlias],
        new_master: &TabletAlias,
        position: &str,
        created_at_ms: i64,
    ) -> CResult<()> {
        let futures = others.iter().map(|r| {
            let r = (*r).clone();
            let new_master = new_master.clone();
            let position = position.to_string();
            async move {
                let parent = new_master.to_string();
                let id = self
                    .actions
                    .initiate(r.clone(), "SetMaster", json!({"parent_alias": parent, "position": position, "time_created": created_at_ms}))
                    .await?;
                self.actions.wait_for_completion(&r, id, ACTION_TIMEOUT).await?;

                let id = self.actions.initiate(r.clone(), "WaitForReparentJournal", json!({"position": position})).await?;
                self.actions.wait_for_completion(&r, id, ACTION_TIMEOUT).await
            }
        });
        for outcome in join_all(futures).await {
            outcome?;
        }
        Ok(())
    }

    /// spec §4.7 "Emergency reparent": query each candidate's position and
    /// pick the most-advanced one. Lexicographic comparison matches how
    /// `MysqldControl::wait_for_position` already orders positions.
    #[instrument(skip(self, replicas))]
    async fn most_advanced_replica(&self, replicas: &[TabletAlias]) -> CResult<TabletAlias> {
        let futures = replicas.iter().cloned().map(|r| async move {
            let id = self.actions.initiate(r.clone(), "SlaveStatus", json!({})).await?;
            let action = self.actions.wait_for_completion(&r, id, ACTION_TIMEOUT).await?;
            reply_position(&action).map(|p| (r, p))
        });

        let mut best: Option<(TabletAlias, String)> = None;
        for outcome in join_all(futures).await {
            match outcome {
                Ok((alias, position)) => {
                    if best.as_ref().map_or(true, |(_, p)| position > *p) {
                        best = Some((alias, position));
                    }
                }
                Err(e) => warn!(error = %e, "candidate unreachable during emergency reparent, skipping"),
            }
        }

        best.map(|(alias, _)| alias)
            .ok_or_else(|| ReError::Unavailable("no reachable replica found for emergency reparent".to_string()))
    }

    /// the set of tablets HealthCheck currently believes serve `type=master`
    /// for a shard; used by callers deciding whether a planned or emergency
    /// reparent is appropriate (zero healthy masters ⇒ emergency).
    pub fn current_master_is_healthy(&self, keyspace: &str, shard: &str) -> bool {
        !self.healthcheck.healthy_tablets(keyspace, shard, TabletType::Master).is_empty()
    }
}

fn lock_path(keyspace: &str, shard: &str) -> String {
    topo::paths::lock_path(keyspace, shard)
}

fn reply_position(action: &topo::TabletAction) -> CResult<String> {
    if action.state != topo::ActionState::Done {
        return Err(ReError::Internal(format!(
            "action {} ({}) on {} did not complete successfully: {:?}",
            action.id, action.name, action.tablet, action.error
        )));
    }
    action
        .reply
        .as_ref()
        .and_then(|r| r.get("position"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ReError::Internal(format!("action {} ({}) completed without a position reply", action.id, action.name)))
}

#[cfg(test)]
mod test {
    use super::*;
    use agent::{FakeMysqld, LocalFsBackupStorage, TabletAgent};
    use std::collections::HashMap;
    use std::sync::Arc;
    use topo::{KeyRange, MemStore, PortMap, Tablet};

    async fn spawn_agent(
        store: Arc<dyn TopoStore>,
        alias: TabletAlias,
        ty: TabletType,
        position: &str,
        tmp: &std::path::Path,
    ) -> (Arc<TabletAgent>, Arc<FakeMysqld>) {
        let tablet = Tablet {
            alias: alias.clone(),
            hostname: "host".to_string(),
            ports: PortMap { mysql: 3306, vt: 15991, grpc: 15999 },
            keyspace: "ks".to_string(),
            shard: "0".to_string(),
            key_range: KeyRange::full(),
            ty,
            tags: HashMap::new(),
        };
        store.create_tablet(tablet).await.unwrap();

        let mysqld = Arc::new(FakeMysqld::new(position));
        let backup = Arc::new(LocalFsBackupStorage::new(tmp.join(alias.to_string())));
        let a = TabletAgent::attach(store, mysqld.clone(), backup, alias, std::process::id()).await.unwrap();
        tokio::spawn(a.clone().run());
        (a, mysqld)
    }

    #[tokio::test]
    async fn planned_reparent_promotes_replica_and_updates_shard_record() {
        let store: Arc<dyn TopoStore> = Arc::new(MemStore::new());
        let tmp = std::env::temp_dir().join(format!("reparent-test-{}", uuid::Uuid::new_v4()));

        let old_master = TabletAlias { cell: "zone1".to_string(), uid: 1 };
        let replica1 = TabletAlias { cell: "zone1".to_string(), uid: 2 };
        let replica2 = TabletAlias { cell: "zone1".to_string(), uid: 3 };

        store.create_shard("ks", topo::Shard::new("0", KeyRange::full())).await.unwrap();

        let (_old, old_mysqld) = spawn_agent(store.clone(), old_master.clone(), TabletType::Master, "pos-5", &tmp).await;
        let (_r1, r1_mysqld) = spawn_agent(store.clone(), replica1.clone(), TabletType::Replica, "pos-5", &tmp).await;
        let (_r2, r2_mysqld) = spawn_agent(store.clone(), replica2.clone(), TabletType::Replica, "pos-4", &tmp).await;

        // replica2 needs to catch up before WaitSlavePosition passes
        r2_mysqld.advance_position("pos-5");

        let hc = HealthCheck::new(Duration::from_secs(60));
        let coordinator = ReparentCoordinator::new(store.clone(), hc, Duration::from_secs(10));

        coordinator
            .planned_reparent("ks", "0", &old_master, &replica1, &[replica1.clone(), replica2.clone()])
            .await
            .unwrap();

        let old_tablet = store.get_tablet(&old_master).await.unwrap().value;
        assert_eq!(old_tablet.ty, TabletType::Master, "demote doesn't itself change type, only read-only");

        let new_master_tablet = store.get_tablet(&replica1).await.unwrap().value;
        assert_eq!(new_master_tablet.ty, TabletType::Master);

        let shard = store.get_shard("ks", "0").await.unwrap().value;
        assert_eq!(shard.master_alias, Some(replica1));

        // replica2 was pointed at the new master at its promotion position
        assert_eq!(r2_mysqld.position(), r1_mysqld.position());
        let _ = old_mysqld;
    }

    #[tokio::test]
    async fn emergency_reparent_picks_most_advanced_replica() {
        let store: Arc<dyn TopoStore> = Arc::new(MemStore::new());
        let tmp = std::env::temp_dir().join(format!("reparent-test-{}", uuid::Uuid::new_v4()));

        store.create_shard("ks", topo::Shard::new("0", KeyRange::full())).await.unwrap();

        let behind = TabletAlias { cell: "zone1".to_string(), uid: 10 };
        let ahead = TabletAlias { cell: "zone1".to_string(), uid: 11 };

        let (_b, _bm) = spawn_agent(store.clone(), behind.clone(), TabletType::Replica, "pos-1", &tmp).await;
        let (_a, _am) = spawn_agent(store.clone(), ahead.clone(), TabletType::Replica, "pos-9", &tmp).await;

        let hc = HealthCheck::new(Duration::from_secs(60));
        let coordinator = ReparentCoordinator::new(store.clone(), hc, Duration::from_secs(10));

        let promoted = coordinator.emergency_reparent("ks", "0", &[behind.clone(), ahead.clone()]).await.unwrap();
        assert_eq!(promoted, ahead);

        let shard = store.get_shard("ks", "0").await.unwrap().value;
        assert_eq!(shard.master_alias, Some(ahead));
    }

    #[tokio::test]
    async fn external_reparent_just_records_shard_state() {
        let store: Arc<dyn TopoStore> = Arc::new(MemStore::new());
        store.create_shard("ks", topo::Shard::new("0", KeyRange::full())).await.unwrap();

        let hc = HealthCheck::new(Duration::from_secs(60));
        let coordinator = ReparentCoordinator::new(store.clone(), hc, Duration::from_secs(10));

        let new_master = TabletAlias { cell: "zone1".to_string(), uid: 99 };
        coordinator.tablet_externally_reparented("ks", "0", new_master.clone()).await.unwrap();

        let shard = store.get_shard("ks", "0").await.unwrap().value;
        assert_eq!(shard.master_alias, Some(new_master));
    }
}
