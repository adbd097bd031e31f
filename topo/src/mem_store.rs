use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::err::decode_error::ReError;
use common::err::CResult;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::instrument;

use crate::action::{ActionLogEntry, ActionState, TabletAction};
use crate::model::{Keyspace, Shard, SrvKeyspace, Tablet, TabletAlias};
use crate::store::{Lock, TopoStore, Version, Versioned};

/// An in-process reference implementation of `TopoStore`, backed by
/// `dashmap` instead of a single global `RwLock<HashMap>` behind a
/// `lazy_static!` singleton — every caller constructs and owns its own
/// `MemStore` rather than reaching a `'static` instance, so tests (and
/// eventually multiple clusters in one process) don't share state by
/// accident. Good for tests and single-process deployments; a real
/// deployment points `TopoStore` at etcd/ZooKeeper/Consul instead.
#[derive(Debug)]
pub struct MemStore {
    keyspaces: DashMap<String, Entry<Keyspace>>,
    shards: DashMap<(String, String), Entry<Shard>>,
    tablets: DashMap<TabletAlias, Entry<Tablet>>,
    srv_keyspaces: DashMap<(String, String), Entry<SrvKeyspace>>,
    locks: Arc<DashMap<String, ()>>,
    actions: DashMap<TabletAlias, Vec<TabletAction>>,
    actionlog: DashMap<TabletAlias, Vec<ActionLogEntry>>,
    action_watches: DashMap<TabletAlias, watch::Sender<Vec<TabletAction>>>,
    next_action_id: AtomicU64,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    version: Version,
    tx: Arc<watch::Sender<Option<T>>>,
}

impl Default for MemStore {
    fn default() -> Self {
        MemStore {
            keyspaces: DashMap::new(),
            shards: DashMap::new(),
            tablets: DashMap::new(),
            srv_keyspaces: DashMap::new(),
            locks: Arc::new(DashMap::new()),
            actions: DashMap::new(),
            actionlog: DashMap::new(),
            action_watches: DashMap::new(),
            next_action_id: AtomicU64::new(1),
        }
    }
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }
}

#[async_trait]
impl TopoStore for MemStore {
    #[instrument(skip(self))]
    async fn get_keyspace(&self, name: &str) -> CResult<Versioned<Keyspace>> {
        self.keyspaces
            .get(name)
            .map(|e| Versioned { value: e.value.clone(), version: e.version })
            .ok_or_else(|| ReError::NoNode(format!("keyspace {} not found", name)))
    }

    async fn create_keyspace(&self, ks: Keyspace) -> CResult<Version> {
        if self.keyspaces.contains_key(&ks.name) {
            return Err(ReError::NodeExists(format!("keyspace {} already exists", ks.name)));
        }
        let (tx, _rx) = watch::channel(Some(ks.clone()));
        self.keyspaces.insert(ks.name.clone(), Entry { value: ks, version: 1, tx: Arc::new(tx) });
        Ok(1)
    }

    async fn update_keyspace(&self, name: &str, version: Version, ks: Keyspace) -> CResult<Version> {
        let mut entry = self
            .keyspaces
            .get_mut(name)
            .ok_or_else(|| ReError::NoNode(format!("keyspace {} not found", name)))?;
        if entry.version != version {
            return Err(ReError::BadVersion(format!(
                "keyspace {} expected version {}, found {}",
                name, version, entry.version
            )));
        }
        entry.version += 1;
        entry.value = ks.clone();
        let _ = entry.tx.send(Some(ks));
        Ok(entry.version)
    }

    async fn delete_keyspace(&self, name: &str) -> CResult<()> {
        self.keyspaces
            .remove(name)
            .map(|(_, e)| {
                let _ = e.tx.send(None);
            })
            .ok_or_else(|| ReError::NoNode(format!("keyspace {} not found", name)))
    }

    async fn list_keyspaces(&self) -> CResult<Vec<String>> {
        Ok(self.keyspaces.iter().map(|e| e.key().clone()).collect())
    }

    async fn watch_keyspace(&self, name: &str) -> CResult<watch::Receiver<Option<Keyspace>>> {
        match self.keyspaces.get(name) {
            Some(e) => Ok(e.tx.subscribe()),
            None => {
                let (tx, rx) = watch::channel(None);
                let _ = tx;
                Ok(rx)
            }
        }
    }

    async fn get_shard(&self, keyspace: &str, shard: &str) -> CResult<Versioned<Shard>> {
        let key = (keyspace.to_string(), shard.to_string());
        self.shards
            .get(&key)
            .map(|e| Versioned { value: e.value.clone(), version: e.version })
            .ok_or_else(|| ReError::NoNode(format!("shard {}/{} not found", keyspace, shard)))
    }

    async fn create_shard(&self, keyspace: &str, shard: Shard) -> CResult<Version> {
        let key = (keyspace.to_string(), shard.name.clone());
        if self.shards.contains_key(&key) {
            return Err(ReError::NodeExists(format!("shard {}/{} already exists", keyspace, shard.name)));
        }
        let (tx, _rx) = watch::channel(Some(shard.clone()));
        self.shards.insert(key, Entry { value: shard, version: 1, tx: Arc::new(tx) });
        Ok(1)
    }

    async fn update_shard(
        &self,
        keyspace: &str,
        shard: &str,
        version: Version,
        value: Shard,
    ) -> CResult<Version> {
        let key = (keyspace.to_string(), shard.to_string());
        let mut entry = self
            .shards
            .get_mut(&key)
            .ok_or_else(|| ReError::NoNode(format!("shard {}/{} not found", keyspace, shard)))?;
        if entry.version != version {
            return Err(ReError::BadVersion(format!(
                "shard {}/{} expected version {}, found {}",
                keyspace, shard, version, entry.version
            )));
        }
        entry.version += 1;
        entry.value = value.clone();
        let _ = entry.tx.send(Some(value));
        Ok(entry.version)
    }

    async fn delete_shard(&self, keyspace: &str, shard: &str) -> CResult<()> {
        let key = (keyspace.to_string(), shard.to_string());
        self.shards
            .remove(&key)
            .map(|(_, e)| {
                let _ = e.tx.send(None);
            })
            .ok_or_else(|| ReError::NoNode(format!("shard {}/{} not found", keyspace, shard)))
    }

    async fn list_shards(&self, keyspace: &str) -> CResult<Vec<String>> {
        Ok(self
            .shards
            .iter()
            .filter(|e| e.key().0 == keyspace)
            .map(|e| e.key().1.clone())
            .collect())
    }

    async fn watch_shard(&self, keyspace: &str, shard: &str) -> CResult<watch::Receiver<Option<Shard>>> {
        let key = (keyspace.to_string(), shard.to_string());
        match self.shards.get(&key) {
            Some(e) => Ok(e.tx.subscribe()),
            None => {
                let (_tx, rx) = watch::channel(None);
                Ok(rx)
            }
        }
    }

    async fn get_tablet(&self, alias: &TabletAlias) -> CResult<Versioned<Tablet>> {
        self.tablets
            .get(alias)
            .map(|e| Versioned { value: e.value.clone(), version: e.version })
            .ok_or_else(|| ReError::NoNode(format!("tablet {} not found", alias)))
    }

    async fn create_tablet(&self, tablet: Tablet) -> CResult<Version> {
        if self.tablets.contains_key(&tablet.alias) {
            return Err(ReError::NodeExists(format!("tablet {} already exists", tablet.alias)));
        }
        let (tx, _rx) = watch::channel(Some(tablet.clone()));
        self.tablets.insert(tablet.alias.clone(), Entry { value: tablet, version: 1, tx: Arc::new(tx) });
        Ok(1)
    }

    async fn update_tablet(&self, alias: &TabletAlias, version: Version, value: Tablet) -> CResult<Version> {
        let mut entry = self
            .tablets
            .get_mut(alias)
            .ok_or_else(|| ReError::NoNode(format!("tablet {} not found", alias)))?;
        if entry.version != version {
            return Err(ReError::BadVersion(format!(
                "tablet {} expected version {}, found {}",
                alias, version, entry.version
            )));
        }
        entry.version += 1;
        entry.value = value.clone();
        let _ = entry.tx.send(Some(value));
        Ok(entry.version)
    }

    async fn delete_tablet(&self, alias: &TabletAlias) -> CResult<()> {
        self.tablets
            .remove(alias)
            .map(|(_, e)| {
                let _ = e.tx.send(None);
            })
            .ok_or_else(|| ReError::NoNode(format!("tablet {} not found", alias)))
    }

    async fn list_tablets(&self, cell: &str) -> CResult<Vec<TabletAlias>> {
        Ok(self.tablets.iter().map(|e| e.key().clone()).filter(|a| a.cell == cell).collect())
    }

    async fn watch_tablet(&self, alias: &TabletAlias) -> CResult<watch::Receiver<Option<Tablet>>> {
        match self.tablets.get(alias) {
            Some(e) => Ok(e.tx.subscribe()),
            None => {
                let (_tx, rx) = watch::channel(None);
                Ok(rx)
            }
        }
    }

    async fn get_srv_keyspace(&self, cell: &str, keyspace: &str) -> CResult<Versioned<SrvKeyspace>> {
        let key = (cell.to_string(), keyspace.to_string());
        self.srv_keyspaces
            .get(&key)
            .map(|e| Versioned { value: e.value.clone(), version: e.version })
            .ok_or_else(|| ReError::NoNode(format!("srv_keyspace {}/{} not found", cell, keyspace)))
    }

    async fn update_srv_keyspace(
        &self,
        cell: &str,
        keyspace: &str,
        version: Version,
        value: SrvKeyspace,
    ) -> CResult<Version> {
        let key = (cell.to_string(), keyspace.to_string());
        match self.srv_keyspaces.get_mut(&key) {
            Some(mut entry) => {
                if entry.version != version {
                    return Err(ReError::BadVersion(format!(
                        "srv_keyspace {}/{} expected version {}, found {}",
                        cell, keyspace, version, entry.version
                    )));
                }
                entry.version += 1;
                entry.value = value.clone();
                let _ = entry.tx.send(Some(value));
                Ok(entry.version)
            }
            None => {
                if version != 0 {
                    return Err(ReError::NoNode(format!("srv_keyspace {}/{} not found", cell, keyspace)));
                }
                let (tx, _rx) = watch::channel(Some(value.clone()));
                self.srv_keyspaces.insert(key, Entry { value, version: 1, tx: Arc::new(tx) });
                Ok(1)
            }
        }
    }

    async fn watch_srv_keyspace(
        &self,
        cell: &str,
        keyspace: &str,
    ) -> CResult<watch::Receiver<Option<SrvKeyspace>>> {
        let key = (cell.to_string(), keyspace.to_string());
        match self.srv_keyspaces.get(&key) {
            Some(e) => Ok(e.tx.subscribe()),
            None => {
                let (_tx, rx) = watch::channel(None);
                Ok(rx)
            }
        }
    }

    async fn lock(&self, path: &str, owner: &str, contents: &str, deadline: Duration) -> CResult<Lock> {
        if self.locks.contains_key(path) {
            return Err(ReError::LockHeld(format!("{} is already locked", path)));
        }
        self.locks.insert(path.to_string(), ());
        let path_owned = path.to_string();
        let locks = self.locks.clone();
        // the in-memory backend has no background expiry sweep; `deadline` is
        // advisory here and enforced only by the caller dropping the guard.
        // a networked backend (etcd lease, ZK ephemeral node) enforces it
        // server-side even if the holder never calls back.
        Ok(Lock::new(path.to_string(), owner.to_string(), contents.to_string(), deadline, Box::new(move || {
            locks.remove(&path_owned);
        })))
    }

    async fn enqueue_action(&self, mut action: TabletAction) -> CResult<u64> {
        let id = self.next_action_id.fetch_add(1, Ordering::SeqCst);
        action.id = id;
        let tablet = action.tablet.clone();
        let mut list = self.actions.entry(tablet.clone()).or_insert_with(Vec::new);
        list.push(action);
        self.notify_actions(&tablet, &list);
        Ok(id)
    }

    async fn claim_action(&self, tablet: &TabletAlias, id: u64, pid: u32) -> CResult<()> {
        let mut list = self
            .actions
            .get_mut(tablet)
            .ok_or_else(|| ReError::NoNode(format!("no actions queued for {}", tablet)))?;
        let action = list
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ReError::NoNode(format!("action {} not found for {}", id, tablet)))?;
        if !action.can_transition_to(ActionState::Running) {
            return Err(ReError::BadVersion(format!(
                "action {} for {} is not claimable from state {:?}",
                id, tablet, action.state
            )));
        }
        action.state = ActionState::Running;
        action.pid = pid;
        self.notify_actions(tablet, &list);
        Ok(())
    }

    async fn complete_action(
        &self,
        tablet: &TabletAlias,
        id: u64,
        state: ActionState,
        reply: Option<serde_json::Value>,
        error: Option<String>,
    ) -> CResult<()> {
        let mut list = self
            .actions
            .get_mut(tablet)
            .ok_or_else(|| ReError::NoNode(format!("no actions queued for {}", tablet)))?;
        let action = list
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ReError::NoNode(format!("action {} not found for {}", id, tablet)))?;
        if !action.can_transition_to(state) {
            return Err(ReError::BadVersion(format!(
                "action {} for {} cannot move from {:?} to {:?}",
                id, tablet, action.state, state
            )));
        }
        action.state = state;
        action.reply = reply;
        action.error = error;
        self.notify_actions(tablet, &list);
        Ok(())
    }

    async fn get_action(&self, tablet: &TabletAlias, id: u64) -> CResult<TabletAction> {
        self.actions
            .get(tablet)
            .and_then(|list| list.iter().find(|a| a.id == id).cloned())
            .ok_or_else(|| ReError::NoNode(format!("action {} not found for {}", id, tablet)))
    }

    async fn list_actions(&self, tablet: &TabletAlias) -> CResult<Vec<TabletAction>> {
        Ok(self.actions.get(tablet).map(|l| l.clone()).unwrap_or_default())
    }

    async fn watch_actions(&self, tablet: &TabletAlias) -> CResult<watch::Receiver<Vec<TabletAction>>> {
        let current = self.actions.get(tablet).map(|l| l.clone()).unwrap_or_default();
        let rx = self
            .action_watches
            .entry(tablet.clone())
            .or_insert_with(|| watch::channel(current).0)
            .subscribe();
        Ok(rx)
    }

    async fn append_actionlog(&self, entry: ActionLogEntry) -> CResult<()> {
        self.actionlog.entry(entry.tablet.clone()).or_insert_with(Vec::new).push(entry);
        Ok(())
    }
}

impl MemStore {
    fn notify_actions(&self, tablet: &TabletAlias, list: &[TabletAction]) {
        if let Some(tx) = self.action_watches.get(tablet) {
            let _ = tx.send(list.to_vec());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key_range::KeyRange;

    #[tokio::test]
    async fn create_get_update_roundtrip() {
        let store = MemStore::new();
        let ks = Keyspace::unsharded("customers");
        let v1 = store.create_keyspace(ks.clone()).await.unwrap();
        assert_eq!(v1, 1);

        let got = store.get_keyspace("customers").await.unwrap();
        assert_eq!(got.version, 1);
        assert_eq!(got.value.name, "customers");

        let mut updated = got.value.clone();
        updated.sharding_column_name = Some("customer_id".to_string());
        let v2 = store.update_keyspace("customers", got.version, updated).await.unwrap();
        assert_eq!(v2, 2);
    }

    #[tokio::test]
    async fn update_rejects_stale_version() {
        let store = MemStore::new();
        store.create_keyspace(Keyspace::unsharded("ks")).await.unwrap();
        let got = store.get_keyspace("ks").await.unwrap();
        store.update_keyspace("ks", got.version, got.value.clone()).await.unwrap();

        let err = store.update_keyspace("ks", got.version, got.value).await.unwrap_err();
        assert!(matches!(err, ReError::BadVersion(_)));
    }

    #[tokio::test]
    async fn create_duplicate_keyspace_rejected() {
        let store = MemStore::new();
        store.create_keyspace(Keyspace::unsharded("ks")).await.unwrap();
        let err = store.create_keyspace(Keyspace::unsharded("ks")).await.unwrap_err();
        assert!(matches!(err, ReError::NodeExists(_)));
    }

    #[tokio::test]
    async fn second_lock_on_same_path_fails_until_released() {
        let store = MemStore::new();
        let lock = store.lock("/keyspaces/ks/shards/-80/locks", "agent-1", "reparent", Duration::from_secs(30)).await.unwrap();
        let err = store.lock("/keyspaces/ks/shards/-80/locks", "agent-2", "reparent", Duration::from_secs(30)).await.unwrap_err();
        assert!(matches!(err, ReError::LockHeld(_)));

        drop(lock);
        let lock2 = store.lock("/keyspaces/ks/shards/-80/locks", "agent-2", "reparent", Duration::from_secs(30)).await;
        assert!(lock2.is_ok());
    }

    #[tokio::test]
    async fn action_lifecycle_and_watch_observes_transitions() {
        let store = MemStore::new();
        let tablet = TabletAlias { cell: "zone1".to_string(), uid: 100 };
        let mut rx = store.watch_actions(&tablet).await.unwrap();

        let id = store
            .enqueue_action(TabletAction::new(0, tablet.clone(), "RestartSlave", serde_json::json!({})))
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
        assert_eq!(rx.borrow()[0].state, ActionState::Queued);

        store.claim_action(&tablet, id, 42).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow()[0].state, ActionState::Running);

        store.complete_action(&tablet, id, ActionState::Done, None, None).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow()[0].state, ActionState::Done);

        store.append_actionlog(ActionLogEntry {
            action_id: id,
            tablet: tablet.clone(),
            name: "RestartSlave".to_string(),
            state: ActionState::Done,
            reply: None,
            error: None,
            completed_at_ms: 0,
        }).await.unwrap();
    }

    #[tokio::test]
    async fn shard_key_range_roundtrips() {
        let store = MemStore::new();
        let kr = KeyRange::new(None, None);
        store.create_shard("ks", Shard::new("0", kr.clone())).await.unwrap();
        let got = store.get_shard("ks", "0").await.unwrap();
        assert_eq!(got.value.key_range, kr);
    }

    #[tokio::test]
    async fn srv_keyspace_publish_then_update_bumps_version() {
        use crate::model::{rebuild_srv_keyspace, TabletType};

        let store = MemStore::new();
        let shard = Shard::new("-80", KeyRange::new(None, None));
        let srv = rebuild_srv_keyspace("ks", std::slice::from_ref(&shard));
        assert_eq!(srv.shards_serving(TabletType::Master).len(), 1);

        let v1 = store.update_srv_keyspace("zone1", "ks", 0, srv.clone()).await.unwrap();
        assert_eq!(v1, 1);

        let got = store.get_srv_keyspace("zone1", "ks").await.unwrap();
        assert_eq!(got.version, 1);
        assert_eq!(got.value.keyspace, "ks");

        let v2 = store.update_srv_keyspace("zone1", "ks", got.version, srv).await.unwrap();
        assert_eq!(v2, 2);
    }

    #[tokio::test]
    async fn srv_keyspace_update_rejects_stale_version() {
        use crate::model::rebuild_srv_keyspace;

        let store = MemStore::new();
        let srv = rebuild_srv_keyspace("ks", &[]);
        store.update_srv_keyspace("zone1", "ks", 0, srv.clone()).await.unwrap();
        let err = store.update_srv_keyspace("zone1", "ks", 0, srv).await.unwrap_err();
        assert!(matches!(err, ReError::BadVersion(_)));
    }
}
