use std::time::Duration;

use async_trait::async_trait;
use common::err::decode_error::ReError;
use common::err::CResult;
use tokio::sync::watch;

use crate::action::{ActionLogEntry, ActionState, TabletAction};
use crate::model::{Keyspace, Shard, SrvKeyspace, Tablet, TabletAlias};

pub type Version = u64;

/// A value plus the optimistic-concurrency version it was read at (spec
/// §4.1: "the caller supplies the version observed at read").
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub value: T,
    pub version: Version,
}

/// A path-scoped exclusive lease (spec §4.1 "Locks"), released on `Drop` or
/// when `deadline` elapses — whichever the backend notices first. The
/// in-memory reference backend enforces the deadline itself; a real backend
/// (etcd lease, ZK ephemeral node) enforces it server-side.
pub struct Lock {
    pub path: String,
    pub owner: String,
    pub contents: String,
    pub deadline: Duration,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Lock {
    pub fn new(
        path: String,
        owner: String,
        contents: String,
        deadline: Duration,
        release: Box<dyn FnOnce() + Send>,
    ) -> Self {
        Lock { path, owner, contents, deadline, release: Some(release) }
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// The narrow capability set the core requires of a topology persistence
/// backend (spec §4.1): `{Keyspaces, Shards, Tablets, SrvKeyspace, Locks,
/// Actions}`. The actual backend (etcd/ZooKeeper/Consul) is out of scope —
/// this trait plus `MemStore` are what the spec asks us to specify and
/// exercise (spec §1: "we specify the operations the core requires from it").
#[async_trait]
pub trait TopoStore: Send + Sync {
    // ---- Keyspaces ----
    async fn get_keyspace(&self, name: &str) -> CResult<Versioned<Keyspace>>;
    async fn create_keyspace(&self, ks: Keyspace) -> CResult<Version>;
    async fn update_keyspace(&self, name: &str, version: Version, ks: Keyspace) -> CResult<Version>;
    async fn delete_keyspace(&self, name: &str) -> CResult<()>;
    async fn list_keyspaces(&self) -> CResult<Vec<String>>;
    async fn watch_keyspace(&self, name: &str) -> CResult<watch::Receiver<Option<Keyspace>>>;

    // ---- Shards ----
    async fn get_shard(&self, keyspace: &str, shard: &str) -> CResult<Versioned<Shard>>;
    async fn create_shard(&self, keyspace: &str, shard: Shard) -> CResult<Version>;
    async fn update_shard(
        &self,
        keyspace: &str,
        shard: &str,
        version: Version,
        value: Shard,
    ) -> CResult<Version>;
    async fn delete_shard(&self, keyspace: &str, shard: &str) -> CResult<()>;
    async fn list_shards(&self, keyspace: &str) -> CResult<Vec<String>>;
    async fn watch_shard(&self, keyspace: &str, shard: &str) -> CResult<watch::Receiver<Option<Shard>>>;

    // ---- Tablets ----
    async fn get_tablet(&self, alias: &TabletAlias) -> CResult<Versioned<Tablet>>;
    async fn create_tablet(&self, tablet: Tablet) -> CResult<Version>;
    async fn update_tablet(&self, alias: &TabletAlias, version: Version, value: Tablet) -> CResult<Version>;
    async fn delete_tablet(&self, alias: &TabletAlias) -> CResult<()>;
    async fn list_tablets(&self, cell: &str) -> CResult<Vec<TabletAlias>>;
    async fn watch_tablet(&self, alias: &TabletAlias) -> CResult<watch::Receiver<Option<Tablet>>>;

    // ---- SrvKeyspace (serving graph, spec §4.1/§6) ----
    async fn get_srv_keyspace(&self, cell: &str, keyspace: &str) -> CResult<Versioned<SrvKeyspace>>;
    async fn update_srv_keyspace(
        &self,
        cell: &str,
        keyspace: &str,
        version: Version,
        value: SrvKeyspace,
    ) -> CResult<Version>;
    async fn watch_srv_keyspace(
        &self,
        cell: &str,
        keyspace: &str,
    ) -> CResult<watch::Receiver<Option<SrvKeyspace>>>;

    // ---- Locks ----
    async fn lock(&self, path: &str, owner: &str, contents: &str, deadline: Duration) -> CResult<Lock>;

    // ---- Actions ----
    /// enqueue a new action node at a monotonically-ordered path, returning its id
    async fn enqueue_action(&self, action: TabletAction) -> CResult<u64>;
    /// CAS `queued -> running` (or any other legal transition); returns
    /// `ErrBadVersion` if another agent already claimed it
    async fn claim_action(&self, tablet: &TabletAlias, id: u64, pid: u32) -> CResult<()>;
    async fn complete_action(
        &self,
        tablet: &TabletAlias,
        id: u64,
        state: ActionState,
        reply: Option<serde_json::Value>,
        error: Option<String>,
    ) -> CResult<()>;
    async fn get_action(&self, tablet: &TabletAlias, id: u64) -> CResult<TabletAction>;
    async fn list_actions(&self, tablet: &TabletAlias) -> CResult<Vec<TabletAction>>;
    async fn watch_actions(&self, tablet: &TabletAlias) -> CResult<watch::Receiver<Vec<TabletAction>>>;
    async fn append_actionlog(&self, entry: ActionLogEntry) -> CResult<()>;
}

/// `UpdateFields(alias, fn)` (spec §4.1): loop read -> apply -> write until
/// success or a non-`ErrBadVersion` error. Generic over keyspace updates
/// here; `agent`/`reparent` define their own tablet/shard-scoped wrappers
/// with the same shape.
pub async fn update_keyspace_fields<F>(store: &dyn TopoStore, name: &str, mut f: F) -> CResult<Keyspace>
where
    F: FnMut(&mut Keyspace),
{
    loop {
        let Versioned { mut value, version } = store.get_keyspace(name).await?;
        f(&mut value);
        match store.update_keyspace(name, version, value.clone()).await {
            Ok(_) => return Ok(value),
            Err(ReError::BadVersion(_)) => continue,
            Err(e) => return Err(e),
        }
    }
}

pub async fn update_shard_fields<F>(
    store: &dyn TopoStore,
    keyspace: &str,
    shard: &str,
    mut f: F,
) -> CResult<Shard>
where
    F: FnMut(&mut Shard),
{
    loop {
        let Versioned { mut value, version } = store.get_shard(keyspace, shard).await?;
        f(&mut value);
        match store.update_shard(keyspace, shard, version, value.clone()).await {
            Ok(_) => return Ok(value),
            Err(ReError::BadVersion(_)) => continue,
            Err(e) => return Err(e),
        }
    }
}

pub async fn update_tablet_fields<F>(store: &dyn TopoStore, alias: &TabletAlias, mut f: F) -> CResult<Tablet>
where
    F: FnMut(&mut Tablet),
{
    loop {
        let Versioned { mut value, version } = store.get_tablet(alias).await?;
        f(&mut value);
        match store.update_tablet(alias, version, value.clone()).await {
            Ok(_) => return Ok(value),
            Err(ReError::BadVersion(_)) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// recompute `cell`'s serving graph for `keyspace` from its current `Shard`
/// records and publish it, creating the `SrvKeyspace` node on first use.
/// Callers invoke this after any shard-topology change a Gateway should
/// converge on (reparent's `master_alias` update, resharding cutover).
pub async fn rebuild_and_publish_srv_keyspace(
    store: &dyn TopoStore,
    cell: &str,
    keyspace: &str,
) -> CResult<SrvKeyspace> {
    let shard_names = store.list_shards(keyspace).await?;
    let mut shards = Vec::with_capacity(shard_names.len());
    for name in shard_names {
        shards.push(store.get_shard(keyspace, &name).await?.value);
    }
    let fresh = crate::model::rebuild_srv_keyspace(keyspace, &shards);

    match store.get_srv_keyspace(cell, keyspace).await {
        Ok(Versioned { version, .. }) => {
            store.update_srv_keyspace(cell, keyspace, version, fresh.clone()).await?;
        }
        Err(ReError::NoNode(_)) => {
            store.update_srv_keyspace(cell, keyspace, 0, fresh.clone()).await?;
        }
        Err(e) => return Err(e),
    }
    Ok(fresh)
}
