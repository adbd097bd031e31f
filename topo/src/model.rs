use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::key_range::KeyRange;

/// spec §3 "Keyspace". `sharding_column_type != Unset` iff the keyspace is
/// sharded — enforced by `Keyspace::is_sharded`, not by a separate bool flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyspace {
    pub name: String,
    pub sharding_column_name: Option<String>,
    pub sharding_column_type: ShardingColumnType,
    /// redirects a tablet type to another keyspace, for vertical splits
    pub served_from: HashMap<TabletType, String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ShardingColumnType {
    Unset,
    Uint64,
    Bytes,
}

impl Keyspace {
    pub fn unsharded(name: impl Into<String>) -> Self {
        Keyspace {
            name: name.into(),
            sharding_column_name: None,
            sharding_column_type: ShardingColumnType::Unset,
            served_from: HashMap::new(),
        }
    }

    pub fn is_sharded(&self) -> bool {
        self.sharding_column_type != ShardingColumnType::Unset
    }
}

/// spec §3 "Shard": a contiguous key-range within a keyspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shard {
    pub name: String,
    pub key_range: KeyRange,
    pub master_alias: Option<TabletAlias>,
    pub served_types: Vec<TabletType>,
    /// shards we are replicating from during an in-flight resharding
    pub source_shards: Vec<String>,
    pub tablet_controls: HashMap<TabletType, TabletControl>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabletControl {
    pub blacklisted_tables: Vec<String>,
    pub disable_query_service: bool,
}

impl Shard {
    pub fn new(name: impl Into<String>, key_range: KeyRange) -> Self {
        Shard {
            name: name.into(),
            key_range,
            master_alias: None,
            served_types: vec![TabletType::Master, TabletType::Replica, TabletType::Rdonly],
            source_shards: vec![],
            tablet_controls: HashMap::new(),
        }
    }

    pub fn serves(&self, t: TabletType) -> bool {
        self.served_types.contains(&t)
    }
}

/// spec §3 "Tablet": alias `(cell, uid)` uniquely identifies a backend.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TabletAlias {
    pub cell: String,
    pub uid: u32,
}

impl std::fmt::Display for TabletAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:010}", self.cell, self.uid)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TabletType {
    Master,
    Replica,
    Rdonly,
    Spare,
    Experimental,
    Backup,
    /// a `backup` tablet that took a server-mode snapshot: out of the
    /// serving set until an explicit `SnapshotSourceEnd` (spec §4.6.2)
    SnapshotSource,
    Restore,
    Worker,
    Scrap,
    Idle,
}

impl TabletType {
    /// tablet types that may serve live client traffic when `serving=true`
    pub fn is_servable(&self) -> bool {
        matches!(self, TabletType::Master | TabletType::Replica | TabletType::Rdonly)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortMap {
    pub mysql: u16,
    pub vt: u16,
    pub grpc: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tablet {
    pub alias: TabletAlias,
    pub hostname: String,
    pub ports: PortMap,
    pub keyspace: String,
    pub shard: String,
    pub key_range: KeyRange,
    pub ty: TabletType,
    pub tags: HashMap<String, String>,
}

impl Tablet {
    pub fn target(&self) -> (String, String, TabletType) {
        (self.keyspace.clone(), self.shard.clone(), self.ty)
    }
}

/// one shard's entry in a cell's serving graph (spec §3/§6 "SrvKeyspace"):
/// just enough to route without reading the full `Shard` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrvShard {
    pub name: String,
    pub key_range: KeyRange,
}

/// the per-cell, per-keyspace serving graph the `GetSrvKeyspace` RPC
/// returns (spec §4.1 entity list, §6 topology path
/// `/cells/<c>/keyspaces/<k>/shards/<s>/serving`): which shards serve which
/// tablet type in this cell, derived from the keyspace's `Shard` records by
/// `rebuild_srv_keyspace` whenever shard topology changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrvKeyspace {
    pub keyspace: String,
    pub partitions: HashMap<TabletType, Vec<SrvShard>>,
}

impl SrvKeyspace {
    pub fn shards_serving(&self, ty: TabletType) -> &[SrvShard] {
        self.partitions.get(&ty).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// derive a cell's serving graph from the live `Shard` records of a keyspace
/// (spec §3 Shard attribute `served_types`): every shard that serves `t`
/// contributes a `SrvShard` entry to partition `t`.
pub fn rebuild_srv_keyspace(keyspace: &str, shards: &[Shard]) -> SrvKeyspace {
    let mut partitions: HashMap<TabletType, Vec<SrvShard>> = HashMap::new();
    for shard in shards {
        for &ty in &shard.served_types {
            partitions.entry(ty).or_default().push(SrvShard {
                name: shard.name.clone(),
                key_range: shard.key_range.clone(),
            });
        }
    }
    SrvKeyspace { keyspace: keyspace.to_string(), partitions }
}
