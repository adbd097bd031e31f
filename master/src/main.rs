//! `master`: the cluster control plane (spec §3 "Keyspace/Shard/Tablet
//! administration" + §4.7 "reparent coordinator"). A thin `clap` front end
//! over `topo`/`agent`/`reparent`, the administrative counterpart to `gate`
//! on the query-serving side.
//!
//! Every subcommand here operates against a fresh in-process `MemStore` —
//! there is no persistence across invocations, matching the scope of the
//! `TopoStore` reference implementation this repo specifies (spec §1: the
//! real backend is an external collaborator).

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use agent::{FakeMysqld, LocalFsBackupStorage, TabletAgent};
use common::err::decode_error::ReError;
use common::err::CResult;
use common::log::tracing_factory::{OutputType, TracingFactory, TracingFactoryOptions};
use healthcheck::HealthCheck;
use reparent::ReparentCoordinator;
use topo::{
    update_shard_fields, Keyspace, KeyRange, MemStore, PortMap, Shard, ShardingColumnType, Tablet, TabletAlias,
    TabletType, TopoStore,
};

#[derive(Parser, Debug)]
#[command(name = "master")]
#[command(version = "0.0.1")]
#[command(author = "rust-us")]
#[command(about = "sharded MySQL cluster control plane")]
pub struct CliArgs {
    #[arg(short, long, help = "enable debug logging", default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// create a keyspace, its shards from a sharding spec, and one master +
    /// one replica tablet per shard; print the resulting topology.
    Bootstrap {
        keyspace: String,
        #[arg(long, default_value = "-80,80-")]
        shards: String,
        #[arg(long, default_value = "zone1")]
        cell: String,
    },
    /// bootstrap a single shard with a real in-process `TabletAgent` per
    /// tablet, then drive a planned reparent end to end and print the
    /// resulting shard record (master_alias updated, old master demoted).
    Reparent {
        #[arg(long, default_value = "ks")]
        keyspace: String,
        #[arg(long, default_value = "0")]
        shard: String,
        #[arg(long, default_value = "zone1")]
        cell: String,
    },
}

#[tokio::main]
async fn main() -> CResult<()> {
    let args = CliArgs::parse();
    TracingFactory::init_log_with_options(TracingFactoryOptions::new(args.debug, OutputType::STDOUT, None));

    match &args.command {
        Commands::Bootstrap { keyspace, shards, cell } => bootstrap(keyspace, shards, cell).await,
        Commands::Reparent { keyspace, shard, cell } => reparent(keyspace, shard, cell).await,
    }
}

fn tablet(alias: TabletAlias, keyspace: &str, shard: &str, key_range: KeyRange, ty: TabletType) -> Tablet {
    Tablet {
        alias,
        hostname: "localhost".to_string(),
        ports: PortMap { mysql: 3306, vt: 15991, grpc: 15999 },
        keyspace: keyspace.to_string(),
        shard: shard.to_string(),
        key_range,
        ty,
        tags: Default::default(),
    }
}

/// spec §3: `CreateKeyspace`/`CreateShard`/`CreateTablet`, in that order —
/// tablets are created after their owning shard exists.
async fn bootstrap(keyspace: &str, shards: &str, cell: &str) -> CResult<()> {
    let store = MemStore::new();
    store
        .create_keyspace(Keyspace {
            name: keyspace.to_string(),
            sharding_column_name: Some("id".to_string()),
            sharding_column_type: ShardingColumnType::Uint64,
            served_from: Default::default(),
        })
        .await?;

    let ranges = topo::parse_sharding_spec(shards)?;
    let mut uid = 100u32;
    for range in &ranges {
        let shard_name = shard_name(range);
        store.create_shard(keyspace, Shard::new(shard_name.clone(), range.clone())).await?;

        let master_alias = TabletAlias { cell: cell.to_string(), uid };
        store.create_tablet(tablet(master_alias.clone(), keyspace, &shard_name, range.clone(), TabletType::Master)).await?;
        uid += 1;
        let replica_alias = TabletAlias { cell: cell.to_string(), uid };
        store.create_tablet(tablet(replica_alias, keyspace, &shard_name, range.clone(), TabletType::Replica)).await?;
        uid += 1;

        update_shard_fields(&store, keyspace, &shard_name, |s| s.master_alias = Some(master_alias.clone())).await?;
    }

    let published = topo::rebuild_and_publish_srv_keyspace(&store, cell, keyspace).await?;
    println!("{}", to_json_pretty(&published)?);
    Ok(())
}

fn shard_name(range: &KeyRange) -> String {
    format!(
        "{}-{}",
        range.start.as_ref().map(|k| hex::encode(k.as_bytes())).unwrap_or_default(),
        range.end.as_ref().map(|k| hex::encode(k.as_bytes())).unwrap_or_default(),
    )
}

/// spec §4.7: drives a planned reparent between two real `TabletAgent`s
/// sharing one `MemStore`, the same wiring `reparent`'s own integration
/// tests use, here exposed as a CLI demo.
async fn reparent(keyspace: &str, shard: &str, cell: &str) -> CResult<()> {
    let store: Arc<dyn TopoStore> = Arc::new(MemStore::new());
    store
        .create_keyspace(Keyspace {
            name: keyspace.to_string(),
            sharding_column_name: Some("id".to_string()),
            sharding_column_type: ShardingColumnType::Uint64,
            served_from: Default::default(),
        })
        .await?;
    store.create_shard(keyspace, Shard::new(shard, KeyRange::full())).await?;

    let old_master = TabletAlias { cell: cell.to_string(), uid: 100 };
    let new_master = TabletAlias { cell: cell.to_string(), uid: 101 };
    store.create_tablet(tablet(old_master.clone(), keyspace, shard, KeyRange::full(), TabletType::Master)).await?;
    store.create_tablet(tablet(new_master.clone(), keyspace, shard, KeyRange::full(), TabletType::Replica)).await?;
    update_shard_fields(store.as_ref(), keyspace, shard, |s| s.master_alias = Some(old_master.clone())).await?;

    let backup_root = std::env::temp_dir().join(format!("master-reparent-demo-{}", std::process::id()));
    let old_agent = TabletAgent::attach(
        store.clone(),
        Arc::new(FakeMysqld::new("0000001")),
        Arc::new(LocalFsBackupStorage::new(backup_root.join("old"))),
        old_master.clone(),
        std::process::id(),
    )
    .await?;
    let new_agent = TabletAgent::attach(
        store.clone(),
        Arc::new(FakeMysqld::new("0000001")),
        Arc::new(LocalFsBackupStorage::new(backup_root.join("new"))),
        new_master.clone(),
        std::process::id(),
    )
    .await?;

    let _old_runner = tokio::spawn(old_agent.clone().run());
    let _new_runner = tokio::spawn(new_agent.clone().run());

    let healthcheck = HealthCheck::new(Duration::from_secs(60));
    let coordinator = ReparentCoordinator::new(store.clone(), healthcheck, Duration::from_secs(30));

    coordinator
        .planned_reparent(keyspace, shard, &old_master, &new_master, std::slice::from_ref(&new_master))
        .await?;

    let final_shard = store.get_shard(keyspace, shard).await?;
    println!("{}", to_json_pretty(&final_shard.value)?);
    Ok(())
}

fn to_json_pretty<T: serde::Serialize>(value: &T) -> CResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| ReError::Error(e.to_string()))
}
