//! `gate`: the query-serving front end (spec §1/§4 "Gateway" +
//! "Scatter-Gather"). Loads a `ClusterConfig`, brings up a `MemStore`,
//! `HealthCheck` and `Gateway`, and exposes the handful of operations an
//! operator needs to drive and inspect routing without a full RPC surface —
//! a thin `clap` front end over the library crates, same role as
//! `binlog_cli` plays for the binlog side of this repo.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;

use common::config::ClusterConfig;
use common::err::CResult;
use common::log::tracing_factory::{OutputType, TracingFactory, TracingFactoryOptions};
use healthcheck::HealthCheck;
use router::{plan_select, KeyspaceVSchema, VSchema};
use topo::{Keyspace, KeyRange, MemStore, Shard, ShardingColumnType, TopoStore};

#[derive(Parser, Debug)]
#[command(name = "gate")]
#[command(version = "0.0.1")]
#[command(author = "rust-us")]
#[command(about = "sharded MySQL query-serving gateway")]
pub struct CliArgs {
    /// path to a ClusterConfig toml file; falls back to ClusterConfig::default()
    #[arg(short, long, help = "path to cluster config file", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "enable debug logging", default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// bring up HealthCheck + Gateway against an empty in-process topology
    /// and idle, logging readiness. A real deployment points `TopoStore` at
    /// a networked backend instead of the in-memory reference impl.
    Serve,
    /// seed a keyspace with the given sharding spec, publish its serving
    /// graph, and print the resulting `SrvKeyspace` as JSON.
    SrvKeyspace {
        keyspace: String,
        /// sharding spec, e.g. "-80,80-"
        #[arg(long, default_value = "-80,80-")]
        shards: String,
        #[arg(long, default_value = "zone1")]
        cell: String,
    },
    /// plan a single SQL statement against an unsharded scratch vschema and
    /// print the resulting `Plan` as JSON.
    Plan { sql: String },
}

#[tokio::main]
async fn main() -> CResult<()> {
    let args = CliArgs::parse();
    TracingFactory::init_log_with_options(TracingFactoryOptions::new(args.debug, OutputType::STDOUT, None));

    let config = load_cluster_config(&args);
    tracing::info!(?config, "loaded cluster config");

    match &args.command {
        Commands::Serve => serve(config).await,
        Commands::SrvKeyspace { keyspace, shards, cell } => print_srv_keyspace(keyspace, shards, cell).await,
        Commands::Plan { sql } => print_plan(sql),
    }
}

fn load_cluster_config(args: &CliArgs) -> ClusterConfig {
    match &args.config {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(body) => toml::from_str(&body).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to parse cluster config, using defaults");
                ClusterConfig::default()
            }),
            Err(e) => {
                tracing::warn!(error = %e, path = ?path, "failed to read cluster config, using defaults");
                ClusterConfig::default()
            }
        },
        None => ClusterConfig::default(),
    }
}

/// spec §4.2/§4.3: bring up the healthcheck cache and the gateway that
/// serves off it, then idle. With no tablets registered this mainly proves
/// the wiring; a real deployment discovers tablets from the topology
/// backend and calls `healthcheck.add_tablet`/`gateway.register_tablet`.
async fn serve(config: ClusterConfig) -> CResult<()> {
    let healthcheck = HealthCheck::new(Duration::from_millis(config.healthcheck_stream_timeout_ms));
    let gateway = gateway::Gateway::new(healthcheck.clone(), Duration::from_millis(config.gateway_retry_deadline_ms));
    let _scattergather = scattergather::ScatterGather::new(std::sync::Arc::new(gateway));

    tracing::info!(cells = ?config.cells, "gate ready, no tablets registered yet");
    // a real process would block on an RPC server here; this reference
    // binary just confirms the stack comes up and then exits.
    Ok(())
}

async fn print_srv_keyspace(keyspace: &str, shards: &str, cell: &str) -> CResult<()> {
    let store = MemStore::new();
    store
        .create_keyspace(Keyspace {
            name: keyspace.to_string(),
            sharding_column_name: None,
            sharding_column_type: ShardingColumnType::Uint64,
            served_from: Default::default(),
        })
        .await?;

    let ranges = topo::parse_sharding_spec(shards)?;
    for range in &ranges {
        store.create_shard(keyspace, Shard::new(shard_name(range), range.clone())).await?;
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

fn print_plan(sql: &str) -> CResult<()> {
    let mut vschema = VSchema::default();
    vschema.add_keyspace(KeyspaceVSchema::unsharded("scratch"));
    let plan = plan_select(sql, &vschema)?;
    println!("{}", to_json_pretty(&DebugJson(&plan))?);
    Ok(())
}

fn to_json_pretty<T: Serialize>(value: &T) -> CResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| common::err::decode_error::ReError::Error(e.to_string()))
}

/// `Plan` carries `Arc<dyn Vindex>` and isn't `Serialize`; print its `Debug`
/// form as a JSON string value rather than bolting on derives the type
/// doesn't otherwise need.
struct DebugJson<'a, T>(&'a T);

impl<'a, T: std::fmt::Debug> Serialize for DebugJson<'a, T> {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{:?}", self.0))
    }
}
