//! Action handlers (spec §4.6 step 4, §4.6.2): the named units of work a
//! `TabletAgent` dispatches a claimed action to. Each handler runs with
//! exclusive semantics over the local mysqld because the action queue
//! guarantees only one handler is ever running per tablet at a time.

use std::time::Duration;

use serde_json::{json, Value as Json};

use common::err::decode_error::ReError;
use common::err::CResult;
use topo::{KeyRange, TabletAlias, TabletType};

use crate::backup::Manifest;
use crate::state_machine::Transition;
use crate::tablet_agent::TabletAgent;

pub async fn dispatch(agent: &TabletAgent, name: &str, args: &Json) -> CResult<Json> {
    match name {
        "ChangeType" => change_type(agent, args).await,
        "DemoteMaster" => demote_master(agent).await,
        "PromoteSlave" => promote_slave(agent).await,
        "RestartSlave" => restart_slave(agent, args).await,
        "SetMaster" => set_master(agent, args).await,
        "WaitSlavePosition" => wait_slave_position(agent, args).await,
        "Snapshot" => snapshot(agent, args).await,
        "MultiSnapshot" => multi_snapshot(agent, args).await,
        "SnapshotSourceEnd" => snapshot_source_end(agent).await,
        "Restore" => restore(agent, args).await,
        "SlaveStatus" => slave_status(agent).await,
        "WaitForReparentJournal" => wait_for_reparent_journal(agent, args).await,
        other => Err(ReError::InvalidArgument(format!("no such tablet action: {}", other))),
    }
}

fn parse_type(s: &str) -> CResult<TabletType> {
    Ok(match s {
        "master" | "Master" => TabletType::Master,
        "replica" | "Replica" => TabletType::Replica,
        "rdonly" | "Rdonly" => TabletType::Rdonly,
        "spare" | "Spare" => TabletType::Spare,
        "backup" | "Backup" => TabletType::Backup,
        "snapshot_source" | "SnapshotSource" => TabletType::SnapshotSource,
        "restore" | "Restore" => TabletType::Restore,
        "idle" | "Idle" => TabletType::Idle,
        "scrap" | "Scrap" => TabletType::Scrap,
        "worker" | "Worker" => TabletType::Worker,
        "experimental" | "Experimental" => TabletType::Experimental,
        other => return Err(ReError::InvalidArgument(format!("unknown tablet type: {}", other))),
    })
}

/// an ordinary `ChangeType` (spec §4.6.1): rejects `master` — that is only
/// reachable through the reparent coordinator's `Transition::Reparent`.
async fn change_type(agent: &TabletAgent, args: &Json) -> CResult<Json> {
    let to = parse_type(args["to"].as_str().ok_or_else(|| ReError::InvalidArgument("ChangeType requires 'to'".into()))?)?;
    let force = args["force"].as_bool().unwrap_or(false);
    let via = if force { Transition::Force } else { Transition::Normal };
    agent.change_type(to, via).await?;
    Ok(json!({"type": args["to"]}))
}

/// spec §4.7 step 2: sets read-only, returns current replication position.
async fn demote_master(agent: &TabletAgent) -> CResult<Json> {
    agent.mysqld.set_read_only(true).await?;
    let position = agent.mysqld.current_position().await?;
    Ok(json!({"position": position}))
}

/// spec §4.7 step 4: `RESET SLAVE`, `SET GLOBAL read_only=0`, returns the new position.
async fn promote_slave(agent: &TabletAgent) -> CResult<Json> {
    agent.mysqld.reset_replication().await?;
    agent.mysqld.set_read_only(false).await?;
    let position = agent.mysqld.current_position().await?;
    agent.change_type(TabletType::Master, Transition::Reparent).await?;
    Ok(json!({"position": position}))
}

/// plain `RestartSlave`: reattach replication to the recorded master at the
/// tablet's last known position (operator recovery action, not part of the
/// reparent protocol proper).
async fn restart_slave(agent: &TabletAgent, args: &Json) -> CResult<Json> {
    let parent = args["parent_alias"].as_str().unwrap_or_default();
    agent.mysqld.stop_replication().await?;
    let position = agent.mysqld.current_position().await?;
    agent.mysqld.set_master(parent, &position).await?;
    Ok(json!({"position": position}))
}

/// spec §4.7 step 5: point this replica at the new master at position `Q`.
async fn set_master(agent: &TabletAgent, args: &Json) -> CResult<Json> {
    let parent = args["parent_alias"]
        .as_str()
        .ok_or_else(|| ReError::InvalidArgument("SetMaster requires 'parent_alias'".into()))?;
    let position = args["position"]
        .as_str()
        .ok_or_else(|| ReError::InvalidArgument("SetMaster requires 'position'".into()))?;
    agent.mysqld.set_master(parent, position).await?;
    Ok(json!({}))
}

/// spec §4.7 step 3: fails fast if the replica cannot catch up to `position`
/// within `timeout_ms`.
async fn wait_slave_position(agent: &TabletAgent, args: &Json) -> CResult<Json> {
    let position = args["position"]
        .as_str()
        .ok_or_else(|| ReError::InvalidArgument("WaitSlavePosition requires 'position'".into()))?;
    let timeout_ms = args["timeout_ms"].as_u64().unwrap_or(30_000);
    agent.mysqld.wait_for_position(position, Duration::from_millis(timeout_ms)).await?;
    Ok(json!({}))
}

/// spec §4.6.2 "Snapshot": stop replication, copy data files, write a
/// manifest, restart replication unless `server_mode` (in which case the
/// tablet enters `snapshot_source` and stays there until `SnapshotSourceEnd`).
async fn snapshot(agent: &TabletAgent, args: &Json) -> CResult<Json> {
    if agent.current().await.ty != TabletType::Backup {
        return Err(ReError::FailedPrecondition("Snapshot requires the tablet be type=backup".into()));
    }
    let db_name = args["db_name"].as_str().unwrap_or("vt_ks").to_string();
    let server_mode = args["server_mode"].as_bool().unwrap_or(false);

    agent.mysqld.stop_replication().await?;
    let position = agent.mysqld.current_position().await?;
    let files = agent.mysqld.data_files(&db_name).await?;

    let manifest = Manifest {
        db_name: db_name.clone(),
        files,
        replication_position: position,
        server_mode,
        created_at_ms: args["now_ms"].as_i64().unwrap_or(0),
        key_range: None,
    };
    let name = Manifest::manifest_name(&db_name, manifest.created_at_ms);
    agent.backup.put_file(&name, manifest.to_json()?.as_bytes()).await?;

    if server_mode {
        agent.change_type(TabletType::SnapshotSource, Transition::Normal).await?;
    } else {
        agent.mysqld.start_replication().await?;
    }

    Ok(json!({"manifest": name}))
}

/// spec §4.6.2 "MultiSnapshot": one manifest per key-range, each filtered by
/// the sharding column (modeled here as a tag on the manifest rather than a
/// real `SELECT ... INTO OUTFILE`, since the SQL execution engine itself is
/// out of scope — spec §1).
async fn multi_snapshot(agent: &TabletAgent, args: &Json) -> CResult<Json> {
    let db_name = args["db_name"].as_str().unwrap_or("vt_ks").to_string();
    let key_ranges: Vec<KeyRange> = args["key_ranges"]
        .as_array()
        .ok_or_else(|| ReError::InvalidArgument("MultiSnapshot requires 'key_ranges'".into()))?
        .iter()
        .map(|v| {
            let spec = v.as_str().ok_or_else(|| ReError::InvalidArgument("key_ranges entries must be strings".into()))?;
            topo::parse_sharding_spec(spec)?
                .into_iter()
                .next()
                .ok_or_else(|| ReError::InvalidArgument(format!("empty key range spec: {}", spec)))
        })
        .collect::<CResult<Vec<_>>>()?;

    let position = agent.mysqld.current_position().await?;
    let files = agent.mysqld.data_files(&db_name).await?;
    let mut manifests = Vec::with_capacity(key_ranges.len());

    for (i, kr) in key_ranges.into_iter().enumerate() {
        let manifest = Manifest {
            db_name: db_name.clone(),
            files: files.clone(),
            replication_position: position.clone(),
            server_mode: false,
            created_at_ms: args["now_ms"].as_i64().unwrap_or(0) + i as i64,
            key_range: Some(kr),
        };
        let name = Manifest::manifest_name(&format!("{}-{}", db_name, i), manifest.created_at_ms);
        agent.backup.put_file(&name, manifest.to_json()?.as_bytes()).await?;
        manifests.push(name);
    }

    Ok(json!({"manifests": manifests}))
}

/// ends a server-mode snapshot (spec §4.6.2): resumes replication and
/// returns the tablet to `spare`.
async fn snapshot_source_end(agent: &TabletAgent) -> CResult<Json> {
    agent.mysqld.start_replication().await?;
    agent.change_type(TabletType::Spare, Transition::Normal).await?;
    Ok(json!({}))
}

/// spec §4.6.2 "Restore": validate source tablet, fetch manifest, shut down
/// mysqld, install data files, start mysqld, configure replication to
/// `parent_alias` at the manifest's position, transition to `spare`. Requires
/// the tablet be `idle` beforehand.
async fn restore(agent: &TabletAgent, args: &Json) -> CResult<Json> {
    if !crate::state_machine::can_restore(agent.current().await.ty) {
        return Err(ReError::FailedPrecondition("Restore requires the tablet be type=idle beforehand".into()));
    }
    let manifest_path = args["manifest_path"]
        .as_str()
        .ok_or_else(|| ReError::InvalidArgument("Restore requires 'manifest_path'".into()))?;
    let parent_alias = args["parent_alias"]
        .as_str()
        .ok_or_else(|| ReError::InvalidArgument("Restore requires 'parent_alias'".into()))?;

    let raw = agent.backup.get_file(manifest_path).await?;
    let manifest = Manifest::from_json(std::str::from_utf8(&raw).map_err(|e| ReError::Utf8Error(e))?)?;

    agent.change_type(TabletType::Restore, Transition::Normal).await?;
    agent.mysqld.shutdown().await?;
    agent.mysqld.install_data_files(&manifest.db_name, manifest.files.clone()).await?;
    agent.mysqld.start().await?;
    agent.mysqld.set_master(parent_alias, &manifest.replication_position).await?;
    agent.change_type(TabletType::Spare, Transition::Normal).await?;

    Ok(json!({"db_name": manifest.db_name, "position": manifest.replication_position}))
}

/// queries this tablet's current replication position without mutating
/// anything; used by emergency reparent (spec §4.7) to pick the
/// most-advanced replica when the old master is unreachable.
async fn slave_status(agent: &TabletAgent) -> CResult<Json> {
    let position = agent.mysqld.current_position().await?;
    Ok(json!({"position": position}))
}

/// spec §4.7 step 5: blocks until this replica has applied the reparent
/// journal row the new master wrote at `position`, confirming it has
/// actually been initialized as the new master before moving on.
async fn wait_for_reparent_journal(agent: &TabletAgent, args: &Json) -> CResult<Json> {
    let position = args["position"]
        .as_str()
        .ok_or_else(|| ReError::InvalidArgument("WaitForReparentJournal requires 'position'".into()))?;
    let timeout_ms = args["timeout_ms"].as_u64().unwrap_or(30_000);
    let deadline = std::time::Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if agent.mysqld.has_reparent_journal_row(position).await? {
            return Ok(json!({}));
        }
        if std::time::Instant::now() >= deadline {
            return Err(ReError::Timeout(format!("reparent journal row at {} never observed", position)));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// used by the reparent coordinator directly (outside the action queue) to
/// parse a `TabletAlias` out of an action's arguments.
pub fn parse_alias(s: &str) -> CResult<TabletAlias> {
    let (cell, uid) = s
        .rsplit_once('-')
        .ok_or_else(|| ReError::InvalidArgument(format!("malformed tablet alias: {}", s)))?;
    Ok(TabletAlias { cell: cell.to_string(), uid: uid.parse().map_err(|_| ReError::InvalidArgument(format!("bad uid in alias: {}", s)))? })
}
