//! Resolves a planned `Route`'s `TargetSelection` against a keyspace's
//! actual shard key-ranges into the concrete `(shard, SQL)` pairs the
//! scatter-gather layer consumes (spec §2 data flow: "SQL -> list of
//! (shard, rewritten-SQL) pairs"; spec §4.4.1 Route's documented output).
//!
//! The planner never sees real shard topology — it only produces
//! `TargetSelection`s. Resolving those against a keyspace's live
//! `Shard`/`KeyRange` list is a separate, narrower step so the planner stays
//! testable without a topology store.

use common::err::decode_error::ReError;
use common::err::CResult;
use topo::KeyRange;

use crate::plan::{BindExpr, Route, TargetSelection};
use crate::vindex::Vindex;

/// one shard a resolved `Route` touches.
pub type ShardName = String;

/// resolves `route.target` against `shards` (the owning keyspace's shard
/// names paired with their key ranges) into the shard names the route must
/// be dispatched to. `bind_value` supplies a bindvar's literal value when a
/// `TargetSelection::VindexMapped` value references one instead of carrying
/// a literal directly.
///
/// Lookup vindexes require an async `Map` call and go through
/// `resolve_shards_async` instead; calling this with a lookup vindex target
/// is a caller bug.
pub fn resolve_shards(
    route: &Route,
    shards: &[(ShardName, KeyRange)],
    bind_value: impl Fn(&str) -> Option<serde_json::Value>,
) -> CResult<Vec<ShardName>> {
    match &route.target {
        TargetSelection::SingleUnsharded => single_shard(route, shards),
        TargetSelection::AllShards => all_shards(route, shards),
        TargetSelection::NamedShard(name) => Ok(vec![name.clone()]),
        TargetSelection::VindexMapped { vindex, values } => match vindex {
            Vindex::Functional(f) => {
                let resolved = resolve_values(values, &bind_value)?;
                let ksids = f.map(&resolved)?;
                shards_for_ksids(route, shards, ksids.into_iter())
            }
            Vindex::Lookup(_) => Err(ReError::Internal(format!(
                "route on keyspace {} targets a lookup vindex; use resolve_shards_async",
                route.keyspace
            ))),
        },
    }
}

/// same as `resolve_shards` but for a `TargetSelection::VindexMapped` whose
/// vindex is a `Lookup` vindex, which resolves ids to ksids with an async
/// side-table read (spec §4.4.1: lookup vindexes are backed by I/O).
pub async fn resolve_shards_async(
    route: &Route,
    shards: &[(ShardName, KeyRange)],
    bind_value: impl Fn(&str) -> Option<serde_json::Value>,
) -> CResult<Vec<ShardName>> {
    match &route.target {
        TargetSelection::SingleUnsharded => single_shard(route, shards),
        TargetSelection::AllShards => all_shards(route, shards),
        TargetSelection::NamedShard(name) => Ok(vec![name.clone()]),
        TargetSelection::VindexMapped { vindex, values } => {
            let resolved = resolve_values(values, &bind_value)?;
            match vindex {
                Vindex::Functional(f) => shards_for_ksids(route, shards, f.map(&resolved)?.into_iter()),
                Vindex::Lookup(l) => {
                    let found = l.map(&resolved).await?;
                    let present: Vec<_> = found.into_iter().flatten().collect();
                    if present.is_empty() {
                        // spec §9 Open Question 1: absent lookup rows either
                        // scatter or fail, governed by `ClusterConfig`; the
                        // caller decides which by checking this error or
                        // falling back to `all_shards` itself.
                        return Err(ReError::FailedPrecondition(format!(
                            "no lookup row for the vindex values on keyspace {}",
                            route.keyspace
                        )));
                    }
                    shards_for_ksids(route, shards, present.into_iter())
                }
            }
        }
    }
}

fn single_shard(route: &Route, shards: &[(ShardName, KeyRange)]) -> CResult<Vec<ShardName>> {
    shards
        .first()
        .map(|(n, _)| vec![n.clone()])
        .ok_or_else(|| ReError::Internal(format!("keyspace {} has no shards", route.keyspace)))
}

fn all_shards(route: &Route, shards: &[(ShardName, KeyRange)]) -> CResult<Vec<ShardName>> {
    if shards.is_empty() {
        return Err(ReError::Internal(format!("keyspace {} has no shards", route.keyspace)));
    }
    Ok(shards.iter().map(|(n, _)| n.clone()).collect())
}

fn resolve_values(
    values: &[BindExpr],
    bind_value: &impl Fn(&str) -> Option<serde_json::Value>,
) -> CResult<Vec<serde_json::Value>> {
    values
        .iter()
        .map(|v| match v {
            BindExpr::Literal(j) => Ok(j.clone()),
            BindExpr::BindVar(name) => {
                bind_value(name).ok_or_else(|| ReError::InvalidArgument(format!("missing bind variable {}", name)))
            }
        })
        .collect()
}

fn shards_for_ksids(
    route: &Route,
    shards: &[(ShardName, KeyRange)],
    ksids: impl Iterator<Item = topo::KeyspaceId>,
) -> CResult<Vec<ShardName>> {
    let mut out: Vec<ShardName> = Vec::new();
    for ksid in ksids {
        let shard = shards
            .iter()
            .find(|(_, kr)| kr.contains(&ksid))
            .map(|(n, _)| n.clone())
            .ok_or_else(|| {
                ReError::Internal(format!(
                    "ksid {:?} does not fall within any shard of keyspace {}",
                    ksid, route.keyspace
                ))
            })?;
        if !out.contains(&shard) {
            out.push(shard);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vindex::Hash;
    use std::sync::Arc;
    use topo::KeyspaceId;

    fn two_shards() -> Vec<(ShardName, KeyRange)> {
        vec![
            ("-80".to_string(), KeyRange::new(None, Some(KeyspaceId::from_hex("80000000000000").unwrap()))),
            ("80-".to_string(), KeyRange::new(Some(KeyspaceId::from_hex("80000000000000").unwrap()), None)),
        ]
    }

    #[test]
    fn single_unsharded_targets_the_only_shard() {
        let route = Route::unsharded("ks", "select 1");
        let shards = vec![("0".to_string(), KeyRange::full())];
        let resolved = resolve_shards(&route, &shards, |_| None).unwrap();
        assert_eq!(resolved, vec!["0".to_string()]);
    }

    #[test]
    fn all_shards_returns_every_shard_name() {
        let route = Route::scatter("ks", "select 1");
        let resolved = resolve_shards(&route, &two_shards(), |_| None).unwrap();
        assert_eq!(resolved, vec!["-80".to_string(), "80-".to_string()]);
    }

    #[test]
    fn vindex_mapped_resolves_to_the_shard_whose_range_contains_the_ksid() {
        let mut route = Route::unsharded("ks", "select 1 where id = :v0");
        let vindex = Vindex::Functional(Arc::new(Hash::new("hash")));
        route.target = TargetSelection::VindexMapped {
            vindex,
            values: vec![BindExpr::BindVar("v0".to_string())],
        };

        let resolved = resolve_shards(&route, &two_shards(), |name| {
            if name == "v0" {
                Some(serde_json::json!(12345))
            } else {
                None
            }
        })
        .unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0] == "-80" || resolved[0] == "80-");
    }

    #[test]
    fn missing_bind_var_is_invalid_argument() {
        let mut route = Route::unsharded("ks", "select 1 where id = :v0");
        let vindex = Vindex::Functional(Arc::new(Hash::new("hash")));
        route.target = TargetSelection::VindexMapped {
            vindex,
            values: vec![BindExpr::BindVar("v0".to_string())],
        };
        let err = resolve_shards(&route, &two_shards(), |_| None).unwrap_err();
        assert!(matches!(err, ReError::InvalidArgument(_)));
    }
}
