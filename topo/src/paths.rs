//! Topology path shapes (spec §6 "Topology paths"). Other components never
//! build these strings by hand; they go through `TopoStore`'s typed API.
//! Exposed mainly so tests and the `master` CLI can print a node's location.

use crate::model::TabletAlias;

pub fn keyspace_path(keyspace: &str) -> String {
    format!("/keyspaces/{}", keyspace)
}

pub fn shard_path(keyspace: &str, shard: &str) -> String {
    format!("/keyspaces/{}/shards/{}", keyspace, shard)
}

pub fn tablet_path(cell: &str, uid: u32) -> String {
    format!("/cells/{}/tablets/{}", cell, uid)
}

pub fn serving_path(cell: &str, keyspace: &str, shard: &str) -> String {
    format!("/cells/{}/keyspaces/{}/shards/{}/serving", cell, keyspace, shard)
}

pub fn action_path(alias: &TabletAlias, seq: u64) -> String {
    format!("/cells/{}/tablets/{}/action/{}", alias.cell, alias.uid, seq)
}

pub fn actionlog_path(alias: &TabletAlias, seq: u64) -> String {
    format!("/cells/{}/tablets/{}/actionlog/{}", alias.cell, alias.uid, seq)
}

pub fn lock_path(keyspace: &str, shard: &str) -> String {
    format!("/keyspaces/{}/shards/{}/locks", keyspace, shard)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn paths_match_spec_shapes() {
        assert_eq!(keyspace_path("ks"), "/keyspaces/ks");
        assert_eq!(shard_path("ks", "-80"), "/keyspaces/ks/shards/-80");
        assert_eq!(tablet_path("zone1", 100), "/cells/zone1/tablets/100");
        assert_eq!(
            serving_path("zone1", "ks", "-80"),
            "/cells/zone1/keyspaces/ks/shards/-80/serving"
        );
    }
}
