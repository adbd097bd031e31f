//! The tablet state machine (spec §4.6.1):
//!
//! ```text
//! idle ──► restore ──► spare ──► replica ⇄ rdonly ⇄ spare
//!                                   │
//!                                   ▼
//!                                 master ──► backup ──► snapshot_source ──► spare
//!                                   │
//!                                   └──► demote (via reparent) ──► replica
//! ```
//!
//! `any -> scrap` is always legal under operator force. `master` may only be
//! entered through `Transition::Reparent` (spec: "master may only be
//! assigned through a reparent operation that designates this alias in the
//! shard record in the same transaction") — `TabletAgent::change_type`
//! rejects a plain `ChangeType` into `Master`.

use topo::TabletType;

/// why a transition is being requested — gates the transitions that are
/// only legal through a specific caller.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Transition {
    /// an ordinary `ChangeType` action
    Normal,
    /// driven by the reparent coordinator (spec §4.7): the only path into
    /// `Master`, and the path `Master -> Replica` takes on demotion
    Reparent,
    /// `--force`: any -> scrap, bypassing the lattice entirely
    Force,
}

/// `true` iff `from -> to` is a legal transition under `via`.
pub fn can_transition(from: TabletType, to: TabletType, via: Transition) -> bool {
    if matches!(via, Transition::Force) && to == TabletType::Scrap {
        return true;
    }

    use TabletType::*;
    match (from, to) {
        (Idle, Restore) => true,
        (Restore, Spare) => true,
        (Spare, Replica) | (Spare, Rdonly) => true,
        (Replica, Rdonly) | (Rdonly, Replica) => true,
        (Replica, Spare) | (Rdonly, Spare) => true,
        (Replica, Master) => matches!(via, Transition::Reparent),
        (Master, Replica) => matches!(via, Transition::Reparent),
        (Master, Backup) => true,
        (Backup, SnapshotSource) => true,
        (SnapshotSource, Spare) => true,
        // backup/snapshot_source are both reachable back to serving via spare
        (Backup, Spare) => true,
        _ => false,
    }
}

/// spec §4.6.2: `restore` requires the tablet be `idle` beforehand.
pub fn can_restore(from: TabletType) -> bool {
    from == TabletType::Idle
}

/// spec §4.6.1: `backup` and `snapshot_source` take the tablet out of the
/// serving set.
pub fn takes_out_of_serving(ty: TabletType) -> bool {
    matches!(ty, TabletType::Backup | TabletType::SnapshotSource)
}

#[cfg(test)]
mod test {
    use super::*;
    use topo::TabletType::*;

    #[test]
    fn idle_to_restore_to_spare_to_replica() {
        assert!(can_transition(Idle, Restore, Transition::Normal));
        assert!(can_transition(Restore, Spare, Transition::Normal));
        assert!(can_transition(Spare, Replica, Transition::Normal));
    }

    #[test]
    fn master_only_reachable_via_reparent() {
        assert!(!can_transition(Replica, Master, Transition::Normal));
        assert!(can_transition(Replica, Master, Transition::Reparent));
    }

    #[test]
    fn demote_back_to_replica_also_requires_reparent() {
        assert!(!can_transition(Master, Replica, Transition::Normal));
        assert!(can_transition(Master, Replica, Transition::Reparent));
    }

    #[test]
    fn backup_chain_out_of_serving_and_back() {
        assert!(can_transition(Master, Backup, Transition::Normal));
        assert!(can_transition(Backup, SnapshotSource, Transition::Normal));
        assert!(can_transition(SnapshotSource, Spare, Transition::Normal));
        assert!(takes_out_of_serving(Backup));
        assert!(takes_out_of_serving(SnapshotSource));
    }

    #[test]
    fn any_to_scrap_only_under_force() {
        assert!(!can_transition(Replica, Scrap, Transition::Normal));
        assert!(can_transition(Replica, Scrap, Transition::Force));
        assert!(can_transition(Master, Scrap, Transition::Force));
    }

    #[test]
    fn unrelated_jump_is_illegal() {
        assert!(!can_transition(Idle, Master, Transition::Reparent));
        assert!(!can_transition(Idle, Replica, Transition::Normal));
    }
}
