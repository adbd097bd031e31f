//! Transaction-session bookkeeping (spec §4.5): one `ShardSession` per shard
//! a transaction has touched, and a `Session` aggregating them with the
//! poisoning rule from spec §7 ("inside a transaction, any error poisons the
//! session").

use gateway::CallContext;
use topo::TabletType;

#[derive(Debug, Clone)]
pub struct ShardSession {
    pub keyspace: String,
    pub shard: String,
    pub tablet_type: TabletType,
    pub ctx: CallContext,
}

impl ShardSession {
    pub fn new(keyspace: impl Into<String>, shard: impl Into<String>, tablet_type: TabletType) -> Self {
        ShardSession { keyspace: keyspace.into(), shard: shard.into(), tablet_type, ctx: CallContext::default() }
    }
}

/// the transaction session threaded through every `ScatterGather` call
/// (spec §4.5). `shard_sessions` preserves insertion order since commit
/// order is defined as "the insertion order of the shard sessions" (spec §5).
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub in_transaction: bool,
    pub shard_sessions: Vec<ShardSession>,
    /// set on any error encountered while `in_transaction`; once poisoned,
    /// every subsequent call fails fast with `FAILED_PRECONDITION` (spec §7).
    pub poisoned: bool,
}

impl Session {
    pub fn begin() -> Self {
        Session { in_transaction: true, shard_sessions: Vec::new(), poisoned: false }
    }

    pub fn find(&self, keyspace: &str, shard: &str) -> Option<&ShardSession> {
        self.shard_sessions.iter().find(|s| s.keyspace == keyspace && s.shard == shard)
    }

    pub fn find_mut(&mut self, keyspace: &str, shard: &str) -> Option<&mut ShardSession> {
        self.shard_sessions.iter_mut().find(|s| s.keyspace == keyspace && s.shard == shard)
    }

    pub fn reset(&mut self) {
        self.in_transaction = false;
        self.shard_sessions.clear();
        self.poisoned = false;
    }
}
