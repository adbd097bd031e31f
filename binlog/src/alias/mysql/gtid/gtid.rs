use serde::Serialize;

use crate::alias::mysql::gtid::uuid::Uuid;

/// A single MySQL Global Transaction ID: `source_id:transaction_id`.
#[derive(Debug, Clone, Serialize)]
pub struct Gtid {
    pub source_id: Uuid,
    pub transaction_id: u64,
}

impl Gtid {
    pub fn new(source_id: Uuid, transaction_id: u64) -> Self {
        Gtid { source_id, transaction_id }
    }
}
