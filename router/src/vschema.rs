//! Per-keyspace routing configuration: which tables are sharded, and which
//! column of each table is bound to which vindex (spec §4.4 "VSchema").

use std::collections::HashMap;

use common::err::decode_error::ReError;
use common::err::CResult;

use crate::vindex::{Vindex, VindexRegistry};

#[derive(Debug, Clone)]
pub struct ColumnVindex {
    pub column: String,
    pub vindex: Vindex,
    /// the first vindex listed for a table is its primary vindex (spec
    /// §4.4.3: DML planning resolves shards through the primary vindex)
    pub is_primary: bool,
}

#[derive(Debug, Clone)]
pub struct TableVSchema {
    pub table: String,
    pub column_vindexes: Vec<ColumnVindex>,
    /// reject an INSERT whose rows resolve to more than one shard (spec
    /// §4.4.1 DML opcodes)
    pub single_shard_insert: bool,
    /// `scatter_if_absent` policy for this table's lookup vindexes when a
    /// lookup miss occurs on a write path (spec §9 open question: deferred
    /// to a required operator-set flag rather than a single hardcoded
    /// behavior)
    pub lookup_scatter_if_absent: bool,
}

impl TableVSchema {
    pub fn primary_vindex(&self) -> Option<&ColumnVindex> {
        self.column_vindexes.iter().find(|cv| cv.is_primary)
    }

    pub fn vindex_for_column(&self, column: &str) -> Option<&ColumnVindex> {
        self.column_vindexes.iter().find(|cv| cv.column.eq_ignore_ascii_case(column))
    }
}

#[derive(Debug, Clone)]
pub struct KeyspaceVSchema {
    pub keyspace: String,
    pub sharded: bool,
    pub tables: HashMap<String, TableVSchema>,
    pub vindexes: VindexRegistry,
}

impl KeyspaceVSchema {
    pub fn unsharded(keyspace: impl Into<String>) -> Self {
        KeyspaceVSchema {
            keyspace: keyspace.into(),
            sharded: false,
            tables: HashMap::new(),
            vindexes: VindexRegistry::new(),
        }
    }

    pub fn sharded(keyspace: impl Into<String>, vindexes: VindexRegistry) -> Self {
        KeyspaceVSchema { keyspace: keyspace.into(), sharded: true, tables: HashMap::new(), vindexes }
    }

    pub fn add_table(&mut self, table: TableVSchema) {
        self.tables.insert(table.table.clone(), table);
    }

    pub fn table(&self, name: &str) -> CResult<&TableVSchema> {
        self.tables
            .get(name)
            .ok_or_else(|| ReError::InvalidArgument(format!("table {} not found in vschema", name)))
    }
}

/// The VSchema registry across all keyspaces known to a router/gateway
/// process.
#[derive(Debug, Clone, Default)]
pub struct VSchema {
    keyspaces: HashMap<String, KeyspaceVSchema>,
}

impl VSchema {
    pub fn new() -> Self {
        VSchema::default()
    }

    pub fn add_keyspace(&mut self, ks: KeyspaceVSchema) {
        self.keyspaces.insert(ks.keyspace.clone(), ks);
    }

    pub fn keyspace(&self, name: &str) -> CResult<&KeyspaceVSchema> {
        self.keyspaces
            .get(name)
            .ok_or_else(|| ReError::InvalidArgument(format!("keyspace {} not found in vschema", name)))
    }

    /// locate a table by name across every known keyspace — used when the
    /// query does not qualify the table with a keyspace
    pub fn find_table(&self, table: &str) -> CResult<(&KeyspaceVSchema, &TableVSchema)> {
        for ks in self.keyspaces.values() {
            if let Ok(t) = ks.table(table) {
                return Ok((ks, t));
            }
        }
        Err(ReError::InvalidArgument(format!("table {} not found in any keyspace", table)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vindex::{Hash, Vindex};
    use std::sync::Arc;

    fn sample_vschema() -> VSchema {
        let mut registry = VindexRegistry::new();
        registry.register(Vindex::Functional(Arc::new(Hash::new("hash"))));

        let mut ks = KeyspaceVSchema::sharded("ks", registry.clone());
        ks.add_table(TableVSchema {
            table: "t".to_string(),
            column_vindexes: vec![ColumnVindex {
                column: "id".to_string(),
                vindex: registry.get("hash").unwrap(),
                is_primary: true,
            }],
            single_shard_insert: true,
            lookup_scatter_if_absent: false,
        });

        let mut vschema = VSchema::new();
        vschema.add_keyspace(ks);
        vschema
    }

    #[test]
    fn finds_table_and_its_primary_vindex() {
        let vschema = sample_vschema();
        let (ks, t) = vschema.find_table("t").unwrap();
        assert_eq!(ks.keyspace, "ks");
        assert_eq!(t.primary_vindex().unwrap().column, "id");
    }
}
