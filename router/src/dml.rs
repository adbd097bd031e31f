//! DML planning (spec §4.4.3): INSERT computes the primary vindex's ksid
//! and fires any secondary lookup-vindex `Create` calls before the main
//! statement; UPDATE/DELETE require the WHERE clause to resolve the primary
//! vindex to a single shard.

use common::err::decode_error::ReError;
use common::err::CResult;
use serde_json::Value as Json;

use crate::plan::{BindExpr, DmlOpcode, TargetSelection};
use crate::vindex::Vindex;
use crate::vschema::{KeyspaceVSchema, TableVSchema};
use topo::KeyspaceId;

#[derive(Debug, Clone)]
pub struct InsertRow {
    /// column name -> value, for every column in the statement
    pub values: Vec<(String, Json)>,
}

#[derive(Debug, Clone)]
pub struct InsertPlan {
    pub opcode: DmlOpcode,
    pub keyspace: String,
    pub table: String,
    /// one ksid per input row, in order
    pub ksids: Vec<KeyspaceId>,
    /// secondary lookup-vindex `Create` calls to issue before the main
    /// INSERT executes, one list per row
    pub lookup_creates: Vec<Vec<LookupSideEffect>>,
}

#[derive(Debug, Clone)]
pub struct LookupSideEffect {
    pub vindex_name: String,
    pub column_values: Vec<Json>,
}

/// Plan an INSERT (spec §4.4.3): for each row, resolve the primary vindex's
/// ksid from the row's values, and stage a `Create` for every secondary
/// lookup vindex. Rejects a multi-shard statement when the table declares
/// `single_shard_insert`.
pub fn plan_insert(ks: &KeyspaceVSchema, table: &TableVSchema, rows: &[InsertRow]) -> CResult<InsertPlan> {
    if !ks.sharded {
        return Ok(InsertPlan {
            opcode: DmlOpcode::InsertUnsharded,
            keyspace: ks.keyspace.clone(),
            table: table.table.clone(),
            ksids: vec![],
            lookup_creates: vec![vec![]; rows.len()],
        });
    }

    let primary = table
        .primary_vindex()
        .ok_or_else(|| ReError::InvalidArgument(format!("table {} has no primary vindex", table.table)))?;

    let mut ksids = Vec::with_capacity(rows.len());
    let mut lookup_creates = Vec::with_capacity(rows.len());

    for row in rows {
        let value = row
            .values
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(&primary.column))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| {
                ReError::InvalidArgument(format!(
                    "insert into {} is missing a value for primary vindex column {}",
                    table.table, primary.column
                ))
            })?;

        let ksid = match &primary.vindex {
            Vindex::Functional(f) => f.map(&[value])?.remove(0),
            Vindex::Lookup(_) => {
                return Err(ReError::InvalidArgument(
                    "the primary vindex must be functional; a lookup vindex cannot seed a new row's ksid"
                        .to_string(),
                ))
            }
        };

        let mut row_side_effects = vec![];
        for cv in &table.column_vindexes {
            if cv.is_primary {
                continue;
            }
            if let Vindex::Lookup(_) = &cv.vindex {
                let value = row
                    .values
                    .iter()
                    .find(|(c, _)| c.eq_ignore_ascii_case(&cv.column))
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| {
                        ReError::InvalidArgument(format!(
                            "insert into {} is missing a value for lookup vindex column {}",
                            table.table, cv.column
                        ))
                    })?;
                row_side_effects
                    .push(LookupSideEffect { vindex_name: cv.vindex.name().to_string(), column_values: vec![value] });
            }
        }

        ksids.push(ksid);
        lookup_creates.push(row_side_effects);
    }

    if table.single_shard_insert {
        let first = ksids.first().cloned();
        if let Some(first) = first {
            if ksids.iter().any(|k| k != &first) {
                return Err(ReError::FailedPrecondition(format!(
                    "insert into {} resolves to more than one shard but the table requires a single-shard insert",
                    table.table
                )));
            }
        }
    }

    Ok(InsertPlan {
        opcode: DmlOpcode::InsertSharded,
        keyspace: ks.keyspace.clone(),
        table: table.table.clone(),
        ksids,
        lookup_creates,
    })
}

#[derive(Debug, Clone)]
pub struct UpdateOrDeletePlan {
    pub opcode: DmlOpcode,
    pub keyspace: String,
    pub table: String,
    pub target: TargetSelection,
}

/// Plan an UPDATE/DELETE (spec §4.4.3): the WHERE clause must resolve the
/// primary vindex to a single shard; scatter DML is rejected by default.
/// `equality_value` is the literal the WHERE clause bound to the primary
/// vindex column, already extracted by the caller via the same WHERE
/// pushdown used for SELECT.
pub fn plan_update_or_delete(
    ks: &KeyspaceVSchema,
    table: &TableVSchema,
    opcode: DmlOpcode,
    equality_value: Option<BindExpr>,
) -> CResult<UpdateOrDeletePlan> {
    if !ks.sharded {
        return Ok(UpdateOrDeletePlan {
            opcode,
            keyspace: ks.keyspace.clone(),
            table: table.table.clone(),
            target: TargetSelection::SingleUnsharded,
        });
    }

    let primary = table
        .primary_vindex()
        .ok_or_else(|| ReError::InvalidArgument(format!("table {} has no primary vindex", table.table)))?;

    let Some(value) = equality_value else {
        return Err(ReError::FailedPrecondition(format!(
            "UPDATE/DELETE on {} must resolve the primary vindex ({}) to a single shard; scatter DML is rejected",
            table.table, primary.column
        )));
    };

    if !primary.vindex.is_unique() {
        return Err(ReError::FailedPrecondition(format!(
            "UPDATE/DELETE on {} requires a unique primary vindex",
            table.table
        )));
    }

    Ok(UpdateOrDeletePlan {
        opcode,
        keyspace: ks.keyspace.clone(),
        table: table.table.clone(),
        target: TargetSelection::VindexMapped { vindex: primary.vindex.clone(), values: vec![value] },
    })
}

/// reject an UPDATE that assigns a column bound to a vindex, unless the
/// caller explicitly opted in (spec §4.4.1: "an update must not alter a
/// column bound to a vindex (unless explicit)")
pub fn check_update_does_not_move_vindex_column(
    table: &TableVSchema,
    assigned_columns: &[String],
    allow_explicit: bool,
) -> CResult<()> {
    if allow_explicit {
        return Ok(());
    }
    for col in assigned_columns {
        if table.vindex_for_column(col).is_some() {
            return Err(ReError::FailedPrecondition(format!(
                "UPDATE on {} assigns column {} which is bound to a vindex",
                table.table, col
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vindex::{Hash, Vindex as VindexEnum, VindexRegistry};
    use crate::vschema::ColumnVindex;
    use std::sync::Arc;

    fn sharded_ks_and_table() -> (KeyspaceVSchema, TableVSchema) {
        let mut registry = VindexRegistry::new();
        registry.register(VindexEnum::Functional(Arc::new(Hash::new("hash"))));
        let ks = KeyspaceVSchema::sharded("ks", registry.clone());
        let table = TableVSchema {
            table: "t".to_string(),
            column_vindexes: vec![ColumnVindex {
                column: "id".to_string(),
                vindex: registry.get("hash").unwrap(),
                is_primary: true,
            }],
            single_shard_insert: true,
            lookup_scatter_if_absent: false,
        };
        (ks, table)
    }

    #[test]
    fn insert_computes_ksid_from_primary_vindex() {
        let (ks, table) = sharded_ks_and_table();
        let rows = vec![InsertRow { values: vec![("id".to_string(), Json::from(5))] }];
        let plan = plan_insert(&ks, &table, &rows).unwrap();
        assert_eq!(plan.ksids.len(), 1);
        assert_eq!(plan.opcode, DmlOpcode::InsertSharded);
    }

    #[test]
    fn insert_missing_primary_vindex_value_is_rejected() {
        let (ks, table) = sharded_ks_and_table();
        let rows = vec![InsertRow { values: vec![("name".to_string(), Json::from("bob"))] }];
        assert!(plan_insert(&ks, &table, &rows).is_err());
    }

    #[test]
    fn scatter_update_is_rejected_without_equality() {
        let (ks, table) = sharded_ks_and_table();
        let result = plan_update_or_delete(&ks, &table, DmlOpcode::UpdateEqual, None);
        assert!(matches!(result, Err(ReError::FailedPrecondition(_))));
    }

    #[test]
    fn update_on_vindex_column_rejected_unless_explicit() {
        let (_, table) = sharded_ks_and_table();
        assert!(check_update_does_not_move_vindex_column(&table, &["id".to_string()], false).is_err());
        assert!(check_update_does_not_move_vindex_column(&table, &["id".to_string()], true).is_ok());
    }
}
