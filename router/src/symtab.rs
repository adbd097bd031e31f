//! The symbol table (spec §4.4.4): a stack of scopes, each naming the
//! tables (and subquery aliases) visible within it. Column resolution walks
//! inward-to-outward; `find_column` is the single query used by planning
//! steps 3-5 (WHERE/HAVING pushdown, SELECT list processing).
//!
//! Table entries live in a flat arena (spec §9 "Cyclic references in
//! plans"): scopes hold `SymbolId`s into it rather than owning `TableEntry`
//! values or linking them through `Rc<RefCell<_>>`.

use crate::plan::{RouteId, SymbolId};
use crate::vschema::{ColumnVindex, TableVSchema};

#[derive(Debug, Clone)]
pub struct TableEntry {
    pub alias: String,
    pub keyspace: String,
    pub vschema: TableVSchema,
    /// the `RouteBuilder` (in a `PlanBuilder`'s route arena) that owns this table
    pub route_id: RouteId,
}

#[derive(Debug, Clone, Default)]
struct Scope {
    tables: Vec<SymbolId>,
}

/// a column resolved against the symbol table: which table (by alias and
/// owning route) it belongs to, and the vindex bound to it if any
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub table_alias: String,
    pub route_id: RouteId,
    pub vindex: Option<ColumnVindex>,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    arena: Vec<TableEntry>,
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable { arena: Vec::new(), scopes: vec![Scope::default()] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// insert `entry` into the arena and bind it in the current scope,
    /// returning the `SymbolId` future lookups can use.
    pub fn add_table(&mut self, entry: TableEntry) -> SymbolId {
        let id = SymbolId(self.arena.len());
        self.arena.push(entry);
        self.scopes.last_mut().expect("symbol table always has a root scope").tables.push(id);
        id
    }

    fn find_in_scope(&self, scope: &Scope, alias: Option<&str>) -> Vec<SymbolId> {
        scope
            .tables
            .iter()
            .copied()
            .filter(|id| alias.map_or(true, |a| a.eq_ignore_ascii_case(&self.arena[id.0].alias)))
            .collect()
    }

    /// resolve a bare table alias to its owning route, for `alias.*`
    /// projections that don't name a specific column.
    pub fn route_for_alias(&self, alias: &str) -> Option<RouteId> {
        for scope in self.scopes.iter().rev() {
            let candidates = self.find_in_scope(scope, Some(alias));
            if candidates.len() == 1 {
                return Some(self.arena[candidates[0].0].route_id);
            }
        }
        None
    }

    /// `FindColumn(col) -> (tableAlias, vindexInfo?)` (spec §4.4.4),
    /// optionally qualified by a table alias (`a.id` vs bare `id`).
    /// Resolution walks scopes from innermost (end of `self.scopes`) to
    /// outermost, matching the "inward-to-outward" rule.
    pub fn find_column(&self, qualifier: Option<&str>, column: &str) -> Option<ResolvedColumn> {
        for scope in self.scopes.iter().rev() {
            let candidates = self.find_in_scope(scope, qualifier);
            if candidates.len() == 1 {
                let t = &self.arena[candidates[0].0];
                return Some(ResolvedColumn {
                    table_alias: t.alias.clone(),
                    route_id: t.route_id,
                    vindex: t.vschema.vindex_for_column(column).cloned(),
                });
            }
            if candidates.len() > 1 && qualifier.is_none() {
                // ambiguous unqualified reference across multiple tables in
                // the same scope; caller must qualify it
                return None;
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vindex::{Hash, Vindex};
    use std::sync::Arc;

    fn table_entry(alias: &str, route_id: usize) -> TableEntry {
        TableEntry {
            alias: alias.to_string(),
            keyspace: "ks".to_string(),
            vschema: TableVSchema {
                table: alias.to_string(),
                column_vindexes: vec![ColumnVindex {
                    column: "id".to_string(),
                    vindex: Vindex::Functional(Arc::new(Hash::new("hash"))),
                    is_primary: true,
                }],
                single_shard_insert: true,
                lookup_scatter_if_absent: false,
            },
            route_id: RouteId(route_id),
        }
    }

    #[test]
    fn resolves_qualified_column_to_owning_route() {
        let mut symtab = SymbolTable::new();
        symtab.add_table(table_entry("a", 0));
        symtab.add_table(table_entry("b", 1));

        let resolved = symtab.find_column(Some("b"), "id").unwrap();
        assert_eq!(resolved.route_id, RouteId(1));
        assert!(resolved.vindex.is_some());
    }

    #[test]
    fn inner_scope_shadows_outer_scope() {
        let mut symtab = SymbolTable::new();
        symtab.add_table(table_entry("a", 0));
        symtab.push_scope();
        symtab.add_table(table_entry("a", 5));

        let resolved = symtab.find_column(Some("a"), "id").unwrap();
        assert_eq!(resolved.route_id, RouteId(5));
    }
}
