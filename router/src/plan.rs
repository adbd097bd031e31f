//! Plan primitives (spec §4.4.1, §9 "dynamic opcode dispatch"): a `Plan` is
//! a tree whose leaves are `Route`s and whose internal nodes are `Join`s.
//! Both are tagged sums carrying only the fields their variant needs —
//! dispatched with an exhaustive match, not a trait-object hierarchy.

use std::collections::HashMap;

use serde_json::Value as Json;

use crate::vindex::Vindex;

/// index into a `PlanBuilder`'s route arena (spec §9 "Cyclic references in
/// plans": an integer id, never a raw pointer or `Rc<RefCell<_>>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub usize);

/// index into a `SymbolTable`'s table-entry arena, same rationale as
/// `RouteId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub enum SelectOpcode {
    /// the single shard of an unsharded keyspace
    SelectUnsharded,
    /// every shard of the keyspace
    SelectScatter,
    /// vindex mapped over a value list; union of shards
    SelectIN,
    /// non-unique vindex -> set of ksids -> set of shards
    SelectEqual,
    /// vindex maps value -> single ksid -> single shard
    SelectEqualUnique,
    /// a designated sequence-table shard, used for auto-increment
    SelectNext,
}

impl SelectOpcode {
    /// `SelectScatter -> SelectIN -> SelectEqual -> SelectEqualUnique`;
    /// upgrades never regress (spec §4.4.2 step 3). `SelectUnsharded` and
    /// `SelectNext` are terminal and never upgrade.
    pub fn upgrade(self, candidate: SelectOpcode) -> SelectOpcode {
        use SelectOpcode::*;
        let rank = |op: SelectOpcode| match op {
            SelectScatter => 0u8,
            SelectIN => 1,
            SelectEqual => 2,
            SelectEqualUnique => 3,
            SelectUnsharded | SelectNext => u8::MAX,
        };
        if matches!(self, SelectUnsharded | SelectNext) {
            return self;
        }
        if rank(candidate) > rank(self) {
            candidate
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DmlOpcode {
    InsertUnsharded,
    InsertSharded,
    UpdateUnsharded,
    UpdateEqual,
    DeleteUnsharded,
    DeleteEqual,
}

/// how a Route's shard set is computed at execution time
#[derive(Debug, Clone)]
pub enum TargetSelection {
    /// the keyspace's single unsharded shard
    SingleUnsharded,
    /// every shard of the keyspace
    AllShards,
    /// `vindex.Map(values)` resolves to one or more shards
    VindexMapped { vindex: Vindex, values: Vec<BindExpr> },
    /// a specific named shard, used for `SelectNext` sequence routing
    NamedShard(String),
}

/// a value fed to a vindex or spliced into rewritten SQL: either a literal
/// known at plan time or a bind variable resolved per-execution
#[derive(Debug, Clone)]
pub enum BindExpr {
    Literal(Json),
    BindVar(String),
}

#[derive(Debug, Clone)]
pub struct Route {
    pub opcode: SelectOpcode,
    pub keyspace: String,
    /// the rewritten SQL template, with `:name` placeholders for bind vars
    pub query: String,
    pub bind_vars: HashMap<String, BindExpr>,
    pub target: TargetSelection,
    pub vindex: Option<Vindex>,
    pub values: Vec<BindExpr>,
}

impl Route {
    pub fn unsharded(keyspace: impl Into<String>, query: impl Into<String>) -> Self {
        Route {
            opcode: SelectOpcode::SelectUnsharded,
            keyspace: keyspace.into(),
            query: query.into(),
            bind_vars: HashMap::new(),
            target: TargetSelection::SingleUnsharded,
            vindex: None,
            values: vec![],
        }
    }

    pub fn scatter(keyspace: impl Into<String>, query: impl Into<String>) -> Self {
        Route {
            opcode: SelectOpcode::SelectScatter,
            keyspace: keyspace.into(),
            query: query.into(),
            bind_vars: HashMap::new(),
            target: TargetSelection::AllShards,
            vindex: None,
            values: vec![],
        }
    }

    /// apply a `col = literal` / `col IN (...)` conjunct that is bound to
    /// `vindex`, upgrading the opcode per the lattice in
    /// `SelectOpcode::upgrade` and never regressing a more selective
    /// existing opcode (spec §4.4.2 step 3).
    pub fn upgrade_with_vindex(&mut self, vindex: Vindex, values: Vec<BindExpr>, unique_single_value: bool) {
        let candidate = if unique_single_value && vindex.is_unique() {
            SelectOpcode::SelectEqualUnique
        } else if values.len() > 1 {
            SelectOpcode::SelectIN
        } else if vindex.is_unique() {
            SelectOpcode::SelectEqualUnique
        } else {
            SelectOpcode::SelectEqual
        };
        self.opcode = self.opcode.upgrade(candidate);
        if self.opcode == candidate {
            self.target = TargetSelection::VindexMapped { vindex: vindex.clone(), values: values.clone() };
            self.vindex = Some(vindex);
            self.values = values;
        }
    }

    /// two routes may merge per spec §4.4.2 step 2: same keyspace and
    /// (both unsharded) or (both `SelectEqualUnique` on the same vindex with
    /// identical values — the provably-equal join predicate case).
    pub fn can_merge_with(&self, other: &Route) -> bool {
        if self.keyspace != other.keyspace {
            return false;
        }
        let both_unsharded =
            self.opcode == SelectOpcode::SelectUnsharded && other.opcode == SelectOpcode::SelectUnsharded;
        let both_equal_unique_same_vindex = self.opcode == SelectOpcode::SelectEqualUnique
            && other.opcode == SelectOpcode::SelectEqualUnique
            && match (&self.vindex, &other.vindex) {
                (Some(a), Some(b)) => a.name() == b.name() && bind_exprs_equal(&self.values, &other.values),
                _ => false,
            };
        both_unsharded || both_equal_unique_same_vindex
    }
}

fn bind_exprs_equal(a: &[BindExpr], b: &[BindExpr]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b.iter()).all(|(x, y)| match (x, y) {
            (BindExpr::Literal(l1), BindExpr::Literal(l2)) => l1 == l2,
            (BindExpr::BindVar(n1), BindExpr::BindVar(n2)) => n1 == n2,
            _ => false,
        })
}

/// positional indices into a child route's output row that populate the
/// combined row produced by a `Join` (spec §4.4.2 step 4: `LeftCols`/
/// `RightCols`).
#[derive(Debug, Clone, Default)]
pub struct ColumnIndexMap {
    pub left_cols: Vec<usize>,
    pub right_cols: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Join {
    pub left: Box<Plan>,
    pub right: Box<Plan>,
    /// true for a join whose right side depends on values from the left
    /// side's execution (spec §4.4.2 step 8 wire-up); the bind var name is
    /// the key the left route's output column is injected under
    pub vars: HashMap<String, usize>,
    pub cols: ColumnIndexMap,
    pub is_left_join: bool,
}

#[derive(Debug, Clone)]
pub enum Plan {
    Route(Route),
    Join(Join),
}

impl Plan {
    /// every keyspace a leaf route of this plan targets, in left-to-right order
    pub fn keyspaces(&self) -> Vec<String> {
        match self {
            Plan::Route(r) => vec![r.keyspace.clone()],
            Plan::Join(j) => {
                let mut ks = j.left.keyspaces();
                ks.extend(j.right.keyspaces());
                ks
            }
        }
    }
}
