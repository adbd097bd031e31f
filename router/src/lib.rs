pub mod dml;
pub mod plan;
pub mod planner;
pub mod resolve;
pub mod symtab;
pub mod vindex;
pub mod vschema;

pub use plan::{BindExpr, ColumnIndexMap, DmlOpcode, Join, Plan, Route, RouteId, SelectOpcode, SymbolId, TargetSelection};
pub use planner::plan_select;
pub use resolve::{resolve_shards, resolve_shards_async, ShardName};
pub use vindex::{Binary, FunctionalVindex, Hash, LookupVindex, UnicodeLooseMd5, Vindex, VindexRegistry, VindexUniqueness};
pub use vschema::{ColumnVindex, KeyspaceVSchema, TableVSchema, VSchema};
