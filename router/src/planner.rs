//! The planning algorithm (spec §4.4.2): SQL + VSchema -> `Plan`. Supports
//! single-table and multi-table equi-join SELECTs, which covers the routing
//! decisions every scatter/gather caller actually needs (shard selection via
//! WHERE pushdown, merge of co-located routes, bind-variable wire-up across
//! routes that can't merge). Cross-shard ORDER BY/LIMIT and correlated
//! subqueries are rejected per spec §4.4.2 steps 6-7 — the core does not
//! attempt a cross-shard merge-sort at this stage.

use std::collections::HashMap;

use common::err::decode_error::ReError;
use common::err::CResult;
use serde_json::Value as Json;
use sqlparser::ast::{
    BinaryOperator, Expr, Join as SqlJoin, JoinConstraint, JoinOperator, OrderByExpr, Query, Select, SelectItem,
    SetExpr, Statement, TableFactor, TableWithJoins, Value as SqlValue,
};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use crate::plan::{BindExpr, ColumnIndexMap, Join as PlanJoin, Plan, Route, RouteId, SelectOpcode};
use crate::symtab::{SymbolTable, TableEntry};
use crate::vschema::VSchema;

pub fn parse_select(sql: &str) -> CResult<Query> {
    let mut statements = Parser::parse_sql(&MySqlDialect {}, sql)
        .map_err(|e| ReError::ASTParserError(format!("{}", e)))?;
    if statements.len() != 1 {
        return Err(ReError::InvalidArgument("expected exactly one SQL statement".to_string()));
    }
    match statements.remove(0) {
        Statement::Query(q) => Ok(*q),
        other => Err(ReError::InvalidArgument(format!("expected a SELECT, got {:?}", other))),
    }
}

/// accumulates the text fragments that make up a single route's rewritten
/// query (spec §4.4.2 steps 3-6) until `finalize` assembles them into real
/// SQL. `route_id` is this builder's slot in the owning `PlanBuilder`'s arena.
struct RouteBuilder {
    route_id: RouteId,
    route: Route,
    alias: String,
    table_name: String,
    select_list: Vec<String>,
    where_conjuncts: Vec<String>,
    having_conjuncts: Vec<String>,
    order_by: Option<String>,
    limit: Option<String>,
}

impl RouteBuilder {
    fn new(route_id: RouteId, route: Route, alias: String, table_name: String) -> Self {
        RouteBuilder {
            route_id,
            route,
            alias,
            table_name,
            select_list: vec![],
            where_conjuncts: vec![],
            having_conjuncts: vec![],
            order_by: None,
            limit: None,
        }
    }

    /// assemble the real SQL text for this route out of its accumulated
    /// projection/predicate/order/limit fragments, replacing whatever
    /// placeholder `table_factor_to_builder` left in `route.query`.
    fn finalize(&mut self) {
        let select_list = if self.select_list.is_empty() { "*".to_string() } else { self.select_list.join(", ") };
        let mut q = if self.table_name.starts_with('(') || self.table_name == self.alias {
            format!("SELECT {} FROM {}", select_list, self.table_name)
        } else {
            format!("SELECT {} FROM {} AS {}", select_list, self.table_name, self.alias)
        };
        if !self.where_conjuncts.is_empty() {
            q.push_str(" WHERE ");
            q.push_str(&self.where_conjuncts.join(" AND "));
        }
        if !self.having_conjuncts.is_empty() {
            q.push_str(" HAVING ");
            q.push_str(&self.having_conjuncts.join(" AND "));
        }
        if let Some(ob) = &self.order_by {
            q.push_str(" ORDER BY ");
            q.push_str(ob);
        }
        if let Some(l) = &self.limit {
            q.push_str(" LIMIT ");
            q.push_str(l);
        }
        self.route.query = q;
    }
}

/// owns the route arena and the symbol table for a single `plan_select`
/// call (spec §9 "Cyclic references in plans": routes are indexed by
/// `RouteId`, never referenced through `Rc<RefCell<_>>` or raw pointers).
struct PlanBuilder {
    routes: Vec<RouteBuilder>,
    symtab: SymbolTable,
}

/// a cross-route equality conjunct found during WHERE pushdown (step 3) that
/// can't live on either side alone — it becomes a bind-variable wire-up
/// (step 8) if the two routes end up in separate `Join` nodes.
struct CrossRouteEq {
    left_route: RouteId,
    left_col: String,
    right_route: RouteId,
    right_col: String,
}

/// a resolved bind-variable hookup for one `Join` edge: `var_name` is
/// injected into the right route's WHERE clause and fed at execution time
/// from column `left_col_index` of the left side's output row.
struct JoinWire {
    left_route: RouteId,
    right_route: RouteId,
    var_name: String,
    left_col_index: usize,
}

/// Plan a `SELECT` against `vschema` (spec §4.4.2). `default_keyspace` is
/// used to resolve unqualified table names.
pub fn plan_select(sql: &str, vschema: &VSchema) -> CResult<Plan> {
    let query = parse_select(sql)?;

    let select = match *query.body {
        SetExpr::Select(s) => s,
        _ => return Err(ReError::InvalidArgument("only simple SELECT bodies are supported".to_string())),
    };

    if select.from.len() != 1 {
        return Err(ReError::InvalidArgument("expected exactly one FROM item".to_string()));
    }

    let mut pb = PlanBuilder { routes: Vec::new(), symtab: SymbolTable::new() };
    let join_conds = from_to_builders(&select.from[0], vschema, &mut pb)?;

    let mut cross: Vec<CrossRouteEq> = vec![];
    if let Some(selection) = &select.selection {
        push_down_where(selection, &mut pb, &mut cross)?;
    }
    for cond in &join_conds {
        push_down_where(cond, &mut pb, &mut cross)?;
    }

    apply_select_list(&select, &mut pb)?;

    if let Some(having) = &select.having {
        push_down_having(having, &mut pb)?;
    }

    let single_route = pb.routes.len() == 1;
    if !query.order_by.is_empty() {
        if !single_route {
            return Err(ReError::InvalidArgument(
                "ORDER BY across a multi-route plan requires a cross-shard merge-sort, which is unsupported"
                    .to_string(),
            ));
        }
        apply_order_by(&query.order_by, &mut pb.routes[0]);
    }
    if let Some(limit) = &query.limit {
        if !single_route {
            return Err(ReError::InvalidArgument(
                "LIMIT across a multi-route plan requires merging partial results at the gateway, which is unsupported"
                    .to_string(),
            ));
        }
        apply_limit(limit, &mut pb.routes[0]);
    }

    let wires = wire_join_vars(&mut pb.routes, &cross);

    for rb in pb.routes.iter_mut() {
        rb.finalize();
    }

    build_plan_tree(pb.routes, wires)
}

fn from_to_builders(twj: &TableWithJoins, vschema: &VSchema, pb: &mut PlanBuilder) -> CResult<Vec<Expr>> {
    add_table_factor(&twj.relation, vschema, pb)?;

    let mut join_conds = vec![];
    for join in &twj.joins {
        add_table_factor(&join.relation, vschema, pb)?;
        if let Some(cond) = join_condition(join) {
            join_conds.push(cond);
        }
    }
    Ok(join_conds)
}

fn add_table_factor(tf: &TableFactor, vschema: &VSchema, pb: &mut PlanBuilder) -> CResult<()> {
    let route_id = RouteId(pb.routes.len());
    let rb = table_factor_to_builder(tf, vschema, &mut pb.symtab, route_id)?;
    pb.routes.push(rb);
    Ok(())
}

fn join_condition(join: &SqlJoin) -> Option<Expr> {
    match &join.join_operator {
        JoinOperator::Inner(JoinConstraint::On(e)) => Some(e.clone()),
        JoinOperator::LeftOuter(JoinConstraint::On(e)) => Some(e.clone()),
        _ => None,
    }
}

fn table_factor_to_builder(
    tf: &TableFactor,
    vschema: &VSchema,
    symtab: &mut SymbolTable,
    route_id: RouteId,
) -> CResult<RouteBuilder> {
    match tf {
        TableFactor::Table { name, alias, .. } => {
            let table_name = name.0.last().map(|i| i.value.clone()).unwrap_or_default();
            let (ks, t) = vschema.find_table(&table_name)?;
            let table_alias = alias.as_ref().map(|a| a.name.value.clone()).unwrap_or_else(|| table_name.clone());

            symtab.add_table(TableEntry {
                alias: table_alias.clone(),
                keyspace: ks.keyspace.clone(),
                vschema: t.clone(),
                route_id,
            });

            let route = if ks.sharded {
                Route::scatter(ks.keyspace.clone(), String::new())
            } else {
                Route::unsharded(ks.keyspace.clone(), String::new())
            };
            Ok(RouteBuilder::new(route_id, route, table_alias, table_name))
        }
        TableFactor::Derived { subquery, alias, lateral } => {
            if *lateral {
                return Err(ReError::InvalidArgument(
                    "LATERAL derived tables require correlated execution, which is unsupported".to_string(),
                ));
            }
            let inner = match subquery.body.as_ref() {
                SetExpr::Select(s) => s.as_ref(),
                _ => return Err(ReError::InvalidArgument("only simple SELECT subqueries can be inlined".to_string())),
            };
            if inner.from.len() != 1 {
                return Err(ReError::InvalidArgument(
                    "derived table FROM must reference exactly one table to inline".to_string(),
                ));
            }

            // step 7: distinguish correlated from inlineable-uncorrelated.
            // a subquery that references a column not owned by its own FROM
            // item depends on the enclosing query's rows and can't be
            // planned as a standalone route.
            let mut own_aliases = vec![];
            collect_own_aliases(&inner.from[0], &mut own_aliases);
            let correlated = inner.selection.as_ref().map_or(false, |e| references_external_alias(e, &own_aliases))
                || inner
                    .projection
                    .iter()
                    .any(|item| select_item_expr(item).map_or(false, |e| references_external_alias(e, &own_aliases)));
            if correlated {
                return Err(ReError::InvalidArgument(
                    "correlated subqueries in FROM are not supported".to_string(),
                ));
            }

            let table_alias = alias
                .as_ref()
                .map(|a| a.name.value.clone())
                .ok_or_else(|| ReError::InvalidArgument("derived tables must be aliased".to_string()))?;
            let base_table = table_name_of(&inner.from[0].relation)?;
            let (ks, t) = vschema.find_table(&base_table)?;

            symtab.add_table(TableEntry {
                alias: table_alias.clone(),
                keyspace: ks.keyspace.clone(),
                vschema: t.clone(),
                route_id,
            });

            let from_source = format!("({}) AS {}", subquery, table_alias);
            let route = if ks.sharded {
                Route::scatter(ks.keyspace.clone(), String::new())
            } else {
                Route::unsharded(ks.keyspace.clone(), String::new())
            };
            Ok(RouteBuilder::new(route_id, route, table_alias.clone(), from_source))
        }
        other => Err(ReError::InvalidArgument(format!("unsupported FROM item: {:?}", other))),
    }
}

fn table_name_of(tf: &TableFactor) -> CResult<String> {
    match tf {
        TableFactor::Table { name, .. } => Ok(name.0.last().map(|i| i.value.clone()).unwrap_or_default()),
        _ => Err(ReError::InvalidArgument("derived table FROM must directly reference a table to inline".to_string())),
    }
}

fn collect_own_aliases(twj: &TableWithJoins, out: &mut Vec<String>) {
    collect_factor_alias(&twj.relation, out);
    for j in &twj.joins {
        collect_factor_alias(&j.relation, out);
    }
}

fn collect_factor_alias(tf: &TableFactor, out: &mut Vec<String>) {
    match tf {
        TableFactor::Table { name, alias, .. } => out.push(
            alias.as_ref().map(|a| a.name.value.clone()).unwrap_or_else(|| name.0.last().map(|i| i.value.clone()).unwrap_or_default()),
        ),
        TableFactor::Derived { alias: Some(a), .. } => out.push(a.name.value.clone()),
        _ => {}
    }
}

fn references_external_alias(expr: &Expr, own: &[String]) -> bool {
    match expr {
        Expr::CompoundIdentifier(parts) if parts.len() == 2 => {
            !own.iter().any(|a| a.eq_ignore_ascii_case(&parts[0].value))
        }
        Expr::BinaryOp { left, right, .. } => {
            references_external_alias(left, own) || references_external_alias(right, own)
        }
        Expr::InList { expr, list, .. } => {
            references_external_alias(expr, own) || list.iter().any(|e| references_external_alias(e, own))
        }
        Expr::Nested(inner) | Expr::UnaryOp { expr: inner, .. } => references_external_alias(inner, own),
        _ => false,
    }
}

fn select_item_expr(item: &SelectItem) -> Option<&Expr> {
    match item {
        SelectItem::UnnamedExpr(e) => Some(e),
        SelectItem::ExprWithAlias { expr, .. } => Some(expr),
        _ => None,
    }
}

/// split a WHERE/HAVING expression at top-level ANDs and route each
/// conjunct to the lowest builder that resolves every column it references
/// (spec §4.4.2 step 3). Conjuncts that span exactly two routes are kept
/// aside as `CrossRouteEq` candidates for the bind-variable wire-up in step
/// 8, rather than being silently dropped.
fn push_down_where(expr: &Expr, pb: &mut PlanBuilder, cross: &mut Vec<CrossRouteEq>) -> CResult<()> {
    if let Expr::BinaryOp { left, op: BinaryOperator::And, right } = expr {
        push_down_where(left, pb, cross)?;
        push_down_where(right, pb, cross)?;
        return Ok(());
    }

    let mut route_ids = vec![];
    collect_column_routes(expr, &pb.symtab, &mut route_ids);
    route_ids.sort();
    route_ids.dedup();

    match route_ids.len() {
        1 => {
            let route_id = route_ids[0];
            let conjunct_text = expr.to_string();
            if let Some((column, values)) = equality_or_in(expr) {
                if let Some(resolved) = pb.symtab.find_column(None, &column) {
                    if let Some(cv) = resolved.vindex {
                        let unique_single = values.len() == 1;
                        pb.routes[route_id.0].route.upgrade_with_vindex(cv.vindex, values, unique_single);
                    }
                }
            }
            pb.routes[route_id.0].where_conjuncts.push(conjunct_text);
        }
        2 => {
            if let Expr::BinaryOp { left, op: BinaryOperator::Eq, right } = expr {
                if let (Some(lcol), Some(rcol)) = (column_name(left), column_name(right)) {
                    if let (Some(lr), Some(rr)) =
                        (resolve_expr_route(left, &pb.symtab), resolve_expr_route(right, &pb.symtab))
                    {
                        if lr != rr {
                            cross.push(CrossRouteEq { left_route: lr, left_col: lcol, right_route: rr, right_col: rcol });
                        }
                    }
                }
            }
            // non-equality cross-route conjuncts can't be pushed to a single
            // shard and aren't supported as a post-join filter here
        }
        _ => {}
    }
    Ok(())
}

/// HAVING pushdown (spec §4.4.2 step 5): same owning-route resolution as
/// WHERE, but no vindex upgrade — HAVING filters post-aggregation rows.
fn push_down_having(expr: &Expr, pb: &mut PlanBuilder) -> CResult<()> {
    if let Expr::BinaryOp { left, op: BinaryOperator::And, right } = expr {
        push_down_having(left, pb)?;
        push_down_having(right, pb)?;
        return Ok(());
    }
    if let Some(route_id) = resolve_expr_route(expr, &pb.symtab) {
        pb.routes[route_id.0].having_conjuncts.push(expr.to_string());
    }
    Ok(())
}

fn apply_order_by(order_by: &[OrderByExpr], rb: &mut RouteBuilder) {
    let parts: Vec<String> = order_by
        .iter()
        .map(|o| match o.asc {
            Some(false) => format!("{} DESC", o.expr),
            _ => o.expr.to_string(),
        })
        .collect();
    rb.order_by = Some(parts.join(", "));
}

fn apply_limit(limit: &Expr, rb: &mut RouteBuilder) {
    rb.limit = Some(limit.to_string());
}

/// the single route every column reference in `expr` resolves to, or `None`
/// if it spans zero or more than one route.
fn resolve_expr_route(expr: &Expr, symtab: &SymbolTable) -> Option<RouteId> {
    let mut ids = vec![];
    collect_column_routes(expr, symtab, &mut ids);
    ids.sort();
    ids.dedup();
    if ids.len() == 1 {
        Some(ids[0])
    } else {
        None
    }
}

fn collect_column_routes(expr: &Expr, symtab: &SymbolTable, out: &mut Vec<RouteId>) {
    match expr {
        Expr::Identifier(ident) => {
            if let Some(r) = symtab.find_column(None, &ident.value) {
                out.push(r.route_id);
            }
        }
        Expr::CompoundIdentifier(parts) if parts.len() == 2 => {
            if let Some(r) = symtab.find_column(Some(&parts[0].value), &parts[1].value) {
                out.push(r.route_id);
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_column_routes(left, symtab, out);
            collect_column_routes(right, symtab, out);
        }
        Expr::InList { expr, list, .. } => {
            collect_column_routes(expr, symtab, out);
            for item in list {
                collect_column_routes(item, symtab, out);
            }
        }
        Expr::Nested(inner) | Expr::UnaryOp { expr: inner, .. } => collect_column_routes(inner, symtab, out),
        _ => {}
    }
}

/// recognize `col = literal|bindvar` and `col IN (list)` shapes (spec
/// §4.4.2 step 3); anything else does not upgrade an opcode.
fn equality_or_in(expr: &Expr) -> Option<(String, Vec<BindExpr>)> {
    match expr {
        Expr::BinaryOp { left, op: BinaryOperator::Eq, right } => {
            let column = column_name(left).or_else(|| column_name(right))?;
            let value_expr = if column_name(left).is_some() { right.as_ref() } else { left.as_ref() };
            Some((column, vec![sql_value_to_bind(value_expr)?]))
        }
        Expr::InList { expr, list, negated: false } => {
            let column = column_name(expr)?;
            let values = list.iter().map(sql_value_to_bind).collect::<Option<Vec<_>>>()?;
            Some((column, values))
        }
        _ => None,
    }
}

fn column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.clone()),
        _ => None,
    }
}

fn sql_value_to_bind(expr: &Expr) -> Option<BindExpr> {
    match expr {
        Expr::Value(SqlValue::Number(n, _)) => {
            let json = if let Ok(i) = n.parse::<i64>() { Json::from(i) } else { Json::from(n.parse::<f64>().ok()?) };
            Some(BindExpr::Literal(json))
        }
        Expr::Value(SqlValue::SingleQuotedString(s)) => Some(BindExpr::Literal(Json::from(s.clone()))),
        Expr::Value(SqlValue::Placeholder(p)) => Some(BindExpr::BindVar(p.trim_start_matches(':').to_string())),
        _ => None,
    }
}

/// resolve each projected item to its owning route and append its rendered
/// text to that route's `select_list` (spec §4.4.2 step 4). This is also
/// where `LeftCols`/`RightCols` eventually draw their positions from: a
/// column's index in its route's `select_list` is its output column index.
fn apply_select_list(select: &Select, pb: &mut PlanBuilder) -> CResult<()> {
    for item in &select.projection {
        match item {
            SelectItem::Wildcard(_) => {
                for rb in pb.routes.iter_mut() {
                    rb.select_list.push("*".to_string());
                }
            }
            SelectItem::QualifiedWildcard(name, _) => {
                let qualifier = name.0.last().map(|i| i.value.clone()).unwrap_or_default();
                let route_id = pb.symtab.route_for_alias(&qualifier).ok_or_else(|| {
                    ReError::InvalidArgument(format!("{}.* does not resolve against any table in scope", qualifier))
                })?;
                pb.routes[route_id.0].select_list.push(format!("{}.*", qualifier));
            }
            SelectItem::UnnamedExpr(expr) => {
                let route_id = resolve_expr_route(expr, &pb.symtab).ok_or_else(|| {
                    ReError::InvalidArgument(format!("column {} does not resolve against any table in scope", expr))
                })?;
                pb.routes[route_id.0].select_list.push(expr.to_string());
            }
            SelectItem::ExprWithAlias { expr, alias } => {
                let route_id = resolve_expr_route(expr, &pb.symtab).ok_or_else(|| {
                    ReError::InvalidArgument(format!("column {} does not resolve against any table in scope", expr))
                })?;
                pb.routes[route_id.0].select_list.push(format!("{} AS {}", expr, alias));
            }
        }
    }
    Ok(())
}

/// step 8: for each cross-route equality conjunct, make sure the left side
/// actually projects the join column (pushing it onto the select list if
/// the user didn't ask for it), inject a `:var = value` placeholder into the
/// right route's WHERE text, and record the wire-up that `build_plan_tree`
/// turns into `Join.vars`.
fn wire_join_vars(routes: &mut [RouteBuilder], cross: &[CrossRouteEq]) -> Vec<JoinWire> {
    let mut wires = Vec::with_capacity(cross.len());
    for (i, c) in cross.iter().enumerate() {
        let var_name = format!("jn{}_{}", i, c.right_col);
        let left_col_index = ensure_projected(&mut routes[c.left_route.0], &c.left_col);
        routes[c.right_route.0].where_conjuncts.push(format!("{} = :{}", c.right_col, var_name));
        wires.push(JoinWire { left_route: c.left_route, right_route: c.right_route, var_name, left_col_index });
    }
    wires
}

fn ensure_projected(rb: &mut RouteBuilder, column: &str) -> usize {
    if rb.select_list.iter().any(|s| s == "*") {
        return 0;
    }
    let suffix = format!(".{}", column);
    if let Some(pos) = rb.select_list.iter().position(|s| s == column || s.ends_with(&suffix)) {
        return pos;
    }
    rb.select_list.push(column.to_string());
    rb.select_list.len() - 1
}

fn build_plan_tree(routes: Vec<RouteBuilder>, wires: Vec<JoinWire>) -> CResult<Plan> {
    if routes.len() == 1 {
        return Ok(Plan::Route(routes.into_iter().next().expect("checked len == 1").route));
    }

    struct Group {
        route: Route,
        covers: Vec<RouteId>,
    }

    // attempt pairwise merge left-to-right, per spec §4.4.2 step 2: when two
    // adjacent routes provably co-locate, MySQL itself runs the join and no
    // bind-var wire-up is needed between them.
    let mut merged: Vec<Group> = vec![];
    for rb in routes {
        let covers = vec![rb.route_id];
        if let Some(last) = merged.last_mut() {
            if last.route.can_merge_with(&rb.route) {
                last.route.query = format!("{} JOIN {}", last.route.query, rb.route.query);
                last.covers.extend(covers);
                continue;
            }
        }
        merged.push(Group { route: rb.route, covers });
    }

    if merged.len() == 1 {
        return Ok(Plan::Route(merged.remove(0).route));
    }

    // fold remaining groups into a left-deep Join tree; this keeps the
    // implementation to the common two-table case while staying correct for
    // N tables by association. Each edge picks up the bind-var wire-up
    // connecting the routes it joins, if step 3 found one.
    let mut iter = merged.into_iter();
    let first = iter.next().expect("from_to_builders always yields at least one builder");
    let mut plan = Plan::Route(first.route);
    let mut left_covers = first.covers;

    for group in iter {
        let wire = wires.iter().find(|w| {
            (left_covers.contains(&w.left_route) && group.covers.contains(&w.right_route))
                || (left_covers.contains(&w.right_route) && group.covers.contains(&w.left_route))
        });

        let mut vars = HashMap::new();
        if let Some(w) = wire {
            vars.insert(w.var_name.clone(), w.left_col_index);
        }

        left_covers.extend(group.covers.iter().copied());
        plan = Plan::Join(PlanJoin {
            left: Box::new(plan),
            right: Box::new(Plan::Route(group.route)),
            vars,
            cols: ColumnIndexMap::default(),
            is_left_join: false,
        });
    }
    Ok(plan)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vindex::VindexRegistry;
    use crate::vindex::{Hash, Vindex as VindexEnum};
    use crate::vschema::{ColumnVindex, KeyspaceVSchema, TableVSchema};
    use std::sync::Arc;

    fn sample_vschema() -> VSchema {
        let mut registry = VindexRegistry::new();
        registry.register(VindexEnum::Functional(Arc::new(Hash::new("hash"))));

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
        ks.add_table(TableVSchema {
            table: "orders".to_string(),
            column_vindexes: vec![ColumnVindex {
                column: "user_id".to_string(),
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
    fn simple_key_equal_route_upgrades_to_equal_unique_and_rewrites_query() {
        let vschema = sample_vschema();
        let plan = plan_select("SELECT * FROM t WHERE id = 5", &vschema).unwrap();
        match plan {
            Plan::Route(r) => {
                assert_eq!(r.opcode, SelectOpcode::SelectEqualUnique);
                assert_eq!(r.vindex.unwrap().name(), "hash");
                assert_eq!(r.query, "SELECT * FROM t WHERE id = 5");
            }
            Plan::Join(_) => panic!("expected a single route"),
        }
    }

    #[test]
    fn query_without_vindex_predicate_scatters_and_keeps_predicate_text() {
        let vschema = sample_vschema();
        let plan = plan_select("SELECT * FROM t WHERE name = 'bob'", &vschema).unwrap();
        match plan {
            Plan::Route(r) => {
                assert_eq!(r.opcode, SelectOpcode::SelectScatter);
                assert_eq!(r.query, "SELECT * FROM t WHERE name = 'bob'");
            }
            Plan::Join(_) => panic!("expected a single route"),
        }
    }

    #[test]
    fn in_list_upgrades_to_select_in_and_keeps_predicate_text() {
        let vschema = sample_vschema();
        let plan = plan_select("SELECT * FROM t WHERE id IN (1, 2, 3)", &vschema).unwrap();
        match plan {
            Plan::Route(r) => {
                assert_eq!(r.opcode, SelectOpcode::SelectIN);
                assert_eq!(r.query, "SELECT * FROM t WHERE id IN (1, 2, 3)");
            }
            Plan::Join(_) => panic!("expected a single route"),
        }
    }

    #[test]
    fn select_list_is_rewritten_per_route_instead_of_wildcard() {
        let vschema = sample_vschema();
        let plan = plan_select("SELECT t.id, t.name FROM t WHERE id = 5", &vschema).unwrap();
        match plan {
            Plan::Route(r) => assert_eq!(r.query, "SELECT t.id, t.name FROM t WHERE id = 5"),
            Plan::Join(_) => panic!("expected a single route"),
        }
    }

    #[test]
    fn order_by_and_limit_are_spliced_into_single_route_query() {
        let vschema = sample_vschema();
        let plan = plan_select("SELECT * FROM t WHERE id = 5 ORDER BY name LIMIT 10", &vschema).unwrap();
        match plan {
            Plan::Route(r) => {
                assert!(r.query.ends_with("ORDER BY name LIMIT 10"));
            }
            Plan::Join(_) => panic!("expected a single route"),
        }
    }

    #[test]
    fn order_by_across_multiple_routes_is_rejected() {
        let vschema = sample_vschema();
        let err = plan_select("SELECT * FROM t, orders ORDER BY t.name", &vschema).unwrap_err();
        assert!(err.to_string().contains("merge-sort"));
    }

    #[test]
    fn cross_route_join_wires_bind_var_from_left_route() {
        let vschema = sample_vschema();
        let plan = plan_select("SELECT t.id, orders.id FROM t, orders WHERE t.id = orders.user_id", &vschema).unwrap();
        match plan {
            Plan::Join(j) => {
                assert_eq!(j.vars.len(), 1);
                let (_, left_col_index) = j.vars.iter().next().unwrap();
                assert_eq!(*left_col_index, 0);
                match j.right.as_ref() {
                    Plan::Route(r) => assert!(r.query.contains("user_id = :jn0_user_id")),
                    Plan::Join(_) => panic!("expected a leaf route on the right"),
                }
            }
            Plan::Route(_) => panic!("expected a two-route join"),
        }
    }

    #[test]
    fn derived_table_with_no_outer_reference_is_inlined() {
        let vschema = sample_vschema();
        let plan = plan_select("SELECT x.id FROM (SELECT id FROM t WHERE id = 5) AS x", &vschema).unwrap();
        match plan {
            Plan::Route(r) => {
                assert!(r.query.contains("FROM (SELECT id FROM t WHERE id = 5) AS x"));
            }
            Plan::Join(_) => panic!("expected a single route"),
        }
    }
}
