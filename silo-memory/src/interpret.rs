use crate::{Expr, Store, Table, compare, convert, evaluate, truthy, value_eq};
use silo::{Context, Error, Result, ResultSet, Row, RowNames, Value};
use sqlparser::{ast as sql_ast, dialect::GenericDialect, parser::Parser};
use std::{cmp::Ordering, collections::HashMap};

/// Parses and runs exactly one SQL statement against the store.
pub(crate) fn run_statement(store: &mut Store, sql: &str, params: &[Value]) -> Result<ResultSet> {
    let mut statements =
        Parser::parse_sql(&GenericDialect {}, sql).with_context(|| format!("Cannot parse `{sql}`"))?;
    if statements.len() != 1 {
        return Err(Error::msg(format!(
            "Expected a single statement, got {} in `{sql}`",
            statements.len()
        )));
    }
    match statements.remove(0) {
        sql_ast::Statement::CreateTable(create) => create_table(store, create),
        sql_ast::Statement::Drop {
            object_type: sql_ast::ObjectType::Table,
            if_exists,
            names,
            ..
        } => drop_table(store, if_exists, &names),
        sql_ast::Statement::Insert(insert) => insert_rows(store, insert, params),
        sql_ast::Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => update_rows(store, &table, &assignments, selection.as_ref(), params),
        sql_ast::Statement::Delete(delete) => delete_rows(store, delete, params),
        sql_ast::Statement::Query(query) => select_rows(store, &query, params),
        statement => Err(Error::msg(format!("Unsupported statement `{statement}`"))),
    }
}

fn create_table(store: &mut Store, create: sql_ast::CreateTable) -> Result<ResultSet> {
    let name = object_name(&create.name);
    if store.tables.contains_key(&name) {
        if create.if_not_exists {
            return Ok(ResultSet::default());
        }
        return Err(Error::msg(format!("Table {name} already exists")));
    }
    let mut columns = Vec::with_capacity(create.columns.len());
    let mut primary_key = None;
    let mut auto_key = false;
    for column in &create.columns {
        let column_name = column.name.value.clone();
        for option in &column.options {
            if let sql_ast::ColumnOption::Unique {
                is_primary: true, ..
            } = option.option
            {
                primary_key = Some(column_name.clone());
                // Engines assign keys themselves only for integer columns.
                auto_key = matches!(
                    column.data_type,
                    sql_ast::DataType::Int(_)
                        | sql_ast::DataType::Integer(_)
                        | sql_ast::DataType::BigInt(_)
                );
            }
        }
        columns.push(column_name);
    }
    store
        .tables
        .insert(name, Table::new(columns, primary_key, auto_key));
    Ok(ResultSet::default())
}

fn drop_table(
    store: &mut Store,
    if_exists: bool,
    names: &[sql_ast::ObjectName],
) -> Result<ResultSet> {
    for name in names {
        let name = object_name(name);
        if store.tables.remove(&name).is_none() && !if_exists {
            return Err(Error::msg(format!("No such table {name}")));
        }
    }
    Ok(ResultSet::default())
}

fn insert_rows(store: &mut Store, insert: sql_ast::Insert, params: &[Value]) -> Result<ResultSet> {
    let table_name = insert.table.to_string();
    let table = store
        .tables
        .get_mut(&table_name)
        .ok_or_else(|| Error::msg(format!("No such table {table_name}")))?;
    let columns: Vec<String> = if insert.columns.is_empty() {
        table.columns.clone()
    } else {
        insert
            .columns
            .iter()
            .map(|column| column.value.clone())
            .collect()
    };
    for column in &columns {
        if !table.columns.contains(column) {
            return Err(Error::msg(format!(
                "Table {table_name} has no column {column}"
            )));
        }
    }
    let Some(sql_ast::SetExpr::Values(values)) = insert.source.as_deref().map(|query| &*query.body)
    else {
        return Err(Error::msg("INSERT without a VALUES list is not supported"));
    };
    let mut placeholders = 0;
    let mut affected = 0;
    let mut last_insert_id = None;
    for exprs in &values.rows {
        if exprs.len() != columns.len() {
            return Err(Error::msg(format!(
                "{} values for {} columns",
                exprs.len(),
                columns.len()
            )));
        }
        let mut row = HashMap::with_capacity(columns.len());
        for (column, expr) in columns.iter().zip(exprs) {
            let expr = convert(expr, &mut placeholders)?;
            row.insert(column.clone(), evaluate(&expr, None, params)?);
        }
        if let Some(key_column) = table.primary_key.clone() {
            let mut key = row.get(&key_column).cloned().unwrap_or(Value::Null);
            if key.is_null() && table.auto_key {
                key = Value::Integer(table.next_key);
                row.insert(key_column.clone(), key.clone());
            }
            if !key.is_null() {
                let duplicate = table.rows.values().any(|existing| {
                    existing
                        .get(&key_column)
                        .is_some_and(|existing| value_eq(existing, &key))
                });
                if duplicate {
                    return Err(Error::msg(format!(
                        "UNIQUE constraint failed: {table_name}.{key_column}"
                    )));
                }
                if let (true, Value::Integer(id)) = (table.auto_key, &key) {
                    // Saturates once the largest key is taken, so the next
                    // automatic key collides instead of wrapping around.
                    table.next_key = table.next_key.max(id.saturating_add(1));
                    last_insert_id = Some(*id);
                }
            }
        }
        let rowid = table.next_rowid;
        table.next_rowid += 1;
        table.rows.insert(rowid, row);
        affected += 1;
    }
    Ok(ResultSet::affected(affected, last_insert_id))
}

fn update_rows(
    store: &mut Store,
    table: &sql_ast::TableWithJoins,
    assignments: &[sql_ast::Assignment],
    selection: Option<&sql_ast::Expr>,
    params: &[Value],
) -> Result<ResultSet> {
    let table_name = table_factor_name(&table.relation)?;
    let table = store
        .tables
        .get_mut(&table_name)
        .ok_or_else(|| Error::msg(format!("No such table {table_name}")))?;
    // Assignments come before the condition in the statement text, so they
    // claim their placeholder indices first.
    let mut placeholders = 0;
    let mut actions = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let column = match &assignment.target {
            sql_ast::AssignmentTarget::ColumnName(name) => object_name(name),
            target => return Err(Error::msg(format!("Unsupported SET target `{target:?}`"))),
        };
        if !table.columns.contains(&column) {
            return Err(Error::msg(format!(
                "Table {table_name} has no column {column}"
            )));
        }
        actions.push((column, convert(&assignment.value, &mut placeholders)?));
    }
    let condition = selection
        .map(|expr| convert(expr, &mut placeholders))
        .transpose()?;
    let mut affected = 0;
    for row in table.rows.values_mut() {
        if !admits(condition.as_ref(), row, params)? {
            continue;
        }
        // Evaluate every assignment against the old row before applying any.
        let mut updates = Vec::with_capacity(actions.len());
        for (column, expr) in &actions {
            updates.push((column.clone(), evaluate(expr, Some(&*row), params)?));
        }
        for (column, value) in updates {
            row.insert(column, value);
        }
        affected += 1;
    }
    Ok(ResultSet::affected(affected, None))
}

fn delete_rows(store: &mut Store, delete: sql_ast::Delete, params: &[Value]) -> Result<ResultSet> {
    let tables = match &delete.from {
        sql_ast::FromTable::WithFromKeyword(tables)
        | sql_ast::FromTable::WithoutKeyword(tables) => tables,
    };
    let [table] = tables.as_slice() else {
        return Err(Error::msg("DELETE expects a single table"));
    };
    let table_name = table_factor_name(&table.relation)?;
    let table = store
        .tables
        .get_mut(&table_name)
        .ok_or_else(|| Error::msg(format!("No such table {table_name}")))?;
    let mut placeholders = 0;
    let condition = delete
        .selection
        .as_ref()
        .map(|expr| convert(expr, &mut placeholders))
        .transpose()?;
    let mut doomed = Vec::new();
    for (rowid, row) in &table.rows {
        if admits(condition.as_ref(), row, params)? {
            doomed.push(*rowid);
        }
    }
    let affected = doomed.len() as u64;
    for rowid in doomed {
        table.rows.remove(&rowid);
    }
    Ok(ResultSet::affected(affected, None))
}

fn select_rows(store: &Store, query: &sql_ast::Query, params: &[Value]) -> Result<ResultSet> {
    let sql_ast::SetExpr::Select(select) = query.body.as_ref() else {
        return Err(Error::msg(format!("Unsupported query `{query}`")));
    };
    let [from] = select.from.as_slice() else {
        return Err(Error::msg("SELECT expects a single table"));
    };
    if !from.joins.is_empty() {
        return Err(Error::msg("Joins are not supported"));
    }
    let table_name = table_factor_name(&from.relation)?;
    let table = store
        .tables
        .get(&table_name)
        .ok_or_else(|| Error::msg(format!("No such table {table_name}")))?;
    let [sql_ast::SelectItem::Wildcard(_)] = select.projection.as_slice() else {
        return Err(Error::msg("Only `SELECT *` projections are supported"));
    };
    let mut placeholders = 0;
    let condition = select
        .selection
        .as_ref()
        .map(|expr| convert(expr, &mut placeholders))
        .transpose()?;
    let mut order = Vec::new();
    if let Some(order_by) = &query.order_by {
        let sql_ast::OrderByKind::Expressions(exprs) = &order_by.kind else {
            return Err(Error::msg("Unsupported ORDER BY form"));
        };
        for item in exprs {
            let descending = item.options.asc.map(|ascending| !ascending).unwrap_or(false);
            order.push((convert(&item.expr, &mut placeholders)?, descending));
        }
    }
    let limit = match &query.limit_clause {
        Some(sql_ast::LimitClause::LimitOffset {
            limit: Some(expr),
            offset: None,
            ..
        }) => {
            let expr = convert(expr, &mut placeholders)?;
            match evaluate(&expr, None, params)? {
                Value::Integer(count) => Some(count.max(0) as usize),
                value => return Err(Error::msg(format!("Cannot use {value:?} as a LIMIT"))),
            }
        }
        Some(sql_ast::LimitClause::LimitOffset {
            limit: None,
            offset: None,
            ..
        }) => None,
        Some(clause) => return Err(Error::msg(format!("Unsupported LIMIT form `{clause:?}`"))),
        None => None,
    };
    let mut selected = Vec::new();
    for row in table.rows.values() {
        if admits(condition.as_ref(), row, params)? {
            selected.push(row);
        }
    }
    if !order.is_empty() {
        let mut keyed = Vec::with_capacity(selected.len());
        for row in selected {
            let mut keys = Vec::with_capacity(order.len());
            for (expr, descending) in &order {
                keys.push((evaluate(expr, Some(row), params)?, *descending));
            }
            keyed.push((keys, row));
        }
        keyed.sort_by(|(left, _), (right, _)| {
            for ((lhs, descending), (rhs, _)) in left.iter().zip(right) {
                let ordering = compare(lhs, rhs);
                let ordering = if *descending {
                    ordering.reverse()
                } else {
                    ordering
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        selected = keyed.into_iter().map(|(_, row)| row).collect();
    }
    if let Some(limit) = limit {
        selected.truncate(limit);
    }
    let labels: RowNames = table.columns.clone().into();
    let rows = selected
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .map(|column| row.get(column).cloned().unwrap_or_default())
                .collect::<Row>()
        })
        .collect();
    Ok(ResultSet {
        labels,
        rows,
        ..Default::default()
    })
}

fn admits(condition: Option<&Expr>, row: &HashMap<String, Value>, params: &[Value]) -> Result<bool> {
    Ok(match condition {
        Some(condition) => truthy(&evaluate(condition, Some(row), params)?),
        None => true,
    })
}

fn object_name(name: &sql_ast::ObjectName) -> String {
    name.0
        .last()
        .map(|part| part.to_string())
        .unwrap_or_default()
}

fn table_factor_name(relation: &sql_ast::TableFactor) -> Result<String> {
    match relation {
        sql_ast::TableFactor::Table { name, .. } => Ok(object_name(name)),
        relation => Err(Error::msg(format!(
            "Unsupported table reference `{relation}`"
        ))),
    }
}
