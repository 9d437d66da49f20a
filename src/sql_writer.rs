use crate::{Schema, push_separated};

/// Synthesizes the four statement shapes the mapping layer issues, appending
/// into a caller provided buffer. Engines supply an implementation as their
/// dialect seam; the defaults write plain unquoted identifiers with `?`
/// placeholders, which every supported engine accepts.
///
/// Writers are pure: no I/O, no engine handle, deterministic output for a
/// given schema.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// `INSERT INTO table(a,b,c) VALUES (?,?,?)` with one placeholder per
    /// schema column, in schema order.
    fn write_insert(&self, out: &mut String, schema: &Schema) {
        out.push_str("INSERT INTO ");
        out.push_str(&schema.table);
        out.push('(');
        push_separated(out, &schema.columns, |out, c| out.push_str(c), ",");
        out.push_str(") VALUES (");
        push_separated(out, &schema.columns, |out, _| out.push('?'), ",");
        out.push(')');
    }

    /// `UPDATE table SET a=?,b=?,c=? WHERE pk=?`. Every schema column is
    /// assigned; the primary key placeholder comes last.
    fn write_update(&self, out: &mut String, schema: &Schema) {
        out.push_str("UPDATE ");
        out.push_str(&schema.table);
        out.push_str(" SET ");
        push_separated(
            out,
            &schema.columns,
            |out, c| {
                out.push_str(c);
                out.push_str("=?");
            },
            ",",
        );
        out.push_str(" WHERE ");
        out.push_str(&schema.primary_key);
        out.push_str("=?");
    }

    /// `DELETE FROM table WHERE pk=?`.
    fn write_delete(&self, out: &mut String, schema: &Schema) {
        out.push_str("DELETE FROM ");
        out.push_str(&schema.table);
        out.push_str(" WHERE ");
        out.push_str(&schema.primary_key);
        out.push_str("=?");
    }

    /// `SELECT * FROM table` plus the raw condition fragment when one is
    /// given. The fragment is appended verbatim after a single space; it can
    /// be a `WHERE ...`, an `ORDER BY ...`, both, or empty for the whole
    /// table.
    fn write_select(&self, out: &mut String, schema: &Schema, condition: &str) {
        out.push_str("SELECT * FROM ");
        out.push_str(&schema.table);
        if !condition.is_empty() {
            out.push(' ');
            out.push_str(condition);
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GenericSqlWriter;
impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}
impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
