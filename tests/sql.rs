#[cfg(test)]
mod tests {
    use silo::{GenericSqlWriter, Schema, SqlWriter};

    const WRITER: GenericSqlWriter = GenericSqlWriter::new();

    #[test]
    fn insert_lists_every_column_in_schema_order() {
        let schema = Schema::new("notes", ["id", "title", "done"]);
        let mut out = String::new();
        WRITER.write_insert(&mut out, &schema);
        assert_eq!(out, "INSERT INTO notes(id,title,done) VALUES (?,?,?)");
    }

    #[test]
    fn insert_with_a_single_column() {
        let schema = Schema::new("tags", ["label"]);
        let mut out = String::new();
        WRITER.write_insert(&mut out, &schema);
        assert_eq!(out, "INSERT INTO tags(label) VALUES (?)");
    }

    #[test]
    fn update_assigns_every_column_and_keys_last() {
        let schema = Schema::new("notes", ["id", "title", "done"]);
        let mut out = String::new();
        WRITER.write_update(&mut out, &schema);
        assert_eq!(out, "UPDATE notes SET id=?,title=?,done=? WHERE id=?");
    }

    #[test]
    fn update_with_a_custom_primary_key() {
        let schema = Schema::new("books", ["isbn", "title"]).primary_key("isbn");
        let mut out = String::new();
        WRITER.write_update(&mut out, &schema);
        assert_eq!(out, "UPDATE books SET isbn=?,title=? WHERE isbn=?");
    }

    #[test]
    fn delete_targets_the_primary_key() {
        let schema = Schema::new("notes", ["id", "title", "done"]);
        {
            let mut out = String::new();
            WRITER.write_delete(&mut out, &schema);
            assert_eq!(out, "DELETE FROM notes WHERE id=?");
        }
        {
            let schema = schema.clone().primary_key("rowid");
            let mut out = String::new();
            WRITER.write_delete(&mut out, &schema);
            assert_eq!(out, "DELETE FROM notes WHERE rowid=?");
        }
    }

    #[test]
    fn the_writer_works_behind_the_dialect_seam() {
        let writer = WRITER;
        let writer: &dyn SqlWriter = writer.as_dyn();
        let schema = Schema::new("notes", ["id", "title", "done"]);
        let mut out = String::new();
        writer.write_insert(&mut out, &schema);
        assert_eq!(out, "INSERT INTO notes(id,title,done) VALUES (?,?,?)");
        out.clear();
        writer.write_delete(&mut out, &schema);
        assert_eq!(out, "DELETE FROM notes WHERE id=?");
    }

    #[test]
    fn select_appends_the_condition_verbatim() {
        let schema = Schema::new("notes", ["id", "title", "done"]);
        {
            let mut out = String::new();
            WRITER.write_select(&mut out, &schema, "");
            assert_eq!(out, "SELECT * FROM notes");
        }
        {
            let mut out = String::new();
            WRITER.write_select(&mut out, &schema, "WHERE done=? ORDER BY id DESC");
            assert_eq!(out, "SELECT * FROM notes WHERE done=? ORDER BY id DESC");
        }
    }
}
