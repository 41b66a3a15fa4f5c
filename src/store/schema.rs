//! Schema introspection and the text description given to the model.

use super::result::Cell;
use rusqlite::Connection;
use serde::Serialize;

/// Sample cell text is cut to this many characters in the description.
const SAMPLE_CELL_CHARS: usize = 100;

/// Column metadata from `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, empty when the column has none
    pub data_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// A user table in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    /// `CREATE TABLE` statement as stored in `sqlite_master`
    pub create_sql: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Quote an identifier for interpolation into SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Read every user table, sorted by name.
pub(crate) fn load_tables(conn: &Connection) -> rusqlite::Result<Vec<TableInfo>> {
    let mut stmt = conn.prepare(
        "SELECT name, COALESCE(sql, '') FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let entries = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut tables = Vec::with_capacity(entries.len());
    for (name, create_sql) in entries {
        let columns = load_columns(conn, &name)?;
        tables.push(TableInfo {
            name,
            create_sql,
            columns,
        });
    }
    Ok(tables)
}

fn load_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                data_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                not_null: row.get::<_, i64>(3)? != 0,
                primary_key: row.get::<_, i64>(5)? != 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Render the schema description: each table's DDL followed by sample rows.
///
/// ```text
/// CREATE TABLE T(x INT)
///
/// /*
/// 3 rows from T table:
/// x
/// 1
/// 2
/// 3
/// */
/// ```
pub(crate) fn describe(
    conn: &Connection,
    tables: &[TableInfo],
    sample_rows: usize,
) -> rusqlite::Result<String> {
    let mut blocks = Vec::with_capacity(tables.len());

    for table in tables {
        let mut block = table.create_sql.trim().to_string();

        if sample_rows > 0 {
            let rows = sample(conn, table, sample_rows)?;
            block.push_str(&format!(
                "\n\n/*\n{} rows from {} table:\n{}",
                sample_rows,
                table.name,
                table.column_names().join("\t")
            ));
            for row in rows {
                block.push('\n');
                block.push_str(&row.join("\t"));
            }
            block.push_str("\n*/");
        }

        blocks.push(block);
    }

    Ok(blocks.join("\n\n"))
}

fn sample(conn: &Connection, table: &TableInfo, limit: usize) -> rusqlite::Result<Vec<Vec<String>>> {
    let sql = format!("SELECT * FROM {} LIMIT {}", quote_ident(&table.name), limit);
    let mut stmt = conn.prepare(&sql)?;
    let width = stmt.column_count();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(Cell::from_value_ref(row.get_ref(i)?, SAMPLE_CELL_CHARS).to_string());
        }
        out.push(cells);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(script: &str) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(script).unwrap();
        conn
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_load_tables_sorted_with_columns() {
        let conn = conn(
            "CREATE TABLE orders(id INTEGER PRIMARY KEY, user_id INT NOT NULL, total REAL);
             CREATE TABLE Users(id INTEGER PRIMARY KEY, name TEXT);",
        );
        let tables = load_tables(&conn).unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Users", "orders"]);

        let orders = &tables[1];
        assert_eq!(orders.column_names(), vec!["id", "user_id", "total"]);
        assert!(orders.columns[0].primary_key);
        assert!(orders.columns[1].not_null);
        assert_eq!(orders.columns[2].data_type, "REAL");
    }

    #[test]
    fn test_describe_includes_samples() {
        let conn = conn("CREATE TABLE T(x INT); INSERT INTO T VALUES (1),(2),(3),(4);");
        let tables = load_tables(&conn).unwrap();
        let text = describe(&conn, &tables, 3).unwrap();
        assert_eq!(
            text,
            "CREATE TABLE T(x INT)\n\n/*\n3 rows from T table:\nx\n1\n2\n3\n*/"
        );
    }

    #[test]
    fn test_describe_without_samples() {
        let conn = conn("CREATE TABLE a(x); CREATE TABLE b(y);");
        let tables = load_tables(&conn).unwrap();
        let text = describe(&conn, &tables, 0).unwrap();
        assert_eq!(text, "CREATE TABLE a(x)\n\nCREATE TABLE b(y)");
    }
}
