use rusqlite::{Connection, ToSql};
use tracing::{debug, error, info, trace, warn};

use super::Introspector;
use crate::codegen::TypeMap;
use crate::prelude::SqlmintError;
use crate::schema::{CatalogEntry, ColumnDescriptor, TableKind};
use crate::table::{Record, RowCursor, TypedTable};

/// Row of the `sqlite_master` catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqliteMaster {
    pub r#type: String,
    pub name: String,
    pub tbl_name: String,
    pub rootpage: i64,
    pub sql: String,
}

impl Record for SqliteMaster {
    type StrType = &'static str;

    fn table_name() -> &'static str {
        "sqlite_master"
    }

    fn column_names() -> &'static str {
        "type, name, tbl_name, rootpage, sql"
    }

    fn column_count() -> usize {
        5
    }

    fn populate(cursor: &mut RowCursor<'_, '_>) -> Result<Self, SqlmintError> {
        Ok(Self {
            r#type: cursor.read()?,
            name: cursor.read()?,
            tbl_name: cursor.read()?,
            rootpage: cursor.read()?,
            sql: cursor.read()?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.r#type as &dyn ToSql,
            &self.name as &dyn ToSql,
            &self.tbl_name as &dyn ToSql,
            &self.rootpage as &dyn ToSql,
            &self.sql as &dyn ToSql,
        ]
    }
}

/// SQLite introspector
pub struct SqliteIntrospector<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteIntrospector<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl Introspector for SqliteIntrospector<'_> {
    fn describe_columns(
        &self,
        select_sql: &str,
        type_map: &TypeMap,
    ) -> Result<Vec<ColumnDescriptor>, SqlmintError> {
        trace!(sql = ?select_sql, "Probing columns");

        // Preparing is enough to read result-set metadata; no row is stepped.
        let stmt = self.conn.prepare(select_sql).map_err(|e| {
            error!(sql = ?select_sql, error = ?e, "Failed to prepare probe query");
            SqlmintError::statement(select_sql, e)
        })?;

        let mut columns = Vec::with_capacity(stmt.column_count());
        for column in stmt.columns() {
            let name = column.name();
            if name.contains(':') {
                trace!(column = ?name, "Skipping marker column");
                continue;
            }

            let declared_type = column.decl_type().map(str::to_string);
            let mapped_type = type_map.map_type(declared_type.as_deref()).to_string();

            trace!(
                column = ?name,
                declared_type = ?declared_type,
                mapped_type = ?mapped_type,
                "Parsed column"
            );

            columns.push(ColumnDescriptor {
                name: name.to_string(),
                declared_type,
                mapped_type,
            });
        }

        debug!(sql = ?select_sql, columns = columns.len(), "Columns described");
        Ok(columns)
    }

    fn list_tables_and_views(&self, filter_sql: &str) -> Result<Vec<CatalogEntry>, SqlmintError> {
        let where_clause = format!("WHERE (type = 'table' OR type = 'view') {}", filter_sql);
        trace!(where_clause = ?where_clause, "Querying catalog");

        let catalog = TypedTable::<SqliteMaster>::load(self.conn, where_clause.trim_end())?;

        let mut entries = Vec::with_capacity(catalog.len());
        for row in &catalog {
            match TableKind::parse(&row.r#type) {
                Some(kind) => entries.push(CatalogEntry {
                    kind,
                    name: row.name.clone(),
                    tbl_name: row.tbl_name.clone(),
                }),
                None => warn!(kind = ?row.r#type, name = ?row.name, "Unexpected catalog entry"),
            }
        }

        info!(count = entries.len(), "Found tables and views");
        Ok(entries)
    }
}
