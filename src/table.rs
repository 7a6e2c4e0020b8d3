//! Typed table container
//!
//! [`TypedTable`] runs a `SELECT` built from a [`Record`] type's table
//! contract and keeps one record per returned row, in result order. The same
//! record type drives write-back statements.

use std::ops::{Deref, Index};
use std::path::Path;

use rusqlite::{params_from_iter, types::FromSql, Connection, Row, ToSql};
use tracing::{debug, error, info, trace};

use crate::config::DbConfig;
use crate::error::SqlmintError;

/// Table contract implemented by generated and hand-written models
pub trait Record: Sized {
    /// String representation returned by the static accessors
    type StrType: AsRef<str>;

    fn table_name() -> Self::StrType;

    /// Comma separated column list, in field order
    fn column_names() -> Self::StrType;

    fn column_count() -> usize;

    /// Build a record from the current row, reading one value per field
    fn populate(cursor: &mut RowCursor<'_, '_>) -> Result<Self, SqlmintError>;

    /// Field values in column order, bound by write-back statements
    fn values(&self) -> Vec<&dyn ToSql>;
}

/// Positional reader over a single result row
pub struct RowCursor<'r, 's> {
    row: &'r Row<'s>,
    index: usize,
}

impl<'r, 's> RowCursor<'r, 's> {
    pub fn new(row: &'r Row<'s>) -> Self {
        Self { row, index: 0 }
    }

    /// Read the next column; NULL yields `T::default()`
    pub fn read<T: FromSql + Default>(&mut self) -> Result<T, SqlmintError> {
        let index = self.index;
        let value: Option<T> = self
            .row
            .get(index)
            .map_err(|source| SqlmintError::Row { index, source })?;
        self.index += 1;
        Ok(value.unwrap_or_default())
    }

    /// Index of the next column to be read
    pub fn position(&self) -> usize {
        self.index
    }
}

/// Connection used by a container or builder
///
/// A borrowed connection belongs to the caller and outlives every user; an
/// owned one is closed when its holder is dropped.
#[derive(Debug)]
pub enum DbHandle<'db> {
    Borrowed(&'db Connection),
    Owned(Connection),
}

impl DbHandle<'_> {
    pub fn is_owned(&self) -> bool {
        matches!(self, DbHandle::Owned(_))
    }

    /// Close an owned connection, reporting the engine's error if any
    pub fn close(self) -> Result<(), SqlmintError> {
        match self {
            DbHandle::Borrowed(_) => Ok(()),
            DbHandle::Owned(conn) => {
                let path = conn.path().map(Path::new).unwrap_or(Path::new("")).to_path_buf();
                conn.close()
                    .map_err(|(_, source)| SqlmintError::Connection { path, source })
            }
        }
    }
}

impl Deref for DbHandle<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self {
            DbHandle::Borrowed(conn) => conn,
            DbHandle::Owned(conn) => conn,
        }
    }
}

impl<'db> From<&'db Connection> for DbHandle<'db> {
    fn from(conn: &'db Connection) -> Self {
        DbHandle::Borrowed(conn)
    }
}

impl From<Connection> for DbHandle<'static> {
    fn from(conn: Connection) -> Self {
        DbHandle::Owned(conn)
    }
}

/// Statements run while loading a [`TypedTable`]
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Appended after `FROM <table>`, e.g. `WHERE id > 3 ORDER BY id`
    pub where_clause: String,
    /// Statement batch executed before anything else
    pub pre_execute: Option<String>,
    /// Statement executed after `pre_execute` and before the select
    pub insert: Option<String>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_where(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = where_clause.into();
        self
    }

    pub fn with_pre_execute(mut self, sql: impl Into<String>) -> Self {
        self.pre_execute = Some(sql.into());
        self
    }

    pub fn with_insert(mut self, sql: impl Into<String>) -> Self {
        self.insert = Some(sql.into());
        self
    }
}

/// Rows of one table, each read into a `T`
#[derive(Debug)]
pub struct TypedTable<'db, T: Record> {
    rows: Vec<T>,
    db: DbHandle<'db>,
    where_clause: String,
}

impl<'db, T: Record> TypedTable<'db, T> {
    /// Load every row matching `where_clause` from a shared connection
    pub fn load(conn: &'db Connection, where_clause: &str) -> Result<Self, SqlmintError> {
        Self::load_with(conn, LoadOptions::new().with_where(where_clause))
    }

    /// Load from a shared connection with the full set of load options
    pub fn load_with(conn: &'db Connection, options: LoadOptions) -> Result<Self, SqlmintError> {
        Self::load_from(DbHandle::Borrowed(conn), options)
    }

    /// Wrap already materialized rows; no query is run
    pub fn from_rows(conn: &'db Connection, rows: &[T]) -> Self
    where
        T: Clone,
    {
        Self {
            rows: rows.to_vec(),
            db: DbHandle::Borrowed(conn),
            where_clause: String::new(),
        }
    }

    fn load_from(db: DbHandle<'db>, options: LoadOptions) -> Result<Self, SqlmintError> {
        let mut table = Self {
            rows: Vec::new(),
            db,
            where_clause: options.where_clause,
        };

        if let Some(sql) = options.pre_execute.as_deref().filter(|s| !s.is_empty()) {
            debug!(sql = ?sql, "Running pre-execute statements");
            table
                .db
                .execute_batch(sql)
                .map_err(|e| SqlmintError::statement(sql, e))?;
        }

        if let Some(sql) = options.insert.as_deref().filter(|s| !s.is_empty()) {
            table.execute(sql)?;
        }

        let sql = select_sql::<T>(&table.where_clause);
        table.populate(&sql)?;
        Ok(table)
    }

    fn populate(&mut self, sql: &str) -> Result<(), SqlmintError> {
        debug!(sql = ?sql, "Populating table");

        let mut stmt = self.db.prepare(sql).map_err(|e| {
            error!(sql = ?sql, error = ?e, "Failed to prepare select");
            SqlmintError::statement(sql, e)
        })?;
        let mut rows = stmt.query([]).map_err(|e| SqlmintError::statement(sql, e))?;

        while let Some(row) = rows.next().map_err(|e| SqlmintError::statement(sql, e))? {
            let mut cursor = RowCursor::new(row);
            self.rows.push(T::populate(&mut cursor)?);
        }

        trace!(table = T::table_name().as_ref(), rows = self.rows.len(), "Rows loaded");
        Ok(())
    }

    /// Rows in the order the query returned them
    pub fn get_all(&self) -> &[T] {
        &self.rows
    }

    pub fn as_slice(&self) -> &[T] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Where clause the container was loaded with
    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    /// Connection used for write-back
    pub fn connection(&self) -> &Connection {
        &self.db
    }

    /// Append in memory only
    pub fn push_back(&mut self, record: T) {
        self.rows.push(record);
    }

    /// Append in memory only
    pub fn append(&mut self, records: impl IntoIterator<Item = T>) {
        self.rows.extend(records);
    }

    /// Run an arbitrary statement on the container's connection
    pub fn execute(&self, sql: &str) -> Result<usize, SqlmintError> {
        trace!(sql = ?sql, "Executing statement");
        self.db.execute(sql, []).map_err(|e| {
            error!(sql = ?sql, error = ?e, "Statement failed");
            SqlmintError::statement(sql, e)
        })
    }

    /// Insert `record` into the database, then keep it in memory
    pub fn insert(&mut self, record: T) -> Result<(), SqlmintError> {
        self.write("INSERT", &record)?;
        self.rows.push(record);
        Ok(())
    }

    /// Insert each record into the database without keeping it in memory
    pub fn insert_all(&self, records: &[T]) -> Result<(), SqlmintError> {
        for record in records {
            self.write("INSERT", record)?;
        }
        Ok(())
    }

    /// Insert-or-replace `record`, relying on the table's own conflict keys
    pub fn update_db(&self, record: &T) -> Result<(), SqlmintError> {
        self.write("INSERT OR REPLACE", record)
    }

    /// Delete every row of the table
    ///
    /// The where clause used to load the container is not applied; see
    /// [`TypedTable::delete_matching`] for the scoped form.
    pub fn delete_all(&self) -> Result<usize, SqlmintError> {
        let sql = format!("DELETE FROM {}", T::table_name().as_ref());
        let deleted = self.execute(&sql)?;
        info!(table = T::table_name().as_ref(), deleted, "Deleted all rows");
        Ok(deleted)
    }

    /// Delete the rows selected by the where clause the container was loaded with
    pub fn delete_matching(&self) -> Result<usize, SqlmintError> {
        let sql = format!("DELETE FROM {} {}", T::table_name().as_ref(), self.where_clause)
            .trim_end()
            .to_string();
        let deleted = self.execute(&sql)?;
        info!(table = T::table_name().as_ref(), deleted, "Deleted matching rows");
        Ok(deleted)
    }

    fn write(&self, verb: &str, record: &T) -> Result<(), SqlmintError> {
        let sql = write_sql::<T>(verb);
        trace!(sql = ?sql, "Writing record");
        self.db
            .execute(&sql, params_from_iter(record.values()))
            .map_err(|e| {
                error!(sql = ?sql, error = ?e, "Write-back failed");
                SqlmintError::statement(sql, e)
            })?;
        Ok(())
    }

    /// Release the container, closing its connection when it owns one
    pub fn close(self) -> Result<Vec<T>, SqlmintError> {
        self.db.close()?;
        Ok(self.rows)
    }
}

impl<T: Record> TypedTable<'static, T> {
    /// Open a private connection to `path` and load from it
    pub fn open(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self, SqlmintError> {
        let conn = DbConfig::new(path.as_ref()).open()?;
        Self::load_from(DbHandle::Owned(conn), options)
    }
}

impl<T: Record> Index<usize> for TypedTable<'_, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.rows[index]
    }
}

impl<'a, T: Record> IntoIterator for &'a TypedTable<'_, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// `SELECT <columns> FROM <table> <where>`
pub fn select_sql<T: Record>(where_clause: &str) -> String {
    format!(
        "SELECT {} FROM {} {}",
        T::column_names().as_ref(),
        T::table_name().as_ref(),
        where_clause
    )
    .trim_end()
    .to_string()
}

/// `<verb> INTO <table> (<columns>) VALUES (?1, ..., ?n)`
pub fn write_sql<T: Record>(verb: &str) -> String {
    let placeholders: Vec<String> = (1..=T::column_count()).map(|i| format!("?{}", i)).collect();
    format!(
        "{} INTO {} ({}) VALUES ({})",
        verb,
        T::table_name().as_ref(),
        T::column_names().as_ref(),
        placeholders.join(", ")
    )
}
