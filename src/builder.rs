//! Model builder
//!
//! Ties introspection and code generation together for one table, a filtered
//! part of the catalog, or the whole schema.

use std::path::PathBuf;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::codegen::{CodeGenerator, EmissionOptions, RustGenerator};
use crate::config::DbConfig;
use crate::error::SqlmintError;
use crate::introspect::{probe_sql, Introspector, SqliteIntrospector};
use crate::table::DbHandle;

/// What a builder generates right after construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Target {
    /// Nothing; models are created by explicit calls
    #[default]
    None,
    /// A single table or view
    Table(String),
    /// Every table and view, narrowed by a catalog `WHERE` fragment
    All { where_clause: String },
}

/// A table whose model could not be produced during a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFailure {
    pub table: String,
    pub reason: String,
}

/// Outcome of a generation pass
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Model files written, in catalog order
    pub written: Vec<PathBuf>,
    pub failed: Vec<TableFailure>,
    /// Module index, when one was requested and written
    pub index: Option<PathBuf>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Generates model files from a live database
pub struct ModelBuilder<'db, G: CodeGenerator = RustGenerator> {
    db: DbHandle<'db>,
    options: EmissionOptions,
    generator: G,
    created: Vec<PathBuf>,
}

impl ModelBuilder<'static> {
    /// Open a private connection described by `config`
    pub fn open(config: &DbConfig, options: EmissionOptions) -> Result<Self, SqlmintError> {
        let conn = config.open()?;
        Ok(Self::from_handle(DbHandle::Owned(conn), options))
    }
}

impl<'db> ModelBuilder<'db> {
    /// Use a connection owned by the caller; it is never closed by the builder
    pub fn with_connection(conn: &'db Connection, options: EmissionOptions) -> Self {
        Self::from_handle(DbHandle::Borrowed(conn), options)
    }

    fn from_handle(db: DbHandle<'db>, options: EmissionOptions) -> Self {
        Self {
            db,
            options,
            generator: RustGenerator::new(),
            created: Vec::new(),
        }
    }
}

impl<'db, G: CodeGenerator> ModelBuilder<'db, G> {
    /// Swap in another generator
    pub fn with_generator<H: CodeGenerator>(self, generator: H) -> ModelBuilder<'db, H> {
        ModelBuilder {
            db: self.db,
            options: self.options,
            generator,
            created: self.created,
        }
    }

    pub fn options(&self) -> &EmissionOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: EmissionOptions) {
        self.options = options;
    }

    pub fn connection(&self) -> &Connection {
        &self.db
    }

    /// Every model file written by this builder so far
    pub fn headers_created(&self) -> &[PathBuf] {
        &self.created
    }

    /// Generate whatever `target` names
    pub fn run(&mut self, target: Target) -> Result<BatchReport, SqlmintError> {
        match target {
            Target::None => Ok(BatchReport::default()),
            Target::Table(table) => {
                let mut report = BatchReport::default();
                if self.create_header(&table, None, None)? {
                    report.written.push(self.options.header.file_path(&table));
                } else {
                    report.failed.push(TableFailure {
                        table,
                        reason: "model file could not be written".to_string(),
                    });
                }
                Ok(report)
            }
            Target::All { where_clause } => self.create_all_headers(&where_clause),
        }
    }

    /// Generate the model for one table or view
    ///
    /// `options` overrides the builder's options for this call only, and
    /// `custom_query` replaces the `SELECT * FROM <table>` probe. Returns
    /// `Ok(false)` when the file could not be written; introspection errors
    /// are returned as `Err`.
    pub fn create_header(
        &mut self,
        table_name: &str,
        options: Option<&EmissionOptions>,
        custom_query: Option<&str>,
    ) -> Result<bool, SqlmintError> {
        let options = options.unwrap_or(&self.options);
        let sql = match custom_query {
            Some(query) if !query.trim().is_empty() => query.to_string(),
            _ => probe_sql(table_name),
        };

        debug!(table = ?table_name, sql = ?sql, "Introspecting table");
        let columns = SqliteIntrospector::new(&self.db).describe_columns(&sql, &options.type_map())?;

        if !self.generator.emit(table_name, &columns, options) {
            return Ok(false);
        }

        let path = options.header.file_path(table_name);
        info!(table = ?table_name, path = ?path, columns = columns.len(), "Model created");
        self.created.push(path);
        Ok(true)
    }

    /// Generate a model for every table and view using the builder's options
    pub fn create_all_headers(&mut self, where_clause: &str) -> Result<BatchReport, SqlmintError> {
        let options = self.options.clone();
        self.create_all_headers_with(&options, where_clause)
    }

    /// Generate a model for every table and view using `options`
    ///
    /// Each model name gets the catalog kind (`table_` or `view_`) appended
    /// to the prefix. A table that fails is recorded and the batch goes on.
    pub fn create_all_headers_with(
        &mut self,
        options: &EmissionOptions,
        where_clause: &str,
    ) -> Result<BatchReport, SqlmintError> {
        let entries = SqliteIntrospector::new(&self.db).list_tables_and_views(where_clause)?;
        info!(count = entries.len(), "Generating models for catalog");

        let mut report = BatchReport::default();
        let mut model_names = Vec::with_capacity(entries.len());

        for entry in entries {
            let derived = EmissionOptions {
                header: options.header.with_extra_prefix(&format!("{}_", entry.kind)),
                ..options.clone()
            };

            match self.create_header(&entry.tbl_name, Some(&derived), None) {
                Ok(true) => {
                    report.written.push(derived.header.file_path(&entry.tbl_name));
                    model_names.push(derived.header.model_name(&entry.tbl_name));
                }
                Ok(false) => report.failed.push(TableFailure {
                    table: entry.tbl_name,
                    reason: "model file could not be written".to_string(),
                }),
                Err(e) => {
                    warn!(table = ?entry.tbl_name, error = ?e, "Skipping table");
                    report.failed.push(TableFailure {
                        table: entry.tbl_name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if options.header.module_index && !model_names.is_empty() {
            match self.generator.emit_index(&model_names, &options.header) {
                Ok(path) => report.index = Some(path),
                Err(e) => warn!(error = ?e, "Failed to write module index"),
            }
        }

        info!(
            written = report.written.len(),
            failed = report.failed.len(),
            "Model generation complete"
        );
        Ok(report)
    }

    /// Release the builder, closing the connection only if it owns it
    pub fn close(self) -> Result<(), SqlmintError> {
        self.db.close()
    }
}
