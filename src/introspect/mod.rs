//! Database introspection
//!
//! This module discovers the columns of a table, view or query and lists the
//! tables and views recorded in the schema catalog.

use crate::codegen::TypeMap;
use crate::prelude::{CatalogEntry, ColumnDescriptor, SqlmintError};

mod sqlite;

pub use sqlite::{SqliteIntrospector, SqliteMaster};

/// Filters to apply when listing the catalog
#[derive(Debug, Default, Clone)]
pub struct TableFilter {
    /// Only include these tables (if Some)
    pub include: Option<Vec<String>>,
    /// Exclude these tables
    pub exclude: Option<Vec<String>>,
}

impl TableFilter {
    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    /// Render as a fragment for the catalog `WHERE`, e.g. `AND tbl_name IN ('a')`
    pub fn to_sql_fragment(&self) -> String {
        let mut fragment = String::new();

        if let Some(include) = &self.include {
            fragment.push_str(&format!("AND tbl_name IN ({})", quote_list(include)));
        }

        if let Some(exclude) = &self.exclude {
            if !fragment.is_empty() {
                fragment.push(' ');
            }
            fragment.push_str(&format!("AND tbl_name NOT IN ({})", quote_list(exclude)));
        }

        fragment
    }
}

/// Quote a string as an SQL literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| quote_literal(v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Trait for database introspection implementations
pub trait Introspector {
    /// Column metadata of a select statement, without fetching rows
    fn describe_columns(
        &self,
        select_sql: &str,
        type_map: &TypeMap,
    ) -> Result<Vec<ColumnDescriptor>, SqlmintError>;

    /// Tables and views in catalog order, narrowed by an optional SQL fragment
    fn list_tables_and_views(&self, filter_sql: &str) -> Result<Vec<CatalogEntry>, SqlmintError>;
}

/// Quote a string as an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Probe statement used when no custom query is given
pub fn probe_sql(table_name: &str) -> String {
    format!("SELECT * FROM {}", quote_ident(table_name))
}
