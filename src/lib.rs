//! # sqlmint
//!
//! Generate typed record models from SQLite schemas
//!
//! This crate provides a CLI tool and library for introspecting SQLite tables,
//! views and queries and generating one Rust model module per table. Generated
//! models plug into [`TypedTable`], which loads rows into typed records and
//! writes them back.

pub mod builder;
pub mod codegen;
pub mod config;
pub mod error;
pub mod introspect;
pub mod schema;
pub mod table;
pub mod types;

pub use error::SqlmintError;
pub use rusqlite::{types::ToSql, Connection};
pub use table::{DbHandle, LoadOptions, Record, RowCursor, TypedTable};

pub mod prelude {
    pub use crate::builder::{BatchReport, ModelBuilder, Target};
    pub use crate::codegen::{
        CodeGenerator, EmissionOptions, HeaderOptions, MiscOptions, RustGenerator, StrOptions,
        TypeMap,
    };
    pub use crate::config::DbConfig;
    pub use crate::error::SqlmintError;
    pub use crate::introspect::{Introspector, SqliteIntrospector, TableFilter};
    pub use crate::schema::{CatalogEntry, ColumnDescriptor, TableKind};
    pub use crate::table::{DbHandle, LoadOptions, Record, RowCursor, TypedTable};
}
