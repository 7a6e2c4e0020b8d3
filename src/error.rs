use std::path::PathBuf;

use thiserror::Error;

/// sqlmint errors
#[derive(Error, Debug)]
pub enum SqlmintError {
    #[error("Failed to open database '{}': {source}", path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Statement failed (code {code:?}) for `{sql}`: {source}")]
    Statement {
        sql: String,
        /// SQLite extended result code, when the failure came from the engine
        code: Option<i32>,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to read column {index} of the current row: {source}")]
    Row {
        index: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Code generation failed for table '{table}': {message}")]
    CodeGen { table: String, message: String },

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SqlmintError {
    /// Wrap a driver error raised while preparing or running `sql`
    pub fn statement(sql: impl Into<String>, source: rusqlite::Error) -> Self {
        let code = match &source {
            rusqlite::Error::SqliteFailure(err, _) => Some(err.extended_code),
            _ => None,
        };

        SqlmintError::Statement {
            sql: sql.into(),
            code,
            source,
        }
    }

    /// SQLite extended result code carried by a statement error
    pub fn code(&self) -> Option<i32> {
        match self {
            SqlmintError::Statement { code, .. } => *code,
            SqlmintError::Connection {
                source: rusqlite::Error::SqliteFailure(err, _),
                ..
            } => Some(err.extended_code),
            _ => None,
        }
    }
}
