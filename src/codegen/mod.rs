//! Code generation
//!
//! This module provides the options that shape generated model files, the
//! SQL type policy, and the generators that render and write the models.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::prelude::{ColumnDescriptor, SqlmintError};

pub mod rust;
pub mod typemap;

pub use rust::RustGenerator;
pub use typemap::TypeMap;

/// String representation used by generated models
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrOptions {
    /// Type behind the generated `StrType` alias
    pub str_type: String,
    /// Text placed before a string literal
    pub str_pre: String,
    /// Text placed after a string literal
    pub str_post: String,
    /// `use` lines required by `str_type`, one per line
    pub include: String,
}

impl StrOptions {
    /// `String`, literals wrapped in `String::from(...)`
    pub fn string() -> Self {
        Self {
            str_type: "String".to_string(),
            str_pre: "String::from(".to_string(),
            str_post: ")".to_string(),
            include: String::new(),
        }
    }

    /// `Box<str>`, literals wrapped in `Box::from(...)`
    pub fn boxed() -> Self {
        Self {
            str_type: "Box<str>".to_string(),
            str_pre: "Box::from(".to_string(),
            str_post: ")".to_string(),
            include: String::new(),
        }
    }

    /// `Arc<str>`, literals wrapped in `Arc::from(...)`
    pub fn shared() -> Self {
        Self {
            str_type: "Arc<str>".to_string(),
            str_pre: "Arc::from(".to_string(),
            str_post: ")".to_string(),
            include: "use std::sync::Arc;".to_string(),
        }
    }

    /// Wrap `text` as a string literal of the configured type
    pub fn literal(&self, text: &str) -> String {
        format!("{}{:?}{}", self.str_pre, text, self.str_post)
    }
}

impl Default for StrOptions {
    fn default() -> Self {
        Self::string()
    }
}

/// Miscellaneous switches for generated models
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiscOptions {
    /// Placed between fields by the generated `Display` impl
    pub delimiter: String,
    /// Make fields `pub` instead of private with accessors
    pub is_public_fields: bool,
    pub exclude_getters: bool,
    pub exclude_setters: bool,
    pub exclude_display: bool,
    pub exclude_comments: bool,
    /// Leave out the `Record` impl so the model is plain data
    pub exclude_table_interface: bool,
    /// Collapse SQL types to `i64`, `f64` and the string types
    pub basic_types_only: bool,
    /// Trip a debug assertion when a declared type matches no rule
    pub flag_unmapped_types: bool,
    /// Path of this crate as seen from the generated code
    pub runtime_path: String,
}

impl MiscOptions {
    /// Full model: private fields, accessors, `Display`, comments and `Record`
    pub fn max() -> Self {
        Self {
            delimiter: ",".to_string(),
            is_public_fields: false,
            exclude_getters: false,
            exclude_setters: false,
            exclude_display: false,
            exclude_comments: false,
            exclude_table_interface: false,
            basic_types_only: false,
            flag_unmapped_types: true,
            runtime_path: "sqlmint".to_string(),
        }
    }

    /// Bare `Record` model with public fields
    pub fn min() -> Self {
        Self {
            is_public_fields: true,
            exclude_getters: true,
            exclude_setters: true,
            exclude_display: true,
            exclude_comments: true,
            ..Self::max()
        }
    }

    /// Public fields only, not usable with `TypedTable`
    pub fn var() -> Self {
        Self {
            exclude_table_interface: true,
            ..Self::min()
        }
    }

    /// Getters are forced on when fields are private
    pub fn emit_getters(&self) -> bool {
        !self.exclude_getters || !self.is_public_fields
    }

    pub fn emit_setters(&self) -> bool {
        !self.exclude_setters
    }
}

impl Default for MiscOptions {
    fn default() -> Self {
        Self::max()
    }
}

/// Naming and destination of generated files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOptions {
    pub dest_dir: PathBuf,
    pub prefix: String,
    pub suffix: String,
    /// File extension without the dot
    pub extension: String,
    /// Create `dest_dir` when it does not exist
    pub create_dir: bool,
    /// Append to existing files instead of truncating them
    pub append: bool,
    /// Write a `mod.rs` listing the models of a batch
    pub module_index: bool,
}

impl HeaderOptions {
    /// Model name for a table: `prefix + table + suffix`
    pub fn model_name(&self, table_name: &str) -> String {
        format!("{}{}{}", self.prefix, table_name, self.suffix)
    }

    /// Destination file for a table's model
    pub fn file_path(&self, table_name: &str) -> PathBuf {
        self.dest_dir
            .join(format!("{}.{}", self.model_name(table_name), self.extension))
    }

    /// Same options with `extra` appended to the prefix
    pub fn with_extra_prefix(&self, extra: &str) -> Self {
        Self {
            prefix: format!("{}{}", self.prefix, extra),
            ..self.clone()
        }
    }
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            dest_dir: PathBuf::from("SQL"),
            prefix: "sql_".to_string(),
            suffix: String::new(),
            extension: "rs".to_string(),
            create_dir: true,
            append: false,
            module_index: false,
        }
    }
}

/// Everything that shapes a generated model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmissionOptions {
    pub strings: StrOptions,
    pub misc: MiscOptions,
    pub header: HeaderOptions,
}

impl EmissionOptions {
    pub fn new(strings: StrOptions, misc: MiscOptions, header: HeaderOptions) -> Self {
        Self {
            strings,
            misc,
            header,
        }
    }

    pub fn with_strings(mut self, strings: StrOptions) -> Self {
        self.strings = strings;
        self
    }

    pub fn with_misc(mut self, misc: MiscOptions) -> Self {
        self.misc = misc;
        self
    }

    pub fn with_header(mut self, header: HeaderOptions) -> Self {
        self.header = header;
        self
    }

    pub fn with_dest_dir(mut self, dest_dir: impl Into<PathBuf>) -> Self {
        self.header.dest_dir = dest_dir.into();
        self
    }

    /// Type policy matching these options
    pub fn type_map(&self) -> TypeMap {
        TypeMap::new(self.misc.basic_types_only).with_flag_unmapped(self.misc.flag_unmapped_types)
    }
}

/// Trait for language-specific model generators
pub trait CodeGenerator {
    /// Render the model source for one table
    fn render_model(
        &self,
        table_name: &str,
        columns: &[ColumnDescriptor],
        options: &EmissionOptions,
    ) -> Result<String, SqlmintError>;

    /// Render the index listing the given model names
    ///
    /// `extension` is the extension the model files were written with.
    fn render_index(&self, model_names: &[String], extension: &str) -> Result<String, SqlmintError>;

    /// Render and write one model file
    ///
    /// Returns `false` when the file could not be produced. Nothing is
    /// written if rendering fails.
    fn emit(
        &self,
        table_name: &str,
        columns: &[ColumnDescriptor],
        options: &EmissionOptions,
    ) -> bool {
        let code = match self.render_model(table_name, columns, options) {
            Ok(code) => code,
            Err(e) => {
                error!(table = ?table_name, error = ?e, "Failed to render model");
                return false;
            }
        };

        let path = options.header.file_path(table_name);
        match write_output(&path, &code, &options.header) {
            Ok(()) => {
                debug!(table = ?table_name, path = ?path, "Generated model file");
                true
            }
            Err(e) => {
                warn!(table = ?table_name, path = ?path, error = ?e, "Failed to write model file");
                false
            }
        }
    }

    /// Render and write the module index for a batch
    fn emit_index(
        &self,
        model_names: &[String],
        header: &HeaderOptions,
    ) -> Result<PathBuf, SqlmintError> {
        let code = self.render_index(model_names, &header.extension)?;
        let path = header.dest_dir.join("mod.rs");
        let overwrite = HeaderOptions {
            append: false,
            ..header.clone()
        };
        write_output(&path, &code, &overwrite)?;
        debug!(path = ?path, modules = model_names.len(), "Generated module index");
        Ok(path)
    }
}

/// Write `code` to `path`, creating the destination directory when allowed
fn write_output(path: &Path, code: &str, header: &HeaderOptions) -> io::Result<()> {
    let dir = &header.dest_dir;
    if !dir.as_os_str().is_empty() && !dir.is_dir() {
        if !header.create_dir {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("destination directory {} does not exist", dir.display()),
            ));
        }
        fs::create_dir_all(dir)?;
        debug!(path = ?dir, "Created output directory");
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(header.append)
        .truncate(!header.append)
        .open(path)?;
    file.write_all(code.as_bytes())?;
    file.flush()
}
