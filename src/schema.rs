//! Schema data structures
//!
//! These types represent database schema information and form the contract
//! between introspection (produces) and code generation (consumes).

use std::fmt;

/// A result-set column discovered by probing a table, view or query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name exactly as reported by SQLite
    pub name: String,
    /// Declared SQL type, `None` for expressions and untyped columns
    pub declared_type: Option<String>,
    /// Target type name chosen by the type map
    pub mapped_type: String,
}

impl ColumnDescriptor {
    /// Field identifier used in generated code
    pub fn field_name(&self) -> String {
        to_field_ident(&self.name)
    }
}

/// Kind of a catalog object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Table,
    View,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Table => "table",
            TableKind::View => "view",
        }
    }

    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "table" => Some(TableKind::Table),
            "view" => Some(TableKind::View),
            _ => None,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A table or view listed in the schema catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub kind: TableKind,
    pub name: String,
    pub tbl_name: String,
}

/// Words that cannot be used as plain identifiers
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield", "gen",
];

/// Identifiers that cannot be written as raw identifiers either
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "Self", "super"];

/// Replace every character that cannot appear in an identifier with `_`
fn replace_invalid(s: &str) -> String {
    let mut out: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }

    out
}

/// Convert a column name into a field identifier
///
/// Keywords become raw identifiers (`type` -> `r#type`).
pub fn to_field_ident(name: &str) -> String {
    let ident = replace_invalid(name);

    if NON_RAW_KEYWORDS.contains(&ident.as_str()) {
        format!("{}_", ident)
    } else if RUST_KEYWORDS.contains(&ident.as_str()) {
        format!("r#{}", ident)
    } else {
        ident
    }
}

/// Convert a model name into a type identifier
pub fn to_type_ident(name: &str) -> String {
    let ident = replace_invalid(name);

    if RUST_KEYWORDS.contains(&ident.as_str()) {
        format!("{}_", ident)
    } else {
        ident
    }
}

/// Strip the raw-identifier marker so the name can be embedded in another identifier
pub fn bare_ident(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}
