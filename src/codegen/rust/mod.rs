//! Rust model generator
//!
//! Renders one Rust module per table or view. The module holds a struct with
//! a field per column and, depending on the options, accessors, a `Display`
//! impl and the `Record` impl used by `TypedTable`.

use std::collections::HashSet;

use minijinja::Environment;
use tracing::trace;

use crate::codegen::{CodeGenerator, EmissionOptions};
use crate::error::SqlmintError;
use crate::schema::{bare_ident, to_type_ident, ColumnDescriptor};

/// Name of the generated delimiter accessor
const DELIMITER_FN: &str = "delimiter";

/// Rust model generator
pub struct RustGenerator {
    env: Environment<'static>,
}

impl RustGenerator {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);

        // Register templates
        env.add_template("model", include_str!("templates/model.rs.jinja"))
            .expect("Failed to load model template");
        env.add_template("index", include_str!("templates/index.rs.jinja"))
            .expect("Failed to load index template");

        Self { env }
    }
}

impl Default for RustGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for RustGenerator {
    fn render_model(
        &self,
        table_name: &str,
        columns: &[ColumnDescriptor],
        options: &EmissionOptions,
    ) -> Result<String, SqlmintError> {
        let template = self
            .env
            .get_template("model")
            .map_err(|e| SqlmintError::CodeGen {
                table: table_name.to_string(),
                message: format!("Template error: {}", e),
            })?;

        let ctx = build_model_context(table_name, columns, options);
        trace!(table = ?table_name, columns = columns.len(), "Rendering model");

        template.render(ctx).map_err(|e| SqlmintError::CodeGen {
            table: table_name.to_string(),
            message: format!("Render error: {}", e),
        })
    }

    fn render_index(&self, model_names: &[String], extension: &str) -> Result<String, SqlmintError> {
        let template = self
            .env
            .get_template("index")
            .map_err(|e| SqlmintError::CodeGen {
                table: "mod".to_string(),
                message: format!("Template error: {}", e),
            })?;

        let ctx = minijinja::context! {
            modules => model_names.iter().map(|name| {
                let ident = to_type_ident(name);
                let file = format!("{}.{}", name, extension);
                minijinja::context! {
                    path => (file != format!("{}.rs", ident)).then(|| format!("{:?}", file)),
                    name => ident,
                }
            }).collect::<Vec<_>>(),
        };

        template.render(ctx).map_err(|e| SqlmintError::CodeGen {
            table: "mod".to_string(),
            message: format!("Render error: {}", e),
        })
    }
}

/// Build template context for a model
fn build_model_context(
    table_name: &str,
    columns: &[ColumnDescriptor],
    options: &EmissionOptions,
) -> minijinja::Value {
    let misc = &options.misc;
    let strings = &options.strings;
    let display = !misc.exclude_display;

    let column_list = columns
        .iter()
        .map(|col| col.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    minijinja::context! {
        table_name => table_name,
        model => to_type_ident(&options.header.model_name(table_name)),
        runtime => &misc.runtime_path,
        include => strings.include.trim(),
        str_type => &strings.str_type,
        comments => !misc.exclude_comments,
        table_interface => !misc.exclude_table_interface,
        getters => misc.emit_getters(),
        setters => misc.emit_setters(),
        display => display,
        vis => if misc.is_public_fields { "pub " } else { "" },
        table_literal => strings.literal(table_name),
        columns_literal => strings.literal(&column_list),
        delimiter_literal => strings.literal(&misc.delimiter),
        columns => build_column_contexts(columns, misc.emit_setters(), display),
    }
}

/// Build template contexts for every column
///
/// Field names are made unique after sanitizing, and a getter that would
/// clash with a setter, `COLUMN_COUNT` or `delimiter()` gets a `get_` prefix.
fn build_column_contexts(
    columns: &[ColumnDescriptor],
    setters: bool,
    display: bool,
) -> Vec<minijinja::Value> {
    let mut taken_fields = HashSet::new();
    let fields: Vec<String> = columns
        .iter()
        .map(|col| unique_field(col.field_name(), &mut taken_fields))
        .collect();

    let mut taken_methods: HashSet<String> = HashSet::from(["COLUMN_COUNT".to_string()]);
    if display {
        taken_methods.insert(DELIMITER_FN.to_string());
    }
    if setters {
        taken_methods.extend(fields.iter().map(|field| setter_name(field)));
    }

    columns
        .iter()
        .zip(fields)
        .map(|(col, field)| {
            let getter = unique_getter(&field, &mut taken_methods);
            minijinja::context! {
                name => &col.name,
                setter => setter_name(&field),
                getter => getter,
                field => field,
                ty => &col.mapped_type,
            }
        })
        .collect()
}

/// `field`, or `field_2`, `field_3`, ... when already used
fn unique_field(field: String, taken: &mut HashSet<String>) -> String {
    let bare = bare_ident(&field).to_string();
    if taken.insert(bare.clone()) {
        return field;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", bare, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn setter_name(field: &str) -> String {
    format!("set_{}", bare_ident(field))
}

/// First free name among `field`, `get_field`, `get_field_2`, ...
fn unique_getter(field: &str, taken: &mut HashSet<String>) -> String {
    let bare = bare_ident(field);
    if taken.insert(bare.to_string()) {
        return field.to_string();
    }

    let prefixed = format!("get_{}", bare);
    if taken.insert(prefixed.clone()) {
        return prefixed;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", prefixed, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{MiscOptions, StrOptions};
    use pretty_assertions::assert_eq;

    fn column(name: &str, declared: &str, mapped: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            declared_type: Some(declared.to_string()),
            mapped_type: mapped.to_string(),
        }
    }

    fn contacts() -> Vec<ColumnDescriptor> {
        vec![
            column("id", "INTEGER", "Integer"),
            column("name", "TEXT", "Text"),
            column("rating", "REAL", "Real"),
        ]
    }

    #[test]
    fn test_render_full_model() {
        let generator = RustGenerator::new();
        let code = generator
            .render_model("Contacts", &contacts(), &EmissionOptions::default())
            .unwrap();

        let expected = r#"// @generated by sqlmint from `Contacts`
#[allow(unused_imports)]
use sqlmint::types::*;
use sqlmint::{Record, RowCursor, SqlmintError, ToSql};

/// String type used by this model
pub type StrType = String;
pub type Text = StrType;

/// One row of `Contacts`
#[allow(non_camel_case_types, non_snake_case)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct sql_Contacts {
    // A field for each column, in column order
    id: Integer,
    name: Text,
    rating: Real,
}

#[allow(non_snake_case)]
impl sql_Contacts {
    pub const COLUMN_COUNT: usize = 3;

    // Read access to each field
    pub fn id(&self) -> &Integer { &self.id }
    pub fn name(&self) -> &Text { &self.name }
    pub fn rating(&self) -> &Real { &self.rating }

    // Write access to each field
    pub fn set_id(&mut self, data: Integer) { self.id = data; }
    pub fn set_name(&mut self, data: Text) { self.name = data; }
    pub fn set_rating(&mut self, data: Real) { self.rating = data; }

    // Placed between fields by the Display impl
    pub fn delimiter() -> StrType { String::from(",") }
}

// Table contract used by sqlmint::TypedTable
impl Record for sql_Contacts {
    type StrType = StrType;

    fn table_name() -> StrType { String::from("Contacts") }
    fn column_names() -> StrType { String::from("id, name, rating") }
    fn column_count() -> usize { Self::COLUMN_COUNT }

    fn populate(cursor: &mut RowCursor<'_, '_>) -> Result<Self, SqlmintError> {
        Ok(Self {
            id: cursor.read()?,
            name: cursor.read()?,
            rating: cursor.read()?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.id as &dyn ToSql,
            &self.name as &dyn ToSql,
            &self.rating as &dyn ToSql,
        ]
    }
}

// Fields in column order, separated by delimiter()
impl std::fmt::Display for sql_Contacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let delimiter = Self::delimiter();
        write!(f, "{}", self.id)?;
        write!(f, "{}{}", delimiter, self.name)?;
        write!(f, "{}{}", delimiter, self.rating)?;
        Ok(())
    }
}
"#;
        assert_eq!(code, expected);
    }

    #[test]
    fn test_render_minimal_model() {
        let generator = RustGenerator::new();
        let options = EmissionOptions::default().with_misc(MiscOptions::min());
        let code = generator.render_model("Contacts", &contacts(), &options).unwrap();

        assert!(code.contains("    pub id: Integer,\n"));
        assert!(code.contains("impl Record for sql_Contacts"));
        assert!(!code.contains("pub fn set_id"));
        assert!(!code.contains("pub fn id(&self)"));
        assert!(!code.contains("Display"));
        assert!(!code.contains("///"));
        assert!(!code.contains("    // "));
        assert!(!code.contains("// Table contract"));
    }

    #[test]
    fn test_render_var_model_has_no_table_contract() {
        let generator = RustGenerator::new();
        let options = EmissionOptions::default().with_misc(MiscOptions::var());
        let code = generator.render_model("Contacts", &contacts(), &options).unwrap();

        assert!(!code.contains("impl Record"));
        assert!(!code.contains("use sqlmint::{Record"));
        assert!(code.contains("pub const COLUMN_COUNT: usize = 3;"));
    }

    #[test]
    fn test_string_options_flow_into_literals() {
        let generator = RustGenerator::new();
        let options = EmissionOptions::default().with_strings(StrOptions::shared());
        let code = generator.render_model("Contacts", &contacts(), &options).unwrap();

        assert!(code.contains("use std::sync::Arc;\n"));
        assert!(code.contains("pub type StrType = Arc<str>;"));
        assert!(code.contains("fn table_name() -> StrType { Arc::from(\"Contacts\") }"));
    }

    #[test]
    fn test_custom_delimiter() {
        let generator = RustGenerator::new();
        let mut options = EmissionOptions::default();
        options.misc.delimiter = " | ".to_string();
        let code = generator.render_model("Contacts", &contacts(), &options).unwrap();

        assert!(code.contains("pub fn delimiter() -> StrType { String::from(\" | \") }"));
    }

    #[test]
    fn test_keyword_and_reserved_columns() {
        let generator = RustGenerator::new();
        let columns = vec![
            column("type", "TEXT", "Text"),
            column("delimiter", "TEXT", "Text"),
        ];
        let code = generator
            .render_model("Things", &columns, &EmissionOptions::default())
            .unwrap();

        assert!(code.contains("    r#type: Text,\n"));
        assert!(code.contains("pub fn r#type(&self) -> &Text { &self.r#type }"));
        assert!(code.contains("pub fn set_type(&mut self, data: Text)"));
        assert!(code.contains("pub fn get_delimiter(&self) -> &Text"));
        assert!(code.contains("String::from(\"type, delimiter\")"));
    }

    #[test]
    fn test_colliding_names_are_made_unique() {
        let generator = RustGenerator::new();
        let columns = vec![
            column("id", "INTEGER", "Integer"),
            column("first name", "TEXT", "Text"),
            column("first_name", "TEXT", "Text"),
            column("x", "INTEGER", "Integer"),
            column("set_x", "INTEGER", "Integer"),
            column("COLUMN_COUNT", "INTEGER", "Integer"),
        ];
        let code = generator
            .render_model("T", &columns, &EmissionOptions::default())
            .unwrap();

        assert!(code.contains("    first_name: Text,\n    first_name_2: Text,\n"));
        assert!(code.contains("pub fn first_name(&self) -> &Text { &self.first_name }"));
        assert!(code.contains("pub fn first_name_2(&self) -> &Text { &self.first_name_2 }"));
        assert!(code.contains("pub fn set_first_name_2(&mut self, data: Text)"));
        assert!(code.contains("pub fn x(&self) -> &Integer { &self.x }"));
        assert!(code.contains("pub fn get_set_x(&self) -> &Integer { &self.set_x }"));
        assert!(code.contains("pub fn set_x(&mut self, data: Integer) { self.x = data; }"));
        assert!(code.contains("pub fn set_set_x(&mut self, data: Integer)"));
        assert!(code.contains("pub fn get_COLUMN_COUNT(&self) -> &Integer"));
        assert!(code.contains("String::from(\"id, first name, first_name, x, set_x, COLUMN_COUNT\")"));

        let methods: Vec<_> = code
            .lines()
            .filter_map(|l| l.trim().strip_prefix("pub fn "))
            .map(|l| l.split('(').next().unwrap())
            .collect();
        let unique: HashSet<_> = methods.iter().collect();
        assert_eq!(methods.len(), unique.len());
    }

    #[test]
    fn test_field_count_matches_columns() {
        let generator = RustGenerator::new();
        let options = EmissionOptions::default().with_misc(MiscOptions::var());
        let columns: Vec<_> = (0..12)
            .map(|i| column(&format!("c{}", i), "INTEGER", "Integer"))
            .collect();
        let code = generator.render_model("Wide", &columns, &options).unwrap();

        let fields: Vec<_> = code
            .lines()
            .filter(|l| l.starts_with("    pub c"))
            .collect();
        assert_eq!(fields.len(), 12);
        assert_eq!(fields[0], "    pub c0: Integer,");
        assert_eq!(fields[11], "    pub c11: Integer,");
    }

    #[test]
    fn test_empty_column_list() {
        let generator = RustGenerator::new();
        let code = generator
            .render_model("Empty", &[], &EmissionOptions::default())
            .unwrap();

        assert!(code.contains("pub struct sql_Empty {\n}\n"));
        assert!(code.contains("pub const COLUMN_COUNT: usize = 0;"));
        assert!(!code.contains("let delimiter"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let generator = RustGenerator::new();
        let options = EmissionOptions::default();
        let first = generator.render_model("Contacts", &contacts(), &options).unwrap();
        let second = RustGenerator::new()
            .render_model("Contacts", &contacts(), &options)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_index_with_custom_extension() {
        let generator = RustGenerator::new();
        let code = generator
            .render_index(&["sql_table_Contacts".to_string()], "model.rs")
            .unwrap();

        assert!(code.contains("#[path = \"sql_table_Contacts.model.rs\"]\npub mod sql_table_Contacts;\n"));
    }

    #[test]
    fn test_render_index() {
        let generator = RustGenerator::new();
        let names = vec!["sql_table_Contacts".to_string(), "sql_view_Top Rated".to_string()];
        let code = generator.render_index(&names, "rs").unwrap();

        let expected = r#"// @generated by sqlmint
#![allow(non_snake_case)]

pub mod sql_table_Contacts;
#[path = "sql_view_Top Rated.rs"]
pub mod sql_view_Top_Rated;
"#;
        assert_eq!(code, expected);
    }
}
