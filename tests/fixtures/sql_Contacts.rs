// @generated by sqlmint from `Contacts`
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
