//! Field types referenced by generated models
//!
//! Each alias names the SQLite declared type it stands for, so a generated
//! struct reads like its `CREATE TABLE`. The composite types wrap values that
//! have no direct scalar equivalent.

use std::borrow::Cow;
use std::fmt;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use time::{format_description::FormatItem, macros::format_description, PrimitiveDateTime};
use tracing::trace;

pub type Integer = i32;
pub type Int = i32;
pub type Int2 = i32;
pub type Int8 = i32;
pub type Tinyint = u8;
pub type Smallint = i16;
pub type Mediumint = i32;
pub type Boolean = bool;
pub type Bigint = i64;
pub type UBigint = u64;
pub type Numeric = f64;
pub type Decimal = f64;
pub type Real = f64;
pub type DoublePrcsn = f64;
pub type Double = f64;
pub type Float = f64;
pub type Character = String;
pub type Varchar = String;
pub type Nchar = String;
pub type Nvarchar = String;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATETIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATETIME_T_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Any storage class read as text, the way `sqlite3_column_text` converts it
fn column_text(value: ValueRef<'_>) -> Option<Cow<'_, str>> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(Cow::Owned(i.to_string())),
        ValueRef::Real(f) => Some(Cow::Owned(f.to_string())),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(String::from_utf8_lossy(bytes)),
    }
}

/// Any storage class read as raw bytes; NULL reads as no bytes
fn column_bytes(value: ValueRef<'_>) -> Vec<u8> {
    match value {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes.to_vec(),
        other => column_text(other)
            .map(|text| text.into_owned().into_bytes())
            .unwrap_or_default(),
    }
}

/// Binary data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob(pub Vec<u8>);

impl FromSql for Blob {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(Blob(column_bytes(value)))
    }
}

impl ToSql for Blob {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&self.0)))
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Character data that may contain embedded NUL bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clob(pub Vec<u8>);

impl FromSql for Clob {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(Clob(column_bytes(value)))
    }
}

impl ToSql for Clob {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Text(&self.0)))
    }
}

impl fmt::Display for Clob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Calendar date stored as `YYYY-MM-DD` text
///
/// Values that do not parse are kept as the empty date rather than failing
/// the whole row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Date(pub Option<time::Date>);

impl FromSql for Date {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let Some(text) = column_text(value) else {
            return Ok(Date(None));
        };
        // Trailing time components are ignored.
        let head = text.get(..10).unwrap_or(&*text);
        match time::Date::parse(head, DATE_FORMAT) {
            Ok(date) => Ok(Date(Some(date))),
            Err(e) => {
                trace!(value = ?text, error = ?e, "Unparsable date, using empty date");
                Ok(Date(None))
            }
        }
    }
}

impl ToSql for Date {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self.0 {
            Some(date) => {
                let text = date
                    .format(DATE_FORMAT)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                Ok(ToSqlOutput::from(text))
            }
            None => Ok(ToSqlOutput::from(rusqlite::types::Null)),
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(date) => {
                let text = date.format(DATE_FORMAT).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
            None => f.write_str("0000-00-00"),
        }
    }
}

/// Date and time of day stored as `YYYY-MM-DD HH:MM:SS` text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Datetime(pub Option<PrimitiveDateTime>);

impl FromSql for Datetime {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let Some(text) = column_text(value) else {
            return Ok(Datetime(None));
        };
        let head = text.get(..19).unwrap_or(&*text);
        let parsed = PrimitiveDateTime::parse(head, DATETIME_FORMAT)
            .or_else(|_| PrimitiveDateTime::parse(head, DATETIME_T_FORMAT));

        match parsed {
            Ok(datetime) => Ok(Datetime(Some(datetime))),
            Err(e) => {
                trace!(value = ?text, error = ?e, "Unparsable datetime, using empty datetime");
                Ok(Datetime(None))
            }
        }
    }
}

impl ToSql for Datetime {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self.0 {
            Some(datetime) => {
                let text = datetime
                    .format(DATETIME_FORMAT)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                Ok(ToSqlOutput::from(text))
            }
            None => Ok(ToSqlOutput::from(rusqlite::types::Null)),
        }
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(datetime) => {
                let text = datetime.format(DATETIME_FORMAT).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
            None => f.write_str("0000-00-00 00:00:00"),
        }
    }
}
