//! Row decoding.
//!
//! Result rows come back as database-specific sqlx rows. This module turns
//! them into JSON values in column order so the shell can render any result
//! the LLM's query produces, whatever the column types are.
//!
//! Decoding happens in two phases:
//! 1. [`categorize_type`] classifies the column's reported type name
//! 2. a backend-specific decoder extracts the value for that category
//!
//! SQLite expression columns (`COUNT(*)`, `SUM(x)`, aliases) have no declared
//! type, so their category comes from the storage class of the value itself.

use crate::models::DatabaseType;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Binary,
    Json,
    Uuid,
    /// Everything else is read as text (varchar, date, time, ...)
    Text,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Checked before floats: "numeric" would otherwise be ambiguous
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC affinity holds plain floats
        if db == DatabaseType::SQLite {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    // "interval" and "point" contain "int" too
    let integer_like = lower.contains("int") && !lower.contains("interval") && !lower.contains("point");
    if integer_like || lower.contains("serial") {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    if lower == "uuid" {
        return TypeCategory::Uuid;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    TypeCategory::Text
}

/// DECIMAL/NUMERIC read as its exact textual representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("numeric") || name.contains("decimal")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

/// Binary column value as JSON.
///
/// With `decode_binary` the bytes are shown as text when they are valid UTF-8;
/// otherwise (and always without the flag) they are base64 encoded.
pub fn decode_binary_value(bytes: &[u8], decode_binary: bool) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) if decode_binary => JsonValue::String(s.to_string()),
        _ => JsonValue::String(STANDARD.encode(bytes)),
    }
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

/// A result row that can be rendered as JSON.
pub trait RowToJson {
    /// Column names in result-set order.
    fn column_names(&self) -> Vec<String>;
    /// One value per column, in result-set order.
    fn to_json_row(&self, decode_binary: bool) -> Vec<JsonValue>;
}

/// Implements [`RowToJson`] for one backend row type by dispatching each
/// column to that backend's `decode_column`.
macro_rules! impl_row_to_json {
    ($row:ty, $db:expr, $decoders:ident) => {
        impl RowToJson for $row {
            fn column_names(&self) -> Vec<String> {
                self.columns().iter().map(|c| c.name().to_string()).collect()
            }

            fn to_json_row(&self, decode_binary: bool) -> Vec<JsonValue> {
                self.columns()
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| {
                        let type_name = col.type_info().name();
                        let category = categorize_type(type_name, $db);
                        $decoders::decode_column(self, idx, type_name, category, decode_binary)
                    })
                    .collect()
            }
        }
    };
}

impl_row_to_json!(MySqlRow, DatabaseType::MySQL, mysql);
impl_row_to_json!(PgRow, DatabaseType::PostgreSQL, postgres);
impl_row_to_json!(SqliteRow, DatabaseType::SQLite, sqlite);

/// Decoders shared by every backend: the same `try_get` calls work on each
/// row type for these categories.
macro_rules! common_decoders {
    ($row:ty) => {
        fn decode_boolean(row: &$row, idx: usize) -> JsonValue {
            row.try_get::<Option<bool>, _>(idx)
                .ok()
                .flatten()
                .map(JsonValue::Bool)
                .unwrap_or(JsonValue::Null)
        }

        fn decode_binary_col(row: &$row, idx: usize, decode_binary: bool) -> JsonValue {
            row.try_get::<Option<Vec<u8>>, _>(idx)
                .ok()
                .flatten()
                .map(|v| decode_binary_value(&v, decode_binary))
                .unwrap_or(JsonValue::Null)
        }

        /// Raw statements use the text protocol, so types without a `String`
        /// mapping (dates, times, UUIDs, intervals) still arrive as text and
        /// can be read unchecked.
        fn decode_text(row: &$row, idx: usize, type_name: &str) -> JsonValue {
            let text = row
                .try_get::<Option<String>, _>(idx)
                .or_else(|_| row.try_get_unchecked::<Option<String>, _>(idx));
            match text {
                Ok(Some(v)) => {
                    if type_name.to_lowercase().contains("json") {
                        if let Ok(json) = serde_json::from_str::<JsonValue>(&v) {
                            return json;
                        }
                    }
                    JsonValue::String(v)
                }
                Ok(None) => JsonValue::Null,
                Err(e) => {
                    tracing::debug!(column = idx, type_name, error = %e, "Column not decodable as text");
                    JsonValue::Null
                }
            }
        }
    };
}

mod mysql {
    use super::*;

    common_decoders!(MySqlRow);

    pub fn decode_column(
        row: &MySqlRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
        decode_binary: bool,
    ) -> JsonValue {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => decode_binary_col(row, idx, decode_binary),
            TypeCategory::Json => decode_json(row, idx),
            TypeCategory::Uuid | TypeCategory::Text => decode_text(row, idx, type_name),
        }
    }

    fn decode_decimal(row: &MySqlRow, idx: usize) -> JsonValue {
        match row.try_get::<Option<RawDecimal>, _>(idx) {
            Ok(Some(v)) => JsonValue::String(v.0),
            Ok(None) => JsonValue::Null,
            Err(e) => {
                tracing::error!("Failed to decode DECIMAL: {:?}", e);
                JsonValue::Null
            }
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> JsonValue {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map(|v| JsonValue::Number(v.into())).unwrap_or(JsonValue::Null);
        }
        // Narrow and unsigned columns only decode to their exact Rust type
        if let Ok(Some(v)) = row.try_get::<Option<i8>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<u8>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<u16>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<u32>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        JsonValue::Null
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return float_value(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
            return float_value(v as f64);
        }
        JsonValue::Null
    }

    fn decode_json(row: &MySqlRow, idx: usize) -> JsonValue {
        row.try_get::<Option<serde_json::Value>, _>(idx)
            .ok()
            .flatten()
            .unwrap_or(JsonValue::Null)
    }
}

mod postgres {
    use super::*;

    common_decoders!(PgRow);

    pub fn decode_column(
        row: &PgRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
        decode_binary: bool,
    ) -> JsonValue {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => decode_binary_col(row, idx, decode_binary),
            TypeCategory::Json => decode_json(row, idx),
            TypeCategory::Uuid | TypeCategory::Text => decode_text(row, idx, type_name),
        }
    }

    fn decode_decimal(row: &PgRow, idx: usize) -> JsonValue {
        match row.try_get::<Option<RawDecimal>, _>(idx) {
            Ok(Some(v)) => JsonValue::String(v.0),
            Ok(None) => JsonValue::Null,
            Err(e) => {
                tracing::error!("Failed to decode NUMERIC: {:?}", e);
                JsonValue::Null
            }
        }
    }

    fn decode_integer(row: &PgRow, idx: usize) -> JsonValue {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map(|v| JsonValue::Number(v.into())).unwrap_or(JsonValue::Null);
        }
        if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        JsonValue::Null
    }

    fn decode_float(row: &PgRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return float_value(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
            return float_value(v as f64);
        }
        JsonValue::Null
    }

    fn decode_json(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<serde_json::Value>, _>(idx)
            .ok()
            .flatten()
            .unwrap_or(JsonValue::Null)
    }
}

mod sqlite {
    use super::*;

    common_decoders!(SqliteRow);

    pub fn decode_column(
        row: &SqliteRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
        decode_binary: bool,
    ) -> JsonValue {
        let category = if is_undeclared(type_name) {
            match storage_category(row, idx) {
                Some(category) => category,
                None => return JsonValue::Null,
            }
        } else {
            category
        };

        match category {
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float | TypeCategory::Decimal => decode_float(row, idx),
            TypeCategory::Binary => decode_binary_col(row, idx, decode_binary),
            _ => decode_text(row, idx, type_name),
        }
    }

    /// Expression columns report `NULL` (or nothing) as their declared type.
    pub(super) fn is_undeclared(type_name: &str) -> bool {
        type_name.is_empty() || type_name.eq_ignore_ascii_case("NULL")
    }

    /// Category from the value's storage class (INTEGER, REAL, TEXT, BLOB).
    /// `None` for SQL NULL.
    fn storage_category(row: &SqliteRow, idx: usize) -> Option<TypeCategory> {
        let raw = row.try_get_raw(idx).ok()?;
        if raw.is_null() {
            return None;
        }
        let type_info = raw.type_info();
        Some(categorize_type(type_info.name(), DatabaseType::SQLite))
    }

    fn decode_integer(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<i64>, _>(idx)
            .ok()
            .flatten()
            .map(|v| JsonValue::Number(v.into()))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_float(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<f64>, _>(idx)
            .ok()
            .flatten()
            .map(float_value)
            .unwrap_or(JsonValue::Null)
    }
}
