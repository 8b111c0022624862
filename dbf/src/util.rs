use std::fs::File;
use std::path::Path;

use dbf_format::{codepage, DbfReader, FieldType, ReaderOptions, Value};

use crate::error::{Error, Result};

/// Open a table for reading, mapping failures to the path.
pub fn open_table(path: &Path, options: ReaderOptions) -> Result<DbfReader<File>> {
    let file = File::open(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    DbfReader::with_options(file, options).map_err(|source| Error::OpenTable {
        path: path.to_path_buf(),
        source,
    })
}

/// Format file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

pub fn format_code_page(id: u16) -> String {
    match codepage::lookup(id) {
        Some(page) => format!("{} ({})", page.id, page.name),
        None => "none".into(),
    }
}

pub fn type_letter(ty: FieldType) -> char {
    ty.tag() as char
}

/// JSON form of a decoded value. Blank dates become `null`.
pub fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Character(s) => serde_json::Value::String(s.clone()),
        Value::Logical(b) => serde_json::Value::Bool(*b),
        Value::Date(Some(d)) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        Value::Date(None) => serde_json::Value::Null,
        Value::Integer(n) => serde_json::Value::from(*n),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn sizes_use_binary_units() {
        assert!(format_size(1024).ends_with("KiB"));
        assert!(format_size(3 * 1024 * 1024).starts_with('3'));
        assert!(format_size(3 * 1024 * 1024).ends_with("MiB"));
    }

    #[test]
    fn code_page_labels() {
        assert_eq!(format_code_page(0), "none");
        assert!(format_code_page(1251).starts_with("1251 ("));
    }

    #[test]
    fn json_values() {
        assert_eq!(json_value(&Value::from("abc")), serde_json::json!("abc"));
        assert_eq!(json_value(&Value::Date(None)), serde_json::Value::Null);
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        assert_eq!(json_value(&Value::from(date)), serde_json::json!("2020-02-29"));
        assert_eq!(json_value(&Value::Float(f64::NAN)), serde_json::Value::Null);
    }
}
