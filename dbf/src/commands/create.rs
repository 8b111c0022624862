use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use chrono::NaiveDate;
use dbf_format::{codepage, DbfWriter, Field, FieldType, Fields, Value, WriterOptions};

use crate::cli::CreateArgs;
use crate::error::{Error, Result};

/// Parse `NAME:TYPE[:LEN[:DEC]]`.
fn parse_field_spec(spec: &str) -> Result<Field> {
    let invalid = |reason: &str| Error::InvalidFieldSpec {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = spec.split(':');
    let name = parts.next().unwrap_or_default();
    let ty = parts.next().ok_or_else(|| invalid("missing type"))?;

    let mut number = |what: &str| -> Result<usize> {
        match parts.next() {
            Some(text) => text
                .trim()
                .parse()
                .map_err(|_| invalid(&format!("{} is not a number", what))),
            None => Ok(0),
        }
    };
    let length = number("length")?;
    let decimals = number("decimal count")?;

    if parts.next().is_some() {
        return Err(invalid("too many parts"));
    }

    Field::new(name, ty, length, decimals).map_err(|source| Error::FieldDefinition {
        spec: spec.to_string(),
        source,
    })
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y%m%d"))
        .ok()
}

/// Convert one JSON element to the value stored in `field`. `null` is blank.
fn to_value(field: &Field, json: &serde_json::Value) -> std::result::Result<Value, String> {
    use serde_json::Value as Json;

    let mismatch = || {
        format!(
            "{} is not valid for {} field {}",
            json,
            field.field_type(),
            field.name()
        )
    };

    let value = match (field.field_type(), json) {
        (FieldType::Character, Json::Null) => Value::from(""),
        (FieldType::Character, Json::String(s)) => Value::from(s.as_str()),
        (FieldType::Logical, Json::Null) => Value::from(false),
        (FieldType::Logical, Json::Bool(b)) => Value::from(*b),
        (FieldType::Date, Json::Null) => Value::Date(None),
        (FieldType::Date, Json::String(s)) if s.trim().is_empty() => Value::Date(None),
        (FieldType::Date, Json::String(s)) => Value::from(parse_date(s).ok_or_else(mismatch)?),
        (FieldType::Numeric, Json::Null) if field.decimal_count() == 0 => Value::from(0),
        (FieldType::Numeric, Json::Null) => Value::from(0.0),
        (FieldType::Numeric, Json::Number(n)) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None if field.decimal_count() > 0 => Value::Float(n.as_f64().ok_or_else(mismatch)?),
            None => return Err(mismatch()),
        },
        _ => return Err(mismatch()),
    };
    Ok(value)
}

fn to_row(fields: &Fields, line: &str) -> std::result::Result<Vec<Value>, String> {
    let json: serde_json::Value = serde_json::from_str(line).map_err(|e| e.to_string())?;
    let items = json
        .as_array()
        .ok_or_else(|| "expected a JSON array".to_string())?;
    if items.len() != fields.count() {
        return Err(format!(
            "expected {} values, found {}",
            fields.count(),
            items.len()
        ));
    }
    fields
        .iter()
        .zip(items.iter())
        .map(|(field, item)| to_value(field, item))
        .collect()
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = File::open(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

/// Write the header and every input row, returning the record count.
fn write_table(file: File, fields: Fields, args: &CreateArgs) -> Result<u32> {
    let options = WriterOptions::default().with_code_page(args.code_page);
    let mut writer =
        DbfWriter::with_options(file, fields, options).map_err(|source| Error::CreateTable {
            path: args.table.clone(),
            source,
        })?;

    if let Some(input) = args.input.as_deref() {
        let reader = open_input(input)?;
        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|source| Error::ReadFile {
                path: input.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let row = to_row(writer.fields(), &line).map_err(|reason| Error::InvalidRow {
                line: line_no,
                reason,
            })?;
            writer.write(&row).map_err(|source| Error::WriteRecord {
                line: line_no,
                source,
            })?;
        }
    }

    let count = writer.record_count();
    writer.finish().map_err(|source| Error::FinishTable {
        path: args.table.clone(),
        source,
    })?;
    Ok(count)
}

pub fn run(args: CreateArgs) -> Result<()> {
    let mut fields = Fields::new();
    for spec in args.fields.iter() {
        let field = parse_field_spec(spec)?;
        fields.add(field).map_err(|source| Error::FieldDefinition {
            spec: spec.clone(),
            source,
        })?;
    }

    if args.code_page != 0 && codepage::lookup(args.code_page).is_none() {
        return Err(Error::UnsupportedCodePage(args.code_page));
    }

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .create_new(!args.force)
        .open(&args.table)
        .map_err(|source| match source.kind() {
            ErrorKind::AlreadyExists => Error::AlreadyExists {
                path: args.table.clone(),
            },
            _ => Error::CreateFile {
                path: args.table.clone(),
                source,
            },
        })?;

    let count = match write_table(file, fields, &args) {
        Ok(count) => count,
        Err(err) => {
            if let Err(e) = std::fs::remove_file(&args.table) {
                tracing::warn!("could not remove {}: {}", args.table.display(), e);
            }
            return Err(err);
        }
    };

    if !args.quiet {
        println!("Wrote {} records to {}", count, args.table.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use dbf_format::DbfReader;

    use super::*;

    #[test]
    fn field_specs() {
        let f = parse_field_spec("name:C:30").unwrap();
        assert_eq!(
            (f.name(), f.field_type(), f.length()),
            ("NAME", FieldType::Character, 30)
        );

        let f = parse_field_spec("price:n:9:2").unwrap();
        assert_eq!((f.length(), f.decimal_count()), (9, 2));

        let f = parse_field_spec("born:D").unwrap();
        assert_eq!(f.length(), 8);

        assert!(matches!(
            parse_field_spec("name"),
            Err(Error::InvalidFieldSpec { .. })
        ));
        assert!(matches!(
            parse_field_spec("name:C:abc"),
            Err(Error::InvalidFieldSpec { .. })
        ));
        assert!(matches!(
            parse_field_spec("name:C"),
            Err(Error::FieldDefinition { .. })
        ));
        assert!(matches!(
            parse_field_spec("name:C:1:0:9"),
            Err(Error::InvalidFieldSpec { .. })
        ));
    }

    #[test]
    fn json_rows() {
        let mut fields = Fields::new();
        for spec in ["name:C:10", "ok:L", "born:D", "n:N:4", "x:N:8:2"] {
            fields.add(parse_field_spec(spec).unwrap()).unwrap();
        }

        let row = to_row(&fields, r#"["Abc", true, "2021-07-26", 12, 1.5]"#).unwrap();
        assert_eq!(
            row,
            vec![
                Value::from("Abc"),
                Value::from(true),
                Value::from(NaiveDate::from_ymd_opt(2021, 7, 26).unwrap()),
                Value::from(12),
                Value::from(1.5),
            ]
        );

        let row = to_row(&fields, "[null, null, null, null, null]").unwrap();
        assert_eq!(row[2], Value::Date(None));
        assert_eq!(row[3], Value::from(0));
        assert_eq!(row[4], Value::from(0.0));

        assert!(to_row(&fields, r#"["Abc"]"#).is_err());
        assert!(to_row(&fields, r#"{"name": "Abc"}"#).is_err());
        assert!(to_row(&fields, r#"["Abc", true, "2021-07-26", 1.5, 1.5]"#).is_err());
        assert!(to_row(&fields, r#"["Abc", "yes", null, 1, 1]"#).is_err());
    }

    fn args(table: PathBuf, input: Option<PathBuf>) -> CreateArgs {
        CreateArgs {
            table,
            fields: vec!["name:C:10".into(), "n:N:4".into()],
            code_page: 0,
            input,
            force: false,
            quiet: true,
        }
    }

    fn write_input(dir: &Path, lines: &str) -> PathBuf {
        let path = dir.join("rows.jsonl");
        std::fs::write(&path, lines).unwrap();
        path
    }

    #[test]
    fn creates_a_readable_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("t.dbf");
        let input = write_input(dir.path(), "[\"Abc\", 1]\n\n[\"Def\", 2]\n");

        run(args(table.clone(), Some(input))).unwrap();

        let mut reader = DbfReader::new(File::open(&table).unwrap()).unwrap();
        assert_eq!(reader.record_count(), 2);
        let rows: Vec<Vec<Value>> = reader.records().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(rows[1], vec![Value::from("Def"), Value::from(2)]);
    }

    #[test]
    fn bad_row_removes_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("t.dbf");
        let input = write_input(dir.path(), "[\"Abc\", 1]\n[1, 2]\n");

        let err = run(args(table.clone(), Some(input))).unwrap_err();
        assert!(matches!(err, Error::InvalidRow { line: 2, .. }));
        assert!(!table.exists());
    }

    #[test]
    fn bad_code_page_keeps_the_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("t.dbf");
        std::fs::write(&table, b"original").unwrap();

        let mut args = args(table.clone(), None);
        args.force = true;
        args.code_page = 999;
        let err = run(args).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCodePage(999)));
        assert_eq!(std::fs::read(&table).unwrap(), b"original");
    }

    #[test]
    fn existing_table_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("t.dbf");
        std::fs::write(&table, b"original").unwrap();

        let err = run(args(table.clone(), None)).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(std::fs::read(&table).unwrap(), b"original");

        let mut args = args(table.clone(), None);
        args.force = true;
        run(args).unwrap();
        let reader = DbfReader::new(File::open(&table).unwrap()).unwrap();
        assert_eq!(reader.record_count(), 0);
        assert_eq!(reader.fields().count(), 2);
    }
}
