use dbf_format::{ReaderOptions, Value};

use crate::cli::DumpArgs;
use crate::error::{Error, Result};
use crate::util::{json_value, open_table};

struct Row {
    deleted: bool,
    values: Vec<Value>,
}

pub fn run(args: DumpArgs) -> Result<()> {
    let options = ReaderOptions {
        code_page: args.code_page,
    };
    let mut reader = open_table(&args.table, options)?;
    let limit = args.limit.unwrap_or(usize::MAX);

    let mut rows = Vec::new();
    while rows.len() < limit {
        let values = match reader.read() {
            Ok(Some(values)) => values,
            Ok(None) => break,
            Err(source) => {
                return Err(Error::ReadRecord {
                    path: args.table.clone(),
                    source,
                })
            }
        };
        let deleted = reader.is_deleted();
        if deleted && !args.deleted {
            continue;
        }
        rows.push(Row { deleted, values });
    }

    tracing::debug!(records = rows.len(), "collected records");

    let names: Vec<&str> = reader.fields().iter().map(|f| f.name()).collect();

    if args.json {
        dump_json(&names, &rows, args.deleted)
    } else {
        dump_table(&names, &rows, args.deleted);
        Ok(())
    }
}

fn dump_json(names: &[&str], rows: &[Row], with_deleted: bool) -> Result<()> {
    let entries: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            let mut map = serde_json::Map::new();
            if with_deleted {
                map.insert("_deleted".into(), serde_json::Value::Bool(row.deleted));
            }
            for (name, value) in names.iter().zip(row.values.iter()) {
                map.insert((*name).to_string(), json_value(value));
            }
            serde_json::Value::Object(map)
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn dump_table(names: &[&str], rows: &[Row], with_deleted: bool) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.values.iter().map(|v| v.to_string()).collect())
        .collect();

    let widths: Vec<usize> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mark = |deleted: bool| match (with_deleted, deleted) {
        (false, _) => "",
        (true, true) => "* ",
        (true, false) => "  ",
    };

    let header: Vec<String> = names
        .iter()
        .zip(widths.iter())
        .map(|(name, w)| format!("{:<w$}", name, w = *w))
        .collect();
    println!("{}{}", mark(false), header.join("  "));

    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    println!("{}{}", mark(false), "-".repeat(total));

    for (row, cells) in rows.iter().zip(cells.iter()) {
        let line: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .zip(row.values.iter())
            .map(|((cell, w), value)| match value {
                Value::Integer(_) | Value::Float(_) => format!("{:>w$}", cell, w = *w),
                _ => format!("{:<w$}", cell, w = *w),
            })
            .collect();
        println!("{}{}", mark(row.deleted), line.join("  "));
    }
}
