use dbf_format::ReaderOptions;
use serde::Serialize;

use crate::cli::FieldsArgs;
use crate::error::Result;
use crate::util::{open_table, type_letter};

#[derive(Serialize)]
struct JsonField<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    field_type: String,
    length: usize,
    decimals: usize,
    offset: usize,
}

pub fn run(args: FieldsArgs) -> Result<()> {
    let reader = open_table(&args.table, ReaderOptions::default())?;
    let fields = reader.fields();

    if args.json {
        let entries: Vec<JsonField<'_>> = fields
            .iter()
            .map(|f| JsonField {
                name: f.name(),
                field_type: f.field_type().to_string(),
                length: f.length(),
                decimals: f.decimal_count(),
                offset: f.offset(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!(
        "{:<10}  {:<4}  {:>6}  {:>8}  {:>6}",
        "Name", "Type", "Length", "Decimals", "Offset"
    );
    println!("{}", "-".repeat(42));
    for field in fields.iter() {
        println!(
            "{:<10}  {:<4}  {:>6}  {:>8}  {:>6}",
            field.name(),
            type_letter(field.field_type()),
            field.length(),
            field.decimal_count(),
            field.offset()
        );
    }
    println!("{}", "-".repeat(42));
    println!("{} fields, {} bytes per record", fields.count(), fields.record_width());

    Ok(())
}
