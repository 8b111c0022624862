use dbf_format::ReaderOptions;

use crate::cli::InfoArgs;
use crate::error::{Error, Result};
use crate::util::{format_code_page, format_size, open_table};

pub fn run(args: InfoArgs) -> Result<()> {
    let reader = open_table(&args.table, ReaderOptions::default())?;

    let size = std::fs::metadata(&args.table)
        .map_err(|source| Error::ReadFile {
            path: args.table.clone(),
            source,
        })?
        .len();

    let header = reader.header();
    let modified = reader
        .modified_date()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into());

    println!("Table:        {}", args.table.display());
    println!("Size:         {}", format_size(size));
    println!("Records:      {}", header.record_count());
    println!("Fields:       {}", reader.fields().count());
    println!("Record width: {} bytes", header.record_width());
    println!("Data offset:  {:#x}", header.data_offset());
    println!("Code page:    {}", format_code_page(reader.code_page()));
    println!("Modified:     {}", modified);

    Ok(())
}
