use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dbf", about = "Inspect and create dBASE .dbf tables.", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Show the table header")]
    Info(InfoArgs),

    #[command(visible_alias = "f", about = "List the fields of a table")]
    Fields(FieldsArgs),

    #[command(visible_aliases = ["d", "cat"], about = "Print the records of a table")]
    Dump(DumpArgs),

    #[command(visible_alias = "c", about = "Create a new table")]
    Create(CreateArgs),
}

#[derive(Debug, clap::Args)]
pub struct InfoArgs {
    /// Path to the .dbf table
    pub table: PathBuf,
}

#[derive(Debug, clap::Args)]
pub struct FieldsArgs {
    /// Path to the .dbf table
    pub table: PathBuf,

    /// Output in JSON format
    #[arg(short = 'j', long)]
    pub json: bool,
}

#[derive(Debug, clap::Args)]
pub struct DumpArgs {
    /// Path to the .dbf table
    pub table: PathBuf,

    /// Output in JSON format
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Stop after this many records
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Code page used for character fields, overriding the header
    #[arg(long = "code-page", value_name = "ID")]
    pub code_page: Option<u16>,

    /// Include records marked as deleted
    #[arg(long)]
    pub deleted: bool,
}

#[derive(Debug, clap::Args)]
#[command(after_help = "\
\x1b[1m\x1b[4mField Specs:\x1b[0m
  \x1b[1mNAME:C:LEN\x1b[0m       Character, 1-254 bytes
  \x1b[1mNAME:N:LEN[:DEC]\x1b[0m Numeric, 1-19 bytes with DEC decimals
  \x1b[1mNAME:L\x1b[0m           Logical
  \x1b[1mNAME:D\x1b[0m           Date

Input rows are JSON arrays, one per line, with one element per field.
Dates are written as \"YYYY-MM-DD\" or \"YYYYMMDD\"; null leaves a field blank.

\x1b[1m\x1b[4mExamples:\x1b[0m
  dbf create people.dbf --field name:C:30 --field born:D --field balance:N:12:2
  dbf create people.dbf --code-page 866 -F name:C:30 --input rows.jsonl")]
pub struct CreateArgs {
    /// Output table path
    pub table: PathBuf,

    /// Field definition as NAME:TYPE[:LEN[:DEC]]
    #[arg(short = 'F', long = "field", value_name = "SPEC", required = true)]
    pub fields: Vec<String>,

    /// Code page for character fields (0 for none)
    #[arg(long = "code-page", value_name = "ID", default_value_t = 0)]
    pub code_page: u16,

    /// JSON lines file with the rows to write, or - for stdin
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Overwrite an existing table
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Suppress output
    #[arg(short = 'q', long)]
    pub quiet: bool,
}
