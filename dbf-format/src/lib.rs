//! Reader and writer for dBASE-style `.dbf` tables.
//!
//! A table is a 32-byte [header][DbfHeader], a table of 32-byte [field
//! descriptors][Field], and a run of fixed-width records. Use
//! [DbfReader][DbfReader] to read tables and [DbfWriter][DbfWriter] to write
//! them. Character data can be transcoded through one of the supported
//! [code pages][codepage::CODE_PAGES].

pub mod codepage;
mod encode;
mod error;
mod field;
mod fields;
pub mod header;
#[cfg(any(feature = "reader", feature = "writer"))]
pub mod sync;
mod value;

pub use codepage::{CodePage, Transcoder};
pub use error::{Error, FieldError, Result, ValueError};
pub use field::{
    Field, FieldType, FIELD_DESCRIPTOR_SIZE, MAX_CHARACTER_LEN, MAX_NAME_LEN, MAX_NUMERIC_LEN,
};
pub use fields::Fields;
pub use header::DbfHeader;
#[cfg(feature = "reader")]
pub use sync::{DbfReader, ReaderOptions, Records};
#[cfg(feature = "writer")]
pub use sync::{DbfWriter, WriterOptions};
pub use value::Value;
