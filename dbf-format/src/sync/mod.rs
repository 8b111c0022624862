//! Sync (std) frontends for reading and writing tables.

#[cfg(feature = "reader")]
mod reader;
#[cfg(feature = "writer")]
mod writer;

#[cfg(feature = "reader")]
pub use reader::{DbfReader, ReaderOptions, Records};
#[cfg(feature = "writer")]
pub use writer::{DbfWriter, WriterOptions};
