use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open table at {}", path.display())]
    OpenTable {
        path: PathBuf,
        #[source]
        source: dbf_format::Error,
    },

    #[error("Failed to read {}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read a record from {}", path.display())]
    ReadRecord {
        path: PathBuf,
        #[source]
        source: dbf_format::Error,
    },

    #[error("{} already exists; pass --force to overwrite it", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Failed to create {}", path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid field spec '{spec}': {reason}")]
    InvalidFieldSpec { spec: String, reason: String },

    #[error("Invalid field spec '{spec}'")]
    FieldDefinition {
        spec: String,
        #[source]
        source: dbf_format::Error,
    },

    #[error("Unsupported code page {0}")]
    UnsupportedCodePage(u16),

    #[error("Failed to create table at {}", path.display())]
    CreateTable {
        path: PathBuf,
        #[source]
        source: dbf_format::Error,
    },

    #[error("Line {line} of the input: {reason}")]
    InvalidRow { line: usize, reason: String },

    #[error("Line {line} of the input could not be written")]
    WriteRecord {
        line: usize,
        #[source]
        source: dbf_format::Error,
    },

    #[error("Failed to finish table at {}", path.display())]
    FinishTable {
        path: PathBuf,
        #[source]
        source: dbf_format::Error,
    },

    #[error("Failed to serialize JSON output")]
    Json(#[from] serde_json::Error),
}
