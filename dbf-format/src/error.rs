use crate::field::FieldType;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the table reader, writer and field collection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not a DBF file (expected marker byte {expected:#04x}, found {found:#04x}).")]
    MalformedHeader { expected: u8, found: u8 },

    #[error("Invalid definition for field '{name}'.")]
    InvalidFieldDefinition {
        name: String,
        #[source]
        source: FieldError,
    },

    #[error("Field name '{0}' is already defined.")]
    DuplicateFieldName(String),

    #[error("Field index {index} is out of range (table has {count} fields).")]
    FieldIndexOutOfRange { index: usize, count: usize },

    #[error("No field named '{0}'.")]
    UnknownField(String),

    #[error("Record has {found} values but the table defines {expected} fields.")]
    RecordArityMismatch { expected: usize, found: usize },

    #[error("Record {record}: field '{field}'.")]
    Value {
        record: u32,
        field: String,
        #[source]
        source: ValueError,
    },

    #[error("Unsupported code page {0}.")]
    UnsupportedCodePage(u16),

    #[error("No fields defined.")]
    NoFieldsDefined,

    #[error("Table layout does not fit the header (record width {width}, data offset {data_offset}).")]
    RecordTooWide { width: usize, data_offset: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The underlying value conversion failure, if this error wraps one.
    pub fn value_error(&self) -> Option<&ValueError> {
        match self {
            Error::Value { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A field descriptor failed validation when it was created or parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("field name is empty")]
    EmptyName,

    #[error("field name is {len} bytes long, at most {max} allowed")]
    NameTooLong { len: usize, max: usize },

    #[error("field name contains non-ASCII characters")]
    NonAsciiName,

    #[error("unknown field type '{0}', expected one of C, N, L, D")]
    UnknownType(String),

    #[error("length {length} is out of range for {ty} fields (1..={max})")]
    LengthOutOfRange {
        ty: FieldType,
        length: usize,
        max: usize,
    },

    #[error("decimal count {decimals} is invalid for a numeric field of length {length}")]
    InvalidDecimalCount { decimals: usize, length: usize },
}

/// A single value could not be converted to or from its fixed-width slot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("encoded value is {len} bytes, field holds {max}")]
    ValueTooLong { len: usize, max: usize },

    #[error("{found} value cannot be stored in a {expected} field")]
    TypeMismatch {
        expected: FieldType,
        found: &'static str,
    },

    #[error("invalid date '{0}', expected YYYYMMDD")]
    InvalidDateFormat(String),

    #[error("invalid numeric value '{0}'")]
    InvalidNumericFormat(String),

    #[error("text has no representation in code page {code_page}")]
    Unmappable { code_page: u16 },

    #[error("character data is not valid UTF-8 and no code page is set")]
    UndecodableText,
}
