use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};

use crate::codepage::Transcoder;
use crate::encode;
use crate::error::{Error, FieldError, Result, ValueError};
use crate::value::Value;

/// Size of one entry of the field descriptor table.
pub const FIELD_DESCRIPTOR_SIZE: usize = 32;
pub const MAX_NAME_LEN: usize = 10;
pub const MAX_CHARACTER_LEN: usize = 254;
pub const MAX_NUMERIC_LEN: usize = 19;

const LOGICAL_LEN: u8 = 1;
const DATE_LEN: u8 = 8;

// Descriptor layout
const NAME_SLOT: usize = 11;
const OFF_TYPE: usize = 11;
const OFF_OFFSET: usize = 12;
const OFF_LENGTH: usize = 16;
const OFF_DECIMALS: usize = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Character,
    Numeric,
    Logical,
    Date,
}

impl FieldType {
    /// The one-letter tag stored in the descriptor.
    pub const fn tag(self) -> u8 {
        match self {
            FieldType::Character => b'C',
            FieldType::Numeric => b'N',
            FieldType::Logical => b'L',
            FieldType::Date => b'D',
        }
    }

    pub fn from_tag(tag: u8) -> Option<FieldType> {
        match tag.to_ascii_uppercase() {
            b'C' => Some(FieldType::Character),
            b'N' => Some(FieldType::Numeric),
            b'L' => Some(FieldType::Logical),
            b'D' => Some(FieldType::Date),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::Character => "character",
            FieldType::Numeric => "numeric",
            FieldType::Logical => "logical",
            FieldType::Date => "date",
        };
        f.write_str(s)
    }
}

impl FromStr for FieldType {
    type Err = FieldError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let ty = match s.trim().as_bytes() {
            [tag] => FieldType::from_tag(*tag),
            _ => None,
        };
        ty.ok_or_else(|| FieldError::UnknownType(s.to_string()))
    }
}

/// One column of a table.
///
/// A field is validated when it is created and never changes afterwards,
/// except for its offset, which the owning [`Fields`](crate::Fields) assigns
/// from the lengths of the fields before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    ty: FieldType,
    offset: usize,
    length: u8,
    decimals: u8,
}

fn invalid(name: &str, source: FieldError) -> Error {
    Error::InvalidFieldDefinition {
        name: name.to_string(),
        source,
    }
}

fn normalize_name(name: &str) -> std::result::Result<String, FieldError> {
    let name = name.trim().to_ascii_uppercase();
    if name.is_empty() {
        return Err(FieldError::EmptyName);
    }
    if !name.is_ascii() {
        return Err(FieldError::NonAsciiName);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(FieldError::NameTooLong {
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(name)
}

fn check_length(ty: FieldType, length: usize, max: usize) -> std::result::Result<u8, FieldError> {
    if length == 0 || length > max {
        return Err(FieldError::LengthOutOfRange { ty, length, max });
    }
    Ok(length as u8)
}

fn check_decimals(length: usize, decimals: usize) -> std::result::Result<u8, FieldError> {
    let max = if length <= 2 { 0 } else { length - 2 };
    if decimals > max {
        return Err(FieldError::InvalidDecimalCount { decimals, length });
    }
    Ok(decimals as u8)
}

impl Field {
    fn with_parts(name: String, ty: FieldType, length: u8, decimals: u8) -> Field {
        Field {
            name,
            ty,
            offset: 0,
            length,
            decimals,
        }
    }

    /// Text column of 1 to 254 bytes.
    pub fn character(name: &str, length: usize) -> Result<Field> {
        let n = normalize_name(name).map_err(|e| invalid(name, e))?;
        let length = check_length(FieldType::Character, length, MAX_CHARACTER_LEN)
            .map_err(|e| invalid(&n, e))?;
        Ok(Field::with_parts(n, FieldType::Character, length, 0))
    }

    /// Number column of 1 to 19 bytes. `decimals` may be at most `length - 2`,
    /// and must be zero for lengths of 2 or less.
    pub fn numeric(name: &str, length: usize, decimals: usize) -> Result<Field> {
        let n = normalize_name(name).map_err(|e| invalid(name, e))?;
        let len = check_length(FieldType::Numeric, length, MAX_NUMERIC_LEN)
            .map_err(|e| invalid(&n, e))?;
        let decimals = check_decimals(length, decimals).map_err(|e| invalid(&n, e))?;
        Ok(Field::with_parts(n, FieldType::Numeric, len, decimals))
    }

    pub fn logical(name: &str) -> Result<Field> {
        let n = normalize_name(name).map_err(|e| invalid(name, e))?;
        Ok(Field::with_parts(n, FieldType::Logical, LOGICAL_LEN, 0))
    }

    pub fn date(name: &str) -> Result<Field> {
        let n = normalize_name(name).map_err(|e| invalid(name, e))?;
        Ok(Field::with_parts(n, FieldType::Date, DATE_LEN, 0))
    }

    /// Build a field from a one-letter type tag (`C`, `N`, `L` or `D`).
    ///
    /// Logical and date fields have a fixed width; `length` and `decimals` are
    /// ignored for them.
    pub fn new(name: &str, ty: &str, length: usize, decimals: usize) -> Result<Field> {
        let n = normalize_name(name).map_err(|e| invalid(name, e))?;
        let ty = ty.parse::<FieldType>().map_err(|e| invalid(&n, e))?;
        match ty {
            FieldType::Character => Field::character(&n, length),
            FieldType::Numeric => Field::numeric(&n, length, decimals),
            FieldType::Logical => Field::logical(&n),
            FieldType::Date => Field::date(&n),
        }
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn field_type(&self) -> FieldType {
        self.ty
    }

    /// Byte position of the field inside a record. Byte 0 is the deletion mark.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline(always)]
    pub fn length(&self) -> usize {
        self.length as usize
    }

    #[inline(always)]
    pub fn decimal_count(&self) -> usize {
        self.decimals as usize
    }

    #[inline(always)]
    pub(crate) fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    #[cfg(feature = "reader")]
    #[inline(always)]
    pub(crate) fn slot(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.length()
    }

    /// Serialize the 32-byte descriptor. The on-disk offset is always zero.
    pub fn write_descriptor<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut buf = [0u8; FIELD_DESCRIPTOR_SIZE];
        buf[..self.name.len()].copy_from_slice(self.name.as_bytes());
        buf[OFF_TYPE] = self.ty.tag();
        LittleEndian::write_u32(&mut buf[OFF_OFFSET..OFF_LENGTH], 0);
        buf[OFF_LENGTH] = self.length;
        buf[OFF_DECIMALS] = self.decimals;
        writer.write_all(&buf)
    }

    /// Parse a 32-byte descriptor. The returned field has offset 0 until a
    /// [`Fields`](crate::Fields) lays it out.
    pub fn read_descriptor<R: Read>(reader: &mut R) -> Result<Field> {
        let mut buf = [0u8; FIELD_DESCRIPTOR_SIZE];
        reader.read_exact(&mut buf)?;

        let name_len = buf[..NAME_SLOT]
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(NAME_SLOT);
        let name = String::from_utf8_lossy(&buf[..name_len]).into_owned();

        let tag = buf[OFF_TYPE];
        let ty = FieldType::from_tag(tag)
            .ok_or_else(|| invalid(&name, FieldError::UnknownType((tag as char).to_string())))?;

        let stored_offset = LittleEndian::read_u32(&buf[OFF_OFFSET..OFF_LENGTH]);
        tracing::trace!(
            %name,
            ty = %ty,
            length = buf[OFF_LENGTH],
            decimals = buf[OFF_DECIMALS],
            stored_offset,
            "deserialized field descriptor"
        );

        Ok(Field::with_parts(name, ty, buf[OFF_LENGTH], buf[OFF_DECIMALS]))
    }

    /// Encode `value` into this field's fixed-width representation.
    ///
    /// The result is exactly [`length`](Field::length) bytes long.
    pub fn encode(
        &self,
        value: &Value,
        transcoder: Option<&Transcoder>,
    ) -> std::result::Result<Vec<u8>, ValueError> {
        let width = self.length();
        let mismatch = || ValueError::TypeMismatch {
            expected: self.ty,
            found: value.kind(),
        };
        match (self.ty, value) {
            (FieldType::Character, Value::Character(s)) => {
                encode::encode_character(s, width, transcoder)
            }
            (FieldType::Logical, Value::Logical(b)) => Ok(encode::encode_logical(*b, width)),
            (FieldType::Date, Value::Date(d)) => encode::encode_date(*d, width),
            (FieldType::Numeric, Value::Integer(n)) => {
                encode::encode_integer(*n, width, self.decimal_count())
            }
            (FieldType::Numeric, Value::Float(n)) if self.decimals > 0 => {
                encode::encode_float(*n, width, self.decimal_count())
            }
            _ => Err(mismatch()),
        }
    }

    /// Decode this field's slot. `slot` must be exactly the field's bytes.
    pub fn decode(
        &self,
        slot: &[u8],
        transcoder: Option<&Transcoder>,
    ) -> std::result::Result<Value, ValueError> {
        match self.ty {
            FieldType::Character => encode::decode_character(slot, transcoder).map(Value::Character),
            FieldType::Logical => Ok(Value::Logical(encode::decode_logical(slot))),
            FieldType::Date => encode::decode_date(slot).map(Value::Date),
            FieldType::Numeric => encode::decode_numeric(slot, self.decimal_count()),
        }
    }

    /// Encode `value` into this field's slot of `record`. On error the record
    /// is left untouched.
    #[cfg(feature = "writer")]
    pub(crate) fn encode_into(
        &self,
        value: &Value,
        transcoder: Option<&Transcoder>,
        record: &mut [u8],
    ) -> std::result::Result<(), ValueError> {
        let bytes = self.encode(value, transcoder)?;
        record[self.slot()].copy_from_slice(&bytes);
        Ok(())
    }

    #[cfg(feature = "reader")]
    pub(crate) fn decode_from(
        &self,
        record: &[u8],
        transcoder: Option<&Transcoder>,
    ) -> std::result::Result<Value, ValueError> {
        self.decode(&record[self.slot()], transcoder)
    }
}
