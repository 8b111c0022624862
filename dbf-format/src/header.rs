use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{Datelike, NaiveDate};

use crate::codepage;
use crate::error::{Error, Result};
use crate::field::FIELD_DESCRIPTOR_SIZE;

/// File type marker of a plain dBASE III table without memo.
pub const DBF_MARKER: u8 = 0x03;
pub const HEADER_SIZE: usize = 32;
/// Terminates the field descriptor table.
pub const HEADER_TERMINATOR: u8 = 0x0D;
/// Written once after the last record.
pub const FILE_TERMINATOR: u8 = 0x1A;

const YEAR_BASE: i32 = 1900;

/// The fixed 32 bytes at the start of every table.
///
/// Reserved bytes are kept as read so a header can be rewritten unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbfHeader {
    pub(crate) marker: u8,
    pub(crate) year: u8,
    pub(crate) month: u8,
    pub(crate) day: u8,
    pub(crate) record_count: u32,
    pub(crate) data_offset: u16,
    pub(crate) record_width: u16,
    reserved: [u8; 17],
    pub(crate) code_page: u8,
    reserved_tail: [u8; 2],
}

impl DbfHeader {
    /// A fresh header dated today.
    pub fn new() -> DbfHeader {
        let mut header = DbfHeader {
            marker: DBF_MARKER,
            year: 0,
            month: 0,
            day: 0,
            record_count: 0,
            data_offset: 0,
            record_width: 0,
            reserved: [0; 17],
            code_page: 0,
            reserved_tail: [0; 2],
        };
        header.set_modified_date(chrono::Local::now().date_naive());
        header
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<DbfHeader> {
        let marker = reader.read_u8()?;
        if marker != DBF_MARKER {
            return Err(Error::MalformedHeader {
                expected: DBF_MARKER,
                found: marker,
            });
        }

        let year = reader.read_u8()?;
        let month = reader.read_u8()?;
        let day = reader.read_u8()?;
        let record_count = reader.read_u32::<LittleEndian>()?;
        let data_offset = reader.read_u16::<LittleEndian>()?;
        let record_width = reader.read_u16::<LittleEndian>()?;
        let mut reserved = [0u8; 17];
        reader.read_exact(&mut reserved)?;
        let code_page = reader.read_u8()?;
        let mut reserved_tail = [0u8; 2];
        reader.read_exact(&mut reserved_tail)?;

        let header = DbfHeader {
            marker,
            year,
            month,
            day,
            record_count,
            data_offset,
            record_width,
            reserved,
            code_page,
            reserved_tail,
        };

        tracing::debug!(
            start = 0,
            end = HEADER_SIZE,
            bytes = HEADER_SIZE,
            records = record_count,
            data_offset,
            record_width,
            "read header"
        );

        Ok(header)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(self.marker)?;
        writer.write_u8(self.year)?;
        writer.write_u8(self.month)?;
        writer.write_u8(self.day)?;
        writer.write_u32::<LittleEndian>(self.record_count)?;
        writer.write_u16::<LittleEndian>(self.data_offset)?;
        writer.write_u16::<LittleEndian>(self.record_width)?;
        writer.write_all(&self.reserved)?;
        writer.write_u8(self.code_page)?;
        writer.write_all(&self.reserved_tail)?;

        tracing::debug!(
            start = 0,
            end = HEADER_SIZE,
            bytes = HEADER_SIZE,
            records = self.record_count,
            "wrote header"
        );
        Ok(())
    }

    /// Years before 1900 or after 2155 wrap around the single year byte.
    pub fn set_modified_date(&mut self, date: NaiveDate) {
        self.year = (date.year() - YEAR_BASE) as u8;
        self.month = date.month() as u8;
        self.day = date.day() as u8;
    }

    /// `None` when the stored bytes are not a valid calendar date.
    pub fn modified_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            YEAR_BASE + i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }

    /// Stores the data offset implied by `count` field descriptors.
    pub fn set_field_count(&mut self, count: usize) -> Result<()> {
        let offset = data_offset_for(count);
        self.data_offset = u16::try_from(offset).map_err(|_| Error::RecordTooWide {
            width: usize::from(self.record_width),
            data_offset: offset,
        })?;
        Ok(())
    }

    /// Number of descriptors implied by the data offset, 0 for a header
    /// that has none yet.
    pub fn field_count(&self) -> usize {
        let offset = usize::from(self.data_offset);
        let empty = data_offset_for(0);
        if offset < empty {
            return 0;
        }
        (offset - empty) / FIELD_DESCRIPTOR_SIZE
    }

    /// Stores the header byte for `id`, or 0 when the id is unsupported.
    pub fn set_code_page(&mut self, id: u16) {
        self.code_page = codepage::code_for_id(id);
    }

    /// Code page id from the header byte, 0 when absent or unknown.
    pub fn code_page(&self) -> u16 {
        codepage::id_for_code(self.code_page)
    }

    #[inline(always)]
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    #[inline(always)]
    pub fn data_offset(&self) -> u16 {
        self.data_offset
    }

    #[inline(always)]
    pub fn record_width(&self) -> u16 {
        self.record_width
    }
}

impl Default for DbfHeader {
    fn default() -> Self {
        DbfHeader::new()
    }
}

/// Header, descriptors and the terminator byte.
#[inline]
pub(crate) fn data_offset_for(field_count: usize) -> usize {
    HEADER_SIZE + field_count * FIELD_DESCRIPTOR_SIZE + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_32_bytes() {
        let mut header = DbfHeader::new();
        header.set_modified_date(NaiveDate::from_ymd_opt(2021, 7, 26).unwrap());
        header.record_count = 3;
        header.record_width = 39;
        header.set_field_count(4).unwrap();
        header.set_code_page(866);

        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(buf[0], DBF_MARKER);
        assert_eq!(&buf[1..4], &[121, 7, 26]);
        assert_eq!(&buf[4..8], &[3, 0, 0, 0]);
        assert_eq!(&buf[8..10], &161u16.to_le_bytes());
        assert_eq!(&buf[10..12], &39u16.to_le_bytes());
        assert_eq!(buf[29], 0x65);

        let parsed = DbfHeader::read(&mut buf.as_slice()).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.field_count(), 4);
        assert_eq!(parsed.code_page(), 866);
    }

    #[test]
    fn reserved_bytes_survive_a_rewrite() {
        let mut buf = Vec::new();
        DbfHeader::new().write(&mut buf).unwrap();
        buf[12] = 0xAB;
        buf[31] = 0xCD;

        let header = DbfHeader::read(&mut buf.as_slice()).unwrap();
        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        assert_eq!(out, buf);
    }

    #[test]
    fn wrong_marker() {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0] = 0x8B;
        let err = DbfHeader::read(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedHeader {
                expected: DBF_MARKER,
                found: 0x8B
            }
        ));
    }

    #[test]
    fn truncated_header_is_an_io_error() {
        let buf = [DBF_MARKER, 121, 1];
        assert!(matches!(
            DbfHeader::read(&mut &buf[..]),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn modified_date_uses_1900_base() {
        let mut header = DbfHeader::new();
        let d = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        header.set_modified_date(d);
        assert_eq!(header.year, 99);
        assert_eq!(header.modified_date(), Some(d));

        header.month = 13;
        assert_eq!(header.modified_date(), None);
    }

    #[test]
    fn field_count_of_uninitialised_header() {
        let mut header = DbfHeader::new();
        assert_eq!(header.field_count(), 0);
        header.set_field_count(0).unwrap();
        assert_eq!(header.data_offset(), 33);
        assert_eq!(header.field_count(), 0);
    }

    #[test]
    fn too_many_fields_overflow_the_offset() {
        let mut header = DbfHeader::new();
        assert!(matches!(
            header.set_field_count(3000),
            Err(Error::RecordTooWide { .. })
        ));
    }

    #[test]
    fn unsupported_code_page_is_stored_as_zero() {
        let mut header = DbfHeader::new();
        header.set_code_page(65001);
        assert_eq!(header.code_page, 0);
        assert_eq!(header.code_page(), 0);
    }
}
