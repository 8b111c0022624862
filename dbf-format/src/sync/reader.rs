use std::io::{BufReader, ErrorKind, Read};

use chrono::NaiveDate;

use crate::codepage::{self, Transcoder};
use crate::error::{Error, Result};
use crate::field::FIELD_DESCRIPTOR_SIZE;
use crate::fields::Fields;
use crate::header::{DbfHeader, FILE_TERMINATOR, HEADER_SIZE};
use crate::value::Value;

const DELETED: u8 = b'*';

/// Options applied when a reader is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Overrides the code page recorded in the header.
    pub code_page: Option<u16>,
}

impl ReaderOptions {
    pub fn with_code_page(mut self, id: u16) -> Self {
        self.code_page = Some(id);
        self
    }
}

/// Sequential reader over the records of one table.
///
/// The reader owns its stream for its whole lifetime and is not safe for
/// concurrent use without external synchronization.
pub struct DbfReader<R> {
    reader: BufReader<R>,
    header: DbfHeader,
    fields: Fields,
    transcoder: Option<Transcoder>,
    record: Vec<u8>,
    values: Vec<Value>,
    record_number: u32,
    deleted: bool,
    exhausted: bool,
}

impl<R> std::fmt::Debug for DbfReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbfReader")
            .field("header", &self.header)
            .field("fields", &self.fields)
            .field("transcoder", &self.transcoder)
            .field("record_number", &self.record_number)
            .finish_non_exhaustive()
    }
}

impl<R: Read> DbfReader<R> {
    /// Parse the header and field table. Fails without returning a reader if
    /// the stream is not a table or cannot be read.
    #[inline]
    pub fn new(reader: R) -> Result<DbfReader<R>> {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Result<DbfReader<R>> {
        let mut reader = BufReader::new(reader);

        let header = DbfHeader::read(&mut reader)?;
        let field_count = header.field_count();
        let fields = Fields::read_all(&mut reader, field_count)?;

        // Skip the terminator and anything else before the first record.
        let consumed = HEADER_SIZE + field_count * FIELD_DESCRIPTOR_SIZE;
        let skip = usize::from(header.data_offset()).saturating_sub(consumed) as u64;
        std::io::copy(&mut (&mut reader).take(skip), &mut std::io::sink())?;

        tracing::debug!(
            start = HEADER_SIZE,
            end = consumed,
            bytes = consumed - HEADER_SIZE,
            fields = field_count,
            "read field descriptors"
        );

        let width = fields.record_width().max(usize::from(header.record_width()));

        let mut dbf = DbfReader {
            reader,
            transcoder: codepage::transcoder_for_id(header.code_page()),
            header,
            fields,
            record: vec![b' '; width],
            values: Vec::with_capacity(field_count),
            record_number: 0,
            deleted: false,
            exhausted: false,
        };

        if let Some(id) = options.code_page {
            dbf.set_code_page(id)?;
        }

        Ok(dbf)
    }

    /// Read the next record into fresh storage. `Ok(None)` means there are no
    /// more records.
    pub fn read(&mut self) -> Result<Option<Vec<Value>>> {
        if !self.fill()? {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(self.fields.count());
        self.decode_into(&mut values)?;
        Ok(Some(values))
    }

    /// Like [`read`](DbfReader::read), but decodes into storage owned by the
    /// reader. The returned slice is overwritten by the next call.
    pub fn read_reused(&mut self) -> Result<Option<&[Value]>> {
        if !self.fill()? {
            return Ok(None);
        }
        let mut values = std::mem::take(&mut self.values);
        values.clear();
        let result = self.decode_into(&mut values);
        self.values = values;
        result?;
        Ok(Some(self.values.as_slice()))
    }

    /// Iterate over the remaining records.
    pub fn records(&mut self) -> Records<'_, R> {
        Records { reader: self }
    }

    /// Install a transcoder for character fields, replacing the one taken from
    /// the header. `0` turns transcoding off.
    pub fn set_code_page(&mut self, id: u16) -> Result<()> {
        if id == 0 {
            self.transcoder = None;
            return Ok(());
        }
        let transcoder = codepage::transcoder_for_id(id).ok_or(Error::UnsupportedCodePage(id))?;
        self.transcoder = Some(transcoder);
        Ok(())
    }

    /// Fill the record buffer. Returns `false` once the table is exhausted.
    fn fill(&mut self) -> Result<bool> {
        if self.exhausted || self.record_number >= self.header.record_count() {
            self.exhausted = true;
            self.deleted = false;
            return Ok(false);
        }

        let mut filled = 0;
        while filled < self.record.len() {
            match self.reader.read(&mut self.record[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled < self.record.len() || self.record[0] == FILE_TERMINATOR {
            tracing::debug!(
                record = self.record_number + 1,
                bytes = filled,
                "end of records"
            );
            self.exhausted = true;
            self.deleted = false;
            return Ok(false);
        }

        self.record_number += 1;
        self.deleted = self.record[0] == DELETED;
        tracing::trace!(record = self.record_number, bytes = filled, "read record");
        Ok(true)
    }

    fn decode_into(&self, values: &mut Vec<Value>) -> Result<()> {
        let transcoder = self.transcoder.as_ref();
        for field in self.fields.iter() {
            let value = field
                .decode_from(&self.record, transcoder)
                .map_err(|source| Error::Value {
                    record: self.record_number,
                    field: field.name().to_string(),
                    source,
                })?;
            values.push(value);
        }
        Ok(())
    }
}

impl<R> DbfReader<R> {
    #[inline(always)]
    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    #[inline(always)]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Record count declared by the header.
    #[inline(always)]
    pub fn record_count(&self) -> u32 {
        self.header.record_count()
    }

    /// 1-based number of the last record read, 0 before the first.
    #[inline(always)]
    pub fn record_number(&self) -> u32 {
        self.record_number
    }

    /// Whether the last record read carries the deletion mark. Always `false`
    /// once the table is exhausted.
    #[inline(always)]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Active code page id, 0 when character data is not transcoded.
    pub fn code_page(&self) -> u16 {
        self.transcoder.map(|t| t.code_page().id).unwrap_or(0)
    }

    #[inline(always)]
    pub fn modified_date(&self) -> Option<NaiveDate> {
        self.header.modified_date()
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

/// Iterator over the remaining records of a [`DbfReader`].
pub struct Records<'a, R> {
    reader: &'a mut DbfReader<R>,
}

impl<'a, R: Read> Iterator for Records<'a, R> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read().transpose()
    }
}
