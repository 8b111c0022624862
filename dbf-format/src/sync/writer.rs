use std::io::{BufWriter, Seek, SeekFrom, Write};

use chrono::NaiveDate;

use crate::codepage::{self, Transcoder};
use crate::error::{Error, Result};
use crate::field::Field;
use crate::fields::Fields;
use crate::header::{self, DbfHeader, FILE_TERMINATOR, HEADER_SIZE, HEADER_TERMINATOR};
use crate::value::Value;

const ACTIVE: u8 = b' ';
const DELETED: u8 = b'*';

/// Options applied when a writer is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterOptions {
    /// Code page for character fields, 0 for none.
    pub code_page: u16,
    /// Last modified date written to the header. Defaults to today.
    pub modified: Option<NaiveDate>,
}

impl WriterOptions {
    pub fn with_code_page(mut self, id: u16) -> Self {
        self.code_page = id;
        self
    }

    pub fn with_modified(mut self, date: NaiveDate) -> Self {
        self.modified = Some(date);
        self
    }
}

/// Sequential writer for one table.
///
/// Records are appended one at a time, either from a full value list with
/// [`write`](DbfWriter::write) or by filling fields with
/// [`set_field`](DbfWriter::set_field) and then calling
/// [`append`](DbfWriter::append).
///
/// [`finish`](DbfWriter::finish) must be called once all records are written.
/// It stores the final record count in the header; a table that is never
/// finished claims to hold no records.
pub struct DbfWriter<W: Write + Seek> {
    sink: Option<BufWriter<W>>,
    header: DbfHeader,
    fields: Fields,
    transcoder: Option<Transcoder>,
    record: Vec<u8>,
}

impl<W: Write + Seek> Drop for DbfWriter<W> {
    fn drop(&mut self) {
        if self.sink.is_some() {
            tracing::warn!(
                "DbfWriter dropped without calling finish(). \
                 The header still claims 0 records, {} were written.",
                self.header.record_count
            );
        }
    }
}

impl<W: Write + Seek> DbfWriter<W> {
    #[inline]
    pub fn new(writer: W, fields: Fields) -> Result<DbfWriter<W>> {
        Self::with_options(writer, fields, WriterOptions::default())
    }

    /// Validate the layout and write the header and field table.
    pub fn with_options(writer: W, fields: Fields, options: WriterOptions) -> Result<DbfWriter<W>> {
        if fields.is_empty() {
            return Err(Error::NoFieldsDefined);
        }

        let transcoder = match options.code_page {
            0 => None,
            id => Some(codepage::transcoder_for_id(id).ok_or(Error::UnsupportedCodePage(id))?),
        };

        let width = fields.record_width();
        let data_offset = header::data_offset_for(fields.count());

        let mut header = DbfHeader::new();
        header.record_width =
            u16::try_from(width).map_err(|_| Error::RecordTooWide { width, data_offset })?;
        header.set_field_count(fields.count())?;
        header.set_code_page(options.code_page);
        if let Some(date) = options.modified {
            header.set_modified_date(date);
        }

        let mut sink = BufWriter::new(writer);
        header.write(&mut sink)?;
        fields.write_all(&mut sink)?;
        sink.write_all(&[HEADER_TERMINATOR])?;

        tracing::debug!(
            start = HEADER_SIZE,
            end = data_offset,
            bytes = data_offset - HEADER_SIZE,
            fields = fields.count(),
            "wrote field descriptors"
        );

        Ok(DbfWriter {
            sink: Some(sink),
            header,
            fields,
            transcoder,
            record: vec![b' '; width],
        })
    }

    /// Encode a full record and append it. On error nothing is appended and
    /// any fields set with [`set_field`](DbfWriter::set_field) are cleared.
    pub fn write(&mut self, values: &[Value]) -> Result<()> {
        if values.len() != self.fields.count() {
            return Err(Error::RecordArityMismatch {
                expected: self.fields.count(),
                found: values.len(),
            });
        }

        let transcoder = self.transcoder.as_ref();
        let record_number = self.header.record_count + 1;
        for (field, value) in self.fields.iter().zip(values) {
            if let Err(source) = field.encode_into(value, transcoder, &mut self.record) {
                reset(&mut self.record);
                return Err(value_error(record_number, field, source));
            }
        }

        self.append()
    }

    /// Encode `value` into the pending record. On error the field keeps its
    /// previous contents.
    pub fn set_field(&mut self, index: usize, value: &Value) -> Result<()> {
        let field = self.fields.get(index)?;
        field
            .encode_into(value, self.transcoder.as_ref(), &mut self.record)
            .map_err(|source| value_error(self.header.record_count + 1, field, source))
    }

    /// Like [`set_field`](DbfWriter::set_field), with a case-insensitive name.
    pub fn set_field_by_name(&mut self, name: &str, value: &Value) -> Result<()> {
        let index = self
            .fields
            .index_of(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))?;
        self.set_field(index, value)
    }

    /// Mark the pending record as deleted.
    pub fn set_deleted(&mut self, deleted: bool) {
        self.record[0] = if deleted { DELETED } else { ACTIVE };
    }

    /// Write the pending record and start a blank one. Fields that were never
    /// set are stored as spaces.
    pub fn append(&mut self) -> Result<()> {
        let sink = sink_mut(&mut self.sink)?;
        sink.write_all(&self.record)?;
        self.header.record_count += 1;
        tracing::trace!(
            record = self.header.record_count,
            bytes = self.record.len(),
            "appended record"
        );
        reset(&mut self.record);
        Ok(())
    }

    /// Write the end-of-file mark, rewrite the header with the final record
    /// count and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        let header = self.header.clone();
        let sink = sink_mut(&mut self.sink)?;
        sink.write_all(&[FILE_TERMINATOR])?;
        sink.flush()?;
        sink.seek(SeekFrom::Start(0))?;
        header.write(sink)?;
        sink.flush()?;

        tracing::debug!(records = header.record_count, "finished table");

        match self.sink.take() {
            Some(sink) => sink.into_inner().map_err(|e| Error::Io(e.into_error())),
            None => Err(finished().into()),
        }
    }

    #[inline(always)]
    pub fn record_count(&self) -> u32 {
        self.header.record_count
    }

    #[inline(always)]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    #[inline(always)]
    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    /// Active code page id, 0 when character data is not transcoded.
    pub fn code_page(&self) -> u16 {
        self.transcoder.map(|t| t.code_page().id).unwrap_or(0)
    }
}

#[inline]
fn reset(record: &mut [u8]) {
    record.fill(b' ');
}

fn value_error(record: u32, field: &Field, source: crate::ValueError) -> Error {
    Error::Value {
        record,
        field: field.name().to_string(),
        source,
    }
}

fn finished() -> std::io::Error {
    std::io::Error::other("table writer already finished")
}

fn sink_mut<W: Write>(sink: &mut Option<BufWriter<W>>) -> std::io::Result<&mut BufWriter<W>> {
    sink.as_mut().ok_or_else(finished)
}
