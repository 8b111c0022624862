use crate::error::{Error, Result};
use crate::field::Field;

/// Ordered collection of the fields of one table.
///
/// Names passed to [`add`](Fields::add) are unique ignoring case. Tables read
/// from disk may repeat a name, in which case lookups find the first one.
/// Each field's offset is assigned on insertion: the first field starts at byte 1, right after the deletion mark,
/// and every later field starts where the previous one ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    items: Vec<Field>,
    next_offset: usize,
}

impl Fields {
    pub fn new() -> Fields {
        Fields {
            items: Vec::new(),
            next_offset: 1,
        }
    }

    /// Append a field. A duplicate name is rejected and the first definition kept.
    pub fn add(&mut self, field: Field) -> Result<()> {
        if self.index_of(field.name()).is_some() {
            return Err(Error::DuplicateFieldName(field.name().to_string()));
        }
        self.push(field);
        Ok(())
    }

    fn push(&mut self, mut field: Field) {
        field.set_offset(self.next_offset);
        self.next_offset += field.length();
        self.items.push(field);
    }

    #[inline(always)]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Field> {
        self.items.get(index).ok_or(Error::FieldIndexOutOfRange {
            index,
            count: self.items.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.items.iter()
    }

    /// Position of the field named `name`, compared case-insensitively.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.items
            .iter()
            .position(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Bytes per record including the deletion mark.
    pub fn record_width(&self) -> usize {
        1 + self.items.iter().map(Field::length).sum::<usize>()
    }

    #[cfg(feature = "writer")]
    pub(crate) fn write_all<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for field in self.items.iter() {
            field.write_descriptor(writer)?;
        }
        Ok(())
    }

    /// Read `count` descriptors and lay them out in order. Repeated names are
    /// kept as they are.
    #[cfg(feature = "reader")]
    pub(crate) fn read_all<R: std::io::Read>(reader: &mut R, count: usize) -> Result<Fields> {
        let mut fields = Fields::new();
        for _ in 0..count {
            fields.push(Field::read_descriptor(reader)?);
        }
        Ok(fields)
    }
}

impl Default for Fields {
    fn default() -> Self {
        Fields::new()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Fields {
        let mut fields = Fields::new();
        fields.add(Field::character("name", 20).unwrap()).unwrap();
        fields.add(Field::numeric("price", 9, 2).unwrap()).unwrap();
        fields.add(Field::logical("flag").unwrap()).unwrap();
        fields.add(Field::date("date").unwrap()).unwrap();
        fields
    }

    #[test]
    fn offsets_follow_lengths() {
        let fields = sample();
        let offsets: Vec<usize> = fields.iter().map(Field::offset).collect();
        assert_eq!(offsets, vec![1, 21, 30, 31]);
        assert_eq!(fields.record_width(), 39);
        assert_eq!(fields.count(), 4);
    }

    #[test]
    fn default_collection_starts_at_byte_one() {
        assert_eq!(Fields::default(), Fields::new());
        let mut fields = Fields::default();
        fields.add(Field::logical("a").unwrap()).unwrap();
        assert_eq!(fields.get(0).unwrap().offset(), 1);
    }

    #[test]
    fn duplicate_names_keep_the_first() {
        let mut fields = sample();
        let err = fields.add(Field::logical("NaMe").unwrap()).unwrap_err();
        assert!(matches!(err, Error::DuplicateFieldName(ref n) if n == "NAME"));
        assert_eq!(fields.count(), 4);
        assert_eq!(fields.get(0).unwrap().length(), 20);
    }

    #[test]
    fn lookup() {
        let fields = sample();
        assert_eq!(fields.index_of("price"), Some(1));
        assert_eq!(fields.index_of("PRICE"), Some(1));
        assert_eq!(fields.index_of("missing"), None);
        assert!(matches!(
            fields.get(4),
            Err(Error::FieldIndexOutOfRange { index: 4, count: 4 })
        ));
    }

    #[cfg(feature = "writer")]
    #[test]
    fn descriptors_round_trip() {
        let fields = sample();
        let mut buf = Vec::new();
        fields.write_all(&mut buf).unwrap();
        assert_eq!(buf.len(), 4 * 32);

        let parsed = Fields::read_all(&mut buf.as_slice(), 4).unwrap();
        assert_eq!(parsed, fields);
    }

    #[cfg(feature = "reader")]
    #[test]
    fn repeated_names_on_disk_are_accepted() {
        let mut buf = Vec::new();
        Field::character("name", 10)
            .unwrap()
            .write_descriptor(&mut buf)
            .unwrap();
        Field::numeric("name", 4, 0)
            .unwrap()
            .write_descriptor(&mut buf)
            .unwrap();

        let parsed = Fields::read_all(&mut buf.as_slice(), 2).unwrap();
        let offsets: Vec<usize> = parsed.iter().map(Field::offset).collect();
        assert_eq!(offsets, vec![1, 11]);
        assert_eq!(parsed.record_width(), 15);
        assert_eq!(parsed.index_of("name"), Some(0));
    }
}
