//! Code pages a table can declare in its header, and the transcoders used to
//! move character data between them and Rust strings.
//!
//! The table is fixed: each entry pairs a numeric code page id with the
//! language driver byte stored at offset 29 of the header. An id of `0` means
//! "raw bytes, no transcoding" and is deliberately absent from the table.

use std::fmt;

use crate::error::ValueError;

/// One supported code page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePage {
    /// Numeric code page id, e.g. `866`.
    pub id: u16,
    /// Language driver byte written to the header.
    pub code: u8,
    pub name: &'static str,
}

pub static CODE_PAGES: [CodePage; 14] = [
    CodePage { id: 437, code: 0x01, name: "US MS-DOS" },
    CodePage { id: 850, code: 0x02, name: "International MS-DOS" },
    CodePage { id: 1252, code: 0x03, name: "Windows ANSI" },
    CodePage { id: 10000, code: 0x04, name: "Standard Macintosh" },
    CodePage { id: 852, code: 0x64, name: "Eastern European MS-DOS" },
    CodePage { id: 866, code: 0x65, name: "Russian MS-DOS" },
    CodePage { id: 865, code: 0x66, name: "Nordic MS-DOS" },
    CodePage { id: 1255, code: 0x7D, name: "Hebrew Windows" },
    CodePage { id: 1256, code: 0x7E, name: "Arabic Windows" },
    CodePage { id: 10007, code: 0x96, name: "Russian Macintosh" },
    CodePage { id: 1250, code: 0xC8, name: "Eastern European Windows" },
    CodePage { id: 1251, code: 0xC9, name: "Russian Windows" },
    CodePage { id: 1254, code: 0xCA, name: "Turkish Windows" },
    CodePage { id: 1253, code: 0xCB, name: "Greek Windows" },
];

/// Find the table entry for a numeric code page id. `0` is never found.
pub fn lookup(id: u16) -> Option<&'static CodePage> {
    if id == 0 {
        return None;
    }
    CODE_PAGES.iter().find(|page| page.id == id)
}

/// Header byte for a code page id, or `0` when the id is not supported.
pub fn code_for_id(id: u16) -> u8 {
    lookup(id).map(|page| page.code).unwrap_or(0)
}

/// Code page id for a header byte, or `0` when the byte is unknown.
pub fn id_for_code(code: u8) -> u16 {
    if code == 0 {
        return 0;
    }
    CODE_PAGES
        .iter()
        .find(|page| page.code == code)
        .map(|page| page.id)
        .unwrap_or(0)
}

/// Transcoder for a code page id, or `None` for `0` and unsupported ids.
pub fn transcoder_for_id(id: u16) -> Option<Transcoder> {
    let page = lookup(id)?;
    let charset = Charset::for_id(page.id)?;
    Some(Transcoder { page, charset })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Charset {
    Whatwg(&'static encoding_rs::Encoding),
    Oem(u16),
}

impl Charset {
    fn for_id(id: u16) -> Option<Charset> {
        let charset = match id {
            437 | 850 | 852 | 865 => Charset::Oem(id),
            866 => Charset::Whatwg(encoding_rs::IBM866),
            1250 => Charset::Whatwg(encoding_rs::WINDOWS_1250),
            1251 => Charset::Whatwg(encoding_rs::WINDOWS_1251),
            1252 => Charset::Whatwg(encoding_rs::WINDOWS_1252),
            1253 => Charset::Whatwg(encoding_rs::WINDOWS_1253),
            1254 => Charset::Whatwg(encoding_rs::WINDOWS_1254),
            1255 => Charset::Whatwg(encoding_rs::WINDOWS_1255),
            1256 => Charset::Whatwg(encoding_rs::WINDOWS_1256),
            10000 => Charset::Whatwg(encoding_rs::MACINTOSH),
            10007 => Charset::Whatwg(encoding_rs::X_MAC_CYRILLIC),
            _ => return None,
        };
        Some(charset)
    }
}

/// Encoder/decoder pair for one code page.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Transcoder {
    page: &'static CodePage,
    charset: Charset,
}

impl fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcoder")
            .field("id", &self.page.id)
            .field("name", &self.page.name)
            .finish()
    }
}

impl Transcoder {
    #[inline(always)]
    pub fn code_page(&self) -> &'static CodePage {
        self.page
    }

    /// Encode text into the code page's single-byte representation.
    ///
    /// Fails with [`ValueError::Unmappable`] when any character has no byte in
    /// the target code page.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, ValueError> {
        let unmappable = ValueError::Unmappable {
            code_page: self.page.id,
        };
        match self.charset {
            Charset::Whatwg(encoding) => {
                let (bytes, _, had_errors) = encoding.encode(text);
                if had_errors {
                    return Err(unmappable);
                }
                Ok(bytes.into_owned())
            }
            Charset::Oem(id) => {
                use oem_cp::code_table::*;
                let bytes = match id {
                    437 => oem_cp::encode_string_checked(text, &ENCODING_TABLE_CP437),
                    850 => oem_cp::encode_string_checked(text, &ENCODING_TABLE_CP850),
                    852 => oem_cp::encode_string_checked(text, &ENCODING_TABLE_CP852),
                    865 => oem_cp::encode_string_checked(text, &ENCODING_TABLE_CP865),
                    _ => None,
                };
                bytes.ok_or(unmappable)
            }
        }
    }

    /// Decode bytes in the code page into a string.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, ValueError> {
        match self.charset {
            Charset::Whatwg(encoding) => {
                let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
                if had_errors {
                    return Err(ValueError::Unmappable {
                        code_page: self.page.id,
                    });
                }
                Ok(text.into_owned())
            }
            Charset::Oem(id) => {
                use oem_cp::code_table::*;
                let text = match id {
                    437 => oem_cp::decode_string_complete_table(bytes, &DECODING_TABLE_CP437),
                    850 => oem_cp::decode_string_complete_table(bytes, &DECODING_TABLE_CP850),
                    852 => oem_cp::decode_string_complete_table(bytes, &DECODING_TABLE_CP852),
                    _ => oem_cp::decode_string_complete_table(bytes, &DECODING_TABLE_CP865),
                };
                Ok(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_ids_map_both_ways() {
        assert_eq!(code_for_id(866), 0x65);
        assert_eq!(id_for_code(0x65), 866);
        assert_eq!(code_for_id(1253), 0xCB);
        assert_eq!(id_for_code(0x03), 1252);
    }

    #[test]
    fn zero_and_unknown_are_not_found() {
        assert!(lookup(0).is_none());
        assert!(transcoder_for_id(0).is_none());
        assert_eq!(code_for_id(0), 0);
        assert_eq!(id_for_code(0), 0);
        assert_eq!(code_for_id(65001), 0);
        assert_eq!(id_for_code(0xFF), 0);
        assert!(transcoder_for_id(65001).is_none());
    }

    #[test]
    fn table_entries_are_unique() {
        for (i, a) in CODE_PAGES.iter().enumerate() {
            for b in CODE_PAGES.iter().skip(i + 1) {
                assert_ne!(a.id, b.id);
                assert_ne!(a.code, b.code);
            }
        }
    }

    #[test]
    fn every_entry_has_a_transcoder() {
        for page in CODE_PAGES.iter() {
            let t = transcoder_for_id(page.id).unwrap();
            assert_eq!(t.code_page().id, page.id);
        }
    }

    #[test]
    fn cp866_cyrillic() {
        let t = transcoder_for_id(866).unwrap();
        let bytes = t.encode("Мышь").unwrap();
        assert_eq!(bytes, vec![0x8C, 0xEB, 0xE8, 0xEC]);
        assert_eq!(t.decode(&bytes).unwrap(), "Мышь");
    }

    #[test]
    fn oem_pages_roundtrip() {
        let t = transcoder_for_id(437).unwrap();
        let bytes = t.encode("café").unwrap();
        assert_eq!(bytes, b"caf\x82".to_vec());
        assert_eq!(t.decode(&bytes).unwrap(), "café");

        let t = transcoder_for_id(850).unwrap();
        let bytes = t.encode("Größe").unwrap();
        assert_eq!(t.decode(&bytes).unwrap(), "Größe");
    }

    #[test]
    fn windows_1252_single_byte() {
        let t = transcoder_for_id(1252).unwrap();
        assert_eq!(t.encode("é").unwrap(), vec![0xE9]);
        assert_eq!(t.decode(&[0xE9]).unwrap(), "é");
    }

    #[test]
    fn unmappable_text_is_rejected() {
        let t = transcoder_for_id(1252).unwrap();
        assert_eq!(
            t.encode("Жук"),
            Err(ValueError::Unmappable { code_page: 1252 })
        );

        let t = transcoder_for_id(437).unwrap();
        assert_eq!(t.encode("Ж"), Err(ValueError::Unmappable { code_page: 437 }));
    }
}
