//! Fixed-width text encodings of field values.
//!
//! Every value is stored as ASCII-ish text inside a slot of the record buffer:
//! character data is left-aligned and space padded, numbers are right-aligned,
//! dates are `YYYYMMDD` and logicals a single flag byte. These functions work
//! on detached byte slices; [`Field`](crate::Field) picks the right one and
//! writes the result into the record.

use chrono::{Datelike, NaiveDate};

use crate::codepage::Transcoder;
use crate::error::ValueError;
use crate::value::Value;

const DATE_LEN: usize = 8;

#[inline]
pub(crate) fn pad_right(mut bytes: Vec<u8>, width: usize) -> Vec<u8> {
    if bytes.len() < width {
        bytes.resize(width, b' ');
    }
    bytes
}

#[inline]
pub(crate) fn pad_left(bytes: &[u8], width: usize) -> Vec<u8> {
    if bytes.len() >= width {
        return bytes.to_vec();
    }
    let mut out = vec![b' '; width - bytes.len()];
    out.extend_from_slice(bytes);
    out
}

#[inline]
pub(crate) fn trim_right(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|b| *b != b' ').map_or(0, |i| i + 1);
    &bytes[..end]
}

#[inline]
pub(crate) fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| *b == b' ')
}

fn check_len(bytes: &[u8], width: usize) -> Result<(), ValueError> {
    if bytes.len() > width {
        return Err(ValueError::ValueTooLong {
            len: bytes.len(),
            max: width,
        });
    }
    Ok(())
}

pub(crate) fn encode_character(
    value: &str,
    width: usize,
    transcoder: Option<&Transcoder>,
) -> Result<Vec<u8>, ValueError> {
    let bytes = match transcoder {
        Some(t) if !value.is_ascii() => t.encode(value)?,
        _ => value.as_bytes().to_vec(),
    };
    check_len(&bytes, width)?;
    Ok(pad_right(bytes, width))
}

pub(crate) fn decode_character(
    slot: &[u8],
    transcoder: Option<&Transcoder>,
) -> Result<String, ValueError> {
    let bytes = trim_right(slot);
    match transcoder {
        Some(t) if !bytes.is_ascii() => t.decode(bytes),
        _ => String::from_utf8(bytes.to_vec()).map_err(|_| ValueError::UndecodableText),
    }
}

pub(crate) fn encode_logical(value: bool, width: usize) -> Vec<u8> {
    let flag = if value { b'T' } else { b'F' };
    pad_right(vec![flag], width)
}

/// `T`, `t`, `Y` and `y` are true. Anything else, including a blank, is false.
pub(crate) fn decode_logical(slot: &[u8]) -> bool {
    matches!(slot.first(), Some(b'T' | b't' | b'Y' | b'y'))
}

pub(crate) fn encode_date(value: Option<NaiveDate>, width: usize) -> Result<Vec<u8>, ValueError> {
    let bytes = match value {
        None => vec![b' '; DATE_LEN],
        Some(date) => {
            if !(0..=9999).contains(&date.year()) {
                let text = date.format("%Y%m%d").to_string();
                return Err(ValueError::ValueTooLong {
                    len: text.len(),
                    max: width,
                });
            }
            date.format("%Y%m%d").to_string().into_bytes()
        }
    };
    check_len(&bytes, width)?;
    Ok(pad_right(bytes, width))
}

pub(crate) fn decode_date(slot: &[u8]) -> Result<Option<NaiveDate>, ValueError> {
    if is_blank(slot) {
        return Ok(None);
    }

    let invalid = || ValueError::InvalidDateFormat(String::from_utf8_lossy(slot).into_owned());

    if slot.len() != DATE_LEN || !slot.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }

    let digits = |range: std::ops::Range<usize>| {
        slot[range]
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'))
    };

    let year = digits(0..4) as i32;
    let month = digits(4..6);
    let day = digits(6..8);

    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or_else(invalid)
}

pub(crate) fn encode_integer(value: i64, width: usize, decimals: usize) -> Result<Vec<u8>, ValueError> {
    let mut text = value.to_string();
    if decimals > 0 {
        text.push('.');
        text.extend(std::iter::repeat('0').take(decimals));
    }
    check_len(text.as_bytes(), width)?;
    Ok(pad_left(text.as_bytes(), width))
}

pub(crate) fn encode_float(value: f64, width: usize, decimals: usize) -> Result<Vec<u8>, ValueError> {
    if !value.is_finite() {
        return Err(ValueError::InvalidNumericFormat(value.to_string()));
    }
    let text = format!("{:.*}", decimals, value);
    check_len(text.as_bytes(), width)?;
    Ok(pad_left(text.as_bytes(), width))
}

/// Optional sign, digits, at most one point, at least one digit.
fn is_decimal_literal(text: &str) -> bool {
    let body = text.strip_prefix(|c: char| c == '-' || c == '+').unwrap_or(text);
    let mut digits = 0;
    let mut points = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }
    digits > 0 && points <= 1
}

pub(crate) fn decode_numeric(slot: &[u8], decimals: usize) -> Result<Value, ValueError> {
    let invalid = || ValueError::InvalidNumericFormat(String::from_utf8_lossy(slot).into_owned());

    let text = std::str::from_utf8(slot).map_err(|_| invalid())?;
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace());
    let text = if text.is_empty() || text == "." { "0" } else { text };

    if decimals == 0 {
        text.parse::<i64>().map(Value::Integer).map_err(|_| invalid())
    } else {
        if !is_decimal_literal(text) {
            return Err(invalid());
        }
        text.parse::<f64>().map(Value::Float).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding() {
        assert_eq!(pad_right(b"Abc".to_vec(), 6), b"Abc   ");
        assert_eq!(pad_right(b"Abc".to_vec(), 2), b"Abc");
        assert_eq!(pad_left(b"Abc", 6), b"   Abc");
        assert_eq!(pad_left(b"Abc", 2), b"Abc");
    }

    #[test]
    fn trimming() {
        assert_eq!(trim_right(b"Abc"), b"Abc");
        assert_eq!(trim_right(b"Abc   "), b"Abc");
        assert_eq!(trim_right(b"   "), b"");
        assert!(is_blank(b"        "));
        assert!(!is_blank(b"   x    "));
    }

    #[test]
    fn character_pads_and_trims_only_trailing_spaces() {
        assert_eq!(encode_character("Abc", 6, None).unwrap(), b"Abc   ");
        assert_eq!(decode_character(b" Abc  ", None).unwrap(), " Abc");
        assert_eq!(decode_character(b"      ", None).unwrap(), "");
    }

    #[test]
    fn character_too_long() {
        assert_eq!(
            encode_character("Abcdefg", 6, None),
            Err(ValueError::ValueTooLong { len: 7, max: 6 })
        );
    }

    #[test]
    fn character_without_code_page_keeps_utf8() {
        let encoded = encode_character("Мышь", 10, None).unwrap();
        assert_eq!(encoded.len(), 10);
        assert_eq!(decode_character(&encoded, None).unwrap(), "Мышь");
        assert_eq!(
            decode_character(&[0x8C, 0xEB, b' '], None),
            Err(ValueError::UndecodableText)
        );
    }

    #[test]
    fn character_with_code_page() {
        let t = crate::codepage::transcoder_for_id(866).unwrap();
        let encoded = encode_character("Мышь", 6, Some(&t)).unwrap();
        assert_eq!(encoded, vec![0x8C, 0xEB, 0xE8, 0xEC, b' ', b' ']);
        assert_eq!(decode_character(&encoded, Some(&t)).unwrap(), "Мышь");
    }

    #[test]
    fn logical() {
        assert_eq!(encode_logical(true, 1), b"T");
        assert_eq!(encode_logical(false, 1), b"F");
        for flag in [b"T", b"t", b"Y", b"y"] {
            assert!(decode_logical(flag));
        }
        for flag in [b"F", b"f", b"N", b" ", b"?"] {
            assert!(!decode_logical(flag));
        }
    }

    #[test]
    fn date() {
        let d = NaiveDate::from_ymd_opt(2021, 7, 26).unwrap();
        assert_eq!(encode_date(Some(d), 8).unwrap(), b"20210726");
        assert_eq!(encode_date(None, 8).unwrap(), b"        ");
        assert_eq!(decode_date(b"20210726").unwrap(), Some(d));
        assert_eq!(decode_date(b"        ").unwrap(), None);
        assert_eq!(
            decode_date(b"abcXXXXX"),
            Err(ValueError::InvalidDateFormat("abcXXXXX".into()))
        );
        assert!(decode_date(b"20211301").is_err());
        assert!(decode_date(b"2021072").is_err());
    }

    #[test]
    fn date_out_of_range_year() {
        let d = NaiveDate::from_ymd_opt(12345, 1, 1).unwrap();
        assert!(matches!(
            encode_date(Some(d), 8),
            Err(ValueError::ValueTooLong { .. })
        ));
    }

    #[test]
    fn numeric_encoding() {
        assert_eq!(encode_float(-123.45, 9, 2).unwrap(), b"  -123.45");
        assert_eq!(encode_integer(123, 5, 0).unwrap(), b"  123");
        assert_eq!(encode_integer(5, 6, 2).unwrap(), b"  5.00");
        assert_eq!(
            encode_integer(123456, 5, 0),
            Err(ValueError::ValueTooLong { len: 6, max: 5 })
        );
        assert!(matches!(
            encode_float(f64::NAN, 9, 2),
            Err(ValueError::InvalidNumericFormat(_))
        ));
    }

    #[test]
    fn numeric_decoding() {
        assert_eq!(decode_numeric(b"  -123.45", 2).unwrap(), Value::Float(-123.45));
        assert_eq!(decode_numeric(b"  123", 0).unwrap(), Value::Integer(123));
        assert_eq!(decode_numeric(b"     ", 0).unwrap(), Value::Integer(0));
        assert_eq!(decode_numeric(b"    .", 2).unwrap(), Value::Float(0.0));
        assert_eq!(decode_numeric(b"  -.1", 2).unwrap(), Value::Float(-0.1));
        assert!(matches!(
            decode_numeric(b" 12x ", 0),
            Err(ValueError::InvalidNumericFormat(_))
        ));
        assert!(decode_numeric(b"  1.5", 0).is_err());
        assert!(decode_numeric(b"  inf", 2).is_err());
        assert!(decode_numeric(b"1e5", 2).is_err());
    }
}
