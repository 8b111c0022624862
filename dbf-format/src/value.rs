use std::fmt;

use chrono::NaiveDate;

/// A typed value held by one field of a record.
///
/// Numeric fields decode to [`Value::Integer`] when they have no decimal
/// places and to [`Value::Float`] otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Character(String),
    Logical(bool),
    /// `None` is the blank "no date" value.
    Date(Option<NaiveDate>),
    Integer(i64),
    Float(f64),
}

impl Value {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Character(_) => "character",
            Value::Logical(_) => "logical",
            Value::Date(_) => "date",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
        }
    }

    #[inline(always)]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Character(s) => Some(s),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Logical(b) => Some(*b),
            _ => None,
        }
    }

    /// The date of a date value; the outer `Option` is `None` for other variants.
    #[inline(always)]
    pub fn as_date(&self) -> Option<Option<NaiveDate>> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value as a float. Integers are widened.
    #[inline(always)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Character(s) => f.write_str(s),
            Value::Logical(true) => f.write_str("T"),
            Value::Logical(false) => f.write_str("F"),
            Value::Date(Some(d)) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Date(None) => Ok(()),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Character(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Character(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logical(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n.into())
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(Some(d))
    }
}

impl From<Option<NaiveDate>> for Value {
    fn from(d: Option<NaiveDate>) -> Self {
        Value::Date(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Value::from("Abc"), Value::Character("Abc".into()));
        assert_eq!(Value::from(true), Value::Logical(true));
        assert_eq!(Value::from(123), Value::Integer(123));
        assert_eq!(Value::from(123.45), Value::Float(123.45));
        let d = NaiveDate::from_ymd_opt(2020, 9, 23).unwrap();
        assert_eq!(Value::from(d), Value::Date(Some(d)));
        assert_eq!(Value::from(None::<NaiveDate>), Value::Date(None));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(true).as_str(), None);
        assert_eq!(Value::from(5).as_f64(), Some(5.0));
        assert_eq!(Value::from(5.1).as_i64(), None);
        assert_eq!(Value::Date(None).as_date(), Some(None));
    }

    #[test]
    fn display() {
        assert_eq!(Value::from(false).to_string(), "F");
        assert_eq!(Value::Date(None).to_string(), "");
        let d = NaiveDate::from_ymd_opt(2021, 7, 26).unwrap();
        assert_eq!(Value::from(d).to_string(), "2021-07-26");
    }
}
