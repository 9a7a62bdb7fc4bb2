//! Contains the different types of values understood by XML-RPC.

use crate::utils::{escape_xml, format_datetime};

use base64::encode;
use chrono::{DateTime, FixedOffset, Utc};

use std::collections::BTreeMap;
use std::io::{self, Write};

/// The possible XML-RPC values.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `<i4>` or `<int>`, 32-bit signed integer. `<i1>` and `<i2>` are read into this as well.
    Int(i32),
    /// `<i8>`, 64-bit signed integer.
    ///
    /// This is an XMLRPC extension and may not be supported by all clients / servers.
    Int64(i64),
    /// `<boolean>`, 0 == `false`, 1 == `true`.
    Bool(bool),
    /// `<string>`
    String(String),
    /// `<double>`
    Double(f64),
    /// `<dateTime.iso8601>`, an absolute point in time.
    ///
    /// Two `DateTime`s are equal when they denote the same instant, whatever their offsets.
    DateTime(DateTime<FixedOffset>),
    /// `<base64>`, base64-encoded binary data.
    Base64(Vec<u8>),

    /// `<struct>`, a mapping of named values.
    Struct(BTreeMap<String, Value>),
    /// `<array>`, a list of arbitrary (heterogeneous) values.
    Array(Vec<Value>),
}

impl Value {
    /// Returns the contained `i32` of an `<int>`.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Returns the contained integer of an `<int>` or `<i8>`, widened to 64 bits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(i) => Some(i64::from(i)),
            Value::Int64(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::String(ref s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Double(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        match *self {
            Value::DateTime(date_time) => Some(date_time),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match *self {
            Value::Base64(ref data) => Some(data),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match *self {
            Value::Struct(ref map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match *self {
            Value::Array(ref array) => Some(array),
            _ => None,
        }
    }

    /// Looks up a member of a `<struct>`. Returns `None` for all other kinds of values.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_struct().and_then(|map| map.get(name))
    }

    /// Formats this `Value` as an XML `<value>` element.
    pub fn write_as_xml<W: Write>(&self, fmt: &mut W) -> io::Result<()> {
        fmt.write_all(b"<value>")?;
        self.write_xml(fmt, true)?;
        fmt.write_all(b"</value>")
    }

    /// Writes the content of a `<value>` element.
    ///
    /// If `typed` is `false`, strings and numbers are written as bare characters instead of being
    /// wrapped in their type tag. Every other kind of value is always tagged, and members of
    /// structs and arrays are always typed.
    ///
    /// The output is streamed into `fmt`. If writing fails, part of the value may already have
    /// been written.
    pub fn write_xml<W: Write>(&self, fmt: &mut W, typed: bool) -> io::Result<()> {
        match *self {
            Value::Int(i) if typed => write!(fmt, "<int>{}</int>", i),
            Value::Int(i) => write!(fmt, "{}", i),
            Value::Int64(i) if typed => write!(fmt, "<i8>{}</i8>", i),
            Value::Int64(i) => write!(fmt, "{}", i),
            Value::Bool(b) => write!(fmt, "<boolean>{}</boolean>", if b { "1" } else { "0" }),
            Value::String(ref s) if typed => write!(fmt, "<string>{}</string>", escape_xml(s)),
            Value::String(ref s) => fmt.write_all(escape_xml(s).as_bytes()),
            Value::Double(d) if typed => write!(fmt, "<double>{}</double>", d),
            Value::Double(d) => write!(fmt, "{}", d),
            Value::DateTime(ref date_time) => {
                write!(fmt, "<dateTime.iso8601>{}</dateTime.iso8601>", format_datetime(date_time))
            }
            Value::Base64(ref data) => write!(fmt, "<base64>{}</base64>", encode(data)),
            Value::Struct(ref map) => {
                fmt.write_all(b"<struct>\n")?;
                for (name, value) in map {
                    write!(fmt, "  <member><name>{}</name><value>", escape_xml(name))?;
                    value.write_xml(fmt, true)?;
                    fmt.write_all(b"</value></member>\n")?;
                }
                fmt.write_all(b"</struct>")
            }
            Value::Array(ref array) => {
                fmt.write_all(b"<array><data>\n")?;
                for value in array {
                    fmt.write_all(b"  <value>")?;
                    value.write_xml(fmt, true)?;
                    fmt.write_all(b"</value>\n")?;
                }
                fmt.write_all(b"</data></array>\n")
            }
        }
    }
}

impl From<i32> for Value {
    fn from(other: i32) -> Self {
        Value::Int(other)
    }
}

impl From<i64> for Value {
    fn from(other: i64) -> Self {
        Value::Int64(other)
    }
}

impl From<bool> for Value {
    fn from(other: bool) -> Self {
        Value::Bool(other)
    }
}

impl From<String> for Value {
    fn from(other: String) -> Self {
        Value::String(other)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(other: &'a str) -> Self {
        Value::String(other.to_string())
    }
}

impl From<f64> for Value {
    fn from(other: f64) -> Self {
        Value::Double(other)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(other: DateTime<FixedOffset>) -> Self {
        Value::DateTime(other)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(other: DateTime<Utc>) -> Self {
        Value::DateTime(other.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(other: Vec<u8>) -> Self {
        Value::Base64(other)
    }
}

impl<'a> From<&'a [u8]> for Value {
    fn from(other: &'a [u8]) -> Self {
        Value::Base64(other.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(other: Vec<Value>) -> Self {
        Value::Array(other)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(other: BTreeMap<String, Value>) -> Self {
        Value::Struct(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use std::str;

    fn xml(value: &Value, typed: bool) -> String {
        let mut output: Vec<u8> = Vec::new();
        value.write_xml(&mut output, typed).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn escapes_strings() {
        let mut output: Vec<u8> = Vec::new();

        Value::from("<xml>&nbsp;string").write_as_xml(&mut output).unwrap();
        assert_eq!(str::from_utf8(&output).unwrap(), "<value><string>&lt;xml&gt;&amp;nbsp;string</string></value>");
    }

    #[test]
    fn escapes_struct_member_names() {
        let mut map: BTreeMap<String, Value> = BTreeMap::new();
        map.insert("x&<x".to_string(), Value::from(true));

        assert_eq!(xml(&Value::Struct(map), true),
            "<struct>\n  <member><name>x&amp;&lt;x</name><value><boolean>1</boolean></value></member>\n</struct>");
    }

    #[test]
    fn writes_untyped_scalars() {
        assert_eq!(xml(&Value::from(42), false), "42");
        assert_eq!(xml(&Value::from(-7i64), false), "-7");
        assert_eq!(xml(&Value::from(1.5), false), "1.5");
        assert_eq!(xml(&Value::from("a<b"), false), "a&lt;b");

        assert_eq!(xml(&Value::from(42), true), "<int>42</int>");
        assert_eq!(xml(&Value::from(-7i64), true), "<i8>-7</i8>");
        assert_eq!(xml(&Value::from(1.5), true), "<double>1.5</double>");
    }

    #[test]
    fn always_tags_booleans_binary_and_dates() {
        let date_time = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();

        for &typed in &[true, false] {
            assert_eq!(xml(&Value::from(false), typed), "<boolean>0</boolean>");
            assert_eq!(xml(&Value::from(&b"hello"[..]), typed), "<base64>aGVsbG8=</base64>");
            assert_eq!(xml(&Value::from(date_time), typed),
                "<dateTime.iso8601>2006-01-02T15:04:05+00:00</dateTime.iso8601>");
        }
    }

    #[test]
    fn types_array_elements_even_when_untyped() {
        let array = Value::Array(vec![Value::from(1), Value::from("two")]);

        assert_eq!(xml(&array, false),
            "<array><data>\n  <value><int>1</int></value>\n  <value><string>two</string></value>\n</data></array>\n");
    }

    #[test]
    fn compares_dates_by_instant() {
        let utc = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        let shifted = utc.with_timezone(&FixedOffset::west_opt(7 * 3600).unwrap());

        assert_eq!(Value::from(utc), Value::from(shifted));
    }

    #[test]
    fn accessors() {
        let mut map = BTreeMap::new();
        map.insert("answer".to_string(), Value::from(42));
        let value = Value::Struct(map);

        assert_eq!(value.get("answer").and_then(Value::as_i32), Some(42));
        assert_eq!(value.get("answer").and_then(Value::as_i64), Some(42));
        assert_eq!(value.get("question"), None);
        assert_eq!(Value::from(42).get("answer"), None);
        assert_eq!(Value::Int64(1 << 40).as_i32(), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(vec![1u8, 2]).as_bytes(), Some(&[1u8, 2][..]));
    }
}
