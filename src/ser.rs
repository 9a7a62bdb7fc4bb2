//! Projection of `Serialize` types into `Value`s.
//!
//! This is how structured Rust data crosses the wire: the `Serialize` impl describes the type as
//! a list of named fields (structs), elements (sequences) or entries (maps), and each of those
//! becomes a member of a `<struct>` or an element of an `<array>`.
//!
//! Field-level metadata is supplied with serde's attributes: `#[serde(rename = "...")]` picks the
//! member name used on the wire, and `#[serde(skip)]` keeps a field off the wire.
//!
//! Enum variants carrying data are wrapped in a single-member struct keyed by the variant name,
//! the way serde_json represents them.

#![allow(missing_debug_implementations)]

use crate::error::EncodeError;
use crate::Value;

use serde::ser::{self, Impossible, Serialize};

use std::collections::BTreeMap;
use std::fmt::Display;

type Result<T> = ::std::result::Result<T, EncodeError>;

impl ser::Error for EncodeError {
    fn custom<T: Display>(msg: T) -> Self {
        EncodeError::Message(msg.to_string())
    }
}

fn unsupported<T: Display>(what: T) -> EncodeError {
    EncodeError::UnsupportedType(what.to_string())
}

/// Wraps `value` as `{ variant: value }`.
fn tag_variant(variant: &str, value: Value) -> Value {
    let mut map = BTreeMap::new();
    map.insert(variant.to_string(), value);
    Value::Struct(map)
}

/// Converts any `Serialize` type into a `Value`.
///
/// # Errors
///
/// Returns [`EncodeError::UnsupportedType`] if `value` contains anything without an XML-RPC
/// representation: `()`, unit structs, `None`, `u64`/`u128`/`i128`, or maps with non-string keys.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = EncodeError;
    type SerializeSeq = ArrayBuilder;
    type SerializeTuple = ArrayBuilder;
    type SerializeTupleStruct = ArrayBuilder;
    type SerializeTupleVariant = ArrayBuilder;
    type SerializeMap = StructBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = StructBuilder;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Int(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Int64(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        // does not always fit in `<int>`
        Ok(Value::Int64(v.into()))
    }

    fn serialize_u64(self, _v: u64) -> Result<Value> {
        // the upper half fits in no XML-RPC integer, so all of them are rejected up front
        Err(unsupported("u64 (please use a smaller integer type)"))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Double(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.into()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.into()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Base64(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Err(unsupported("absent value (None)"))
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Err(unsupported("unit value"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value> {
        Err(unsupported(format_args!("unit struct `{}`", name)))
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str) -> Result<Value> {
        Ok(Value::String(variant.into()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(self, _name: &'static str, _index: u32, variant: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tag_variant(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<ArrayBuilder> {
        Ok(ArrayBuilder::new(None, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<ArrayBuilder> {
        Ok(ArrayBuilder::new(None, len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<ArrayBuilder> {
        Ok(ArrayBuilder::new(None, len))
    }

    fn serialize_tuple_variant(self, _name: &'static str, _index: u32, variant: &'static str, len: usize) -> Result<ArrayBuilder> {
        Ok(ArrayBuilder::new(Some(variant), len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<StructBuilder> {
        Ok(StructBuilder::new(None))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<StructBuilder> {
        Ok(StructBuilder::new(None))
    }

    fn serialize_struct_variant(self, _name: &'static str, _index: u32, variant: &'static str, _len: usize) -> Result<StructBuilder> {
        Ok(StructBuilder::new(Some(variant)))
    }
}

/// Collects the elements of sequences, tuples and tuple variants into an `<array>`.
struct ArrayBuilder {
    variant: Option<&'static str>,
    elements: Vec<Value>,
}

impl ArrayBuilder {
    fn new(variant: Option<&'static str>, len: usize) -> Self {
        ArrayBuilder {
            variant,
            elements: Vec::with_capacity(len),
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.elements.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Result<Value> {
        let array = Value::Array(self.elements);
        Ok(match self.variant {
            Some(variant) => tag_variant(variant, array),
            None => array,
        })
    }
}

impl ser::SerializeSeq for ArrayBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl ser::SerializeTuple for ArrayBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for ArrayBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for ArrayBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

/// Collects struct fields, struct variant fields and map entries into a `<struct>`.
///
/// A repeated name replaces the earlier member.
struct StructBuilder {
    variant: Option<&'static str>,
    pending_key: Option<String>,
    members: BTreeMap<String, Value>,
}

impl StructBuilder {
    fn new(variant: Option<&'static str>) -> Self {
        StructBuilder {
            variant,
            pending_key: None,
            members: BTreeMap::new(),
        }
    }

    fn insert<T: ?Sized + Serialize>(&mut self, name: &str, value: &T) -> Result<()> {
        self.members.insert(name.to_string(), to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Result<Value> {
        if let Some(key) = self.pending_key {
            return Err(ser::Error::custom(format_args!("no value for key {}", key)));
        }

        let value = Value::Struct(self.members);
        Ok(match self.variant {
            Some(variant) => tag_variant(variant, value),
            None => value,
        })
    }
}

impl ser::SerializeMap for StructBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        if let Some(ref pending) = self.pending_key {
            return Err(ser::Error::custom(format_args!("key {} has no value", pending)));
        }

        self.pending_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self.pending_key.take()
            .ok_or_else(|| <EncodeError as ser::Error>::custom("map value without a key"))?;
        self.insert(&key, value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, name: &'static str, value: &T) -> Result<()> {
        self.insert(name, value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for StructBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, name: &'static str, value: &T) -> Result<()> {
        self.insert(name, value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

/// Serializes map keys. Struct member names are strings, so that's all this accepts.
struct KeySerializer;

fn key_must_be_string(found: &str) -> EncodeError {
    unsupported(format_args!("{} as struct member name (member names must be strings)", found))
}

macro_rules! reject_keys {
    ($($method:ident($($arg:ty),*) -> $ret:ty = $what:expr;)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<$ret> {
                Err(key_must_be_string($what))
            }
        )*
    };
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = EncodeError;
    type SerializeSeq = Impossible<String, EncodeError>;
    type SerializeTuple = Impossible<String, EncodeError>;
    type SerializeTupleStruct = Impossible<String, EncodeError>;
    type SerializeTupleVariant = Impossible<String, EncodeError>;
    type SerializeMap = Impossible<String, EncodeError>;
    type SerializeStruct = Impossible<String, EncodeError>;
    type SerializeStructVariant = Impossible<String, EncodeError>;

    reject_keys! {
        serialize_bool(bool) -> String = "bool";
        serialize_i8(i8) -> String = "i8";
        serialize_i16(i16) -> String = "i16";
        serialize_i32(i32) -> String = "i32";
        serialize_i64(i64) -> String = "i64";
        serialize_u8(u8) -> String = "u8";
        serialize_u16(u16) -> String = "u16";
        serialize_u32(u32) -> String = "u32";
        serialize_u64(u64) -> String = "u64";
        serialize_f32(f32) -> String = "f32";
        serialize_f64(f64) -> String = "f64";
        serialize_bytes(&[u8]) -> String = "bytes";
        serialize_none() -> String = "None";
        serialize_unit() -> String = "()";
        serialize_unit_struct(&'static str) -> String = "unit struct";
        serialize_seq(Option<usize>) -> Self::SerializeSeq = "sequence";
        serialize_tuple(usize) -> Self::SerializeTuple = "tuple";
        serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct = "tuple struct";
        serialize_tuple_variant(&'static str, u32, &'static str, usize) -> Self::SerializeTupleVariant = "tuple variant";
        serialize_map(Option<usize>) -> Self::SerializeMap = "map";
        serialize_struct(&'static str, usize) -> Self::SerializeStruct = "struct";
        serialize_struct_variant(&'static str, u32, &'static str, usize) -> Self::SerializeStructVariant = "struct variant";
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_some<T>(self, _value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(key_must_be_string("Some"))
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(self, _name: &'static str, _index: u32, variant: &'static str, _value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(key_must_be_string(variant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Serialize;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Torrent {
        name: String,
        #[serde(rename = "d.size_bytes")]
        size: i64,
        complete: bool,
        #[serde(skip)]
        #[allow(dead_code)]
        session_key: String,
        files: Vec<String>,
    }

    #[derive(Serialize)]
    enum State {
        Stopped,
        Seeding(i32),
        Checking(i32, bool),
        Leeching { peers: i32 },
    }

    #[derive(Serialize)]
    struct Hash(String);

    fn member<'a>(value: &'a Value, name: &str) -> &'a Value {
        value.get(name).unwrap_or_else(|| panic!("missing member {}", name))
    }

    #[test]
    fn serializes_structs_with_wire_names() {
        let value = to_value(&Torrent {
            name: "ubuntu.iso".into(),
            size: 3 << 30,
            complete: true,
            session_key: "secret".into(),
            files: vec!["a".into(), "b".into()],
        }).unwrap();

        assert_eq!(member(&value, "name"), &Value::from("ubuntu.iso"));
        assert_eq!(member(&value, "d.size_bytes"), &Value::Int64(3 << 30));
        assert_eq!(member(&value, "complete"), &Value::Bool(true));
        assert_eq!(member(&value, "files"), &Value::Array(vec![Value::from("a"), Value::from("b")]));
        assert_eq!(value.get("size"), None);
        assert_eq!(value.get("session_key"), None);
        assert_eq!(value.as_struct().unwrap().len(), 4);
    }

    #[test]
    fn serializes_enums() {
        assert_eq!(to_value(&State::Stopped).unwrap(), Value::from("Stopped"));
        assert_eq!(member(&to_value(&State::Seeding(3)).unwrap(), "Seeding"), &Value::Int(3));
        assert_eq!(member(&to_value(&State::Checking(1, false)).unwrap(), "Checking"),
            &Value::Array(vec![Value::Int(1), Value::Bool(false)]));
        assert_eq!(
            member(member(&to_value(&State::Leeching { peers: 9 }).unwrap(), "Leeching"), "peers"),
            &Value::Int(9)
        );
    }

    #[test]
    fn unwraps_newtypes_and_options() {
        assert_eq!(to_value(&Hash("abc".into())).unwrap(), Value::from("abc"));
        assert_eq!(to_value(&Some(4)).unwrap(), Value::Int(4));
        assert_eq!(to_value(&(1, "x")).unwrap(), Value::Array(vec![Value::Int(1), Value::from("x")]));
    }

    #[test]
    fn maps_integers_to_fitting_types() {
        assert_eq!(to_value(&5u8).unwrap(), Value::Int(5));
        assert_eq!(to_value(&-5i16).unwrap(), Value::Int(-5));
        assert_eq!(to_value(&u32::MAX).unwrap(), Value::Int64(u32::MAX.into()));
        assert_eq!(to_value(&(1i64 << 40)).unwrap(), Value::Int64(1 << 40));
    }

    #[test]
    fn serializes_string_keyed_maps() {
        let mut map = HashMap::new();
        map.insert("up", 1);
        map.insert("down", 2);

        let value = to_value(&map).unwrap();
        assert_eq!(member(&value, "up"), &Value::Int(1));
        assert_eq!(member(&value, "down"), &Value::Int(2));
    }

    #[test]
    fn rejects_values_without_representation() {
        fn unsupported<T: Serialize>(value: T) -> bool {
            matches!(to_value(&value), Err(EncodeError::UnsupportedType(_)))
        }

        assert!(unsupported(()));
        assert!(unsupported(None::<i32>));
        assert!(unsupported(7u64));
        assert!(unsupported(vec![Some(1), None]));

        let mut map = HashMap::new();
        map.insert(1, "one");
        assert!(unsupported(map));
    }

    #[test]
    fn describes_the_offending_value() {
        let err = to_value(&7u64).unwrap_err();
        assert_eq!(err.to_string(), "unsupported type: u64 (please use a smaller integer type)");

        let mut map = HashMap::new();
        map.insert(true, 1);
        assert_eq!(to_value(&map).unwrap_err().to_string(),
            "unsupported type: bool as struct member name (member names must be strings)");
    }
}
