use crate::utils::escape_xml;
use crate::Value;

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io::{self, Write};

/// Fault code used when an arbitrary error is turned into a `Fault`.
pub const UNKNOWN_ERROR_CODE: i32 = -1;

/// A `<fault>` response, indicating that a request failed.
///
/// The XML-RPC specification requires that a `<faultCode>` and `<faultString>` is returned in the
/// `<fault>` case, further describing the error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    code: i32,
    message: String,
}

impl Fault {
    /// Creates a new `Fault` from an error code and a message.
    pub fn new<S: Into<String>>(code: i32, message: S) -> Fault {
        Fault {
            code,
            message: message.into(),
        }
    }

    /// Turns any error into a `Fault` carrying [`UNKNOWN_ERROR_CODE`] and the error's message.
    pub fn from_error<E: Error + ?Sized>(err: &E) -> Fault {
        Fault::new(UNKNOWN_ERROR_CODE, err.to_string())
    }

    /// Returns the fault code.
    ///
    /// The meaning of this code is not specified by XML-RPC and depends on the service you are
    /// implementing/using.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Returns the `faultString` sent along with the fault.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Creates a `Fault` from a `Value`.
    ///
    /// The `Value` must be a `Value::Struct` with an integer `faultCode` and a string
    /// `faultString` member. Additional members are ignored.
    ///
    /// Returns `None` if the value isn't a valid `Fault`.
    pub fn from_value(value: &Value) -> Option<Self> {
        Fault::parse(value).ok()
    }

    /// Like `from_value`, but says what is wrong with the value.
    pub(crate) fn parse(value: &Value) -> Result<Self, String> {
        let map = match *value {
            Value::Struct(ref map) => map,
            ref other => return Err(format!("expected a struct, found {:?}", other)),
        };

        let code = match map.get("faultCode") {
            Some(&Value::Int(code)) => code,
            Some(&Value::Int64(code)) => i32::try_from(code)
                .map_err(|_| format!("faultCode {} is out of range", code))?,
            Some(other) => return Err(format!("faultCode is not an integer: {:?}", other)),
            None => return Err("missing faultCode".to_string()),
        };

        match map.get("faultString") {
            Some(&Value::String(ref message)) => Ok(Fault::new(code, message.as_str())),
            Some(other) => Err(format!("faultString is not a string: {:?}", other)),
            None => Err("missing faultString".to_string()),
        }
    }

    /// Turns this `Fault` into an equivalent `Value`.
    ///
    /// The returned value can be parsed back into a `Fault` using `Fault::from_value`.
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("faultCode".to_string(), Value::from(self.code));
        map.insert("faultString".to_string(), Value::from(self.message.as_str()));

        Value::Struct(map)
    }

    /// Formats this `Fault` as an XML `<fault>` element.
    pub fn write_as_xml<W: Write>(&self, fmt: &mut W) -> io::Result<()> {
        write!(
            fmt,
            "<fault><value><struct>\
             <member><name>faultCode</name><value><int>{}</int></value></member>\
             <member><name>faultString</name><value><string>{}</string></value></member>\
             </struct></value></fault>",
            self.code,
            escape_xml(&self.message)
        )
    }
}

impl Display for Fault {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl Error for Fault {}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str;

    #[test]
    fn fault_roundtrip() {
        let input = Fault::new(-123456, "The Bald Lazy House Jumps Over The Hyperactive Kitten");

        assert_eq!(Fault::from_value(&input.to_value()), Some(input));
    }

    #[test]
    fn writes_fault_element() {
        let mut output: Vec<u8> = Vec::new();
        Fault::new(7, "bad <input>").write_as_xml(&mut output).unwrap();

        assert_eq!(str::from_utf8(&output).unwrap(),
            "<fault><value><struct>\
             <member><name>faultCode</name><value><int>7</int></value></member>\
             <member><name>faultString</name><value><string>bad &lt;input&gt;</string></value></member>\
             </struct></value></fault>");
    }

    #[test]
    fn projects_errors() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let fault = Fault::from_error(&err);

        assert_eq!(fault.code(), UNKNOWN_ERROR_CODE);
        assert_eq!(fault.message(), "disk on fire");
    }

    #[test]
    fn ignores_additional_fault_fields() {
        let mut value = Fault::new(4, "Too many parameters.").to_value();
        if let Value::Struct(ref mut map) = value {
            map.insert("unnecessaryParameter".to_string(), Value::from("x"));
        }

        assert_eq!(Fault::from_value(&value), Some(Fault::new(4, "Too many parameters.")));
    }

    #[test]
    fn accepts_64bit_codes_in_range() {
        let mut map = BTreeMap::new();
        map.insert("faultCode".to_string(), Value::Int64(-32600));
        map.insert("faultString".to_string(), Value::from("invalid request"));
        assert_eq!(Fault::from_value(&Value::Struct(map.clone())),
            Some(Fault::new(-32600, "invalid request")));

        map.insert("faultCode".to_string(), Value::Int64(1 << 40));
        assert!(Fault::parse(&Value::Struct(map)).unwrap_err().contains("out of range"));
    }

    #[test]
    fn rejects_mistyped_members() {
        let mut map = BTreeMap::new();
        map.insert("faultCode".to_string(), Value::from("I'm not an int!"));
        map.insert("faultString".to_string(), Value::from("Too many parameters."));
        assert_eq!(Fault::from_value(&Value::Struct(map.clone())), None);

        map.insert("faultCode".to_string(), Value::from(4));
        map.insert("faultString".to_string(), Value::Base64(b"I'm not a string!".to_vec()));
        assert_eq!(Fault::from_value(&Value::Struct(map)), None);

        assert_eq!(Fault::from_value(&Value::from(4)), None);
    }
}
