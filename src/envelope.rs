//! `<methodCall>` and `<methodResponse>` documents.

use crate::error::{EncodeError, ParseError};
use crate::parser::Parser;
use crate::ser::to_value;
use crate::utils::escape_xml;
use crate::{Fault, Value};

use log::trace;
use serde::Serialize;

use std::error::Error;
use std::io::{Read, Write};

/// A decoded response: the returned parameters, or the `<fault>` sent by the server.
pub type Response = Result<Vec<Value>, Fault>;

/// A parameter passed to [`marshal`].
#[derive(Clone, Debug, PartialEq)]
pub enum Argument {
    Value(Value),
    /// A fault. As the first argument of a response, this turns the whole response into a
    /// `<fault>` response.
    Fault(Fault),
}

impl Argument {
    /// Projects any error into a fault argument with code [`UNKNOWN_ERROR_CODE`].
    ///
    /// [`UNKNOWN_ERROR_CODE`]: crate::UNKNOWN_ERROR_CODE
    pub fn from_error<E: Error + ?Sized>(err: &E) -> Self {
        Argument::Fault(Fault::from_error(err))
    }

    /// Converts any `Serialize` type into an argument.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, EncodeError> {
        to_value(value).map(Argument::Value)
    }

    fn write_param<W: Write>(&self, w: &mut W) -> Result<(), EncodeError> {
        w.write_all(b"  <param><value>")?;
        match *self {
            Argument::Value(ref value) => value.write_xml(w, true)?,
            // anywhere but in front of a response, a fault is just a struct
            Argument::Fault(ref fault) => fault.to_value().write_xml(w, true)?,
        }
        w.write_all(b"</value></param>\n")?;
        Ok(())
    }
}

impl<T: Into<Value>> From<T> for Argument {
    fn from(value: T) -> Self {
        Argument::Value(value.into())
    }
}

impl From<Fault> for Argument {
    fn from(fault: Fault) -> Self {
        Argument::Fault(fault)
    }
}

/// A decoded `<methodCall>`.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodCall {
    pub name: String,
    pub params: Vec<Value>,
}

/// A decoded XML-RPC document.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Call(MethodCall),
    Response(Response),
}

impl Message {
    /// Returns the name of the called method if this is a `<methodCall>`.
    pub fn method_name(&self) -> Option<&str> {
        match *self {
            Message::Call(ref call) => Some(&call.name),
            Message::Response(_) => None,
        }
    }

    /// Returns the fault if this is a `<fault>` response.
    pub fn fault(&self) -> Option<&Fault> {
        match *self {
            Message::Response(Err(ref fault)) => Some(fault),
            _ => None,
        }
    }
}

/// Writes an XML-RPC document to `w`.
///
/// If `method_name` is empty, a `<methodResponse>` carrying `args` is written. If the first
/// argument is a fault, a `<fault>` response is written instead and **all other arguments are
/// ignored**. Otherwise a `<methodCall>` of `method_name` is written.
///
/// No XML declaration is emitted.
///
/// # Errors
///
/// Returns the first error reported by `w`. The document may be partially written by then.
pub fn marshal<W: Write>(w: &mut W, method_name: &str, args: &[Argument]) -> Result<(), EncodeError> {
    let close: &[u8] = if method_name.is_empty() {
        if let Some(&Argument::Fault(ref fault)) = args.first() {
            w.write_all(b"<methodResponse>")?;
            fault.write_as_xml(w)?;
            w.write_all(b"\n</methodResponse>")?;
            return Ok(());
        }

        w.write_all(b"<methodResponse><params>\n")?;
        b"</params></methodResponse>"
    } else {
        write!(w, "<methodCall><methodName>{}</methodName><params>\n", escape_xml(method_name))?;
        b"</params></methodCall>"
    };

    for arg in args {
        arg.write_param(w)?;
    }
    w.write_all(close)?;

    Ok(())
}

/// Reads an XML-RPC document from `r`.
///
/// A `<fault>` response is a successfully decoded document; it is returned as
/// `Message::Response(Err(fault))`.
///
/// # Errors
///
/// Returns an error if the document is not well-formed XML, does not follow the XML-RPC grammar,
/// contains values that can't be converted, or if reading from `r` fails.
pub fn unmarshal<R: Read>(r: R) -> Result<Message, ParseError> {
    let mut parser = Parser::new(r);

    let method_name = match parser.expect_start_of(&["methodResponse", "methodCall"])? {
        "methodCall" => Some(parser.read_text_element("methodName")?),
        _ => None,
    };
    trace!("decoding {}", match method_name {
        Some(ref name) => format!("call to '{}'", name),
        None => "response".to_string(),
    });

    let params = match method_name {
        // <params> is optional in calls
        Some(_) => {
            if parser.try_start("params")? {
                parse_params(&mut parser)?
            } else {
                Vec::new()
            }
        }
        None => match parser.expect_start_of(&["params", "fault"])? {
            "fault" => {
                let value = parser.parse_value()?;
                let fault = Fault::parse(&value).map_err(|reason| ParseError::InvalidFault { reason })?;
                parser.expect_end("fault")?;
                parser.expect_end("methodResponse")?;
                trace!("decoded fault: {}", fault);

                return Ok(Message::Response(Err(fault)));
            }
            _ => parse_params(&mut parser)?,
        },
    };

    Ok(match method_name {
        Some(name) => {
            parser.expect_end("methodCall")?;
            Message::Call(MethodCall { name, params })
        }
        None => {
            parser.expect_end("methodResponse")?;
            Message::Response(Ok(params))
        }
    })
}

/// Reads `<param>` elements up to and including `</params>`.
fn parse_params<R: Read>(parser: &mut Parser<R>) -> Result<Vec<Value>, ParseError> {
    let mut params = Vec::new();
    while parser.try_start("param")? {
        params.push(parser.parse_value()?);
        parser.expect_end("param")?;
    }
    parser.expect_end("params")?;

    trace!("decoded {} parameter(s)", params.len());
    Ok(params)
}
