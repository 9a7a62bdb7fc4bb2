//! Defines error types used by this library.

use crate::{Fault, Value};

use thiserror::Error;
use xml::common::TextPosition;
use xml::reader::{Error as XmlError, ErrorKind as XmlErrorKind};

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::io;

/// A value could not be written as XML-RPC.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value has no XML-RPC representation (for example `()`, `None` or a `u64`).
    ///
    /// Contains a description of the offending value.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A `Serialize` implementation reported an error of its own.
    #[error("{0}")]
    Message(String),

    /// Writing to the output stream failed. Some output may already have been written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The three ways a document can deviate from the XML-RPC element grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mismatch {
    /// A start element was required, but something else was found.
    ///
    /// The offending token is left for the next rule to read. Repeated productions (members of a
    /// struct, values of an array, parameters) treat this as "no more repetitions".
    ExpectedStart,
    /// An element was found, but its name is not the one the grammar requires here.
    NameMismatch,
    /// An end element was required, but something else was found.
    ExpectedEnd,
}

impl Display for Mismatch {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            Mismatch::ExpectedStart => "expected a start element",
            Mismatch::NameMismatch => "tag name mismatch",
            Mismatch::ExpectedEnd => "expected an end element",
        })
    }
}

/// Describes possible errors that can occur when parsing an XML-RPC document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Error while parsing (malformed?) XML, or while reading from the underlying stream.
    ///
    /// Use [`ParseError::io_error`] to get at the stream's own error.
    #[error("malformed XML: {0}")]
    XmlError(#[from] XmlError),

    /// The document does not follow the XML-RPC grammar at this position.
    #[error("{mismatch} at {position} (expected {expected}, found {found})")]
    UnexpectedXml {
        /// Which rule was violated.
        mismatch: Mismatch,
        /// What the grammar required, in XML notation (eg. `<params>` or `</value>`).
        expected: String,
        /// What was actually found, in XML notation.
        found: String,
        /// Where the unexpected data ends inside the XML document.
        position: TextPosition,
    },

    /// An element carried attributes. XML-RPC doesn't use any.
    #[error("unexpected XML at {position} (expected tag <{element}> without attributes)")]
    UnexpectedAttributes {
        element: String,
        position: TextPosition,
    },

    /// Could not parse the given characters as XML-RPC value.
    ///
    /// For example, `<value><int>AAA</int></value>` describes an invalid value.
    #[error("invalid value for type '{for_type}' at {position}: {found}")]
    InvalidValue {
        /// The type for which an invalid value was supplied (eg. `int` or `dateTime.iso8601`).
        for_type: &'static str,
        /// The value we encountered, as a string.
        found: String,
        /// Where the opening tag of the invalid value ends inside the XML document.
        position: TextPosition,
    },

    /// A `<fault>` did not contain an integer `faultCode` and a string `faultString`.
    #[error("malformed <fault>: {reason}")]
    InvalidFault { reason: String },
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::XmlError(XmlError::from(e))
    }
}

impl ParseError {
    /// Returns the kind of grammar violation, if this is one.
    pub fn mismatch(&self) -> Option<Mismatch> {
        match *self {
            ParseError::UnexpectedXml { mismatch, .. } => Some(mismatch),
            _ => None,
        }
    }

    /// Returns what was found instead of the expected element, if this is a grammar violation.
    pub fn found(&self) -> Option<&str> {
        match *self {
            ParseError::UnexpectedXml { ref found, .. } => Some(found),
            _ => None,
        }
    }

    /// Returns the error reported by the underlying stream, if reading from it failed.
    pub fn io_error(&self) -> Option<&io::Error> {
        match *self {
            ParseError::XmlError(ref err) => match *err.kind() {
                XmlErrorKind::Io(ref err) => Some(err),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether this error was caused by the underlying stream rather than by the document.
    pub fn is_stream_error(&self) -> bool {
        self.io_error().is_some()
    }
}

/// An error that can occur when performing an XML-RPC request.
///
/// This is either a lower-level error (for example, the transport failed), a problem with the
/// server (maybe it's not implementing XML-RPC correctly), or a `<fault>` returned by the server.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<RequestErrorKind>);

impl Error {
    /// If this `Error` was caused by the server responding with a `<fault>` response,
    /// returns the `Fault` in question.
    pub fn fault(&self) -> Option<&Fault> {
        match *self.0 {
            RequestErrorKind::Fault(ref fault) => Some(fault),
            _ => None,
        }
    }

    /// If the response could not be decoded, returns the parse error.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match *self.0 {
            RequestErrorKind::ParseError(ref err) => Some(err),
            _ => None,
        }
    }

    /// Whether sending the request or receiving the response failed.
    pub fn is_transport_error(&self) -> bool {
        matches!(*self.0, RequestErrorKind::TransportError(_))
    }
}

#[derive(Debug, Error)]
pub(crate) enum RequestErrorKind {
    /// The response could not be parsed. This can happen when the server doesn't correctly
    /// implement the XML-RPC spec.
    #[error("parse error: {0}")]
    ParseError(#[source] ParseError),

    /// A communication error originating from the transport used to perform the request.
    ///
    /// Transports encode the request themselves, so failures to write it end up here as well.
    #[error("transport error: {0}")]
    TransportError(#[source] Box<dyn StdError + Send + Sync>),

    /// The server returned a `<fault>` response, indicating that the execution of the call
    /// encountered a problem (for example, an invalid (number of) arguments was passed).
    #[error("server fault: {0}")]
    Fault(#[source] Fault),

    /// The server answered with a `<methodCall>` document instead of a response.
    #[error("expected a <methodResponse>, got a call to '{0}'")]
    NotAResponse(String),

    /// The response did not contain any parameter.
    #[error("response contains no result value")]
    NoResult,

    /// The result value has a different type than the procedure is documented to return.
    #[error("unexpected result type (expected {expected}, found {found:?})")]
    UnexpectedResult {
        expected: &'static str,
        found: Value,
    },
}

impl From<RequestErrorKind> for Error {
    fn from(kind: RequestErrorKind) -> Self {
        Error(Box::new(kind))
    }
}
