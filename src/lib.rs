//! An XML-RPC codec in Rust.
//!
//! The `xmlrpc-codec` crate converts between the [`Value`] model and the [XML-RPC][spec] wire
//! format. [`marshal`] writes `<methodCall>` and `<methodResponse>` documents (including `<fault>`
//! responses), and [`unmarshal`] reads them back with an incremental parser.
//!
//! ```
//! use xmlrpc_codec::{marshal, unmarshal, Argument, Message, Value};
//!
//! let mut body = Vec::new();
//! marshal(&mut body, "pow", &[Argument::from(2), Argument::from(8)]).unwrap();
//!
//! match unmarshal(&body[..]).unwrap() {
//!     Message::Call(call) => assert_eq!(call.params, vec![Value::Int(2), Value::Int(8)]),
//!     Message::Response(_) => unreachable!(),
//! }
//! ```
//!
//! With the `http` feature (enabled by default), [`Request`] can be sent over HTTP, and
//! [`RTorrent`] wraps the global information calls of an rTorrent instance.
//!
//! [spec]: http://xmlrpc.scripting.com/spec.html

#![doc(html_root_url = "https://docs.rs/xmlrpc-codec/0.1.0")]
#![warn(missing_debug_implementations)]

mod envelope;
mod error;
mod fault;
mod parser;
mod request;
#[cfg(feature = "http")]
mod rtorrent;
mod ser;
mod transport;
mod utils;
mod value;

pub use crate::envelope::{marshal, unmarshal, Argument, Message, MethodCall, Response};
pub use crate::error::{EncodeError, Error, Mismatch, ParseError};
pub use crate::fault::{Fault, UNKNOWN_ERROR_CODE};
pub use crate::parser::parse_value;
pub use crate::request::Request;
pub use crate::ser::to_value;
pub use crate::transport::Transport;
pub use crate::utils::{escape_xml, unescape_xml};
pub use crate::value::Value;

#[cfg(feature = "http")]
pub use crate::rtorrent::RTorrent;
#[cfg(feature = "http")]
pub use crate::transport::http;
