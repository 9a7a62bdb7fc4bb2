use crate::envelope::{marshal, unmarshal, Argument, Message};
use crate::error::{EncodeError, Error, RequestErrorKind};
use crate::transport::Transport;
use crate::Value;

use std::io::Write;

/// A request to call a procedure.
#[derive(Clone, Debug)]
pub struct Request<'a> {
    name: &'a str,
    args: Vec<Argument>,
}

impl<'a> Request<'a> {
    /// Creates a new request to call a function named `name`.
    ///
    /// By default, no arguments are passed. Use the `arg` method to append arguments.
    pub fn new(name: &'a str) -> Self {
        Request {
            name,
            args: Vec::new(),
        }
    }

    /// Appends an argument to be passed to the current list of arguments.
    pub fn arg<T: Into<Argument>>(mut self, value: T) -> Self {
        self.args.push(value.into());
        self
    }

    /// Returns the name of the called procedure.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Performs the request using a [`Transport`].
    ///
    /// If you want to send the request using an HTTP POST request, you can also use [`call_url`],
    /// which creates a suitable [`Transport`] internally.
    ///
    /// # Errors
    ///
    /// Any errors that occur while sending the request using the [`Transport`] will be returned to
    /// the caller. Additionally, if the response is malformed (invalid XML), or indicates that the
    /// method call failed, an error will also be returned.
    ///
    /// [`call_url`]: #method.call_url
    pub fn call<T: Transport>(&self, transport: T) -> Result<Vec<Value>, Error> {
        let reader = transport.transmit(self)
            .map_err(RequestErrorKind::TransportError)?;

        match unmarshal(reader).map_err(RequestErrorKind::ParseError)? {
            Message::Response(response) => Ok(response.map_err(RequestErrorKind::Fault)?),
            Message::Call(call) => Err(RequestErrorKind::NotAResponse(call.name).into()),
        }
    }

    /// Performs the request on a URL.
    ///
    /// You can pass a `&str` or an already parsed reqwest URL.
    ///
    /// This is a convenience method that will internally create a new blocking reqwest `Client`
    /// and send an HTTP POST request to the given URL.
    ///
    /// This method is only available when the `http` feature is enabled (this is the default).
    ///
    /// # Errors
    ///
    /// Since this is just a convenience wrapper around [`Request::call`], the same error conditions
    /// apply.
    #[cfg(feature = "http")]
    pub fn call_url<U: reqwest::IntoUrl>(&self, url: U) -> Result<Vec<Value>, Error> {
        self.call(reqwest::blocking::Client::new().post(url))
    }

    /// Formats this `Request` as a UTF-8 encoded `<methodCall>` document.
    ///
    /// # Errors
    ///
    /// Any errors reported by the writer will be propagated to the caller. If the writer never
    /// returns an error, neither will this method.
    pub fn write_as_xml<W: Write>(&self, fmt: &mut W) -> Result<(), EncodeError> {
        marshal(fmt, self.name, &self.args)
    }
}
