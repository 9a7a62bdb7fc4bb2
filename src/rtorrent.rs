//! Typed access to the global information of an rTorrent instance.

use crate::error::{Error, RequestErrorKind};
use crate::http::Client;
use crate::Value;

/// A remote rTorrent instance, reachable through its XML-RPC endpoint (usually `/RPC2`).
#[derive(Debug, Clone)]
pub struct RTorrent {
    client: Client,
}

impl RTorrent {
    /// Connects to the endpoint at `addr`.
    ///
    /// Pass `true` for `insecure` to turn off certificate verification.
    pub fn new(addr: &str, insecure: bool) -> Result<Self, Error> {
        Ok(RTorrent {
            client: Client::new(addr, insecure)?,
        })
    }

    /// Uses an already configured client, for example one with credentials.
    pub fn with_client(client: Client) -> Self {
        RTorrent { client }
    }

    /// Returns the IP address this instance reports to trackers.
    pub fn ip(&self) -> Result<String, Error> {
        string_result(self.client.call("get_ip", &[])?)
    }

    /// Returns the session name of this instance.
    pub fn name(&self) -> Result<String, Error> {
        string_result(self.client.call("get_name", &[])?)
    }

    /// Returns the total number of bytes downloaded.
    pub fn down_total(&self) -> Result<i64, Error> {
        integer_result(self.client.call("get_down_total", &[])?)
    }

    /// Returns the total number of bytes uploaded.
    pub fn up_total(&self) -> Result<i64, Error> {
        integer_result(self.client.call("get_up_total", &[])?)
    }
}

fn first_result(params: Vec<Value>) -> Result<Value, Error> {
    params.into_iter().next().ok_or_else(|| RequestErrorKind::NoResult.into())
}

fn string_result(params: Vec<Value>) -> Result<String, Error> {
    match first_result(params)? {
        Value::String(s) => Ok(s),
        found => Err(RequestErrorKind::UnexpectedResult { expected: "a string", found }.into()),
    }
}

fn integer_result(params: Vec<Value>) -> Result<i64, Error> {
    let value = first_result(params)?;
    value.as_i64().ok_or_else(|| RequestErrorKind::UnexpectedResult { expected: "an integer", found: value }.into())
}
