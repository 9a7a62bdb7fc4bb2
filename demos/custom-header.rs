//! Sends requests through a custom `Transport` that attaches a session cookie, as needed by
//! rTorrent front-ends that sit behind a login page.
//!
//! Run with `cargo run --example custom-header -- http://myrtorrent/RPC2 SESSION=123abc`.

use xmlrpc_codec::http::{build_headers, check_response};
use xmlrpc_codec::{Request, Transport};

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::COOKIE;

use std::env;
use std::error::Error;

struct CookieTransport<'a> {
    builder: RequestBuilder,
    cookie: &'a str,
}

impl<'a> Transport for CookieTransport<'a> {
    type Stream = Response;

    fn transmit(self, request: &Request) -> Result<Response, Box<dyn Error + Send + Sync>> {
        let mut body = Vec::new();
        request.write_as_xml(&mut body)?;

        let response = build_headers(self.builder, body.len() as u64)
            .header(COOKIE, self.cookie)
            .body(body)
            .send()?;
        check_response(&response)?;

        Ok(response)
    }
}

fn main() {
    let mut args = env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "http://myrtorrent/RPC2".to_string());
    let cookie = args.next().unwrap_or_else(|| "SESSION=123abc".to_string());

    let client = Client::new();
    for method in &["get_name", "get_ip"] {
        let transport = CookieTransport {
            builder: client.post(&url),
            cookie: &cookie,
        };

        match Request::new(method).call(transport) {
            Ok(params) => println!("{}: {:?}", method, params),
            Err(e) => println!("{} failed: {}", method, e),
        }
    }
}
