use crate::Request;

use std::error::Error;
use std::io::Read;

/// Request and response transport abstraction.
///
/// The `Transport` trait provides a way to send a `Request` to a server and to receive the
/// corresponding response. A `Transport` implementor is passed to [`Request::call`] in order to use
/// it to perform that request.
///
/// The most commonly used transport is simple HTTP: If the `http` feature is enabled (it is by
/// default), the blocking reqwest `RequestBuilder` will implement this trait and send the XML-RPC
/// [`Request`] via HTTP.
///
/// You can implement this trait for your own types if you want to customize how requests are sent.
/// You can modify HTTP headers or wrap requests in a completely different protocol.
pub trait Transport {
    /// The response stream returned by `transmit`.
    type Stream: Read;

    /// Transmits an XML-RPC request and returns the server's response.
    ///
    /// The response is returned as a `Self::Stream` - some type implementing the `Read` trait. The
    /// library will read all of the data and parse it as a response. It must be UTF-8 encoded XML,
    /// otherwise the call will fail.
    ///
    /// # Errors
    ///
    /// If a transport error occurs, it should be returned as a boxed error - the library will then
    /// return an appropriate [`Error`] to the caller.
    ///
    /// [`Error`]: crate::Error
    fn transmit(self, request: &Request) -> Result<Self::Stream, Box<dyn Error + Send + Sync>>;
}

/// Provides helpers for implementing custom `Transport`s using reqwest.
///
/// This module will be disabled if the `http` feature is not enabled.
///
/// The default [`Transport`] implementation for `RequestBuilder` looks roughly like
/// this:
///
/// ```notrust
/// // serialize request into `body` (a `Vec<u8>`)
///
/// let builder = build_headers(builder, body.len());
///
/// // send `body` using `builder` and get response
///
/// check_response(&response)?;
/// ```
///
/// From this, you can build your own custom transports.
#[cfg(feature = "http")]
pub mod http {
    use crate::error::{Error as RequestError, RequestErrorKind};
    use crate::{Request, Transport, Value};

    use log::{debug, trace};
    use mime::Mime;
    use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
    use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};

    use std::error::Error;

    /// Appends all HTTP headers required by the XML-RPC specification to the `RequestBuilder`.
    ///
    /// More specifically, the following headers are set:
    ///
    /// ```notrust
    /// User-Agent: Rust xmlrpc-codec
    /// Content-Type: text/xml; charset=utf-8
    /// Content-Length: $body_len
    /// ```
    pub fn build_headers(builder: RequestBuilder, body_len: u64) -> RequestBuilder {
        // NB: The `Host` header is also required, but reqwest adds it automatically, since
        // HTTP/1.1 requires it.
        builder
            .header(USER_AGENT, "Rust xmlrpc-codec")
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header(CONTENT_LENGTH, body_len)
    }

    /// Checks that a reqwest `Response` has a status code indicating success and carries XML.
    ///
    /// A missing `Content-Type` header is tolerated; any other type than `text/xml` is rejected.
    pub fn check_response(response: &Response) -> Result<(), Box<dyn Error + Send + Sync>> {
        // This is essentially an open-coded version of `Response::error_for_status` that does not
        // consume the response.
        if response.status().is_client_error() || response.status().is_server_error() {
            return Err(format!("server response indicates error: {}", response.status()).into());
        }

        if let Some(content) = response.headers().get(CONTENT_TYPE) {
            let mime: Mime = content.to_str()?.parse()?;
            if mime.type_() != mime::TEXT || mime.subtype() != mime::XML {
                return Err(format!("expected Content-Type 'text/xml', got '{}'", mime.essence_str()).into());
            }
        }

        Ok(())
    }

    /// Use a `RequestBuilder` as the transport.
    ///
    /// The request will be sent as specified in the XML-RPC specification: A default `User-Agent`
    /// will be set, along with the correct `Content-Type` and `Content-Length`.
    impl Transport for RequestBuilder {
        type Stream = Response;

        fn transmit(self, request: &Request) -> Result<Self::Stream, Box<dyn Error + Send + Sync>> {
            let mut body = Vec::new();
            request.write_as_xml(&mut body)?;
            trace!("request body: {}", String::from_utf8_lossy(&body));

            let response = build_headers(self, body.len() as u64)
                .body(body)
                .send()?;
            debug!("'{}' answered with {}", request.name(), response.status());

            check_response(&response)?;

            Ok(response)
        }
    }

    /// An XML-RPC endpoint reachable over HTTP(S).
    #[derive(Debug, Clone)]
    pub struct Client {
        url: String,
        http: HttpClient,
        credentials: Option<(String, String)>,
    }

    impl Client {
        /// Creates a client that posts calls to `url`.
        ///
        /// If `insecure` is set, TLS certificates are not verified. This needs the `tls` feature;
        /// without it the flag has no effect.
        pub fn new(url: &str, insecure: bool) -> Result<Self, RequestError> {
            let builder = HttpClient::builder();
            #[cfg(feature = "tls")]
            let builder = builder.danger_accept_invalid_certs(insecure);
            #[cfg(not(feature = "tls"))]
            {
                if insecure {
                    log::warn!("built without TLS support, ignoring request to skip certificate checks");
                }
            }

            let http = builder.build()
                .map_err(|e| RequestErrorKind::TransportError(Box::new(e)))?;

            Ok(Client {
                url: url.to_string(),
                http,
                credentials: None,
            })
        }

        /// Sends HTTP basic authentication with every call.
        pub fn with_basic_auth<U: Into<String>, P: Into<String>>(mut self, user: U, password: P) -> Self {
            self.credentials = Some((user.into(), password.into()));
            self
        }

        pub fn url(&self) -> &str {
            &self.url
        }

        /// Calls the remote procedure `name` and returns the response parameters.
        ///
        /// # Errors
        ///
        /// Transport and decoding failures are returned as errors, and so is a `<fault>` response
        /// (see [`Error::fault`](crate::Error::fault)).
        pub fn call(&self, name: &str, args: &[Value]) -> Result<Vec<Value>, RequestError> {
            let request = args.iter().cloned().fold(Request::new(name), Request::arg);

            debug!("calling '{}' at {}", name, self.url);
            let mut builder = self.http.post(&self.url);
            if let Some((ref user, ref password)) = self.credentials {
                builder = builder.basic_auth(user, Some(password));
            }

            request.call(builder)
        }
    }

}
