//! HTTP transport for JSON-RPC requests.
//!
//! Every call is a single POST to the endpoint URL. The login call carries
//! the operator's credentials in headers; every later call carries the
//! session identifier instead.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use tracing::error;

use crate::error::{Error, Result};
use crate::protocol::{Request, Response};

// Header names are case-insensitive; `HeaderName::from_static` requires lowercase.
pub const HEADER_USERNAME: &str = "x-rpc-auth-username";
pub const HEADER_PASSWORD: &str = "x-rpc-auth-password";
pub const HEADER_SESSION: &str = "x-rpc-auth-session";

/// How a request authenticates itself
#[derive(Clone, Copy)]
pub enum Auth<'a> {
    /// Username and password headers, used by `idoit.login` only
    Credentials {
        username: &'a str,
        password: &'a str,
    },
    /// Session header obtained from login
    Session(&'a str),
}

impl std::fmt::Debug for Auth<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Credentials { username, .. } => f
                .debug_struct("Credentials")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Auth::Session(_) => f.debug_tuple("Session").field(&"<redacted>").finish(),
        }
    }
}

impl Auth<'_> {
    fn headers(self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match self {
            Auth::Credentials { username, password } => {
                headers.insert(
                    HeaderName::from_static(HEADER_USERNAME),
                    header_value(username, "username")?,
                );
                headers.insert(
                    HeaderName::from_static(HEADER_PASSWORD),
                    header_value(password, "password")?,
                );
            }
            Auth::Session(session_id) => {
                headers.insert(
                    HeaderName::from_static(HEADER_SESSION),
                    header_value(session_id, "session id")?,
                );
            }
        }

        Ok(headers)
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::config(format!("{what} contains characters not allowed in a header")))
}

/// Timeout settings for the underlying HTTP client.
///
/// `None` leaves the HTTP client's own default in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Option<Duration>,
    pub connect: Option<Duration>,
}

/// Posts JSON-RPC envelopes to a single endpoint URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
}

impl HttpTransport {
    /// Create a transport for the given URL.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the URL does not parse or is not http(s),
    /// and `Error::Http` if the HTTP client cannot be built.
    pub fn new(url: &str, timeouts: Timeouts) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::config(format!("Invalid URL '{url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Unsupported URL scheme '{}' (expected http or https)",
                url.scheme()
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeouts.request {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = timeouts.connect {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url,
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// POST one request and decode the JSON-RPC response.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` for any non-2xx status, `Error::Http` for
    /// connection-level failures and `Error::Json` if the body is not a
    /// JSON-RPC response.
    pub async fn send(&self, request: &Request, auth: Auth<'_>) -> Result<Response> {
        let response = self
            .client
            .post(self.url.clone())
            .headers(auth.headers()?)
            .body(serde_json::to_vec(request)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                method = %request.method,
                id = %request.id,
                status = status.as_u16(),
                "JSON-RPC request failed"
            );
            return Err(Error::Transport {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
