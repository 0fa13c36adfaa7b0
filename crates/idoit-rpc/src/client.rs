//! Request sequencing for the i-doit JSON-RPC endpoint.
//!
//! [`RpcClient`] owns the transport, the API key and the request counter.
//! Every call goes through [`RpcClient::call`], which builds a fresh
//! envelope, stamps it with the next sequence id and sends it.

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{LANGUAGE, Request};
use crate::transport::{Auth, HttpTransport};

/// Low-level JSON-RPC caller shared by every session operation
pub struct RpcClient {
    transport: HttpTransport,
    api_key: String,
    next_id: u64,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("url", &self.transport.url().as_str())
            .field("api_key", &"<redacted>")
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl RpcClient {
    #[must_use]
    pub fn new(transport: HttpTransport, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            next_id: 0,
        }
    }

    /// Sequence id the next request will carry
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    #[must_use]
    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Merge call-specific parameters over the `apikey`/`language` base.
    fn params(&self, extra: Map<String, Value>) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("apikey".to_string(), json!(self.api_key));
        params.insert("language".to_string(), json!(LANGUAGE));
        params.extend(extra);
        params
    }

    /// Send one JSON-RPC call and return its `result`.
    ///
    /// The sequence counter advances before the request is sent, so it moves
    /// exactly once per call whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the transport error for non-2xx or connection failures,
    /// `Error::Rpc` if the response carries a JSON-RPC error object, and
    /// `Error::UnexpectedResponse` if it carries neither result nor error.
    pub async fn call(
        &mut self,
        method: &str,
        params: Map<String, Value>,
        auth: Auth<'_>,
    ) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = Request::new(method, self.params(params), id.into());
        debug!(method, id, "Sending JSON-RPC request");

        let response = self.transport.send(&request, auth).await?;

        if let Some(error) = response.error {
            warn!(method, id, code = error.code, "JSON-RPC error: {}", error.message);
            return Err(error.into());
        }

        response
            .result
            .ok_or_else(|| Error::UnexpectedResponse(format!("{method} returned no result")))
    }
}
