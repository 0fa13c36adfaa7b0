//! Authenticated i-doit session.
//!
//! A [`CmdbSession`] only exists after a successful `idoit.login`, and
//! [`CmdbSession::logout`] consumes it, so a value of this type always holds
//! a live session id. Operations take `&mut self`: one call at a time, each
//! awaited to completion before the next envelope is built.
//!
//! Guarded creation ([`CmdbSession::create_object_if_absent`]) is a search
//! followed by a create. The two calls are not transactional; another client
//! can create the same title in between.

use serde_json::{Map, Value, json};
use tracing::{info, warn};

use idoit_types::{CategoryId, LoginInfo, LogoutInfo, ObjectId, ObjectType, SearchHit};

use crate::client::RpcClient;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::protocol::methods;
use crate::transport::{Auth, HttpTransport};

/// Live session against one i-doit endpoint
pub struct CmdbSession {
    client: RpcClient,
    session_id: String,
    login: LoginInfo,
}

impl std::fmt::Debug for CmdbSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmdbSession")
            .field("client", &self.client)
            .field("session_id", &"<redacted>")
            .field("username", &self.login.username)
            .finish_non_exhaustive()
    }
}

/// Send `idoit.login` with credential headers and return the login result.
///
/// A rejected login (a JSON-RPC error object or an empty reply on a 2xx
/// response) is an authentication failure. Non-2xx statuses stay transport
/// errors.
async fn authenticate(client: &mut RpcClient, username: &str, password: &str) -> Result<LoginInfo> {
    let result = client
        .call(
            methods::LOGIN,
            Map::new(),
            Auth::Credentials { username, password },
        )
        .await
        .map_err(|e| match e {
            Error::Rpc { code, message } => {
                Error::Authentication(format!("server rejected login ({code}): {message}"))
            }
            Error::UnexpectedResponse(message) => Error::Authentication(message),
            other => other,
        })?;

    let login: LoginInfo = serde_json::from_value(result)
        .map_err(|e| Error::Authentication(format!("malformed login result: {e}")))?;

    if login.session_id.as_deref().is_none_or(str::is_empty) {
        return Err(Error::Authentication(
            "login response did not contain a session id".to_string(),
        ));
    }

    Ok(login)
}

impl CmdbSession {
    /// Open a session using the endpoint and credentials in `config`.
    ///
    /// The URL is validated before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid URL, `Error::Authentication` if
    /// the login response carries no session id, and any transport error
    /// from the login call.
    pub async fn login(config: &SessionConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.url(), config.timeouts())?;
        let client = RpcClient::new(transport, config.api_key.clone());
        Self::login_with(client, &config.username, &config.password).await
    }

    /// Open a session over an existing client.
    ///
    /// # Errors
    ///
    /// Same as [`CmdbSession::login`], minus URL validation.
    pub async fn login_with(mut client: RpcClient, username: &str, password: &str) -> Result<Self> {
        let login = authenticate(&mut client, username, password).await?;
        let session_id = login.session_id.clone().unwrap_or_default();

        info!(
            url = %client.transport().url(),
            username = login.username.as_deref().unwrap_or(username),
            userid = ?login.userid,
            "Logged in to i-doit"
        );

        Ok(Self {
            client,
            session_id,
            login,
        })
    }

    /// URL every request of this session is posted to
    #[must_use]
    pub fn url(&self) -> &reqwest::Url {
        self.client.transport().url()
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Everything `idoit.login` returned besides the session id
    #[must_use]
    pub fn login_info(&self) -> &LoginInfo {
        &self.login
    }

    /// Sequence id the next request will carry
    #[must_use]
    pub fn next_request_id(&self) -> u64 {
        self.client.next_id()
    }

    async fn call(&mut self, method: &str, params: Map<String, Value>) -> Result<Value> {
        self.client
            .call(method, params, Auth::Session(&self.session_id))
            .await
    }

    /// End the session and return the server's message.
    ///
    /// # Errors
    ///
    /// Returns the transport or RPC error of the logout call.
    pub async fn logout(mut self) -> Result<String> {
        let result = self.call(methods::LOGOUT, Map::new()).await?;
        let logout: LogoutInfo = serde_json::from_value(result)?;

        info!(message = %logout.message, "Logged out of i-doit");
        Ok(logout.message)
    }

    /// Fetch the full constant catalog.
    ///
    /// # Errors
    ///
    /// Returns the transport or RPC error of the call.
    pub async fn constants(&mut self) -> Result<Value> {
        self.call(methods::CONSTANTS, Map::new()).await
    }

    /// All search hits for `title`, in the order the server returned them.
    ///
    /// # Errors
    ///
    /// Returns the transport or RPC error of the call, or `Error::Json` if
    /// the result is not a list of hits.
    pub async fn search_all(&mut self, title: &str) -> Result<Vec<SearchHit>> {
        let hits = self.search_raw(title).await?;
        Ok(serde_json::from_value(Value::Array(hits))?)
    }

    /// Id of the first object the server matches for `title`.
    ///
    /// Only the first hit is decoded; the rest of the list is not inspected.
    ///
    /// # Errors
    ///
    /// Returns `Error::Search` naming `title` when nothing matches, and
    /// `Error::Json` if the first hit has no usable `documentId`.
    pub async fn search(&mut self, title: &str) -> Result<ObjectId> {
        let first = self
            .search_raw(title)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Search(title.to_string()))?;

        let hit: SearchHit = serde_json::from_value(first)?;
        Ok(hit.document_id)
    }

    async fn search_raw(&mut self, title: &str) -> Result<Vec<Value>> {
        let mut params = Map::new();
        params.insert("q".to_string(), json!(title));

        match self.call(methods::SEARCH, params).await? {
            Value::Array(hits) => Ok(hits),
            other => Err(Error::UnexpectedResponse(format!(
                "{} returned {other} instead of a list",
                methods::SEARCH
            ))),
        }
    }

    /// Read all attributes of the object with the given title.
    ///
    /// # Errors
    ///
    /// Returns `Error::Search` if the title does not resolve, otherwise the
    /// error of the read call.
    pub async fn read(&mut self, title: &str) -> Result<Value> {
        let id = self.search(title).await?;
        self.read_by_id(id).await
    }

    /// # Errors
    ///
    /// Returns the transport or RPC error of the call.
    pub async fn read_by_id(&mut self, id: ObjectId) -> Result<Value> {
        let mut params = Map::new();
        params.insert("id".to_string(), json!(id));
        self.call(methods::OBJECT_READ, params).await
    }

    /// Create an object without checking whether the title is taken.
    ///
    /// # Errors
    ///
    /// Returns the transport or RPC error of the call.
    pub async fn create_object(&mut self, object_type: ObjectType, title: &str) -> Result<Value> {
        let mut params = Map::new();
        params.insert("type".to_string(), json!(object_type));
        params.insert("title".to_string(), json!(title));
        self.call(methods::OBJECT_CREATE, params).await
    }

    /// Create an object unless one with the same title already exists.
    ///
    /// # Errors
    ///
    /// Returns `Error::Conflict` without sending a create call if the title
    /// resolves. Any search failure other than "not found" is returned as is.
    pub async fn create_object_if_absent(
        &mut self,
        object_type: ObjectType,
        title: &str,
    ) -> Result<Value> {
        match self.search(title).await {
            Ok(id) => {
                warn!(title, %id, %object_type, "Object already exists, not creating");
                Err(Error::Conflict {
                    title: title.to_string(),
                    id,
                })
            }
            Err(Error::Search(_)) => self.create_object(object_type, title).await,
            Err(e) => Err(e),
        }
    }

    /// Create an operating-system object. No existence check is made.
    ///
    /// # Errors
    ///
    /// Returns the transport or RPC error of the call.
    pub async fn create_os(&mut self, title: &str) -> Result<Value> {
        self.create_object(ObjectType::OperatingSystem, title).await
    }

    /// Create a virtual-server object unless the title already exists.
    ///
    /// # Errors
    ///
    /// Returns `Error::Conflict` if the machine already exists.
    pub async fn create_vm(&mut self, title: &str) -> Result<Value> {
        self.create_object_if_absent(ObjectType::VirtualServer, title)
            .await
    }

    /// Create a category entry on an object.
    ///
    /// # Errors
    ///
    /// Returns the transport or RPC error of the call.
    pub async fn create_category_entry(
        &mut self,
        object_id: ObjectId,
        category: CategoryId,
        data: Map<String, Value>,
    ) -> Result<Value> {
        let mut params = Map::new();
        params.insert("objID".to_string(), json!(object_id));
        params.insert("catgID".to_string(), json!(category));
        params.insert("data".to_string(), Value::Object(data));
        self.call(methods::CATEGORY_CREATE, params).await
    }

    /// Assign the operating system `os_name` to the host `hostname`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Search` naming whichever title did not resolve; no
    /// category entry is created in that case.
    pub async fn update_host_os(&mut self, hostname: &str, os_name: &str) -> Result<Value> {
        let host_id = self.search(hostname).await?;
        let os_id = self.search(os_name).await?;

        let mut data = Map::new();
        data.insert("application".to_string(), json!(os_id));

        self.create_category_entry(host_id, CategoryId::OperatingSystem, data)
            .await
    }
}
