//! JSON-RPC session client for the i-doit CMDB.
//!
//! This crate authenticates against an i-doit instance, keeps the resulting
//! session, and exposes a handful of object-level operations as JSON-RPC
//! calls.
//!
//! # Architecture
//!
//! - [`protocol`]: JSON-RPC 2.0 envelope types and the remote method names
//! - [`transport`]: HTTP POST transport with credential or session headers
//! - [`client`]: request sequencing and parameter merging
//! - [`session`]: [`CmdbSession`], the authenticated session and its operations
//! - [`config`]: [`SessionConfig`] and config-file loading
//! - [`error`]: error taxonomy and `Result` alias
//!
//! # Example
//!
//! ```no_run
//! use idoit_rpc::{CmdbSession, SessionConfig};
//!
//! # async fn example() -> idoit_rpc::Result<()> {
//! let config = SessionConfig::load(&idoit_rpc::config::default_config_path())?;
//! let mut session = CmdbSession::login(&config).await?;
//!
//! match session.create_vm("web-07").await {
//!     Ok(created) => println!("created: {created}"),
//!     Err(e) if e.is_conflict() => println!("{e}"),
//!     Err(e) => return Err(e),
//! }
//!
//! let message = session.logout().await?;
//! println!("{message}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use client::RpcClient;
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use protocol::{JSONRPC_VERSION, LANGUAGE, Request, RequestId, Response, RpcError, methods};
pub use session::CmdbSession;
pub use transport::{Auth, HttpTransport, Timeouts};

pub use idoit_types::{
    CategoryId, Endpoint, LoginInfo, LogoutInfo, ObjectId, ObjectType, SearchHit, UnknownEndpoint,
};
