//! Shared types for the i-doit CMDB client.
//!
//! These are the values that cross the JSON-RPC boundary: object ids, the
//! object-type and category constants the remote service understands, search
//! hits, login results and the endpoint selector. Nothing here performs I/O.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// URL of the development i-doit instance
pub const DEV_URL: &str = "https://cse-app-idoit-dev-01.cse.umn.edu/src/jsonrpc.php";

/// URL of the production i-doit instance
pub const PROD_URL: &str = "https://cse-app-idoit-prod-01.cse.umn.edu/src/jsonrpc.php";

/// Identifier of a CMDB object.
///
/// Serializes as a JSON number. Deserializes from either a number or a
/// numeric string, since i-doit reports ids as strings in search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl ObjectId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ObjectIdRaw {
    Number(u64),
    Text(String),
}

impl TryFrom<ObjectIdRaw> for ObjectId {
    type Error = String;

    fn try_from(raw: ObjectIdRaw) -> Result<Self, Self::Error> {
        match raw {
            ObjectIdRaw::Number(n) => Ok(Self(n)),
            ObjectIdRaw::Text(s) => s
                .trim()
                .parse::<u64>()
                .map(Self)
                .map_err(|e| format!("Invalid object id '{s}': {e}")),
        }
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        ObjectIdRaw::deserialize(deserializer)
            .and_then(|raw| raw.try_into().map_err(serde::de::Error::custom))
    }
}

/// Generates a string-constant enum with a catch-all `Other` variant.
macro_rules! constant_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $constant:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Any other constant known to the remote service
            Other(String),
        }

        impl $name {
            /// The constant as sent on the wire
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $constant,)+
                    Self::Other(s) => s.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($constant => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }
    };
}

constant_enum! {
    /// Object type tag (`C__OBJTYPE__*`)
    ObjectType {
        OperatingSystem => "C__OBJTYPE__OPERATING_SYSTEM",
        VirtualServer => "C__OBJTYPE__VIRTUAL_SERVER",
        /// Physical host
        Server => "C__OBJTYPE__SERVER",
        Client => "C__OBJTYPE__CLIENT",
    }
}

constant_enum! {
    /// Global category constant (`C__CATG__*`)
    CategoryId {
        Global => "C__CATG__GLOBAL",
        OperatingSystem => "C__CATG__OPERATING_SYSTEM",
    }
}

/// One entry of an `idoit.search` result list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub document_id: ObjectId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub hit_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Result of `idoit.login`.
///
/// `session_id` is optional here so that a response without it can be
/// reported as an authentication failure instead of a decode error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginInfo {
    #[serde(rename = "session-id", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<ObjectId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,

    #[serde(rename = "client-id", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ObjectId>,

    #[serde(rename = "client-name", default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

/// Result of `idoit.logout`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogoutInfo {
    pub message: String,

    #[serde(default)]
    pub result: bool,
}

/// Which i-doit instance a session talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Endpoint {
    #[default]
    Dev,
    Prod,
}

impl Endpoint {
    pub const ALL: [Endpoint; 2] = [Endpoint::Dev, Endpoint::Prod];

    /// The fixed JSON-RPC URL for this endpoint
    #[must_use]
    pub fn url(self) -> &'static str {
        match self {
            Endpoint::Dev => DEV_URL,
            Endpoint::Prod => PROD_URL,
        }
    }

    #[must_use]
    pub fn selector(self) -> &'static str {
        match self {
            Endpoint::Dev => "dev",
            Endpoint::Prod => "prod",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Error returned when an endpoint selector is not one of the known names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEndpoint(pub String);

impl fmt::Display for UnknownEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown endpoint '{}' (expected one of: dev, prod)",
            self.0
        )
    }
}

impl std::error::Error for UnknownEndpoint {}

impl FromStr for Endpoint {
    type Err = UnknownEndpoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Endpoint::Dev),
            "prod" => Ok(Endpoint::Prod),
            other => Err(UnknownEndpoint(other.to_string())),
        }
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.selector())
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
