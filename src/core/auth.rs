//! Authentication predicate and per-invocation call context.
//!
//! Both invocation surfaces derive an [`AuthOutcome`] from the caller's headers
//! with the same [`Authenticator`]; handlers decide whether to require it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;

use super::config::AuthConfig;

/// Transport metadata of one invocation. Header names are lower-case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallContext {
    headers: BTreeMap<String, String>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, normalising its name.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Context carrying only an `authorization` header, if any.
    pub fn with_authorization(authorization: Option<&str>) -> Self {
        match authorization {
            Some(value) => Self::new().with_header("authorization", value),
            None => Self::new(),
        }
    }

    /// Build from HTTP request headers. Non UTF-8 values are skipped.
    #[cfg(feature = "http")]
    pub fn from_header_map(headers: &http::HeaderMap) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        Self { headers }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
}

/// Result of checking a call context's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(Principal),
    /// No `Basic` authorization header.
    Missing,
    /// Well-formed credentials that do not match.
    Invalid,
    /// Credentials that could not be decoded.
    Malformed,
}

impl AuthOutcome {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated(principal) => Some(principal),
            _ => None,
        }
    }
}

/// Basic-auth check against the configured credentials.
#[derive(Clone)]
pub struct Authenticator {
    username: String,
    password: String,
    user_id: String,
}

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            user_id: config.user_id.clone(),
        }
    }

    pub fn authenticate(&self, context: &CallContext) -> AuthOutcome {
        let Some(credentials) = context
            .header("authorization")
            .and_then(|h| h.strip_prefix("Basic "))
        else {
            return AuthOutcome::Missing;
        };

        let decoded = match STANDARD.decode(credentials.trim()) {
            Ok(bytes) => bytes,
            Err(_) => return AuthOutcome::Malformed,
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return AuthOutcome::Malformed;
        };

        match decoded.split_once(':') {
            Some((username, password))
                if username == self.username && password == self.password =>
            {
                AuthOutcome::Authenticated(Principal {
                    user_id: self.user_id.clone(),
                    username: username.to_string(),
                })
            }
            _ => AuthOutcome::Invalid,
        }
    }
}

/// Encode a `Basic` authorization header value.
pub fn basic_authorization(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}
