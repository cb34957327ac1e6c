//! Structured request and response shared by both invocation surfaces.

use rmcp::model::JsonObject;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

use super::error::RouteError;
use crate::core::auth::{AuthOutcome, CallContext, Principal};

/// A request as seen by a handler, regardless of which surface sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub params: JsonObject,
    pub query: JsonObject,
    /// `None` when nothing was sent, distinct from an empty object.
    pub body: Option<JsonObject>,
    pub headers: BTreeMap<String, String>,
    pub auth: AuthOutcome,
}

impl RouteRequest {
    /// Empty request carrying the caller's headers and auth outcome.
    pub fn new(context: &CallContext, auth: AuthOutcome) -> Self {
        Self {
            params: JsonObject::new(),
            query: JsonObject::new(),
            body: None,
            headers: context.headers().clone(),
            auth,
        }
    }

    /// The authenticated caller, or the 401 matching the auth failure.
    pub fn require_principal(&self) -> Result<&Principal, RouteError> {
        match &self.auth {
            AuthOutcome::Authenticated(principal) => Ok(principal),
            AuthOutcome::Missing => Err(RouteError::unauthorized(
                "UNAUTHORIZED",
                "Missing or invalid authorization header",
            )),
            AuthOutcome::Invalid => Err(RouteError::unauthorized(
                "INVALID_CREDENTIALS",
                "Invalid username or password",
            )),
            AuthOutcome::Malformed => {
                Err(RouteError::unauthorized("AUTH_ERROR", "Authentication failed"))
            }
        }
    }

    pub fn parse_params<T: DeserializeOwned>(&self) -> Result<T, RouteError> {
        parse_bucket(&self.params, "path parameters")
    }

    pub fn parse_query<T: DeserializeOwned>(&self) -> Result<T, RouteError> {
        parse_bucket(&self.query, "query")
    }

    /// Parse the body; an absent body parses like an empty object.
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, RouteError> {
        match &self.body {
            Some(body) => parse_bucket(body, "body"),
            None => parse_bucket(&JsonObject::new(), "body"),
        }
    }
}

fn parse_bucket<T: DeserializeOwned>(bucket: &JsonObject, location: &str) -> Result<T, RouteError> {
    serde_json::from_value(Value::Object(bucket.clone()))
        .map_err(|e| RouteError::validation(format!("Invalid {location}: {e}")))
}

/// A handler's successful result.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl RouteResponse {
    pub fn with_status(status: u16, body: &impl Serialize) -> Result<Self, RouteError> {
        let body = serde_json::to_value(body)
            .map_err(|e| RouteError::internal(format!("Failed to serialize response: {e}")))?;
        Ok(Self {
            status,
            body: Some(body),
        })
    }

    pub fn ok(body: &impl Serialize) -> Result<Self, RouteError> {
        Self::with_status(200, body)
    }

    pub fn created(body: &impl Serialize) -> Result<Self, RouteError> {
        Self::with_status(201, body)
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }
}

/// Deserializers accepting numbers either as JSON numbers or numeric strings.
///
/// REST query strings carry every value as text while tool arguments carry
/// typed JSON, so query fields go through these.
pub mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected an integer, got {n}"))),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected an integer, got \"{s}\""))),
            Some(other) => Err(D::Error::custom(format!("expected an integer, got {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Paging {
        #[serde(default, deserialize_with = "lenient::opt_i64")]
        limit: Option<i64>,
    }

    fn request(auth: AuthOutcome) -> RouteRequest {
        RouteRequest::new(&CallContext::new(), auth)
    }

    #[test]
    fn test_require_principal() {
        let principal = Principal {
            user_id: "u".into(),
            username: "demo".into(),
        };
        let req = request(AuthOutcome::Authenticated(principal.clone()));
        assert_eq!(req.require_principal().unwrap(), &principal);

        let err = request(AuthOutcome::Missing).require_principal().unwrap_err();
        assert_eq!(err.status, Some(401));
        assert_eq!(err.code, "UNAUTHORIZED");

        let err = request(AuthOutcome::Invalid).require_principal().unwrap_err();
        assert_eq!(err.code, "INVALID_CREDENTIALS");
    }

    #[test]
    fn test_lenient_numbers() {
        let mut req = request(AuthOutcome::Missing);
        req.query.insert("limit".into(), json!("15"));
        let paging: Paging = req.parse_query().unwrap();
        assert_eq!(paging.limit, Some(15));

        req.query.insert("limit".into(), json!(7));
        let paging: Paging = req.parse_query().unwrap();
        assert_eq!(paging.limit, Some(7));

        req.query.insert("limit".into(), json!("many"));
        let err = req.parse_query::<Paging>().unwrap_err();
        assert_eq!(err.status, Some(400));

        req.query.clear();
        let paging: Paging = req.parse_query().unwrap();
        assert_eq!(paging.limit, None);
    }

    #[test]
    fn test_absent_body_parses_as_empty() {
        #[derive(Debug, Deserialize)]
        struct Patch {
            title: Option<String>,
        }
        let req = request(AuthOutcome::Missing);
        let patch: Patch = req.parse_body().unwrap();
        assert!(patch.title.is_none());
    }
}
