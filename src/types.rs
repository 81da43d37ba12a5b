// Core types and errors

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;

/// The result type used throughout the library
pub type ApiResult<T> = Result<T, Error>;

#[derive(Debug, Error, Clone)]
pub enum Error {
    /// A send was attempted on a client with no connection attached.
    #[error("attempting to make an API request without a connection")]
    MissingConnection,

    /// A critical request-data field was absent at verification time.
    #[error("request data item \"{0}\" must be provided")]
    MissingField(String),

    /// The connection base URL and endpoint path did not form a valid URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// A failure during the network exchange. Captured into the client's
    /// `last_error` slot rather than returned from `send()`.
    #[error("transport failure: {message}")]
    Transport {
        message: String,
        source: Option<Arc<reqwest::Error>>,
    },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport {
            message: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }
}

impl Error {
    /// True for errors raised before any network I/O takes place.
    pub fn is_pre_send(&self) -> bool {
        !matches!(self, Error::Transport { .. })
    }

    pub fn source_error(&self) -> Option<&reqwest::Error> {
        match self {
            Error::Transport { source, .. } => source.as_deref(),
            _ => None,
        }
    }
}

/// The request methods a client will issue. Anything else falls back to GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Patch,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Parse a method name, falling back to GET for anything unrecognized.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "head" => Method::Head,
            "patch" => Method::Patch,
            "post" => Method::Post,
            "put" => Method::Put,
            "delete" => Method::Delete,
            _ => Method::Get,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Head => "head",
            Method::Patch => "patch",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Patch => reqwest::Method::PATCH,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content type of the request, which drives data-channel selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Json,
    JsonApi,
    FormUrlEncoded,
    Other(String),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Json => "application/json",
            ContentType::JsonApi => "application/vnd.api+json",
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
            ContentType::Other(value) => value,
        }
    }
}

impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        match value {
            "application/json" => ContentType::Json,
            "application/vnd.api+json" => ContentType::JsonApi,
            "application/x-www-form-urlencoded" => ContentType::FormUrlEncoded,
            other => ContentType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slot request data is transmitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChannel {
    Query,
    Json,
    Form,
}

/// A container for API keys that redacts itself in logs and zeroes its
/// memory when dropped.
pub struct SecureApiKey {
    key: String,
}

impl SecureApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl Deref for SecureApiKey {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.key
    }
}

impl Drop for SecureApiKey {
    fn drop(&mut self) {
        // Overwrite the string so the key does not linger in memory
        unsafe {
            let bytes = self.key.as_bytes_mut();
            bytes.iter_mut().for_each(|b| *b = 0);
        }
    }
}

impl fmt::Debug for SecureApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureApiKey([REDACTED])")
    }
}

impl fmt::Display for SecureApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED API KEY]")
    }
}

impl Clone for SecureApiKey {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_falls_back_to_get() {
        assert_eq!(Method::parse("post"), Method::Post);
        assert_eq!(Method::parse("DELETE"), Method::Delete);
        assert_eq!(Method::parse("options"), Method::Get);
        assert_eq!(Method::parse(""), Method::Get);
    }

    #[test]
    fn content_type_round_trips_known_values() {
        assert_eq!(ContentType::from("application/json"), ContentType::Json);
        assert_eq!(
            ContentType::from("application/x-www-form-urlencoded"),
            ContentType::FormUrlEncoded
        );
        assert_eq!(
            ContentType::from("text/plain"),
            ContentType::Other("text/plain".to_string())
        );
        assert_eq!(ContentType::default().as_str(), "application/json");
    }

    #[test]
    fn every_error_except_transport_is_pre_send() {
        assert!(Error::MissingConnection.is_pre_send());
        assert!(Error::MissingField("b".to_string()).is_pre_send());
        assert!(Error::InvalidUrl("not-a-url".to_string()).is_pre_send());
        let transport = Error::Transport {
            message: "connection refused".to_string(),
            source: None,
        };
        assert!(!transport.is_pre_send());
        assert!(transport.source_error().is_none());
    }

    #[test]
    fn secure_api_key_redacts_debug_output() {
        let key = SecureApiKey::new("abcd1234");
        assert_eq!(key.as_str(), "abcd1234");
        assert_eq!(format!("{:?}", key), "SecureApiKey([REDACTED])");
        assert_eq!(format!("{}", key), "[REDACTED API KEY]");
    }
}
