//! Credential and endpoint context consumed by an [`ApiClient`].
//!
//! A `Connection` is constructed once by the caller and attached to a client.
//! It is immutable in practice; the `with_*` builders cover the occasional
//! explicit override.
//!
//! [`ApiClient`]: crate::client::ApiClient

use crate::types::SecureApiKey;

/// Default API version formatted into the URL template.
pub const DEFAULT_API_VERSION: &str = "1";

/// Placeholder substituted with the resolved version in the URL template.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Holds the base URL, API version, and credentials for a remote API.
#[derive(Debug, Clone, Default)]
pub struct Connection {
    url_template: String,
    base_url_override: Option<String>,
    api_version_override: Option<String>,
    api_key: Option<SecureApiKey>,
    account_id: Option<String>,
}

impl Connection {
    /// Create a connection from a URL template. The template may contain a
    /// `{version}` placeholder, e.g. `https://api.example.com/v{version}/`.
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            ..Self::default()
        }
    }

    /// Replace the URL template entirely. An explicit override wins over the
    /// template supplied at construction.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url_override = Some(url.into());
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version_override = Some(version.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecureApiKey::new(key));
        self
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.api_key = Some(SecureApiKey::new(key));
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// The resolved API version: the explicit override when set, otherwise
    /// [`DEFAULT_API_VERSION`].
    pub fn api_version(&self) -> &str {
        match self.api_version_override.as_deref() {
            Some(version) if !version.is_empty() => version,
            _ => DEFAULT_API_VERSION,
        }
    }

    /// The raw URL template, override winning over the constructed default.
    pub fn api_url(&self) -> &str {
        self.base_url_override
            .as_deref()
            .unwrap_or(&self.url_template)
    }

    /// The absolute base URL requests are issued against: the template with
    /// the resolved version formatted in, always ending in `/`.
    pub fn base_url(&self) -> String {
        let mut url = self
            .api_url()
            .replace(VERSION_PLACEHOLDER, self.api_version());
        if !url.ends_with('/') {
            url.push('/');
        }
        url
    }
}
