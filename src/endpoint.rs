//! Per-endpoint request configuration.
//!
//! Each API operation is described by an `Endpoint` value (method, path,
//! critical fields, content type, success codes) handed to a generic
//! [`ApiClient`] rather than encoded in a client subclass.
//!
//! [`ApiClient`]: crate::client::ApiClient

use crate::types::{ContentType, DataChannel, Method};

/// Status codes treated as success unless an endpoint overrides them.
pub const DEFAULT_SUCCESS_CODES: [u16; 4] = [200, 201, 202, 204];

#[derive(Debug, Clone)]
pub struct Endpoint {
    method: Method,
    path: String,
    critical_fields: Vec<String>,
    content_type: ContentType,
    success_codes: Vec<u16>,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            method: Method::default(),
            path: String::new(),
            critical_fields: Vec::new(),
            content_type: ContentType::default(),
            success_codes: DEFAULT_SUCCESS_CODES.to_vec(),
        }
    }
}

impl Endpoint {
    /// An endpoint with the default method (GET) and an empty path, i.e. the
    /// connection's base URL alone.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new().with_method(Method::Get).with_path(path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new().with_method(Method::Post).with_path(path)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the method from its name; unrecognized names fall back to GET.
    pub fn with_method_name(self, name: &str) -> Self {
        self.with_method(Method::parse(name))
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Declare a request-data key that must be present before sending.
    pub fn with_critical_field(mut self, field: impl Into<String>) -> Self {
        self.critical_fields.push(field.into());
        self
    }

    pub fn with_critical_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.critical_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_success_codes<I: IntoIterator<Item = u16>>(mut self, codes: I) -> Self {
        self.success_codes = codes.into_iter().collect();
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn critical_fields(&self) -> &[String] {
        &self.critical_fields
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn success_codes(&self) -> &[u16] {
        &self.success_codes
    }

    pub fn is_success_code(&self, code: u16) -> bool {
        self.success_codes.contains(&code)
    }

    /// Which slot request data travels in: form-encoded content types always
    /// use the form body; everything else uses the query string for GET and a
    /// JSON body otherwise.
    pub fn data_channel(&self) -> DataChannel {
        match self.content_type {
            ContentType::FormUrlEncoded => DataChannel::Form,
            _ if self.method == Method::Get => DataChannel::Query,
            _ => DataChannel::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_is_a_bare_get() {
        let endpoint = Endpoint::new();
        assert_eq!(endpoint.method(), Method::Get);
        assert_eq!(endpoint.path(), "");
        assert!(endpoint.critical_fields().is_empty());
        assert_eq!(endpoint.content_type(), &ContentType::Json);
        assert_eq!(endpoint.success_codes(), DEFAULT_SUCCESS_CODES);
    }

    #[test]
    fn channel_selection_follows_content_type_and_method() {
        let form_post = Endpoint::post("token").with_content_type(ContentType::FormUrlEncoded);
        assert_eq!(form_post.data_channel(), DataChannel::Form);

        let json_get = Endpoint::get("items");
        assert_eq!(json_get.data_channel(), DataChannel::Query);

        let json_post = Endpoint::post("items");
        assert_eq!(json_post.data_channel(), DataChannel::Json);

        let vnd_get = Endpoint::get("items").with_content_type(ContentType::JsonApi);
        assert_eq!(vnd_get.data_channel(), DataChannel::Query);
    }

    #[test]
    fn unrecognized_method_names_fall_back_to_get() {
        let endpoint = Endpoint::new().with_method_name("connect");
        assert_eq!(endpoint.method(), Method::Get);
    }

    #[test]
    fn success_codes_are_overridable() {
        let endpoint = Endpoint::new().with_success_codes([200, 304]);
        assert!(endpoint.is_success_code(304));
        assert!(!endpoint.is_success_code(201));
    }
}
