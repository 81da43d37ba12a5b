// Core client implementation

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use crate::connection::Connection;
use crate::endpoint::Endpoint;
use crate::store::DataStore;
use crate::types::{ApiResult, ContentType, DataChannel, Error, Method};
use crate::vo::ValueObject;

/// Header names the client fills in from the endpoint's content type unless
/// the caller overrides them.
const ACCEPT: &str = "Accept";
const CONTENT_TYPE: &str = "Content-Type";

/// A captured response: status, headers, and an eagerly-read body, owned by
/// the client so the body can be re-read any number of times.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    headers: reqwest::header::HeaderMap,
    body: String,
}

impl ApiResponse {
    pub fn new(status: u16, headers: reqwest::header::HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &reqwest::header::HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// The payload slot of an assembled request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Map<String, Value>),
    Form(Map<String, Value>),
}

/// An assembled request, handed to the middleware chain and then to the
/// transport. Middleware may rewrite any part before the request goes out.
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: Method,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub query: Map<String, Value>,
    pub body: Option<RequestBody>,
}

/// Pre-flight extension point, run after verification and assembly but before
/// any network I/O. The usual use is injecting authentication:
///
/// ```
/// use apiwrap::{ApiResult, RequestMiddleware, RequestParts};
/// use async_trait::async_trait;
///
/// struct BearerAuth(String);
///
/// #[async_trait]
/// impl RequestMiddleware for BearerAuth {
///     async fn prepare(&self, mut parts: RequestParts) -> ApiResult<RequestParts> {
///         parts
///             .headers
///             .insert("Authorization".to_string(), format!("Bearer {}", self.0));
///         Ok(parts)
///     }
/// }
/// ```
#[async_trait]
pub trait RequestMiddleware: Send + Sync {
    async fn prepare(&self, parts: RequestParts) -> ApiResult<RequestParts>;
}

/// Orchestrates one request/response cycle against a [`Connection`].
///
/// After the transport stage of a [`send`](ApiClient::send), exactly one of
/// [`last_error`](ApiClient::last_error) /
/// [`last_response`](ApiClient::last_response) is set. Transport failures are
/// captured as state rather than returned; `send`'s `Err` arm carries only
/// pre-send configuration and validation failures.
pub struct ApiClient {
    connection: Option<Connection>,
    endpoint: Endpoint,
    request_data: DataStore,
    query_data: DataStore,
    headers: BTreeMap<String, String>,
    middleware: Vec<Arc<dyn RequestMiddleware>>,
    http: OnceLock<HttpClient>,
    last_error: Option<Error>,
    last_response: Option<ApiResponse>,
}

impl ApiClient {
    /// A client for the given endpoint with no connection attached yet.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            connection: None,
            endpoint,
            request_data: DataStore::new(),
            query_data: DataStore::new(),
            headers: BTreeMap::new(),
            middleware: Vec::new(),
            http: OnceLock::new(),
            last_error: None,
            last_response: None,
        }
    }

    /// A client with the connection attached up front.
    pub fn connected(connection: Connection, endpoint: Endpoint) -> Self {
        Self::new(endpoint).with_connection(connection)
    }

    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn set_connection(&mut self, connection: Connection) -> &mut Self {
        self.connection = Some(connection);
        self
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    pub fn add_middleware(mut self, middleware: impl RequestMiddleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn endpoint_mut(&mut self) -> &mut Endpoint {
        &mut self.endpoint
    }

    pub fn set_content_type(&mut self, content_type: ContentType) -> &mut Self {
        let endpoint = std::mem::take(&mut self.endpoint);
        self.endpoint = endpoint.with_content_type(content_type);
        self
    }

    // ---- request data -------------------------------------------------

    pub fn request_data(&self) -> &DataStore {
        &self.request_data
    }

    /// Set the request-data mapping; `merge` overlays onto the existing data,
    /// otherwise the mapping is replaced entirely.
    pub fn set_request_data(&mut self, data: Map<String, Value>, merge: bool) -> &mut Self {
        if merge {
            self.request_data.merge(data);
        } else {
            self.request_data.replace(data);
        }
        self
    }

    pub fn set_request_data_item(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.request_data.set(key, value);
        self
    }

    pub fn request_data_item(&self, key: &str) -> Option<&Value> {
        self.request_data.get(key)
    }

    pub fn has_request_data_item(&self, key: &str) -> bool {
        self.request_data.contains(key)
    }

    pub fn remove_request_data_item(&mut self, key: &str) -> &mut Self {
        self.request_data.remove(key);
        self
    }

    // ---- query data ---------------------------------------------------

    pub fn query_data(&self) -> &DataStore {
        &self.query_data
    }

    /// Set query parameters independently of the request body, `?asdf=ghijk`.
    pub fn set_query_data(&mut self, data: Map<String, Value>, merge: bool) -> &mut Self {
        if merge {
            self.query_data.merge(data);
        } else {
            self.query_data.replace(data);
        }
        self
    }

    pub fn set_query_data_item(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.query_data.set(key, value);
        self
    }

    // ---- headers ------------------------------------------------------

    /// Override a single header; unset headers keep their defaults
    /// (`Accept` and `Content-Type` derive from the endpoint's content type).
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    // ---- lifecycle ----------------------------------------------------

    /// Run one request/response cycle.
    ///
    /// The `Err` arm carries only failures raised before the network exchange:
    /// a missing connection, a missing critical field, an unbuildable URL, or
    /// a middleware rejection. Transport failures land in
    /// [`last_error`](ApiClient::last_error) and the call returns `Ok(())`.
    pub async fn send(&mut self) -> ApiResult<()> {
        self.pre_send_verification()?;

        let parts = self.assemble()?;
        let parts = self.run_middleware(parts).await?;

        log::debug!("dispatching {} {}", parts.method, parts.url);

        self.last_error = None;
        self.last_response = None;
        match self.transport(parts).await {
            Ok(response) => {
                self.last_response = Some(response);
            }
            Err(err) => {
                log::error!("transport failure captured: {}", err);
                self.last_error = Some(err);
            }
        }
        Ok(())
    }

    /// Run [`send`](ApiClient::send) and build a value object from the decoded
    /// body. Pre-send failures surface as `Err`; an unsuccessful or failed
    /// exchange yields `Ok(None)`.
    pub async fn fetch<V: ValueObject + Default>(&mut self) -> ApiResult<Option<V>> {
        self.send().await?;
        if !self.is_last_request_success() {
            return Ok(None);
        }
        let mut vo = V::default();
        vo.apply_from_map(&self.decoded_body());
        Ok(Some(vo))
    }

    fn pre_send_verification(&self) -> ApiResult<()> {
        if self.connection.is_none() {
            return Err(Error::MissingConnection);
        }
        for field in self.endpoint.critical_fields() {
            if !self.request_data.contains(field) {
                return Err(Error::MissingField(field.clone()));
            }
        }
        Ok(())
    }

    fn assemble(&self) -> ApiResult<RequestParts> {
        let connection = self.connection.as_ref().ok_or(Error::MissingConnection)?;
        let base = connection.base_url();
        let url = Url::parse(&base)
            .and_then(|u| u.join(self.endpoint.path()))
            .map_err(|e| Error::InvalidUrl(format!("{}{}: {}", base, self.endpoint.path(), e)))?;

        let content_type = self.endpoint.content_type().as_str().to_string();
        let mut headers = BTreeMap::new();
        headers.insert(ACCEPT.to_string(), content_type.clone());
        headers.insert(CONTENT_TYPE.to_string(), content_type);
        for (key, value) in &self.headers {
            headers.insert(key.clone(), value.clone());
        }

        let data = self.request_data.as_map().clone();
        let (query, body) = match self.endpoint.data_channel() {
            DataChannel::Query => {
                // Explicit query parameters win over request data on collision
                let mut query = data;
                for (key, value) in self.query_data.iter() {
                    query.insert(key.clone(), value.clone());
                }
                (query, None)
            }
            DataChannel::Json => {
                let body = (!data.is_empty()).then_some(RequestBody::Json(data));
                (self.query_data.as_map().clone(), body)
            }
            DataChannel::Form => {
                let body = (!data.is_empty()).then_some(RequestBody::Form(data));
                (self.query_data.as_map().clone(), body)
            }
        };

        Ok(RequestParts {
            method: self.endpoint.method(),
            url,
            headers,
            query,
            body,
        })
    }

    async fn run_middleware(&self, mut parts: RequestParts) -> ApiResult<RequestParts> {
        for middleware in self.middleware.clone() {
            parts = middleware.prepare(parts).await?;
        }
        Ok(parts)
    }

    async fn transport(&self, parts: RequestParts) -> Result<ApiResponse, Error> {
        let mut request = self.http().request(parts.method.into(), parts.url);
        for (key, value) in &parts.headers {
            request = request.header(key, value);
        }
        if !parts.query.is_empty() {
            request = request.query(&string_pairs(&parts.query));
        }
        match &parts.body {
            Some(RequestBody::Json(map)) => request = request.json(map),
            Some(RequestBody::Form(map)) => request = request.form(&string_pairs(map)),
            None => {}
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(ApiResponse::new(status, headers, body))
    }

    fn http(&self) -> &HttpClient {
        self.http.get_or_init(|| {
            HttpClient::builder()
                .build()
                .expect("failed to build HTTP client")
        })
    }

    // ---- captured state -----------------------------------------------

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn has_last_response(&self) -> bool {
        self.last_response.is_some()
    }

    pub fn last_response(&self) -> Option<&ApiResponse> {
        self.last_response.as_ref()
    }

    /// The raw captured body, empty when no response was captured.
    pub fn raw_body(&self) -> &str {
        self.last_response.as_ref().map(|r| r.body()).unwrap_or("")
    }

    /// Decode the captured body as a generic JSON object. Empty when an error
    /// was captured, the body is not valid JSON, or it is not an object.
    pub fn decoded_body(&self) -> Map<String, Value> {
        if self.has_error() {
            return Map::new();
        }
        match serde_json::from_str::<Value>(self.raw_body()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Decode the captured body into a typed structure. `None` when an error
    /// was captured or the body does not deserialize.
    pub fn decoded_body_as<T: DeserializeOwned>(&self) -> Option<T> {
        if self.has_error() {
            return None;
        }
        serde_json::from_str(self.raw_body()).ok()
    }

    /// True iff no error was captured, a response exists, and its status is in
    /// the endpoint's success set.
    pub fn is_last_request_success(&self) -> bool {
        !self.has_error()
            && self
                .last_response
                .as_ref()
                .is_some_and(|r| self.endpoint.is_success_code(r.status()))
    }
}

/// Flatten a JSON map into string pairs for the query string or a form body.
/// Scalars keep their display form; nested arrays and objects are carried as
/// their compact JSON text, so `{"ids": [1, 2]}` goes on the wire as
/// `ids=[1,2]` (URL-encoded by the transport).
fn string_pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {}", other),
        }
    }

    fn connection() -> Connection {
        Connection::new("https://api.example.com/v{version}/")
    }

    #[test]
    fn verification_requires_a_connection() {
        let client = ApiClient::new(Endpoint::new());
        let err = client.pre_send_verification().unwrap_err();
        assert!(matches!(err, Error::MissingConnection));
    }

    #[test]
    fn verification_names_the_missing_critical_field() {
        let mut client = ApiClient::connected(
            connection(),
            Endpoint::post("items").with_critical_fields(["a", "b"]),
        );
        client.set_request_data_item("a", 1);
        let err = client.pre_send_verification().unwrap_err();
        assert_eq!(err.to_string(), "request data item \"b\" must be provided");
        assert!(matches!(err, Error::MissingField(field) if field == "b"));
    }

    #[test]
    fn get_requests_route_data_to_the_query_string() {
        let mut client = ApiClient::connected(connection(), Endpoint::get("items"));
        client.set_request_data(map(json!({ "x": 1, "shared": "data" })), true);
        client.set_query_data(map(json!({ "y": 2, "shared": "query" })), true);

        let parts = client.assemble().unwrap();
        assert_eq!(parts.body, None);
        assert_eq!(
            parts.query,
            map(json!({ "x": 1, "y": 2, "shared": "query" }))
        );
    }

    #[test]
    fn post_requests_route_data_to_a_json_body() {
        let mut client = ApiClient::connected(connection(), Endpoint::post("items"));
        client.set_request_data(map(json!({ "x": 1 })), true);
        client.set_query_data(map(json!({ "y": 2 })), true);

        let parts = client.assemble().unwrap();
        assert_eq!(parts.body, Some(RequestBody::Json(map(json!({ "x": 1 })))));
        assert_eq!(parts.query, map(json!({ "y": 2 })));
    }

    #[test]
    fn form_content_type_routes_data_to_a_form_body() {
        let mut client = ApiClient::connected(
            connection(),
            Endpoint::post("token").with_content_type(ContentType::FormUrlEncoded),
        );
        client.set_request_data(map(json!({ "grant_type": "code" })), true);

        let parts = client.assemble().unwrap();
        assert_eq!(
            parts.body,
            Some(RequestBody::Form(map(json!({ "grant_type": "code" }))))
        );
        assert_eq!(
            parts.headers.get("Content-Type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn empty_channels_are_omitted() {
        let client = ApiClient::connected(connection(), Endpoint::post("items"));
        let parts = client.assemble().unwrap();
        assert_eq!(parts.body, None);
        assert!(parts.query.is_empty());
    }

    #[test]
    fn headers_default_from_content_type_and_are_overridable_per_key() {
        let mut client = ApiClient::connected(connection(), Endpoint::get("items"));
        client.set_header("Accept", "text/csv");

        let parts = client.assemble().unwrap();
        assert_eq!(
            parts.headers.get("Accept").map(String::as_str),
            Some("text/csv")
        );
        assert_eq!(
            parts.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn empty_path_resolves_to_the_bare_base_url() {
        let client = ApiClient::connected(connection(), Endpoint::new());
        let parts = client.assemble().unwrap();
        assert_eq!(parts.url.as_str(), "https://api.example.com/v1/");
        assert_eq!(parts.method, Method::Get);
    }

    #[test]
    fn request_data_merge_and_replace() {
        let mut client = ApiClient::connected(connection(), Endpoint::post("items"));
        client.set_request_data(map(json!({ "x": 1 })), true);
        client.set_request_data(map(json!({ "y": 2 })), true);
        assert_eq!(
            client.request_data().as_map(),
            &map(json!({ "x": 1, "y": 2 }))
        );

        client.set_request_data(map(json!({ "z": 3 })), false);
        assert_eq!(client.request_data().as_map(), &map(json!({ "z": 3 })));

        client.set_request_data_item("w", 4);
        assert!(client.has_request_data_item("w"));
        client.remove_request_data_item("w");
        assert!(!client.has_request_data_item("w"));
    }

    #[test]
    fn string_pairs_flatten_scalars() {
        let pairs = string_pairs(&map(json!({ "a": 1, "b": "two", "c": true })));
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "two".to_string()),
                ("c".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn string_pairs_carry_nested_values_as_json_text() {
        let pairs = string_pairs(&map(json!({
            "filter": { "active": true },
            "ids": [1, 2],
        })));
        assert_eq!(
            pairs,
            vec![
                ("filter".to_string(), r#"{"active":true}"#.to_string()),
                ("ids".to_string(), "[1,2]".to_string()),
            ]
        );
    }
}
