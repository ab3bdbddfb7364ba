//! Authenticated HTTP connection to a RestAuth service (reqwest-based).
//!
//! A `RestAuthConnection` owns the base URL, the service credentials and the
//! content handler. It performs one request per call, never retries, and
//! turns the status codes whose meaning does not depend on the endpoint into
//! typed errors. Every other status is handed back in a [`Response`] for the
//! user and group operations to interpret.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{header, Client, Method, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ConnectionConfig;
use crate::content::{ContentHandler, JsonHandler};
use crate::error::{RestAuthError, RestAuthResult};
use crate::response::Response;

// ── Paths ─────────────────────────────────────────────────────────────

/// A sanitized request path.
///
/// Always starts and ends with `/`, and every segment is percent-encoded on
/// its own. The only ways to build one are [`RequestPath::parse`] and
/// [`RequestPath::from_segments`], so the connection never sends a path that
/// was not sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestPath(String);

impl RequestPath {
    /// Sanitize a raw `/`-delimited path.
    ///
    /// A trailing slash is appended if absent, then each segment is
    /// percent-encoded independently and the segments are rejoined with `/`.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self(sanitize_path(path))
    }

    /// Build a path from raw segments.
    ///
    /// Each segment is encoded as a whole, so a `/` inside a segment becomes
    /// `%2F` and cannot split it. Use this for entity names.
    ///
    /// # Errors
    ///
    /// Returns [`RestAuthError::InvalidName`] for a `.` or `..` segment. URL
    /// normalization removes those (encoded or not), which would send the
    /// request to a different resource.
    pub fn from_segments<I, S>(segments: I) -> RestAuthResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::from("/");
        for segment in segments {
            let segment = segment.as_ref();
            if is_dot_segment(segment) {
                return Err(RestAuthError::InvalidName(segment.to_string()));
            }
            path.push_str(&urlencoding::encode(segment));
            path.push('/');
        }
        Ok(Self(path))
    }

    /// The encoded path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl std::fmt::Display for RequestPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

/// Append a trailing slash and percent-encode every `/`-delimited segment.
#[must_use]
pub fn sanitize_path(path: &str) -> String {
    let mut raw = String::with_capacity(path.len() + 2);
    if !path.starts_with('/') {
        raw.push('/');
    }
    raw.push_str(path);
    if !raw.ends_with('/') {
        raw.push('/');
    }

    raw.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// ── Credentials ───────────────────────────────────────────────────────

/// Service account credentials sent with HTTP Basic authentication.
///
/// The [`Debug`] impl redacts the password.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredentials {
    username: String,
    password: String,
}

impl ServiceCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// `Authorization` header value for these credentials.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {encoded}")
    }
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// ── Connection ────────────────────────────────────────────────────────

/// Connection to a RestAuth service.
///
/// Cloning is cheap: the HTTP client and the content handler are shared.
#[derive(Clone)]
pub struct RestAuthConnection {
    /// Base URL without trailing slash (e.g. "<https://auth.example.com>").
    base_url: String,
    credentials: ServiceCredentials,
    /// Pre-encoded `Authorization` header for `credentials`.
    authorization: String,
    handler: Arc<dyn ContentHandler>,
    http_client: Client,
}

impl std::fmt::Debug for RestAuthConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAuthConnection")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("content_type", &self.handler.mime_type())
            .finish()
    }
}

impl RestAuthConnection {
    /// Connect to `host` with default transport settings.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> RestAuthResult<Self> {
        Self::from_config(&ConnectionConfig::new(host, username, password))
    }

    /// Connect using a validated [`ConnectionConfig`].
    pub fn from_config(config: &ConnectionConfig) -> RestAuthResult<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .danger_accept_invalid_certs(!config.tls_verify)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                RestAuthError::InvalidConfig(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self::with_http_client(
            config.base_url.clone(),
            ServiceCredentials::new(config.username.clone(), config.password.clone()),
            http_client,
        ))
    }

    /// Create a connection with a pre-built `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(
        host: impl Into<String>,
        credentials: ServiceCredentials,
        http_client: Client,
    ) -> Self {
        let base_url = host.into().trim_end_matches('/').to_string();
        let authorization = credentials.authorization_header();
        Self {
            base_url,
            credentials,
            authorization,
            handler: Arc::new(JsonHandler),
            http_client,
        }
    }

    /// Replace the service credentials used for all further requests.
    pub fn set_credentials(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.credentials = ServiceCredentials::new(username, password);
        self.authorization = self.credentials.authorization_header();
    }

    /// Replace the content handler used to encode and decode bodies.
    pub fn set_content_handler(&mut self, handler: Arc<dyn ContentHandler>) {
        self.handler = handler;
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Name of the service account.
    #[must_use]
    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// The content handler in use.
    #[must_use]
    pub fn content_handler(&self) -> &dyn ContentHandler {
        self.handler.as_ref()
    }

    // ── Verbs ─────────────────────────────────────────────────────────

    /// Perform a GET request with optional query parameters.
    pub async fn get(
        &self,
        path: impl Into<RequestPath>,
        query: &[(&str, &str)],
    ) -> RestAuthResult<Response> {
        self.send(Method::GET, &path.into(), query, None).await
    }

    /// Perform a POST request with `params` as the body object.
    pub async fn post<P: Serialize + ?Sized>(
        &self,
        path: impl Into<RequestPath>,
        params: &P,
    ) -> RestAuthResult<Response> {
        let body = self.encode_params(params)?;
        self.send(Method::POST, &path.into(), &[], Some(body)).await
    }

    /// Perform a PUT request with `params` as the body object.
    pub async fn put<P: Serialize + ?Sized>(
        &self,
        path: impl Into<RequestPath>,
        params: &P,
    ) -> RestAuthResult<Response> {
        let body = self.encode_params(params)?;
        self.send(Method::PUT, &path.into(), &[], Some(body)).await
    }

    /// Perform a DELETE request.
    pub async fn delete(&self, path: impl Into<RequestPath>) -> RestAuthResult<Response> {
        self.send(Method::DELETE, &path.into(), &[], None).await
    }

    // ── Internal ──────────────────────────────────────────────────────

    fn encode_params<P: Serialize + ?Sized>(&self, params: &P) -> RestAuthResult<Vec<u8>> {
        let value =
            serde_json::to_value(params).map_err(|e| RestAuthError::Serialize(e.to_string()))?;
        let map = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(RestAuthError::Serialize(format!(
                    "request parameters must be an object, got {other}"
                )))
            }
        };
        self.handler.serialize(&map)
    }

    async fn send(
        &self,
        method: Method,
        path: &RequestPath,
        query: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> RestAuthResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, path = %path, "RestAuth request");

        let mime_type = self.handler.mime_type();
        let mut builder = self
            .http_client
            .request(method.clone(), &url)
            .header(header::ACCEPT, mime_type)
            .header(header::AUTHORIZATION, &self.authorization);

        if !query.is_empty() {
            builder = builder.query(query);
        }

        let has_body = body.is_some();
        if let Some(body) = body {
            builder = builder.header(header::CONTENT_TYPE, mime_type).body(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(method = %method, path = %path, error = %e, "RestAuth request failed");
            RestAuthError::Http(e)
        })?;
        let response = Response::from_reqwest(response).await?;

        debug!(
            method = %method,
            path = %path,
            status = response.status(),
            "RestAuth response"
        );

        self.check_status(response, has_body)
    }

    /// Map the status codes that mean the same thing for every request.
    fn check_status(&self, response: Response, has_body: bool) -> RestAuthResult<Response> {
        match response.status_code() {
            StatusCode::UNAUTHORIZED => {
                warn!(username = %self.username(), "RestAuth rejected service credentials");
                Err(RestAuthError::Unauthorized)
            }
            StatusCode::NOT_ACCEPTABLE => Err(RestAuthError::NotAcceptable {
                content_type: self.handler.mime_type().to_string(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR => {
                warn!(body = %response.body(), "RestAuth internal server error");
                Err(RestAuthError::InternalServerError(response.body().to_string()))
            }
            StatusCode::BAD_REQUEST if has_body => {
                Err(RestAuthError::BadRequest(response.body().to_string()))
            }
            StatusCode::UNSUPPORTED_MEDIA_TYPE if has_body => {
                Err(RestAuthError::UnsupportedMediaType {
                    content_type: self.handler.mime_type().to_string(),
                })
            }
            _ => Ok(response),
        }
    }
}
