//! Response model returned by the connection layer.

use reqwest::StatusCode;
use std::collections::HashMap;

use crate::error::{ResourceType, RestAuthError, RestAuthResult, RESOURCE_TYPE_HEADER};

/// A response from the RestAuth service.
///
/// Holds the raw status code, the body text and the response headers. When a
/// header occurs more than once the last value wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    body: String,
    headers: HashMap<String, String>,
}

impl Response {
    /// Create a response from its parts.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers,
        }
    }

    /// Read the status, headers and body of a `reqwest` response.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> RestAuthResult<Self> {
        let status = response.status();
        let mut headers = HashMap::with_capacity(response.headers().len());
        for (name, value) in response.headers() {
            // Non-visible-ASCII values are lossily decoded.
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers.insert(name.as_str().to_string(), value);
        }
        let body = response.text().await?;
        Ok(Self::new(status, body, headers))
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// HTTP status code as `StatusCode`.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Response body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// All response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Look up a header value, ignoring ASCII case of the name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Raw value of the `Resource-Type` header.
    #[must_use]
    pub fn resource_type_header(&self) -> Option<&str> {
        self.header(RESOURCE_TYPE_HEADER)
    }

    /// Parsed value of the `Resource-Type` header.
    #[must_use]
    pub fn resource_type(&self) -> Option<ResourceType> {
        self.resource_type_header()
            .and_then(ResourceType::from_header_value)
    }

    /// `NotFound` error for this 404 response.
    ///
    /// The `Resource-Type` header wins; `fallback` is used when the header is
    /// absent and the endpoint addresses only one kind of resource.
    pub(crate) fn not_found(&self, fallback: Option<ResourceType>) -> RestAuthError {
        RestAuthError::NotFound {
            resource_type: self.resource_type().or(fallback),
        }
    }

    /// `UnknownStatus` error for a status the operation does not define.
    pub(crate) fn unknown_status(self) -> RestAuthError {
        RestAuthError::UnknownStatus {
            status: self.status.as_u16(),
            body: self.body,
        }
    }
}
