//! RestAuth client error types.
//!
//! Every failure the service can report is mapped onto a variant here. The
//! connection layer handles the codes that mean the same thing for every
//! request (401, 406, 500 and, for requests with a body, 400 and 415); the
//! user and group operations map the remaining codes per endpoint.

use std::fmt;

use thiserror::Error;

/// Result type alias using `RestAuthError`.
pub type RestAuthResult<T> = Result<T, RestAuthError>;

/// Name of the response header the service uses to say which entity a 404
/// refers to.
pub const RESOURCE_TYPE_HEADER: &str = "Resource-Type";

/// Entity kind named by the `Resource-Type` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    User,
    Group,
    Property,
}

impl ResourceType {
    /// Parse a `Resource-Type` header value. Unknown values yield `None`.
    #[must_use]
    pub fn from_header_value(value: &str) -> Option<Self> {
        match value.trim() {
            "user" => Some(Self::User),
            "group" => Some(Self::Group),
            "property" => Some(Self::Property),
            _ => None,
        }
    }

    /// The wire representation of this resource type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Property => "property",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when talking to a RestAuth service.
#[derive(Debug, Error)]
pub enum RestAuthError {
    /// The service rejected the credentials of this connection (401).
    #[error("service credentials rejected (401)")]
    Unauthorized,

    /// The service cannot produce the requested content type (406).
    #[error("service cannot produce content type {content_type} (406)")]
    NotAcceptable { content_type: String },

    /// The service does not accept the content type of the request body (415).
    #[error("service does not accept content type {content_type} (415)")]
    UnsupportedMediaType { content_type: String },

    /// The service could not parse the request body (400).
    #[error("bad request (400): {0}")]
    BadRequest(String),

    /// The service failed internally (500).
    #[error("internal server error (500): {0}")]
    InternalServerError(String),

    /// The addressed resource does not exist (404).
    #[error("{} not found", resource_type.map_or("resource", |t| t.as_str()))]
    NotFound { resource_type: Option<ResourceType> },

    /// A user with this name already exists (409).
    #[error("user already exists: {0}")]
    UserExists(String),

    /// A group with this name already exists (409).
    #[error("group already exists: {0}")]
    GroupExists(String),

    /// The property already exists for this user (409).
    #[error("property already exists: {0}")]
    PropertyExists(String),

    /// The service rejected the input, e.g. an invalid name or password (412).
    #[error("precondition failed (412): {0}")]
    PreconditionFailed(String),

    /// Transport-level failure (DNS, connection refused, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status this operation does not define.
    #[error("unknown status {status}: {body}")]
    UnknownStatus { status: u16, body: String },

    /// The response body could not be decoded into the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// A user, group or property name cannot be addressed in a URL path.
    /// `.` and `..` are removed by path normalization and would target a
    /// different resource.
    #[error("invalid name for a path segment: {0:?}")]
    InvalidName(String),

    /// The request parameters could not be encoded as an object.
    #[error("failed to serialize request: {0}")]
    Serialize(String),

    /// The connection configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RestAuthError {
    /// The HTTP status code this error was derived from, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::Unauthorized => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::NotAcceptable { .. } => Some(406),
            Self::UserExists(_) | Self::GroupExists(_) | Self::PropertyExists(_) => Some(409),
            Self::PreconditionFailed(_) => Some(412),
            Self::UnsupportedMediaType { .. } => Some(415),
            Self::InternalServerError(_) => Some(500),
            Self::UnknownStatus { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Parse(_)
            | Self::InvalidName(_)
            | Self::Serialize(_)
            | Self::InvalidConfig(_) => None,
        }
    }

    /// Whether this is one of the resource conflict errors (409).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::UserExists(_) | Self::GroupExists(_) | Self::PropertyExists(_)
        )
    }

    /// Whether this is a `NotFound` error, optionally of a given type.
    #[must_use]
    pub fn is_not_found(&self, expected: Option<ResourceType>) -> bool {
        match (self, expected) {
            (Self::NotFound { .. }, None) => true,
            (Self::NotFound { resource_type }, Some(t)) => *resource_type == Some(t),
            _ => false,
        }
    }

    /// Whether this error reports a content negotiation mismatch between
    /// client and service rather than a problem with the input.
    #[must_use]
    pub fn is_negotiation_failure(&self) -> bool {
        matches!(
            self,
            Self::NotAcceptable { .. } | Self::UnsupportedMediaType { .. }
        )
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotAcceptable { .. } => "NOT_ACCEPTABLE",
            Self::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            Self::NotFound { .. } => "RESOURCE_NOT_FOUND",
            Self::UserExists(_) => "USER_EXISTS",
            Self::GroupExists(_) => "GROUP_EXISTS",
            Self::PropertyExists(_) => "PROPERTY_EXISTS",
            Self::PreconditionFailed(_) => "PRECONDITION_FAILED",
            Self::Http(_) => "HTTP_ERROR",
            Self::UnknownStatus { .. } => "UNKNOWN_STATUS",
            Self::Parse(_) => "PARSE_ERROR",
            Self::InvalidName(_) => "INVALID_NAME",
            Self::Serialize(_) => "SERIALIZE_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}
