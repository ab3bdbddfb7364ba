//! Users, their passwords and their properties.
//!
//! A [`User`] is a handle naming a remote user; creating one with
//! [`User::new`] never contacts the service. Only [`User::get`] and
//! [`User::get_all`] confirm existence.

use reqwest::StatusCode;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use tracing::{debug, info};

use crate::connection::RestAuthConnection;
use crate::content::{decode_string, decode_string_list, decode_string_map};
use crate::error::{ResourceType, RestAuthError, RestAuthResult};
use crate::group::Group;
use crate::resource::{Collection, Resource};
use crate::response::Response;

const PROPS: &str = "props";

/// Parameters for creating a user.
///
/// An absent or empty password creates a disabled account.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateUserRequest {
    #[serde(rename = "user")]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Properties set atomically with the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, String>>,

    /// Groups the user is added to on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
}

impl CreateUserRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.get_or_insert_with(Vec::new).push(group.into());
        self
    }

    /// Request body with an empty password dropped.
    fn normalized(&self) -> Self {
        let mut request = self.clone();
        request.password = normalize_password(request.password.as_deref()).map(str::to_string);
        request
    }
}

#[derive(Serialize)]
struct PasswordParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

#[derive(Serialize)]
struct PropertyParams<'a> {
    prop: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct ValueParams<'a> {
    value: &'a str,
}

/// An empty password means "no password".
fn normalize_password(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.is_empty())
}

/// Handle to a user on a RestAuth service.
///
/// Equality, hashing and ordering consider the name only.
#[derive(Clone)]
pub struct User<'c> {
    conn: &'c RestAuthConnection,
    name: String,
}

impl<'c> User<'c> {
    /// Create a handle without contacting the service.
    pub fn new(conn: &'c RestAuthConnection, name: impl Into<String>) -> Self {
        Self {
            conn,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn connection(&self) -> &'c RestAuthConnection {
        self.conn
    }

    fn resource(&self) -> Resource<'c> {
        Resource::new(self.conn, Collection::Users)
    }

    // ── Factories ─────────────────────────────────────────────────────

    /// Create a user (POST /users/).
    ///
    /// Without a password (or with an empty one) the account is disabled.
    pub async fn create(
        conn: &'c RestAuthConnection,
        name: impl Into<String>,
        password: Option<&str>,
    ) -> RestAuthResult<Self> {
        let mut request = CreateUserRequest::new(name);
        request.password = password.map(str::to_string);
        Self::create_with(conn, &request).await
    }

    /// Create a user with initial properties and group memberships.
    pub async fn create_with(
        conn: &'c RestAuthConnection,
        request: &CreateUserRequest,
    ) -> RestAuthResult<Self> {
        let resource = Resource::new(conn, Collection::Users);
        let response = resource.post(&[], &request.normalized()).await?;

        match response.status_code() {
            StatusCode::CREATED => {
                info!(user = %request.name, "Created user");
                Ok(Self::new(conn, request.name.clone()))
            }
            StatusCode::CONFLICT => Err(RestAuthError::UserExists(request.name.clone())),
            StatusCode::PRECONDITION_FAILED => {
                Err(RestAuthError::PreconditionFailed(response.body().to_string()))
            }
            // Raised when one of the initial groups does not exist.
            StatusCode::NOT_FOUND => Err(response.not_found(None)),
            _ => Err(response.unknown_status()),
        }
    }

    /// Validate a user creation without persisting it (POST /test/users/).
    pub async fn create_test(
        conn: &RestAuthConnection,
        name: &str,
        password: Option<&str>,
    ) -> RestAuthResult<()> {
        let mut request = CreateUserRequest::new(name);
        request.password = password.map(str::to_string);

        let resource = Resource::new(conn, Collection::TestUsers);
        let response = resource.post(&[], &request.normalized()).await?;

        match response.status_code() {
            StatusCode::CREATED => Ok(()),
            StatusCode::CONFLICT => Err(RestAuthError::UserExists(name.to_string())),
            StatusCode::PRECONDITION_FAILED => {
                Err(RestAuthError::PreconditionFailed(response.body().to_string()))
            }
            _ => Err(response.unknown_status()),
        }
    }

    /// Get a handle to an existing user (GET /users/{name}/).
    pub async fn get(conn: &'c RestAuthConnection, name: impl Into<String>) -> RestAuthResult<Self> {
        let user = Self::new(conn, name);
        let response = user.resource().get(&[user.name.as_str()], &[]).await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => Ok(user),
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::User))),
            _ => Err(response.unknown_status()),
        }
    }

    /// Get all users (GET /users/).
    pub async fn get_all(conn: &'c RestAuthConnection) -> RestAuthResult<Vec<Self>> {
        let resource = Resource::new(conn, Collection::Users);
        let response = resource.get(&[], &[]).await?;

        match response.status_code() {
            StatusCode::OK => {
                let names = decode_string_list(conn.content_handler(), response.body())?;
                debug!(count = names.len(), "Fetched users");
                Ok(names.into_iter().map(|name| Self::new(conn, name)).collect())
            }
            _ => Err(response.unknown_status()),
        }
    }

    // ── Passwords ─────────────────────────────────────────────────────

    /// Set the password (PUT /users/{name}/).
    ///
    /// `None` or an empty password disables the account.
    pub async fn set_password(&self, password: Option<&str>) -> RestAuthResult<()> {
        let params = PasswordParams {
            password: normalize_password(password),
        };
        let response = self.resource().put(&[self.name.as_str()], &params).await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::User))),
            StatusCode::PRECONDITION_FAILED => {
                Err(RestAuthError::PreconditionFailed(response.body().to_string()))
            }
            _ => Err(response.unknown_status()),
        }
    }

    /// Check a password (POST /users/{name}/).
    ///
    /// Returns `false` both for a wrong password and for a user that does
    /// not exist.
    pub async fn verify_password(&self, password: &str) -> RestAuthResult<bool> {
        let params = PasswordParams {
            password: Some(password),
        };
        let response = self.resource().post(&[self.name.as_str()], &params).await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(response.unknown_status()),
        }
    }

    /// Remove the user (DELETE /users/{name}/).
    ///
    /// The handle stays usable; further calls fail with `NotFound`.
    pub async fn remove(&self) -> RestAuthResult<()> {
        let response = self.resource().delete(&[self.name.as_str()]).await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => {
                info!(user = %self.name, "Removed user");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::User))),
            _ => Err(response.unknown_status()),
        }
    }

    // ── Properties ────────────────────────────────────────────────────

    /// Get all properties (GET /users/{name}/props/).
    pub async fn get_properties(&self) -> RestAuthResult<HashMap<String, String>> {
        let response = self.resource().get(&[self.name.as_str(), PROPS], &[]).await?;

        match response.status_code() {
            StatusCode::OK => decode_string_map(self.conn.content_handler(), response.body()),
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::User))),
            _ => Err(response.unknown_status()),
        }
    }

    /// Set a property, creating or overwriting it
    /// (PUT /users/{name}/props/{key}/).
    ///
    /// Returns the previous value if the property already existed.
    pub async fn set_property(&self, key: &str, value: &str) -> RestAuthResult<Option<String>> {
        let params = ValueParams { value };
        let response = self
            .resource()
            .put(&[self.name.as_str(), PROPS, key], &params)
            .await?;

        match response.status_code() {
            StatusCode::CREATED => Ok(None),
            StatusCode::OK => {
                decode_string(self.conn.content_handler(), response.body()).map(Some)
            }
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::User))),
            _ => Err(response.unknown_status()),
        }
    }

    /// Create or overwrite several properties at once
    /// (POST /users/{name}/props/).
    pub async fn set_properties(&self, properties: &HashMap<String, String>) -> RestAuthResult<()> {
        let response = self
            .resource()
            .post(&[self.name.as_str(), PROPS], properties)
            .await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::User))),
            _ => Err(response.unknown_status()),
        }
    }

    /// Create a property that must not exist yet (POST /users/{name}/props/).
    pub async fn create_property(&self, key: &str, value: &str) -> RestAuthResult<()> {
        let params = PropertyParams { prop: key, value };
        let response = self
            .resource()
            .post(&[self.name.as_str(), PROPS], &params)
            .await?;
        property_created(response, key)
    }

    /// Validate a property creation without persisting it
    /// (POST /test/users/{name}/props/).
    pub async fn create_property_test(&self, key: &str, value: &str) -> RestAuthResult<()> {
        let params = PropertyParams { prop: key, value };
        let response = Resource::new(self.conn, Collection::TestUsers)
            .post(&[self.name.as_str(), PROPS], &params)
            .await?;
        property_created(response, key)
    }

    /// Get a single property (GET /users/{name}/props/{key}/).
    pub async fn get_property(&self, key: &str) -> RestAuthResult<String> {
        let response = self
            .resource()
            .get(&[self.name.as_str(), PROPS, key], &[])
            .await?;

        match response.status_code() {
            StatusCode::OK => decode_string(self.conn.content_handler(), response.body()),
            StatusCode::NOT_FOUND => Err(response.not_found(None)),
            _ => Err(response.unknown_status()),
        }
    }

    /// Remove a property (DELETE /users/{name}/props/{key}/).
    pub async fn remove_property(&self, key: &str) -> RestAuthResult<()> {
        let response = self.resource().delete(&[self.name.as_str(), PROPS, key]).await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(response.not_found(None)),
            _ => Err(response.unknown_status()),
        }
    }

    // ── Groups ────────────────────────────────────────────────────────

    /// Groups this user is a member of.
    pub async fn get_groups(&self) -> RestAuthResult<Vec<Group<'c>>> {
        Group::get_all(self.conn, Some(self.name.as_str())).await
    }

    /// Whether this user is a member of `group`.
    pub async fn in_group(&self, group: impl AsRef<str>) -> RestAuthResult<bool> {
        Group::new(self.conn, group.as_ref()).is_member(self).await
    }

    /// Add this user to `group`.
    pub async fn add_group(&self, group: impl AsRef<str>) -> RestAuthResult<()> {
        Group::new(self.conn, group.as_ref()).add_user(self).await
    }

    /// Remove this user from `group`.
    pub async fn remove_group(&self, group: impl AsRef<str>) -> RestAuthResult<()> {
        Group::new(self.conn, group.as_ref()).remove_user(self).await
    }
}

fn property_created(response: Response, key: &str) -> RestAuthResult<()> {
    match response.status_code() {
        StatusCode::CREATED => Ok(()),
        StatusCode::CONFLICT => Err(RestAuthError::PropertyExists(key.to_string())),
        StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::User))),
        _ => Err(response.unknown_status()),
    }
}

impl AsRef<str> for User<'_> {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for User<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User").field("name", &self.name).finish()
    }
}

impl std::fmt::Display for User<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl PartialEq for User<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for User<'_> {}

impl Hash for User<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for User<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for User<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}
