//! Groups, their members and their subgroups.
//!
//! Membership is inherited along subgroup edges: after `a.add_group(&b)`
//! every member of `a` is also a member of `b`. The service computes this;
//! [`Group::get_members`] and [`Group::is_member`] report the result.

use reqwest::StatusCode;
use serde::Serialize;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use tracing::{debug, info};

use crate::connection::RestAuthConnection;
use crate::content::decode_string_list;
use crate::error::{ResourceType, RestAuthError, RestAuthResult};
use crate::resource::{Collection, Resource};
use crate::response::Response;
use crate::user::User;

const USERS: &str = "users";
const GROUPS: &str = "groups";

#[derive(Serialize)]
struct GroupParams<'a> {
    group: &'a str,
}

#[derive(Serialize)]
struct UserParams<'a> {
    user: &'a str,
}

/// Handle to a group on a RestAuth service.
///
/// Equality, hashing and ordering consider the name only.
#[derive(Clone)]
pub struct Group<'c> {
    conn: &'c RestAuthConnection,
    name: String,
}

impl<'c> Group<'c> {
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
        Resource::new(self.conn, Collection::Groups)
    }

    fn names_to_users(&self, response: &Response) -> RestAuthResult<Vec<User<'c>>> {
        let names = decode_string_list(self.conn.content_handler(), response.body())?;
        Ok(names
            .into_iter()
            .map(|name| User::new(self.conn, name))
            .collect())
    }

    // ── Factories ─────────────────────────────────────────────────────

    /// Create a group (POST /groups/).
    pub async fn create(
        conn: &'c RestAuthConnection,
        name: impl Into<String>,
    ) -> RestAuthResult<Self> {
        let group = Self::new(conn, name);
        let params = GroupParams { group: &group.name };
        let response = group.resource().post(&[], &params).await?;

        match response.status_code() {
            StatusCode::CREATED => {
                info!(group = %group.name, "Created group");
                Ok(group)
            }
            StatusCode::CONFLICT => Err(RestAuthError::GroupExists(group.name)),
            StatusCode::PRECONDITION_FAILED => {
                Err(RestAuthError::PreconditionFailed(response.body().to_string()))
            }
            _ => Err(response.unknown_status()),
        }
    }

    /// Validate a group creation without persisting it (POST /test/groups/).
    pub async fn create_test(conn: &RestAuthConnection, name: &str) -> RestAuthResult<()> {
        let params = GroupParams { group: name };
        let response = Resource::new(conn, Collection::TestGroups)
            .post(&[], &params)
            .await?;

        match response.status_code() {
            StatusCode::CREATED => Ok(()),
            StatusCode::CONFLICT => Err(RestAuthError::GroupExists(name.to_string())),
            StatusCode::PRECONDITION_FAILED => {
                Err(RestAuthError::PreconditionFailed(response.body().to_string()))
            }
            _ => Err(response.unknown_status()),
        }
    }

    /// Get a handle to an existing group (GET /groups/{name}/).
    pub async fn get(
        conn: &'c RestAuthConnection,
        name: impl Into<String>,
    ) -> RestAuthResult<Self> {
        let group = Self::new(conn, name);
        let response = group.resource().get(&[group.name.as_str()], &[]).await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => Ok(group),
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::Group))),
            _ => Err(response.unknown_status()),
        }
    }

    /// Get all groups (GET /groups/), or only the groups `member` belongs
    /// to (GET /groups/?user={member}).
    pub async fn get_all(
        conn: &'c RestAuthConnection,
        member: Option<&str>,
    ) -> RestAuthResult<Vec<Self>> {
        let resource = Resource::new(conn, Collection::Groups);
        let response = match member {
            Some(user) => resource.get(&[], &[("user", user)]).await?,
            None => resource.get(&[], &[]).await?,
        };

        match response.status_code() {
            StatusCode::OK => {
                let names = decode_string_list(conn.content_handler(), response.body())?;
                debug!(count = names.len(), member = ?member, "Fetched groups");
                Ok(names.into_iter().map(|name| Self::new(conn, name)).collect())
            }
            // The member filter names a user that does not exist.
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::User))),
            _ => Err(response.unknown_status()),
        }
    }

    // ── Members ───────────────────────────────────────────────────────

    /// All members, including those inherited through parent groups
    /// (GET /groups/{name}/users/).
    pub async fn get_members(&self) -> RestAuthResult<Vec<User<'c>>> {
        let response = self
            .resource()
            .get(&[self.name.as_str(), USERS], &[])
            .await?;

        match response.status_code() {
            StatusCode::OK => self.names_to_users(&response),
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::Group))),
            _ => Err(response.unknown_status()),
        }
    }

    /// Add a user (POST /groups/{name}/users/).
    ///
    /// A 404 names the missing resource (group or user) in its type.
    pub async fn add_user(&self, user: impl AsRef<str>) -> RestAuthResult<()> {
        let params = UserParams {
            user: user.as_ref(),
        };
        let response = self
            .resource()
            .post(&[self.name.as_str(), USERS], &params)
            .await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(response.not_found(None)),
            _ => Err(response.unknown_status()),
        }
    }

    /// Whether `user` is a member, directly or through a parent group
    /// (GET /groups/{name}/users/{user}/).
    ///
    /// Returns `false` if the user is not a member or does not exist; fails
    /// with `NotFound` if the group does not exist.
    pub async fn is_member(&self, user: impl AsRef<str>) -> RestAuthResult<bool> {
        let response = self
            .resource()
            .get(&[self.name.as_str(), USERS, user.as_ref()], &[])
            .await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => match response.resource_type() {
                Some(ResourceType::User) => Ok(false),
                _ => Err(RestAuthError::NotFound {
                    resource_type: Some(ResourceType::Group),
                }),
            },
            _ => Err(response.unknown_status()),
        }
    }

    /// Remove a user (DELETE /groups/{name}/users/{user}/).
    pub async fn remove_user(&self, user: impl AsRef<str>) -> RestAuthResult<()> {
        let response = self
            .resource()
            .delete(&[self.name.as_str(), USERS, user.as_ref()])
            .await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(response.not_found(None)),
            _ => Err(response.unknown_status()),
        }
    }

    /// Remove the group (DELETE /groups/{name}/).
    pub async fn remove(&self) -> RestAuthResult<()> {
        let response = self.resource().delete(&[self.name.as_str()]).await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => {
                info!(group = %self.name, "Removed group");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::Group))),
            _ => Err(response.unknown_status()),
        }
    }

    // ── Subgroups ─────────────────────────────────────────────────────

    /// Make `subgroup` a subgroup of this group; it inherits this group's
    /// members (POST /groups/{name}/groups/).
    pub async fn add_group(&self, subgroup: impl AsRef<str>) -> RestAuthResult<()> {
        let params = GroupParams {
            group: subgroup.as_ref(),
        };
        let response = self
            .resource()
            .post(&[self.name.as_str(), GROUPS], &params)
            .await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::Group))),
            _ => Err(response.unknown_status()),
        }
    }

    /// Direct subgroups only (GET /groups/{name}/groups/).
    pub async fn get_groups(&self) -> RestAuthResult<Vec<Group<'c>>> {
        let response = self
            .resource()
            .get(&[self.name.as_str(), GROUPS], &[])
            .await?;

        match response.status_code() {
            StatusCode::OK => {
                let names = decode_string_list(self.conn.content_handler(), response.body())?;
                Ok(names
                    .into_iter()
                    .map(|name| Self::new(self.conn, name))
                    .collect())
            }
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::Group))),
            _ => Err(response.unknown_status()),
        }
    }

    /// Remove a subgroup (DELETE /groups/{name}/groups/{subgroup}/).
    pub async fn remove_group(&self, subgroup: impl AsRef<str>) -> RestAuthResult<()> {
        let response = self
            .resource()
            .delete(&[self.name.as_str(), GROUPS, subgroup.as_ref()])
            .await?;

        match response.status_code() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(response.not_found(Some(ResourceType::Group))),
            _ => Err(response.unknown_status()),
        }
    }
}

impl AsRef<str> for Group<'_> {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Group<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group").field("name", &self.name).finish()
    }
}

impl std::fmt::Display for Group<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl PartialEq for Group<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Group<'_> {}

impl Hash for Group<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Group<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Group<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}
