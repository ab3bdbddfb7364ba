//! Collection-prefixed access to the connection verbs.
//!
//! Users live under `/users/`, groups under `/groups/`. Dry-run creates are
//! sent to the same collections below `/test/`.

use serde::Serialize;

use crate::connection::{RequestPath, RestAuthConnection};
use crate::error::RestAuthResult;
use crate::response::Response;

/// A collection root on the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// `/users/`
    Users,
    /// `/groups/`
    Groups,
    /// `/test/users/`: validate without persisting.
    TestUsers,
    /// `/test/groups/`: validate without persisting.
    TestGroups,
}

impl Collection {
    /// Path segments of the collection root.
    #[must_use]
    pub fn segments(&self) -> &'static [&'static str] {
        match self {
            Self::Users => &["users"],
            Self::Groups => &["groups"],
            Self::TestUsers => &["test", "users"],
            Self::TestGroups => &["test", "groups"],
        }
    }
}

/// Connection verbs scoped to one collection.
///
/// Paths are given as raw segments relative to the collection root; each
/// segment is encoded on its own. Errors propagate unchanged from the
/// connection.
#[derive(Debug, Clone, Copy)]
pub struct Resource<'c> {
    conn: &'c RestAuthConnection,
    collection: Collection,
}

impl<'c> Resource<'c> {
    #[must_use]
    pub fn new(conn: &'c RestAuthConnection, collection: Collection) -> Self {
        Self { conn, collection }
    }

    /// The connection requests are sent through.
    #[must_use]
    pub fn connection(&self) -> &'c RestAuthConnection {
        self.conn
    }

    /// Full request path for `segments` below the collection root.
    ///
    /// Fails with `InvalidName` before any I/O if a segment is `.` or `..`.
    pub fn path(&self, segments: &[&str]) -> RestAuthResult<RequestPath> {
        RequestPath::from_segments(
            self.collection
                .segments()
                .iter()
                .chain(segments.iter())
                .copied(),
        )
    }

    pub async fn get(&self, segments: &[&str], query: &[(&str, &str)]) -> RestAuthResult<Response> {
        self.conn.get(self.path(segments)?, query).await
    }

    pub async fn post<P: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        params: &P,
    ) -> RestAuthResult<Response> {
        self.conn.post(self.path(segments)?, params).await
    }

    pub async fn put<P: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        params: &P,
    ) -> RestAuthResult<Response> {
        self.conn.put(self.path(segments)?, params).await
    }

    pub async fn delete(&self, segments: &[&str]) -> RestAuthResult<Response> {
        self.conn.delete(self.path(segments)?).await
    }
}
