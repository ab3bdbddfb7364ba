//! # RestAuth Client
//!
//! Client library for the RestAuth authentication and authorization service.
//!
//! RestAuth stores users (with optional passwords and free-form string
//! properties) and groups (with user members and subgroups). A service
//! account authenticates every request with HTTP Basic credentials; request
//! and response bodies are JSON by default.
//!
//! ## Features
//!
//! - Authenticated connection with per-segment path encoding
//! - User, password and property management
//! - Group membership with inheritance through subgroups
//! - Typed errors for every status code the service documents
//! - Dry-run creation of users, groups and properties
//!
//! ## Example
//!
//! ```ignore
//! use restauth_client::{Group, RestAuthConnection, User};
//!
//! let conn = RestAuthConnection::new("https://auth.example.com", "service", "secret")?;
//!
//! let alice = User::create(&conn, "alice", Some("wonderland")).await?;
//! assert!(alice.verify_password("wonderland").await?);
//!
//! let admins = Group::create(&conn, "admins").await?;
//! admins.add_user(&alice).await?;
//! assert!(alice.in_group("admins").await?);
//! ```

pub mod config;
pub mod connection;
pub mod content;
pub mod error;
pub mod group;
pub mod resource;
pub mod response;
pub mod user;

// Re-exports
pub use config::ConnectionConfig;
pub use connection::{sanitize_path, RequestPath, RestAuthConnection, ServiceCredentials};
pub use content::{ContentHandler, JsonHandler, JSON_MIME_TYPE};
pub use error::{ResourceType, RestAuthError, RestAuthResult};
pub use group::Group;
pub use resource::{Collection, Resource};
pub use response::Response;
pub use user::{CreateUserRequest, User};
