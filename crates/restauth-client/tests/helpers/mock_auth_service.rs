//! Mock RestAuth service using wiremock for integration testing.
//!
//! Mounts a stateful responder that keeps users, passwords, properties and
//! groups in memory and answers like the real service, including the
//! `Resource-Type` header on 404 responses. Single endpoints can be
//! overridden with canned responses.

#![allow(dead_code)]

use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use restauth_client::{RestAuthConnection, ServiceCredentials};

pub const SERVICE_USER: &str = "service";
pub const SERVICE_PASSWORD: &str = "service-secret";

/// Shortest password the mock service accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

const JSON: &str = "application/json";

#[derive(Debug, Default, Clone)]
struct UserRecord {
    password: Option<String>,
    properties: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone)]
struct GroupRecord {
    users: BTreeSet<String>,
    subgroups: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct ServiceState {
    users: BTreeMap<String, UserRecord>,
    groups: BTreeMap<String, GroupRecord>,
}

impl ServiceState {
    /// Members of `group`, including those inherited from parent groups.
    fn members(&self, group: &str) -> BTreeSet<String> {
        let mut members = BTreeSet::new();
        let mut visited = BTreeSet::new();
        self.collect_members(group, &mut members, &mut visited);
        members
    }

    fn collect_members(
        &self,
        group: &str,
        members: &mut BTreeSet<String>,
        visited: &mut BTreeSet<String>,
    ) {
        if !visited.insert(group.to_string()) {
            return;
        }
        if let Some(record) = self.groups.get(group) {
            members.extend(record.users.iter().cloned());
        }
        for (parent, record) in &self.groups {
            if record.subgroups.contains(group) {
                self.collect_members(parent, members, visited);
            }
        }
    }
}

/// A mock RestAuth service backed by in-memory state.
pub struct MockAuthService {
    server: MockServer,
    state: Arc<Mutex<ServiceState>>,
}

impl MockAuthService {
    /// Start a mock service that accepts the default service credentials.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(ServiceState::default()));
        let authorization =
            ServiceCredentials::new(SERVICE_USER, SERVICE_PASSWORD).authorization_header();

        Mock::given(any())
            .respond_with(AuthServiceResponder {
                state: Arc::clone(&state),
                authorization,
            })
            .with_priority(10)
            .mount(&server)
            .await;

        Self { server, state }
    }

    /// Get the base URI of the mock server.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Create a connection with the default service credentials.
    pub fn connection(&self) -> RestAuthConnection {
        self.connection_as(SERVICE_USER, SERVICE_PASSWORD)
    }

    /// Create a connection with specific service credentials.
    pub fn connection_as(&self, username: &str, password: &str) -> RestAuthConnection {
        RestAuthConnection::with_http_client(
            self.uri(),
            ServiceCredentials::new(username, password),
            reqwest::Client::new(),
        )
    }

    /// Override one endpoint with a canned response.
    pub async fn respond_to(&self, http_method: &str, request_path: &str, template: ResponseTemplate) {
        Mock::given(method(http_method))
            .and(path(request_path))
            .respond_with(template)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Number of requests received so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    pub fn seed_user(&self, name: &str, password: Option<&str>) {
        self.state.lock().unwrap().users.insert(
            name.to_string(),
            UserRecord {
                password: password.map(str::to_string),
                properties: BTreeMap::new(),
            },
        );
    }

    pub fn seed_property(&self, user: &str, key: &str, value: &str) {
        let mut state = self.state.lock().unwrap();
        let record = state.users.get_mut(user).expect("seeded user");
        record.properties.insert(key.to_string(), value.to_string());
    }

    pub fn seed_group(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .groups
            .insert(name.to_string(), GroupRecord::default());
    }

    pub fn seed_membership(&self, group: &str, user: &str) {
        let mut state = self.state.lock().unwrap();
        let record = state.groups.get_mut(group).expect("seeded group");
        record.users.insert(user.to_string());
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn has_user(&self, name: &str) -> bool {
        self.state.lock().unwrap().users.contains_key(name)
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.state.lock().unwrap().groups.contains_key(name)
    }

    pub fn password(&self, user: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .users
            .get(user)
            .and_then(|record| record.password.clone())
    }

    pub fn property(&self, user: &str, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .users
            .get(user)
            .and_then(|record| record.properties.get(key).cloned())
    }

    pub fn direct_members(&self, group: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .groups
            .get(group)
            .map(|record| record.users.iter().cloned().collect())
            .unwrap_or_default()
    }
}

// =============================================================================
// Stateful responder
// =============================================================================

struct AuthServiceResponder {
    state: Arc<Mutex<ServiceState>>,
    authorization: String,
}

impl Respond for AuthServiceResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if header_value(request, "authorization") != Some(self.authorization.as_str()) {
            return ResponseTemplate::new(401);
        }
        if header_value(request, "accept") != Some(JSON) {
            return ResponseTemplate::new(406);
        }

        let body = if request.body.is_empty() {
            Value::Object(Map::new())
        } else {
            if header_value(request, "content-type") != Some(JSON) {
                return ResponseTemplate::new(415);
            }
            match serde_json::from_slice::<Value>(&request.body) {
                Ok(body @ Value::Object(_)) => body,
                _ => return ResponseTemplate::new(400),
            }
        };

        let raw_path = request.url.path();
        if !raw_path.ends_with('/') {
            return ResponseTemplate::new(404);
        }
        let segments: Vec<String> = raw_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                urlencoding::decode(segment)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| segment.to_string())
            })
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let member_filter = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "user")
            .map(|(_, value)| value.into_owned());

        let mut state = self.state.lock().unwrap();
        route(
            &mut state,
            request.method.as_str(),
            &segments,
            &body,
            member_filter.as_deref(),
        )
    }
}

fn route(
    state: &mut ServiceState,
    http_method: &str,
    segments: &[&str],
    body: &Value,
    member_filter: Option<&str>,
) -> ResponseTemplate {
    match (http_method, segments) {
        // Users
        ("GET", &["users"]) => {
            let names: Vec<&String> = state.users.keys().collect();
            ResponseTemplate::new(200).set_body_json(json!(names))
        }
        ("POST", &["users"]) => create_user(state, body, false),
        ("POST", &["test", "users"]) => create_user(state, body, true),
        ("GET", &["users", user]) => match state.users.get(user) {
            Some(_) => ResponseTemplate::new(204),
            None => not_found("user"),
        },
        ("PUT", &["users", user]) => {
            let password = str_field(body, "password").filter(|p| !p.is_empty());
            if let Some(p) = password {
                if !valid_password(p) {
                    return precondition_failed("password too short");
                }
            }
            match state.users.get_mut(user) {
                Some(record) => {
                    record.password = password.map(str::to_string);
                    ResponseTemplate::new(204)
                }
                None => not_found("user"),
            }
        }
        ("POST", &["users", user]) => {
            let given = str_field(body, "password");
            match state.users.get(user) {
                Some(record) if record.password.is_some() && record.password.as_deref() == given => {
                    ResponseTemplate::new(204)
                }
                _ => not_found("user"),
            }
        }
        ("DELETE", &["users", user]) => {
            if state.users.remove(user).is_none() {
                return not_found("user");
            }
            for record in state.groups.values_mut() {
                record.users.remove(user);
            }
            ResponseTemplate::new(204)
        }

        // Properties
        ("GET", &["users", user, "props"]) => match state.users.get(user) {
            Some(record) => ResponseTemplate::new(200).set_body_json(json!(record.properties)),
            None => not_found("user"),
        },
        ("POST", &["users", user, "props"]) => {
            let Some(record) = state.users.get_mut(user) else {
                return not_found("user");
            };
            match single_property(body) {
                Some((key, value)) => {
                    if record.properties.contains_key(key) {
                        return ResponseTemplate::new(409);
                    }
                    record.properties.insert(key.to_string(), value.to_string());
                    ResponseTemplate::new(201)
                }
                None => {
                    let Some(properties) = string_map(body) else {
                        return ResponseTemplate::new(400);
                    };
                    record.properties.extend(properties);
                    ResponseTemplate::new(204)
                }
            }
        }
        ("POST", &["test", "users", user, "props"]) => {
            let Some(record) = state.users.get(user) else {
                return not_found("user");
            };
            match single_property(body) {
                Some((key, _)) if record.properties.contains_key(key) => ResponseTemplate::new(409),
                Some(_) => ResponseTemplate::new(201),
                None => ResponseTemplate::new(400),
            }
        }
        ("GET", &["users", user, "props", key]) => {
            let Some(record) = state.users.get(user) else {
                return not_found("user");
            };
            match record.properties.get(key) {
                Some(value) => ResponseTemplate::new(200).set_body_json(json!(value)),
                None => not_found("property"),
            }
        }
        ("PUT", &["users", user, "props", key]) => {
            let Some(record) = state.users.get_mut(user) else {
                return not_found("user");
            };
            let Some(value) = str_field(body, "value") else {
                return ResponseTemplate::new(400);
            };
            match record.properties.insert(key.to_string(), value.to_string()) {
                Some(previous) => ResponseTemplate::new(200).set_body_json(json!(previous)),
                None => ResponseTemplate::new(201),
            }
        }
        ("DELETE", &["users", user, "props", key]) => {
            let Some(record) = state.users.get_mut(user) else {
                return not_found("user");
            };
            match record.properties.remove(key) {
                Some(_) => ResponseTemplate::new(204),
                None => not_found("property"),
            }
        }

        // Groups
        ("GET", &["groups"]) => match member_filter {
            Some(user) => {
                if !state.users.contains_key(user) {
                    return not_found("user");
                }
                let names: Vec<&String> = state
                    .groups
                    .keys()
                    .filter(|group| state.members(group).contains(user))
                    .collect();
                ResponseTemplate::new(200).set_body_json(json!(names))
            }
            None => {
                let names: Vec<&String> = state.groups.keys().collect();
                ResponseTemplate::new(200).set_body_json(json!(names))
            }
        },
        ("POST", &["groups"]) => create_group(state, body, false),
        ("POST", &["test", "groups"]) => create_group(state, body, true),
        ("GET", &["groups", group]) => match state.groups.get(group) {
            Some(_) => ResponseTemplate::new(204),
            None => not_found("group"),
        },
        ("DELETE", &["groups", group]) => {
            if state.groups.remove(group).is_none() {
                return not_found("group");
            }
            for record in state.groups.values_mut() {
                record.subgroups.remove(group);
            }
            ResponseTemplate::new(204)
        }

        // Group members
        ("GET", &["groups", group, "users"]) => {
            if !state.groups.contains_key(group) {
                return not_found("group");
            }
            let members: Vec<String> = state.members(group).into_iter().collect();
            ResponseTemplate::new(200).set_body_json(json!(members))
        }
        ("POST", &["groups", group, "users"]) => {
            let Some(user) = str_field(body, "user") else {
                return ResponseTemplate::new(400);
            };
            if !state.groups.contains_key(group) {
                return not_found("group");
            }
            if !state.users.contains_key(user) {
                return not_found("user");
            }
            if let Some(record) = state.groups.get_mut(group) {
                record.users.insert(user.to_string());
            }
            ResponseTemplate::new(204)
        }
        ("GET", &["groups", group, "users", user]) => {
            if !state.groups.contains_key(group) {
                return not_found("group");
            }
            if state.users.contains_key(user) && state.members(group).contains(user) {
                ResponseTemplate::new(204)
            } else {
                not_found("user")
            }
        }
        ("DELETE", &["groups", group, "users", user]) => {
            let Some(record) = state.groups.get_mut(group) else {
                return not_found("group");
            };
            if record.users.remove(user) {
                ResponseTemplate::new(204)
            } else {
                not_found("user")
            }
        }

        // Subgroups
        ("GET", &["groups", group, "groups"]) => match state.groups.get(group) {
            Some(record) => {
                let names: Vec<&String> = record.subgroups.iter().collect();
                ResponseTemplate::new(200).set_body_json(json!(names))
            }
            None => not_found("group"),
        },
        ("POST", &["groups", group, "groups"]) => {
            let Some(subgroup) = str_field(body, "group") else {
                return ResponseTemplate::new(400);
            };
            if !state.groups.contains_key(subgroup) {
                return not_found("group");
            }
            match state.groups.get_mut(group) {
                Some(record) => {
                    record.subgroups.insert(subgroup.to_string());
                    ResponseTemplate::new(204)
                }
                None => not_found("group"),
            }
        }
        ("DELETE", &["groups", group, "groups", subgroup]) => {
            let removed = state
                .groups
                .get_mut(group)
                .is_some_and(|record| record.subgroups.remove(subgroup));
            if removed {
                ResponseTemplate::new(204)
            } else {
                not_found("group")
            }
        }

        _ => ResponseTemplate::new(404),
    }
}

fn create_user(state: &mut ServiceState, body: &Value, dry_run: bool) -> ResponseTemplate {
    let Some(name) = str_field(body, "user") else {
        return ResponseTemplate::new(400);
    };
    if !valid_name(name) {
        return precondition_failed("invalid username");
    }
    let password = str_field(body, "password");
    if let Some(p) = password {
        if !valid_password(p) {
            return precondition_failed("password too short");
        }
    }
    if state.users.contains_key(name) {
        return ResponseTemplate::new(409);
    }

    let groups: Vec<&str> = body
        .get("groups")
        .and_then(Value::as_array)
        .map(|groups| groups.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if groups.iter().any(|group| !state.groups.contains_key(*group)) {
        return not_found("group");
    }
    if dry_run {
        return ResponseTemplate::new(201);
    }

    let properties = body
        .get("properties")
        .and_then(string_map)
        .unwrap_or_default();
    state.users.insert(
        name.to_string(),
        UserRecord {
            password: password.map(str::to_string),
            properties,
        },
    );
    for group in groups {
        if let Some(record) = state.groups.get_mut(group) {
            record.users.insert(name.to_string());
        }
    }
    ResponseTemplate::new(201)
}

fn create_group(state: &mut ServiceState, body: &Value, dry_run: bool) -> ResponseTemplate {
    let Some(name) = str_field(body, "group") else {
        return ResponseTemplate::new(400);
    };
    if !valid_name(name) {
        return precondition_failed("invalid group name");
    }
    if state.groups.contains_key(name) {
        return ResponseTemplate::new(409);
    }
    if !dry_run {
        state.groups.insert(name.to_string(), GroupRecord::default());
    }
    ResponseTemplate::new(201)
}

fn header_value<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
}

fn str_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

/// `{prop, value}` body of a single property creation.
fn single_property(body: &Value) -> Option<(&str, &str)> {
    let object = body.as_object()?;
    if object.len() != 2 {
        return None;
    }
    Some((str_field(body, "prop")?, str_field(body, "value")?))
}

fn string_map(value: &Value) -> Option<BTreeMap<String, String>> {
    value
        .as_object()?
        .iter()
        .map(|(key, value)| Some((key.clone(), value.as_str()?.to_string())))
        .collect()
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(':') && !name.chars().any(char::is_control)
}

fn valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

fn not_found(resource_type: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).insert_header("Resource-Type", resource_type)
}

fn precondition_failed(reason: &str) -> ResponseTemplate {
    ResponseTemplate::new(412).set_body_string(reason)
}
