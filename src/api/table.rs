//! Route table: typed bindings of method + path to capability
//!
//! The table is built once at startup and never mutated. Capabilities are
//! split per resource group, so a binding such as "book login" cannot be
//! written down at all.

use crate::error::ApiError;
use axum::http::Method;
use axum::routing::MethodFilter;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use AccountCapability as A;
use BookCapability as B;
use HttpMethod::{Delete, Get, Post, Put};

/// Marker segment for routes that require an access token
const AUTH_SEGMENT: &str = "auth";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("Duplicate binding {method} {path} (already bound to {existing})")]
    Duplicate {
        method: HttpMethod,
        path: &'static str,
        existing: &'static str,
    },

    #[error("Invalid route path '{0}': must start with '/'")]
    InvalidPath(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_method(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    pub fn filter(self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
            HttpMethod::Put => MethodFilter::PUT,
            HttpMethod::Delete => MethodFilter::DELETE,
        }
    }

    /// Map an HTTP method onto the table's method set
    pub fn from_method(method: &Method) -> Option<Self> {
        [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Delete,
        ]
        .into_iter()
        .find(|m| m.as_method() == *method)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_method().as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceGroup {
    Account,
    Book,
}

impl ResourceGroup {
    pub fn name(self) -> &'static str {
        match self {
            ResourceGroup::Account => "account",
            ResourceGroup::Book => "book",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountCapability {
    GetAll,
    GetOne,
    Login,
    Register,
    /// Same service operation as `Register`, reached from the collection path
    Create,
    Update,
    Updates,
    Delete,
    Deletes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookCapability {
    GetAll,
    GetOne,
    Create,
    Update,
    Delete,
}

/// Named service operation a route delegates to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Account(AccountCapability),
    Book(BookCapability),
}

impl Capability {
    pub fn group(self) -> ResourceGroup {
        match self {
            Capability::Account(_) => ResourceGroup::Account,
            Capability::Book(_) => ResourceGroup::Book,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Capability::Account(c) => match c {
                AccountCapability::GetAll => "getAll",
                AccountCapability::GetOne => "getOne",
                AccountCapability::Login => "login",
                AccountCapability::Register => "register",
                AccountCapability::Create => "create",
                AccountCapability::Update => "update",
                AccountCapability::Updates => "updates",
                AccountCapability::Delete => "delete",
                AccountCapability::Deletes => "deletes",
            },
            Capability::Book(c) => match c {
                BookCapability::GetAll => "getAll",
                BookCapability::GetOne => "getOne",
                BookCapability::Create => "create",
                BookCapability::Update => "update",
                BookCapability::Delete => "delete",
            },
        }
    }

    /// Error reported when the service call behind this capability fails
    pub fn failure(self) -> ApiError {
        match self {
            Capability::Account(AccountCapability::GetAll) => ApiError::Fail("unavailable_account"),
            Capability::Account(AccountCapability::Login) => ApiError::Unauthorized("login_fail"),
            Capability::Account(_) => ApiError::Fail("invalid input"),
            Capability::Book(c) => ApiError::Fail(match c {
                BookCapability::GetAll => "get_list_book_fail",
                BookCapability::GetOne => "get_book_fail",
                BookCapability::Create => "create_book_fail",
                BookCapability::Update => "update_book_fail",
                BookCapability::Delete => "delete_book_fail",
            }),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group().name(), self.name())
    }
}

/// One binding of method + path template to a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub method: HttpMethod,
    /// Path template; segments starting with ':' are placeholders
    pub path: &'static str,
    pub capability: Capability,
}

impl RouteDescriptor {
    pub const fn new(method: HttpMethod, path: &'static str, capability: Capability) -> Self {
        Self {
            method,
            path,
            capability,
        }
    }

    pub fn group(&self) -> ResourceGroup {
        self.capability.group()
    }

    /// Routes under an `/auth/` segment require an access token
    pub fn auth_required(&self) -> bool {
        self.path.split('/').any(|segment| segment == AUTH_SEGMENT)
    }

    /// Path in axum's `{param}` syntax
    pub fn axum_path(&self) -> String {
        self.path
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(param) => format!("{{{}}}", param),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    fn placeholder_count(&self) -> usize {
        self.path.split('/').filter(|s| s.starts_with(':')).count()
    }

    /// Path with placeholder names erased, so `/x/:id` and `/x/:key` compare equal
    fn shape(&self) -> String {
        self.path
            .split('/')
            .map(|segment| if segment.starts_with(':') { ":" } else { segment })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Whether a concrete request path matches this template
    pub fn matches(&self, path: &str) -> bool {
        let mut template = self.path.split('/');
        let mut concrete = path.split('/');

        loop {
            match (template.next(), concrete.next()) {
                (None, None) => return true,
                (Some(t), Some(c)) if t.starts_with(':') => {
                    if c.is_empty() {
                        return false;
                    }
                }
                (Some(t), Some(c)) if t == c => {}
                _ => return false,
            }
        }
    }
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.method, self.path, self.capability)
    }
}

/// The account and book API surface
pub const STANDARD_ROUTES: &[RouteDescriptor] = &[
    // Accounts
    RouteDescriptor::new(Get, "/api/v1/auth/accounts", Capability::Account(A::GetAll)),
    RouteDescriptor::new(Get, "/api/v1/auth/accounts/:id", Capability::Account(A::GetOne)),
    RouteDescriptor::new(Post, "/api/v1/accounts/login", Capability::Account(A::Login)),
    RouteDescriptor::new(Post, "/api/v1/accounts/register", Capability::Account(A::Register)),
    RouteDescriptor::new(Post, "/api/v1/accounts", Capability::Account(A::Create)),
    RouteDescriptor::new(Put, "/api/v1/auth/accounts/:id", Capability::Account(A::Update)),
    RouteDescriptor::new(Put, "/api/v1/auth/accounts", Capability::Account(A::Updates)),
    RouteDescriptor::new(Delete, "/api/v1/auth/accounts/:id", Capability::Account(A::Delete)),
    RouteDescriptor::new(Delete, "/api/v1/auth/accounts", Capability::Account(A::Deletes)),
    // Books
    RouteDescriptor::new(Get, "/api/v1/books", Capability::Book(B::GetAll)),
    RouteDescriptor::new(Get, "/api/v1/books/:id", Capability::Book(B::GetOne)),
    RouteDescriptor::new(Post, "/api/v1/auth/books", Capability::Book(B::Create)),
    RouteDescriptor::new(Put, "/api/v1/auth/books/:id", Capability::Book(B::Update)),
    RouteDescriptor::new(Delete, "/api/v1/auth/books/:id", Capability::Book(B::Delete)),
];

/// Immutable, validated set of route descriptors
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// Build a table, rejecting any (method, path) bound more than once
    pub fn new(routes: Vec<RouteDescriptor>) -> Result<Self, RouteTableError> {
        let mut seen: HashSet<(HttpMethod, String)> = HashSet::new();

        for (index, route) in routes.iter().enumerate() {
            if !route.path.starts_with('/') {
                return Err(RouteTableError::InvalidPath(route.path));
            }

            if !seen.insert((route.method, route.shape())) {
                let existing = routes[..index]
                    .iter()
                    .find(|r| r.method == route.method && r.shape() == route.shape())
                    .map(|r| r.capability.name())
                    .unwrap_or("unknown");
                return Err(RouteTableError::Duplicate {
                    method: route.method,
                    path: route.path,
                    existing,
                });
            }
        }

        Ok(Self { routes })
    }

    /// The table in [`STANDARD_ROUTES`], taken as-is
    ///
    /// Callers that build the serving router should go through
    /// [`RouteTable::new`] so the bindings are checked at startup.
    pub fn standard() -> Self {
        Self {
            routes: STANDARD_ROUTES.to_vec(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes belonging to one resource group
    pub fn group(&self, group: ResourceGroup) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter().filter(move |r| r.group() == group)
    }

    /// Find the descriptor a concrete request resolves to
    ///
    /// Literal segments win over placeholders when both match.
    pub fn resolve(&self, method: HttpMethod, path: &str) -> Option<&RouteDescriptor> {
        self.routes
            .iter()
            .filter(|r| r.method == method && r.matches(path))
            .min_by_key(|r| r.placeholder_count())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}
