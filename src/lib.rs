//! Libris - account and book REST API
//!
//! The HTTP surface is an immutable table of typed route descriptors. Each
//! route delegates to a service trait; the crate ships in-memory services so
//! the API can run standalone.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod service;

pub use api::{AppState, Capability, ResourceGroup, RouteDescriptor, RouteTable, create_router};
pub use config::ServerConfig;
pub use error::{ApiError, ServiceError, ServiceResult};
pub use service::{AccountService, BookService, MemoryAccountService, MemoryBookService, TokenVerifier};
