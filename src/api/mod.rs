//! REST API module

pub mod handlers;
pub mod models;
pub mod routes;
pub mod table;

pub use routes::{AppState, create_router};
pub use table::{Capability, ResourceGroup, RouteDescriptor, RouteTable};
