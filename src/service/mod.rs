//! Service layer seams
//!
//! Handlers only talk to these traits. The in-memory implementations in
//! [`memory`] back the binary and the integration tests.

use async_trait::async_trait;

pub mod account;
pub mod book;
pub mod memory;

pub use account::{Account, AccountPatch, LoginRequest, NewAccount, Session};
pub use book::{Book, BookPatch, NewBook};
pub use memory::{MemoryAccountService, MemoryBookService};

use crate::error::ServiceResult;

/// Account the verified access token belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: String,
}

/// Account operations reachable from the account routes
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn list(&self) -> ServiceResult<Vec<Account>>;

    async fn get(&self, id: &str) -> ServiceResult<Account>;

    /// Check credentials and open a session
    async fn login(&self, request: LoginRequest) -> ServiceResult<Session>;

    /// Create an account; serves both the register and create routes
    async fn register(&self, request: NewAccount) -> ServiceResult<Account>;

    async fn update(&self, id: &str, patch: AccountPatch) -> ServiceResult<Account>;

    /// Apply one patch to every account
    async fn update_all(&self, patch: AccountPatch) -> ServiceResult<Vec<Account>>;

    async fn remove(&self, id: &str) -> ServiceResult<Account>;

    /// Remove every account, returning how many were removed
    async fn remove_all(&self) -> ServiceResult<usize>;
}

/// Book operations reachable from the book routes
#[async_trait]
pub trait BookService: Send + Sync {
    async fn list(&self) -> ServiceResult<Vec<Book>>;

    async fn get(&self, id: &str) -> ServiceResult<Book>;

    async fn create(&self, request: NewBook) -> ServiceResult<Book>;

    async fn update(&self, id: &str, patch: BookPatch) -> ServiceResult<Book>;

    async fn remove(&self, id: &str) -> ServiceResult<Book>;
}

/// Resolves access tokens for the `/auth/` routes
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> ServiceResult<Principal>;
}
