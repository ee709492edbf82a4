//! In-memory service implementations
//!
//! Development doubles for the account and book services. Passwords are
//! compared as given and access tokens are random UUIDs held in memory.

use super::{
    Account, AccountPatch, AccountService, Book, BookPatch, BookService, LoginRequest, NewAccount,
    NewBook, Principal, Session, TokenVerifier,
};
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Parse a path id into the store key; anything non-numeric cannot exist
fn parse_id(resource: &'static str, id: &str) -> ServiceResult<u64> {
    id.parse().map_err(|_| ServiceError::NotFound {
        resource,
        id: id.to_string(),
    })
}

fn require_non_empty(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(())
}

fn require_non_empty_opt(field: &str, value: &Option<String>) -> ServiceResult<()> {
    match value {
        Some(value) => require_non_empty(field, value),
        None => Ok(()),
    }
}

/// Account store keyed by numeric id, plus the open sessions
pub struct MemoryAccountService {
    accounts: Arc<RwLock<BTreeMap<u64, Account>>>,
    /// access token -> account id
    sessions: Arc<RwLock<HashMap<String, u64>>>,
    next_id: AtomicU64,
}

impl MemoryAccountService {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(BTreeMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored accounts
    pub async fn count(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Drop every session whose owner matches
    async fn revoke_sessions(&self, owned_by: impl Fn(u64) -> bool) {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, owner| !owned_by(*owner));

        let revoked = before - sessions.len();
        if revoked > 0 {
            tracing::info!(revoked, "Sessions revoked");
        }
    }

    fn login_name_taken(accounts: &BTreeMap<u64, Account>, login_name: &str, except: u64) -> bool {
        accounts
            .iter()
            .any(|(id, account)| *id != except && account.login_name == login_name)
    }

    fn apply_patch(account: &mut Account, patch: &AccountPatch) {
        if let Some(login_name) = &patch.login_name {
            account.login_name = login_name.clone();
        }
        if let Some(name) = &patch.name {
            account.name = name.clone();
        }
        if let Some(password) = &patch.password {
            account.password = password.clone();
        }
        account.updated_at = chrono::Utc::now();
    }

    fn validate_patch(patch: &AccountPatch) -> ServiceResult<()> {
        if patch.is_empty() {
            return Err(ServiceError::InvalidInput("empty update".to_string()));
        }
        require_non_empty_opt("login_name", &patch.login_name)?;
        require_non_empty_opt("name", &patch.name)?;
        require_non_empty_opt("password", &patch.password)
    }
}

impl Default for MemoryAccountService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountService for MemoryAccountService {
    async fn list(&self) -> ServiceResult<Vec<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> ServiceResult<Account> {
        let key = parse_id("account", id)?;
        let accounts = self.accounts.read().await;
        accounts
            .get(&key)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                resource: "account",
                id: id.to_string(),
            })
    }

    async fn login(&self, request: LoginRequest) -> ServiceResult<Session> {
        let account = {
            let accounts = self.accounts.read().await;
            accounts
                .values()
                .find(|a| a.login_name == request.login_name && a.password == request.password)
                .cloned()
                .ok_or_else(|| ServiceError::Unauthorized("bad credentials".to_string()))?
        };

        let key = parse_id("account", &account.id)?;
        let access_token = uuid::Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(access_token.clone(), key);

        tracing::info!(account = %account.id, "Session opened");

        Ok(Session {
            access_token,
            account,
        })
    }

    async fn register(&self, request: NewAccount) -> ServiceResult<Account> {
        require_non_empty("login_name", &request.login_name)?;
        require_non_empty("name", &request.name)?;
        require_non_empty("password", &request.password)?;

        let mut accounts = self.accounts.write().await;

        if Self::login_name_taken(&accounts, &request.login_name, 0) {
            return Err(ServiceError::Conflict(format!(
                "login_name '{}' already exists",
                request.login_name
            )));
        }

        let key = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = chrono::Utc::now();
        let account = Account {
            id: key.to_string(),
            login_name: request.login_name,
            name: request.name,
            password: request.password,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(key, account.clone());

        tracing::info!(
            account = %account.id,
            total_accounts = accounts.len(),
            "Account registered"
        );

        Ok(account)
    }

    async fn update(&self, id: &str, patch: AccountPatch) -> ServiceResult<Account> {
        Self::validate_patch(&patch)?;
        let key = parse_id("account", id)?;

        let mut accounts = self.accounts.write().await;

        if let Some(login_name) = &patch.login_name
            && Self::login_name_taken(&accounts, login_name, key)
        {
            return Err(ServiceError::Conflict(format!(
                "login_name '{}' already exists",
                login_name
            )));
        }

        let account = accounts
            .get_mut(&key)
            .ok_or_else(|| ServiceError::NotFound {
                resource: "account",
                id: id.to_string(),
            })?;
        Self::apply_patch(account, &patch);
        let account = account.clone();
        drop(accounts);

        if patch.password.is_some() {
            self.revoke_sessions(|owner| owner == key).await;
        }

        Ok(account)
    }

    async fn update_all(&self, patch: AccountPatch) -> ServiceResult<Vec<Account>> {
        Self::validate_patch(&patch)?;

        let mut accounts = self.accounts.write().await;

        // One login_name cannot be shared by several accounts
        if patch.login_name.is_some() && accounts.len() > 1 {
            return Err(ServiceError::Conflict(
                "login_name cannot be set on more than one account".to_string(),
            ));
        }

        for account in accounts.values_mut() {
            Self::apply_patch(account, &patch);
        }
        let updated: Vec<Account> = accounts.values().cloned().collect();
        drop(accounts);

        if patch.password.is_some() {
            self.revoke_sessions(|_| true).await;
        }

        Ok(updated)
    }

    async fn remove(&self, id: &str) -> ServiceResult<Account> {
        let key = parse_id("account", id)?;

        let account = self
            .accounts
            .write()
            .await
            .remove(&key)
            .ok_or_else(|| ServiceError::NotFound {
                resource: "account",
                id: id.to_string(),
            })?;

        self.revoke_sessions(|owner| owner == key).await;

        tracing::info!(account = %id, "Account removed");

        Ok(account)
    }

    async fn remove_all(&self) -> ServiceResult<usize> {
        let removed = {
            let mut accounts = self.accounts.write().await;
            let removed = accounts.len();
            accounts.clear();
            removed
        };
        self.revoke_sessions(|_| true).await;

        tracing::info!(removed, "All accounts removed");

        Ok(removed)
    }
}

#[async_trait]
impl TokenVerifier for MemoryAccountService {
    async fn verify(&self, token: &str) -> ServiceResult<Principal> {
        let key = self
            .sessions
            .read()
            .await
            .get(token)
            .copied()
            .ok_or_else(|| ServiceError::Unauthorized("unknown access token".to_string()))?;

        if !self.accounts.read().await.contains_key(&key) {
            return Err(ServiceError::Unauthorized(
                "token owner no longer exists".to_string(),
            ));
        }

        Ok(Principal {
            account_id: key.to_string(),
        })
    }
}

/// Book store keyed by numeric id
pub struct MemoryBookService {
    books: Arc<RwLock<BTreeMap<u64, Book>>>,
    next_id: AtomicU64,
}

impl MemoryBookService {
    pub fn new() -> Self {
        Self {
            books: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored books
    pub async fn count(&self) -> usize {
        self.books.read().await.len()
    }
}

impl Default for MemoryBookService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookService for MemoryBookService {
    async fn list(&self) -> ServiceResult<Vec<Book>> {
        let books = self.books.read().await;
        Ok(books.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> ServiceResult<Book> {
        let key = parse_id("book", id)?;
        let books = self.books.read().await;
        books.get(&key).cloned().ok_or_else(|| ServiceError::NotFound {
            resource: "book",
            id: id.to_string(),
        })
    }

    async fn create(&self, request: NewBook) -> ServiceResult<Book> {
        require_non_empty("title", &request.title)?;

        let key = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = chrono::Utc::now();
        let book = Book {
            id: key.to_string(),
            title: request.title,
            author: request.author,
            parts: request.parts,
            category: request.category,
            created_at: now,
            updated_at: now,
        };

        let mut books = self.books.write().await;
        books.insert(key, book.clone());

        tracing::info!(book = %book.id, total_books = books.len(), "Book created");

        Ok(book)
    }

    async fn update(&self, id: &str, patch: BookPatch) -> ServiceResult<Book> {
        if patch.is_empty() {
            return Err(ServiceError::InvalidInput("empty update".to_string()));
        }
        require_non_empty_opt("title", &patch.title)?;
        let key = parse_id("book", id)?;

        let mut books = self.books.write().await;
        let book = books.get_mut(&key).ok_or_else(|| ServiceError::NotFound {
            resource: "book",
            id: id.to_string(),
        })?;

        if let Some(title) = patch.title {
            book.title = title;
        }
        if let Some(author) = patch.author {
            book.author = author;
        }
        if let Some(parts) = patch.parts {
            book.parts = parts;
        }
        if let Some(category) = patch.category {
            book.category = category;
        }
        book.updated_at = chrono::Utc::now();

        Ok(book.clone())
    }

    async fn remove(&self, id: &str) -> ServiceResult<Book> {
        let key = parse_id("book", id)?;

        let book = self
            .books
            .write()
            .await
            .remove(&key)
            .ok_or_else(|| ServiceError::NotFound {
                resource: "book",
                id: id.to_string(),
            })?;

        tracing::info!(book = %id, "Book removed");

        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(login_name: &str) -> NewAccount {
        NewAccount {
            login_name: login_name.to_string(),
            name: "Test User".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_allocates_sequential_ids() {
        let service = MemoryAccountService::new();

        let first = service.register(new_account("first")).await.unwrap();
        let second = service.register(new_account("second")).await.unwrap();

        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");
        assert_eq!(service.count().await, 2);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_login_name() {
        let service = MemoryAccountService::new();
        service.register(new_account("dup")).await.unwrap();

        let result = service.register(new_account("dup")).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_fields() {
        let service = MemoryAccountService::new();
        let mut request = new_account("blank");
        request.password = "   ".to_string();

        let result = service.register(request).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_login_and_verify() {
        let service = MemoryAccountService::new();
        let account = service.register(new_account("ada")).await.unwrap();

        let session = service
            .login(LoginRequest {
                login_name: "ada".to_string(),
                password: "hunter2".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(session.account.id, account.id);

        let principal = service.verify(&session.access_token).await.unwrap();
        assert_eq!(principal.account_id, account.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = MemoryAccountService::new();
        service.register(new_account("ada")).await.unwrap();

        let result = service
            .login(LoginRequest {
                login_name: "ada".to_string(),
                password: "wrong".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_token_revoked_when_account_removed() {
        let service = MemoryAccountService::new();
        let account = service.register(new_account("gone")).await.unwrap();
        let session = service
            .login(LoginRequest {
                login_name: "gone".to_string(),
                password: "hunter2".to_string(),
            })
            .await
            .unwrap();

        service.remove(&account.id).await.unwrap();

        assert!(service.verify(&session.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_update_rejects_taken_login_name() {
        let service = MemoryAccountService::new();
        service.register(new_account("taken")).await.unwrap();
        let other = service.register(new_account("other")).await.unwrap();

        let patch = AccountPatch {
            login_name: Some("taken".to_string()),
            ..Default::default()
        };
        let result = service.update(&other.id, patch).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_empty_patch_is_invalid() {
        let service = MemoryAccountService::new();
        let account = service.register(new_account("ada")).await.unwrap();

        let result = service.update(&account.id, AccountPatch::default()).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_update_all_and_remove_all() {
        let service = MemoryAccountService::new();
        service.register(new_account("a")).await.unwrap();
        service.register(new_account("b")).await.unwrap();

        let patch = AccountPatch {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = service.update_all(patch).await.unwrap();
        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|a| a.name == "Renamed"));

        assert_eq!(service.remove_all().await.unwrap(), 2);
        assert_eq!(service.count().await, 0);
    }

    #[tokio::test]
    async fn test_update_all_login_name_on_many_is_conflict() {
        let service = MemoryAccountService::new();
        service.register(new_account("a")).await.unwrap();
        service.register(new_account("b")).await.unwrap();

        let patch = AccountPatch {
            login_name: Some("x".to_string()),
            ..Default::default()
        };
        let result = service.update_all(patch).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));

        // Nothing was applied
        let accounts = service.list().await.unwrap();
        assert_eq!(accounts[0].login_name, "a");
        assert_eq!(accounts[1].login_name, "b");
    }

    #[tokio::test]
    async fn test_update_all_login_name_on_single_account() {
        let service = MemoryAccountService::new();
        service.register(new_account("only")).await.unwrap();

        let patch = AccountPatch {
            login_name: Some("renamed".to_string()),
            ..Default::default()
        };
        let updated = service.update_all(patch).await.unwrap();
        assert_eq!(updated[0].login_name, "renamed");
    }

    #[tokio::test]
    async fn test_password_change_revokes_tokens() {
        let service = MemoryAccountService::new();
        let account = service.register(new_account("ada")).await.unwrap();
        let bystander = service.register(new_account("grace")).await.unwrap();

        let login = |login_name: &str| LoginRequest {
            login_name: login_name.to_string(),
            password: "hunter2".to_string(),
        };
        let session = service.login(login("ada")).await.unwrap();
        let other = service.login(login("grace")).await.unwrap();

        // A name change keeps the session
        let patch = AccountPatch {
            name: Some("Ada".to_string()),
            ..Default::default()
        };
        service.update(&account.id, patch).await.unwrap();
        assert!(service.verify(&session.access_token).await.is_ok());

        let patch = AccountPatch {
            password: Some("correct horse".to_string()),
            ..Default::default()
        };
        service.update(&account.id, patch).await.unwrap();

        assert!(service.verify(&session.access_token).await.is_err());
        let principal = service.verify(&other.access_token).await.unwrap();
        assert_eq!(principal.account_id, bystander.id);
    }

    #[tokio::test]
    async fn test_bulk_password_change_revokes_all_tokens() {
        let service = MemoryAccountService::new();
        service.register(new_account("a")).await.unwrap();
        service.register(new_account("b")).await.unwrap();
        let session = service
            .login(LoginRequest {
                login_name: "b".to_string(),
                password: "hunter2".to_string(),
            })
            .await
            .unwrap();

        let patch = AccountPatch {
            password: Some("rotated".to_string()),
            ..Default::default()
        };
        service.update_all(patch).await.unwrap();

        assert!(service.verify(&session.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_lists_are_ordered_by_id() {
        let accounts = MemoryAccountService::new();
        for n in 0..12 {
            accounts
                .register(new_account(&format!("user{}", n)))
                .await
                .unwrap();
        }
        let ids: Vec<String> = accounts
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        let expected: Vec<String> = (1..=12).map(|n: u64| n.to_string()).collect();
        assert_eq!(ids, expected);

        let books = MemoryBookService::new();
        for n in 0..12 {
            books
                .create(NewBook {
                    title: format!("Volume {}", n),
                    author: String::new(),
                    parts: String::new(),
                    category: String::new(),
                })
                .await
                .unwrap();
        }
        // Removing one keeps the rest in numeric, not lexical, order
        books.remove("2").await.unwrap();
        let ids: Vec<String> = books
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        let expected: Vec<String> = (1..=12u64)
            .filter(|n| *n != 2)
            .map(|n| n.to_string())
            .collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_not_found() {
        let service = MemoryBookService::new();
        let result = service.get("abc").await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_book_lifecycle() {
        let service = MemoryBookService::new();

        let book = service
            .create(NewBook {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                parts: "1".to_string(),
                category: "sci-fi".to_string(),
            })
            .await
            .unwrap();

        let patch = BookPatch {
            category: Some("classic".to_string()),
            ..Default::default()
        };
        let updated = service.update(&book.id, patch).await.unwrap();
        assert_eq!(updated.category, "classic");
        assert_eq!(updated.title, "Dune");

        service.remove(&book.id).await.unwrap();
        assert_eq!(service.count().await, 0);
        assert!(service.get(&book.id).await.is_err());
    }

    #[tokio::test]
    async fn test_book_requires_title() {
        let service = MemoryBookService::new();
        let result = service
            .create(NewBook {
                title: String::new(),
                author: String::new(),
                parts: String::new(),
                category: String::new(),
            })
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }
}
