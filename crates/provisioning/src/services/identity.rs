//! Identity service trait and implementations.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::ResourceId;

use super::ServiceClient;
use crate::error::ServiceError;
use crate::payload::NewUser;

pub const SERVICE: &str = "identity";

/// Login account management.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Creates a user and returns its id.
    async fn create_user(&self, user: &NewUser) -> Result<ResourceId, ServiceError>;

    /// Deletes a previously created user.
    async fn delete_user(&self, user_id: ResourceId) -> Result<(), ServiceError>;
}

/// Identity service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpIdentityService {
    client: ServiceClient,
}

impl HttpIdentityService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn create_user(&self, user: &NewUser) -> Result<ResourceId, ServiceError> {
        self.client.create("api/users", user).await
    }

    async fn delete_user(&self, user_id: ResourceId) -> Result<(), ServiceError> {
        self.client.delete(&format!("api/users/{user_id}")).await
    }
}

#[derive(Debug, Default)]
struct InMemoryIdentityState {
    users: HashMap<ResourceId, NewUser>,
    unavailable: bool,
    fail_on_delete: bool,
    deleted: Vec<ResourceId>,
}

/// In-memory identity service for tests and local runs.
///
/// Rejects duplicate user names the way the real service does.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityService {
    state: Arc<RwLock<InMemoryIdentityState>>,
}

impl InMemoryIdentityService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail as if the service could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.write().unavailable = unavailable;
    }

    /// Makes delete calls answer 500 while creates keep working.
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.write().fail_on_delete = fail;
    }

    pub fn user_count(&self) -> usize {
        self.read().users.len()
    }

    pub fn has_user(&self, user_id: ResourceId) -> bool {
        self.read().users.contains_key(&user_id)
    }

    /// Ids deleted so far, in call order.
    pub fn deleted(&self) -> Vec<ResourceId> {
        self.read().deleted.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryIdentityState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryIdentityState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unavailable() -> ServiceError {
    ServiceError::Transport {
        service: SERVICE,
        reason: "connection refused".to_string(),
    }
}

#[async_trait]
impl IdentityService for InMemoryIdentityService {
    async fn create_user(&self, user: &NewUser) -> Result<ResourceId, ServiceError> {
        let mut state = self.write();
        if state.unavailable {
            return Err(unavailable());
        }
        if state.users.values().any(|u| u.user_name == user.user_name) {
            return Err(ServiceError::Rejected {
                service: SERVICE,
                status: 409,
                body: format!("User name '{}' is already taken", user.user_name),
            });
        }

        let user_id = ResourceId::new();
        state.users.insert(user_id, user.clone());
        Ok(user_id)
    }

    async fn delete_user(&self, user_id: ResourceId) -> Result<(), ServiceError> {
        let mut state = self.write();
        if state.unavailable {
            return Err(unavailable());
        }
        if state.fail_on_delete {
            return Err(ServiceError::Rejected {
                service: SERVICE,
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }
        match state.users.remove(&user_id) {
            Some(_) => {
                state.deleted.push(user_id);
                Ok(())
            }
            None => Err(ServiceError::Rejected {
                service: SERVICE,
                status: 404,
                body: format!("User {user_id} not found"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> NewUser {
        NewUser {
            user_name: name.to_string(),
            email: format!("{name}@example.com"),
            password: "pw".to_string(),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            role_ids: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let service = InMemoryIdentityService::new();

        let id = service.create_user(&user("ada")).await.unwrap();
        assert!(service.has_user(id));

        service.delete_user(id).await.unwrap();
        assert_eq!(service.user_count(), 0);
        assert_eq!(service.deleted(), vec![id]);
    }

    #[tokio::test]
    async fn test_duplicate_user_name_is_rejected() {
        let service = InMemoryIdentityService::new();
        service.create_user(&user("ada")).await.unwrap();

        let err = service.create_user(&user("ada")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected { .. }));
        assert_eq!(service.user_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let service = InMemoryIdentityService::new();
        service.set_unavailable(true);

        let err = service.create_user(&user("ada")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_not_found() {
        let service = InMemoryIdentityService::new();
        let err = service.delete_user(ResourceId::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected { status: 404, .. }));
    }
}
