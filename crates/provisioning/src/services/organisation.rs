//! Organisation service trait and implementations.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::ResourceId;

use super::ServiceClient;
use crate::error::ServiceError;
use crate::payload::NewStaffMember;

pub const SERVICE: &str = "organisation";

/// Staff member records.
#[async_trait]
pub trait OrganisationService: Send + Sync {
    async fn create_staff_member(&self, staff: &NewStaffMember)
    -> Result<ResourceId, ServiceError>;

    async fn delete_staff_member(&self, staff_id: ResourceId) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub struct HttpOrganisationService {
    client: ServiceClient,
}

impl HttpOrganisationService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrganisationService for HttpOrganisationService {
    async fn create_staff_member(
        &self,
        staff: &NewStaffMember,
    ) -> Result<ResourceId, ServiceError> {
        self.client.create("api/staff", staff).await
    }

    async fn delete_staff_member(&self, staff_id: ResourceId) -> Result<(), ServiceError> {
        self.client.delete(&format!("api/staff/{staff_id}")).await
    }
}

#[derive(Debug, Default)]
struct InMemoryOrganisationState {
    staff: HashMap<ResourceId, NewStaffMember>,
    /// Departments that exist; when empty every department is accepted.
    departments: Vec<ResourceId>,
    fail_on_create: Option<String>,
}

/// In-memory organisation service for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrganisationService {
    state: Arc<RwLock<InMemoryOrganisationState>>,
}

impl InMemoryOrganisationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts staff creation to the given departments.
    pub fn with_departments(departments: impl IntoIterator<Item = ResourceId>) -> Self {
        let service = Self::default();
        service.write().departments = departments.into_iter().collect();
        service
    }

    /// Rejects the next creates with `message` until cleared.
    pub fn set_fail_on_create(&self, message: Option<&str>) {
        self.write().fail_on_create = message.map(str::to_string);
    }

    pub fn staff_count(&self) -> usize {
        self.read().staff.len()
    }

    pub fn staff_member(&self, staff_id: ResourceId) -> Option<NewStaffMember> {
        self.read().staff.get(&staff_id).cloned()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryOrganisationState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryOrganisationState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl OrganisationService for InMemoryOrganisationService {
    async fn create_staff_member(
        &self,
        staff: &NewStaffMember,
    ) -> Result<ResourceId, ServiceError> {
        let mut state = self.write();
        if let Some(message) = &state.fail_on_create {
            return Err(ServiceError::Rejected {
                service: SERVICE,
                status: 400,
                body: message.clone(),
            });
        }
        if !state.departments.is_empty() && !state.departments.contains(&staff.department_id) {
            return Err(ServiceError::Rejected {
                service: SERVICE,
                status: 400,
                body: format!("Department {} does not exist", staff.department_id),
            });
        }

        let staff_id = ResourceId::new();
        state.staff.insert(staff_id, staff.clone());
        Ok(staff_id)
    }

    async fn delete_staff_member(&self, staff_id: ResourceId) -> Result<(), ServiceError> {
        match self.write().staff.remove(&staff_id) {
            Some(_) => Ok(()),
            None => Err(ServiceError::Rejected {
                service: SERVICE,
                status: 404,
                body: format!("Staff member {staff_id} not found"),
            }),
        }
    }
}
