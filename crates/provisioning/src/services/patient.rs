//! Patient service trait and implementations.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::ResourceId;

use super::ServiceClient;
use crate::error::ServiceError;
use crate::payload::NewPatient;

pub const SERVICE: &str = "patient";

/// Patient records.
#[async_trait]
pub trait PatientService: Send + Sync {
    async fn create_patient(&self, patient: &NewPatient) -> Result<ResourceId, ServiceError>;

    async fn delete_patient(&self, patient_id: ResourceId) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub struct HttpPatientService {
    client: ServiceClient,
}

impl HttpPatientService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PatientService for HttpPatientService {
    async fn create_patient(&self, patient: &NewPatient) -> Result<ResourceId, ServiceError> {
        self.client.create("api/patients", patient).await
    }

    async fn delete_patient(&self, patient_id: ResourceId) -> Result<(), ServiceError> {
        self.client.delete(&format!("api/patients/{patient_id}")).await
    }
}

#[derive(Debug, Default)]
struct InMemoryPatientState {
    patients: HashMap<ResourceId, NewPatient>,
    unavailable: bool,
}

/// In-memory patient service for tests and local runs.
///
/// Identification numbers are unique, mirroring the real service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPatientService {
    state: Arc<RwLock<InMemoryPatientState>>,
}

impl InMemoryPatientService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.write().unavailable = unavailable;
    }

    pub fn patient_count(&self) -> usize {
        self.read().patients.len()
    }

    pub fn has_patient(&self, patient_id: ResourceId) -> bool {
        self.read().patients.contains_key(&patient_id)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryPatientState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryPatientState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PatientService for InMemoryPatientService {
    async fn create_patient(&self, patient: &NewPatient) -> Result<ResourceId, ServiceError> {
        let mut state = self.write();
        if state.unavailable {
            return Err(ServiceError::Transport {
                service: SERVICE,
                reason: "connection refused".to_string(),
            });
        }
        if state
            .patients
            .values()
            .any(|p| p.identification_number == patient.identification_number)
        {
            return Err(ServiceError::Rejected {
                service: SERVICE,
                status: 409,
                body: format!(
                    "Patient with identification number '{}' already exists",
                    patient.identification_number
                ),
            });
        }

        let patient_id = ResourceId::new();
        state.patients.insert(patient_id, patient.clone());
        Ok(patient_id)
    }

    async fn delete_patient(&self, patient_id: ResourceId) -> Result<(), ServiceError> {
        match self.write().patients.remove(&patient_id) {
            Some(_) => Ok(()),
            None => Err(ServiceError::Rejected {
                service: SERVICE,
                status: 404,
                body: format!("Patient {patient_id} not found"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn patient(identification_number: &str) -> NewPatient {
        NewPatient {
            user_id: ResourceId::new(),
            first_name: "Pat".into(),
            last_name: "Smith".into(),
            identification_number: identification_number.into(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 1, 31).unwrap(),
            gender: "F".into(),
            blood_type: "O+".into(),
            address: String::new(),
            phone_number: String::new(),
            email: "pat@example.com".into(),
            emergency_contact_name: String::new(),
            emergency_contact_phone: String::new(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_identification_number_is_rejected() {
        let service = InMemoryPatientService::new();
        let id = service.create_patient(&patient("ID-1")).await.unwrap();
        assert!(service.has_patient(id));

        let err = service.create_patient(&patient("ID-1")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected { .. }));
        assert_eq!(service.patient_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_patient() {
        let service = InMemoryPatientService::new();
        let id = service.create_patient(&patient("ID-2")).await.unwrap();

        service.delete_patient(id).await.unwrap();
        assert!(!service.has_patient(id));
        assert!(service.delete_patient(id).await.is_err());
    }
}
