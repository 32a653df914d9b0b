//! Provisioning saga kinds and their registration.

use common::ResourceId;
use saga::{Saga, SagaRegistry};

use crate::payload::{PatientUserRequest, StaffUserRequest};
use crate::services::Services;
use crate::steps::{CreatePatientStep, CreateStaffMemberStep, CreateUserStep};

/// Saga kind: create a login account and a staff member for it.
pub const CREATE_USER_WITH_ROLE: &str = "create-user-with-role";

/// Saga kind: create a login account and a patient record for it.
pub const CREATE_PATIENT_WITH_USER: &str = "create-patient-with-user";

/// Step name: create the staff login account.
pub const STEP_CREATE_USER: &str = "create_user";

/// Step name: create the staff member record.
pub const STEP_CREATE_STAFF_MEMBER: &str = "create_staff_member";

/// Step name: create the patient login account.
pub const STEP_CREATE_PATIENT_USER: &str = "create_patient_user";

/// Step name: create the patient record.
pub const STEP_CREATE_PATIENT: &str = "create_patient";

/// `create_user` then `create_staff_member`; yields the new user's id.
pub fn staff_saga(services: &Services) -> saga::error::Result<Saga<StaffUserRequest, ResourceId>> {
    Saga::<StaffUserRequest, ResourceId>::builder(CREATE_USER_WITH_ROLE)
        .step(CreateUserStep::new(services.identity.clone()))
        .step(CreateStaffMemberStep::new(services.organisation.clone()))
        .build()
}

/// `create_patient_user` then `create_patient`; yields the new user's id.
pub fn patient_saga(
    services: &Services,
) -> saga::error::Result<Saga<PatientUserRequest, ResourceId>> {
    Saga::<PatientUserRequest, ResourceId>::builder(CREATE_PATIENT_WITH_USER)
        .step(CreateUserStep::new(services.identity.clone()).named(STEP_CREATE_PATIENT_USER))
        .step(CreatePatientStep::new(services.patient.clone()))
        .build()
}

/// Registers every provisioning saga kind.
///
/// Sagas are built once here; the steps are stateless, so each resolution
/// hands out a clone sharing the same step instances.
pub fn register_sagas(registry: &mut SagaRegistry, services: &Services) -> saga::error::Result<()> {
    registry.register_saga(CREATE_USER_WITH_ROLE, staff_saga(services)?)?;
    registry.register_saga(CREATE_PATIENT_WITH_USER, patient_saga(services)?)?;
    tracing::info!(kinds = ?registry.kinds(), "registered provisioning sagas");
    Ok(())
}
