//! Concrete provisioning steps.
//!
//! Every step creates one resource in one downstream service and knows how
//! to delete it again. Any non-success answer from the service is a
//! business failure carrying the response body; a call that never got an
//! answer, or one that cannot be decoded, is a fault.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use common::ResourceId;
use saga::{Outcome, SagaStep, StepFault};

use crate::error::ServiceError;
use crate::payload::{NewPatient, NewStaffMember, PatientUserRequest, StaffUserRequest, UserAccount};
use crate::sagas::{STEP_CREATE_PATIENT, STEP_CREATE_STAFF_MEMBER, STEP_CREATE_USER};
use crate::services::{IdentityService, OrganisationService, PatientService};

/// Turns a create call's result into a step outcome.
fn created(
    thing: &str,
    result: Result<ResourceId, ServiceError>,
) -> Result<Outcome<ResourceId>, StepFault> {
    match result {
        Ok(id) => Ok(Outcome::success(id)),
        Err(ServiceError::Rejected { body, .. }) => {
            tracing::warn!(%body, "failed to create {thing}");
            Ok(Outcome::failure(format!("Failed to create {thing}: {body}")))
        }
        Err(err) => Err(err.into()),
    }
}

/// Turns a delete call's result into a compensation outcome.
fn deleted(
    thing: &str,
    id: ResourceId,
    result: Result<(), ServiceError>,
) -> Result<Outcome<()>, StepFault> {
    match result {
        Ok(()) => {
            tracing::info!(%id, "deleted {thing}");
            Ok(Outcome::unit())
        }
        Err(ServiceError::Rejected { body, .. }) => Ok(Outcome::failure(format!(
            "Failed to delete {thing} during compensation: {body}"
        ))),
        Err(err) => Err(err.into()),
    }
}

/// Creates the login account for any [`UserAccount`] payload.
pub struct CreateUserStep<P> {
    name: &'static str,
    identity: Arc<dyn IdentityService>,
    _payload: PhantomData<fn(&mut P)>,
}

impl<P> CreateUserStep<P> {
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        Self {
            name: STEP_CREATE_USER,
            identity,
            _payload: PhantomData,
        }
    }

    /// Overrides the step name reported in logs and failures.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl<P: UserAccount> SagaStep<P, ResourceId> for CreateUserStep<P> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(&self, data: &mut P) -> Result<Outcome<ResourceId>, StepFault> {
        let outcome = created("user", self.identity.create_user(&data.new_user()).await)?;
        if let Outcome::Success(user_id) = &outcome {
            tracing::info!(%user_id, "created user");
            data.set_user_id(Some(*user_id));
        }
        Ok(outcome)
    }

    async fn compensate(&self, data: &mut P) -> Result<Outcome<()>, StepFault> {
        let Some(user_id) = data.user_id().filter(|id| !id.is_nil()) else {
            return Ok(Outcome::unit());
        };
        let outcome = deleted("user", user_id, self.identity.delete_user(user_id).await)?;
        if outcome.is_success() {
            data.set_user_id(None);
        }
        Ok(outcome)
    }
}

/// Creates the staff member record for an existing user.
pub struct CreateStaffMemberStep {
    organisation: Arc<dyn OrganisationService>,
}

impl CreateStaffMemberStep {
    pub fn new(organisation: Arc<dyn OrganisationService>) -> Self {
        Self { organisation }
    }
}

#[async_trait]
impl SagaStep<StaffUserRequest, ResourceId> for CreateStaffMemberStep {
    fn name(&self) -> &'static str {
        STEP_CREATE_STAFF_MEMBER
    }

    async fn execute(
        &self,
        data: &mut StaffUserRequest,
    ) -> Result<Outcome<ResourceId>, StepFault> {
        let Some(user_id) = data.user_id else {
            return Err(StepFault::other("staff member requires a created user"));
        };

        let staff = NewStaffMember::for_user(user_id, data);
        let outcome = created(
            "staff member",
            self.organisation.create_staff_member(&staff).await,
        )?;
        Ok(match outcome {
            Outcome::Success(staff_id) => {
                tracing::info!(%staff_id, %user_id, "created staff member");
                data.staff_id = Some(staff_id);
                Outcome::success(user_id)
            }
            failure => failure,
        })
    }

    async fn compensate(&self, data: &mut StaffUserRequest) -> Result<Outcome<()>, StepFault> {
        let Some(staff_id) = data.staff_id.filter(|id| !id.is_nil()) else {
            return Ok(Outcome::unit());
        };
        let outcome = deleted(
            "staff member",
            staff_id,
            self.organisation.delete_staff_member(staff_id).await,
        )?;
        if outcome.is_success() {
            data.staff_id = None;
        }
        Ok(outcome)
    }
}

/// Creates the patient record for an existing user.
pub struct CreatePatientStep {
    patients: Arc<dyn PatientService>,
}

impl CreatePatientStep {
    pub fn new(patients: Arc<dyn PatientService>) -> Self {
        Self { patients }
    }
}

#[async_trait]
impl SagaStep<PatientUserRequest, ResourceId> for CreatePatientStep {
    fn name(&self) -> &'static str {
        STEP_CREATE_PATIENT
    }

    async fn execute(
        &self,
        data: &mut PatientUserRequest,
    ) -> Result<Outcome<ResourceId>, StepFault> {
        let Some(user_id) = data.user_id else {
            return Err(StepFault::other("patient requires a created user"));
        };

        let patient = NewPatient::for_user(user_id, data);
        let outcome = created("patient", self.patients.create_patient(&patient).await)?;
        Ok(match outcome {
            Outcome::Success(patient_id) => {
                tracing::info!(%patient_id, %user_id, "created patient");
                data.patient_id = Some(patient_id);
                Outcome::success(user_id)
            }
            failure => failure,
        })
    }

    async fn compensate(&self, data: &mut PatientUserRequest) -> Result<Outcome<()>, StepFault> {
        let Some(patient_id) = data.patient_id.filter(|id| !id.is_nil()) else {
            return Ok(Outcome::unit());
        };
        let outcome = deleted(
            "patient",
            patient_id,
            self.patients.delete_patient(patient_id).await,
        )?;
        if outcome.is_success() {
            data.patient_id = None;
        }
        Ok(outcome)
    }
}
