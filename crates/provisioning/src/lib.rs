//! User provisioning sagas.
//!
//! Creating a staff member or a patient touches two services: the identity
//! service owns the login account, the organisation or patient service owns
//! the domain record. Each is modelled as a two-step saga so a failure in
//! the second service deletes the account created in the first.

pub mod error;
pub mod payload;
pub mod sagas;
pub mod services;
pub mod steps;

pub use error::ServiceError;
pub use payload::{PatientUserRequest, StaffUserRequest, UserAccount};
pub use sagas::{CREATE_PATIENT_WITH_USER, CREATE_USER_WITH_ROLE, register_sagas};
pub use services::{ServiceEndpoints, Services};
