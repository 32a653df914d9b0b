//! Saga payloads and the request bodies sent to downstream services.
//!
//! A payload is owned by exactly one saga execution. Steps write the
//! identifiers they create back into it so later steps can reference them
//! and compensations know what to delete.

use chrono::NaiveDate;
use common::ResourceId;
use serde::{Deserialize, Serialize};

/// Request to create a login account together with a staff member record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffUserRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role_ids: Vec<ResourceId>,
    pub staff_role: i32,
    pub department_id: ResourceId,
    pub title: String,
    #[serde(default)]
    pub license_number: String,

    /// Set by the user creation step, cleared by its compensation.
    #[serde(skip)]
    pub user_id: Option<ResourceId>,
    /// Set by the staff creation step, cleared by its compensation.
    #[serde(skip)]
    pub staff_id: Option<ResourceId>,
}

/// Request to create a login account together with a patient record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientUserRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role_ids: Vec<ResourceId>,
    pub identification_number: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    #[serde(default)]
    pub blood_type: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub emergency_contact_name: String,
    #[serde(default)]
    pub emergency_contact_phone: String,

    /// Set by the user creation step, cleared by its compensation.
    #[serde(skip)]
    pub user_id: Option<ResourceId>,
    /// Set by the patient creation step, cleared by its compensation.
    #[serde(skip)]
    pub patient_id: Option<ResourceId>,
}

/// A payload that carries the details of a login account.
///
/// Lets one user creation step serve every saga that starts by creating
/// an account.
pub trait UserAccount: Send + 'static {
    /// Builds the identity service request from the payload.
    fn new_user(&self) -> NewUser;

    /// The created user, if the account exists.
    fn user_id(&self) -> Option<ResourceId>;

    fn set_user_id(&mut self, user_id: Option<ResourceId>);
}

macro_rules! impl_user_account {
    ($payload:ty) => {
        impl UserAccount for $payload {
            fn new_user(&self) -> NewUser {
                NewUser {
                    user_name: self.user_name.clone(),
                    email: self.email.clone(),
                    password: self.password.clone(),
                    first_name: self.first_name.clone(),
                    last_name: self.last_name.clone(),
                    role_ids: self.role_ids.clone(),
                }
            }

            fn user_id(&self) -> Option<ResourceId> {
                self.user_id
            }

            fn set_user_id(&mut self, user_id: Option<ResourceId>) {
                self.user_id = user_id;
            }
        }
    };
}

impl_user_account!(StaffUserRequest);
impl_user_account!(PatientUserRequest);

/// Body of `POST api/users` on the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role_ids: Vec<ResourceId>,
}

/// Body of `POST api/staff` on the organisation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaffMember {
    pub user_id: ResourceId,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub department_id: ResourceId,
    pub staff_role: i32,
    pub license_number: String,
}

impl NewStaffMember {
    /// Builds the request for a user that has already been created.
    pub fn for_user(user_id: ResourceId, request: &StaffUserRequest) -> Self {
        Self {
            user_id,
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            title: request.title.clone(),
            department_id: request.department_id,
            staff_role: request.staff_role,
            license_number: request.license_number.clone(),
        }
    }
}

/// Body of `POST api/patients` on the patient service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub user_id: ResourceId,
    pub first_name: String,
    pub last_name: String,
    pub identification_number: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub blood_type: String,
    pub address: String,
    pub phone_number: String,
    pub email: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
}

impl NewPatient {
    pub fn for_user(user_id: ResourceId, request: &PatientUserRequest) -> Self {
        Self {
            user_id,
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            identification_number: request.identification_number.clone(),
            date_of_birth: request.date_of_birth,
            gender: request.gender.clone(),
            blood_type: request.blood_type.clone(),
            address: request.address.clone(),
            phone_number: request.phone_number.clone(),
            email: request.email.clone(),
            emergency_contact_name: request.emergency_contact_name.clone(),
            emergency_contact_phone: request.emergency_contact_phone.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_staff_request_from_camel_case_json() {
        let department = ResourceId::new();
        let request: StaffUserRequest = serde_json::from_value(json!({
            "userName": "jdoe",
            "email": "jdoe@example.com",
            "password": "s3cret!",
            "firstName": "Jane",
            "lastName": "Doe",
            "staffRole": 2,
            "departmentId": department.to_string(),
            "title": "Dr."
        }))
        .unwrap();

        assert_eq!(request.user_name, "jdoe");
        assert_eq!(request.department_id, department);
        assert!(request.role_ids.is_empty());
        assert!(request.license_number.is_empty());
        assert!(request.user_id.is_none());
        assert!(request.staff_id.is_none());
    }

    #[test]
    fn test_created_ids_cannot_be_supplied_by_callers() {
        let request: PatientUserRequest = serde_json::from_value(json!({
            "userName": "pat",
            "email": "pat@example.com",
            "password": "pw",
            "firstName": "Pat",
            "lastName": "Smith",
            "identificationNumber": "ID-1",
            "dateOfBirth": "1990-04-01",
            "gender": "F",
            "userId": ResourceId::new().to_string(),
            "patientId": ResourceId::new().to_string()
        }))
        .unwrap();

        assert!(request.user_id.is_none());
        assert!(request.patient_id.is_none());
        assert_eq!(
            request.date_of_birth,
            NaiveDate::from_ymd_opt(1990, 4, 1).unwrap()
        );
    }

    #[test]
    fn test_new_staff_member_serializes_camel_case() {
        let user_id = ResourceId::new();
        let department = ResourceId::new();
        let body = NewStaffMember {
            user_id,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            title: "Dr.".into(),
            department_id: department,
            staff_role: 1,
            license_number: "LIC-9".into(),
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["userId"], json!(user_id.to_string()));
        assert_eq!(value["departmentId"], json!(department.to_string()));
        assert_eq!(value["staffRole"], json!(1));
        assert_eq!(value["licenseNumber"], json!("LIC-9"));
    }

    #[test]
    fn test_user_account_tracks_user_id() {
        let mut request: PatientUserRequest = serde_json::from_value(json!({
            "userName": "pat",
            "email": "pat@example.com",
            "password": "pw",
            "firstName": "Pat",
            "lastName": "Smith",
            "identificationNumber": "ID-1",
            "dateOfBirth": "1990-04-01",
            "gender": "F"
        }))
        .unwrap();
        let id = ResourceId::new();

        request.set_user_id(Some(id));
        assert_eq!(UserAccount::user_id(&request), Some(id));
        assert_eq!(request.new_user().user_name, "pat");

        request.set_user_id(None);
        assert!(request.user_id.is_none());
    }
}
