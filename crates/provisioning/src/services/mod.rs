//! Downstream services the provisioning sagas call.

pub mod client;
pub mod identity;
pub mod organisation;
pub mod patient;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

pub use client::ServiceClient;
pub use identity::{HttpIdentityService, IdentityService, InMemoryIdentityService};
pub use organisation::{HttpOrganisationService, InMemoryOrganisationService, OrganisationService};
pub use patient::{HttpPatientService, InMemoryPatientService, PatientService};

use crate::error::ServiceError;

/// Where the downstream services live and how to call them.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub identity: Url,
    pub organisation: Url,
    pub patient: Url,
    pub timeout: Duration,
    /// Bearer token forwarded on every call.
    pub token: Option<String>,
}

/// The set of services the sagas are built over.
#[derive(Clone)]
pub struct Services {
    pub identity: Arc<dyn IdentityService>,
    pub organisation: Arc<dyn OrganisationService>,
    pub patient: Arc<dyn PatientService>,
}

impl Services {
    /// HTTP-backed services for the given endpoints.
    pub fn http(endpoints: &ServiceEndpoints) -> Result<Self, ServiceError> {
        let client = |service, url: &Url| {
            ServiceClient::new(
                service,
                url.clone(),
                endpoints.timeout,
                endpoints.token.clone(),
            )
        };

        Ok(Self {
            identity: Arc::new(HttpIdentityService::new(client(
                identity::SERVICE,
                &endpoints.identity,
            )?)),
            organisation: Arc::new(HttpOrganisationService::new(client(
                organisation::SERVICE,
                &endpoints.organisation,
            )?)),
            patient: Arc::new(HttpPatientService::new(client(
                patient::SERVICE,
                &endpoints.patient,
            )?)),
        })
    }

    /// Wraps in-memory services, keeping the caller's handles usable for
    /// inspection.
    pub fn in_memory(
        identity: InMemoryIdentityService,
        organisation: InMemoryOrganisationService,
        patient: InMemoryPatientService,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            organisation: Arc::new(organisation),
            patient: Arc::new(patient),
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
