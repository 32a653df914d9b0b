//! Downstream service error types.

use saga::StepFault;
use thiserror::Error;

/// Errors returned by the identity, organisation and patient service clients.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("{service} rejected the request ({status}): {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The request never reached the service or the connection broke.
    #[error("{service} transport error: {reason}")]
    Transport {
        service: &'static str,
        reason: String,
    },

    /// The service answered with a body that could not be decoded.
    #[error("{service} returned an undecodable response: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },

    /// A request URL could not be built.
    #[error("invalid url for {service}: {reason}")]
    InvalidUrl {
        service: &'static str,
        reason: String,
    },
}

impl From<ServiceError> for StepFault {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Rejected {
                service,
                status,
                body,
            } => StepFault::Downstream {
                service: service.to_string(),
                status,
                body,
            },
            ServiceError::Transport { service, reason } => {
                StepFault::Transport(format!("{service}: {reason}"))
            }
            ServiceError::Decode { service, reason } => {
                StepFault::Decode(format!("{service}: {reason}"))
            }
            err @ ServiceError::InvalidUrl { .. } => StepFault::other(err),
        }
    }
}
