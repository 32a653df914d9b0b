//! Saga error types.

use thiserror::Error;

/// An unexpected error raised by a step's `execute` or `compensate`.
///
/// Expected business rejections are reported as
/// [`Outcome::Failure`](crate::Outcome) instead. A fault always causes the
/// saga to roll back and is never shown verbatim to the caller.
#[derive(Debug, Error)]
pub enum StepFault {
    /// The downstream service could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The downstream service answered with an unexpected status.
    #[error("Downstream service '{service}' returned {status}: {body}")]
    Downstream {
        service: String,
        status: u16,
        body: String,
    },

    /// A response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The step panicked.
    #[error("Step panicked: {0}")]
    Panicked(String),

    /// Any other unexpected error.
    #[error("{0}")]
    Other(String),
}

impl StepFault {
    /// Creates a fault from any displayable error.
    pub fn other(err: impl std::fmt::Display) -> Self {
        StepFault::Other(err.to_string())
    }
}

/// Errors that can occur while building, resolving or running a saga.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A saga was built without any steps.
    #[error("Saga '{saga}' has no steps")]
    EmptySaga { saga: String },

    /// A step raised a fault during forward execution.
    #[error("Saga step '{step}' faulted: {source}")]
    StepFault {
        step: String,
        #[source]
        source: StepFault,
    },

    /// No saga is registered under the requested kind.
    #[error("Saga '{0}' is not registered")]
    UnknownKind(String),

    /// A saga is already registered under this kind.
    #[error("Saga '{0}' is already registered")]
    DuplicateKind(String),

    /// The saga registered under this kind uses other payload or result types.
    #[error("Saga '{kind}' does not accept payload {payload} with result {result}")]
    TypeMismatch {
        kind: String,
        payload: &'static str,
        result: &'static str,
    },

    /// The registered factory failed to build the saga.
    #[error("Saga '{kind}' could not be constructed: {reason}")]
    Construction { kind: String, reason: String },

    /// The saga panicked outside of any step.
    #[error("Saga '{saga}' panicked: {message}")]
    Panicked { saga: String, message: String },
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_fault_keeps_source() {
        let err = SagaError::StepFault {
            step: "create_user".to_string(),
            source: StepFault::Transport("connection refused".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Saga step 'create_user' faulted: Transport error: connection refused"
        );
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic payload");
    }
}
