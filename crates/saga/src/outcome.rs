//! Success/failure container returned by every saga operation.

use serde::{Deserialize, Serialize};

/// Message used when a failure is built from an empty error list.
const UNSPECIFIED_FAILURE: &str = "Operation failed";

/// The result of a step, a saga or a coordinator run.
///
/// `Failure` always carries at least one human-readable message. Business
/// failures travel through this type; unexpected faults travel as
/// [`StepFault`](crate::StepFault) / [`SagaError`](crate::SagaError) until the
/// coordinator folds them into a `Failure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The operation succeeded with a value.
    Success(T),
    /// The operation failed with one or more messages.
    Failure(Vec<String>),
}

impl<T> Outcome<T> {
    /// Creates a successful outcome.
    pub fn success(value: T) -> Self {
        Outcome::Success(value)
    }

    /// Creates a failed outcome with a single message.
    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure(vec![message.into()])
    }

    /// Creates a failed outcome from several messages.
    ///
    /// An empty list still produces a failure, with a generic message.
    pub fn failures<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let errors: Vec<String> = messages.into_iter().map(Into::into).collect();
        if errors.is_empty() {
            Outcome::Failure(vec![UNSPECIFIED_FAILURE.to_string()])
        } else {
            Outcome::Failure(errors)
        }
    }

    /// Returns true if this is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Returns true if this is a failure.
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Returns the success value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// Consumes the outcome, returning the success value if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// Returns the failure messages. Empty for a success.
    pub fn errors(&self) -> &[String] {
        match self {
            Outcome::Success(_) => &[],
            Outcome::Failure(errors) => errors,
        }
    }

    /// Maps the success value, leaving failures untouched.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(errors) => Outcome::Failure(errors),
        }
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<T, Vec<String>> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(errors) => Err(errors),
        }
    }
}

impl Outcome<()> {
    /// Creates a unit success, used by compensations.
    pub fn unit() -> Self {
        Outcome::Success(())
    }
}

impl<T> From<Result<T, Vec<String>>> for Outcome<T> {
    fn from(result: Result<T, Vec<String>>) -> Self {
        match result {
            Ok(value) => Outcome::success(value),
            Err(errors) => Outcome::failures(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_and_failure_are_exclusive() {
        let ok: Outcome<u32> = Outcome::success(7);
        assert!(ok.is_success());
        assert!(!ok.is_failure());
        assert!(ok.errors().is_empty());
        assert_eq!(ok.value(), Some(&7));

        let err: Outcome<u32> = Outcome::failure("boom");
        assert!(err.is_failure());
        assert!(!err.is_success());
        assert_eq!(err.errors(), &["boom".to_string()]);
        assert_eq!(err.value(), None);
    }

    #[test]
    fn test_failures_keeps_order() {
        let outcome: Outcome<()> = Outcome::failures(["first", "second"]);
        assert_eq!(outcome.errors(), &["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_empty_failures_still_fail() {
        let outcome: Outcome<()> = Outcome::failures(Vec::<String>::new());
        assert!(outcome.is_failure());
        assert_eq!(outcome.errors().len(), 1);
    }

    #[test]
    fn test_map_and_into_result() {
        let doubled = Outcome::success(21).map(|v| v * 2);
        assert_eq!(doubled.into_result(), Ok(42));

        let failed: Outcome<i32> = Outcome::failure("nope");
        assert_eq!(failed.map(|v| v * 2).into_result(), Err(vec!["nope".to_string()]));
    }

    #[test]
    fn test_from_std_result_normalizes_empty_errors() {
        let outcome: Outcome<u8> = Err(Vec::<String>::new()).into();
        assert!(outcome.is_failure());
        assert!(!outcome.errors().is_empty());
    }

    #[test]
    fn test_serialization_shape() {
        let failed: Outcome<()> = Outcome::failure("bad");
        let json = serde_json::to_value(failed).unwrap();
        assert_eq!(json, serde_json::json!({ "failure": ["bad"] }));

        let json = serde_json::to_value(Outcome::success(5)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": 5 }));
    }
}
