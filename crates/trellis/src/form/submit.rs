//! The asynchronous submit pipeline.
//!
//! A [`Submitter`] bundles what a screen supplies to submit a form: an
//! optional transform from the field map and the form's props to a payload, the asynchronous
//! operation itself, and success and failure continuations. The form engine
//! awaits the operation exactly once per submit and never retries.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use serde_json::Value;

use super::validation::FieldMap;

/// Type alias for a boxed submit operation.
pub type SubmitFn<P, T, X> = Arc<dyn Fn(P) -> BoxFuture<'static, Result<T, X>> + Send + Sync>;

/// Type alias for a payload transform.
///
/// Receives the validated fields and the form's props at submit time.
pub type TransformFn<P> = Arc<dyn Fn(FieldMap, &Value) -> P + Send + Sync>;

/// Type alias for a continuation.
pub type ContinuationFn<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// Submit operation and continuations for a form.
///
/// `P` is the payload handed to the operation, `T` its success value and
/// `X` its error.
pub struct Submitter<P, T, X> {
    transform: TransformFn<P>,
    operation: SubmitFn<P, T, X>,
    on_success: Option<ContinuationFn<T>>,
    on_failure: Option<ContinuationFn<X>>,
}

impl<T: 'static, X: 'static> Submitter<FieldMap, T, X> {
    /// Submits the field map as is.
    pub fn new<F, Fut>(operation: F) -> Self
    where
        F: Fn(FieldMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, X>> + Send + 'static,
    {
        Self::transformed(|fields, _props: &Value| fields, operation)
    }
}

impl<P, T, X> Submitter<P, T, X>
where
    P: 'static,
    T: 'static,
    X: 'static,
{
    /// Remaps the field map with `transform` before submitting.
    ///
    /// The transform also sees the form's current props, so payloads can
    /// carry ids the fields do not hold.
    pub fn transformed<G, F, Fut>(transform: G, operation: F) -> Self
    where
        G: Fn(FieldMap, &Value) -> P + Send + Sync + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, X>> + Send + 'static,
    {
        Self {
            transform: Arc::new(transform),
            operation: Arc::new(move |payload| operation(payload).boxed()),
            on_success: None,
            on_failure: None,
        }
    }

    /// Called with the operation's result when it succeeds.
    pub fn on_success<F>(mut self, continuation: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(continuation));
        self
    }

    /// Called with the operation's error when it fails.
    pub fn on_failure<F>(mut self, continuation: F) -> Self
    where
        F: Fn(&X) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(continuation));
        self
    }

    pub(crate) fn payload(&self, fields: FieldMap, props: &Value) -> P {
        (self.transform)(fields, props)
    }

    pub(crate) fn run(&self, payload: P) -> BoxFuture<'static, Result<T, X>> {
        (self.operation)(payload)
    }

    pub(crate) fn succeeded(&self, value: &T) {
        if let Some(on_success) = &self.on_success {
            on_success(value);
        }
    }

    pub(crate) fn failed(&self, error: &X) {
        if let Some(on_failure) = &self.on_failure {
            on_failure(error);
        }
    }
}

impl<P, T, X> Clone for Submitter<P, T, X> {
    fn clone(&self) -> Self {
        Self {
            transform: self.transform.clone(),
            operation: self.operation.clone(),
            on_success: self.on_success.clone(),
            on_failure: self.on_failure.clone(),
        }
    }
}

impl<P, T, X> fmt::Debug for Submitter<P, T, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submitter")
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// Result of one submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<T, X> {
    /// Validation failed; the operation was not called.
    Invalid,
    /// The operation succeeded.
    Succeeded(T),
    /// The operation failed.
    Failed(X),
}

impl<T, X> SubmitOutcome<T, X> {
    /// The outcome's kind.
    pub fn status(&self) -> SubmitStatus {
        match self {
            SubmitOutcome::Invalid => SubmitStatus::Invalid,
            SubmitOutcome::Succeeded(_) => SubmitStatus::Succeeded,
            SubmitOutcome::Failed(_) => SubmitStatus::Failed,
        }
    }

    /// Returns true if validation blocked the submit.
    pub fn is_invalid(&self) -> bool {
        matches!(self, SubmitOutcome::Invalid)
    }

    /// Returns true if the operation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded(_))
    }

    /// Converts into a `Result`, `None` meaning the submit was blocked.
    pub fn into_result(self) -> Option<Result<T, X>> {
        match self {
            SubmitOutcome::Invalid => None,
            SubmitOutcome::Succeeded(value) => Some(Ok(value)),
            SubmitOutcome::Failed(error) => Some(Err(error)),
        }
    }
}

/// Kind of a submit outcome, as emitted by
/// [`Form::submitted`](super::Form::submitted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStatus {
    /// Validation failed.
    Invalid,
    /// The operation succeeded.
    Succeeded,
    /// The operation failed.
    Failed,
}

impl fmt::Display for SubmitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitStatus::Invalid => write!(f, "Invalid"),
            SubmitStatus::Succeeded => write!(f, "Succeeded"),
            SubmitStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_transform_and_run() {
        let submitter = Submitter::transformed(
            |fields: FieldMap, props: &Value| {
                json!({ "id": props["user"]["id"], "name": fields["name"] })
            },
            |user: Value| async move { Ok::<_, String>(format!("updated {}", user["id"])) },
        );

        let mut fields = FieldMap::new();
        fields.insert("name".into(), json!("alice"));
        let payload = submitter.payload(fields, &json!({ "user": { "id": 7 } }));
        assert_eq!(payload, json!({ "id": 7, "name": "alice" }));
        assert_eq!(submitter.run(payload).await, Ok("updated 7".to_string()));
    }

    #[test]
    fn test_untransformed_ignores_props() {
        let submitter = Submitter::new(|fields: FieldMap| async move { Ok::<_, String>(fields) });
        let mut fields = FieldMap::new();
        fields.insert("name".into(), json!("alice"));
        assert_eq!(submitter.payload(fields.clone(), &json!({ "id": 1 })), fields);
    }

    #[test]
    fn test_outcome_helpers() {
        let ok: SubmitOutcome<u32, String> = SubmitOutcome::Succeeded(7);
        assert!(ok.is_success());
        assert_eq!(ok.status(), SubmitStatus::Succeeded);
        assert_eq!(ok.into_result(), Some(Ok(7)));

        let blocked: SubmitOutcome<u32, String> = SubmitOutcome::Invalid;
        assert!(blocked.is_invalid());
        assert_eq!(blocked.into_result(), None);
        assert_eq!(SubmitStatus::Failed.to_string(), "Failed");
    }
}
