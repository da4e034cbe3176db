use tracing::{error, warn};

use crate::error::{AuthzError, Result};

/// Result of a write that spans the relational store and the relation engine.
#[derive(Debug)]
pub enum SagaOutcome {
    /// Both stores were updated.
    Applied,
    /// The first write failed; nothing changed.
    Failed { error: AuthzError },
    /// The first write landed and the second did not. `compensated` tells
    /// whether the first write was rolled back.
    PartiallyApplied {
        error: AuthzError,
        compensated: bool,
        compensation_error: Option<AuthzError>,
    },
}

impl SagaOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SagaOutcome::Applied)
    }

    /// The two stores disagree and an operator has to reconcile them.
    pub fn needs_repair(&self) -> bool {
        matches!(
            self,
            SagaOutcome::PartiallyApplied {
                compensated: false,
                ..
            }
        )
    }

    /// The error that stopped the operation, if any.
    pub fn error(&self) -> Option<&AuthzError> {
        match self {
            SagaOutcome::Applied => None,
            SagaOutcome::Failed { error } | SagaOutcome::PartiallyApplied { error, .. } => {
                Some(error)
            }
        }
    }

    /// # Errors
    ///
    /// Returns the original error of a failed or partially applied operation.
    pub fn into_result(self) -> Result<()> {
        match self {
            SagaOutcome::Applied => Ok(()),
            SagaOutcome::Failed { error } | SagaOutcome::PartiallyApplied { error, .. } => {
                Err(error)
            }
        }
    }
}

/// Build the outcome after the second write failed and a single compensation was attempted.
pub(crate) fn after_compensation(
    operation: &'static str,
    target: &str,
    member: &str,
    error: AuthzError,
    compensation: Result<()>,
) -> SagaOutcome {
    match compensation {
        Ok(()) => {
            warn!(
                operation,
                target,
                member,
                error = %error,
                "relation engine write failed; local change rolled back"
            );
            SagaOutcome::PartiallyApplied {
                error,
                compensated: true,
                compensation_error: None,
            }
        }
        Err(undo) => {
            error!(
                operation,
                target,
                member,
                error = %error,
                compensation_error = %undo,
                needs_repair = true,
                "relational store and relation engine disagree"
            );
            SagaOutcome::PartiallyApplied {
                error,
                compensated: false,
                compensation_error: Some(undo),
            }
        }
    }
}
