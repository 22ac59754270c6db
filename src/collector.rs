//! Accumulation of deployment errors.

use crate::error::{AggregateError, Error, Result};

/// Collects independent deployment failures so they can be reported together.
///
/// One collector lives for exactly one connection attempt (or one container
/// construction). Errors are kept in detection order.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<Error>,
}

impl ErrorCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn add(&mut self, error: Error) {
        tracing::debug!(error = %error, "deployment error collected");
        self.errors.push(error);
    }

    /// Returns `true` if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// The collected errors, in detection order.
    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Compose every collected error into a single [`Error::Aggregate`].
    #[must_use]
    pub fn compose_aggregate(self) -> Error {
        Error::Aggregate(AggregateError::new(self.errors))
    }

    /// `Ok(())` when nothing was collected, otherwise the composed aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Aggregate`] carrying every collected error.
    pub fn finish(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.compose_aggregate())
        }
    }
}
