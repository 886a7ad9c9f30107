//! Whole-evaluation time budget.
use std::time::{Duration, Instant};

use crate::error::EvalError;

/// Wall-clock budget shared by every oracle call of one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    #[must_use]
    pub fn start(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self::start(None)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// # Errors
    ///
    /// Returns [`EvalError::Inconclusive`] once the budget is spent.
    pub fn check(&self) -> Result<(), EvalError> {
        match self.limit {
            Some(limit) if self.started.elapsed() >= limit => {
                Err(EvalError::Inconclusive { limit })
            }
            _ => Ok(()),
        }
    }
}
