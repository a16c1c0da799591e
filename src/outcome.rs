//! Outcomes of evented examples.
//!
//! [`run_example`] drives a single [`EventedRunner`] and condenses whatever
//! it returned into an [`ExampleOutcome`].

use std::time::{Duration, Instant};

use tracing::{debug, info_span};

use crate::{error::ExampleError, example::EventedRunner};

/// How a single example went and how long it took.
#[derive(Debug)]
#[non_exhaustive]
pub struct ExampleOutcome {
    pub status: ExampleStatus,
    pub duration: Duration,
}

impl ExampleOutcome {
    pub fn is_good(&self) -> bool {
        self.status.is_good()
    }

    pub fn is_bad(&self) -> bool {
        self.status.is_bad()
    }
}

impl ExampleOutcome {
    pub fn passed(&self) -> bool {
        self.status.passed()
    }

    pub fn timed_out(&self) -> bool {
        self.status.timed_out()
    }

    pub fn failed(&self) -> bool {
        self.status.failed()
    }
}

/// The final status of an example.
///
/// Timeouts are split off from other failures so reporters can tell a stalled
/// example from one that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExampleStatus {
    Passed,
    TimedOut { after: Duration },
    Failed(ExampleError),
}

impl ExampleStatus {
    pub fn is_good(&self) -> bool {
        matches!(self, ExampleStatus::Passed)
    }

    pub fn is_bad(&self) -> bool {
        matches!(self, ExampleStatus::Failed(_) | ExampleStatus::TimedOut { .. })
    }
}

impl ExampleStatus {
    pub fn passed(&self) -> bool {
        matches!(self, ExampleStatus::Passed)
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, ExampleStatus::TimedOut { .. })
    }

    pub fn failed(&self) -> bool {
        matches!(self, ExampleStatus::Failed(_))
    }
}

impl From<Result<(), ExampleError>> for ExampleStatus {
    fn from(value: Result<(), ExampleError>) -> Self {
        match value {
            Ok(()) => ExampleStatus::Passed,
            Err(ExampleError::TimedOut { after }) => ExampleStatus::TimedOut { after },
            Err(err) => ExampleStatus::Failed(err),
        }
    }
}

/// Run a single example with `runner` and record how it went.
pub fn run_example<'g, R: EventedRunner<'g>>(runner: &mut R) -> ExampleOutcome {
    let _span = info_span!("example", timeout = ?runner.example().config().spec_timeout()).entered();

    let now = Instant::now();
    let status = ExampleStatus::from(runner.run());
    let duration = now.elapsed();

    debug!(?status, ?duration, "example finished");
    ExampleOutcome { status, duration }
}
