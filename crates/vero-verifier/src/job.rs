//! The job surface: resolve a backend, run the pipeline, report, finish.

use crate::frontend::Frontend;
use crate::registry::BackendRegistry;
use crate::report::{ReportMessage, Reporter};
use crate::verify::{verify, VerificationOutcome, VerifyError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use vero_cache::VerificationCache;
use vero_core::JobId;

/// A request to verify one file with one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// Backend selector, resolved against the registry.
    pub backend: String,
    /// Backend-specific arguments, validated by the backend's factory.
    pub args: Vec<String>,
}

impl JobRequest {
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }
}

/// Run one verification job to completion.
///
/// Every escape hatch funnels into the reporter: configuration errors
/// (unknown backend, rejected arguments) and pipeline errors become an
/// `Exception` report, and the final-report marker is emitted no matter how
/// the job ends. Errors never propagate past the job.
pub fn run_job(
    request: &JobRequest,
    registry: &BackendRegistry,
    frontend: &mut dyn Frontend,
    cache: &VerificationCache,
    reporter: Arc<dyn Reporter>,
    cancel: &CancellationToken,
) -> Result<VerificationOutcome, VerifyError> {
    let job = JobId::next();
    info!(
        target: "vero.verifier",
        %job,
        backend = %request.backend,
        file = %frontend.config().file.display(),
        "starting verification job"
    );

    let result = (|| {
        let mut backend = registry.resolve(&request.backend, &request.args, reporter.clone())?;
        let outcome = verify(frontend, backend.as_mut(), cache, &reporter, cancel);
        backend.stop();
        outcome
    })();

    if let Err(err) = &result {
        error!(target: "vero.verifier", %job, %err, "job failed");
        reporter.report(ReportMessage::Exception {
            message: err.to_string(),
        });
    }
    reporter.report(ReportMessage::Finished);

    result
}
