//! The verification pipeline.
//!
//! One run covers one (backend, file) pair: front-end phases, informational
//! reports, cache consultation, reduced-program dispatch, per-method store
//! updates, merge. The pipeline is straight-line; the only blocking points
//! are the back-end call and store lock acquisition.

use crate::frontend::Frontend;
use crate::report::{JobFailure, ReportMessage, Reporter};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vero_ast::{collect_definitions, outline, MemberCounts, Method, Program};
use vero_backend::{Backend, BackendError, VerificationError, VerificationResult};
use vero_cache::{replay_error, ProgramAnalysis, VerificationCache};

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("no backend registered under `{0}`")]
    UnknownBackend(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A back-end error without line information is a programming error in
    /// the back-end, not a property of the program under verification.
    #[error("backend reported an error without position information: {message}")]
    PositionlessError { message: String },

    #[error("front-end reported no errors but produced no program")]
    MissingProgram,

    #[error("verification cancelled")]
    Cancelled,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// Parse, typecheck or translate failed; the cache was not touched.
    TranslatorFailed(Vec<crate::frontend::TranslatorError>),
    Success,
    Failure { errors: Vec<VerificationError> },
}

/// Run the full pipeline for one frontend/backend pair.
///
/// Reports are emitted on `reporter` as the pipeline progresses; the overall
/// success/failure message is emitted after the merge. The final-report
/// marker is the job runner's responsibility, not this function's.
pub fn verify(
    frontend: &mut dyn Frontend,
    backend: &mut dyn Backend,
    cache: &VerificationCache,
    reporter: &Arc<dyn Reporter>,
    cancel: &CancellationToken,
) -> Result<VerificationOutcome, VerifyError> {
    let started = Instant::now();

    frontend.parse();
    frontend.typecheck();
    frontend.translate();

    if !frontend.errors().is_empty() {
        let errors = frontend.errors().to_vec();
        info!(
            target: "vero.verifier",
            errors = errors.len(),
            "front-end failed; cache untouched"
        );
        reporter.report(ReportMessage::OverallFailure {
            backend: backend.id().to_string(),
            elapsed_ms: elapsed_ms(started),
            failure: JobFailure::Translation {
                errors: errors.clone(),
            },
        });
        return Ok(VerificationOutcome::TranslatorFailed(errors));
    }
    let program = frontend.program().ok_or(VerifyError::MissingProgram)?.clone();
    let file = frontend.config().file.clone();
    let caching_disabled = frontend.config().disable_caching;

    // Informational reports go out before the first back-end interaction.
    reporter.report(ReportMessage::ProgramOutline {
        members: outline(&program),
    });
    reporter.report(ReportMessage::Statistics {
        counts: MemberCounts::of(&program),
    });
    reporter.report(ReportMessage::ProgramDefinitions {
        definitions: collect_definitions(&program),
    });

    if cancel.is_cancelled() {
        return Err(VerifyError::Cancelled);
    }

    if caching_disabled {
        let result = backend.verify(&program)?;
        let outcome = outcome_of(result.errors().to_vec(), result.is_success());
        report_outcome(reporter, backend.id(), started, &outcome);
        return Ok(outcome);
    }

    let analysis = ProgramAnalysis::new(&program);
    let consultation = consult_cache(&program, &file, backend.id(), cache, &analysis);
    debug!(
        target: "vero.verifier",
        to_verify = consultation.to_verify.len(),
        cached = consultation.cached.len(),
        "cache consultation complete"
    );

    if cancel.is_cancelled() {
        return Err(VerifyError::Cancelled);
    }

    // Reduced program: methods to re-verify in full, cached methods with
    // their bodies removed so they stay visible as referenced scopes.
    let result = if consultation.to_verify.is_empty() {
        debug!(target: "vero.verifier", "all methods cached; skipping the backend");
        VerificationResult::Success
    } else {
        let reduced = Program {
            domains: program.domains.clone(),
            fields: program.fields.clone(),
            functions: program.functions.clone(),
            predicates: program.predicates.clone(),
            methods: consultation
                .to_verify
                .iter()
                .map(|m| (*m).clone())
                .chain(consultation.cached.iter().map(|m| m.without_body()))
                .collect(),
        };
        backend.verify(&reduced)?
    };

    // Attribute fresh errors to the methods that produced them and record
    // each method's outcome. A cancellation between methods leaves the
    // already-written entries in place and stops writing further ones.
    let fresh = result.errors();
    for error in fresh {
        if !error.pos.is_known() {
            return Err(VerifyError::PositionlessError {
                message: error.message.clone(),
            });
        }
    }
    for method in &consultation.to_verify {
        if cancel.is_cancelled() {
            return Err(VerifyError::Cancelled);
        }
        let own = method_specific_errors(method, fresh);
        cache.update(backend.id(), &file, &analysis, method, &own);
    }

    let unattributed: Vec<&VerificationError> = fresh
        .iter()
        .filter(|e| !consultation.to_verify.iter().any(|m| owns(m, e)))
        .collect();
    if !unattributed.is_empty() {
        warn!(
            target: "vero.verifier",
            count = unattributed.len(),
            "errors outside every method range; surfaced but not cached"
        );
    }

    // Merge: fresh errors as-is, replayed errors marked as cached.
    let mut errors = fresh.to_vec();
    errors.extend(
        consultation
            .cached_errors
            .into_iter()
            .map(VerificationError::set_cached),
    );
    let outcome = outcome_of(errors, result.is_success());
    report_outcome(reporter, backend.id(), started, &outcome);
    Ok(outcome)
}

struct Consultation<'a> {
    to_verify: Vec<&'a Method>,
    cached: Vec<&'a Method>,
    cached_errors: Vec<VerificationError>,
}

fn consult_cache<'a>(
    program: &'a Program,
    file: &Path,
    backend_id: &str,
    cache: &VerificationCache,
    analysis: &ProgramAnalysis,
) -> Consultation<'a> {
    let mut consultation = Consultation {
        to_verify: Vec::new(),
        cached: Vec::new(),
        cached_errors: Vec::new(),
    };

    'methods: for method in &program.methods {
        let Some(fp) = analysis.method_fingerprint(&method.name) else {
            consultation.to_verify.push(method);
            continue;
        };
        let Some(entry) = cache.get(backend_id, file, fp) else {
            debug!(target: "vero.verifier", method = %method.name, "cache miss");
            consultation.to_verify.push(method);
            continue;
        };
        if analysis.dependency_hash(&method.name).as_ref() != Some(&entry.dependency_hash) {
            debug!(
                target: "vero.verifier",
                method = %method.name,
                "dependency hash changed; re-verifying"
            );
            consultation.to_verify.push(method);
            continue;
        }

        // A hit replays only if every stored path resolves; a single failure
        // re-verifies the whole method rather than risk a wrong position.
        let mut replayed = Vec::with_capacity(entry.errors.len());
        for cached_error in &entry.errors {
            match replay_error(
                method,
                &cached_error.template,
                &cached_error.offending,
                &cached_error.reason,
            ) {
                Some(error) => replayed.push(error),
                None => {
                    warn!(
                        target: "vero.verifier",
                        method = %method.name,
                        "cached error no longer locatable; re-verifying"
                    );
                    consultation.to_verify.push(method);
                    continue 'methods;
                }
            }
        }

        debug!(
            target: "vero.verifier",
            method = %method.name,
            errors = replayed.len(),
            "cache hit"
        );
        consultation.cached.push(method);
        consultation.cached_errors.extend(replayed);
    }

    consultation
}

/// Errors whose position lies within the method's start-to-end line range.
fn method_specific_errors(method: &Method, errors: &[VerificationError]) -> Vec<VerificationError> {
    errors
        .iter()
        .filter(|e| owns(method, e))
        .cloned()
        .collect()
}

fn owns(method: &Method, error: &VerificationError) -> bool {
    match method.line_range() {
        Some((first, last)) => error.pos.starts_within_lines(first, last),
        None => false,
    }
}

fn outcome_of(errors: Vec<VerificationError>, backend_success: bool) -> VerificationOutcome {
    if backend_success && errors.is_empty() {
        VerificationOutcome::Success
    } else {
        VerificationOutcome::Failure { errors }
    }
}

fn report_outcome(
    reporter: &Arc<dyn Reporter>,
    backend: &str,
    started: Instant,
    outcome: &VerificationOutcome,
) {
    let elapsed_ms = elapsed_ms(started);
    match outcome {
        VerificationOutcome::Success => reporter.report(ReportMessage::OverallSuccess {
            backend: backend.to_string(),
            elapsed_ms,
        }),
        VerificationOutcome::Failure { errors } => {
            reporter.report(ReportMessage::OverallFailure {
                backend: backend.to_string(),
                elapsed_ms,
                failure: JobFailure::Verification {
                    errors: errors.clone(),
                },
            });
        }
        VerificationOutcome::TranslatorFailed(_) => {}
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
