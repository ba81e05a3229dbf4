//! Typed report messages and the reporter sink.
//!
//! Each job carries its own reporter handle; emission is fire-and-forget and
//! must never block the pipeline. Informational messages (outline,
//! statistics, definitions) are emitted before the first back-end
//! interaction, the overall result after the merge, and every job ends with
//! [`ReportMessage::Finished`].

use crate::frontend::TranslatorError;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use vero_ast::{Definition, MemberCounts};
use vero_backend::VerificationError;

/// What a failed job failed on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum JobFailure {
    Translation { errors: Vec<TranslatorError> },
    Verification { errors: Vec<VerificationError> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportMessage {
    /// Top-level members of the program, in program order.
    ProgramOutline { members: Vec<Definition> },
    Statistics { counts: MemberCounts },
    /// All definitions, including formals, locals and axioms.
    ProgramDefinitions { definitions: Vec<Definition> },
    OverallSuccess { backend: String, elapsed_ms: u64 },
    OverallFailure {
        backend: String,
        elapsed_ms: u64,
        failure: JobFailure,
    },
    Exception { message: String },
    /// Final-report marker; always the last message of a job.
    Finished,
}

/// A sink for report messages. Implementations must not block.
pub trait Reporter: Send + Sync {
    fn report(&self, message: ReportMessage);
}

/// Reporter backed by an unbounded channel; the environment drains the
/// receiver. Messages emitted after the receiver is gone are dropped.
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<ReportMessage>,
}

impl ChannelReporter {
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<ReportMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl Reporter for ChannelReporter {
    fn report(&self, message: ReportMessage) {
        let _ = self.tx.send(message);
    }
}

/// Reporter that buffers everything in memory. Intended for tests.
#[derive(Default)]
pub struct CollectingReporter {
    messages: Mutex<Vec<ReportMessage>>,
}

impl CollectingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<ReportMessage> {
        std::mem::take(&mut *self.messages.lock())
    }

    pub fn snapshot(&self) -> Vec<ReportMessage> {
        self.messages.lock().clone()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, message: ReportMessage) {
        self.messages.lock().push(message);
    }
}
