//! The consumed front-end contract.
//!
//! Parsing, type-checking and translation are external to this workspace;
//! the orchestrator only drives the three phases and reads the resulting
//! program (or the accumulated errors) back out.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vero_ast::Program;
use vero_core::Position;

/// An error produced by parse, typecheck or translate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatorError {
    pub message: String,
    pub pos: Position,
}

impl TranslatorError {
    pub fn new(message: impl Into<String>, pos: Position) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

/// Front-end configuration the orchestrator depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Path of the source file under verification; part of every cache key.
    pub file: PathBuf,
    /// When set, the cache is bypassed entirely.
    #[serde(default)]
    pub disable_caching: bool,
}

impl FrontendConfig {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            disable_caching: false,
        }
    }
}

/// The front-end state machine. Each phase either advances the internal
/// state towards a program value or appends to the error list; `program()`
/// returns the final AST once translation succeeded.
pub trait Frontend {
    fn parse(&mut self);
    fn typecheck(&mut self);
    fn translate(&mut self);

    fn program(&self) -> Option<&Program>;
    fn errors(&self) -> &[TranslatorError];
    fn config(&self) -> &FrontendConfig;
}
