//! The process-lifetime verification cache store.
//!
//! A concurrent map from (backend identity, source file, method fingerprint)
//! to the method's dependency hash and its localized errors. Entries are
//! overwritten when the same key is re-verified; under concurrent jobs the
//! last write wins, which is sound because every write records outcomes for
//! exactly the fingerprint in its key.

use crate::analysis::ProgramAnalysis;
use crate::fingerprint::Fingerprint;
use crate::locate::{access_path_to, PathCapture};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use vero_ast::{Method, Node};
use vero_backend::VerificationError;
use vero_core::Position;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub backend_id: String,
    pub file: PathBuf,
    pub fingerprint: Fingerprint,
}

impl CacheKey {
    pub fn new(backend_id: impl Into<String>, file: impl Into<PathBuf>, fp: Fingerprint) -> Self {
        Self {
            backend_id: backend_id.into(),
            file: file.into(),
            fingerprint: fp,
        }
    }
}

/// A verification error stored with access paths instead of trusting its
/// positions. The template's positions are those of the AST that originally
/// produced the error.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalizedError {
    pub template: VerificationError,
    pub offending: PathCapture,
    pub reason: PathCapture,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub dependency_hash: Fingerprint,
    pub errors: Vec<LocalizedError>,
}

/// The shared in-memory store. Cheap to clone a handle via `Arc` at the
/// caller's discretion; all methods take `&self`.
#[derive(Debug, Default)]
pub struct VerificationCache {
    inner: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl VerificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, backend_id: &str, file: &Path, fp: &Fingerprint) -> Option<CacheEntry> {
        let inner = self.inner.read();
        let key = CacheKey::new(backend_id, file, fp.clone());
        inner.get(&key).cloned()
    }

    /// Store the outcome for one method: its dependency hash under the
    /// current program plus the given errors in localized form.
    ///
    /// Access paths for each error's offending and reason nodes are captured
    /// here, relative to the method root.
    pub fn update(
        &self,
        backend_id: &str,
        file: &Path,
        analysis: &ProgramAnalysis,
        method: &Method,
        errors: &[VerificationError],
    ) {
        let Some(fp) = analysis.method_fingerprint(&method.name) else {
            warn!(
                target: "vero.cache",
                method = %method.name,
                "method missing from program analysis; not caching"
            );
            return;
        };
        let Some(dependency_hash) = analysis.dependency_hash(&method.name) else {
            return;
        };

        let localized = errors
            .iter()
            .map(|error| localize(method, error))
            .collect::<Vec<_>>();

        debug!(
            target: "vero.cache",
            method = %method.name,
            errors = localized.len(),
            "caching verification outcome"
        );

        let key = CacheKey::new(backend_id, file, fp.clone());
        self.inner.write().insert(
            key,
            CacheEntry {
                dependency_hash,
                errors: localized,
            },
        );
    }

    /// Insert a pre-built entry. `update` is the normal path; this exists so
    /// callers with an already localized entry (or tests) can write directly.
    pub fn insert(&self, key: CacheKey, entry: CacheEntry) {
        self.inner.write().insert(key, entry);
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.inner.write().remove(key).is_some()
    }

    /// Drop every entry recorded for one (backend, file) pair. Returns the
    /// number of removed entries.
    pub fn invalidate_file(&self, backend_id: &str, file: &Path) -> usize {
        let mut inner = self.inner.write();
        let before = inner.len();
        inner.retain(|key, _| !(key.backend_id == backend_id && key.file == file));
        before - inner.len()
    }

    /// Drop everything. Returns the number of removed entries.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.write();
        let removed = inner.len();
        inner.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

fn localize(method: &Method, error: &VerificationError) -> LocalizedError {
    LocalizedError {
        template: error.clone(),
        offending: capture(method, error.pos, "offending"),
        reason: capture(method, error.reason_pos, "reason"),
    }
}

fn capture(method: &Method, pos: Position, role: &str) -> PathCapture {
    if !pos.is_known() {
        return PathCapture::Missing;
    }
    match access_path_to(Node::Method(method), pos) {
        Some(path) => PathCapture::Captured(path),
        None => {
            warn!(
                target: "vero.cache",
                method = %method.name,
                role,
                %pos,
                "no node carries the error position; entry will not be replayable"
            );
            PathCapture::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::replay_error;
    use vero_ast::{Expr, ExprKind, Program, Stmt, StmtKind};
    use vero_backend::{ErrorKind, VerificationError};
    use vero_core::{LineCol, Position};

    fn program_with_failing_assert() -> Program {
        let cond = Expr::new(ExprKind::BoolLit(false), Position::point(11, 12));
        Program {
            methods: vec![Method {
                name: "foo".into(),
                args: vec![],
                returns: vec![],
                pres: vec![],
                posts: vec![],
                body: Some(Stmt::new(
                    StmtKind::Seqn {
                        locals: vec![],
                        stmts: vec![Stmt::new(StmtKind::Assert(cond), Position::point(11, 3))],
                    },
                    Position::span(LineCol::new(10, 1), LineCol::new(12, 1)),
                )),
                pos: Position::span(LineCol::new(10, 1), LineCol::new(12, 1)),
            }],
            ..Default::default()
        }
    }

    fn assert_error() -> VerificationError {
        VerificationError::new(
            ErrorKind::AssertFailed,
            "assert might fail",
            Position::point(11, 3),
        )
        .with_reason("assertion is false", Position::point(11, 12))
    }

    #[test]
    fn update_then_get_roundtrips() {
        let program = program_with_failing_assert();
        let analysis = ProgramAnalysis::new(&program);
        let cache = VerificationCache::new();
        let file = Path::new("test.vpr");

        cache.update(
            "solver",
            file,
            &analysis,
            &program.methods[0],
            &[assert_error()],
        );
        assert_eq!(cache.len(), 1);

        let fp = analysis.method_fingerprint("foo").unwrap();
        let entry = cache.get("solver", file, fp).expect("entry present");
        assert_eq!(entry.dependency_hash, analysis.dependency_hash("foo").unwrap());
        assert_eq!(entry.errors.len(), 1);
        assert!(matches!(entry.errors[0].offending, PathCapture::Captured(_)));
        assert!(matches!(entry.errors[0].reason, PathCapture::Captured(_)));

        // Different backend id, same fingerprint: distinct key.
        assert!(cache.get("other", file, fp).is_none());
    }

    #[test]
    fn stored_paths_replay_in_an_edited_ast() {
        let program = program_with_failing_assert();
        let analysis = ProgramAnalysis::new(&program);
        let cache = VerificationCache::new();
        let file = Path::new("test.vpr");
        cache.update(
            "solver",
            file,
            &analysis,
            &program.methods[0],
            &[assert_error()],
        );

        // Same structure, two lines further down.
        let mut shifted = program.clone();
        let m = &mut shifted.methods[0];
        m.pos = Position::span(LineCol::new(12, 1), LineCol::new(14, 1));
        if let Some(body) = m.body.as_mut() {
            body.pos = m.pos;
            if let StmtKind::Seqn { stmts, .. } = &mut body.kind {
                stmts[0].pos = Position::point(13, 3);
                if let StmtKind::Assert(cond) = &mut stmts[0].kind {
                    cond.pos = Position::point(13, 12);
                }
            }
        }

        let fp = analysis.method_fingerprint("foo").unwrap();
        let entry = cache.get("solver", file, fp).unwrap();
        let replayed = replay_error(
            &shifted.methods[0],
            &entry.errors[0].template,
            &entry.errors[0].offending,
            &entry.errors[0].reason,
        )
        .expect("paths resolve in the shifted AST");
        assert_eq!(replayed.pos, Position::point(13, 3));
        assert_eq!(replayed.reason_pos, Position::point(13, 12));
    }

    #[test]
    fn unattributable_positions_mark_the_entry_unreplayable() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let program = program_with_failing_assert();
        let analysis = ProgramAnalysis::new(&program);
        let cache = VerificationCache::new();
        let file = Path::new("test.vpr");

        let stray = VerificationError::new(
            ErrorKind::Internal,
            "position matches no node",
            Position::point(11, 7),
        );
        cache.update("solver", file, &analysis, &program.methods[0], &[stray]);

        let fp = analysis.method_fingerprint("foo").unwrap();
        let entry = cache.get("solver", file, fp).unwrap();
        assert_eq!(entry.errors[0].offending, PathCapture::Failed);
        // Unknown reason position is fine: nothing to translate.
        assert_eq!(entry.errors[0].reason, PathCapture::Missing);
    }

    #[test]
    fn invalidation_scopes_by_backend_and_file() {
        let program = program_with_failing_assert();
        let analysis = ProgramAnalysis::new(&program);
        let cache = VerificationCache::new();

        cache.update(
            "solver",
            Path::new("a.vpr"),
            &analysis,
            &program.methods[0],
            &[],
        );
        cache.update(
            "solver",
            Path::new("b.vpr"),
            &analysis,
            &program.methods[0],
            &[],
        );
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.invalidate_file("solver", Path::new("a.vpr")), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.invalidate_file("solver", Path::new("missing.vpr")), 0);
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
    }
}
