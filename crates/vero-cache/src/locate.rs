//! Access paths: position-independent descent descriptors.
//!
//! When an error is cached, the offending node's location inside its method
//! is recorded as a root-to-node descent (variant tag + child index per
//! step). Positions drift across edits even when structure does not; as long
//! as the method's fingerprint is unchanged, re-walking the path in the new
//! AST lands on the structurally identical node, whose *current* position is
//! then used for the replayed error.

use serde::{Deserialize, Serialize};
use tracing::warn;
use vero_ast::{Method, Node, NodeTag};
use vero_backend::VerificationError;
use vero_core::Position;

/// One descent step: the expected variant tag of the child at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub tag: NodeTag,
    pub index: u32,
}

/// A root-to-node descent below a method root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessPath(Vec<PathStep>);

impl AccessPath {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }
}

/// Outcome of capturing an access path for one error position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathCapture {
    /// The position was unknown; there is nothing to translate on replay.
    Missing,
    Captured(AccessPath),
    /// The position was known but no node in the method carries it. Replay
    /// is impossible; a hit on this entry falls back to re-verification.
    Failed,
}

/// Capture the access path to the deepest node below `root` that carries
/// exactly `pos`.
pub fn access_path_to(root: Node<'_>, pos: Position) -> Option<AccessPath> {
    if !pos.is_known() {
        return None;
    }
    let mut steps = Vec::new();
    if descend(root, pos, &mut steps) {
        Some(AccessPath(steps))
    } else {
        None
    }
}

fn descend(node: Node<'_>, pos: Position, steps: &mut Vec<PathStep>) -> bool {
    for (index, child) in node.children().into_iter().enumerate() {
        steps.push(PathStep {
            tag: child.tag(),
            index: index as u32,
        });
        if descend(child, pos, steps) {
            return true;
        }
        steps.pop();
    }
    node.position() == pos
}

/// Walk `path` from `root`. Returns `None` as soon as any step's variant tag
/// or child index disagrees with the current tree.
pub fn locate<'a>(root: Node<'a>, path: &AccessPath) -> Option<Node<'a>> {
    let mut node = root;
    for step in &path.0 {
        let children = node.children();
        let child = children.get(step.index as usize).copied()?;
        if child.tag() != step.tag {
            return None;
        }
        node = child;
    }
    Some(node)
}

/// Re-position a cached error against the current AST of its method.
///
/// Both the offending node's and the reason node's paths are resolved and
/// their current positions written into a copy of the error. Returns `None`
/// if any stored path fails to resolve; callers treat that as a cache miss.
pub fn replay_error(
    method: &Method,
    template: &VerificationError,
    offending: &PathCapture,
    reason: &PathCapture,
) -> Option<VerificationError> {
    let root = Node::Method(method);
    let mut error = template.clone();

    error.pos = translate(root, offending, template.pos, &method.name)?;
    error.reason_pos = translate(root, reason, template.reason_pos, &method.name)?;

    Some(error)
}

fn translate(
    root: Node<'_>,
    capture: &PathCapture,
    cached_pos: Position,
    method: &str,
) -> Option<Position> {
    match capture {
        PathCapture::Missing => Some(cached_pos),
        PathCapture::Failed => {
            warn!(
                target: "vero.cache",
                method,
                "cached error has an unresolved access path; forcing re-verification"
            );
            None
        }
        PathCapture::Captured(path) => {
            let Some(node) = locate(root, path) else {
                warn!(
                    target: "vero.cache",
                    method,
                    "access path no longer resolves; forcing re-verification"
                );
                return None;
            };
            let pos = node.position();
            if pos.is_known() {
                Some(pos)
            } else {
                // Keep the cached position rather than degrade it to unknown.
                warn!(
                    target: "vero.cache",
                    method,
                    "located node carries no position; keeping the cached one"
                );
                Some(cached_pos)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vero_ast::{Expr, ExprKind, Method, Stmt, StmtKind};
    use vero_core::{LineCol, Position};

    fn method_with_assert(line: u32) -> Method {
        let cond = Expr::new(ExprKind::BoolLit(false), Position::point(line + 1, 12));
        Method {
            name: "foo".into(),
            args: vec![],
            returns: vec![],
            pres: vec![],
            posts: vec![],
            body: Some(Stmt::new(
                StmtKind::Seqn {
                    locals: vec![],
                    stmts: vec![Stmt::new(
                        StmtKind::Assert(cond),
                        Position::point(line + 1, 3),
                    )],
                },
                Position::span(LineCol::new(line, 1), LineCol::new(line + 2, 1)),
            )),
            pos: Position::span(LineCol::new(line, 1), LineCol::new(line + 2, 1)),
        }
    }

    #[test]
    fn capture_then_locate_roundtrips() {
        let method = method_with_assert(10);
        let root = Node::Method(&method);
        let path = access_path_to(root, Position::point(11, 12)).expect("path captured");

        let node = locate(root, &path).expect("path resolves");
        assert_eq!(node.tag(), NodeTag::BoolLit);
        assert_eq!(node.position(), Position::point(11, 12));
    }

    #[test]
    fn locate_translates_positions_across_line_shifts() {
        let original = method_with_assert(10);
        let shifted = method_with_assert(13);

        let path = access_path_to(Node::Method(&original), Position::point(11, 12)).unwrap();
        let node = locate(Node::Method(&shifted), &path).expect("structure unchanged");
        assert_eq!(node.position(), Position::point(14, 12));
    }

    #[test]
    fn locate_rejects_tag_mismatch() {
        let method = method_with_assert(10);
        let root = Node::Method(&method);
        let path = access_path_to(root, Position::point(11, 12)).unwrap();

        let mut steps = path.steps().to_vec();
        steps.last_mut().unwrap().tag = NodeTag::IntLit;
        assert!(locate(root, &AccessPath::new(steps)).is_none());

        let mut steps = path.steps().to_vec();
        steps.last_mut().unwrap().index = 7;
        assert!(locate(root, &AccessPath::new(steps)).is_none());
    }

    #[test]
    fn capture_fails_for_foreign_positions() {
        let method = method_with_assert(10);
        assert!(access_path_to(Node::Method(&method), Position::point(99, 1)).is_none());
        assert!(access_path_to(Node::Method(&method), Position::Unknown).is_none());
    }

    #[test]
    fn replay_updates_both_positions() {
        use vero_backend::{ErrorKind, VerificationError};

        let original = method_with_assert(10);
        let root = Node::Method(&original);
        let offending = PathCapture::Captured(
            access_path_to(root, Position::point(11, 3)).expect("assert stmt"),
        );
        let reason = PathCapture::Captured(
            access_path_to(root, Position::point(11, 12)).expect("condition"),
        );
        let template =
            VerificationError::new(ErrorKind::AssertFailed, "might fail", Position::point(11, 3))
                .with_reason("assertion is false", Position::point(11, 12));

        let shifted = method_with_assert(20);
        let replayed = replay_error(&shifted, &template, &offending, &reason).expect("replays");
        assert_eq!(replayed.pos, Position::point(21, 3));
        assert_eq!(replayed.reason_pos, Position::point(21, 12));

        let failed = replay_error(&shifted, &template, &PathCapture::Failed, &reason);
        assert!(failed.is_none());
    }
}
