//! Content fingerprints over AST shape.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use vero_ast::Node;

/// A stable SHA-256 fingerprint stored as a lowercase hex string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the SHA-256 fingerprint of an arbitrary byte slice.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes.as_ref());
        Self(hex::encode(hasher.finalize()))
    }

    /// Fold an ordered sequence of fingerprints into one.
    pub fn combine<'a>(parts: impl IntoIterator<Item = &'a Fingerprint>) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.0.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Compute the structural fingerprint of an AST subtree.
///
/// The hash covers, for every node in pre-order: the variant tag, the
/// length-prefixed literal payload (names, constants, operator tags) and the
/// child count, then recurses into the children in declaration order. Source
/// positions never enter the hash, so two syntactically identical subtrees
/// fingerprint equal regardless of where they appear.
pub fn fingerprint(node: Node<'_>) -> Fingerprint {
    let mut hasher = Sha256::new();
    let mut payload = Vec::new();
    hash_node(&mut hasher, node, &mut payload);
    Fingerprint(hex::encode(hasher.finalize()))
}

fn hash_node(hasher: &mut Sha256, node: Node<'_>, payload: &mut Vec<u8>) {
    hasher.update((node.tag() as u16).to_le_bytes());

    payload.clear();
    node.write_payload(payload);
    hasher.update((payload.len() as u32).to_le_bytes());
    hasher.update(&*payload);

    let children = node.children();
    hasher.update((children.len() as u32).to_le_bytes());
    for child in children {
        hash_node(hasher, child, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vero_ast::{Expr, ExprKind, LocalVarDecl, Method, Stmt, StmtKind, Type};
    use vero_core::{LineCol, Position};

    fn assert_method(name: &str, value: i64, line: u32) -> Method {
        let cond = Expr::new(ExprKind::IntLit(value), Position::point(line + 1, 12));
        Method {
            name: name.into(),
            args: vec![LocalVarDecl {
                name: "x".into(),
                typ: Type::Int,
                pos: Position::point(line, 10),
            }],
            returns: vec![],
            pres: vec![],
            posts: vec![],
            body: Some(Stmt::new(
                StmtKind::Seqn {
                    locals: vec![],
                    stmts: vec![Stmt::new(StmtKind::Assert(cond), Position::point(line + 1, 3))],
                },
                Position::span(LineCol::new(line, 1), LineCol::new(line + 2, 1)),
            )),
            pos: Position::span(LineCol::new(line, 1), LineCol::new(line + 2, 1)),
        }
    }

    #[test]
    fn position_changes_do_not_change_the_fingerprint() {
        let original = assert_method("foo", 1, 10);
        let shifted = assert_method("foo", 1, 42);
        assert_eq!(
            fingerprint(Node::Method(&original)),
            fingerprint(Node::Method(&shifted))
        );
    }

    #[test]
    fn content_changes_change_the_fingerprint() {
        let original = assert_method("foo", 1, 10);
        let edited = assert_method("foo", 2, 10);
        let renamed = assert_method("bar", 1, 10);
        assert_ne!(
            fingerprint(Node::Method(&original)),
            fingerprint(Node::Method(&edited))
        );
        assert_ne!(
            fingerprint(Node::Method(&original)),
            fingerprint(Node::Method(&renamed))
        );
    }

    #[test]
    fn combine_is_order_sensitive() {
        let a = Fingerprint::from_bytes(b"a");
        let b = Fingerprint::from_bytes(b"b");
        assert_ne!(Fingerprint::combine([&a, &b]), Fingerprint::combine([&b, &a]));
    }
}
