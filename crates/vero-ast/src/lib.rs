//! The typed verification AST consumed from the front-end.
//!
//! The tree is produced by parse/typecheck/translate (external to this
//! workspace) and consumed by the back-ends and by the incremental cache.
//! Besides the node types themselves this crate provides:
//!
//! - a uniform [`Node`] view exposing, for every node, a stable variant tag,
//!   its children in declaration order, its source position and its literal
//!   payload bytes — the single seam content hashing and node location are
//!   built on;
//! - collection of informational [`Definition`] records (outlines, member
//!   statistics).

mod ast;
mod definitions;
mod node;

pub use ast::{
    BinOp, CollectionKind, CollectionOp, Domain, DomainAxiom, DomainFunc, Expr, ExprKind, Field,
    Function, LocalVarDecl, Method, Predicate, Program, Stmt, StmtKind, Trigger, Type, UnOp,
};
pub use definitions::{collect_definitions, outline, Definition, DefinitionKind, MemberCounts};
pub use node::{Node, NodeTag};
