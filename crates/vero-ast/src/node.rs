//! A uniform read-only view over the AST.
//!
//! [`Node`] erases the concrete node type behind one enum so that tree-shape
//! consumers (content hashing, access-path capture and resolution) can be
//! written once. Every node exposes:
//!
//! - a stable variant tag ([`NodeTag`]),
//! - its children in declaration order,
//! - its source position (possibly unknown),
//! - its literal payload: the bytes of names, constants and operator tags
//!   that distinguish it from a structurally identical sibling.
//!
//! Positions are deliberately *not* part of the payload.

use crate::ast::*;
use serde::{Deserialize, Serialize};
use vero_core::Position;

/// Stable variant tag of an AST node.
///
/// The numeric value is used in content hashes and access paths, both of
/// which are process-lifetime only, so the only stability requirement is
/// that each variant keeps a distinct value within a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum NodeTag {
    Program,
    Method,
    Function,
    Predicate,
    Domain,
    DomainFunc,
    DomainAxiom,
    Field,
    LocalVarDecl,
    Trigger,

    Seqn,
    LocalAssign,
    FieldAssign,
    MethodCall,
    Inhale,
    Exhale,
    Assert,
    Assume,
    Fold,
    Unfold,
    Package,
    Apply,
    If,
    While,
    Label,
    Goto,
    New,

    IntLit,
    BoolLit,
    NullLit,
    LocalVar,
    Unary,
    Binary,
    Conditional,
    FullPerm,
    NoPerm,
    WildcardPerm,
    EpsilonPerm,
    FractionalPerm,
    CurrentPerm,
    FieldAccess,
    PredicateAccess,
    Acc,
    MagicWand,
    Unfolding,
    Applying,
    Old,
    LabelledOld,
    FuncApp,
    DomainFuncApp,
    Forall,
    Exists,
    EmptyCollection,
    ExplicitCollection,
    CollectionOp,

    TypeInt,
    TypeBool,
    TypePerm,
    TypeRef,
    TypeSeq,
    TypeSet,
    TypeMultiset,
    TypeDomain,
    TypeVar,
}

/// A borrowed view of any AST node.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    Method(&'a Method),
    Function(&'a Function),
    Predicate(&'a Predicate),
    Domain(&'a Domain),
    DomainFunc(&'a DomainFunc),
    DomainAxiom(&'a DomainAxiom),
    Field(&'a Field),
    LocalVarDecl(&'a LocalVarDecl),
    Trigger(&'a Trigger),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
    Type(&'a Type),
}

impl<'a> Node<'a> {
    pub fn tag(&self) -> NodeTag {
        match self {
            Node::Program(_) => NodeTag::Program,
            Node::Method(_) => NodeTag::Method,
            Node::Function(_) => NodeTag::Function,
            Node::Predicate(_) => NodeTag::Predicate,
            Node::Domain(_) => NodeTag::Domain,
            Node::DomainFunc(_) => NodeTag::DomainFunc,
            Node::DomainAxiom(_) => NodeTag::DomainAxiom,
            Node::Field(_) => NodeTag::Field,
            Node::LocalVarDecl(_) => NodeTag::LocalVarDecl,
            Node::Trigger(_) => NodeTag::Trigger,
            Node::Stmt(stmt) => match &stmt.kind {
                StmtKind::Seqn { .. } => NodeTag::Seqn,
                StmtKind::LocalAssign { .. } => NodeTag::LocalAssign,
                StmtKind::FieldAssign { .. } => NodeTag::FieldAssign,
                StmtKind::MethodCall { .. } => NodeTag::MethodCall,
                StmtKind::Inhale(_) => NodeTag::Inhale,
                StmtKind::Exhale(_) => NodeTag::Exhale,
                StmtKind::Assert(_) => NodeTag::Assert,
                StmtKind::Assume(_) => NodeTag::Assume,
                StmtKind::Fold(_) => NodeTag::Fold,
                StmtKind::Unfold(_) => NodeTag::Unfold,
                StmtKind::Package { .. } => NodeTag::Package,
                StmtKind::Apply { .. } => NodeTag::Apply,
                StmtKind::If { .. } => NodeTag::If,
                StmtKind::While { .. } => NodeTag::While,
                StmtKind::Label { .. } => NodeTag::Label,
                StmtKind::Goto { .. } => NodeTag::Goto,
                StmtKind::New { .. } => NodeTag::New,
            },
            Node::Expr(expr) => match &expr.kind {
                ExprKind::IntLit(_) => NodeTag::IntLit,
                ExprKind::BoolLit(_) => NodeTag::BoolLit,
                ExprKind::NullLit => NodeTag::NullLit,
                ExprKind::LocalVar { .. } => NodeTag::LocalVar,
                ExprKind::Unary { .. } => NodeTag::Unary,
                ExprKind::Binary { .. } => NodeTag::Binary,
                ExprKind::Conditional { .. } => NodeTag::Conditional,
                ExprKind::FullPerm => NodeTag::FullPerm,
                ExprKind::NoPerm => NodeTag::NoPerm,
                ExprKind::WildcardPerm => NodeTag::WildcardPerm,
                ExprKind::EpsilonPerm => NodeTag::EpsilonPerm,
                ExprKind::FractionalPerm { .. } => NodeTag::FractionalPerm,
                ExprKind::CurrentPerm { .. } => NodeTag::CurrentPerm,
                ExprKind::FieldAccess { .. } => NodeTag::FieldAccess,
                ExprKind::PredicateAccess { .. } => NodeTag::PredicateAccess,
                ExprKind::Acc { .. } => NodeTag::Acc,
                ExprKind::MagicWand { .. } => NodeTag::MagicWand,
                ExprKind::Unfolding { .. } => NodeTag::Unfolding,
                ExprKind::Applying { .. } => NodeTag::Applying,
                ExprKind::Old { .. } => NodeTag::Old,
                ExprKind::LabelledOld { .. } => NodeTag::LabelledOld,
                ExprKind::FuncApp { .. } => NodeTag::FuncApp,
                ExprKind::DomainFuncApp { .. } => NodeTag::DomainFuncApp,
                ExprKind::Forall { .. } => NodeTag::Forall,
                ExprKind::Exists { .. } => NodeTag::Exists,
                ExprKind::EmptyCollection { .. } => NodeTag::EmptyCollection,
                ExprKind::ExplicitCollection { .. } => NodeTag::ExplicitCollection,
                ExprKind::CollectionOp { .. } => NodeTag::CollectionOp,
            },
            Node::Type(typ) => match typ {
                Type::Int => NodeTag::TypeInt,
                Type::Bool => NodeTag::TypeBool,
                Type::Perm => NodeTag::TypePerm,
                Type::Ref => NodeTag::TypeRef,
                Type::Seq(_) => NodeTag::TypeSeq,
                Type::Set(_) => NodeTag::TypeSet,
                Type::Multiset(_) => NodeTag::TypeMultiset,
                Type::Domain(_) => NodeTag::TypeDomain,
                Type::TypeVar(_) => NodeTag::TypeVar,
            },
        }
    }

    /// The node's source position. `Unknown` for nodes that carry none
    /// (programs, types).
    pub fn position(&self) -> Position {
        match self {
            Node::Program(_) | Node::Type(_) => Position::Unknown,
            Node::Method(m) => m.pos,
            Node::Function(f) => f.pos,
            Node::Predicate(p) => p.pos,
            Node::Domain(d) => d.pos,
            Node::DomainFunc(f) => f.pos,
            Node::DomainAxiom(a) => a.pos,
            Node::Field(f) => f.pos,
            Node::LocalVarDecl(d) => d.pos,
            Node::Trigger(t) => t.pos,
            Node::Stmt(s) => s.pos,
            Node::Expr(e) => e.pos,
        }
    }

    /// The node's children in declaration order.
    pub fn children(&self) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        match self {
            Node::Program(p) => {
                out.extend(p.domains.iter().map(Node::Domain));
                out.extend(p.fields.iter().map(Node::Field));
                out.extend(p.functions.iter().map(Node::Function));
                out.extend(p.predicates.iter().map(Node::Predicate));
                out.extend(p.methods.iter().map(Node::Method));
            }
            Node::Method(m) => {
                out.extend(m.args.iter().map(Node::LocalVarDecl));
                out.extend(m.returns.iter().map(Node::LocalVarDecl));
                out.extend(m.pres.iter().map(Node::Expr));
                out.extend(m.posts.iter().map(Node::Expr));
                out.extend(m.body.iter().map(Node::Stmt));
            }
            Node::Function(f) => {
                out.extend(f.args.iter().map(Node::LocalVarDecl));
                out.push(Node::Type(&f.result));
                out.extend(f.pres.iter().map(Node::Expr));
                out.extend(f.posts.iter().map(Node::Expr));
                out.extend(f.body.iter().map(Node::Expr));
            }
            Node::Predicate(p) => {
                out.extend(p.args.iter().map(Node::LocalVarDecl));
                out.extend(p.body.iter().map(Node::Expr));
            }
            Node::Domain(d) => {
                out.extend(d.functions.iter().map(Node::DomainFunc));
                out.extend(d.axioms.iter().map(Node::DomainAxiom));
            }
            Node::DomainFunc(f) => {
                out.extend(f.args.iter().map(Node::Type));
                out.push(Node::Type(&f.result));
            }
            Node::DomainAxiom(a) => out.push(Node::Expr(&a.body)),
            Node::Field(f) => out.push(Node::Type(&f.typ)),
            Node::LocalVarDecl(d) => out.push(Node::Type(&d.typ)),
            Node::Trigger(t) => out.extend(t.exprs.iter().map(Node::Expr)),
            Node::Stmt(stmt) => match &stmt.kind {
                StmtKind::Seqn { locals, stmts } => {
                    out.extend(locals.iter().map(Node::LocalVarDecl));
                    out.extend(stmts.iter().map(Node::Stmt));
                }
                StmtKind::LocalAssign { rhs, .. } => out.push(Node::Expr(rhs)),
                StmtKind::FieldAssign { receiver, rhs, .. } => {
                    out.push(Node::Expr(receiver));
                    out.push(Node::Expr(rhs));
                }
                StmtKind::MethodCall { args, .. } => out.extend(args.iter().map(Node::Expr)),
                StmtKind::Inhale(e)
                | StmtKind::Exhale(e)
                | StmtKind::Assert(e)
                | StmtKind::Assume(e)
                | StmtKind::Fold(e)
                | StmtKind::Unfold(e) => out.push(Node::Expr(e)),
                StmtKind::Package { wand, proof } => {
                    out.push(Node::Expr(wand));
                    out.extend(proof.iter().map(|s| Node::Stmt(s)));
                }
                StmtKind::Apply { wand } => out.push(Node::Expr(wand)),
                StmtKind::If {
                    cond,
                    then_branch,
                    else_branch,
                } => {
                    out.push(Node::Expr(cond));
                    out.push(Node::Stmt(then_branch));
                    out.push(Node::Stmt(else_branch));
                }
                StmtKind::While {
                    cond,
                    invariants,
                    body,
                } => {
                    out.push(Node::Expr(cond));
                    out.extend(invariants.iter().map(Node::Expr));
                    out.push(Node::Stmt(body));
                }
                StmtKind::Label { .. } | StmtKind::Goto { .. } | StmtKind::New { .. } => {}
            },
            Node::Expr(expr) => match &expr.kind {
                ExprKind::IntLit(_)
                | ExprKind::BoolLit(_)
                | ExprKind::NullLit
                | ExprKind::FullPerm
                | ExprKind::NoPerm
                | ExprKind::WildcardPerm
                | ExprKind::EpsilonPerm => {}
                ExprKind::LocalVar { typ, .. } => out.push(Node::Type(typ)),
                ExprKind::Unary { operand, .. } => out.push(Node::Expr(operand)),
                ExprKind::Binary { left, right, .. } => {
                    out.push(Node::Expr(left));
                    out.push(Node::Expr(right));
                }
                ExprKind::Conditional {
                    cond,
                    then_expr,
                    else_expr,
                } => {
                    out.push(Node::Expr(cond));
                    out.push(Node::Expr(then_expr));
                    out.push(Node::Expr(else_expr));
                }
                ExprKind::FractionalPerm {
                    numerator,
                    denominator,
                } => {
                    out.push(Node::Expr(numerator));
                    out.push(Node::Expr(denominator));
                }
                ExprKind::CurrentPerm { location } => out.push(Node::Expr(location)),
                ExprKind::FieldAccess { receiver, .. } => out.push(Node::Expr(receiver)),
                ExprKind::PredicateAccess { args, .. } => {
                    out.extend(args.iter().map(Node::Expr));
                }
                ExprKind::Acc { location, perm } => {
                    out.push(Node::Expr(location));
                    out.push(Node::Expr(perm));
                }
                ExprKind::MagicWand { left, right } => {
                    out.push(Node::Expr(left));
                    out.push(Node::Expr(right));
                }
                ExprKind::Unfolding { acc, body } => {
                    out.push(Node::Expr(acc));
                    out.push(Node::Expr(body));
                }
                ExprKind::Applying { wand, body } => {
                    out.push(Node::Expr(wand));
                    out.push(Node::Expr(body));
                }
                ExprKind::Old { expr } => out.push(Node::Expr(expr)),
                ExprKind::LabelledOld { expr, .. } => out.push(Node::Expr(expr)),
                ExprKind::FuncApp { args, .. } => out.extend(args.iter().map(Node::Expr)),
                ExprKind::DomainFuncApp { args, .. } => out.extend(args.iter().map(Node::Expr)),
                ExprKind::Forall {
                    vars,
                    triggers,
                    body,
                }
                | ExprKind::Exists {
                    vars,
                    triggers,
                    body,
                } => {
                    out.extend(vars.iter().map(Node::LocalVarDecl));
                    out.extend(triggers.iter().map(Node::Trigger));
                    out.push(Node::Expr(body));
                }
                ExprKind::EmptyCollection { elem, .. } => out.push(Node::Type(elem)),
                ExprKind::ExplicitCollection { elems, .. } => {
                    out.extend(elems.iter().map(Node::Expr));
                }
                ExprKind::CollectionOp { args, .. } => out.extend(args.iter().map(Node::Expr)),
            },
            Node::Type(typ) => match typ {
                Type::Seq(inner) | Type::Set(inner) | Type::Multiset(inner) => {
                    out.push(Node::Type(inner));
                }
                Type::Int
                | Type::Bool
                | Type::Perm
                | Type::Ref
                | Type::Domain(_)
                | Type::TypeVar(_) => {}
            },
        }
        out
    }

    /// Append the node's literal payload to `buf`.
    ///
    /// The payload is everything that distinguishes this node from another
    /// node of the same variant with identically shaped children: names,
    /// constants, operator and collection tags. Positions are excluded.
    pub fn write_payload(&self, buf: &mut Vec<u8>) {
        match self {
            Node::Program(_) | Node::Trigger(_) => {}
            Node::Method(m) => push_str(buf, &m.name),
            Node::Function(f) => push_str(buf, &f.name),
            Node::Predicate(p) => push_str(buf, &p.name),
            Node::Domain(d) => push_str(buf, &d.name),
            Node::DomainFunc(f) => {
                push_str(buf, &f.name);
                buf.push(f.unique as u8);
            }
            Node::DomainAxiom(a) => push_str(buf, &a.name),
            Node::Field(f) => push_str(buf, &f.name),
            Node::LocalVarDecl(d) => push_str(buf, &d.name),
            Node::Stmt(stmt) => match &stmt.kind {
                StmtKind::Seqn { .. }
                | StmtKind::Inhale(_)
                | StmtKind::Exhale(_)
                | StmtKind::Assert(_)
                | StmtKind::Assume(_)
                | StmtKind::Fold(_)
                | StmtKind::Unfold(_)
                | StmtKind::Package { .. }
                | StmtKind::Apply { .. }
                | StmtKind::If { .. }
                | StmtKind::While { .. } => {}
                StmtKind::LocalAssign { target, .. } => push_str(buf, target),
                StmtKind::FieldAssign { field, .. } => push_str(buf, field),
                StmtKind::MethodCall {
                    method, targets, ..
                } => {
                    push_str(buf, method);
                    for target in targets {
                        push_str(buf, target);
                    }
                }
                StmtKind::Label { name } => push_str(buf, name),
                StmtKind::Goto { target } => push_str(buf, target),
                StmtKind::New { target, fields } => {
                    push_str(buf, target);
                    for field in fields {
                        push_str(buf, field);
                    }
                }
            },
            Node::Expr(expr) => match &expr.kind {
                ExprKind::IntLit(value) => buf.extend_from_slice(&value.to_le_bytes()),
                ExprKind::BoolLit(value) => buf.push(*value as u8),
                ExprKind::NullLit
                | ExprKind::FullPerm
                | ExprKind::NoPerm
                | ExprKind::WildcardPerm
                | ExprKind::EpsilonPerm
                | ExprKind::FractionalPerm { .. }
                | ExprKind::CurrentPerm { .. }
                | ExprKind::Conditional { .. }
                | ExprKind::Acc { .. }
                | ExprKind::MagicWand { .. }
                | ExprKind::Unfolding { .. }
                | ExprKind::Applying { .. }
                | ExprKind::Old { .. }
                | ExprKind::Forall { .. }
                | ExprKind::Exists { .. } => {}
                ExprKind::LocalVar { name, .. } => push_str(buf, name),
                ExprKind::Unary { op, .. } => buf.push(*op as u8),
                ExprKind::Binary { op, .. } => buf.push(*op as u8),
                ExprKind::FieldAccess { field, .. } => push_str(buf, field),
                ExprKind::PredicateAccess { predicate, .. } => push_str(buf, predicate),
                ExprKind::LabelledOld { label, .. } => push_str(buf, label),
                ExprKind::FuncApp { function, .. } => push_str(buf, function),
                ExprKind::DomainFuncApp {
                    domain, function, ..
                } => {
                    push_str(buf, domain);
                    push_str(buf, function);
                }
                ExprKind::EmptyCollection { kind, .. } => buf.push(*kind as u8),
                ExprKind::ExplicitCollection { kind, .. } => buf.push(*kind as u8),
                ExprKind::CollectionOp { op, .. } => buf.push(*op as u8),
            },
            Node::Type(typ) => match typ {
                Type::Domain(name) | Type::TypeVar(name) => push_str(buf, name),
                Type::Int
                | Type::Bool
                | Type::Perm
                | Type::Ref
                | Type::Seq(_)
                | Type::Set(_)
                | Type::Multiset(_) => {}
            },
        }
    }
}

// Strings are length-prefixed so adjacent payload fields cannot alias each
// other ("ab","c" vs "a","bc").
fn push_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}
