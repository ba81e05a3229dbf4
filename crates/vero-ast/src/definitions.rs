//! Informational definition records and member statistics.
//!
//! These feed the outline/definitions/statistics reports a front-end server
//! emits before verification starts. They carry no verification semantics.

use crate::ast::*;
use crate::node::Node;
use serde::{Deserialize, Serialize};
use vero_core::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Method,
    Function,
    Predicate,
    Domain,
    Argument,
    Return,
    Local,
    Axiom,
    Field,
}

/// A named declaration, with the position of the declaration itself and,
/// for scoped declarations, the position of the enclosing scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub kind: DefinitionKind,
    pub pos: Position,
    pub scope: Option<Position>,
}

impl Definition {
    fn top_level(name: &str, kind: DefinitionKind, pos: Position) -> Self {
        Self {
            name: name.to_string(),
            kind,
            pos,
            scope: None,
        }
    }

    fn scoped(name: &str, kind: DefinitionKind, pos: Position, scope: Position) -> Self {
        Self {
            name: name.to_string(),
            kind,
            pos,
            scope: Some(scope),
        }
    }
}

/// Counts of the five top-level member kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemberCounts {
    pub methods: usize,
    pub functions: usize,
    pub predicates: usize,
    pub domains: usize,
    pub fields: usize,
}

impl MemberCounts {
    pub fn of(program: &Program) -> Self {
        Self {
            methods: program.methods.len(),
            functions: program.functions.len(),
            predicates: program.predicates.len(),
            domains: program.domains.len(),
            fields: program.fields.len(),
        }
    }
}

/// Top-level members only, in program order.
pub fn outline(program: &Program) -> Vec<Definition> {
    let mut out = Vec::new();
    for domain in &program.domains {
        out.push(Definition::top_level(
            &domain.name,
            DefinitionKind::Domain,
            domain.pos,
        ));
    }
    for field in &program.fields {
        out.push(Definition::top_level(
            &field.name,
            DefinitionKind::Field,
            field.pos,
        ));
    }
    for function in &program.functions {
        out.push(Definition::top_level(
            &function.name,
            DefinitionKind::Function,
            function.pos,
        ));
    }
    for predicate in &program.predicates {
        out.push(Definition::top_level(
            &predicate.name,
            DefinitionKind::Predicate,
            predicate.pos,
        ));
    }
    for method in &program.methods {
        out.push(Definition::top_level(
            &method.name,
            DefinitionKind::Method,
            method.pos,
        ));
    }
    out
}

/// All definitions: top-level members, formals, axioms, domain functions and
/// every scope-local declaration (sequence locals, quantifier binders).
pub fn collect_definitions(program: &Program) -> Vec<Definition> {
    let mut out = Vec::new();

    for domain in &program.domains {
        out.push(Definition::top_level(
            &domain.name,
            DefinitionKind::Domain,
            domain.pos,
        ));
        for func in &domain.functions {
            out.push(Definition::scoped(
                &func.name,
                DefinitionKind::Function,
                func.pos,
                domain.pos,
            ));
        }
        for axiom in &domain.axioms {
            out.push(Definition::scoped(
                &axiom.name,
                DefinitionKind::Axiom,
                axiom.pos,
                domain.pos,
            ));
            collect_scoped(Node::Expr(&axiom.body), domain.pos, &mut out);
        }
    }

    for field in &program.fields {
        out.push(Definition::top_level(
            &field.name,
            DefinitionKind::Field,
            field.pos,
        ));
    }

    for function in &program.functions {
        out.push(Definition::top_level(
            &function.name,
            DefinitionKind::Function,
            function.pos,
        ));
        for arg in &function.args {
            out.push(Definition::scoped(
                &arg.name,
                DefinitionKind::Argument,
                arg.pos,
                function.pos,
            ));
        }
        for expr in function
            .pres
            .iter()
            .chain(&function.posts)
            .chain(&function.body)
        {
            collect_scoped(Node::Expr(expr), function.pos, &mut out);
        }
    }

    for predicate in &program.predicates {
        out.push(Definition::top_level(
            &predicate.name,
            DefinitionKind::Predicate,
            predicate.pos,
        ));
        for arg in &predicate.args {
            out.push(Definition::scoped(
                &arg.name,
                DefinitionKind::Argument,
                arg.pos,
                predicate.pos,
            ));
        }
        if let Some(body) = &predicate.body {
            collect_scoped(Node::Expr(body), predicate.pos, &mut out);
        }
    }

    for method in &program.methods {
        out.push(Definition::top_level(
            &method.name,
            DefinitionKind::Method,
            method.pos,
        ));
        for arg in &method.args {
            out.push(Definition::scoped(
                &arg.name,
                DefinitionKind::Argument,
                arg.pos,
                method.pos,
            ));
        }
        for ret in &method.returns {
            out.push(Definition::scoped(
                &ret.name,
                DefinitionKind::Return,
                ret.pos,
                method.pos,
            ));
        }
        for expr in method.pres.iter().chain(&method.posts) {
            collect_scoped(Node::Expr(expr), method.pos, &mut out);
        }
        if let Some(body) = &method.body {
            collect_scoped(Node::Stmt(body), method.pos, &mut out);
        }
    }

    out
}

// Scope-local declarations live on sequence statements and quantifiers; the
// generic child walk handles everything in between.
fn collect_scoped(node: Node<'_>, scope: Position, out: &mut Vec<Definition>) {
    let inner_scope = match node {
        Node::Stmt(stmt) => match &stmt.kind {
            StmtKind::Seqn { locals, .. } => {
                let scope = known_or(stmt.pos, scope);
                for local in locals {
                    out.push(Definition::scoped(
                        &local.name,
                        DefinitionKind::Local,
                        local.pos,
                        scope,
                    ));
                }
                scope
            }
            _ => scope,
        },
        Node::Expr(expr) => match &expr.kind {
            ExprKind::Forall { vars, .. } | ExprKind::Exists { vars, .. } => {
                let scope = known_or(expr.pos, scope);
                for var in vars {
                    out.push(Definition::scoped(
                        &var.name,
                        DefinitionKind::Local,
                        var.pos,
                        scope,
                    ));
                }
                scope
            }
            _ => scope,
        },
        _ => scope,
    };

    for child in node.children() {
        collect_scoped(child, inner_scope, out);
    }
}

fn known_or(pos: Position, fallback: Position) -> Position {
    if pos.is_known() {
        pos
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vero_core::LineCol;

    fn decl(name: &str, line: u32) -> LocalVarDecl {
        LocalVarDecl {
            name: name.into(),
            typ: Type::Int,
            pos: Position::point(line, 5),
        }
    }

    fn sample_program() -> Program {
        let body = Stmt::new(
            StmtKind::Seqn {
                locals: vec![decl("tmp", 12)],
                stmts: vec![Stmt::new(
                    StmtKind::Assert(Expr::new(
                        ExprKind::Forall {
                            vars: vec![decl("i", 13)],
                            triggers: vec![],
                            body: Box::new(Expr::new(
                                ExprKind::BoolLit(true),
                                Position::point(13, 20),
                            )),
                        },
                        Position::point(13, 10),
                    )),
                    Position::point(13, 3),
                )],
            },
            Position::span(LineCol::new(11, 1), LineCol::new(14, 1)),
        );

        Program {
            domains: vec![],
            fields: vec![Field {
                name: "val".into(),
                typ: Type::Int,
                pos: Position::point(1, 1),
            }],
            functions: vec![],
            predicates: vec![],
            methods: vec![Method {
                name: "main".into(),
                args: vec![decl("x", 10)],
                returns: vec![decl("y", 10)],
                pres: vec![],
                posts: vec![],
                body: Some(body),
                pos: Position::span(LineCol::new(10, 1), LineCol::new(14, 1)),
            }],
        }
    }

    #[test]
    fn outline_lists_top_level_members_only() {
        let program = sample_program();
        let outline = outline(&program);
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].kind, DefinitionKind::Field);
        assert_eq!(outline[1].kind, DefinitionKind::Method);
    }

    #[test]
    fn definitions_include_scoped_declarations() {
        let program = sample_program();
        let defs = collect_definitions(&program);

        let kinds: Vec<(DefinitionKind, &str)> =
            defs.iter().map(|d| (d.kind, d.name.as_str())).collect();
        assert!(kinds.contains(&(DefinitionKind::Argument, "x")));
        assert!(kinds.contains(&(DefinitionKind::Return, "y")));
        assert!(kinds.contains(&(DefinitionKind::Local, "tmp")));
        assert!(kinds.contains(&(DefinitionKind::Local, "i")));

        let binder = defs
            .iter()
            .find(|d| d.name == "i")
            .expect("quantifier binder collected");
        assert_eq!(binder.scope, Some(Position::point(13, 10)));
    }

    #[test]
    fn member_counts_match_program() {
        let counts = MemberCounts::of(&sample_program());
        assert_eq!(counts.methods, 1);
        assert_eq!(counts.fields, 1);
        assert_eq!(counts.functions, 0);
    }
}
