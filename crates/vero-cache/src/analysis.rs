//! Per-program member fingerprints and the dependency hash.
//!
//! [`ProgramAnalysis`] walks a program once, fingerprinting every top-level
//! member and recording which non-method members each member mentions by
//! name. Dependency hashes are derived from that graph on demand.

use crate::fingerprint::{fingerprint, Fingerprint};
use std::collections::{BTreeSet, HashMap};
use vero_ast::{Expr, ExprKind, Node, Program, Type};

/// The kind of a top-level member. Ordering is part of the dependency-hash
/// canonical order (sort by kind, then name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberKind {
    Domain,
    Field,
    Function,
    Predicate,
    Method,
}

/// A top-level member, identified by kind and name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberId {
    pub kind: MemberKind,
    pub name: String,
}

impl MemberId {
    pub fn new(kind: MemberKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Fingerprints and the member reference graph of one program.
///
/// Construction walks every member exactly once; all later queries are map
/// lookups plus, for dependency hashes, a reachability pass over the graph.
#[derive(Debug)]
pub struct ProgramAnalysis {
    fingerprints: HashMap<MemberId, Fingerprint>,
    references: HashMap<MemberId, BTreeSet<MemberId>>,
}

impl ProgramAnalysis {
    pub fn new(program: &Program) -> Self {
        let mut declared: BTreeSet<MemberId> = BTreeSet::new();
        for domain in &program.domains {
            declared.insert(MemberId::new(MemberKind::Domain, &domain.name));
        }
        for field in &program.fields {
            declared.insert(MemberId::new(MemberKind::Field, &field.name));
        }
        for function in &program.functions {
            declared.insert(MemberId::new(MemberKind::Function, &function.name));
        }
        for predicate in &program.predicates {
            declared.insert(MemberId::new(MemberKind::Predicate, &predicate.name));
        }

        let mut fingerprints = HashMap::new();
        let mut references = HashMap::new();

        let mut visit = |id: MemberId, node: Node<'_>| {
            fingerprints.insert(id.clone(), fingerprint(node));
            let mut refs = BTreeSet::new();
            collect_references(node, &declared, &mut refs);
            refs.remove(&id);
            references.insert(id, refs);
        };

        for domain in &program.domains {
            visit(
                MemberId::new(MemberKind::Domain, &domain.name),
                Node::Domain(domain),
            );
        }
        for field in &program.fields {
            visit(
                MemberId::new(MemberKind::Field, &field.name),
                Node::Field(field),
            );
        }
        for function in &program.functions {
            visit(
                MemberId::new(MemberKind::Function, &function.name),
                Node::Function(function),
            );
        }
        for predicate in &program.predicates {
            visit(
                MemberId::new(MemberKind::Predicate, &predicate.name),
                Node::Predicate(predicate),
            );
        }
        for method in &program.methods {
            visit(
                MemberId::new(MemberKind::Method, &method.name),
                Node::Method(method),
            );
        }

        Self {
            fingerprints,
            references,
        }
    }

    pub fn member_fingerprint(&self, id: &MemberId) -> Option<&Fingerprint> {
        self.fingerprints.get(id)
    }

    pub fn method_fingerprint(&self, name: &str) -> Option<&Fingerprint> {
        self.fingerprints
            .get(&MemberId::new(MemberKind::Method, name))
    }

    /// The method's dependency set: the method itself plus every function,
    /// predicate, domain and field transitively reachable through member
    /// references. Other methods are never part of the set.
    pub fn dependency_set(&self, method: &str) -> Option<BTreeSet<MemberId>> {
        let root = MemberId::new(MemberKind::Method, method);
        if !self.fingerprints.contains_key(&root) {
            return None;
        }

        let mut deps: BTreeSet<MemberId> = BTreeSet::new();
        deps.insert(root.clone());

        // Reference cycles among functions/predicates are legal; the visited
        // set (deps itself) terminates the worklist.
        let mut worklist: Vec<&MemberId> = self
            .references
            .get(&root)
            .map(|refs| refs.iter().collect())
            .unwrap_or_default();
        while let Some(id) = worklist.pop() {
            if id.kind == MemberKind::Method || !deps.insert(id.clone()) {
                continue;
            }
            if let Some(refs) = self.references.get(id) {
                worklist.extend(refs.iter());
            }
        }

        Some(deps)
    }

    /// Hash of the method's fingerprint combined with the fingerprints of
    /// every member in its dependency set, in (kind, name) order.
    pub fn dependency_hash(&self, method: &str) -> Option<Fingerprint> {
        let deps = self.dependency_set(method)?;
        let parts: Vec<&Fingerprint> = deps
            .iter()
            .filter_map(|id| self.fingerprints.get(id))
            .collect();
        Some(Fingerprint::combine(parts))
    }
}

// A member mentions another by name through function application, predicate
// reference, field access, domain-function application, or domain use in a
// type. Only names actually declared in the program become edges.
fn collect_references(node: Node<'_>, declared: &BTreeSet<MemberId>, out: &mut BTreeSet<MemberId>) {
    match node {
        Node::Expr(Expr { kind, .. }) => match kind {
            ExprKind::FuncApp { function, .. } => {
                add_if_declared(MemberKind::Function, function, declared, out);
            }
            ExprKind::PredicateAccess { predicate, .. } => {
                add_if_declared(MemberKind::Predicate, predicate, declared, out);
            }
            ExprKind::FieldAccess { field, .. } => {
                add_if_declared(MemberKind::Field, field, declared, out);
            }
            ExprKind::DomainFuncApp { domain, .. } => {
                add_if_declared(MemberKind::Domain, domain, declared, out);
            }
            _ => {}
        },
        Node::Type(Type::Domain(name)) => {
            add_if_declared(MemberKind::Domain, name, declared, out);
        }
        _ => {}
    }

    for child in node.children() {
        collect_references(child, declared, out);
    }
}

fn add_if_declared(
    kind: MemberKind,
    name: &str,
    declared: &BTreeSet<MemberId>,
    out: &mut BTreeSet<MemberId>,
) {
    let id = MemberId::new(kind, name);
    if declared.contains(&id) {
        out.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vero_ast::{
        Expr, ExprKind, Field, Function, LocalVarDecl, Method, Predicate, Stmt, StmtKind, Type,
    };
    use vero_core::{LineCol, Position};

    fn pos(line: u32) -> Position {
        Position::point(line, 1)
    }

    fn span(first: u32, last: u32) -> Position {
        Position::span(LineCol::new(first, 1), LineCol::new(last, 1))
    }

    fn call_pred(predicate: &str, line: u32) -> Expr {
        Expr::new(
            ExprKind::PredicateAccess {
                predicate: predicate.into(),
                args: vec![],
            },
            pos(line),
        )
    }

    fn method(name: &str, body_expr: Expr, first: u32) -> Method {
        Method {
            name: name.into(),
            args: vec![],
            returns: vec![],
            pres: vec![],
            posts: vec![],
            body: Some(Stmt::new(
                StmtKind::Seqn {
                    locals: vec![],
                    stmts: vec![Stmt::new(StmtKind::Assert(body_expr), pos(first + 1))],
                },
                span(first, first + 2),
            )),
            pos: span(first, first + 2),
        }
    }

    fn function(name: &str, body: Expr) -> Function {
        Function {
            name: name.into(),
            args: vec![],
            result: Type::Bool,
            pres: vec![],
            posts: vec![],
            body: Some(body),
            pos: pos(1),
        }
    }

    /// foo asserts pf(), bar asserts true, pf's body reads the field `val`.
    fn sample() -> Program {
        Program {
            domains: vec![],
            fields: vec![Field {
                name: "val".into(),
                typ: Type::Int,
                pos: pos(1),
            }],
            functions: vec![],
            predicates: vec![Predicate {
                name: "pf".into(),
                args: vec![LocalVarDecl {
                    name: "r".into(),
                    typ: Type::Ref,
                    pos: pos(2),
                }],
                body: Some(Expr::new(
                    ExprKind::FieldAccess {
                        receiver: Box::new(Expr::new(
                            ExprKind::LocalVar {
                                name: "r".into(),
                                typ: Type::Ref,
                            },
                            pos(2),
                        )),
                        field: "val".into(),
                    },
                    pos(2),
                )),
                pos: pos(2),
            }],
            methods: vec![
                method("foo", call_pred("pf", 10), 10),
                method("bar", Expr::new(ExprKind::BoolLit(true), pos(20)), 20),
            ],
        }
    }

    #[test]
    fn dependency_set_closes_transitively() {
        let analysis = ProgramAnalysis::new(&sample());
        let deps = analysis.dependency_set("foo").unwrap();
        assert!(deps.contains(&MemberId::new(MemberKind::Method, "foo")));
        assert!(deps.contains(&MemberId::new(MemberKind::Predicate, "pf")));
        // `val` only appears inside pf's body; it must be pulled in through
        // the closure.
        assert!(deps.contains(&MemberId::new(MemberKind::Field, "val")));

        let bar_deps = analysis.dependency_set("bar").unwrap();
        assert_eq!(bar_deps.len(), 1);
    }

    #[test]
    fn dependency_hash_tracks_shared_members_only() {
        let base = sample();
        let analysis = ProgramAnalysis::new(&base);

        // Edit pf's body: foo's dependency hash changes, bar's does not.
        let mut edited = base.clone();
        edited.predicates[0].body = Some(Expr::new(ExprKind::BoolLit(false), pos(2)));
        let edited_analysis = ProgramAnalysis::new(&edited);

        assert_ne!(
            analysis.dependency_hash("foo"),
            edited_analysis.dependency_hash("foo")
        );
        assert_eq!(
            analysis.dependency_hash("bar"),
            edited_analysis.dependency_hash("bar")
        );
        // foo itself did not change, only its dependency.
        assert_eq!(
            analysis.method_fingerprint("foo"),
            edited_analysis.method_fingerprint("foo")
        );
    }

    #[test]
    fn method_to_method_references_are_not_followed() {
        let mut program = sample();
        program.methods.push(method(
            "caller",
            Expr::new(ExprKind::BoolLit(true), pos(30)),
            30,
        ));
        if let Some(Stmt { kind, .. }) = program.methods[2].body.as_mut() {
            if let StmtKind::Seqn { stmts, .. } = kind {
                stmts.push(Stmt::new(
                    StmtKind::MethodCall {
                        method: "foo".into(),
                        args: vec![],
                        targets: vec![],
                    },
                    pos(31),
                ));
            }
        }
        let analysis = ProgramAnalysis::new(&program);

        // Changing foo's body must not invalidate caller.
        let mut edited = program.clone();
        if let Some(Stmt { kind, .. }) = edited.methods[0].body.as_mut() {
            if let StmtKind::Seqn { stmts, .. } = kind {
                stmts.clear();
            }
        }
        let edited_analysis = ProgramAnalysis::new(&edited);
        assert_eq!(
            analysis.dependency_hash("caller"),
            edited_analysis.dependency_hash("caller")
        );
    }

    #[test]
    fn reference_cycles_terminate() {
        let f = function(
            "even",
            Expr::new(
                ExprKind::FuncApp {
                    function: "odd".into(),
                    args: vec![],
                },
                pos(1),
            ),
        );
        let g = function(
            "odd",
            Expr::new(
                ExprKind::FuncApp {
                    function: "even".into(),
                    args: vec![],
                },
                pos(2),
            ),
        );
        let program = Program {
            functions: vec![f, g],
            methods: vec![method(
                "uses",
                Expr::new(
                    ExprKind::FuncApp {
                        function: "even".into(),
                        args: vec![],
                    },
                    pos(10),
                ),
                10,
            )],
            ..Default::default()
        };

        let analysis = ProgramAnalysis::new(&program);
        let deps = analysis.dependency_set("uses").unwrap();
        assert!(deps.contains(&MemberId::new(MemberKind::Function, "even")));
        assert!(deps.contains(&MemberId::new(MemberKind::Function, "odd")));
    }
}
