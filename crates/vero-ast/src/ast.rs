//! AST node definitions.
//!
//! Statements and expressions are `kind` + `pos` pairs so that source
//! positions live in exactly one place per node and never participate in
//! structural comparisons done elsewhere.

use vero_core::Position;

/// A fully translated program: the unit handed to a back-end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub domains: Vec<Domain>,
    pub fields: Vec<Field>,
    pub functions: Vec<Function>,
    pub predicates: Vec<Predicate>,
    pub methods: Vec<Method>,
}

impl Program {
    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A named top-level procedure. The unit of caching.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub args: Vec<LocalVarDecl>,
    pub returns: Vec<LocalVarDecl>,
    pub pres: Vec<Expr>,
    pub posts: Vec<Expr>,
    pub body: Option<Stmt>,
    pub pos: Position,
}

impl Method {
    /// The method's (start, end) line range, if its position is known.
    pub fn line_range(&self) -> Option<(u32, u32)> {
        match self.pos {
            Position::Unknown => None,
            Position::Span { start, end } => Some((start.line, end.line)),
        }
    }

    /// A copy of this method with the body dropped.
    ///
    /// Used when a cached method still has to appear in a reduced program as
    /// a referenced scope without the back-end re-processing its body.
    pub fn without_body(&self) -> Self {
        Self {
            body: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub args: Vec<LocalVarDecl>,
    pub result: Type,
    pub pres: Vec<Expr>,
    pub posts: Vec<Expr>,
    pub body: Option<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub name: String,
    pub args: Vec<LocalVarDecl>,
    pub body: Option<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub name: String,
    pub functions: Vec<DomainFunc>,
    pub axioms: Vec<DomainAxiom>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainFunc {
    pub name: String,
    pub args: Vec<Type>,
    pub result: Type,
    pub unique: bool,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainAxiom {
    pub name: String,
    pub body: Expr,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub typ: Type,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVarDecl {
    pub name: String,
    pub typ: Type,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: Position) -> Self {
        Self { kind, pos }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Statement sequence with scope-local declarations.
    Seqn {
        locals: Vec<LocalVarDecl>,
        stmts: Vec<Stmt>,
    },
    LocalAssign {
        target: String,
        rhs: Expr,
    },
    FieldAssign {
        receiver: Expr,
        field: String,
        rhs: Expr,
    },
    MethodCall {
        method: String,
        args: Vec<Expr>,
        targets: Vec<String>,
    },
    Inhale(Expr),
    Exhale(Expr),
    Assert(Expr),
    Assume(Expr),
    Fold(Expr),
    Unfold(Expr),
    Package {
        wand: Expr,
        proof: Option<Box<Stmt>>,
    },
    Apply {
        wand: Expr,
    },
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Box<Stmt>,
    },
    While {
        cond: Expr,
        invariants: Vec<Expr>,
        body: Box<Stmt>,
    },
    Label {
        name: String,
    },
    Goto {
        target: String,
    },
    New {
        target: String,
        fields: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Position,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Position) -> Self {
        Self { kind, pos }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLit(i64),
    BoolLit(bool),
    NullLit,
    LocalVar {
        name: String,
        typ: Type,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    FullPerm,
    NoPerm,
    WildcardPerm,
    EpsilonPerm,
    FractionalPerm {
        numerator: Box<Expr>,
        denominator: Box<Expr>,
    },
    /// `perm(loc)` — the permission currently held for a location.
    CurrentPerm {
        location: Box<Expr>,
    },
    FieldAccess {
        receiver: Box<Expr>,
        field: String,
    },
    PredicateAccess {
        predicate: String,
        args: Vec<Expr>,
    },
    /// Accessibility predicate `acc(loc, perm)`.
    Acc {
        location: Box<Expr>,
        perm: Box<Expr>,
    },
    MagicWand {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unfolding {
        acc: Box<Expr>,
        body: Box<Expr>,
    },
    Applying {
        wand: Box<Expr>,
        body: Box<Expr>,
    },
    Old {
        expr: Box<Expr>,
    },
    LabelledOld {
        label: String,
        expr: Box<Expr>,
    },
    FuncApp {
        function: String,
        args: Vec<Expr>,
    },
    DomainFuncApp {
        domain: String,
        function: String,
        args: Vec<Expr>,
    },
    Forall {
        vars: Vec<LocalVarDecl>,
        triggers: Vec<Trigger>,
        body: Box<Expr>,
    },
    Exists {
        vars: Vec<LocalVarDecl>,
        triggers: Vec<Trigger>,
        body: Box<Expr>,
    },
    EmptyCollection {
        kind: CollectionKind,
        elem: Type,
    },
    ExplicitCollection {
        kind: CollectionKind,
        elems: Vec<Expr>,
    },
    CollectionOp {
        op: CollectionOp,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub exprs: Vec<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// Permission division (`p / n` at permission type).
    PermDiv,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Implies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Seq,
    Set,
    Multiset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOp {
    Append,
    Index,
    Length,
    Contains,
    Union,
    Intersection,
    SetMinus,
    Subset,
    Take,
    Drop,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Bool,
    Perm,
    Ref,
    Seq(Box<Type>),
    Set(Box<Type>),
    Multiset(Box<Type>),
    Domain(String),
    TypeVar(String),
}
