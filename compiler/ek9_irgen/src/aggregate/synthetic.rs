//! Defaulted operators, written as ordinary EK9 and lowered like any other
//! function.
//!
//! Each operator becomes a small tree of its own, anchored to the
//! aggregate's span:
//!
//! ```text
//! _isSet() <- rtn as Boolean: super? or this.a? or this.b?
//!
//! _eq(other as T) <- rtn as Boolean: Boolean()
//!   if this? and other?
//!     rtn: super == other and this.a == other.a and this.b == other.b
//!
//! _neq(other as T) <- rtn as Boolean: ~(this == other)
//!
//! _string() <- rtn as String: String()
//!   if this?
//!     rtn: "T("
//!     rtn += "a="
//!     if this.a?  rtn += $this.a  else  rtn += "?"
//!     rtn += ", b="
//!     ...
//!     rtn += ")"
//!
//! _hashcode() <- rtn as Integer: Integer()
//!   if this?
//!     rtn: 0
//!     rtn: rtn * 31                  for each property
//!     if this.a?  rtn: rtn + #?this.a
//! ```
//!
//! Unset propagates: an unset object has no string or hash and compares
//! as unset. Only the object's own properties are listed; `_isSet` and
//! `_eq` also defer to the parent aggregate when there is one.

use smallvec::smallvec;

use ek9_tree::ast::{AssignOp, DefaultOperator, Flow, IfBranch, IfFlow, Property};
use ek9_tree::{
    ExprId, FunctionId, Span, StmtId, StmtRange, StringInterner, TreeArena, TreeBuilder, TypeId,
};

const OTHER: &str = "other";
const RTN: &str = "rtn";

/// What the operators are written against.
pub(super) struct Shape<'a> {
    pub ty: TypeId,
    pub name: &'static str,
    pub parent: Option<TypeId>,
    pub properties: &'a [Property],
    pub span: Span,
}

/// The operator's source tree and the function in it.
pub(super) fn synthesize(
    op: DefaultOperator,
    shape: &Shape<'_>,
    interner: &StringInterner,
) -> (TreeArena, FunctionId) {
    let mut writer = Writer {
        b: TreeBuilder::anchored(interner, shape.span),
        shape,
        interner,
    };
    let function = match op {
        DefaultOperator::IsSet => writer.is_set(),
        DefaultOperator::Eq => writer.equals(),
        DefaultOperator::Neq => writer.not_equals(),
        DefaultOperator::String => writer.string_form(),
        DefaultOperator::HashCode => writer.hash_code(),
    };
    (writer.b.finish(), function)
}

struct Writer<'s, 'i> {
    b: TreeBuilder<'i>,
    shape: &'s Shape<'s>,
    interner: &'i StringInterner,
}

impl Writer<'_, '_> {
    fn is_set(&mut self) -> FunctionId {
        let mut parts = Vec::new();
        if let Some(parent) = self.shape.parent {
            let parent = self.b.super_ref(parent);
            parts.push(self.b.question(parent));
        }
        for property in self.shape.properties {
            let field = self.this_field(property);
            parts.push(self.b.question(field));
        }
        let any = match self.fold(parts, |b, l, r| b.or(l, r)) {
            Some(any) => any,
            None => self.b.boolean(false),
        };
        let rtn = self.b.returning(RTN, TypeId::BOOLEAN, Some(any));
        self.b.function(DefaultOperator::IsSet.method(), &[], Some(rtn), &[])
    }

    fn equals(&mut self) -> FunctionId {
        let ty = self.shape.ty;
        let mut parts = Vec::new();
        if let Some(parent) = self.shape.parent {
            let parent = self.b.super_ref(parent);
            let other = self.b.ident(OTHER, ty);
            parts.push(self.b.binary("==", parent, other, TypeId::BOOLEAN));
        }
        for property in self.shape.properties {
            let mine = self.this_field(property);
            let other = self.b.ident(OTHER, ty);
            let theirs = self.b.property(other, self.text(property), property.ty);
            parts.push(self.b.binary("==", mine, theirs, TypeId::BOOLEAN));
        }
        let all = match self.fold(parts, |b, l, r| b.and(l, r)) {
            Some(all) => all,
            None => self.b.boolean(true),
        };

        let this = self.b.this(ty);
        let this_set = self.b.question(this);
        let other = self.b.ident(OTHER, ty);
        let other_set = self.b.question(other);
        let both_set = self.b.and(this_set, other_set);
        let assign = self.b.assign(AssignOp::Assign, RTN, TypeId::BOOLEAN, all);
        let guarded = self.when(both_set, &[assign]);

        let unset = self.b.construct(TypeId::BOOLEAN, &[]);
        let rtn = self.b.returning(RTN, TypeId::BOOLEAN, Some(unset));
        self.b.function(
            DefaultOperator::Eq.method(),
            &[(OTHER, ty)],
            Some(rtn),
            &[guarded],
        )
    }

    fn not_equals(&mut self) -> FunctionId {
        let ty = self.shape.ty;
        let this = self.b.this(ty);
        let other = self.b.ident(OTHER, ty);
        let equal = self.b.binary("==", this, other, TypeId::BOOLEAN);
        let negated = self.b.unary("~", equal, TypeId::BOOLEAN);
        let rtn = self.b.returning(RTN, TypeId::BOOLEAN, Some(negated));
        self.b
            .function(DefaultOperator::Neq.method(), &[(OTHER, ty)], Some(rtn), &[])
    }

    fn string_form(&mut self) -> FunctionId {
        let open = self.b.string(&format!("{}(", self.shape.name));
        let mut body = vec![self.b.assign(AssignOp::Assign, RTN, TypeId::STRING, open)];
        for (index, property) in self.shape.properties.iter().enumerate() {
            let separator = if index == 0 { "" } else { ", " };
            let label = format!("{separator}{}=", self.text(property));
            body.push(self.append_text(&label));

            let field = self.this_field(property);
            let shown = self.b.unary("$", field, TypeId::STRING);
            let shown = self.append(shown);
            let missing = self.append_text("?");
            let field = self.this_field(property);
            let set = self.b.question(field);
            body.push(self.either(set, &[shown], &[missing]));
        }
        body.push(self.append_text(")"));
        self.when_set(DefaultOperator::String, TypeId::STRING, &body)
    }

    fn hash_code(&mut self) -> FunctionId {
        let zero = self.b.int(0);
        let mut body = vec![self.b.assign(AssignOp::Assign, RTN, TypeId::INTEGER, zero)];
        for property in self.shape.properties {
            let current = self.b.ident(RTN, TypeId::INTEGER);
            let prime = self.b.int(31);
            let scaled = self.b.binary("*", current, prime, TypeId::INTEGER);
            body.push(self.b.assign(AssignOp::Assign, RTN, TypeId::INTEGER, scaled));

            let field = self.this_field(property);
            let hash = self.b.unary("#?", field, TypeId::INTEGER);
            let current = self.b.ident(RTN, TypeId::INTEGER);
            let sum = self.b.binary("+", current, hash, TypeId::INTEGER);
            let add = self.b.assign(AssignOp::Assign, RTN, TypeId::INTEGER, sum);
            let field = self.this_field(property);
            let set = self.b.question(field);
            body.push(self.when(set, &[add]));
        }
        self.when_set(DefaultOperator::HashCode, TypeId::INTEGER, &body)
    }

    // ── Pieces ──────────────────────────────────────────────────────

    /// `op() <- rtn as ty: ty()` running `body` only when `this?`.
    fn when_set(&mut self, op: DefaultOperator, ty: TypeId, body: &[StmtId]) -> FunctionId {
        let this = self.b.this(self.shape.ty);
        let set = self.b.question(this);
        let guarded = self.when(set, body);
        let unset = self.b.construct(ty, &[]);
        let rtn = self.b.returning(RTN, ty, Some(unset));
        self.b.function(op.method(), &[], Some(rtn), &[guarded])
    }

    fn this_field(&mut self, property: &Property) -> ExprId {
        let this = self.b.this(self.shape.ty);
        self.b.property(this, self.text(property), property.ty)
    }

    fn text(&self, property: &Property) -> &'static str {
        self.interner.lookup(property.name)
    }

    /// `rtn += value`.
    fn append(&mut self, value: ExprId) -> StmtId {
        self.b.compound("+=", RTN, TypeId::STRING, value)
    }

    fn append_text(&mut self, text: &str) -> StmtId {
        let text = self.b.string(text);
        self.append(text)
    }

    fn fold(
        &mut self,
        parts: Vec<ExprId>,
        join: impl Fn(&mut TreeBuilder<'_>, ExprId, ExprId) -> ExprId,
    ) -> Option<ExprId> {
        parts
            .into_iter()
            .reduce(|left, right| join(&mut self.b, left, right))
    }

    fn when(&mut self, condition: ExprId, body: &[StmtId]) -> StmtId {
        self.conditional(condition, body, None)
    }

    fn either(&mut self, condition: ExprId, then: &[StmtId], otherwise: &[StmtId]) -> StmtId {
        let otherwise = self.b.body(otherwise);
        self.conditional(condition, then, Some(otherwise))
    }

    fn conditional(
        &mut self,
        condition: ExprId,
        body: &[StmtId],
        else_body: Option<StmtRange>,
    ) -> StmtId {
        let body = self.b.body(body);
        let span = self.b.span();
        let flow = IfFlow {
            branches: smallvec![IfBranch {
                guard: None,
                condition: Some(condition),
                body,
                span,
            }],
            else_body,
            span,
        };
        self.b.flow_stmt(Flow::If(flow))
    }
}
