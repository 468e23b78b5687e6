//! Per-unit generation state.
//!
//! One [`GenContext`] exists per compiled unit (one function body). It owns
//! the lexical scope stack and the temp/scope counters, and borrows the
//! shared, read-only inputs: the tree, the type universe and the interner.
//! Nothing here is shared between units, so units lower in parallel.

use ek9_ir::{Instr, ScopeId, TempId, Var};
use ek9_tree::ast::Expr;
use ek9_tree::{ExprId, Name, Span, StringInterner, TreeArena, TypeId};
use ek9_types::{Genus, TypeUniverse};

use crate::{GenFault, GenOptions, GenResult, IrLowerer};

/// What opened a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Function,
    Block,
    Guard,
    Loop,
    Try,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    pub scope: ScopeId,
    pub kind: FrameKind,
}

/// Method and literal names the generators emit on their own.
pub(crate) struct KnownNames {
    pub this: Name,
    pub super_: Name,
    pub i_init: Name,
    pub true_: Name,
    pub is_set: Name,
    pub negate: Name,
    pub and: Name,
    pub or: Name,
    pub eq: Name,
    pub cmp: Name,
    pub lt: Name,
    pub gt: Name,
    pub lteq: Name,
    pub gteq: Name,
    pub inc: Name,
    pub dec: Name,
    pub add: Name,
    pub add_assign: Name,
    pub promote: Name,
    pub call: Name,
    pub iterator: Name,
    pub has_next: Name,
    pub next: Name,
    pub close: Name,
    pub zero: Name,
    pub false_: Name,
}

impl KnownNames {
    fn new(interner: &StringInterner) -> Self {
        KnownNames {
            this: interner.intern("this"),
            super_: interner.intern("super"),
            i_init: interner.intern("i_init"),
            true_: interner.intern("_true"),
            is_set: interner.intern("_isSet"),
            negate: interner.intern("_negate"),
            and: interner.intern("_and"),
            or: interner.intern("_or"),
            eq: interner.intern("_eq"),
            cmp: interner.intern("_cmp"),
            lt: interner.intern("_lt"),
            gt: interner.intern("_gt"),
            lteq: interner.intern("_lteq"),
            gteq: interner.intern("_gteq"),
            inc: interner.intern("_inc"),
            dec: interner.intern("_dec"),
            add: interner.intern("_add"),
            add_assign: interner.intern("_addAss"),
            promote: interner.intern("_promote"),
            call: interner.intern("_call"),
            iterator: interner.intern("iterator"),
            has_next: interner.intern("hasNext"),
            next: interner.intern("next"),
            close: interner.intern("close"),
            zero: interner.intern("0"),
            false_: interner.intern("false"),
        }
    }
}

pub struct GenContext<'a> {
    pub(crate) tree: &'a TreeArena,
    pub(crate) types: &'a TypeUniverse,
    pub(crate) interner: &'a StringInterner,
    pub(crate) options: GenOptions,
    pub(crate) names: KnownNames,
    frames: Vec<Frame>,
    temps: u32,
    scopes: u32,
}

impl<'a> GenContext<'a> {
    pub fn new(
        tree: &'a TreeArena,
        types: &'a TypeUniverse,
        interner: &'a StringInterner,
        options: GenOptions,
    ) -> Self {
        GenContext {
            tree,
            types,
            interner,
            options,
            names: KnownNames::new(interner),
            frames: Vec::new(),
            temps: 0,
            scopes: 0,
        }
    }

    // ── Names ───────────────────────────────────────────────────────

    /// Fresh compiler temporary.
    pub fn temp(&mut self) -> Var {
        self.temps += 1;
        let temp = TempId::new(self.temps);
        tracing::trace!(%temp, "temp");
        Var::Temp(temp)
    }

    pub fn temps_allocated(&self) -> u32 {
        self.temps
    }

    // ── Scope stack ─────────────────────────────────────────────────

    /// Push a frame with a fresh scope id.
    pub fn enter_scope(&mut self, kind: FrameKind) -> ScopeId {
        self.scopes += 1;
        let scope = ScopeId::new(self.scopes);
        self.frames.push(Frame { scope, kind });
        if self.options.trace_scopes {
            tracing::trace!(%scope, ?kind, depth = self.frames.len(), "enter scope");
        }
        scope
    }

    /// Pop `scope`, which must be the innermost frame.
    pub fn exit_scope(&mut self, scope: ScopeId) -> GenResult<()> {
        match self.frames.last() {
            Some(top) if top.scope == scope => {
                self.frames.pop();
                if self.options.trace_scopes {
                    tracing::trace!(%scope, depth = self.frames.len(), "exit scope");
                }
                Ok(())
            }
            top => Err(GenFault::ScopeMismatch {
                expected: top.map(|frame| frame.scope),
                found: scope,
            }
            .logged()),
        }
    }

    pub fn current_scope(&self) -> GenResult<ScopeId> {
        self.frames
            .last()
            .map(|frame| frame.scope)
            .ok_or_else(|| GenFault::EmptyScopeStack.logged())
    }

    /// Scope directly enclosing the current one.
    pub fn parent_scope(&self) -> GenResult<ScopeId> {
        let current = self.current_scope()?;
        match self.frames.len().checked_sub(2) {
            Some(index) => Ok(self.frames[index].scope),
            None => Err(GenFault::NoParentScope { scope: current }.logged()),
        }
    }

    pub fn current_frame(&self) -> Option<Frame> {
        self.frames.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether a call returning `return_type` needs a destination.
    pub fn needs_result_variable(&self, return_type: TypeId) -> bool {
        self.types
            .genus(return_type)
            .is_some_and(|genus| genus != Genus::Void)
    }

    // ── Tree access ─────────────────────────────────────────────────

    pub fn expr(&self, id: ExprId) -> &'a Expr {
        self.tree.expr(id)
    }

    /// Resolved type of `id`; a missing resolution is a fault.
    pub fn expr_type(&self, id: ExprId) -> GenResult<TypeId> {
        let expr = self.tree.expr(id);
        if expr.ty.is_resolved() {
            Ok(expr.ty)
        } else {
            Err(GenFault::unresolved("expression", expr.span))
        }
    }

    /// Checks a declared type.
    pub fn declared_type(&self, ty: TypeId, span: Span) -> GenResult<TypeId> {
        if ty.is_resolved() && self.types.get(ty).is_some() {
            Ok(ty)
        } else {
            Err(GenFault::unresolved("declaration", span))
        }
    }

    pub fn text(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    /// Type name for messages.
    pub fn type_label(&self, ty: TypeId) -> String {
        if ty.is_resolved() {
            self.text(self.types.name(ty)).to_owned()
        } else {
            "<unresolved>".to_owned()
        }
    }
}

// ── Scoped helpers ──────────────────────────────────────────────────

impl IrLowerer<'_> {
    /// Run `f` inside a fresh scope.
    ///
    /// The result is `SCOPE_ENTER`, whatever `f` produced, `SCOPE_EXIT`;
    /// the frame is popped afterwards.
    pub(crate) fn scoped(
        &mut self,
        kind: FrameKind,
        span: Option<Span>,
        f: impl FnOnce(&mut Self, ScopeId) -> GenResult<Vec<Instr>>,
    ) -> GenResult<Vec<Instr>> {
        let (_, out, ()) = self.in_scope(kind, span, |this, scope| Ok((f(this, scope)?, ())))?;
        Ok(out)
    }

    /// [`scoped`](Self::scoped) for a body that also yields a value, such
    /// as the primitive of a condition evaluated inside the scope.
    pub(crate) fn in_scope<T>(
        &mut self,
        kind: FrameKind,
        span: Option<Span>,
        f: impl FnOnce(&mut Self, ScopeId) -> GenResult<(Vec<Instr>, T)>,
    ) -> GenResult<(ScopeId, Vec<Instr>, T)> {
        let scope = self.ctx.enter_scope(kind);
        let (body, value) = f(self, scope)?;
        let mut out = Vec::with_capacity(body.len() + 2);
        out.push(Instr::enter(scope, span));
        out.extend(body);
        out.push(Instr::exit(scope, span));
        self.ctx.exit_scope(scope)?;
        Ok((scope, out, value))
    }
}
