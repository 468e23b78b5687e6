//! Function bodies: the entry point of generation.
//!
//! ```text
//! SCOPE_ENTER f
//!   REFERENCE p1 ... pn            parameters, bound by the caller
//!   REFERENCE rtn                  returning variable
//!   SCOPE_REGISTER rtn, f
//!   [init  STORE rtn  RETAIN rtn]
//!   body
//!   RETAIN rtn                     the caller's reference
//! SCOPE_EXIT f
//! RETURN rtn
//! ```
//!
//! `rtn` is owned by the function scope like any local, so a throw out of
//! the body releases it during unwinding. Only the normal exit takes the
//! extra reference that `RETURN` hands to the caller.

use rayon::prelude::*;

use ek9_ir::{Instr, Var};
use ek9_tree::{FunctionId, Name, StringInterner, TreeArena};
use ek9_types::TypeUniverse;

use crate::context::FrameKind;
use crate::{GenContext, GenOptions, GenResult, IrLowerer};

/// Instructions for one function body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionIr {
    pub name: Name,
    /// Parameter names in declaration order; the caller binds them.
    pub params: Vec<Name>,
    pub instructions: Vec<Instr>,
}

/// Lower one function with a fresh context.
///
/// With [`GenOptions::verify`] set, the result is checked by
/// [`ek9_ir::verify`] and a failure becomes
/// [`GenFault::Verification`](crate::GenFault::Verification).
pub fn generate_function(
    tree: &TreeArena,
    types: &TypeUniverse,
    interner: &StringInterner,
    function: FunctionId,
    options: GenOptions,
) -> GenResult<FunctionIr> {
    let def = tree.function(function);
    let _span = tracing::debug_span!("generate_function", name = interner.lookup(def.name)).entered();

    let ctx = GenContext::new(tree, types, interner, options);
    let mut lowerer = IrLowerer::new(ctx);
    let instructions = lowerer.lower_function(function)?;

    if options.verify {
        ek9_ir::verify(&instructions)?;
    }
    tracing::debug!(
        instructions = ek9_ir::walk::count(&instructions),
        temps = lowerer.ctx.temps_allocated(),
        "generated"
    );
    Ok(FunctionIr {
        name: def.name,
        params: def.params.iter().map(|param| param.name).collect(),
        instructions,
    })
}

/// Lower `functions` in parallel, one context per function; results come
/// back in input order.
pub fn generate_functions(
    tree: &TreeArena,
    types: &TypeUniverse,
    interner: &StringInterner,
    functions: &[FunctionId],
    options: GenOptions,
) -> Vec<GenResult<FunctionIr>> {
    functions
        .par_iter()
        .map(|&function| generate_function(tree, types, interner, function, options))
        .collect()
}

impl IrLowerer<'_> {
    fn lower_function(&mut self, function: FunctionId) -> GenResult<Vec<Instr>> {
        let tree = self.ctx.tree;
        let def = tree.function(function);
        let span = Some(def.span);

        let mut returning = None;
        let mut out = self.scoped(FrameKind::Function, span, |this, scope| {
            let mut out = Vec::new();
            for param in &def.params {
                let ty = this.ctx.declared_type(param.ty, def.span)?;
                out.push(Instr::reference(Var::Named(param.name), ty, span));
            }
            if let Some(param) = &def.returning {
                let at = Some(param.span);
                let ty = this.ctx.declared_type(param.ty, param.span)?;
                let rtn = Var::Named(param.name);
                out.push(Instr::reference(rtn, ty, at));
                out.push(Instr::register(rtn, scope, at));
                if let Some(init) = param.init {
                    let (instrs, value, _) = this.eval_managed(init)?;
                    out.extend(instrs);
                    out.push(Instr::store(rtn, value, at));
                    out.push(Instr::retain(rtn, at));
                }
                returning = Some(rtn);
            }
            out.extend(this.lower_statements(def.body)?);
            if let Some(rtn) = returning {
                out.push(Instr::retain(rtn, span));
            }
            Ok(out)
        })?;
        out.push(Instr::ret(returning, span));
        Ok(out)
    }
}
