//! Deterministic textual form of the IR.
//!
//! One instruction per line, nested sequences indented under a bracketed
//! label:
//!
//! ```text
//! SCOPE_ENTER _scope_1
//! _temp1 = LOAD_LITERAL 1, Integer
//! RETAIN _temp1
//! SCOPE_REGISTER _temp1, _scope_1
//! CONTROL_FLOW_CHAIN IF_ELSE _scope_2
//!   [case EXPRESSION _scope_3 primitive=_temp4]
//!     [condition]
//!       ...
//! ```

use ek9_tree::{StringInterner, TypeId};
use ek9_types::TypeUniverse;

use crate::{
    CallDetails, CallKind, ControlFlowChain, DirectionalCase, ForRangePolymorphic, Instr,
    InstrKind, LogicalBlock, Var,
};
use ek9_tree::ast::LogicalOp;

pub struct IrPrinter<'a> {
    interner: &'a StringInterner,
    types: &'a TypeUniverse,
    spans: bool,
}

impl<'a> IrPrinter<'a> {
    pub fn new(interner: &'a StringInterner, types: &'a TypeUniverse) -> Self {
        IrPrinter {
            interner,
            types,
            spans: false,
        }
    }

    /// Append `// start..end` to instructions that carry a span.
    #[must_use]
    pub fn with_spans(mut self, spans: bool) -> Self {
        self.spans = spans;
        self
    }

    pub fn print(&self, instrs: &[Instr]) -> String {
        let mut out = String::new();
        self.sequence(&mut out, instrs, 0);
        out
    }

    pub fn var(&self, var: Var) -> String {
        match var {
            Var::Temp(temp) => temp.to_string(),
            Var::Named(name) => self.interner.lookup(name).to_owned(),
            Var::Field { object, field } => format!(
                "{}.{}",
                self.interner.lookup(object),
                self.interner.lookup(field)
            ),
        }
    }

    fn opt_var(&self, var: Option<Var>) -> String {
        var.map_or_else(|| "-".to_owned(), |v| self.var(v))
    }

    fn ty(&self, ty: TypeId) -> &'a str {
        if ty.is_resolved() {
            self.interner.lookup(self.types.name(ty))
        } else {
            "<unresolved>"
        }
    }

    fn line(out: &mut String, depth: usize, text: &str) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(text);
        out.push('\n');
    }

    fn labelled(&self, out: &mut String, depth: usize, label: &str, instrs: &[Instr]) {
        Self::line(out, depth, &format!("[{label}]"));
        self.sequence(out, instrs, depth + 1);
    }

    fn sequence(&self, out: &mut String, instrs: &[Instr], depth: usize) {
        for instr in instrs {
            self.instr(out, instr, depth);
        }
    }

    fn instr(&self, out: &mut String, instr: &Instr, depth: usize) {
        let mut text = match &instr.kind {
            InstrKind::Reference { var, ty } => {
                format!("REFERENCE {}, {}", self.var(*var), self.ty(*ty))
            }
            InstrKind::Load { dst, src } => format!("{} = LOAD {}", self.var(*dst), self.var(*src)),
            InstrKind::Store { dst, src } => {
                format!("STORE {}, {}", self.var(*dst), self.var(*src))
            }
            InstrKind::Retain { var } => format!("RETAIN {}", self.var(*var)),
            InstrKind::Release { var } => format!("RELEASE {}", self.var(*var)),
            InstrKind::IsNull { dst, var } => {
                format!("{} = IS_NULL {}", self.var(*dst), self.var(*var))
            }
            InstrKind::ScopeEnter { scope } => format!("SCOPE_ENTER {scope}"),
            InstrKind::ScopeExit { scope } => format!("SCOPE_EXIT {scope}"),
            InstrKind::ScopeRegister { var, scope } => {
                format!("SCOPE_REGISTER {}, {scope}", self.var(*var))
            }
            InstrKind::Call { dst, kind, details } => self.call(*dst, *kind, details),
            InstrKind::Literal { dst, text, ty } => format!(
                "{} = LOAD_LITERAL {}, {}",
                self.var(*dst),
                self.interner.lookup(*text),
                self.ty(*ty)
            ),
            InstrKind::Return { value } => match value {
                Some(v) => format!("RETURN {}", self.var(*v)),
                None => "RETURN".to_owned(),
            },
            InstrKind::Assert { condition, message } => {
                format!("ASSERT {}, {message:?}", self.var(*condition))
            }
            InstrKind::Throw { value } => format!("THROW {}", self.var(*value)),
            InstrKind::Logical(block) => {
                let head = self.logical_head(block);
                self.finish_line(out, depth, head, instr);
                self.logical(out, block, depth + 1);
                return;
            }
            InstrKind::ControlFlowChain(chain) => {
                let head = format!("CONTROL_FLOW_CHAIN {} {}", chain.kind.label(), chain.scope);
                self.finish_line(out, depth, head, instr);
                self.chain(out, chain, depth + 1);
                return;
            }
            InstrKind::ForRange(block) => {
                let head = format!(
                    "FOR_RANGE_POLYMORPHIC {} current={} direction={} scopes=({}, {}, {})",
                    self.var(block.loop_var),
                    self.var(block.current),
                    self.var(block.direction),
                    block.scopes.outer,
                    block.scopes.loop_scope,
                    block.scopes.body_scope,
                );
                self.finish_line(out, depth, head, instr);
                self.for_range(out, block, depth + 1);
                return;
            }
        };
        if self.spans {
            Self::append_span(&mut text, instr);
        }
        Self::line(out, depth, &text);
    }

    fn finish_line(&self, out: &mut String, depth: usize, mut head: String, instr: &Instr) {
        if self.spans {
            Self::append_span(&mut head, instr);
        }
        Self::line(out, depth, &head);
    }

    fn append_span(text: &mut String, instr: &Instr) {
        if let Some(span) = instr.span {
            text.push_str(&format!("  // {}..{}", span.start, span.end));
        }
    }

    fn call(&self, dst: Option<Var>, kind: CallKind, details: &CallDetails) -> String {
        let opcode = match kind {
            CallKind::Call => "CALL",
            CallKind::Static => "CALL_STATIC",
            CallKind::Constructor => "CALL_CONSTRUCTOR",
            CallKind::Operator => "CALL_OPERATOR",
        };
        let args: Vec<String> = details.arguments.iter().map(|a| self.var(*a)).collect();
        let receiver = match details.target {
            Some(target) => format!("({}){}", self.ty(details.target_type), self.var(target)),
            None => self.ty(details.target_type).to_owned(),
        };
        let mut text = String::new();
        if let Some(dst) = dst {
            text.push_str(&self.var(dst));
            text.push_str(" = ");
        }
        text.push_str(&format!(
            "{opcode} {receiver}.{}({}) -> {} [pure={}, complexity={}",
            self.interner.lookup(details.method),
            args.join(", "),
            self.ty(details.return_type),
            details.meta.pure,
            details.meta.complexity,
        ));
        if details.trait_call {
            text.push_str(", trait");
        }
        text.push(']');
        text
    }

    fn logical_head(&self, block: &LogicalBlock) -> String {
        let op = match block.op {
            LogicalOp::And => "LOGICAL_AND_BLOCK",
            LogicalOp::Or => "LOGICAL_OR_BLOCK",
        };
        format!("{} = {op} {}", self.var(block.result), block.scope)
    }

    fn logical(&self, out: &mut String, block: &LogicalBlock, depth: usize) {
        self.labelled(out, depth, "left_evaluation", &block.left.instructions);
        Self::line(out, depth, &format!("[left_operand] {}", self.var(block.left.value)));
        self.labelled(out, depth, "left_condition", &block.condition.instructions);
        Self::line(
            out,
            depth,
            &format!("[left_primitive] {}", self.var(block.condition.primitive)),
        );
        self.labelled(out, depth, "right_evaluation", &block.right.instructions);
        Self::line(out, depth, &format!("[right_operand] {}", self.var(block.right.value)));
        self.labelled(out, depth, "result_computation", &block.result_computation.instructions);
    }

    fn chain(&self, out: &mut String, chain: &ControlFlowChain, depth: usize) {
        if !chain.guard_variables.is_empty() {
            let names: Vec<String> = chain.guard_variables.iter().map(|v| self.var(*v)).collect();
            Self::line(out, depth, &format!("[guard_variables] {}", names.join(", ")));
        }
        if let Some(eval) = chain.evaluation {
            Self::line(out, depth, &format!("[evaluation] {}", self.var(eval)));
        }
        if let Some(rtn) = chain.return_variable {
            Self::line(out, depth, &format!("[return_variable] {}", self.var(rtn)));
        }
        if let Some(try_block) = &chain.try_block {
            self.labelled(out, depth, &format!("try {}", try_block.scope), &try_block.body);
        }
        for case in &chain.cases {
            let mut head = format!("[case {} {}", case.kind.label(), case.case_scope);
            if let Some(p) = case.primitive {
                head.push_str(&format!(" primitive={}", self.var(p)));
            }
            if let Some(r) = case.condition_result {
                head.push_str(&format!(" condition={}", self.var(r)));
            }
            if let Some(r) = case.body_result {
                head.push_str(&format!(" result={}", self.var(r)));
            }
            if let Some(e) = case.exception {
                head.push_str(&format!(" catch={}, {}", self.var(e.var), self.ty(e.ty)));
            }
            head.push(']');
            Self::line(out, depth, &head);
            if !case.condition.is_empty() {
                self.labelled(out, depth + 1, "condition", &case.condition);
            }
            self.labelled(out, depth + 1, "body", &case.body);
        }
        if let Some(default) = &chain.default {
            let head = match default.result {
                Some(r) => format!("default result={}", self.var(r)),
                None => "default".to_owned(),
            };
            self.labelled(out, depth, &head, &default.body);
        }
        if let Some(finally) = &chain.finally {
            self.labelled(out, depth, "finally", finally);
        }
        if chain.result.is_some() {
            Self::line(out, depth, &format!("[result] {}", self.opt_var(chain.result)));
        }
    }

    fn directional(&self, out: &mut String, label: &str, case: &DirectionalCase, depth: usize) {
        Self::line(
            out,
            depth,
            &format!(
                "[{label}] direction={} condition={}",
                self.var(case.direction_primitive),
                self.var(case.condition_primitive)
            ),
        );
        self.labelled(out, depth + 1, "direction_check", &case.direction_check);
        self.labelled(out, depth + 1, "condition", &case.condition);
        self.labelled(out, depth + 1, "body_setup", &case.body_setup);
        self.labelled(out, depth + 1, "increment", &case.increment);
    }

    fn for_range(&self, out: &mut String, block: &ForRangePolymorphic, depth: usize) {
        let meta = &block.metadata;
        Self::line(
            out,
            depth,
            &format!(
                "[range] {} ... {} by {}, {}",
                self.var(meta.start),
                self.var(meta.end),
                self.opt_var(meta.by),
                self.ty(meta.range_type)
            ),
        );
        self.labelled(out, depth, "initialization", &block.initialization);
        self.directional(out, "ascending", &block.dispatch.ascending, depth);
        self.directional(out, "descending", &block.dispatch.descending, depth);
        let equal = &block.dispatch.equal;
        Self::line(
            out,
            depth,
            &format!("[equal] direction={}", self.var(equal.direction_primitive)),
        );
        self.labelled(out, depth + 1, "direction_check", &equal.direction_check);
        self.labelled(out, depth + 1, "body_setup", &equal.body_setup);
        self.labelled(out, depth, "body", &block.body);
    }
}
