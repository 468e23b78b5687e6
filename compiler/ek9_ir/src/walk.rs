//! Pre-order traversal through nested instruction sequences.

use crate::Instr;

/// Call `f` on every instruction, nested ones included, in listing order.
pub fn walk<'a>(instrs: &'a [Instr], f: &mut impl FnMut(&'a Instr)) {
    for instr in instrs {
        f(instr);
        for nested in instr.nested() {
            walk(nested, f);
        }
    }
}

/// Number of instructions, nested ones included.
pub fn count(instrs: &[Instr]) -> usize {
    let mut n = 0;
    walk(instrs, &mut |_| n += 1);
    n
}
