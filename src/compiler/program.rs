//! Bytecode: the flat instruction vector the lowering pass emits and the
//! VM's dispatch loop consumes, plus the single-pass peephole fusion that
//! runs as instructions are pushed.
//!
//! Instruction payloads (`ptr`) are stored as [`Lit`] rather than a runtime
//! `Value` — a name or constant baked into the code array is not itself a
//! heap allocation. The VM materializes a `Value` (allocating through the
//! arena when the payload is a string) only when an instruction actually
//! executes.

use crate::common::lit::Lit;

/// Every opcode the VM understands. `offset` carries an integer operand
/// (jump target, frame size, result count, index); `ptr` carries a literal
/// or name operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // stack frame
    Mark,
    Limit,
    Loop,
    Unloop,
    Drop,
    DropAll,
    PadNil,

    // data
    Lit,
    Nil,
    True,
    False,
    String,
    Array,
    Table,
    Global,
    Local,
    LitStack,
    LitScope,
    Scope,
    Smudge,
    Unscope,
    Zelf,
    SelfPush,
    SelfDrop,
    Shunt,
    Shift,

    // names
    Assign,
    AssignLit,
    Find,
    FindLit,
    Get,
    GetLit,
    Set,
    Inherit,

    // control
    Test,
    Jmp,
    Jfalse,
    Jtrue,
    For,
    Keys,
    Values,

    // calls
    Call,
    CallLit,
    Return,
    Reply,
    Break,
    Continue,
    Coroutine,
    Resume,
    Yield,

    // arithmetic / comparison / misc
    Add,
    AddLit,
    Neg,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    LtLit,
    Lte,
    Gt,
    Gte,
    Not,
    Concat,
    Count,
    Match,
    Status,
    Print,
}

/// One bytecode instruction: `(op, offset, ptr)` from the design.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub op: Op,
    pub offset: i64,
    pub ptr: Option<Lit>,
}

impl Instruction {
    pub fn op(op: Op) -> Instruction {
        Instruction { op, offset: 0, ptr: None }
    }

    pub fn with_offset(op: Op, offset: i64) -> Instruction {
        Instruction { op, offset, ptr: None }
    }

    pub fn with_ptr(op: Op, ptr: Lit) -> Instruction {
        Instruction { op, offset: 0, ptr: Some(ptr) }
    }

    pub fn with_offset_and_ptr(op: Op, offset: i64, ptr: Lit) -> Instruction {
        Instruction { op, offset, ptr: Some(ptr) }
    }

    /// Shorthand for a name operand (`FIND_LIT`, `ASSIGN_LIT`, ...).
    pub fn name(op: Op, name: &str) -> Instruction {
        Instruction::with_ptr(op, Lit::String(name.to_string()))
    }

    pub fn name_with_offset(op: Op, offset: i64, name: &str) -> Instruction {
        Instruction::with_offset_and_ptr(op, offset, Lit::String(name.to_string()))
    }
}

/// The flat, growable instruction vector lowering emits into. `push`
/// performs single-pass peephole fusion against the last instruction
/// already in the buffer before appending.
#[derive(Debug, Default)]
pub struct Program {
    pub code: Vec<Instruction>,
}

impl Program {
    pub fn new() -> Program {
        Program { code: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Appends `inst`, first checking whether it fuses with the
    /// previously emitted instruction per the peephole table:
    ///
    /// - `LIT(k); FIND` → `FIND_LIT(k)`
    /// - `LIT(k); GET` → `GET_LIT(k)`
    /// - `FIND_LIT(k); CALL` → `CALL_LIT(k)`
    /// - `LIT(v); ADD` → `ADD_LIT(v)`
    /// - `LIT(v); LT` → `LT_LIT(v)`
    ///
    /// Returns the index at which the (possibly fused) instruction lives,
    /// so callers that need to patch a jump target later can find it.
    pub fn push(&mut self, inst: Instruction) -> usize {
        if let Some(prev) = self.code.last() {
            let fused = match (prev.op, inst.op) {
                (Op::Lit, Op::Find) => Some(Op::FindLit),
                (Op::Lit, Op::Get) => Some(Op::GetLit),
                (Op::FindLit, Op::Call) => Some(Op::CallLit),
                (Op::Lit, Op::Add) => Some(Op::AddLit),
                (Op::Lit, Op::Lt) => Some(Op::LtLit),
                _ => None,
            };

            if let Some(fused_op) = fused {
                let ptr = prev.ptr.clone();
                let last = self.code.len() - 1;
                self.code[last] = Instruction { op: fused_op, offset: 0, ptr };
                return last;
            }
        }

        self.code.push(inst);
        self.code.len() - 1
    }

    /// Collapses a `MARK; LIT(k); LIMIT` triple just emitted into nothing
    /// but the literal itself: a frame that immediately trims to a single
    /// result with no intervening side effects is a no-op frame. Called by
    /// lowering right after emitting the `LIMIT` that would close such a
    /// triple starting at `mark_index`.
    pub fn collapse_trivial_frame(&mut self, mark_index: usize) {
        if self.code.len() == mark_index + 3
            && self.code[mark_index].op == Op::Mark
            && self.code[mark_index + 1].op == Op::Lit
            && self.code[mark_index + 2].op == Op::Limit
            && self.code[mark_index + 2].offset == 1
        {
            let lit = self.code[mark_index + 1].clone();
            self.code.truncate(mark_index);
            self.code.push(lit);
        }
    }

    /// Patches the `offset` field of the instruction at `index` — used to
    /// back-fill forward jump targets once the destination is known.
    pub fn patch_offset(&mut self, index: usize, offset: i64) {
        self.code[index].offset = offset;
    }

    /// Patches the `ptr` field of the instruction at `index` — used to
    /// back-fill a function literal's own entry address once its body has
    /// been placed.
    pub fn patch_ptr(&mut self, index: usize, ptr: Lit) {
        self.code[index].ptr = Some(ptr);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lit_find_fuses() {
        let mut program = Program::new();
        program.push(Instruction::with_ptr(Op::Lit, Lit::String("x".to_string())));
        program.push(Instruction::op(Op::Find));
        assert_eq!(program.len(), 1);
        assert_eq!(program.code[0].op, Op::FindLit);
    }

    #[test]
    fn lit_add_fuses_but_lit_sub_does_not() {
        let mut program = Program::new();
        program.push(Instruction::with_ptr(Op::Lit, Lit::Integer(1)));
        program.push(Instruction::op(Op::Sub));
        assert_eq!(program.len(), 2);
        assert_eq!(program.code[0].op, Op::Lit);
        assert_eq!(program.code[1].op, Op::Sub);
    }

    #[test]
    fn find_lit_call_fuses_through_two_steps() {
        let mut program = Program::new();
        program.push(Instruction::with_ptr(Op::Lit, Lit::String("f".to_string())));
        program.push(Instruction::op(Op::Find));
        program.push(Instruction::op(Op::Call));
        assert_eq!(program.len(), 1);
        assert_eq!(program.code[0].op, Op::CallLit);
    }

    use proptest::prelude::*;

    proptest! {
        /// Peephole equivalence (§8 property 5): whatever the fused form
        /// collapses `LIT(v); ADD` into, it still carries `v` forward —
        /// fusion changes the instruction count, never the operand.
        #[test]
        fn add_lit_fusion_preserves_the_operand(v: i64) {
            let mut program = Program::new();
            program.push(Instruction::with_ptr(Op::Lit, Lit::Integer(v)));
            program.push(Instruction::op(Op::Add));
            prop_assert_eq!(program.len(), 1);
            prop_assert_eq!(program.code[0].op, Op::AddLit);
            prop_assert_eq!(program.code[0].ptr.clone(), Some(Lit::Integer(v)));
        }

        /// Same, for the `LIT; LT` pair.
        #[test]
        fn lt_lit_fusion_preserves_the_operand(v: i64) {
            let mut program = Program::new();
            program.push(Instruction::with_ptr(Op::Lit, Lit::Integer(v)));
            program.push(Instruction::op(Op::Lt));
            prop_assert_eq!(program.len(), 1);
            prop_assert_eq!(program.code[0].op, Op::LtLit);
            prop_assert_eq!(program.code[0].ptr.clone(), Some(Lit::Integer(v)));
        }

        /// A `LIT` followed by any op outside the fusion table never
        /// collapses — fusion is a fixed, closed set of pairs.
        #[test]
        fn unrelated_ops_never_fuse(v: i64) {
            let mut program = Program::new();
            program.push(Instruction::with_ptr(Op::Lit, Lit::Integer(v)));
            program.push(Instruction::op(Op::Neg));
            prop_assert_eq!(program.len(), 2);
            prop_assert_eq!(program.code[0].op, Op::Lit);
            prop_assert_eq!(program.code[1].op, Op::Neg);
        }
    }
}
