//! Lowers a parsed expression tree into a flat [`Program`].
//!
//! The pass is driven by two conventions used throughout:
//!
//! - `lower_value` emits a node's *natural* instructions — however many
//!   values it pushes on its own (one for arithmetic, names, literals...;
//!   anywhere from zero upward for calls, `resume`, `yield`...).
//! - `lower_one` wraps a node in `MARK ... LIMIT(1)` when its natural
//!   arity can vary, guaranteeing exactly one net value; for nodes that
//!   are always exactly one value it just defers to `lower_value`
//!   directly, so the peephole fusions in [`crate::compiler::program`]
//!   still see adjacent `LIT`/`FIND`/`ADD` pairs instead of a `LIMIT` in
//!   between.

use crate::common::lit::Lit;
use crate::common::span::Spanned;
use crate::compiler::program::{Instruction, Op, Program};
use crate::compiler::syntax::Syntax;
use crate::construct::tree::{BinOp, Builtin, Expr, InterpPart, LogicOp, UnOp};

pub fn lower(block: &[Spanned<Expr>]) -> Result<Program, Syntax> {
    let mut lowering = Lowering { program: Program::new() };
    lowering.lower_block(block)?;
    Ok(lowering.program)
}

struct Lowering {
    program: Program,
}

/// Expression kinds whose natural arity is not statically exactly one —
/// these need the `MARK ... LIMIT(1)` bracket when used where a single
/// value is required.
fn needs_bracket(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Call(..)
            | Expr::MethodCall(..)
            | Expr::Multi(_)
            | Expr::Builtin(Builtin::Resume, _)
            | Expr::Builtin(Builtin::Yield, _)
            | Expr::Builtin(Builtin::Keys, _)
            | Expr::Builtin(Builtin::Values, _)
            | Expr::Binary(BinOp::Match, ..)
    )
}

impl Lowering {
    fn lower_block(&mut self, block: &[Spanned<Expr>]) -> Result<(), Syntax> {
        for statement in block {
            self.lower_statement(statement)?;
        }
        Ok(())
    }

    /// Lowers a top-level statement, discarding whatever value it leaves
    /// behind. Control-flow and assignment forms already net zero on
    /// their own; everything else gets an explicit `MARK ... LIMIT(0)`.
    fn lower_statement(&mut self, expr: &Spanned<Expr>) -> Result<(), Syntax> {
        match &expr.item {
            Expr::If { .. }
            | Expr::While { .. }
            | Expr::For { .. }
            | Expr::Return(_)
            | Expr::Break
            | Expr::Continue
            | Expr::Assign(..) => self.lower_value(expr),
            _ => {
                let mark = self.program.push(Instruction::op(Op::Mark));
                self.lower_value(expr)?;
                self.program.push(Instruction::with_offset(Op::Limit, 0));
                self.program.collapse_trivial_frame(mark);
                Ok(())
            }
        }
    }

    /// Guarantees exactly one net value.
    fn lower_one(&mut self, expr: &Spanned<Expr>) -> Result<(), Syntax> {
        if needs_bracket(&expr.item) {
            let mark = self.program.push(Instruction::op(Op::Mark));
            self.lower_value(expr)?;
            self.program.push(Instruction::with_offset(Op::Limit, 1));
            self.program.collapse_trivial_frame(mark);
            Ok(())
        } else {
            self.lower_value(expr)
        }
    }

    fn lower_value(&mut self, expr: &Spanned<Expr>) -> Result<(), Syntax> {
        match &expr.item {
            Expr::Multi(items) => {
                for item in items {
                    self.lower_one(item)?;
                }
                Ok(())
            }
            Expr::Name(name) => {
                self.lower_name(name);
                Ok(())
            }
            Expr::Literal(lit) => {
                self.lower_literal(lit);
                Ok(())
            }
            Expr::Binary(op, l, r) => self.lower_binary(*op, l, r),
            Expr::Unary(op, x) => self.lower_unary(*op, x),
            Expr::Logical(op, l, r) => self.lower_logical(*op, l, r),
            Expr::Field(base, name) => self.lower_field(base, name),
            Expr::Index(base, idx) => self.lower_index(base, idx),
            Expr::Call(callee, args) => self.lower_call_body(callee, args),
            Expr::MethodCall(base, name, args) => self.lower_method_call(base, name, args),
            Expr::If { cond, then_block, else_block } => self.lower_if(cond, then_block, else_block),
            Expr::While { cond, body } => self.lower_while(cond, body),
            Expr::For { key, value, iter, body } => self.lower_for(key, value, iter, body),
            Expr::Function { name, params, body } => self.lower_function(name.as_deref(), params, body),
            Expr::Return(values) => self.lower_return(values),
            Expr::Break => {
                self.program.push(Instruction::op(Op::Break));
                Ok(())
            }
            Expr::Continue => {
                self.program.push(Instruction::op(Op::Continue));
                Ok(())
            }
            Expr::Builtin(b, args) => self.lower_builtin(*b, args),
            Expr::Vec(items) => self.lower_vec(items),
            Expr::Map(entries) => self.lower_map(entries),
            Expr::Global => {
                self.program.push(Instruction::op(Op::Global));
                Ok(())
            }
            Expr::Local => {
                self.program.push(Instruction::op(Op::Local));
                Ok(())
            }
            Expr::Assign(targets, values) => self.lower_assign(targets, values),
            Expr::Interpolated(parts) => self.lower_interpolated(parts),
        }
    }

    fn lower_name(&mut self, name: &str) {
        if name == "self" {
            self.program.push(Instruction::op(Op::Zelf));
        } else {
            self.program.push(Instruction::with_ptr(Op::Lit, Lit::String(name.to_string())));
            self.program.push(Instruction::op(Op::Find));
        }
    }

    fn lower_literal(&mut self, lit: &Lit) {
        match lit {
            Lit::Nil => {
                self.program.push(Instruction::op(Op::Nil));
            }
            Lit::Boolean(true) => {
                self.program.push(Instruction::op(Op::True));
            }
            Lit::Boolean(false) => {
                self.program.push(Instruction::op(Op::False));
            }
            Lit::Integer(_) | Lit::Float(_) | Lit::String(_) => {
                self.program.push(Instruction::with_ptr(Op::Lit, lit.clone()));
            }
        }
    }

    fn lower_binary(&mut self, op: BinOp, l: &Spanned<Expr>, r: &Spanned<Expr>) -> Result<(), Syntax> {
        self.lower_one(l)?;
        self.lower_one(r)?;
        let opcode = match op {
            BinOp::Add => Op::Add,
            BinOp::Sub => Op::Sub,
            BinOp::Mul => Op::Mul,
            BinOp::Div => Op::Div,
            BinOp::Mod => Op::Mod,
            BinOp::Concat => Op::Concat,
            BinOp::Eq => Op::Eq,
            BinOp::Ne => Op::Ne,
            BinOp::Lt => Op::Lt,
            BinOp::Le => Op::Lte,
            BinOp::Gt => Op::Gt,
            BinOp::Ge => Op::Gte,
            BinOp::Match => Op::Match,
        };
        self.program.push(Instruction::op(opcode));
        Ok(())
    }

    fn lower_unary(&mut self, op: UnOp, x: &Spanned<Expr>) -> Result<(), Syntax> {
        self.lower_one(x)?;
        let opcode = match op {
            UnOp::Neg => Op::Neg,
            UnOp::Not => Op::Not,
            UnOp::Count => Op::Count,
        };
        self.program.push(Instruction::op(opcode));
        Ok(())
    }

    /// `and`/`or` short circuit by peeking the left operand's truthiness
    /// with `JFALSE`/`JTRUE` (which does not pop) and only evaluating the
    /// right side — after an explicit `DROP` of the left value — when the
    /// left side didn't already decide the result.
    fn lower_logical(&mut self, op: LogicOp, l: &Spanned<Expr>, r: &Spanned<Expr>) -> Result<(), Syntax> {
        self.lower_one(l)?;
        let jump_op = match op {
            LogicOp::And => Op::Jfalse,
            LogicOp::Or => Op::Jtrue,
        };
        let jump_index = self.program.push(Instruction::with_offset(jump_op, 0));
        self.program.push(Instruction::op(Op::Drop));
        self.lower_one(r)?;
        let end = self.program.len();
        self.program.patch_offset(jump_index, end as i64);
        Ok(())
    }

    fn lower_field(&mut self, base: &Spanned<Expr>, name: &str) -> Result<(), Syntax> {
        self.lower_one(base)?;
        self.program.push(Instruction::with_ptr(Op::Lit, Lit::String(name.to_string())));
        self.program.push(Instruction::op(Op::Get));
        Ok(())
    }

    fn lower_index(&mut self, base: &Spanned<Expr>, idx: &Spanned<Expr>) -> Result<(), Syntax> {
        self.lower_one(base)?;
        self.lower_one(idx)?;
        self.program.push(Instruction::op(Op::Get));
        Ok(())
    }

    /// Emits just the call's own instructions — args, callee, `CALL` — with
    /// no surrounding `MARK`/`LIMIT`. The bracket is supplied by whichever
    /// context needs a specific arity (`lower_one` for a single value,
    /// `lower_statement` to discard, `lower_builtin`'s `print` to keep
    /// everything).
    fn lower_call_body(&mut self, callee: &Spanned<Expr>, args: &[Spanned<Expr>]) -> Result<(), Syntax> {
        for arg in args {
            self.lower_one(arg)?;
        }
        self.lower_callee(callee)?;
        self.program.push(Instruction::op(Op::Call));
        Ok(())
    }

    /// A bare-name callee resolves through `FIND` right before `CALL`, so
    /// the `FIND_LIT; CALL` peephole pair collapses to `CALL_LIT`.
    fn lower_callee(&mut self, callee: &Spanned<Expr>) -> Result<(), Syntax> {
        if let Expr::Name(name) = &callee.item {
            if name != "self" {
                self.program.push(Instruction::with_ptr(Op::Lit, Lit::String(name.clone())));
                self.program.push(Instruction::op(Op::Find));
                return Ok(());
            }
        }
        self.lower_one(callee)
    }

    /// `x:m(args)`: push `x` onto the self-stack for the duration of the
    /// call, then call `m` exactly like an ordinary name lookup.
    fn lower_method_call(&mut self, base: &Spanned<Expr>, name: &str, args: &[Spanned<Expr>]) -> Result<(), Syntax> {
        self.lower_one(base)?;
        self.program.push(Instruction::op(Op::SelfPush));
        for arg in args {
            self.lower_one(arg)?;
        }
        self.program.push(Instruction::with_ptr(Op::Lit, Lit::String(name.to_string())));
        self.program.push(Instruction::op(Op::Find));
        self.program.push(Instruction::op(Op::Call));
        self.program.push(Instruction::op(Op::SelfDrop));
        Ok(())
    }

    /// `if cond then A else B end` → cond, JFALSE L1, DROP, A, JMP L2,
    /// L1: DROP, B, L2.
    fn lower_if(
        &mut self,
        cond: &Spanned<Expr>,
        then_block: &[Spanned<Expr>],
        else_block: &[Spanned<Expr>],
    ) -> Result<(), Syntax> {
        self.lower_one(cond)?;
        let jfalse_index = self.program.push(Instruction::with_offset(Op::Jfalse, 0));
        self.program.push(Instruction::op(Op::Drop));
        self.lower_block(then_block)?;
        let jmp_index = self.program.push(Instruction::with_offset(Op::Jmp, 0));

        let else_target = self.program.len();
        self.program.patch_offset(jfalse_index, else_target as i64);
        self.program.push(Instruction::op(Op::Drop));
        self.lower_block(else_block)?;

        let end_target = self.program.len();
        self.program.patch_offset(jmp_index, end_target as i64);
        Ok(())
    }

    /// `while cond do body end`. `LOOP(end)` records the loop's exit for
    /// `BREAK`; `CONTINUE` restarts the test by returning to the
    /// instruction right after `LOOP`, which the VM finds by re-reading
    /// the loops stack, not by a compile-time jump target.
    fn lower_while(&mut self, cond: &Spanned<Expr>, body: &[Spanned<Expr>]) -> Result<(), Syntax> {
        let loop_index = self.program.push(Instruction::with_offset(Op::Loop, 0));
        let continue_target = self.program.len();

        self.lower_one(cond)?;
        let jfalse_index = self.program.push(Instruction::with_offset(Op::Jfalse, 0));
        self.program.push(Instruction::op(Op::Drop));
        self.lower_block(body)?;
        self.program.push(Instruction::with_offset(Op::Jmp, continue_target as i64));

        let false_target = self.program.len();
        self.program.patch_offset(jfalse_index, false_target as i64);
        self.program.push(Instruction::op(Op::Drop));
        self.program.push(Instruction::op(Op::Unloop));

        let end_target = self.program.len();
        self.program.patch_offset(loop_index, end_target as i64);
        Ok(())
    }

    /// `for k[,v] in iter do body end`, following the iter/counter/MARK/
    /// LOOP/FOR shape verbatim. `FOR` binds `k` into the writing scope
    /// directly (its `ptr` carries the name); when a second binding `v`
    /// is requested, a synthetic `v = __for_value` assignment is spliced
    /// onto the front of the body so the ordinary assignment machinery
    /// handles it, rather than teaching `FOR` to carry two names.
    fn lower_for(
        &mut self,
        key: &str,
        value: &Option<String>,
        iter: &Spanned<Expr>,
        body: &[Spanned<Expr>],
    ) -> Result<(), Syntax> {
        // Outer mark brackets the whole construct (iter + counter are
        // statement-local scratch, not a value the for-loop produces);
        // the inner mark brackets just the loop body each iteration.
        self.program.push(Instruction::op(Op::Mark));
        self.lower_one(iter)?;
        self.program.push(Instruction::with_ptr(Op::Lit, Lit::Integer(0)));
        self.program.push(Instruction::op(Op::Mark));
        let loop_index = self.program.push(Instruction::with_offset(Op::Loop, 0));
        let for_index = self.program.push(Instruction::name_with_offset(Op::For, 0, key));

        let mut body_stmts: Vec<Spanned<Expr>> = Vec::with_capacity(body.len() + 1);
        if let Some(vname) = value {
            let bind_span = iter.span.clone();
            body_stmts.push(Spanned::new(
                Expr::Assign(
                    vec![Spanned::new(Expr::Name(vname.clone()), bind_span.clone())],
                    vec![Spanned::new(Expr::Name("__for_value".to_string()), bind_span.clone())],
                ),
                bind_span,
            ));
        }
        body_stmts.extend(body.iter().cloned());
        self.lower_block(&body_stmts)?;

        self.program.push(Instruction::with_offset(Op::Jmp, for_index as i64));
        let unloop_index = self.program.push(Instruction::op(Op::Unloop));
        self.program.push(Instruction::with_offset(Op::Limit, 0));
        self.program.push(Instruction::with_offset(Op::Limit, 0));

        let break_target = self.program.len();
        self.program.patch_offset(for_index, unloop_index as i64);
        self.program.patch_offset(loop_index, break_target as i64);
        Ok(())
    }

    /// `LIT(entry); [ASSIGN_LIT(name)]; JMP over; entry: binds, body,
    /// REPLY, RETURN; over: LIMIT(1)`. The whole construct brackets
    /// itself with its own `MARK`/`LIMIT(1)` since a named function
    /// statement still needs a single net value to assign, and an
    /// anonymous function literal is itself a value-producing expression.
    fn lower_function(&mut self, name: Option<&str>, params: &[String], body: &[Spanned<Expr>]) -> Result<(), Syntax> {
        let mark_index = self.program.push(Instruction::op(Op::Mark));
        let lit_index = self.program.push(Instruction::op(Op::Lit));

        if let Some(n) = name {
            self.program.push(Instruction::name_with_offset(Op::AssignLit, 0, n));
        }

        let jmp_index = self.program.push(Instruction::with_offset(Op::Jmp, 0));
        let entry_target = self.program.len();
        self.program.patch_ptr(lit_index, Lit::Integer(entry_target as i64));

        // A call supplying fewer arguments than declared parameters must
        // still bind every parameter; pad the frame with nil up to arity
        // before reading any of it.
        self.program.push(Instruction::with_offset(Op::PadNil, params.len() as i64));

        for (i, param) in params.iter().enumerate() {
            self.program.push(Instruction::name_with_offset(Op::AssignLit, i as i64, param));
        }
        self.program.push(Instruction::op(Op::DropAll));
        self.lower_block(body)?;
        self.program.push(Instruction::op(Op::Reply));
        self.program.push(Instruction::op(Op::Return));

        let over_target = self.program.len();
        self.program.patch_offset(jmp_index, over_target as i64);
        self.program.push(Instruction::with_offset(Op::Limit, 1));
        self.program.collapse_trivial_frame(mark_index);
        Ok(())
    }

    fn lower_return(&mut self, values: &[Spanned<Expr>]) -> Result<(), Syntax> {
        for value in values {
            self.lower_one(value)?;
        }
        self.program.push(Instruction::op(Op::Reply));
        self.program.push(Instruction::op(Op::Return));
        Ok(())
    }

    fn lower_builtin(&mut self, builtin: Builtin, args: &[Spanned<Expr>]) -> Result<(), Syntax> {
        match builtin {
            Builtin::Print => {
                self.program.push(Instruction::op(Op::Mark));
                for arg in args {
                    self.lower_value(arg)?;
                }
                self.program.push(Instruction::op(Op::Print));
            }
            Builtin::Keys => {
                self.lower_one(&args[0])?;
                self.program.push(Instruction::op(Op::Keys));
            }
            Builtin::Values => {
                self.lower_one(&args[0])?;
                self.program.push(Instruction::op(Op::Values));
            }
            Builtin::Inherit => {
                self.lower_one(&args[0])?;
                self.lower_one(&args[1])?;
                self.program.push(Instruction::op(Op::Inherit));
            }
            Builtin::Status => {
                self.program.push(Instruction::op(Op::Status));
            }
            Builtin::Coroutine => {
                self.lower_one(&args[0])?;
                self.program.push(Instruction::op(Op::Coroutine));
            }
            Builtin::Resume => {
                for arg in args {
                    self.lower_one(arg)?;
                }
                self.program.push(Instruction::op(Op::Resume));
            }
            Builtin::Yield => {
                for arg in args {
                    self.lower_one(arg)?;
                }
                self.program.push(Instruction::op(Op::Yield));
            }
        }
        Ok(())
    }

    /// `ARRAY` carries its own item count, so no frame bracket is needed —
    /// unlike `CALL`/`RESUME`, its arity is static at compile time.
    fn lower_vec(&mut self, items: &[Spanned<Expr>]) -> Result<(), Syntax> {
        for item in items {
            self.lower_one(item)?;
        }
        self.program.push(Instruction::with_offset(Op::Array, items.len() as i64));
        Ok(())
    }

    /// `{ k = v, ... }`: open a smudged scope, assign each entry into it
    /// by name, turn the scope into a map value, then pop the scope.
    fn lower_map(&mut self, entries: &[(Spanned<Expr>, Spanned<Expr>)]) -> Result<(), Syntax> {
        self.program.push(Instruction::op(Op::Scope));
        self.program.push(Instruction::op(Op::Smudge));

        for (key, value) in entries {
            let key_name = match &key.item {
                Expr::Literal(Lit::String(s)) => s.clone(),
                _ => return Err(Syntax::error("map literal keys must be plain names", &key.span)),
            };
            let mark = self.program.push(Instruction::op(Op::Mark));
            self.lower_one(value)?;
            self.program.push(Instruction::name_with_offset(Op::AssignLit, 0, &key_name));
            self.program.push(Instruction::with_offset(Op::Limit, 0));
            self.program.collapse_trivial_frame(mark);
        }

        self.program.push(Instruction::op(Op::LitScope));
        self.program.push(Instruction::op(Op::Unscope));
        Ok(())
    }

    /// Desugars `$name`/`${expr}` pieces into a `CONCAT` chain.
    fn lower_interpolated(&mut self, parts: &[InterpPart]) -> Result<(), Syntax> {
        if parts.is_empty() {
            self.program.push(Instruction::with_ptr(Op::Lit, Lit::String(String::new())));
            return Ok(());
        }

        for (i, part) in parts.iter().enumerate() {
            match part {
                InterpPart::Str(s) => {
                    self.program.push(Instruction::with_ptr(Op::Lit, Lit::String(s.clone())));
                }
                InterpPart::Expr(e) => self.lower_one(e)?,
            }
            if i > 0 {
                self.program.push(Instruction::op(Op::Concat));
            }
        }
        Ok(())
    }

    fn lower_assign(&mut self, targets: &[Spanned<Expr>], values: &[Spanned<Expr>]) -> Result<(), Syntax> {
        let mark = self.program.push(Instruction::op(Op::Mark));
        for value in values {
            self.lower_one(value)?;
        }
        for (i, target) in targets.iter().enumerate() {
            self.lower_assign_target(target, i as i64)?;
        }
        self.program.push(Instruction::with_offset(Op::Limit, 0));
        self.program.collapse_trivial_frame(mark);
        Ok(())
    }

    /// `ASSIGN_LIT(name, i)` for a plain variable target; for `a.b`/`a[k]`
    /// targets, evaluate the container and key, then `ASSIGN(i)` — the
    /// non-literal counterpart — peeks the value at `mark + i` without
    /// popping it, so the enclosing `LIMIT` still sees and discards it.
    fn lower_assign_target(&mut self, target: &Spanned<Expr>, index: i64) -> Result<(), Syntax> {
        match &target.item {
            Expr::Name(name) => {
                self.program.push(Instruction::name_with_offset(Op::AssignLit, index, name));
            }
            Expr::Field(base, name) => {
                self.lower_one(base)?;
                self.program.push(Instruction::with_ptr(Op::Lit, Lit::String(name.clone())));
                self.program.push(Instruction::with_offset(Op::Assign, index));
            }
            Expr::Index(base, idx) => {
                self.lower_one(base)?;
                self.lower_one(idx)?;
                self.program.push(Instruction::with_offset(Op::Assign, index));
            }
            _ => return Err(Syntax::error("invalid assignment target", &target.span)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::Source;
    use crate::compiler::lex::lex;
    use crate::compiler::parse::parse;

    fn lower_str(text: &str) -> Program {
        let source = Source::source(text);
        let tokens = lex(&source).unwrap();
        let block = parse(tokens).unwrap();
        lower(&block).unwrap()
    }

    #[test]
    fn literal_add_fuses_to_add_lit() {
        let program = lower_str("x = 1 + 2");
        assert!(program.code.iter().any(|i| i.op == Op::AddLit));
    }

    #[test]
    fn name_lookup_fuses_to_find_lit() {
        let program = lower_str("print(x)");
        assert!(program.code.iter().any(|i| i.op == Op::FindLit));
    }

    #[test]
    fn call_with_bare_name_fuses_to_call_lit() {
        let program = lower_str("f()");
        assert!(program.code.iter().any(|i| i.op == Op::CallLit));
    }

    #[test]
    fn if_emits_balanced_jumps() {
        let program = lower_str("if x then y = 1 else y = 2 end");
        let jfalse_count = program.code.iter().filter(|i| i.op == Op::Jfalse).count();
        let jmp_count = program.code.iter().filter(|i| i.op == Op::Jmp).count();
        assert_eq!(jfalse_count, 1);
        assert_eq!(jmp_count, 1);
    }

    #[test]
    fn while_loop_has_loop_and_unloop() {
        let program = lower_str("while x do y = 1 end");
        assert!(program.code.iter().any(|i| i.op == Op::Loop));
        assert!(program.code.iter().any(|i| i.op == Op::Unloop));
    }

    #[test]
    fn function_definition_has_reply_return() {
        let program = lower_str("function f(x) return x end");
        assert!(program.code.iter().any(|i| i.op == Op::Reply));
        assert!(program.code.iter().any(|i| i.op == Op::Return));
    }

    use proptest::prelude::*;

    /// Walks the whole program statically, tracking `marks.len()` the way
    /// the VM would (ignoring jumps, since every branch of an `if` and
    /// every loop body still balances its own marks independently of
    /// which way control flows). Returns the net change in mark depth.
    fn static_mark_balance(program: &Program) -> i64 {
        let mut depth: i64 = 0;
        for inst in &program.code {
            match inst.op {
                Op::Mark | Op::Loop => depth += 1,
                Op::Limit | Op::Unloop => depth -= 1,
                _ => {}
            }
        }
        depth
    }

    proptest! {
        /// Frame discipline (§8 property 2): any chain of `+`/`-`/`*` over
        /// small integer literals lowers to a program whose `MARK`/`LIMIT`
        /// (and `LOOP`/`UNLOOP`) nesting is exactly balanced — every frame
        /// opened by a statement closes before the statement ends.
        #[test]
        fn arithmetic_chains_balance_their_frames(a: i8, b: i8, c: i8) {
            let source = format!("x = {} + {} * {} - {}", a, b, c, a);
            let program = lower_str(&source);
            prop_assert_eq!(static_mark_balance(&program), 0);
        }

        /// Same, for a function definition with an arbitrary arity — the
        /// function's own MARK/LIMIT(1) bracket and its internal call
        /// frame both have to close by the end of the program.
        #[test]
        fn function_bodies_balance_their_frames(n: i8) {
            let source = format!("function f(x) return x + {} end", n);
            let program = lower_str(&source);
            prop_assert_eq!(static_mark_balance(&program), 0);
        }

        /// A `for` loop over a vec literal balances its two-level
        /// MARK bracket (§4.3) regardless of how many elements it has.
        #[test]
        fn for_loops_balance_their_frames(count in 0usize..8) {
            let items: Vec<String> = (0..count).map(|i| i.to_string()).collect();
            let source = format!("for i in [{}] do x = i end", items.join(", "));
            let program = lower_str(&source);
            prop_assert_eq!(static_mark_balance(&program), 0);
        }
    }
}
