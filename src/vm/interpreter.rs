//! The dispatch loop: one coroutine's bytecode runs at a time, driven by
//! the scheduler stack in `Interpreter::coroutines` (§4.5). Every opcode
//! in `compiler::program::Op` has a case here, including the handful
//! lowering never emits (`TEST`, `SET`, `STRING`, `TABLE`, `LITSTACK`,
//! `SHUNT`, `SHIFT`) — kept for protocol completeness.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use regex::RegexBuilder;

use crate::common::lit::Lit;
use crate::compiler::program::{Instruction, Op, Program};
use crate::vm::arena::Arena;
use crate::vm::coroutine::{Coroutine, State};
use crate::vm::trace::Trace;
use crate::vm::value::{kind_name, truthy, values_equal, values_less, MapObj, StrObj, Value, VecObj};

pub struct Interpreter<'a> {
    program: Program,
    arena: Arena,
    global: Value,
    /// Terminal fallback for map lookups that miss the whole `meta` chain —
    /// a single process-wide prototype map, empty by default. Kept distinct
    /// from `global` so user code can tell the two apart via `local`/`global`.
    map_super: Value,
    coroutines: Vec<Rc<RefCell<Coroutine>>>,
    out: Box<dyn Write + 'a>,
}

fn as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Int(n) if *n >= 0 => Some(*n as usize),
        _ => None,
    }
}

fn ptr_name(inst: &Instruction) -> Option<String> {
    match &inst.ptr {
        Some(Lit::String(s)) => Some(s.clone()),
        _ => None,
    }
}

impl<'a> Interpreter<'a> {
    pub fn new(program: Program, memory_mb: u64, out: Box<dyn Write + 'a>) -> Interpreter<'a> {
        let arena = Arena::new(memory_mb);
        let global = Value::Map(MapObj::new(arena.maps.clone()));
        let map_super = Value::Map(MapObj::new(arena.maps.clone()));
        Interpreter { program, arena, global, map_super, coroutines: Vec::new(), out }
    }

    /// Runs the program to completion: starts a root coroutine at
    /// instruction 0 and dispatches until the scheduler empties (the root
    /// coroutine's bottom-level `RETURN`) or the instruction pointer runs
    /// off the end of the program.
    pub fn run(&mut self) -> Result<(), Trace> {
        let root_scope = Value::Map(MapObj::new(self.arena.maps.clone()));
        let root = Rc::new(RefCell::new(Coroutine::new(0, root_scope, self.arena.cors.clone())));
        root.borrow_mut().state = State::Running;
        self.coroutines.push(root);

        loop {
            let current = match self.coroutines.last() {
                Some(cor) => Rc::clone(cor),
                None => break,
            };
            let ip = current.borrow().ip;
            if ip >= self.program.code.len() {
                break;
            }
            let inst = self.program.code[ip].clone();
            current.borrow_mut().ip = ip + 1;
            self.dispatch(&current, &inst)?;
        }

        Ok(())
    }

    fn materialize(&self, lit: &Lit) -> Value {
        match lit {
            Lit::Nil => Value::Nil,
            Lit::Boolean(b) => Value::Bool(*b),
            Lit::Integer(n) => Value::Int(*n),
            Lit::Float(f) => Value::Float(*f),
            Lit::String(s) => Value::Str(StrObj::new(s.clone(), self.arena.strs.clone())),
        }
    }

    fn intern(&self, text: &str) -> Value {
        Value::Str(StrObj::new(text.to_string(), self.arena.strs.clone()))
    }

    /// Nearest non-smudged scope from the top of the coroutine's scope
    /// stack, falling back to the global scope (§4.4).
    fn reading_scope(&self, cor: &Coroutine) -> Value {
        for scope in cor.scopes.iter().rev() {
            if let Value::Map(m) = scope {
                if !m.borrow().smudged {
                    return scope.clone();
                }
            }
        }
        self.global.clone()
    }

    fn writing_scope(&self, cor: &Coroutine) -> Value {
        cor.scopes.last().cloned().unwrap_or_else(|| self.global.clone())
    }

    fn scope_get(&self, scope: &Value, name: &str) -> Option<Value> {
        match scope {
            Value::Map(m) => self.map_get_chain(m, &self.intern(name)),
            _ => None,
        }
    }

    fn scope_set(&self, scope: &Value, name: &str, value: Value) {
        if let Value::Map(m) = scope {
            m.borrow_mut().set(self.intern(name), value);
        }
    }

    /// `FIND`/`FIND_LIT` resolution order: reading scope, then global.
    /// There is no separate core-scope lookup — `print`/`keys`/`values`/
    /// `inherit`/`status`/`coroutine`/`resume`/`yield` are recognized by
    /// the parser at call position and lowered straight to their own
    /// opcodes, so they never need to be found by name here.
    fn find(&self, cor: &Coroutine, name: &str) -> Option<Value> {
        self.scope_get(&self.reading_scope(cor), name).or_else(|| self.scope_get(&self.global, name))
    }

    /// Walks a map's own buckets, then its `meta` prototype chain (guarded
    /// against cycles with a visited set), then the per-kind super-map.
    fn map_get_chain(&self, map: &Rc<RefCell<MapObj>>, key: &Value) -> Option<Value> {
        let mut visited: Vec<*const RefCell<MapObj>> = Vec::new();
        let mut current = Rc::clone(map);
        loop {
            let ptr = Rc::as_ptr(&current);
            if visited.contains(&ptr) {
                break;
            }
            visited.push(ptr);
            if let Some(v) = current.borrow().get_own(key) {
                return Some(v);
            }
            let next = current.borrow().meta.clone();
            match next {
                Some(Value::Map(m)) => current = m,
                _ => break,
            }
        }
        if let Value::Map(sm) = &self.map_super {
            if !Rc::ptr_eq(sm, map) {
                return sm.borrow().get_own(key);
            }
        }
        None
    }

    fn get_index(&self, container: &Value, key: &Value) -> Value {
        match container {
            Value::Vec(v) => as_index(key).and_then(|i| v.borrow().items.get(i).cloned()).unwrap_or(Value::Nil),
            Value::Map(m) => self.map_get_chain(m, key).unwrap_or(Value::Nil),
            _ => Value::Nil,
        }
    }

    fn set_index(&self, container: &Value, key: Value, value: Value) -> Result<(), String> {
        match container {
            Value::Vec(v) => match as_index(&key) {
                Some(i) => {
                    v.borrow_mut().set(i, value);
                    Ok(())
                }
                None => Err("vec index must be a non-negative int".to_string()),
            },
            Value::Map(m) => {
                m.borrow_mut().set(key, value);
                Ok(())
            }
            other => Err(format!("cannot assign into a {}", kind_name(other))),
        }
    }

    fn enter_call(&self, cor: &Rc<RefCell<Coroutine>>, entry: usize) {
        let scope = Value::Map(MapObj::new(self.arena.maps.clone()));
        let mut c = cor.borrow_mut();
        let frame = (c.loops.len(), c.marks.len(), c.ip);
        c.calls.push(frame);
        c.scopes.push(scope);
        c.ip = entry;
    }

    /// Shared tail of `RETURN`'s bottom-level case and `YIELD`: moves the
    /// coroutine's current frame onto whichever coroutine is now on top of
    /// the scheduler (the resumer), then drops this one off the scheduler.
    fn hand_off(&mut self, cor: &Rc<RefCell<Coroutine>>) {
        let mark = *cor.borrow().marks.last().unwrap_or(&0);
        let frame: Vec<Value> = cor.borrow_mut().stack.split_off(mark);
        self.coroutines.pop();
        if let Some(parent) = self.coroutines.last() {
            parent.borrow_mut().stack.extend(frame);
        }
    }

    fn dispatch(&mut self, cor: &Rc<RefCell<Coroutine>>, inst: &Instruction) -> Result<(), Trace> {
        let trace_ip = cor.borrow().ip.saturating_sub(1);
        let call_chain: Vec<usize> = cor.borrow().calls.iter().map(|f| f.2).collect();
        let fail = |reason: &str| Trace::error(reason, trace_ip, inst.op, call_chain.clone());

        match inst.op {
            Op::Mark => {
                let len = cor.borrow().stack.len();
                cor.borrow_mut().marks.push(len);
            }
            Op::Limit => {
                let mut c = cor.borrow_mut();
                let old = c.marks.pop().ok_or_else(|| fail("LIMIT with no matching MARK"))?;
                let want = if inst.offset >= 0 { old + inst.offset as usize } else { c.stack.len() };
                while c.stack.len() > want {
                    c.stack.pop();
                }
                while c.stack.len() < want {
                    c.stack.push(Value::Nil);
                }
            }
            Op::Loop => {
                let mut c = cor.borrow_mut();
                let continue_target = c.ip;
                let break_target = inst.offset as usize;
                let frame = (continue_target, break_target, c.marks.len(), c.stack.len());
                c.loops.push(frame);
            }
            Op::Unloop => {
                cor.borrow_mut().loops.pop();
            }
            Op::Drop => {
                cor.borrow_mut().stack.pop();
            }
            Op::DropAll => {
                let mut c = cor.borrow_mut();
                if let Some(&mark) = c.marks.last() {
                    c.stack.truncate(mark);
                }
            }
            Op::PadNil => {
                let mut c = cor.borrow_mut();
                let mark = *c.marks.last().ok_or_else(|| fail("PAD_NIL with no open frame"))?;
                let want = mark + inst.offset as usize;
                while c.stack.len() < want {
                    c.stack.push(Value::Nil);
                }
            }

            Op::Lit | Op::String => {
                let lit = inst.ptr.as_ref().ok_or_else(|| fail("LIT missing literal operand"))?;
                let value = self.materialize(lit);
                cor.borrow_mut().stack.push(value);
            }
            Op::Nil => cor.borrow_mut().stack.push(Value::Nil),
            Op::True => cor.borrow_mut().stack.push(Value::Bool(true)),
            Op::False => cor.borrow_mut().stack.push(Value::Bool(false)),
            Op::Array => {
                let n = inst.offset as usize;
                let items = {
                    let mut c = cor.borrow_mut();
                    let len = c.stack.len();
                    c.stack.split_off(len - n)
                };
                let vec_value = Value::Vec(VecObj::new(items, self.arena.vecs.clone()));
                cor.borrow_mut().stack.push(vec_value);
            }
            Op::Table => {
                let pairs = inst.offset as usize;
                let mut flat = {
                    let mut c = cor.borrow_mut();
                    let len = c.stack.len();
                    c.stack.split_off(len - pairs * 2)
                };
                let map = MapObj::new(self.arena.maps.clone());
                while !flat.is_empty() {
                    let value = flat.remove(0);
                    let key = flat.remove(0);
                    map.borrow_mut().set(key, value);
                }
                cor.borrow_mut().stack.push(Value::Map(map));
            }
            Op::Global => cor.borrow_mut().stack.push(self.global.clone()),
            Op::Local => {
                let scope = self.reading_scope(&cor.borrow());
                cor.borrow_mut().stack.push(scope);
            }
            Op::LitStack => {
                let mark = *cor.borrow().marks.last().unwrap_or(&0);
                let items = cor.borrow().stack[mark..].to_vec();
                let vec_value = Value::Vec(VecObj::new(items, self.arena.vecs.clone()));
                cor.borrow_mut().stack.push(vec_value);
            }
            Op::LitScope => {
                let scope = cor.borrow().scopes.last().cloned().ok_or_else(|| fail("LITSCOPE with no open scope"))?;
                if let Value::Map(m) = &scope {
                    m.borrow_mut().smudged = false;
                }
                cor.borrow_mut().stack.push(scope);
            }
            Op::Scope => {
                let scope = Value::Map(MapObj::new(self.arena.maps.clone()));
                cor.borrow_mut().scopes.push(scope);
            }
            Op::Smudge => {
                let scope = cor.borrow().scopes.last().cloned();
                if let Some(Value::Map(m)) = scope {
                    m.borrow_mut().smudged = true;
                }
            }
            Op::Unscope => {
                cor.borrow_mut().scopes.pop();
            }
            Op::Zelf => {
                let value = cor.borrow().selves.last().cloned().ok_or_else(|| fail("self used outside a method call"))?;
                cor.borrow_mut().stack.push(value);
            }
            Op::SelfPush => {
                let value = cor.borrow_mut().stack.pop().ok_or_else(|| fail("SELF_PUSH on an empty stack"))?;
                cor.borrow_mut().selves.push(value);
            }
            Op::SelfDrop => {
                cor.borrow_mut().selves.pop();
            }
            Op::Shunt => {
                let value = cor.borrow_mut().stack.pop();
                if let Some(v) = value {
                    cor.borrow_mut().other.push(v);
                }
            }
            Op::Shift => {
                let value = cor.borrow_mut().other.pop();
                if let Some(v) = value {
                    cor.borrow_mut().stack.push(v);
                }
            }

            Op::Assign => {
                let (key, container) = {
                    let mut c = cor.borrow_mut();
                    let key = c.stack.pop().ok_or_else(|| fail("ASSIGN missing key"))?;
                    let container = c.stack.pop().ok_or_else(|| fail("ASSIGN missing container"))?;
                    (key, container)
                };
                let value = {
                    let c = cor.borrow();
                    let mark = *c.marks.last().ok_or_else(|| fail("ASSIGN with no open frame"))?;
                    c.stack.get(mark + inst.offset as usize).cloned().ok_or_else(|| fail("ASSIGN index out of frame"))?
                };
                self.set_index(&container, key, value).map_err(|e| fail(&e))?;
            }
            Op::AssignLit => {
                let name = ptr_name(inst).ok_or_else(|| fail("ASSIGN_LIT missing name operand"))?;
                let value = {
                    let c = cor.borrow();
                    let mark = *c.marks.last().ok_or_else(|| fail("ASSIGN_LIT with no open frame"))?;
                    c.stack.get(mark + inst.offset as usize).cloned().ok_or_else(|| fail("ASSIGN_LIT index out of frame"))?
                };
                let writing = self.writing_scope(&cor.borrow());
                self.scope_set(&writing, &name, value);
            }
            Op::Set => {
                let (value, key, container) = {
                    let mut c = cor.borrow_mut();
                    let value = c.stack.pop().ok_or_else(|| fail("SET missing value"))?;
                    let key = c.stack.pop().ok_or_else(|| fail("SET missing key"))?;
                    let container = c.stack.pop().ok_or_else(|| fail("SET missing container"))?;
                    (value, key, container)
                };
                self.set_index(&container, key, value).map_err(|e| fail(&e))?;
            }
            Op::Find => {
                let key = cor.borrow_mut().stack.pop().ok_or_else(|| fail("FIND missing name"))?;
                let name = match &key {
                    Value::Str(s) => s.text.clone(),
                    _ => return Err(fail("FIND name must be a string")),
                };
                let found = self.find(&cor.borrow(), &name).ok_or_else(|| fail(&format!("unknown name '{}'", name)))?;
                cor.borrow_mut().stack.push(found);
            }
            Op::FindLit => {
                let name = ptr_name(inst).ok_or_else(|| fail("FIND_LIT missing name operand"))?;
                let found = self.find(&cor.borrow(), &name).ok_or_else(|| fail(&format!("unknown name '{}'", name)))?;
                cor.borrow_mut().stack.push(found);
            }
            Op::Get => {
                let (key, container) = {
                    let mut c = cor.borrow_mut();
                    let key = c.stack.pop().ok_or_else(|| fail("GET missing key"))?;
                    let container = c.stack.pop().ok_or_else(|| fail("GET missing container"))?;
                    (key, container)
                };
                let value = self.get_index(&container, &key);
                cor.borrow_mut().stack.push(value);
            }
            Op::GetLit => {
                let lit = inst.ptr.as_ref().ok_or_else(|| fail("GET_LIT missing key operand"))?;
                let key = self.materialize(lit);
                let container = cor.borrow_mut().stack.pop().ok_or_else(|| fail("GET_LIT missing container"))?;
                let value = self.get_index(&container, &key);
                cor.borrow_mut().stack.push(value);
            }
            Op::Inherit => {
                let (parent, child) = {
                    let mut c = cor.borrow_mut();
                    let parent = c.stack.pop().ok_or_else(|| fail("inherit() missing parent"))?;
                    let child = c.stack.pop().ok_or_else(|| fail("inherit() missing child"))?;
                    (parent, child)
                };
                match &child {
                    Value::Map(m) => m.borrow_mut().meta = Some(parent),
                    _ => return Err(fail("inherit() requires its first argument to be a map")),
                }
            }

            Op::Test => {}

            Op::Jmp => {
                cor.borrow_mut().ip = inst.offset as usize;
            }
            Op::Jfalse => {
                let top = cor.borrow().stack.last().cloned();
                let truthy_top = top.as_ref().map(truthy).unwrap_or(false);
                if !truthy_top {
                    cor.borrow_mut().ip = inst.offset as usize;
                }
            }
            Op::Jtrue => {
                let top = cor.borrow().stack.last().cloned();
                let truthy_top = top.as_ref().map(truthy).unwrap_or(false);
                if truthy_top {
                    cor.borrow_mut().ip = inst.offset as usize;
                }
            }
            Op::For => {
                let name = ptr_name(inst).ok_or_else(|| fail("FOR missing name operand"))?;
                let (iter_val, counter) = {
                    let c = cor.borrow();
                    let len = c.stack.len();
                    let counter = match &c.stack[len - 1] {
                        Value::Int(n) if *n >= 0 => *n as usize,
                        _ => return Err(fail("FOR counter must be a non-negative int")),
                    };
                    (c.stack[len - 2].clone(), counter)
                };
                let pair = match &iter_val {
                    Value::Vec(v) => v.borrow().items.get(counter).map(|item| (Value::Int(counter as i64), item.clone())),
                    Value::Map(m) => m.borrow().entries().nth(counter).map(|(k, v)| (k.clone(), v.clone())),
                    other => return Err(fail(&format!("cannot iterate over a {}", kind_name(other)))),
                };
                match pair {
                    Some((key, value)) => {
                        let writing = self.writing_scope(&cor.borrow());
                        self.scope_set(&writing, &name, key);
                        self.scope_set(&writing, "__for_value", value);
                        let mut c = cor.borrow_mut();
                        let len = c.stack.len();
                        c.stack[len - 1] = Value::Int(counter as i64 + 1);
                    }
                    None => cor.borrow_mut().ip = inst.offset as usize,
                }
            }
            Op::Keys => {
                let container = cor.borrow_mut().stack.pop().ok_or_else(|| fail("keys() missing argument"))?;
                let items = match &container {
                    Value::Map(m) => m.borrow().entries().map(|(k, _)| k.clone()).collect(),
                    other => return Err(fail(&format!("keys() requires a map, found {}", kind_name(other)))),
                };
                let vec_value = Value::Vec(VecObj::new(items, self.arena.vecs.clone()));
                cor.borrow_mut().stack.push(vec_value);
            }
            Op::Values => {
                let container = cor.borrow_mut().stack.pop().ok_or_else(|| fail("values() missing argument"))?;
                let items = match &container {
                    Value::Map(m) => m.borrow().entries().map(|(_, v)| v.clone()).collect(),
                    other => return Err(fail(&format!("values() requires a map, found {}", kind_name(other)))),
                };
                let vec_value = Value::Vec(VecObj::new(items, self.arena.vecs.clone()));
                cor.borrow_mut().stack.push(vec_value);
            }

            Op::Call => {
                let callee = cor.borrow_mut().stack.pop();
                match callee {
                    Some(Value::Int(addr)) => self.enter_call(cor, addr as usize),
                    _ => return Err(fail("call target must be an int address")),
                }
            }
            Op::CallLit => {
                let name = ptr_name(inst).ok_or_else(|| fail("CALL_LIT missing name operand"))?;
                let found = self.find(&cor.borrow(), &name).ok_or_else(|| fail(&format!("unknown name '{}'", name)))?;
                match found {
                    Value::Int(addr) => self.enter_call(cor, addr as usize),
                    other => return Err(fail(&format!("'{}' is not callable ({})", name, kind_name(&other)))),
                }
            }
            Op::Return => {
                let frame = cor.borrow_mut().calls.pop();
                match frame {
                    Some((saved_loops, saved_marks, saved_ip)) => {
                        let mut c = cor.borrow_mut();
                        c.scopes.pop();
                        if c.loops.len() != saved_loops || c.marks.len() != saved_marks {
                            return Err(fail("call frame corruption: loops/marks mismatch on return"));
                        }
                        c.ip = saved_ip;
                    }
                    None => {
                        cor.borrow_mut().state = State::Dead;
                        self.hand_off(cor);
                    }
                }
            }
            Op::Reply => {
                // No-op: lowering's MARK/LIMIT discipline already leaves the
                // stack sitting at exactly mark + (number of return values)
                // by the time a function reaches its REPLY/RETURN pair.
            }
            Op::Break => {
                let frame = cor.borrow_mut().loops.pop();
                let (_, break_target, saved_marks, saved_stack) = frame.ok_or_else(|| fail("break outside a loop"))?;
                let mut c = cor.borrow_mut();
                c.marks.truncate(saved_marks);
                c.stack.truncate(saved_stack);
                c.ip = break_target;
            }
            Op::Continue => {
                let frame = cor.borrow().loops.last().copied();
                let (continue_target, _, saved_marks, saved_stack) = frame.ok_or_else(|| fail("continue outside a loop"))?;
                let mut c = cor.borrow_mut();
                c.marks.truncate(saved_marks);
                c.stack.truncate(saved_stack);
                c.ip = continue_target;
            }
            Op::Coroutine => {
                let addr = cor.borrow_mut().stack.pop();
                match addr {
                    Some(Value::Int(n)) => {
                        let scope = Value::Map(MapObj::new(self.arena.maps.clone()));
                        let new_cor = Rc::new(RefCell::new(Coroutine::new(n as usize, scope, self.arena.cors.clone())));
                        cor.borrow_mut().stack.push(Value::Cor(new_cor));
                    }
                    _ => return Err(fail("coroutine() requires a function value")),
                }
            }
            Op::Resume => {
                let mark = *cor.borrow().marks.last().ok_or_else(|| fail("resume() outside any frame"))?;
                let frame: Vec<Value> = cor.borrow_mut().stack.split_off(mark);
                if frame.is_empty() {
                    return Err(fail("resume() requires a coroutine argument"));
                }
                let target = match &frame[0] {
                    Value::Cor(rc) => Rc::clone(rc),
                    other => return Err(fail(&format!("resume() requires a coroutine, found {}", kind_name(other)))),
                };
                let forwarded = frame[1..].to_vec();
                let state = target.borrow().state;
                match state {
                    State::Dead => {
                        let msg = self.intern("cannot resume dead coroutine");
                        let mut c = cor.borrow_mut();
                        c.stack.push(Value::Bool(false));
                        c.stack.push(msg);
                    }
                    State::Running => return Err(fail("coroutine is already running")),
                    State::Suspended => {
                        target.borrow_mut().stack.extend(forwarded);
                        target.borrow_mut().state = State::Running;
                        self.coroutines.push(target);
                    }
                }
            }
            Op::Yield => {
                let mark = *cor.borrow().marks.last().ok_or_else(|| fail("yield() outside any frame"))?;
                let frame: Vec<Value> = cor.borrow_mut().stack.split_off(mark);
                cor.borrow_mut().state = State::Suspended;
                self.coroutines.pop();
                match self.coroutines.last() {
                    Some(parent) => parent.borrow_mut().stack.extend(frame),
                    None => return Err(fail("yield() with no resuming coroutine")),
                }
            }

            Op::Add | Op::AddLit => self.binary_numeric(cor, inst, &fail, |a, b| a.wrapping_add(b), |a, b| a + b)?,
            Op::Sub => self.binary_numeric(cor, inst, &fail, |a, b| a.wrapping_sub(b), |a, b| a - b)?,
            Op::Mul => self.binary_numeric(cor, inst, &fail, |a, b| a.wrapping_mul(b), |a, b| a * b)?,
            Op::Div => {
                let (a, b) = self.pop_pair(cor, &fail)?;
                let result = match (&a, &b) {
                    (Value::Int(_), Value::Int(0)) => return Err(fail("division by zero")),
                    (Value::Int(x), Value::Int(y)) => Value::Int(x / y),
                    (Value::Int(x), Value::Float(y)) => Value::Float(*x as f64 / y),
                    (Value::Float(x), Value::Int(y)) => Value::Float(x / *y as f64),
                    (Value::Float(x), Value::Float(y)) => Value::Float(x / y),
                    _ => return Err(fail(&format!("cannot divide {} by {}", kind_name(&a), kind_name(&b)))),
                };
                cor.borrow_mut().stack.push(result);
            }
            Op::Mod => {
                let (a, b) = self.pop_pair(cor, &fail)?;
                let result = match (&a, &b) {
                    (Value::Int(_), Value::Int(0)) => return Err(fail("modulo by zero")),
                    (Value::Int(x), Value::Int(y)) => Value::Int(x % y),
                    _ => return Err(fail("mod is only defined for (int, int)")),
                };
                cor.borrow_mut().stack.push(result);
            }
            Op::Neg => {
                let value = cor.borrow_mut().stack.pop().ok_or_else(|| fail("NEG missing operand"))?;
                let result = match value {
                    Value::Int(n) => Value::Int(-n),
                    Value::Float(f) => Value::Float(-f),
                    other => return Err(fail(&format!("cannot negate a {}", kind_name(&other)))),
                };
                cor.borrow_mut().stack.push(result);
            }
            Op::Not => {
                let value = cor.borrow_mut().stack.pop().ok_or_else(|| fail("NOT missing operand"))?;
                cor.borrow_mut().stack.push(Value::Bool(!truthy(&value)));
            }
            Op::Eq => {
                let (a, b) = self.pop_pair(cor, &fail)?;
                cor.borrow_mut().stack.push(Value::Bool(values_equal(&a, &b)));
            }
            Op::Ne => {
                let (a, b) = self.pop_pair(cor, &fail)?;
                cor.borrow_mut().stack.push(Value::Bool(!values_equal(&a, &b)));
            }
            Op::Lt => {
                let (a, b) = self.pop_pair(cor, &fail)?;
                cor.borrow_mut().stack.push(Value::Bool(values_less(&a, &b)));
            }
            Op::LtLit => {
                let lit = inst.ptr.as_ref().ok_or_else(|| fail("LT_LIT missing literal operand"))?;
                let b = self.materialize(lit);
                let a = cor.borrow_mut().stack.pop().ok_or_else(|| fail("LT_LIT missing operand"))?;
                cor.borrow_mut().stack.push(Value::Bool(values_less(&a, &b)));
            }
            Op::Lte => {
                let (a, b) = self.pop_pair(cor, &fail)?;
                cor.borrow_mut().stack.push(Value::Bool(values_less(&a, &b) || values_equal(&a, &b)));
            }
            Op::Gt => {
                let (a, b) = self.pop_pair(cor, &fail)?;
                cor.borrow_mut().stack.push(Value::Bool(values_less(&b, &a)));
            }
            Op::Gte => {
                let (a, b) = self.pop_pair(cor, &fail)?;
                cor.borrow_mut().stack.push(Value::Bool(values_less(&b, &a) || values_equal(&a, &b)));
            }
            Op::Concat => {
                let (a, b) = self.pop_pair(cor, &fail)?;
                let joined = self.intern(&format!("{}{}", a, b));
                cor.borrow_mut().stack.push(joined);
            }
            Op::Count => {
                let value = cor.borrow_mut().stack.pop().ok_or_else(|| fail("COUNT missing operand"))?;
                let count = match &value {
                    Value::Str(s) => s.text.len() as i64,
                    Value::Vec(v) => v.borrow().items.len() as i64,
                    Value::Map(m) => m.borrow().count as i64,
                    other => return Err(fail(&format!("cannot take the count of a {}", kind_name(other)))),
                };
                cor.borrow_mut().stack.push(Value::Int(count));
            }
            Op::Match => {
                let (subject, pattern) = self.pop_pair(cor, &fail)?;
                let (subject, pattern) = match (&subject, &pattern) {
                    (Value::Str(s), Value::Str(p)) => (s.text.clone(), p.text.clone()),
                    _ => return Err(fail("~ requires two strings")),
                };
                if let Ok(re) = RegexBuilder::new(&pattern).dot_matches_new_line(true).build() {
                    if let Some(caps) = re.captures(&subject) {
                        let mut c = cor.borrow_mut();
                        for i in 0..caps.len() {
                            let text = caps.get(i).map(|m| m.as_str()).unwrap_or("");
                            c.stack.push(self.intern(text));
                        }
                    }
                }
            }
            Op::Status => {
                let map = MapObj::new(self.arena.maps.clone());
                for kind in self.arena.named() {
                    let mut m = map.borrow_mut();
                    m.set(self.intern(&format!("{}_mem", kind.name())), Value::Int(kind.mem() as i64));
                    m.set(self.intern(&format!("{}_limit", kind.name())), Value::Int(kind.limit() as i64));
                    m.set(self.intern(&format!("{}_used", kind.name())), Value::Int(kind.live() as i64));
                }
                cor.borrow_mut().stack.push(Value::Map(map));
            }
            Op::Print => {
                let mark = cor.borrow_mut().marks.pop().ok_or_else(|| fail("PRINT with no open frame"))?;
                let frame: Vec<Value> = cor.borrow_mut().stack.split_off(mark);
                let rendered: Vec<String> = frame.iter().map(|v| v.to_string()).collect();
                writeln!(self.out, "{}", rendered.join("\t")).map_err(|e| fail(&format!("write error: {}", e)))?;
            }
        }

        Ok(())
    }

    fn pop_pair(&self, cor: &Rc<RefCell<Coroutine>>, fail: &dyn Fn(&str) -> Trace) -> Result<(Value, Value), Trace> {
        let mut c = cor.borrow_mut();
        let b = c.stack.pop().ok_or_else(|| fail("missing right operand"))?;
        let a = c.stack.pop().ok_or_else(|| fail("missing left operand"))?;
        Ok((a, b))
    }

    fn binary_numeric(
        &self,
        cor: &Rc<RefCell<Coroutine>>,
        _inst: &Instruction,
        fail: &dyn Fn(&str) -> Trace,
        int_op: impl Fn(i64, i64) -> i64,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> Result<(), Trace> {
        let (a, b) = self.pop_pair(cor, fail)?;
        let result = match (&a, &b) {
            (Value::Int(x), Value::Int(y)) => Value::Int(int_op(*x, *y)),
            (Value::Int(x), Value::Float(y)) => Value::Float(float_op(*x as f64, *y)),
            (Value::Float(x), Value::Int(y)) => Value::Float(float_op(*x, *y as f64)),
            (Value::Float(x), Value::Float(y)) => Value::Float(float_op(*x, *y)),
            _ => return Err(fail(&format!("cannot apply arithmetic to {} and {}", kind_name(&a), kind_name(&b)))),
        };
        cor.borrow_mut().stack.push(result);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compiler::lex::lex;
    use crate::compiler::lower::lower;
    use crate::compiler::parse::parse;
    use crate::common::source::Source;

    #[derive(Clone)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn run_source(text: &str) -> String {
        let source = Source::source(text);
        let tokens = lex(&source).unwrap();
        let block = parse(tokens).unwrap();
        let program = lower(&block).unwrap();
        let buf = Rc::new(RefCell::new(Vec::new()));
        let mut interp = Interpreter::new(program, 8, Box::new(SharedBuf(Rc::clone(&buf))));
        interp.run().unwrap();
        let bytes = buf.borrow().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn function_call_and_arithmetic() {
        let output = run_source("function f(x) return x*x end print(f(5))");
        assert_eq!(output, "25\n");
    }

    #[test]
    fn missing_call_arguments_default_to_nil() {
        let output = run_source("function f(a, b) print(a) print(b) end f(1)");
        assert_eq!(output, "1\nnil\n");
    }

    #[test]
    fn vec_for_loop_sum() {
        let output = run_source("a = [1,2,3] s = 0 for i in a do s = s + i end print(s)");
        assert_eq!(output, "6\n");
    }

    #[test]
    fn recursive_fibonacci() {
        let output = run_source("function fib(n) if n < 2 then return n else return fib(n-1)+fib(n-2) end end print(fib(10))");
        assert_eq!(output, "55\n");
    }

    #[test]
    fn string_count_and_concat() {
        let output = run_source("s = \"hello\" print(#s) print(s .. \" world\")");
        assert_eq!(output, "5\nhello world\n");
    }

    #[test]
    fn coroutine_yield_and_dead_resume() {
        let output = run_source(
            "c = coroutine(function() yield(1) yield(2) yield(3) end) \
             print(resume(c)) print(resume(c)) print(resume(c)) print(resume(c))",
        );
        assert_eq!(output, "1\n2\n3\nfalse\tcannot resume dead coroutine\n");
    }

    #[test]
    fn map_for_loop_visits_every_pair() {
        let output = run_source("t = {a=1, b=2} for k,v in t do print(k,v) end");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.contains(&"a\t1"));
        assert!(lines.contains(&"b\t2"));
    }
}
