//! `Trace`: the VM's fatal-error type (§4.7, §7). Bytecode instructions
//! carry no source span after lowering, so a trace anchors itself to the
//! failing instruction pointer and opcode plus the chain of call-site
//! instruction pointers recorded on the coroutine's call stack, rather
//! than a `Span` into the original source.

use std::fmt;

use crate::compiler::program::Op;

#[derive(Debug, Clone)]
pub struct Trace {
    pub reason: String,
    pub ip: usize,
    pub op: Op,
    pub call_chain: Vec<usize>,
}

impl Trace {
    pub fn error(reason: &str, ip: usize, op: Op, call_chain: Vec<usize>) -> Trace {
        Trace { reason: reason.to_string(), ip, op, call_chain }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trace Error: {}", self.reason)?;
        write!(f, "  at instruction {} ({:?})", self.ip, self.op)?;
        if !self.call_chain.is_empty() {
            write!(f, "\n  called from: {:?}", self.call_chain)?;
        }
        Ok(())
    }
}

impl std::error::Error for Trace {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_includes_reason_and_instruction() {
        let trace = Trace::error("unknown name 'x'", 12, Op::FindLit, vec![3, 7]);
        let rendered = trace.to_string();
        assert!(rendered.contains("unknown name 'x'"));
        assert!(rendered.contains("12"));
        assert!(rendered.contains("called from"));
    }
}
