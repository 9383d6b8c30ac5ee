// Each step in the compiler pipeline turns one datatype into another.
// loosely:
// ~> Source (string)
// -> Tokens          : lex.rs
// -> AST             : parse.rs
// -> Bytecode        : lower.rs, program.rs
// ~> Run (result)    : vm::interpreter.rs

pub mod lex;
pub mod parse;
pub mod program;
pub mod lower;

pub mod syntax;
