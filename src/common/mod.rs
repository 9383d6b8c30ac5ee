//! Datastructures shared between the compiler front end and the VM:
//! source representation, span annotations, and literal data.

pub mod lit;
pub mod number;
pub mod source;
pub mod span;

pub use lit::Lit;
pub use source::Source;
pub use span::{Span, Spanned};
