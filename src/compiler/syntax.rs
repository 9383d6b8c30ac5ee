use std::fmt;

use crate::common::span::Span;

/// A static error: anything caught before the program runs — lexing,
/// parsing, or lowering. Carries the span of the offending source text so
/// the driver can print a caret-underlined excerpt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    pub reason: String,
    pub span: Span,
}

impl Syntax {
    pub fn error(reason: &str, span: &Span) -> Syntax {
        Syntax { reason: reason.to_string(), span: span.clone() }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.span.is_empty() {
            fmt::Display::fmt(&self.span, f)?;
        }
        write!(f, "Syntax Error: {}", self.reason)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::Source;

    #[test]
    fn error_display_has_location_and_reason() {
        let source = Source::source("x = \"Hello, world\" -> y + 1");
        let error = Syntax::error("unexpected token", &Span::new(&source, 4, 14));

        let result = format!("{}", error);
        assert!(result.contains("Line 1:5"));
        assert!(result.contains("Syntax Error: unexpected token"));
    }
}
