//! Parses the textual form of a numeric literal into an integer or a float.
//! Mirrors the lexer's own rule: a literal parses as an `int` whenever it is
//! representable as one, falling back to `float` otherwise.

/// Parses a decimal or `0x`-prefixed integer/float literal.
/// Returns `None` if `text` is not a valid number in either form.
pub fn parse_number(text: &str) -> Option<Numeric> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(Numeric::Int);
    }

    if let Ok(i) = text.parse::<i64>() {
        return Some(Numeric::Int(i));
    }

    text.parse::<f64>().ok().map(Numeric::Float)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decimal_int() {
        assert_eq!(parse_number("42"), Some(Numeric::Int(42)));
    }

    #[test]
    fn hex_int() {
        assert_eq!(parse_number("0x2A"), Some(Numeric::Int(42)));
    }

    #[test]
    fn float() {
        assert_eq!(parse_number("3.14"), Some(Numeric::Float(3.14)));
    }

    #[test]
    fn invalid() {
        assert_eq!(parse_number("not_a_number"), None);
    }
}
