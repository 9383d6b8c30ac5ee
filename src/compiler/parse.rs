//! Recursive-descent parser with precedence climbing for infix operators
//! (the Shunting-yard table, expressed the usual recursive-descent way).

use crate::common::lit::Lit;
use crate::common::span::{Span, Spanned};
use crate::compiler::syntax::Syntax;
use crate::construct::token::{Keyword, Token, Tokens};
use crate::construct::tree::{BinOp, Builtin, Expr, InterpPart, LogicOp, UnOp};

pub fn parse(tokens: Tokens) -> Result<Vec<Spanned<Expr>>, Syntax> {
    let mut parser = Parser { tokens, pos: 0 };
    let block = parser.block(&[])?;
    parser.expect_end()?;
    Ok(block)
}

struct Parser {
    tokens: Tokens,
    pos: usize,
}

/// Keywords that terminate a block when seen at the top of the statement
/// loop without being consumed.
const BLOCK_ENDERS: &[Keyword] = &[Keyword::End, Keyword::Else];

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.item)
    }

    fn peek_span(&self) -> Span {
        self.tokens.get(self.pos).map(|s| s.span.clone()).unwrap_or_else(Span::empty)
    }

    fn advance(&mut self) -> Option<Spanned<Token>> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek(), Some(Token::Keyword(k)) if *k == keyword)
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), Syntax> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(Syntax::error(&format!("expected keyword '{:?}'", keyword), &self.peek_span()))
        }
    }

    fn expect(&mut self, token: &Token) -> Result<Spanned<Token>, Syntax> {
        match self.peek() {
            Some(t) if t == token => Ok(self.advance().unwrap()),
            _ => Err(Syntax::error(&format!("expected {}", token), &self.peek_span())),
        }
    }

    fn expect_iden(&mut self) -> Result<String, Syntax> {
        match self.advance() {
            Some(Spanned { item: Token::Iden(name), .. }) => Ok(name),
            Some(other) => Err(Syntax::error(&format!("expected an identifier, found {}", other.item), &other.span)),
            None => Err(Syntax::error("expected an identifier, found end of input", &self.peek_span())),
        }
    }

    fn expect_end(&mut self) -> Result<(), Syntax> {
        if self.at_end() {
            Ok(())
        } else {
            Err(Syntax::error("expected end of input", &self.peek_span()))
        }
    }

    /// Parses statements until EOF or one of `enders` is seen (without
    /// consuming the ender).
    fn block(&mut self, enders: &[Keyword]) -> Result<Vec<Spanned<Expr>>, Syntax> {
        let mut statements = Vec::new();

        loop {
            if self.at_end() {
                break;
            }
            if let Some(Token::Keyword(k)) = self.peek() {
                if enders.contains(k) || BLOCK_ENDERS.contains(k) {
                    break;
                }
            }
            statements.push(self.statement()?);
        }

        Ok(statements)
    }

    fn statement(&mut self) -> Result<Spanned<Expr>, Syntax> {
        match self.peek() {
            Some(Token::Keyword(Keyword::If)) => self.if_statement(),
            Some(Token::Keyword(Keyword::While)) => self.while_statement(),
            Some(Token::Keyword(Keyword::For)) => self.for_statement(),
            Some(Token::Keyword(Keyword::Function)) => self.function_statement(),
            Some(Token::Keyword(Keyword::Return)) => self.return_statement(),
            Some(Token::Keyword(Keyword::Break)) => {
                let span = self.advance().unwrap().span;
                Ok(Spanned::new(Expr::Break, span))
            }
            Some(Token::Keyword(Keyword::Continue)) => {
                let span = self.advance().unwrap().span;
                Ok(Spanned::new(Expr::Continue, span))
            }
            _ => self.expression_statement(),
        }
    }

    fn if_statement(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let start = self.peek_span();
        self.expect_keyword(Keyword::If)?;
        let cond = Box::new(self.expr()?);
        self.expect_keyword(Keyword::Then)?;
        let then_block = self.block(&[])?;

        let else_block = if self.eat_keyword(Keyword::Else) {
            self.block(&[])?
        } else {
            Vec::new()
        };

        let end_span = self.peek_span();
        self.expect_keyword(Keyword::End)?;

        Ok(Spanned::new(Expr::If { cond, then_block, else_block }, Span::combine(&start, &end_span)))
    }

    fn while_statement(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let start = self.peek_span();
        self.expect_keyword(Keyword::While)?;
        let cond = Box::new(self.expr()?);
        self.expect_keyword(Keyword::Do)?;
        let body = self.block(&[])?;
        let end_span = self.peek_span();
        self.expect_keyword(Keyword::End)?;
        Ok(Spanned::new(Expr::While { cond, body }, Span::combine(&start, &end_span)))
    }

    fn for_statement(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let start = self.peek_span();
        self.expect_keyword(Keyword::For)?;
        let key = self.expect_iden()?;
        let value = if matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            Some(self.expect_iden()?)
        } else {
            None
        };
        self.expect_keyword(Keyword::In)?;
        let iter = Box::new(self.expr()?);
        self.expect_keyword(Keyword::Do)?;
        let body = self.block(&[])?;
        let end_span = self.peek_span();
        self.expect_keyword(Keyword::End)?;
        Ok(Spanned::new(Expr::For { key, value, iter, body }, Span::combine(&start, &end_span)))
    }

    fn function_statement(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let (expr, span) = self.function_literal()?;
        Ok(Spanned::new(expr, span))
    }

    /// Parses `function [name] ( params ) body end`, shared by a
    /// statement-position named function and an expression-position
    /// anonymous one.
    fn function_literal(&mut self) -> Result<(Expr, Span), Syntax> {
        let start = self.peek_span();
        self.expect_keyword(Keyword::Function)?;

        let name = if matches!(self.peek(), Some(Token::Iden(_))) {
            Some(self.expect_iden()?)
        } else {
            None
        };

        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if !matches!(self.peek(), Some(Token::RParen)) {
            loop {
                params.push(self.expect_iden()?);
                if matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;

        let body = self.block(&[])?;
        let end_span = self.peek_span();
        self.expect_keyword(Keyword::End)?;

        Ok((Expr::Function { name, params, body }, Span::combine(&start, &end_span)))
    }

    fn return_statement(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let start = self.peek_span();
        self.expect_keyword(Keyword::Return)?;

        if self.at_statement_boundary() {
            return Ok(Spanned::new(Expr::Return(Vec::new()), start));
        }

        let mut values = vec![self.expr()?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            values.push(self.expr()?);
        }
        let span = Span::combine(&start, &values.last().unwrap().span.clone());
        Ok(Spanned::new(Expr::Return(values), span))
    }

    fn at_statement_boundary(&self) -> bool {
        match self.peek() {
            None => true,
            Some(Token::Keyword(k)) => BLOCK_ENDERS.contains(k),
            _ => false,
        }
    }

    /// `name[, name...] = value[, value...]` or a bare expression
    /// statement (whose comma-continuation is greedy, per the MULTI
    /// statement-position rule).
    fn expression_statement(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let first = self.expr()?;

        if matches!(self.peek(), Some(Token::Comma)) || matches!(self.peek(), Some(Token::Assign)) {
            let mut targets = vec![first];
            while matches!(self.peek(), Some(Token::Comma)) {
                self.advance();
                targets.push(self.expr()?);
            }

            if matches!(self.peek(), Some(Token::Assign)) {
                self.advance();
                let mut values = vec![self.expr()?];
                while matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                    values.push(self.expr()?);
                }
                let span = Span::combine(&targets[0].span.clone(), &values.last().unwrap().span.clone());
                return Ok(Spanned::new(Expr::Assign(targets, values), span));
            }

            let span = Span::combine(&targets[0].span.clone(), &targets.last().unwrap().span.clone());
            return Ok(Spanned::new(Expr::Multi(targets), span));
        }

        Ok(first)
    }

    /// Entry point for a single value-producing expression (precedence
    /// climbing starts at the lowest tier, `or`).
    fn expr(&mut self) -> Result<Spanned<Expr>, Syntax> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let mut left = self.and_expr()?;
        while self.check_keyword(Keyword::Or) {
            self.advance();
            let right = self.and_expr()?;
            let span = Span::combine(&left.span, &right.span);
            left = Spanned::new(Expr::Logical(LogicOp::Or, Box::new(left), Box::new(right)), span);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let mut left = self.compare_expr()?;
        while self.check_keyword(Keyword::And) {
            self.advance();
            let right = self.compare_expr()?;
            let span = Span::combine(&left.span, &right.span);
            left = Spanned::new(Expr::Logical(LogicOp::And, Box::new(left), Box::new(right)), span);
        }
        Ok(left)
    }

    fn compare_expr(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let mut left = self.concat_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op(o)) => match o.as_str() {
                    "==" => BinOp::Eq,
                    "!=" => BinOp::Ne,
                    "<" => BinOp::Lt,
                    "<=" => BinOp::Le,
                    ">" => BinOp::Gt,
                    ">=" => BinOp::Ge,
                    "~" => BinOp::Match,
                    _ => break,
                },
                _ => break,
            };
            self.advance();
            let right = self.concat_expr()?;
            let span = Span::combine(&left.span, &right.span);
            left = Spanned::new(Expr::Binary(op, Box::new(left), Box::new(right)), span);
        }
        Ok(left)
    }

    fn concat_expr(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let mut left = self.additive_expr()?;
        while matches!(self.peek(), Some(Token::Op(o)) if o == "..") {
            self.advance();
            let right = self.additive_expr()?;
            let span = Span::combine(&left.span, &right.span);
            left = Spanned::new(Expr::Binary(BinOp::Concat, Box::new(left), Box::new(right)), span);
        }
        Ok(left)
    }

    fn additive_expr(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let mut left = self.multiplicative_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op(o)) if o == "+" => BinOp::Add,
                Some(Token::Op(o)) if o == "-" => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative_expr()?;
            let span = Span::combine(&left.span, &right.span);
            left = Spanned::new(Expr::Binary(op, Box::new(left), Box::new(right)), span);
        }
        Ok(left)
    }

    fn multiplicative_expr(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let mut left = self.unary_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op(o)) if o == "*" => BinOp::Mul,
                Some(Token::Op(o)) if o == "/" => BinOp::Div,
                Some(Token::Op(o)) if o == "%" => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.unary_expr()?;
            let span = Span::combine(&left.span, &right.span);
            left = Spanned::new(Expr::Binary(op, Box::new(left), Box::new(right)), span);
        }
        Ok(left)
    }

    fn unary_expr(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let start = self.peek_span();
        if self.check_keyword(Keyword::Not) {
            self.advance();
            let operand = self.unary_expr()?;
            let span = Span::combine(&start, &operand.span);
            return Ok(Spanned::new(Expr::Unary(UnOp::Not, Box::new(operand)), span));
        }
        if matches!(self.peek(), Some(Token::Op(o)) if o == "-") {
            self.advance();
            let operand = self.unary_expr()?;
            let span = Span::combine(&start, &operand.span);
            return Ok(Spanned::new(Expr::Unary(UnOp::Neg, Box::new(operand)), span));
        }
        if matches!(self.peek(), Some(Token::Op(o)) if o == "#") {
            self.advance();
            let operand = self.unary_expr()?;
            let span = Span::combine(&start, &operand.span);
            return Ok(Spanned::new(Expr::Unary(UnOp::Count, Box::new(operand)), span));
        }
        self.postfix_expr()
    }

    /// Parses a primary expression followed by any run of `.name`,
    /// `[index]`, `(args)`, `:name(args)` suffixes.
    fn postfix_expr(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let mut expr = self.primary_expr()?;

        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    let name = self.expect_iden()?;
                    let span = Span::combine(&expr.span, &self.tokens[self.pos - 1].span);
                    expr = Spanned::new(Expr::Field(Box::new(expr), name), span);
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.expr()?;
                    let end = self.expect(&Token::RBracket)?;
                    let span = Span::combine(&expr.span, &end.span);
                    expr = Spanned::new(Expr::Index(Box::new(expr), Box::new(index)), span);
                }
                Some(Token::LParen) => {
                    let (args, end_span) = self.call_args()?;
                    let span = Span::combine(&expr.span, &end_span);
                    expr = Spanned::new(self.apply_call(expr.item, args), span);
                }
                Some(Token::Colon) => {
                    self.advance();
                    let name = self.expect_iden()?;
                    let (args, end_span) = self.call_args()?;
                    let span = Span::combine(&expr.span, &end_span);
                    expr = Spanned::new(Expr::MethodCall(Box::new(expr), name, args), span);
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Builds a call node out of a parsed callee, recognizing the handful
    /// of builtin names that lower straight to a dedicated opcode.
    fn apply_call(&self, callee: Expr, args: Vec<Spanned<Expr>>) -> Expr {
        if let Expr::Name(name) = &callee {
            if let Some(builtin) = Builtin::from_name(name) {
                return Expr::Builtin(builtin, args);
            }
        }
        Expr::Call(Box::new(Spanned::new(callee, Span::empty())), args)
    }

    fn call_args(&mut self) -> Result<(Vec<Spanned<Expr>>, Span), Syntax> {
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if !matches!(self.peek(), Some(Token::RParen)) {
            loop {
                args.push(self.expr()?);
                if matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(&Token::RParen)?;
        Ok((args, end.span))
    }

    fn primary_expr(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let start_span = self.peek_span();

        match self.peek().cloned() {
            Some(Token::Lit(Lit::String(text))) => {
                self.advance();
                Ok(Spanned::new(interpolate(&text, &start_span)?, start_span))
            }
            Some(Token::Lit(lit)) => {
                self.advance();
                Ok(Spanned::new(Expr::Literal(lit), start_span))
            }
            Some(Token::Iden(name)) => {
                self.advance();
                Ok(Spanned::new(Expr::Name(name), start_span))
            }
            Some(Token::Keyword(Keyword::Global)) => {
                self.advance();
                Ok(Spanned::new(Expr::Global, start_span))
            }
            Some(Token::Keyword(Keyword::Local)) => {
                self.advance();
                Ok(Spanned::new(Expr::Local, start_span))
            }
            Some(Token::Keyword(Keyword::Function)) => {
                let (expr, span) = self.function_literal()?;
                Ok(Spanned::new(expr, span))
            }
            Some(Token::Keyword(Keyword::Coroutine)) => {
                self.advance();
                let (args, end) = self.call_args()?;
                Ok(Spanned::new(Expr::Builtin(Builtin::Coroutine, args), Span::combine(&start_span, &end)))
            }
            Some(Token::Keyword(Keyword::Resume)) => {
                self.advance();
                let (args, end) = self.call_args()?;
                Ok(Spanned::new(Expr::Builtin(Builtin::Resume, args), Span::combine(&start_span, &end)))
            }
            Some(Token::Keyword(Keyword::Yield)) => {
                self.advance();
                let (args, end) = self.call_args()?;
                Ok(Spanned::new(Expr::Builtin(Builtin::Yield, args), Span::combine(&start_span, &end)))
            }
            Some(Token::LParen) => {
                self.advance();
                let mut values = vec![self.expr()?];
                while matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                    values.push(self.expr()?);
                }
                let end = self.expect(&Token::RParen)?;
                let span = Span::combine(&start_span, &end.span);
                if values.len() == 1 {
                    Ok(values.into_iter().next().unwrap())
                } else {
                    Ok(Spanned::new(Expr::Multi(values), span))
                }
            }
            Some(Token::LBracket) => self.vec_literal(),
            Some(Token::LBrace) => self.map_literal(),
            Some(other) => Err(Syntax::error(&format!("unexpected {}", other), &start_span)),
            None => Err(Syntax::error("unexpected end of input", &start_span)),
        }
    }

    fn vec_literal(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let start = self.peek_span();
        self.expect(&Token::LBracket)?;
        let mut items = Vec::new();
        if !matches!(self.peek(), Some(Token::RBracket)) {
            loop {
                items.push(self.expr()?);
                if matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(&Token::RBracket)?;
        Ok(Spanned::new(Expr::Vec(items), Span::combine(&start, &end.span)))
    }

    fn map_literal(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let start = self.peek_span();
        self.expect(&Token::LBrace)?;
        let mut entries = Vec::new();
        if !matches!(self.peek(), Some(Token::RBrace)) {
            loop {
                let key_name = self.expect_iden()?;
                let key_span = self.tokens[self.pos - 1].span.clone();
                self.expect(&Token::Assign)?;
                let value = self.expr()?;
                entries.push((Spanned::new(Expr::Literal(Lit::String(key_name)), key_span), value));
                if matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(&Token::RBrace)?;
        Ok(Spanned::new(Expr::Map(entries), Span::combine(&start, &end.span)))
    }
}

/// Desugars `$name`/`${expr}` inside a double-quoted string into a list of
/// alternating literal and expression parts. The literal text has already
/// had its `\`-escapes resolved by the lexer; `$`/`{`/`}` survive as-is so
/// interpolation can still find them.
fn interpolate(text: &str, span: &Span) -> Result<Expr, Syntax> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '$' && i + 1 < chars.len() && chars[i + 1] == '{' {
            if !literal.is_empty() {
                parts.push(InterpPart::Str(std::mem::take(&mut literal)));
            }
            let mut depth = 1;
            let mut j = i + 2;
            while j < chars.len() && depth > 0 {
                match chars[j] {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
                if depth > 0 {
                    j += 1;
                }
            }
            let inner: String = chars[i + 2..j].iter().collect();
            let sub_tokens = crate::compiler::lex::lex(&crate::common::source::Source::source(&inner))?;
            let sub_expr = parse(sub_tokens)?;
            let expr = sub_expr
                .into_iter()
                .next()
                .ok_or_else(|| Syntax::error("empty interpolation expression", span))?;
            parts.push(InterpPart::Expr(expr));
            i = j + 1;
        } else if chars[i] == '$' && i + 1 < chars.len() && (chars[i + 1].is_alphabetic() || chars[i + 1] == '_') {
            if !literal.is_empty() {
                parts.push(InterpPart::Str(std::mem::take(&mut literal)));
            }
            let mut j = i + 1;
            while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            let name: String = chars[i + 1..j].iter().collect();
            parts.push(InterpPart::Expr(Spanned::new(Expr::Name(name), span.clone())));
            i = j;
        } else {
            literal.push(chars[i]);
            i += 1;
        }
    }

    if !literal.is_empty() || parts.is_empty() {
        parts.push(InterpPart::Str(literal));
    }

    if parts.len() == 1 {
        if let InterpPart::Str(s) = &parts[0] {
            return Ok(Expr::Literal(Lit::String(s.clone())));
        }
    }

    Ok(Expr::Interpolated(parts))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compiler::lex::lex;
    use crate::common::source::Source;

    fn parse_str(text: &str) -> Vec<Spanned<Expr>> {
        let source = Source::source(text);
        let tokens = lex(&source).unwrap();
        parse(tokens).unwrap()
    }

    #[test]
    fn simple_assignment() {
        let block = parse_str("x = 1 + 2");
        assert_eq!(block.len(), 1);
        match &block[0].item {
            Expr::Assign(targets, values) => {
                assert_eq!(targets.len(), 1);
                assert_eq!(values.len(), 1);
            }
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn precedence_mul_before_add() {
        let block = parse_str("1 + 2 * 3");
        match &block[0].item {
            Expr::Binary(BinOp::Add, _, right) => match &right.item {
                Expr::Binary(BinOp::Mul, _, _) => {}
                other => panic!("expected nested Mul, got {:?}", other),
            },
            other => panic!("expected Add at top, got {:?}", other),
        }
    }

    #[test]
    fn function_definition_and_call() {
        let block = parse_str("function f(x) return x*x end print(f(5))");
        assert_eq!(block.len(), 2);
        assert!(matches!(&block[0].item, Expr::Function { name: Some(n), .. } if n == "f"));
        assert!(matches!(&block[1].item, Expr::Builtin(Builtin::Print, _)));
    }

    #[test]
    fn for_loop_with_two_bindings() {
        let block = parse_str("for k,v in t do print(k,v) end");
        match &block[0].item {
            Expr::For { key, value, .. } => {
                assert_eq!(key, "k");
                assert_eq!(value.as_deref(), Some("v"));
            }
            other => panic!("expected For, got {:?}", other),
        }
    }

    #[test]
    fn string_interpolation_desugars() {
        let block = parse_str("print(\"hi $name\")");
        match &block[0].item {
            Expr::Builtin(Builtin::Print, args) => match &args[0].item {
                Expr::Interpolated(parts) => assert_eq!(parts.len(), 2),
                other => panic!("expected Interpolated, got {:?}", other),
            },
            other => panic!("expected print call, got {:?}", other),
        }
    }

    #[test]
    fn coroutine_yield_resume_keywords() {
        let block = parse_str("c = coroutine(function() yield(1) end)");
        match &block[0].item {
            Expr::Assign(_, values) => {
                assert!(matches!(&values[0].item, Expr::Builtin(Builtin::Coroutine, _)));
            }
            other => panic!("expected Assign, got {:?}", other),
        }
    }
}
