// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tokenizer and recursive-descent parser for content filter expressions.
//!
//! ```text
//! expr    := or
//! or      := and ( OR and )*
//! and     := unary ( AND unary )*
//! unary   := NOT unary | '(' or ')' | operand op operand
//! op      := = | == | <> | != | < | <= | > | >= | LIKE
//! operand := field | integer | float | 'string' | TRUE | FALSE | %n
//! ```

use super::FilterError;
use crate::config::MAX_FILTER_DEPTH;

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// SQL `LIKE` with `%` and `_` wildcards.
    Like,
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Field(String),
    Integer(i64),
    /// Integer literal above `i64::MAX`.
    Unsigned(u64),
    Float(f64),
    String(String),
    Boolean(bool),
    /// `%n` placeholder, resolved against the bound parameters.
    Parameter(usize),
}

/// Parsed predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Comparison {
        left: Value,
        op: Operator,
        right: Value,
    },
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    /// Number of positional parameters the expression expects
    /// (highest `%n` index + 1, or 0 when there are no placeholders).
    pub fn parameter_arity(&self) -> usize {
        let mut arity = 0;
        self.visit_values(&mut |value| {
            if let Value::Parameter(idx) = value {
                arity = arity.max(idx + 1);
            }
        });
        arity
    }

    /// Field names referenced by the expression, in order of appearance.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.visit_field_names(&mut names);
        names
    }

    fn visit_field_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expression::Comparison { left, right, .. } => {
                for value in [left, right] {
                    if let Value::Field(name) = value {
                        if !names.contains(&name.as_str()) {
                            names.push(name.as_str());
                        }
                    }
                }
            }
            Expression::And(l, r) | Expression::Or(l, r) => {
                l.visit_field_names(names);
                r.visit_field_names(names);
            }
            Expression::Not(inner) => inner.visit_field_names(names),
        }
    }

    fn visit_values(&self, f: &mut impl FnMut(&Value)) {
        match self {
            Expression::Comparison { left, right, .. } => {
                f(left);
                f(right);
            }
            Expression::And(l, r) | Expression::Or(l, r) => {
                l.visit_values(f);
                r.visit_values(f);
            }
            Expression::Not(inner) => inner.visit_values(f),
        }
    }
}

/// Lexical token plus the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
struct Token {
    offset: usize,
    kind: TokenKind,
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Literal(Value),
    Op(Operator),
    And,
    Or,
    Not,
    Open,
    Close,
}

impl Operator {
    /// Operator spelled by `first` (and optionally `second`), with the
    /// number of characters consumed.
    fn from_symbol(first: char, second: Option<char>) -> Option<(Operator, usize)> {
        match (first, second) {
            ('>', Some('=')) => Some((Operator::Ge, 2)),
            ('<', Some('=')) => Some((Operator::Le, 2)),
            ('<', Some('>')) | ('!', Some('=')) => Some((Operator::Ne, 2)),
            ('=', Some('=')) => Some((Operator::Eq, 2)),
            ('>', _) => Some((Operator::Gt, 1)),
            ('<', _) => Some((Operator::Lt, 1)),
            ('=', _) => Some((Operator::Eq, 1)),
            _ => None,
        }
    }
}

fn syntax_error(offset: usize, msg: impl std::fmt::Display) -> FilterError {
    FilterError::ParseError(format!("{} at offset {}", msg, offset))
}

/// Split `input` into tokens. Keywords are case-insensitive; identifiers may
/// contain dots to address nested members.
fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        let kind = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '(' | ')' => {
                chars.next();
                if ch == '(' {
                    TokenKind::Open
                } else {
                    TokenKind::Close
                }
            }
            '>' | '<' | '=' | '!' => {
                chars.next();
                let next = chars.peek().map(|&(_, c)| c);
                let (op, width) = Operator::from_symbol(ch, next)
                    .ok_or_else(|| syntax_error(offset, "expected '=' after '!'"))?;
                if width == 2 {
                    chars.next();
                }
                TokenKind::Op(op)
            }
            '%' => {
                chars.next();
                let digits = take_while(input, &mut chars, |c| c.is_ascii_digit());
                if digits.is_empty() {
                    return Err(syntax_error(offset, "expected digit after '%'"));
                }
                let index = digits
                    .parse()
                    .map_err(|_| syntax_error(offset, "parameter index too large"))?;
                TokenKind::Literal(Value::Parameter(index))
            }
            '\'' | '"' | '`' => {
                chars.next();
                let body = take_while(input, &mut chars, |c| c != ch);
                if chars.next().is_none() {
                    return Err(syntax_error(offset, "unterminated string"));
                }
                TokenKind::Literal(Value::String(body.to_string()))
            }
            c if c.is_ascii_digit() || (c == '-' && starts_digit(&input[offset + 1..])) => {
                chars.next();
                let rest = take_while(input, &mut chars, |c| c.is_ascii_digit() || c == '.');
                TokenKind::Literal(number(offset, &input[offset..offset + 1 + rest.len()])?)
            }
            c if c.is_alphabetic() || c == '_' => {
                let word = take_while(input, &mut chars, |c| {
                    c.is_alphanumeric() || c == '_' || c == '.'
                });
                keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()))
            }
            other => return Err(syntax_error(offset, format!("unexpected character '{}'", other))),
        };
        tokens.push(Token { offset, kind });
    }

    Ok(tokens)
}

/// Consume characters while `accept` holds and return the consumed slice.
fn take_while<'a>(
    input: &'a str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'a>>,
    accept: impl Fn(char) -> bool,
) -> &'a str {
    let start = chars.peek().map_or(input.len(), |&(i, _)| i);
    let mut end = start;
    while let Some(&(i, c)) = chars.peek() {
        if !accept(c) {
            break;
        }
        end = i + c.len_utf8();
        chars.next();
    }
    &input[start..end]
}

fn starts_digit(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit())
}

fn number(offset: usize, text: &str) -> Result<Value, FilterError> {
    let parsed = if text.contains('.') {
        text.parse().ok().map(Value::Float)
    } else {
        text.parse()
            .map(Value::Integer)
            .or_else(|_| text.parse().map(Value::Unsigned))
            .ok()
    };
    parsed.ok_or_else(|| syntax_error(offset, format!("invalid number '{}'", text)))
}

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word.to_ascii_uppercase().as_str() {
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        "NOT" => TokenKind::Not,
        "LIKE" => TokenKind::Op(Operator::Like),
        "TRUE" => TokenKind::Literal(Value::Boolean(true)),
        "FALSE" => TokenKind::Literal(Value::Boolean(false)),
        _ => return None,
    };
    Some(kind)
}

/// Recursive descent over the token list; precedence NOT > AND > OR.
///
/// Every rule returns the subtree with its height so a chain of AND/OR is
/// bounded as well as the recursion itself.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    nesting: usize,
}

type Parsed = (Expression, usize);

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|token| &token.kind)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |token| token.offset)
    }

    /// Consume the next token if it equals `kind`.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn bump(&mut self) -> Option<TokenKind> {
        let kind = self.tokens.get(self.pos).map(|token| token.kind.clone());
        self.pos += 1;
        kind
    }

    fn too_deep(&self, offset: usize, height: usize) -> Result<(), FilterError> {
        if height > MAX_FILTER_DEPTH || self.nesting > MAX_FILTER_DEPTH {
            return Err(syntax_error(offset, "expression nested too deeply"));
        }
        Ok(())
    }

    fn disjunction(&mut self) -> Result<Parsed, FilterError> {
        let (mut expr, mut height) = self.conjunction()?;
        while self.eat(&TokenKind::Or) {
            let offset = self.offset();
            let (rhs, rhs_height) = self.conjunction()?;
            height = height.max(rhs_height) + 1;
            self.too_deep(offset, height)?;
            expr = Expression::Or(Box::new(expr), Box::new(rhs));
        }
        Ok((expr, height))
    }

    fn conjunction(&mut self) -> Result<Parsed, FilterError> {
        let (mut expr, mut height) = self.unary()?;
        while self.eat(&TokenKind::And) {
            let offset = self.offset();
            let (rhs, rhs_height) = self.unary()?;
            height = height.max(rhs_height) + 1;
            self.too_deep(offset, height)?;
            expr = Expression::And(Box::new(expr), Box::new(rhs));
        }
        Ok((expr, height))
    }

    fn unary(&mut self) -> Result<Parsed, FilterError> {
        let offset = self.offset();
        if self.eat(&TokenKind::Not) {
            self.nesting += 1;
            self.too_deep(offset, 0)?;
            let (inner, height) = self.unary()?;
            self.nesting -= 1;
            self.too_deep(offset, height + 1)?;
            return Ok((Expression::Not(Box::new(inner)), height + 1));
        }
        if self.eat(&TokenKind::Open) {
            self.nesting += 1;
            self.too_deep(offset, 0)?;
            let inner = self.disjunction()?;
            self.nesting -= 1;
            if !self.eat(&TokenKind::Close) {
                return Err(syntax_error(self.offset(), "expected ')'"));
            }
            return Ok(inner);
        }
        Ok((self.comparison()?, 1))
    }

    fn comparison(&mut self) -> Result<Expression, FilterError> {
        let start = self.offset();
        let left = self.operand()?;
        let op = match self.bump() {
            Some(TokenKind::Op(op)) => op,
            other => {
                return Err(syntax_error(
                    start,
                    format!("expected comparison operator, found {:?}", other),
                ))
            }
        };
        let right = self.operand()?;

        if !matches!(left, Value::Field(_)) && !matches!(right, Value::Field(_)) {
            return Err(syntax_error(start, "comparison must reference a field"));
        }
        Ok(Expression::Comparison { left, op, right })
    }

    fn operand(&mut self) -> Result<Value, FilterError> {
        let offset = self.offset();
        match self.bump() {
            Some(TokenKind::Ident(name)) => Ok(Value::Field(name)),
            Some(TokenKind::Literal(value)) => Ok(value),
            other => Err(syntax_error(offset, format!("expected operand, found {:?}", other))),
        }
    }
}

/// Parse a filter expression string into an AST.
///
/// # Example
///
/// ```ignore
/// let expr = parse_expression("degrees > %0 OR degrees < %1")?;
/// assert_eq!(expr.parameter_arity(), 2);
/// ```
pub fn parse_expression(expression: &str) -> Result<Expression, FilterError> {
    if expression.trim().is_empty() {
        return Err(FilterError::EmptyExpression);
    }

    let mut parser = Parser {
        tokens: tokenize(expression)?,
        pos: 0,
        end: expression.len(),
        nesting: 0,
    };
    let (expr, _) = parser.disjunction()?;
    if parser.pos < parser.tokens.len() {
        return Err(syntax_error(parser.offset(), "unexpected trailing input"));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Expression {
        parse_expression(src).expect("expression should parse")
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(
            parse("degrees > 32"),
            Expression::Comparison {
                left: Value::Field("degrees".into()),
                op: Operator::Gt,
                right: Value::Integer(32),
            }
        );
        assert_eq!(
            parse("offset <= -4"),
            Expression::Comparison {
                left: Value::Field("offset".into()),
                op: Operator::Le,
                right: Value::Integer(-4),
            }
        );
    }

    #[test]
    fn test_literals() {
        assert!(matches!(
            parse("ratio >= 2.5"),
            Expression::Comparison { right: Value::Float(f), .. } if (f - 2.5).abs() < 1e-9
        ));
        assert!(matches!(
            parse("station = 'TEMPERING_CONTROLLER'"),
            Expression::Comparison { right: Value::String(ref s), .. } if s == "TEMPERING_CONTROLLER"
        ));
        assert!(matches!(
            parse("active = true"),
            Expression::Comparison { right: Value::Boolean(true), .. }
        ));
        assert!(matches!(
            parse("next_station = %0"),
            Expression::Comparison { right: Value::Parameter(0), .. }
        ));
        assert!(matches!(
            parse("position.x > 0"),
            Expression::Comparison { left: Value::Field(ref f), .. } if f == "position.x"
        ));
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert!(matches!(parse("a > %0 AND b < %1 OR c = 1"), Expression::Or(_, _)));
        assert!(matches!(parse("(a > 1 OR b < 2) AND c = 3"), Expression::And(_, _)));
        assert!(matches!(parse("not a > 1 and b > 2"), Expression::And(_, _)));
        assert!(matches!(parse("NOT (a > 1 and b > 2)"), Expression::Not(_)));
    }

    #[test]
    fn test_every_operator_spelling() {
        let cases = [
            ("x > 1", Operator::Gt),
            ("x < 1", Operator::Lt),
            ("x >= 1", Operator::Ge),
            ("x <= 1", Operator::Le),
            ("x = 1", Operator::Eq),
            ("x == 1", Operator::Eq),
            ("x <> 1", Operator::Ne),
            ("x != 1", Operator::Ne),
            ("x like 'a%'", Operator::Like),
        ];
        for (src, expected) in cases {
            assert!(
                matches!(parse(src), Expression::Comparison { op, .. } if op == expected),
                "{src}"
            );
        }
    }

    #[test]
    fn test_parameter_arity_and_fields() {
        assert_eq!(parse("x > 1").parameter_arity(), 0);
        assert_eq!(parse("x > %0 AND y < %1").parameter_arity(), 2);
        assert_eq!(parse("x = %3").parameter_arity(), 4);
        assert_eq!(parse("a > 1 AND (b = 'x' OR a < 9)").field_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_rejected_input() {
        assert!(matches!(
            parse_expression("   "),
            Err(FilterError::EmptyExpression)
        ));
        for src in [
            "@@invalid",
            "x >",
            "x",
            "x > 1 y",
            "(x > 1",
            "name = 'open",
            "1 = 1",
            "x > %",
            "x ! 1",
        ] {
            assert!(
                matches!(parse_expression(src), Err(FilterError::ParseError(_))),
                "{src}"
            );
        }

        let parens = format!("{}x = 1{}", "(".repeat(200_000), ")".repeat(200_000));
        let nots = format!("{}x = 1", "not ".repeat(200_000));
        let chain = vec!["x = 1"; 200_000].join(" and ");
        for src in [parens, nots, chain] {
            match parse_expression(&src) {
                Err(FilterError::ParseError(msg)) => {
                    assert!(msg.starts_with("expression nested too deeply at offset"), "{msg}")
                }
                other => panic!("deep expression should be rejected, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_nesting_within_limit() {
        let depth = MAX_FILTER_DEPTH - 1;
        let src = format!("{}x = 1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse(&src), parse("x = 1"));

        let chain = vec!["x = 1"; 100].join(" or ");
        assert_eq!(parse(&chain).field_names(), vec!["x"]);
    }

    #[test]
    fn test_integer_above_i64_range() {
        assert_eq!(
            parse("id = 18446744073709551615"),
            Expression::Comparison {
                left: Value::Field("id".into()),
                op: Operator::Eq,
                right: Value::Unsigned(u64::MAX),
            }
        );
        assert!(matches!(
            parse_expression("id = 18446744073709551616"),
            Err(FilterError::ParseError(_))
        ));
    }

    #[test]
    fn test_error_reports_offset() {
        let err = parse_expression("degrees > 1 ?").expect_err("stray character");
        assert_eq!(
            err,
            FilterError::ParseError("unexpected character '?' at offset 12".into())
        );
    }
}
