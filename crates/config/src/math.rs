//! Restricted arithmetic for `@math` directives.
//!
//! The parser can only build number literals, unary `+`/`-` and the binary
//! operators `+ - * /`. Everything else (names, calls, collections, strings,
//! comparison, bitwise or boolean operators) is rejected while parsing, so
//! no other kind of node exists to be evaluated.
//!
//! `+`, `-` and `*` stay integral when both operands are integers; `/` is
//! true division and always produces a float.
//!
//! Literals are decimal only. Integers are written without leading zeros
//! (`0`, `42`), floats as `3.14`, `.5`, `5.` or `1e3`. Digit separators and
//! hex, octal or binary prefixes are syntax errors. A `-` directly before an
//! integer is part of the literal, so `-9223372036854775808` is accepted.

use logos::Logos;

use crate::{
    error::{ArithmeticError, MathError, ResolveError},
    token::{Keyword, after_keyword},
};

/// Maximum nesting of parentheses and unary operators.
pub const MAX_DEPTH: usize = 64;

/// Maximum number of nodes in one expression tree.
pub const MAX_NODES: usize = 512;

/// Operators that only ever appear in prefix position.
const UNARY_ONLY: &[&str] = &["~", "!"];

/// Word operators recognised so they can be rejected by name.
const WORD_OPERATORS: &[&str] = &["and", "or", "in", "is"];

/// A numeric value, keeping integer vs float from the lexical form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Self::Int(i) => i == 0,
            Self::Float(f) => f == 0.0,
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) if v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<Number> for serde_json::Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(i) => Self::from(i),
            // Evaluation only produces finite floats, so this never maps to null.
            Number::Float(f) => Self::from(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl UnaryOp {
    fn apply(self, operand: Number) -> Result<Number, ArithmeticError> {
        match (self, operand) {
            (Self::Plus, n) => Ok(n),
            (Self::Minus, Number::Int(i)) => i
                .checked_neg()
                .map(Number::Int)
                .ok_or(ArithmeticError::Overflow),
            (Self::Minus, Number::Float(f)) => Ok(Number::Float(-f)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn apply(self, lhs: Number, rhs: Number) -> Result<Number, ArithmeticError> {
        match self {
            Self::Add => arith(lhs, rhs, i64::checked_add, |a, b| a + b),
            Self::Sub => arith(lhs, rhs, i64::checked_sub, |a, b| a - b),
            Self::Mul => arith(lhs, rhs, i64::checked_mul, |a, b| a * b),
            Self::Div if rhs.is_zero() => Err(ArithmeticError::DivisionByZero),
            Self::Div => finite(lhs.as_f64() / rhs.as_f64()),
        }
    }
}

fn arith(
    lhs: Number,
    rhs: Number,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Number, ArithmeticError> {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => {
            int(a, b).map(Number::Int).ok_or(ArithmeticError::Overflow)
        },
        _ => finite(float(lhs.as_f64(), rhs.as_f64())),
    }
}

fn finite(value: f64) -> Result<Number, ArithmeticError> {
    if value.is_finite() {
        Ok(Number::Float(value))
    } else {
        Err(ArithmeticError::NonFinite)
    }
}

/// Expression tree for an `@math` directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Number),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse `input` into an expression tree.
    pub fn parse(input: &str) -> Result<Self, MathError> {
        let tokens = lex(input)?;
        let mut parser = Parser::new(&tokens);
        if parser.peek().lexeme == Lexeme::End {
            return Err(MathError::syntax("empty expression", 0));
        }
        let expr = parser.additive()?;
        match parser.peek().lexeme {
            Lexeme::End => Ok(expr),
            _ => Err(parser.unexpected()),
        }
    }

    pub fn eval(&self) -> Result<Number, ArithmeticError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Unary(op, operand) => op.apply(operand.eval()?),
            Self::Binary(op, lhs, rhs) => op.apply(lhs.eval()?, rhs.eval()?),
        }
    }
}

/// Parse and evaluate an arithmetic expression.
///
/// Runtime faults such as division by zero come back as
/// [`MathError::Evaluation`] carrying the expression and the cause.
pub fn eval_ast(expr: &str) -> Result<Number, MathError> {
    let ast = Expr::parse(expr)?;
    ast.eval().map_err(|source| MathError::Evaluation {
        expr: expr.to_string(),
        source,
    })
}

/// Evaluate an `@math EXPR` token.
///
/// A missing keyword is reported as is; every other failure is wrapped with
/// the original token.
pub fn resolve_math_token(token: &str) -> Result<Number, ResolveError> {
    let expr = after_keyword(token, Keyword::Math)
        .ok_or_else(|| ResolveError::missing_keyword(Keyword::Math.as_str(), token))?
        .trim();
    eval_ast(expr).map_err(|source| ResolveError::Math {
        token: token.to_string(),
        source,
    })
}

// ── Lexer ───────────────────────────────────────────────────────────────────

/// Why a stretch of input could not be turned into a token.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum LexError {
    #[default]
    Unrecognised,
    IntegerOutOfRange,
    LeadingZero,
    FloatOutOfRange,
}

fn int_literal(lex: &mut logos::Lexer<RawToken>) -> Result<u64, LexError> {
    let digits = lex.slice();
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(LexError::LeadingZero);
    }
    digits.parse().map_err(|_| LexError::IntegerOutOfRange)
}

fn float_literal(lex: &mut logos::Lexer<RawToken>) -> Result<f64, LexError> {
    lex.slice()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(LexError::FloatOutOfRange)
}

/// Raw token from logos. Operators outside the grammar get their own
/// variants so the parser can reject them by name.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[regex(r"[0-9]+", int_literal)]
    Int(u64),

    #[regex(r"([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?", float_literal)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", float_literal)]
    Float(f64),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    #[token("**")]
    Pow,
    #[token("//")]
    FloorDiv,
    #[token("%")]
    Percent,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("@")]
    At,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,

    #[token("[")]
    LBracket,
    #[token("{")]
    LBrace,
    #[token(",")]
    Comma,

    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    Str,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Name,
}

impl RawToken {
    fn into_lexeme(self, slice: &str) -> Lexeme {
        match self {
            Self::Int(n) => Lexeme::Int(n),
            Self::Float(v) => Lexeme::Float(v),
            Self::Plus => Lexeme::Plus,
            Self::Minus => Lexeme::Minus,
            Self::Star => Lexeme::Star,
            Self::Slash => Lexeme::Slash,
            Self::LParen => Lexeme::LParen,
            Self::RParen => Lexeme::RParen,
            Self::Pow => Lexeme::Operator("**"),
            Self::FloorDiv => Lexeme::Operator("//"),
            Self::Percent => Lexeme::Operator("%"),
            Self::Shl => Lexeme::Operator("<<"),
            Self::Shr => Lexeme::Operator(">>"),
            Self::Le => Lexeme::Operator("<="),
            Self::Ge => Lexeme::Operator(">="),
            Self::EqEq => Lexeme::Operator("=="),
            Self::NotEq => Lexeme::Operator("!="),
            Self::Lt => Lexeme::Operator("<"),
            Self::Gt => Lexeme::Operator(">"),
            Self::Amp => Lexeme::Operator("&"),
            Self::Pipe => Lexeme::Operator("|"),
            Self::Caret => Lexeme::Operator("^"),
            Self::At => Lexeme::Operator("@"),
            Self::Tilde => Lexeme::Operator("~"),
            Self::Bang => Lexeme::Operator("!"),
            Self::LBracket => Lexeme::LBracket,
            Self::LBrace => Lexeme::LBrace,
            Self::Comma => Lexeme::Comma,
            Self::Str => Lexeme::Str,
            Self::Name => Lexeme::Name(slice.to_string()),
        }
    }
}

/// Token as seen by the parser.
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    /// Unsigned magnitude; the sign comes from a preceding `-`.
    Int(u64),
    Float(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    /// Operator symbol with no place in the grammar.
    Operator(&'static str),
    Name(String),
    Str,
    LBracket,
    LBrace,
    Comma,
    Other(char),
    End,
}

impl std::fmt::Display for Lexeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "number {n}"),
            Self::Float(v) => write!(f, "number {}", Number::Float(*v)),
            Self::Plus => write!(f, "'+'"),
            Self::Minus => write!(f, "'-'"),
            Self::Star => write!(f, "'*'"),
            Self::Slash => write!(f, "'/'"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::Operator(op) => write!(f, "'{op}'"),
            Self::Name(name) => write!(f, "name '{name}'"),
            Self::Str => write!(f, "string literal"),
            Self::LBracket => write!(f, "'['"),
            Self::LBrace => write!(f, "'{{'"),
            Self::Comma => write!(f, "','"),
            Self::Other(c) => write!(f, "character '{c}'"),
            Self::End => write!(f, "end of expression"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Spanned {
    lexeme: Lexeme,
    offset: usize,
}

fn lex(input: &str) -> Result<Vec<Spanned>, MathError> {
    let mut tokens = Vec::new();

    for (result, span) in RawToken::lexer(input).spanned() {
        let offset = span.start;
        let slice = &input[span];
        let lexeme = match result {
            Ok(raw) => raw.into_lexeme(slice),
            Err(LexError::Unrecognised) => match slice.chars().next() {
                Some(c) => Lexeme::Other(c),
                None => continue,
            },
            Err(LexError::IntegerOutOfRange) => {
                return Err(MathError::syntax(
                    format!("integer literal out of range: {slice}"),
                    offset,
                ));
            },
            Err(LexError::LeadingZero) => {
                return Err(MathError::syntax(
                    format!("leading zeros are not allowed in integer literal '{slice}'"),
                    offset,
                ));
            },
            Err(LexError::FloatOutOfRange) => {
                return Err(MathError::syntax(
                    format!("float literal out of range: {slice}"),
                    offset,
                ));
            },
        };
        tokens.push(Spanned { lexeme, offset });
    }

    tokens.push(Spanned {
        lexeme: Lexeme::End,
        offset: input.len(),
    });
    Ok(tokens)
}

// ── Parser ──────────────────────────────────────────────────────────────────

/// Recursive-descent parser over the whitelisted grammar:
///
/// ```text
/// additive       := multiplicative (('+' | '-') multiplicative)*
/// multiplicative := unary (('*' | '/') unary)*
/// unary          := ('+' | '-') unary | atom
/// atom           := NUMBER | '(' additive ')'
/// ```
struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    depth: usize,
    nodes: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Spanned]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            nodes: 0,
        }
    }

    fn peek(&self) -> &'t Spanned {
        // `lex` always terminates the stream with `End`.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &'t Spanned {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn enter(&mut self) -> Result<(), MathError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(MathError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn node(&mut self, expr: Expr) -> Result<Expr, MathError> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(MathError::TooLarge { limit: MAX_NODES });
        }
        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expr, MathError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek().lexeme {
                Lexeme::Plus => BinaryOp::Add,
                Lexeme::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = self.node(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))?;
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, MathError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek().lexeme {
                Lexeme::Star => BinaryOp::Mul,
                Lexeme::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = self.node(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))?;
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, MathError> {
        let op = match &self.peek().lexeme {
            Lexeme::Plus => UnaryOp::Plus,
            Lexeme::Minus => UnaryOp::Minus,
            Lexeme::Operator(op) if UNARY_ONLY.contains(op) => {
                return Err(MathError::UnsupportedUnaryOperator {
                    op: (*op).to_string(),
                });
            },
            Lexeme::Name(name) if name == "not" => {
                return Err(MathError::UnsupportedUnaryOperator { op: name.clone() });
            },
            _ => return self.atom(),
        };
        let offset = self.peek().offset;
        self.advance();
        self.enter()?;
        let expr = match (op, &self.peek().lexeme) {
            // `-N` is one literal, which keeps `i64::MIN` reachable.
            (UnaryOp::Minus, Lexeme::Int(magnitude)) => {
                let magnitude = *magnitude;
                self.advance();
                let value = 0i64.checked_sub_unsigned(magnitude).ok_or_else(|| {
                    MathError::syntax(format!("integer literal out of range: -{magnitude}"), offset)
                })?;
                self.node(Expr::Number(Number::Int(value)))?
            },
            _ => {
                let operand = self.unary()?;
                self.node(Expr::Unary(op, Box::new(operand)))?
            },
        };
        self.leave();
        Ok(expr)
    }

    fn atom(&mut self) -> Result<Expr, MathError> {
        let token = self.peek();
        match &token.lexeme {
            Lexeme::Int(magnitude) => {
                self.advance();
                let value = i64::try_from(*magnitude).map_err(|_| {
                    MathError::syntax(
                        format!("integer literal out of range: {magnitude}"),
                        token.offset,
                    )
                })?;
                self.node(Expr::Number(Number::Int(value)))
            },
            Lexeme::Float(value) => {
                self.advance();
                self.node(Expr::Number(Number::Float(*value)))
            },
            Lexeme::LParen => {
                self.advance();
                self.enter()?;
                let inner = self.additive()?;
                self.leave();
                match self.peek().lexeme {
                    Lexeme::RParen => {
                        self.advance();
                        Ok(inner)
                    },
                    Lexeme::End => Err(MathError::syntax("unclosed '('", token.offset)),
                    _ => Err(self.unexpected()),
                }
            },
            Lexeme::LBracket => Err(MathError::unsupported_expression("list")),
            Lexeme::LBrace => Err(MathError::unsupported_expression("dict or set")),
            Lexeme::Str => Err(MathError::unsupported_expression("string literal")),
            Lexeme::Name(name) if self.peek_next().lexeme == Lexeme::LParen => Err(
                MathError::unsupported_expression(format!("function call '{name}()'")),
            ),
            Lexeme::Name(name) => Err(MathError::unsupported_expression(format!(
                "name '{name}'"
            ))),
            _ => Err(self.unexpected()),
        }
    }

    /// Error for a token the grammar has no place for at the current position.
    fn unexpected(&self) -> MathError {
        let token = self.peek();
        match &token.lexeme {
            Lexeme::Operator(op) if !UNARY_ONLY.contains(op) => {
                MathError::UnsupportedBinaryOperator {
                    op: (*op).to_string(),
                }
            },
            Lexeme::Name(name) if WORD_OPERATORS.contains(&name.as_str()) => {
                MathError::UnsupportedBinaryOperator { op: name.clone() }
            },
            Lexeme::Name(name) if name == "if" => {
                MathError::unsupported_expression("conditional expression")
            },
            Lexeme::Comma => MathError::unsupported_expression("tuple"),
            Lexeme::RParen => MathError::syntax("unmatched ')'", token.offset),
            other => MathError::syntax(format!("unexpected {other}"), token.offset),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("1 + 2 * (3 - 4)", Number::Int(-1))]
    #[case("1 + 2 * (3 - 4) / 5", Number::Float(0.6))]
    #[case("-3", Number::Int(-3))]
    #[case("-3.14", Number::Float(-3.14))]
    #[case("-10", Number::Int(-10))]
    #[case("10 + 2 * 3", Number::Int(16))]
    #[case("3 * 6", Number::Int(18))]
    #[case("21 * 2", Number::Int(42))]
    #[case("4 / 2", Number::Float(2.0))]
    #[case("7 - 2 - 1", Number::Int(4))]
    #[case("8 / 2 / 2", Number::Float(2.0))]
    #[case("+5", Number::Int(5))]
    #[case("--5", Number::Int(5))]
    #[case("-(2 + 3)", Number::Int(-5))]
    #[case("1.5 + 1", Number::Float(2.5))]
    #[case("2 * 0.5", Number::Float(1.0))]
    #[case(".5 + 5.", Number::Float(5.5))]
    #[case("1e3", Number::Float(1000.0))]
    #[case("2.5E-1 * 4", Number::Float(1.0))]
    #[case("  ((1))  ", Number::Int(1))]
    #[case("0", Number::Int(0))]
    #[case("0.25 * 4", Number::Float(1.0))]
    #[case("-9223372036854775808", Number::Int(i64::MIN))]
    #[case("9223372036854775807", Number::Int(i64::MAX))]
    #[case("-9223372036854775808 + 1", Number::Int(i64::MIN + 1))]
    fn evaluates_whitelisted_expressions(#[case] expr: &str, #[case] expected: Number) {
        assert_eq!(eval_ast(expr).unwrap(), expected);
    }

    #[rstest]
    #[case("1 << 2", "<<")]
    #[case("2 ** 3", "**")]
    #[case("7 % 2", "%")]
    #[case("7 // 2", "//")]
    #[case("1 < 2", "<")]
    #[case("1 == 1", "==")]
    #[case("1 & 3", "&")]
    #[case("1 and 2", "and")]
    #[case("(1 | 2)", "|")]
    fn rejects_binary_operators(#[case] expr: &str, #[case] op: &str) {
        match eval_ast(expr) {
            Err(MathError::UnsupportedBinaryOperator { op: got }) => assert_eq!(got, op),
            other => panic!("expected unsupported binary operator for {expr}, got {other:?}"),
        }
    }

    #[rstest]
    #[case("not 3", "not")]
    #[case("~3", "~")]
    #[case("-~3", "~")]
    fn rejects_unary_operators(#[case] expr: &str, #[case] op: &str) {
        match eval_ast(expr) {
            Err(MathError::UnsupportedUnaryOperator { op: got }) => assert_eq!(got, op),
            other => panic!("expected unsupported unary operator for {expr}, got {other:?}"),
        }
    }

    #[rstest]
    #[case("[1, 2, 3]", "list")]
    #[case("{1: 2}", "dict or set")]
    #[case("'text'", "string literal")]
    #[case("x + 1", "name 'x'")]
    #[case("__import__('os')", "function call '__import__()'")]
    #[case("(1, 2)", "tuple")]
    #[case("1 if 2 else 3", "conditional expression")]
    fn rejects_other_constructs(#[case] expr: &str, #[case] kind: &str) {
        match eval_ast(expr) {
            Err(MathError::UnsupportedExpression { kind: got }) => assert_eq!(got, kind),
            other => panic!("expected unsupported expression for {expr}, got {other:?}"),
        }
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("10 a 3")]
    #[case("1 +")]
    #[case("(1 + 2")]
    #[case("1 + 2)")]
    #[case("* 3")]
    #[case("1 2")]
    #[case("99999999999999999999")]
    #[case("1e999")]
    #[case("1 $ 2")]
    #[case("9223372036854775808")]
    #[case("-9223372036854775809")]
    #[case("007")]
    #[case("1_000")]
    #[case("0x10")]
    fn reports_syntax_errors(#[case] expr: &str) {
        assert!(
            matches!(eval_ast(expr), Err(MathError::Syntax { .. })),
            "expected syntax error for {expr:?}"
        );
    }

    #[test]
    fn division_by_zero_is_an_evaluation_error() {
        let err = eval_ast("1 / 0").unwrap_err();
        assert!(matches!(
            err,
            MathError::Evaluation {
                source: ArithmeticError::DivisionByZero,
                ..
            }
        ));
        assert!(
            err.to_string()
                .starts_with("failed to evaluate expression '1 / 0'")
        );
        assert!(matches!(
            eval_ast("1.0 / 0.0"),
            Err(MathError::Evaluation {
                source: ArithmeticError::DivisionByZero,
                ..
            })
        ));
    }

    #[test]
    fn integer_overflow_is_an_evaluation_error() {
        assert!(matches!(
            eval_ast("9223372036854775807 + 1"),
            Err(MathError::Evaluation {
                source: ArithmeticError::Overflow,
                ..
            })
        ));
    }

    #[test]
    fn non_finite_float_is_an_evaluation_error() {
        assert!(matches!(
            eval_ast("1e308 * 10"),
            Err(MathError::Evaluation {
                source: ArithmeticError::NonFinite,
                ..
            })
        ));
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let expr = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(matches!(
            eval_ast(&expr),
            Err(MathError::TooDeep { limit: MAX_DEPTH })
        ));

        let unary = format!("{}1", "-".repeat(MAX_DEPTH + 1));
        assert!(matches!(eval_ast(&unary), Err(MathError::TooDeep { .. })));
    }

    #[test]
    fn long_chains_are_bounded() {
        let expr = vec!["1"; MAX_NODES].join(" + ");
        assert!(matches!(
            eval_ast(&expr),
            Err(MathError::TooLarge { limit: MAX_NODES })
        ));

        let ok = vec!["1"; 100].join(" + ");
        assert_eq!(eval_ast(&ok).unwrap(), Number::Int(100));
    }

    #[test]
    fn precedence_builds_expected_tree() {
        let expr = Expr::parse("1 - 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Sub,
                Box::new(Expr::Number(Number::Int(1))),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(Expr::Number(Number::Int(2))),
                    Box::new(Expr::Number(Number::Int(3))),
                )),
            )
        );
    }

    #[rstest]
    #[case(Number::Int(18), "18")]
    #[case(Number::Float(0.6), "0.6")]
    #[case(Number::Float(2.0), "2.0")]
    #[case(Number::Float(-3.14), "-3.14")]
    fn displays_numbers(#[case] n: Number, #[case] expected: &str) {
        assert_eq!(n.to_string(), expected);
    }

    #[test]
    fn resolves_math_token() {
        assert_eq!(resolve_math_token("@math 10 + 2 * 3").unwrap(), Number::Int(16));
    }

    #[test]
    fn math_token_without_keyword() {
        let err = resolve_math_token("@mat 10 + 2 * 3").unwrap_err();
        assert!(matches!(err, ResolveError::MissingKeyword { keyword: "@math", .. }));
        assert!(err.to_string().starts_with("'@math' not found in token:"));
    }

    #[test]
    fn invalid_math_token_is_wrapped() {
        let err = resolve_math_token("@math 10 a 3").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Math {
                source: MathError::Syntax { .. },
                ..
            }
        ));
        assert!(
            err.to_string()
                .starts_with("Invalid @math expression: @math 10 a 3."),
            "{err}"
        );
    }

    #[test]
    fn numbers_convert_to_json() {
        assert_eq!(serde_json::Value::from(Number::Int(6)), serde_json::json!(6));
        assert_eq!(
            serde_json::Value::from(Number::Float(0.6)),
            serde_json::json!(0.6)
        );
    }
}
