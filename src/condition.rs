use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::value::{parse_literal, Value};

/// A row projection: column name to value, as handed to the evaluator.
pub type RowView<'a> = HashMap<&'a str, &'a Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Operand {
    Column(String),
    Literal(Value),
}

/// The parsed condition grammar (spec §4.5). Parsed once on command
/// construction; undo never re-parses the source text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Condition {
    Compare {
        left: Operand,
        op: Op,
        right: Operand,
    },
    IsNull {
        column: String,
        negated: bool,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

/// Kleene (three-valued) truth value: comparisons involving `Null` are
/// `Unknown`, which the top level treats as `false` but which AND/OR
/// propagate according to strong-Kleene rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tri {
    True,
    False,
    Unknown,
}

impl Tri {
    fn as_bool(self) -> bool {
        matches!(self, Tri::True)
    }

    fn not(self) -> Tri {
        match self {
            Tri::True => Tri::False,
            Tri::False => Tri::True,
            Tri::Unknown => Tri::Unknown,
        }
    }

    fn and(self, other: Tri) -> Tri {
        match (self, other) {
            (Tri::False, _) | (_, Tri::False) => Tri::False,
            (Tri::True, Tri::True) => Tri::True,
            _ => Tri::Unknown,
        }
    }

    fn or(self, other: Tri) -> Tri {
        match (self, other) {
            (Tri::True, _) | (_, Tri::True) => Tri::True,
            (Tri::False, Tri::False) => Tri::False,
            _ => Tri::Unknown,
        }
    }
}

impl Condition {
    /// Parse a condition expression (the grammar in spec §4.5).
    pub fn parse(text: &str) -> EngineResult<Condition> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, pos: 0 };
        let cond = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(EngineError::ParseError(format!(
                "unexpected trailing tokens in condition '{}'",
                text
            )));
        }
        Ok(cond)
    }

    /// Evaluate against a row projection. Top-level result coerces
    /// `Unknown` to `false`, per spec §4.5.
    pub fn eval(&self, row: &RowView) -> bool {
        self.eval_tri(row).as_bool()
    }

    fn eval_tri(&self, row: &RowView) -> Tri {
        match self {
            Condition::And(l, r) => l.eval_tri(row).and(r.eval_tri(row)),
            Condition::Or(l, r) => l.eval_tri(row).or(r.eval_tri(row)),
            Condition::Not(c) => c.eval_tri(row).not(),
            Condition::IsNull { column, negated } => {
                let value = row.get(column.as_str());
                let is_null = value.map(|v| v.is_null()).unwrap_or(true);
                Tri::from_bool(is_null != *negated)
            }
            Condition::Compare { left, op, right } => {
                let lv = resolve(left, row);
                let rv = resolve(right, row);
                match (lv, rv) {
                    (Some(a), Some(b)) => compare(a, *op, b),
                    _ => Tri::Unknown,
                }
            }
        }
    }
}

impl Tri {
    fn from_bool(b: bool) -> Tri {
        if b {
            Tri::True
        } else {
            Tri::False
        }
    }
}

fn resolve<'a>(operand: &'a Operand, row: &RowView<'a>) -> Option<&'a Value> {
    match operand {
        Operand::Column(name) => row.get(name.as_str()).copied(),
        Operand::Literal(v) => Some(v),
    }
}

fn compare(a: &Value, op: Op, b: &Value) -> Tri {
    if op == Op::Eq {
        if a.is_null() || b.is_null() {
            return Tri::from_bool(a.is_null() && b.is_null());
        }
        return Tri::from_bool(a == b);
    }
    if op == Op::NotEq {
        if a.is_null() || b.is_null() {
            return Tri::from_bool(!(a.is_null() && b.is_null()));
        }
        return Tri::from_bool(a != b);
    }
    if a.is_null() || b.is_null() {
        return Tri::Unknown;
    }

    match op {
        Op::Like => {
            if let (Value::String(s), Value::String(pattern)) = (a, b) {
                Tri::from_bool(like_match(s, pattern))
            } else {
                Tri::Unknown
            }
        }
        Op::Lt | Op::Lte | Op::Gt | Op::Gte => match a.partial_cmp_ordered(b) {
            Some(ordering) => {
                let result = match op {
                    Op::Lt => ordering.is_lt(),
                    Op::Lte => ordering.is_le(),
                    Op::Gt => ordering.is_gt(),
                    Op::Gte => ordering.is_ge(),
                    _ => unreachable!(),
                };
                Tri::from_bool(result)
            }
            None => Tri::Unknown,
        },
        Op::Eq | Op::NotEq => unreachable!("handled above"),
    }
}

fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    like_rec(&value, &pattern)
}

fn like_rec(value: &[char], pattern: &[char]) -> bool {
    match pattern.first() {
        None => value.is_empty(),
        Some('%') => like_rec(value, &pattern[1..]) || (!value.is_empty() && like_rec(&value[1..], pattern)),
        Some('_') => !value.is_empty() && like_rec(&value[1..], &pattern[1..]),
        Some(c) => value.first() == Some(c) && like_rec(&value[1..], &pattern[1..]),
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Literal(Value),
    Op(Op),
    Is,
    Not,
    And,
    Or,
    Null,
    LParen,
    RParen,
}

fn tokenize(text: &str) -> EngineResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let start = i;
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(EngineError::ParseError(format!(
                        "unterminated string literal in '{}'",
                        text
                    )));
                }
                i += 1;
                let lexeme: String = chars[start..i].iter().collect();
                tokens.push(Token::Literal(parse_literal(&lexeme)?));
            }
            '=' => {
                tokens.push(Token::Op(Op::Eq));
                i += 1;
            }
            '<' => {
                if chars.get(i + 1) == Some(&'>') {
                    tokens.push(Token::Op(Op::NotEq));
                    i += 2;
                } else if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Op(Op::Lte));
                    i += 2;
                } else {
                    tokens.push(Token::Op(Op::Lt));
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Op(Op::Gte));
                    i += 2;
                } else {
                    tokens.push(Token::Op(Op::Gt));
                    i += 1;
                }
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Op(Op::NotEq));
                i += 2;
            }
            _ => {
                let start = i;
                while i < chars.len()
                    && !chars[i].is_whitespace()
                    && !"()='\"<>!".contains(chars[i])
                {
                    i += 1;
                }
                if i == start {
                    return Err(EngineError::ParseError(format!(
                        "unexpected character '{}' in condition '{}'",
                        c, text
                    )));
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.to_uppercase().as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    "IS" => Token::Is,
                    "NULL" => Token::Null,
                    "LIKE" => Token::Op(Op::Like),
                    "TRUE" | "FALSE" => Token::Literal(parse_literal(&word)?),
                    _ => {
                        if word.parse::<i64>().is_ok() || (word.contains('.') && word.parse::<f64>().is_ok()) {
                            Token::Literal(parse_literal(&word)?)
                        } else {
                            Token::Ident(word)
                        }
                    }
                });
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn parse_or(&mut self) -> EngineResult<Condition> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let right = self.parse_and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> EngineResult<Condition> {
        let mut left = self.parse_not()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let right = self.parse_not()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> EngineResult<Condition> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Condition::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> EngineResult<Condition> {
        if matches!(self.peek(), Some(Token::LParen)) {
            self.advance();
            let inner = self.parse_or()?;
            match self.advance() {
                Some(Token::RParen) => return Ok(inner),
                _ => return Err(EngineError::ParseError("expected closing ')'".into())),
            }
        }

        let left_ident = match self.advance() {
            Some(Token::Ident(name)) => name,
            other => {
                return Err(EngineError::ParseError(format!(
                    "expected column name, got {:?}",
                    other
                )))
            }
        };

        if matches!(self.peek(), Some(Token::Is)) {
            self.advance();
            let negated = if matches!(self.peek(), Some(Token::Not)) {
                self.advance();
                true
            } else {
                false
            };
            match self.advance() {
                Some(Token::Null) => {
                    return Ok(Condition::IsNull {
                        column: left_ident,
                        negated,
                    })
                }
                other => {
                    return Err(EngineError::ParseError(format!(
                        "expected NULL after IS, got {:?}",
                        other
                    )))
                }
            }
        }

        let op = match self.advance() {
            Some(Token::Op(op)) => op,
            other => {
                return Err(EngineError::ParseError(format!(
                    "expected comparison operator, got {:?}",
                    other
                )))
            }
        };

        let right = match self.advance() {
            Some(Token::Ident(name)) => Operand::Column(name),
            Some(Token::Literal(v)) => Operand::Literal(v),
            other => {
                return Err(EngineError::ParseError(format!(
                    "expected column or literal, got {:?}",
                    other
                )))
            }
        };

        Ok(Condition::Compare {
            left: Operand::Column(left_ident),
            op,
            right,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row<'a>(pairs: &'a [(&'a str, Value)]) -> HashMap<&'a str, &'a Value> {
        pairs.iter().map(|(k, v)| (*k, v)).collect()
    }

    #[test]
    fn simple_comparison() {
        let cond = Condition::parse("age >= 18").unwrap();
        let age = Value::Integer(18);
        assert!(cond.eval(&row(&[("age", age)])));
    }

    #[test]
    fn and_or_precedence() {
        let cond = Condition::parse("age >= 18 AND name = 'Tom' OR active = true").unwrap();
        let pairs = [
            ("age", Value::Integer(10)),
            ("name", Value::String("Tom".into())),
            ("active", Value::Boolean(true)),
        ];
        assert!(cond.eval(&row(&pairs)));
    }

    #[test]
    fn is_null_and_is_not_null() {
        let pairs = [("x", Value::Null)];
        assert!(Condition::parse("x IS NULL").unwrap().eval(&row(&pairs)));
        assert!(!Condition::parse("x IS NOT NULL").unwrap().eval(&row(&pairs)));
    }

    #[test]
    fn comparisons_against_null_are_unknown_and_false_at_top_level() {
        let pairs = [("x", Value::Null)];
        assert!(!Condition::parse("x = 5").unwrap().eval(&row(&pairs)));
        assert!(!Condition::parse("x > 5").unwrap().eval(&row(&pairs)));
    }

    #[test]
    fn like_wildcards() {
        let pairs = [("name", Value::String("Alice".into()))];
        assert!(Condition::parse("name LIKE 'A%'").unwrap().eval(&row(&pairs)));
        assert!(Condition::parse("name LIKE 'Al_ce'").unwrap().eval(&row(&pairs)));
        assert!(!Condition::parse("name LIKE 'B%'").unwrap().eval(&row(&pairs)));
    }

    #[test]
    fn not_negates() {
        let pairs = [("age", Value::Integer(10))];
        assert!(Condition::parse("NOT age >= 18").unwrap().eval(&row(&pairs)));
    }

    #[test]
    fn parenthesized_grouping() {
        let pairs = [
            ("a", Value::Boolean(false)),
            ("b", Value::Boolean(true)),
            ("c", Value::Boolean(false)),
        ];
        let cond = Condition::parse("a = true OR (b = true AND c = false)").unwrap();
        assert!(cond.eval(&row(&pairs)));
    }
}
