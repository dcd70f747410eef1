use std::ops::Range;

use crate::{
    error::CalcError,
    lexer::{LexMode, Lexer, Op, Token},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub value: f64,
    pub span: Range<usize>,
}

/// A validated keypad expression: `first (op operand)*`.
///
/// Numbers and operators strictly alternate, starting and ending with a
/// number, so a reducer can walk `rest` without re-checking shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub first: Operand,
    pub rest: Vec<(Op, Operand)>,
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.first.value)?;
        for (op, operand) in &self.rest {
            write!(f, " {} {}", op, operand.value)?;
        }
        Ok(())
    }
}

pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_mode(input, LexMode::Permissive)
    }

    pub fn with_mode(input: &'a str, mode: LexMode) -> Self {
        Self {
            source: input,
            lexer: Lexer::with_mode(input, mode),
        }
    }

    pub fn parse(&mut self) -> Result<Expression, CalcError> {
        let first = self.parse_first()?;
        let mut rest = vec![];

        while let Some((op, offset)) = self.parse_operator()? {
            let operand = self.parse_operand(offset)?;
            rest.push((op, operand));
        }

        Ok(Expression { first, rest })
    }

    /// The first operand may carry a single leading `-`, so that a negative
    /// result put back on the display can be evaluated again.
    fn parse_first(&mut self) -> Result<Operand, CalcError> {
        match self.lexer.next() {
            None => Err(CalcError::EmptyExpression),
            Some(Err(err)) => Err(err),
            Some(Ok(Token::Operator {
                op: Op::Minus,
                offset,
            })) => {
                let operand = self.parse_operand(offset)?;
                Ok(Operand {
                    value: -operand.value,
                    span: offset..operand.span.end,
                })
            }
            Some(Ok(token)) => self.number(token),
        }
    }

    fn parse_operand(&mut self, after: usize) -> Result<Operand, CalcError> {
        match self.lexer.next() {
            Some(Ok(token)) => self.number(token),
            Some(Err(err)) => Err(err),
            None => Err(CalcError::TrailingOperator {
                src: self.source.to_string(),
                span: (after, 1).into(),
            }),
        }
    }

    fn parse_operator(&mut self) -> Result<Option<(Op, usize)>, CalcError> {
        match self.lexer.next() {
            None => Ok(None),
            Some(Err(err)) => Err(err),
            Some(Ok(Token::Operator { op, offset })) => Ok(Some((op, offset))),
            Some(Ok(Token::Number { span, .. })) => Err(CalcError::ExpectedOperator {
                src: self.source.to_string(),
                span: span.into(),
            }),
        }
    }

    fn number(&self, token: Token<'a>) -> Result<Operand, CalcError> {
        match token {
            Token::Number { literal, span } => match literal.parse::<f64>() {
                Ok(value) => Ok(Operand { value, span }),
                Err(_) => Err(CalcError::InvalidNumber {
                    literal: literal.into_owned(),
                    src: self.source.to_string(),
                    span: span.into(),
                }),
            },
            Token::Operator { op, offset } => Err(CalcError::ExpectedNumber {
                found: op.to_string(),
                src: self.source.to_string(),
                span: (offset, 1).into(),
            }),
        }
    }
}
