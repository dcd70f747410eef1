use std::{borrow::Cow, ops::Range};

use crate::error::CalcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
}

impl Op {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Op::Plus),
            '-' => Some(Op::Minus),
            '*' => Some(Op::Star),
            '/' => Some(Op::Slash),
            _ => None,
        }
    }

    /// `*` and `/` bind tighter than `+` and `-`.
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Op::Star | Op::Slash)
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Op::Plus => "+",
                Op::Minus => "-",
                Op::Star => "*",
                Op::Slash => "/",
            }
        )
    }
}

/// A lexical unit of a keypad expression.
///
/// A number literal is kept as text: its well-formedness is checked by the
/// parser, not here. When permissive lexing drops a character from the middle
/// of a number, the literal no longer matches a contiguous slice of the source
/// and is owned instead of borrowed.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    Number {
        literal: Cow<'a, str>,
        span: Range<usize>,
    },
    Operator {
        op: Op,
        offset: usize,
    },
}

impl<'a> Token<'a> {
    pub fn span(&self) -> Range<usize> {
        match self {
            Token::Number { span, .. } => span.clone(),
            Token::Operator { offset, .. } => *offset..*offset + 1,
        }
    }
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number { literal, .. } => write!(f, "{}", literal),
            Token::Operator { op, .. } => write!(f, "{}", op),
        }
    }
}

/// How the lexer treats characters that are neither digits, `.` nor operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexMode {
    /// Drop them silently, keypad style. `"1a2"` lexes as the number `12`.
    #[default]
    Permissive,
    /// Whitespace separates tokens; anything else is an error.
    Strict,
}

struct PendingNumber<'a> {
    literal: Cow<'a, str>,
    start: usize,
    end: usize,
}

impl<'a> PendingNumber<'a> {
    fn push(&mut self, source: &'a str, offset: usize, c: char) {
        let next = offset + c.len_utf8();
        if matches!(self.literal, Cow::Borrowed(_)) && self.end == offset {
            self.literal = Cow::Borrowed(&source[self.start..next]);
        } else {
            self.literal.to_mut().push(c);
        }
        self.end = next;
    }

    fn into_token(self) -> Token<'a> {
        Token::Number {
            literal: self.literal,
            span: self.start..self.end,
        }
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    rest: &'a str,
    byte: usize,
    mode: LexMode,
    queued: Option<Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_mode(input, LexMode::Permissive)
    }

    pub fn strict(input: &'a str) -> Self {
        Self::with_mode(input, LexMode::Strict)
    }

    pub fn with_mode(input: &'a str, mode: LexMode) -> Self {
        Self {
            source: input,
            rest: input,
            byte: 0,
            mode,
            queued: None,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, CalcError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.queued.take() {
            return Some(Ok(token));
        }

        let mut number: Option<PendingNumber<'a>> = None;

        loop {
            let mut chars = self.rest.chars();
            let Some(c) = chars.next() else {
                return number.map(|n| Ok(n.into_token()));
            };
            let offset = self.byte;
            self.rest = chars.as_str();
            self.byte += c.len_utf8();

            if c.is_ascii_digit() || c == '.' {
                match number.as_mut() {
                    Some(pending) => pending.push(self.source, offset, c),
                    None => {
                        number = Some(PendingNumber {
                            literal: Cow::Borrowed(&self.source[offset..self.byte]),
                            start: offset,
                            end: self.byte,
                        })
                    }
                }
                continue;
            }

            if let Some(op) = Op::from_char(c) {
                let operator = Token::Operator { op, offset };
                return match number {
                    Some(pending) => {
                        self.queued = Some(operator);
                        Some(Ok(pending.into_token()))
                    }
                    None => Some(Ok(operator)),
                };
            }

            match self.mode {
                LexMode::Permissive => continue,
                LexMode::Strict if c.is_whitespace() => {
                    if let Some(pending) = number.take() {
                        return Some(Ok(pending.into_token()));
                    }
                }
                LexMode::Strict => {
                    self.byte += self.rest.len();
                    self.rest = &self.rest[self.rest.len()..];

                    return Some(Err(CalcError::UnexpectedCharacter {
                        ch: c,
                        src: self.source.to_string(),
                        span: (offset, c.len_utf8()).into(),
                    }));
                }
            }
        }
    }
}

/// Splits `expression` into numbers and operators, silently dropping every
/// other character.
pub fn tokenize(expression: &str) -> Vec<Token<'_>> {
    // permissive lexing never yields an error
    Lexer::new(expression).filter_map(Result::ok).collect()
}

pub fn tokenize_strict(expression: &str) -> Result<Vec<Token<'_>>, CalcError> {
    Lexer::strict(expression).collect()
}
