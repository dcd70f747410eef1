use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// The two families every [`CalcError`] falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input was well-formed but the arithmetic is undefined.
    Arithmetic,
    /// The input does not describe a valid expression.
    Malformed,
}

#[derive(Diagnostic, Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    #[error("division by zero")]
    #[diagnostic(code(calc::division_by_zero))]
    DivisionByZero {
        #[source_code]
        src: String,
        #[label("this divisor is zero")]
        span: SourceSpan,
    },

    #[error("reciprocal of zero")]
    #[diagnostic(code(calc::reciprocal_of_zero))]
    ReciprocalOfZero,

    #[error("result is not a finite number")]
    #[diagnostic(code(calc::non_finite))]
    NonFiniteResult,

    #[error("empty expression")]
    #[diagnostic(code(calc::empty))]
    EmptyExpression,

    #[error("expected a number, found `{found}`")]
    #[diagnostic(code(calc::expected_number))]
    ExpectedNumber {
        found: String,
        #[source_code]
        src: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("expected an operator between two numbers")]
    #[diagnostic(
        code(calc::expected_operator),
        help("strict input keeps numbers split on whitespace")
    )]
    ExpectedOperator {
        #[source_code]
        src: String,
        #[label("this number")]
        span: SourceSpan,
    },

    #[error("expression ends with an operator")]
    #[diagnostic(code(calc::trailing_operator))]
    TrailingOperator {
        #[source_code]
        src: String,
        #[label("nothing follows this")]
        span: SourceSpan,
    },

    #[error("invalid number `{literal}`")]
    #[diagnostic(code(calc::invalid_number))]
    InvalidNumber {
        literal: String,
        #[source_code]
        src: String,
        #[label("this numeric literal")]
        span: SourceSpan,
    },

    #[error("unexpected character `{ch}`")]
    #[diagnostic(code(calc::unexpected_character))]
    UnexpectedCharacter {
        ch: char,
        #[source_code]
        src: String,
        #[label("this input character")]
        span: SourceSpan,
    },
}

impl CalcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::DivisionByZero { .. }
            | CalcError::ReciprocalOfZero
            | CalcError::NonFiniteResult => ErrorKind::Arithmetic,
            CalcError::EmptyExpression
            | CalcError::ExpectedNumber { .. }
            | CalcError::ExpectedOperator { .. }
            | CalcError::TrailingOperator { .. }
            | CalcError::InvalidNumber { .. }
            | CalcError::UnexpectedCharacter { .. } => ErrorKind::Malformed,
        }
    }
}
