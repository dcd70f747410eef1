pub mod error;
pub mod evaluator;
pub mod format;
pub mod lexer;
pub mod parser;
pub mod session;

pub use error::{CalcError, ErrorKind};
pub use evaluator::{evaluate, evaluate_with};
pub use format::format_value;
pub use lexer::{tokenize, tokenize_strict, LexMode, Lexer, Op, Token};
pub use session::{Command, Session, UnaryOp};
