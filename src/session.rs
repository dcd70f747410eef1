use std::str::FromStr;

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::{
    error::CalcError,
    evaluator::evaluate_with,
    format::format_value,
    lexer::LexMode,
};

/// Shown on the display after a failed `=`.
pub const ERROR_MARKER: &str = "Error";

#[derive(Diagnostic, Debug, Error, PartialEq)]
#[error("unknown keypad command `{0}`")]
#[diagnostic(help(
    "try a digit, an operator, `=`, `C`, `X`, `MC`, `MR`, `M+`, `M-` or a function key"
))]
pub struct UnknownCommand(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Square,
    Reciprocal,
    Percent,
    Negate,
}

impl UnaryOp {
    /// Trigonometric keys take their operand in degrees.
    pub fn apply(self, x: f64) -> Result<f64, CalcError> {
        let value = match self {
            UnaryOp::Sin => x.to_radians().sin(),
            UnaryOp::Cos => x.to_radians().cos(),
            UnaryOp::Tan => x.to_radians().tan(),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Square => x.powi(2),
            UnaryOp::Reciprocal => {
                if x == 0.0 {
                    return Err(CalcError::ReciprocalOfZero);
                }
                1.0 / x
            }
            UnaryOp::Percent => x / 100.0,
            UnaryOp::Negate => -x,
        };

        finite(value)
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                UnaryOp::Sin => "sin",
                UnaryOp::Cos => "cos",
                UnaryOp::Tan => "tan",
                UnaryOp::Sqrt => "√",
                UnaryOp::Square => "x²",
                UnaryOp::Reciprocal => "1/x",
                UnaryOp::Percent => "%",
                UnaryOp::Negate => "±",
            }
        )
    }
}

/// One keypad press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// A digit, `.` or one of `+ - * /`.
    Input(char),
    Backspace,
    Clear,
    MemoryClear,
    MemoryRecall,
    MemoryAdd,
    MemorySubtract,
    Unary(UnaryOp),
    Equals,
}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let command = match s {
            "X" => Command::Backspace,
            "C" => Command::Clear,
            "MC" => Command::MemoryClear,
            "MR" => Command::MemoryRecall,
            "M+" => Command::MemoryAdd,
            "M-" => Command::MemorySubtract,
            "=" => Command::Equals,
            "sin" => Command::Unary(UnaryOp::Sin),
            "cos" => Command::Unary(UnaryOp::Cos),
            "tan" => Command::Unary(UnaryOp::Tan),
            "√" | "sqrt" => Command::Unary(UnaryOp::Sqrt),
            "x²" | "x^2" => Command::Unary(UnaryOp::Square),
            "1/x" => Command::Unary(UnaryOp::Reciprocal),
            "%" => Command::Unary(UnaryOp::Percent),
            "±" | "+/-" => Command::Unary(UnaryOp::Negate),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if is_input_key(c) => Command::Input(c),
                    _ => return Err(UnknownCommand(s.to_string())),
                }
            }
        };

        Ok(command)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Input(c) => write!(f, "{}", c),
            Command::Backspace => write!(f, "X"),
            Command::Clear => write!(f, "C"),
            Command::MemoryClear => write!(f, "MC"),
            Command::MemoryRecall => write!(f, "MR"),
            Command::MemoryAdd => write!(f, "M+"),
            Command::MemorySubtract => write!(f, "M-"),
            Command::Unary(op) => write!(f, "{}", op),
            Command::Equals => write!(f, "="),
        }
    }
}

/// The state a keypad front end keeps between presses: the pending
/// expression, the text on the display and the memory register.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    expression: String,
    display: String,
    memory: f64,
    mode: LexMode,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_mode(LexMode::Permissive)
    }

    pub fn with_mode(mode: LexMode) -> Self {
        Self {
            expression: String::new(),
            display: "0".to_string(),
            memory: 0.0,
            mode,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn memory(&self) -> f64 {
        self.memory
    }

    /// Replaces the pending expression with typed text, as a key listener on
    /// an editable display would.
    pub fn set_expression(&mut self, text: impl Into<String>) {
        self.expression = text.into();
        self.display = self.expression.clone();
    }

    /// Applies one keypad press.
    ///
    /// Every failure is returned. A failed `=` shows [`ERROR_MARKER`] and
    /// drops the pending expression; any other failed command leaves the
    /// session untouched.
    pub fn press(&mut self, command: Command) -> Result<(), CalcError> {
        debug!(%command, expression = %self.expression, "press");

        match command {
            Command::Input(c) => {
                if !is_input_key(c) {
                    return Err(CalcError::UnexpectedCharacter {
                        ch: c,
                        src: c.to_string(),
                        span: (0, c.len_utf8()).into(),
                    });
                }
                self.expression.push(c);
                self.display = self.expression.clone();
            }
            Command::Backspace => {
                if self.expression.pop().is_some() {
                    self.show_expression();
                }
            }
            Command::Clear => {
                self.expression.clear();
                self.display = "0".to_string();
            }
            Command::MemoryClear => self.memory = 0.0,
            Command::MemoryRecall => {
                self.expression.push_str(&format_value(self.memory));
                self.display = self.expression.clone();
            }
            Command::MemoryAdd => {
                let value = self.evaluate_current()?;
                self.memory = finite(self.memory + value)?;
            }
            Command::MemorySubtract => {
                let value = self.evaluate_current()?;
                self.memory = finite(self.memory - value)?;
            }
            Command::Unary(op) => {
                let value = op.apply(self.evaluate_current()?)?;
                self.show_value(value);
            }
            Command::Equals => match self.evaluate_current() {
                Ok(value) => self.show_value(value),
                Err(err) => {
                    self.display = ERROR_MARKER.to_string();
                    self.expression.clear();
                    return Err(err);
                }
            },
        }

        Ok(())
    }

    fn evaluate_current(&self) -> Result<f64, CalcError> {
        finite(evaluate_with(&self.expression, self.mode)?)
    }

    fn show_value(&mut self, value: f64) {
        self.expression = format_value(value);
        self.display = self.expression.clone();
    }

    fn show_expression(&mut self) {
        self.display = if self.expression.is_empty() {
            "0".to_string()
        } else {
            self.expression.clone()
        };
    }
}

/// Digits, `.` and the four operators are the only keys that type into the
/// expression.
fn is_input_key(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | '*' | '/')
}

fn finite(value: f64) -> Result<f64, CalcError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NonFiniteResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn press_all(session: &mut Session, labels: &[&str]) {
        for label in labels {
            let command: Command = label.parse().unwrap();
            let _ = session.press(command);
        }
    }

    #[test]
    fn test_initial_state() {
        let session = Session::new();
        assert_eq!(session.expression(), "");
        assert_eq!(session.display(), "0");
        assert_eq!(session.memory(), 0.0);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("7".parse::<Command>(), Ok(Command::Input('7')));
        assert_eq!("*".parse::<Command>(), Ok(Command::Input('*')));
        assert_eq!("M+".parse::<Command>(), Ok(Command::MemoryAdd));
        assert_eq!("x²".parse::<Command>(), Ok(Command::Unary(UnaryOp::Square)));
        assert_eq!("√".parse::<Command>(), Ok(Command::Unary(UnaryOp::Sqrt)));
        assert_eq!("±".parse::<Command>(), Ok(Command::Unary(UnaryOp::Negate)));
        assert_eq!(
            "log".parse::<Command>(),
            Err(UnknownCommand("log".to_string()))
        );
        assert!("a".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    #[test]
    fn test_label_display_round_trip() {
        let labels = [
            "MC", "MR", "M+", "M-", "C", "sin", "cos", "tan", "X", "±", "/", "%", "1/x", "x²", "=",
            "√", "0", ".",
        ];
        for label in labels {
            let command: Command = label.parse().unwrap();
            assert_eq!(command.to_string(), label);
        }
    }

    #[test]
    fn test_equals() {
        let mut session = Session::new();
        press_all(&mut session, &["2", "+", "3", "*", "4"]);
        assert_eq!(session.display(), "2+3*4");
        session.press(Command::Equals).unwrap();
        assert_eq!(session.display(), "14");
        assert_eq!(session.expression(), "14");
    }

    #[test]
    fn test_equals_failure_shows_error() {
        let mut session = Session::new();
        press_all(&mut session, &["5", "/", "0"]);
        let err = session.press(Command::Equals).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arithmetic);
        assert_eq!(session.display(), ERROR_MARKER);
        assert_eq!(session.expression(), "");

        press_all(&mut session, &["3", "="]);
        assert_eq!(session.display(), "3");
    }

    #[test]
    fn test_equals_on_empty() {
        let mut session = Session::new();
        session.press(Command::Equals).unwrap();
        assert_eq!(session.display(), "0");
    }

    #[test]
    fn test_backspace_and_clear() {
        let mut session = Session::new();
        press_all(&mut session, &["1", "2", "X"]);
        assert_eq!(session.display(), "1");
        press_all(&mut session, &["X"]);
        assert_eq!(session.display(), "0");
        assert_eq!(session.expression(), "");
        press_all(&mut session, &["X"]);
        assert_eq!(session.display(), "0");

        press_all(&mut session, &["9", "+", "C"]);
        assert_eq!(session.display(), "0");
        assert_eq!(session.expression(), "");
    }

    #[test]
    fn test_unary_ops() {
        let cases = [
            ("sin", "30", "0.5"),
            ("cos", "60", "0.5"),
            ("tan", "45", "1"),
            ("√", "16", "4"),
            ("x²", "1.5", "2.25"),
            ("1/x", "4", "0.25"),
            ("%", "50", "0.5"),
            ("±", "7", "-7"),
            ("sin", "180", "0"),
        ];

        for (label, input, expected) in cases {
            let mut session = Session::new();
            session.set_expression(input);
            press_all(&mut session, &[label]);
            assert_eq!(session.display(), expected, "{label} {input}");
            assert_eq!(session.expression(), expected);
        }
    }

    #[test]
    fn test_unary_uses_whole_expression() {
        let mut session = Session::new();
        press_all(&mut session, &["2", "+", "2", "x²"]);
        assert_eq!(session.display(), "16");
    }

    #[test]
    fn test_negated_result_evaluates_again() {
        let mut session = Session::new();
        press_all(&mut session, &["5", "±", "+", "3", "="]);
        assert_eq!(session.display(), "-2");
    }

    #[test]
    fn test_unary_failure_leaves_state() {
        let mut session = Session::new();
        session.set_expression("0");
        let err = session.press(Command::Unary(UnaryOp::Reciprocal)).unwrap_err();
        assert_eq!(err, CalcError::ReciprocalOfZero);
        assert_eq!(session.display(), "0");
        assert_eq!(session.expression(), "0");

        session.set_expression("4-5");
        let err = session.press(Command::Unary(UnaryOp::Sqrt)).unwrap_err();
        assert_eq!(err, CalcError::NonFiniteResult);
        assert_eq!(session.expression(), "4-5");

        session.set_expression("4-");
        let err = session.press(Command::Unary(UnaryOp::Sin)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(session.display(), "4-");
    }

    #[test]
    fn test_memory() {
        let mut session = Session::new();
        press_all(&mut session, &["2", "*", "3", "M+"]);
        assert_eq!(session.memory(), 6.0);
        assert_eq!(session.display(), "2*3");

        press_all(&mut session, &["C", "1", "M-"]);
        assert_eq!(session.memory(), 5.0);

        press_all(&mut session, &["+", "MR"]);
        assert_eq!(session.expression(), "1+5");
        press_all(&mut session, &["="]);
        assert_eq!(session.display(), "6");

        press_all(&mut session, &["MC"]);
        assert_eq!(session.memory(), 0.0);
    }

    #[test]
    fn test_memory_failure_leaves_state() {
        let mut session = Session::new();
        press_all(&mut session, &["4", "M+", "C", "1", "/", "0"]);
        assert!(session.press(Command::MemoryAdd).is_err());
        assert!(session.press(Command::MemorySubtract).is_err());
        assert_eq!(session.memory(), 4.0);
        assert_eq!(session.display(), "1/0");
    }

    #[test]
    fn test_memory_overflow_leaves_memory() {
        let mut session = Session::new();
        session.set_expression(format!("1{}", "0".repeat(308)));
        session.press(Command::MemoryAdd).unwrap();
        let before = session.memory();

        let err = session.press(Command::MemoryAdd).unwrap_err();
        assert_eq!(err, CalcError::NonFiniteResult);
        assert_eq!(session.memory(), before);

        session.set_expression(format!("-1{}", "0".repeat(308)));
        session.press(Command::MemoryClear).unwrap();
        session.press(Command::MemorySubtract).unwrap();
        assert!(session.press(Command::MemorySubtract).is_err());
        assert_eq!(session.memory(), before);

        press_all(&mut session, &["C", "MR", "="]);
        assert_eq!(session.display(), format_value(before));
    }

    #[test]
    fn test_input_rejects_other_characters() {
        let mut session = Session::new();
        session.press(Command::Input('7')).unwrap();

        let err = session.press(Command::Input('x')).unwrap_err();
        assert!(matches!(err, CalcError::UnexpectedCharacter { ch: 'x', .. }));
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(session.expression(), "7");
        assert_eq!(session.display(), "7");
    }

    #[test]
    fn test_memory_on_empty_expression() {
        let mut session = Session::new();
        session.press(Command::MemoryAdd).unwrap();
        assert_eq!(session.memory(), 0.0);
    }

    #[test]
    fn test_non_finite_equals() {
        let mut session = Session::new();
        session.set_expression(format!("1{}*10", "0".repeat(308)));
        let err = session.press(Command::Equals).unwrap_err();
        assert_eq!(err, CalcError::NonFiniteResult);
        assert_eq!(session.display(), ERROR_MARKER);
    }

    #[test]
    fn test_strict_session() {
        let mut session = Session::with_mode(LexMode::Strict);
        session.set_expression("2 x 3");
        assert!(matches!(
            session.press(Command::Equals),
            Err(CalcError::UnexpectedCharacter { .. })
        ));
        assert_eq!(session.display(), ERROR_MARKER);

        let mut session = Session::new();
        session.set_expression("2 x 3");
        session.press(Command::Equals).unwrap();
        assert_eq!(session.display(), "23");
    }
}
