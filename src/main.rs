use calcpad::*;
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, WrapErr};
use std::io::{self, BufRead, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the tokens of an expression
    Tokenize {
        expression: String,
        #[command(flatten)]
        lex: LexArgs,
    },
    /// Evaluate an expression and print the displayed result
    Eval {
        expression: String,
        #[command(flatten)]
        lex: LexArgs,
    },
    /// Drive a keypad session from stdin, one key label per line
    Keypad {
        #[command(flatten)]
        lex: LexArgs,
    },
}

#[derive(Args, Debug)]
struct LexArgs {
    /// Reject characters other than digits, `.`, operators and whitespace
    #[arg(long)]
    strict: bool,
}

impl LexArgs {
    fn mode(&self) -> LexMode {
        if self.strict {
            LexMode::Strict
        } else {
            LexMode::Permissive
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Tokenize { expression, lex } => {
            for token in Lexer::with_mode(&expression, lex.mode()) {
                println!("{:?}", token?);
            }
        }
        Commands::Eval { expression, lex } => {
            let value = evaluate_with(&expression, lex.mode())?;
            println!("{}", format_value(value));
        }
        Commands::Keypad { lex } => run_keypad(Session::with_mode(lex.mode()))?,
    }

    Ok(())
}

/// Lines are keypad labels (`7`, `+`, `=`, `sin`, `M+`, ...). A line starting
/// with `:` replaces the expression with the typed text that follows.
fn run_keypad(mut session: Session) -> miette::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("{}", session.display());
    loop {
        print!("calc> ");
        io::stdout().flush().into_diagnostic()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.into_diagnostic().wrap_err("reading stdin failed")?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }

        if let Some(typed) = input.strip_prefix(':') {
            session.set_expression(typed);
        } else {
            let command = match input.parse::<Command>() {
                Ok(command) => command,
                Err(err) => {
                    eprintln!("{:?}", miette::Report::new(err));
                    continue;
                }
            };

            // only a failed `=` is surfaced, through the display
            if let Err(err) = session.press(command) {
                debug!(%command, error = %err, "command failed");
            }
        }

        println!("{}", session.display());
    }

    Ok(())
}
