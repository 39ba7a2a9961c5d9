// endscript interpreter library
//
// Scanner, parser and tree-walking evaluator for a small `end`-delimited
// scripting language, plus the interactive editor shell around them.

pub mod ast;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod io;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod session;
pub mod value;

use std::sync::Once;

pub use ast::{Expr, Program, Stmt};
pub use environment::{Environment, FunctionTable};
pub use error::{ErrorKind, ScriptError, Span};
pub use evaluator::Evaluator;
pub use io::{InputHandler, OutputHandler};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::Parser;
pub use session::Session;
pub use value::Value;

pub use repl::start as start_repl;
pub use runner::run;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber once, and only when `RUST_LOG` is set.
///
/// `RUST_LOG=endscript=trace` shows every scanned token;
/// `RUST_LOG=endscript=debug` shows function declarations and calls.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
