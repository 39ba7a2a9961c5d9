use crate::error::ScriptError;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// Run a whole script against stdin/stdout, reporting any error to stderr.
pub fn run(source: &str, filename: Option<&str>) -> Result<(), ScriptError> {
    // Lexical analysis
    let tokens = Lexer::new(source)
        .scan_tokens()
        .inspect_err(|error| report(error, source, filename))?;

    // Parsing
    let program = Parser::new(tokens)
        .parse()
        .inspect_err(|error| report(error, source, filename))?;

    // Evaluation
    let mut evaluator = Evaluator::new();
    evaluator
        .evaluate_program(&program)
        .inspect_err(|error| report(error, source, filename))
}

fn report(error: &ScriptError, source: &str, filename: Option<&str>) {
    if let Err(io_error) = error.report(source, filename) {
        tracing::warn!(%io_error, "could not render diagnostic");
        eprintln!("{}", error);
    }
}
