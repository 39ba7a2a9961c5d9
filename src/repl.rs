use crate::error::ScriptError;
use crate::evaluator::Evaluator;
use crate::session::Session;
use std::io::{self, Write};
use std::path::Path;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

/// A line typed at the editor prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Run,
    Save(String),
    Open(String),
    Undo,
    Redo,
    Clear,
    Delete,
    List,
    Exit,
    /// Anything else is a line of program text.
    Code(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let trimmed = line.trim();
        let lowered = trimmed.to_lowercase();

        match lowered.as_str() {
            "run" => return Command::Run,
            "undo" => return Command::Undo,
            "redo" => return Command::Redo,
            "clear" => return Command::Clear,
            "delete" => return Command::Delete,
            "list" => return Command::List,
            "exit" | "quit" => return Command::Exit,
            _ => {}
        }

        // File names keep their original case.
        if let Some((word, argument)) = trimmed.split_once(char::is_whitespace) {
            let argument = argument.trim().to_string();
            match word.to_lowercase().as_str() {
                "save" => return Command::Save(argument),
                "open" => return Command::Open(argument),
                _ => {}
            }
        }

        Command::Code(line.to_string())
    }
}

fn print_banner() {
    println!("endscript v{}", env!("CARGO_PKG_VERSION"));
    println!("Type code line by line, then 'run' to execute it. 'exit' quits.");
    println!("'save <file>' and 'open <file>' store and load the code buffer.");
    println!("'undo' and 'redo' take back or restore the last line; 'list' shows the buffer.");
    println!("'clear' clears the console; 'delete' discards all code.");
    println!();
}

/// Ask a question and read the answer; `None` on end of input.
fn prompt(question: &str) -> Option<String> {
    print!("{}", question);
    io::stdout().flush().ok()?;

    let mut answer = String::new();
    match io::stdin().read_line(&mut answer) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(answer.trim_end_matches(['\r', '\n']).to_string()),
    }
}

fn confirm(question: &str) -> bool {
    prompt(question).is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y"))
}

pub fn start() {
    print_banner();

    let mut session = Session::new();

    loop {
        let Some(line) = prompt("> ") else {
            // EOF reached (Ctrl+D or piped input ended)
            println!();
            break;
        };

        match Command::parse(&line) {
            Command::Exit => {
                println!("Goodbye!");
                break;
            }
            Command::Run => run_buffer(&mut session),
            Command::Save(file) => match session.save(Path::new(&file)) {
                Ok(()) => println!("Saved to {}.", file),
                Err(error) => eprintln!("Could not save {}: {}", file, error),
            },
            Command::Open(file) => match session.open(Path::new(&file)) {
                Ok(()) => {
                    println!("Opened {}.", file);
                    print!("{}", session.listing());
                }
                Err(error) => eprintln!("Could not open {}: {}", file, error),
            },
            Command::Undo => {
                if session.undo() {
                    println!("Undone.");
                } else {
                    println!("Nothing to undo.");
                }
            }
            Command::Redo => {
                if session.redo() {
                    println!("Redone.");
                } else {
                    println!("Nothing to redo.");
                }
            }
            Command::Clear => {
                print!("{}", CLEAR_SCREEN);
                print_banner();
            }
            Command::Delete => {
                if session.is_empty() {
                    println!("There is no code to delete.");
                } else {
                    session.delete_all();
                    println!("Code deleted.");
                }
            }
            Command::List => print!("{}", session.listing()),
            Command::Code(code) => session.push_line(&code),
        }
    }
}

/// Execute the whole buffer with a fresh evaluator.
fn run_buffer(session: &mut Session) {
    if session.is_empty() {
        println!("There is no code to run.");
        return;
    }

    let source = session.source();
    let mut evaluator = Evaluator::new();
    if let Err(error) = evaluator.run(&source) {
        handle_error(session, &source, &error);
    }
}

/// Show the error, then offer to fix the offending line and to export it.
fn handle_error(session: &mut Session, source: &str, error: &ScriptError) {
    if let Err(io_error) = error.report(source, None) {
        tracing::warn!(%io_error, "could not render diagnostic");
        eprintln!("{}", error);
    }

    let line_number = error.line_in(source);
    if let Some(line) = session.line(line_number) {
        println!("Error on line {}: {}", line_number, line);
    }
    println!("Suggestion: {}", error.suggestion());

    if confirm("Correct the line? (y/n): ") {
        if let Some(corrected) = prompt("Corrected line: ") {
            if session.replace_line(line_number, &corrected) {
                println!("Line {} replaced.", line_number);
            }
        }
    }

    if confirm("Export the error to a file? (y/n): ") {
        if let Some(file) = prompt("File name: ") {
            match session.export_error(Path::new(file.trim()), error) {
                Ok(()) => println!("Error exported to {}.", file.trim()),
                Err(io_error) => eprintln!("Could not write {}: {}", file.trim(), io_error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_editor_commands_case_insensitively() {
        assert_eq!(Command::parse("run"), Command::Run);
        assert_eq!(Command::parse("  RUN  "), Command::Run);
        assert_eq!(Command::parse("Undo"), Command::Undo);
        assert_eq!(Command::parse("redo"), Command::Redo);
        assert_eq!(Command::parse("clear"), Command::Clear);
        assert_eq!(Command::parse("delete"), Command::Delete);
        assert_eq!(Command::parse("list"), Command::List);
        assert_eq!(Command::parse("quit"), Command::Exit);
    }

    #[test]
    fn file_commands_keep_the_file_name() {
        assert_eq!(
            Command::parse("save Demo.es"),
            Command::Save("Demo.es".to_string())
        );
        assert_eq!(
            Command::parse("OPEN  dir/prog.es "),
            Command::Open("dir/prog.es".to_string())
        );
    }

    #[test]
    fn other_lines_are_code() {
        assert_eq!(
            Command::parse("let run = 1"),
            Command::Code("let run = 1".to_string())
        );
        assert_eq!(Command::parse("print x"), Command::Code("print x".to_string()));
    }
}
