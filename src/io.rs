//! Output sink for `print` and line source for `input`.
//!
//! Each is bound either to the process stdio or to an in-memory buffer.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Where `print` output goes.
#[derive(Debug, Default)]
pub enum OutputHandler {
    /// Writes each line to stdout (default).
    #[default]
    Stdout,
    /// Captures lines in memory.
    Buffer(String),
}

impl OutputHandler {
    pub fn buffer() -> Self {
        OutputHandler::Buffer(String::new())
    }

    /// Emit one line.
    pub fn println(&mut self, msg: &str) {
        match self {
            OutputHandler::Stdout => println!("{msg}"),
            OutputHandler::Buffer(buf) => {
                buf.push_str(msg);
                buf.push('\n');
            }
        }
    }

    /// Everything captured so far. Always empty for stdout.
    pub fn output(&self) -> &str {
        match self {
            OutputHandler::Stdout => "",
            OutputHandler::Buffer(buf) => buf,
        }
    }
}

/// Where `input` reads its lines from.
#[derive(Debug, Default)]
pub enum InputHandler {
    /// Prompts on stdout and reads a line from stdin (default).
    #[default]
    Stdin,
    /// Replays a fixed list of lines.
    Scripted(VecDeque<String>),
}

impl InputHandler {
    pub fn scripted<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InputHandler::Scripted(lines.into_iter().map(Into::into).collect())
    }

    /// Next line without its terminator, or `None` once input is exhausted.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        match self {
            InputHandler::Stdin => {
                print!("input> ");
                io::stdout().flush()?;

                let mut line = String::new();
                if io::stdin().lock().read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
            }
            InputHandler::Scripted(lines) => Ok(lines.pop_front()),
        }
    }
}
