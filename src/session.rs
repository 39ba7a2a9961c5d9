use crate::error::ScriptError;
use std::fs;
use std::io;
use std::path::Path;

/// The code buffer behind the interactive editor.
///
/// Lines accumulate until the user runs them. `undo` moves the newest line
/// onto a redo stack; typing a new line empties that stack.
#[derive(Debug, Default)]
pub struct Session {
    lines: Vec<String>,
    redo_stack: Vec<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
        self.redo_stack.clear();
    }

    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.lines.pop() {
            Some(line) => {
                self.redo_stack.push(line);
                true
            }
            None => false,
        }
    }

    /// Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(line) => {
                self.lines.push(line);
                true
            }
            None => false,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop the whole buffer along with the redo history.
    pub fn delete_all(&mut self) {
        self.lines.clear();
        self.redo_stack.clear();
    }

    /// The buffer as one program text.
    pub fn source(&self) -> String {
        self.lines.join("\n")
    }

    /// 1-based line access.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|index| self.lines.get(index))
            .map(String::as_str)
    }

    /// Replace 1-based line `number`. Returns false if it does not exist.
    pub fn replace_line(&mut self, number: usize, text: &str) -> bool {
        match number.checked_sub(1).and_then(|index| self.lines.get_mut(index)) {
            Some(line) => {
                *line = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Numbered listing, one line per entry.
    pub fn listing(&self) -> String {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}: {}\n", i + 1, line))
            .collect()
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.source())
    }

    /// Replace the buffer with the contents of `path`. On error the buffer
    /// is left untouched.
    pub fn open(&mut self, path: &Path) -> io::Result<()> {
        let content = fs::read_to_string(path)?;
        self.lines = content.lines().map(str::to_string).collect();
        self.redo_stack.clear();
        Ok(())
    }

    /// Write the error message followed by the numbered buffer.
    pub fn export_error(&self, path: &Path, error: &ScriptError) -> io::Result<()> {
        let report = format!("Error: {}\nCode:\n{}", error, self.listing());
        fs::write(path, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Span};
    use pretty_assertions::assert_eq;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("endscript-{}-{}", std::process::id(), name))
    }

    #[test]
    fn undo_and_redo_move_the_last_line() {
        let mut session = Session::new();
        session.push_line("let x = 1");
        session.push_line("print x");

        assert!(session.undo());
        assert_eq!(session.lines(), ["let x = 1"]);
        assert!(session.redo());
        assert_eq!(session.source(), "let x = 1\nprint x");
        assert!(!session.redo());
    }

    #[test]
    fn new_line_discards_redo_history() {
        let mut session = Session::new();
        session.push_line("print 1");
        session.undo();
        session.push_line("print 2");

        assert!(!session.redo());
        assert_eq!(session.lines(), ["print 2"]);
    }

    #[test]
    fn undo_on_empty_buffer_reports_nothing_to_do() {
        let mut session = Session::new();
        assert!(!session.undo());
        assert!(session.is_empty());
    }

    #[test]
    fn replace_line_is_one_based() {
        let mut session = Session::new();
        session.push_line("print y");
        session.push_line("print 2");

        assert!(session.replace_line(1, "print 1"));
        assert!(!session.replace_line(0, "nope"));
        assert!(!session.replace_line(3, "nope"));
        assert_eq!(session.line(1), Some("print 1"));
        assert_eq!(session.line(0), None);
    }

    #[test]
    fn delete_all_empties_the_buffer_and_redo_history() {
        let mut session = Session::new();
        session.push_line("print 1");
        session.push_line("print 2");
        assert!(session.undo());
        session.delete_all();
        assert!(session.is_empty());
        // An undone line cannot come back into a deleted buffer.
        assert!(!session.redo());
        assert!(session.is_empty());
    }

    #[test]
    fn save_then_open_restores_the_buffer() {
        let path = temp_path("roundtrip.es");
        let mut session = Session::new();
        session.push_line("let x = 2");
        session.push_line("print x * 3");
        session.save(&path).unwrap();

        let mut reopened = Session::new();
        reopened.push_line("stale");
        reopened.open(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(reopened.lines(), session.lines());
    }

    #[test]
    fn open_missing_file_keeps_buffer() {
        let mut session = Session::new();
        session.push_line("print 1");
        assert!(session.open(&temp_path("does-not-exist.es")).is_err());
        assert_eq!(session.lines(), ["print 1"]);
    }

    #[test]
    fn export_error_writes_message_and_numbered_code() {
        let path = temp_path("error.txt");
        let mut session = Session::new();
        session.push_line("let x = 1");
        session.push_line("print y");
        let error = ScriptError::new(
            ErrorKind::Name,
            Span::new(16, 17),
            "Undefined variable: 'y'".to_string(),
        );

        session.export_error(&path, &error).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(
            written,
            "Error: Name error: Undefined variable: 'y'\nCode:\n1: let x = 1\n2: print y\n"
        );
    }
}
