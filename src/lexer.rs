use crate::error::{ScriptError, Span};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Punctuation
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,

    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,

    // Comparisons
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    EqualEqual,
    BangEqual,

    // Assignment
    Equal,

    // Literals
    Identifier,
    String,
    Number,

    // Logical operators
    And,
    Or,
    Not,

    // Keywords
    Let,
    Print,
    Input,
    If,
    Else,
    While,
    Do,
    For,
    In,
    Function,
    Return,
    End,

    // Special
    Eof,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            span,
        }
    }
}

/// Number of unconsumed characters quoted in an unknown-token error.
const ERROR_CONTEXT_CHARS: usize = 10;

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("and", TokenType::And);
        keywords.insert("do", TokenType::Do);
        keywords.insert("else", TokenType::Else);
        keywords.insert("end", TokenType::End);
        keywords.insert("for", TokenType::For);
        keywords.insert("function", TokenType::Function);
        keywords.insert("if", TokenType::If);
        keywords.insert("in", TokenType::In);
        keywords.insert("input", TokenType::Input);
        keywords.insert("let", TokenType::Let);
        keywords.insert("not", TokenType::Not);
        keywords.insert("or", TokenType::Or);
        keywords.insert("print", TokenType::Print);
        keywords.insert("return", TokenType::Return);
        keywords.insert("while", TokenType::While);

        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            keywords,
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, ScriptError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::single(self.current),
        ));

        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), ScriptError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '[' => self.add_token(TokenType::LeftBracket),
            ']' => self.add_token(TokenType::RightBracket),
            ',' => self.add_token(TokenType::Comma),
            '+' => self.add_token(TokenType::Plus),
            '-' => self.add_token(TokenType::Minus),
            '*' => self.add_token(TokenType::Star),
            '^' => self.add_token(TokenType::Caret),
            '/' => {
                if self.match_char('/') {
                    // Comment goes until end of line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::BangEqual);
                } else {
                    return Err(self.unknown_token());
                }
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            c if c.is_whitespace() => {}
            '"' | '\'' => self.string(c)?,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            _ => return Err(self.unknown_token()),
        }

        Ok(())
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        if !self.is_at_end() {
            self.current += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.source[start..end].iter().collect()
    }

    /// Error quoting the first unconsumed characters from the token start.
    fn unknown_token(&self) -> ScriptError {
        let end = (self.start + ERROR_CONTEXT_CHARS).min(self.source.len());
        let rest = self.text(self.start, end);
        ScriptError::lex_error_with_help(
            Span::new(self.start, end),
            format!("Unknown token: {}", rest),
            "Check the syntax of your code near this position.".to_string(),
        )
    }

    fn string(&mut self, quote: char) -> Result<(), ScriptError> {
        while self.peek() != quote && !self.is_at_end() {
            self.advance();
        }

        if self.is_at_end() {
            return Err(ScriptError::lex_error_with_help(
                Span::new(self.start, self.current),
                "Unterminated string".to_string(),
                format!("Close the string with a matching {} character.", quote),
            ));
        }

        // Consume the closing quote
        self.advance();

        let content = self.text(self.start + 1, self.current - 1);
        self.add_token_with_content(TokenType::String, content);
        Ok(())
    }

    fn number(&mut self) -> Result<(), ScriptError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A number must end on a word boundary: `12abc` is not a token.
        if self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            return Err(self.unknown_token());
        }

        let number_text = self.text(self.start, self.current);
        if number_text.parse::<i64>().is_err() {
            return Err(ScriptError::lex_error(
                Span::new(self.start, self.current),
                format!("Invalid integer: {}", number_text),
            ));
        }
        self.add_token_with_content(TokenType::Number, number_text);

        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.text(self.start, self.current);
        let token_type = self
            .keywords
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenType::Identifier);

        self.add_token_with_content(token_type, text);
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = self.text(self.start, self.current);
        self.add_token_with_content(token_type, text);
    }

    fn add_token_with_content(&mut self, token_type: TokenType, lexeme: String) {
        let token = Token::new(token_type, lexeme, Span::new(self.start, self.current));
        tracing::trace!(token_type = %token.token_type, lexeme = %token.lexeme, "token");
        self.tokens.push(token);
    }
}
