use crate::ast::{BinaryOp, Call, Expr, Program, Stmt};
use crate::error::{ScriptError, Span};
use crate::lexer::{Token, TokenType};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    // How many function bodies enclose the cursor; `return` needs at least one.
    function_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            function_depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Program, ScriptError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            // A stray `end` at the top level closes nothing and is ignored.
            if self.match_types(&[TokenType::End]) {
                continue;
            }
            statements.push(self.statement()?);
        }

        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        let token = self.peek().clone();

        match token.token_type {
            TokenType::Let => {
                self.advance();
                self.let_statement()
            }
            TokenType::Print => {
                self.advance();
                let expr = self.expression()?;
                Ok(Stmt::Print {
                    span: self.span_from(token.span.start),
                    expr,
                })
            }
            TokenType::Input => {
                self.advance();
                let name = self
                    .consume_with_help(
                        TokenType::Identifier,
                        "Expected variable name after 'input'",
                        "Usage: input name".to_string(),
                    )?
                    .lexeme
                    .clone();
                Ok(Stmt::Input {
                    name,
                    span: self.span_from(token.span.start),
                })
            }
            TokenType::If => {
                self.advance();
                self.if_statement()
            }
            TokenType::While => {
                self.advance();
                self.while_statement()
            }
            TokenType::For => {
                self.advance();
                self.for_statement()
            }
            TokenType::Function => {
                self.advance();
                self.function_declaration()
            }
            TokenType::Return => {
                self.advance();
                self.return_statement(token.span)
            }
            TokenType::Identifier => match self.peek_next_type() {
                TokenType::LeftParen => {
                    self.advance();
                    let call = self.finish_call(token)?;
                    Ok(Stmt::Call {
                        span: call.span.clone(),
                        call,
                    })
                }
                TokenType::Equal => {
                    self.advance();
                    self.advance();
                    let value = self.expression()?;
                    Ok(Stmt::Assign {
                        name: token.lexeme,
                        value,
                        span: self.span_from(token.span.start),
                    })
                }
                _ => Err(self.invalid_statement(&token)),
            },
            _ => Err(self.invalid_statement(&token)),
        }
    }

    fn invalid_statement(&self, token: &Token) -> ScriptError {
        if token.token_type == TokenType::Eof {
            return ScriptError::syntax_error(
                token.span.clone(),
                "Unexpected end of input".to_string(),
            );
        }
        ScriptError::syntax_error_with_help(
            token.span.clone(),
            format!("Invalid statement: '{}'", token.lexeme),
            "Statements start with let, print, input, if, while, for, function, return, an assignment 'name = value' or a call 'name(...)'.".to_string(),
        )
    }

    fn let_statement(&mut self) -> Result<Stmt, ScriptError> {
        let start = self.previous().span.start;
        let name = self
            .consume_with_help(
                TokenType::Identifier,
                "Expected variable name after 'let'",
                "Declare variables with 'let name = value'.".to_string(),
            )?
            .lexeme
            .clone();
        self.consume_with_help(
            TokenType::Equal,
            "Expected '=' in variable declaration",
            "Declare variables with 'let name = value'.".to_string(),
        )?;
        let value = self.expression()?;

        Ok(Stmt::Let {
            name,
            value,
            span: self.span_from(start),
        })
    }

    fn if_statement(&mut self) -> Result<Stmt, ScriptError> {
        let start = self.previous().span.start;
        let condition = self.condition()?;

        let (then_branch, closer) = self.block("if", true)?;
        let else_branch = if closer == TokenType::Else {
            let (statements, _) = self.block("if", false)?;
            Some(statements)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: self.span_from(start),
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, ScriptError> {
        let start = self.previous().span.start;
        let condition = self.condition()?;
        let (body, _) = self.block("while", false)?;

        Ok(Stmt::While {
            condition,
            body,
            span: self.span_from(start),
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, ScriptError> {
        let start = self.previous().span.start;
        let variable = self
            .consume_with_help(
                TokenType::Identifier,
                "Expected an identifier after 'for'",
                "Usage: for item in list ... end".to_string(),
            )?
            .lexeme
            .clone();
        self.consume_with_help(
            TokenType::In,
            "Expected 'in' after the loop variable",
            "Usage: for item in list ... end".to_string(),
        )?;
        let iterable = self.condition()?;
        let (body, _) = self.block("for", false)?;

        Ok(Stmt::For {
            variable,
            iterable,
            body,
            span: self.span_from(start),
        })
    }

    fn function_declaration(&mut self) -> Result<Stmt, ScriptError> {
        let start = self.previous().span.start;
        let name = self
            .consume_with_help(
                TokenType::Identifier,
                "Expected function name after 'function'",
                "Usage: function name(a, b) ... end".to_string(),
            )?
            .lexeme
            .clone();
        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after function name",
            "Usage: function name(a, b) ... end".to_string(),
        )?;

        let mut params = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                let param = self.consume_with_help(
                    TokenType::Identifier,
                    "Invalid parameter list in function definition",
                    "Parameters must be identifiers separated by commas.".to_string(),
                )?;
                params.push(param.lexeme.clone());
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after parameters",
            "Parameters must be identifiers separated by commas.".to_string(),
        )?;

        self.function_depth += 1;
        let body = self.block("function", false);
        self.function_depth -= 1;
        let (body, _) = body?;

        Ok(Stmt::Function {
            name,
            params,
            body: body.into(),
            span: self.span_from(start),
        })
    }

    fn return_statement(&mut self, keyword: Span) -> Result<Stmt, ScriptError> {
        if self.function_depth == 0 {
            return Err(ScriptError::syntax_error_with_help(
                keyword,
                "'return' outside of a function".to_string(),
                "'return' may only appear inside a function body.".to_string(),
            ));
        }
        let value = self.expression()?;
        Ok(Stmt::Return {
            value,
            span: self.span_from(keyword.start),
        })
    }

    /// A condition is one full expression, optionally followed by `do`.
    fn condition(&mut self) -> Result<Expr, ScriptError> {
        let condition = self.expression()?;
        self.match_types(&[TokenType::Do]);
        Ok(condition)
    }

    /// Statements up to the closing `end` (or `else` when `allow_else`).
    /// Consumes the closer and reports which one it was.
    fn block(
        &mut self,
        construct: &str,
        allow_else: bool,
    ) -> Result<(Vec<Stmt>, TokenType), ScriptError> {
        let mut statements = Vec::new();

        loop {
            if self.match_types(&[TokenType::End]) {
                return Ok((statements, TokenType::End));
            }
            if allow_else && self.match_types(&[TokenType::Else]) {
                return Ok((statements, TokenType::Else));
            }
            if self.is_at_end() {
                return Err(ScriptError::syntax_error_with_help(
                    self.eof_span(),
                    format!("Expected 'end' to close '{}'", construct),
                    format!("Every '{}' block must be closed with 'end'.", construct),
                ));
            }
            statements.push(self.statement()?);
        }
    }

    fn expression(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.term()?;

        while let Some(operator) = binary_operator(self.peek().token_type) {
            let operator_token = self.advance().clone();

            if self.is_at_end() {
                return Err(ScriptError::syntax_error_with_help(
                    operator_token.span,
                    format!("Expected expression after '{}'", operator_token.lexeme),
                    "Operators require expressions on both sides.".to_string(),
                ));
            }

            let start = expr.span().start;
            let right = self.term()?;
            let end = right.span().end;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span: Span::new(start, end),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ScriptError> {
        if self.is_at_end() {
            return Err(ScriptError::syntax_error_with_help(
                self.eof_span(),
                "Unexpected end of input".to_string(),
                "Expected an expression here. Check for incomplete statements.".to_string(),
            ));
        }

        let token = self.advance().clone();

        match token.token_type {
            TokenType::Number => {
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    ScriptError::syntax_error(token.span.clone(), "Invalid integer".to_string())
                })?;
                Ok(Expr::Integer {
                    value,
                    span: token.span,
                })
            }
            TokenType::String => Ok(Expr::String {
                value: token.lexeme,
                span: token.span,
            }),
            TokenType::Identifier => {
                if self.check(&TokenType::LeftParen) {
                    Ok(Expr::Call(self.finish_call(token)?))
                } else {
                    Ok(Expr::Variable {
                        name: token.lexeme,
                        span: token.span,
                    })
                }
            }
            TokenType::LeftParen => {
                let expr = self.expression()?;
                let end_token = self.consume_with_help(
                    TokenType::RightParen,
                    "Expected ')' in expression",
                    "Every opening parenthesis '(' must have a matching closing parenthesis ')'."
                        .to_string(),
                )?;
                Ok(Expr::Grouping {
                    span: Span::new(token.span.start, end_token.span.end),
                    expr: Box::new(expr),
                })
            }
            TokenType::LeftBracket => self.list_literal(token.span),
            _ => Err(ScriptError::syntax_error_with_help(
                token.span,
                format!("Invalid expression: '{}'", token.lexeme),
                "Expected a number, string, list, variable, call or parenthesized expression here."
                    .to_string(),
            )),
        }
    }

    /// Parses `( args )` after a callee name already consumed.
    fn finish_call(&mut self, name: Token) -> Result<Call, ScriptError> {
        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after function name",
            "Calls look like name(arg1, arg2).".to_string(),
        )?;

        let mut args = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after arguments",
            "Function calls must be closed with ')' after the arguments. Example: func(arg1, arg2)"
                .to_string(),
        )?;

        Ok(Call {
            span: Span::new(name.span.start, paren.span.end),
            name: name.lexeme,
            args,
        })
    }

    fn list_literal(&mut self, start_span: Span) -> Result<Expr, ScriptError> {
        let mut elements = Vec::new();

        while !self.check(&TokenType::RightBracket) && !self.is_at_end() {
            elements.push(self.expression()?);
            if !self.match_types(&[TokenType::Comma]) {
                break;
            }
        }

        let end_token = self.consume_with_help(
            TokenType::RightBracket,
            "Unclosed list: expected ']'",
            "List literals must be closed with ']' after the opening '['. Example: [1, 2, 3]"
                .to_string(),
        )?;
        Ok(Expr::List {
            elements,
            span: Span::new(start_span.start, end_token.span.end),
        })
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.previous().span.end)
    }

    fn eof_span(&self) -> Span {
        if self.current > 0 {
            Span::single(self.previous().span.end)
        } else {
            self.peek().span.clone()
        }
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            &self.peek().token_type == token_type
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// One-token lookahead past the current token.
    fn peek_next_type(&self) -> TokenType {
        let index = (self.current + 1).min(self.tokens.len() - 1);
        self.tokens[index].token_type
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: String,
    ) -> Result<&Token, ScriptError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            let error_span = if self.is_at_end() {
                self.eof_span()
            } else {
                // Point to the current unexpected token
                self.peek().span.clone()
            };

            Err(ScriptError::syntax_error_with_help(
                error_span,
                message.to_string(),
                help,
            ))
        }
    }
}

/// Every operator token maps to one flat, left-associative level.
fn binary_operator(token_type: TokenType) -> Option<BinaryOp> {
    let operator = match token_type {
        TokenType::Plus => BinaryOp::Add,
        TokenType::Minus => BinaryOp::Subtract,
        TokenType::Star => BinaryOp::Multiply,
        TokenType::Slash => BinaryOp::Divide,
        TokenType::Caret => BinaryOp::Power,
        TokenType::EqualEqual => BinaryOp::Equal,
        TokenType::BangEqual => BinaryOp::NotEqual,
        TokenType::Less => BinaryOp::Less,
        TokenType::LessEqual => BinaryOp::LessEqual,
        TokenType::Greater => BinaryOp::Greater,
        TokenType::GreaterEqual => BinaryOp::GreaterEqual,
        TokenType::And => BinaryOp::And,
        TokenType::Or => BinaryOp::Or,
        TokenType::Not => BinaryOp::Not,
        _ => return None,
    };
    Some(operator)
}
