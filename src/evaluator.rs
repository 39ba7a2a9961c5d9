use crate::ast::{BinaryOp, Call, Expr, Program, Stmt};
use crate::environment::{Environment, Function, FunctionTable};
use crate::error::{ScriptError, Span};
use crate::io::{InputHandler, OutputHandler};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::Value;
use std::cmp::Ordering;
use std::rc::Rc;

/// How a frame finished.
enum Flow {
    Normal,
    Return(Value),
}

/// Runs programs.
///
/// Every frame (block, loop iteration, call) gets its own [`Environment`],
/// while the [`FunctionTable`] is the single instance held here and reached
/// from every frame through `&mut self`.
pub struct Evaluator {
    globals: Environment,
    functions: FunctionTable,
    output: OutputHandler,
    input: InputHandler,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// An evaluator bound to stdin and stdout.
    pub fn new() -> Self {
        Self::with_io(OutputHandler::Stdout, InputHandler::Stdin)
    }

    pub fn with_io(output: OutputHandler, input: InputHandler) -> Self {
        Self {
            globals: Environment::new(),
            functions: FunctionTable::new(),
            output,
            input,
        }
    }

    /// Scan, parse and execute `source` from a clean state.
    pub fn run(&mut self, source: &str) -> Result<(), ScriptError> {
        let tokens = Lexer::new(source).scan_tokens()?;
        let program = Parser::new(tokens).parse()?;
        self.evaluate_program(&program)
    }

    /// Execute a parsed program. Variables and functions left over from a
    /// previous program are discarded first.
    pub fn evaluate_program(&mut self, program: &Program) -> Result<(), ScriptError> {
        self.functions.clear();
        let mut environment = Environment::new();

        let result = self.execute_block(&program.statements, &mut environment);
        self.globals = environment;

        result.map(|_| ())
    }

    /// Top-level bindings as they stood when the last program stopped.
    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Captured `print` output; empty when writing to stdout.
    pub fn output(&self) -> &str {
        self.output.output()
    }

    fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: &mut Environment,
    ) -> Result<Flow, ScriptError> {
        for statement in statements {
            if let Flow::Return(value) = self.execute_statement(statement, environment)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    /// Run `statements` in a child frame seeded with `child`, then merge the
    /// child's bindings back into `environment`.
    fn execute_nested(
        &mut self,
        statements: &[Stmt],
        environment: &mut Environment,
        mut child: Environment,
    ) -> Result<Flow, ScriptError> {
        let flow = self.execute_block(statements, &mut child)?;
        environment.merge(child);
        Ok(flow)
    }

    fn execute_statement(
        &mut self,
        stmt: &Stmt,
        environment: &mut Environment,
    ) -> Result<Flow, ScriptError> {
        match stmt {
            Stmt::Let { name, value, .. } | Stmt::Assign { name, value, .. } => {
                let value = self.evaluate_expression(value, environment)?;
                environment.define(name, value);
            }
            Stmt::Print { expr, .. } => {
                let value = self.evaluate_expression(expr, environment)?;
                self.output.println(&value.to_string());
            }
            Stmt::Input { name, span } => {
                let value = self.read_integer(span)?;
                environment.define(name, Value::Int(value));
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let condition_value = self.evaluate_expression(condition, environment)?;
                let branch = if condition_value.is_truthy() {
                    Some(then_branch.as_slice())
                } else {
                    else_branch.as_deref()
                };

                if let Some(statements) = branch {
                    let seed = environment.snapshot();
                    return self.execute_nested(statements, environment, seed);
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                while self
                    .evaluate_expression(condition, environment)?
                    .is_truthy()
                {
                    let seed = environment.snapshot();
                    if let Flow::Return(value) = self.execute_nested(body, environment, seed)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Stmt::For {
                variable,
                iterable,
                body,
                ..
            } => {
                let items = match self.evaluate_expression(iterable, environment)? {
                    Value::List(items) => items,
                    other => {
                        return Err(ScriptError::type_error_with_help(
                            iterable.span().clone(),
                            format!("'for' needs a list to iterate over, got {}", other.type_name()),
                            "Iterate over a list literal or a variable holding a list. Example: for x in [1, 2, 3] ... end".to_string(),
                        ));
                    }
                };

                for item in items {
                    let mut seed = environment.snapshot();
                    seed.define(variable, item);
                    if let Flow::Return(value) = self.execute_nested(body, environment, seed)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Stmt::Function {
                name, params, body, ..
            } => {
                tracing::debug!(function = %name, arity = params.len(), "declare function");
                self.functions.declare(Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                });
            }
            Stmt::Call { call, .. } => {
                self.call_function(call, environment)?;
            }
            Stmt::Return { value, .. } => {
                let value = self.evaluate_expression(value, environment)?;
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn read_integer(&mut self, span: &Span) -> Result<i64, ScriptError> {
        let help = "Enter a whole number such as 42 or -7.".to_string();

        let line = self.input.read_line().map_err(|error| {
            ScriptError::input_error_with_help(
                span.clone(),
                format!("Could not read input: {}", error),
                help.clone(),
            )
        })?;

        let Some(line) = line else {
            return Err(ScriptError::input_error_with_help(
                span.clone(),
                "Invalid input: no more input available".to_string(),
                help,
            ));
        };

        line.trim().parse::<i64>().map_err(|_| {
            ScriptError::input_error_with_help(
                span.clone(),
                "Invalid input: expected an integer".to_string(),
                help,
            )
        })
    }

    fn call_function(&mut self, call: &Call, environment: &Environment) -> Result<Value, ScriptError> {
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.evaluate_expression(arg, environment)?);
        }

        let function = self.functions.get(&call.name).ok_or_else(|| {
            ScriptError::name_error_with_help(
                call.span.clone(),
                format!("Undefined function: '{}'", call.name),
                "Declare the function with 'function name(...) ... end' before calling it."
                    .to_string(),
            )
        })?;

        if args.len() != function.params.len() {
            return Err(ScriptError::syntax_error_with_help(
                call.span.clone(),
                format!(
                    "Wrong number of arguments for '{}': expected {}, got {}",
                    call.name,
                    function.params.len(),
                    args.len()
                ),
                "Pass exactly one argument per declared parameter.".to_string(),
            ));
        }

        tracing::debug!(function = %call.name, args = args.len(), "call function");

        // The callee sees its parameters only, never the caller's locals.
        let mut frame = Environment::new();
        for (param, arg) in function.params.iter().zip(args) {
            frame.define(param, arg);
        }

        match self.execute_block(&function.body, &mut frame)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }

    pub fn evaluate_expression(
        &mut self,
        expr: &Expr,
        environment: &Environment,
    ) -> Result<Value, ScriptError> {
        match expr {
            Expr::Integer { value, .. } => Ok(Value::Int(*value)),
            Expr::String { value, .. } => Ok(Value::String(value.clone())),
            Expr::Variable { name, span } => environment.get(name).cloned().ok_or_else(|| {
                ScriptError::name_error_with_help(
                    span.clone(),
                    format!("Undefined variable: '{}'", name),
                    "Check that the variable was declared before it is used.".to_string(),
                )
            }),
            Expr::List { elements, .. } => {
                let mut list_values = Vec::with_capacity(elements.len());
                for element in elements {
                    list_values.push(self.evaluate_expression(element, environment)?);
                }
                Ok(Value::List(list_values))
            }
            Expr::Grouping { expr, .. } => self.evaluate_expression(expr, environment),
            Expr::Call(call) => self.call_function(call, environment),
            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => {
                // Both sides are always evaluated; there is no short-circuit.
                let left_val = self.evaluate_expression(left, environment)?;
                let right_val = self.evaluate_expression(right, environment)?;
                evaluate_binary_op(*operator, left_val, right_val, span)
            }
        }
    }
}

fn evaluate_binary_op(
    operator: BinaryOp,
    left: Value,
    right: Value,
    span: &Span,
) -> Result<Value, ScriptError> {
    match operator {
        BinaryOp::Add => match (left, right) {
            (Value::List(mut l), Value::List(r)) => {
                l.extend(r);
                Ok(Value::List(l))
            }
            (Value::List(mut l), r) => {
                l.push(r);
                Ok(Value::List(l))
            }
            (l, Value::List(r)) => {
                let mut list = Vec::with_capacity(r.len() + 1);
                list.push(l);
                list.extend(r);
                Ok(Value::List(list))
            }
            (Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
            (l, r) => arithmetic(operator, l, r, span, i64::checked_add, |a, b| a + b),
        },
        BinaryOp::Subtract => arithmetic(operator, left, right, span, i64::checked_sub, |a, b| a - b),
        BinaryOp::Multiply => arithmetic(operator, left, right, span, i64::checked_mul, |a, b| a * b),
        BinaryOp::Divide => match (as_number(&left), as_number(&right)) {
            (Some(_), Some(r)) if r == 0.0 => Err(division_by_zero(span)),
            (Some(l), Some(r)) => Ok(Value::Double(l / r)),
            _ => Err(incompatible(operator, &left, &right, span)),
        },
        BinaryOp::Power => power(left, right, span),
        BinaryOp::Equal => Ok(Value::Bool(is_equal(&left, &right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!is_equal(&left, &right))),
        BinaryOp::Less => {
            let ordering = compare(&left, &right, operator, span)?;
            Ok(Value::Bool(ordering == Some(Ordering::Less)))
        }
        BinaryOp::LessEqual => {
            let ordering = compare(&left, &right, operator, span)?;
            Ok(Value::Bool(matches!(
                ordering,
                Some(Ordering::Less | Ordering::Equal)
            )))
        }
        BinaryOp::Greater => {
            let ordering = compare(&left, &right, operator, span)?;
            Ok(Value::Bool(ordering == Some(Ordering::Greater)))
        }
        BinaryOp::GreaterEqual => {
            let ordering = compare(&left, &right, operator, span)?;
            Ok(Value::Bool(matches!(
                ordering,
                Some(Ordering::Greater | Ordering::Equal)
            )))
        }
        BinaryOp::And => Ok(if left.is_truthy() { right } else { left }),
        BinaryOp::Or => Ok(if left.is_truthy() { left } else { right }),
        BinaryOp::Not => Ok(Value::Bool(!right.is_truthy())),
    }
}

/// Integer arithmetic with overflow checks, falling back to doubles when
/// either side is a double. Booleans count as 0 and 1.
fn arithmetic(
    operator: BinaryOp,
    left: Value,
    right: Value,
    span: &Span,
    int_op: fn(i64, i64) -> Option<i64>,
    double_op: fn(f64, f64) -> f64,
) -> Result<Value, ScriptError> {
    match (as_integer(&left), as_integer(&right)) {
        (Some(l), Some(r)) => int_op(l, r)
            .map(Value::Int)
            .ok_or_else(|| overflow(operator, span)),
        _ => match (as_number(&left), as_number(&right)) {
            (Some(l), Some(r)) => Ok(Value::Double(double_op(l, r))),
            _ => Err(incompatible(operator, &left, &right, span)),
        },
    }
}

fn power(left: Value, right: Value, span: &Span) -> Result<Value, ScriptError> {
    match (as_integer(&left), as_integer(&right)) {
        (Some(base), Some(exponent)) if exponent >= 0 => u32::try_from(exponent)
            .ok()
            .and_then(|exponent| base.checked_pow(exponent))
            .map(Value::Int)
            .ok_or_else(|| overflow(BinaryOp::Power, span)),
        _ => match (as_number(&left), as_number(&right)) {
            (Some(base), Some(exponent)) if base == 0.0 && exponent < 0.0 => {
                Err(division_by_zero(span))
            }
            (Some(base), Some(exponent)) => Ok(Value::Double(base.powf(exponent))),
            _ => Err(incompatible(BinaryOp::Power, &left, &right, span)),
        },
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Double(n) => Some(*n),
        other => as_integer(other).map(|n| n as f64),
    }
}

/// Ordering for `<`, `<=`, `>`, `>=`. `None` means unordered (NaN).
fn compare(
    left: &Value,
    right: &Value,
    operator: BinaryOp,
    span: &Span,
) -> Result<Option<Ordering>, ScriptError> {
    if let (Some(l), Some(r)) = (as_integer(left), as_integer(right)) {
        return Ok(Some(l.cmp(&r)));
    }

    match (left, right) {
        (Value::String(l), Value::String(r)) => Ok(Some(l.cmp(r))),
        (Value::List(l), Value::List(r)) => {
            for (a, b) in l.iter().zip(r) {
                let ordering = compare(a, b, operator, span)?;
                if ordering != Some(Ordering::Equal) {
                    return Ok(ordering);
                }
            }
            Ok(Some(l.len().cmp(&r.len())))
        }
        _ => match (as_number(left), as_number(right)) {
            (Some(l), Some(r)) => Ok(l.partial_cmp(&r)),
            _ => Err(ScriptError::type_error(
                span.clone(),
                format!(
                    "Cannot compare {} and {} with '{}'",
                    left.type_name(),
                    right.type_name(),
                    operator.symbol()
                ),
            )),
        },
    }
}

/// Numbers (booleans included) compare by value across kinds; anything else
/// is structural.
fn is_equal(left: &Value, right: &Value) -> bool {
    if let (Some(l), Some(r)) = (as_integer(left), as_integer(right)) {
        return l == r;
    }

    match (left, right) {
        (Value::List(l), Value::List(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| is_equal(a, b))
        }
        _ => match (as_number(left), as_number(right)) {
            (Some(l), Some(r)) => l == r,
            _ => left == right,
        },
    }
}

fn incompatible(operator: BinaryOp, left: &Value, right: &Value, span: &Span) -> ScriptError {
    ScriptError::type_error_with_help(
        span.clone(),
        format!(
            "Unsupported operand types for '{}': {} and {}",
            operator.symbol(),
            left.type_name(),
            right.type_name()
        ),
        "Arithmetic needs two numbers (true and false count as 1 and 0); '+' also joins two strings or merges lists.".to_string(),
    )
}

fn division_by_zero(span: &Span) -> ScriptError {
    ScriptError::type_error(span.clone(), "Division by zero".to_string())
}

fn overflow(operator: BinaryOp, span: &Span) -> ScriptError {
    ScriptError::type_error(
        span.clone(),
        format!("Integer overflow in '{}'", operator.symbol()),
    )
}
