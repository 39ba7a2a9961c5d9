use crate::ast::Stmt;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Variable bindings of one frame.
///
/// Frames never share an environment: a nested block starts from a
/// [`snapshot`](Environment::snapshot) and hands its result back through
/// [`merge`](Environment::merge).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Bind or overwrite `name`.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Value copy used to seed a nested frame.
    pub fn snapshot(&self) -> Environment {
        self.clone()
    }

    /// Copy every binding of a finished child frame into this one.
    pub fn merge(&mut self, child: Environment) {
        self.values.extend(child.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<[Stmt]>,
}

/// Registry of declared functions. One table serves every frame of a run;
/// entries are only ever added or replaced.
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Rc<Function>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, function: Function) {
        self.functions
            .insert(function.name.clone(), Rc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<Rc<Function>> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.functions.clear();
    }
}
