//! Tree-walking evaluator.
//!
//! One pattern-matching walker over the AST: statements execute against an
//! environment chain, expressions evaluate to [`Value`]s, and `retour` /
//! `stop` / `suivant` travel as control-flow results rather than errors.
//! Imports go through a per-interpreter module cache.
//!
//! Execution pipeline:
//! run -> exec_block (top-level statements) -> exec_statement
//! -> eval_expr -> call_value -> exec_block (function body).

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{BinaryOp, Expression, Literal, Program, Statement, UnaryOp};
use crate::builtins::{Arity, BuiltinRegistry};
use crate::diag::MeowError;
use crate::token::Position;

pub mod env;
pub mod modules;
pub mod value;

use env::Env;
use modules::{ModuleCache, ModuleEntry};
use value::{DictKey, FunctionValue, ModuleValue, Number, Value};

/// Control-flow outcome of a statement or block.
enum Flow {
    Normal,
    Return(Value, Position),
    Break(Position),
    Continue(Position),
}

pub struct Interpreter {
    /// Root frame holding the native functions; parent of the script's and
    /// every module's top-level frame.
    builtins_env: Rc<Env>,
    /// The main script's top-level frame.
    globals: Rc<Env>,
    modules: ModuleCache,
    search_paths: Vec<PathBuf>,
}

impl Interpreter {
    pub fn new(registry: BuiltinRegistry, base_dir: impl AsRef<Path>) -> Self {
        let builtins_env = Env::root();
        for (name, native) in registry.items() {
            builtins_env.define(name, Value::Native(native.clone()));
        }
        let globals = Env::child(&builtins_env);
        Self {
            builtins_env,
            globals,
            modules: ModuleCache::default(),
            search_paths: modules::search_paths(base_dir.as_ref()),
        }
    }

    pub fn globals(&self) -> &Rc<Env> {
        &self.globals
    }

    /// Executes a program's top level. Control signals escaping the top
    /// level are user errors, not crashes.
    pub fn run(&mut self, program: &Program) -> Result<Value, MeowError> {
        let globals = Rc::clone(&self.globals);
        match self.exec_block(&program.statements, &globals)? {
            Flow::Normal => Ok(Value::Nothing),
            Flow::Return(_, pos) => Err(MeowError::new("E602").at(pos)),
            Flow::Break(pos) => Err(break_outside_loop("stop", pos)),
            Flow::Continue(pos) => Err(break_outside_loop("suivant", pos)),
        }
    }

    fn exec_block(&mut self, statements: &[Statement], env: &Rc<Env>) -> Result<Flow, MeowError> {
        for statement in statements {
            match self.exec_statement(statement, env)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_statement(&mut self, statement: &Statement, env: &Rc<Env>) -> Result<Flow, MeowError> {
        match statement {
            Statement::Expr(expr) => {
                self.eval_expr(expr, env)?;
                Ok(Flow::Normal)
            }

            Statement::Assign { name, value, .. } => {
                let value = self.eval_expr(value, env)?;
                env.assign(name, value);
                Ok(Flow::Normal)
            }

            Statement::IndexAssign {
                target,
                index,
                value,
                pos,
            } => {
                let container = self.eval_expr(target, env)?;
                let index = self.eval_expr(index, env)?;
                let value = self.eval_expr(value, env)?;
                self.store_index(&container, &index, value, *pos)?;
                Ok(Flow::Normal)
            }

            Statement::If {
                condition,
                then_body,
                elif_branches,
                else_body,
                ..
            } => {
                if self.eval_expr(condition, env)?.is_truthy() {
                    return self.exec_block(then_body, env);
                }
                for (elif_condition, elif_body) in elif_branches {
                    if self.eval_expr(elif_condition, env)?.is_truthy() {
                        return self.exec_block(elif_body, env);
                    }
                }
                match else_body {
                    Some(body) => self.exec_block(body, env),
                    None => Ok(Flow::Normal),
                }
            }

            Statement::While {
                condition, body, ..
            } => {
                while self.eval_expr(condition, env)?.is_truthy() {
                    match self.exec_block(body, env)? {
                        Flow::Normal | Flow::Continue(_) => {}
                        Flow::Break(_) => break,
                        flow @ Flow::Return(..) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Statement::Repeat { count, body, .. } => {
                let count_value = self.eval_expr(count, env)?;
                // Coerced to an integer (floats truncate); negative or
                // non-numeric counts are rejected.
                let times = match count_value.as_number() {
                    Some(Number::Int(n)) if n >= 0 => n,
                    Some(Number::Float(f)) if f >= 0.0 => f.trunc() as i64,
                    _ => {
                        return Err(MeowError::new("E503")
                            .at(count.position())
                            .with_detail("count", &count_value));
                    }
                };
                for index in 0..times {
                    // `compteur` lives in a fresh frame each iteration.
                    let frame = Env::child(env);
                    frame.define("compteur", Value::int(index));
                    match self.exec_block(body, &frame)? {
                        Flow::Normal | Flow::Continue(_) => {}
                        Flow::Break(_) => break,
                        flow @ Flow::Return(..) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Statement::ForEach {
                binding,
                iterable,
                body,
                ..
            } => {
                let source = self.eval_expr(iterable, env)?;
                let items: Vec<Value> = match &source {
                    Value::List(items) => items.borrow().clone(),
                    Value::Dict(map) => map.borrow().keys().map(DictKey::to_value).collect(),
                    Value::Text(text) => {
                        text.chars().map(|c| Value::Text(c.to_string())).collect()
                    }
                    other => {
                        return Err(MeowError::new("E701")
                            .at(iterable.position())
                            .with_detail("type_name", other.type_name()));
                    }
                };
                for item in items {
                    let frame = Env::child(env);
                    frame.define(binding.as_str(), item);
                    match self.exec_block(body, &frame)? {
                        Flow::Normal | Flow::Continue(_) => {}
                        Flow::Break(_) => break,
                        flow @ Flow::Return(..) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Statement::FunctionDef {
                name,
                params,
                body,
                ..
            } => {
                let function = Value::Function(Rc::new(FunctionValue {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::new(body.clone()),
                    env: Rc::clone(env),
                }));
                env.define(name.as_str(), function);
                Ok(Flow::Normal)
            }

            Statement::Return { value, pos } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Nothing,
                };
                Ok(Flow::Return(value, *pos))
            }

            Statement::Break { pos } => Ok(Flow::Break(*pos)),
            Statement::Continue { pos } => Ok(Flow::Continue(*pos)),

            Statement::TryExcept {
                body,
                binding,
                handler,
                ..
            } => match self.exec_block(body, env) {
                Ok(flow) => Ok(flow),
                Err(error) if error.is_catchable() => {
                    let frame = Env::child(env);
                    if let Some(name) = binding {
                        let mut details = IndexMap::new();
                        details.insert(
                            DictKey::Text("code".to_string()),
                            Value::text(error.code()),
                        );
                        details.insert(
                            DictKey::Text("message".to_string()),
                            Value::Text(error.message_tech()),
                        );
                        details.insert(
                            DictKey::Text("line".to_string()),
                            Value::int(error.pos.line as i64),
                        );
                        frame.define(name.as_str(), Value::dict(details));
                    }
                    self.exec_block(handler, &frame)
                }
                Err(error) => Err(error),
            },

            Statement::Import { module, pos } => {
                let loaded = self.import_module(module, *pos)?;
                env.define(module.as_str(), Value::Module(loaded));
                Ok(Flow::Normal)
            }
        }
    }

    fn eval_expr(&mut self, expr: &Expression, env: &Rc<Env>) -> Result<Value, MeowError> {
        match expr {
            Expression::Literal { value, .. } => Ok(match value {
                Literal::Integer(n) => Value::int(*n),
                Literal::Float(f) => Value::float(*f),
                Literal::Text(s) => Value::text(s.clone()),
                Literal::Boolean(b) => Value::Bool(*b),
            }),

            Expression::Identifier { name, pos } => env.lookup(name).ok_or_else(|| {
                MeowError::new("E200")
                    .at(*pos)
                    .with_instruction(name.clone())
                    .with_detail("var_name", name)
            }),

            Expression::List { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element, env)?);
                }
                Ok(Value::list(values))
            }

            Expression::Dict { pairs, .. } => {
                let mut map = IndexMap::new();
                for (key_expr, value_expr) in pairs {
                    let key_value = self.eval_expr(key_expr, env)?;
                    let key = DictKey::from_value(&key_value).ok_or_else(|| {
                        MeowError::new("E703")
                            .at(key_expr.position())
                            .with_detail("type_name", key_value.type_name())
                    })?;
                    let value = self.eval_expr(value_expr, env)?;
                    // Later duplicates overwrite earlier entries in place.
                    map.insert(key, value);
                }
                Ok(Value::dict(map))
            }

            Expression::Unary { op, operand, pos } => {
                let value = self.eval_expr(operand, env)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => value
                        .as_number()
                        .map(|number| Value::Number(number.neg()))
                        .ok_or_else(|| type_mismatch(&value, "nombre", *pos)),
                }
            }

            Expression::Binary {
                op, left, right, pos,
            } => match op {
                // `et`/`ou` short-circuit and return the deciding operand.
                BinaryOp::And => {
                    let left = self.eval_expr(left, env)?;
                    if !left.is_truthy() {
                        return Ok(left);
                    }
                    self.eval_expr(right, env)
                }
                BinaryOp::Or => {
                    let left = self.eval_expr(left, env)?;
                    if left.is_truthy() {
                        return Ok(left);
                    }
                    self.eval_expr(right, env)
                }
                _ => {
                    let left = self.eval_expr(left, env)?;
                    let right = self.eval_expr(right, env)?;
                    eval_binary(*op, &left, &right, *pos)
                }
            },

            Expression::Call { callee, args, pos } => {
                let callee = self.eval_expr(callee, env)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, env)?);
                }
                self.call_value(callee, values, *pos)
            }

            Expression::Index { target, index, pos } => {
                let container = self.eval_expr(target, env)?;
                let index = self.eval_expr(index, env)?;
                self.load_index(&container, &index, *pos)
            }

            Expression::Attribute { target, name, pos } => {
                let value = self.eval_expr(target, env)?;
                match &value {
                    Value::Module(module) => {
                        module.members.get(name).cloned().ok_or_else(|| {
                            MeowError::new("E204")
                                .at(*pos)
                                .with_instruction(name.clone())
                                .with_detail("target", &module.name)
                                .with_detail("name", name)
                        })
                    }
                    other => Err(MeowError::new("E204")
                        .at(*pos)
                        .with_instruction(name.clone())
                        .with_detail("target", other.type_name())
                        .with_detail("name", name)),
                }
            }
        }
    }

    fn call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        pos: Position,
    ) -> Result<Value, MeowError> {
        match callee {
            Value::Function(function) => {
                if args.len() != function.params.len() {
                    return Err(MeowError::new("E601")
                        .at(pos)
                        .with_instruction(function.name.clone())
                        .with_detail("expected", function.params.len())
                        .with_detail("received", args.len()));
                }
                // Lexical scope: the frame parents on the environment the
                // function captured, not on the caller's.
                let frame = Env::child(&function.env);
                for (param, arg) in function.params.iter().zip(args) {
                    frame.define(param.as_str(), arg);
                }
                match self.exec_block(&function.body, &frame)? {
                    Flow::Normal => Ok(Value::Nothing),
                    Flow::Return(value, _) => Ok(value),
                    Flow::Break(pos) => Err(break_outside_loop("stop", pos)),
                    Flow::Continue(pos) => Err(break_outside_loop("suivant", pos)),
                }
            }
            Value::Native(native) => {
                match native.arity {
                    Arity::Exact(expected) if args.len() != expected => {
                        return Err(MeowError::new("E601")
                            .at(pos)
                            .with_instruction(native.name.clone())
                            .with_detail("expected", expected)
                            .with_detail("received", args.len()));
                    }
                    Arity::AtLeast(minimum) if args.len() < minimum => {
                        return Err(MeowError::new("E601")
                            .at(pos)
                            .with_instruction(native.name.clone())
                            .with_detail("expected", format!("au moins {minimum}"))
                            .with_detail("received", args.len()));
                    }
                    _ => {}
                }
                native.invoke(&args).map_err(|error| error.or_at(pos))
            }
            other => Err(MeowError::new("E600")
                .at(pos)
                .with_detail("type_name", other.type_name())),
        }
    }

    fn load_index(
        &self,
        container: &Value,
        index: &Value,
        pos: Position,
    ) -> Result<Value, MeowError> {
        match container {
            Value::List(items) => {
                let items = items.borrow();
                let position = list_index(index, items.len(), pos)?;
                Ok(items[position].clone())
            }
            Value::Text(text) => {
                let count = text.chars().count();
                let position = list_index(index, count, pos)?;
                let ch = text.chars().nth(position).expect("index checked above");
                Ok(Value::Text(ch.to_string()))
            }
            Value::Dict(map) => {
                let key = dict_key(index, pos)?;
                map.borrow()
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| MeowError::new("E702").at(pos).with_detail("key", key))
            }
            other => Err(MeowError::new("E202")
                .at(pos)
                .with_detail("type1", other.type_name())
                .with_detail("type2", index.type_name())),
        }
    }

    fn store_index(
        &self,
        container: &Value,
        index: &Value,
        value: Value,
        pos: Position,
    ) -> Result<(), MeowError> {
        match container {
            Value::List(items) => {
                let mut items = items.borrow_mut();
                let position = list_index(index, items.len(), pos)?;
                items[position] = value;
                Ok(())
            }
            Value::Dict(map) => {
                let key = dict_key(index, pos)?;
                map.borrow_mut().insert(key, value);
                Ok(())
            }
            other => Err(MeowError::new("E202")
                .at(pos)
                .with_detail("type1", other.type_name())
                .with_detail("type2", index.type_name())),
        }
    }

    /// Loads a module through the cache. A `Ready` entry hands out the same
    /// namespace reference every time; a `Loading` entry (re-entrant import)
    /// snapshots whatever the module has defined so far.
    fn import_module(&mut self, name: &str, pos: Position) -> Result<Rc<ModuleValue>, MeowError> {
        let not_found = || {
            MeowError::new("E901")
                .at(pos)
                .with_instruction(name.to_string())
                .with_detail("module", name)
        };

        let path = modules::resolve(name, &self.search_paths).ok_or_else(not_found)?;

        if let Some(entry) = self.modules.get(&path) {
            return Ok(match entry {
                ModuleEntry::Ready(module) => Rc::clone(module),
                ModuleEntry::Loading(env) => Rc::new(ModuleValue {
                    name: name.to_string(),
                    members: env.local_bindings(),
                }),
            });
        }

        let source = fs::read_to_string(&path).map_err(|_| not_found())?;
        // Lex/parse failures inside a module bypass essayer/sauf in the
        // importing script.
        let program = crate::parser::parse_source(&source).map_err(MeowError::into_fatal)?;

        let module_env = Env::child(&self.builtins_env);
        self.modules.begin(path.clone(), Rc::clone(&module_env));

        // Nested imports resolve relative to the module's own directory.
        let module_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let saved_paths =
            std::mem::replace(&mut self.search_paths, modules::search_paths(&module_dir));
        let outcome = self.exec_block(&program.statements, &module_env);
        self.search_paths = saved_paths;

        let flow = match outcome {
            Ok(flow) => flow,
            Err(error) => {
                self.modules.abort(&path);
                return Err(error);
            }
        };
        if let Flow::Return(_, pos) | Flow::Break(pos) | Flow::Continue(pos) = flow {
            self.modules.abort(&path);
            return Err(MeowError::new("E602").at(pos).into_fatal());
        }

        let module = Rc::new(ModuleValue {
            name: name.to_string(),
            members: module_env.local_bindings(),
        });
        self.modules.finish(path, Rc::clone(&module));
        Ok(module)
    }
}

fn eval_binary(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    pos: Position,
) -> Result<Value, MeowError> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.add(*b))),
            (Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                let mut combined = a.borrow().clone();
                combined.extend(b.borrow().iter().cloned());
                Ok(Value::list(combined))
            }
            _ => Err(operand_mismatch(left, right, pos)),
        },
        BinaryOp::Sub => numeric_op(left, right, pos, |a, b| Ok(a.sub(b))),
        BinaryOp::Mul => numeric_op(left, right, pos, |a, b| Ok(a.mul(b))),
        BinaryOp::Div => numeric_op(left, right, pos, Number::div),
        BinaryOp::FloorDiv => numeric_op(left, right, pos, Number::floor_div),
        BinaryOp::Mod => numeric_op(left, right, pos, Number::modulo),
        BinaryOp::Pow => numeric_op(left, right, pos, |a, b| Ok(a.pow(b))),
        BinaryOp::Equal => Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => Ok(Value::Bool(left != right)),
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            let ordering = left.compare_order(right).ok_or_else(|| {
                MeowError::new("E502")
                    .at(pos)
                    .with_detail("type1", left.type_name())
                    .with_detail("type2", right.type_name())
            })?;
            let result = match op {
                BinaryOp::Less => ordering.is_lt(),
                BinaryOp::LessEqual => ordering.is_le(),
                BinaryOp::Greater => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit ops evaluated earlier"),
    }
}

fn numeric_op(
    left: &Value,
    right: &Value,
    pos: Position,
    op: impl Fn(Number, Number) -> Result<Number, MeowError>,
) -> Result<Value, MeowError> {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => op(a, b).map(Value::Number).map_err(|error| error.or_at(pos)),
        _ => Err(operand_mismatch(left, right, pos)),
    }
}

fn operand_mismatch(left: &Value, right: &Value, pos: Position) -> MeowError {
    MeowError::new("E202")
        .at(pos)
        .with_detail("type1", left.type_name())
        .with_detail("type2", right.type_name())
}

fn type_mismatch(value: &Value, expected: &'static str, pos: Position) -> MeowError {
    MeowError::new("E202")
        .at(pos)
        .with_detail("type1", value.type_name())
        .with_detail("type2", expected)
}

fn break_outside_loop(keyword: &'static str, pos: Position) -> MeowError {
    MeowError::new("E401")
        .at(pos)
        .with_instruction(keyword)
        .with_detail("keyword", keyword)
}

fn list_index(index: &Value, len: usize, pos: Position) -> Result<usize, MeowError> {
    let number = index
        .as_number()
        .and_then(Number::as_int)
        .ok_or_else(|| MeowError::new("E703").at(pos).with_detail("type_name", index.type_name()))?;
    if number < 0 || number as usize >= len {
        return Err(MeowError::new("E700")
            .at(pos)
            .with_detail("index", number)
            .with_detail("size", len)
            .with_detail("size_minus_one", len.saturating_sub(1)));
    }
    Ok(number as usize)
}

fn dict_key(index: &Value, pos: Position) -> Result<DictKey, MeowError> {
    DictKey::from_value(index)
        .ok_or_else(|| MeowError::new("E703").at(pos).with_detail("type_name", index.type_name()))
}

/// Runs source text through the whole pipeline with the given registry.
/// `base_dir` anchors module resolution (the script's directory).
pub fn run_source(
    source: &str,
    base_dir: impl AsRef<Path>,
    registry: BuiltinRegistry,
) -> Result<(), MeowError> {
    let program = crate::parser::parse_source(source)?;
    Interpreter::new(registry, base_dir).run(&program).map(|_| ())
}
