//! Runtime value model.
//!
//! Mutable containers (lists, dicts, files) live behind `Rc<RefCell<...>>`
//! so two bindings to the same container observe each other's mutations.
//! Numbers carry an integer and a float representation under one value kind;
//! integer operations widen to float on overflow.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::Statement;
use crate::builtins::NativeFunction;
use crate::diag::MeowError;
use crate::interpreter::env::Env;

/// Numeric scalar: integer when representable, float otherwise.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    /// The exact integer behind this number, if there is one.
    pub fn as_int(self) -> Option<i64> {
        match self {
            Number::Int(value) => Some(value),
            Number::Float(value) => {
                if value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
                    Some(value as i64)
                } else {
                    None
                }
            }
        }
    }

    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 + b as f64)),
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn sub(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_sub(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 - b as f64)),
            (a, b) => Number::Float(a.as_f64() - b.as_f64()),
        }
    }

    pub fn mul(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_mul(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 * b as f64)),
            (a, b) => Number::Float(a.as_f64() * b.as_f64()),
        }
    }

    /// True division. Stays integral when both operands are integers and the
    /// division is exact.
    pub fn div(self, other: Number) -> Result<Number, MeowError> {
        if other.is_zero() {
            return Err(MeowError::new("E501"));
        }
        match (self, other) {
            (Number::Int(a), Number::Int(b)) if a % b == 0 => Ok(Number::Int(a / b)),
            (a, b) => Ok(Number::Float(a.as_f64() / b.as_f64())),
        }
    }

    /// Floored division: the quotient rounds toward negative infinity.
    pub fn floor_div(self, other: Number) -> Result<Number, MeowError> {
        if other.is_zero() {
            return Err(MeowError::new("E501"));
        }
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => {
                let quotient = a / b;
                if a % b != 0 && (a < 0) != (b < 0) {
                    Ok(Number::Int(quotient - 1))
                } else {
                    Ok(Number::Int(quotient))
                }
            }
            (a, b) => Ok(Number::Float((a.as_f64() / b.as_f64()).floor())),
        }
    }

    /// Floored remainder: the sign follows the divisor, so
    /// `(a // b) * b + a % b == a` holds.
    pub fn modulo(self, other: Number) -> Result<Number, MeowError> {
        if other.is_zero() {
            return Err(MeowError::new("E501"));
        }
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => {
                let remainder = a % b;
                if remainder != 0 && (remainder < 0) != (b < 0) {
                    Ok(Number::Int(remainder + b))
                } else {
                    Ok(Number::Int(remainder))
                }
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                let remainder = a % b;
                if remainder != 0.0 && (remainder < 0.0) != (b < 0.0) {
                    Ok(Number::Float(remainder + b))
                } else {
                    Ok(Number::Float(remainder))
                }
            }
        }
    }

    pub fn pow(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) if (0..=u32::MAX as i64).contains(&b) => a
                .checked_pow(b as u32)
                .map(Number::Int)
                .unwrap_or(Number::Float((a as f64).powf(b as f64))),
            (a, b) => Number::Float(a.as_f64().powf(b.as_f64())),
        }
    }

    pub fn neg(self) -> Number {
        match self {
            Number::Int(value) => value
                .checked_neg()
                .map(Number::Int)
                .unwrap_or(Number::Float(-(value as f64))),
            Number::Float(value) => Number::Float(-value),
        }
    }

    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(value) => value == 0,
            Number::Float(value) => value == 0.0,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(value) => write!(f, "{value}"),
            Number::Float(value) => write!(f, "{value}"),
        }
    }
}

/// Hashable dictionary key: text, integer or boolean. Integral floats
/// collapse to their integer key so `d[2]` and `d[2.0]` agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl DictKey {
    pub fn from_value(value: &Value) -> Option<DictKey> {
        match value {
            Value::Text(text) => Some(DictKey::Text(text.clone())),
            Value::Bool(flag) => Some(DictKey::Bool(*flag)),
            Value::Number(number) => number.as_int().map(DictKey::Int),
            _ => None,
        }
    }

    /// The key as a plain value, for `pour chaque` over a dict.
    pub fn to_value(&self) -> Value {
        match self {
            DictKey::Text(text) => Value::Text(text.clone()),
            DictKey::Int(value) => Value::int(*value),
            DictKey::Bool(flag) => Value::Bool(*flag),
        }
    }
}

impl fmt::Display for DictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictKey::Text(text) => write!(f, "\"{text}\""),
            DictKey::Int(value) => write!(f, "{value}"),
            DictKey::Bool(true) => write!(f, "vrai"),
            DictKey::Bool(false) => write!(f, "faux"),
        }
    }
}

/// User-defined function: parameters, body, and the environment it closed
/// over. The captured environment is the frame the `fonction` statement ran
/// in, which makes recursion work (the name is visible in its own closure).
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Vec<Statement>>,
    pub env: Rc<Env>,
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The captured environment may point back at this function; leave it
        // out of the debug output.
        f.debug_struct("FunctionValue")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Open-file handle owned by user code. `fermer` drops the inner file; the
/// host closes anything still open when the interpreter is torn down.
#[derive(Debug)]
pub struct FileHandle {
    pub path: PathBuf,
    pub file: Option<fs::File>,
}

/// Frozen namespace produced by executing a module's top level.
#[derive(Debug)]
pub struct ModuleValue {
    pub name: String,
    pub members: HashMap<String, Value>,
}

#[derive(Debug, Clone)]
pub enum Value {
    Nothing,
    Bool(bool),
    Number(Number),
    Text(String),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<IndexMap<DictKey, Value>>>),
    Function(Rc<FunctionValue>),
    Native(NativeFunction),
    File(Rc<RefCell<FileHandle>>),
    Module(Rc<ModuleValue>),
}

impl Value {
    pub fn int(value: i64) -> Value {
        Value::Number(Number::Int(value))
    }

    pub fn float(value: f64) -> Value {
        Value::Number(Number::Float(value))
    }

    pub fn text(value: impl Into<String>) -> Value {
        Value::Text(value.into())
    }

    pub fn list(values: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(values)))
    }

    pub fn dict(map: IndexMap<DictKey, Value>) -> Value {
        Value::Dict(Rc::new(RefCell::new(map)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nothing => "rien",
            Value::Bool(_) => "booléen",
            Value::Number(_) => "nombre",
            Value::Text(_) => "texte",
            Value::List(_) => "liste",
            Value::Dict(_) => "dictionnaire",
            Value::Function(_) => "fonction",
            Value::Native(_) => "fonction native",
            Value::File(_) => "fichier",
            Value::Module(_) => "module",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nothing => false,
            Value::Bool(flag) => *flag,
            Value::Number(Number::Int(value)) => *value != 0,
            Value::Number(Number::Float(value)) => *value != 0.0,
            Value::Text(text) => !text.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Dict(map) => !map.borrow().is_empty(),
            Value::Function(_) | Value::Native(_) | Value::File(_) | Value::Module(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Ordering for `< <= > >=`: numbers with numbers, text with text.
    pub fn compare_order(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.compare(*b),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Structural equality for data, identity for functions, files and modules.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nothing, Value::Nothing) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(key, value)| b.get(key) == Some(value))
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a.ptr_eq(b),
            (Value::File(a), Value::File(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => Ok(()),
            Value::Bool(true) => write!(f, "vrai"),
            Value::Bool(false) => write!(f, "faux"),
            Value::Number(number) => write!(f, "{number}"),
            Value::Text(text) => write!(f, "{text}"),
            Value::List(items) => {
                let rendered: Vec<String> =
                    items.borrow().iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Dict(map) => {
                let rendered: Vec<String> = map
                    .borrow()
                    .iter()
                    .map(|(key, value)| format!("{key}: {value}"))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::Function(function) => write!(f, "<fonction {}>", function.name),
            Value::Native(native) => write!(f, "<fonction native {}>", native.name),
            Value::File(handle) => write!(f, "<fichier {}>", handle.borrow().path.display()),
            Value::Module(module) => write!(f, "<module {}>", module.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_stays_integral() {
        assert_eq!(Number::Int(2).add(Number::Int(3)), Number::Int(5));
        assert_eq!(Number::Int(3).mul(Number::Int(4)), Number::Int(12));
        assert_eq!(
            Number::Int(14).div(Number::Int(2)).unwrap(),
            Number::Int(7)
        );
    }

    #[test]
    fn inexact_division_widens_to_float() {
        assert_eq!(
            Number::Int(7).div(Number::Int(2)).unwrap(),
            Number::Float(3.5)
        );
    }

    #[test]
    fn overflow_promotes_to_float() {
        let result = Number::Int(i64::MAX).add(Number::Int(1));
        assert!(matches!(result, Number::Float(_)));
        let result = Number::Int(10).pow(Number::Int(30));
        assert!(matches!(result, Number::Float(_)));
    }

    #[test]
    fn division_by_zero_is_reported() {
        assert_eq!(
            Number::Int(1).div(Number::Int(0)).unwrap_err().code(),
            "E501"
        );
        assert_eq!(
            Number::Int(1).modulo(Number::Int(0)).unwrap_err().code(),
            "E501"
        );
    }

    #[test]
    fn floored_division_invariant_holds() {
        for a in [-7i64, -3, 0, 3, 7] {
            for b in [-3i64, -2, 2, 3] {
                let quotient = Number::Int(a).floor_div(Number::Int(b)).unwrap();
                let remainder = Number::Int(a).modulo(Number::Int(b)).unwrap();
                let (Number::Int(q), Number::Int(r)) = (quotient, remainder) else {
                    panic!("integer inputs must stay integral");
                };
                assert_eq!(q * b + r, a, "a={a} b={b}");
                if r != 0 {
                    assert_eq!(r < 0, b < 0, "remainder sign follows divisor");
                }
            }
        }
    }

    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(Number::Int(1), Number::Float(1.0));
        assert_eq!(
            Number::Int(1).compare(Number::Float(1.5)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn truthiness_follows_emptiness() {
        assert!(!Value::Nothing.is_truthy());
        assert!(!Value::int(0).is_truthy());
        assert!(!Value::text("").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(!Value::dict(IndexMap::new()).is_truthy());
        assert!(Value::int(-1).is_truthy());
        assert!(Value::text("chat").is_truthy());
        assert!(Value::list(vec![Value::int(1)]).is_truthy());
    }

    #[test]
    fn lists_compare_structurally_and_share_by_reference() {
        let a = Value::list(vec![Value::int(1), Value::text("x")]);
        let b = Value::list(vec![Value::int(1), Value::text("x")]);
        assert_eq!(a, b);

        let shared = a.clone();
        if let (Value::List(left), Value::List(right)) = (&a, &shared) {
            assert!(Rc::ptr_eq(left, right));
        }
    }

    #[test]
    fn integral_float_keys_collapse_to_int() {
        assert_eq!(
            DictKey::from_value(&Value::float(2.0)),
            Some(DictKey::Int(2))
        );
        assert_eq!(DictKey::from_value(&Value::float(2.5)), None);
        assert_eq!(DictKey::from_value(&Value::Nothing), None);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::int(42).to_string(), "42");
        assert_eq!(Value::float(3.5).to_string(), "3.5");
        assert_eq!(Value::Bool(true).to_string(), "vrai");
        assert_eq!(Value::Nothing.to_string(), "");
        assert_eq!(
            Value::list(vec![Value::int(1), Value::int(2)]).to_string(),
            "[1, 2]"
        );
        let mut map = IndexMap::new();
        map.insert(DictKey::Text("a".to_string()), Value::int(1));
        assert_eq!(Value::dict(map).to_string(), "{\"a\": 1}");
    }
}
