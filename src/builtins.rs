//! Host-provided native functions.
//!
//! The evaluator consumes a [`BuiltinRegistry`] and seeds the root
//! environment from it; it never hard-codes a builtin name. This module also
//! ships the standard registry (console I/O, text and math helpers,
//! containers, files, sleep) used by the command-line front-end. The
//! standard registry writes through a shared sink so tests can capture
//! program output.

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use indexmap::IndexMap;
use rand::Rng;

use crate::diag::MeowError;
use crate::interpreter::value::{DictKey, FileHandle, Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, MeowError>>;

/// Opaque host callable with arity metadata. Arguments arrive already
/// evaluated; errors come back without a position and the evaluator fills in
/// the call site.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub arity: Arity,
    func: NativeFn,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        func: impl Fn(&[Value]) -> Result<Value, MeowError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            func: Rc::new(func),
        }
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value, MeowError> {
        (self.func)(args)
    }

    pub fn ptr_eq(&self, other: &NativeFunction) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Mapping from builtin name to native function, in registration order.
#[derive(Default)]
pub struct BuiltinRegistry {
    entries: IndexMap<String, NativeFunction>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &str,
        arity: Arity,
        func: impl Fn(&[Value]) -> Result<Value, MeowError> + 'static,
    ) {
        self.entries
            .insert(name.to_string(), NativeFunction::new(name, arity, func));
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &NativeFunction)> {
        self.entries
            .iter()
            .map(|(name, native)| (name.as_str(), native))
    }

    /// The documented standard registry, writing to stdout.
    pub fn standard() -> Self {
        Self::standard_to(Rc::new(RefCell::new(io::stdout())))
    }

    /// Standard registry writing program output to `out` instead of stdout.
    pub fn standard_to(out: Rc<RefCell<dyn Write>>) -> Self {
        let mut registry = Self::new();

        let sink = Rc::clone(&out);
        registry.register("ecrire", Arity::AtLeast(0), move |args| {
            let line = args
                .iter()
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(sink.borrow_mut(), "{line}").map_err(io_crash)?;
            Ok(Value::Nothing)
        });

        let sink = Rc::clone(&out);
        registry.register("demander texte", Arity::Exact(1), move |args| {
            prompt(&sink, &args[0])?;
            Ok(Value::Text(read_input_line()?))
        });

        let sink = Rc::clone(&out);
        registry.register("demander nombre", Arity::Exact(1), move |args| {
            prompt(&sink, &args[0])?;
            let input = read_input_line()?;
            parse_number(input.trim()).map(Value::Number).ok_or_else(|| {
                MeowError::new("E203")
                    .with_detail("value", input.trim())
                    .with_detail("target_type", "nombre")
            })
        });

        registry.register("minuscule", Arity::Exact(1), |args| {
            Ok(Value::Text(args[0].to_string().to_lowercase()))
        });

        registry.register("majuscule", Arity::Exact(1), |args| {
            Ok(Value::Text(args[0].to_string().to_uppercase()))
        });

        registry.register("longueur", Arity::Exact(1), |args| {
            let length = match &args[0] {
                Value::Text(text) => text.chars().count(),
                Value::List(items) => items.borrow().len(),
                Value::Dict(map) => map.borrow().len(),
                other => return Err(type_error("longueur", other, "texte, liste ou dictionnaire")),
            };
            Ok(Value::int(length as i64))
        });

        registry.register("remplacer", Arity::Exact(3), |args| {
            let text = text_arg("remplacer", args, 0)?;
            let from = text_arg("remplacer", args, 1)?;
            let to = text_arg("remplacer", args, 2)?;
            Ok(Value::Text(text.replace(&from, &to)))
        });

        registry.register("contient", Arity::Exact(2), |args| {
            let found = match &args[0] {
                Value::Text(text) => {
                    let needle = text_arg("contient", args, 1)?;
                    text.contains(&needle)
                }
                Value::List(items) => items.borrow().iter().any(|item| item == &args[1]),
                Value::Dict(map) => match DictKey::from_value(&args[1]) {
                    Some(key) => map.borrow().contains_key(&key),
                    None => false,
                },
                other => return Err(type_error("contient", other, "texte, liste ou dictionnaire")),
            };
            Ok(Value::Bool(found))
        });

        registry.register("aleatoire", Arity::Exact(2), |args| {
            let low = int_arg("aleatoire", args, 0)?;
            let high = int_arg("aleatoire", args, 1)?;
            let (low, high) = if low <= high { (low, high) } else { (high, low) };
            Ok(Value::int(rand::thread_rng().gen_range(low..=high)))
        });

        registry.register("sqrt", Arity::Exact(1), |args| {
            let number = number_arg("sqrt", args, 0)?;
            Ok(Value::float(number.as_f64().sqrt()))
        });

        registry.register("abs", Arity::Exact(1), |args| {
            let value = match number_arg("abs", args, 0)? {
                Number::Int(n) => n
                    .checked_abs()
                    .map(Number::Int)
                    .unwrap_or(Number::Float(-(n as f64))),
                Number::Float(f) => Number::Float(f.abs()),
            };
            Ok(Value::Number(value))
        });

        registry.register("round", Arity::Exact(1), |args| {
            Ok(Value::int(number_arg("round", args, 0)?.as_f64().round() as i64))
        });

        registry.register("floor", Arity::Exact(1), |args| {
            Ok(Value::int(number_arg("floor", args, 0)?.as_f64().floor() as i64))
        });

        registry.register("ceil", Arity::Exact(1), |args| {
            Ok(Value::int(number_arg("ceil", args, 0)?.as_f64().ceil() as i64))
        });

        registry.register("liste", Arity::AtLeast(0), |args| {
            Ok(Value::list(args.to_vec()))
        });

        registry.register("dictionnaire", Arity::AtLeast(0), |args| {
            if args.len() % 2 != 0 {
                return Err(MeowError::new("E601")
                    .with_instruction("dictionnaire")
                    .with_detail("expected", "un nombre pair d'arguments")
                    .with_detail("received", args.len()));
            }
            let mut map = IndexMap::new();
            for pair in args.chunks(2) {
                let key = DictKey::from_value(&pair[0]).ok_or_else(|| {
                    MeowError::new("E703").with_detail("type_name", pair[0].type_name())
                })?;
                map.insert(key, pair[1].clone());
            }
            Ok(Value::dict(map))
        });

        registry.register("ouvrir", Arity::Exact(1), |args| {
            let path = text_arg("ouvrir", args, 0)?;
            let file = fs::File::open(&path).map_err(|err| {
                MeowError::new("E801")
                    .with_detail("path", &path)
                    .with_detail("reason", err)
            })?;
            Ok(Value::File(Rc::new(RefCell::new(FileHandle {
                path: path.into(),
                file: Some(file),
            }))))
        });

        registry.register("lire", Arity::Exact(1), |args| {
            let Value::File(handle) = &args[0] else {
                return Err(type_error("lire", &args[0], "fichier"));
            };
            let mut handle = handle.borrow_mut();
            let path = handle.path.display().to_string();
            let file = handle
                .file
                .as_mut()
                .ok_or_else(|| MeowError::new("E802").with_detail("path", &path))?;
            let mut content = String::new();
            file.read_to_string(&mut content).map_err(io_crash)?;
            Ok(Value::Text(content))
        });

        registry.register("fermer", Arity::Exact(1), |args| {
            let Value::File(handle) = &args[0] else {
                return Err(type_error("fermer", &args[0], "fichier"));
            };
            handle.borrow_mut().file = None;
            Ok(Value::Nothing)
        });

        registry.register("attendre", Arity::Exact(1), |args| {
            let seconds = number_arg("attendre", args, 0)?.as_f64();
            if seconds < 0.0 {
                return Err(MeowError::new("E800").with_detail("duration", seconds));
            }
            thread::sleep(Duration::from_secs_f64(seconds));
            Ok(Value::Nothing)
        });

        registry
    }
}

fn prompt(sink: &Rc<RefCell<dyn Write>>, text: &Value) -> Result<(), MeowError> {
    let mut sink = sink.borrow_mut();
    write!(sink, "{text} ").map_err(io_crash)?;
    sink.flush().map_err(io_crash)
}

fn read_input_line() -> Result<String, MeowError> {
    let mut input = String::new();
    io::stdin().read_line(&mut input).map_err(io_crash)?;
    Ok(input.trim().to_string())
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(Number::Int(value));
    }
    text.parse::<f64>().ok().map(Number::Float)
}

fn io_crash(err: io::Error) -> MeowError {
    MeowError::new("E902").with_detail("reason", err)
}

fn type_error(builtin: &str, got: &Value, expected: &'static str) -> MeowError {
    MeowError::new("E202")
        .with_instruction(builtin)
        .with_detail("type1", got.type_name())
        .with_detail("type2", expected)
}

fn text_arg(builtin: &str, args: &[Value], index: usize) -> Result<String, MeowError> {
    match &args[index] {
        Value::Text(text) => Ok(text.clone()),
        other => Err(type_error(builtin, other, "texte")),
    }
}

fn number_arg(builtin: &str, args: &[Value], index: usize) -> Result<Number, MeowError> {
    args[index]
        .as_number()
        .ok_or_else(|| type_error(builtin, &args[index], "nombre"))
}

fn int_arg(builtin: &str, args: &[Value], index: usize) -> Result<i64, MeowError> {
    number_arg(builtin, args, index)?
        .as_int()
        .ok_or_else(|| type_error(builtin, &args[index], "nombre entier"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> BuiltinRegistry {
        let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        BuiltinRegistry::standard_to(sink)
    }

    fn call(registry: &BuiltinRegistry, name: &str, args: &[Value]) -> Result<Value, MeowError> {
        registry
            .items()
            .find(|(entry, _)| *entry == name)
            .expect("builtin registered")
            .1
            .invoke(args)
    }

    #[test]
    fn registry_exposes_the_documented_names() {
        let registry = standard();
        for name in [
            "ecrire",
            "demander texte",
            "demander nombre",
            "minuscule",
            "majuscule",
            "longueur",
            "remplacer",
            "contient",
            "aleatoire",
            "sqrt",
            "abs",
            "round",
            "floor",
            "ceil",
            "liste",
            "dictionnaire",
            "ouvrir",
            "lire",
            "fermer",
            "attendre",
        ] {
            assert!(
                registry.items().any(|(entry, _)| entry == name),
                "missing builtin {name}"
            );
        }
    }

    #[test]
    fn ecrire_writes_space_joined_arguments_to_the_sink() {
        let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let registry = BuiltinRegistry::standard_to(sink.clone());
        call(
            &registry,
            "ecrire",
            &[Value::text("bonjour"), Value::int(7)],
        )
        .expect("ecrire should succeed");
        assert_eq!(String::from_utf8(sink.borrow().clone()).unwrap(), "bonjour 7\n");
    }

    #[test]
    fn longueur_counts_characters_not_bytes() {
        let registry = standard();
        let result = call(&registry, "longueur", &[Value::text("café")]).unwrap();
        assert_eq!(result, Value::int(4));
    }

    #[test]
    fn remplacer_and_case_builtins() {
        let registry = standard();
        assert_eq!(
            call(
                &registry,
                "remplacer",
                &[Value::text("miaou miaou"), Value::text("miaou"), Value::text("meow")]
            )
            .unwrap(),
            Value::text("meow meow")
        );
        assert_eq!(
            call(&registry, "majuscule", &[Value::text("chat")]).unwrap(),
            Value::text("CHAT")
        );
    }

    #[test]
    fn contient_works_for_all_containers() {
        let registry = standard();
        assert_eq!(
            call(
                &registry,
                "contient",
                &[Value::text("le chat dort"), Value::text("chat")]
            )
            .unwrap(),
            Value::Bool(true)
        );
        let list = Value::list(vec![Value::int(1), Value::int(2)]);
        assert_eq!(
            call(&registry, "contient", &[list, Value::int(2)]).unwrap(),
            Value::Bool(true)
        );
        let dict = call(
            &registry,
            "dictionnaire",
            &[Value::text("a"), Value::int(1)],
        )
        .unwrap();
        assert_eq!(
            call(&registry, "contient", &[dict, Value::text("b")]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn dictionnaire_requires_an_even_argument_count() {
        let registry = standard();
        let err = call(&registry, "dictionnaire", &[Value::text("a")]).unwrap_err();
        assert_eq!(err.code(), "E601");
    }

    #[test]
    fn math_builtins() {
        let registry = standard();
        assert_eq!(call(&registry, "sqrt", &[Value::int(9)]).unwrap(), Value::float(3.0));
        assert_eq!(call(&registry, "abs", &[Value::int(-4)]).unwrap(), Value::int(4));
        assert_eq!(
            call(&registry, "round", &[Value::float(2.6)]).unwrap(),
            Value::int(3)
        );
        assert_eq!(
            call(&registry, "floor", &[Value::float(2.6)]).unwrap(),
            Value::int(2)
        );
        assert_eq!(
            call(&registry, "ceil", &[Value::float(2.1)]).unwrap(),
            Value::int(3)
        );
    }

    #[test]
    fn aleatoire_stays_in_range() {
        let registry = standard();
        for _ in 0..20 {
            let value = call(&registry, "aleatoire", &[Value::int(1), Value::int(6)]).unwrap();
            let Value::Number(Number::Int(n)) = value else {
                panic!("expected integer");
            };
            assert!((1..=6).contains(&n));
        }
    }

    #[test]
    fn file_builtins_read_then_refuse_after_close() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        let mut file = fs::File::create(&path).expect("create");
        write!(file, "croquettes").expect("write");
        drop(file);

        let registry = standard();
        let handle = call(
            &registry,
            "ouvrir",
            &[Value::text(path.display().to_string())],
        )
        .expect("ouvrir should succeed");
        assert_eq!(
            call(&registry, "lire", &[handle.clone()]).unwrap(),
            Value::text("croquettes")
        );
        call(&registry, "fermer", &[handle.clone()]).unwrap();
        let err = call(&registry, "lire", &[handle]).unwrap_err();
        assert_eq!(err.code(), "E802");
    }

    #[test]
    fn ouvrir_reports_missing_files() {
        let registry = standard();
        let err = call(&registry, "ouvrir", &[Value::text("/nulle/part.txt")]).unwrap_err();
        assert_eq!(err.code(), "E801");
    }

    #[test]
    fn attendre_rejects_negative_durations() {
        let registry = standard();
        let err = call(&registry, "attendre", &[Value::int(-1)]).unwrap_err();
        assert_eq!(err.code(), "E800");
    }
}
