//! Environment chain: one frame per scope, linked through parent handles.
//!
//! Frames are shared (`Rc`) because closures keep their defining frame alive
//! past the lexical scope that created it. Bindings use interior mutability;
//! the interpreter is single-threaded.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::Value;

#[derive(Debug, Default)]
pub struct Env {
    parent: Option<Rc<Env>>,
    bindings: RefCell<HashMap<String, Value>>,
}

impl Env {
    pub fn root() -> Rc<Env> {
        Rc::new(Env::default())
    }

    pub fn child(parent: &Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            parent: Some(Rc::clone(parent)),
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// Creates or overwrites a binding in this frame.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Updates the nearest enclosing frame that binds `name`; defines the
    /// name in this frame when no enclosing frame has it.
    pub fn assign(&self, name: &str, value: Value) {
        if !self.update_existing(name, &value) {
            self.define(name, value);
        }
    }

    fn update_existing(&self, name: &str, value: &Value) -> bool {
        if let Some(slot) = self.bindings.borrow_mut().get_mut(name) {
            *slot = value.clone();
            return true;
        }
        self.parent
            .as_ref()
            .is_some_and(|parent| parent.update_existing(name, value))
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    /// The bindings of this frame alone, parents excluded. The module loader
    /// uses this to capture a namespace from a module's top-level frame.
    pub fn local_bindings(&self) -> HashMap<String, Value> {
        self.bindings.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_the_parent_chain() {
        let root = Env::root();
        root.define("x", Value::int(1));
        let inner = Env::child(&root);
        assert_eq!(inner.lookup("x"), Some(Value::int(1)));
        assert_eq!(inner.lookup("y"), None);
    }

    #[test]
    fn define_shadows_without_touching_the_parent() {
        let root = Env::root();
        root.define("x", Value::int(1));
        let inner = Env::child(&root);
        inner.define("x", Value::int(2));
        assert_eq!(inner.lookup("x"), Some(Value::int(2)));
        assert_eq!(root.lookup("x"), Some(Value::int(1)));
    }

    #[test]
    fn assign_updates_the_nearest_binding_frame() {
        let root = Env::root();
        root.define("x", Value::int(1));
        let inner = Env::child(&root);
        inner.assign("x", Value::int(5));
        assert_eq!(root.lookup("x"), Some(Value::int(5)));
        assert!(inner.local_bindings().is_empty());
    }

    #[test]
    fn assign_falls_back_to_the_current_frame() {
        let root = Env::root();
        let inner = Env::child(&root);
        inner.assign("fresh", Value::int(7));
        assert_eq!(inner.lookup("fresh"), Some(Value::int(7)));
        assert_eq!(root.lookup("fresh"), None);
    }
}
