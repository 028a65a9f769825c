use indexmap::IndexMap;
use skein_core::qualify;

use crate::object::{Object, ObjectRef};

/// The combinator registry.
///
/// Bindings are kept in definition order. Looking up a combinator that has
/// not been defined yet interns a forward data stub under its symbol, so a
/// definition being emitted can reference itself (or a later sibling); the
/// stub is replaced when [`Machine::define_data`] lands the real object.
#[derive(Debug, Default)]
pub struct Machine {
    combinators: IndexMap<String, ObjectRef>,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a combinator object under its symbol, replacing any earlier
    /// binding (including forward stubs).
    pub fn define_data(&mut self, object: ObjectRef) {
        let symbol = object
            .symbol()
            .expect("define_data: object without a symbol")
            .to_string();
        self.combinators.insert(symbol, object);
    }

    pub fn has_combinator(&self, path: &[String], name: &str) -> bool {
        self.combinators.contains_key(&qualify(path, name))
    }

    /// Resolve a combinator, interning a forward stub when unknown.
    pub fn get_combinator(&mut self, path: &[String], name: &str) -> ObjectRef {
        let symbol = qualify(path, name);
        self.combinators
            .entry(symbol.clone())
            .or_insert_with(|| Object::data(symbol))
            .clone()
    }

    /// Look up a combinator without interning.
    pub fn find_combinator(&self, symbol: &str) -> Option<&ObjectRef> {
        self.combinators.get(symbol)
    }

    pub fn is_data(&self, object: &Object) -> bool {
        object.is_data()
    }

    pub fn is_opaque(&self, object: &Object) -> bool {
        object.is_opaque()
    }

    pub fn create_integer(&self, value: i64) -> ObjectRef {
        ObjectRef::new(Object::Integer(value))
    }

    pub fn create_float(&self, value: f64) -> ObjectRef {
        ObjectRef::new(Object::Float(value))
    }

    pub fn create_char(&self, value: char) -> ObjectRef {
        ObjectRef::new(Object::Char(value))
    }

    pub fn create_text(&self, value: impl Into<String>) -> ObjectRef {
        ObjectRef::new(Object::Text(value.into()))
    }

    /// Symbols in definition order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.combinators.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.combinators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinators.is_empty()
    }
}
