//! The seeded `System` namespace of primitive combinators.
//!
//! The driver installs these before the semantic pass runs: the desugarer
//! references `true`, `tuple`, `cons`, `nil`, `object`, `extend`, `throw`
//! and `id` directly, the parser lowers infix operators and unary minus to
//! the named operators, and the emitter resolves them all against the
//! machine. Their reduction rules live in the builtins library, outside the
//! front end, so they register as inert objects here.

use skein_core::qualify;
use skein_vm::{Machine, Object};

use crate::environment::{NamespaceRef, declare_implicit};

/// Nullary constructors, matched by value or head symbol.
const DATA_COMBINATORS: &[&str] = &["true", "false", "nil", "cons", "tuple"];

/// Primitives with out-of-line reduction rules.
const OPAQUE_COMBINATORS: &[&str] = &[
    "object", "extend", "throw", "id", "neg", "&&", "||", "|>", "==", "/=", "<", "<=", ">", ">=",
    "+", "-", "*", "/",
];

/// Declare the prelude in `env` and register its objects with `machine`.
/// Installing twice is harmless.
pub fn install(machine: &mut Machine, env: &NamespaceRef) {
    let system = vec!["System".to_string()];
    for name in DATA_COMBINATORS {
        let symbol = qualify(&system, name);
        declare_implicit(env, &system, name, &symbol);
        machine.define_data(Object::data(symbol));
    }
    for name in OPAQUE_COMBINATORS {
        let symbol = qualify(&system, name);
        declare_implicit(env, &system, name, &symbol);
        machine.define_data(Object::opaque(symbol));
    }
}
