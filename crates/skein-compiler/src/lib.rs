//! Compiler front end for the skein combinator language.
//!
//! Source text is lexed and parsed into an AST, names are resolved and the
//! namespace flattened (`semantic`), surface constructs are rewritten away
//! (`desugar`), nested blocks are lambda-lifted into top-level combinator
//! definitions (`lift`), and each definition is emitted as bytecode for the
//! register VM (`emit`).
//!
//! Pipeline modules:
//! - `ast` - the tree algebra and its position-ignoring structural order
//! - `walk` - the transform / rewrite / visit traversal framework
//! - `environment` - namespace tree and lexical ranges
//! - `lexer` / `parser` - surface syntax to AST
//! - `semantic` - declare + identify
//! - `desugar` - the ordered surface-elimination pipeline
//! - `lift` - eta / deapply / lift / relambda
//! - `emit` - data registration and bytecode emission
//! - `prelude` - the seeded `System` namespace of primitive combinators

pub mod ast;
pub mod desugar;
pub mod emit;
pub mod environment;
pub mod lexer;
pub mod lift;
pub mod literal;
pub mod parser;
pub mod prelude;
pub mod semantic;
pub mod walk;

use skein_core::Result;
use skein_vm::{Machine, ObjectRef};

use ast::AstRef;
use environment::NamespaceRef;

/// Run the whole middle end over a parsed module.
///
/// Declares and identifies names against `env`, desugars and lifts the tree,
/// then registers data combinators and emitted bytecode with `machine`.
/// Returns the registered objects in definition order.
pub fn compile(machine: &mut Machine, env: &NamespaceRef, module: &AstRef) -> Result<Vec<ObjectRef>> {
    semantic::declare(env, module)?;
    let module = semantic::identify(env, module)?;
    let module = desugar::desugar(&module)?;
    let module = lift::lift(&module)?;
    let mut out = emit::emit_data(machine, &module)?;
    out.extend(emit::emit_code(machine, &module)?);
    Ok(out)
}

/// Parse `text` and run [`compile`] on the result.
pub fn compile_source(
    machine: &mut Machine,
    env: &NamespaceRef,
    source_name: &str,
    text: &str,
) -> Result<Vec<ObjectRef>> {
    let module = parser::parse_module(source_name, text)?;
    compile(machine, env, &module)
}

#[cfg(test)]
mod emit_tests;
#[cfg(test)]
mod environment_tests;
#[cfg(test)]
mod parser_tests;
#[cfg(test)]
mod pipeline_tests;
#[cfg(test)]
mod semantic_tests;
#[cfg(test)]
mod walk_tests;
