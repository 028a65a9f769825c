//! The VM side of the skein compiler contract.
//!
//! The emitter produces [`Object`]s - data combinators, literal constants and
//! compiled bytecode combinators - and registers them with a [`Machine`].
//! The reduction engine that would evaluate them is a separate concern; this
//! crate only models the registry and the object algebra the compiler needs.

mod machine;
mod object;

pub use machine::Machine;
pub use object::{Object, ObjectRef};
