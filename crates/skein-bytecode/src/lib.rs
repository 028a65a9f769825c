//! Instruction set and code-stream builder for the skein register VM.
//!
//! The machine reduces graphs of thunks. Each combinator invocation runs
//! against a frame whose slots follow a fixed calling convention:
//! slot 0 holds the result thunk (`rt`), slot 1 the result index (`rti`),
//! slot 2 the continuation (`k`), slot 3 the exception handler (`exc`),
//! slot 4 the combinator itself, and slots 5.. the arguments.
//!
//! The [`Coder`] assembles one definition at a time: registers are handed out
//! monotonically, branch targets are symbolic [`Label`]s until
//! [`Coder::relabel`] patches them to instruction indices, and constants are
//! interned into a per-definition data table.

mod coder;
mod dump;
mod ops;

#[cfg(test)]
mod coder_tests;

pub use coder::{Coder, CoderError};
pub use dump::dump;
pub use ops::{DataIdx, Label, Op, Reg};

/// Frame slot of the first argument; slots 0..4 are rt, rti, k, exc, c.
pub const FRAME_ARG_OFFSET: u16 = 5;

/// Frame slot holding the combinator of a thunk.
pub const FRAME_COMBINATOR_SLOT: u16 = 4;
