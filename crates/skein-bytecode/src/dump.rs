//! Human-readable disassembly of a code stream, for tests and debugging.

use std::fmt::Write as _;

use crate::ops::Op;

/// Render one instruction per line as `<index>: <mnemonic> <operands>`.
///
/// Registers print as `r<n>`, data-table references as `d<n>`, branch
/// targets as bare instruction indices (run [`crate::Coder::relabel`] first).
pub fn dump(code: &[Op]) -> String {
    let mut out = String::new();
    for (i, op) in code.iter().enumerate() {
        let _ = write!(out, "{i:4}: ");
        match *op {
            Op::Nil { dst } => {
                let _ = writeln!(out, "nil r{dst}");
            }
            Op::Mov { dst, src } => {
                let _ = writeln!(out, "mov r{dst}, r{src}");
            }
            Op::Data { dst, idx } => {
                let _ = writeln!(out, "data r{dst}, d{idx}");
            }
            Op::Set { rt, rti, src } => {
                let _ = writeln!(out, "set r{rt}, r{rti}, r{src}");
            }
            Op::Split { first, last, src } => {
                let _ = writeln!(out, "split r{first}, r{last}, r{src}");
            }
            Op::Array { dst, first, last } => {
                let _ = writeln!(out, "array r{dst}, r{first}, r{last}");
            }
            Op::Takex {
                first,
                last,
                frame,
                offset,
            } => {
                let _ = writeln!(out, "takex r{first}, r{last}, r{frame}, {offset}");
            }
            Op::Concatx {
                dst,
                src,
                frame,
                offset,
            } => {
                let _ = writeln!(out, "concatx r{dst}, r{src}, r{frame}, {offset}");
            }
            Op::Test { lhs, rhs } => {
                let _ = writeln!(out, "test r{lhs}, r{rhs}");
            }
            Op::Tag { lhs, rhs } => {
                let _ = writeln!(out, "tag r{lhs}, r{rhs}");
            }
            Op::Fail { target } => {
                let _ = writeln!(out, "fail {}", target.0);
            }
            Op::Return { src } => {
                let _ = writeln!(out, "return r{src}");
            }
        }
    }
    out
}
