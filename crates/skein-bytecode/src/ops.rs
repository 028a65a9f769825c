/// A register number, local to one emitted definition.
pub type Reg = u16;

/// Index into a definition's data table.
pub type DataIdx = u32;

/// A branch target.
///
/// While code is being assembled the value is a symbolic label id; after
/// [`crate::Coder::relabel`] it is the index of the instruction the label
/// marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Label(pub u32);

/// One VM instruction.
///
/// Register ranges (`first`/`last`) are inclusive and empty when
/// `first > last`; `Array` with an empty range builds an empty array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Op {
    /// `dst <- nil`
    Nil { dst: Reg },
    /// `dst <- src`
    Mov { dst: Reg, src: Reg },
    /// `dst <- data[idx]`
    Data { dst: Reg, idx: DataIdx },
    /// Store `src` into the thunk in `rt` at the index held in `rti`.
    Set { rt: Reg, rti: Reg, src: Reg },
    /// Scatter the fields of the array in `src` into `first..=last`,
    /// branching to the pending fail target on arity mismatch.
    Split { first: Reg, last: Reg, src: Reg },
    /// Gather `first..=last` into a fresh array in `dst`.
    Array { dst: Reg, first: Reg, last: Reg },
    /// Load `first..=last` from the frame in `frame` starting at slot
    /// `offset`, branching to the pending fail target when the frame is
    /// too short.
    Takex {
        first: Reg,
        last: Reg,
        frame: Reg,
        offset: u16,
    },
    /// Append the fields of the frame in `frame` from slot `offset` on to
    /// the array in `src`, leaving the result in `dst`.
    Concatx {
        dst: Reg,
        src: Reg,
        frame: Reg,
        offset: u16,
    },
    /// Equality test; arms the next `Fail`.
    Test { lhs: Reg, rhs: Reg },
    /// Head-symbol test; arms the next `Fail`.
    Tag { lhs: Reg, rhs: Reg },
    /// Branch to `target` when the preceding test or load failed.
    Fail { target: Label },
    /// Transfer control to the thunk in `src`.
    Return { src: Reg },
}
