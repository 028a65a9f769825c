use crate::ops::{DataIdx, Label, Op, Reg};

/// Errors raised while finishing a code stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoderError {
    #[error("label {0} branched to but never placed")]
    UnplacedLabel(u32),
}

/// Builder for one definition's code stream and data table.
///
/// Registers are allocated monotonically. Sibling match clauses roll the
/// counter back with [`Coder::peek_register`] / [`Coder::restore_register`]
/// so they share the same address space. `D` is the data-table entry type;
/// entries are deduplicated by equality.
#[derive(Debug)]
pub struct Coder<D> {
    code: Vec<Op>,
    data: Vec<D>,
    next_register: Reg,
    labels: Vec<Option<u32>>,
}

impl<D: PartialEq> Coder<D> {
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            data: Vec::new(),
            next_register: 0,
            labels: Vec::new(),
        }
    }

    /// Allocate the next register.
    pub fn generate_register(&mut self) -> Reg {
        let r = self.next_register;
        self.next_register += 1;
        r
    }

    /// The register the next allocation would return.
    pub fn peek_register(&self) -> Reg {
        self.next_register
    }

    /// Roll the register counter back to a mark taken with `peek_register`.
    pub fn restore_register(&mut self, mark: Reg) {
        self.next_register = mark;
    }

    /// Allocate a fresh symbolic label.
    pub fn generate_label(&mut self) -> Label {
        let l = Label(self.labels.len() as u32);
        self.labels.push(None);
        l
    }

    /// Place a label at the current end of the code stream.
    pub fn emit_label(&mut self, label: Label) {
        self.labels[label.0 as usize] = Some(self.code.len() as u32);
    }

    /// Intern a constant into the data table, reusing an equal entry.
    pub fn intern_data(&mut self, value: D) -> DataIdx {
        if let Some(idx) = self.data.iter().position(|d| *d == value) {
            return idx as DataIdx;
        }
        self.data.push(value);
        (self.data.len() - 1) as DataIdx
    }

    pub fn emit_nil(&mut self, dst: Reg) {
        self.code.push(Op::Nil { dst });
    }

    pub fn emit_mov(&mut self, dst: Reg, src: Reg) {
        self.code.push(Op::Mov { dst, src });
    }

    pub fn emit_data(&mut self, dst: Reg, idx: DataIdx) {
        self.code.push(Op::Data { dst, idx });
    }

    pub fn emit_set(&mut self, rt: Reg, rti: Reg, src: Reg) {
        self.code.push(Op::Set { rt, rti, src });
    }

    pub fn emit_split(&mut self, first: Reg, last: Reg, src: Reg) {
        self.code.push(Op::Split { first, last, src });
    }

    pub fn emit_array(&mut self, dst: Reg, first: Reg, last: Reg) {
        self.code.push(Op::Array { dst, first, last });
    }

    pub fn emit_takex(&mut self, first: Reg, last: Reg, frame: Reg, offset: u16) {
        self.code.push(Op::Takex {
            first,
            last,
            frame,
            offset,
        });
    }

    pub fn emit_concatx(&mut self, dst: Reg, src: Reg, frame: Reg, offset: u16) {
        self.code.push(Op::Concatx {
            dst,
            src,
            frame,
            offset,
        });
    }

    pub fn emit_test(&mut self, lhs: Reg, rhs: Reg) {
        self.code.push(Op::Test { lhs, rhs });
    }

    pub fn emit_tag(&mut self, lhs: Reg, rhs: Reg) {
        self.code.push(Op::Tag { lhs, rhs });
    }

    pub fn emit_fail(&mut self, target: Label) {
        self.code.push(Op::Fail { target });
    }

    pub fn emit_return(&mut self, src: Reg) {
        self.code.push(Op::Return { src });
    }

    /// Patch every branch target from its symbolic label to the instruction
    /// index the label was placed at.
    pub fn relabel(&mut self) -> Result<(), CoderError> {
        for op in &mut self.code {
            if let Op::Fail { target } = op {
                let placed = self.labels[target.0 as usize]
                    .ok_or(CoderError::UnplacedLabel(target.0))?;
                *target = Label(placed);
            }
        }
        Ok(())
    }

    pub fn code(&self) -> &[Op] {
        &self.code
    }

    /// Take the finished code stream and data table, leaving the coder ready
    /// for the next definition.
    pub fn finish(&mut self) -> (Vec<Op>, Vec<D>) {
        let code = std::mem::take(&mut self.code);
        let data = std::mem::take(&mut self.data);
        self.reset();
        (code, data)
    }

    /// Drop any partial state and start over.
    pub fn reset(&mut self) {
        self.code.clear();
        self.data.clear();
        self.next_register = 0;
        self.labels.clear();
    }
}

impl<D: PartialEq> Default for Coder<D> {
    fn default() -> Self {
        Self::new()
    }
}
