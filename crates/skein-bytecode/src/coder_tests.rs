use crate::{Coder, CoderError, Label, Op};

#[test]
fn registers_are_monotonic() {
    let mut coder: Coder<i64> = Coder::new();
    assert_eq!(coder.generate_register(), 0);
    assert_eq!(coder.generate_register(), 1);
    assert_eq!(coder.generate_register(), 2);
}

#[test]
fn mark_and_restore_roll_the_counter_back_exactly() {
    let mut coder: Coder<i64> = Coder::new();
    coder.generate_register();
    let mark = coder.peek_register();
    coder.generate_register();
    coder.generate_register();
    coder.restore_register(mark);
    assert_eq!(coder.generate_register(), mark);
}

#[test]
fn intern_data_deduplicates_equal_entries() {
    let mut coder: Coder<i64> = Coder::new();
    let a = coder.intern_data(42);
    let b = coder.intern_data(7);
    let c = coder.intern_data(42);
    assert_eq!(a, c);
    assert_ne!(a, b);
}

#[test]
fn relabel_patches_fail_targets_to_instruction_indices() {
    let mut coder: Coder<i64> = Coder::new();
    let l = coder.generate_label();
    let r0 = coder.generate_register();
    let r1 = coder.generate_register();
    coder.emit_test(r0, r1);
    coder.emit_fail(l);
    coder.emit_return(r0);
    coder.emit_label(l);
    coder.emit_nil(r0);

    coder.relabel().unwrap();
    assert_eq!(coder.code()[1], Op::Fail { target: Label(3) });
}

#[test]
fn relabel_reports_labels_that_were_never_placed() {
    let mut coder: Coder<i64> = Coder::new();
    let l = coder.generate_label();
    coder.emit_fail(l);
    assert_eq!(coder.relabel(), Err(CoderError::UnplacedLabel(0)));
}

#[test]
fn finish_returns_the_stream_and_resets() {
    let mut coder: Coder<i64> = Coder::new();
    let r = coder.generate_register();
    coder.intern_data(1);
    coder.emit_return(r);

    let (code, data) = coder.finish();
    assert_eq!(code, vec![Op::Return { src: 0 }]);
    assert_eq!(data, vec![1]);
    assert_eq!(coder.peek_register(), 0);
    assert!(coder.code().is_empty());
}
