mod common;

use alloy::primitives::{address, Address, U256};
use assert2::let_assert;
use common::{call, ctx, failing, op, precompile_call, precompile_call_with_input, ENTRY, SENDER};
use transfer_tracer::{
    extract, on_result, on_step, CallType, DecodeError, ExtractionState, Precompiles, StepError,
    Transfer, TransferKind,
};

const A: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
const B: Address = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
const C: Address = address!("cccccccccccccccccccccccccccccccccccccccc");

fn transfer(kind: TransferKind, from: Address, to: Address, value: u64) -> Transfer {
    Transfer {
        kind,
        from,
        to,
        value: U256::from(value),
    }
}

#[test]
fn single_direct_transfer() {
    let result = extract(
        &ctx(CallType::Call, 42),
        [op("PUSH1"), op("SSTORE"), op("STOP")],
        &Precompiles::default(),
    )
    .unwrap();
    assert_eq!(
        result.transfers,
        [transfer(TransferKind::Direct, SENDER, ENTRY, 42)]
    );
}

#[test]
fn revert_discards_everything() {
    let result = extract(
        &ctx(CallType::Call, 42),
        [
            call("CALL", ENTRY, A, 1),
            precompile_call(A, B, 2),
            op("REVERT"),
            // execution in an enclosing frame may carry on after the revert
            call("CALL", ENTRY, C, 3),
        ],
        &Precompiles::default(),
    )
    .unwrap();
    assert!(result.transfers.is_empty());
}

#[test]
fn execution_error_discards_everything() {
    let result = extract(
        &ctx(CallType::Call, 42),
        [call("CALL", ENTRY, A, 1), failing("SLOAD")],
        &Precompiles::default(),
    )
    .unwrap();
    assert!(result.transfers.is_empty());
}

#[test]
fn failing_call_is_not_recorded() {
    let mut state = ExtractionState::new();
    let mut step = call("CALL", ENTRY, A, 1);
    step.error = Some("insufficient balance for transfer".to_owned());
    on_step(&mut state, &step, &Precompiles::default()).unwrap();
    assert!(state.reverted());
    assert_eq!(state.transfers().count(), 0);
}

#[test]
fn delegatecall_never_transfers() {
    let result = extract(
        &ctx(CallType::Call, 0),
        [
            call("DELEGATECALL", ENTRY, A, 1_000),
            precompile_call(A, B, 5).with_op("DELEGATECALL"),
        ],
        &Precompiles::default(),
    )
    .unwrap();
    assert!(result.transfers.is_empty());
}

#[test]
fn callcode_transfers() {
    let result = extract(
        &ctx(CallType::Call, 0),
        [call("CALLCODE", ENTRY, A, 9)],
        &Precompiles::default(),
    )
    .unwrap();
    assert_eq!(
        result.transfers,
        [transfer(TransferKind::Nested, ENTRY, A, 9)]
    );
}

#[test]
fn staticcall_is_ignored() {
    let result = extract(
        &ctx(CallType::Call, 0),
        [call("STATICCALL", ENTRY, A, 9)],
        &Precompiles::default(),
    )
    .unwrap();
    assert!(result.transfers.is_empty());
}

#[test]
fn nested_transfers_most_recent_first() {
    let result = extract(
        &ctx(CallType::Call, 0),
        [call("CALL", ENTRY, A, 1), call("CALL", A, B, 2)],
        &Precompiles::default(),
    )
    .unwrap();
    assert_eq!(
        result.transfers,
        [
            transfer(TransferKind::Nested, A, B, 2),
            transfer(TransferKind::Nested, ENTRY, A, 1),
        ]
    );
}

#[test]
fn direct_transfer_goes_first() {
    let result = extract(
        &ctx(CallType::Call, 7),
        [call("CALL", ENTRY, A, 1), call("CALL", A, B, 2)],
        &Precompiles::default(),
    )
    .unwrap();
    assert_eq!(
        result.transfers,
        [
            transfer(TransferKind::Direct, SENDER, ENTRY, 7),
            transfer(TransferKind::Nested, A, B, 2),
            transfer(TransferKind::Nested, ENTRY, A, 1),
        ]
    );
}

#[test]
fn precompile_transfers_in_execution_order() {
    let result = extract(
        &ctx(CallType::Call, 0),
        [precompile_call(A, B, 1), precompile_call(B, C, 2)],
        &Precompiles::default(),
    )
    .unwrap();
    assert_eq!(
        result.transfers,
        [
            transfer(TransferKind::Precompile, A, B, 1),
            transfer(TransferKind::Precompile, B, C, 2),
        ]
    );
}

#[test]
fn precompile_transfers_follow_nested_ones() {
    let result = extract(
        &ctx(CallType::Call, 3),
        [
            precompile_call(A, B, 1),
            call("CALL", ENTRY, C, 4),
            precompile_call(B, C, 2),
            call("CALL", C, A, 5),
        ],
        &Precompiles::default(),
    )
    .unwrap();
    assert_eq!(
        result.transfers,
        [
            transfer(TransferKind::Direct, SENDER, ENTRY, 3),
            transfer(TransferKind::Nested, C, A, 5),
            transfer(TransferKind::Nested, ENTRY, C, 4),
            transfer(TransferKind::Precompile, A, B, 1),
            transfer(TransferKind::Precompile, B, C, 2),
        ]
    );
}

#[test]
fn zero_value_calls_are_skipped() {
    let result = extract(
        &ctx(CallType::Call, 0),
        [call("CALL", ENTRY, A, 0), call("CALLCODE", ENTRY, B, 0)],
        &Precompiles::default(),
    )
    .unwrap();
    assert!(result.transfers.is_empty());
}

#[test]
fn other_precompiles_are_skipped() {
    let ecrecover = Address::with_last_byte(0x01);
    let result = extract(
        &ctx(CallType::Call, 0),
        [call("CALL", ENTRY, ecrecover, 10)],
        &Precompiles::default(),
    )
    .unwrap();
    assert!(result.transfers.is_empty());
}

#[test]
fn short_precompile_input_aborts() {
    let mut state = ExtractionState::new();
    let step = precompile_call_with_input(&[0u8; 64]);
    let_assert!(Err(e) = on_step(&mut state, &step, &Precompiles::default()));
    assert_eq!(e, StepError::Decode(DecodeError::ShortInput { len: 64 }));
    assert_eq!(state.transfers().count(), 0);
}

#[test]
fn precompile_input_out_of_memory_aborts() {
    let mut step = precompile_call(A, B, 1);
    step.memory.truncate(0x80 + 40);
    let_assert!(
        Err(StepError::Decode(DecodeError::MemoryOutOfBounds { range, size })) = extract(
            &ctx(CallType::Call, 0),
            [step],
            &Precompiles::default()
        )
    );
    assert_eq!(range, 0x80..0x80 + 96);
    assert_eq!(size, 0x80 + 40);
}

#[test]
fn missing_operand_aborts() {
    let mut step = call("CALL", ENTRY, A, 1);
    step.stack.truncate(2);
    let_assert!(
        Err(StepError::StackUnderflow { depth: 2, .. }) = extract(
            &ctx(CallType::Call, 0),
            [step],
            &Precompiles::default()
        )
    );
}

#[test]
fn unknown_caller_is_an_error() {
    let mut step = call("CALL", ENTRY, A, 1);
    step.contract = None;
    let_assert!(
        Err(StepError::UnknownCaller { .. }) = extract(
            &ctx(CallType::Call, 0),
            [step],
            &Precompiles::default()
        )
    );
}

#[test]
fn state_is_consumed_by_the_assembler() {
    let precompiles = Precompiles::default();
    let mut state = ExtractionState::new();
    for step in [call("CALL", ENTRY, A, 1), precompile_call(A, B, 2)] {
        on_step(&mut state, &step, &precompiles).unwrap();
    }
    assert!(!state.reverted());
    assert_eq!(state.transfers().count(), 2);
    let result = on_result(&ctx(CallType::Call, 0), state);
    assert_eq!(result.transfers.len(), 2);
}
