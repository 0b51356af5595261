use super::{load_immediate, run_test, set_in_state, ExpectedState, ALL_REGISTERS};
use std::collections::HashMap;

#[test]
fn accumulator_rotates_never_set_zero() {
    // RLCA
    run_test("3E8507", &ExpectedState { a: Some(0x0B), f: Some(0x10), ..ExpectedState::empty() });
    run_test("AF07", &ExpectedState { a: Some(0x00), f: Some(0x00), ..ExpectedState::empty() });

    // RLA
    run_test("3E9517", &ExpectedState { a: Some(0x2A), f: Some(0x10), ..ExpectedState::empty() });
    run_test("373E9517", &ExpectedState { a: Some(0x2B), f: Some(0x10), ..ExpectedState::empty() });

    // RRCA
    run_test("3E3B0F", &ExpectedState { a: Some(0x9D), f: Some(0x10), ..ExpectedState::empty() });

    // RRA
    run_test("3E811F", &ExpectedState { a: Some(0x40), f: Some(0x10), ..ExpectedState::empty() });
    run_test("373E811F", &ExpectedState { a: Some(0xC0), f: Some(0x10), ..ExpectedState::empty() });
}

#[test]
fn prefixed_rotates() {
    // RLC B
    run_test("0685CB00", &ExpectedState { b: Some(0x0B), f: Some(0x10), ..ExpectedState::empty() });
    run_test("0600CB00", &ExpectedState { b: Some(0x00), f: Some(0x80), ..ExpectedState::empty() });

    // RRC C
    run_test("0E01CB09", &ExpectedState { c: Some(0x80), f: Some(0x10), ..ExpectedState::empty() });

    // RR D
    run_test("1601CB1A", &ExpectedState { d: Some(0x00), f: Some(0x90), ..ExpectedState::empty() });

    run_test(
        // LD HL, 0xC000; LD (HL), 0x80; RL (HL)
        "2100C03680CB16",
        &ExpectedState {
            f: Some(0x90),
            memory: HashMap::from([(0xC000, 0x00)]),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn shifts() {
    // SLA E
    run_test("1EFFCB23", &ExpectedState { e: Some(0xFE), f: Some(0x10), ..ExpectedState::empty() });

    // SRA H keeps the sign bit
    run_test("268ACB2C", &ExpectedState { h: Some(0xC5), f: Some(0x00), ..ExpectedState::empty() });

    // SRL A
    run_test("3E01CB3F", &ExpectedState { a: Some(0x00), f: Some(0x90), ..ExpectedState::empty() });

    run_test(
        // LD HL, 0xC000; LD (HL), 0x81; SRA (HL)
        "2100C03681CB2E",
        &ExpectedState {
            f: Some(0x10),
            memory: HashMap::from([(0xC000, 0xC0)]),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn swap() {
    for register in ALL_REGISTERS {
        let opcode = 0x30 | register.to_opcode_bits();

        let mut expected = ExpectedState { f: Some(0x00), ..ExpectedState::empty() };
        set_in_state(&mut expected, register, 0x21);
        run_test(&format!("37{}CB{opcode:02X}", load_immediate(register, 0x12)), &expected);

        let mut expected = ExpectedState { f: Some(0x80), ..ExpectedState::empty() };
        set_in_state(&mut expected, register, 0x00);
        run_test(&format!("{}CB{opcode:02X}", load_immediate(register, 0x00)), &expected);
    }
}
