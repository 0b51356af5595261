use super::{load_immediate, run_test, set_in_state, ExpectedState, ALL_REGISTERS};
use std::collections::HashMap;

#[test]
fn load_register_immediate() {
    for (i, register) in ALL_REGISTERS.into_iter().enumerate() {
        let value = 0x11 * (i as u8 + 1);

        let mut expected = ExpectedState::empty();
        set_in_state(&mut expected, register, value);
        run_test(&load_immediate(register, value), &expected);
    }
}

#[test]
fn load_register_register() {
    for source in ALL_REGISTERS {
        for destination in ALL_REGISTERS {
            let opcode = 0x40 | (destination.to_opcode_bits() << 3) | source.to_opcode_bits();

            let mut expected = ExpectedState::empty();
            set_in_state(&mut expected, destination, 0x9C);
            set_in_state(&mut expected, source, 0x9C);
            run_test(&format!("{}{opcode:02X}", load_immediate(source, 0x9C)), &expected);
        }
    }
}

#[test]
fn load_indirect_hl() {
    run_test(
        // LD HL, 0xC234; LD (HL), 0x77; LD A, (HL); LD B, (HL)
        "2134C236777E46",
        &ExpectedState {
            a: Some(0x77),
            b: Some(0x77),
            h: Some(0xC2),
            l: Some(0x34),
            memory: HashMap::from([(0xC234, 0x77)]),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC100; LD E, 0x3D; LD (HL), E
        "2100C11E3D73",
        &ExpectedState { memory: HashMap::from([(0xC100, 0x3D)]), ..ExpectedState::empty() },
    );
}

#[test]
fn load_indirect_hl_inc_dec() {
    run_test(
        // LD HL, 0xC000; LD A, 0x5A; LD (HL+), A; LD (HL-), A; LD A, (HL-)
        "2100C03E5A22323A",
        &ExpectedState {
            a: Some(0x5A),
            h: Some(0xBF),
            l: Some(0xFF),
            memory: HashMap::from([(0xC000, 0x5A), (0xC001, 0x5A)]),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC0FF; LD (HL), 0x21; LD A, (HL+)
        "21FFC036212A",
        &ExpectedState { a: Some(0x21), h: Some(0xC1), l: Some(0x00), ..ExpectedState::empty() },
    );
}

#[test]
fn load_high_page() {
    run_test(
        // LD A, 0x42; LDH (0x80), A; LD C, 0x81; LD (C), A; XOR A; LDH A, (0x80); LD B, A;
        // XOR A; LD A, (C)
        "3E42E0800E81E2AFF08047AFF2",
        &ExpectedState {
            a: Some(0x42),
            b: Some(0x42),
            f: Some(0x80),
            memory: HashMap::from([(0xFF80, 0x42), (0xFF81, 0x42)]),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_direct_and_register_pair_indirect() {
    run_test(
        // LD A, 0x99; LD (0xC010), A; XOR A; LD A, (0xC010); LD DE, 0xC011; LD (DE), A;
        // LD BC, 0xC011; LD (BC), A
        "3E99EA10C0AFFA10C01111C0120111C002",
        &ExpectedState {
            a: Some(0x99),
            memory: HashMap::from([(0xC010, 0x99), (0xC011, 0x99)]),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD BC, 0xC020; LD HL, 0xC020; LD (HL), 0x5E; LD A, (BC)
        "0120C02120C0365E0A",
        &ExpectedState { a: Some(0x5E), ..ExpectedState::empty() },
    );

    run_test(
        // LD DE, 0xC021; LD HL, 0xC021; LD (HL), 0x6F; LD A, (DE)
        "1121C02121C0366F1A",
        &ExpectedState { a: Some(0x6F), ..ExpectedState::empty() },
    );
}

#[test]
fn load_stack_pointer() {
    run_test(
        // LD SP, 0xDCFE; LD (0xC020), SP
        "31FEDC0820C0",
        &ExpectedState {
            sp: Some(0xDCFE),
            memory: HashMap::from([(0xC020, 0xFE), (0xC021, 0xDC)]),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC234; LD SP, HL
        "2134C2F9",
        &ExpectedState { sp: Some(0xC234), ..ExpectedState::empty() },
    );
}

#[test]
fn load_hl_stack_pointer_offset() {
    run_test(
        // LD SP, 0xFFF8; LD HL, SP+8
        "31F8FFF808",
        &ExpectedState { h: Some(0x00), l: Some(0x00), f: Some(0x30), ..ExpectedState::empty() },
    );

    run_test(
        // XOR A; LD SP, 0x1000; LD HL, SP-2
        "AF310010F8FE",
        &ExpectedState { h: Some(0x0F), l: Some(0xFE), f: Some(0x00), ..ExpectedState::empty() },
    );
}

#[test]
fn push_pop() {
    run_test(
        // LD SP, 0xD000; LD BC, 0x1234; PUSH BC; POP DE; LD BC, 0x12FF; PUSH BC; POP AF
        "3100D0013412C5D101FF12C5F1",
        &ExpectedState {
            a: Some(0x12),
            f: Some(0xF0),
            d: Some(0x12),
            e: Some(0x34),
            sp: Some(0xD000),
            memory: HashMap::from([(0xCFFE, 0xFF), (0xCFFF, 0x12)]),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xD000; LD HL, 0xBEEF; PUSH HL; POP BC
        "3100D021EFBEE5C1",
        &ExpectedState { b: Some(0xBE), c: Some(0xEF), sp: Some(0xD000), ..ExpectedState::empty() },
    );
}
