use super::{load_immediate, run_test, set_in_state, ExpectedState, ALL_REGISTERS};
use crate::cpu::registers::CpuRegister;
use std::collections::HashMap;

// A <- A op n, optionally with the carry flag set first
fn accumulator_test(opcode: u8, a: u8, operand: u8, carry: bool, expected_a: u8, expected_f: u8) {
    let set_carry = if carry { "37" } else { "" };
    run_test(
        &format!("3E{a:02X}{set_carry}{opcode:02X}{operand:02X}"),
        &ExpectedState { a: Some(expected_a), f: Some(expected_f), ..ExpectedState::empty() },
    );
}

#[test]
fn add_immediate() {
    accumulator_test(0xC6, 0x12, 0x34, false, 0x46, 0x00);
    accumulator_test(0xC6, 0x0F, 0x01, false, 0x10, 0x20);
    accumulator_test(0xC6, 0x3A, 0xC6, false, 0x00, 0xB0);
    accumulator_test(0xC6, 0xF0, 0x20, true, 0x10, 0x10);
}

#[test]
fn adc_immediate() {
    accumulator_test(0xCE, 0xE1, 0x0F, true, 0xF1, 0x20);
    accumulator_test(0xCE, 0xE1, 0x1E, true, 0x00, 0xB0);
    accumulator_test(0xCE, 0xE1, 0x1E, false, 0xFF, 0x00);
}

#[test]
fn sub_immediate() {
    accumulator_test(0xD6, 0x3E, 0x3E, false, 0x00, 0xC0);
    accumulator_test(0xD6, 0x3E, 0x0F, false, 0x2F, 0x60);
    accumulator_test(0xD6, 0x3E, 0x40, true, 0xFE, 0x50);
}

#[test]
fn sbc_immediate() {
    accumulator_test(0xDE, 0x3B, 0x2A, true, 0x10, 0x40);
    accumulator_test(0xDE, 0x3B, 0x4F, true, 0xEB, 0x70);
    accumulator_test(0xDE, 0x3B, 0x3B, false, 0x00, 0xC0);
}

#[test]
fn cp_immediate() {
    accumulator_test(0xFE, 0x3C, 0x2F, false, 0x3C, 0x60);
    accumulator_test(0xFE, 0x3C, 0x3C, false, 0x3C, 0xC0);
    accumulator_test(0xFE, 0x3C, 0x40, false, 0x3C, 0x50);
}

#[test]
fn logical_immediate() {
    // AND
    accumulator_test(0xE6, 0x5A, 0x3F, true, 0x1A, 0x20);
    accumulator_test(0xE6, 0x5A, 0x00, false, 0x00, 0xA0);
    // OR
    accumulator_test(0xF6, 0x5A, 0x03, true, 0x5B, 0x00);
    accumulator_test(0xF6, 0x00, 0x00, false, 0x00, 0x80);
    // XOR
    accumulator_test(0xEE, 0xFF, 0x0F, false, 0xF0, 0x00);
    accumulator_test(0xEE, 0xFF, 0xFF, true, 0x00, 0x80);
}

#[test]
fn add_register() {
    for register in ALL_REGISTERS {
        let opcode = 0x80 | register.to_opcode_bits();
        let (expected_a, expected_f) =
            if register == CpuRegister::A { (0x0A, 0x00) } else { (0x10, 0x20) };

        run_test(
            &format!("3E0B{}{opcode:02X}", load_immediate(register, 0x05)),
            &ExpectedState { a: Some(expected_a), f: Some(expected_f), ..ExpectedState::empty() },
        );
    }
}

#[test]
fn sub_register() {
    for register in ALL_REGISTERS {
        let opcode = 0x90 | register.to_opcode_bits();
        let (expected_a, expected_f) =
            if register == CpuRegister::A { (0x00, 0xC0) } else { (0x0F, 0x60) };

        run_test(
            &format!("3E10{}{opcode:02X}", load_immediate(register, 0x01)),
            &ExpectedState { a: Some(expected_a), f: Some(expected_f), ..ExpectedState::empty() },
        );
    }
}

#[test]
fn arithmetic_indirect_hl() {
    run_test(
        // LD HL, 0xC000; LD (HL), 0x05; LD A, 0x0B; ADD A, (HL)
        "2100C036053E0B86",
        &ExpectedState { a: Some(0x10), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // LD HL, 0xC000; LD (HL), 0xF0; LD A, 0x0F; OR (HL); XOR (HL)
        "2100C036F03E0FB6AE",
        &ExpectedState { a: Some(0x0F), f: Some(0x00), ..ExpectedState::empty() },
    );
}

#[test]
fn inc_dec_register() {
    for register in ALL_REGISTERS {
        let inc = 0x04 | (register.to_opcode_bits() << 3);
        let mut expected = ExpectedState { f: Some(0xB0), ..ExpectedState::empty() };
        set_in_state(&mut expected, register, 0x00);
        // SCF first: carry is preserved
        run_test(&format!("37{}{inc:02X}", load_immediate(register, 0xFF)), &expected);

        let dec = 0x05 | (register.to_opcode_bits() << 3);
        let mut expected = ExpectedState { f: Some(0x60), ..ExpectedState::empty() };
        set_in_state(&mut expected, register, 0x0F);
        run_test(&format!("{}{dec:02X}", load_immediate(register, 0x10)), &expected);
    }
}

#[test]
fn inc_dec_indirect_hl() {
    run_test(
        // LD HL, 0xC000; LD (HL), 0x0F; INC (HL)
        "2100C0360F34",
        &ExpectedState {
            f: Some(0x20),
            memory: HashMap::from([(0xC000, 0x10)]),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC000; LD (HL), 0x01; DEC (HL)
        "2100C0360135",
        &ExpectedState {
            f: Some(0xC0),
            memory: HashMap::from([(0xC000, 0x00)]),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn add_hl_register_pair() {
    run_test(
        // LD HL, 0x0FFF; LD BC, 0x0001; ADD HL, BC
        "21FF0F01010009",
        &ExpectedState { h: Some(0x10), l: Some(0x00), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // XOR A; LD HL, 0x8000; ADD HL, HL
        "AF21008029",
        &ExpectedState { h: Some(0x00), l: Some(0x00), f: Some(0x90), ..ExpectedState::empty() },
    );

    run_test(
        // LD SP, 0x0001; LD HL, 0xFFFF; ADD HL, SP
        "31010021FFFF39",
        &ExpectedState { h: Some(0x00), l: Some(0x00), f: Some(0x30), ..ExpectedState::empty() },
    );
}

#[test]
fn inc_dec_register_pair() {
    run_test(
        // XOR A; LD BC, 0xFFFF; INC BC; DEC DE
        "AF01FFFF031B",
        &ExpectedState {
            b: Some(0x00),
            c: Some(0x00),
            d: Some(0xFF),
            e: Some(0xFF),
            f: Some(0x80),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn add_sp_offset() {
    run_test(
        // LD SP, 0xFFF8; ADD SP, 8
        "31F8FFE808",
        &ExpectedState { sp: Some(0x0000), f: Some(0x30), ..ExpectedState::empty() },
    );

    run_test(
        // XOR A; LD SP, 0x1000; ADD SP, -2
        "AF310010E8FE",
        &ExpectedState { sp: Some(0x0FFE), f: Some(0x00), ..ExpectedState::empty() },
    );
}

#[test]
fn decimal_adjust() {
    run_test(
        // LD A, 0x15; ADD A, 0x27; DAA
        "3E15C62727",
        &ExpectedState { a: Some(0x42), f: Some(0x00), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x99; ADD A, 0x01; DAA
        "3E99C60127",
        &ExpectedState { a: Some(0x00), f: Some(0x90), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x10; SUB 0x01; DAA
        "3E10D60127",
        &ExpectedState { a: Some(0x09), f: Some(0x40), ..ExpectedState::empty() },
    );
}

#[test]
fn flag_and_accumulator_ops() {
    run_test(
        // LD A, 0x35; CPL
        "3E352F",
        &ExpectedState { a: Some(0xCA), f: Some(0x60), ..ExpectedState::empty() },
    );

    // SCF / CCF leave Z alone and clear N and H
    run_test("AF37", &ExpectedState { f: Some(0x90), ..ExpectedState::empty() });
    run_test("AF373F", &ExpectedState { f: Some(0x80), ..ExpectedState::empty() });
    run_test("3E10D60137", &ExpectedState { f: Some(0x10), ..ExpectedState::empty() });
}
