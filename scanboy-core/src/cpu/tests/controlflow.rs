use super::{machine_with_program, run_test, step_until, ExpectedState};
use std::collections::HashMap;

#[test]
fn jump() {
    run_test(
        // JP 0x0155; LD A, 0x11; LD B, 0x22
        "C355013E110622",
        &ExpectedState { a: Some(0x00), b: Some(0x22), ..ExpectedState::empty() },
    );

    run_test(
        // LD HL, 0x0156; JP HL; LD A, 0x11; LD B, 0x22
        "215601E93E110622",
        &ExpectedState { a: Some(0x00), b: Some(0x22), ..ExpectedState::empty() },
    );
}

#[test]
fn conditional_jump() {
    run_test(
        // XOR A; JP NZ, 0x0157; LD C, 0x11; NOP; LD B, 0x22
        "AFC257010E11000622",
        &ExpectedState { b: Some(0x22), c: Some(0x11), ..ExpectedState::empty() },
    );

    run_test(
        // XOR A; JP Z, 0x0157; LD C, 0x11; NOP; LD B, 0x22
        "AFCA57010E11000622",
        &ExpectedState { b: Some(0x22), c: Some(0x00), ..ExpectedState::empty() },
    );
}

#[test]
fn relative_jump() {
    run_test(
        // JR +2; LD A, 0x11; LD B, 0x22
        "18023E110622",
        &ExpectedState { a: Some(0x00), b: Some(0x22), ..ExpectedState::empty() },
    );

    run_test(
        // LD B, 3; loop: INC C; DEC B; JR NZ, loop
        "06030C0520FC",
        &ExpectedState { b: Some(0x00), c: Some(0x03), f: Some(0xC0), ..ExpectedState::empty() },
    );
}

#[test]
fn call_and_return() {
    run_test(
        // LD SP, 0xD000; CALL 0x015A; LD B, 0x22; JR +3; LD C, 0x33; RET
        "3100D0CD5A01062218030E33C9",
        &ExpectedState {
            b: Some(0x22),
            c: Some(0x33),
            sp: Some(0xD000),
            memory: HashMap::from([(0xCFFE, 0x56), (0xCFFF, 0x01)]),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xD000; XOR A; CALL NZ, 0x0000; RET NZ; LD C, 0x44
        "3100D0AFC40000C00E44",
        &ExpectedState { c: Some(0x44), sp: Some(0xD000), ..ExpectedState::empty() },
    );
}

#[test]
fn restart_call() {
    // LD SP, 0xD000; RST 0x28
    let (mut state, _) = machine_with_program("3100D0EF", 0x00);
    step_until(&mut state, 0x0028);

    assert_eq!(0xCFFE, state.cpu_registers.sp);
    assert_eq!(0x0154, state.read_address_u16(0xCFFE));
}
