mod arithmetic;
mod bitshift;
mod controlflow;
mod load;

use crate::cpu::registers::CpuRegister;
use crate::startup::EmulationState;
use crate::EmulatorConfig;
use std::collections::HashMap;

const PROGRAM_START: u16 = 0x0150;

struct ExpectedState {
    a: Option<u8>,
    f: Option<u8>,
    b: Option<u8>,
    c: Option<u8>,
    d: Option<u8>,
    e: Option<u8>,
    h: Option<u8>,
    l: Option<u8>,
    sp: Option<u16>,
    memory: HashMap<u16, u8>,
}

macro_rules! compare_values {
    ($([$name:literal, $expected:expr, $actual:expr]),+$(,)?) => {
        {
            let mut mismatches = Vec::new();
            $(
                if let Some(expected) = $expected {
                    let actual = $actual;
                    if expected != actual {
                        mismatches.push(format!(
                            "{} mismatch: expected 0x{expected:02X}, actual 0x{actual:02X}",
                            $name
                        ));
                    }
                }
            )*
            mismatches
        }
    };
}

impl ExpectedState {
    fn empty() -> Self {
        Self {
            a: None,
            f: None,
            b: None,
            c: None,
            d: None,
            e: None,
            h: None,
            l: None,
            sp: None,
            memory: HashMap::new(),
        }
    }

    fn assert_matches(&self, state: &EmulationState) {
        let registers = &state.cpu_registers;
        let mut mismatches = compare_values!(
            ["A", self.a, registers.accumulator],
            ["F", self.f, registers.flags],
            ["B", self.b, registers.b],
            ["C", self.c, registers.c],
            ["D", self.d, registers.d],
            ["E", self.e, registers.e],
            ["H", self.h, registers.h],
            ["L", self.l, registers.l],
            ["SP", self.sp, registers.sp],
        );

        for (&address, &expected) in &self.memory {
            let actual = state.read_address_u8(address);
            if expected != actual {
                mismatches.push(format!(
                    "memory mismatch at 0x{address:04X}: expected 0x{expected:02X}, actual 0x{actual:02X}"
                ));
            }
        }

        assert!(mismatches.is_empty(), "state does not match: [{}]", mismatches.join("], ["));
    }
}

fn parse_program(program_hex: &str) -> Vec<u8> {
    assert!(program_hex.len() % 2 == 0, "program length {} is odd", program_hex.len());

    (0..program_hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&program_hex[i..i + 2], 16)
                .unwrap_or_else(|_| panic!("invalid hex in program: '{program_hex}'"))
        })
        .collect()
}

/// Power on a machine whose cartridge jumps straight to the given program, with A-L and F
/// cleared and IME off. Returns the machine and the address just past the program.
fn machine_with_program(program_hex: &str, cgb_flag: u8) -> (EmulationState, u16) {
    let mut rom = vec![0x00; usize::from(PROGRAM_START)];
    // NOP; JP 0x0150
    rom[0x100..0x104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);
    rom[0x143] = cgb_flag;
    rom.extend(parse_program(program_hex));

    let program_end = rom.len() as u16;
    rom.resize(0x8000, 0x00);

    let mut state = EmulationState::new(rom, None, EmulatorConfig::default())
        .expect("synthesized test ROM should be valid");
    for register in ALL_REGISTERS {
        state.cpu_registers.set_register(register, 0x00);
    }
    state.cpu_registers.flags = 0x00;
    state.cpu_registers.ime = false;

    (state, program_end)
}

fn run_to_end(state: &mut EmulationState, program_end: u16) {
    while state.cpu_registers.pc < program_end {
        state.execute_iteration();
    }
}

/// Execute instructions until PC reaches `pc`, panicking if it never does.
fn step_until(state: &mut EmulationState, pc: u16) {
    for _ in 0..10_000 {
        if state.cpu_registers.pc == pc {
            return;
        }
        state.execute_iteration();
    }

    panic!("PC never reached 0x{pc:04X}, stopped at 0x{:04X}", state.cpu_registers.pc);
}

fn run_test(program_hex: &str, expected_state: &ExpectedState) {
    let (mut state, program_end) = machine_with_program(program_hex, 0x00);
    run_to_end(&mut state, program_end);
    expected_state.assert_matches(&state);
}

const ALL_REGISTERS: [CpuRegister; 7] = [
    CpuRegister::A,
    CpuRegister::B,
    CpuRegister::C,
    CpuRegister::D,
    CpuRegister::E,
    CpuRegister::H,
    CpuRegister::L,
];

fn set_in_state(state: &mut ExpectedState, register: CpuRegister, value: u8) {
    let var_ref = match register {
        CpuRegister::A => &mut state.a,
        CpuRegister::B => &mut state.b,
        CpuRegister::C => &mut state.c,
        CpuRegister::D => &mut state.d,
        CpuRegister::E => &mut state.e,
        CpuRegister::H => &mut state.h,
        CpuRegister::L => &mut state.l,
    };

    *var_ref = Some(value);
}

/// `LD r, n` for the given register.
fn load_immediate(register: CpuRegister, value: u8) -> String {
    format!("{:02X}{value:02X}", 0x06 | (register.to_opcode_bits() << 3))
}
