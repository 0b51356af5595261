mod parse;

use crate::cpu::registers::{CpuRegister, CpuRegisterPair, CpuRegisters};
use crate::startup::EmulationState;

pub use parse::parse_next_instruction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCondition {
    NZ,
    Z,
    NC,
    C,
}

impl JumpCondition {
    fn check(self, cpu_registers: &CpuRegisters) -> bool {
        match self {
            Self::NZ => !cpu_registers.zero_flag(),
            Self::Z => cpu_registers.zero_flag(),
            Self::NC => !cpu_registers.carry_flag(),
            Self::C => cpu_registers.carry_flag(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    Register(CpuRegister),
    Accumulator,
    Immediate(u8),
    IndirectHL,
    IndirectBC,
    IndirectDE,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
    IndirectHLInc,
    IndirectHLDec,
}

impl ReadTarget {
    fn read_value(self, state: &mut EmulationState) -> u8 {
        match self {
            Self::Register(register) => state.cpu_registers.read_register(register),
            Self::Accumulator => state.cpu_registers.accumulator,
            Self::Immediate(n) => n,
            Self::IndirectHL => state.read_address_u8(state.cpu_registers.hl()),
            Self::IndirectBC => state.read_address_u8(state.cpu_registers.bc()),
            Self::IndirectDE => state.read_address_u8(state.cpu_registers.de()),
            Self::Direct(nn) => state.read_address_u8(nn),
            Self::FFDirect(n) => state.read_address_u8(u16::from_be_bytes([0xFF, n])),
            Self::FFIndirectC => {
                state.read_address_u8(u16::from_be_bytes([0xFF, state.cpu_registers.c]))
            }
            Self::IndirectHLInc => {
                let hl = state.cpu_registers.hl();
                state.cpu_registers.set_hl(hl.wrapping_add(1));
                state.read_address_u8(hl)
            }
            Self::IndirectHLDec => {
                let hl = state.cpu_registers.hl();
                state.cpu_registers.set_hl(hl.wrapping_sub(1));
                state.read_address_u8(hl)
            }
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::Immediate(..)
            | Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::FFIndirectC
            | Self::IndirectHLInc
            | Self::IndirectHLDec => 4,
            Self::FFDirect(..) => 8,
            Self::Direct(..) => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Register(CpuRegister),
    Accumulator,
    IndirectHL,
    IndirectBC,
    IndirectDE,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
    IndirectHLInc,
    IndirectHLDec,
}

impl WriteTarget {
    fn write_value(self, state: &mut EmulationState, value: u8) {
        match self {
            Self::Register(register) => {
                state.cpu_registers.set_register(register, value);
            }
            Self::Accumulator => {
                state.cpu_registers.accumulator = value;
            }
            Self::IndirectHL => {
                state.write_address_u8(state.cpu_registers.hl(), value);
            }
            Self::IndirectBC => {
                state.write_address_u8(state.cpu_registers.bc(), value);
            }
            Self::IndirectDE => {
                state.write_address_u8(state.cpu_registers.de(), value);
            }
            Self::Direct(nn) => {
                state.write_address_u8(nn, value);
            }
            Self::FFDirect(n) => {
                state.write_address_u8(u16::from_be_bytes([0xFF, n]), value);
            }
            Self::FFIndirectC => {
                state.write_address_u8(u16::from_be_bytes([0xFF, state.cpu_registers.c]), value);
            }
            Self::IndirectHLInc => {
                let hl = state.cpu_registers.hl();
                state.cpu_registers.set_hl(hl.wrapping_add(1));
                state.write_address_u8(hl, value);
            }
            Self::IndirectHLDec => {
                let hl = state.cpu_registers.hl();
                state.cpu_registers.set_hl(hl.wrapping_sub(1));
                state.write_address_u8(hl, value);
            }
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::FFIndirectC
            | Self::IndirectHLInc
            | Self::IndirectHLDec => 4,
            Self::FFDirect(..) => 8,
            Self::Direct(..) => 12,
        }
    }
}

/// Target of a read-modify-write instruction. `Accumulator` is used for the short unprefixed
/// rotate opcodes, which always clear Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyTarget {
    Register(CpuRegister),
    Accumulator,
    IndirectHL,
}

impl ModifyTarget {
    fn read_value(self, state: &EmulationState) -> u8 {
        match self {
            Self::Register(register) => state.cpu_registers.read_register(register),
            Self::Accumulator => state.cpu_registers.accumulator,
            Self::IndirectHL => state.read_address_u8(state.cpu_registers.hl()),
        }
    }

    fn write_value(self, state: &mut EmulationState, value: u8) {
        match self {
            Self::Register(register) => {
                state.cpu_registers.set_register(register, value);
            }
            Self::Accumulator => {
                state.cpu_registers.accumulator = value;
            }
            Self::IndirectHL => {
                state.write_address_u8(state.cpu_registers.hl(), value);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // LD <target>, <source>
    Load(WriteTarget, ReadTarget),
    // LD rr, nn
    LoadRegisterPairImmediate(CpuRegisterPair, u16),
    // LD (nn), SP
    LoadDirectStackPointer(u16),
    // LD SP, HL
    LoadStackPointerHL,
    // LD HL, SP+e
    LoadHLStackPointerOffset(i8),
    // PUSH rr
    PushStack(CpuRegisterPair),
    // POP rr
    PopStack(CpuRegisterPair),
    // ADD <source>
    Add(ReadTarget),
    // ADC <source>
    AddWithCarry(ReadTarget),
    // SUB <source>
    Subtract(ReadTarget),
    // SBC <source>
    SubtractWithCarry(ReadTarget),
    // CP <source>
    Compare(ReadTarget),
    // INC <target>
    Increment(ModifyTarget),
    // DEC <target>
    Decrement(ModifyTarget),
    // AND <source>
    And(ReadTarget),
    // OR <source>
    Or(ReadTarget),
    // XOR <source>
    Xor(ReadTarget),
    // ADD HL, rr
    AddHLRegister(CpuRegisterPair),
    // INC rr
    IncRegisterPair(CpuRegisterPair),
    // DEC rr
    DecRegisterPair(CpuRegisterPair),
    // ADD SP, e
    AddSPImmediate(i8),
    // RLCA / RLC <target>
    RotateLeft(ModifyTarget),
    // RLA / RL <target>
    RotateLeftThruCarry(ModifyTarget),
    // RRCA / RRC <target>
    RotateRight(ModifyTarget),
    // RRA / RR <target>
    RotateRightThruCarry(ModifyTarget),
    // SLA <target>
    ShiftLeft(ModifyTarget),
    // SRA <target>
    ArithmeticShiftRight(ModifyTarget),
    // SWAP <target>
    Swap(ModifyTarget),
    // SRL <target>
    LogicalShiftRight(ModifyTarget),
    // BIT n, <source>
    TestBit(u8, ReadTarget),
    // SET n, <target>
    SetBit(u8, ModifyTarget),
    // RES n, <target>
    ResetBit(u8, ModifyTarget),
    // CCF
    ComplementCarryFlag,
    // SCF
    SetCarryFlag,
    // DAA
    DecimalAdjustAccumulator,
    // CPL
    ComplementAccumulator,
    // JP nn
    Jump(u16),
    // JP HL
    JumpHL,
    // JP cc, nn
    JumpCond(JumpCondition, u16),
    // JR e
    RelativeJump(i8),
    // JR cc, e
    RelativeJumpCond(JumpCondition, i8),
    // CALL nn
    Call(u16),
    // CALL cc, nn
    CallCond(JumpCondition, u16),
    // RET
    Return,
    // RET cc
    ReturnCond(JumpCondition),
    // RETI
    ReturnFromInterruptHandler,
    // RST n
    RestartCall(u8),
    // HALT
    Halt,
    // STOP
    Stop,
    // DI
    DisableInterrupts,
    // EI
    EnableInterrupts,
    // NOP, and every undefined opcode
    NoOp,
}

impl Instruction {
    /// Execute this instruction. PC must already point past the instruction's bytes.
    pub fn execute(self, state: &mut EmulationState) {
        match self {
            Self::Load(write_target, read_target) => {
                let value = read_target.read_value(state);
                write_target.write_value(state, value);
            }
            Self::LoadRegisterPairImmediate(rr, nn) => {
                state.cpu_registers.set_register_pair(rr, nn);
            }
            Self::LoadDirectStackPointer(nn) => {
                state.write_address_u16(nn, state.cpu_registers.sp);
            }
            Self::LoadStackPointerHL => {
                state.cpu_registers.sp = state.cpu_registers.hl();
            }
            Self::LoadHLStackPointerOffset(e) => {
                let (value, carry_flag, h_flag) = add_sp_offset(state.cpu_registers.sp, e);
                state.cpu_registers.set_hl(value);
                state.cpu_registers.set_flags(false, false, h_flag, carry_flag);
            }
            Self::PushStack(rr) => {
                let value = state.cpu_registers.read_register_pair(rr);
                push_stack(state, value);
            }
            Self::PopStack(rr) => {
                let value = pop_stack(state);
                state.cpu_registers.set_register_pair(rr, value);
            }
            Self::Add(read_target) => {
                let value = read_target.read_value(state);
                let (sum, carry_flag, h_flag) = add(state.cpu_registers.accumulator, value, false);
                state.cpu_registers.accumulator = sum;
                state.cpu_registers.set_flags(sum == 0, false, h_flag, carry_flag);
            }
            Self::AddWithCarry(read_target) => {
                let value = read_target.read_value(state);
                let carry = state.cpu_registers.carry_flag();
                let (sum, carry_flag, h_flag) = add(state.cpu_registers.accumulator, value, carry);
                state.cpu_registers.accumulator = sum;
                state.cpu_registers.set_flags(sum == 0, false, h_flag, carry_flag);
            }
            Self::Subtract(read_target) => {
                let value = read_target.read_value(state);
                let (difference, carry_flag, h_flag) =
                    sub(state.cpu_registers.accumulator, value, false);
                state.cpu_registers.accumulator = difference;
                state.cpu_registers.set_flags(difference == 0, true, h_flag, carry_flag);
            }
            Self::SubtractWithCarry(read_target) => {
                let value = read_target.read_value(state);
                let carry = state.cpu_registers.carry_flag();
                let (difference, carry_flag, h_flag) =
                    sub(state.cpu_registers.accumulator, value, carry);
                state.cpu_registers.accumulator = difference;
                state.cpu_registers.set_flags(difference == 0, true, h_flag, carry_flag);
            }
            Self::Compare(read_target) => {
                let value = read_target.read_value(state);
                let (difference, carry_flag, h_flag) =
                    sub(state.cpu_registers.accumulator, value, false);
                state.cpu_registers.set_flags(difference == 0, true, h_flag, carry_flag);
            }
            Self::Increment(modify_target) => {
                let value = modify_target.read_value(state);
                let (sum, _, h_flag) = add(value, 1, false);
                modify_target.write_value(state, sum);
                state.cpu_registers.set_some_flags(Some(sum == 0), Some(false), Some(h_flag), None);
            }
            Self::Decrement(modify_target) => {
                let value = modify_target.read_value(state);
                let (difference, _, h_flag) = sub(value, 1, false);
                modify_target.write_value(state, difference);
                state.cpu_registers.set_some_flags(
                    Some(difference == 0),
                    Some(true),
                    Some(h_flag),
                    None,
                );
            }
            Self::And(read_target) => {
                let value = state.cpu_registers.accumulator & read_target.read_value(state);
                state.cpu_registers.accumulator = value;
                state.cpu_registers.set_flags(value == 0, false, true, false);
            }
            Self::Or(read_target) => {
                let value = state.cpu_registers.accumulator | read_target.read_value(state);
                state.cpu_registers.accumulator = value;
                state.cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::Xor(read_target) => {
                let value = state.cpu_registers.accumulator ^ read_target.read_value(state);
                state.cpu_registers.accumulator = value;
                state.cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::AddHLRegister(rr) => {
                let (sum, carry_flag, h_flag) = add_u16(
                    state.cpu_registers.hl(),
                    state.cpu_registers.read_register_pair(rr),
                );
                state.cpu_registers.set_hl(sum);
                state.cpu_registers.set_some_flags(
                    None,
                    Some(false),
                    Some(h_flag),
                    Some(carry_flag),
                );
            }
            Self::IncRegisterPair(rr) => {
                let value = state.cpu_registers.read_register_pair(rr).wrapping_add(1);
                state.cpu_registers.set_register_pair(rr, value);
            }
            Self::DecRegisterPair(rr) => {
                let value = state.cpu_registers.read_register_pair(rr).wrapping_sub(1);
                state.cpu_registers.set_register_pair(rr, value);
            }
            Self::AddSPImmediate(e) => {
                let (value, carry_flag, h_flag) = add_sp_offset(state.cpu_registers.sp, e);
                state.cpu_registers.sp = value;
                state.cpu_registers.set_flags(false, false, h_flag, carry_flag);
            }
            Self::RotateLeft(modify_target) => {
                let (value, carry_flag) = rotate_left(modify_target.read_value(state));
                modify_target.write_value(state, value);
                set_shift_flags(state, modify_target, value, carry_flag);
            }
            Self::RotateLeftThruCarry(modify_target) => {
                let (value, carry_flag) = rotate_left_thru_carry(
                    modify_target.read_value(state),
                    state.cpu_registers.carry_flag(),
                );
                modify_target.write_value(state, value);
                set_shift_flags(state, modify_target, value, carry_flag);
            }
            Self::RotateRight(modify_target) => {
                let (value, carry_flag) = rotate_right(modify_target.read_value(state));
                modify_target.write_value(state, value);
                set_shift_flags(state, modify_target, value, carry_flag);
            }
            Self::RotateRightThruCarry(modify_target) => {
                let (value, carry_flag) = rotate_right_thru_carry(
                    modify_target.read_value(state),
                    state.cpu_registers.carry_flag(),
                );
                modify_target.write_value(state, value);
                set_shift_flags(state, modify_target, value, carry_flag);
            }
            Self::ShiftLeft(modify_target) => {
                let value = modify_target.read_value(state);
                let shifted = value << 1;
                modify_target.write_value(state, shifted);
                state.cpu_registers.set_flags(shifted == 0, false, false, value & 0x80 != 0);
            }
            Self::ArithmeticShiftRight(modify_target) => {
                let value = modify_target.read_value(state);
                let shifted = (value >> 1) | (value & 0x80);
                modify_target.write_value(state, shifted);
                state.cpu_registers.set_flags(shifted == 0, false, false, value & 0x01 != 0);
            }
            Self::LogicalShiftRight(modify_target) => {
                let value = modify_target.read_value(state);
                let shifted = value >> 1;
                modify_target.write_value(state, shifted);
                state.cpu_registers.set_flags(shifted == 0, false, false, value & 0x01 != 0);
            }
            Self::Swap(modify_target) => {
                let value = modify_target.read_value(state).rotate_left(4);
                modify_target.write_value(state, value);
                state.cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::TestBit(bit, read_target) => {
                let value = read_target.read_value(state);
                state.cpu_registers.set_some_flags(
                    Some(value & (1 << bit) == 0),
                    Some(false),
                    Some(true),
                    None,
                );
            }
            Self::SetBit(bit, modify_target) => {
                let value = modify_target.read_value(state) | (1 << bit);
                modify_target.write_value(state, value);
            }
            Self::ResetBit(bit, modify_target) => {
                let value = modify_target.read_value(state) & !(1 << bit);
                modify_target.write_value(state, value);
            }
            Self::ComplementCarryFlag => {
                let carry_flag = state.cpu_registers.carry_flag();
                state.cpu_registers.set_some_flags(
                    None,
                    Some(false),
                    Some(false),
                    Some(!carry_flag),
                );
            }
            Self::SetCarryFlag => {
                state.cpu_registers.set_some_flags(None, Some(false), Some(false), Some(true));
            }
            Self::DecimalAdjustAccumulator => {
                decimal_adjust_accumulator(&mut state.cpu_registers);
            }
            Self::ComplementAccumulator => {
                state.cpu_registers.accumulator = !state.cpu_registers.accumulator;
                state.cpu_registers.set_some_flags(None, Some(true), Some(true), None);
            }
            Self::Jump(nn) => {
                state.cpu_registers.pc = nn;
            }
            Self::JumpHL => {
                state.cpu_registers.pc = state.cpu_registers.hl();
            }
            Self::JumpCond(cc, nn) => {
                if cc.check(&state.cpu_registers) {
                    state.cpu_registers.pc = nn;
                }
            }
            Self::RelativeJump(e) => {
                state.cpu_registers.pc = state.cpu_registers.pc.wrapping_add(e as u16);
            }
            Self::RelativeJumpCond(cc, e) => {
                if cc.check(&state.cpu_registers) {
                    state.cpu_registers.pc = state.cpu_registers.pc.wrapping_add(e as u16);
                }
            }
            Self::Call(nn) => {
                let pc = state.cpu_registers.pc;
                push_stack(state, pc);
                state.cpu_registers.pc = nn;
            }
            Self::CallCond(cc, nn) => {
                if cc.check(&state.cpu_registers) {
                    let pc = state.cpu_registers.pc;
                    push_stack(state, pc);
                    state.cpu_registers.pc = nn;
                }
            }
            Self::Return => {
                state.cpu_registers.pc = pop_stack(state);
            }
            Self::ReturnCond(cc) => {
                if cc.check(&state.cpu_registers) {
                    state.cpu_registers.pc = pop_stack(state);
                }
            }
            Self::ReturnFromInterruptHandler => {
                state.cpu_registers.pc = pop_stack(state);
                state.cpu_registers.ime = true;
            }
            Self::RestartCall(rst_address) => {
                let pc = state.cpu_registers.pc;
                push_stack(state, pc);
                state.cpu_registers.pc = rst_address.into();
            }
            Self::Halt => {
                state.halt();
            }
            Self::Stop => {
                state.stop();
            }
            Self::DisableInterrupts => {
                state.cpu_registers.ime = false;
                state.cpu_registers.ime_countdown = 0;
            }
            Self::EnableInterrupts => {
                state.cpu_registers.ime_countdown = 2;
            }
            Self::NoOp => {}
        }
    }

    /// Number of clock cycles (4 per machine cycle) this instruction takes with the current flags.
    pub fn cycles_required(self, cpu_registers: &CpuRegisters) -> u32 {
        match self {
            Self::Load(write_target, read_target) => {
                4 + write_target.cycles_required() + read_target.cycles_required()
            }
            Self::Add(read_target)
            | Self::AddWithCarry(read_target)
            | Self::Subtract(read_target)
            | Self::SubtractWithCarry(read_target)
            | Self::Compare(read_target)
            | Self::And(read_target)
            | Self::Or(read_target)
            | Self::Xor(read_target) => 4 + read_target.cycles_required(),
            Self::Increment(modify_target) | Self::Decrement(modify_target) => {
                match modify_target {
                    ModifyTarget::Register(..) | ModifyTarget::Accumulator => 4,
                    ModifyTarget::IndirectHL => 12,
                }
            }
            Self::RotateLeft(modify_target)
            | Self::RotateLeftThruCarry(modify_target)
            | Self::RotateRight(modify_target)
            | Self::RotateRightThruCarry(modify_target)
            | Self::ShiftLeft(modify_target)
            | Self::ArithmeticShiftRight(modify_target)
            | Self::Swap(modify_target)
            | Self::LogicalShiftRight(modify_target)
            | Self::SetBit(_, modify_target)
            | Self::ResetBit(_, modify_target) => match modify_target {
                ModifyTarget::Accumulator => 4,
                ModifyTarget::Register(..) => 8,
                ModifyTarget::IndirectHL => 16,
            },
            Self::TestBit(_, read_target) => 8 + read_target.cycles_required(),
            Self::LoadRegisterPairImmediate(..) | Self::PopStack(..) | Self::RelativeJump(..) => {
                12
            }
            Self::LoadHLStackPointerOffset(..) => 12,
            Self::LoadDirectStackPointer(..) => 20,
            Self::LoadStackPointerHL
            | Self::AddHLRegister(..)
            | Self::IncRegisterPair(..)
            | Self::DecRegisterPair(..) => 8,
            Self::PushStack(..)
            | Self::AddSPImmediate(..)
            | Self::Jump(..)
            | Self::Return
            | Self::ReturnFromInterruptHandler
            | Self::RestartCall(..) => 16,
            Self::Call(..) => 24,
            Self::JumpCond(cc, _) => {
                if cc.check(cpu_registers) {
                    16
                } else {
                    12
                }
            }
            Self::RelativeJumpCond(cc, _) => {
                if cc.check(cpu_registers) {
                    12
                } else {
                    8
                }
            }
            Self::CallCond(cc, _) => {
                if cc.check(cpu_registers) {
                    24
                } else {
                    12
                }
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    20
                } else {
                    8
                }
            }
            Self::ComplementCarryFlag
            | Self::SetCarryFlag
            | Self::DecimalAdjustAccumulator
            | Self::ComplementAccumulator
            | Self::JumpHL
            | Self::Halt
            | Self::Stop
            | Self::DisableInterrupts
            | Self::EnableInterrupts
            | Self::NoOp => 4,
        }
    }
}

fn push_stack(state: &mut EmulationState, value: u16) {
    state.cpu_registers.sp = state.cpu_registers.sp.wrapping_sub(2);
    state.write_address_u16(state.cpu_registers.sp, value);
}

fn pop_stack(state: &mut EmulationState) -> u16 {
    let value = state.read_address_u16(state.cpu_registers.sp);
    state.cpu_registers.sp = state.cpu_registers.sp.wrapping_add(2);
    value
}

// The unprefixed accumulator rotates always clear Z
fn set_shift_flags(
    state: &mut EmulationState,
    modify_target: ModifyTarget,
    value: u8,
    carry_flag: bool,
) {
    let z_flag = modify_target != ModifyTarget::Accumulator && value == 0;
    state.cpu_registers.set_flags(z_flag, false, false, carry_flag);
}

fn decimal_adjust_accumulator(cpu_registers: &mut CpuRegisters) {
    let mut value = cpu_registers.accumulator;
    let mut carry_flag = cpu_registers.carry_flag();

    if !cpu_registers.subtract_flag() {
        if carry_flag || value > 0x99 {
            value = value.wrapping_add(0x60);
            carry_flag = true;
        }
        if cpu_registers.half_carry_flag() || value & 0x0F > 0x09 {
            value = value.wrapping_add(0x06);
        }
    } else {
        if carry_flag {
            value = value.wrapping_sub(0x60);
        }
        if cpu_registers.half_carry_flag() {
            value = value.wrapping_sub(0x06);
        }
    }

    cpu_registers.accumulator = value;
    cpu_registers.set_some_flags(Some(value == 0), None, Some(false), Some(carry_flag));
}

fn add(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);
    let (sum, carry_flag) = match l_value.overflowing_add(r_value) {
        (sum, true) => (sum.wrapping_add(carry), true),
        (sum, false) => sum.overflowing_add(carry),
    };
    let h_flag = (l_value & 0x0F) + (r_value & 0x0F) + carry >= 0x10;

    (sum, carry_flag, h_flag)
}

fn add_u16(l_value: u16, r_value: u16) -> (u16, bool, bool) {
    let (sum, carry_flag) = l_value.overflowing_add(r_value);
    let h_flag = (l_value & 0x0FFF) + (r_value & 0x0FFF) >= 0x1000;

    (sum, carry_flag, h_flag)
}

// Flags for ADD SP, e and LD HL, SP+e come from the unsigned low byte addition
fn add_sp_offset(sp: u16, offset: i8) -> (u16, bool, bool) {
    let offset = offset as u16;
    let sum = sp.wrapping_add(offset);
    let carry_flag = (sp & 0x00FF) + (offset & 0x00FF) >= 0x0100;
    let h_flag = (sp & 0x000F) + (offset & 0x000F) >= 0x0010;

    (sum, carry_flag, h_flag)
}

fn sub(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);
    let (difference, carry_flag) = match l_value.overflowing_sub(r_value) {
        (difference, true) => (difference.wrapping_sub(carry), true),
        (difference, false) => difference.overflowing_sub(carry),
    };
    let h_flag = l_value & 0x0F < (r_value & 0x0F) + carry;

    (difference, carry_flag, h_flag)
}

fn rotate_left(value: u8) -> (u8, bool) {
    let leftmost_set = value & 0x80 != 0;
    let new_value = (value << 1) | u8::from(leftmost_set);

    (new_value, leftmost_set)
}

fn rotate_left_thru_carry(value: u8, carry: bool) -> (u8, bool) {
    let leftmost_set = value & 0x80 != 0;
    let new_value = (value << 1) | u8::from(carry);

    (new_value, leftmost_set)
}

fn rotate_right(value: u8) -> (u8, bool) {
    let rightmost_set = value & 0x01 != 0;
    let new_value = (value >> 1) | (u8::from(rightmost_set) << 7);

    (new_value, rightmost_set)
}

fn rotate_right_thru_carry(value: u8, carry: bool) -> (u8, bool) {
    let rightmost_set = value & 0x01 != 0;
    let new_value = (value >> 1) | (u8::from(carry) << 7);

    (new_value, rightmost_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_carry_includes_carry_in() {
        assert_eq!((0x10, false, true), add(0x0F, 0x00, true));
        assert_eq!((0xFF, true, true), sub(0x00, 0x00, true));
        assert_eq!((0x00, true, true), add(0xFF, 0x00, true));
    }

    #[test]
    fn stack_pointer_offset_flags() {
        assert_eq!((0x0000, true, true), add_sp_offset(0x0001, -1));
        assert_eq!((0xFFF8, false, false), add_sp_offset(0xFFF0, 8));
        assert_eq!((0x1008, false, true), add_sp_offset(0x0FFF, 9));
    }

    #[test]
    fn daa() {
        let mut registers = CpuRegisters::new(crate::HardwareMode::GameBoy);

        // 0x15 + 0x27 = 0x3C -> 0x42
        registers.accumulator = 0x3C;
        registers.flags = 0x00;
        decimal_adjust_accumulator(&mut registers);
        assert_eq!(0x42, registers.accumulator);
        assert_eq!(0x00, registers.flags);

        // 0x99 + 0x01 = 0x9A -> 0x00 with carry
        registers.accumulator = 0x9A;
        registers.flags = 0x00;
        decimal_adjust_accumulator(&mut registers);
        assert_eq!(0x00, registers.accumulator);
        assert_eq!(0x90, registers.flags);

        // 0x10 - 0x01 = 0x0F with half borrow -> 0x09
        registers.accumulator = 0x0F;
        registers.flags = 0x60;
        decimal_adjust_accumulator(&mut registers);
        assert_eq!(0x09, registers.accumulator);
        assert_eq!(0x40, registers.flags);
    }
}
