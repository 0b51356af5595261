use crate::cpu::instructions::{Instruction, JumpCondition, ModifyTarget, ReadTarget, WriteTarget};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair};
use crate::memory::AddressSpace;
use crate::ppu::PpuState;

/// Decode the instruction at `pc`, returning it along with the address of the next instruction.
///
/// Undefined opcodes decode as one-byte no-ops.
pub fn parse_next_instruction(
    address_space: &AddressSpace,
    mut pc: u16,
    ppu_state: &PpuState,
    halt_bug_triggered: bool,
) -> (Instruction, u16) {
    let opcode = address_space.read_address_u8(pc, ppu_state);

    // If HALT bug triggered, act as if the opcode read did not advance the PC
    if halt_bug_triggered {
        pc = pc.wrapping_sub(1);
    }

    let operand_address = pc.wrapping_add(1);
    let n = || address_space.read_address_u8(operand_address, ppu_state);
    let e = || n() as i8;
    let nn = || address_space.read_address_u16(operand_address, ppu_state);

    let instruction = match opcode {
        0x00 => Instruction::NoOp,
        0x01 | 0x11 | 0x21 | 0x31 => {
            Instruction::LoadRegisterPairImmediate(register_pair(opcode), nn())
        }
        0x02 => Instruction::Load(WriteTarget::IndirectBC, ReadTarget::Accumulator),
        0x12 => Instruction::Load(WriteTarget::IndirectDE, ReadTarget::Accumulator),
        0x22 => Instruction::Load(WriteTarget::IndirectHLInc, ReadTarget::Accumulator),
        0x32 => Instruction::Load(WriteTarget::IndirectHLDec, ReadTarget::Accumulator),
        0x0A => Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectBC),
        0x1A => Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectDE),
        0x2A => Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectHLInc),
        0x3A => Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectHLDec),
        0x03 | 0x13 | 0x23 | 0x33 => Instruction::IncRegisterPair(register_pair(opcode)),
        0x0B | 0x1B | 0x2B | 0x3B => Instruction::DecRegisterPair(register_pair(opcode)),
        0x09 | 0x19 | 0x29 | 0x39 => Instruction::AddHLRegister(register_pair(opcode)),
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            Instruction::Increment(mid_modify_target(opcode))
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            Instruction::Decrement(mid_modify_target(opcode))
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            let write_target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(WriteTarget::IndirectHL, WriteTarget::Register);
            Instruction::Load(write_target, ReadTarget::Immediate(n()))
        }
        0x07 => Instruction::RotateLeft(ModifyTarget::Accumulator),
        0x0F => Instruction::RotateRight(ModifyTarget::Accumulator),
        0x17 => Instruction::RotateLeftThruCarry(ModifyTarget::Accumulator),
        0x1F => Instruction::RotateRightThruCarry(ModifyTarget::Accumulator),
        0x08 => Instruction::LoadDirectStackPointer(nn()),
        0x10 => Instruction::Stop,
        0x18 => Instruction::RelativeJump(e()),
        0x20 | 0x28 | 0x30 | 0x38 => Instruction::RelativeJumpCond(jump_condition(opcode), e()),
        0x27 => Instruction::DecimalAdjustAccumulator,
        0x2F => Instruction::ComplementAccumulator,
        0x37 => Instruction::SetCarryFlag,
        0x3F => Instruction::ComplementCarryFlag,
        0x76 => Instruction::Halt,
        0x40..=0x7F => {
            let write_target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(WriteTarget::IndirectHL, WriteTarget::Register);
            Instruction::Load(write_target, low_read_target(opcode))
        }
        0x80..=0xBF => alu_instruction(opcode, low_read_target(opcode)),
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            alu_instruction(opcode, ReadTarget::Immediate(n()))
        }
        0xC0 | 0xC8 | 0xD0 | 0xD8 => Instruction::ReturnCond(jump_condition(opcode)),
        0xC2 | 0xCA | 0xD2 | 0xDA => Instruction::JumpCond(jump_condition(opcode), nn()),
        0xC4 | 0xCC | 0xD4 | 0xDC => Instruction::CallCond(jump_condition(opcode), nn()),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => Instruction::PopStack(register_pair_for_push_pop(opcode)),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => Instruction::PushStack(register_pair_for_push_pop(opcode)),
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            Instruction::RestartCall(opcode & 0x38)
        }
        0xC3 => Instruction::Jump(nn()),
        0xC9 => Instruction::Return,
        0xCB => parse_cb_prefixed_opcode(n()),
        0xCD => Instruction::Call(nn()),
        0xD9 => Instruction::ReturnFromInterruptHandler,
        0xE0 => Instruction::Load(WriteTarget::FFDirect(n()), ReadTarget::Accumulator),
        0xF0 => Instruction::Load(WriteTarget::Accumulator, ReadTarget::FFDirect(n())),
        0xE2 => Instruction::Load(WriteTarget::FFIndirectC, ReadTarget::Accumulator),
        0xF2 => Instruction::Load(WriteTarget::Accumulator, ReadTarget::FFIndirectC),
        0xEA => Instruction::Load(WriteTarget::Direct(nn()), ReadTarget::Accumulator),
        0xFA => Instruction::Load(WriteTarget::Accumulator, ReadTarget::Direct(nn())),
        0xE8 => Instruction::AddSPImmediate(e()),
        0xF8 => Instruction::LoadHLStackPointerOffset(e()),
        0xE9 => Instruction::JumpHL,
        0xF9 => Instruction::LoadStackPointerHL,
        0xF3 => Instruction::DisableInterrupts,
        0xFB => Instruction::EnableInterrupts,
        0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD => {
            log::debug!("Undefined opcode {opcode:02X} at {pc:04X}, treating as NOP");
            Instruction::NoOp
        }
    };

    (instruction, pc.wrapping_add(instruction_length(opcode)))
}

/// Encoded length in bytes, counting the opcode and any prefix or operand bytes.
fn instruction_length(opcode: u8) -> u16 {
    match opcode {
        0x01 | 0x11 | 0x21 | 0x31 | 0x08 => 3,
        0xC2 | 0xCA | 0xD2 | 0xDA | 0xC3 | 0xC4 | 0xCC | 0xD4 | 0xDC | 0xCD | 0xEA | 0xFA => 3,
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => 2,
        0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 | 0xCB => 2,
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => 2,
        0xE0 | 0xF0 | 0xE8 | 0xF8 => 2,
        _ => 1,
    }
}

fn low_read_target(opcode: u8) -> ReadTarget {
    CpuRegister::from_low_opcode_bits(opcode).map_or(ReadTarget::IndirectHL, ReadTarget::Register)
}

fn low_modify_target(opcode: u8) -> ModifyTarget {
    CpuRegister::from_low_opcode_bits(opcode)
        .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register)
}

fn mid_modify_target(opcode: u8) -> ModifyTarget {
    CpuRegister::from_mid_opcode_bits(opcode)
        .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register)
}

// Bits 3-5 select the operation for both the register and immediate forms
fn alu_instruction(opcode: u8, read_target: ReadTarget) -> Instruction {
    match (opcode >> 3) & 0x07 {
        0 => Instruction::Add(read_target),
        1 => Instruction::AddWithCarry(read_target),
        2 => Instruction::Subtract(read_target),
        3 => Instruction::SubtractWithCarry(read_target),
        4 => Instruction::And(read_target),
        5 => Instruction::Xor(read_target),
        6 => Instruction::Or(read_target),
        _ => Instruction::Compare(read_target),
    }
}

fn parse_cb_prefixed_opcode(opcode: u8) -> Instruction {
    let bit = (opcode >> 3) & 0x07;
    match opcode >> 6 {
        0 => {
            let target = low_modify_target(opcode);
            match bit {
                0 => Instruction::RotateLeft(target),
                1 => Instruction::RotateRight(target),
                2 => Instruction::RotateLeftThruCarry(target),
                3 => Instruction::RotateRightThruCarry(target),
                4 => Instruction::ShiftLeft(target),
                5 => Instruction::ArithmeticShiftRight(target),
                6 => Instruction::Swap(target),
                _ => Instruction::LogicalShiftRight(target),
            }
        }
        1 => Instruction::TestBit(bit, low_read_target(opcode)),
        2 => Instruction::ResetBit(bit, low_modify_target(opcode)),
        _ => Instruction::SetBit(bit, low_modify_target(opcode)),
    }
}

fn register_pair(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        _ => CpuRegisterPair::SP,
    }
}

fn register_pair_for_push_pop(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        _ => CpuRegisterPair::AF,
    }
}

fn jump_condition(opcode: u8) -> JumpCondition {
    match opcode & 0x18 {
        0x00 => JumpCondition::NZ,
        0x08 => JumpCondition::Z,
        0x10 => JumpCondition::NC,
        _ => JumpCondition::C,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_cover_operands() {
        assert_eq!(1, instruction_length(0x00));
        assert_eq!(2, instruction_length(0x10));
        assert_eq!(2, instruction_length(0xCB));
        assert_eq!(2, instruction_length(0xFE));
        assert_eq!(3, instruction_length(0xCD));
        assert_eq!(1, instruction_length(0xE9));
    }

    #[test]
    fn cb_page_decodes_by_bit_fields() {
        assert!(matches!(
            parse_cb_prefixed_opcode(0x37),
            Instruction::Swap(ModifyTarget::Register(CpuRegister::A))
        ));
        assert!(matches!(
            parse_cb_prefixed_opcode(0x7E),
            Instruction::TestBit(7, ReadTarget::IndirectHL)
        ));
        assert!(matches!(
            parse_cb_prefixed_opcode(0xC1),
            Instruction::SetBit(0, ModifyTarget::Register(CpuRegister::C))
        ));
    }

    #[test]
    fn alu_group_selection() {
        assert!(matches!(
            alu_instruction(0x9A, low_read_target(0x9A)),
            Instruction::SubtractWithCarry(ReadTarget::Register(CpuRegister::D))
        ));
        assert!(matches!(
            alu_instruction(0xFE, ReadTarget::Immediate(3)),
            Instruction::Compare(ReadTarget::Immediate(3))
        ));
    }
}
