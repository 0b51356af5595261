use crate::HardwareMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegister {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl CpuRegister {
    fn from_opcode_bits(bits: u8) -> Option<Self> {
        match bits & 0x07 {
            0x00 => Some(Self::B),
            0x01 => Some(Self::C),
            0x02 => Some(Self::D),
            0x03 => Some(Self::E),
            0x04 => Some(Self::H),
            0x05 => Some(Self::L),
            0x07 => Some(Self::A),
            // 0x06 is (HL)
            _ => None,
        }
    }

    /// Register encoded in bits 3-5 of the opcode, or None if those bits select (HL).
    pub fn from_mid_opcode_bits(opcode: u8) -> Option<Self> {
        Self::from_opcode_bits(opcode >> 3)
    }

    /// Register encoded in bits 0-2 of the opcode, or None if those bits select (HL).
    pub fn from_low_opcode_bits(opcode: u8) -> Option<Self> {
        Self::from_opcode_bits(opcode)
    }

    pub fn to_opcode_bits(self) -> u8 {
        match self {
            Self::B => 0x00,
            Self::C => 0x01,
            Self::D => 0x02,
            Self::E => 0x03,
            Self::H => 0x04,
            Self::L => 0x05,
            Self::A => 0x07,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegisterPair {
    AF,
    BC,
    DE,
    HL,
    SP,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuRegisters {
    pub accumulator: u8,
    pub flags: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub ime: bool,
    // Instructions remaining until a pending EI takes effect; 2 right after EI, 0 when idle
    pub ime_countdown: u8,
    pub halted: bool,
    // One-shot: the next opcode fetch does not advance PC
    pub skip_pc_increment: bool,
}

impl CpuRegisters {
    /// Register values the boot ROM leaves behind when it hands control to the cartridge.
    pub fn new(hardware_mode: HardwareMode) -> Self {
        let accumulator = match hardware_mode {
            HardwareMode::GameBoy => 0x01,
            HardwareMode::GameBoyColor => 0x11,
        };

        Self {
            accumulator,
            flags: 0xB0,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0100,
            ime: true,
            ime_countdown: 0,
            halted: false,
            skip_pc_increment: false,
        }
    }

    /// Zeroed registers for starting execution at the top of a boot ROM.
    pub fn boot() -> Self {
        Self {
            accumulator: 0x00,
            flags: 0x00,
            b: 0x00,
            c: 0x00,
            d: 0x00,
            e: 0x00,
            h: 0x00,
            l: 0x00,
            sp: 0x0000,
            pc: 0x0000,
            ime: false,
            ime_countdown: 0,
            halted: false,
            skip_pc_increment: false,
        }
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.accumulator, self.flags])
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    pub fn set_hl(&mut self, hl: u16) {
        let [h, l] = hl.to_be_bytes();
        self.h = h;
        self.l = l;
    }

    pub fn read_register(&self, register: CpuRegister) -> u8 {
        match register {
            CpuRegister::A => self.accumulator,
            CpuRegister::B => self.b,
            CpuRegister::C => self.c,
            CpuRegister::D => self.d,
            CpuRegister::E => self.e,
            CpuRegister::H => self.h,
            CpuRegister::L => self.l,
        }
    }

    pub fn set_register(&mut self, register: CpuRegister, value: u8) {
        *self.get_register_mut(register) = value;
    }

    pub fn get_register_mut(&mut self, register: CpuRegister) -> &mut u8 {
        match register {
            CpuRegister::A => &mut self.accumulator,
            CpuRegister::B => &mut self.b,
            CpuRegister::C => &mut self.c,
            CpuRegister::D => &mut self.d,
            CpuRegister::E => &mut self.e,
            CpuRegister::H => &mut self.h,
            CpuRegister::L => &mut self.l,
        }
    }

    pub fn read_register_pair(&self, register_pair: CpuRegisterPair) -> u16 {
        match register_pair {
            CpuRegisterPair::AF => self.af(),
            CpuRegisterPair::BC => self.bc(),
            CpuRegisterPair::DE => self.de(),
            CpuRegisterPair::HL => self.hl(),
            CpuRegisterPair::SP => self.sp,
        }
    }

    pub fn set_register_pair(&mut self, register_pair: CpuRegisterPair, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        match register_pair {
            CpuRegisterPair::AF => {
                self.accumulator = hi;
                // Low nibble of F is always 0
                self.flags = lo & 0xF0;
            }
            CpuRegisterPair::BC => {
                self.b = hi;
                self.c = lo;
            }
            CpuRegisterPair::DE => {
                self.d = hi;
                self.e = lo;
            }
            CpuRegisterPair::HL => {
                self.set_hl(value);
            }
            CpuRegisterPair::SP => {
                self.sp = value;
            }
        }
    }

    pub fn set_flags(&mut self, z: bool, n: bool, h: bool, c: bool) {
        self.flags =
            (u8::from(z) << 7) | (u8::from(n) << 6) | (u8::from(h) << 5) | (u8::from(c) << 4);
    }

    pub fn set_some_flags(
        &mut self,
        z: Option<bool>,
        n: Option<bool>,
        h: Option<bool>,
        c: Option<bool>,
    ) {
        for (flag, bit) in [(z, 7), (n, 6), (h, 5), (c, 4)] {
            match flag {
                Some(true) => {
                    self.flags |= 1 << bit;
                }
                Some(false) => {
                    self.flags &= !(1 << bit);
                }
                None => {}
            }
        }
    }

    pub fn zero_flag(&self) -> bool {
        self.flags & 0x80 != 0
    }

    pub fn subtract_flag(&self) -> bool {
        self.flags & 0x40 != 0
    }

    pub fn half_carry_flag(&self) -> bool {
        self.flags & 0x20 != 0
    }

    pub fn carry_flag(&self) -> bool {
        self.flags & 0x10 != 0
    }
}
