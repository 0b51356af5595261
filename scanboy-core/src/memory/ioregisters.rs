use crate::cpu::InterruptType;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
// Discriminants are the low byte of the register address
pub enum IoRegister {
    JOYP = 0x00,
    SB = 0x01,
    SC = 0x02,
    DIV = 0x04,
    TIMA = 0x05,
    TMA = 0x06,
    TAC = 0x07,
    IF = 0x0F,
    NR10 = 0x10,
    NR11 = 0x11,
    NR12 = 0x12,
    NR13 = 0x13,
    NR14 = 0x14,
    NR21 = 0x16,
    NR22 = 0x17,
    NR23 = 0x18,
    NR24 = 0x19,
    NR30 = 0x1A,
    NR31 = 0x1B,
    NR32 = 0x1C,
    NR33 = 0x1D,
    NR34 = 0x1E,
    NR41 = 0x20,
    NR42 = 0x21,
    NR43 = 0x22,
    NR44 = 0x23,
    NR50 = 0x24,
    NR51 = 0x25,
    NR52 = 0x26,
    LCDC = 0x40,
    STAT = 0x41,
    SCY = 0x42,
    SCX = 0x43,
    LY = 0x44,
    LYC = 0x45,
    DMA = 0x46,
    BGP = 0x47,
    OBP0 = 0x48,
    OBP1 = 0x49,
    WY = 0x4A,
    WX = 0x4B,
    KEY1 = 0x4D,
    VBK = 0x4F,
    BOOT = 0x50,
    HDMA1 = 0x51,
    HDMA2 = 0x52,
    HDMA3 = 0x53,
    HDMA4 = 0x54,
    HDMA5 = 0x55,
    BCPS = 0x68,
    BCPD = 0x69,
    OCPS = 0x6A,
    OCPD = 0x6B,
    OPRI = 0x6C,
    SVBK = 0x70,
}

impl IoRegister {
    /// Return the hardware register corresponding to the given address.
    pub fn from_address(address: u16) -> Option<Self> {
        let register = match address {
            0xFF00 => Self::JOYP,
            0xFF01 => Self::SB,
            0xFF02 => Self::SC,
            0xFF04 => Self::DIV,
            0xFF05 => Self::TIMA,
            0xFF06 => Self::TMA,
            0xFF07 => Self::TAC,
            0xFF0F => Self::IF,
            0xFF10 => Self::NR10,
            0xFF11 => Self::NR11,
            0xFF12 => Self::NR12,
            0xFF13 => Self::NR13,
            0xFF14 => Self::NR14,
            0xFF16 => Self::NR21,
            0xFF17 => Self::NR22,
            0xFF18 => Self::NR23,
            0xFF19 => Self::NR24,
            0xFF1A => Self::NR30,
            0xFF1B => Self::NR31,
            0xFF1C => Self::NR32,
            0xFF1D => Self::NR33,
            0xFF1E => Self::NR34,
            0xFF20 => Self::NR41,
            0xFF21 => Self::NR42,
            0xFF22 => Self::NR43,
            0xFF23 => Self::NR44,
            0xFF24 => Self::NR50,
            0xFF25 => Self::NR51,
            0xFF26 => Self::NR52,
            0xFF40 => Self::LCDC,
            0xFF41 => Self::STAT,
            0xFF42 => Self::SCY,
            0xFF43 => Self::SCX,
            0xFF44 => Self::LY,
            0xFF45 => Self::LYC,
            0xFF46 => Self::DMA,
            0xFF47 => Self::BGP,
            0xFF48 => Self::OBP0,
            0xFF49 => Self::OBP1,
            0xFF4A => Self::WY,
            0xFF4B => Self::WX,
            0xFF4D => Self::KEY1,
            0xFF4F => Self::VBK,
            0xFF50 => Self::BOOT,
            0xFF51 => Self::HDMA1,
            0xFF52 => Self::HDMA2,
            0xFF53 => Self::HDMA3,
            0xFF54 => Self::HDMA4,
            0xFF55 => Self::HDMA5,
            0xFF68 => Self::BCPS,
            0xFF69 => Self::BCPD,
            0xFF6A => Self::OCPS,
            0xFF6B => Self::OCPD,
            0xFF6C => Self::OPRI,
            0xFF70 => Self::SVBK,
            _ => return None,
        };

        Some(register)
    }

    /// Return the address for this hardware register.
    pub fn to_address(self) -> u16 {
        0xFF00 | u16::from(self as u8)
    }

    /// Return whether or not this is an audio register (wave RAM not included).
    pub fn is_audio_register(self) -> bool {
        matches!(
            self,
            Self::NR10
                | Self::NR11
                | Self::NR12
                | Self::NR13
                | Self::NR14
                | Self::NR21
                | Self::NR22
                | Self::NR23
                | Self::NR24
                | Self::NR30
                | Self::NR31
                | Self::NR32
                | Self::NR33
                | Self::NR34
                | Self::NR41
                | Self::NR42
                | Self::NR43
                | Self::NR44
                | Self::NR50
                | Self::NR51
                | Self::NR52
        )
    }

    /// Registers that only exist on the Game Boy Color. On a Game Boy these addresses behave like
    /// plain memory.
    pub fn is_cgb_only(self) -> bool {
        matches!(
            self,
            Self::KEY1
                | Self::VBK
                | Self::HDMA1
                | Self::HDMA2
                | Self::HDMA3
                | Self::HDMA4
                | Self::HDMA5
                | Self::BCPS
                | Self::BCPD
                | Self::OCPS
                | Self::OCPD
                | Self::SVBK
        )
    }

    /// Registers that only respond while the boot ROM is mapped.
    pub fn is_boot_only(self) -> bool {
        matches!(self, Self::BOOT | Self::OPRI)
    }
}

/// A convenience view around the IF register.
pub struct InterruptFlags<'a>(pub(crate) &'a mut u8);

impl<'a> InterruptFlags<'a> {
    /// Returns the highest priority requested + enabled interrupt, or None if no enabled interrupts
    /// have been requested.
    pub fn highest_priority_interrupt(&self, ie_value: u8) -> Option<InterruptType> {
        let masked_if = *self.0 & ie_value;
        if masked_if & 0x01 != 0 {
            Some(InterruptType::VBlank)
        } else if masked_if & 0x02 != 0 {
            Some(InterruptType::LcdStatus)
        } else if masked_if & 0x04 != 0 {
            Some(InterruptType::Timer)
        } else if masked_if & 0x08 != 0 {
            Some(InterruptType::Serial)
        } else if masked_if & 0x10 != 0 {
            Some(InterruptType::Joypad)
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn get(&self, interrupt_type: InterruptType) -> bool {
        *self.0 & interrupt_type.bit() != 0
    }

    /// Sets the bit for the given interrupt type.
    pub fn set(&mut self, interrupt_type: InterruptType) {
        *self.0 |= interrupt_type.bit();
    }

    /// Clears the bit for the given interrupt type.
    pub fn clear(&mut self, interrupt_type: InterruptType) {
        *self.0 &= !interrupt_type.bit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_mapping() {
        for address in 0xFF00..=0xFF7F {
            if let Some(register) = IoRegister::from_address(address) {
                assert_eq!(address, register.to_address(), "{register:?}");
            }
        }

        assert_eq!(None, IoRegister::from_address(0xFF03));
        assert_eq!(None, IoRegister::from_address(0xFF4E));
        assert_eq!(Some(IoRegister::SVBK), IoRegister::from_address(0xFF70));
    }

    #[test]
    fn interrupt_priority() {
        let mut value = 0x1A;
        let mut flags = InterruptFlags(&mut value);

        assert_eq!(Some(InterruptType::LcdStatus), flags.highest_priority_interrupt(0x1F));
        assert_eq!(Some(InterruptType::Serial), flags.highest_priority_interrupt(0x18));
        assert_eq!(None, flags.highest_priority_interrupt(0x05));

        flags.clear(InterruptType::LcdStatus);
        flags.set(InterruptType::VBlank);
        assert!(flags.get(InterruptType::VBlank));
        assert!(!flags.get(InterruptType::LcdStatus));
        assert_eq!(0x19, value);
    }
}
