mod mbc3;

use crate::memory::address;
use scanboy_proc_macros::EnumDisplay;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use std::time::SystemTime;

pub(crate) use mbc3::RealTimeClock;

const ROM_BANK_LEN: u32 = 0x4000;
const RAM_BANK_LEN: usize = 0x2000;
const MBC2_RAM_LEN: usize = 0x0200;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumDisplay)]
pub enum MapperType {
    None,
    MBC1,
    MBC2,
    MBC3,
    MBC5,
    HuC3,
    MMM01,
    PocketCamera,
    TAMA5,
    HuC1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamMapResult {
    // Relative address into the full RAM array
    RamAddress(u32),
    // Relative address into a RAM array that only stores the low 4 bits of each byte
    HalfByteAddress(u32),
    // The RAM window is currently mapped to the given RTC register
    RtcRegister(u8),
    // The RAM address is invalid or RAM access is disabled
    None,
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum Mapper {
    None,
    MBC1 {
        ram_enabled: bool,
        rom_bank_number: u8,
        ram_bank_number: u8,
        ram_banking_mode: bool,
    },
    MBC2 {
        ram_enabled: bool,
        rom_bank_number: u8,
    },
    MBC3 {
        ram_enabled: bool,
        rom_bank_number: u8,
        bank_select: u8,
        real_time_clock: Option<RealTimeClock>,
    },
    MBC5 {
        ram_enabled: bool,
        rom_bank_number: u16,
        ram_bank_number: u8,
        rumble_motor: Option<bool>,
    },
    HuC3 {
        ram_enabled: bool,
        rom_bank_number: u8,
        ram_bank_number: u8,
    },
    // Controllers whose registers are accepted and ignored
    Fallback(MapperType),
}

impl Mapper {
    pub(crate) fn new(mapper_type: MapperType, features: MapperFeatures, now: SystemTime) -> Self {
        match mapper_type {
            MapperType::None => Self::None,
            MapperType::MBC1 => Self::MBC1 {
                ram_enabled: false,
                rom_bank_number: 0x00,
                ram_bank_number: 0x00,
                ram_banking_mode: false,
            },
            MapperType::MBC2 => Self::MBC2 { ram_enabled: false, rom_bank_number: 0x00 },
            MapperType::MBC3 => Self::MBC3 {
                ram_enabled: false,
                rom_bank_number: 0x00,
                bank_select: 0x00,
                real_time_clock: features.has_rtc.then(|| RealTimeClock::new(now)),
            },
            MapperType::MBC5 => Self::MBC5 {
                ram_enabled: false,
                rom_bank_number: 0x0000,
                ram_bank_number: 0x00,
                rumble_motor: features.has_rumble.then_some(false),
            },
            // HuC3 RAM starts out mapped
            MapperType::HuC3 => Self::HuC3 {
                ram_enabled: true,
                rom_bank_number: 0x00,
                ram_bank_number: 0x00,
            },
            MapperType::MMM01 | MapperType::PocketCamera | MapperType::TAMA5 | MapperType::HuC1 => {
                Self::Fallback(mapper_type)
            }
        }
    }

    /// The ROM bank currently visible at 0x4000-0x7FFF, before reduction by the ROM length.
    pub(crate) fn rom_bank(&self) -> u32 {
        match self {
            Self::None | Self::Fallback(_) => 1,
            &Self::MBC1 { rom_bank_number, .. } => match rom_bank_number {
                // Banks 0x00/0x20/0x40/0x60 can't be selected; the next bank is mapped instead
                0x00 | 0x20 | 0x40 | 0x60 => u32::from(rom_bank_number) + 1,
                _ => rom_bank_number.into(),
            },
            &Self::MBC2 { rom_bank_number, .. }
            | &Self::MBC3 { rom_bank_number, .. }
            | &Self::HuC3 { rom_bank_number, .. } => rom_bank_number.max(1).into(),
            &Self::MBC5 { rom_bank_number, .. } => rom_bank_number.into(),
        }
    }

    /// Byte offset of the switchable ROM window within a ROM image of the given length.
    pub(crate) fn rom_bank_offset(&self, rom_len: usize) -> u32 {
        if rom_len == 0 {
            return 0;
        }

        (self.rom_bank() * ROM_BANK_LEN) % rom_len as u32
    }

    // ROM writes don't actually modify the ROM (it is read-only after all) but they do modify
    // cartridge registers
    pub(crate) fn write_rom_address(&mut self, address: u16, value: u8) {
        match self {
            Self::None | Self::Fallback(_) => {}
            Self::MBC1 { ram_enabled, rom_bank_number, ram_bank_number, ram_banking_mode } => {
                match address {
                    0x0000..=0x1FFF => {
                        *ram_enabled = value & 0x0F == 0x0A;
                    }
                    0x2000..=0x3FFF => {
                        *rom_bank_number = (*rom_bank_number & 0x60) | (value & 0x1F);
                        log::trace!("rom_bank_number changed to {rom_bank_number:02X}");
                    }
                    0x4000..=0x5FFF => {
                        if *ram_banking_mode {
                            *ram_bank_number = value & 0x03;
                            log::trace!("ram_bank_number changed to {ram_bank_number:02X}");
                        } else {
                            *rom_bank_number = ((value & 0x03) << 5) | (*rom_bank_number & 0x1F);
                            log::trace!("rom_bank_number changed to {rom_bank_number:02X}");
                        }
                    }
                    _ => {
                        *ram_banking_mode = value & 0x01 != 0;
                        log::trace!("ram_banking_mode changed to {ram_banking_mode}");
                    }
                }
            }
            Self::MBC2 { ram_enabled, rom_bank_number } => match address {
                0x0000..=0x0FFF => {
                    *ram_enabled = value & 0x0F == 0x0A;
                }
                0x2100..=0x21FF => {
                    *rom_bank_number = value & 0x0F;
                    log::trace!("rom_bank_number changed to {rom_bank_number:02X}");
                }
                _ => {}
            },
            Self::MBC3 { ram_enabled, rom_bank_number, bank_select, real_time_clock } => {
                match address {
                    0x0000..=0x1FFF => {
                        *ram_enabled = value & 0x0F == 0x0A;
                    }
                    0x2000..=0x3FFF => {
                        *rom_bank_number = value & 0x7F;
                        log::trace!("rom_bank_number changed to {rom_bank_number:02X}");
                    }
                    0x4000..=0x5FFF => {
                        *bank_select = value;
                        log::trace!("bank_select changed to {bank_select:02X}");
                    }
                    _ => {
                        if let Some(real_time_clock) = real_time_clock {
                            real_time_clock.process_latch_write(value);
                        }
                    }
                }
            }
            Self::MBC5 { ram_enabled, rom_bank_number, ram_bank_number, rumble_motor } => {
                match address {
                    0x0000..=0x1FFF => {
                        *ram_enabled = value & 0x0F == 0x0A;
                    }
                    0x2000..=0x2FFF => {
                        *rom_bank_number = (*rom_bank_number & 0x0100) | u16::from(value);
                        log::trace!("rom_bank_number changed to {rom_bank_number:03X}");
                    }
                    0x3000..=0x3FFF => {
                        *rom_bank_number =
                            (u16::from(value & 0x01) << 8) | (*rom_bank_number & 0x00FF);
                        log::trace!("rom_bank_number changed to {rom_bank_number:03X}");
                    }
                    0x4000..=0x5FFF => match rumble_motor {
                        Some(motor) => {
                            *ram_bank_number = value & 0x03;
                            *motor = value & 0x08 != 0;
                        }
                        None => {
                            *ram_bank_number = value & 0x0F;
                        }
                    },
                    _ => {}
                }
            }
            Self::HuC3 { ram_enabled, rom_bank_number, ram_bank_number } => match address {
                0x0000..=0x1FFF => {
                    *ram_enabled = value & 0x0F == 0x0A;
                }
                0x2000..=0x3FFF => {
                    *rom_bank_number = value & 0x7F;
                }
                0x4000..=0x5FFF => {
                    *ram_bank_number = value & 0x03;
                }
                _ => {}
            },
        }
    }

    /// Resolve an address in 0xA000-0xBFFF. `force_access` bypasses the RAM enable latch.
    pub(crate) fn map_ram_address(&self, address: u16, force_access: bool) -> RamMapResult {
        let relative_address = u32::from(address - address::EXTERNAL_RAM_START);

        match self {
            // Unbanked RAM is always accessible; a zero-length array reads as open bus
            Self::None | Self::Fallback(_) => RamMapResult::RamAddress(relative_address),
            &Self::MBC1 { ram_enabled, ram_bank_number, .. }
            | &Self::MBC5 { ram_enabled, ram_bank_number, .. }
            | &Self::HuC3 { ram_enabled, ram_bank_number, .. } => {
                if ram_enabled || force_access {
                    RamMapResult::RamAddress(relative_address + (u32::from(ram_bank_number) << 13))
                } else {
                    RamMapResult::None
                }
            }
            &Self::MBC2 { ram_enabled, .. } => {
                if (ram_enabled || force_access) && relative_address < MBC2_RAM_LEN as u32 {
                    RamMapResult::HalfByteAddress(relative_address)
                } else {
                    RamMapResult::None
                }
            }
            Self::MBC3 { ram_enabled, bank_select, .. } => {
                if !(*ram_enabled || force_access) {
                    return RamMapResult::None;
                }

                match *bank_select {
                    bank @ 0x00..=0x03 => {
                        RamMapResult::RamAddress(relative_address + (u32::from(bank) << 13))
                    }
                    register @ 0x08..=0x0C => RamMapResult::RtcRegister(register),
                    _ => RamMapResult::None,
                }
            }
        }
    }

    pub(crate) fn read_rtc_register(&self, register: u8) -> u8 {
        match self {
            Self::MBC3 { real_time_clock: Some(real_time_clock), .. } => {
                real_time_clock.read_register(register).unwrap_or(0xFF)
            }
            // Without a clock the latched counters never move off zero
            Self::MBC3 { real_time_clock: None, .. } => 0x00,
            _ => 0xFF,
        }
    }

    pub(crate) fn write_rtc_register(&mut self, register: u8, value: u8) {
        if let Self::MBC3 { real_time_clock: Some(real_time_clock), .. } = self {
            real_time_clock.write_register(register, value);
        }
    }

    pub(crate) fn update_rtc(&mut self, now: SystemTime) {
        if let Self::MBC3 { real_time_clock: Some(real_time_clock), .. } = self {
            real_time_clock.update(now);
        }
    }

    pub(crate) fn rumble_active(&self) -> bool {
        matches!(self, Self::MBC5 { rumble_motor: Some(true), .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MapperFeatures {
    pub(crate) has_ram: bool,
    pub(crate) has_battery: bool,
    pub(crate) has_rtc: bool,
    pub(crate) has_rumble: bool,
}

impl std::fmt::Display for MapperFeatures {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "has_ram={}, has_battery={}, has_rtc={}, has_rumble={}",
            self.has_ram, self.has_battery, self.has_rtc, self.has_rumble
        )
    }
}

pub(crate) fn parse_byte(mapper_byte: u8) -> Option<(MapperType, MapperFeatures)> {
    let (mapper_type, has_ram, has_battery) = match mapper_byte {
        0x00 => (MapperType::None, false, false),
        0x01 => (MapperType::MBC1, false, false),
        0x02 => (MapperType::MBC1, true, false),
        0x03 => (MapperType::MBC1, true, true),
        0x05 => (MapperType::MBC2, true, false),
        0x06 => (MapperType::MBC2, true, true),
        0x08 => (MapperType::None, true, false),
        0x09 => (MapperType::None, true, true),
        0x0B => (MapperType::MMM01, false, false),
        0x0C => (MapperType::MMM01, true, false),
        0x0D => (MapperType::MMM01, true, true),
        0x0F => (MapperType::MBC3, false, true),
        // 0x10 is w/ RTC, 0x13 is w/o RTC
        0x10 | 0x13 => (MapperType::MBC3, true, true),
        0x11 => (MapperType::MBC3, false, false),
        0x12 => (MapperType::MBC3, true, false),
        // 0x19 is w/o rumble, 0x1C is w/ rumble
        0x19 | 0x1C => (MapperType::MBC5, false, false),
        // 0x1A is w/o rumble, 0x1D is w/ rumble
        0x1A | 0x1D => (MapperType::MBC5, true, false),
        // 0x1B is w/o rumble, 0x1E is w/ rumble
        0x1B | 0x1E => (MapperType::MBC5, true, true),
        0x1F => (MapperType::PocketCamera, false, false),
        0xFD => (MapperType::TAMA5, false, false),
        0xFE => (MapperType::HuC3, true, true),
        0xFF => (MapperType::HuC1, true, true),
        _ => return None,
    };

    let features = MapperFeatures {
        has_ram,
        has_battery,
        has_rtc: mapper_byte == 0x0F || mapper_byte == 0x10,
        has_rumble: (0x1C..=0x1E).contains(&mapper_byte),
    };
    Some((mapper_type, features))
}

/// Cartridge RAM is sized to the most the controller can address, since header RAM sizes are
/// frequently wrong.
pub(crate) fn ram_len(mapper_type: MapperType, features: MapperFeatures) -> usize {
    match mapper_type {
        MapperType::MBC2 => MBC2_RAM_LEN,
        MapperType::MBC1 | MapperType::MBC3 | MapperType::HuC3 => 4 * RAM_BANK_LEN,
        MapperType::MBC5 if features.has_rumble => 4 * RAM_BANK_LEN,
        MapperType::MBC5 => 16 * RAM_BANK_LEN,
        _ if features.has_ram => RAM_BANK_LEN,
        _ => 0,
    }
}
