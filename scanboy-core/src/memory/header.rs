use crate::memory::address;
use crate::memory::mapper::{self, MapperFeatures, MapperType};
use scanboy_proc_macros::EnumDisplay;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("cartridge image is {len} bytes, too small to contain a header (need at least {min_len})")]
    TooSmall { len: usize, min_len: usize },
}

/// Value of the CGB flag at 0x0143.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumDisplay)]
pub enum CgbSupport {
    None,
    Dual,
    Exclusive,
}

impl CgbSupport {
    fn from_byte(byte: u8) -> Self {
        match byte {
            0x80 => Self::Dual,
            0xC0 => Self::Exclusive,
            0x00 => Self::None,
            _ => {
                log::info!("Unknown CGB flag {byte:02X}, treating as a Game Boy only cartridge");
                Self::None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Licensee {
    Old(u8),
    New([u8; 2]),
}

impl std::fmt::Display for Licensee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Old(code) => write!(f, "{code:02X}"),
            Self::New([hi, lo]) => {
                write!(f, "{}{}", char::from(*hi), char::from(*lo))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartridgeHeader {
    pub title: String,
    pub game_code: String,
    pub cgb_support: CgbSupport,
    pub mapper_byte: u8,
    pub mapper_type: MapperType,
    pub(crate) mapper_features: MapperFeatures,
    pub rom_banks: Option<u32>,
    pub ram_banks: Option<u32>,
    pub licensee: Licensee,
}

impl CartridgeHeader {
    pub(crate) fn parse(rom: &[u8], rom_only_as_mbc1: bool) -> Result<Self, CartridgeLoadError> {
        let min_len = usize::from(address::HEADER_END) + 1;
        if rom.len() < min_len {
            return Err(CartridgeLoadError::TooSmall { len: rom.len(), min_len });
        }

        let title = header_string(rom, address::TITLE_START, address::TITLE_END);
        let game_code = header_string(rom, address::GAME_CODE_START, address::GAME_CODE_END);
        let cgb_support = CgbSupport::from_byte(rom[usize::from(address::CGB_SUPPORT)]);

        let mapper_byte = rom[usize::from(address::MAPPER)];
        let (mapper_type, mapper_features) = match mapper::parse_byte(mapper_byte) {
            Some((MapperType::None, features)) if mapper_byte == 0x00 && rom_only_as_mbc1 => {
                (MapperType::MBC1, features)
            }
            Some(parsed) => parsed,
            None => {
                log::warn!("Unknown cartridge type byte {mapper_byte:02X}, falling back to ROM only");
                (
                    MapperType::None,
                    MapperFeatures {
                        has_ram: false,
                        has_battery: false,
                        has_rtc: false,
                        has_rumble: false,
                    },
                )
            }
        };

        let rom_banks = rom_bank_count(rom[usize::from(address::ROM_SIZE)]);
        let ram_banks = ram_bank_count(rom[usize::from(address::RAM_SIZE)]);

        let old_licensee = rom[usize::from(address::OLD_LICENSEE_CODE)];
        let licensee = if old_licensee != 0x33 {
            Licensee::Old(old_licensee)
        } else {
            let new_licensee = usize::from(address::NEW_LICENSEE_CODE);
            Licensee::New([rom[new_licensee], rom[new_licensee + 1]])
        };

        Ok(Self {
            title,
            game_code,
            cgb_support,
            mapper_byte,
            mapper_type,
            mapper_features,
            rom_banks,
            ram_banks,
            licensee,
        })
    }
}

fn header_string(rom: &[u8], start: u16, end: u16) -> String {
    rom[usize::from(start)..=usize::from(end)]
        .iter()
        .filter(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

fn rom_bank_count(code: u8) -> Option<u32> {
    match code {
        0x00..=0x08 => Some(2 << code),
        0x52 => Some(72),
        0x53 => Some(80),
        0x54 => Some(96),
        _ => None,
    }
}

fn ram_bank_count(code: u8) -> Option<u32> {
    match code {
        0x00 => Some(0),
        0x01 => Some(1),
        0x02 => Some(2),
        0x03 => Some(4),
        0x04 => Some(16),
        _ => None,
    }
}
