use crate::memory::ioregisters::IoRegister;
use crate::serialize;
use crate::startup::EmulationState;
use serde::{Deserialize, Serialize};

const MONOCHROME_SHADES: [u32; 4] = [0x80EF_FFDE, 0x80AD_D794, 0x8052_9273, 0x8018_3442];

const RAW_COLOR_LEN: usize = 0x80;
const COLOR_LEN: usize = 0x40;

// Object palettes start here in both the raw and converted color tables
const RAW_OBJECT_START: usize = 0x40;
const OBJECT_COLORS_START: usize = 0x20;

const ALPHA_MASK: u32 = 0x00FF_FFFF;
const OPAQUE: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum ActivePalette {
    Monochrome,
    Colorized,
    Color,
}

/// Monochrome palettes decoded from BGP/OBP0/OBP1 and the color palette RAM behind BCPD/OCPD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PaletteState {
    monochrome: [u32; 12],
    colorized: [u32; 12],
    // None until the first write, so that writing the power-on value still converts it
    #[serde(serialize_with = "serialize::serialize_array")]
    #[serde(deserialize_with = "serialize::deserialize_array")]
    raw_color: [Option<u8>; RAW_COLOR_LEN],
    #[serde(serialize_with = "serialize::serialize_array")]
    #[serde(deserialize_with = "serialize::deserialize_array")]
    color: [u32; COLOR_LEN],
    active: ActivePalette,
}

impl PaletteState {
    pub(crate) fn new() -> Self {
        let mut color = [0; COLOR_LEN];
        color[..OBJECT_COLORS_START].fill(u32::MAX);

        Self {
            monochrome: [0; 12],
            colorized: [0; 12],
            raw_color: [None; RAW_COLOR_LEN],
            color,
            active: ActivePalette::Monochrome,
        }
    }

    pub(crate) fn active_palette(&self) -> &[u32] {
        match self.active {
            ActivePalette::Monochrome => &self.monochrome,
            ActivePalette::Colorized => &self.colorized,
            ActivePalette::Color => &self.color,
        }
    }

    pub(crate) fn select_active(&mut self, is_cgb: bool, used_boot_rom: bool, colorize: bool) {
        self.active = if is_cgb {
            ActivePalette::Color
        } else if used_boot_rom && colorize {
            ActivePalette::Colorized
        } else {
            ActivePalette::Monochrome
        };
    }

    pub(crate) fn raw_color(&self, index: usize) -> u8 {
        self.raw_color[index & (RAW_COLOR_LEN - 1)].unwrap_or(0)
    }

    /// Decode a monochrome palette register into four palette entries starting at `start`.
    /// Color 0 is stored with a clear alpha byte.
    fn decode_monochrome(&mut self, start: usize, value: u8, used_boot_rom: bool) {
        let shade = |shift: u8| usize::from((value >> shift) & 0x03);

        for i in 0..4 {
            self.monochrome[start + i] = MONOCHROME_SHADES[shade(2 * i as u8)];
        }
        self.monochrome[start] &= ALPHA_MASK;

        if used_boot_rom {
            // Colorize from the palettes the color boot ROM left behind
            let offset = if start >= 4 { OBJECT_COLORS_START } else { 0 };
            for i in 0..4 {
                let color = self.color[offset + shade(2 * i as u8)];
                self.colorized[start + i] = if color >= OPAQUE { color } else { u32::MAX };
            }
            self.colorized[start] = self.color[offset + shade(0)] & ALPHA_MASK;
        }
    }

    /// Store a raw color palette byte and recompute the converted color. Returns the palette
    /// whose cached tiles are now stale, if any.
    fn write_color(&mut self, index: usize, value: u8) -> Option<usize> {
        if self.raw_color[index] == Some(value) {
            return None;
        }
        self.raw_color[index] = Some(value);

        if index >= RAW_OBJECT_START && index & 0x06 == 0 {
            // Object color 0 is always transparent
            return None;
        }

        let rgb555 = u16::from_le_bytes([self.raw_color(index & !1), self.raw_color(index | 1)]);
        let rgb555 = u32::from(rgb555);
        self.color[index >> 1] = OPAQUE
            | ((rgb555 & 0x001F) << 19)
            | ((rgb555 & 0x03E0) << 6)
            | ((rgb555 & 0x7C00) >> 7);
        if index & 0x06 == 0 {
            self.color[index >> 1] &= ALPHA_MASK;
        }

        Some(index >> 3)
    }
}

impl EmulationState {
    pub(crate) fn write_monochrome_palette(&mut self, register: IoRegister, value: u8) {
        let (start, palette) = match register {
            IoRegister::BGP => (0, 0),
            IoRegister::OBP0 => (4, 1),
            _ => (8, 2),
        };

        if !self.address_space.is_cgb() {
            let used_boot_rom = self.address_space.used_boot_rom();
            self.ppu_state.palettes.decode_monochrome(start, value, used_boot_rom);
        }

        if self.address_space.io(register) != value {
            self.address_space.set_io(register, value);
            self.ppu_state.tile_cache.invalidate_palette(palette);
        }
    }

    pub(crate) fn write_color_palette_index(&mut self, register: IoRegister, value: u8) {
        let (data_register, base) = match register {
            IoRegister::BCPS => (IoRegister::BCPD, 0),
            _ => (IoRegister::OCPD, RAW_OBJECT_START),
        };

        let raw = self.ppu_state.palettes.raw_color(base + usize::from(value & 0x3F));
        self.address_space.set_io(data_register, raw);
        self.address_space.set_io(register, value);
    }

    pub(crate) fn write_color_palette_data(&mut self, register: IoRegister, value: u8) {
        let (index_register, base) = match register {
            IoRegister::BCPD => (IoRegister::BCPS, 0),
            _ => (IoRegister::OCPS, RAW_OBJECT_START),
        };

        let index_value = self.address_space.io(index_register);
        let index = usize::from(index_value & 0x3F);
        if let Some(palette) = self.ppu_state.palettes.write_color(base + index, value) {
            self.ppu_state.tile_cache.invalidate_palette(palette);
        }

        if index_value & 0x80 != 0 {
            // Auto-increment
            let next = (index + 1) & 0x3F;
            self.address_space.set_io(index_register, 0x80 | next as u8);
            let raw = self.ppu_state.palettes.raw_color(base + next);
            self.address_space.set_io(register, raw);
        } else {
            self.address_space.set_io(register, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monochrome_decode() {
        let mut palettes = PaletteState::new();
        palettes.decode_monochrome(0, 0xE4, false);

        assert_eq!(
            &[
                MONOCHROME_SHADES[0] & ALPHA_MASK,
                MONOCHROME_SHADES[1],
                MONOCHROME_SHADES[2],
                MONOCHROME_SHADES[3]
            ],
            &palettes.monochrome[0..4]
        );

        palettes.decode_monochrome(8, 0x1B, false);
        assert_eq!(MONOCHROME_SHADES[3] & ALPHA_MASK, palettes.monochrome[8]);
        assert_eq!(MONOCHROME_SHADES[0], palettes.monochrome[11]);
    }

    #[test]
    fn color_conversion() {
        let mut palettes = PaletteState::new();

        // Pure red in BG palette 1, color 1
        assert_eq!(Some(1), palettes.write_color(0x0A, 0x1F));
        palettes.write_color(0x0B, 0x00);
        assert_eq!(0x80F8_0000, palettes.color[5]);

        // Pure blue in BG palette 0, color 0 keeps a clear alpha byte
        palettes.write_color(0x00, 0x00);
        assert_eq!(Some(0), palettes.write_color(0x01, 0x7C));
        assert_eq!(0x0000_00F8, palettes.color[0]);

        // Green
        palettes.write_color(0x02, 0xE0);
        palettes.write_color(0x03, 0x03);
        assert_eq!(0x8000_F800, palettes.color[1]);
    }

    #[test]
    fn unchanged_writes_are_skipped() {
        let mut palettes = PaletteState::new();
        assert_eq!(Some(0), palettes.write_color(0x02, 0x00));
        assert_eq!(None, palettes.write_color(0x02, 0x00));
    }

    #[test]
    fn object_color_0_is_never_converted() {
        let mut palettes = PaletteState::new();
        assert_eq!(None, palettes.write_color(0x40, 0xFF));
        assert_eq!(None, palettes.write_color(0x49, 0xFF));
        assert_eq!(0xFF, palettes.raw_color(0x49));
        assert_eq!(0, palettes.color[OBJECT_COLORS_START + 4]);
    }

    #[test]
    fn active_selection() {
        let mut palettes = PaletteState::new();
        palettes.select_active(false, true, true);
        assert_eq!(ActivePalette::Colorized, palettes.active);
        palettes.select_active(false, true, false);
        assert_eq!(ActivePalette::Monochrome, palettes.active);
        palettes.select_active(true, false, false);
        assert_eq!(COLOR_LEN, palettes.active_palette().len());
    }
}
