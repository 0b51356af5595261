//! Register contents the boot ROM leaves behind, used when starting without a boot image.

use crate::HardwareMode;

pub(crate) const POST_BOOT_LCD_TICKS: u32 = 15;
pub(crate) const POST_BOOT_DIV_TICKS: u32 = 14;

pub(crate) const POST_BOOT_IO: [(u16, u8); 29] = [
    (0xFF00, 0xCF),
    (0xFF05, 0x00),
    (0xFF06, 0x00),
    (0xFF07, 0xF8),
    (0xFF0F, 0xE1),
    (0xFF10, 0x80),
    (0xFF11, 0xBF),
    (0xFF12, 0xF3),
    (0xFF14, 0xBF),
    (0xFF16, 0x3F),
    (0xFF17, 0x00),
    (0xFF19, 0xBF),
    (0xFF1A, 0x7F),
    (0xFF1B, 0xFF),
    (0xFF1C, 0x9F),
    (0xFF1E, 0xBF),
    (0xFF20, 0xFF),
    (0xFF21, 0x00),
    (0xFF22, 0x00),
    (0xFF23, 0xBF),
    (0xFF24, 0x77),
    (0xFF25, 0xF3),
    (0xFF26, 0xF1),
    (0xFF40, 0x91),
    (0xFF47, 0xFC),
    (0xFF48, 0xFF),
    (0xFF49, 0xFF),
    (0xFFFF, 0x00),
    (0xFF50, 0x01),
];

const MONOCHROME_WAVE_RAM: [u8; 16] = [
    0x84, 0x40, 0x43, 0xAA, 0x2D, 0x78, 0x92, 0x3C, 0x60, 0x59, 0x59, 0xB0, 0x34, 0xB8, 0x2E, 0xDA,
];

const COLOR_WAVE_RAM: [u8; 16] = [
    0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF,
];

pub(crate) fn post_boot_wave_ram(hardware_mode: HardwareMode) -> &'static [u8; 16] {
    match hardware_mode {
        HardwareMode::GameBoy => &MONOCHROME_WAVE_RAM,
        HardwareMode::GameBoyColor => &COLOR_WAVE_RAM,
    }
}

/// Whether a post-boot value is applied through the register's write handler rather than
/// stored directly. Sound registers are stored directly so that no channel is triggered.
pub(crate) fn applied_through_write_handler(address: u16) -> bool {
    matches!(address, 0xFF00 | 0xFF07 | 0xFF0F | 0xFF40 | 0xFF47..=0xFF49 | 0xFFFF)
}
