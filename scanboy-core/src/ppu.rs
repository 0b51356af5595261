mod dma;
mod palette;
mod render;
mod tilecache;

use crate::cpu::InterruptType;
use crate::graphics::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::memory::address;
use crate::memory::ioregisters::IoRegister;
use crate::startup::EmulationState;
use serde::{Deserialize, Serialize};

pub(crate) use palette::PaletteState;
pub(crate) use tilecache::{TileCache, TileCacheLayout};

// Line timing in PPU ticks (machine cycles at normal speed)
const OAM_SCAN_END: u32 = 20;
const RENDERING_END: u32 = 63;
pub(crate) const LINE_TICKS: u32 = 114;

const LAST_VISIBLE_LINE: u8 = 143;
const LAST_LINE: u8 = 153;

// Drawn when the display is switched off: white with a clear alpha byte
pub(crate) const BLANK_COLOR: u32 = 0x00FF_FFFF;

/// Number of completed frames that are suppressed after the LCD is switched off.
const BLANK_FRAMES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) struct StatTriggers {
    pub(crate) lyc: bool,
    pub(crate) mode_2: bool,
    pub(crate) mode_1: bool,
    pub(crate) mode_0: bool,
}

impl StatTriggers {
    fn from_stat(value: u8) -> Self {
        Self {
            lyc: value & 0x40 != 0,
            mode_2: value & 0x20 != 0,
            mode_1: value & 0x10 != 0,
            mode_0: value & 0x08 != 0,
        }
    }
}

/// Rendering settings derived from LCDC writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LcdcFlags {
    pub(crate) window_tile_map_high: bool,
    pub(crate) window_enabled: bool,
    pub(crate) unsigned_tile_data: bool,
    pub(crate) bg_tile_map_high: bool,
    pub(crate) tall_sprites: bool,
    pub(crate) sprites_enabled: bool,
    pub(crate) bg_enabled: bool,
    // Color hardware only; when cleared every sprite is drawn above the background
    pub(crate) sprite_priority_enabled: bool,
}

impl Default for LcdcFlags {
    fn default() -> Self {
        Self {
            window_tile_map_high: false,
            window_enabled: false,
            unsigned_tile_data: false,
            bg_tile_map_high: false,
            tall_sprites: false,
            sprites_enabled: false,
            bg_enabled: true,
            sprite_priority_enabled: true,
        }
    }
}

impl LcdcFlags {
    fn update(&mut self, value: u8, is_cgb: bool) {
        self.window_tile_map_high = value & 0x40 != 0;
        self.window_enabled = value & 0x20 != 0;
        self.unsigned_tile_data = value & 0x10 != 0;
        self.bg_tile_map_high = value & 0x08 != 0;
        self.tall_sprites = value & 0x04 != 0;
        self.sprites_enabled = value & 0x02 != 0;

        if is_cgb {
            self.sprite_priority_enabled = value & 0x01 != 0;
        } else if value & 0x01 == 0 {
            // Monochrome LCDC bit 0 blanks both the background and the window
            self.bg_enabled = false;
            self.window_enabled = false;
        } else {
            self.bg_enabled = true;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpuState {
    mode: u8,
    lcd_enabled: bool,
    pub(crate) lcd_ticks: u32,
    // Line the controller is on; tracks LY except on line 153, where LY reads 0 early
    scanline: u8,
    stat_triggers: StatTriggers,
    stat_tracker: u8,
    window_line: u8,
    lcdc: LcdcFlags,
    drew_blank: u8,
    hdma_running: bool,
    frame_buffer: Vec<u32>,
    palettes: PaletteState,
    layout: TileCacheLayout,
    #[serde(skip)]
    tile_cache: TileCache,
}

impl PpuState {
    pub(crate) fn new(layout: TileCacheLayout) -> Self {
        Self {
            mode: 0,
            lcd_enabled: false,
            lcd_ticks: 0,
            scanline: 0,
            stat_triggers: StatTriggers::default(),
            stat_tracker: 0,
            window_line: 0,
            lcdc: LcdcFlags::default(),
            drew_blank: 0,
            hdma_running: false,
            frame_buffer: vec![BLANK_COLOR; SCREEN_WIDTH * SCREEN_HEIGHT],
            palettes: PaletteState::new(),
            layout,
            tile_cache: TileCache::new(layout),
        }
    }

    /// STAT mode: 0 = H-blank, 1 = V-blank, 2 = OAM scan, 3 = rendering.
    pub fn mode(&self) -> u8 {
        self.mode
    }

    pub fn lcd_enabled(&self) -> bool {
        self.lcd_enabled
    }

    pub(crate) fn scanline(&self) -> u8 {
        self.scanline
    }

    pub(crate) fn frame_buffer(&self) -> &[u32] {
        &self.frame_buffer
    }

    /// Whether completed frames are currently suppressed after the LCD was switched off.
    pub(crate) fn blanking(&self) -> bool {
        self.drew_blank != 0
    }

    pub(crate) fn hdma_running(&self) -> bool {
        self.hdma_running
    }

    pub(crate) fn palettes(&self) -> &PaletteState {
        &self.palettes
    }

    pub(crate) fn select_palette(&mut self, is_cgb: bool, used_boot_rom: bool, colorize: bool) {
        self.palettes.select_active(is_cgb, used_boot_rom, colorize);
    }

    pub(crate) fn layout(&self) -> TileCacheLayout {
        self.layout
    }

    /// Switch to a different tile cache shape, dropping every decoded tile.
    pub(crate) fn set_layout(&mut self, layout: TileCacheLayout) {
        self.layout = layout;
        self.tile_cache = TileCache::new(layout);
    }

    /// Recreate the state that snapshots don't carry: an empty tile cache of the saved shape.
    pub(crate) fn restore_derived_state(&mut self) {
        self.tile_cache = TileCache::new(self.layout);
    }

    fn invalidate_tile_at(&mut self, vram_bank: u8, relative_address: u16) {
        if relative_address < address::TILE_DATA_END - address::VRAM_START + 1 {
            let tile = usize::from(relative_address >> 4)
                + self.layout.tile_count / 2 * usize::from(vram_bank);
            self.tile_cache.invalidate_tile(tile);
        }
    }

    fn show_display_off(&mut self) {
        if self.drew_blank == 0 {
            self.frame_buffer.fill(BLANK_COLOR);
            self.drew_blank = BLANK_FRAMES;
        }
    }
}

impl EmulationState {
    /// Advance the scanline state machine by the PPU ticks accumulated so far. Does nothing while
    /// the display is off.
    pub(crate) fn run_line_controller(&mut self) {
        if !self.ppu_state.lcd_enabled {
            return;
        }

        loop {
            let ticks = self.ppu_state.lcd_ticks;
            match self.ppu_state.scanline {
                0..=LAST_VISIBLE_LINE => {
                    if ticks < OAM_SCAN_END {
                        self.enter_mode_2();
                        return;
                    } else if ticks < RENDERING_END {
                        self.enter_mode_3();
                        return;
                    } else if ticks < LINE_TICKS {
                        self.enter_mode_0();
                        return;
                    }

                    let entering_vblank = self.ppu_state.scanline == LAST_VISIBLE_LINE;

                    self.ppu_state.lcd_ticks -= LINE_TICKS;
                    self.increment_ly();
                    self.match_lyc();

                    if entering_vblank && self.ppu_state.stat_triggers.mode_1 {
                        self.request_stat_interrupt();
                    }

                    if self.ppu_state.stat_tracker != 2 {
                        // The line ended without its H-blank being seen
                        if self.hdma_permitted() {
                            self.perform_hdma_unit();
                        }
                        if self.ppu_state.stat_triggers.mode_0 {
                            self.request_stat_interrupt();
                        }
                    }
                    self.ppu_state.stat_tracker = 0;

                    if entering_vblank {
                        self.ppu_state.mode = 1;
                        self.address_space.interrupt_flags().set(InterruptType::VBlank);
                        self.ppu_state.drew_blank = self.ppu_state.drew_blank.saturating_sub(1);
                    } else {
                        self.enter_mode_2();
                        if self.ppu_state.lcd_ticks >= LINE_TICKS {
                            // Skipping over a whole line; it still gets drawn
                            self.ppu_state.render_scanline(&self.address_space);
                        }
                    }
                }
                LAST_LINE => {
                    if self.address_space.io(IoRegister::LY) == LAST_LINE {
                        // LY wraps to 0 early on the last line
                        self.address_space.set_io(IoRegister::LY, 0);
                        self.match_lyc();
                    }

                    if ticks < LINE_TICKS {
                        return;
                    }

                    self.ppu_state.lcd_ticks -= LINE_TICKS;
                    self.ppu_state.scanline = 0;
                    self.enter_mode_2();
                }
                _ => {
                    if ticks < LINE_TICKS {
                        return;
                    }

                    self.ppu_state.lcd_ticks -= LINE_TICKS;
                    self.increment_ly();
                    self.match_lyc();
                }
            }

            if self.ppu_state.lcd_ticks < LINE_TICKS {
                return;
            }
        }
    }

    fn increment_ly(&mut self) {
        let ly = self.address_space.io(IoRegister::LY).wrapping_add(1);
        self.address_space.set_io(IoRegister::LY, ly);
        self.ppu_state.scanline = ly;
    }

    fn request_stat_interrupt(&mut self) {
        self.address_space.interrupt_flags().set(InterruptType::LcdStatus);
    }

    fn enter_mode_2(&mut self) {
        if self.ppu_state.mode != 2 {
            if self.ppu_state.stat_triggers.mode_2 {
                self.request_stat_interrupt();
            }
            self.ppu_state.stat_tracker = 1;
            self.ppu_state.mode = 2;
        }
    }

    fn enter_mode_3(&mut self) {
        if self.ppu_state.mode != 3 {
            if self.ppu_state.stat_triggers.mode_2 && self.ppu_state.stat_tracker == 0 {
                self.request_stat_interrupt();
            }
            self.ppu_state.stat_tracker = 1;
            self.ppu_state.mode = 3;
        }
    }

    fn enter_mode_0(&mut self) {
        if self.ppu_state.mode != 0 {
            if self.hdma_permitted() {
                self.perform_hdma_unit();
            }

            let triggers = self.ppu_state.stat_triggers;
            if triggers.mode_0 || (triggers.mode_2 && self.ppu_state.stat_tracker == 0) {
                self.request_stat_interrupt();
            }

            self.ppu_state.render_scanline(&self.address_space);
            self.ppu_state.stat_tracker = 2;
            self.ppu_state.mode = 0;
        }
    }

    fn hdma_permitted(&self) -> bool {
        self.ppu_state.hdma_running && !self.cpu_registers.halted && self.ppu_state.lcd_enabled
    }

    /// Compare LY against LYC, updating the STAT coincidence bit.
    pub(crate) fn match_lyc(&mut self) {
        let stat = self.address_space.io(IoRegister::STAT);
        if self.address_space.io(IoRegister::LY) == self.address_space.io(IoRegister::LYC) {
            self.address_space.set_io(IoRegister::STAT, stat | 0x04);
            if self.ppu_state.stat_triggers.lyc {
                self.request_stat_interrupt();
            }
        } else {
            self.address_space.set_io(IoRegister::STAT, stat & !0x04);
        }
    }

    pub(crate) fn write_lcdc(&mut self, value: u8) {
        let lcd_enabled = value & 0x80 != 0;
        if lcd_enabled != self.ppu_state.lcd_enabled {
            log::debug!("LCD turned {}", if lcd_enabled { "on" } else { "off" });

            let stat = self.address_space.io(IoRegister::STAT);
            self.address_space.set_io(IoRegister::STAT, stat & 0xF8);
            self.ppu_state.stat_tracker = 0;
            self.ppu_state.mode = 0;
            self.ppu_state.lcd_ticks = 0;
            self.ppu_state.scanline = 0;
            self.address_space.set_io(IoRegister::LY, 0);
            self.ppu_state.lcd_enabled = lcd_enabled;

            if lcd_enabled {
                self.match_lyc();
            } else {
                self.ppu_state.show_display_off();
            }

            self.address_space.interrupt_flags().clear(InterruptType::LcdStatus);
        }

        let is_cgb = self.address_space.is_cgb();
        self.ppu_state.lcdc.update(value, is_cgb);
        self.address_space.set_io(IoRegister::LCDC, value);
    }

    pub(crate) fn write_stat(&mut self, value: u8) {
        self.ppu_state.stat_triggers = StatTriggers::from_stat(value);

        self.address_space.set_io(IoRegister::STAT, value & 0xF8);

        // Monochrome STAT write quirk
        if !self.address_space.is_cgb() && self.ppu_state.lcd_enabled && self.ppu_state.mode < 2 {
            self.request_stat_interrupt();
        }
    }

    pub(crate) fn write_lyc(&mut self, value: u8) {
        self.address_space.set_io(IoRegister::LYC, value);
        if self.ppu_state.lcd_enabled {
            self.match_lyc();
        }
    }

    pub(crate) fn write_vram(&mut self, address: u16, value: u8) {
        if self.ppu_state.mode == 3 {
            return;
        }

        let bank = self.address_space.vram_bank();
        let relative_address = address - address::VRAM_START;
        self.ppu_state.invalidate_tile_at(bank, relative_address);
        self.address_space.vram_mut(bank)[usize::from(relative_address)] = value;
    }
}
