use crate::apu::ApuState;
use crate::config::{ColorModePreference, EmulatorConfig};
use crate::cpu::{self, CpuRegisters};
use crate::data;
use crate::eventloop::FrameThrottle;
use crate::input::JoypadState;
use crate::memory::address;
use crate::memory::ioregisters::IoRegister;
use crate::memory::{AddressSpace, Cartridge, CartridgeInfo, CartridgeLoadError, CgbSupport};
use crate::ppu::{PpuState, TileCacheLayout};
use crate::scheduler::TimingState;
use crate::timer::TimerState;
use crate::HardwareMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BOOT_ROM_LEN: usize = 0x900;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("error loading cartridge: {source}")]
    Cartridge {
        #[from]
        source: CartridgeLoadError,
    },
    #[error("boot ROM is {len} bytes, expected {BOOT_ROM_LEN}")]
    BootRomSize { len: usize },
}

/// A complete machine. Every component's state lives here; snapshots serialize this struct minus
/// the host-side configuration and frame pacing.
#[derive(Serialize, Deserialize)]
pub struct EmulationState {
    pub(crate) address_space: AddressSpace,
    pub(crate) cpu_registers: CpuRegisters,
    pub(crate) ppu_state: PpuState,
    pub(crate) timer_state: TimerState,
    pub(crate) apu_state: ApuState,
    pub(crate) timing: TimingState,
    pub(crate) joypad_state: JoypadState,
    #[serde(skip)]
    pub(crate) config: EmulatorConfig,
    #[serde(skip)]
    pub(crate) throttle: FrameThrottle,
    #[serde(skip)]
    pub(crate) stop_requested: bool,
}

impl EmulationState {
    /// Power on a machine with the given cartridge image. Without a boot ROM, the registers are
    /// set to the values the boot ROM would have left behind and execution starts at 0x0100.
    ///
    /// # Errors
    ///
    /// Returns an error if the cartridge header can't be parsed or the boot ROM has the wrong
    /// size.
    pub fn new(
        rom: Vec<u8>,
        boot_rom: Option<Vec<u8>>,
        config: EmulatorConfig,
    ) -> Result<Self, StartupError> {
        if let Some(boot_rom) = &boot_rom {
            if boot_rom.len() != BOOT_ROM_LEN {
                return Err(StartupError::BootRomSize { len: boot_rom.len() });
            }
        }

        let cartridge =
            Cartridge::new(rom, config.rom_only_as_mbc1, config.force_cartridge_ram_access)?;

        let boot_rom_present = boot_rom.is_some();
        let hardware_mode = if boot_rom_present {
            // The color boot ROM picks the final mode itself
            HardwareMode::GameBoyColor
        } else {
            select_hardware_mode(cartridge.header().cgb_support, config.color_mode)
        };
        let layout = match hardware_mode {
            HardwareMode::GameBoy => TileCacheLayout::MONOCHROME,
            HardwareMode::GameBoyColor => TileCacheLayout::COLOR,
        };

        let address_space = AddressSpace::new(cartridge, boot_rom, hardware_mode);
        let mut state = Self {
            address_space,
            cpu_registers: cpu::initial_registers(hardware_mode, boot_rom_present),
            ppu_state: PpuState::new(layout),
            timer_state: TimerState::new(0),
            apu_state: ApuState::new(),
            timing: TimingState::new(),
            joypad_state: JoypadState::new(),
            config,
            throttle: FrameThrottle::new(),
            stop_requested: false,
        };

        if boot_rom_present {
            state.address_space.set_io(IoRegister::JOYP, 0x0F);
        } else {
            state.apply_post_boot_registers();
        }

        state.ppu_state.select_palette(
            state.address_space.is_cgb(),
            boot_rom_present,
            state.config.colorize_monochrome,
        );

        log::info!(
            "Starting in {hardware_mode} mode{}",
            if boot_rom_present { " from the boot ROM" } else { "" }
        );

        Ok(state)
    }

    fn apply_post_boot_registers(&mut self) {
        for (address, value) in data::POST_BOOT_IO {
            if data::applied_through_write_handler(address) {
                self.write_address_u8(address, value);
            } else {
                self.address_space.write_raw(address, value);
            }
        }

        let wave_ram = data::post_boot_wave_ram(self.address_space.hardware_mode());
        for (address, &value) in (address::WAVE_RAM_START..=address::WAVE_RAM_END).zip(wave_ram) {
            self.write_address_u8(address, value);
        }

        self.ppu_state.lcd_ticks = data::POST_BOOT_LCD_TICKS;
        self.timer_state = TimerState::new(data::POST_BOOT_DIV_TICKS);
    }

    /// FF50 write: unmap the boot ROM and settle on the mode it selected.
    pub(crate) fn finish_boot(&mut self, value: u8) {
        self.address_space.set_io(IoRegister::BOOT, value);
        if !self.address_space.bootstrapping() {
            return;
        }

        self.address_space.disable_boot_rom();
        if !self.address_space.is_cgb() {
            self.ppu_state.set_layout(TileCacheLayout::MONOCHROME);
        }
        self.ppu_state.select_palette(
            self.address_space.is_cgb(),
            self.address_space.used_boot_rom(),
            self.config.colorize_monochrome,
        );

        log::info!("Boot ROM finished, running in {} mode", self.address_space.hardware_mode());
    }

    /// FF6C write while the boot ROM is mapped: 0x80 keeps color mode, anything else selects
    /// monochrome compatibility.
    pub(crate) fn select_boot_hardware_mode(&mut self, value: u8) {
        self.address_space.set_io(IoRegister::OPRI, value);
        if !self.address_space.bootstrapping() {
            return;
        }

        let hardware_mode = if value == 0x80 {
            HardwareMode::GameBoyColor
        } else {
            HardwareMode::GameBoy
        };
        self.address_space.set_hardware_mode(hardware_mode);
    }

    pub fn hardware_mode(&self) -> HardwareMode {
        self.address_space.hardware_mode()
    }

    pub fn cartridge_info(&self) -> CartridgeInfo {
        let header = self.address_space.cartridge().header();
        CartridgeInfo {
            title: header.title.clone(),
            game_code: header.game_code.clone(),
            mapper_type: header.mapper_type,
            hardware_mode: self.address_space.hardware_mode(),
            licensee: header.licensee,
        }
    }

    /// Whether a rumble cartridge currently has its motor switched on.
    pub fn rumble_active(&self) -> bool {
        self.address_space.cartridge().rumble_active()
    }
}

fn select_hardware_mode(
    cgb_support: CgbSupport,
    preference: ColorModePreference,
) -> HardwareMode {
    match (cgb_support, preference) {
        (CgbSupport::Exclusive, _) | (CgbSupport::Dual, ColorModePreference::Auto) => {
            HardwareMode::GameBoyColor
        }
        _ => HardwareMode::GameBoy,
    }
}
