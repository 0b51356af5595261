//! Per-address dispatch tables for reads and writes.
//!
//! Each of the 65536 addresses gets a handler chosen by range rules when the tables are built, so
//! an access is a table lookup plus a `match` on a small `Copy` enum.

use crate::cpu::InterruptType;
use crate::memory::address;
use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;
use crate::ppu::PpuState;
use crate::startup::EmulationState;

const ADDRESS_COUNT: usize = 0x10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadHandler {
    BootRom,
    RomBank0,
    RomSwitchable,
    Vram,
    CartridgeRam,
    Memory,
    BankedWorkingRam,
    Echo,
    BankedEcho,
    Oam,
    Unusable,
    Io(IoRegister),
    WaveRam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteHandler {
    MapperRegister,
    Vram,
    CartridgeRam,
    Memory,
    BankedWorkingRam,
    Echo,
    BankedEcho,
    Oam,
    Ignore,
    Io(IoRegister),
    WaveRam,
}

impl AddressSpace {
    /// Rebuild both dispatch tables from the current hardware mode and boot ROM state.
    pub(crate) fn rebuild_tables(&mut self) {
        let is_cgb = self.is_cgb();
        let bootstrapping = self.bootstrapping;

        self.read_table = (0..ADDRESS_COUNT)
            .map(|address| read_handler(address as u16, is_cgb, bootstrapping))
            .collect();
        self.write_table = (0..ADDRESS_COUNT)
            .map(|address| write_handler(address as u16, is_cgb, bootstrapping))
            .collect();

        log::debug!(
            "Rebuilt address decoder tables (mode={}, bootstrapping={bootstrapping})",
            self.hardware_mode
        );
    }

    pub fn read_address_u8(&self, address: u16, ppu_state: &PpuState) -> u8 {
        match self.read_table[usize::from(address)] {
            ReadHandler::BootRom => self
                .boot_rom
                .as_ref()
                .and_then(|boot_rom| boot_rom.get(usize::from(address)).copied())
                .unwrap_or(0xFF),
            ReadHandler::RomBank0 => self.cartridge.read_rom_bank_0(address),
            ReadHandler::RomSwitchable => self.cartridge.read_rom_switchable(address),
            ReadHandler::Vram => {
                if ppu_state.mode() == 3 {
                    0xFF
                } else {
                    self.vram(self.vram_bank)[usize::from(address - address::VRAM_START)]
                }
            }
            ReadHandler::CartridgeRam => self.cartridge.read_ram(address),
            ReadHandler::Memory => self.memory[usize::from(address)],
            ReadHandler::BankedWorkingRam | ReadHandler::BankedEcho => {
                self.working_ram_banks[self.banked_working_ram_index(address)]
            }
            ReadHandler::Echo => self.memory[usize::from(address - 0x2000)],
            ReadHandler::Oam => {
                if ppu_state.mode() > 1 {
                    0xFF
                } else {
                    self.memory[usize::from(address)]
                }
            }
            ReadHandler::Unusable => 0xFF,
            ReadHandler::Io(register) => self.read_io_register(register, ppu_state),
            ReadHandler::WaveRam => {
                // Channel 3 owns wave RAM while it is playing
                if self.io(IoRegister::NR52) & 0x04 != 0 {
                    0xFF
                } else {
                    self.memory[usize::from(address)]
                }
            }
        }
    }

    pub fn read_address_u16(&self, address: u16, ppu_state: &PpuState) -> u16 {
        let lsb = self.read_address_u8(address, ppu_state);
        let msb = self.read_address_u8(address.wrapping_add(1), ppu_state);
        u16::from_le_bytes([lsb, msb])
    }

    fn read_io_register(&self, register: IoRegister, ppu_state: &PpuState) -> u8 {
        let value = self.io(register);
        match register {
            IoRegister::JOYP => 0xC0 | value,
            IoRegister::SB => {
                if self.io(IoRegister::SC) & 0x01 != 0 {
                    0xFF
                } else {
                    value
                }
            }
            IoRegister::SC => {
                if self.is_cgb() {
                    0x7C | value
                } else {
                    0x7E | value
                }
            }
            IoRegister::TAC => 0xF8 | value,
            IoRegister::IF => 0xE0 | value,
            IoRegister::NR10 => 0x80 | value,
            IoRegister::NR11 | IoRegister::NR21 => 0x3F | value,
            IoRegister::NR14 | IoRegister::NR24 | IoRegister::NR34 | IoRegister::NR44 => {
                0xBF | value
            }
            IoRegister::NR30 => 0x7F | value,
            IoRegister::NR31 | IoRegister::NR41 => 0xFF,
            IoRegister::NR32 => 0x9F | value,
            IoRegister::NR52 => 0x70 | value,
            IoRegister::STAT => 0x80 | value | ppu_state.mode(),
            IoRegister::LY => {
                if ppu_state.lcd_enabled() {
                    value
                } else {
                    0
                }
            }
            IoRegister::VBK => self.vram_bank,
            _ => value,
        }
    }

    /// Select the VRAM bank mapped at 0x8000-0x9FFF.
    pub(crate) fn set_vram_bank(&mut self, value: u8) {
        self.vram_bank = value & 0x01;
    }

    /// Select the work RAM bank mapped at 0xD000-0xDFFF. Bank 0 selects bank 1.
    pub(crate) fn set_working_ram_bank(&mut self, value: u8, locked_by_hdma: bool) {
        if locked_by_hdma {
            log::debug!("Ignoring SVBK write {value:02X} while HDMA reads from banked work RAM");
        } else {
            self.working_ram_bank = (value & 0x07).max(1);
        }
        self.set_io(IoRegister::SVBK, value | 0x40);
    }
}

fn read_handler(address: u16, is_cgb: bool, bootstrapping: bool) -> ReadHandler {
    match address {
        address::ROM_START..=address::ROM_BANK_0_END => {
            let in_boot_rom = usize::from(address) < address::BOOT_ROM_LEN
                && !(address::BOOT_ROM_HEADER_GAP_START..=address::BOOT_ROM_HEADER_GAP_END)
                    .contains(&address);
            if bootstrapping && in_boot_rom {
                ReadHandler::BootRom
            } else {
                ReadHandler::RomBank0
            }
        }
        address::SWITCHABLE_ROM_START..=address::ROM_END => ReadHandler::RomSwitchable,
        address::VRAM_START..=address::VRAM_END => ReadHandler::Vram,
        address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => ReadHandler::CartridgeRam,
        address::WORKING_RAM_START..=address::CGB_BANK_0_WORKING_RAM_END => ReadHandler::Memory,
        address::CGB_BANKED_WORKING_RAM_START..=address::WORKING_RAM_END => {
            if is_cgb {
                ReadHandler::BankedWorkingRam
            } else {
                ReadHandler::Memory
            }
        }
        address::CGB_BANKED_ECHO_RAM_START..=address::ECHO_RAM_END if is_cgb => {
            ReadHandler::BankedEcho
        }
        address::ECHO_RAM_START..=address::ECHO_RAM_END => ReadHandler::Echo,
        address::OAM_START..=address::OAM_END => ReadHandler::Oam,
        address::UNUSABLE_START..=address::UNUSABLE_END => {
            if is_cgb {
                ReadHandler::Memory
            } else {
                ReadHandler::Unusable
            }
        }
        address::WAVE_RAM_START..=address::WAVE_RAM_END => ReadHandler::WaveRam,
        address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
            match mapped_io_register(address, is_cgb, bootstrapping) {
                Some(register) => ReadHandler::Io(register),
                None => ReadHandler::Memory,
            }
        }
        address::HRAM_START..=address::IE_REGISTER => ReadHandler::Memory,
    }
}

fn write_handler(address: u16, is_cgb: bool, bootstrapping: bool) -> WriteHandler {
    match address {
        address::ROM_START..=address::ROM_END => WriteHandler::MapperRegister,
        address::VRAM_START..=address::VRAM_END => WriteHandler::Vram,
        address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => WriteHandler::CartridgeRam,
        address::WORKING_RAM_START..=address::CGB_BANK_0_WORKING_RAM_END => WriteHandler::Memory,
        address::CGB_BANKED_WORKING_RAM_START..=address::WORKING_RAM_END => {
            if is_cgb {
                WriteHandler::BankedWorkingRam
            } else {
                WriteHandler::Memory
            }
        }
        address::CGB_BANKED_ECHO_RAM_START..=address::ECHO_RAM_END if is_cgb => {
            WriteHandler::BankedEcho
        }
        address::ECHO_RAM_START..=address::ECHO_RAM_END => WriteHandler::Echo,
        address::OAM_START..=address::OAM_END => WriteHandler::Oam,
        address::UNUSABLE_START..=address::UNUSABLE_END => {
            if is_cgb {
                WriteHandler::Memory
            } else {
                WriteHandler::Ignore
            }
        }
        address::WAVE_RAM_START..=address::WAVE_RAM_END => WriteHandler::WaveRam,
        address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
            match IoRegister::from_address(address) {
                Some(register) if register.is_boot_only() && !bootstrapping => {
                    WriteHandler::Ignore
                }
                Some(IoRegister::VBK) if !is_cgb => WriteHandler::Ignore,
                _ => match mapped_io_register(address, is_cgb, bootstrapping) {
                    Some(register) => WriteHandler::Io(register),
                    None => WriteHandler::Memory,
                },
            }
        }
        address::HRAM_START..=address::IE_REGISTER => WriteHandler::Memory,
    }
}

// Registers that exist in the current mode; anything else at 0xFF00-0xFF7F is plain memory
fn mapped_io_register(address: u16, is_cgb: bool, bootstrapping: bool) -> Option<IoRegister> {
    IoRegister::from_address(address).filter(|register| {
        (is_cgb || !register.is_cgb_only()) && (bootstrapping || !register.is_boot_only())
    })
}

impl EmulationState {
    pub fn read_address_u8(&self, address: u16) -> u8 {
        self.address_space.read_address_u8(address, &self.ppu_state)
    }

    pub fn read_address_u16(&self, address: u16) -> u16 {
        self.address_space.read_address_u16(address, &self.ppu_state)
    }

    pub(crate) fn write_address_u8(&mut self, address: u16, value: u8) {
        match self.address_space.write_table[usize::from(address)] {
            WriteHandler::MapperRegister => {
                self.address_space.cartridge.write_rom_address(address, value);
            }
            WriteHandler::Vram => {
                self.write_vram(address, value);
            }
            WriteHandler::CartridgeRam => {
                self.address_space.cartridge.write_ram(address, value);
            }
            WriteHandler::Memory => {
                self.address_space.memory[usize::from(address)] = value;
            }
            WriteHandler::BankedWorkingRam | WriteHandler::BankedEcho => {
                let index = self.address_space.banked_working_ram_index(address);
                self.address_space.working_ram_banks[index] = value;
            }
            WriteHandler::Echo => {
                self.address_space.memory[usize::from(address - 0x2000)] = value;
            }
            WriteHandler::Oam => {
                if self.ppu_state.mode() < 2 {
                    self.address_space.memory[usize::from(address)] = value;
                }
            }
            WriteHandler::Ignore => {}
            WriteHandler::Io(register) => {
                self.write_io_register(register, value);
            }
            WriteHandler::WaveRam => {
                self.apu_state.write_wave_ram(&mut self.address_space, address, value);
            }
        }
    }

    pub(crate) fn write_address_u16(&mut self, address: u16, value: u16) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb);
        self.write_address_u8(address.wrapping_add(1), msb);
    }

    fn write_io_register(&mut self, register: IoRegister, value: u8) {
        match register {
            IoRegister::JOYP => {
                self.joypad_state.write_joyp(&mut self.address_space, value);
            }
            IoRegister::SC => {
                if value & 0x01 != 0 {
                    // Internal clock with nothing on the other end of the link cable
                    self.address_space.set_io(IoRegister::SC, value & 0x7F);
                    self.address_space.interrupt_flags().set(InterruptType::Serial);
                } else {
                    self.address_space.set_io(IoRegister::SC, value);
                }
            }
            IoRegister::DIV => {
                self.address_space.set_io(IoRegister::DIV, 0);
            }
            IoRegister::TAC => {
                self.timer_state.write_tac(&mut self.address_space, value);
            }
            IoRegister::LY => {}
            IoRegister::LCDC => {
                self.write_lcdc(value);
            }
            IoRegister::STAT => {
                self.write_stat(value);
            }
            IoRegister::LYC => {
                self.write_lyc(value);
            }
            IoRegister::DMA => {
                self.oam_dma(value);
            }
            IoRegister::BGP | IoRegister::OBP0 | IoRegister::OBP1 => {
                self.write_monochrome_palette(register, value);
            }
            IoRegister::KEY1 => {
                let key1 = self.address_space.io(IoRegister::KEY1);
                self.address_space.set_io(IoRegister::KEY1, (value & 0x7F) | (key1 & 0x80));
            }
            IoRegister::VBK => {
                self.address_space.set_vram_bank(value);
            }
            IoRegister::HDMA1 | IoRegister::HDMA2 | IoRegister::HDMA3 | IoRegister::HDMA4 => {
                self.write_hdma_address(register, value);
            }
            IoRegister::HDMA5 => {
                self.write_hdma5(value);
            }
            IoRegister::BCPS | IoRegister::OCPS => {
                self.write_color_palette_index(register, value);
            }
            IoRegister::BCPD | IoRegister::OCPD => {
                self.write_color_palette_data(register, value);
            }
            IoRegister::SVBK => {
                let locked = self.hdma_reads_banked_working_ram();
                self.address_space.set_working_ram_bank(value, locked);
            }
            IoRegister::BOOT => {
                self.finish_boot(value);
            }
            IoRegister::OPRI => {
                self.select_boot_hardware_mode(value);
            }
            _ if register.is_audio_register() => {
                self.apu_state.write_register(&mut self.address_space, register, value);
            }
            _ => {
                self.address_space.set_io(register, value);
            }
        }
    }
}
