pub(crate) mod address;
pub(crate) mod decoder;
mod header;
pub(crate) mod ioregisters;
mod mapper;

use crate::memory::decoder::{ReadHandler, WriteHandler};
use crate::memory::ioregisters::{InterruptFlags, IoRegister};
use crate::memory::mapper::{Mapper, RamMapResult};
use crate::HardwareMode;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub use header::{CartridgeHeader, CartridgeLoadError, CgbSupport, Licensee};
pub use mapper::MapperType;

const MEMORY_LEN: usize = 0x10000;
const VRAM_BANK_LEN: usize = 0x2000;
const BANKED_WORKING_RAM_LEN: usize = 0x7000;
const WORKING_RAM_BANK_LEN: usize = 0x1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cartridge {
    rom: Vec<u8>,
    ram: Vec<u8>,
    mapper: Mapper,
    header: CartridgeHeader,
    force_ram_access: bool,
}

impl Cartridge {
    /// Parse the header and set up the bank controller and cartridge RAM.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is too small to contain a cartridge header.
    pub fn new(
        rom: Vec<u8>,
        rom_only_as_mbc1: bool,
        force_ram_access: bool,
    ) -> Result<Self, CartridgeLoadError> {
        let header = CartridgeHeader::parse(&rom, rom_only_as_mbc1)?;

        let ram_len = mapper::ram_len(header.mapper_type, header.mapper_features);
        let mapper = Mapper::new(header.mapper_type, header.mapper_features, SystemTime::now());

        log::info!(
            "Loaded cartridge '{}' [{}], type {:02X} ({}, {}), {} bytes of ROM, {ram_len} bytes of cartridge RAM",
            header.title,
            header.game_code,
            header.mapper_byte,
            header.mapper_type,
            header.mapper_features,
            rom.len()
        );
        if let Some(rom_banks) = header.rom_banks {
            log::debug!("Header declares {rom_banks} ROM banks");
        }
        match header.ram_banks {
            Some(ram_banks) => log::debug!("Header declares {ram_banks} RAM banks"),
            None => log::debug!("Header RAM size is unknown, using the controller's maximum"),
        }

        Ok(Self { rom, ram: vec![0; ram_len], mapper, header, force_ram_access })
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn has_ram(&self) -> bool {
        !self.ram.is_empty()
    }

    fn read_rom_bank_0(&self, address: u16) -> u8 {
        self.rom.get(usize::from(address)).copied().unwrap_or(0xFF)
    }

    fn read_rom_switchable(&self, address: u16) -> u8 {
        let bank_offset = self.mapper.rom_bank_offset(self.rom.len()) as usize;
        let relative_address = usize::from(address - address::SWITCHABLE_ROM_START);
        self.rom.get(bank_offset + relative_address).copied().unwrap_or(0xFF)
    }

    fn write_rom_address(&mut self, address: u16, value: u8) {
        self.mapper.write_rom_address(address, value);
    }

    fn read_ram(&self, address: u16) -> u8 {
        match self.mapper.map_ram_address(address, self.force_ram_access) {
            RamMapResult::RamAddress(ram_address) => {
                self.ram.get(ram_address as usize).copied().unwrap_or(0xFF)
            }
            RamMapResult::HalfByteAddress(ram_address) => {
                self.ram.get(ram_address as usize).map_or(0xFF, |&value| 0xF0 | value)
            }
            RamMapResult::RtcRegister(register) => self.mapper.read_rtc_register(register),
            RamMapResult::None => 0xFF,
        }
    }

    fn write_ram(&mut self, address: u16, value: u8) {
        match self.mapper.map_ram_address(address, self.force_ram_access) {
            RamMapResult::RamAddress(ram_address) => {
                if let Some(byte) = self.ram.get_mut(ram_address as usize) {
                    *byte = value;
                }
            }
            RamMapResult::HalfByteAddress(ram_address) => {
                if let Some(byte) = self.ram.get_mut(ram_address as usize) {
                    *byte = value & 0x0F;
                }
            }
            RamMapResult::RtcRegister(register) => {
                self.mapper.write_rtc_register(register, value);
            }
            RamMapResult::None => {}
        }
    }

    pub(crate) fn update_rtc(&mut self, now: SystemTime) {
        self.mapper.update_rtc(now);
    }

    pub fn rumble_active(&self) -> bool {
        self.mapper.rumble_active()
    }
}

/// The full 16-bit address space: flat main memory, the banked arrays that only exist on the
/// Game Boy Color, the cartridge, and the dispatch tables that route each address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressSpace {
    hardware_mode: HardwareMode,
    cartridge: Cartridge,
    boot_rom: Option<Vec<u8>>,
    bootstrapping: bool,
    used_boot_rom: bool,
    memory: Box<[u8]>,
    vram_bank_1: Box<[u8]>,
    working_ram_banks: Box<[u8]>,
    vram_bank: u8,
    working_ram_bank: u8,
    #[serde(skip)]
    read_table: Box<[ReadHandler]>,
    #[serde(skip)]
    write_table: Box<[WriteHandler]>,
}

impl AddressSpace {
    pub fn new(
        cartridge: Cartridge,
        boot_rom: Option<Vec<u8>>,
        hardware_mode: HardwareMode,
    ) -> Self {
        let bootstrapping = boot_rom.is_some();
        let mut address_space = Self {
            hardware_mode,
            cartridge,
            boot_rom,
            bootstrapping,
            used_boot_rom: bootstrapping,
            memory: vec![0; MEMORY_LEN].into_boxed_slice(),
            vram_bank_1: vec![0; VRAM_BANK_LEN].into_boxed_slice(),
            working_ram_banks: vec![0; BANKED_WORKING_RAM_LEN].into_boxed_slice(),
            vram_bank: 0,
            working_ram_bank: 1,
            read_table: Box::default(),
            write_table: Box::default(),
        };
        address_space.rebuild_tables();

        address_space
    }

    pub fn hardware_mode(&self) -> HardwareMode {
        self.hardware_mode
    }

    pub fn is_cgb(&self) -> bool {
        self.hardware_mode == HardwareMode::GameBoyColor
    }

    pub(crate) fn set_hardware_mode(&mut self, hardware_mode: HardwareMode) {
        if hardware_mode != self.hardware_mode {
            log::debug!("Hardware mode changed from {} to {hardware_mode}", self.hardware_mode);
            self.hardware_mode = hardware_mode;
            self.rebuild_tables();
        }
    }

    pub fn bootstrapping(&self) -> bool {
        self.bootstrapping
    }

    pub fn used_boot_rom(&self) -> bool {
        self.used_boot_rom
    }

    /// Unmap the boot ROM overlay. The boot image is released; only the fact that it ran is kept.
    pub(crate) fn disable_boot_rom(&mut self) {
        self.bootstrapping = false;
        self.boot_rom = None;
        self.rebuild_tables();
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub(crate) fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    /// Raw value of an I/O register, bypassing read masks.
    pub(crate) fn io(&self, register: IoRegister) -> u8 {
        self.memory[usize::from(register.to_address())]
    }

    /// Store a raw I/O register value, bypassing write side effects.
    pub(crate) fn set_io(&mut self, register: IoRegister, value: u8) {
        self.memory[usize::from(register.to_address())] = value;
    }

    pub(crate) fn interrupt_flags(&mut self) -> InterruptFlags<'_> {
        InterruptFlags(&mut self.memory[usize::from(IoRegister::IF.to_address())])
    }

    pub(crate) fn ie_register(&self) -> u8 {
        self.memory[usize::from(address::IE_REGISTER)]
    }

    /// Requested and enabled interrupts.
    pub(crate) fn pending_interrupts(&self) -> u8 {
        self.ie_register() & self.io(IoRegister::IF) & 0x1F
    }

    pub(crate) fn vram(&self, bank: u8) -> &[u8] {
        if bank == 0 {
            &self.memory[usize::from(address::VRAM_START)..=usize::from(address::VRAM_END)]
        } else {
            &self.vram_bank_1
        }
    }

    pub(crate) fn vram_mut(&mut self, bank: u8) -> &mut [u8] {
        if bank == 0 {
            &mut self.memory[usize::from(address::VRAM_START)..=usize::from(address::VRAM_END)]
        } else {
            &mut self.vram_bank_1
        }
    }

    pub(crate) fn vram_bank(&self) -> u8 {
        self.vram_bank
    }

    pub(crate) fn oam(&self) -> &[u8] {
        &self.memory[usize::from(address::OAM_START)..=usize::from(address::OAM_END)]
    }

    pub(crate) fn oam_mut(&mut self) -> &mut [u8] {
        &mut self.memory[usize::from(address::OAM_START)..=usize::from(address::OAM_END)]
    }

    pub(crate) fn working_ram_bank(&self) -> u8 {
        self.working_ram_bank
    }

    // Index into the banked work RAM array for 0xD000-0xDFFF or its echo at 0xF000-0xFDFF
    fn banked_working_ram_index(&self, address: u16) -> usize {
        let relative_address = usize::from(address & 0x0FFF);
        usize::from(self.working_ram_bank - 1) * WORKING_RAM_BANK_LEN + relative_address
    }

    pub(crate) fn read_raw(&self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    pub(crate) fn write_raw(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }

    pub(crate) fn update_rtc(&mut self, now: SystemTime) {
        self.cartridge.update_rtc(now);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeInfo {
    pub title: String,
    pub game_code: String,
    pub mapper_type: MapperType,
    pub hardware_mode: HardwareMode,
    pub licensee: Licensee,
}

impl std::fmt::Display for CartridgeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "title={}, game_code={}, mapper={}, mode={}, licensee={}",
            self.title, self.game_code, self.mapper_type, self.hardware_mode, self.licensee
        )
    }
}
