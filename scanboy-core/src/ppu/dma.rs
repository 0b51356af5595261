use crate::memory::address;
use crate::memory::ioregisters::IoRegister;
use crate::startup::EmulationState;
use tinyvec::ArrayVec;

const OAM_LEN: u16 = 0xA0;
const HDMA_UNIT_LEN: u16 = 0x10;

impl EmulationState {
    /// Copy 160 bytes from `value << 8` into OAM. The monochrome hardware only copies from
    /// sources at or above 0x8000.
    pub(crate) fn oam_dma(&mut self, value: u8) {
        self.address_space.set_io(IoRegister::DMA, value);

        if !self.address_space.is_cgb() && value < 0x80 {
            return;
        }

        let source = u16::from(value) << 8;
        log::trace!("OAM DMA from {source:04X}");

        for i in 0..OAM_LEN {
            let byte = self.read_address_u8(source.wrapping_add(i));
            self.address_space.oam_mut()[usize::from(i)] = byte;
        }
    }

    pub(crate) fn write_hdma_address(&mut self, register: IoRegister, value: u8) {
        if self.ppu_state.hdma_running {
            return;
        }

        let value = match register {
            IoRegister::HDMA1 => value,
            IoRegister::HDMA3 => value & 0x1F,
            _ => value & 0xF0,
        };
        self.address_space.set_io(register, value);
    }

    pub(crate) fn write_hdma5(&mut self, value: u8) {
        let multiplier = self.timing.speed_multiplier;

        if self.ppu_state.hdma_running && value & 0x80 == 0 {
            log::trace!("H-blank DMA stopped");
            self.ppu_state.hdma_running = false;
            let hdma5 = self.address_space.io(IoRegister::HDMA5);
            self.address_space.set_io(IoRegister::HDMA5, hdma5 | 0x80);
            return;
        }

        if value & 0x80 == 0 {
            // General purpose DMA runs to completion immediately
            let units = u32::from(value & 0x7F) + 1;
            log::trace!("General DMA of {} bytes", units * u32::from(HDMA_UNIT_LEN));

            for _ in 0..units {
                self.copy_hdma_unit();
            }
            self.timing.cpu_ticks += 1 + 8 * units * multiplier;
            self.address_space.set_io(IoRegister::HDMA5, 0xFF);
            return;
        }

        let remaining = value & 0x7F;
        self.address_space.set_io(IoRegister::HDMA5, remaining);
        if remaining == 0 {
            self.address_space.set_io(IoRegister::HDMA5, 0xFF);
        } else {
            log::trace!("H-blank DMA started, {} units", u16::from(remaining) + 1);
            self.ppu_state.hdma_running = true;
        }
    }

    /// Copy one 16-byte H-blank DMA unit and count it against HDMA5.
    pub(crate) fn perform_hdma_unit(&mut self) {
        self.timing.cpu_ticks += 1 + 8 * self.timing.speed_multiplier;
        self.copy_hdma_unit();

        match self.address_space.io(IoRegister::HDMA5) {
            0 => {
                log::trace!("H-blank DMA finished");
                self.ppu_state.hdma_running = false;
                self.address_space.set_io(IoRegister::HDMA5, 0xFF);
            }
            remaining => {
                self.address_space.set_io(IoRegister::HDMA5, remaining - 1);
            }
        }
    }

    fn hdma_source(&self) -> u16 {
        u16::from_be_bytes([
            self.address_space.io(IoRegister::HDMA1),
            self.address_space.io(IoRegister::HDMA2),
        ])
    }

    fn hdma_destination(&self) -> u16 {
        u16::from_be_bytes([
            self.address_space.io(IoRegister::HDMA3),
            self.address_space.io(IoRegister::HDMA4),
        ]) & 0x1FF0
    }

    // Copy 16 bytes into the current VRAM bank and advance the source/destination registers
    fn copy_hdma_unit(&mut self) {
        let source = self.hdma_source();
        let destination = self.hdma_destination();

        let unit: ArrayVec<[u8; 16]> =
            (0..HDMA_UNIT_LEN).map(|i| self.read_address_u8(source.wrapping_add(i))).collect();

        let bank = self.address_space.vram_bank();
        for (i, byte) in (0..).zip(unit) {
            let relative_address = (destination + i) & 0x1FFF;
            self.ppu_state.invalidate_tile_at(bank, relative_address);
            self.address_space.vram_mut(bank)[usize::from(relative_address)] = byte;
        }

        let source = source.wrapping_add(HDMA_UNIT_LEN);
        let destination = destination.wrapping_add(HDMA_UNIT_LEN);
        let [source_hi, source_lo] = source.to_be_bytes();
        let [destination_hi, destination_lo] = destination.to_be_bytes();
        self.address_space.set_io(IoRegister::HDMA1, source_hi);
        self.address_space.set_io(IoRegister::HDMA2, source_lo & 0xF0);
        self.address_space.set_io(IoRegister::HDMA3, destination_hi & 0x1F);
        self.address_space.set_io(IoRegister::HDMA4, destination_lo & 0xF0);
    }

    /// Whether a running H-blank DMA is reading from the banked work RAM window, which pins
    /// the work RAM bank until it finishes.
    pub(crate) fn hdma_reads_banked_working_ram(&self) -> bool {
        self.ppu_state.hdma_running
            && (address::CGB_BANKED_WORKING_RAM_START..=address::WORKING_RAM_END)
                .contains(&self.hdma_source())
    }
}

#[cfg(test)]
mod tests {
    use crate::startup::EmulationState;
    use crate::EmulatorConfig;

    fn new_cgb_state() -> EmulationState {
        let mut rom = vec![0; 0x8000];
        rom[0x0143] = 0xC0;
        EmulationState::new(rom, None, EmulatorConfig::default())
            .expect("synthetic cartridge should load")
    }

    fn fill_source(state: &mut EmulationState, start: u16, len: u16) {
        for i in 0..len {
            state.write_address_u8(start + i, i as u8);
        }
    }

    fn set_addresses(state: &mut EmulationState, source: u16, destination: u16) {
        let [source_hi, source_lo] = source.to_be_bytes();
        let [destination_hi, destination_lo] = destination.to_be_bytes();
        state.write_address_u8(0xFF51, source_hi);
        state.write_address_u8(0xFF52, source_lo);
        state.write_address_u8(0xFF53, destination_hi);
        state.write_address_u8(0xFF54, destination_lo);
    }

    #[test]
    fn oam_dma() {
        let mut state = new_cgb_state();
        fill_source(&mut state, 0xC100, 0xA0);

        state.write_address_u8(0xFF46, 0xC1);

        assert_eq!(0x00, state.address_space.oam()[0]);
        assert_eq!(0x9F, state.address_space.oam()[0x9F]);
        assert_eq!(0xC1, state.address_space.io(crate::memory::ioregisters::IoRegister::DMA));
    }

    #[test]
    fn monochrome_oam_dma_ignores_low_sources() {
        let mut state =
            EmulationState::new(vec![0; 0x8000], None, EmulatorConfig::default())
                .expect("synthetic cartridge should load");
        state.address_space.oam_mut()[5] = 0x77;

        state.write_address_u8(0xFF46, 0x20);
        assert_eq!(0x77, state.address_space.oam()[5]);

        fill_source(&mut state, 0xC000, 0xA0);
        state.write_address_u8(0xFF46, 0xC0);
        assert_eq!(0x05, state.address_space.oam()[5]);
    }

    #[test]
    fn general_dma() {
        let mut state = new_cgb_state();
        fill_source(&mut state, 0xC000, 0x40);
        set_addresses(&mut state, 0xC000, 0x8100);

        state.timing.cpu_ticks = 0;
        state.write_address_u8(0xFF55, 0x03);

        assert_eq!(0xFF, state.address_space.io(crate::memory::ioregisters::IoRegister::HDMA5));
        assert_eq!(1 + 8 * 4, state.timing.cpu_ticks);
        for i in 0..0x40 {
            assert_eq!(i as u8, state.address_space.vram(0)[0x100 + i]);
        }

        // Registers are left pointing past the copied block
        assert_eq!(0xC0, state.read_address_u8(0xFF51));
        assert_eq!(0x40, state.read_address_u8(0xFF52));
        assert_eq!(0x01, state.read_address_u8(0xFF53));
        assert_eq!(0x40, state.read_address_u8(0xFF54));
    }

    #[test]
    fn hblank_dma_copies_one_unit_per_call() {
        let mut state = new_cgb_state();
        fill_source(&mut state, 0xC200, 0x20);
        set_addresses(&mut state, 0xC200, 0x8000);

        state.write_address_u8(0xFF55, 0x81);
        assert!(state.ppu_state.hdma_running());
        assert_eq!(0x01, state.read_address_u8(0xFF55));

        // Address registers are frozen while the transfer runs
        state.write_address_u8(0xFF51, 0xD0);
        assert_eq!(0xC2, state.read_address_u8(0xFF51));

        state.perform_hdma_unit();
        assert_eq!(0x0F, state.address_space.vram(0)[0x0F]);
        assert_eq!(0x00, state.address_space.vram(0)[0x10]);
        assert_eq!(0x00, state.read_address_u8(0xFF55));

        state.perform_hdma_unit();
        assert_eq!(0x1F, state.address_space.vram(0)[0x1F]);
        assert!(!state.ppu_state.hdma_running());
        assert_eq!(0xFF, state.read_address_u8(0xFF55));
    }

    #[test]
    fn hblank_dma_can_be_stopped() {
        let mut state = new_cgb_state();
        set_addresses(&mut state, 0xC000, 0x8000);

        state.write_address_u8(0xFF55, 0x85);
        state.write_address_u8(0xFF55, 0x00);

        assert!(!state.ppu_state.hdma_running());
        assert_eq!(0x85, state.read_address_u8(0xFF55));
    }

    #[test]
    fn zero_length_hblank_dma_completes_immediately() {
        let mut state = new_cgb_state();
        state.write_address_u8(0xFF55, 0x80);

        assert!(!state.ppu_state.hdma_running());
        assert_eq!(0xFF, state.read_address_u8(0xFF55));
    }

    #[test]
    fn working_ram_bank_pinned_by_hdma() {
        let mut state = new_cgb_state();
        state.write_address_u8(0xFF70, 0x02);
        set_addresses(&mut state, 0xD000, 0x8000);
        state.write_address_u8(0xFF55, 0x83);

        assert!(state.hdma_reads_banked_working_ram());
        state.write_address_u8(0xFF70, 0x05);
        assert_eq!(2, state.address_space.working_ram_bank());
    }
}
