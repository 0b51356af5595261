pub(crate) mod instructions;
mod registers;

#[cfg(test)]
mod tests;

use crate::memory::ioregisters::IoRegister;
use crate::startup::EmulationState;
use crate::HardwareMode;
pub use registers::CpuRegisters;

// Machine cycles taken to dispatch an interrupt
const ISR_CYCLES_REQUIRED: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            Self::VBlank => 0x01,
            Self::LcdStatus => 0x02,
            Self::Timer => 0x04,
            Self::Serial => 0x08,
            Self::Joypad => 0x10,
        }
    }
}

impl EmulationState {
    /// Fetch, decode and execute one instruction, then arm a pending EI, service at most one
    /// interrupt and advance every other component by the elapsed machine cycles.
    pub(crate) fn execute_iteration(&mut self) {
        let halt_bug_triggered = std::mem::take(&mut self.cpu_registers.skip_pc_increment);
        let (instruction, pc) = instructions::parse_next_instruction(
            &self.address_space,
            self.cpu_registers.pc,
            &self.ppu_state,
            halt_bug_triggered,
        );

        log::trace!("Executing {instruction:04X?} at PC {:04X}", self.cpu_registers.pc);

        self.cpu_registers.pc = pc;
        self.timing.cpu_ticks = instruction.cycles_required(&self.cpu_registers) / 4;
        instruction.execute(self);

        if self.cpu_registers.halted {
            // Frame ended while halted; the next frame resumes the halt
            return;
        }

        match self.cpu_registers.ime_countdown {
            1 => {
                self.cpu_registers.ime = true;
                self.cpu_registers.ime_countdown = 0;
            }
            2 => {
                self.cpu_registers.ime_countdown = 1;
            }
            _ => {}
        }

        self.service_interrupt();
        self.update_core();
    }

    /// Resume a HALT that was still in progress when the previous frame ended.
    pub(crate) fn resume_halt(&mut self) {
        self.timing.cpu_ticks = 1;
        self.wait_for_interrupt();
        if self.cpu_registers.halted {
            return;
        }

        self.service_interrupt();
        self.update_core();
    }

    /// Dispatch the highest priority requested and enabled interrupt, if IME is set.
    fn service_interrupt(&mut self) {
        if !self.cpu_registers.ime {
            return;
        }

        let ie_value = self.address_space.ie_register();
        let Some(interrupt_type) =
            self.address_space.interrupt_flags().highest_priority_interrupt(ie_value)
        else {
            return;
        };

        log::trace!(
            "Servicing {interrupt_type:?} interrupt, replacing PC {:04X} with {:04X}",
            self.cpu_registers.pc,
            interrupt_type.handler_address()
        );

        self.cpu_registers.ime = false;
        self.address_space.interrupt_flags().clear(interrupt_type);

        let [pc_hi, pc_lo] = self.cpu_registers.pc.to_be_bytes();
        self.cpu_registers.sp = self.cpu_registers.sp.wrapping_sub(1);
        self.write_address_u8(self.cpu_registers.sp, pc_hi);
        self.cpu_registers.sp = self.cpu_registers.sp.wrapping_sub(1);
        self.write_address_u8(self.cpu_registers.sp, pc_lo);

        self.cpu_registers.pc = interrupt_type.handler_address();
        self.timing.cpu_ticks += ISR_CYCLES_REQUIRED;
    }

    pub(crate) fn halt(&mut self) {
        if self.cpu_registers.ime_countdown == 1 {
            // EI immediately before HALT: run HALT again once IME is armed
            self.cpu_registers.pc = self.cpu_registers.pc.wrapping_sub(1);
            return;
        }

        if self.address_space.pending_interrupts() != 0 {
            if !self.cpu_registers.ime && !self.address_space.is_cgb() {
                log::trace!("HALT bug triggered at PC {:04X}", self.cpu_registers.pc);
                self.cpu_registers.skip_pc_increment = true;
            }
            return;
        }

        self.cpu_registers.halted = true;
        self.wait_for_interrupt();
    }

    // Advance timing one machine cycle at a time until an interrupt is pending or the frame ends
    fn wait_for_interrupt(&mut self) {
        while self.address_space.pending_interrupts() == 0 {
            self.timing.cpu_ticks = 1;
            self.update_core();
            if self.timing.frame_complete {
                return;
            }
        }

        self.cpu_registers.halted = false;
        if !self.cpu_registers.ime && !self.address_space.is_cgb() {
            self.cpu_registers.skip_pc_increment = true;
        }
    }

    pub(crate) fn stop(&mut self) {
        let key1 = self.address_space.io(IoRegister::KEY1);
        if !self.address_space.is_cgb() || key1 & 0x01 == 0 {
            return;
        }

        let double_speed = self.timing.speed_multiplier == 1;
        self.timing.speed_multiplier = if double_speed { 2 } else { 1 };
        self.address_space.set_io(IoRegister::KEY1, if double_speed { 0x80 } else { 0x00 });

        log::debug!(
            "Switched to {} speed",
            if double_speed { "double" } else { "normal" }
        );
    }
}

pub(crate) fn initial_registers(
    hardware_mode: HardwareMode,
    boot_rom_present: bool,
) -> CpuRegisters {
    if boot_rom_present {
        CpuRegisters::boot()
    } else {
        CpuRegisters::new(hardware_mode)
    }
}
