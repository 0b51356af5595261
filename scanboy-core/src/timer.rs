use crate::cpu::InterruptType;
use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;
use serde::{Deserialize, Serialize};

// Machine cycles per DIV increment
const DIV_PERIOD: u32 = 0x40;

// Machine cycles per TIMA increment for TAC clock selects 1-3; 0 selects 256
const TIMA_PERIOD_BASE: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    div_ticks: u32,
    timer_ticks: u32,
    tima_enabled: bool,
    period: u32,
}

impl TimerState {
    pub fn new(div_ticks: u32) -> Self {
        Self { div_ticks, timer_ticks: 0, tima_enabled: false, period: 256 }
    }

    pub(crate) fn write_tac(&mut self, address_space: &mut AddressSpace, value: u8) {
        let value = value & 0x07;
        address_space.set_io(IoRegister::TAC, value);

        self.tima_enabled = value & 0x04 != 0;
        self.period = match value & 0x03 {
            0 => TIMA_PERIOD_BASE.pow(4),
            clock_select => TIMA_PERIOD_BASE.pow(u32::from(clock_select)),
        };

        log::debug!(
            "TAC set to {value:02X}: TIMA {}, period {} cycles",
            if self.tima_enabled { "enabled" } else { "disabled" },
            self.period
        );
    }

    /// Advance DIV by the given number of machine cycles.
    pub(crate) fn update_div(&mut self, address_space: &mut AddressSpace, cycles: u32) {
        self.div_ticks += cycles;
        while self.div_ticks >= DIV_PERIOD {
            self.div_ticks -= DIV_PERIOD;
            let div = address_space.io(IoRegister::DIV);
            address_space.set_io(IoRegister::DIV, div.wrapping_add(1));
        }
    }

    /// Advance TIMA by the given number of machine cycles, reloading from TMA and requesting a
    /// timer interrupt on overflow.
    pub(crate) fn update_tima(&mut self, address_space: &mut AddressSpace, cycles: u32) {
        if !self.tima_enabled {
            return;
        }

        self.timer_ticks += cycles;
        while self.timer_ticks >= self.period {
            self.timer_ticks -= self.period;

            let tima = address_space.io(IoRegister::TIMA);
            match tima.overflowing_add(1) {
                (new_tima, false) => {
                    address_space.set_io(IoRegister::TIMA, new_tima);
                }
                (_, true) => {
                    let tma = address_space.io(IoRegister::TMA);
                    address_space.set_io(IoRegister::TIMA, tma);
                    address_space.interrupt_flags().set(InterruptType::Timer);
                }
            }
        }
    }
}
