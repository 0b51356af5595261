use crate::cpu::InterruptType;
use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;
use crate::startup::EmulationState;
use scanboy_proc_macros::EnumDisplay;
use serde::{Deserialize, Serialize};

/// Joypad buttons, numbered by their bit in the pressed-button byte. Bits 0-3 are read through
/// the direction select line and bits 4-7 through the action select line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumDisplay)]
pub enum JoypadButton {
    Right = 0,
    Left = 1,
    Up = 2,
    Down = 3,
    A = 4,
    B = 5,
    Select = 6,
    Start = 7,
}

impl JoypadButton {
    pub const ALL: [Self; 8] = [
        Self::Right,
        Self::Left,
        Self::Up,
        Self::Down,
        Self::A,
        Self::B,
        Self::Select,
        Self::Start,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoypadState {
    // A cleared bit means the button is held
    buttons: u8,
}

impl JoypadState {
    pub fn new() -> Self {
        Self { buttons: 0xFF }
    }

    pub fn pressed(&self, button: JoypadButton) -> bool {
        self.buttons & button.bit() == 0
    }

    fn set_pressed(&mut self, button: JoypadButton, pressed: bool) {
        if pressed {
            self.buttons &= !button.bit();
        } else {
            self.buttons |= button.bit();
        }
    }

    // Low nibble of JOYP for the given select bits
    fn joyp_for_select(&self, select: u8) -> u8 {
        let actions = if select & 0x20 == 0 { self.buttons >> 4 } else { 0x0F };
        let directions = if select & 0x10 == 0 { self.buttons & 0x0F } else { 0x0F };
        (select & 0x30) | (actions & directions)
    }

    pub(crate) fn write_joyp(&self, address_space: &mut AddressSpace, value: u8) {
        self.update_joyp_register(address_space, value);
    }

    /// Recompute JOYP from the current select bits and button state, and request a joypad
    /// interrupt if any selected line went from high to low.
    fn update_joyp_register(&self, address_space: &mut AddressSpace, select: u8) {
        let old_joyp = address_space.io(IoRegister::JOYP);
        let new_joyp = self.joyp_for_select(select);
        address_space.set_io(IoRegister::JOYP, new_joyp);

        if should_flag_interrupt(old_joyp, new_joyp) {
            address_space.interrupt_flags().set(InterruptType::Joypad);
        }
    }
}

fn should_flag_interrupt(old_joyp: u8, new_joyp: u8) -> bool {
    (old_joyp & !new_joyp) & 0x0F != 0
}

impl EmulationState {
    /// Press or release a joypad button.
    pub fn joypad_event(&mut self, button: JoypadButton, pressed: bool) {
        self.joypad_state.set_pressed(button, pressed);
        log::debug!("{button} {}", if pressed { "pressed" } else { "released" });

        let select = self.address_space.io(IoRegister::JOYP);
        self.joypad_state.update_joyp_register(&mut self.address_space, select);
    }
}
