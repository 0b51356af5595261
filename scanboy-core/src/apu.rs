//! Sound register bookkeeping. No samples are generated; the channel state mirrors what the sound
//! registers have programmed so that it survives save states and drives NR52's status bits.

mod channels;

use crate::memory::address;
use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;
use channels::{NoiseChannel, PulseChannel, WaveChannel};
use serde::{Deserialize, Serialize};

const CHANNEL_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApuState {
    pulse_1: PulseChannel,
    pulse_2: PulseChannel,
    wave: WaveChannel,
    noise: NoiseChannel,
    master_enabled: bool,
    left_enabled: [bool; CHANNEL_COUNT],
    right_enabled: [bool; CHANNEL_COUNT],
}

impl ApuState {
    pub fn new() -> Self {
        Self {
            pulse_1: PulseChannel::new(true),
            pulse_2: PulseChannel::new(false),
            wave: WaveChannel::new(),
            noise: NoiseChannel::new(),
            master_enabled: true,
            left_enabled: [false; CHANNEL_COUNT],
            right_enabled: [false; CHANNEL_COUNT],
        }
    }

    pub(crate) fn write_register(
        &mut self,
        address_space: &mut AddressSpace,
        register: IoRegister,
        value: u8,
    ) {
        let (stored, started_channel) = match register {
            IoRegister::NR10 => {
                self.pulse_1.write_nr0(value);
                (value, None)
            }
            IoRegister::NR11 => {
                self.pulse_1.write_nr1(value);
                (value & 0xC0, None)
            }
            IoRegister::NR12 => {
                self.pulse_1.write_nr2(value);
                (value, None)
            }
            IoRegister::NR13 => {
                self.pulse_1.write_nr3(value);
                (value, None)
            }
            IoRegister::NR14 => {
                let nr10 = address_space.io(IoRegister::NR10);
                let nr12 = address_space.io(IoRegister::NR12);
                let started = self.pulse_1.write_nr4(value, nr10, nr12);
                (value & 0x40, started.then_some(0))
            }
            IoRegister::NR21 => {
                self.pulse_2.write_nr1(value);
                (value & 0xC0, None)
            }
            IoRegister::NR22 => {
                self.pulse_2.write_nr2(value);
                (value, None)
            }
            IoRegister::NR23 => {
                self.pulse_2.write_nr3(value);
                (value, None)
            }
            IoRegister::NR24 => {
                let nr22 = address_space.io(IoRegister::NR22);
                let started = self.pulse_2.write_nr4(value, 0, nr22);
                (value & 0x40, started.then_some(1))
            }
            IoRegister::NR30 => {
                let previous = address_space.io(IoRegister::NR30);
                let started = self.wave.write_nr30(value, previous);
                (value & 0x80, started.then_some(2))
            }
            IoRegister::NR31 => {
                self.wave.write_nr31(value);
                (value, None)
            }
            IoRegister::NR32 => {
                self.wave.write_nr32(value);
                (value & 0x60, None)
            }
            IoRegister::NR33 => {
                self.wave.write_nr33(value);
                (value, None)
            }
            IoRegister::NR34 => {
                let started = self.wave.write_nr34(value);
                (value & 0x40, started.then_some(2))
            }
            IoRegister::NR41 => {
                self.noise.write_nr41(value);
                (value | 0xC0, None)
            }
            IoRegister::NR42 => {
                self.noise.write_nr42(value);
                (value, None)
            }
            IoRegister::NR43 => {
                self.noise.write_nr43(value);
                (value, None)
            }
            IoRegister::NR44 => {
                let nr42 = address_space.io(IoRegister::NR42);
                let started = self.noise.write_nr44(value, nr42);
                (value, started.then_some(3))
            }
            IoRegister::NR51 => {
                for channel in 0..CHANNEL_COUNT {
                    self.left_enabled[channel] = value & (1 << channel) != 0;
                    self.right_enabled[channel] = value & (0x10 << channel) != 0;
                }
                (value, None)
            }
            IoRegister::NR52 => {
                self.write_nr52(address_space, value);
                return;
            }
            _ => (value, None),
        };

        address_space.set_io(register, stored);

        if let Some(channel) = started_channel {
            let nr52 = address_space.io(IoRegister::NR52);
            address_space.set_io(IoRegister::NR52, nr52 | (1 << channel));
        }
    }

    fn write_nr52(&mut self, address_space: &mut AddressSpace, value: u8) {
        let nr52 = address_space.io(IoRegister::NR52);
        self.master_enabled = value & 0x80 != 0;

        if self.master_enabled {
            address_space.set_io(IoRegister::NR52, (value & 0x80) | (nr52 & 0x0F));
            return;
        }

        log::debug!("Sound disabled through NR52");

        *self = Self { master_enabled: false, ..Self::new() };
        address_space.set_io(IoRegister::NR52, 0);
        for address in address::WAVE_RAM_START..=address::WAVE_RAM_END {
            address_space.write_raw(address, 0);
        }
    }

    pub(crate) fn write_wave_ram(
        &mut self,
        address_space: &mut AddressSpace,
        address: u16,
        value: u8,
    ) {
        let offset = usize::from(address - address::WAVE_RAM_START);
        self.wave.write_wave_ram(offset, value);
        address_space.write_raw(address, value);
    }
}
