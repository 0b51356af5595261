use serde::{Deserialize, Serialize};

const WAVE_PCM_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) enum SlopeDirection {
    Increasing,
    #[default]
    Decreasing,
}

impl SlopeDirection {
    fn from_bit(bit_set: bool) -> Self {
        if bit_set {
            Self::Increasing
        } else {
            Self::Decreasing
        }
    }
}

// Waveform for square wave channels (12.5% / 25% / 50% / 75%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) enum DutyCycle {
    #[default]
    OneEighth,
    OneFourth,
    OneHalf,
    ThreeFourths,
}

impl DutyCycle {
    fn from_nrx1(value: u8) -> Self {
        match value >> 6 {
            0 => Self::OneEighth,
            1 => Self::OneFourth,
            2 => Self::OneHalf,
            _ => Self::ThreeFourths,
        }
    }
}

/// Length counter, reloaded from the last NRx1 length on trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) struct LengthCounter {
    pub(crate) remaining: u16,
    last_loaded: u16,
}

impl LengthCounter {
    fn load(&mut self, length: u16) {
        self.remaining = length;
        self.last_loaded = length;
    }

    fn reload(&mut self) {
        self.remaining = self.last_loaded;
    }
}

// Volume state & envelope from NRx2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) struct VolumeEnvelope {
    pub(crate) volume: u8,
    pub(crate) direction: SlopeDirection,
    pub(crate) sweeps: u8,
}

impl VolumeEnvelope {
    fn from_byte(byte: u8) -> Self {
        Self {
            volume: byte >> 4,
            direction: SlopeDirection::from_bit(byte & 0x08 != 0),
            sweeps: byte & 0x07,
        }
    }

    // Trigger reloads volume and sweep count but not the direction
    fn trigger(&mut self, byte: u8) {
        self.volume = byte >> 4;
        self.sweeps = byte & 0x07;
    }
}

// Channel 1 frequency sweep from NR10
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) struct FrequencySweep {
    pub(crate) time: u8,
    last_time: u8,
    pub(crate) shift: u8,
    pub(crate) direction: SlopeDirection,
}

impl FrequencySweep {
    fn write_nr10(&mut self, value: u8) {
        self.time = (value & 0x70) >> 4;
        self.last_time = self.time;
        self.shift = value & 0x07;
        self.direction = if value & 0x08 != 0 {
            SlopeDirection::Decreasing
        } else {
            SlopeDirection::Increasing
        };
    }

    fn trigger(&mut self, nr10: u8) {
        self.time = self.last_time;
        self.shift = nr10 & 0x07;
    }
}

// 11-bit frequency split across NRx3 (low byte) and NRx4 bits 0-2
fn with_low_byte(frequency: u16, value: u8) -> u16 {
    (frequency & 0x0700) | u16::from(value)
}

fn with_high_bits(frequency: u16, value: u8) -> u16 {
    (u16::from(value & 0x07) << 8) | (frequency & 0x00FF)
}

/// A square wave channel (channels 1 & 2). Only channel 1 has a frequency sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PulseChannel {
    pub(crate) duty_cycle: DutyCycle,
    pub(crate) length: LengthCounter,
    pub(crate) envelope: VolumeEnvelope,
    pub(crate) frequency: u16,
    // Keeps playing after the length counter expires
    pub(crate) consecutive: bool,
    pub(crate) sweep: Option<FrequencySweep>,
}

impl PulseChannel {
    pub(crate) fn new(has_sweep: bool) -> Self {
        Self {
            duty_cycle: DutyCycle::default(),
            length: LengthCounter::default(),
            envelope: VolumeEnvelope::default(),
            frequency: 0,
            consecutive: true,
            sweep: has_sweep.then(FrequencySweep::default),
        }
    }

    pub(crate) fn write_nr0(&mut self, value: u8) {
        if let Some(sweep) = &mut self.sweep {
            sweep.write_nr10(value);
        }
    }

    pub(crate) fn write_nr1(&mut self, value: u8) {
        self.duty_cycle = DutyCycle::from_nrx1(value);
        self.length.load(0x40 - u16::from(value & 0x3F));
    }

    pub(crate) fn write_nr2(&mut self, value: u8) {
        self.envelope = VolumeEnvelope::from_byte(value);
    }

    pub(crate) fn write_nr3(&mut self, value: u8) {
        self.frequency = with_low_byte(self.frequency, value);
    }

    /// Returns whether the write started the channel with its length counter enabled.
    pub(crate) fn write_nr4(&mut self, value: u8, nr0: u8, nr2: u8) -> bool {
        let mut started = false;
        if value & 0x80 != 0 {
            self.envelope.trigger(nr2);
            self.length.reload();
            if let Some(sweep) = &mut self.sweep {
                sweep.trigger(nr0);
            }
            started = value & 0x40 != 0;
        }

        self.consecutive = value & 0x40 == 0;
        self.frequency = with_high_bits(self.frequency, value);

        started
    }
}

/// The custom wave channel (channel 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct WaveChannel {
    pub(crate) can_play: bool,
    pub(crate) length: LengthCounter,
    pub(crate) output_level: u8,
    pub(crate) frequency: u16,
    pub(crate) consecutive: bool,
    pub(crate) pcm: [u8; WAVE_PCM_LEN],
}

impl WaveChannel {
    pub(crate) fn new() -> Self {
        Self {
            can_play: false,
            length: LengthCounter::default(),
            output_level: 0,
            frequency: 0,
            consecutive: true,
            pcm: [0; WAVE_PCM_LEN],
        }
    }

    /// Returns whether re-enabling the DAC restarted a length-limited channel.
    pub(crate) fn write_nr30(&mut self, value: u8, previous: u8) -> bool {
        self.can_play = value & 0x80 != 0;

        if self.can_play && previous & 0x80 != 0 {
            self.length.reload();
            !self.consecutive
        } else {
            false
        }
    }

    pub(crate) fn write_nr31(&mut self, value: u8) {
        self.length.load(0x100 - u16::from(value));
    }

    pub(crate) fn write_nr32(&mut self, value: u8) {
        self.output_level = (value & 0x60) >> 5;
    }

    pub(crate) fn write_nr33(&mut self, value: u8) {
        self.frequency = with_low_byte(self.frequency, value);
    }

    pub(crate) fn write_nr34(&mut self, value: u8) -> bool {
        let mut started = false;
        if value & 0x80 != 0 {
            self.length.reload();
            started = value & 0x40 != 0;
        }

        self.consecutive = value & 0x40 == 0;
        self.frequency = with_high_bits(self.frequency, value);

        started
    }

    pub(crate) fn write_wave_ram(&mut self, offset: usize, value: u8) {
        self.pcm[2 * offset] = value >> 4;
        self.pcm[2 * offset + 1] = value & 0x0F;
    }
}

/// The pseudo-random noise channel (channel 4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NoiseChannel {
    pub(crate) length: LengthCounter,
    pub(crate) envelope: VolumeEnvelope,
    pub(crate) clock_shift: u8,
    pub(crate) short_lfsr: bool,
    pub(crate) clock_divider: u8,
    pub(crate) consecutive: bool,
}

impl NoiseChannel {
    pub(crate) fn new() -> Self {
        Self {
            length: LengthCounter::default(),
            envelope: VolumeEnvelope::default(),
            clock_shift: 0,
            short_lfsr: false,
            clock_divider: 0,
            consecutive: true,
        }
    }

    pub(crate) fn write_nr41(&mut self, value: u8) {
        self.length.load(0x40 - u16::from(value & 0x3F));
    }

    pub(crate) fn write_nr42(&mut self, value: u8) {
        self.envelope = VolumeEnvelope::from_byte(value);
    }

    pub(crate) fn write_nr43(&mut self, value: u8) {
        self.clock_shift = value >> 4;
        self.short_lfsr = value & 0x08 != 0;
        self.clock_divider = value & 0x07;
    }

    pub(crate) fn write_nr44(&mut self, value: u8, nr42: u8) -> bool {
        self.consecutive = value & 0x40 == 0;

        if value & 0x80 != 0 {
            self.envelope.trigger(nr42);
            self.length.reload();
            value & 0x40 != 0
        } else {
            false
        }
    }
}
