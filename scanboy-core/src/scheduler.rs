use crate::startup::EmulationState;
use serde::{Deserialize, Serialize};

// Machine cycles per second at normal speed
const CYCLES_PER_SECOND: u64 = 1 << 20;

/// Cycle counters shared by every component, advanced once per CPU step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingState {
    // Machine cycles taken by the current step, including interrupt dispatch and DMA
    pub(crate) cpu_ticks: u32,
    pub(crate) speed_multiplier: u32,
    // Cycles left over when dividing by the speed multiplier
    speed_remainder: u32,
    audio_ticks: u32,
    emulator_ticks: u32,
    sample_rollover: u64,
    samples_elapsed: u64,
    pub(crate) frame_complete: bool,
}

impl TimingState {
    pub fn new() -> Self {
        Self {
            cpu_ticks: 0,
            speed_multiplier: 1,
            speed_remainder: 0,
            audio_ticks: 0,
            emulator_ticks: 0,
            sample_rollover: 0,
            samples_elapsed: 0,
            frame_complete: false,
        }
    }

    /// Total audio samples that would have been produced so far at the configured sample rate.
    pub fn samples_elapsed(&self) -> u64 {
        self.samples_elapsed
    }

    // Convert machine cycles to PPU/audio ticks, which don't speed up in double speed mode
    fn timed_ticks(&mut self, cpu_ticks: u32) -> u32 {
        let total = cpu_ticks + self.speed_remainder;
        self.speed_remainder = total % self.speed_multiplier;
        total / self.speed_multiplier
    }

    fn accumulate_samples(&mut self, ticks: u32, sample_rate: u32) {
        self.sample_rollover += u64::from(ticks) * u64::from(sample_rate);
        self.samples_elapsed += self.sample_rollover / CYCLES_PER_SECOND;
        self.sample_rollover %= CYCLES_PER_SECOND;
    }
}

impl EmulationState {
    /// Advance DIV, the PPU, audio/frame timing and TIMA by the cycles of the current step.
    pub(crate) fn update_core(&mut self) {
        self.timer_state.update_div(&mut self.address_space, self.timing.cpu_ticks);

        let timed_ticks = self.timing.timed_ticks(self.timing.cpu_ticks);
        self.ppu_state.lcd_ticks += timed_ticks;
        self.run_line_controller();

        // Not affected by the display being switched off
        self.timing.audio_ticks += timed_ticks;
        if self.timing.audio_ticks >= self.config.audio_granularity {
            let audio_ticks = self.timing.audio_ticks;
            self.timing.accumulate_samples(audio_ticks, self.config.sample_rate);

            self.timing.emulator_ticks += audio_ticks;
            if self.timing.emulator_ticks >= self.config.frame_ticks {
                self.timing.frame_complete = true;
                self.timing.emulator_ticks = 0;
            }
            self.timing.audio_ticks = 0;
        }

        // H-blank DMA in the line controller may have added cycles to this step
        self.timer_state.update_tima(&mut self.address_space, self.timing.cpu_ticks);
    }
}
