use scanboy_proc_macros::{EnumDisplay, EnumFromStr, StrDeserialize, StrSerialize};
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;

/// Which hardware to emulate for cartridges that support both.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumDisplay,
    EnumFromStr,
    StrSerialize,
    StrDeserialize,
)]
pub enum ColorModePreference {
    #[default]
    Auto,
    Monochrome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatorConfig {
    #[serde(default)]
    pub color_mode: ColorModePreference,
    #[serde(default)]
    pub rom_only_as_mbc1: bool,
    #[serde(default)]
    pub force_cartridge_ram_access: bool,
    #[serde(default = "true_fn")]
    pub colorize_monochrome: bool,
    #[serde(default = "true_fn")]
    pub auto_frame_skip: bool,
    #[serde(default = "default_max_frame_skip")]
    pub max_frame_skip: u32,
    #[serde(default = "default_frame_skip_base")]
    pub frame_skip_base: i32,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_frame_ticks")]
    pub frame_ticks: u32,
    #[serde(default = "default_audio_granularity")]
    pub audio_granularity: u32,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn true_fn() -> bool {
    true
}

fn default_max_frame_skip() -> u32 {
    29
}

fn default_frame_skip_base() -> i32 {
    10
}

fn default_frame_interval_ms() -> u64 {
    17
}

fn default_frame_ticks() -> u32 {
    17826
}

fn default_audio_granularity() -> u32 {
    20
}

fn default_sample_rate() -> u32 {
    44100
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            color_mode: ColorModePreference::default(),
            rom_only_as_mbc1: false,
            force_cartridge_ram_access: false,
            colorize_monochrome: true_fn(),
            auto_frame_skip: true_fn(),
            max_frame_skip: default_max_frame_skip(),
            frame_skip_base: default_frame_skip_base(),
            frame_interval_ms: default_frame_interval_ms(),
            frame_ticks: default_frame_ticks(),
            audio_granularity: default_audio_granularity(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl std::fmt::Display for EmulatorConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "color_mode: {}", self.color_mode)?;
        writeln!(f, "rom_only_as_mbc1: {}", self.rom_only_as_mbc1)?;
        writeln!(f, "force_cartridge_ram_access: {}", self.force_cartridge_ram_access)?;
        writeln!(f, "colorize_monochrome: {}", self.colorize_monochrome)?;
        writeln!(f, "auto_frame_skip: {}", self.auto_frame_skip)?;
        writeln!(f, "max_frame_skip: {}", self.max_frame_skip)?;
        writeln!(f, "frame_skip_base: {}", self.frame_skip_base)?;
        writeln!(f, "frame_interval_ms: {}", self.frame_interval_ms)?;
        writeln!(f, "frame_ticks: {}", self.frame_ticks)?;
        writeln!(f, "audio_granularity: {}", self.audio_granularity)?;
        writeln!(f, "sample_rate: {}", self.sample_rate)?;

        Ok(())
    }
}
