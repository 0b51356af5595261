mod apu;
mod config;
mod cpu;
mod data;
mod eventloop;
mod graphics;
mod input;
mod memory;
mod ppu;
mod scheduler;
mod serialize;
mod startup;
mod timer;

use scanboy_proc_macros::EnumDisplay;
use serde::{Deserialize, Serialize};

pub use config::{ColorModePreference, EmulatorConfig};
pub use eventloop::{FrameOutcome, RunError};
pub use graphics::{scale_frame, FrameSink, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use input::JoypadButton;
pub use memory::{CartridgeInfo, CartridgeLoadError, CgbSupport, Licensee, MapperType};
pub use serialize::SaveStateError;
pub use startup::{EmulationState, StartupError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumDisplay)]
pub enum HardwareMode {
    GameBoy,
    GameBoyColor,
}
