use crate::startup::EmulationState;
use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Formatter;
use std::marker::PhantomData;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveStateError {
    #[error("error serializing/deserializing state: {source}")]
    Serialization {
        #[from]
        source: bincode::Error,
    },
}

impl EmulationState {
    /// Serialize the full machine state, including the cartridge ROM and RAM.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn save_state(&self) -> Result<Vec<u8>, SaveStateError> {
        let bytes = bincode::serialize(self)?;
        log::info!("Saved state ({} bytes)", bytes.len());

        Ok(bytes)
    }

    /// Replace the machine state with a snapshot produced by [`EmulationState::save_state`]. The
    /// current configuration and frame pacing are kept. On error the current state is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is malformed.
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), SaveStateError> {
        let mut state: EmulationState = bincode::deserialize(bytes)?;

        state.config = self.config.clone();
        state.throttle = std::mem::take(&mut self.throttle);
        state.restore_derived_state();
        *self = state;

        log::info!(
            "Loaded state for '{}'",
            self.address_space.cartridge().header().title
        );

        Ok(())
    }

    // Everything that snapshots don't carry is rebuilt from the restored raw state
    fn restore_derived_state(&mut self) {
        self.address_space.rebuild_tables();
        self.ppu_state.restore_derived_state();

        let is_cgb = self.address_space.is_cgb();
        let used_boot_rom = self.address_space.used_boot_rom();
        self.ppu_state.select_palette(is_cgb, used_boot_rom, self.config.colorize_monochrome);
    }
}

pub fn serialize_array<S, T, const N: usize>(
    array: &[T; N],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    let mut state = serializer.serialize_tuple(N)?;
    for value in array {
        state.serialize_element(value)?;
    }
    state.end()
}

struct DeserializeArrayVisitor<T, const N: usize> {
    marker: PhantomData<T>,
}

impl<T, const N: usize> DeserializeArrayVisitor<T, N> {
    fn new() -> Self {
        Self { marker: PhantomData }
    }
}

impl<'de, T, const N: usize> Visitor<'de> for DeserializeArrayVisitor<T, N>
where
    T: Deserialize<'de> + Default + Copy,
{
    type Value = [T; N];

    fn expecting(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "an array of size {N}")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut array = [T::default(); N];

        for (i, value) in array.iter_mut().enumerate() {
            let Some(elem) = seq.next_element()? else {
                return Err(de::Error::custom(format!(
                    "expected array to have {N} elements, only got {i}",
                )));
            };

            *value = elem;
        }

        if seq.next_element::<T>()?.is_some() {
            return Err(de::Error::custom(format!("array has more than {N} elements",)));
        }

        Ok(array)
    }
}

pub fn deserialize_array<'de, D, T, const N: usize>(deserializer: D) -> Result<[T; N], D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default + Copy,
{
    deserializer.deserialize_tuple(N, DeserializeArrayVisitor::new())
}

#[cfg(test)]
mod tests {
    use crate::startup::EmulationState;
    use crate::EmulatorConfig;

    // Endlessly writes an incrementing byte through VRAM and SCX
    fn vram_writer_rom() -> Vec<u8> {
        let mut rom = vec![0; 0x8000];
        rom[0x100..0x104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);
        rom[0x150..0x15B]
            .copy_from_slice(&[0x21, 0x00, 0x80, 0x22, 0x3C, 0xE0, 0x43, 0xCB, 0xAC, 0x18, 0xF8]);
        rom
    }

    fn new_state() -> EmulationState {
        let config = EmulatorConfig { auto_frame_skip: false, ..EmulatorConfig::default() };
        EmulationState::new(vram_writer_rom(), None, config)
            .expect("synthetic cartridge should load")
    }

    fn run_frames(state: &mut EmulationState, count: usize) -> Vec<Vec<u32>> {
        let mut frames = Vec::new();
        for _ in 0..count {
            state.run_frame(&mut |frame: &[u32]| frames.push(frame.to_vec())).unwrap();
        }
        frames
    }

    #[test]
    fn restored_state_renders_identical_frames() {
        let mut state = new_state();
        run_frames(&mut state, 3);
        for _ in 0..1000 {
            state.execute_iteration();
        }

        let snapshot = state.save_state().unwrap();
        let expected = run_frames(&mut state, 3);
        assert_eq!(3, expected.len());
        assert_ne!(expected[0], expected[2]);

        state.load_state(&snapshot).unwrap();
        assert_eq!(expected, run_frames(&mut state, 3));

        // Loading into a fresh machine works as well
        let mut other = new_state();
        other.load_state(&snapshot).unwrap();
        assert_eq!(expected, run_frames(&mut other, 3));
    }

    #[test]
    fn malformed_snapshot_is_rejected() {
        let mut state = new_state();
        let pc = state.cpu_registers.pc;

        assert!(state.load_state(&[1, 2, 3]).is_err());
        assert_eq!(pc, state.cpu_registers.pc);
        assert_eq!(0x91, state.read_address_u8(0xFF40));
    }
}
