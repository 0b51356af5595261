use crate::config::EmulatorConfig;
use crate::graphics::FrameSink;
use crate::startup::EmulationState;
use std::error::Error;
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("error presenting frame: {source}")]
    Presentation {
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A full frame's worth of cycles ran.
    Completed,
    /// The host requested a stop; the frame was cut short at an instruction boundary.
    Stopped,
}

/// Frame pacing state: wall-clock time of the previous frame and the automatic frame skip.
#[derive(Debug, Clone)]
pub(crate) struct FrameThrottle {
    last_iteration: Instant,
    frame_skip: u32,
    frame_counter: i32,
}

impl FrameThrottle {
    pub(crate) fn new() -> Self {
        Self { last_iteration: Instant::now(), frame_skip: 0, frame_counter: 0 }
    }

    pub(crate) fn frame_skip(&self) -> u32 {
        self.frame_skip
    }

    // Raise the skip count when the previous frame overran its interval, otherwise lower it
    fn adjust_frame_skip(&mut self, elapsed: Duration, config: &EmulatorConfig) {
        if !config.auto_frame_skip {
            return;
        }

        if elapsed > Duration::from_millis(config.frame_interval_ms) {
            if self.frame_skip < config.max_frame_skip {
                self.frame_skip += 1;
                log::debug!("Frame took {elapsed:?}, frame skip raised to {}", self.frame_skip);
            }
        } else if self.frame_skip > 0 {
            self.frame_skip -= 1;
        }
    }

    /// Whether the completed frame should be handed to the frame sink.
    fn should_present(&mut self, config: &EmulatorConfig) -> bool {
        if self.frame_skip == 0 || self.frame_counter > 0 {
            self.frame_counter -= self.frame_skip as i32;
            true
        } else {
            self.frame_counter += config.frame_skip_base;
            false
        }
    }
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulationState {
    /// Run the machine until one frame completes or a stop is requested. Frames suppressed by the
    /// frame skip or by a recent display-off are not presented.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame sink fails to present a frame.
    pub fn run_frame<S>(&mut self, sink: &mut S) -> Result<FrameOutcome, RunError>
    where
        S: FrameSink,
    {
        self.clock_update();
        self.timing.frame_complete = false;

        if self.cpu_registers.halted {
            self.resume_halt();
        }

        while !self.timing.frame_complete {
            if self.stop_requested {
                self.stop_requested = false;
                log::info!("Stop requested, ending frame early");
                return Ok(FrameOutcome::Stopped);
            }

            self.execute_iteration();
        }

        if !self.ppu_state.blanking() && self.throttle.should_present(&self.config) {
            sink.present(self.ppu_state.frame_buffer())
                .map_err(|err| RunError::Presentation { source: Box::new(err) })?;
        }

        Ok(FrameOutcome::Completed)
    }

    /// Current automatic frame skip count.
    pub fn frame_skip(&self) -> u32 {
        self.throttle.frame_skip()
    }

    /// Ask `run_frame` to return at the next instruction boundary.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Per-frame wall clock bookkeeping: advances the cartridge RTC and adjusts the frame skip.
    fn clock_update(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.throttle.last_iteration);
        self.throttle.last_iteration = now;

        self.address_space.update_rtc(SystemTime::now());
        self.throttle.adjust_frame_skip(elapsed, &self.config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_skip_adjustment() {
        let config = EmulatorConfig { max_frame_skip: 2, ..EmulatorConfig::default() };
        let mut throttle = FrameThrottle::new();

        for _ in 0..5 {
            throttle.adjust_frame_skip(Duration::from_millis(40), &config);
        }
        assert_eq!(2, throttle.frame_skip());

        throttle.adjust_frame_skip(Duration::from_millis(5), &config);
        assert_eq!(1, throttle.frame_skip());
    }

    #[test]
    fn frame_skip_disabled() {
        let config = EmulatorConfig { auto_frame_skip: false, ..EmulatorConfig::default() };
        let mut throttle = FrameThrottle::new();

        throttle.adjust_frame_skip(Duration::from_secs(1), &config);
        assert_eq!(0, throttle.frame_skip());
        assert!(throttle.should_present(&config));
    }

    #[test]
    fn skipped_frames_refill_the_counter() {
        let config = EmulatorConfig::default();
        let mut throttle = FrameThrottle::new();
        throttle.frame_skip = 5;

        // Counter starts at 0: skip, then present twice while the counter drains
        assert!(!throttle.should_present(&config));
        assert_eq!(10, throttle.frame_counter);
        assert!(throttle.should_present(&config));
        assert!(throttle.should_present(&config));
        assert_eq!(0, throttle.frame_counter);
        assert!(!throttle.should_present(&config));
    }

    #[test]
    fn stop_request_ends_frame() {
        let mut state = EmulationState::new(vec![0; 0x8000], None, EmulatorConfig::default())
            .expect("synthetic cartridge should load");
        let mut frames = 0;

        state.request_stop();
        let outcome = state.run_frame(&mut |_: &[u32]| frames += 1).unwrap();
        assert_eq!(FrameOutcome::Stopped, outcome);
        assert_eq!(0, frames);

        let outcome = state.run_frame(&mut |_: &[u32]| frames += 1).unwrap();
        assert_eq!(FrameOutcome::Completed, outcome);
    }
}
