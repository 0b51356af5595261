use crate::startup::EmulationState;
use std::convert::Infallible;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

/// Receives each presented frame: 160x144 packed colors in `0xAARRGGBB` layout, row-major. The
/// alpha byte is only meaningful to the renderer and should be ignored by consumers.
pub trait FrameSink {
    type Err: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Implementations return an error if the frame could not be displayed or stored; the error is
    /// propagated out of the frame loop.
    fn present(&mut self, frame: &[u32]) -> Result<(), Self::Err>;
}

impl<F> FrameSink for F
where
    F: FnMut(&[u32]),
{
    type Err = Infallible;

    fn present(&mut self, frame: &[u32]) -> Result<(), Self::Err> {
        self(frame);
        Ok(())
    }
}

/// Nearest-neighbor scale a 160x144 frame to the given dimensions.
#[must_use]
pub fn scale_frame(frame: &[u32], width: usize, height: usize) -> Vec<u32> {
    if width == SCREEN_WIDTH && height == SCREEN_HEIGHT {
        return frame.to_vec();
    }

    let mut scaled = Vec::with_capacity(width * height);
    for y in 0..height {
        let source_row = y * SCREEN_HEIGHT / height;
        let row = &frame[source_row * SCREEN_WIDTH..(source_row + 1) * SCREEN_WIDTH];
        scaled.extend((0..width).map(|x| row[x * SCREEN_WIDTH / width]));
    }

    scaled
}

impl EmulationState {
    /// The current frame buffer, which may be partially drawn mid-frame.
    pub fn frame_buffer(&self) -> &[u32] {
        self.ppu_state.frame_buffer()
    }

    #[must_use]
    pub fn scaled_frame(&self, width: usize, height: usize) -> Vec<u32> {
        scale_frame(self.ppu_state.frame_buffer(), width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> Vec<u32> {
        (0..SCREEN_HEIGHT)
            .flat_map(|y| (0..SCREEN_WIDTH).map(move |x| ((y as u32) << 8) | x as u32))
            .collect()
    }

    #[test]
    fn same_size_is_a_copy() {
        let frame = gradient();
        assert_eq!(frame, scale_frame(&frame, SCREEN_WIDTH, SCREEN_HEIGHT));
    }

    #[test]
    fn integer_upscale() {
        let frame = gradient();
        let scaled = scale_frame(&frame, SCREEN_WIDTH * 3, SCREEN_HEIGHT * 3);

        assert_eq!(SCREEN_WIDTH * SCREEN_HEIGHT * 9, scaled.len());
        assert_eq!(0x0000, scaled[0]);
        assert_eq!(0x0000, scaled[2]);
        assert_eq!(0x0001, scaled[3]);
        assert_eq!(0x0100, scaled[3 * SCREEN_WIDTH * 3]);
        assert_eq!(0x8F9F, scaled[scaled.len() - 1]);
    }

    #[test]
    fn downscale() {
        let frame = gradient();
        let scaled = scale_frame(&frame, 80, 72);

        assert_eq!(80 * 72, scaled.len());
        assert_eq!(0x0002, scaled[1]);
        assert_eq!(0x0200, scaled[80]);
    }

    #[test]
    fn closures_are_sinks() {
        let mut presented = 0;
        let mut sink = |frame: &[u32]| {
            assert_eq!(SCREEN_WIDTH * SCREEN_HEIGHT, frame.len());
            presented += 1;
        };
        sink.present(&gradient()).unwrap();
        sink.present(&gradient()).unwrap();
        assert_eq!(2, presented);
    }
}
