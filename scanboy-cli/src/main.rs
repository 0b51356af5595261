mod config;
mod ppm;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use scanboy_core::{EmulationState, FrameOutcome, FrameSink, SCREEN_HEIGHT, SCREEN_WIDTH};
use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(version, about = "Headless Game Boy / Game Boy Color runner")]
struct Cli {
    /// Cartridge ROM image
    #[arg(short = 'f', long)]
    gb_file_path: PathBuf,
    /// Optional 2304-byte color boot ROM
    #[arg(long)]
    boot_rom_path: Option<PathBuf>,
    /// TOML emulator configuration
    #[arg(short = 'c', long)]
    config_path: Option<PathBuf>,
    /// Number of frames to run
    #[arg(short = 'n', long, default_value_t = 600)]
    frames: u32,
    /// Run dual-mode cartridges in monochrome mode
    #[arg(long)]
    monochrome: bool,
    /// Restore this snapshot before running
    #[arg(long)]
    load_state: Option<PathBuf>,
    /// Write a snapshot here after running
    #[arg(long)]
    save_state: Option<PathBuf>,
    /// Write the last presented frame here as a PPM image
    #[arg(long)]
    dump_frame: Option<PathBuf>,
    #[arg(long, requires = "scale_height")]
    scale_width: Option<usize>,
    #[arg(long, requires = "scale_width")]
    scale_height: Option<usize>,
}

/// Counts presented frames and keeps a copy of the latest one.
#[derive(Default)]
struct CountingSink {
    presented: u32,
    last_frame: Option<Vec<u32>>,
}

impl FrameSink for CountingSink {
    type Err = Infallible;

    fn present(&mut self, frame: &[u32]) -> Result<(), Self::Err> {
        self.presented += 1;
        match &mut self.last_frame {
            Some(last_frame) => last_frame.copy_from_slice(frame),
            None => self.last_frame = Some(frame.to_vec()),
        }

        Ok(())
    }
}

fn read_file(path: &Path, description: &str) -> Result<Vec<u8>, anyhow::Error> {
    fs::read(path).with_context(|| format!("error reading {description} from '{}'", path.display()))
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    let config = config::load_config(args.config_path.as_deref())?;
    let config = config::apply_overrides(config, args.monochrome);
    log::info!("Emulator configuration:\n{config}");

    let rom = read_file(&args.gb_file_path, "cartridge ROM")?;
    let boot_rom = args
        .boot_rom_path
        .as_deref()
        .map(|path| read_file(path, "boot ROM"))
        .transpose()?;

    let mut state = EmulationState::new(rom, boot_rom, config).with_context(|| {
        format!("error initializing emulator for '{}'", args.gb_file_path.display())
    })?;
    log::info!("Cartridge: {}", state.cartridge_info());

    if let Some(path) = &args.load_state {
        let snapshot = read_file(path, "save state")?;
        state
            .load_state(&snapshot)
            .with_context(|| format!("error loading save state from '{}'", path.display()))?;
    }

    let mut sink = CountingSink::default();
    for _ in 0..args.frames {
        match state.run_frame(&mut sink)? {
            FrameOutcome::Completed => {}
            FrameOutcome::Stopped => break,
        }
    }
    log::info!(
        "Ran {} frames, presented {}, final frame skip {}",
        args.frames,
        sink.presented,
        state.frame_skip()
    );

    if let Some(path) = &args.save_state {
        let snapshot = state.save_state()?;
        fs::write(path, snapshot)
            .with_context(|| format!("error writing save state to '{}'", path.display()))?;
        log::info!("Wrote save state to '{}'", path.display());
    }

    if let Some(path) = &args.dump_frame {
        let frame = sink.last_frame.as_deref().unwrap_or(state.frame_buffer());
        let (width, height) = match (args.scale_width, args.scale_height) {
            (Some(width), Some(height)) => (width, height),
            _ => (SCREEN_WIDTH, SCREEN_HEIGHT),
        };

        let scaled = scanboy_core::scale_frame(frame, width, height);
        ppm::save_ppm(path, &scaled, width, height)?;
        log::info!("Wrote {width}x{height} frame to '{}'", path.display());
    }

    Ok(())
}
