mod render;
mod script;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use s1d13806::{
    BltEngine, BusyWait, Declined, Direction, DisplayMode, FramebufferRegion, PlaneMask, Rect,
    SequentialMarkers, Surface,
    regs::{
        BITBLT_DATA, BLT_BG_COLOR, BLT_CTRL0, BLT_CTRL1, BLT_DST_START01, BLT_DST_START2,
        BLT_FG_COLOR, BLT_HEIGHT, BLT_OPERATION, BLT_ROP, BLT_SRC_START01, BLT_SRC_START2,
        BLT_STRIDE, BLT_WIDTH, REV_CODE,
    },
};
use s1d_emu::{Controller, EmuConfig, trace::Access};
use tracing::{Level, info, warn};
use tracing_subscriber::util::SubscriberInitExt;

use crate::script::Command;

type Engine = BltEngine<Controller, BusyWait, SequentialMarkers>;

#[derive(Parser)]
#[command(name = "bltrun")]
#[command(version, about = "Replay blit scripts through the S1D13806 driver", long_about = None)]
struct Cli {
    /// Blit script; `-` or nothing runs the built-in demo scene
    script: Option<PathBuf>,

    /// Screen width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Screen height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Bits per pixel, 8 or 16
    #[arg(long, default_value_t = 16)]
    bpp: u8,

    /// Bytes of display memory
    #[arg(long, default_value = "0x140000", value_parser = parse_size)]
    vram: u32,

    /// Status polls each blit stays busy for
    #[arg(long, default_value_t = 4)]
    latency: u32,

    /// Write the final screen to this PNG
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print every register access
    #[arg(long)]
    trace: bool,

    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

fn parse_size(s: &str) -> Result<u32, String> {
    script::parse_number(s).map_err(|e| e.to_string())
}

fn setup_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .finish()
        .init();
}

fn register_name(offset: usize) -> &'static str {
    const NAMES: [(usize, &str); 15] = [
        (REV_CODE.0, "REV_CODE"),
        (BLT_CTRL0.0, "BLT_CTRL0"),
        (BLT_CTRL1.0, "BLT_CTRL1"),
        (BLT_ROP.0, "BLT_ROP"),
        (BLT_OPERATION.0, "BLT_OPERATION"),
        (BLT_SRC_START01.0, "BLT_SRC_START01"),
        (BLT_SRC_START2.0, "BLT_SRC_START2"),
        (BLT_DST_START01.0, "BLT_DST_START01"),
        (BLT_DST_START2.0, "BLT_DST_START2"),
        (BLT_STRIDE.0, "BLT_STRIDE"),
        (BLT_WIDTH.0, "BLT_WIDTH"),
        (BLT_HEIGHT.0, "BLT_HEIGHT"),
        (BLT_BG_COLOR.0, "BLT_BG_COLOR"),
        (BLT_FG_COLOR.0, "BLT_FG_COLOR"),
        (BITBLT_DATA.0, "BITBLT_DATA"),
    ];
    NAMES
        .iter()
        .find(|(o, _)| *o == offset)
        .map(|(_, name)| *name)
        .unwrap_or("?")
}

fn run_step(engine: &mut Engine, screen: &Surface, command: &Command) -> Result<(), Declined> {
    match *command {
        Command::Fill { rect, color, rop } => {
            engine
                .begin_solid(screen, rop, PlaneMask::SOLID, color)?
                .solid(rect)
                .done();
        }
        Command::Copy {
            src,
            dst,
            width,
            height,
            rop,
        } => {
            let direction = Direction::for_copy(
                &Rect::new(src.0, src.1, width, height),
                &Rect::new(dst.0, dst.1, width, height),
            );
            let sign = match direction {
                Direction::Positive => 1,
                Direction::Negative => -1,
            };
            engine
                .begin_copy(screen, screen, sign, sign, rop, PlaneMask::SOLID)?
                .copy(src, dst, width, height)
                .done();
        }
    }
    Ok(())
}

fn summarize(trace: &[Access]) {
    let mut counts: BTreeMap<usize, (u64, u64)> = BTreeMap::new();
    for access in trace {
        let entry = counts.entry(access.offset()).or_default();
        if access.is_write() {
            entry.1 += 1;
        } else {
            entry.0 += 1;
        }
    }

    println!("{:<16} {:>8} {:>8}", "register", "reads", "writes");
    for (offset, (reads, writes)) in counts {
        println!("{:<16} {:>8} {:>8}", register_name(offset), reads, writes);
    }
}

fn load_script(path: Option<&Path>, mode: &DisplayMode) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        _ => Ok(script::demo(mode)),
    }
}

fn bring_up(mode: DisplayMode, vram: u32, latency: u32) -> Result<Engine> {
    let mut controller = Controller::new(EmuConfig {
        vram_size: vram as usize,
        latency,
        ..Default::default()
    });
    controller.enable_trace();

    let region = FramebufferRegion::for_mode(0, vram, &mode);
    BltEngine::init(controller, BusyWait, SequentialMarkers::new(), mode, region)
        .context("initializing the BitBLT engine")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level);

    let mode = DisplayMode::packed(cli.width, cli.height, cli.bpp);
    let source = load_script(cli.script.as_deref(), &mode)?;
    let steps = script::parse(&source)?;
    script::check_bounds(&steps, &mode)?;

    let mut engine = bring_up(mode, cli.vram, cli.latency)?;
    let marker = engine.enable();
    info!("engine enabled, marker {}", marker.0);

    let screen = Surface::screen(&mode);
    let mut declined = 0;
    for step in &steps {
        if let Err(reason) = run_step(&mut engine, &screen, &step.command) {
            warn!("line {}: {}", step.line, reason);
            declined += 1;
        }
    }

    if let Some(marker) = engine.sync().last() {
        engine.wait_marker(marker);
    }
    engine.disable();
    let mut controller = engine.fini();

    let trace = controller.take_trace();
    if cli.trace {
        for access in &trace {
            println!("{access}");
        }
    }

    let stats = controller.stats();
    println!(
        "{} commands, {} declined; {} blits, {} pixels, {} status polls, {} drains",
        steps.len(),
        declined,
        stats.blits,
        stats.pixels,
        stats.status_polls,
        stats.drains
    );
    summarize(&trace);

    if let Some(path) = &cli.output {
        render::save_screen(controller.vram(), &mode, path)?;
        info!("wrote {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_modes_fail_bring_up() {
        let huge = DisplayMode::packed(50_000, 50_000, 16);
        let steps = script::parse(&script::demo(&huge)).unwrap();
        script::check_bounds(&steps, &huge).unwrap();

        let err = bring_up(huge, 0x14_0000, 0).err().unwrap();
        assert_eq!(err.to_string(), "initializing the BitBLT engine");
        assert!(format!("{err:#}").contains("bad geometry"));

        let err = bring_up(DisplayMode::packed(800, 600, 16), 0x200_0000, 0).err().unwrap();
        assert!(format!("{err:#}").contains("bad geometry"));
    }

    #[test]
    fn default_mode_comes_up() {
        let engine = bring_up(DisplayMode::packed(800, 600, 16), 0x14_0000, 0).unwrap();
        assert_eq!(engine.mode().width, 800);
    }
}
